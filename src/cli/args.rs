//! CLI argument definitions
//!
//! All Clap derive structs for `cybersim` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

// ============================================================================
// Root CLI
// ============================================================================

/// Cybersecurity awareness attack simulations.
#[derive(Parser, Debug)]
#[command(name = "cybersim", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "CYBERSIM_COLOR")]
    pub color: ColorChoice,

    /// Log line format on stderr.
    #[arg(long, default_value = "human", global = true)]
    pub log_format: OutputFormat,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play a simulation in the terminal.
    Run(RunArgs),

    /// List the built-in simulations.
    List(ListArgs),

    /// Print the YAML of a built-in deck.
    Show(ShowArgs),

    /// Validate deck files without playing them.
    Validate(ValidateArgs),

    /// Analyze the strength of a password.
    Password(PasswordArgs),

    /// Register a trainee with the backend.
    Register(RegisterArgs),

    /// Show a trainee's vulnerability breakdown from the backend.
    Dashboard(DashboardArgs),

    /// Ask the security assistant a question.
    Chat(ChatArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Run
// ============================================================================

/// Arguments for `run`.
#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("source").required(true).multiple(false))]
pub struct RunArgs {
    /// Built-in simulation to play (see `cybersim list`).
    #[arg(group = "source")]
    pub simulation: Option<String>,

    /// Play a custom deck file instead of a built-in one.
    #[arg(short, long, group = "source")]
    pub deck: Option<PathBuf>,

    /// Scripted answers, one per scenario or attempt, instead of stdin.
    #[arg(short, long, value_delimiter = ',')]
    pub answers: Option<Vec<String>>,

    /// Trainee id used when persisting the result.
    #[arg(long, env = "CYBERSIM_USER_ID")]
    pub user_id: Option<String>,

    /// Backend base URL (e.g. `http://localhost:8000`).
    #[arg(long, env = "CYBERSIM_API_URL")]
    pub api_url: Option<String>,

    /// Write JSONL session events to a file (`-` for stdout, `stderr`).
    #[arg(long, env = "CYBERSIM_EVENTS")]
    pub events: Option<String>,

    /// Expose Prometheus metrics on this port.
    #[arg(long, env = "CYBERSIM_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Output format for the final result.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Deck Commands
// ============================================================================

/// Arguments for `list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by tag.
    #[arg(long)]
    pub tag: Option<String>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Built-in simulation name.
    pub name: String,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Deck files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Enable strict validation (warnings become errors).
    #[arg(long)]
    pub strict: bool,
}

// ============================================================================
// Standalone Tools
// ============================================================================

/// Arguments for `password`.
#[derive(Args, Debug)]
pub struct PasswordArgs {
    /// Candidate password.
    pub candidate: String,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `register`.
#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Trainee display name.
    #[arg(long)]
    pub name: String,

    /// Trainee email.
    #[arg(long)]
    pub email: String,

    /// Backend base URL.
    #[arg(long, env = "CYBERSIM_API_URL")]
    pub api_url: String,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `dashboard`.
#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Trainee id.
    #[arg(long, env = "CYBERSIM_USER_ID")]
    pub user_id: String,

    /// Backend base URL.
    #[arg(long, env = "CYBERSIM_API_URL")]
    pub api_url: String,

    /// Claim the completion certificate.
    #[arg(long)]
    pub claim_certificate: bool,

    /// Download the PDF report to this path.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `chat`.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Question for the assistant.
    pub message: String,

    /// Conversation id; a new one is generated when omitted.
    #[arg(long)]
    pub session_id: Option<String>,

    /// Backend base URL.
    #[arg(long, env = "CYBERSIM_API_URL")]
    pub api_url: String,
}

// ============================================================================
// Completions / Version
// ============================================================================

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================
