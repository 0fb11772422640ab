//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod chat;
pub mod completions;
pub mod dashboard;
pub mod decks;
pub mod password;
pub mod register;
pub mod run;
pub mod version;

use crate::cli::args::{Cli, Commands};
use crate::error::CybersimError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli) -> Result<(), CybersimError> {
    match cli.command {
        Commands::Run(args) => run::run(&args, cli.quiet).await,
        Commands::List(args) => decks::list(&args),
        Commands::Show(args) => decks::show(&args),
        Commands::Validate(args) => decks::validate(&args),
        Commands::Password(args) => password::run(&args),
        Commands::Register(args) => register::run(&args).await,
        Commands::Dashboard(args) => dashboard::run(&args).await,
        Commands::Chat(args) => chat::run(&args).await,
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}
