//! Password strength command.

use std::fmt::Write as _;

use crate::cli::args::{OutputFormat, PasswordArgs};
use crate::error::CybersimError;
use crate::scoring::strength::{StrengthReport, analyze_password};

/// Print a strength report for one candidate password.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(args: &PasswordArgs) -> Result<(), CybersimError> {
    let report = analyze_password(&args.candidate);
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Human => print!("{}", format_report(&report)),
    }
    Ok(())
}

/// Human-readable strength report.
#[must_use]
pub fn format_report(report: &StrengthReport) -> String {
    let mut out = format!("Strength: {}/100\n", report.strength);
    if let Some(crack_time) = report.crack_time {
        let _ = writeln!(out, "Time to crack: {crack_time}");
    }
    for item in &report.feedback {
        let mark = if item.positive { '✓' } else { '✗' };
        let _ = writeln!(out, "  {mark} {}", item.text);
    }
    out
}
