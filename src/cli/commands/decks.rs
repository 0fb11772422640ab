//! Deck command handlers
//!
//! Implements `list`, `show` and `validate`.

use std::fmt::Write as _;

use crate::cli::args::{ListArgs, OutputFormat, ShowArgs, ValidateArgs};
use crate::deck::builtin;
use crate::deck::load_deck_file;
use crate::error::{CybersimError, DeckError};

/// List the built-in decks.
///
/// # Errors
///
/// Returns an error if a built-in deck fails to load or JSON output fails.
pub fn list(args: &ListArgs) -> Result<(), CybersimError> {
    let results = builtin::list_decks(args.tag.as_deref());

    match args.format {
        OutputFormat::Json => {
            let mut entries = Vec::with_capacity(results.len());
            for d in &results {
                let deck = d.load()?;
                entries.push(serde_json::json!({
                    "name": d.name(),
                    "title": deck.title(),
                    "description": d.description,
                    "scenarios": deck.len(),
                    "pass_threshold": deck.pass_threshold(),
                    "scoring": deck.scoring().to_string(),
                    "tags": d.tags,
                }));
            }
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Human => {
            if results.is_empty() {
                println!("No simulations match the given filters.");
                return Ok(());
            }

            println!("Simulations ({} available)\n", results.len());
            for d in &results {
                let deck = d.load()?;
                let pass = format!("pass {}%", deck.pass_threshold());
                println!("  {:<20}{:<58}{pass}", d.name(), d.description);
            }
            println!();
            println!("Play a simulation: cybersim run <name>");
            println!("View YAML:         cybersim show <name>");
        }
    }

    Ok(())
}

/// Print the YAML of a built-in deck, suitable for piping into a custom deck.
///
/// # Errors
///
/// Returns a usage error if the name is not a built-in simulation.
pub fn show(args: &ShowArgs) -> Result<(), CybersimError> {
    let deck = builtin::find_deck(&args.name).ok_or_else(|| {
        let mut message = format!("Unknown simulation '{}'", args.name);

        if let Some(suggestion) = builtin::suggest_deck(&args.name) {
            let _ = write!(message, "\n\nDid you mean '{suggestion}'?");
        }

        message.push_str("\n\nAvailable simulations:");
        for d in builtin::list_decks(None) {
            let _ = write!(message, "\n  {:<20}{}", d.name(), d.description);
        }
        CybersimError::Usage(message)
    })?;

    print!("{}", deck.yaml);
    Ok(())
}

/// Validate deck files.
///
/// Every file is checked and reported; the first failure is returned.
///
/// # Errors
///
/// Returns the first `DeckError` found. With `--strict`, warnings fail too.
pub fn validate(args: &ValidateArgs) -> Result<(), CybersimError> {
    let mut first_error: Option<DeckError> = None;
    let mut reports = Vec::with_capacity(args.files.len());

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating deck");

        let outcome = load_deck_file(path).and_then(|loaded| {
            if args.strict && !loaded.warnings.is_empty() {
                Err(DeckError::ValidationError {
                    path: path.display().to_string(),
                    errors: loaded.warnings,
                })
            } else {
                Ok(loaded)
            }
        });

        match outcome {
            Ok(loaded) => {
                for warning in &loaded.warnings {
                    tracing::warn!(location = %warning.path, "{}", warning.message);
                }
                reports.push(serde_json::json!({
                    "file": path.display().to_string(),
                    "valid": true,
                    "simulation": loaded.deck.kind(),
                    "scenarios": loaded.deck.len(),
                    "warnings": loaded.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
                }));
                if args.format == OutputFormat::Human {
                    println!(
                        "✓ {} ({}, {} scenarios)",
                        path.display(),
                        loaded.deck.kind(),
                        loaded.deck.len()
                    );
                    for warning in &loaded.warnings {
                        println!("    {warning}");
                    }
                }
            }
            Err(e) => {
                let issues: Vec<String> = e.issues().iter().map(ToString::to_string).collect();
                reports.push(serde_json::json!({
                    "file": path.display().to_string(),
                    "valid": false,
                    "error": e.to_string(),
                    "issues": issues,
                }));
                if args.format == OutputFormat::Human {
                    println!("✗ {}: {e}", path.display());
                    for issue in &issues {
                        println!("    {issue}");
                    }
                }
                first_error.get_or_insert(e);
            }
        }
    }

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    first_error.map_or(Ok(()), |e| Err(e.into()))
}
