//! Trainee registration command.

use crate::api::ApiClient;
use crate::cli::args::{OutputFormat, RegisterArgs};
use crate::error::CybersimError;

/// Register a trainee and print the backend-assigned id.
///
/// # Errors
///
/// Returns `CybersimError::Usage` for a blank name or email and an
/// `ApiError` when the backend is unreachable or rejects the request.
pub async fn run(args: &RegisterArgs) -> Result<(), CybersimError> {
    let name = args.name.trim();
    let email = args.email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(CybersimError::Usage(
            "name and email must not be empty".to_owned(),
        ));
    }

    let client = ApiClient::new(&args.api_url)?;
    let profile = client.create_user(name, email).await?;
    tracing::info!(user_id = %profile.id, "trainee registered");

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&profile)?),
        OutputFormat::Human => {
            println!("Welcome, {}!", profile.name);
            println!("user id: {}", profile.id);
            println!("Pass it as --user-id or set CYBERSIM_USER_ID to record results.");
        }
    }
    Ok(())
}
