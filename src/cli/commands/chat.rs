//! Assistant chat command.

use crate::api::ApiClient;
use crate::cli::args::ChatArgs;
use crate::error::CybersimError;

/// Forward one question to the assistant and print the reply.
///
/// # Errors
///
/// Returns an `ApiError` when the backend is unreachable or rejects the
/// request.
pub async fn run(args: &ChatArgs) -> Result<(), CybersimError> {
    let session_id = args
        .session_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    tracing::debug!(session_id = %session_id, "sending chat message");

    let client = ApiClient::new(&args.api_url)?;
    let reply = client.chat(&session_id, &args.message).await?;
    println!("{reply}");
    if args.session_id.is_none() {
        eprintln!("session: {session_id}");
    }
    Ok(())
}
