//! Dashboard command.

use crate::api::ApiClient;
use crate::cli::args::{DashboardArgs, OutputFormat};
use crate::deck::SimulationKind;
use crate::error::CybersimError;

/// Fetch and print a trainee's profile and vulnerability breakdown,
/// optionally claiming the certificate and saving the PDF report.
///
/// # Errors
///
/// Returns an `ApiError` when the backend is unreachable or rejects the
/// request, `CybersimError::Usage` when a certificate is claimed before
/// every simulation is complete, and an I/O error if the report cannot be
/// written.
pub async fn run(args: &DashboardArgs) -> Result<(), CybersimError> {
    let client = ApiClient::new(&args.api_url)?;
    let profile = client.load_user_profile(&args.user_id).await?;
    let breakdown = client.load_vulnerability_score(&args.user_id).await?;
    let status = breakdown.status();
    let eligible = profile.certificate_eligible();
    let remaining = SimulationKind::all().len() - profile.completed_kinds().len();

    let mut certificate = client.load_certificate(&args.user_id).await?;
    if args.claim_certificate && certificate.is_none() {
        if !eligible {
            return Err(CybersimError::Usage(format!(
                "{remaining} simulation(s) left before the certificate"
            )));
        }
        let issued = client.issue_certificate(&args.user_id).await?;
        tracing::info!(number = %issued.certificate_number, "certificate issued");
        certificate = Some(issued);
    }

    if let Some(path) = &args.report {
        let pdf = client.download_report(&args.user_id).await?;
        std::fs::write(path, &pdf)?;
        tracing::info!(path = %path.display(), bytes = pdf.len(), "report saved");
    }

    match args.format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "profile": profile,
                "scores": breakdown,
                "status": status,
                "certificate_eligible": eligible,
                "certificate": certificate,
                "report": args.report.as_ref().map(|p| p.display().to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Human => {
            println!("{} <{}>", profile.name, profile.email);
            println!(
                "Overall: {}% ({status})   Total score: {}",
                breakdown.overall_score, profile.total_score
            );
            println!();
            for kind in SimulationKind::all() {
                let done = if profile.has_completed(*kind) { "✓" } else { " " };
                println!(
                    "  [{done}] {:<22}{:>3}%",
                    kind.label(),
                    breakdown.score(*kind)
                );
            }
            println!();
            match &certificate {
                Some(cert) => println!(
                    "Certified Cybersecurity Professional: certificate #{} ({})",
                    cert.certificate_number,
                    cert.issued_date.format("%Y-%m-%d")
                ),
                None if eligible => {
                    println!("All simulations completed: claim with --claim-certificate.");
                }
                None => println!("{remaining} simulation(s) left before the certificate."),
            }
            if let Some(path) = &args.report {
                println!("Report saved to {}", path.display());
            }
        }
    }
    Ok(())
}
