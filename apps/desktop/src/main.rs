use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use client_core::{
    authorize, process_submission, role_home, Decision, MockIdentityProvider, Route,
    SessionManager, SimulatedVerifier, Wizard,
};
use shared::domain::{
    ApiProvider, CertificateMetadata, CertificateType, FileMeta, Identity, Role, VerificationMode,
};
use shared::protocol::VerificationOutcome;
use storage::Storage;

mod config;

#[derive(Parser, Debug)]
#[command(name = "digipraman", about = "Secure certificate verification platform")]
struct Args {
    /// Settings file; missing file falls back to defaults.
    #[arg(long, default_value = "digipraman.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with a selected role. Credentials are placeholders for now.
    Login {
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        password: String,
        #[arg(long)]
        role: Role,
    },
    /// Clear the current session.
    Logout,
    /// Show the session and where each route currently leads.
    Status,
    /// Walk the upload wizard and run the verification flow.
    Verify {
        /// Certificate files to upload (repeatable).
        #[arg(long = "file", required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value = "degree")]
        certificate_type: CertificateType,
        #[arg(long)]
        candidate_name: String,
        #[arg(long)]
        roll_number: String,
        #[arg(long)]
        institution: String,
        #[arg(long, default_value = "")]
        year_of_passing: String,
        #[arg(long)]
        certificate_number: Option<String>,
        /// Bulk spreadsheets (organizations and admins only, repeatable).
        #[arg(long = "bulk-file")]
        bulk_files: Vec<PathBuf>,
        /// External registry to pull records from instead of bulk files.
        #[arg(long)]
        api_connection: Option<ApiProvider>,
        #[arg(long, default_value = "online")]
        mode: VerificationMode,
    },
    /// Role-specific dashboard.
    Dashboard,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let settings = config::load_settings(&args.config);
    let database_url = config::prepare_database_url(&settings.database_url);
    let store = Storage::new(&database_url).await?;

    let mut session = SessionManager::new(
        Arc::new(store.clone()),
        Arc::new(MockIdentityProvider),
    );
    session.restore().await?;

    match args.command {
        Command::Login {
            email,
            password,
            role,
        } => {
            let identity = session.login(&email, &password, role).await?;
            println!("Signed in as {} ({})", identity.email, identity.role.label());
            println!("Home dashboard: {}", role_home(identity.role).path());
        }
        Command::Logout => {
            session.logout().await?;
            println!("Signed out.");
        }
        Command::Status => {
            match session.current() {
                Some(identity) => {
                    println!("Signed in as {} ({})", identity.email, identity.role.label())
                }
                None => println!("Not signed in."),
            }
            println!("Routes:");
            for route in Route::ALL {
                let lead = match authorize(route, session.current()) {
                    Decision::Render => "render".to_string(),
                    Decision::RedirectToLogin => format!("redirect to {}", Route::Login.path()),
                    Decision::RedirectToRoleHome(home) => format!("redirect to {}", home.path()),
                };
                println!("  {:<14} {lead}", route.path());
            }
        }
        Command::Verify {
            files,
            certificate_type,
            candidate_name,
            roll_number,
            institution,
            year_of_passing,
            certificate_number,
            bulk_files,
            api_connection,
            mode,
        } => {
            let Some(identity) = gate(Route::Verify, session.current()) else {
                return Ok(());
            };
            let identity = identity.clone();
            run_verification(
                &store,
                &settings,
                &identity,
                VerifyInput {
                    files,
                    certificate_type,
                    metadata: CertificateMetadata {
                        candidate_name,
                        roll_number,
                        institution,
                        year_of_passing,
                        certificate_number,
                    },
                    bulk_files,
                    api_connection,
                    mode,
                },
            )
            .await?;
        }
        Command::Dashboard => {
            let Some(identity) = session.current() else {
                println!("Not signed in; redirecting to {}.", Route::Login.path());
                return Ok(());
            };
            show_dashboard(&store, identity).await?;
        }
    }

    Ok(())
}

fn gate<'a>(route: Route, identity: Option<&'a Identity>) -> Option<&'a Identity> {
    match authorize(route, identity) {
        Decision::Render => identity,
        Decision::RedirectToLogin => {
            println!("Not signed in; redirecting to {}.", Route::Login.path());
            None
        }
        Decision::RedirectToRoleHome(home) => {
            println!("Not allowed here; redirecting to {}.", home.path());
            None
        }
    }
}

struct VerifyInput {
    files: Vec<PathBuf>,
    certificate_type: CertificateType,
    metadata: CertificateMetadata,
    bulk_files: Vec<PathBuf>,
    api_connection: Option<ApiProvider>,
    mode: VerificationMode,
}

async fn run_verification(
    store: &Storage,
    settings: &config::Settings,
    identity: &Identity,
    input: VerifyInput,
) -> Result<()> {
    let mut wizard = Wizard::new(identity.role);

    step_banner(&wizard);
    wizard.set_certificate_type(input.certificate_type);
    wizard.next()?;

    step_banner(&wizard);
    let outcome = wizard.add_files(file_metas(&input.files)?);
    for rejected in &outcome.rejected {
        println!("Upload error - {rejected}");
    }
    for file in wizard.files() {
        println!("Uploaded {} ({})", file.name, file.human_size());
    }
    wizard.next()?;

    step_banner(&wizard);
    wizard.set_metadata(input.metadata);
    wizard.next()?;

    step_banner(&wizard);
    if !input.bulk_files.is_empty() || input.api_connection.is_some() {
        wizard.set_bulk_enabled(true)?;
        if !input.bulk_files.is_empty() {
            wizard.add_bulk_files(file_metas(&input.bulk_files)?)?;
        }
        if input.api_connection.is_some() {
            wizard.set_api_connection(input.api_connection)?;
        }
    }
    wizard.next()?;

    step_banner(&wizard);
    wizard.set_verification_mode(input.mode);
    wizard.next()?;

    step_banner(&wizard);
    print_summary(&wizard);

    let backend = SimulatedVerifier::with_timing(
        Duration::from_millis(settings.verifier_tick_ms),
        settings.verifier_step_percent,
    );
    let mut active_stage = None;
    let (payload, report) = process_submission(&mut wizard, identity, &backend, |event| {
        if active_stage != Some(event.stage) {
            active_stage = Some(event.stage);
            println!(
                "  [{:>3}%] {}: {}",
                event.percent,
                event.stage.label(),
                event.stage.detail()
            );
        }
    })
    .await?;

    match &report.outcome {
        VerificationOutcome::Verified => println!("Result: VERIFIED"),
        VerificationOutcome::Failed { reason } => println!("Result: FAILED ({reason})"),
    }
    store.record_submission(&payload, &report).await?;
    println!("Submission {} recorded.", payload.submission_id);

    Ok(())
}

fn step_banner(wizard: &Wizard) {
    let step = wizard.step();
    println!(
        "Step {} of {}: {} ({})",
        step.index(),
        client_core::STEP_COUNT,
        step.title(),
        step.description()
    );
}

fn print_summary(wizard: &Wizard) {
    println!("Review & submit:");
    if let Some(certificate_type) = wizard.certificate_type() {
        println!("  Type:              {}", certificate_type.label());
    }
    println!("  Files:             {}", wizard.files().len());
    println!(
        "  Candidate:         {} ({})",
        wizard.metadata().candidate_name,
        wizard.metadata().roll_number
    );
    println!("  Institution:       {}", wizard.metadata().institution);
    if !wizard.metadata().year_of_passing.is_empty() {
        println!("  Year of passing:   {}", wizard.metadata().year_of_passing);
    }
    if let Some(number) = &wizard.metadata().certificate_number {
        println!("  Certificate #:     {number}");
    }
    if wizard.bulk().enabled {
        println!("  Bulk files:        {}", wizard.bulk().files.len());
        if let Some(provider) = wizard.bulk().api_connection {
            println!("  API connection:    {}", provider.label());
        }
    }
    println!(
        "  Verification mode: {}",
        wizard.verification_mode().label()
    );
    println!(
        "  Estimated processing time: {}",
        wizard.verification_mode().estimated_processing()
    );
}

async fn show_dashboard(store: &Storage, identity: &Identity) -> Result<()> {
    let home = role_home(identity.role);
    match identity.role {
        Role::SuperAdmin => {
            let stats = store.submission_stats().await?;
            println!("{} Super Admin Dashboard ({})", home.path(), identity.email);
            println!("  Total Verifications:  {}", stats.total);
            println!("  Fraud Alerts:         {}", stats.failed);
            println!("  Active Organizations: {}", stats.institutions);
            let recent = store.list_recent(10).await?;
            if !recent.is_empty() {
                println!("Recent submissions:");
                for submission in recent {
                    print_submission_row(&submission);
                }
            }
        }
        Role::Organization | Role::Citizen => {
            println!("{} Dashboard ({})", home.path(), identity.email);
            let history = store.list_submissions_for(&identity.email, 10).await?;
            if history.is_empty() {
                println!("  No verifications yet.");
            } else {
                println!("Your verifications:");
                for submission in history {
                    print_submission_row(&submission);
                }
            }
        }
    }
    Ok(())
}

fn print_submission_row(submission: &storage::StoredSubmission) {
    let outcome = match &submission.outcome {
        VerificationOutcome::Verified => "verified".to_string(),
        VerificationOutcome::Failed { reason } => format!("failed: {reason}"),
    };
    println!(
        "  {}  {:<10} {:<24} {}",
        submission.submitted_at.format("%Y-%m-%d %H:%M"),
        submission.certificate_type.label(),
        submission.candidate_name,
        outcome
    );
}

fn file_metas(paths: &[PathBuf]) -> Result<Vec<FileMeta>> {
    paths
        .iter()
        .map(|path| {
            let metadata = fs::metadata(path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let mime_type = mime_guess::from_path(path)
                .first()
                .map(|mime| mime.essence_str().to_string());
            Ok(FileMeta {
                name,
                size_bytes: metadata.len(),
                mime_type,
            })
        })
        .collect()
}
