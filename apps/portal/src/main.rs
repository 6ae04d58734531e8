use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{builder::PossibleValuesParser, Parser, Subcommand};
use client_core::{
    config::{load_settings_from, normalize_backend_url},
    samples::CURRENCIES,
    BranchDraft, ClientError, Dashboard, Settings, SyncPolicy,
};
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(name = "portal", about = "Hotel operations portal dashboard")]
struct Args {
    /// Backend base URL; overrides portal.toml and the environment.
    #[arg(long)]
    server_url: Option<String>,
    /// Settings file to read instead of ./portal.toml.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Keep collections that loaded even if another one failed.
    #[arg(long)]
    partial_sync: bool,
    /// Print the dashboard as JSON.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Sign in, sync and print the dashboard.
    Dashboard,
    AddBranch {
        #[arg(long, default_value = "Downtown")]
        name: String,
        #[arg(long, default_value = "City Center")]
        location: String,
        #[arg(long, default_value = "USD", value_parser = PossibleValuesParser::new(CURRENCIES))]
        currency: String,
    },
    /// Record the sample spa payment against the first branch.
    AddPayment {
        #[arg(long, default_value = "USD", value_parser = PossibleValuesParser::new(CURRENCIES))]
        currency: String,
    },
    /// Open the sample HVAC ticket against the first branch.
    AddMaintenance,
    /// Enroll the sample guest member.
    EnrollMember,
}

fn resolve_settings(args: &Args) -> Result<Settings> {
    let mut settings = load_settings_from(args.config.as_deref(), |key| std::env::var(key).ok())?;
    if let Some(url) = &args.server_url {
        settings.backend_url = normalize_backend_url(url)?;
    }
    if args.partial_sync {
        settings.sync_policy = SyncPolicy::RetainPartial;
    }
    Ok(settings)
}

/// Runs one command against a fresh session; returns non-fatal notices.
async fn run(dashboard: &mut Dashboard, command: Command) -> Result<Vec<String>, ClientError> {
    let mut notices = Vec::new();
    if let Some(report) = dashboard.sign_in().await? {
        notices.extend(report.failed.iter().map(render::describe_failure));
    }

    match command {
        Command::Dashboard => {}
        Command::AddBranch {
            name,
            location,
            currency,
        } => {
            let draft = BranchDraft {
                name,
                location,
                currency,
            };
            let branch = dashboard.create_branch(&draft).await?;
            notices.push(format!("created branch #{} {}", branch.id, branch.name));
        }
        Command::AddPayment { currency } => {
            let payment = dashboard.create_payment(&currency).await?;
            notices.push(format!(
                "created payment #{} {} {}",
                payment.id, payment.amount, payment.currency
            ));
        }
        Command::AddMaintenance => {
            let ticket = dashboard.create_maintenance_ticket().await?;
            notices.push(format!("created maintenance ticket #{} {}", ticket.id, ticket.title));
        }
        Command::EnrollMember => {
            let member = dashboard.enroll_loyalty_member().await?;
            notices.push(format!("enrolled member #{} {}", member.id, member.email));
        }
    }
    Ok(notices)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let settings = resolve_settings(&args)?;
    tracing::info!(backend = %settings.backend_url, policy = %settings.sync_policy, "starting portal");

    let mut dashboard = Dashboard::from_settings(&settings);
    let outcome = run(&mut dashboard, args.command.clone().unwrap_or(Command::Dashboard)).await;

    if args.json {
        println!(
            "{}",
            render::render_json(dashboard.session().state(), dashboard.state())?
        );
    } else {
        print!(
            "{}",
            render::render_dashboard(dashboard.session().state(), dashboard.state(), |kind| {
                dashboard.can_create(kind)
            })
        );
    }

    match outcome {
        Ok(notices) => {
            for notice in notices {
                eprintln!("{notice}");
            }
            Ok(())
        }
        Err(err) => bail!(render::describe_failure(&err)),
    }
}
