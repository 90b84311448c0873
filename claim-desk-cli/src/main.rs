mod render;
mod review;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use claim_desk::{
    ClassificationService, ClientConfig, DashboardController, HttpClassificationService,
    InputMode, SubmissionController,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "claim-desk", version, about = "Claim intake and adjuster review console")]
struct Cli {
    /// Base URL of the claim routing service
    #[arg(long)]
    api_url: Option<String>,

    /// Transport timeout for each backend call
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a claim for routing
    Submit(SubmitArgs),
    /// Show the adjuster dashboard
    Dashboard {
        #[arg(long)]
        team: Option<String>,
    },
    /// Show one routing decision
    Claim { claim_id: String },
    /// List decisions, filtered by the service
    List {
        #[arg(long)]
        team: Option<String>,
    },
    /// Check that the routing service is up
    Health,
    /// Interactive review session with approve/reject annotations
    Review,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct SubmitArgs {
    /// Free-text claim narrative
    #[arg(long)]
    text: Option<String>,
    /// Structured claim fields as a JSON object
    #[arg(long)]
    json: Option<String>,
    /// File holding the structured JSON object
    #[arg(long)]
    json_file: Option<PathBuf>,
    /// Submit the built-in example narrative
    #[arg(long)]
    example: bool,
}

/// Initialize tracing based on environment variables. Logs go to stderr.
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "claim_desk=info,claim_desk_cli=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    // flags win over CLAIM_API_URL / CLAIM_API_TIMEOUT_SECS
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url.clone())?;
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs))?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    info!(api_url = %config.api_url, "Using claim routing service");
    let service: Arc<dyn ClassificationService> = Arc::new(HttpClassificationService::new(config)?);

    match cli.command {
        Command::Submit(args) => submit(service, args).await,
        Command::Dashboard { team } => {
            let dashboard = DashboardController::new(service);
            match dashboard.fetch(team.as_deref()).await {
                Ok(snapshot) => print!("{}", render::dashboard(&snapshot)),
                Err(e) => anyhow::bail!(e.user_message()),
            }
            Ok(())
        }
        Command::Claim { claim_id } => {
            let decision = service
                .get_claim(&claim_id)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            print!("{}", render::decision(&decision));
            Ok(())
        }
        Command::List { team } => {
            let decisions = service
                .list_decisions(team.as_deref())
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("{}", serde_json::to_string_pretty(&decisions)?);
            Ok(())
        }
        Command::Health => {
            service
                .health()
                .await
                .map_err(|e| anyhow::anyhow!("routing service unavailable: {e}"))?;
            println!("ok");
            Ok(())
        }
        Command::Review => review::run(DashboardController::new(service)).await,
    }
}

async fn submit(service: Arc<dyn ClassificationService>, args: SubmitArgs) -> anyhow::Result<()> {
    let controller = SubmissionController::new(service);

    if let Some(text) = args.text {
        controller.set_text(text).await;
    } else if args.example {
        controller.load_example().await;
    } else {
        let structured = match (args.json, args.json_file) {
            (Some(json), _) => json,
            (None, Some(path)) => std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?,
            (None, None) => {
                anyhow::bail!("one of --text, --json, --json-file or --example is required")
            }
        };
        controller.switch_mode(InputMode::Structured).await;
        controller.set_structured(structured).await;
    }

    match controller.submit().await {
        Ok(decision) => {
            print!("{}", render::routing_result(&decision));
            Ok(())
        }
        Err(e) => anyhow::bail!(e.user_message()),
    }
}
