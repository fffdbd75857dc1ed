use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use careerpath::{api, catalog::WARM_SET, config::Config};

#[derive(Parser)]
#[command(name = "careerpath")]
#[command(about = "Career roadmap advisor that grows a learning tree from chat")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the CareerPath server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, env = "PORT", default_value = "5050")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[command(flatten)]
        config: Config,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "careerpath=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(host: &str, port: u16, config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting CareerPath server on port {}", port);

    let advisor = config.build_advisor()?;
    if config.warm_cache {
        if let Some(catalog) = config.catalog() {
            tokio::spawn(async move { catalog.warm(WARM_SET).await });
        }
    }

    let app = api::create_router(advisor);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("CareerPath server listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // No subcommand: serve with defaults and environment settings
    let command = match Cli::parse().command {
        Some(command) => command,
        None => Cli::parse_from(["careerpath", "serve"])
            .command
            .ok_or_else(|| anyhow::anyhow!("failed to build default serve command"))?,
    };

    match command {
        Commands::Serve { port, host, config } => serve(&host, port, config).await,
    }
}
