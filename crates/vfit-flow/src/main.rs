//! Try-on workflow binary.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vfit_flow::{run, FlowConfig, FlowRequest};
use vfit_storage::S3Store;

#[derive(Parser, Debug)]
#[command(
    name = "vfit-flow",
    about = "Generate a try-on image from a garment image and a model prompt"
)]
struct Args {
    /// S3 URI of the garment image
    #[arg(short, long, env = "FLOW_GARMENT_URI")]
    garment_uri: String,

    /// Prompt describing the model to generate
    #[arg(short, long, env = "FLOW_MODEL_PROMPT")]
    model_prompt: String,

    /// Garment category
    #[arg(short = 't', long, env = "FLOW_CATEGORY")]
    category: String,

    /// S3 URI for the rendered try-on image
    #[arg(short, long, env = "FLOW_OUTPUT_URI")]
    output_uri: String,
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vfit=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    let args = Args::parse();
    info!("Starting vfit-flow");

    let config = FlowConfig::from_env();
    let store = S3Store::from_env().await;

    let request = FlowRequest {
        garment_uri: args.garment_uri,
        model_prompt: args.model_prompt,
        category: args.category,
        output_uri: args.output_uri,
    };

    if let Err(e) = run(&config, &store, &request).await {
        error!("Workflow failed: {}", e);
        std::process::exit(1);
    }
}
