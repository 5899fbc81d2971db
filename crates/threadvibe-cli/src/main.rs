//! threadvibe: sentiment and emotion analysis of one Reddit
//! submission's comments.
//!
//! Startup wiring lives here: environment configuration, one-time
//! model load, one-time data-source client construction. The analysis
//! itself runs through [`RequestHandler`], and the success or error
//! payload is printed as JSON on stdout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::Parser;
use tracing::info;

use threadvibe_ai::TextClassifier;
use threadvibe_charts::PngChartRenderer;
use threadvibe_core::{AnalysisResponse, ErrorResponse, RequestHandler};
use threadvibe_reddit::{RedditClient, RedditConfig};

/// Analyze the vibe of a Reddit submission's comments.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Submission URL, e.g. https://www.reddit.com/r/rust/comments/abc123/title/
    url: String,

    /// Directory holding the sentiment model export
    /// (model.onnx, tokenizer.json, config.json)
    #[arg(
        long,
        env = "SENTIMENT_MODEL_DIR",
        default_value = "models/twitter-roberta-base-sentiment"
    )]
    sentiment_model: PathBuf,

    /// Directory holding the emotion model export
    #[arg(
        long,
        env = "EMOTION_MODEL_DIR",
        default_value = "models/emotion-english-distilroberta-base"
    )]
    emotion_model: PathBuf,

    /// Also write the rendered charts as PNG files into this directory
    #[arg(long)]
    charts_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    // Collaborators are constructed once, before any request; a failure
    // here is fatal to the process.
    let config =
        RedditConfig::from_env().context("reading Reddit credentials from the environment")?;
    let reddit = RedditClient::new(config).context("building Reddit client")?;

    info!("loading classification models");
    let sentiment = TextClassifier::load(&args.sentiment_model).with_context(|| {
        format!(
            "loading sentiment model from {}",
            args.sentiment_model.display()
        )
    })?;
    let emotion = TextClassifier::load(&args.emotion_model).with_context(|| {
        format!(
            "loading emotion model from {}",
            args.emotion_model.display()
        )
    })?;
    info!("models loaded and cached");

    let mut handler = RequestHandler::new(reddit, sentiment, emotion, PngChartRenderer::new());

    match handler.handle(&args.url).await {
        Ok(response) => {
            if let Some(dir) = &args.charts_dir {
                write_charts(dir, &response)?;
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(err) => {
            let payload = ErrorResponse::from(&err);
            println!("{}", serde_json::to_string_pretty(&payload)?);
            std::process::exit(1);
        }
    }
}

fn write_charts(dir: &Path, response: &AnalysisResponse) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for (name, encoded) in [
        ("sentiment.png", &response.sentiment_chart),
        ("emotion.png", &response.emotion_chart),
    ] {
        let bytes = BASE64.decode(encoded).context("decoding chart payload")?;
        let path = dir.join(name);
        std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        info!(chart = %path.display(), "wrote chart");
    }
    Ok(())
}
