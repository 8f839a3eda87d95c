use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use shared::{
    fetch_recent_posts, summarize_all_posts, BackoffPolicy, Config, FetchOutcome,
    HuggingFaceSummarizer, PiazzaClient,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "piazza-summary")]
#[command(about = "Summarize recent Piazza discussions with a pretrained summarization model")]
struct Args {
    /// Path to a JSON config file (defaults to ./config.json, then environment)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Class network id, overriding PIAZZA_CLASSCODE
    #[arg(long)]
    network: Option<String>,

    /// Number of recent posts to fetch
    #[arg(short = 'n', long, default_value = "10")]
    posts: usize,

    /// Summarization model id on the Hugging Face hub
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(network) = args.network {
        config.class_code = network;
    }
    if let Some(model) = args.model {
        config.model = model;
    }

    println!("🔐 Logging in to Piazza as {}...", config.email);
    let client = PiazzaClient::new()?;
    client
        .login(&config.email, &config.password)
        .await
        .context("Failed to authenticate with Piazza")?;

    let network = client.network(&config.class_code);
    println!("✓ Connected to network {}", network.nid());

    println!("\n📚 Fetching the {} most recent posts...", args.posts);
    let report = fetch_recent_posts(&network, args.posts, &BackoffPolicy::default())
        .await
        .context("Failed to fetch posts")?;

    println!(
        "✓ Fetched {}/{} posts",
        report.fetched_count(),
        report.outcomes.len()
    );
    for outcome in &report.outcomes {
        if let FetchOutcome::Exhausted { id, attempts } = outcome {
            println!("  ✗ {} (gave up after {} attempts)", id, attempts);
        }
    }

    let posts = report.into_posts();
    if posts.is_empty() {
        eprintln!("⚠️ No posts could be fetched; summarizing empty text.");
    }

    let summarizer = HuggingFaceSummarizer::new(&config.model, config.hf_api_token.clone())?;
    println!("\n🤖 Using model {} at {}", config.model, summarizer.endpoint());

    println!("\n--- Summarizing Piazza Discussions ---\n");
    let overall_summary = summarize_all_posts(&summarizer, &posts).await;
    println!("{}", overall_summary);
    println!(
        "\n🕒 Generated {} from {} posts",
        Local::now().format("%Y-%m-%d %H:%M"),
        posts.len()
    );

    Ok(())
}
