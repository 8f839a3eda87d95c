// Public modules
pub mod aggregator;
pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod models;
pub mod piazza;
pub mod summarizer;

// Re-export commonly used types
pub use aggregator::{aggregate, Aggregated, MAX_INPUT_CHARS};
pub use config::Config;
pub use extractor::extract_relevant_info;
pub use fetcher::{fetch_recent_posts, BackoffPolicy, FetchOutcome, FetchReport, PostSource};
pub use models::{Post, Reply};
pub use piazza::{Network, PiazzaClient, PostResponse};
pub use summarizer::{summarize_all_posts, HuggingFaceSummarizer, Summarizer};
