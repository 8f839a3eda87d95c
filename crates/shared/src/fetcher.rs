use anyhow::Result;
use std::future::Future;
use std::time::Duration;

use crate::models::Post;
use crate::piazza::PostResponse;

/// Anything that can list recent post ids and fetch a post by id
pub trait PostSource {
    fn recent_ids(&self, limit: usize) -> impl Future<Output = Result<Vec<String>>>;

    fn fetch_post(&self, id: &str) -> impl Future<Output = Result<PostResponse>>;
}

/// Delays are counted in multiples of `unit` (one second in production).
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub unit: Duration,
    pub initial: u32,
    pub ceiling: u32,
    /// Pause after every successful fetch
    pub pacing: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            unit: Duration::from_secs(1),
            initial: 2,
            ceiling: 16,
            pacing: 2,
        }
    }
}

impl BackoffPolicy {
    /// Sleeps taken after each rate-limited attempt before the post is skipped
    pub fn schedule(&self) -> Vec<u32> {
        let mut delays = Vec::new();
        let mut delay = self.initial.max(1);
        loop {
            delays.push(delay);
            delay = delay.saturating_mul(2);
            if delay > self.ceiling {
                return delays;
            }
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.schedule().len()
    }

    fn duration(&self, units: u32) -> Duration {
        self.unit * units
    }
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Fetched(Post),
    Exhausted { id: String, attempts: usize },
}

#[derive(Debug, Default)]
pub struct FetchReport {
    pub outcomes: Vec<FetchOutcome>,
}

impl FetchReport {
    pub fn fetched_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FetchOutcome::Fetched(_)))
            .count()
    }

    pub fn skipped_ids(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                FetchOutcome::Exhausted { id, .. } => Some(id.as_str()),
                FetchOutcome::Fetched(_) => None,
            })
            .collect()
    }

    /// Successfully fetched posts, in feed order
    pub fn into_posts(self) -> Vec<Post> {
        self.outcomes
            .into_iter()
            .filter_map(|o| match o {
                FetchOutcome::Fetched(post) => Some(post),
                FetchOutcome::Exhausted { .. } => None,
            })
            .collect()
    }
}

/// Fetch one post, backing off on rate limits. Any other error is returned as-is.
pub async fn fetch_with_backoff<S: PostSource>(
    source: &S,
    id: &str,
    policy: &BackoffPolicy,
) -> Result<FetchOutcome> {
    let schedule = policy.schedule();

    for delay in &schedule {
        println!("📥 Fetching post {}...", id);

        match source.fetch_post(id).await? {
            PostResponse::Fetched(post) => {
                tokio::time::sleep(policy.duration(policy.pacing)).await;
                println!("✅ Processed post {}", id);
                return Ok(FetchOutcome::Fetched(post));
            }
            PostResponse::RateLimited(_) => {
                eprintln!("⚠️ Rate limit hit! Retrying in {} seconds...", delay);
                tokio::time::sleep(policy.duration(*delay)).await;
            }
        }
    }

    eprintln!("❌ Skipping post {} after multiple failed attempts.", id);
    Ok(FetchOutcome::Exhausted {
        id: id.to_string(),
        attempts: schedule.len(),
    })
}

/// Fetch the `limit` most recent posts one after another
pub async fn fetch_recent_posts<S: PostSource>(
    source: &S,
    limit: usize,
    policy: &BackoffPolicy,
) -> Result<FetchReport> {
    let ids = source.recent_ids(limit).await?;

    let mut report = FetchReport::default();
    for id in ids.iter().take(limit) {
        let outcome = fetch_with_backoff(source, id, policy).await?;
        report.outcomes.push(outcome);
    }

    Ok(report)
}
