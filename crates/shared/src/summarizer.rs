use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use url::Url;

use crate::aggregator::{aggregate, MAX_INPUT_CHARS};
use crate::models::Post;

const INFERENCE_BASE_URL: &str = "https://router.huggingface.co/hf-inference/";

pub trait Summarizer {
    fn summarize(&self, text: &str) -> impl Future<Output = Result<String>>;
}

/// Generation bounds passed to the model; decoding is greedy
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GenerationParams {
    pub max_length: u32,
    pub min_length: u32,
    pub do_sample: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: 300,
            min_length: 100,
            do_sample: false,
        }
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParams,
    options: InferenceOptions,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Deserialize)]
struct SummaryText {
    summary_text: String,
}

/// Pretrained summarization model served by the Hugging Face Inference API
pub struct HuggingFaceSummarizer {
    client: Client,
    api_token: Option<String>,
    endpoint: Url,
    params: GenerationParams,
}

impl HuggingFaceSummarizer {
    pub fn new(model: &str, api_token: Option<String>) -> Result<Self> {
        let base_url = Url::parse(INFERENCE_BASE_URL).context("Invalid inference base URL")?;
        Self::with_base_url(base_url, model, api_token)
    }

    pub fn with_base_url(base_url: Url, model: &str, api_token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        let endpoint = base_url
            .join(&format!("models/{}", model))
            .with_context(|| format!("Invalid model id: {}", model))?;

        Ok(Self {
            client,
            api_token,
            endpoint,
            params: GenerationParams::default(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Summarizer for HuggingFaceSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        let request = InferenceRequest {
            inputs: text,
            parameters: self.params,
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        let mut builder = self.client.post(self.endpoint.clone()).json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .context("Failed to send request to inference API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Inference API error: {} - {}", status, error_text);
        }

        let outputs = response
            .json::<Vec<SummaryText>>()
            .await
            .context("Failed to parse inference API response")?;

        outputs
            .into_iter()
            .next()
            .map(|o| o.summary_text)
            .context("Inference API returned no summary")
    }
}

/// Extract, aggregate, and summarize. Generation failures come back as an error string.
pub async fn summarize_all_posts<S: Summarizer>(summarizer: &S, posts: &[Post]) -> String {
    println!("\n🔄 Collecting all post information...");
    let aggregated = aggregate(posts, MAX_INPUT_CHARS);

    println!("\n🔄 Generating overall summary...");
    match summarizer.summarize(&aggregated.text).await {
        Ok(summary) => format!("\n📜 **Overall Summary:**\n{}", summary),
        Err(e) => format!("❌ Error generating summary: {:#}", e),
    }
}
