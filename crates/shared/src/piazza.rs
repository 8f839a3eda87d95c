use anyhow::{Context, Result};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;

use crate::fetcher::PostSource;
use crate::models::{Feed, Post};

const PIAZZA_BASE_URL: &str = "https://piazza.com/";

/// Result of a single `content.get` call
#[derive(Debug, Clone)]
pub enum PostResponse {
    Fetched(Post),
    /// Piazza refused the request; worth retrying after a delay
    RateLimited(String),
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

enum RpcOutcome {
    Ok(Value),
    Refused(String),
}

pub struct PiazzaClient {
    client: Client,
    jar: Arc<Jar>,
    base_url: Url,
}

impl PiazzaClient {
    pub fn new() -> Result<Self> {
        let base_url = Url::parse(PIAZZA_BASE_URL).context("Invalid Piazza base URL")?;
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: Url) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .cookie_provider(Arc::clone(&jar))
            .user_agent("piazza-summary/0.1")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            jar,
            base_url,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        match self
            .rpc("user.login", json!({ "email": email, "pass": password }))
            .await
            .context("Failed to reach Piazza for login")?
        {
            RpcOutcome::Ok(_) => Ok(()),
            RpcOutcome::Refused(reason) => anyhow::bail!("Piazza login failed: {}", reason),
        }
    }

    /// Handle to one class network, identified by its class code (nid)
    pub fn network(&self, class_code: &str) -> Network<'_> {
        Network {
            client: self,
            nid: class_code.to_string(),
        }
    }

    // Piazza expects the session cookie echoed back as a CSRF header
    fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let cookies = header.to_str().ok()?;
        cookies
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == "session_id")
            .map(|(_, value)| value.to_string())
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<RpcOutcome> {
        let mut url = self
            .base_url
            .join("logic/api")
            .context("Failed to build Piazza API URL")?;
        url.query_pairs_mut().append_pair("method", method);

        let mut request = self
            .client
            .post(url)
            .json(&json!({ "method": method, "params": params }));
        if let Some(token) = self.csrf_token() {
            request = request.header("CSRF-Token", token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to Piazza", method))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(RpcOutcome::Refused(format!("HTTP {}", status)));
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Piazza API returned error: {} - {}", status, error_text);
        }

        let rpc_response = response
            .json::<RpcResponse>()
            .await
            .with_context(|| format!("Failed to parse Piazza {} response", method))?;

        match rpc_response.error {
            Some(Value::Null) | None => {
                Ok(RpcOutcome::Ok(rpc_response.result.unwrap_or(Value::Null)))
            }
            Some(Value::String(reason)) => Ok(RpcOutcome::Refused(reason)),
            Some(other) => Ok(RpcOutcome::Refused(other.to_string())),
        }
    }
}

pub struct Network<'a> {
    client: &'a PiazzaClient,
    nid: String,
}

impl Network<'_> {
    pub fn nid(&self) -> &str {
        &self.nid
    }

    pub async fn get_feed(&self) -> Result<Feed> {
        match self
            .client
            .rpc("network.get_my_feed", json!({ "nid": self.nid }))
            .await?
        {
            RpcOutcome::Ok(result) => {
                serde_json::from_value(result).context("Failed to parse Piazza feed")
            }
            RpcOutcome::Refused(reason) => {
                anyhow::bail!("Piazza refused feed for network {}: {}", self.nid, reason)
            }
        }
    }

    pub async fn get_post(&self, cid: &str) -> Result<PostResponse> {
        match self
            .client
            .rpc("content.get", json!({ "cid": cid, "nid": self.nid }))
            .await?
        {
            RpcOutcome::Ok(result) => {
                let post = serde_json::from_value(result)
                    .with_context(|| format!("Failed to parse Piazza post {}", cid))?;
                Ok(PostResponse::Fetched(post))
            }
            RpcOutcome::Refused(reason) => Ok(PostResponse::RateLimited(reason)),
        }
    }
}

impl PostSource for Network<'_> {
    async fn recent_ids(&self, limit: usize) -> Result<Vec<String>> {
        let feed = self.get_feed().await?;
        Ok(feed.feed.into_iter().take(limit).map(|item| item.id).collect())
    }

    async fn fetch_post(&self, id: &str) -> Result<PostResponse> {
        self.get_post(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> PiazzaClient {
        PiazzaClient::with_base_url(Url::parse(&server.url()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_login_then_feed_sends_csrf_token() {
        let mut server = mockito::Server::new_async().await;
        let login = server
            .mock("POST", "/logic/api")
            .match_query(Matcher::UrlEncoded("method".into(), "user.login".into()))
            .with_header("set-cookie", "session_id=tok123; Path=/")
            .with_body(r#"{"result": "OK", "error": null}"#)
            .create_async()
            .await;
        let feed = server
            .mock("POST", "/logic/api")
            .match_query(Matcher::UrlEncoded("method".into(), "network.get_my_feed".into()))
            .match_header("CSRF-Token", "tok123")
            .with_body(r#"{"result": {"feed": [{"id": "p1"}, {"id": "p2"}]}, "error": null}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        client.login("a@b.c", "pw").await.unwrap();
        let network = client.network("nid42");
        let ids = network.recent_ids(1).await.unwrap();

        assert_eq!(ids, vec!["p1".to_string()]);
        login.assert_async().await;
        feed.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_rejected_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/logic/api")
            .match_query(Matcher::Any)
            .with_body(r#"{"result": null, "error": "Email or password incorrect"}"#)
            .create_async()
            .await;

        let err = client_for(&server).login("a@b.c", "bad").await.unwrap_err();
        assert!(err.to_string().contains("Email or password incorrect"));
    }

    #[tokio::test]
    async fn test_get_post_error_is_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/logic/api")
            .match_query(Matcher::UrlEncoded("method".into(), "content.get".into()))
            .with_body(r#"{"result": null, "error": "Request Rate Exceeded"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let response = client.network("nid").get_post("p1").await.unwrap();
        assert!(matches!(response, PostResponse::RateLimited(ref r) if r == "Request Rate Exceeded"));
    }

    #[tokio::test]
    async fn test_get_post_http_429_is_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/logic/api")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let client = client_for(&server);
        let response = client.network("nid").get_post("p1").await.unwrap();
        assert!(matches!(response, PostResponse::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_get_post_server_error_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/logic/api")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = client_for(&server);
        assert!(client.network("nid").get_post("p1").await.is_err());
    }

    #[tokio::test]
    async fn test_get_post_parses_children() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/logic/api")
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJson(json!({"params": {"cid": "p9", "nid": "nid"}})))
            .with_body(
                r#"{"result": {
                    "id": "p9",
                    "nr": 9,
                    "history": [{"content": "How do I free memory?", "subject": "free"}],
                    "children": [{"type": "i_answer", "history": [{"content": "Call drop."}]}]
                }, "error": null}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        match client.network("nid").get_post("p9").await.unwrap() {
            PostResponse::Fetched(post) => {
                assert_eq!(post.nr, Some(9));
                assert_eq!(post.question(), Some("How do I free memory?"));
                assert!(post.replies()[0].is_instructor());
            }
            other => panic!("expected a post, got {:?}", other),
        }
    }
}
