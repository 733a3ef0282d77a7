//! Feed source collaborator.
//!
//! Resolution and retrieval go through the Twitter v1.1 REST API with a
//! bearer token. The pipeline only sees the [`FeedSource`] trait; every
//! failure surfaces as an error the cycle runner turns into a
//! skip-this-account.

use crate::models::PostItem;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Where posts come from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Resolve a handle to the provider's account id. `Ok(None)` means
    /// the handle does not exist; transport failures are `Err`.
    async fn resolve(&self, handle: &str) -> Result<Option<String>>;

    /// The most recent `count` posts for a resolved account, newest first.
    async fn fetch_recent(&self, account_id: &str, count: usize) -> Result<Vec<PostItem>>;
}

/// Twitter-backed feed source.
pub struct TwitterFeed {
    client: reqwest::Client,
    api_base: String,
    bearer_token: String,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id_str: String,
}

#[derive(Debug, Deserialize)]
struct ApiTweet {
    id_str: String,
    /// Present when the timeline is fetched with `tweet_mode=extended`.
    #[serde(default)]
    full_text: Option<String>,
    /// Truncated fallback on older response shapes.
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    created_at: String,
}

impl From<ApiTweet> for PostItem {
    fn from(tweet: ApiTweet) -> Self {
        PostItem {
            id: tweet.id_str,
            text: tweet.full_text.or(tweet.text).unwrap_or_default(),
            timestamp: tweet.created_at,
        }
    }
}

impl TwitterFeed {
    pub fn new(api_base: String, bearer_token: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build feed HTTP client")?;
        Ok(Self {
            client,
            api_base,
            bearer_token,
        })
    }
}

#[async_trait]
impl FeedSource for TwitterFeed {
    async fn resolve(&self, handle: &str) -> Result<Option<String>> {
        let url = format!("{}/users/show.json", self.api_base);
        debug!("Resolving @{} via {}", handle, url);

        let response = self
            .client
            .get(&url)
            .query(&[("screen_name", handle)])
            .bearer_auth(&self.bearer_token)
            .send()
            .await
            .context("feed source unreachable")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(anyhow!("user lookup failed: HTTP {}", response.status()));
        }

        let user: ApiUser = response
            .json()
            .await
            .context("failed to parse user lookup response")?;
        Ok(Some(user.id_str))
    }

    async fn fetch_recent(&self, account_id: &str, count: usize) -> Result<Vec<PostItem>> {
        let url = format!("{}/statuses/user_timeline.json", self.api_base);
        let count = count.to_string();
        debug!("Fetching {} posts for user id {}", count, account_id);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("user_id", account_id),
                ("count", count.as_str()),
                ("tweet_mode", "extended"),
            ])
            .bearer_auth(&self.bearer_token)
            .send()
            .await
            .context("feed source unreachable")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("timeline fetch failed: HTTP {}: {}", status, body));
        }

        let tweets: Vec<ApiTweet> = response
            .json()
            .await
            .context("failed to parse timeline response")?;
        Ok(tweets.into_iter().map(PostItem::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_response_maps_to_posts() {
        let raw = r#"[
            {"id_str": "12345", "full_text": "full version", "text": "trunc…", "created_at": "Wed Oct 10 20:19:24 +0000 2018"},
            {"id_str": "67890", "text": "only short text"}
        ]"#;

        let tweets: Vec<ApiTweet> = serde_json::from_str(raw).unwrap();
        let posts: Vec<PostItem> = tweets.into_iter().map(PostItem::from).collect();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "12345");
        // Extended text wins over the truncated field.
        assert_eq!(posts[0].text, "full version");
        assert_eq!(posts[0].timestamp, "Wed Oct 10 20:19:24 +0000 2018");
        assert_eq!(posts[1].text, "only short text");
        assert_eq!(posts[1].timestamp, "");
    }

    #[test]
    fn test_user_response_parses() {
        let user: ApiUser = serde_json::from_str(r#"{"id_str": "999", "name": "x"}"#).unwrap();
        assert_eq!(user.id_str, "999");
    }
}
