use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use speedtest_bot::fetch::auth::ApiKey;
use speedtest_bot::fetch::{BasicClient, HttpClient, send_json};
use tracing::{debug, info};

use crate::services::publisher::{PublishResult, Publisher};

pub const DEFAULT_API_URL: &str = "https://api.twitter.com";

#[derive(Serialize)]
struct TweetRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct Me {
    username: String,
}

#[derive(Deserialize)]
struct CreatedTweet {
    id: String,
    text: String,
}

/// Posts tweets through the Twitter API v2 with an OAuth 2.0 user token.
pub struct TwitterClient<C> {
    http: C,
    base_url: String,
    username: String,
}

impl TwitterClient<ApiKey<BasicClient>> {
    pub async fn connect(access_token: &str, base_url: &str) -> Result<Self> {
        let http = ApiKey::bearer(BasicClient::new(), access_token)?;
        Self::with_client(http, base_url).await
    }
}

impl<C: HttpClient> TwitterClient<C> {
    /// Resolves the account behind the token so posts can be attributed.
    #[tracing::instrument(skip(http))]
    pub async fn with_client(http: C, base_url: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();

        let me: Envelope<Me> = send_json(
            &http,
            Method::GET,
            &format!("{base_url}/2/users/me"),
            None::<&()>,
        )
        .await?;

        debug!(username = %me.data.username, "Authenticated");

        Ok(Self {
            http,
            base_url,
            username: me.data.username,
        })
    }
}

#[async_trait]
impl<C: HttpClient> Publisher for TwitterClient<C> {
    #[tracing::instrument(skip(self, text), fields(author = %self.username, chars = text.chars().count()))]
    async fn publish(&self, text: &str) -> Result<PublishResult> {
        let created: Envelope<CreatedTweet> = send_json(
            &self.http,
            Method::POST,
            &format!("{}/2/tweets", self.base_url),
            Some(&TweetRequest { text }),
        )
        .await?;

        info!(id = %created.data.id, "Tweet created");

        Ok(PublishResult {
            id: created.data.id,
            author: self.username.clone(),
            text: created.data.text,
        })
    }
}
