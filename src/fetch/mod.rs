mod client;
mod basic;
pub mod auth;

pub use client::HttpClient;
pub use basic::BasicClient;

use anyhow::{Context, Result};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Sends a request with an optional JSON body and decodes a JSON response.
///
/// # Errors
///
/// Returns an error if the URL is invalid, the request fails, the server
/// answers with a non-success status, or the body is not the expected JSON.
pub async fn send_json<C, B, T>(
    client: &C,
    method: reqwest::Method,
    url: &str,
    body: Option<&B>,
) -> Result<T>
where
    C: HttpClient,
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let mut req = reqwest::Request::new(
        method,
        url.parse().with_context(|| format!("Invalid URL {url}"))?,
    );

    if let Some(body) = body {
        *req.body_mut() = Some(serde_json::to_vec(body)?.into());
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    let resp = client
        .execute(req)
        .await
        .with_context(|| format!("Failed to send request to {url}"))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow::anyhow!("{url} returned status {status}: {body}"));
    }

    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse response from {url}"))
}
