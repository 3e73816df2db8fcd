//! Trait and types for posting a status update to a social-media account.

use anyhow::Result;

/// Confirmation returned once a post has been published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    /// Identifier the service assigned to the post.
    pub id: String,
    /// Account that published it.
    pub author: String,
    /// Text as stored by the service.
    pub text: String,
}

/// Abstraction over a status-posting service (e.g., Twitter).
#[async_trait::async_trait]
pub trait Publisher {
    /// Publishes `text` and returns what the service recorded.
    async fn publish(&self, text: &str) -> Result<PublishResult>;
}
