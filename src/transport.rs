use crate::error::Result;

/// Plain-text HTTP, as much of it as the page needs.
///
/// Non-2xx replies are errors ([`GlueError::Status`](crate::error::GlueError::Status)).
pub trait Transport {
    async fn get_text(&self, url: &str) -> Result<String>;

    /// POST `body` with `Content-Type: text/plain` and return the reply body.
    async fn post_text(&self, url: &str, body: String) -> Result<String>;
}
