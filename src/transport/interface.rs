use async_trait::async_trait;

use crate::error::Result;

/// Unified exposure for talking to a heap-profiling server, either a real one
/// over HTTP or a canned set of responses for tests and offline replay.
///
/// ## Runtime Assumptions
///
/// The session drives a transport strictly sequentially; it never has more
/// than one `fetch` outstanding.  Implementations don't need to worry about
/// ordering between requests, but they must not block the runtime.
///
/// There is no timeout policy at this layer.  A request that never completes
/// stalls the chain it belongs to.
#[async_trait]
pub trait Transport {
    /// Human readable name of the backend, for logging.
    fn describe(&self) -> String;

    /// Issue a GET for the given (usually relative) URL and return the raw
    /// response body.  Any failure here is a `ClientError::Transport`.
    async fn fetch(&self, url: &str) -> Result<String>;
}
