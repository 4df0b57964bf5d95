use std::collections::{vec_deque, VecDeque};

use tracing::trace;

/// Deferred requests, fired one at a time, each only after the handler of the
/// response before it has completed.
///
/// There is exactly one of these per session and it is shared by every chain.
/// If two independent callers both chain requests, their follow-ups interleave
/// in the order `then` was called, not per caller.
#[derive(Debug, Default)]
pub struct PendingRequestQueue {
    urls: VecDeque<String>,
}

impl PendingRequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, url: String) {
        self.urls.push_back(url);
    }

    pub fn pop(&mut self) -> Option<String> {
        self.urls.pop_front()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, String> {
        self.urls.iter()
    }
}

/// Handle returned by every request, used to schedule follow-ups.
pub struct RequestChain<'a> {
    pending: &'a mut PendingRequestQueue,
}

impl<'a> RequestChain<'a> {
    pub fn new(pending: &'a mut PendingRequestQueue) -> Self {
        RequestChain { pending }
    }

    /// Queue `url` to be fired after a later response's handler finishes.
    /// May be called repeatedly; follow-ups fire in call order.
    pub fn then(&mut self, url: &str) -> &mut Self {
        trace!(url, queued = self.pending.len(), "chain request");
        self.pending.push(url.to_string());
        self
    }
}

#[test]
fn test_chain_appends_in_call_order() {
    let mut pending = PendingRequestQueue::new();
    {
        let mut chain = RequestChain::new(&mut pending);
        chain.then("b");
        chain.then("c");
    }
    RequestChain::new(&mut pending).then("d").then("e");

    assert_eq!(pending.len(), 4);
    assert_eq!(
        pending.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["b", "c", "d", "e"]
    );
    assert_eq!(pending.pop().as_deref(), Some("b"));
    assert_eq!(pending.len(), 3);
}
