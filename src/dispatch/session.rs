use std::collections::VecDeque;

use serde::Serialize;
use tracing::{info, trace, trace_span, warn, Instrument};

use super::{
    dispatcher::ResponseDispatcher,
    interface::{ClientError, ResponseKind, Result},
    request_chain::{PendingRequestQueue, RequestChain},
};
use crate::{
    heap::ClassRegistry,
    output::{Notice, PresentationSink},
    transport::Transport,
};

/// The query the client issues when it starts up with nothing else to do.
pub const DEFAULT_QUERY: &str = "histo(x) from Object x";

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Responses received and dispatched.
    pub responses: usize,
    /// Responses whose dispatch failed with a protocol or lookup error.
    pub failures: usize,
}

/// One client session: owns the dispatch state, the request queues, and the
/// sink everything is rendered into.
///
/// ## Ordering
///
/// The session only ever has a single request in flight.  Requests made via
/// `request`/`query` are issued in order, and after each response is
/// dispatched (whatever the outcome) one chained request, if any, is moved from
/// the pending queue to the end of the outbound queue.  This means a chained
/// request is always issued strictly after the handler of the response that
/// released it has finished, and never concurrently with anything else.
///
/// A transport failure is different: there was no response at all, so the run
/// stops with the pending queue left as it was.
pub struct Session<S> {
    transport: Box<dyn Transport + Send + Sync>,
    dispatcher: ResponseDispatcher,
    outbound: VecDeque<String>,
    pending: PendingRequestQueue,
    sink: S,
}

impl<S: PresentationSink> Session<S> {
    pub fn new(transport: Box<dyn Transport + Send + Sync>, sink: S) -> Self {
        info!(transport = %transport.describe(), "new session");
        Session {
            transport,
            dispatcher: ResponseDispatcher::new(),
            outbound: VecDeque::new(),
            pending: PendingRequestQueue::new(),
            sink,
        }
    }

    pub fn request(&mut self, url: &str) -> RequestChain<'_> {
        trace!(url, "request");
        self.outbound.push_back(url.to_string());
        RequestChain::new(&mut self.pending)
    }

    /// Issue an ad hoc query; the query string is URL encoded.
    pub fn query(&mut self, q: &str) -> RequestChain<'_> {
        let url = format!("query?q={}", urlencoding::encode(q));
        self.request(&url)
    }

    pub fn init(&mut self) -> RequestChain<'_> {
        self.query(DEFAULT_QUERY)
    }

    /// Dispatch a response body and then release the next chained request.
    ///
    /// Protocol and lookup errors are surfaced to the sink before being
    /// returned; neither stops the chain.
    pub fn receive(&mut self, body: &str) -> Result<ResponseKind> {
        let result = self.dispatcher.dispatch_str(body, &mut self.sink);

        if let Err(err) = &result {
            warn!(%err, "dispatch failed");
            let notice = match err {
                ClientError::Protocol(details) => Notice::ProtocolMismatch(details.message.clone()),
                other => Notice::Failure(other.to_string()),
            };
            self.sink.notify(notice);
        }

        if let Some(next) = self.pending.pop() {
            trace!(url = %next, "release chained request");
            self.outbound.push_back(next);
        }

        result
    }

    /// Drive requests until there is nothing left to issue.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        while let Some(url) = self.outbound.pop_front() {
            let span = trace_span!("request", url = %url);
            let body = match self.transport.fetch(&url).instrument(span.clone()).await {
                Ok(body) => body,
                Err(err) => {
                    warn!(url = %url, %err, "request failed, halting");
                    self.sink.notify(Notice::Fatal(err.to_string()));
                    return Err(err);
                }
            };

            summary.responses += 1;
            if span.in_scope(|| self.receive(&body)).is_err() {
                summary.failures += 1;
            }
        }

        info!(?summary, "session idle");
        Ok(summary)
    }

    pub fn registry(&self) -> &ClassRegistry {
        self.dispatcher.registry()
    }

    pub fn pending(&self) -> &PendingRequestQueue {
        &self.pending
    }

    /// Requests that have been issued (or released from the pending queue) but
    /// not yet sent.
    pub fn outbound(&self) -> impl Iterator<Item = &str> {
        self.outbound.iter().map(String::as_str)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{output::MemorySink, transport::CannedServer};

    fn session() -> Session<MemorySink> {
        Session::new(Box::new(CannedServer::new()), MemorySink::new())
    }

    #[test]
    fn test_query_url_encoding() {
        let mut s = session();
        s.init();
        s.query("a & b");
        assert_eq!(
            s.outbound().collect::<Vec<_>>(),
            vec![
                "query?q=histo%28x%29%20from%20Object%20x",
                "query?q=a%20%26%20b"
            ]
        );
    }

    #[test]
    fn test_protocol_error_still_releases_chain() {
        let mut s = session();
        s.request("first").then("second");
        assert_eq!(s.outbound().collect::<Vec<_>>(), vec!["first"]);

        let err = s.receive(r#"{"handler": "Bogus", "data": null}"#).unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
        assert!(s.pending().is_empty());
        assert_eq!(s.outbound().collect::<Vec<_>>(), vec!["first", "second"]);
        assert!(matches!(s.sink().notices[0], Notice::ProtocolMismatch(_)));
    }

    #[test]
    fn test_lookup_error_surfaces_as_failure() {
        let mut s = session();
        let err = s
            .receive(r#"{"handler": "Histo", "data": [{"id": 4, "count": 1, "nbytes": 1}]}"#)
            .unwrap_err();
        assert!(matches!(err, ClientError::Lookup(4)));
        assert_eq!(
            s.sink().notices,
            vec![Notice::Failure(
                "lookup error: no class registered with id 4".to_string()
            )]
        );
        assert!(s.sink().tabs.is_empty());
    }
}
