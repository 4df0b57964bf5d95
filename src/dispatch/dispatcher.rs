use tracing::{trace, trace_span};

use super::{
    builder::fab_handler,
    interface::{DispatchContext, RawResponse, ResponseKind, Result},
};
use crate::{heap::ClassRegistry, output::PresentationSink};

/// Resolves a response's declared kind to its handler and runs it against the
/// session's class registry.
///
/// The dispatcher knows nothing about request chaining; the session advances
/// its pending queue after every dispatch regardless of the outcome here.
#[derive(Debug, Default)]
pub struct ResponseDispatcher {
    registry: ClassRegistry,
}

impl ResponseDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub fn dispatch(
        &mut self,
        response: RawResponse,
        sink: &mut dyn PresentationSink,
    ) -> Result<ResponseKind> {
        let span = trace_span!("dispatch", handler = %response.handler);
        let _span_guard = span.enter();

        let kind: ResponseKind = response.handler.parse()?;
        let handler = fab_handler(kind);
        trace!(?handler);

        let mut ctx = DispatchContext {
            registry: &mut self.registry,
            sink,
        };
        handler.run(&mut ctx, response.data)?;
        Ok(kind)
    }

    /// Parse a raw response body and dispatch it.
    pub fn dispatch_str(
        &mut self,
        body: &str,
        sink: &mut dyn PresentationSink,
    ) -> Result<ResponseKind> {
        let response = RawResponse::parse(body)?;
        self.dispatch(response, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ClientError,
        output::{MemorySink, Notice},
    };

    #[test]
    fn test_init_defs_histo() {
        let mut dispatcher = ResponseDispatcher::new();
        let mut sink = MemorySink::new();

        for body in &[
            r#"{"handler": "InitUI", "data": {}}"#,
            r#"{"handler": "ClassDefs", "data": [{"id": 1, "name": "X"}]}"#,
            r#"{"handler": "Histo", "data": [{"id": 1, "count": 5, "nbytes": 50}]}"#,
        ] {
            dispatcher.dispatch_str(body, &mut sink).unwrap();
        }

        assert_eq!(sink.tabs.len(), 1);
        let rows = &sink.tabs[0].table.rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells, vec!["X", "5", "50"]);
        assert!(sink.notices.is_empty());
    }

    #[test]
    fn test_init_ui_resets_registry() {
        let mut dispatcher = ResponseDispatcher::new();
        let mut sink = MemorySink::new();
        dispatcher
            .dispatch_str(
                r#"{"handler": "ClassDefs", "data": [{"id": 1, "name": "a.A"}, {"id": 2, "name": "a.B"}]}"#,
                &mut sink,
            )
            .unwrap();
        assert_eq!(dispatcher.registry().len(), 2);

        let kind = dispatcher
            .dispatch_str(r#"{"handler": "InitUI"}"#, &mut sink)
            .unwrap();
        assert_eq!(kind, ResponseKind::InitUI);
        assert!(dispatcher.registry().is_empty());
    }

    #[test]
    fn test_server_error_is_a_notice() {
        let mut dispatcher = ResponseDispatcher::new();
        let mut sink = MemorySink::new();
        let kind = dispatcher
            .dispatch_str(r#"{"handler": "Error", "data": "syntax error"}"#, &mut sink)
            .unwrap();
        assert_eq!(kind, ResponseKind::Error);
        assert_eq!(
            sink.notices,
            vec![Notice::ServerError("syntax error".to_string())]
        );
    }

    #[test]
    fn test_unknown_kind_and_bad_payload() {
        let mut dispatcher = ResponseDispatcher::new();
        let mut sink = MemorySink::new();

        let err = dispatcher
            .dispatch_str(r#"{"handler": "Bogus", "data": 1}"#, &mut sink)
            .unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));

        let err = dispatcher
            .dispatch_str(r#"{"handler": "ClassDefs", "data": "nope"}"#, &mut sink)
            .unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
        assert!(dispatcher.registry().is_empty());
    }

    #[test]
    fn test_unregistered_sample_fails_loudly() {
        let mut dispatcher = ResponseDispatcher::new();
        let mut sink = MemorySink::new();
        dispatcher
            .dispatch_str(
                r#"{"handler": "ClassDefs", "data": [{"id": 1, "name": "a.A"}]}"#,
                &mut sink,
            )
            .unwrap();

        let err = dispatcher
            .dispatch_str(
                r#"{"handler": "Histo", "data": [{"id": 1, "count": 1, "nbytes": 8}, {"id": 9, "count": 0, "nbytes": 0}]}"#,
                &mut sink,
            )
            .unwrap_err();
        assert!(matches!(err, ClientError::Lookup(9)));
        assert!(sink.tabs.is_empty());
    }

    #[test]
    fn test_overflowing_totals_fail_the_response() {
        let mut dispatcher = ResponseDispatcher::new();
        let mut sink = MemorySink::new();
        dispatcher
            .dispatch_str(
                r#"{"handler": "ClassDefs", "data": [{"id": 1, "name": "a.A"}, {"id": 2, "name": "a.B"}]}"#,
                &mut sink,
            )
            .unwrap();

        let err = dispatcher
            .dispatch_str(
                r#"{"handler": "Histo", "data": [{"id": 1, "count": 18446744073709551615, "nbytes": 8}, {"id": 2, "count": 1, "nbytes": 8}]}"#,
                &mut sink,
            )
            .unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
        assert!(err.to_string().contains("totals overflow"));
        assert!(sink.tabs.is_empty());
    }
}
