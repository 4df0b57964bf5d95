use serde_json::Value;
use tracing::warn;

use super::interface::{DispatchContext, ResponseHandler, Result};
use crate::output::Notice;

/// The server reporting a problem with the request, like a query that didn't
/// parse.  This is an expected outcome, so it's shown to the user and that's
/// it; nothing else about the session changes.
#[derive(Debug)]
pub struct ErrorHandler;

impl ResponseHandler for ErrorHandler {
    fn run(&self, ctx: &mut DispatchContext<'_>, data: Value) -> Result<()> {
        let message = match data {
            Value::String(s) => s,
            other => other.to_string(),
        };
        warn!(message = %message, "server error response");
        ctx.sink.notify(Notice::ServerError(message));
        Ok(())
    }
}
