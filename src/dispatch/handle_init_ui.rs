use serde_json::Value;
use tracing::info;

use super::interface::{DispatchContext, ResponseHandler, Result};

/// A fresh session always starts with `InitUI`, so this is where we forget any
/// class definitions from a previous one.  The payload is ignored.
#[derive(Debug)]
pub struct InitUiHandler;

impl ResponseHandler for InitUiHandler {
    fn run(&self, ctx: &mut DispatchContext<'_>, _data: Value) -> Result<()> {
        info!(dropped = ctx.registry.len(), "session reset");
        ctx.registry.reset();
        Ok(())
    }
}
