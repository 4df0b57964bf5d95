use serde_json::Value;
use tracing::trace;

use super::interface::{
    decode_payload, DispatchContext, ResponseHandler, ResponseKind, Result,
};
use crate::heap::ClassDefinition;

#[derive(Debug)]
pub struct ClassDefsHandler;

impl ResponseHandler for ClassDefsHandler {
    fn run(&self, ctx: &mut DispatchContext<'_>, data: Value) -> Result<()> {
        // Decode everything before registering anything so a malformed payload
        // doesn't leave us with half of it.
        let defs: Vec<ClassDefinition> = decode_payload(ResponseKind::ClassDefs, data)?;
        trace!(count = defs.len(), "class defs");
        for def in defs {
            ctx.registry.register(def);
        }
        Ok(())
    }
}
