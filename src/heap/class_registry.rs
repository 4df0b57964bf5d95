use std::collections::HashMap;

use tracing::trace;

use super::ClassDefinition;
use crate::error::{ClientError, Result};

/// Session-scoped id → class definition table.
///
/// Entries are only ever added (or overwritten by a later definition with the
/// same id) until the session is reset by an `InitUI` response.  The server is
/// expected to define a class before any sample references it.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    defs: HashMap<u64, ClassDefinition>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins on a duplicate id.
    pub fn register(&mut self, def: ClassDefinition) {
        trace!(id = def.id, name = %def.name, "register class");
        self.defs.insert(def.id, def);
    }

    pub fn get(&self, id: u64) -> Result<&ClassDefinition> {
        self.defs.get(&id).ok_or(ClientError::Lookup(id))
    }

    pub fn reset(&mut self) {
        self.defs.clear();
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
