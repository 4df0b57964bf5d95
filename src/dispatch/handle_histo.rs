use serde_json::Value;
use tracing::{info, trace_span};

use super::interface::{
    decode_payload, DispatchContext, ResponseHandler, ResponseKind, Result,
};
use crate::heap::{AggregationTree, Sample};

pub const HISTOGRAM_TAB_NAME: &str = "Histogram";

/// Build a fresh package hierarchy from the samples and render its top level
/// into a new tab.
///
/// Every sample's class must already be registered.  A single unknown id fails
/// the whole response; rendering totals that silently omit some samples would
/// be misleading.
#[derive(Debug)]
pub struct HistoHandler;

impl ResponseHandler for HistoHandler {
    fn run(&self, ctx: &mut DispatchContext<'_>, data: Value) -> Result<()> {
        let samples: Vec<Sample> = decode_payload(ResponseKind::Histo, data)?;

        let mut tree = AggregationTree::new();
        {
            let _span = trace_span!("aggregate", samples = samples.len()).entered();
            for sample in &samples {
                let class_def = ctx.registry.get(sample.class_id)?;
                tree.add(class_def, sample.count, sample.byte_size)?;
            }
        }

        let root = tree.root();
        info!(
            samples = samples.len(),
            count = root.count,
            bytes = root.byte_size,
            "histogram built"
        );
        tree.render_tab(&mut *ctx.sink, HISTOGRAM_TAB_NAME);
        Ok(())
    }
}
