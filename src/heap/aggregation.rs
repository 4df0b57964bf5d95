//! Package hierarchy roll-up of histogram samples.
//!
//! Every sample is added along the dotted path of its class name, bumping the
//! totals of each node it passes through.  This means a node's totals are
//! always the sum of everything at or beneath it without needing a separate
//! aggregation pass.
//!
//! Note that a class name can also be a package prefix of another class name
//! (ex: `a.B` and `a.B.Inner`).  In that case the `a.B` node mixes its own
//! samples with those of its children; the node doesn't distinguish the two.

use std::collections::HashMap;

use itertools::Itertools;
use lexical_sort::natural_lexical_cmp;

use super::ClassDefinition;
use crate::{
    error::{ClientError, Result},
    output::{rowtd, rowth, PresentationSink, Table},
};

pub const HIERARCHY_DELIMITER: char = '.';

#[derive(Debug)]
pub struct AggregationNode {
    pub label: String,
    pub count: u64,
    pub byte_size: u64,
    children: HashMap<String, AggregationNode>,
}

impl AggregationNode {
    pub fn new(label: &str) -> Self {
        AggregationNode {
            label: label.to_string(),
            count: 0,
            byte_size: 0,
            children: HashMap::new(),
        }
    }

    /// Fails without touching any totals if the sample would overflow them.
    /// This node's totals bound those of every node beneath it, so checking
    /// here covers the whole path.
    pub fn add(&mut self, class_def: &ClassDefinition, count: u64, byte_size: u64) -> Result<()> {
        let (new_count, new_byte_size) = match (
            self.count.checked_add(count),
            self.byte_size.checked_add(byte_size),
        ) {
            (Some(c), Some(b)) => (c, b),
            _ => {
                return Err(ClientError::protocol(format!(
                    "totals overflow adding {} ({} objects, {} bytes)",
                    class_def.name, count, byte_size
                )))
            }
        };

        let mut node = self;
        node.count = new_count;
        node.byte_size = new_byte_size;
        for segment in class_def.name.split(HIERARCHY_DELIMITER) {
            node = node
                .children
                .entry(segment.to_string())
                .or_insert_with(|| AggregationNode::new(segment));
            node.count += count;
            node.byte_size += byte_size;
        }
        Ok(())
    }

    pub fn child(&self, label: &str) -> Option<&AggregationNode> {
        self.children.get(label)
    }

    /// Immediate children in rendering order.
    pub fn children(&self) -> Vec<&AggregationNode> {
        self.children
            .values()
            .sorted_by(|a, b| {
                natural_lexical_cmp(&a.label, &b.label).then_with(|| a.label.cmp(&b.label))
            })
            .collect()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// One row per immediate child; deeper levels are revealed by rendering
    /// the child itself.
    pub fn render(&self) -> Table {
        Table {
            header: rowth(vec!["Class", "Count", "Bytes"]),
            rows: self
                .children()
                .into_iter()
                .map(|child| {
                    rowtd(vec![
                        child.label.clone(),
                        child.count.to_string(),
                        child.byte_size.to_string(),
                    ])
                })
                .collect(),
        }
    }
}

/// Owner of the (label-less) root node.  A fresh tree is built for each
/// histogram response.
#[derive(Debug)]
pub struct AggregationTree {
    root: AggregationNode,
}

impl Default for AggregationTree {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregationTree {
    pub fn new() -> Self {
        AggregationTree {
            root: AggregationNode::new(""),
        }
    }

    pub fn root(&self) -> &AggregationNode {
        &self.root
    }

    pub fn add(&mut self, class_def: &ClassDefinition, count: u64, byte_size: u64) -> Result<()> {
        self.root.add(class_def, count, byte_size)
    }

    /// Find the node for a dotted path; the empty path is the root.
    pub fn node(&self, path: &str) -> Option<&AggregationNode> {
        if path.is_empty() {
            return Some(&self.root);
        }
        path.split(HIERARCHY_DELIMITER)
            .try_fold(&self.root, |node, segment| node.child(segment))
    }

    pub fn render(&self) -> Table {
        self.root.render()
    }

    /// Render the level beneath `path`, for on-demand expansion.
    pub fn expand(&self, path: &str) -> Option<Table> {
        self.node(path).map(AggregationNode::render)
    }

    /// Render the root level into its own tab in the sink.
    pub fn render_tab(&self, sink: &mut dyn PresentationSink, name: &str) -> String {
        sink.add_tab(name, self.render())
    }
}
