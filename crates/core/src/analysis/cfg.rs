//! Approximate control-flow graph.
//!
//! Nodes are label occurrences plus distinct symbolic jump/call targets; edges
//! run from the most recent label to each resolvable target. Indirect targets
//! without a `<name>` are not tracked. The derived statistics are cheap
//! stand-ins for real graph algorithms and are only meant to be compared
//! across binaries analyzed the same way.

use std::collections::{BTreeSet, HashMap};

use crate::analysis::normalize::{angle_target, LineKind, Listing};

/// Substrings that mark a line as a jump or call.
const TRANSFER_MARKERS: [&str; 4] = ["jmp", "je", "jne", "call"];

/// Node 0 is the implicit source for transfers seen before any label; it is
/// never counted as a node.
const ENTRY_NODE: u64 = 0;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlFlowGraph {
    nodes: BTreeSet<u64>,
    edges: Vec<(u64, u64)>,
}

impl ControlFlowGraph {
    pub fn build(listing: &Listing) -> Self {
        let mut graph = Self::default();
        let mut next_id = ENTRY_NODE;
        let mut current = ENTRY_NODE;
        let mut targets: HashMap<&str, u64> = HashMap::new();

        for (line, kind) in listing.classified_lines() {
            if let LineKind::Label(_) = kind {
                next_id += 1;
                current = next_id;
                graph.nodes.insert(current);
                continue;
            }
            if !TRANSFER_MARKERS.iter().any(|m| line.contains(m)) {
                continue;
            }
            let Some(target) = angle_target(line) else {
                continue;
            };
            let target_id = *targets.entry(target).or_insert_with(|| {
                next_id += 1;
                next_id
            });
            graph.nodes.insert(target_id);
            graph.edges.push((current, target_id));
        }
        graph
    }

    pub fn node_count(&self) -> u64 {
        self.nodes.len() as u64
    }

    pub fn edge_count(&self) -> u64 {
        self.edges.len() as u64
    }

    pub fn edges(&self) -> &[(u64, u64)] {
        &self.edges
    }

    /// `2E / (N (N - 1))`, 0 for fewer than two nodes.
    pub fn density(&self) -> f64 {
        let n = self.node_count() as f64;
        if self.node_count() > 1 {
            2.0 * self.edge_count() as f64 / (n * (n - 1.0))
        } else {
            0.0
        }
    }

    /// Cycle-count estimate standing in for the SCC count.
    pub fn strongly_connected_components(&self) -> u64 {
        let (n, e) = (self.node_count(), self.edge_count());
        if e > n {
            (e - n + 1).max(1)
        } else {
            1
        }
    }

    /// `floor(sqrt(N))` as a diameter estimate.
    pub fn diameter(&self) -> u64 {
        (self.node_count() as f64).sqrt().floor() as u64
    }
}
