use super::paths::{AnalyzerLimits, FlowchartPath, enumerate_all_paths};
use crate::flowchart::{ExecutableFlowchart, NodeKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Euler–Mascheroni constant, for the coupon-collector estimate.
const EULER_GAMMA: f64 = 0.5772156649;
const MIN_ITERATIONS: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeCounts {
    pub instruction: usize,
    pub decision: usize,
    pub checkpoint: usize,
    pub milestone: usize,
    pub embellishment: usize,
    pub terminal: usize,
}

impl NodeCounts {
    pub fn total(&self) -> usize {
        self.instruction
            + self.decision
            + self.checkpoint
            + self.milestone
            + self.embellishment
            + self.terminal
    }

    fn count(&mut self, kind: NodeKind) {
        let slot = match kind {
            NodeKind::Instruction => &mut self.instruction,
            NodeKind::Decision => &mut self.decision,
            NodeKind::Checkpoint => &mut self.checkpoint,
            NodeKind::Milestone => &mut self.milestone,
            NodeKind::Embellishment => &mut self.embellishment,
            NodeKind::Terminal => &mut self.terminal,
        };
        *slot += 1;
    }
}

/// Graph-wide statistics over a flowchart and its enumerated routes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowchartStats {
    pub node_counts: NodeCounts,
    pub edge_count: usize,
    /// `E - N + 2`.
    pub cyclomatic_complexity: i64,
    pub path_count: usize,
    pub min_path_length: usize,
    pub max_path_length: usize,
    pub min_decisions: usize,
    pub max_decisions: usize,
    pub min_checkpoints: usize,
    pub max_checkpoints: usize,
    pub recommended_iterations: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowchartAnalysis {
    pub paths: Vec<FlowchartPath>,
    pub stats: FlowchartStats,
    pub truncated: bool,
}

/// Enumerates routes and computes statistics in one pass.
pub fn analyze_flowchart(flowchart: &ExecutableFlowchart, limits: &AnalyzerLimits) -> FlowchartAnalysis {
    let enumeration = enumerate_all_paths(flowchart, limits);

    let mut node_counts = NodeCounts::default();
    let mut edge_count = 0;
    for (id, node) in &flowchart.nodes {
        node_counts.count(node.definition.kind());
        edge_count += flowchart.successors(id).len();
    }

    let paths = &enumeration.paths;
    let range = |f: fn(&FlowchartPath) -> usize| {
        let min = paths.iter().map(f).min().unwrap_or(0);
        let max = paths.iter().map(f).max().unwrap_or(0);
        (min, max)
    };
    let (min_path_length, max_path_length) = range(|p| p.node_ids.len());
    let (min_decisions, max_decisions) = range(|p| p.decision_count);
    let (min_checkpoints, max_checkpoints) = range(|p| p.checkpoint_count);

    let stats = FlowchartStats {
        cyclomatic_complexity: edge_count as i64 - node_counts.total() as i64 + 2,
        node_counts,
        edge_count,
        path_count: paths.len(),
        min_path_length,
        max_path_length,
        min_decisions,
        max_decisions,
        min_checkpoints,
        max_checkpoints,
        recommended_iterations: recommended_iterations(paths.len(), min_decisions, max_decisions),
    };
    debug!(
        flowchart = %flowchart.definition.id,
        paths = stats.path_count,
        recommended = stats.recommended_iterations,
        "analysis complete"
    );

    FlowchartAnalysis {
        paths: enumeration.paths,
        stats,
        truncated: enumeration.truncated,
    }
}

/// Monte Carlo budget for hitting every route at least once.
///
/// Coupon-collector `N·(ln N + γ)`, inflated by `1 + 0.5·(max - min decisions)`
/// for skewed route probabilities, and floored by `2^min(maxDecisions, 5) × 10`
/// and a fixed minimum.
pub fn recommended_iterations(path_count: usize, min_decisions: usize, max_decisions: usize) -> usize {
    let branching_floor = (1usize << max_decisions.min(5)) * 10;
    if path_count == 0 {
        return branching_floor.max(MIN_ITERATIONS);
    }
    let n = path_count as f64;
    let skew = 1.0 + 0.5 * max_decisions.saturating_sub(min_decisions) as f64;
    let coupon = (n * (n.ln() + EULER_GAMMA) * skew).ceil() as usize;
    coupon.max(branching_floor).max(MIN_ITERATIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_graphs_get_the_floor() {
        assert_eq!(recommended_iterations(0, 0, 0), 100);
        assert_eq!(recommended_iterations(2, 1, 1), 100);
    }

    #[test]
    fn branching_floor_caps_at_five_decisions() {
        assert_eq!(recommended_iterations(1, 0, 5), 320);
        assert_eq!(recommended_iterations(1, 0, 9), 320);
    }

    #[test]
    fn coupon_estimate_dominates_for_many_paths() {
        // 200 · (ln 200 + γ) ≈ 1175.1
        assert_eq!(recommended_iterations(200, 2, 2), 1176);
        // Skew 1 + 0.5·2 doubles it.
        assert!(recommended_iterations(200, 0, 2) > 2000);
    }
}
