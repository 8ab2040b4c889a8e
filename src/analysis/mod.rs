//! Route enumeration and graph statistics.
//!
//! A route is an acyclic walk from the entry node to a terminal, annotated with
//! the conditions that must hold for a problem to take it. The generator uses
//! these to steer and verify its candidates.

pub mod paths;
pub mod stats;

pub use paths::{
    AnalyzerLimits, DecisionStep, FlowchartPath, PathComplexity, PathConstraint, PathEnumeration,
    describe_route, enumerate_all_paths, route_checkpoint_count, route_decisions, signature_of,
};
pub use stats::{FlowchartAnalysis, FlowchartStats, NodeCounts, analyze_flowchart, recommended_iterations};
