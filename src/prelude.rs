//! Prelude module for convenient imports
//!
//! Re-exports the types and functions most callers need, so a single
//! `use tejun::prelude::*;` covers loading, evaluating, analysing and generating.

// Values and scopes
pub use crate::ast::{EvalContext, Scope, Value};

// Expression evaluation
pub use crate::expr::{evaluate, evaluate_bool};

// Constraint parsing
pub use crate::constraint::{
    ConstraintParseResult, FieldFilter, ParsedConstraint, constraint_to_field_filter,
    negate_constraint, parse_constraint,
};

// Flowchart model
pub use crate::flowchart::{
    DiagramData, ExecutableFlowchart, FlowchartDefinition, FlowchartNode, trace_route,
};

// Analysis
pub use crate::analysis::{
    AnalyzerLimits, FlowchartAnalysis, FlowchartPath, analyze_flowchart, enumerate_all_paths,
};

// Generation
pub use crate::generator::{
    ExampleGenerator, GeneratedExample, GenerationConstraints, GenerationDiagnostics,
    GeneratorConfig, Mulberry32, RandomSource,
};

// Error types
pub use crate::error::{EvalError, FlowchartError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
