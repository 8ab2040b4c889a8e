//! # Tejun - Procedure Flowchart Engine
//!
//! **Tejun** evaluates, analyses and generates worked examples for interactive
//! procedure flowcharts: step-by-step math procedures where each node is an
//! instruction, a decision, a checkpoint or a terminal, and where decisions and
//! checkpoints are driven by small expressions over the problem's input fields.
//!
//! ## Core Workflow
//!
//! 1.  **Load**: deserialize a `FlowchartDefinition` from JSON and merge it with
//!     the companion diagram into an [`ExecutableFlowchart`](flowchart::ExecutableFlowchart).
//! 2.  **Evaluate**: run expressions against problem values with
//!     [`evaluate`](expr::evaluate), or walk a concrete problem to its terminal
//!     with [`trace_route`](flowchart::trace_route).
//! 3.  **Analyse**: enumerate every route and its conditions with
//!     [`analyze_flowchart`](analysis::analyze_flowchart).
//! 4.  **Generate**: synthesise example problems that exercise each route with
//!     an [`ExampleGenerator`](generator::ExampleGenerator).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tejun::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let json = std::fs::read_to_string("path/to/flowchart.json")?;
//!     let flowchart = ExecutableFlowchart::from_json(&json, None)?;
//!
//!     let analysis = analyze_flowchart(&flowchart, &AnalyzerLimits::default());
//!     for path in &analysis.paths {
//!         println!("{} ({})", path.descriptor(), path.signature());
//!     }
//!
//!     let generator = ExampleGenerator::builder(&flowchart).with_seed(42).build();
//!     for example in generator.generate(4) {
//!         println!("{} -> {:?}", example.path_descriptor, example.values);
//!     }
//!
//!     let mut problem = Scope::new();
//!     problem.insert("top".to_string(), Value::from(52.0));
//!     let ctx = EvalContext::with_problem(&problem);
//!     println!("{}", evaluate("top % 10 < 4 ? 'borrow' : 'direct'", &ctx)?);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod ast;
pub mod constraint;
pub mod error;
pub mod expr;
pub mod flowchart;
pub mod generator;
pub mod prelude;
