//! The flowchart model: the declarative definition, the companion diagram, and
//! the merged executable graph.

pub mod definition;
pub mod diagram;
pub mod executable;
pub mod walk;

pub use definition::*;
pub use diagram::{DiagramData, DiagramEdge, DiagramPhase};
pub use executable::{ExecutableFlowchart, ExecutableNode};
pub use walk::{check_answer, select_option, trace_route};
