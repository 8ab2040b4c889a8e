use thiserror::Error;

/// Coarse classification of evaluation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvalErrorClass {
    Syntax,
    Name,
    Arity,
    Field,
}

/// Errors raised by the expression evaluator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("Unknown state variable '${0}'")]
    UnknownStateVariable(String),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Function '{function}' expects {expected} argument(s), but received {found}")]
    Arity {
        function: String,
        expected: String,
        found: usize,
    },

    #[error("Cannot access field '{field}' on {target}")]
    FieldAccess { field: String, target: String },
}

impl EvalError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        EvalError::Syntax {
            position,
            message: message.into(),
        }
    }

    pub fn class(&self) -> EvalErrorClass {
        match self {
            EvalError::Syntax { .. } => EvalErrorClass::Syntax,
            EvalError::UnknownIdentifier(_)
            | EvalError::UnknownStateVariable(_)
            | EvalError::UnknownFunction(_) => EvalErrorClass::Name,
            EvalError::Arity { .. } => EvalErrorClass::Arity,
            EvalError::FieldAccess { .. } => EvalErrorClass::Field,
        }
    }
}

/// Errors that can occur while loading a flowchart definition.
#[derive(Error, Debug, Clone)]
pub enum FlowchartError {
    #[error("Failed to parse flowchart JSON: {0}")]
    JsonParse(String),

    #[error("Entry node '{0}' is not defined in the flowchart")]
    MissingEntryNode(String),

    #[error("Node '{missing_node_id}' not found, which is referenced by node '{referenced_from}'")]
    NodeNotFound {
        missing_node_id: String,
        referenced_from: String,
    },
}
