use crate::ast::{Scope, Value};
use crate::error::FlowchartError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The declarative flowchart as produced by the authoring tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowchartDefinition {
    pub id: String,
    pub title: String,
    pub problem_input: ProblemInput,
    pub entry_node: String,
    pub nodes: BTreeMap<String, FlowchartNode>,
    /// Fallback successor table, consulted when a node has no explicit `next`.
    #[serde(default)]
    pub edges: BTreeMap<String, Vec<String>>,
    /// Computed variables, each an expression over the problem and other variables.
    #[serde(default)]
    pub variables: BTreeMap<String, VariableDefinition>,
    #[serde(default)]
    pub generation: Option<GenerationHints>,
    /// Named boolean expressions every generated problem must satisfy.
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,
    #[serde(default)]
    pub display: Option<DisplayTemplates>,
}

impl FlowchartDefinition {
    pub fn from_json(json: &str) -> Result<Self, FlowchartError> {
        serde_json::from_str(json).map_err(|e| FlowchartError::JsonParse(e.to_string()))
    }

    /// Names of input fields that are drawn rather than derived.
    pub fn independent_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        let derived = self.generation.as_ref().map(|g| &g.derived);
        self.problem_input
            .fields
            .iter()
            .filter(move |f| derived.is_none_or(|d| !d.contains_key(&f.name)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemInput {
    pub schema: String,
    pub fields: Vec<FieldDefinition>,
    /// Expression that must hold for a problem to be valid.
    #[serde(default)]
    pub validation: Option<String>,
    #[serde(default)]
    pub examples: Vec<ProblemExample>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemExample {
    #[serde(default)]
    pub name: Option<String>,
    pub values: Scope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Integer,
    #[default]
    Number,
    Decimal,
    MixedNumber,
    Choice,
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub options: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub init: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationHints {
    /// Field drawn first, before the other independent fields.
    #[serde(default)]
    pub target: Option<String>,
    /// Fields computed from other fields rather than drawn.
    #[serde(default)]
    pub derived: BTreeMap<String, String>,
    /// Readable values to draw from, per independent field.
    #[serde(default)]
    pub preferred: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayTemplates {
    #[serde(default)]
    pub problem: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Instruction,
    Decision,
    Checkpoint,
    Milestone,
    Embellishment,
    Terminal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FlowchartNode {
    Instruction(InstructionNode),
    Decision(DecisionNode),
    Checkpoint(CheckpointNode),
    Milestone(PassThroughNode),
    Embellishment(PassThroughNode),
    Terminal(TerminalNode),
}

impl FlowchartNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            FlowchartNode::Instruction(_) => NodeKind::Instruction,
            FlowchartNode::Decision(_) => NodeKind::Decision,
            FlowchartNode::Checkpoint(_) => NodeKind::Checkpoint,
            FlowchartNode::Milestone(_) => NodeKind::Milestone,
            FlowchartNode::Embellishment(_) => NodeKind::Embellishment,
            FlowchartNode::Terminal(_) => NodeKind::Terminal,
        }
    }

    /// The node's own explicit successor, if it declares one.
    pub fn next(&self) -> Option<&str> {
        match self {
            FlowchartNode::Instruction(n) => n.next.as_deref(),
            FlowchartNode::Checkpoint(n) => n.next.as_deref(),
            FlowchartNode::Milestone(n) | FlowchartNode::Embellishment(n) => n.next.as_deref(),
            FlowchartNode::Decision(_) | FlowchartNode::Terminal(_) => None,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            FlowchartNode::Instruction(n) => n.content.as_deref(),
            FlowchartNode::Decision(n) => n.content.as_deref(),
            FlowchartNode::Checkpoint(n) => Some(&n.prompt),
            FlowchartNode::Milestone(n) | FlowchartNode::Embellishment(n) => n.content.as_deref(),
            FlowchartNode::Terminal(n) => n.content.as_deref(),
        }
    }
}

/// Skip rule shared by decisions and checkpoints: jump to `skip_to` when `skip_if` holds.
#[derive(Debug, Clone, Copy)]
pub struct Skip<'a> {
    pub condition: &'a str,
    pub target: &'a str,
}

fn skip_rule<'a>(skip_if: &'a Option<String>, skip_to: &'a Option<String>) -> Option<Skip<'a>> {
    match (skip_if, skip_to) {
        (Some(condition), Some(target)) => Some(Skip { condition, target }),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionNode {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// Rewrites the displayed working problem when the learner taps through.
    #[serde(default)]
    pub working_problem: Option<WorkingProblemUpdate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingProblemUpdate {
    pub result: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionNode {
    pub options: Vec<DecisionOption>,
    #[serde(default)]
    pub correct_answer: Option<CorrectAnswer>,
    #[serde(default)]
    pub skip_if: Option<String>,
    #[serde(default)]
    pub skip_to: Option<String>,
    /// Verification-only decisions: path enumeration follows the first option only.
    #[serde(default)]
    pub exclude_from_example_structure: bool,
    #[serde(default)]
    pub content: Option<String>,
}

impl DecisionNode {
    pub fn skip(&self) -> Option<Skip<'_>> {
        skip_rule(&self.skip_if, &self.skip_to)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionOption {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub next: Option<String>,
    /// Short label used when describing a route.
    #[serde(default)]
    pub path_label: Option<String>,
}

impl DecisionOption {
    pub fn short_label(&self) -> &str {
        self.path_label.as_deref().unwrap_or(&self.label)
    }
}

/// How a decision's expression selects an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnswerMode {
    /// Truthy selects option 0, falsy any other option.
    Boolean,
    /// The result is compared for equality with the option's `value`.
    Value,
    /// Decided at evaluation time: a string result behaves like `Value`,
    /// anything else like `Boolean`.
    Inferred,
}

/// A decision's `correctAnswer`. A plain string is `Inferred`; the object forms
/// `{"boolean": expr}` and `{"value": expr}` pin the mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    Inferred(String),
    Boolean { boolean: String },
    Value { value: String },
}

impl CorrectAnswer {
    pub fn expression(&self) -> &str {
        match self {
            CorrectAnswer::Inferred(expr)
            | CorrectAnswer::Boolean { boolean: expr }
            | CorrectAnswer::Value { value: expr } => expr,
        }
    }

    pub fn mode(&self) -> AnswerMode {
        match self {
            CorrectAnswer::Inferred(_) => AnswerMode::Inferred,
            CorrectAnswer::Boolean { .. } => AnswerMode::Boolean,
            CorrectAnswer::Value { .. } => AnswerMode::Value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpectedValue {
    Single(String),
    Many(Vec<String>),
}

impl ExpectedValue {
    pub fn expressions(&self) -> Vec<&str> {
        match self {
            ExpectedValue::Single(expr) => vec![expr.as_str()],
            ExpectedValue::Many(exprs) => exprs.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointNode {
    pub prompt: String,
    pub expected: ExpectedValue,
    #[serde(default)]
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub skip_if: Option<String>,
    #[serde(default)]
    pub skip_to: Option<String>,
    /// When set, path enumeration never takes the skip branch.
    #[serde(default)]
    pub exclude_skip_from_paths: bool,
}

impl CheckpointNode {
    pub fn skip(&self) -> Option<Skip<'_>> {
        skip_rule(&self.skip_if, &self.skip_to)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassThroughNode {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalNode {
    #[serde(default)]
    pub celebration: bool,
    #[serde(default)]
    pub content: Option<String>,
}
