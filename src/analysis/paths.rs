use crate::ast::{EvalContext, Value};
use crate::expr::evaluate;
use crate::flowchart::{AnswerMode, ExecutableFlowchart, FlowchartNode};
use ahash::AHashSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Hard bounds on path enumeration. Exceeding either truncates the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzerLimits {
    pub max_paths: usize,
    pub max_iterations: usize,
}

impl Default for AnalyzerLimits {
    fn default() -> Self {
        Self {
            max_paths: 1000,
            max_iterations: 10_000,
        }
    }
}

/// A condition that must hold for a route to be taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathConstraint {
    pub node_id: String,
    pub expression: String,
    pub required_outcome: bool,
    /// Value of the option taken, for decisions that compare by value.
    pub option_value: Option<String>,
    pub mode: AnswerMode,
}

impl PathConstraint {
    /// Re-evaluates the constraint and checks it produces the required outcome.
    /// Evaluation errors count as not satisfied.
    pub fn is_satisfied(&self, ctx: &EvalContext<'_>) -> bool {
        let Ok(result) = evaluate(&self.expression, ctx) else {
            return false;
        };
        let by_value = match (self.mode, &result) {
            (AnswerMode::Value, _) | (AnswerMode::Inferred, Value::Str(_)) => true,
            (AnswerMode::Boolean, _) | (AnswerMode::Inferred, _) => false,
        };
        match (&self.option_value, by_value) {
            (Some(option_value), true) => result.to_string() == *option_value,
            _ => result.is_truthy() == self.required_outcome,
        }
    }
}

/// The option a route takes at a structured decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionStep {
    pub node_id: String,
    pub option_index: usize,
    pub option_value: String,
    pub short_label: String,
}

/// One route from the entry node to a terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowchartPath {
    pub node_ids: Vec<String>,
    pub constraints: Vec<PathConstraint>,
    pub decisions: Vec<DecisionStep>,
    pub decision_count: usize,
    pub checkpoint_count: usize,
}

impl FlowchartPath {
    pub fn signature(&self) -> String {
        signature_of(&self.node_ids)
    }

    /// Decision short labels along the route, or `"Default"` for a route with no choices.
    pub fn descriptor(&self) -> String {
        if self.decisions.is_empty() {
            "Default".to_string()
        } else {
            self.decisions.iter().map(|d| d.short_label.as_str()).join(" / ")
        }
    }

    pub fn complexity(&self) -> PathComplexity {
        PathComplexity {
            structural: self.decision_count + self.checkpoint_count,
            length: self.node_ids.len(),
        }
    }

    pub fn terminal(&self) -> Option<&str> {
        self.node_ids.last().map(String::as_str)
    }

    /// Whether every constraint on the route holds for the given scopes.
    pub fn replay(&self, ctx: &EvalContext<'_>) -> bool {
        self.constraints.iter().all(|c| c.is_satisfied(ctx))
    }
}

/// Orders routes simplest first: decisions plus checkpoints, then route length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PathComplexity {
    pub structural: usize,
    pub length: usize,
}

pub fn signature_of(node_ids: &[String]) -> String {
    node_ids.join("→")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathEnumeration {
    pub paths: Vec<FlowchartPath>,
    pub truncated: bool,
    pub iterations: usize,
}

#[derive(Clone)]
struct Frame {
    node_id: String,
    path: Vec<String>,
    visited: AHashSet<String>,
    constraints: Vec<PathConstraint>,
    decisions: Vec<DecisionStep>,
    decision_count: usize,
    checkpoint_count: usize,
}

impl Frame {
    /// A copy of this frame moved on to `next`.
    fn advance(&self, next: &str) -> Frame {
        let mut frame = self.clone();
        frame.node_id = next.to_string();
        frame
    }
}

/// Enumerates every acyclic route from the entry node to a terminal node.
///
/// Depth-first over an explicit stack. A node already on the current route is
/// dropped rather than revisited, so cyclic routes are never produced.
pub fn enumerate_all_paths(
    flowchart: &ExecutableFlowchart,
    limits: &AnalyzerLimits,
) -> PathEnumeration {
    let mut result = PathEnumeration::default();
    let mut stack = vec![Frame {
        node_id: flowchart.entry().to_string(),
        path: Vec::new(),
        visited: AHashSet::new(),
        constraints: Vec::new(),
        decisions: Vec::new(),
        decision_count: 0,
        checkpoint_count: 0,
    }];

    while let Some(mut frame) = stack.pop() {
        if result.iterations >= limits.max_iterations || result.paths.len() >= limits.max_paths {
            result.truncated = true;
            warn!(
                flowchart = %flowchart.definition.id,
                paths = result.paths.len(),
                iterations = result.iterations,
                "path enumeration truncated"
            );
            break;
        }
        result.iterations += 1;

        if !frame.visited.insert(frame.node_id.clone()) {
            continue;
        }
        let Some(node) = flowchart.node(&frame.node_id) else {
            debug!(node = %frame.node_id, "route references an undefined node");
            continue;
        };
        frame.path.push(frame.node_id.clone());

        // Successors are pushed in reverse so the first branch is explored first.
        let mut branches: Vec<Frame> = Vec::new();
        match &node.definition {
            FlowchartNode::Terminal(_) => {
                result.paths.push(FlowchartPath {
                    node_ids: frame.path,
                    constraints: frame.constraints,
                    decisions: frame.decisions,
                    decision_count: frame.decision_count,
                    checkpoint_count: frame.checkpoint_count,
                });
                continue;
            }
            FlowchartNode::Decision(decision) => {
                let skip = decision.skip();
                if let Some(skip) = skip {
                    let mut branch = frame.advance(skip.target);
                    branch.constraints.push(skip_constraint(&frame.node_id, skip.condition, true));
                    branches.push(branch);
                }
                // Verification-only decisions follow their first option and add no step.
                if decision.exclude_from_example_structure {
                    let target = decision
                        .options
                        .first()
                        .and_then(|option| flowchart.option_target(&frame.node_id, 0, option));
                    branches.extend(target.map(|t| {
                        let mut branch = frame.advance(t);
                        if let Some(skip) = skip {
                            branch.constraints.push(skip_constraint(&frame.node_id, skip.condition, false));
                        }
                        branch
                    }));
                } else {
                    for (index, option) in decision.options.iter().enumerate() {
                        let Some(target) = flowchart.option_target(&frame.node_id, index, option)
                        else {
                            debug!(node = %frame.node_id, option = %option.value, "option has no target");
                            continue;
                        };
                        let mut branch = frame.advance(target);
                        if let Some(skip) = skip {
                            branch.constraints.push(skip_constraint(&frame.node_id, skip.condition, false));
                        }
                        if let Some(answer) = &decision.correct_answer {
                            branch.constraints.push(PathConstraint {
                                node_id: frame.node_id.clone(),
                                expression: answer.expression().to_string(),
                                required_outcome: index == 0,
                                option_value: Some(option.value.clone()),
                                mode: answer.mode(),
                            });
                        }
                        branch.decisions.push(DecisionStep {
                            node_id: frame.node_id.clone(),
                            option_index: index,
                            option_value: option.value.clone(),
                            short_label: option.short_label().to_string(),
                        });
                        branch.decision_count += 1;
                        branches.push(branch);
                    }
                }
            }
            FlowchartNode::Checkpoint(checkpoint) => {
                let skip = checkpoint.skip().filter(|_| !checkpoint.exclude_skip_from_paths);
                if let Some(skip) = skip {
                    let mut branch = frame.advance(skip.target);
                    branch.constraints.push(skip_constraint(&frame.node_id, skip.condition, true));
                    branches.push(branch);
                }
                if let Some(next) = flowchart.next_of(&frame.node_id) {
                    let mut branch = frame.advance(next);
                    if let Some(skip) = skip {
                        branch.constraints.push(skip_constraint(&frame.node_id, skip.condition, false));
                    }
                    branch.checkpoint_count += 1;
                    branches.push(branch);
                }
            }
            FlowchartNode::Instruction(_)
            | FlowchartNode::Milestone(_)
            | FlowchartNode::Embellishment(_) => {
                branches.extend(flowchart.next_of(&frame.node_id).map(|t| frame.advance(t)));
            }
        }

        if branches.is_empty() {
            debug!(node = %frame.node_id, "dead end: no resolvable successor");
        }
        stack.extend(branches.into_iter().rev());
    }

    result
}

fn skip_constraint(node_id: &str, condition: &str, required_outcome: bool) -> PathConstraint {
    PathConstraint {
        node_id: node_id.to_string(),
        expression: condition.to_string(),
        required_outcome,
        option_value: None,
        mode: AnswerMode::Boolean,
    }
}

/// Decision steps along a concrete node-id route, for routes that were not
/// produced by enumeration (e.g. a walkthrough result).
pub fn route_decisions(flowchart: &ExecutableFlowchart, route: &[String]) -> Vec<DecisionStep> {
    route
        .iter()
        .tuple_windows()
        .filter_map(|(id, next)| {
            let FlowchartNode::Decision(decision) = &flowchart.node(id)?.definition else {
                return None;
            };
            if decision.exclude_from_example_structure {
                return None;
            }
            let (index, option) = decision.options.iter().enumerate().find(|(i, option)| {
                flowchart.option_target(id, *i, option) == Some(next.as_str())
            })?;
            Some(DecisionStep {
                node_id: id.clone(),
                option_index: index,
                option_value: option.value.clone(),
                short_label: option.short_label().to_string(),
            })
        })
        .collect()
}

/// Checkpoints along a concrete route that were answered rather than skipped,
/// counted the way enumeration counts them.
pub fn route_checkpoint_count(flowchart: &ExecutableFlowchart, route: &[String]) -> usize {
    route
        .iter()
        .tuple_windows()
        .filter(|(id, next)| {
            flowchart
                .node(id)
                .is_some_and(|n| matches!(n.definition, FlowchartNode::Checkpoint(_)))
                && flowchart.next_of(id) == Some(next.as_str())
        })
        .count()
}

/// Same grouping label as [`FlowchartPath::descriptor`], computed from a node-id route.
pub fn describe_route(flowchart: &ExecutableFlowchart, route: &[String]) -> String {
    let decisions = route_decisions(flowchart, route);
    if decisions.is_empty() {
        "Default".to_string()
    } else {
        decisions.iter().map(|d| d.short_label.as_str()).join(" / ")
    }
}
