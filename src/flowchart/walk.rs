use super::definition::{AnswerMode, CheckpointNode, DecisionNode, FlowchartNode};
use super::executable::ExecutableFlowchart;
use crate::ast::{EvalContext, Value};
use crate::error::EvalError;
use crate::expr::evaluate;
use ahash::AHashSet;
use tracing::debug;

/// Follows a concrete problem through the flowchart from the entry node to a terminal.
///
/// Skips and decisions with a `correctAnswer` are resolved by evaluating against
/// `ctx`. Decisions without one are learner choices: they follow `hint` (a node-id
/// route) when it passes through the node, otherwise the first option.
/// Returns `None` when the walk revisits a node, hits an unresolvable successor,
/// or an expression fails to evaluate.
pub fn trace_route(
    flowchart: &ExecutableFlowchart,
    ctx: &EvalContext<'_>,
    hint: Option<&[String]>,
) -> Option<Vec<String>> {
    let mut route: Vec<String> = Vec::new();
    let mut visited = AHashSet::new();
    let mut current = flowchart.entry().to_string();

    loop {
        if !visited.insert(current.clone()) {
            debug!(node = %current, "walk revisited a node");
            return None;
        }
        let node = flowchart.node(&current)?;
        route.push(current.clone());

        let next = match &node.definition {
            FlowchartNode::Terminal(_) => return Some(route),
            FlowchartNode::Decision(decision) => {
                decision_successor(flowchart, &current, decision, ctx, hint)?
            }
            FlowchartNode::Checkpoint(checkpoint) => {
                checkpoint_successor(flowchart, &current, checkpoint, ctx)?
            }
            _ => flowchart.next_of(&current)?.to_string(),
        };
        current = next;
    }
}

fn decision_successor(
    flowchart: &ExecutableFlowchart,
    id: &str,
    decision: &DecisionNode,
    ctx: &EvalContext<'_>,
    hint: Option<&[String]>,
) -> Option<String> {
    if let Some(skip) = decision.skip() {
        if evaluate(skip.condition, ctx).ok()?.is_truthy() {
            return Some(skip.target.to_string());
        }
    }

    let index = match (&decision.correct_answer, decision.exclude_from_example_structure) {
        (_, true) => 0,
        (Some(answer), false) => {
            let result = evaluate(answer.expression(), ctx).ok()?;
            select_option(decision, answer.mode(), &result)?
        }
        (None, false) => hinted_option(flowchart, id, decision, hint).unwrap_or(0),
    };
    let option = decision.options.get(index)?;
    flowchart
        .option_target(id, index, option)
        .map(str::to_string)
}

/// Index of the option a decision result selects.
pub fn select_option(decision: &DecisionNode, mode: AnswerMode, result: &Value) -> Option<usize> {
    let by_value = match (mode, result) {
        (AnswerMode::Value, _) | (AnswerMode::Inferred, Value::Str(_)) => true,
        (AnswerMode::Boolean, _) | (AnswerMode::Inferred, _) => false,
    };
    if by_value {
        let wanted = result.to_string();
        decision.options.iter().position(|o| o.value == wanted)
    } else if result.is_truthy() || decision.options.len() < 2 {
        Some(0)
    } else {
        Some(1)
    }
}

fn hinted_option(
    flowchart: &ExecutableFlowchart,
    id: &str,
    decision: &DecisionNode,
    hint: Option<&[String]>,
) -> Option<usize> {
    let hint = hint?;
    let at = hint.iter().position(|n| n == id)?;
    let wanted = hint.get(at + 1)?;
    decision
        .options
        .iter()
        .enumerate()
        .position(|(i, option)| flowchart.option_target(id, i, option) == Some(wanted.as_str()))
}

fn checkpoint_successor(
    flowchart: &ExecutableFlowchart,
    id: &str,
    checkpoint: &CheckpointNode,
    ctx: &EvalContext<'_>,
) -> Option<String> {
    if let (Some(skip), false) = (checkpoint.skip(), checkpoint.exclude_skip_from_paths) {
        if evaluate(skip.condition, ctx).ok()?.is_truthy() {
            return Some(skip.target.to_string());
        }
    }
    flowchart.next_of(id).map(str::to_string)
}

/// Checks a learner's answer at a checkpoint.
///
/// Each expected expression is evaluated with the answer bound to `input`; the
/// answer is accepted if it matches any of them, numerically within `tolerance`
/// when one is set.
pub fn check_answer(
    checkpoint: &CheckpointNode,
    answer: &Value,
    ctx: &EvalContext<'_>,
) -> Result<bool, EvalError> {
    let ctx = ctx.input(answer);
    for expr in checkpoint.expected.expressions() {
        let expected = evaluate(expr, &ctx)?;
        let matches = match (checkpoint.tolerance, &expected) {
            (Some(tolerance), Value::Number(n)) => (answer.to_number() - n).abs() <= tolerance,
            (None, Value::Number(n)) => answer.to_number() == *n,
            _ => *answer == expected,
        };
        if matches {
            return Ok(true);
        }
    }
    Ok(false)
}
