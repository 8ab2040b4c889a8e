use super::diagnostics::RejectionReason;
use super::rng::RandomSource;
use super::{GeneratedExample, GenerationPlan};
use crate::analysis::{
    FlowchartPath, PathComplexity, route_checkpoint_count, route_decisions, signature_of,
};
use crate::ast::{EvalContext, Scope, Value};
use crate::error::{EvalError, EvalErrorClass};
use crate::expr::{evaluate, evaluate_bool};
use crate::flowchart::trace_route;
use itertools::Itertools;
use tracing::trace;

/// Result of one generation attempt aimed at a route.
#[derive(Debug)]
pub(crate) enum Outcome {
    OnTarget(GeneratedExample),
    /// Accepted, but the walkthrough took another route.
    OffTarget(GeneratedExample),
    Rejected(RejectionReason),
}

impl GenerationPlan<'_> {
    /// Draws a candidate for the route at `path_index`, computes its derived
    /// fields and variables, checks it, then walks it through the flowchart.
    pub(crate) fn attempt(&self, path_index: usize, rng: &mut dyn RandomSource) -> Outcome {
        let path = &self.analysis.paths[path_index];
        let definition = &self.flowchart.definition;

        let mut values = Scope::new();
        for plan in &self.field_plans[path_index] {
            match plan.draw(rng, self.config.preferred_bias) {
                Some(value) => {
                    values.insert(plan.name.clone(), value);
                }
                None => return Outcome::Rejected(RejectionReason::NoValue),
            }
        }

        let derived = definition
            .generation
            .iter()
            .flat_map(|g| g.derived.iter())
            .map(|(name, expr)| (name.as_str(), expr.as_str()));
        if let Err(error) = resolve_fixed_point(derived, &mut values, |expr, values| {
            evaluate(expr, &EvalContext::with_problem(values).user_state(&self.user_state))
        }) {
            trace!(%error, "derivation failed");
            return Outcome::Rejected(RejectionReason::Derivation);
        }

        let mut computed = Scope::new();
        let variables = definition
            .variables
            .iter()
            .map(|(name, var)| (name.as_str(), var.init.as_str()));
        if let Err(error) = resolve_fixed_point(variables, &mut computed, |expr, computed| {
            let ctx = EvalContext::with_problem(&values)
                .computed(computed)
                .user_state(&self.user_state);
            evaluate(expr, &ctx)
        }) {
            trace!(%error, "variable evaluation failed");
            return Outcome::Rejected(RejectionReason::Variables);
        }

        let ctx = EvalContext::with_problem(&values)
            .computed(&computed)
            .user_state(&self.user_state);

        if let Some(validation) = &definition.problem_input.validation {
            if !evaluate_bool(validation, &ctx).unwrap_or(false) {
                return Outcome::Rejected(RejectionReason::Validation);
            }
        }
        for (name, expr) in &definition.constraints {
            if !evaluate_bool(expr, &ctx).unwrap_or(false) {
                trace!(constraint = %name, "generation constraint violated");
                return Outcome::Rejected(RejectionReason::Constraint);
            }
        }

        let Some(route) = trace_route(self.flowchart, &ctx, Some(path.node_ids.as_slice())) else {
            return Outcome::Rejected(RejectionReason::Walk);
        };
        if route == path.node_ids {
            if !path.replay(&ctx) {
                return Outcome::Rejected(RejectionReason::Replay);
            }
            return Outcome::OnTarget(example_on(path, values));
        }
        Outcome::OffTarget(self.example_off(&route, values))
    }

    /// Example for a route other than the intended one, labelled by its real route.
    fn example_off(&self, route: &[String], values: Scope) -> GeneratedExample {
        let signature = signature_of(route);
        if let Some(path) = self.path_by_signature(&signature) {
            return example_on(path, values);
        }
        let decisions = route_decisions(self.flowchart, route);
        let checkpoints = route_checkpoint_count(self.flowchart, route);
        let path_descriptor = if decisions.is_empty() {
            "Default".to_string()
        } else {
            decisions.iter().map(|d| d.short_label.as_str()).join(" / ")
        };
        GeneratedExample {
            values,
            complexity: PathComplexity {
                structural: decisions.len() + checkpoints,
                length: route.len(),
            },
            path_signature: signature,
            path_descriptor,
        }
    }
}

fn example_on(path: &FlowchartPath, values: Scope) -> GeneratedExample {
    GeneratedExample {
        values,
        complexity: path.complexity(),
        path_signature: path.signature(),
        path_descriptor: path.descriptor(),
    }
}

/// Evaluates named expressions into `target` in as many passes as it takes for
/// every name to resolve, so declaration order does not matter.
///
/// A name-resolution error defers the entry to the next pass; a pass that
/// resolves nothing ends the loop with that error. Any other error is returned
/// immediately.
pub(crate) fn resolve_fixed_point<'e>(
    entries: impl IntoIterator<Item = (&'e str, &'e str)>,
    target: &mut Scope,
    eval: impl Fn(&str, &Scope) -> Result<Value, EvalError>,
) -> Result<(), EvalError> {
    let mut pending: Vec<(&str, &str)> = entries.into_iter().collect();
    while !pending.is_empty() {
        let before = pending.len();
        let mut deferred = Vec::new();
        let mut last_error = None;
        for (name, expr) in pending {
            match eval(expr, &*target) {
                Ok(value) => {
                    target.insert(name.to_string(), value);
                }
                Err(error) if error.class() == EvalErrorClass::Name => {
                    deferred.push((name, expr));
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }
        if deferred.len() == before {
            if let Some(error) = last_error {
                return Err(error);
            }
        }
        pending = deferred;
    }
    Ok(())
}
