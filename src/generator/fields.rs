use super::rng::RandomSource;
use crate::analysis::FlowchartPath;
use crate::ast::Value;
use crate::constraint::{FieldFilter, constraint_to_field_filter, negate_constraint, parse_constraint};
use crate::flowchart::{AnswerMode, FieldDefinition, FieldKind, FlowchartDefinition};
use tracing::trace;

/// Candidate values for one independent field, pre-filtered for a route.
#[derive(Debug, Clone)]
pub(crate) struct FieldPlan {
    pub name: String,
    preferred: Vec<Value>,
    domain: Vec<Value>,
}

impl FieldPlan {
    fn new(
        field: &FieldDefinition,
        preferred: &[Value],
        filters: &[FieldFilter],
        domain_cap: usize,
    ) -> Self {
        let applicable: Vec<&FieldFilter> = filters.iter().filter(|f| f.field == field.name).collect();
        let passes = |value: &Value| applicable.iter().all(|f| f.accepts(value));

        let preferred: Vec<Value> = preferred.iter().filter(|v| passes(v)).cloned().collect();
        let domain: Vec<Value> = field_domain(field, domain_cap)
            .into_iter()
            .filter(|v| passes(v))
            .collect();
        trace!(
            field = %field.name,
            preferred = preferred.len(),
            domain = domain.len(),
            filters = applicable.len(),
            "field plan"
        );

        Self {
            name: field.name.clone(),
            preferred,
            domain,
        }
    }

    /// Draws from the preferred values with probability `bias`, otherwise from
    /// the full filtered domain. Falls back to whichever side is non-empty.
    pub fn draw(&self, rng: &mut dyn RandomSource, bias: f64) -> Option<Value> {
        let use_preferred = !self.preferred.is_empty() && (self.domain.is_empty() || rng.chance(bias));
        let pool = if use_preferred { &self.preferred } else { &self.domain };
        if pool.is_empty() {
            return None;
        }
        Some(pool[rng.pick_index(pool.len())].clone())
    }
}

/// Every value a field can take, when it is small enough to enumerate.
fn field_domain(field: &FieldDefinition, cap: usize) -> Vec<Value> {
    match field.kind {
        FieldKind::Choice => field.options.clone(),
        FieldKind::Integer | FieldKind::Number => {
            let (Some(min), Some(max)) = (field.min, field.max) else {
                return Vec::new();
            };
            if min.fract() != 0.0 || max.fract() != 0.0 || max < min {
                return Vec::new();
            }
            let (min, max) = (min as i64, max as i64);
            if (max - min) as usize >= cap {
                return Vec::new();
            }
            (min..=max).map(Value::from).collect()
        }
        FieldKind::Decimal | FieldKind::MixedNumber | FieldKind::Text => Vec::new(),
    }
}

/// Field filters implied by a route: its decision and skip constraints (negated
/// where the route needs them false) plus the flowchart-wide validation and
/// generation constraints.
pub(crate) fn route_filters(definition: &FlowchartDefinition, path: &FlowchartPath) -> Vec<FieldFilter> {
    let route = path.constraints.iter().filter_map(|c| {
        let by_value = c.option_value.is_some() && c.mode == AnswerMode::Value;
        (!by_value).then_some((c.expression.as_str(), c.required_outcome))
    });
    let global = definition
        .problem_input
        .validation
        .iter()
        .chain(definition.constraints.values())
        .map(|expr| (expr.as_str(), true));

    route
        .chain(global)
        .flat_map(|(expr, outcome)| filters_for(expr, outcome))
        .collect()
}

fn filters_for(expr: &str, required_outcome: bool) -> Vec<FieldFilter> {
    let parsed = parse_constraint(expr);
    if !parsed.fully_parsed {
        return Vec::new();
    }
    if required_outcome {
        return parsed.constraints.iter().filter_map(constraint_to_field_filter).collect();
    }
    // The negation of a conjunction is a disjunction; only single comparisons negate cleanly.
    match parsed.constraints.as_slice() {
        [single] => constraint_to_field_filter(&negate_constraint(single)).into_iter().collect(),
        _ => Vec::new(),
    }
}

/// Plans for every independent field, target field first.
pub(crate) fn plan_fields(
    definition: &FlowchartDefinition,
    filters: &[FieldFilter],
    domain_cap: usize,
) -> Vec<FieldPlan> {
    let hints = definition.generation.as_ref();
    let target = hints.and_then(|g| g.target.as_deref());
    let mut fields: Vec<&FieldDefinition> = definition.independent_fields().collect();
    fields.sort_by_key(|f| Some(f.name.as_str()) != target);

    fields
        .into_iter()
        .map(|field| {
            let preferred = hints
                .and_then(|g| g.preferred.get(&field.name))
                .map(Vec::as_slice)
                .unwrap_or_default();
            FieldPlan::new(field, preferred, filters, domain_cap)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::rng::Mulberry32;

    fn integer_field(name: &str, min: f64, max: f64) -> FieldDefinition {
        FieldDefinition {
            name: name.to_string(),
            kind: FieldKind::Integer,
            label: None,
            min: Some(min),
            max: Some(max),
            options: Vec::new(),
        }
    }

    #[test]
    fn filters_narrow_both_pools() {
        let field = integer_field("n", 1.0, 20.0);
        let filters = filters_for("n % 5 == 0", true);
        let plan = FieldPlan::new(&field, &[Value::from(3.0), Value::from(10.0)], &filters, 2000);
        assert_eq!(plan.preferred, vec![Value::from(10.0)]);
        assert_eq!(plan.domain.len(), 4);
    }

    #[test]
    fn negated_conjunctions_yield_no_filters() {
        assert!(filters_for("a > 1 && b > 1", false).is_empty());
        assert_eq!(filters_for("a > 1", false).len(), 1);
    }

    #[test]
    fn oversized_ranges_fall_back_to_preferred() {
        let field = integer_field("n", 0.0, 1_000_000.0);
        let plan = FieldPlan::new(&field, &[Value::from(7.0)], &[], 2000);
        let mut rng = Mulberry32::new(1);
        for _ in 0..20 {
            assert_eq!(plan.draw(&mut rng, 0.0), Some(Value::from(7.0)));
        }
    }

    #[test]
    fn empty_plan_draws_nothing() {
        let field = integer_field("n", 1.0, 5.0);
        let filters = filters_for("n > 10", true);
        let plan = FieldPlan::new(&field, &[Value::from(2.0)], &filters, 2000);
        assert_eq!(plan.draw(&mut Mulberry32::new(1), 0.8), None);
    }
}
