//! Common test utilities: flowchart fixtures and scope builders.
use serde_json::json;
use tejun::prelude::*;

/// Two-digit subtraction: a single value-mode decision picks the borrow or
/// direct terminal. Every preferred pair needs a borrow.
#[allow(dead_code)]
pub const BORROW_FLOWCHART_JSON: &str = r#"{
    "id": "subtraction-borrow",
    "title": "Two-digit subtraction",
    "problemInput": {
        "schema": "two-digit-subtraction",
        "fields": [
            { "name": "top", "type": "integer", "min": 10, "max": 99 },
            { "name": "bottom", "type": "integer", "min": 10, "max": 99 }
        ],
        "validation": "top > bottom"
    },
    "entryNode": "start",
    "nodes": {
        "start": { "type": "instruction", "content": "Line up the digits", "next": "check" },
        "check": {
            "type": "decision",
            "content": "Is the top ones digit smaller than the bottom one?",
            "correctAnswer": "needsBorrow ? 'borrow' : 'direct'",
            "options": [
                { "label": "Yes, borrow", "value": "borrow", "next": "borrow", "pathLabel": "Borrow" },
                { "label": "No", "value": "direct", "next": "direct", "pathLabel": "Direct" }
            ]
        },
        "borrow": { "type": "terminal", "content": "Borrow ten from the tens column", "celebration": true },
        "direct": { "type": "terminal", "content": "Subtract column by column" }
    },
    "variables": {
        "needsBorrow": { "init": "(top % 10) < (bottom % 10)" }
    },
    "generation": {
        "preferred": { "top": [32, 52], "bottom": [14, 27] }
    }
}"#;

/// Fraction addition: a boolean decision, a skippable checkpoint, a milestone
/// resolved through the edge table, and a verification-only decision whose
/// second option loops back.
#[allow(dead_code)]
pub const FRACTION_FLOWCHART_JSON: &str = r#"{
    "id": "fraction-addition",
    "title": "Adding fractions",
    "problemInput": {
        "schema": "two-fractions",
        "fields": [
            { "name": "leftDenom", "type": "integer", "min": 2, "max": 12 },
            { "name": "rightDenom", "type": "integer", "min": 2, "max": 12 }
        ]
    },
    "entryNode": "intro",
    "nodes": {
        "intro": { "type": "instruction", "content": "Look at the denominators", "next": "same-denominator" },
        "same-denominator": {
            "type": "decision",
            "correctAnswer": { "boolean": "leftDenom == rightDenom" },
            "options": [
                { "label": "Yes", "value": "yes", "next": "add-numerators", "pathLabel": "Same" },
                { "label": "No", "value": "no", "next": "find-lcd", "pathLabel": "Different" }
            ]
        },
        "find-lcd": {
            "type": "checkpoint",
            "prompt": "What is the least common denominator?",
            "expected": "lcm(leftDenom, rightDenom)",
            "next": "convert",
            "skipIf": "leftDenom % rightDenom == 0",
            "skipTo": "convert-one"
        },
        "convert": { "type": "instruction", "content": "Rewrite both fractions", "next": "add-numerators" },
        "convert-one": { "type": "milestone", "content": "Only the right fraction changes" },
        "add-numerators": {
            "type": "checkpoint",
            "prompt": "Add the numerators",
            "expected": ["1", "2"],
            "next": "simplify-check"
        },
        "simplify-check": {
            "type": "decision",
            "excludeFromExampleStructure": true,
            "options": [
                { "label": "Looks right", "value": "ok", "next": "done" },
                { "label": "Try again", "value": "retry", "next": "retry" }
            ]
        },
        "retry": { "type": "instruction", "next": "add-numerators" },
        "done": { "type": "terminal", "celebration": true }
    },
    "edges": {
        "convert-one": ["add-numerators"]
    },
    "generation": {
        "target": "rightDenom",
        "preferred": { "leftDenom": [2, 3, 4, 6], "rightDenom": [2, 3, 4, 6] }
    }
}"#;

/// A graded decision that is skipped outright for large values.
#[allow(dead_code)]
pub const SKIP_DECISION_FLOWCHART_JSON: &str = r#"{
    "id": "skip-decision",
    "title": "Big, medium or small",
    "problemInput": { "schema": "one-digit", "fields": [ { "name": "n", "type": "integer", "min": 1, "max": 9 } ] },
    "entryNode": "ask",
    "nodes": {
        "ask": {
            "type": "decision",
            "correctAnswer": "n > 3",
            "skipIf": "n > 7",
            "skipTo": "skipped",
            "options": [
                { "label": "A", "value": "a", "next": "a" },
                { "label": "B", "value": "b", "next": "b" }
            ]
        },
        "a": { "type": "terminal" },
        "b": { "type": "terminal" },
        "skipped": { "type": "terminal" }
    },
    "generation": { "preferred": { "n": [2, 5, 8] } }
}"#;

#[allow(dead_code)]
pub fn skip_decision_flowchart() -> ExecutableFlowchart {
    ExecutableFlowchart::from_json(SKIP_DECISION_FLOWCHART_JSON, None)
        .expect("skip-decision fixture loads")
}

/// The same decision marked verification-only, with a lower skip threshold.
#[allow(dead_code)]
pub fn excluded_skip_decision_flowchart() -> ExecutableFlowchart {
    let json = SKIP_DECISION_FLOWCHART_JSON
        .replace(r#""skipIf": "n > 7""#, r#""skipIf": "n > 5", "excludeFromExampleStructure": true"#);
    ExecutableFlowchart::from_json(&json, None).expect("excluded skip-decision fixture loads")
}

/// A learner-choice decision that can loop back to itself.
#[allow(dead_code)]
pub const CYCLE_FLOWCHART_JSON: &str = r#"{
    "id": "cycle",
    "title": "Loop",
    "problemInput": { "schema": "none", "fields": [] },
    "entryNode": "ask",
    "nodes": {
        "ask": {
            "type": "decision",
            "options": [
                { "label": "Again", "value": "again", "next": "ask" },
                { "label": "Stop", "value": "stop", "next": "end" }
            ]
        },
        "end": { "type": "terminal" }
    }
}"#;

/// A flowchart with `depth` chained two-way learner decisions: `2^depth` routes.
#[allow(dead_code)]
pub fn create_binary_ladder(depth: usize) -> ExecutableFlowchart {
    let mut nodes = serde_json::Map::new();
    for level in 0..depth {
        let next = if level + 1 == depth {
            "end".to_string()
        } else {
            format!("d{}", level + 1)
        };
        nodes.insert(
            format!("d{}", level),
            json!({
                "type": "decision",
                "options": [
                    { "label": format!("L{}", level), "value": "left", "next": format!("l{}", level) },
                    { "label": format!("R{}", level), "value": "right", "next": format!("r{}", level) }
                ]
            }),
        );
        for side in ["l", "r"] {
            nodes.insert(
                format!("{}{}", side, level),
                json!({ "type": "instruction", "next": next }),
            );
        }
    }
    nodes.insert("end".to_string(), json!({ "type": "terminal" }));

    let definition = json!({
        "id": "ladder",
        "title": "Ladder",
        "problemInput": { "schema": "none", "fields": [] },
        "entryNode": "d0",
        "nodes": nodes
    });
    ExecutableFlowchart::from_json(&definition.to_string(), None).expect("ladder fixture loads")
}

#[allow(dead_code)]
pub fn borrow_flowchart() -> ExecutableFlowchart {
    ExecutableFlowchart::from_json(BORROW_FLOWCHART_JSON, None).expect("borrow fixture loads")
}

#[allow(dead_code)]
pub fn fraction_flowchart() -> ExecutableFlowchart {
    ExecutableFlowchart::from_json(FRACTION_FLOWCHART_JSON, None).expect("fraction fixture loads")
}

#[allow(dead_code)]
pub fn cycle_flowchart() -> ExecutableFlowchart {
    ExecutableFlowchart::from_json(CYCLE_FLOWCHART_JSON, None).expect("cycle fixture loads")
}

/// Builds a scope from `(name, value)` pairs.
#[allow(dead_code)]
pub fn scope<V: Into<Value>>(entries: impl IntoIterator<Item = (&'static str, V)>) -> Scope {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.into()))
        .collect()
}

/// Evaluates the flowchart's variables against a problem, in declaration order.
#[allow(dead_code)]
pub fn compute_variables(flowchart: &ExecutableFlowchart, problem: &Scope) -> Scope {
    let mut computed = Scope::new();
    for (name, variable) in &flowchart.definition.variables {
        let ctx = EvalContext::with_problem(problem).computed(&computed);
        let value = evaluate(&variable.init, &ctx).expect("variable evaluates");
        computed.insert(name.clone(), value);
    }
    computed
}
