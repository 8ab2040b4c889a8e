//! Integration tests for Tejun
//!
//! End-to-end tests that load a flowchart, analyze it, generate examples and
//! walk them back through.
//!
mod common;
use common::*;
use std::fs;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use tejun::prelude::*;

    const FRACTION_DIAGRAM_JSON: &str = r#"{
        "nodes": {
            "intro": "Start here",
            "same-denominator": "Same denominators?",
            "find-lcd": "Find the LCD"
        },
        "edges": [
            { "from": "same-denominator", "to": "add-numerators", "label": "Yes" },
            { "from": "same-denominator", "to": "find-lcd", "label": "No" }
        ],
        "phases": [
            { "id": "setup", "title": "Set up", "nodeIds": ["intro", "same-denominator"] }
        ]
    }"#;

    #[test]
    fn test_full_workflow_from_files() {
        let test_dir = std::env::temp_dir().join(format!("tejun_it_{}", std::process::id()));
        fs::create_dir_all(&test_dir).expect("Failed to create test directory");
        let definition_path = test_dir.join("fraction.json");
        let diagram_path = test_dir.join("fraction.diagram.json");
        fs::write(&definition_path, FRACTION_FLOWCHART_JSON).expect("Failed to write definition");
        fs::write(&diagram_path, FRACTION_DIAGRAM_JSON).expect("Failed to write diagram");

        let definition =
            fs::read_to_string(&definition_path).expect("Failed to read definition");
        let diagram = fs::read_to_string(&diagram_path).expect("Failed to read diagram");
        let flowchart = ExecutableFlowchart::from_json(&definition, Some(diagram.as_str()))
            .expect("Failed to load");
        let _ = fs::remove_dir_all(&test_dir);

        assert_eq!(
            flowchart.node("same-denominator").unwrap().phase.as_deref(),
            Some("setup")
        );
        flowchart.check_references().expect("No dangling references");

        let analysis = analyze_flowchart(&flowchart, &AnalyzerLimits::default());
        assert!(!analysis.truncated);
        assert_eq!(analysis.stats.path_count, 3);

        let examples = ExampleGenerator::builder(&flowchart)
            .with_seed(2024)
            .build()
            .generate(3);
        assert_eq!(examples.len(), 3);

        for example in &examples {
            let ctx = EvalContext::with_problem(&example.values);
            let route = trace_route(&flowchart, &ctx, None).expect("Example walks to a terminal");
            let path = analysis
                .paths
                .iter()
                .find(|p| p.node_ids == route)
                .expect("Walk matches an enumerated route");
            assert_eq!(path.signature(), example.path_signature);
            assert_eq!(path.descriptor(), example.path_descriptor);
            assert_eq!(path.complexity(), example.complexity);
            println!("  - {} {:?}", example.path_descriptor, example.values);
        }
    }

    #[test]
    fn test_examples_serialize_for_the_frontend() {
        let flowchart = borrow_flowchart();
        let (examples, diagnostics) = ExampleGenerator::builder(&flowchart)
            .with_seed(5)
            .build()
            .generate_with_diagnostics(2);

        let json = serde_json::to_value(&examples).expect("Examples serialize");
        let first = &json[0];
        assert!(first["values"]["top"].is_number());
        assert!(first["pathSignature"].is_string());
        assert!(first["complexity"]["structural"].is_number());

        let report = serde_json::to_value(&diagnostics).expect("Diagnostics serialize");
        assert_eq!(report["preferredValuesOk"], serde_json::json!(true));
        assert_eq!(report["paths"][0]["outcome"]["status"], "hit");
        assert!(report["totalAttempts"].as_u64().unwrap() > 0);
    }

    #[test]
    fn test_analysis_serializes() {
        let analysis = analyze_flowchart(&fraction_flowchart(), &AnalyzerLimits::default());
        let json = serde_json::to_value(&analysis).expect("Analysis serializes");
        assert_eq!(json["stats"]["pathCount"], 3);
        assert_eq!(json["paths"][0]["decisions"][0]["shortLabel"], "Same");
        assert_eq!(json["paths"][1]["constraints"][1]["mode"], "boolean");
    }

    #[test]
    fn test_error_handling_integration() {
        let json = FRACTION_FLOWCHART_JSON.replace("\"entryNode\": \"intro\"", "\"entryNode\": \"start\"");
        let result = ExecutableFlowchart::from_json(&json, None);
        assert!(matches!(result, Err(FlowchartError::MissingEntryNode(_))));

        let bad_diagram = DiagramData::from_json("{ \"edges\": 3 }");
        assert!(matches!(bad_diagram, Err(FlowchartError::JsonParse(_))));
    }

    #[test]
    fn test_prelude_import_completeness() {
        let _value = Value::Number(1.0);
        let _ctx = EvalContext::empty();
        let _limits = AnalyzerLimits::default();
        let _config = GeneratorConfig::default();
        let _constraints = GenerationConstraints::default();
        let _parsed: ConstraintParseResult = parse_constraint("a > 1");
        let mut rng = Mulberry32::new(0);
        assert!(rng.next_f64() < 1.0);
        let _result: Result<()> = Ok(());
    }
}
