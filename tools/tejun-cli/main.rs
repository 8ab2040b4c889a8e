use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::time::Instant;
use tejun::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Evaluate, analyze and generate examples for procedure flowcharts
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a single expression
    Eval {
        expression: String,
        /// JSON object of problem values the expression can reference
        #[arg(short, long)]
        problem: Option<String>,
    },
    /// Enumerate routes and print flowchart statistics
    Paths {
        flowchart_path: String,
        /// Companion diagram JSON with labels, edges and phases
        #[arg(short, long)]
        diagram: Option<String>,
        #[arg(long, default_value_t = 1000)]
        max_paths: usize,
    },
    /// Generate diverse example problems
    Generate {
        flowchart_path: String,
        #[arg(short, long)]
        diagram: Option<String>,
        #[arg(short, long, default_value_t = 4)]
        count: usize,
        /// Seed for reproducible output
        #[arg(short, long)]
        seed: Option<u32>,
        /// Split raw generation across this many threads
        #[arg(short, long)]
        workers: Option<usize>,
        /// Generator configuration JSON overriding the defaults
        #[arg(long)]
        config: Option<String>,
        /// Generation constraints JSON, e.g. {"maxValue": 50}
        #[arg(long)]
        constraints: Option<String>,
        /// Print per-route diagnostics alongside the examples
        #[arg(long)]
        diagnostics: bool,
    },
    /// Evaluate expressions interactively against a problem
    Repl {
        #[arg(short, long)]
        problem: Option<String>,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Eval {
            expression,
            problem,
        } => run_eval(&expression, problem),
        Command::Paths {
            flowchart_path,
            diagram,
            max_paths,
        } => run_paths(&flowchart_path, diagram, max_paths),
        Command::Generate {
            flowchart_path,
            diagram,
            count,
            seed,
            workers,
            config,
            constraints,
            diagnostics,
        } => run_generate(
            &flowchart_path,
            diagram,
            GenerateOptions {
                count,
                seed,
                workers,
                config,
                constraints,
                diagnostics,
            },
        ),
        Command::Repl { problem } => run_repl(problem),
    }
}

/// `TEJUN_LOG` sets the filter (default `info`); `TEJUN_LOG_FORMAT=json` switches
/// to structured logs. Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("TEJUN_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr);

    match std::env::var("TEJUN_LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}

struct GenerateOptions {
    count: usize,
    seed: Option<u32>,
    workers: Option<usize>,
    config: Option<String>,
    constraints: Option<String>,
    diagnostics: bool,
}

fn run_eval(expression: &str, problem: Option<String>) {
    let problem = parse_problem(problem);
    let value = evaluate(expression, &EvalContext::with_problem(&problem))
        .unwrap_or_else(|e| exit_with_error(&format!("Evaluation failed: {}", e)));
    print_json(&value);
}

fn run_paths(flowchart_path: &str, diagram: Option<String>, max_paths: usize) {
    let flowchart = load_flowchart(flowchart_path, diagram);
    let limits = AnalyzerLimits {
        max_paths,
        ..AnalyzerLimits::default()
    };

    let start = Instant::now();
    let analysis = analyze_flowchart(&flowchart, &limits);
    info!(
        paths = analysis.stats.path_count,
        elapsed = ?start.elapsed(),
        "analysis finished"
    );
    print_json(&analysis);
}

fn run_generate(flowchart_path: &str, diagram: Option<String>, options: GenerateOptions) {
    let flowchart = load_flowchart(flowchart_path, diagram);
    let config: GeneratorConfig = options
        .config
        .map(|path| parse_json_file(&path, "generator config"))
        .unwrap_or_default();
    let constraints: GenerationConstraints = options
        .constraints
        .map(|json| {
            serde_json::from_str(&json).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to parse generation constraints: {}", e))
            })
        })
        .unwrap_or_default();

    let mut builder = ExampleGenerator::builder(&flowchart)
        .with_config(config)
        .with_constraints(constraints);
    if let Some(seed) = options.seed {
        builder = builder.with_seed(seed);
    }
    let generator = builder.build();

    let start = Instant::now();
    if let Some(workers) = options.workers {
        let examples = generator.generate_parallel(options.count, workers);
        info!(workers, elapsed = ?start.elapsed(), "parallel generation finished");
        print_json(&examples);
        return;
    }

    if options.diagnostics {
        let (examples, diagnostics) = generator.generate_with_diagnostics(options.count);
        #[derive(Serialize)]
        struct Report<'a> {
            examples: &'a [GeneratedExample],
            diagnostics: &'a GenerationDiagnostics,
        }
        print_json(&Report {
            examples: &examples,
            diagnostics: &diagnostics,
        });
    } else {
        print_json(&generator.generate(options.count));
    }
    info!(elapsed = ?start.elapsed(), "generation finished");
}

/// Reads expressions line by line until an empty line or EOF.
fn run_repl(problem: Option<String>) {
    println!("--- Tejun Interactive Mode ---");
    let problem = parse_problem(problem);

    loop {
        let line = prompt_for_input("expr");
        if line.is_empty() {
            break;
        }
        match evaluate(&line, &EvalContext::with_problem(&problem)) {
            Ok(value) => println!("  = {}", value),
            Err(e) => println!("  ! {}", e),
        }
    }
}

fn load_flowchart(path: &str, diagram: Option<String>) -> ExecutableFlowchart {
    let definition = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read flowchart file '{}': {}", path, e))
    });
    let diagram = diagram.map(|diagram_path| {
        let json = fs::read_to_string(&diagram_path).unwrap_or_else(|e| {
            exit_with_error(&format!(
                "Failed to read diagram file '{}': {}",
                diagram_path, e
            ))
        });
        DiagramData::from_json(&json)
            .unwrap_or_else(|e| exit_with_error(&format!("Invalid diagram: {}", e)))
    });

    let definition = FlowchartDefinition::from_json(&definition)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid flowchart: {}", e)));
    let flowchart = ExecutableFlowchart::load(definition, diagram)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load flowchart: {}", e)));
    if let Err(e) = flowchart.check_references() {
        exit_with_error(&e.to_string());
    }
    flowchart
}

fn parse_problem(problem: Option<String>) -> Scope {
    problem
        .map(|json| {
            serde_json::from_str(&json)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse problem JSON: {}", e)))
        })
        .unwrap_or_default()
}

fn parse_json_file<T: serde::de::DeserializeOwned>(path: &str, what: &str) -> T {
    let json = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read {} '{}': {}", what, path, e)));
    serde_json::from_str(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse {}: {}", what, e)))
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with_error(&format!("Failed to serialize output: {}", e)),
    }
}

fn prompt_for_input(prompt_text: &str) -> String {
    let mut line = String::new();
    print!("> {}: ", prompt_text);
    let _ = io::stdout().flush();
    if io::stdin().read_line(&mut line).is_err() {
        return String::new();
    }
    line.trim().to_string()
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
