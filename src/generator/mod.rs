//! Example problem generation.
//!
//! Generation runs in three phases:
//!
//! 1.  **Targeted synthesis**: for every enumerated route, draw candidates
//!     steered by the route's field filters until it has a few exact hits.
//!     Candidates that land on another route are kept under their real route.
//! 2.  **Enrichment**: routes with too few examples get further attempts until
//!     they fill up or fail too many times in a row.
//! 3.  **Diversity selection**: one example per route descriptor, simplest
//!     routes first, favouring small numbers.
//!
//! Phases 1 and 2 only depend on a subset of route indices, so they can be
//! split across workers ([`generate_examples_for_paths`]). Phase 3 must see
//! the whole pool ([`merge_and_finalize_examples`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use tejun::flowchart::ExecutableFlowchart;
//! use tejun::generator::ExampleGenerator;
//!
//! # fn run(definition: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let flowchart = ExecutableFlowchart::from_json(definition, None)?;
//! let generator = ExampleGenerator::builder(&flowchart).with_seed(42).build();
//! for example in generator.generate(4) {
//!     println!("{} {:?}", example.path_descriptor, example.values);
//! }
//! # Ok(())
//! # }
//! ```

use crate::analysis::{AnalyzerLimits, FlowchartAnalysis, FlowchartPath, PathComplexity, analyze_flowchart};
use crate::ast::{Scope, Value};
use crate::flowchart::ExecutableFlowchart;
use ahash::AHashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

mod candidate;
pub mod diagnostics;
mod fields;
pub mod rng;
pub mod selection;

use candidate::Outcome;
use fields::{FieldPlan, plan_fields, route_filters};

pub use diagnostics::{
    GenerationDiagnostics, PathDiagnostic, PathOutcome, RejectionCounts, RejectionReason,
};
pub use rng::{Mulberry32, RandomSource, ThreadRandom, source_for};
pub use selection::select_diverse;

/// Attempt budgets and drawing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Phase 1 attempts per route.
    pub attempts_per_path: usize,
    /// Phase 1 stops early for a route once it has this many exact hits.
    pub target_hits_per_path: usize,
    /// Phase 2 fills each route up to this many examples.
    pub enrichment_target: usize,
    /// Phase 2 gives up on a route after this many misses in a row.
    pub max_consecutive_failures: usize,
    /// Probability of drawing from the preferred values rather than the full domain.
    pub preferred_bias: f64,
    /// Integer ranges wider than this are not enumerated.
    pub domain_cap: usize,
    pub limits: AnalyzerLimits,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            attempts_per_path: 300,
            target_hits_per_path: 5,
            enrichment_target: 10,
            max_consecutive_failures: 100,
            preferred_bias: 0.8,
            domain_cap: 2000,
            limits: AnalyzerLimits::default(),
        }
    }
}

/// Caller-side knobs, visible to flowchart constraint expressions as
/// `$positiveAnswersOnly`, `$maxValue` and `$<extra key>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConstraints {
    pub positive_answers_only: bool,
    pub max_value: Option<f64>,
    pub extra: Scope,
}

impl GenerationConstraints {
    pub fn to_user_state(&self) -> Scope {
        let mut state = self.extra.clone();
        state.insert(
            "positiveAnswersOnly".to_string(),
            Value::Bool(self.positive_answers_only),
        );
        state.insert(
            "maxValue".to_string(),
            self.max_value.map_or(Value::Null, Value::Number),
        );
        state
    }
}

/// A generated problem together with the route it actually takes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedExample {
    /// Field values, independent and derived, ready to feed back into a form.
    pub values: Scope,
    pub complexity: PathComplexity,
    pub path_signature: String,
    pub path_descriptor: String,
}

impl GeneratedExample {
    /// Sum of the magnitudes of all values. Smaller reads easier.
    pub fn magnitude(&self) -> f64 {
        self.values.values().map(Value::magnitude).sum()
    }
}

/// Everything generation needs that does not depend on the random draws:
/// the enumerated routes, per-route field plans and the precondition check.
pub struct GenerationPlan<'f> {
    flowchart: &'f ExecutableFlowchart,
    config: GeneratorConfig,
    user_state: Scope,
    pub analysis: FlowchartAnalysis,
    field_plans: Vec<Vec<FieldPlan>>,
    by_signature: AHashMap<String, usize>,
    /// Independent fields without preferred values. Generation refuses to run
    /// while this is non-empty.
    pub missing_preferred: Vec<String>,
}

impl<'f> GenerationPlan<'f> {
    pub fn new(
        flowchart: &'f ExecutableFlowchart,
        config: GeneratorConfig,
        constraints: &GenerationConstraints,
    ) -> Self {
        let definition = &flowchart.definition;
        let missing_preferred: Vec<String> = definition
            .independent_fields()
            .filter(|field| {
                definition
                    .generation
                    .as_ref()
                    .and_then(|g| g.preferred.get(&field.name))
                    .is_none_or(Vec::is_empty)
            })
            .map(|field| field.name.clone())
            .collect();

        let analysis = analyze_flowchart(flowchart, &config.limits);
        let field_plans = analysis
            .paths
            .iter()
            .map(|path| plan_fields(definition, &route_filters(definition, path), config.domain_cap))
            .collect();
        let by_signature = analysis
            .paths
            .iter()
            .enumerate()
            .map(|(i, path)| (path.signature(), i))
            .collect();

        Self {
            flowchart,
            config,
            user_state: constraints.to_user_state(),
            analysis,
            field_plans,
            by_signature,
            missing_preferred,
        }
    }

    pub fn paths(&self) -> &[FlowchartPath] {
        &self.analysis.paths
    }

    pub fn is_ready(&self) -> bool {
        self.missing_preferred.is_empty() && !self.analysis.paths.is_empty()
    }

    fn path_by_signature(&self, signature: &str) -> Option<&FlowchartPath> {
        self.by_signature
            .get(signature)
            .map(|&i| &self.analysis.paths[i])
    }

    /// One route-targeted candidate that passed every check and replays onto
    /// the route, or `None` once the phase 1 budget is spent.
    pub fn generate_for_path(
        &self,
        path_index: usize,
        rng: &mut dyn RandomSource,
    ) -> Option<GeneratedExample> {
        if path_index >= self.analysis.paths.len() || !self.missing_preferred.is_empty() {
            return None;
        }
        (0..self.config.attempts_per_path).find_map(|_| match self.attempt(path_index, &mut *rng) {
            Outcome::OnTarget(example) => Some(example),
            Outcome::OffTarget(_) | Outcome::Rejected(_) => None,
        })
    }

    /// Phases 1 and 2 over the given route indices. Out-of-range indices are ignored.
    pub fn generate_raw(
        &self,
        indices: &[usize],
        rng: &mut dyn RandomSource,
    ) -> (Vec<GeneratedExample>, Vec<PathDiagnostic>) {
        let indices: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.analysis.paths.len())
            .collect();
        let mut pool: Vec<GeneratedExample> = Vec::new();
        let mut diagnostics: Vec<PathDiagnostic> = indices
            .iter()
            .map(|&i| {
                let path = &self.analysis.paths[i];
                PathDiagnostic::new(path.signature(), path.descriptor())
            })
            .collect();

        for (&index, diag) in indices.iter().zip(diagnostics.iter_mut()) {
            while diag.attempts < self.config.attempts_per_path
                && diag.hits < self.config.target_hits_per_path
            {
                diag.attempts += 1;
                match self.attempt(index, rng) {
                    Outcome::OnTarget(example) => {
                        diag.hits += 1;
                        pool.push(example);
                    }
                    Outcome::OffTarget(example) => {
                        diag.off_target += 1;
                        pool.push(example);
                    }
                    Outcome::Rejected(reason) => diag.rejections.record(reason),
                }
            }
        }
        debug!(examples = pool.len(), routes = indices.len(), "targeted synthesis done");

        let mut per_route = per_route_counts(&pool);
        for (&index, diag) in indices.iter().zip(diagnostics.iter_mut()) {
            let signature = &diag.signature;
            let mut consecutive_failures = 0;
            while per_route.get(signature).copied().unwrap_or(0) < self.config.enrichment_target
                && consecutive_failures < self.config.max_consecutive_failures
            {
                diag.enrichment_attempts += 1;
                match self.attempt(index, rng) {
                    Outcome::OnTarget(example) => {
                        consecutive_failures = 0;
                        diag.hits += 1;
                        *per_route.entry(example.path_signature.clone()).or_default() += 1;
                        pool.push(example);
                    }
                    Outcome::OffTarget(example) => {
                        consecutive_failures += 1;
                        diag.off_target += 1;
                        *per_route.entry(example.path_signature.clone()).or_default() += 1;
                        pool.push(example);
                    }
                    Outcome::Rejected(reason) => {
                        consecutive_failures += 1;
                        diag.rejections.record(reason);
                    }
                }
            }
            diag.finish();
        }
        debug!(examples = pool.len(), "enrichment done");

        (pool, diagnostics)
    }

    fn diagnostics_header(&self) -> GenerationDiagnostics {
        let mut diagnostics = GenerationDiagnostics {
            preferred_values_ok: self.missing_preferred.is_empty(),
            missing_preferred: self.missing_preferred.clone(),
            path_count: self.analysis.paths.len(),
            truncated: self.analysis.truncated,
            recommended_iterations: self.analysis.stats.recommended_iterations,
            ..Default::default()
        };
        let id = &self.flowchart.definition.id;
        if !self.missing_preferred.is_empty() {
            let message = format!(
                "Flowchart '{}' declares no preferred values for: {}",
                id,
                self.missing_preferred.join(", ")
            );
            warn!(flowchart = %id, "{}", message);
            diagnostics.warnings.push(message);
        }
        if self.analysis.paths.is_empty() {
            let message = format!("Flowchart '{}' has no route from entry to a terminal", id);
            warn!(flowchart = %id, "{}", message);
            diagnostics.warnings.push(message);
        }
        if self.analysis.truncated {
            diagnostics
                .warnings
                .push(format!("Route enumeration for '{}' was truncated", id));
        }
        diagnostics
    }
}

fn per_route_counts(pool: &[GeneratedExample]) -> AHashMap<String, usize> {
    let mut counts: AHashMap<String, usize> = AHashMap::new();
    for example in pool {
        *counts.entry(example.path_signature.clone()).or_default() += 1;
    }
    counts
}

/// Configured entry point for generation.
pub struct ExampleGenerator<'f> {
    flowchart: &'f ExecutableFlowchart,
    config: GeneratorConfig,
    constraints: GenerationConstraints,
    seed: Option<u32>,
}

pub struct ExampleGeneratorBuilder<'f> {
    flowchart: &'f ExecutableFlowchart,
    config: GeneratorConfig,
    constraints: GenerationConstraints,
    seed: Option<u32>,
}

impl<'f> ExampleGeneratorBuilder<'f> {
    pub fn new(flowchart: &'f ExecutableFlowchart) -> Self {
        Self {
            flowchart,
            config: GeneratorConfig::default(),
            constraints: GenerationConstraints::default(),
            seed: None,
        }
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Makes every run reproducible. Without a seed draws come from the thread RNG.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_constraints(mut self, constraints: GenerationConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn build(self) -> ExampleGenerator<'f> {
        ExampleGenerator {
            flowchart: self.flowchart,
            config: self.config,
            constraints: self.constraints,
            seed: self.seed,
        }
    }
}

impl<'f> ExampleGenerator<'f> {
    pub fn builder(flowchart: &'f ExecutableFlowchart) -> ExampleGeneratorBuilder<'f> {
        ExampleGeneratorBuilder::new(flowchart)
    }

    pub fn plan(&self) -> GenerationPlan<'f> {
        GenerationPlan::new(self.flowchart, self.config.clone(), &self.constraints)
    }

    pub fn generate(&self, count: usize) -> Vec<GeneratedExample> {
        self.generate_with_diagnostics(count).0
    }

    pub fn generate_with_diagnostics(
        &self,
        count: usize,
    ) -> (Vec<GeneratedExample>, GenerationDiagnostics) {
        let mut rng = source_for(self.seed);
        run_with_diagnostics(&self.plan(), count, rng.as_mut())
    }

    /// Same phases with raw generation split across `workers` threads. Worker
    /// `i` draws from its own generator seeded `seed + i`; selection uses
    /// `seed + workers`. Unseeded generators pick a random base seed.
    pub fn generate_parallel(&self, count: usize, workers: usize) -> Vec<GeneratedExample> {
        let seed = self.seed.unwrap_or_else(rand::random);
        parallel(&self.plan(), count, workers, seed)
    }
}

fn run_with_diagnostics(
    plan: &GenerationPlan<'_>,
    count: usize,
    rng: &mut dyn RandomSource,
) -> (Vec<GeneratedExample>, GenerationDiagnostics) {
    let mut diagnostics = plan.diagnostics_header();
    if !plan.is_ready() {
        return (Vec::new(), diagnostics);
    }

    let indices: Vec<usize> = (0..plan.paths().len()).collect();
    let (pool, paths) = plan.generate_raw(&indices, rng);
    diagnostics.absorb(paths);
    let selected = merge_and_finalize_examples(pool, count, rng);
    diagnostics.selected = selected.len();

    info!(
        flowchart = %plan.flowchart.definition.id,
        routes = diagnostics.path_count,
        hits = diagnostics.hit_count(),
        attempts = diagnostics.total_attempts,
        selected = diagnostics.selected,
        "generation finished"
    );
    for miss in diagnostics.misses() {
        if let PathOutcome::Miss { reason } = &miss.outcome {
            debug!(route = %miss.label, %reason, "route produced no examples");
        }
    }
    (selected, diagnostics)
}

fn parallel(
    plan: &GenerationPlan<'_>,
    count: usize,
    workers: usize,
    seed: u32,
) -> Vec<GeneratedExample> {
    // Emit the precondition warnings once.
    if !plan.is_ready() {
        plan.diagnostics_header();
        return Vec::new();
    }
    let workers = workers.max(1);
    let indices: Vec<usize> = (0..plan.paths().len()).collect();
    let chunk = indices.len().div_ceil(workers).max(1);

    let pool: Vec<GeneratedExample> = indices
        .par_chunks(chunk)
        .enumerate()
        .map(|(worker, slice)| {
            let mut rng = Mulberry32::new(seed.wrapping_add(worker as u32));
            plan.generate_raw(slice, &mut rng).0
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();

    let mut rng = Mulberry32::new(seed.wrapping_add(workers as u32));
    merge_and_finalize_examples(pool, count, &mut rng)
}

/// Generates up to `count` examples, one per distinct route descriptor where
/// possible. Returns an empty list, with a logged warning, when an independent
/// field has no preferred values or no route exists.
pub fn generate_diverse_examples(
    flowchart: &ExecutableFlowchart,
    count: usize,
    constraints: &GenerationConstraints,
    rng: &mut dyn RandomSource,
) -> Vec<GeneratedExample> {
    generate_diverse_examples_with_diagnostics(flowchart, count, constraints, rng).0
}

/// [`generate_diverse_examples`] with a structured account of every route.
pub fn generate_diverse_examples_with_diagnostics(
    flowchart: &ExecutableFlowchart,
    count: usize,
    constraints: &GenerationConstraints,
    rng: &mut dyn RandomSource,
) -> (Vec<GeneratedExample>, GenerationDiagnostics) {
    let plan = GenerationPlan::new(flowchart, GeneratorConfig::default(), constraints);
    run_with_diagnostics(&plan, count, rng)
}

/// One candidate replaying onto `path`, or `None` if the attempt budget runs out.
/// `path` is matched by signature against this flowchart's enumerated routes;
/// an unknown route yields `None`.
pub fn generate_for_path(
    flowchart: &ExecutableFlowchart,
    path: &FlowchartPath,
    constraints: &GenerationConstraints,
    rng: &mut dyn RandomSource,
) -> Option<GeneratedExample> {
    let plan = GenerationPlan::new(flowchart, GeneratorConfig::default(), constraints);
    let index = plan.by_signature.get(&path.signature()).copied()?;
    plan.generate_for_path(index, rng)
}

/// Raw phases 1 and 2 for a subset of route indices. Stateless apart from `rng`,
/// so disjoint subsets can run on separate workers.
pub fn generate_examples_for_paths(
    flowchart: &ExecutableFlowchart,
    indices: &[usize],
    constraints: &GenerationConstraints,
    rng: &mut dyn RandomSource,
) -> Vec<GeneratedExample> {
    let plan = GenerationPlan::new(flowchart, GeneratorConfig::default(), constraints);
    if !plan.is_ready() {
        plan.diagnostics_header();
        return Vec::new();
    }
    plan.generate_raw(indices, rng).0
}

/// Phase 3 over the concatenated output of [`generate_examples_for_paths`].
pub fn merge_and_finalize_examples(
    examples: Vec<GeneratedExample>,
    count: usize,
    rng: &mut dyn RandomSource,
) -> Vec<GeneratedExample> {
    select_diverse(examples, count, rng)
}

/// Parallel driver: route indices are split into `workers` contiguous chunks
/// generated on the rayon pool, then merged single-threaded.
pub fn generate_diverse_examples_parallel(
    flowchart: &ExecutableFlowchart,
    count: usize,
    constraints: &GenerationConstraints,
    workers: usize,
    seed: u32,
) -> Vec<GeneratedExample> {
    let plan = GenerationPlan::new(flowchart, GeneratorConfig::default(), constraints);
    parallel(&plan, count, workers, seed)
}
