use serde::{Deserialize, Serialize};

/// Why a single candidate was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectionReason {
    /// No value of some field survives the route's filters.
    NoValue,
    Derivation,
    Variables,
    Validation,
    Constraint,
    /// The walkthrough failed: a revisit, an unresolved successor or an evaluation error.
    Walk,
    /// The walk took the intended route but a route constraint did not hold.
    Replay,
}

impl RejectionReason {
    fn describe(self) -> &'static str {
        match self {
            RejectionReason::NoValue => "no field value satisfies the route's constraints",
            RejectionReason::Derivation => "derived fields could not be computed",
            RejectionReason::Variables => "flowchart variables could not be computed",
            RejectionReason::Validation => "candidates failed the problem validation",
            RejectionReason::Constraint => "candidates violated a generation constraint",
            RejectionReason::Walk => "the walkthrough could not reach a terminal",
            RejectionReason::Replay => "route conditions did not hold on replay",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionCounts {
    pub no_value: usize,
    pub derivation: usize,
    pub variables: usize,
    pub validation: usize,
    pub constraint: usize,
    pub walk: usize,
    pub replay: usize,
}

impl RejectionCounts {
    pub fn record(&mut self, reason: RejectionReason) {
        *self.slot(reason) += 1;
    }

    pub fn get(&self, reason: RejectionReason) -> usize {
        match reason {
            RejectionReason::NoValue => self.no_value,
            RejectionReason::Derivation => self.derivation,
            RejectionReason::Variables => self.variables,
            RejectionReason::Validation => self.validation,
            RejectionReason::Constraint => self.constraint,
            RejectionReason::Walk => self.walk,
            RejectionReason::Replay => self.replay,
        }
    }

    pub fn total(&self) -> usize {
        self.no_value
            + self.derivation
            + self.variables
            + self.validation
            + self.constraint
            + self.walk
            + self.replay
    }

    /// The most frequent rejection, first in declaration order on ties.
    pub fn dominant(&self) -> Option<RejectionReason> {
        const ALL: [RejectionReason; 7] = [
            RejectionReason::NoValue,
            RejectionReason::Derivation,
            RejectionReason::Variables,
            RejectionReason::Validation,
            RejectionReason::Constraint,
            RejectionReason::Walk,
            RejectionReason::Replay,
        ];
        ALL.into_iter()
            .filter(|r| self.get(*r) > 0)
            .fold(None, |best: Option<RejectionReason>, r| match best {
                Some(b) if self.get(b) >= self.get(r) => Some(b),
                _ => Some(r),
            })
    }

    fn slot(&mut self, reason: RejectionReason) -> &mut usize {
        match reason {
            RejectionReason::NoValue => &mut self.no_value,
            RejectionReason::Derivation => &mut self.derivation,
            RejectionReason::Variables => &mut self.variables,
            RejectionReason::Validation => &mut self.validation,
            RejectionReason::Constraint => &mut self.constraint,
            RejectionReason::Walk => &mut self.walk,
            RejectionReason::Replay => &mut self.replay,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PathOutcome {
    Hit,
    Miss { reason: String },
}

/// What happened while generating for one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathDiagnostic {
    pub signature: String,
    /// Decision short labels along the route.
    pub label: String,
    pub attempts: usize,
    pub enrichment_attempts: usize,
    pub hits: usize,
    /// Accepted candidates that took a different route than intended.
    pub off_target: usize,
    pub rejections: RejectionCounts,
    pub outcome: PathOutcome,
}

impl PathDiagnostic {
    pub(crate) fn new(signature: String, label: String) -> Self {
        Self {
            signature,
            label,
            attempts: 0,
            enrichment_attempts: 0,
            hits: 0,
            off_target: 0,
            rejections: RejectionCounts::default(),
            outcome: PathOutcome::Hit,
        }
    }

    /// Settles the outcome from the counters.
    pub(crate) fn finish(&mut self) {
        self.outcome = if self.hits > 0 {
            PathOutcome::Hit
        } else {
            PathOutcome::Miss {
                reason: self.miss_reason(),
            }
        };
    }

    fn miss_reason(&self) -> String {
        let total = self.attempts + self.enrichment_attempts;
        if total == 0 {
            return "no attempts were made".to_string();
        }
        match self.rejections.dominant() {
            Some(reason) => format!(
                "{} ({} of {} attempts)",
                reason.describe(),
                self.rejections.get(reason),
                total
            ),
            None => format!(
                "all {} accepted candidates took a different route",
                self.off_target
            ),
        }
    }
}

/// Structured account of a generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationDiagnostics {
    pub preferred_values_ok: bool,
    /// Independent fields declared without preferred values.
    pub missing_preferred: Vec<String>,
    pub path_count: usize,
    pub truncated: bool,
    /// Coverage estimate from analysis. Informational: the per-route and
    /// enrichment attempt limits bound the actual run.
    pub recommended_iterations: usize,
    pub paths: Vec<PathDiagnostic>,
    pub total_attempts: usize,
    pub total_successes: usize,
    pub selected: usize,
    pub warnings: Vec<String>,
}

impl GenerationDiagnostics {
    pub(crate) fn absorb(&mut self, paths: Vec<PathDiagnostic>) {
        for path in &paths {
            self.total_attempts += path.attempts + path.enrichment_attempts;
            self.total_successes += path.hits + path.off_target;
        }
        self.paths.extend(paths);
    }

    pub fn hit_count(&self) -> usize {
        self.paths
            .iter()
            .filter(|p| p.outcome == PathOutcome::Hit)
            .count()
    }

    pub fn misses(&self) -> impl Iterator<Item = &PathDiagnostic> {
        self.paths
            .iter()
            .filter(|p| matches!(p.outcome, PathOutcome::Miss { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_rejection_wins_and_ties_keep_order() {
        let mut counts = RejectionCounts::default();
        assert_eq!(counts.dominant(), None);
        counts.record(RejectionReason::Replay);
        counts.record(RejectionReason::Validation);
        assert_eq!(counts.dominant(), Some(RejectionReason::Validation));
        counts.record(RejectionReason::Replay);
        assert_eq!(counts.dominant(), Some(RejectionReason::Replay));
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn miss_reason_names_the_dominant_rejection() {
        let mut diag = PathDiagnostic::new("a→b".into(), "Yes".into());
        diag.attempts = 4;
        for _ in 0..4 {
            diag.rejections.record(RejectionReason::Validation);
        }
        diag.finish();
        assert_eq!(
            diag.outcome,
            PathOutcome::Miss {
                reason: "candidates failed the problem validation (4 of 4 attempts)".into()
            }
        );
    }
}
