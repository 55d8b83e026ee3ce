use serde::{Deserialize, Serialize};
use simplexwatch_core::{get_objective_config, RunResult};
use std::fmt::Write;

/// Everything a finished run produced, one result per worker in worker order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub objective: String,
    /// True when the objective was negated to search for maxima.
    #[serde(default)]
    pub maximized: bool,
    pub results: Vec<RunResult>,
    pub updates_received: u32,
    /// Snapshots dropped because a longer one had already been drawn.
    pub updates_ignored: u32,
    pub elapsed_ms: f64,
}

impl RunSummary {
    pub fn failures(&self) -> impl Iterator<Item = &RunResult> {
        self.results.iter().filter(|r| r.status.is_failed())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn converged_count(&self) -> usize {
        self.results.iter().filter(|r| r.converged()).count()
    }

    /// Lowest final value over all workers that produced one.
    pub fn best(&self) -> Option<&RunResult> {
        self.results
            .iter()
            .filter(|r| r.final_value.is_some())
            .min_by(|a, b| {
                let a = a.final_value.unwrap_or(f64::INFINITY);
                let b = b.final_value.unwrap_or(f64::INFINITY);
                a.total_cmp(&b)
            })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable table, one line per worker.
    pub fn report(&self) -> String {
        let config = if self.maximized {
            None
        } else {
            get_objective_config(&self.objective)
        };

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} ({} workers, {} converged, {:.1} ms)",
            self.objective,
            self.results.len(),
            self.converged_count(),
            self.elapsed_ms
        );
        for result in &self.results {
            let value = match result.final_value {
                // Report the objective's own sign when it was negated.
                Some(v) if self.maximized => format!("{:.6e}", -v),
                Some(v) => format!("{v:.6e}"),
                None => "n/a".to_string(),
            };
            let _ = write!(
                out,
                "  Simplex {}: {} after {} iterations, f({}) = {}",
                result.worker_id.0 + 1,
                result.status.label(),
                result.iterations,
                format_coords(result.final_point.coords()),
                value
            );
            if let Some(failure) = result.failure() {
                let _ = write!(out, " [{failure}]");
            } else if let Some((minimum, distance)) =
                config.and_then(|c| c.nearest_minimum(&result.final_point))
            {
                let _ = write!(
                    out,
                    " [nearest minimum ({}), distance {distance:.2e}]",
                    format_coords(minimum.coords())
                );
            }
            out.push('\n');
        }
        out
    }
}

fn format_coords(coords: &[f64]) -> String {
    coords
        .iter()
        .map(|c| format!("{c:.6}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use simplexwatch_core::{EvaluationError, Point, RunFailure, RunStatus, WorkerId};

    fn result(id: u32, value: Option<f64>, status: RunStatus) -> RunResult {
        RunResult {
            worker_id: WorkerId(id),
            start: Point::xy(3.0, 3.0),
            final_point: Point::xy(3.0, 2.0),
            final_value: value,
            iterations: 60,
            evaluations: 115,
            updates_published: 61,
            elapsed_ms: 0.3,
            status,
        }
    }

    fn summary() -> RunSummary {
        RunSummary {
            objective: "himmelblau".into(),
            results: vec![
                result(0, Some(1e-10), RunStatus::Converged),
                result(
                    1,
                    None,
                    RunStatus::failed(RunFailure::Evaluation(EvaluationError::Failed(
                        "boom".into(),
                    ))),
                ),
                result(2, Some(1e-12), RunStatus::IterationLimit),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn failures_are_listed() {
        let summary = summary();
        assert!(summary.has_failures());
        assert_eq!(summary.failures().count(), 1);
        assert_eq!(summary.converged_count(), 1);
    }

    #[test]
    fn best_ignores_missing_values() {
        assert_eq!(summary().best().unwrap().worker_id, WorkerId(2));
    }

    #[test]
    fn report_names_nearest_minimum_and_failure() {
        let report = summary().report();
        assert!(report.contains("Simplex 1: converged"));
        assert!(report.contains("nearest minimum (3.000000, 2.000000)"));
        assert!(report.contains("Simplex 2: failed"));
        assert!(report.contains("boom"));
    }

    #[test]
    fn maximized_report_restores_sign() {
        let mut summary = summary();
        summary.maximized = true;
        let report = summary.report();
        assert!(report.contains("-1.000000e-10"));
        assert!(!report.contains("nearest minimum"));
    }

    #[test]
    fn json_contains_results() {
        let json = summary().to_json().unwrap();
        let back: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.results.len(), 3);
        assert_eq!(back.results[1].status, summary().results[1].status);
        assert!(json.contains(r#""type": "Failed""#));
    }
}
