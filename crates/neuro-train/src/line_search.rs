// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Adaptive Line Search
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Step-size search along a descent direction.
//!
//! Starts at an adaptive baseline and doubles while the error keeps falling.
//! A failure right at the baseline shrinks the baseline tenfold; a failure
//! after a success brackets the minimum, which golden-section search refines.
//! The baseline persists across iterations.

use neuro_types::constants::{
    BASELINE_GROWTH, BASELINE_SHRINK, GOLDEN_SECTION_ITERATIONS, GOLDEN_TAU,
    LEARNING_STEP_FLOOR,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSearchOutcome {
    /// Best error found, or the starting error when nothing improved.
    pub error: f64,
    pub step: f64,
    pub improved: bool,
    /// The baseline hit its floor during this search.
    pub underflow: bool,
    pub trials: usize,
}

#[derive(Debug, Clone)]
pub struct LineSearch {
    baseline: f64,
    max_trials: usize,
}

impl LineSearch {
    pub fn new(initial_step: f64, max_trials: usize) -> Self {
        LineSearch {
            baseline: initial_step,
            max_trials: max_trials.max(1),
        }
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Baseline can shrink no further.
    pub fn is_pinned(&self) -> bool {
        self.baseline <= LEARNING_STEP_FLOOR
    }

    /// Search along a direction. `eval(step)` must move the parameters to
    /// `snapshot − step·direction` and return the resulting error.
    ///
    /// On return the parameters sit at the best step found. When nothing
    /// improved they sit at the last trial and the caller restores its
    /// snapshot.
    pub fn search<F>(&mut self, start_error: f64, mut eval: F) -> LineSearchOutcome
    where
        F: FnMut(f64) -> f64,
    {
        let mut best_error = start_error;
        let mut best_step: Option<f64> = None;
        let mut last_step: Option<f64> = None;
        let mut step = self.baseline;
        let mut at_baseline = true;
        let mut underflow = false;
        let mut trials = 0;

        while trials < self.max_trials {
            let err = eval(step);
            last_step = Some(step);
            trials += 1;

            if err < best_error {
                best_error = err;
                best_step = Some(step);
                step *= 2.0;
                self.baseline *= BASELINE_GROWTH;
                at_baseline = false;
            } else if at_baseline {
                self.baseline *= BASELINE_SHRINK;
                if self.baseline < LEARNING_STEP_FLOOR {
                    self.baseline = LEARNING_STEP_FLOOR;
                    underflow = true;
                    break;
                }
                step = self.baseline;
            } else {
                let golden = golden_section(step / 4.0, step, &mut eval);
                trials += golden.evaluations;
                last_step = Some(golden.last_step);
                if golden.error < best_error {
                    best_error = golden.error;
                    best_step = Some(golden.step);
                }
                break;
            }
        }

        match best_step {
            Some(s) => {
                if last_step != Some(s) {
                    eval(s);
                }
                LineSearchOutcome {
                    error: best_error,
                    step: s,
                    improved: true,
                    underflow,
                    trials,
                }
            }
            None => LineSearchOutcome {
                error: start_error,
                step: 0.0,
                improved: false,
                underflow,
                trials,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct GoldenResult {
    step: f64,
    error: f64,
    last_step: f64,
    evaluations: usize,
}

/// Golden-section search on `[a, b]`, reusing one interior point per round.
fn golden_section<F>(mut a: f64, mut b: f64, eval: &mut F) -> GoldenResult
where
    F: FnMut(f64) -> f64,
{
    let mut c = a + (1.0 - GOLDEN_TAU) * (b - a);
    let mut d = b - (1.0 - GOLDEN_TAU) * (b - a);
    let mut fc = eval(c);
    let mut fd = eval(d);
    let mut result = GoldenResult {
        step: if fc < fd { c } else { d },
        error: fc.min(fd),
        last_step: d,
        evaluations: 2,
    };

    for _ in 1..GOLDEN_SECTION_ITERATIONS {
        let (probe, value) = if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = a + (1.0 - GOLDEN_TAU) * (b - a);
            fc = eval(c);
            (c, fc)
        } else {
            a = c;
            c = d;
            fc = fd;
            d = b - (1.0 - GOLDEN_TAU) * (b - a);
            fd = eval(d);
            (d, fd)
        };
        result.last_step = probe;
        result.evaluations += 1;
        if value < result.error {
            result.error = value;
            result.step = probe;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golden_section_finds_parabola_minimum() {
        let mut calls = 0;
        let mut f = |x: f64| {
            calls += 1;
            (x - 0.3).powi(2)
        };
        let r = golden_section(0.0, 1.0, &mut f);
        assert_eq!(r.evaluations, GOLDEN_SECTION_ITERATIONS + 1);
        assert_eq!(calls, r.evaluations);
        assert!((r.step - 0.3).abs() < 0.05, "step {}", r.step);
    }

    #[test]
    fn test_search_doubles_then_brackets() {
        // Error along the direction is (s - 0.05)²; baseline 1e-3.
        let mut ls = LineSearch::new(1e-3, 50);
        let mut position = 0.0;
        let out = ls.search(0.05_f64.powi(2), |s| {
            position = s;
            (s - 0.05).powi(2)
        });
        assert!(out.improved);
        assert!(out.error < 1e-4);
        assert_eq!(position, out.step);
        assert!(ls.baseline() > 1e-3);
    }

    #[test]
    fn test_failure_at_baseline_shrinks_it() {
        // Minimum at 1e-5: the first trial at 1e-3 overshoots.
        let mut ls = LineSearch::new(1e-3, 50);
        let start = 1e-10;
        let out = ls.search(start, |s| (s - 1e-5).powi(2));
        assert!(out.improved);
        assert!(out.error < start);
        assert!(ls.baseline() < 1e-3);
    }

    #[test]
    fn test_no_descent_underflows() {
        let mut ls = LineSearch::new(1e-3, 1000);
        let out = ls.search(1.0, |_| 2.0);
        assert!(!out.improved);
        assert!(out.underflow);
        assert_eq!(out.error, 1.0);
        assert!(ls.is_pinned());
        assert_eq!(ls.baseline(), LEARNING_STEP_FLOOR);
    }

    #[test]
    fn test_trial_cap() {
        let mut ls = LineSearch::new(1e-3, 5);
        let out = ls.search(1.0, |_| 2.0);
        assert_eq!(out.trials, 5);
        assert!(!out.underflow);
    }
}
