// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Line Search Property Tests
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

use neuro_train::line_search::LineSearch;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn search_never_worse_than_start(
        minimum in -1.0f64..5.0,
        curvature in 0.01f64..100.0,
        offset in 0.0f64..1.0,
        initial_step in 1e-6f64..1.0,
    ) {
        let f = |s: f64| curvature * (s - minimum).powi(2) + offset;
        let start = f(0.0);
        let mut ls = LineSearch::new(initial_step, 200);
        let mut position = 0.0;
        let out = ls.search(start, |s| {
            position = s;
            f(s)
        });
        prop_assert!(out.error <= start);
        if out.improved {
            prop_assert!(out.error < start);
            prop_assert_eq!(position, out.step);
            prop_assert!((f(out.step) - out.error).abs() <= 1e-12 * (1.0 + out.error.abs()));
        }
        prop_assert!(out.trials <= 200 + 9);
        prop_assert!(ls.baseline() > 0.0);
    }
}
