// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Property-Based Tests (proptest) for psi-solver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for the checkpoint rows and the negative guard.

use ndarray::Array2;
use proptest::prelude::*;
use psi_solver::checkpoint::sparse_rows;
use psi_solver::monitor::Monitors;
use psi_solver::options::MonitorOptions;

proptest! {
    /// Sparse rows reproduce every persisted value exactly, and persisted
    /// values are exactly those above the floor.
    #[test]
    fn sparse_rows_reconstruct_slab(
        nx in 2usize..12,
        dof in 1usize..16,
        scale in 1.0e-10f64..1.0e10,
    ) {
        let conc = Array2::from_shape_fn((nx, dof), |(i, j)| {
            if (i + j) % 3 == 0 { scale * (i * dof + j + 1) as f64 } else { 0.0 }
        });
        let rows = sparse_rows(&conc, 0, nx);
        prop_assert_eq!(rows.len(), nx);

        let mut rebuilt = Array2::zeros((nx, dof));
        for (xi, pairs) in rows.iter().enumerate() {
            for &(id, value) in pairs {
                rebuilt[[xi, id]] = value;
            }
        }
        for xi in 0..nx {
            for k in 0..dof {
                let original = conc[[xi, k]];
                if original.abs() > 1.0e-16 {
                    prop_assert_eq!(rebuilt[[xi, k]], original);
                } else {
                    prop_assert_eq!(rebuilt[[xi, k]], 0.0);
                }
            }
        }
    }

    /// The negative guard is idempotent and never changes the sign of a
    /// concentration.
    #[test]
    fn negative_guard_idempotent(
        threshold_exp in -32i32..-20,
        value_exp in -40i32..-10,
        sign in prop::bool::ANY,
    ) {
        let threshold = 10f64.powi(threshold_exp);
        let value = if sign { 10f64.powi(value_exp) } else { -(10f64.powi(value_exp)) };
        let monitors = Monitors::new(MonitorOptions {
            check_negative: Some(threshold),
            ..MonitorOptions::default()
        });

        let mut conc = Array2::from_elem((1, 1), value);
        monitors.check_negative(&mut conc, 0, 1);
        let once = conc[[0, 0]];
        monitors.check_negative(&mut conc, 0, 1);
        let twice = conc[[0, 0]];

        prop_assert_eq!(once, twice, "clamp must be idempotent");
        prop_assert!(once.abs() >= threshold || once == 0.0);
        prop_assert_eq!(once.signum(), value.signum());
    }
}
