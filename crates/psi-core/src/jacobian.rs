// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Jacobian Fill Patterns and Block Store
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Block-fill patterns handed to the integrator and a sparse stand-in for
//! its matrix, keyed by (grid point, row, column point, column).

use std::collections::HashMap;

/// Dof-by-dof coupling pattern. `ofill` marks spatial (neighbor) coupling,
/// `dfill` the within-point reaction coupling.
#[derive(Debug, Clone)]
pub struct FillPattern {
    n: usize,
    rows: Vec<Vec<usize>>,
}

impl FillPattern {
    pub fn new(n: usize) -> Self {
        FillPattern {
            n,
            rows: vec![Vec::new(); n],
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn set(&mut self, row: usize, col: usize) {
        let cols = &mut self.rows[row];
        if let Err(pos) = cols.binary_search(&col) {
            cols.insert(pos, col);
        }
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.rows[row].binary_search(&col).is_ok()
    }

    pub fn row(&self, row: usize) -> &[usize] {
        &self.rows[row]
    }

    pub fn num_nonzero(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Row-wise union used for the combined coverage check.
    pub fn union(&self, other: &FillPattern) -> FillPattern {
        let mut out = self.clone();
        for row in 0..other.n {
            for &col in other.row(row) {
                out.set(row, col);
            }
        }
        out
    }
}

/// Sparse Jacobian stand-in with add-semantics, storing the stencil offset
/// of the column point relative to the row point.
#[derive(Debug, Default)]
pub struct SparseJacobian {
    entries: HashMap<(usize, usize, isize, usize), f64>,
}

impl SparseJacobian {
    pub fn new() -> Self {
        SparseJacobian::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn add(&mut self, xi: usize, row: usize, col_xi: usize, col: usize, value: f64) {
        let offset = col_xi as isize - xi as isize;
        *self.entries.entry((xi, row, offset, col)).or_insert(0.0) += value;
    }

    pub fn value(&self, xi: usize, row: usize, col_xi: usize, col: usize) -> f64 {
        let offset = col_xi as isize - xi as isize;
        self.entries
            .get(&(xi, row, offset, col))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    /// Every stored entry must be covered: neighbor-point entries by
    /// `ofill`, same-point entries by `ofill ∪ dfill`.
    pub fn covered_by(&self, ofill: &FillPattern, dfill: &FillPattern) -> bool {
        self.entries.iter().all(|(&(_, row, offset, col), _)| {
            if offset == 0 {
                ofill.contains(row, col) || dfill.contains(row, col)
            } else {
                ofill.contains(row, col)
            }
        })
    }

    /// Nonzero entries outside the combined pattern, for diagnostics.
    pub fn uncovered(&self, ofill: &FillPattern, dfill: &FillPattern) -> Vec<(usize, usize, isize, usize)> {
        self.entries
            .iter()
            .filter(|(&(_, row, offset, col), &v)| {
                v != 0.0
                    && !(if offset == 0 {
                        ofill.contains(row, col) || dfill.contains(row, col)
                    } else {
                        ofill.contains(row, col)
                    })
            })
            .map(|(&key, _)| key)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_pattern_set_and_contains() {
        let mut p = FillPattern::new(4);
        p.set(1, 2);
        p.set(1, 0);
        p.set(1, 2);
        assert!(p.contains(1, 2));
        assert!(p.contains(1, 0));
        assert!(!p.contains(1, 3));
        assert_eq!(p.row(1), &[0, 2]);
        assert_eq!(p.num_nonzero(), 2);
    }

    #[test]
    fn test_union_merges_rows() {
        let mut a = FillPattern::new(3);
        a.set(0, 0);
        let mut b = FillPattern::new(3);
        b.set(0, 1);
        b.set(2, 2);
        let u = a.union(&b);
        assert!(u.contains(0, 0));
        assert!(u.contains(0, 1));
        assert!(u.contains(2, 2));
    }

    #[test]
    fn test_jacobian_add_accumulates() {
        let mut j = SparseJacobian::new();
        j.add(3, 1, 3, 1, 2.0);
        j.add(3, 1, 3, 1, 0.5);
        j.add(3, 1, 2, 1, -1.0);
        assert!((j.value(3, 1, 3, 1) - 2.5).abs() < 1e-12);
        assert!((j.value(3, 1, 2, 1) + 1.0).abs() < 1e-12);
        assert_eq!(j.value(3, 1, 4, 1), 0.0);
    }

    #[test]
    fn test_coverage_check() {
        let mut ofill = FillPattern::new(2);
        ofill.set(0, 0);
        let mut dfill = FillPattern::new(2);
        dfill.set(0, 1);

        let mut j = SparseJacobian::new();
        j.add(5, 0, 4, 0, 1.0); // neighbor, diagonal dof: ofill
        j.add(5, 0, 5, 1, 1.0); // same point, cross dof: dfill
        assert!(j.covered_by(&ofill, &dfill));

        // A neighbor-point cross coupling is never allowed.
        j.add(5, 0, 6, 1, 1.0);
        assert!(!j.covered_by(&ofill, &dfill));
        assert_eq!(j.uncovered(&ofill, &dfill).len(), 1);
    }
}
