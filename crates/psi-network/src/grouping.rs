// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Super-Cluster Grouping
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Assembly of distributional super clusters from member lattice points.

use psi_types::constants::bubble_radius;

use crate::cluster::{GroupBounds, SuperInfo};
use crate::species::Species;

/// Build the distributional state of a super cluster from the set of
/// enclosed lattice points `(n_axis0, n_axis1)`.
///
/// The dispersion along each axis normalizes moment coefficients; a section
/// of width 1 gets dispersion 1 and carries no first moment.
pub fn assemble_super(
    axes: [Species; 2],
    members: Vec<(u32, u32)>,
    moment_ids: [usize; 2],
) -> SuperInfo {
    assert!(!members.is_empty(), "a super cluster must enclose members");
    let n_tot = members.len();

    let mut sum = [0.0_f64; 2];
    let mut sum_sq = [0.0_f64; 2];
    let mut lo = [u32::MAX; 2];
    let mut hi = [0_u32; 2];
    for &(a, b) in &members {
        let n = [a as f64, b as f64];
        for axis in 0..2 {
            sum[axis] += n[axis];
            sum_sq[axis] += n[axis] * n[axis];
        }
        lo[0] = lo[0].min(a);
        hi[0] = hi[0].max(a);
        lo[1] = lo[1].min(b);
        hi[1] = hi[1].max(b);
    }

    let mean = [sum[0] / n_tot as f64, sum[1] / n_tot as f64];
    let width = [hi[0] - lo[0] + 1, hi[1] - lo[1] + 1];

    let mut dispersion = [1.0_f64; 2];
    for axis in 0..2 {
        if width[axis] > 1 {
            dispersion[axis] = 2.0 * (sum_sq[axis] - mean[axis] * mean[axis] * n_tot as f64)
                / (n_tot as f64 * (width[axis] as f64 - 1.0));
        }
    }

    SuperInfo {
        axes,
        mean,
        width,
        bounds: [
            GroupBounds { lo: lo[0], hi: hi[0] },
            GroupBounds { lo: lo[1], hi: hi[1] },
        ],
        n_tot,
        dispersion,
        moment_ids,
        members,
    }
}

/// Mean bubble radius of the member set, used as the super's reaction radius.
pub fn assembled_radius(members: &[(u32, u32)], lattice: f64) -> f64 {
    let n_tot = members.len().max(1);
    members
        .iter()
        .map(|&(_, v)| bubble_radius(lattice, v as f64))
        .sum::<f64>()
        / n_tot as f64
}
