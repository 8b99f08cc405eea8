// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Communicator Scaffolding
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Deterministic 1-D domain decomposition and collective primitives.
//!
//! The core consumes an existing cartesian 1-D partition; this module holds
//! the partition metadata, ghost packing/stitching over concentration slabs,
//! and the event-boundary collectives (owner broadcast, sum reduce) in a form
//! that can be wired to rsmpi in a later phase.

use crate::error::{PsiError, PsiResult};
use ndarray::{s, Array2};

/// Locally owned span of the depth axis, with ghost width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSlice {
    pub rank: usize,
    pub nranks: usize,
    pub global_nx: usize,
    pub local_nx: usize,
    pub ghost: usize,
    pub x_start: usize,
    pub x_end: usize,
}

impl DomainSlice {
    pub fn owns(&self, xi: usize) -> bool {
        xi >= self.x_start && xi < self.x_end
    }

    /// Row index of global point `xi` inside the ghosted local block.
    pub fn local_row(&self, xi: usize) -> usize {
        let halo_before = usize::from(self.x_start > 0) * self.ghost;
        xi + halo_before - self.x_start
    }
}

/// Split `global_nx` depth points across `nranks` processes.
pub fn decompose_x(global_nx: usize, nranks: usize, ghost: usize) -> PsiResult<Vec<DomainSlice>> {
    if global_nx < 2 {
        return Err(PsiError::ConfigError(
            "domain decomposition requires global_nx >= 2".to_string(),
        ));
    }
    if nranks < 1 || nranks > global_nx {
        return Err(PsiError::ConfigError(format!(
            "cannot split global_nx={global_nx} across nranks={nranks}"
        )));
    }

    let base = global_nx / nranks;
    let rem = global_nx % nranks;
    let mut out = Vec::with_capacity(nranks);
    let mut cursor = 0usize;
    for rank in 0..nranks {
        let local_nx = base + usize::from(rank < rem);
        let x_start = cursor;
        let x_end = x_start + local_nx;
        cursor = x_end;
        out.push(DomainSlice {
            rank,
            nranks,
            global_nx,
            local_nx,
            ghost,
            x_start,
            x_end,
        });
    }
    Ok(out)
}

/// Extract ghosted local blocks (rows = grid points, cols = dof) from a
/// global concentration slab.
pub fn split_with_ghosts(
    global: &Array2<f64>,
    slices: &[DomainSlice],
) -> PsiResult<Vec<Array2<f64>>> {
    if slices.is_empty() {
        return Err(PsiError::ConfigError(
            "no slices provided for split_with_ghosts".to_string(),
        ));
    }
    let mut out = Vec::with_capacity(slices.len());
    for sdef in slices {
        if sdef.global_nx != global.nrows() {
            return Err(PsiError::ConfigError(format!(
                "slice/global mismatch: slice.global_nx={} global.nrows()={}",
                sdef.global_nx,
                global.nrows()
            )));
        }
        let start = sdef.x_start.saturating_sub(sdef.ghost);
        let end = (sdef.x_end + sdef.ghost).min(sdef.global_nx);
        out.push(global.slice(s![start..end, ..]).to_owned());
    }
    Ok(out)
}

/// Reassemble the global slab from owned rows, dropping ghosts.
pub fn stitch_without_ghosts(
    locals: &[Array2<f64>],
    slices: &[DomainSlice],
    ncols: usize,
) -> PsiResult<Array2<f64>> {
    if locals.len() != slices.len() || slices.is_empty() {
        return Err(PsiError::ConfigError(format!(
            "locals/slices mismatch: {} vs {}",
            locals.len(),
            slices.len()
        )));
    }
    let global_nx = slices[slices.len() - 1].global_nx;
    let mut global = Array2::zeros((global_nx, ncols));
    for (local, sdef) in locals.iter().zip(slices.iter()) {
        if local.ncols() != ncols {
            return Err(PsiError::ConfigError(format!(
                "local ncols mismatch: expected {ncols}, got {}",
                local.ncols()
            )));
        }
        let core_start = usize::from(sdef.x_start > 0) * sdef.ghost;
        let core_end = core_start + sdef.local_nx;
        if core_end > local.nrows() {
            return Err(PsiError::ConfigError(format!(
                "local core range out of bounds: rows={}, core_end={core_end}",
                local.nrows()
            )));
        }
        global
            .slice_mut(s![sdef.x_start..sdef.x_end, ..])
            .assign(&local.slice(s![core_start..core_end, ..]));
    }
    Ok(global)
}

/// Event-boundary collectives over the full communicator.
///
/// The serial implementation is the deterministic single-process stand-in;
/// the trait boundary is where rsmpi plugs in.
pub trait Collectives {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Ad-hoc owner discovery: every non-owner contributes 0, the owner its
    /// rank; the sum identifies the owner.
    fn owner_from_flags(&self, my_flag: usize) -> usize;

    /// Broadcast `data` from `owner` to all ranks in place.
    fn broadcast(&self, owner: usize, data: &mut [f64]);

    /// Sum-reduce `data` across ranks; result valid on every rank.
    fn sum_reduce(&self, data: &mut [f64]);
}

/// Single-process communicator.
#[derive(Debug, Clone, Default)]
pub struct SerialComm;

impl Collectives for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn owner_from_flags(&self, my_flag: usize) -> usize {
        my_flag
    }

    fn broadcast(&self, _owner: usize, _data: &mut [f64]) {}

    fn sum_reduce(&self, _data: &mut [f64]) {}
}
