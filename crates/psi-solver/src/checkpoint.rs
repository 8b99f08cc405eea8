// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Checkpoint Boundary
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Timestep concentration groups: sparse `(id, value)` rows per grid point,
//! the grid vector, and the surface/bulk counters. The byte-level container
//! belongs to the external I/O collaborator; this boundary fixes the fields
//! and their round-trip.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use psi_types::counters::{BulkCounters, SurfaceCounters};
use psi_types::error::{PsiError, PsiResult};

/// Concentrations below this magnitude are not persisted.
const CONC_FLOOR: f64 = 1.0e-16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceGroup {
    pub position: usize,
    pub counters: SurfaceCounters,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallClock {
    pub time: f64,
    pub previous_time: f64,
    pub delta_t: f64,
}

/// One persisted timestep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestepGroup {
    pub loop_number: u32,
    pub timestep_index: u64,
    pub clock: WallClock,
    pub grid: Vec<f64>,
    #[serde(default)]
    pub surface: Option<SurfaceGroup>,
    #[serde(default)]
    pub bulk: Option<BulkCounters>,
    /// Ragged rows ordered by grid index.
    pub concs: Vec<Vec<(usize, f64)>>,
}

/// The `concentrationsGroup` of a checkpoint file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationGroup {
    pub timesteps: Vec<TimestepGroup>,
}

impl ConcentrationGroup {
    pub fn new() -> Self {
        ConcentrationGroup::default()
    }

    pub fn push(&mut self, group: TimestepGroup) {
        self.timesteps.push(group);
    }

    pub fn last(&self) -> Option<&TimestepGroup> {
        self.timesteps.last()
    }

    pub fn write(&self, path: &str) -> PsiResult<()> {
        let contents = serde_json::to_string(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn read(path: &str) -> PsiResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let group: Self = serde_json::from_str(&contents)?;
        if group
            .timesteps
            .windows(2)
            .any(|w| w[1].clock.time < w[0].clock.time)
        {
            return Err(PsiError::Checkpoint(
                "timestep groups are not ordered in time".to_string(),
            ));
        }
        Ok(group)
    }
}

/// Extract the sparse `(id, value)` rows of the owned slab.
pub fn sparse_rows(conc: &Array2<f64>, xs: usize, xm: usize) -> Vec<Vec<(usize, f64)>> {
    let mut rows = Vec::with_capacity(xm);
    for xi in xs..xs + xm {
        let mut pairs = Vec::new();
        for (k, &value) in conc.row(xi).iter().enumerate() {
            if value.abs() > CONC_FLOOR {
                pairs.push((k, value));
            }
        }
        rows.push(pairs);
    }
    rows
}
