// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Cluster
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use psi_types::constants::K_BOLTZMANN_EV;
use serde::{Deserialize, Serialize};

use crate::species::{Composition, ReactantType, Species};

/// Arrhenius diffusion law, D(T) = D0 · exp(−E_m / k_B T), in nm²/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiffusionLaw {
    pub d0: f64,
    pub migration_energy: f64,
}

impl DiffusionLaw {
    pub fn coefficient(&self, temperature: f64) -> f64 {
        if temperature <= 0.0 {
            return 0.0;
        }
        self.d0 * (-self.migration_energy / (K_BOLTZMANN_EV * temperature)).exp()
    }
}

/// Inclusive integer interval along one grouping axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupBounds {
    pub lo: u32,
    pub hi: u32,
}

impl GroupBounds {
    pub fn contains(&self, n: u32) -> bool {
        n >= self.lo && n <= self.hi
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> {
        self.lo..=self.hi
    }
}

/// Distributional state of a super cluster: a rectangular bundle of lattice
/// points in composition space represented by a zeroth moment and one first
/// moment per grouped axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SuperInfo {
    /// Grouped axes; single-axis groupings leave the second axis degenerate.
    pub axes: [Species; 2],
    pub mean: [f64; 2],
    pub width: [u32; 2],
    pub bounds: [GroupBounds; 2],
    /// Number of real clusters enclosed by the bounding box.
    pub n_tot: usize,
    pub dispersion: [f64; 2],
    /// Dense ids of the first-moment degrees of freedom, one per axis.
    pub moment_ids: [usize; 2],
    /// Enclosed lattice points (amount on axis 0, amount on axis 1).
    pub members: Vec<(u32, u32)>,
}

impl SuperInfo {
    /// Normalized distance to the group mean along `axis`;
    /// 0 when the section width is 1.
    pub fn distance(&self, axis: usize, n: u32) -> f64 {
        if self.width[axis] == 1 {
            0.0
        } else {
            2.0 * (n as f64 - self.mean[axis]) / (self.width[axis] as f64 - 1.0)
        }
    }

    /// Whether the composition amounts along both axes fall in the box.
    pub fn is_in(&self, n0: u32, n1: u32) -> bool {
        self.bounds[0].contains(n0) && self.bounds[1].contains(n1)
    }

    pub fn contains_composition(&self, comp: &Composition) -> bool {
        self.is_in(comp.amount(self.axes[0]), comp.amount(self.axes[1]))
            && self.members.contains(&(comp.amount(self.axes[0]), comp.amount(self.axes[1])))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClusterVariant {
    Regular(Composition),
    Super(SuperInfo),
}

/// One entry of the catalogue. `id` doubles as the dense dof index of the
/// cluster's (zeroth-moment) concentration.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub id: usize,
    pub variant: ClusterVariant,
    /// Reaction radius (nm).
    pub radius: f64,
    /// Formation energy (eV).
    pub formation_energy: f64,
    /// One-step binding energies to the dissociation product losing one unit
    /// of the given species (eV).
    pub bindings: Vec<(Species, f64)>,
    pub diffusion: Option<DiffusionLaw>,
}

impl Cluster {
    pub fn composition(&self) -> Option<&Composition> {
        match &self.variant {
            ClusterVariant::Regular(c) => Some(c),
            ClusterVariant::Super(_) => None,
        }
    }

    pub fn super_info(&self) -> Option<&SuperInfo> {
        match &self.variant {
            ClusterVariant::Super(s) => Some(s),
            ClusterVariant::Regular(_) => None,
        }
    }

    pub fn reactant_type(&self) -> ReactantType {
        match &self.variant {
            ClusterVariant::Regular(c) => c.reactant_type(),
            ClusterVariant::Super(_) => ReactantType::Super,
        }
    }

    /// Amount of `species` for regular clusters; the group mean (rounded
    /// down) for supers on a grouped axis.
    pub fn amount(&self, species: Species) -> u32 {
        match &self.variant {
            ClusterVariant::Regular(c) => c.amount(species),
            ClusterVariant::Super(s) => {
                if s.axes[0] == species {
                    s.mean[0] as u32
                } else if s.axes[1] == species && s.width[1] > 0 {
                    s.mean[1] as u32
                } else {
                    0
                }
            }
        }
    }

    /// Total defect count; the size used by flux accounting at boundaries.
    pub fn size(&self) -> u32 {
        match &self.variant {
            ClusterVariant::Regular(c) => c.total(),
            ClusterVariant::Super(s) => (s.mean[0] + s.mean[1]).round() as u32,
        }
    }

    pub fn is_mobile(&self) -> bool {
        self.diffusion.is_some()
    }

    pub fn binding_energy(&self, species: Species) -> Option<f64> {
        self.bindings
            .iter()
            .find(|(s, _)| *s == species)
            .map(|(_, e)| *e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_super() -> SuperInfo {
        SuperInfo {
            axes: [Species::He, Species::V],
            mean: [5.0, 2.0],
            width: [3, 1],
            bounds: [GroupBounds { lo: 4, hi: 6 }, GroupBounds { lo: 2, hi: 2 }],
            n_tot: 3,
            dispersion: [1.0, 1.0],
            moment_ids: [100, 101],
            members: vec![(4, 2), (5, 2), (6, 2)],
        }
    }

    #[test]
    fn test_diffusion_coefficient_arrhenius() {
        let law = DiffusionLaw {
            d0: 1.0e10,
            migration_energy: 0.13,
        };
        let d1000 = law.coefficient(1000.0);
        let d500 = law.coefficient(500.0);
        assert!(d1000 > d500, "diffusion must accelerate with temperature");
        let ratio = d1000 / d500;
        let expected = (0.13 / (K_BOLTZMANN_EV * 1000.0)).exp();
        assert!((ratio - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn test_super_distance_vanishes_at_mean_and_width_one() {
        let s = sample_super();
        assert_eq!(s.distance(0, 5), 0.0);
        assert!((s.distance(0, 6) - 1.0).abs() < 1e-12);
        assert!((s.distance(0, 4) + 1.0).abs() < 1e-12);
        // Degenerate axis always reports zero distance.
        assert_eq!(s.distance(1, 2), 0.0);
    }

    #[test]
    fn test_super_membership() {
        let s = sample_super();
        assert!(s.is_in(4, 2));
        assert!(s.is_in(6, 2));
        assert!(!s.is_in(7, 2));
        assert!(!s.is_in(5, 1));
        let inside = Composition::pure(Species::He, 5).with(Species::V, 2);
        let outside = Composition::pure(Species::He, 5).with(Species::V, 3);
        assert!(s.contains_composition(&inside));
        assert!(!s.contains_composition(&outside));
    }

    #[test]
    fn test_cluster_classification() {
        let he = Cluster {
            id: 0,
            variant: ClusterVariant::Regular(Composition::pure(Species::He, 2)),
            radius: 0.3,
            formation_energy: 5.0,
            bindings: Vec::new(),
            diffusion: None,
        };
        assert_eq!(he.reactant_type(), ReactantType::He);
        assert_eq!(he.size(), 2);
        assert!(!he.is_mobile());

        let sup = Cluster {
            id: 1,
            variant: ClusterVariant::Super(sample_super()),
            radius: 0.5,
            formation_energy: 30.0,
            bindings: Vec::new(),
            diffusion: None,
        };
        assert_eq!(sup.reactant_type(), ReactantType::Super);
        assert_eq!(sup.amount(Species::He), 5);
        assert_eq!(sup.size(), 7);
    }
}
