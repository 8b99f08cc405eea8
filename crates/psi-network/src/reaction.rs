// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Reaction Records
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Immutable reaction records over dense cluster ids.
//!
//! Moment indices run over {l0, first moment of axis 0, first moment of
//! axis 1}. Coefficient tensors are accumulated at construction by summing
//! the grouped lattice; for regular-only reactions the only nonzero entry is
//! the (0,0,0) stoichiometric count.

/// a[α][β][γ]: moment α of the first participant and β of the second feed
/// moment γ of the cluster whose flux is being computed.
pub type Tensor3 = [[[f64; 3]; 3]; 3];

/// a[α][γ]: moment α of the dissociating parent feeds moment γ.
pub type Tensor2 = [[f64; 3]; 3];

pub fn zero_tensor3() -> Tensor3 {
    [[[0.0; 3]; 3]; 3]
}

pub fn zero_tensor2() -> Tensor2 {
    [[0.0; 3]; 3]
}

/// A + B → C. The rate constant is the only mutable state and is rebuilt
/// when the network temperature changes. `product` is None for perfect
/// vacancy-interstitial recombination.
#[derive(Debug, Clone)]
pub struct ProductionReaction {
    pub first: usize,
    pub second: usize,
    pub product: Option<usize>,
    pub rate: f64,
}

/// Parent → A + B, governed by the binding energy of the emitted fragment.
#[derive(Debug, Clone)]
pub struct DissociationReaction {
    pub parent: usize,
    pub first: usize,
    pub second: usize,
    pub binding_energy: f64,
    pub rate: f64,
}

/// Per-cluster view of a production reaction producing this cluster.
#[derive(Debug, Clone)]
pub struct ProducingRecord {
    pub reaction: usize,
    pub coeffs: Tensor3,
}

/// Per-cluster view of a production reaction consuming this cluster.
/// `partner` is the other participant; α indexes this cluster's moments.
#[derive(Debug, Clone)]
pub struct CombiningRecord {
    pub reaction: usize,
    pub partner: usize,
    pub coeffs: Tensor3,
}

/// Per-cluster view of a dissociation producing this cluster.
#[derive(Debug, Clone)]
pub struct DissociatingRecord {
    pub reaction: usize,
    pub coeffs: Tensor2,
}

/// Per-cluster view of this cluster's own dissociation.
#[derive(Debug, Clone)]
pub struct EmittingRecord {
    pub reaction: usize,
    pub coeffs: Tensor2,
}

/// All kinetic couplings of one cluster, fixed after construction.
#[derive(Debug, Clone, Default)]
pub struct ClusterKinetics {
    pub producing: Vec<ProducingRecord>,
    pub combining: Vec<CombiningRecord>,
    pub dissociating: Vec<DissociatingRecord>,
    pub emitting: Vec<EmittingRecord>,
}

impl ClusterKinetics {
    pub fn is_empty(&self) -> bool {
        self.producing.is_empty()
            && self.combining.is_empty()
            && self.dissociating.is_empty()
            && self.emitting.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_tensors() {
        let t3 = zero_tensor3();
        assert!(t3.iter().flatten().flatten().all(|v| *v == 0.0));
        let t2 = zero_tensor2();
        assert!(t2.iter().flatten().all(|v| *v == 0.0));
    }

    #[test]
    fn test_empty_kinetics() {
        let k = ClusterKinetics::default();
        assert!(k.is_empty());
    }
}
