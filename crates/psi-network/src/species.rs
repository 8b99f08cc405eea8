// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Species
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

/// Closed set of defect species across the supported materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    He,
    D,
    T,
    V,
    I,
    Xe,
    Void,
    Faulted,
    Frank,
    Perfect,
}

pub const SPECIES_COUNT: usize = 10;

impl Species {
    pub const ALL: [Species; SPECIES_COUNT] = [
        Species::He,
        Species::D,
        Species::T,
        Species::V,
        Species::I,
        Species::Xe,
        Species::Void,
        Species::Faulted,
        Species::Frank,
        Species::Perfect,
    ];

    pub fn index(self) -> usize {
        match self {
            Species::He => 0,
            Species::D => 1,
            Species::T => 2,
            Species::V => 3,
            Species::I => 4,
            Species::Xe => 5,
            Species::Void => 6,
            Species::Faulted => 7,
            Species::Frank => 8,
            Species::Perfect => 9,
        }
    }
}

/// Query classification used by `get_all(type)` and the event controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactantType {
    He,
    D,
    T,
    V,
    I,
    Xe,
    Void,
    Faulted,
    Frank,
    Perfect,
    /// Mixed impurity-vacancy cluster (HeV, HeDTV, XeV).
    Mixed,
    /// Grouped cluster carrying distributional moments.
    Super,
}

impl ReactantType {
    pub fn from_pure(species: Species) -> Self {
        match species {
            Species::He => ReactantType::He,
            Species::D => ReactantType::D,
            Species::T => ReactantType::T,
            Species::V => ReactantType::V,
            Species::I => ReactantType::I,
            Species::Xe => ReactantType::Xe,
            Species::Void => ReactantType::Void,
            Species::Faulted => ReactantType::Faulted,
            Species::Frank => ReactantType::Frank,
            Species::Perfect => ReactantType::Perfect,
        }
    }
}

/// Integer composition over the species set. Two compositions compare equal
/// iff all counts equal; this is the canonical identity of a regular cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Composition([u32; SPECIES_COUNT]);

impl Composition {
    pub fn new() -> Self {
        Composition([0; SPECIES_COUNT])
    }

    /// Single-species composition.
    pub fn pure(species: Species, n: u32) -> Self {
        let mut comp = Composition::new();
        comp.0[species.index()] = n;
        comp
    }

    pub fn with(mut self, species: Species, n: u32) -> Self {
        self.0[species.index()] = n;
        self
    }

    pub fn amount(&self, species: Species) -> u32 {
        self.0[species.index()]
    }

    pub fn set(&mut self, species: Species, n: u32) {
        self.0[species.index()] = n;
    }

    /// Total defect count across all species.
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// The single species present, if exactly one is.
    pub fn pure_species(&self) -> Option<Species> {
        let mut found = None;
        for s in Species::ALL {
            if self.amount(s) > 0 {
                if found.is_some() {
                    return None;
                }
                found = Some(s);
            }
        }
        found
    }

    /// Species with nonzero count, in enum order.
    pub fn species(&self) -> impl Iterator<Item = (Species, u32)> + '_ {
        Species::ALL
            .iter()
            .filter(|s| self.amount(**s) > 0)
            .map(|s| (*s, self.amount(*s)))
    }

    /// Composition with one unit of `species` removed; None if absent.
    pub fn minus_one(&self, species: Species) -> Option<Self> {
        let n = self.amount(species);
        if n == 0 {
            return None;
        }
        let mut out = *self;
        out.set(species, n - 1);
        Some(out)
    }

    /// Element-wise sum.
    pub fn plus(&self, other: &Composition) -> Self {
        let mut out = Composition::new();
        for s in Species::ALL {
            out.set(s, self.amount(s) + other.amount(s));
        }
        out
    }

    /// Classification of the cluster this composition identifies.
    pub fn reactant_type(&self) -> ReactantType {
        if let Some(s) = self.pure_species() {
            return ReactantType::from_pure(s);
        }
        ReactantType::Mixed
    }
}

impl std::fmt::Display for Composition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (s, n) in self.species() {
            if !first {
                write!(f, "_")?;
            }
            write!(f, "{s:?}{n}")?;
            first = false;
        }
        if first {
            write!(f, "empty")?;
        }
        Ok(())
    }
}
