// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Network Builder
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Construction of the reaction network from a cluster description.
//!
//! Reaction validity is decided entirely here: the hot path never checks.
//! Pairwise products are resolved against the composition index; grouped
//! lattice points fold their contributions into per-pair coefficient
//! tensors, one record per (cluster pair, product) as the reaction lists
//! are deduplicated.

use std::collections::HashMap;

use psi_types::constants::{bubble_radius, HELIUM_RADIUS};
use psi_types::error::{PsiError, PsiResult};
use serde::{Deserialize, Serialize};

use crate::cluster::{Cluster, ClusterVariant, DiffusionLaw};
use crate::grouping::{assemble_super, assembled_radius};
use crate::network::ReactionNetwork;
use crate::reaction::{
    zero_tensor2, zero_tensor3, ClusterKinetics, CombiningRecord, DissociatingRecord,
    DissociationReaction, EmittingRecord, ProducingRecord, ProductionReaction,
};
use crate::species::{Composition, Species};

/// Serde-facing cluster table entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub composition: Vec<(Species, u32)>,
    #[serde(default)]
    pub radius: Option<f64>,
    pub formation_energy: f64,
    #[serde(default)]
    pub diffusion: Option<DiffusionLaw>,
    #[serde(default)]
    pub bindings: Vec<(Species, f64)>,
}

/// Serde-facing super-cluster table entry (axis amounts per member).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperSpec {
    pub axes: [Species; 2],
    pub members: Vec<(u32, u32)>,
    pub formation_energy: f64,
    #[serde(default)]
    pub bindings: Vec<(Species, f64)>,
}

/// On-disk network description (composition list + energy/radius tables).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkDescription {
    /// Lattice constant (nm) of the host material.
    pub lattice: f64,
    pub clusters: Vec<ClusterSpec>,
    #[serde(default)]
    pub supers: Vec<SuperSpec>,
}

impl NetworkDescription {
    pub fn from_file(path: &str) -> PsiResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

pub struct NetworkBuilder {
    lattice: f64,
    clusters: Vec<ClusterSpec>,
    supers: Vec<SuperSpec>,
}

impl NetworkBuilder {
    pub fn new(lattice: f64) -> Self {
        NetworkBuilder {
            lattice,
            clusters: Vec::new(),
            supers: Vec::new(),
        }
    }

    pub fn from_description(desc: NetworkDescription) -> Self {
        NetworkBuilder {
            lattice: desc.lattice,
            clusters: desc.clusters,
            supers: desc.supers,
        }
    }

    pub fn cluster(mut self, spec: ClusterSpec) -> Self {
        self.clusters.push(spec);
        self
    }

    pub fn super_cluster(mut self, spec: SuperSpec) -> Self {
        self.supers.push(spec);
        self
    }

    /// Build the immutable network. Ids are assigned in table order, regular
    /// clusters first, then supers, then one moment id per non-degenerate
    /// group axis.
    pub fn build(self) -> PsiResult<ReactionNetwork> {
        if self.clusters.is_empty() {
            return Err(PsiError::NetworkError(
                "network description contains no clusters".to_string(),
            ));
        }

        let lattice = self.lattice;
        let n_regular = self.clusters.len();
        let n_clusters = n_regular + self.supers.len();
        let mut clusters = Vec::with_capacity(n_clusters);
        let mut index: HashMap<Composition, usize> = HashMap::new();

        for (id, spec) in self.clusters.iter().enumerate() {
            let mut comp = Composition::new();
            for (s, n) in &spec.composition {
                comp.set(*s, *n);
            }
            if comp.total() == 0 {
                return Err(PsiError::NetworkError(format!(
                    "cluster {id} has an empty composition"
                )));
            }
            if index.insert(comp, id).is_some() {
                return Err(PsiError::NetworkError(format!(
                    "duplicate composition {comp} in network description"
                )));
            }
            clusters.push(Cluster {
                id,
                variant: ClusterVariant::Regular(comp),
                radius: spec.radius.unwrap_or_else(|| default_radius(&comp, lattice)),
                formation_energy: spec.formation_energy,
                bindings: spec.bindings.clone(),
                diffusion: spec.diffusion,
            });
        }

        // Moment ids are appended after every cluster id; degenerate axes
        // (section width 1) never consume a dof and point back at the
        // cluster id, which no caller dereferences.
        let mut next_moment = n_clusters;
        for (k, spec) in self.supers.iter().enumerate() {
            let id = n_regular + k;
            if spec.members.is_empty() {
                return Err(PsiError::NetworkError(format!(
                    "super cluster {id} encloses no members"
                )));
            }
            let mut info = assemble_super(spec.axes, spec.members.clone(), [id, id]);
            for axis in 0..2 {
                if info.width[axis] > 1 {
                    info.moment_ids[axis] = next_moment;
                    next_moment += 1;
                }
            }

            for &(a, b) in &info.members {
                let comp = member_composition(spec.axes, a, b);
                if index.contains_key(&comp) {
                    return Err(PsiError::NetworkError(format!(
                        "composition {comp} is both a regular cluster and a super member"
                    )));
                }
            }

            let radius = assembled_radius(&info.members, lattice);
            clusters.push(Cluster {
                id,
                variant: ClusterVariant::Super(info),
                radius,
                formation_energy: spec.formation_energy,
                bindings: spec.bindings.clone(),
                diffusion: None,
            });
        }

        let mut acc = Accumulator::new(n_clusters);
        enumerate_reactions(&clusters, &index, &mut acc)?;

        let atomic_volume = 0.5 * lattice * lattice * lattice;
        Ok(ReactionNetwork::new(
            clusters,
            acc.productions,
            acc.dissociations,
            acc.kinetics,
            atomic_volume,
        ))
    }
}

fn member_composition(axes: [Species; 2], a: u32, b: u32) -> Composition {
    Composition::new().with(axes[0], a).with(axes[1], b)
}

/// Capture-radius defaults when the table does not provide one.
fn default_radius(comp: &Composition, lattice: f64) -> f64 {
    let n_v = comp.amount(Species::V);
    if n_v > 0 {
        return bubble_radius(lattice, n_v as f64);
    }
    match comp.pure_species() {
        Some(Species::He) | Some(Species::D) | Some(Species::T) => {
            HELIUM_RADIUS * (comp.total() as f64).cbrt()
        }
        _ => 0.5 * lattice * (comp.total() as f64).cbrt(),
    }
}

// ── Reaction enumeration ─────────────────────────────────────────────

/// One concrete lattice point: a composition plus the cluster representing
/// it (itself for regular clusters, the enclosing super for members).
#[derive(Debug, Clone)]
struct Entity {
    rep: usize,
    comp: Composition,
}

struct Accumulator {
    productions: Vec<ProductionReaction>,
    prod_key: HashMap<(usize, usize, Option<usize>), usize>,
    dissociations: Vec<DissociationReaction>,
    diss_key: HashMap<(usize, usize, usize), usize>,
    kinetics: Vec<ClusterKinetics>,
    producing_key: HashMap<(usize, usize), usize>,
    combining_key: HashMap<(usize, usize), usize>,
    dissociating_key: HashMap<(usize, usize), usize>,
    emitting_key: HashMap<(usize, usize), usize>,
}

impl Accumulator {
    fn new(n_clusters: usize) -> Self {
        Accumulator {
            productions: Vec::new(),
            prod_key: HashMap::new(),
            dissociations: Vec::new(),
            diss_key: HashMap::new(),
            kinetics: vec![ClusterKinetics::default(); n_clusters],
            producing_key: HashMap::new(),
            combining_key: HashMap::new(),
            dissociating_key: HashMap::new(),
            emitting_key: HashMap::new(),
        }
    }

    fn production(&mut self, first: usize, second: usize, product: Option<usize>) -> usize {
        if let Some(&idx) = self.prod_key.get(&(first, second, product)) {
            return idx;
        }
        self.productions.push(ProductionReaction {
            first,
            second,
            product,
            rate: 0.0,
        });
        let idx = self.productions.len() - 1;
        self.prod_key.insert((first, second, product), idx);
        idx
    }

    fn dissociation(
        &mut self,
        parent: usize,
        first: usize,
        second: usize,
        binding_energy: f64,
    ) -> usize {
        if let Some(&idx) = self.diss_key.get(&(parent, first, second)) {
            return idx;
        }
        self.dissociations.push(DissociationReaction {
            parent,
            first,
            second,
            binding_energy,
            rate: 0.0,
        });
        let idx = self.dissociations.len() - 1;
        self.diss_key.insert((parent, first, second), idx);
        idx
    }

    fn producing(&mut self, cluster: usize, reaction: usize) -> &mut ProducingRecord {
        let idx = match self.producing_key.get(&(cluster, reaction)) {
            Some(&idx) => idx,
            None => {
                self.kinetics[cluster].producing.push(ProducingRecord {
                    reaction,
                    coeffs: zero_tensor3(),
                });
                let idx = self.kinetics[cluster].producing.len() - 1;
                self.producing_key.insert((cluster, reaction), idx);
                idx
            }
        };
        &mut self.kinetics[cluster].producing[idx]
    }

    fn combining(&mut self, cluster: usize, reaction: usize, partner: usize) -> &mut CombiningRecord {
        let idx = match self.combining_key.get(&(cluster, reaction)) {
            Some(&idx) => idx,
            None => {
                self.kinetics[cluster].combining.push(CombiningRecord {
                    reaction,
                    partner,
                    coeffs: zero_tensor3(),
                });
                let idx = self.kinetics[cluster].combining.len() - 1;
                self.combining_key.insert((cluster, reaction), idx);
                idx
            }
        };
        &mut self.kinetics[cluster].combining[idx]
    }

    fn dissociating(&mut self, cluster: usize, reaction: usize) -> &mut DissociatingRecord {
        let idx = match self.dissociating_key.get(&(cluster, reaction)) {
            Some(&idx) => idx,
            None => {
                self.kinetics[cluster].dissociating.push(DissociatingRecord {
                    reaction,
                    coeffs: zero_tensor2(),
                });
                let idx = self.kinetics[cluster].dissociating.len() - 1;
                self.dissociating_key.insert((cluster, reaction), idx);
                idx
            }
        };
        &mut self.kinetics[cluster].dissociating[idx]
    }

    fn emitting(&mut self, cluster: usize, reaction: usize) -> &mut EmittingRecord {
        let idx = match self.emitting_key.get(&(cluster, reaction)) {
            Some(&idx) => idx,
            None => {
                self.kinetics[cluster].emitting.push(EmittingRecord {
                    reaction,
                    coeffs: zero_tensor2(),
                });
                let idx = self.kinetics[cluster].emitting.len() - 1;
                self.emitting_key.insert((cluster, reaction), idx);
                idx
            }
        };
        &mut self.kinetics[cluster].emitting[idx]
    }
}

/// Projection weights of a concrete composition onto a cluster's moments,
/// without dispersion normalization (used for reactant legs).
fn f_weights(cluster: &Cluster, comp: &Composition) -> [f64; 3] {
    match &cluster.variant {
        ClusterVariant::Regular(_) => [1.0, 0.0, 0.0],
        ClusterVariant::Super(info) => [
            1.0,
            info.distance(0, comp.amount(info.axes[0])),
            info.distance(1, comp.amount(info.axes[1])),
        ],
    }
}

/// Projection weights for the cluster whose flux row receives the
/// contribution; first moments carry the 1/dispersion normalization.
fn g_weights(cluster: &Cluster, comp: &Composition) -> [f64; 3] {
    match &cluster.variant {
        ClusterVariant::Regular(_) => [1.0, 0.0, 0.0],
        ClusterVariant::Super(info) => [
            1.0,
            info.distance(0, comp.amount(info.axes[0])) / info.dispersion[0],
            info.distance(1, comp.amount(info.axes[1])) / info.dispersion[1],
        ],
    }
}

/// Pairwise product rule: element-wise aggregation with vacancy-interstitial
/// annihilation applied first. An empty result encodes perfect recombination
/// with no surviving cluster; catalogue lookup decides validity otherwise.
fn reaction_product(a: &Composition, b: &Composition) -> Composition {
    let sum = a.plus(b);
    let n_i = sum.amount(Species::I);
    let n_v = sum.amount(Species::V);
    let mut product = sum;
    if n_i > 0 && n_v > 0 {
        let m = n_i.min(n_v);
        product.set(Species::I, n_i - m);
        product.set(Species::V, n_v - m);
    }
    product
}

fn enumerate_reactions(
    clusters: &[Cluster],
    index: &HashMap<Composition, usize>,
    acc: &mut Accumulator,
) -> PsiResult<()> {
    // Flatten the catalogue into concrete lattice points.
    let mut entities: Vec<Entity> = Vec::new();
    for c in clusters {
        match &c.variant {
            ClusterVariant::Regular(comp) => entities.push(Entity {
                rep: c.id,
                comp: *comp,
            }),
            ClusterVariant::Super(info) => {
                for &(a, b) in &info.members {
                    entities.push(Entity {
                        rep: c.id,
                        comp: member_composition(info.axes, a, b),
                    });
                }
            }
        }
    }

    let resolve = |comp: &Composition| -> Option<usize> {
        if let Some(id) = index.get(comp) {
            return Some(*id);
        }
        clusters.iter().find_map(|c| {
            c.super_info()
                .filter(|s| s.contains_composition(comp))
                .map(|_| c.id)
        })
    };

    // Pairwise productions/combinations.
    for i in 0..entities.len() {
        for j in i..entities.len() {
            let (ea, eb) = (&entities[i], &entities[j]);
            let mobile = clusters[ea.rep].is_mobile() || clusters[eb.rep].is_mobile();
            if !mobile {
                continue;
            }
            let product_comp = reaction_product(&ea.comp, &eb.comp);
            let product_rep = if product_comp.total() == 0 {
                None
            } else {
                match resolve(&product_comp) {
                    Some(id) => Some(id),
                    // Product outside the catalogue: no reaction at this pair.
                    None => continue,
                }
            };

            // Canonical order: lower id first.
            let (first, second, fc, sc) = if ea.rep <= eb.rep {
                (ea.rep, eb.rep, &ea.comp, &eb.comp)
            } else {
                (eb.rep, ea.rep, &eb.comp, &ea.comp)
            };
            let reaction = acc.production(first, second, product_rep);

            let fw = f_weights(&clusters[first], fc);
            let sw = f_weights(&clusters[second], sc);

            if let Some(prod) = product_rep {
                let gw = g_weights(&clusters[prod], &product_comp);
                let rec = acc.producing(prod, reaction);
                for (alpha, fa) in fw.iter().enumerate() {
                    for (beta, fb) in sw.iter().enumerate() {
                        for (gamma, g) in gw.iter().enumerate() {
                            rec.coeffs[alpha][beta][gamma] += fa * fb * g;
                        }
                    }
                }
            }

            // Loss legs: each participant occurrence is consumed once.
            for (me, my_comp, partner, partner_comp) in
                [(first, fc, second, sc), (second, sc, first, fc)]
            {
                let gw = g_weights(&clusters[me], my_comp);
                let mw = f_weights(&clusters[me], my_comp);
                let pw = f_weights(&clusters[partner], partner_comp);
                let rec = acc.combining(me, reaction, partner);
                for (alpha, fa) in mw.iter().enumerate() {
                    for (beta, fb) in pw.iter().enumerate() {
                        for (gamma, g) in gw.iter().enumerate() {
                            rec.coeffs[alpha][beta][gamma] += fa * fb * g;
                        }
                    }
                }
            }
        }
    }

    // One-step dissociations: parent → (parent − monomer) + monomer.
    for ent in &entities {
        for species in [Species::He, Species::D, Species::T, Species::V, Species::I] {
            let Some(rest_comp) = ent.comp.minus_one(species) else {
                continue;
            };
            if rest_comp.total() == 0 {
                continue;
            }
            let monomer = Composition::pure(species, 1);
            let (Some(rest), Some(mono)) = (resolve(&rest_comp), resolve(&monomer)) else {
                continue;
            };
            let Some(binding) = binding_energy(&clusters[ent.rep], species, &ent.comp, index, clusters)
            else {
                continue;
            };

            let reaction = acc.dissociation(ent.rep, rest, mono, binding);

            let pw = f_weights(&clusters[ent.rep], &ent.comp);

            // Gain for both fragments.
            for (frag, frag_comp) in [(rest, &rest_comp), (mono, &monomer)] {
                let gw = g_weights(&clusters[frag], frag_comp);
                let rec = acc.dissociating(frag, reaction);
                for (alpha, fa) in pw.iter().enumerate() {
                    for (gamma, g) in gw.iter().enumerate() {
                        rec.coeffs[alpha][gamma] += fa * g;
                    }
                }
            }

            // Loss for the parent.
            let gw = g_weights(&clusters[ent.rep], &ent.comp);
            let rec = acc.emitting(ent.rep, reaction);
            for (alpha, fa) in pw.iter().enumerate() {
                for (gamma, g) in gw.iter().enumerate() {
                    rec.coeffs[alpha][gamma] += fa * g;
                }
            }
        }
    }

    Ok(())
}

/// Binding energy of the one-step emission of `species`. Uses the declared
/// table when present, otherwise derives it from formation energies when the
/// smaller cluster is in the catalogue. A missing value disables the
/// dissociation channel for this parent.
fn binding_energy(
    parent: &Cluster,
    species: Species,
    parent_comp: &Composition,
    index: &HashMap<Composition, usize>,
    clusters: &[Cluster],
) -> Option<f64> {
    if let Some(eb) = parent.binding_energy(species) {
        return Some(eb);
    }
    let rest = parent_comp.minus_one(species)?;
    let rest_id = *index.get(&rest)?;
    let mono_id = *index.get(&Composition::pure(species, 1))?;
    let eb = clusters[rest_id].formation_energy + clusters[mono_id].formation_energy
        - parent.formation_energy;
    Some(eb.max(0.1))
}

// ── Canonical layouts ────────────────────────────────────────────────

/// Minimal He/V/I + HeV network with the historical id layout:
/// He₁…He₁₀ = 0..9, V₁…V₁₀ = 10..19, I₁…I₁₀ = 20..29, HeV = 30..74
/// (for each vacancy count v, helium runs 1..=10−v).
pub fn hevi_network() -> ReactionNetwork {
    let mut builder = NetworkBuilder::new(psi_types::constants::TUNGSTEN_LATTICE);
    for n in 1..=10u32 {
        builder = builder.cluster(ClusterSpec {
            composition: vec![(Species::He, n)],
            radius: None,
            formation_energy: 6.15 + 4.2 * (n as f64 - 1.0).powf(0.85),
            diffusion: if n == 1 {
                Some(DiffusionLaw {
                    d0: 2.95e10,
                    migration_energy: 0.13,
                })
            } else {
                None
            },
            bindings: Vec::new(),
        });
    }
    for n in 1..=10u32 {
        builder = builder.cluster(ClusterSpec {
            composition: vec![(Species::V, n)],
            radius: None,
            formation_energy: 3.6 + 2.1 * (n as f64 - 1.0).powf(0.8),
            diffusion: if n == 1 {
                Some(DiffusionLaw {
                    d0: 1.8e12,
                    migration_energy: 1.30,
                })
            } else {
                None
            },
            bindings: Vec::new(),
        });
    }
    for n in 1..=10u32 {
        builder = builder.cluster(ClusterSpec {
            composition: vec![(Species::I, n)],
            radius: None,
            formation_energy: 10.0 + 4.8 * (n as f64 - 1.0).powf(0.9),
            diffusion: if n <= 3 {
                Some(DiffusionLaw {
                    d0: 8.8e10,
                    migration_energy: 0.013 * n as f64,
                })
            } else {
                None
            },
            bindings: Vec::new(),
        });
    }
    for v in 1..=9u32 {
        for he in 1..=(10 - v) {
            builder = builder.cluster(ClusterSpec {
                composition: vec![(Species::He, he), (Species::V, v)],
                radius: None,
                formation_energy: 4.0 + 1.9 * he as f64 + 2.3 * v as f64,
                diffusion: None,
                bindings: Vec::new(),
            });
        }
    }
    builder.build().expect("canonical HeVI network must build")
}

/// Tungsten trap-mutation layout: I₁…I₆ = 0..5, He₁…He₈ = 6..13, V₁ = 14,
/// HeₙV₁ = 15..22. The He₁ law pins the trap-mutation regression rates.
pub fn tungsten_network() -> ReactionNetwork {
    let he_d0 = [1.09327e14, 3.24e13, 2.26e13, 1.68e13, 5.2e12];
    let he_em = [0.13, 0.2, 0.25, 0.2, 0.12];
    let i_ef = [10.0, 18.5, 27.0, 35.0, 42.9, 48.0];
    let he_ef = [6.15, 11.44, 16.35, 21.0, 26.1, 30.24, 34.93, 38.8];

    let mut builder = NetworkBuilder::new(psi_types::constants::TUNGSTEN_LATTICE);
    for n in 1..=6u32 {
        builder = builder.cluster(ClusterSpec {
            composition: vec![(Species::I, n)],
            radius: None,
            formation_energy: i_ef[n as usize - 1],
            diffusion: if n <= 3 {
                Some(DiffusionLaw {
                    d0: 8.8e10,
                    migration_energy: 0.013 * n as f64,
                })
            } else {
                None
            },
            bindings: Vec::new(),
        });
    }
    for n in 1..=8u32 {
        builder = builder.cluster(ClusterSpec {
            composition: vec![(Species::He, n)],
            radius: None,
            formation_energy: he_ef[n as usize - 1],
            diffusion: if n <= 5 {
                Some(DiffusionLaw {
                    d0: he_d0[n as usize - 1],
                    migration_energy: he_em[n as usize - 1],
                })
            } else {
                None
            },
            bindings: Vec::new(),
        });
    }
    builder = builder.cluster(ClusterSpec {
        composition: vec![(Species::V, 1)],
        radius: None,
        formation_energy: 3.6,
        diffusion: Some(DiffusionLaw {
            d0: 1.8e12,
            migration_energy: 1.30,
        }),
        bindings: Vec::new(),
    });
    for n in 1..=8u32 {
        builder = builder.cluster(ClusterSpec {
            composition: vec![(Species::He, n), (Species::V, 1)],
            radius: None,
            formation_energy: 5.1 + 2.0 * n as f64,
            diffusion: None,
            bindings: Vec::new(),
        });
    }
    builder
        .build()
        .expect("canonical tungsten network must build")
}

/// Small mixed network with a grouped HeV box, used by the bursting path:
/// pure He/D/T/V/I monomer chains, resolved HeV pairs, and one super
/// cluster covering He ∈ [4,6] × V = 2.
pub fn grouped_psi_network() -> ReactionNetwork {
    let mut builder = NetworkBuilder::new(psi_types::constants::TUNGSTEN_LATTICE);
    for n in 1..=6u32 {
        builder = builder.cluster(ClusterSpec {
            composition: vec![(Species::He, n)],
            radius: None,
            formation_energy: 6.15 + 4.2 * (n as f64 - 1.0).powf(0.85),
            diffusion: if n == 1 {
                Some(DiffusionLaw {
                    d0: 2.95e10,
                    migration_energy: 0.13,
                })
            } else {
                None
            },
            bindings: Vec::new(),
        });
    }
    for (species, d0, em) in [(Species::D, 5.0e10, 0.38), (Species::T, 4.1e10, 0.38)] {
        builder = builder.cluster(ClusterSpec {
            composition: vec![(species, 1)],
            radius: None,
            formation_energy: 1.0,
            diffusion: Some(DiffusionLaw {
                d0,
                migration_energy: em,
            }),
            bindings: Vec::new(),
        });
    }
    for n in 1..=3u32 {
        builder = builder.cluster(ClusterSpec {
            composition: vec![(Species::V, n)],
            radius: None,
            formation_energy: 3.6 + 2.1 * (n as f64 - 1.0).powf(0.8),
            diffusion: if n == 1 {
                Some(DiffusionLaw {
                    d0: 1.8e12,
                    migration_energy: 1.30,
                })
            } else {
                None
            },
            bindings: Vec::new(),
        });
    }
    builder = builder.cluster(ClusterSpec {
        composition: vec![(Species::I, 1)],
        radius: None,
        formation_energy: 10.0,
        diffusion: Some(DiffusionLaw {
            d0: 8.8e10,
            migration_energy: 0.013,
        }),
        bindings: Vec::new(),
    });
    for v in 1..=2u32 {
        for he in 1..=3u32 {
            builder = builder.cluster(ClusterSpec {
                composition: vec![(Species::He, he), (Species::V, v)],
                radius: None,
                formation_energy: 4.0 + 1.9 * he as f64 + 2.3 * v as f64,
                diffusion: None,
                bindings: Vec::new(),
            });
        }
    }
    builder = builder.super_cluster(SuperSpec {
        axes: [Species::He, Species::V],
        members: vec![(4, 2), (5, 2), (6, 2)],
        formation_energy: 24.0,
        bindings: Vec::new(),
    });
    builder
        .build()
        .expect("canonical grouped PSI network must build")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::ReactantType;

    #[test]
    fn test_hevi_layout_matches_historical_ids() {
        let network = hevi_network();
        assert_eq!(network.num_clusters(), 75);
        // Pure chains.
        assert_eq!(network.get(Species::He, 1).unwrap().id, 0);
        assert_eq!(network.get(Species::He, 10).unwrap().id, 9);
        assert_eq!(network.get(Species::V, 1).unwrap().id, 10);
        assert_eq!(network.get(Species::V, 10).unwrap().id, 19);
        assert_eq!(network.get(Species::I, 1).unwrap().id, 20);
        assert_eq!(network.get(Species::I, 10).unwrap().id, 29);
        // Mixed block occupies 30..74 and reports its own composition.
        for id in 30..75 {
            let cluster = network.cluster(id);
            let comp = cluster.composition().expect("regular HeV cluster");
            assert!(comp.amount(Species::He) > 0 && comp.amount(Species::V) > 0);
            assert_eq!(network.get_mixed(comp).unwrap().id, id);
        }
    }

    #[test]
    fn test_tungsten_layout_matches_trap_mutation_ids() {
        let network = tungsten_network();
        assert_eq!(network.size(), 23);
        assert_eq!(network.get(Species::I, 1).unwrap().id, 0);
        assert_eq!(network.get(Species::He, 3).unwrap().id, 8);
        assert_eq!(network.get(Species::He, 5).unwrap().id, 10);
        assert_eq!(network.get(Species::He, 8).unwrap().id, 13);
        assert_eq!(network.get(Species::V, 1).unwrap().id, 14);
        let he3v = Composition::pure(Species::He, 3).with(Species::V, 1);
        assert_eq!(network.get_mixed(&he3v).unwrap().id, 17);
        let he8v = Composition::pure(Species::He, 8).with(Species::V, 1);
        assert_eq!(network.get_mixed(&he8v).unwrap().id, 22);
    }

    #[test]
    fn test_reactions_exist_after_build() {
        let network = hevi_network();
        let (n_prod, n_diss) = network.num_reactions();
        assert!(n_prod > 0, "pairwise productions must be enumerated");
        assert!(n_diss > 0, "one-step dissociations must be enumerated");
    }

    #[test]
    fn test_grouped_network_has_super_with_moments() {
        let network = grouped_psi_network();
        let supers: Vec<_> = network.all_of(ReactantType::Super).collect();
        assert_eq!(supers.len(), 1);
        let info = supers[0].super_info().unwrap();
        assert_eq!(info.n_tot, 3);
        assert_eq!(info.width[0], 3);
        assert_eq!(info.width[1], 1);
        // One extra dof for the single non-degenerate axis.
        assert_eq!(network.size(), network.num_clusters() + 1);
    }

    #[test]
    fn test_duplicate_composition_rejected() {
        let result = NetworkBuilder::new(0.317)
            .cluster(ClusterSpec {
                composition: vec![(Species::He, 1)],
                radius: None,
                formation_energy: 6.15,
                diffusion: None,
                bindings: Vec::new(),
            })
            .cluster(ClusterSpec {
                composition: vec![(Species::He, 1)],
                radius: None,
                formation_energy: 6.15,
                diffusion: None,
                bindings: Vec::new(),
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_iv_annihilation_rule() {
        let v2 = Composition::pure(Species::V, 2);
        let i1 = Composition::pure(Species::I, 1);
        let product = reaction_product(&v2, &i1);
        assert_eq!(product.amount(Species::V), 1);
        assert_eq!(product.amount(Species::I), 0);

        let v1 = Composition::pure(Species::V, 1);
        let product = reaction_product(&v1, &i1);
        assert_eq!(product.total(), 0, "perfect recombination leaves nothing");
    }

    #[test]
    fn test_description_roundtrip() {
        let desc = NetworkDescription {
            lattice: 0.317,
            clusters: vec![ClusterSpec {
                composition: vec![(Species::He, 1)],
                radius: None,
                formation_energy: 6.15,
                diffusion: Some(DiffusionLaw {
                    d0: 2.95e10,
                    migration_energy: 0.13,
                }),
                bindings: Vec::new(),
            }],
            supers: Vec::new(),
        };
        let json = serde_json::to_string(&desc).unwrap();
        let back: NetworkDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(back.clusters.len(), 1);
        assert!((back.lattice - 0.317).abs() < 1e-12);
    }
}
