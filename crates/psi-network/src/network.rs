// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Reaction Network
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The composition-indexed cluster catalogue and its reaction graph.
//!
//! Topology (clusters, reactions, connectivity) is fixed at construction.
//! The only mutable state is the scratch concentration vector, the cached
//! temperature, and the rate constants derived from it.

use std::collections::HashMap;

use psi_types::constants::K_BOLTZMANN_EV;
use psi_types::equal_within;

use crate::cluster::{Cluster, ClusterVariant};
use crate::reaction::{ClusterKinetics, DissociationReaction, ProductionReaction};
use crate::species::{Composition, ReactantType, Species};

pub struct ReactionNetwork {
    clusters: Vec<Cluster>,
    dof: usize,
    index: HashMap<Composition, usize>,
    kinetics: Vec<ClusterKinetics>,
    productions: Vec<ProductionReaction>,
    dissociations: Vec<DissociationReaction>,
    /// Per-dof row: sorted ids whose concentration influences this row.
    connectivity: Vec<Vec<usize>>,
    /// Maps a dof row to its owning cluster and moment index γ.
    row_owner: Vec<(usize, usize)>,
    conc: Vec<f64>,
    temperature: f64,
    rate_updates: usize,
    diff_coef: Vec<f64>,
    atomic_volume: f64,
}

impl ReactionNetwork {
    /// Assemble the immutable graph. Rate constants start at zero; the first
    /// `set_temperature` call brings the kinetics online.
    pub fn new(
        clusters: Vec<Cluster>,
        productions: Vec<ProductionReaction>,
        dissociations: Vec<DissociationReaction>,
        kinetics: Vec<ClusterKinetics>,
        atomic_volume: f64,
    ) -> Self {
        let mut dof = clusters.len();
        for c in &clusters {
            if let ClusterVariant::Super(info) = &c.variant {
                for axis in 0..2 {
                    if info.width[axis] > 1 {
                        dof = dof.max(info.moment_ids[axis] + 1);
                    }
                }
            }
        }

        let mut index = HashMap::new();
        for c in &clusters {
            if let ClusterVariant::Regular(comp) = &c.variant {
                index.insert(*comp, c.id);
            }
        }

        let mut row_owner = vec![(usize::MAX, 0); dof];
        for c in &clusters {
            row_owner[c.id] = (c.id, 0);
            if let ClusterVariant::Super(info) = &c.variant {
                for axis in 0..2 {
                    if info.width[axis] > 1 {
                        row_owner[info.moment_ids[axis]] = (c.id, axis + 1);
                    }
                }
            }
        }

        let mut network = ReactionNetwork {
            conc: vec![0.0; dof],
            diff_coef: vec![0.0; clusters.len()],
            connectivity: Vec::new(),
            row_owner,
            clusters,
            dof,
            index,
            kinetics,
            productions,
            dissociations,
            temperature: 0.0,
            rate_updates: 0,
            atomic_volume,
        };
        network.connectivity = network.build_connectivity();
        network
    }

    // ── Catalogue ────────────────────────────────────────────────────

    /// Total degrees of freedom per grid point, moments included.
    pub fn size(&self) -> usize {
        self.dof
    }

    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Pure-species cluster by size.
    pub fn get(&self, species: Species, n: u32) -> Option<&Cluster> {
        self.get_mixed(&Composition::pure(species, n))
    }

    /// Mixed cluster by full composition. O(1) amortized.
    pub fn get_mixed(&self, comp: &Composition) -> Option<&Cluster> {
        self.index.get(comp).map(|id| &self.clusters[*id])
    }

    pub fn cluster(&self, id: usize) -> &Cluster {
        &self.clusters[id]
    }

    /// All clusters in id order.
    pub fn all(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }

    /// Clusters of one reactant type, in id order.
    pub fn all_of(&self, rtype: ReactantType) -> impl Iterator<Item = &Cluster> {
        self.clusters
            .iter()
            .filter(move |c| c.reactant_type() == rtype)
    }

    /// The super cluster whose box (and member set) contains `comp`.
    pub fn enclosing_super(&self, comp: &Composition) -> Option<&Cluster> {
        self.clusters.iter().find(|c| {
            c.super_info()
                .map(|s| s.contains_composition(comp))
                .unwrap_or(false)
        })
    }

    pub fn connectivity(&self, row: usize) -> &[usize] {
        &self.connectivity[row]
    }

    pub fn num_reactions(&self) -> (usize, usize) {
        (self.productions.len(), self.dissociations.len())
    }

    // ── Temperature-dependent state ──────────────────────────────────

    /// Recompute every rate constant and diffusion coefficient. Returns
    /// false (and does nothing) when the temperature is unchanged within
    /// tolerance.
    pub fn set_temperature(&mut self, temperature: f64) -> bool {
        if equal_within(temperature, self.temperature) {
            return false;
        }
        self.temperature = temperature;

        for (i, c) in self.clusters.iter().enumerate() {
            self.diff_coef[i] = c
                .diffusion
                .map(|law| law.coefficient(temperature))
                .unwrap_or(0.0);
        }

        for i in 0..self.productions.len() {
            let (a, b) = (self.productions[i].first, self.productions[i].second);
            let rate = self.capture_rate(a, b);
            self.productions[i].rate = rate;
        }
        for i in 0..self.dissociations.len() {
            let (a, b) = (self.dissociations[i].first, self.dissociations[i].second);
            let eb = self.dissociations[i].binding_energy;
            let rate = self.capture_rate(a, b) * (-eb / (K_BOLTZMANN_EV * temperature)).exp()
                / self.atomic_volume;
            self.dissociations[i].rate = rate;
        }

        self.rate_updates += 1;
        true
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Number of full rate rebuilds since construction.
    pub fn rate_update_count(&self) -> usize {
        self.rate_updates
    }

    /// Diffusion coefficient of a cluster at the cached temperature (nm²/s).
    pub fn diffusion_coefficient(&self, id: usize) -> f64 {
        self.diff_coef[id]
    }

    /// Diffusion-limited capture rate 4π (r_A + r_B)(D_A + D_B).
    fn capture_rate(&self, a: usize, b: usize) -> f64 {
        let r = self.clusters[a].radius + self.clusters[b].radius;
        let d = self.diff_coef[a] + self.diff_coef[b];
        4.0 * std::f64::consts::PI * r * d
    }

    // ── Concentration scratch ────────────────────────────────────────

    /// Load the per-grid-point concentration vector (length `size()`).
    pub fn update_concentrations_from_array(&mut self, values: &[f64]) {
        debug_assert_eq!(values.len(), self.dof);
        self.conc.copy_from_slice(values);
    }

    pub fn concentration(&self, row: usize) -> f64 {
        self.conc[row]
    }

    /// Moment value `l_α` of a cluster: α = 0 is the zeroth moment, α = 1, 2
    /// the first moments along the grouped axes (0 for regular clusters).
    pub fn moment(&self, cluster_id: usize, alpha: usize) -> f64 {
        if alpha == 0 {
            return self.conc[cluster_id];
        }
        match self.clusters[cluster_id].super_info() {
            Some(info) if info.width[alpha - 1] > 1 => self.conc[info.moment_ids[alpha - 1]],
            _ => 0.0,
        }
    }

    fn n_tot(&self, cluster_id: usize) -> f64 {
        self.clusters[cluster_id]
            .super_info()
            .map(|s| s.n_tot as f64)
            .unwrap_or(1.0)
    }

    /// Dof row holding moment α of a cluster, if it exists.
    fn moment_row(&self, cluster_id: usize, alpha: usize) -> Option<usize> {
        if alpha == 0 {
            return Some(cluster_id);
        }
        self.clusters[cluster_id]
            .super_info()
            .filter(|s| s.width[alpha - 1] > 1)
            .map(|s| s.moment_ids[alpha - 1])
    }

    /// Reconstructed concentration of a super cluster at normalized
    /// distances: l0 + d0·l1 + d1·l2.
    pub fn super_concentration(&self, cluster_id: usize, dist: [f64; 2]) -> f64 {
        self.moment(cluster_id, 0)
            + dist[0] * self.moment(cluster_id, 1)
            + dist[1] * self.moment(cluster_id, 2)
    }

    /// Total concentration of real clusters enclosed by a super.
    pub fn super_total_concentration(&self, cluster_id: usize) -> f64 {
        let Some(info) = self.clusters[cluster_id].super_info() else {
            return self.conc[cluster_id];
        };
        info.members
            .iter()
            .map(|&(a, b)| {
                self.super_concentration(cluster_id, [info.distance(0, a), info.distance(1, b)])
            })
            .sum()
    }

    /// Concentration integrated over the first axis at fixed second-axis
    /// amount `v` (the V slice used by the bursting transfer).
    pub fn super_integrated_concentration(&self, cluster_id: usize, v: u32) -> f64 {
        let Some(info) = self.clusters[cluster_id].super_info() else {
            return 0.0;
        };
        info.members
            .iter()
            .filter(|&&(_, b)| b == v)
            .map(|&(a, b)| {
                self.super_concentration(cluster_id, [info.distance(0, a), info.distance(1, b)])
            })
            .sum()
    }

    /// Total atom content of one species over the whole catalogue, using the
    /// scratch concentrations.
    pub fn total_atom_concentration(&self, species: Species) -> f64 {
        let mut total = 0.0;
        for c in &self.clusters {
            match &c.variant {
                ClusterVariant::Regular(comp) => {
                    total += self.conc[c.id] * comp.amount(species) as f64;
                }
                ClusterVariant::Super(info) => {
                    for axis in 0..2 {
                        if info.axes[axis] == species {
                            total += info
                                .members
                                .iter()
                                .map(|&(a, b)| {
                                    let n = if axis == 0 { a } else { b };
                                    self.super_concentration(
                                        c.id,
                                        [info.distance(0, a), info.distance(1, b)],
                                    ) * n as f64
                                })
                                .sum::<f64>();
                        }
                    }
                }
            }
        }
        total
    }

    // ── Flux and partial derivatives ─────────────────────────────────

    /// dC/dt contribution of the reaction graph for one dof row:
    /// production − combination + dissociation − emission.
    pub fn total_flux(&self, row: usize) -> f64 {
        let (cid, gamma) = self.row_owner[row];
        let kin = &self.kinetics[cid];
        let nt = self.n_tot(cid);
        let mut flux = 0.0;

        for rec in &kin.producing {
            let r = &self.productions[rec.reaction];
            let value = r.rate / nt;
            let mut sum = 0.0;
            for alpha in 0..3 {
                let la = self.moment(r.first, alpha);
                if la == 0.0 {
                    continue;
                }
                for beta in 0..3 {
                    let coeff = rec.coeffs[alpha][beta][gamma];
                    if coeff != 0.0 {
                        sum += coeff * la * self.moment(r.second, beta);
                    }
                }
            }
            flux += value * sum;
        }

        for rec in &kin.combining {
            let r = &self.productions[rec.reaction];
            let value = r.rate / nt;
            let mut sum = 0.0;
            for alpha in 0..3 {
                let la = self.moment(cid, alpha);
                if la == 0.0 {
                    continue;
                }
                for beta in 0..3 {
                    let coeff = rec.coeffs[alpha][beta][gamma];
                    if coeff != 0.0 {
                        sum += coeff * la * self.moment(rec.partner, beta);
                    }
                }
            }
            flux -= value * sum;
        }

        for rec in &kin.dissociating {
            let r = &self.dissociations[rec.reaction];
            let value = r.rate / nt;
            let mut sum = 0.0;
            for alpha in 0..3 {
                let coeff = rec.coeffs[alpha][gamma];
                if coeff != 0.0 {
                    sum += coeff * self.moment(r.parent, alpha);
                }
            }
            flux += value * sum;
        }

        for rec in &kin.emitting {
            let r = &self.dissociations[rec.reaction];
            let value = r.rate / nt;
            let mut sum = 0.0;
            for alpha in 0..3 {
                let coeff = rec.coeffs[alpha][gamma];
                if coeff != 0.0 {
                    sum += coeff * self.moment(cid, alpha);
                }
            }
            flux -= value * sum;
        }

        flux
    }

    /// Fill ∂(dC_row/dt)/∂C_j for every j on this row's connectivity.
    /// Entries outside the connectivity are untouched; the assembler reads
    /// (and resets) only the listed columns.
    pub fn partial_derivatives(&self, row: usize, buf: &mut [f64]) {
        let (cid, gamma) = self.row_owner[row];
        let kin = &self.kinetics[cid];
        let nt = self.n_tot(cid);

        for rec in &kin.producing {
            let r = &self.productions[rec.reaction];
            let value = r.rate / nt;
            for alpha in 0..3 {
                for beta in 0..3 {
                    let coeff = rec.coeffs[alpha][beta][gamma];
                    if coeff == 0.0 {
                        continue;
                    }
                    if let Some(col) = self.moment_row(r.first, alpha) {
                        buf[col] += value * coeff * self.moment(r.second, beta);
                    }
                    if let Some(col) = self.moment_row(r.second, beta) {
                        buf[col] += value * coeff * self.moment(r.first, alpha);
                    }
                }
            }
        }

        for rec in &kin.combining {
            let r = &self.productions[rec.reaction];
            let value = r.rate / nt;
            for alpha in 0..3 {
                for beta in 0..3 {
                    let coeff = rec.coeffs[alpha][beta][gamma];
                    if coeff == 0.0 {
                        continue;
                    }
                    if let Some(col) = self.moment_row(cid, alpha) {
                        buf[col] -= value * coeff * self.moment(rec.partner, beta);
                    }
                    if let Some(col) = self.moment_row(rec.partner, beta) {
                        buf[col] -= value * coeff * self.moment(cid, alpha);
                    }
                }
            }
        }

        for rec in &kin.dissociating {
            let r = &self.dissociations[rec.reaction];
            let value = r.rate / nt;
            for alpha in 0..3 {
                let coeff = rec.coeffs[alpha][gamma];
                if coeff == 0.0 {
                    continue;
                }
                if let Some(col) = self.moment_row(r.parent, alpha) {
                    buf[col] += value * coeff;
                }
            }
        }

        for rec in &kin.emitting {
            let r = &self.dissociations[rec.reaction];
            let value = r.rate / nt;
            for alpha in 0..3 {
                let coeff = rec.coeffs[alpha][gamma];
                if coeff == 0.0 {
                    continue;
                }
                if let Some(col) = self.moment_row(cid, alpha) {
                    buf[col] -= value * coeff;
                }
            }
        }
    }

    // ── Construction helpers ─────────────────────────────────────────

    fn dofs_of(&self, cluster_id: usize, out: &mut Vec<usize>) {
        out.push(cluster_id);
        if let Some(info) = self.clusters[cluster_id].super_info() {
            for axis in 0..2 {
                if info.width[axis] > 1 {
                    out.push(info.moment_ids[axis]);
                }
            }
        }
    }

    fn build_connectivity(&self) -> Vec<Vec<usize>> {
        let mut rows: Vec<Vec<usize>> = vec![Vec::new(); self.dof];
        for c in &self.clusters {
            let kin = &self.kinetics[c.id];
            let mut cols = Vec::new();
            self.dofs_of(c.id, &mut cols);
            for rec in &kin.producing {
                let r = &self.productions[rec.reaction];
                self.dofs_of(r.first, &mut cols);
                self.dofs_of(r.second, &mut cols);
            }
            for rec in &kin.combining {
                self.dofs_of(rec.partner, &mut cols);
            }
            for rec in &kin.dissociating {
                self.dofs_of(self.dissociations[rec.reaction].parent, &mut cols);
            }
            cols.sort_unstable();
            cols.dedup();

            let mut own_rows = Vec::new();
            self.dofs_of(c.id, &mut own_rows);
            for row in own_rows {
                rows[row] = cols.clone();
            }
        }
        rows
    }
}
