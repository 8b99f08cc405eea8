// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Monitors
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-timestep monitors: numerical guards, retention roll-ups, TRIDYN
//! export, depth-resolved statistics and the checkpoint stride.

use log::{info, warn};
use ndarray::Array2;
use serde::Serialize;
use std::io::Write;

use psi_types::comm::{Collectives, DomainSlice};
use psi_types::counters::BulkCounters;
use psi_types::error::PsiResult;

use psi_core::handler::SolverHandler1D;
use psi_network::species::{ReactantType, Species};

use crate::options::MonitorOptions;

/// One-shot warning threshold for the largest tracked cluster.
const MAX_CONC_WARNING: f64 = 1.0e-16;

/// Historical TRIDYN consumer width: He, D, T, V, I.
const TRIDYN_DEFAULT_SPECIES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionTotals {
    pub helium: f64,
    pub deuterium: f64,
    pub tritium: f64,
    pub fluence: f64,
}

pub struct Monitors {
    options: MonitorOptions,
    bulk: BulkCounters,
    previous_time: f64,
    checkpoint_previous: i64,
    max_conc_warned: bool,
    /// Id of the largest tracked cluster, resolved lazily.
    largest_id: Option<usize>,
    tridyn_species_width: usize,
}

impl Monitors {
    pub fn new(options: MonitorOptions) -> Self {
        Monitors {
            options,
            bulk: BulkCounters::default(),
            previous_time: 0.0,
            checkpoint_previous: 0,
            max_conc_warned: false,
            largest_id: None,
            tridyn_species_width: TRIDYN_DEFAULT_SPECIES,
        }
    }

    pub fn options(&self) -> &MonitorOptions {
        &self.options
    }

    pub fn bulk_counters(&self) -> &BulkCounters {
        &self.bulk
    }

    pub fn bulk_counters_mut(&mut self) -> &mut BulkCounters {
        &mut self.bulk
    }

    /// The TRIDYN consumer assumes five concentration species per row;
    /// widen only when the downstream tool is known to accept it.
    pub fn set_tridyn_species_width(&mut self, width: usize) {
        self.tridyn_species_width = width;
    }

    pub fn record_time(&mut self, time: f64) {
        self.previous_time = time;
    }

    // ── Numerical guards ─────────────────────────────────────────────

    /// Clamp concentrations whose magnitude sits below the threshold,
    /// preserving sign.
    pub fn check_negative(&self, conc: &mut Array2<f64>, xs: usize, xm: usize) {
        let Some(threshold) = self.options.check_negative else {
            return;
        };
        for xi in xs..xs + xm {
            for value in conc.row_mut(xi) {
                if *value > 0.0 && *value < threshold {
                    *value = threshold;
                } else if *value < 0.0 && *value > -threshold {
                    *value = -threshold;
                }
            }
        }
    }

    /// True when the time step fell below the collapse floor and the
    /// integrator should be asked to stop.
    pub fn check_time_step_collapse(&self, dt: f64) -> bool {
        match self.options.check_collapse {
            Some(floor) => dt < floor,
            None => false,
        }
    }

    /// One-shot warning when the largest tracked cluster first becomes
    /// populated anywhere on the owned slab.
    pub fn check_max_cluster_conc(
        &mut self,
        handler: &SolverHandler1D,
        conc: &Array2<f64>,
        xs: usize,
        xm: usize,
    ) {
        if !self.options.max_cluster_conc || self.max_conc_warned {
            return;
        }
        let largest = *self.largest_id.get_or_insert_with(|| {
            handler
                .network()
                .all()
                .max_by_key(|c| c.size())
                .map(|c| c.id)
                .unwrap_or(0)
        });
        for xi in xs..xs + xm {
            if handler.grid().is_boundary(xi) {
                continue;
            }
            if conc[[xi, largest]] > MAX_CONC_WARNING {
                warn!("largest cluster concentration reached {MAX_CONC_WARNING} at grid point {xi}");
                self.max_conc_warned = true;
                return;
            }
        }
    }

    pub fn max_conc_warned(&self) -> bool {
        self.max_conc_warned
    }

    // ── Retention ────────────────────────────────────────────────────

    /// Integrate He/D/T content over the owned interior, account the bulk
    /// flux when the bottom is a free surface, and synchronize counters.
    pub fn compute_retention<C: Collectives>(
        &mut self,
        handler: &mut SolverHandler1D,
        conc: &Array2<f64>,
        time: f64,
        comm: &C,
        slice: &DomainSlice,
    ) -> RetentionTotals {
        let n = handler.network().size();
        let grid_len = handler.grid().len();
        let surface = handler.surface_position();
        let left = handler.grid().left_offset();
        let right = handler.grid().right_offset();

        let mut totals = [0.0_f64; 3];
        let mut row = vec![0.0; n];
        for xi in slice.x_start..slice.x_end {
            if xi < surface + left || xi >= grid_len - right {
                continue;
            }
            for (k, v) in row.iter_mut().enumerate() {
                *v = conc[[xi, k]];
            }
            handler.network_mut().update_concentrations_from_array(&row);
            let dx = handler.grid().h_right(xi);
            totals[0] += handler.network().total_atom_concentration(Species::He) * dx;
            totals[1] += handler.network().total_atom_concentration(Species::D) * dx;
            totals[2] += handler.network().total_atom_concentration(Species::T) * dx;
        }
        comm.sum_reduce(&mut totals);

        // Bulk losses only when the bottom is a free surface.
        if right == 1 {
            let xi = grid_len - 2;
            let mut my_flag = 0;
            if slice.owns(xi) {
                let dt = time - self.previous_time;
                self.bulk.n_helium += self.bulk.previous_he_flux * dt;
                self.bulk.n_deuterium += self.bulk.previous_d_flux * dt;
                self.bulk.n_tritium += self.bulk.previous_t_flux * dt;

                let h_left = handler.grid().h_left(xi);
                let h_right = handler.grid().h_right(xi);
                let factor = 2.0 / (h_right * (h_left + h_right));
                let mut fluxes = [0.0_f64; 3];
                for (slot, rtype) in
                    [ReactantType::He, ReactantType::D, ReactantType::T].iter().enumerate()
                {
                    for cluster in handler.network().all_of(*rtype) {
                        let coef = handler.network().diffusion_coefficient(cluster.id);
                        fluxes[slot] +=
                            cluster.size() as f64 * factor * coef * conc[[xi, cluster.id]] * h_right;
                    }
                }
                self.bulk.previous_he_flux = fluxes[0];
                self.bulk.previous_d_flux = fluxes[1];
                self.bulk.previous_t_flux = fluxes[2];
                my_flag = comm.rank();
            }
            let owner = comm.owner_from_flags(my_flag);
            let mut packet = self.bulk.pack();
            comm.broadcast(owner, &mut packet);
            self.bulk.unpack(&packet);
        }

        let fluence = handler.flux_handler().fluence();
        let result = RetentionTotals {
            helium: totals[0],
            deuterium: totals[1],
            tritium: totals[2],
            fluence,
        };
        if comm.rank() == 0 {
            info!(
                "retention at t={time}: He={} D={} T={} fluence={fluence}",
                result.helium, result.deuterium, result.tritium
            );
            if self.options.log_files {
                if let Ok(mut file) = std::fs::OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open("retentionOut.txt")
                {
                    let _ = writeln!(
                        file,
                        "{fluence} {} {} {} {} {} {}",
                        result.helium,
                        result.deuterium,
                        result.tritium,
                        self.bulk.n_helium,
                        self.bulk.n_deuterium,
                        self.bulk.n_tritium
                    );
                }
            }
        }
        result
    }

    /// Total xenon content over the owned interior (NE materials).
    pub fn compute_xenon_retention<C: Collectives>(
        &mut self,
        handler: &mut SolverHandler1D,
        conc: &Array2<f64>,
        comm: &C,
        slice: &DomainSlice,
    ) -> f64 {
        let n = handler.network().size();
        let grid_len = handler.grid().len();
        let surface = handler.surface_position();
        let left = handler.grid().left_offset();
        let right = handler.grid().right_offset();

        let mut total = [0.0_f64];
        let mut row = vec![0.0; n];
        for xi in slice.x_start..slice.x_end {
            if xi < surface + left || xi >= grid_len - right {
                continue;
            }
            for (k, v) in row.iter_mut().enumerate() {
                *v = conc[[xi, k]];
            }
            handler.network_mut().update_concentrations_from_array(&row);
            total[0] +=
                handler.network().total_atom_concentration(Species::Xe) * handler.grid().h_right(xi);
        }
        comm.sum_reduce(&mut total);
        total[0]
    }

    /// Per-type totals for the alloy defect families, in
    /// (Void, Faulted, Frank, Perfect) order.
    pub fn alloy_totals(
        &self,
        handler: &mut SolverHandler1D,
        conc: &Array2<f64>,
    ) -> [f64; 4] {
        let n = handler.network().size();
        let mut row = vec![0.0; n];
        let mut totals = [0.0; 4];
        let interior: Vec<usize> = handler.grid().interior().collect();
        for xi in interior {
            for (k, v) in row.iter_mut().enumerate() {
                *v = conc[[xi, k]];
            }
            handler.network_mut().update_concentrations_from_array(&row);
            let dx = handler.grid().h_right(xi);
            for (slot, species) in [
                Species::Void,
                Species::Faulted,
                Species::Frank,
                Species::Perfect,
            ]
            .iter()
            .enumerate()
            {
                totals[slot] += handler.network().total_atom_concentration(*species) * dx;
            }
        }
        totals
    }

    // ── Exports and profiles ─────────────────────────────────────────

    /// TRIDYN rows `(depth, nHe, nD, nT, nV, nI, T)` for the grid points
    /// below the surface. The species block is truncated or extended to
    /// the configured width.
    pub fn tridyn_rows(
        &self,
        handler: &mut SolverHandler1D,
        conc: &Array2<f64>,
        time: f64,
    ) -> Vec<Vec<f64>> {
        let n = handler.network().size();
        let grid_len = handler.grid().len();
        let surface = handler.surface_position();
        let first = surface + handler.grid().left_offset();

        let mut rows = Vec::new();
        let mut row = vec![0.0; n];
        for xi in first..grid_len {
            for (k, v) in row.iter_mut().enumerate() {
                *v = conc[[xi, k]];
            }
            handler.network_mut().update_concentrations_from_array(&row);
            let species_totals = [
                handler.network().total_atom_concentration(Species::He),
                handler.network().total_atom_concentration(Species::D),
                handler.network().total_atom_concentration(Species::T),
                handler.network().total_atom_concentration(Species::V),
                handler.network().total_atom_concentration(Species::I),
            ];
            let mut out = Vec::with_capacity(self.tridyn_species_width + 2);
            out.push(handler.grid().distance_from_surface(xi));
            for slot in 0..self.tridyn_species_width {
                out.push(species_totals.get(slot).copied().unwrap_or(0.0));
            }
            out.push(handler.temperature_at(xi, time));
            rows.push(out);
        }
        rows
    }

    /// Write the TRIDYN export for one timestep.
    pub fn write_tridyn(
        &self,
        handler: &mut SolverHandler1D,
        conc: &Array2<f64>,
        timestep: u64,
        time: f64,
    ) -> PsiResult<()> {
        #[derive(Serialize)]
        struct TridynFile<'a> {
            concs: &'a [Vec<f64>],
        }
        let rows = self.tridyn_rows(handler, conc, time);
        let contents = serde_json::to_string(&TridynFile { concs: &rows })?;
        std::fs::write(format!("TRIDYN_{timestep}.json"), contents)?;
        Ok(())
    }

    /// Depth-resolved mean cluster size over the interior.
    pub fn mean_size_profile(
        &self,
        handler: &SolverHandler1D,
        conc: &Array2<f64>,
    ) -> Vec<(f64, f64)> {
        let mut profile = Vec::new();
        for xi in handler.grid().interior() {
            let mut weighted = 0.0;
            let mut total = 0.0;
            for cluster in handler.network().all() {
                let value = conc[[xi, cluster.id]];
                weighted += value * cluster.size() as f64;
                total += value;
            }
            let mean = if total > 0.0 { weighted / total } else { 0.0 };
            profile.push((handler.grid().distance_from_surface(xi), mean));
        }
        profile
    }

    /// Cumulative helium content from the surface down.
    pub fn cumulative_helium(
        &self,
        handler: &mut SolverHandler1D,
        conc: &Array2<f64>,
    ) -> Vec<(f64, f64)> {
        let n = handler.network().size();
        let mut row = vec![0.0; n];
        let mut running = 0.0;
        let mut profile = Vec::new();
        let interior: Vec<usize> = handler.grid().interior().collect();
        for xi in interior {
            for (k, v) in row.iter_mut().enumerate() {
                *v = conc[[xi, k]];
            }
            handler.network_mut().update_concentrations_from_array(&row);
            running +=
                handler.network().total_atom_concentration(Species::He) * handler.grid().h_right(xi);
            profile.push((handler.grid().distance_from_surface(xi), running));
        }
        profile
    }

    /// Temperature versus depth at one instant.
    pub fn temperature_profile(
        &self,
        handler: &SolverHandler1D,
        time: f64,
    ) -> Vec<(f64, f64)> {
        (0..handler.grid().len())
            .map(|xi| {
                (
                    handler.grid().distance_from_surface(xi),
                    handler.temperature_at(xi, time),
                )
            })
            .collect()
    }

    // ── Checkpoint stride ────────────────────────────────────────────

    /// Stride gate for the checkpoint monitor: fires when the simulated
    /// time crosses the next stride multiple.
    pub fn should_checkpoint(&mut self, time: f64, dt: f64, timestep: u64) -> bool {
        let Some(stride) = self.options.start_stop else {
            return false;
        };
        let bucket = ((time + dt / 10.0) / stride) as i64;
        if bucket <= self.checkpoint_previous && timestep > 0 {
            return false;
        }
        if bucket > self.checkpoint_previous {
            self.checkpoint_previous += 1;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use psi_network::builder::tungsten_network;
    use psi_types::comm::SerialComm;
    use psi_types::config::{
        BurstingConfig, FluxConfig, GridConfig, SimulationConfig, SurfaceConfig, TemperatureConfig,
    };

    fn sim_config() -> SimulationConfig {
        SimulationConfig {
            material: "W110".to_string(),
            grid: GridConfig {
                nx: 13,
                hx: 0.1,
                void_portion: 0.0,
                left_offset: 1,
                right_offset: 1,
            },
            flux: FluxConfig {
                amplitude: 4.0e5,
                implantation_depth: 0.4,
                time_profile: Vec::new(),
            },
            temperature: TemperatureConfig {
                const_temperature: Some(1000.0),
                ..TemperatureConfig::default()
            },
            surface: SurfaceConfig {
                initial_v_conc: 0.0,
                moving_surface: false,
                sputtering_yield: 0.0,
            },
            bursting: BurstingConfig::default(),
        }
    }

    fn handler() -> SolverHandler1D {
        let mut h = SolverHandler1D::create_solver_context(&sim_config(), tungsten_network())
            .expect("context");
        h.network_mut().set_temperature(1000.0);
        h
    }

    fn options(check_negative: Option<f64>) -> MonitorOptions {
        MonitorOptions {
            check_negative,
            ..MonitorOptions::default()
        }
    }

    fn full_slice(len: usize) -> DomainSlice {
        DomainSlice {
            rank: 0,
            nranks: 1,
            global_nx: len,
            local_nx: len,
            ghost: 1,
            x_start: 0,
            x_end: len,
        }
    }

    #[test]
    fn test_check_negative_clamps_small_values() {
        let monitors = Monitors::new(options(Some(1.0e-30)));
        let mut conc = Array2::zeros((3, 4));
        conc[[1, 0]] = 1.0e-35;
        conc[[1, 1]] = -1.0e-35;
        conc[[1, 2]] = 5.0e-20;
        conc[[1, 3]] = -5.0e-20;
        monitors.check_negative(&mut conc, 0, 3);
        assert_eq!(conc[[1, 0]], 1.0e-30);
        assert_eq!(conc[[1, 1]], -1.0e-30);
        assert_eq!(conc[[1, 2]], 5.0e-20, "values above threshold untouched");
        assert_eq!(conc[[1, 3]], -5.0e-20);
    }

    #[test]
    fn test_time_step_collapse_floor() {
        let monitors = Monitors::new(MonitorOptions {
            check_collapse: Some(1.0e-12),
            ..MonitorOptions::default()
        });
        assert!(monitors.check_time_step_collapse(1.0e-13));
        assert!(!monitors.check_time_step_collapse(1.0e-11));
        let silent = Monitors::new(MonitorOptions::default());
        assert!(!silent.check_time_step_collapse(1.0e-20));
    }

    #[test]
    fn test_retention_integrates_interior_helium() {
        let mut h = handler();
        let n = h.network().size();
        let he1 = h.network().get(Species::He, 1).unwrap().id;
        let mut conc = Array2::zeros((13, n));
        for xi in 1..12 {
            conc[[xi, he1]] = 10.0;
        }
        let mut monitors = Monitors::new(MonitorOptions::default());
        let totals =
            monitors.compute_retention(&mut h, &conc, 0.1, &SerialComm, &full_slice(13));
        // 11 interior points × 10 atoms × 0.1 nm.
        assert!((totals.helium - 11.0).abs() < 1e-9, "got {}", totals.helium);
        assert_eq!(totals.deuterium, 0.0);
        assert_eq!(totals.tritium, 0.0);
    }

    #[test]
    fn test_retention_updates_bulk_counters() {
        let mut h = handler();
        let n = h.network().size();
        let he1 = h.network().get(Species::He, 1).unwrap().id;
        let mut conc = Array2::zeros((13, n));
        conc[[11, he1]] = 7.0; // at the bottom accounting point Mx−2

        let mut monitors = Monitors::new(MonitorOptions::default());
        monitors.bulk_counters_mut().previous_he_flux = 4.0;
        monitors.record_time(0.0);
        monitors.compute_retention(&mut h, &conc, 0.5, &SerialComm, &full_slice(13));

        let bulk = monitors.bulk_counters();
        // Old flux integrated over dt, then the flux refreshed from the
        // local state.
        assert!((bulk.n_helium - 2.0).abs() < 1e-12, "got {}", bulk.n_helium);
        let d = h.network().diffusion_coefficient(he1);
        let expected_flux = 1.0 * (2.0 / (0.1 * 0.2)) * d * 7.0 * 0.1;
        assert!(
            (bulk.previous_he_flux - expected_flux).abs() <= 1e-9 * expected_flux,
            "flux {} vs {expected_flux}",
            bulk.previous_he_flux
        );
    }

    #[test]
    fn test_tridyn_rows_have_configured_width() {
        let mut h = handler();
        let n = h.network().size();
        let conc = Array2::zeros((13, n));
        let monitors = Monitors::new(MonitorOptions::default());
        let rows = monitors.tridyn_rows(&mut h, &conc, 0.0);
        assert_eq!(rows.len(), 12, "one row per point below the surface");
        for row in &rows {
            assert_eq!(row.len(), 7, "depth + 5 species + temperature");
            assert!((row[row.len() - 1] - 1000.0).abs() < 1e-9);
        }

        let mut wide = Monitors::new(MonitorOptions::default());
        wide.set_tridyn_species_width(6);
        let rows = wide.tridyn_rows(&mut h, &conc, 0.0);
        assert_eq!(rows[0].len(), 8);
        assert_eq!(rows[0][6], 0.0, "padded species column is zero");
    }

    #[test]
    fn test_mean_size_profile_weighs_cluster_sizes() {
        let h = handler();
        let n = h.network().size();
        let he1 = h.network().get(Species::He, 1).unwrap().id;
        let he8 = h.network().get(Species::He, 8).unwrap().id;
        let mut conc = Array2::zeros((13, n));
        conc[[3, he1]] = 1.0;
        conc[[3, he8]] = 1.0;
        let monitors = Monitors::new(MonitorOptions::default());
        let profile = monitors.mean_size_profile(&h, &conc);
        let (_, mean) = profile[2]; // xi = 3 is the third interior point
        assert!((mean - 4.5).abs() < 1e-12, "mean of sizes 1 and 8: {mean}");
    }

    #[test]
    fn test_cumulative_helium_monotone() {
        let mut h = handler();
        let n = h.network().size();
        let he1 = h.network().get(Species::He, 1).unwrap().id;
        let mut conc = Array2::zeros((13, n));
        for xi in 1..12 {
            conc[[xi, he1]] = 1.0;
        }
        let monitors = Monitors::new(MonitorOptions::default());
        let profile = monitors.cumulative_helium(&mut h, &conc);
        for pair in profile.windows(2) {
            assert!(pair[1].1 >= pair[0].1, "cumulative content must not decrease");
        }
        assert!(profile[profile.len() - 1].1 > 0.0);
    }

    #[test]
    fn test_max_conc_warning_is_one_shot() {
        let mut h = handler();
        let n = h.network().size();
        let mut conc = Array2::zeros((13, n));
        let largest = h.network().all().max_by_key(|c| c.size()).unwrap().id;
        conc[[2, largest]] = 1.0e-10;

        let mut monitors = Monitors::new(MonitorOptions {
            max_cluster_conc: true,
            ..MonitorOptions::default()
        });
        assert!(!monitors.max_conc_warned());
        monitors.check_max_cluster_conc(&h, &conc, 0, 13);
        assert!(monitors.max_conc_warned());
        // Second call stays silent without resetting.
        monitors.check_max_cluster_conc(&h, &conc, 0, 13);
        assert!(monitors.max_conc_warned());
    }

    #[test]
    fn test_checkpoint_stride() {
        let mut monitors = Monitors::new(MonitorOptions {
            start_stop: Some(1.0),
            ..MonitorOptions::default()
        });
        // The initial dump always happens.
        assert!(monitors.should_checkpoint(0.0, 0.01, 0));
        assert!(!monitors.should_checkpoint(0.4, 0.01, 1));
        assert!(monitors.should_checkpoint(1.05, 0.01, 2));
        assert!(!monitors.should_checkpoint(1.5, 0.01, 3));
        assert!(monitors.should_checkpoint(2.2, 0.01, 4));
    }

    #[test]
    fn test_temperature_profile_constant_field() {
        let h = handler();
        let monitors = Monitors::new(MonitorOptions::default());
        let profile = monitors.temperature_profile(&h, 0.0);
        assert_eq!(profile.len(), 13);
        assert!(profile.iter().all(|(_, t)| (*t - 1000.0).abs() < 1e-9));
    }
}
