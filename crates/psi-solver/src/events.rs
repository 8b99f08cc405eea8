// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Event Controller
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Discrete events interleaved with the continuous integration: surface
//! advance/retreat driven by net interstitial accumulation, and bubble
//! bursting driven by the nascent-bubble radius against the local depth.
//!
//! The event function is a pure predicate returning the three switch
//! values (0 = crossing); the post-event handler mutates the state. The
//! two surface switches are mutually exclusive by construction.

use log::info;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;

use psi_types::comm::{Collectives, DomainSlice};
use psi_types::constants::{bubble_radius, TUNGSTEN_DENSITY, TUNGSTEN_LATTICE};
use psi_types::counters::SurfaceCounters;
use psi_types::error::{PsiError, PsiResult};

use psi_core::handler::SolverHandler1D;
use psi_network::species::{ReactantType, Species};

/// Switch indices in the event-function output.
pub const SURFACE_ADVANCE: usize = 0;
pub const SURFACE_RETREAT: usize = 1;
pub const BUBBLE_BURST: usize = 2;

#[derive(Debug, Clone)]
pub struct EventConfig {
    pub moving_surface: bool,
    pub burst_bubbles: bool,
    pub sputtering_yield: f64,
    pub initial_v_conc: f64,
    /// Depth scale τ (nm) of the bursting probability.
    pub depth_param: f64,
    pub seed: u64,
    /// Append surface.txt / bursting.txt diagnostics.
    pub log_files: bool,
}

impl EventConfig {
    pub fn from_simulation(config: &psi_types::config::SimulationConfig) -> Self {
        EventConfig {
            moving_surface: config.surface.moving_surface,
            burst_bubbles: config.bursting.enabled,
            sputtering_yield: config.surface.sputtering_yield,
            initial_v_conc: config.surface.initial_v_conc,
            depth_param: config.bursting.depth_param,
            seed: config.bursting.seed,
            log_files: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostEventOutcome {
    /// The integrator must stop with a user-converged reason; the pending
    /// surface offset tells the outer driver how to re-extrude the grid.
    pub stop_requested: bool,
}

pub struct EventController {
    config: EventConfig,
    surface: SurfaceCounters,
    rng: StdRng,
    depth_positions: Vec<usize>,
    previous_time: f64,
    surface_offset: Option<i64>,
    surface_log_started: bool,
}

impl EventController {
    pub fn new(config: EventConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        EventController {
            config,
            surface: SurfaceCounters::default(),
            rng,
            depth_positions: Vec::new(),
            previous_time: 0.0,
            surface_offset: None,
            surface_log_started: false,
        }
    }

    pub fn surface_counters(&self) -> &SurfaceCounters {
        &self.surface
    }

    pub fn surface_counters_mut(&mut self) -> &mut SurfaceCounters {
        &mut self.surface
    }

    /// Grid points marked for bursting by the last event evaluation.
    pub fn depth_positions(&self) -> &[usize] {
        &self.depth_positions
    }

    /// Pending grid extrusion recorded when the surface left the grid.
    pub fn pending_surface_offset(&self) -> Option<i64> {
        self.surface_offset
    }

    /// Advance the internal clock at the end of an accepted step.
    pub fn record_time(&mut self, time: f64) {
        self.previous_time = time;
    }

    /// Density threshold for moving the surface sitting at `pos`.
    fn threshold(&self, handler: &SolverHandler1D, pos: usize) -> f64 {
        let grid = handler.grid();
        (TUNGSTEN_DENSITY - self.config.initial_v_conc) * grid.h_right(pos)
    }

    /// Evaluate the three switches at `time`. A zero entry marks a
    /// crossing; fluence/time monitors run before this in the step cycle.
    pub fn event_function<C: Collectives>(
        &mut self,
        handler: &mut SolverHandler1D,
        conc: &Array2<f64>,
        time: f64,
        comm: &C,
        slice: &DomainSlice,
    ) -> [f64; 3] {
        let mut fvalue = [1.0, 1.0, 1.0];
        self.depth_positions.clear();
        let dt = time - self.previous_time;
        let amplitude = handler.flux_handler().flux_amplitude(time);

        if self.config.moving_surface {
            let surface_pos = handler.surface_position();
            let xi = surface_pos + 1;

            if self.config.log_files && !self.surface_log_started && comm.rank() == 0 {
                let grid = handler.grid();
                let extent = grid.position(grid.len() - 2) - grid.position(1);
                if let Ok(mut file) = std::fs::OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open("surface.txt")
                {
                    let _ = writeln!(file, "{time} {extent}");
                }
                self.surface_log_started = true;
            }

            let mut my_flag = 0;
            if slice.owns(xi) {
                // Interstitials that escaped into the surface since the
                // last step, minus the sputtering loss.
                self.surface.n_interstitial += self.surface.previous_i_flux * dt;
                self.surface.n_interstitial -= self.config.sputtering_yield * amplitude * dt;

                let grid = handler.grid();
                let h_left = grid.h_left(xi);
                let h_right = grid.h_right(xi);
                let factor = 2.0 / (h_left * (h_left + h_right));
                let mut new_flux = 0.0;
                for cluster in handler.network().all_of(ReactantType::I) {
                    let conc_value = conc[[xi, cluster.id]];
                    let coef = handler.network().diffusion_coefficient(cluster.id);
                    new_flux += cluster.size() as f64 * factor * coef * conc_value * h_left;
                }
                self.surface.previous_i_flux = new_flux;
                my_flag = comm.rank();
            }

            let owner = comm.owner_from_flags(my_flag);
            let mut packet = self.surface.pack();
            comm.broadcast(owner, &mut packet);
            self.surface.unpack(&packet);

            let threshold = self.threshold(handler, surface_pos);
            if self.surface.n_interstitial > threshold {
                fvalue[SURFACE_ADVANCE] = 0.0;
            } else if self.surface.n_interstitial < -threshold / 10.0 {
                fvalue[SURFACE_RETREAT] = 0.0;
            }
        }

        if self.config.burst_bubbles {
            let prefactor = amplitude * dt * 0.1;
            let tau = self.config.depth_param;
            let surface_pos = handler.surface_position();
            let last = handler.grid().len() - 1;

            for xi in (surface_pos + 1)..last {
                if !slice.owns(xi) {
                    continue;
                }
                let distance = handler.grid().distance_from_surface(xi);
                if distance <= 0.0 {
                    continue;
                }
                let dx = handler.grid().h_right(xi);

                let mut row = vec![0.0; handler.network().size()];
                for (k, v) in row.iter_mut().enumerate() {
                    *v = conc[[xi, k]];
                }
                handler.network_mut().update_concentrations_from_array(&row);
                let he_density = handler.network().total_atom_concentration(Species::He);

                let n_v = he_density * dx / 4.0;
                let radius = bubble_radius(TUNGSTEN_LATTICE, n_v);

                if radius > distance {
                    self.depth_positions.push(xi);
                    continue;
                }
                let prob = prefactor * (1.0 - (distance - radius) / distance)
                    * f64::min(1.0, (-(distance - tau) / (2.0 * tau)).exp());
                if prob > self.rng.gen::<f64>() {
                    self.depth_positions.push(xi);
                }
            }

            if !self.depth_positions.is_empty() {
                fvalue[BUBBLE_BURST] = 0.0;
            }
        }

        fvalue
    }

    /// Apply the fired events: burst the marked depths, then move the
    /// surface. Returns whether the integrator must stop.
    pub fn post_event(
        &mut self,
        handler: &mut SolverHandler1D,
        conc: &mut Array2<f64>,
        events: &[usize],
        time: f64,
    ) -> PsiResult<PostEventOutcome> {
        // Fluence and clock bookkeeping runs first in the step cycle.
        let dt = time - self.previous_time;
        handler.flux_handler_mut().increment_fluence(dt, time);
        self.previous_time = time;

        if events.is_empty() {
            return Ok(PostEventOutcome {
                stop_requested: false,
            });
        }
        if events.contains(&SURFACE_ADVANCE) && events.contains(&SURFACE_RETREAT) {
            return Err(PsiError::PhysicsViolation(
                "the surface cannot move in both directions at the same time".to_string(),
            ));
        }

        if events.contains(&BUBBLE_BURST) {
            let positions = std::mem::take(&mut self.depth_positions);
            for &xi in &positions {
                self.burst_at(handler, conc, xi, time);
            }
        }

        let moving = events
            .iter()
            .any(|&e| e == SURFACE_ADVANCE || e == SURFACE_RETREAT);
        if !moving {
            return Ok(PostEventOutcome {
                stop_requested: false,
            });
        }

        if events.contains(&SURFACE_ADVANCE) {
            self.advance_surface(handler)
        } else {
            self.retreat_surface(handler)
        }
    }

    /// Pinhole bursting at one depth: He/D/T leave the domain, every mixed
    /// cluster hands its content to the vacancy cluster of its size, super
    /// clusters transfer their integrated V-axis distribution.
    fn burst_at(&self, handler: &mut SolverHandler1D, conc: &mut Array2<f64>, xi: usize, time: f64) {
        let distance = handler.grid().distance_from_surface(xi);
        if self.config.log_files {
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open("bursting.txt")
            {
                let _ = writeln!(file, "{time} {distance}");
            }
        }
        info!("bubble burst at depth {distance} nm");

        let n = handler.network().size();
        let mut row = vec![0.0; n];
        for (k, v) in row.iter_mut().enumerate() {
            *v = conc[[xi, k]];
        }
        handler.network_mut().update_concentrations_from_array(&row);

        let mut zero_ids: Vec<usize> = Vec::new();
        let mut v_transfers: Vec<(usize, f64)> = Vec::new();

        for rtype in [ReactantType::He, ReactantType::D, ReactantType::T] {
            for cluster in handler.network().all_of(rtype) {
                zero_ids.push(cluster.id);
            }
        }

        for cluster in handler.network().all_of(ReactantType::Mixed) {
            let comp = cluster
                .composition()
                .expect("mixed clusters are regular entries");
            let n_v = comp.amount(Species::V);
            if let Some(v_cluster) = handler.network().get(Species::V, n_v) {
                v_transfers.push((v_cluster.id, conc[[xi, cluster.id]]));
            }
            zero_ids.push(cluster.id);
        }

        for cluster in handler.network().all_of(ReactantType::Super) {
            let info = cluster.super_info().expect("super cluster");
            let v_axis = info.bounds[1];
            for v in v_axis.iter() {
                let integrated = handler.network().super_integrated_concentration(cluster.id, v);
                if let Some(v_cluster) = handler.network().get(Species::V, v) {
                    v_transfers.push((v_cluster.id, integrated));
                }
            }
            zero_ids.push(cluster.id);
            for axis in 0..2 {
                if info.width[axis] > 1 {
                    zero_ids.push(info.moment_ids[axis]);
                }
            }
        }

        for (v_id, amount) in v_transfers {
            conc[[xi, v_id]] += amount;
        }
        for id in zero_ids {
            conc[[xi, id]] = 0.0;
        }
    }

    fn advance_surface(&mut self, handler: &mut SolverHandler1D) -> PsiResult<PostEventOutcome> {
        let mut pos = handler.surface_position() as i64;
        let mut n_points = 0_i64;
        let mut threshold = self.threshold(handler, pos as usize);
        while self.surface.n_interstitial > threshold {
            pos -= 1;
            n_points += 1;
            self.surface.n_interstitial -= threshold;
            if pos < 0 {
                break;
            }
            threshold = self.threshold(handler, pos as usize);
        }

        if pos < 0 {
            // The surface left the grid: request a user-converged stop and
            // leave the extrusion size for the outer driver.
            self.surface_offset = Some(n_points);
            return Ok(PostEventOutcome {
                stop_requested: true,
            });
        }

        info!("surface advanced by {n_points} grid points");
        handler.set_surface_position(pos as usize);
        Ok(PostEventOutcome {
            stop_requested: false,
        })
    }

    fn retreat_surface(&mut self, handler: &mut SolverHandler1D) -> PsiResult<PostEventOutcome> {
        let grid_len = handler.grid().len();
        let mut pos = handler.surface_position();
        let mut n_points = 0_i64;
        while self.surface.n_interstitial < 0.0 && pos + 3 < grid_len {
            let threshold = self.threshold(handler, pos + 1);
            pos += 1;
            n_points -= 1;
            self.surface.n_interstitial += threshold;
        }

        // A retreat always hands control back so the driver can rebuild
        // the grid against the deeper front.
        self.surface_offset = Some(n_points);
        handler.set_surface_position(pos);
        Ok(PostEventOutcome {
            stop_requested: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use psi_network::builder::{grouped_psi_network, tungsten_network};
    use psi_types::comm::SerialComm;
    use psi_types::config::{
        BurstingConfig, FluxConfig, GridConfig, SimulationConfig, SurfaceConfig, TemperatureConfig,
    };

    fn sim_config(void_portion: f64) -> SimulationConfig {
        SimulationConfig {
            material: "W110".to_string(),
            grid: GridConfig {
                nx: 13,
                hx: 0.1,
                void_portion,
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
                moving_surface: true,
                sputtering_yield: 1.0e-4,
            },
            bursting: BurstingConfig {
                enabled: true,
                depth_param: 10.0,
                seed: 7,
            },
        }
    }

    fn event_config() -> EventConfig {
        EventConfig {
            moving_surface: true,
            burst_bubbles: true,
            sputtering_yield: 1.0e-4,
            initial_v_conc: 0.0,
            depth_param: 10.0,
            seed: 7,
            log_files: false,
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
    fn test_counter_closure_across_event() {
        let mut handler =
            SolverHandler1D::create_solver_context(&sim_config(0.0), tungsten_network())
                .expect("context");
        handler.network_mut().set_temperature(1000.0);
        let n = handler.network().size();
        let conc = Array2::zeros((13, n));
        let mut controller = EventController::new(EventConfig {
            burst_bubbles: false,
            ..event_config()
        });
        controller.surface_counters_mut().previous_i_flux = 2.5;

        let dt = 0.125;
        let amplitude = handler.flux_handler().flux_amplitude(dt);
        let before = controller.surface_counters().n_interstitial;
        controller.event_function(&mut handler, &conc, dt, &SerialComm, &full_slice(13));
        let after = controller.surface_counters().n_interstitial;

        let expected = 2.5 * dt - 1.0e-4 * amplitude * dt;
        assert!(
            (after - before - expected).abs() < 1e-12 * expected.abs().max(1.0),
            "counter closure violated: Δ={} expected {expected}",
            after - before
        );
    }

    #[test]
    fn test_interstitial_efflux_updates_previous_flux() {
        let mut handler =
            SolverHandler1D::create_solver_context(&sim_config(0.0), tungsten_network())
                .expect("context");
        handler.network_mut().set_temperature(1000.0);
        let n = handler.network().size();
        let mut conc = Array2::zeros((13, n));
        let i1 = handler.network().get(Species::I, 1).unwrap().id;
        conc[[1, i1]] = 3.0e10;

        let mut controller = EventController::new(EventConfig {
            burst_bubbles: false,
            ..event_config()
        });
        controller.event_function(&mut handler, &conc, 0.1, &SerialComm, &full_slice(13));

        let d = handler.network().diffusion_coefficient(i1);
        let expected = d * 3.0e10 * 2.0 * 0.1 / (0.1 * 0.2);
        let got = controller.surface_counters().previous_i_flux;
        assert!(
            (got - expected).abs() <= 1e-9 * expected,
            "efflux {got} vs {expected}"
        );
    }

    #[test]
    fn test_surface_advance_moves_front_up() {
        let mut handler =
            SolverHandler1D::create_solver_context(&sim_config(20.0), tungsten_network())
                .expect("context");
        handler.network_mut().set_temperature(1000.0);
        assert_eq!(handler.surface_position(), 2);
        let n = handler.network().size();
        let conc = Array2::zeros((13, n));
        let mut controller = EventController::new(EventConfig {
            burst_bubbles: false,
            ..event_config()
        });

        // One threshold's worth of interstitials, plus a little slack.
        let threshold = (TUNGSTEN_DENSITY - 0.0) * 0.1;
        controller.surface_counters_mut().n_interstitial = threshold * 1.5;

        let fvalue =
            controller.event_function(&mut handler, &conc, 1.0e-6, &SerialComm, &full_slice(13));
        assert_eq!(fvalue[SURFACE_ADVANCE], 0.0);
        assert_eq!(fvalue[SURFACE_RETREAT], 1.0);

        let mut state = conc.clone();
        let outcome = controller
            .post_event(&mut handler, &mut state, &[SURFACE_ADVANCE], 1.0e-6)
            .unwrap();
        assert!(!outcome.stop_requested);
        assert_eq!(handler.surface_position(), 1);
        assert!(
            controller.surface_counters().n_interstitial < threshold,
            "advance must consume one threshold of interstitials"
        );
    }

    #[test]
    fn test_surface_leaving_grid_requests_stop() {
        let mut handler =
            SolverHandler1D::create_solver_context(&sim_config(0.0), tungsten_network())
                .expect("context");
        handler.network_mut().set_temperature(1000.0);
        let n = handler.network().size();
        let mut conc = Array2::zeros((13, n));
        let mut controller = EventController::new(EventConfig {
            burst_bubbles: false,
            ..event_config()
        });
        controller.surface_counters_mut().n_interstitial = 1.0e4;

        let outcome = controller
            .post_event(&mut handler, &mut conc, &[SURFACE_ADVANCE], 1.0e-6)
            .unwrap();
        assert!(outcome.stop_requested);
        let offset = controller.pending_surface_offset().unwrap();
        assert!(offset > 0, "driver must learn how many points to extrude");
    }

    #[test]
    fn test_surface_retreat_stops_with_negative_offset() {
        let mut handler =
            SolverHandler1D::create_solver_context(&sim_config(20.0), tungsten_network())
                .expect("context");
        handler.network_mut().set_temperature(1000.0);
        let n = handler.network().size();
        let mut conc = Array2::zeros((13, n));
        let mut controller = EventController::new(EventConfig {
            burst_bubbles: false,
            ..event_config()
        });
        controller.surface_counters_mut().n_interstitial = -1.0;

        let outcome = controller
            .post_event(&mut handler, &mut conc, &[SURFACE_RETREAT], 1.0e-6)
            .unwrap();
        assert!(outcome.stop_requested);
        assert!(controller.pending_surface_offset().unwrap() < 0);
        assert!(handler.surface_position() > 2);
    }

    #[test]
    fn test_opposite_surface_events_rejected() {
        let mut handler =
            SolverHandler1D::create_solver_context(&sim_config(0.0), tungsten_network())
                .expect("context");
        let n = handler.network().size();
        let mut conc = Array2::zeros((13, n));
        let mut controller = EventController::new(event_config());
        let err = controller
            .post_event(
                &mut handler,
                &mut conc,
                &[SURFACE_ADVANCE, SURFACE_RETREAT, BUBBLE_BURST],
                0.0,
            )
            .unwrap_err();
        match err {
            PsiError::PhysicsViolation(msg) => assert!(msg.contains("both directions")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bursting_transfers_mixed_and_super_content() {
        let mut handler =
            SolverHandler1D::create_solver_context(&sim_config(0.0), grouped_psi_network())
                .expect("context");
        handler.network_mut().set_temperature(1000.0);
        let n = handler.network().size();
        let mut conc = Array2::zeros((13, n));

        let network = handler.network();
        let he1 = network.get(Species::He, 1).unwrap().id;
        let d1 = network.get(Species::D, 1).unwrap().id;
        let t1 = network.get(Species::T, 1).unwrap().id;
        let v1 = network.get(Species::V, 1).unwrap().id;
        let v2 = network.get(Species::V, 2).unwrap().id;
        let he2v1 = network
            .get_mixed(
                &psi_network::species::Composition::pure(Species::He, 2).with(Species::V, 1),
            )
            .unwrap()
            .id;
        let he3v2 = network
            .get_mixed(
                &psi_network::species::Composition::pure(Species::He, 3).with(Species::V, 2),
            )
            .unwrap()
            .id;
        let super_id = network.all_of(ReactantType::Super).next().unwrap().id;
        let moment = network.cluster(super_id).super_info().unwrap().moment_ids[0];

        let xi = 1;
        conc[[xi, he1]] = 500.0; // enough helium that the bubble reaches the surface
        conc[[xi, d1]] = 3.0;
        conc[[xi, t1]] = 2.0;
        conc[[xi, he2v1]] = 4.0;
        conc[[xi, he3v2]] = 6.0;
        conc[[xi, super_id]] = 2.0;
        conc[[xi, moment]] = 0.25;

        let mut controller = EventController::new(EventConfig {
            moving_surface: false,
            ..event_config()
        });
        let fvalue =
            controller.event_function(&mut handler, &conc, 1.0e-6, &SerialComm, &full_slice(13));
        assert_eq!(fvalue[BUBBLE_BURST], 0.0, "dense bubble must burst");
        assert!(controller.depth_positions().contains(&xi));

        controller
            .post_event(&mut handler, &mut conc, &[BUBBLE_BURST], 1.0e-6)
            .unwrap();

        // He/D/T gone, mixed content moved onto the vacancy chain.
        assert_eq!(conc[[xi, he1]], 0.0);
        assert_eq!(conc[[xi, d1]], 0.0);
        assert_eq!(conc[[xi, t1]], 0.0);
        assert_eq!(conc[[xi, he2v1]], 0.0);
        assert_eq!(conc[[xi, he3v2]], 0.0);
        assert!((conc[[xi, v1]] - 4.0).abs() < 1e-12);
        // V2 receives the resolved He3V2 plus the super's integrated
        // V = 2 slice (members at distances −1, 0, 1: moments cancel).
        assert!((conc[[xi, v2]] - (6.0 + 3.0 * 2.0)).abs() < 1e-12);
        assert_eq!(conc[[xi, super_id]], 0.0);
        assert_eq!(conc[[xi, moment]], 0.0);
    }
}
