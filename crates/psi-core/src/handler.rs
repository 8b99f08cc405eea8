// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — 1-D Solver Handler
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-grid-point composition of the operators into the residual and the
//! block-sparse Jacobian consumed by the external stiff integrator.
//!
//! Everything at or above the surface index and the rightmost cell are
//! reservoir rows with identity dynamics. The two Jacobian passes fill
//! exactly the `ofill ∪ dfill` pattern assembled at construction.

use ndarray::Array2;

use psi_types::config::SimulationConfig;
use psi_types::equal_within;
use psi_types::error::PsiResult;
use psi_types::grid::DepthGrid;

use psi_network::network::ReactionNetwork;
use psi_network::species::{ReactantType, Species};

use crate::advection::AdvectionHandler;
use crate::diffusion::DiffusionHandler;
use crate::flux::FluxHandler;
use crate::jacobian::{FillPattern, SparseJacobian};
use crate::temperature::TemperatureModel;
use crate::trap_mutation::{Material, TrapMutationHandler};

pub struct SolverHandler1D {
    network: ReactionNetwork,
    grid: DepthGrid,
    diffusion: DiffusionHandler,
    advection: AdvectionHandler,
    flux: FluxHandler,
    temperature: TemperatureModel,
    mutation: TrapMutationHandler,
    ofill: FillPattern,
    dfill: FillPattern,
    last_temperature: f64,
    initial_v_conc: f64,
    // Scratch rows reused across grid points.
    row_mid: Vec<f64>,
    row_left: Vec<f64>,
    row_right: Vec<f64>,
    row_out: Vec<f64>,
    cluster_partials: Vec<f64>,
    diff_vals: Vec<f64>,
    diff_indices: Vec<usize>,
    advec_vals: Vec<f64>,
    advec_indices: Vec<usize>,
    mutation_vals: Vec<f64>,
    mutation_indices: Vec<usize>,
}

impl SolverHandler1D {
    /// Build the grid, the operators, and the block-fill patterns.
    pub fn create_solver_context(
        config: &SimulationConfig,
        network: ReactionNetwork,
    ) -> PsiResult<Self> {
        config.validate()?;
        let grid = DepthGrid::uniform(config.grid.nx, config.grid.hx, config.grid.void_portion)?
            .with_offsets(config.grid.left_offset, config.grid.right_offset);

        let diffusion = DiffusionHandler::new(&network);
        let advection = AdvectionHandler::helium(&network);

        let mut flux = FluxHandler::new(
            config.flux.amplitude,
            config.flux.implantation_depth,
            config.flux.time_profile.clone(),
        );
        flux.initialize(&network, &grid);

        let temperature = TemperatureModel::from_config(&config.temperature, &config.material, &grid)?;

        let mut mutation = TrapMutationHandler::new(Material::from_key(&config.material)?);
        mutation.initialize(&network, &grid);

        let n = network.size();
        let mut ofill = FillPattern::new(n);
        diffusion.initialize_ofill(&mut ofill);
        advection.initialize_ofill(&mut ofill);

        let mut dfill = FillPattern::new(n);
        for row in 0..n {
            for &col in network.connectivity(row) {
                dfill.set(row, col);
            }
        }
        // The trap-mutation stencil stamps (He,He), (HeV,He) and (I,He)
        // entries in the diagonal pass; they must be part of the pattern.
        for (row, col) in mutation.fill_couplings(&network) {
            dfill.set(row, col);
        }

        let n_diff = diffusion.num_diffusing();
        let n_advec = advection.num_advecting();
        let n_helium = network.all_of(ReactantType::He).count();

        Ok(SolverHandler1D {
            row_mid: vec![0.0; n],
            row_left: vec![0.0; n],
            row_right: vec![0.0; n],
            row_out: vec![0.0; n],
            cluster_partials: vec![0.0; n],
            diff_vals: vec![0.0; 3 * n_diff],
            diff_indices: vec![0; n_diff],
            advec_vals: vec![0.0; 2 * n_advec],
            advec_indices: vec![0; n_advec],
            mutation_vals: vec![0.0; 3 * n_helium],
            mutation_indices: vec![0; 3 * n_helium],
            network,
            grid,
            diffusion,
            advection,
            flux,
            temperature,
            mutation,
            ofill,
            dfill,
            last_temperature: 0.0,
            initial_v_conc: config.surface.initial_v_conc,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn network(&self) -> &ReactionNetwork {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut ReactionNetwork {
        &mut self.network
    }

    pub fn grid(&self) -> &DepthGrid {
        &self.grid
    }

    pub fn surface_position(&self) -> usize {
        self.grid.surface_position()
    }

    /// Move the surface index and rebuild every depth-indexed operator.
    pub fn set_surface_position(&mut self, pos: usize) {
        self.grid.set_surface_position(pos);
        self.flux.initialize(&self.network, &self.grid);
        self.mutation.initialize(&self.network, &self.grid);
    }

    pub fn flux_handler(&self) -> &FluxHandler {
        &self.flux
    }

    pub fn flux_handler_mut(&mut self) -> &mut FluxHandler {
        &mut self.flux
    }

    pub fn ofill(&self) -> &FillPattern {
        &self.ofill
    }

    pub fn dfill(&self) -> &FillPattern {
        &self.dfill
    }

    /// Advance the diffusive temperature field (no-op otherwise).
    pub fn advance_temperature(&mut self, dt: f64) {
        self.temperature.advance(dt);
    }

    /// Temperature at a grid point, for the profile and export monitors.
    pub fn temperature_at(&self, xi: usize, time: f64) -> f64 {
        self.temperature.temperature(self.grid.position(xi), time)
    }

    // ── Integrator callbacks ─────────────────────────────────────────

    /// Zero the slab and seed the initial vacancy population strictly
    /// between the surface and the bottom boundary.
    pub fn initialize_concentration(&self, conc: &mut Array2<f64>) {
        conc.fill(0.0);
        if self.initial_v_conc <= 0.0 {
            return;
        }
        let Some(v1) = self.network.get(Species::V, 1) else {
            return;
        };
        let last = self.grid.len() - 1;
        for xi in (self.grid.surface_position() + 1)..last {
            conc[[xi, v1.id]] = self.initial_v_conc;
        }
    }

    /// Overwrite from checkpointed sparse rows, one `(id, value)` list per
    /// grid point.
    pub fn apply_checkpoint(&self, conc: &mut Array2<f64>, rows: &[Vec<(usize, f64)>]) {
        for (xi, pairs) in rows.iter().enumerate().take(conc.nrows()) {
            for &(id, value) in pairs {
                if id < conc.ncols() {
                    conc[[xi, id]] = value;
                }
            }
        }
    }

    /// The residual loop over the locally owned points `[xs, xs+xm)`.
    pub fn update_concentration(
        &mut self,
        conc: &Array2<f64>,
        residual: &mut Array2<f64>,
        time: f64,
        xs: usize,
        xm: usize,
    ) {
        let n = self.network.size();
        for xi in xs..xs + xm {
            // Reservoir rows keep identity dynamics.
            if self.grid.is_boundary(xi) {
                for k in 0..n {
                    residual[[xi, k]] = conc[[xi, k]];
                }
                continue;
            }

            let t = self.temperature.temperature(self.grid.position(xi), time);
            if !equal_within(t, self.last_temperature) {
                self.network.set_temperature(t);
                self.mutation.update_trap_mutation_rate(&self.network);
                self.last_temperature = t;
            }

            for k in 0..n {
                self.row_mid[k] = conc[[xi, k]];
                self.row_left[k] = conc[[xi - 1, k]];
                self.row_right[k] = conc[[xi + 1, k]];
            }
            self.row_out.fill(0.0);

            self.network.update_concentrations_from_array(&self.row_mid);

            if let Some(target) = self.flux.target_id() {
                self.row_out[target] += self.flux.incident_flux(time, xi);
            }

            let h_left = self.grid.h_left(xi);
            let h_right = self.grid.h_right(xi);
            self.diffusion.compute_diffusion(
                &self.network,
                [&self.row_mid, &self.row_left, &self.row_right],
                &mut self.row_out,
                h_left,
                h_right,
            );
            self.advection.compute_advection(
                &self.network,
                [&self.row_mid, &self.row_right],
                &mut self.row_out,
                h_right,
                self.grid.distance_from_surface(xi),
            );
            self.mutation
                .compute_trap_mutation(xi, &self.row_mid, &mut self.row_out);

            for row in 0..n {
                self.row_out[row] += self.network.total_flux(row);
            }

            for k in 0..n {
                residual[[xi, k]] = self.row_out[k];
            }
        }
    }

    /// Spatial (diffusion + advection) Jacobian contributions.
    pub fn compute_off_diagonal_jacobian(
        &mut self,
        jacobian: &mut SparseJacobian,
        xs: usize,
        xm: usize,
    ) {
        for xi in xs..xs + xm {
            if self.grid.is_boundary(xi) {
                continue;
            }
            let h_left = self.grid.h_left(xi);
            let h_right = self.grid.h_right(xi);

            self.diffusion.partials_for_diffusion(
                &self.network,
                &mut self.diff_vals,
                &mut self.diff_indices,
                h_left,
                h_right,
            );
            for (i, &id) in self.diff_indices.iter().enumerate() {
                jacobian.add(xi, id, xi, id, self.diff_vals[3 * i]);
                jacobian.add(xi, id, xi - 1, id, self.diff_vals[3 * i + 1]);
                jacobian.add(xi, id, xi + 1, id, self.diff_vals[3 * i + 2]);
            }

            self.advection.partials_for_advection(
                &self.network,
                &mut self.advec_vals,
                &mut self.advec_indices,
                h_right,
                self.grid.distance_from_surface(xi),
            );
            for (i, &id) in self.advec_indices.iter().enumerate() {
                jacobian.add(xi, id, xi, id, self.advec_vals[2 * i]);
                jacobian.add(xi, id, xi + 1, id, self.advec_vals[2 * i + 1]);
            }
        }
    }

    /// Reaction and trap-mutation Jacobian contributions. Only the columns
    /// listed in the diagonal fill are read from the partial buffer; the
    /// read entries are reset so the buffer stays zero between rows.
    pub fn compute_diagonal_jacobian(
        &mut self,
        conc: &Array2<f64>,
        jacobian: &mut SparseJacobian,
        xs: usize,
        xm: usize,
    ) {
        let n = self.network.size();
        for xi in xs..xs + xm {
            if self.grid.is_boundary(xi) {
                continue;
            }
            for k in 0..n {
                self.row_mid[k] = conc[[xi, k]];
            }
            self.network.update_concentrations_from_array(&self.row_mid);

            for row in 0..n {
                self.network
                    .partial_derivatives(row, &mut self.cluster_partials);
                for &col in self.dfill.row(row) {
                    jacobian.add(xi, row, xi, col, self.cluster_partials[col]);
                    self.cluster_partials[col] = 0.0;
                }
            }

            let n_mutating = self.mutation.partials_for_trap_mutation(
                &mut self.mutation_vals,
                &mut self.mutation_indices,
                xi,
            );
            for i in 0..n_mutating {
                let he_col = self.mutation_indices[3 * i];
                for k in 0..3 {
                    let row = self.mutation_indices[3 * i + k];
                    jacobian.add(xi, row, xi, he_col, self.mutation_vals[3 * i + k]);
                }
            }
        }
    }
}
