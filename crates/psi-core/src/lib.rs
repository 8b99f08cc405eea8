// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — PSI Core Operators
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Spatial operators and the 1-D assembly driver.
//!
//! Diffusion, advection, incident flux, temperature and trap-mutation feed
//! the per-grid-point residual; the driver owns the block-fill patterns the
//! external stiff integrator consumes.

pub mod advection;
pub mod diffusion;
pub mod flux;
pub mod handler;
pub mod jacobian;
pub mod temperature;
pub mod trap_mutation;
