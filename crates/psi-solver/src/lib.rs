// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — PSI Solver Layer
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Event control, monitors, and the checkpoint boundary around the
//! external time integrator.

pub mod checkpoint;
pub mod events;
pub mod monitor;
pub mod options;
