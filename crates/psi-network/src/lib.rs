// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — PSI Network
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Cluster catalogue, composition index and reaction graph.
//!
//! The network is built once from a description, immutable in topology, and
//! mutable only in its temperature-dependent rate state.

pub mod builder;
pub mod cluster;
pub mod grouping;
pub mod network;
pub mod reaction;
pub mod species;
