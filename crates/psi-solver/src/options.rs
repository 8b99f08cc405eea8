// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Monitor Options
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Monitor selection consumed from pre-parsed command switches. Option
//! tokenization lives with the external driver; this is the surface it
//! feeds. An unknown switch is an initialization error.

use psi_types::error::{PsiError, PsiResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorOptions {
    /// Clamp threshold for tiny negative/positive concentrations.
    pub check_negative: Option<f64>,
    /// Abort floor for the time step.
    pub check_collapse: Option<f64>,
    pub plot_1d: bool,
    pub plot_series: bool,
    pub plot_2d: bool,
    pub plot_perf: bool,
    pub helium_retention: bool,
    pub xenon_retention: bool,
    /// Checkpoint stride in simulated seconds.
    pub start_stop: Option<f64>,
    pub max_cluster_conc: bool,
    pub helium_cumul: bool,
    pub helium_conc: bool,
    pub mean_size: bool,
    pub temp_profile: bool,
    pub tridyn: bool,
    pub alloy: bool,
    /// Append diagnostic text files (surface.txt, bursting.txt, …).
    pub log_files: bool,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        MonitorOptions {
            check_negative: None,
            check_collapse: None,
            plot_1d: false,
            plot_series: false,
            plot_2d: false,
            plot_perf: false,
            helium_retention: false,
            xenon_retention: false,
            start_stop: None,
            max_cluster_conc: false,
            helium_cumul: false,
            helium_conc: false,
            mean_size: false,
            temp_profile: false,
            tridyn: false,
            alloy: false,
            log_files: false,
        }
    }
}

impl MonitorOptions {
    /// Apply one switch, e.g. `("start_stop", Some("2.5"))`. Values are
    /// optional for the switches carrying defaults.
    pub fn apply_switch(&mut self, name: &str, value: Option<&str>) -> PsiResult<()> {
        let parse = |v: Option<&str>, default: f64| -> PsiResult<f64> {
            match v {
                None => Ok(default),
                Some(text) => text.parse::<f64>().map_err(|_| {
                    PsiError::ConfigError(format!("switch {name} expects a number, got {text}"))
                }),
            }
        };
        match name {
            "check_negative" => self.check_negative = Some(parse(value, 1.0e-30)?),
            "check_collapse" => self.check_collapse = Some(parse(value, 1.0e-15)?),
            "plot_1d" => self.plot_1d = true,
            "plot_series" => self.plot_series = true,
            "plot_2d" => self.plot_2d = true,
            "plot_perf" => self.plot_perf = true,
            "helium_retention" => self.helium_retention = true,
            "xenon_retention" => self.xenon_retention = true,
            "start_stop" => self.start_stop = Some(parse(value, 1.0)?),
            "max_cluster_conc" => self.max_cluster_conc = true,
            "helium_cumul" => self.helium_cumul = true,
            "helium_conc" => self.helium_conc = true,
            "mean_size" => self.mean_size = true,
            "temp_profile" => self.temp_profile = true,
            "tridyn" => self.tridyn = true,
            "alloy" => self.alloy = true,
            "log_files" => self.log_files = true,
            other => {
                return Err(PsiError::ConfigError(format!(
                    "unrecognized monitor switch -{other}"
                )))
            }
        }
        Ok(())
    }

    /// Consume a `-name value`-style pre-tokenized list.
    pub fn from_switches(switches: &[(&str, Option<&str>)]) -> PsiResult<Self> {
        let mut options = MonitorOptions::default();
        for (name, value) in switches {
            options.apply_switch(name, *value)?;
        }
        Ok(options)
    }
}
