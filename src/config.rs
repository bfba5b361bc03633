//! Configuration types for the collision-geometry engine.
//!
//! These structs are a thin, `serde`-deserializable description of a run:
//!
//! - [`NucleusConfig`]   – one colliding nucleus (species counts, radial
//!   density family, profile tabulation, placement options)
//! - [`CollisionConfig`] – the two nuclei plus collision-level parameters
//! - [`StatsConfig`]     – binning of the accumulated statistics
//!
//! Defaults describe a Pb-208 Woods-Saxon nucleus and minimum-bias impact
//! parameter sampling. Validation happens where the values are consumed
//! (profile, generator and engine constructors), not here.

use std::str::FromStr;

use serde::Deserialize;

use crate::error::Error;

/// Radial density family used to place nucleons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RadialKind {
    /// Hard sphere: density = 1 while r^3 < parA.
    Uniform,
    /// Woods-Saxon (Fermi) distribution; parA = radius, parB = diffuseness.
    WoodsSaxon,
    /// Exponential falloff with scale parA.
    Exponential,
    /// Gaussian of width parA.
    Gaussian,
    /// Two-component Gaussian; parA/parB widths, parC mixing fraction.
    DoubleGaussian,
}

impl FromStr for RadialKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "uniform" => Ok(RadialKind::Uniform),
            "woods-saxon" => Ok(RadialKind::WoodsSaxon),
            "exponential" => Ok(RadialKind::Exponential),
            "gaussian" => Ok(RadialKind::Gaussian),
            "double-gaussian" => Ok(RadialKind::DoubleGaussian),
            other => Err(Error::InvalidConfig(format!(
                "unknown radial density family '{other}'"
            ))),
        }
    }
}

/// Configuration of one colliding nucleus.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NucleusConfig {
    /// Proton count Z.
    pub n_protons: usize,
    /// Total nucleon count A.
    pub n_nucleons: usize,
    /// Radial density family.
    pub kind: RadialKind,
    /// First shape parameter (meaning depends on the family).
    pub par_a: f64,
    /// Second shape parameter.
    pub par_b: f64,
    /// Third shape parameter.
    pub par_c: f64,
    /// Number of tabulation bins for the radial profile.
    pub n_radius_bins: usize,
    /// Lower edge of the tabulated radius range (fm).
    pub min_radius: f64,
    /// Upper edge of the tabulated radius range (fm).
    pub max_radius: f64,
    /// Recenter the generated nucleus on its target x-offset.
    pub use_recentering: bool,
    /// Enforce a hard-core minimum separation between nucleons.
    pub use_nucleon_exclusion: bool,
    /// Hard-core minimum separation (fm).
    pub exclusion_radius: f64,
    /// Consecutive-rejection budget per nucleon before the placement
    /// is declared infeasible.
    pub max_placement_retries: u32,
}

impl Default for NucleusConfig {
    fn default() -> Self {
        Self {
            n_protons: 82,
            n_nucleons: 208,
            kind: RadialKind::WoodsSaxon,
            par_a: 6.62,
            par_b: 0.546,
            par_c: 0.0,
            n_radius_bins: 100,
            min_radius: 0.0,
            max_radius: 20.0,
            use_recentering: true,
            use_nucleon_exclusion: false,
            exclusion_radius: 0.4,
            max_placement_retries: 200,
        }
    }
}

/// Collision-level configuration: the two nuclei and the geometric
/// interaction parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Projectile nucleus (generated at x = -b/2).
    pub nucleus_a: NucleusConfig,
    /// Target nucleus (generated at x = +b/2).
    pub nucleus_b: NucleusConfig,
    /// Smallest sampled impact parameter (fm).
    pub min_impact_parameter: f64,
    /// Largest sampled impact parameter (fm).
    pub max_impact_parameter: f64,
    /// Nucleon-nucleon cross section (mb); sigma/pi is the squared
    /// transverse-distance collision threshold.
    pub nn_cross_section: f64,
}

impl CollisionConfig {
    /// Symmetric collision of two identical nuclei.
    pub fn symmetric(nucleus: NucleusConfig) -> Self {
        Self {
            nucleus_a: nucleus.clone(),
            nucleus_b: nucleus,
            ..Self::default()
        }
    }
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            nucleus_a: NucleusConfig::default(),
            nucleus_b: NucleusConfig::default(),
            min_impact_parameter: 0.0,
            max_impact_parameter: 20.0,
            nn_cross_section: 40.0,
        }
    }
}

/// Binning of the run-level statistics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub n_bins_b: usize,
    pub min_b: f64,
    pub max_b: f64,
    pub n_bins_n_part: usize,
    pub min_n_part: f64,
    pub max_n_part: f64,
    pub n_bins_n_binary: usize,
    pub min_n_binary: f64,
    pub max_n_binary: f64,
    pub n_bins_xsect: usize,
    pub min_xsect: f64,
    pub max_xsect: f64,
    /// Transverse-plane occupancy maps: bins per axis over [-max_xy, max_xy].
    pub n_bins_xy: usize,
    pub max_xy: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            n_bins_b: 100,
            min_b: 0.0,
            max_b: 20.0,
            n_bins_n_part: 400,
            min_n_part: 0.0,
            max_n_part: 400.0,
            n_bins_n_binary: 1000,
            min_n_binary: 0.0,
            max_n_binary: 1000.0,
            n_bins_xsect: 100,
            min_xsect: 0.0,
            max_xsect: 100.0,
            n_bins_xy: 400,
            max_xy: 20.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radial_kind_parses_known_names() {
        assert_eq!(
            "woods-saxon".parse::<RadialKind>().ok(),
            Some(RadialKind::WoodsSaxon)
        );
        assert_eq!(
            "double-gaussian".parse::<RadialKind>().ok(),
            Some(RadialKind::DoubleGaussian)
        );
    }

    #[test]
    fn radial_kind_rejects_unknown_name() {
        let err = "fermi-dirac".parse::<RadialKind>().unwrap_err();
        assert!(err.to_string().contains("fermi-dirac"));
    }

    #[test]
    fn defaults_describe_lead() {
        let cfg = NucleusConfig::default();
        assert_eq!(cfg.n_protons, 82);
        assert_eq!(cfg.n_nucleons, 208);
        assert_eq!(cfg.kind, RadialKind::WoodsSaxon);
    }

    #[test]
    fn nucleus_config_deserializes_from_json() {
        let cfg: NucleusConfig = serde_json::from_str(
            r#"{"n_protons": 79, "n_nucleons": 197, "kind": "woods-saxon", "par_a": 6.38}"#,
        )
        .unwrap();
        assert_eq!(cfg.n_nucleons, 197);
        assert_eq!(cfg.par_a, 6.38);
        // Unspecified keys fall back to the defaults.
        assert_eq!(cfg.n_radius_bins, 100);
    }
}
