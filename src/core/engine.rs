use std::f64::consts::PI;

use log::{debug, info};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};

use crate::config::CollisionConfig;
use crate::core::generator::NucleusGenerator;
use crate::core::nucleus::Nucleus;
use crate::error::{Error, Result};

/// One nucleon-nucleon interaction that passed the geometric threshold.
///
/// `index_a` / `index_b` identify the nucleons inside their respective
/// nuclei. The interaction position is the 4-midpoint of the two nucleon
/// positions; this is a deliberate convention, not a property of either
/// nucleon alone.
#[derive(Debug, Clone)]
pub struct Interaction {
    pub index_a: usize,
    pub index_b: usize,
    /// Interaction position (x, y, z, t): midpoint of the two nucleons.
    pub r: [f64; 4],
}

/// Event-level summary filled at the end of every generated event.
///
/// `fractional_cross_section` and `reference_multiplicity` are placeholders
/// owned by downstream analysis tasks; this engine leaves them `None`.
#[derive(Debug, Clone, Default)]
pub struct EventProperties {
    pub impact_parameter: f64,
    pub z_projectile: usize,
    pub a_projectile: usize,
    pub n_part_projectile: usize,
    pub z_target: usize,
    pub a_target: usize,
    pub n_part_target: usize,
    pub n_participants_total: usize,
    pub n_binary_total: usize,
    pub fractional_cross_section: Option<f64>,
    pub reference_multiplicity: Option<f64>,
}

/// Per-event state owned by the engine: the two nuclei, the interaction
/// list, and the event summary. Fully rebuilt by every [`CollisionEngine::execute`].
#[derive(Debug)]
pub struct CollisionEvent {
    pub nucleus_a: Nucleus,
    pub nucleus_b: Nucleus,
    pub interactions: Vec<Interaction>,
    pub properties: EventProperties,
}

/// Glauber Monte Carlo collision-geometry engine.
///
/// Each call to [`execute`](Self::execute) runs one event: sample the impact
/// parameter flat in transverse area, generate both nuclei, run the
/// exhaustive pairwise collision test, and summarize participant and binary
/// collision counts. The engine owns its random stream; the per-event draw
/// order (impact parameter, then nucleus A in placement order, then nucleus
/// B) is a reproducibility contract for seeded runs.
#[derive(Debug)]
pub struct CollisionEngine {
    generator_a: NucleusGenerator,
    generator_b: NucleusGenerator,
    event: CollisionEvent,
    min_b_sq: f64,
    max_b_sq: f64,
    max_nn_distance_sq: f64,
    rng: StdRng,
}

impl CollisionEngine {
    /// Validate the configuration and build both nucleus generators.
    ///
    /// `seed` makes the run reproducible; `None` seeds from entropy.
    pub fn new(config: &CollisionConfig, seed: Option<u64>) -> Result<Self> {
        let min_b = config.min_impact_parameter;
        let max_b = config.max_impact_parameter;
        if !min_b.is_finite() || min_b < 0.0 {
            return Err(Error::InvalidConfig(
                "minImpactParameter must be finite and >= 0".into(),
            ));
        }
        if !max_b.is_finite() || max_b < min_b {
            return Err(Error::InvalidConfig(
                "maxImpactParameter must be finite and >= minImpactParameter".into(),
            ));
        }
        if !config.nn_cross_section.is_finite() || config.nn_cross_section <= 0.0 {
            return Err(Error::InvalidConfig(
                "nnCrossSection must be finite and > 0".into(),
            ));
        }

        let generator_a = NucleusGenerator::new(&config.nucleus_a)?;
        let generator_b = NucleusGenerator::new(&config.nucleus_b)?;
        let nucleus_a = Nucleus::new(config.nucleus_a.n_protons, config.nucleus_a.n_nucleons)?;
        let nucleus_b = Nucleus::new(config.nucleus_b.n_protons, config.nucleus_b.n_nucleons)?;

        let max_nn_distance_sq = config.nn_cross_section / PI;
        info!(
            "collision geometry: sigma_nn = {} mb, max pair distance = {:.4} fm, b in [{}, {}] fm",
            config.nn_cross_section,
            max_nn_distance_sq.sqrt(),
            min_b,
            max_b
        );

        let rng: StdRng = match seed {
            Some(s) => SeedableRng::seed_from_u64(s),
            None => SeedableRng::seed_from_u64(rng().random()),
        };

        Ok(Self {
            generator_a,
            generator_b,
            event: CollisionEvent {
                nucleus_a,
                nucleus_b,
                interactions: Vec::new(),
                properties: EventProperties::default(),
            },
            min_b_sq: min_b * min_b,
            max_b_sq: max_b * max_b,
            max_nn_distance_sq,
            rng,
        })
    }

    /// The most recently generated event.
    pub fn event(&self) -> &CollisionEvent {
        &self.event
    }

    /// The projectile-side nucleus generator.
    pub fn generator_a(&self) -> &NucleusGenerator {
        &self.generator_a
    }

    /// The target-side nucleus generator.
    pub fn generator_b(&self) -> &NucleusGenerator {
        &self.generator_b
    }

    /// Squared transverse-distance collision threshold sigma_nn / pi.
    pub fn max_nn_distance_sq(&self) -> f64 {
        self.max_nn_distance_sq
    }

    /// Generate one event. Re-entrant: all per-event state is rebuilt.
    pub fn execute(&mut self) -> Result<&EventProperties> {
        let event = &mut self.event;
        event.nucleus_a.reset();
        event.nucleus_b.reset();
        event.interactions.clear();

        // b^2 uniform over [minB^2, maxB^2]: flat in transverse area.
        let u: f64 = self.rng.random();
        let b = (self.min_b_sq + u * (self.max_b_sq - self.min_b_sq)).sqrt();

        self.generator_a
            .generate(&mut event.nucleus_a, -0.5 * b, &mut self.rng)?;
        self.generator_b
            .generate(&mut event.nucleus_b, 0.5 * b, &mut self.rng)?;

        // Exhaustive pairwise test on the squared transverse distance. At
        // nucleon counts of a few hundred per side no spatial index is
        // needed.
        for ia in 0..event.nucleus_a.n_nucleons() {
            for ib in 0..event.nucleus_b.n_nucleons() {
                let dsq = event.nucleus_a.nucleons[ia]
                    .distance_xy_sq(&event.nucleus_b.nucleons[ib]);
                if dsq < self.max_nn_distance_sq {
                    let ra = event.nucleus_a.nucleons[ia].r;
                    let rb = event.nucleus_b.nucleons[ib].r;
                    event.interactions.push(Interaction {
                        index_a: ia,
                        index_b: ib,
                        r: [
                            0.5 * (ra[0] + rb[0]),
                            0.5 * (ra[1] + rb[1]),
                            0.5 * (ra[2] + rb[2]),
                            0.5 * (ra[3] + rb[3]),
                        ],
                    });
                    event.nucleus_a.nucleons[ia].wound();
                    event.nucleus_b.nucleons[ib].wound();
                }
            }
        }

        let n_wounded_a = event.nucleus_a.count_wounded();
        let n_wounded_b = event.nucleus_b.count_wounded();
        event.properties = EventProperties {
            impact_parameter: b,
            z_projectile: event.nucleus_a.n_protons(),
            a_projectile: event.nucleus_a.n_nucleons(),
            n_part_projectile: n_wounded_a,
            z_target: event.nucleus_b.n_protons(),
            a_target: event.nucleus_b.n_nucleons(),
            n_part_target: n_wounded_b,
            n_participants_total: n_wounded_a + n_wounded_b,
            n_binary_total: event.interactions.len(),
            fractional_cross_section: None,
            reference_multiplicity: None,
        };
        debug!(
            "event: b = {:.3} fm, nPart = {}, nBinary = {}",
            b,
            event.properties.n_participants_total,
            event.properties.n_binary_total
        );
        Ok(&self.event.properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NucleusConfig, RadialKind};

    fn proton_config() -> NucleusConfig {
        NucleusConfig {
            n_protons: 1,
            n_nucleons: 1,
            kind: RadialKind::Gaussian,
            par_a: 0.8,
            par_b: 0.0,
            par_c: 0.0,
            max_radius: 5.0,
            use_nucleon_exclusion: false,
            ..NucleusConfig::default()
        }
    }

    fn small_collision_config() -> CollisionConfig {
        CollisionConfig {
            nucleus_a: proton_config(),
            nucleus_b: proton_config(),
            min_impact_parameter: 0.0,
            max_impact_parameter: 4.0,
            nn_cross_section: 40.0,
        }
    }

    #[test]
    fn impact_parameter_stays_in_range() -> Result<()> {
        let mut engine = CollisionEngine::new(&small_collision_config(), Some(1))?;
        for _ in 0..500 {
            let props = engine.execute()?;
            assert!((0.0..=4.0).contains(&props.impact_parameter));
        }
        Ok(())
    }

    #[test]
    fn threshold_is_sigma_over_pi() -> Result<()> {
        let engine = CollisionEngine::new(&small_collision_config(), Some(1))?;
        assert!((engine.max_nn_distance_sq() - 40.0 / PI).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn interaction_position_is_the_midpoint() -> Result<()> {
        let mut config = small_collision_config();
        config.max_impact_parameter = 0.0;
        let mut engine = CollisionEngine::new(&config, Some(4))?;
        engine.execute()?;
        let event = engine.event();
        for interaction in &event.interactions {
            let ra = event.nucleus_a.nucleons[interaction.index_a].r;
            let rb = event.nucleus_b.nucleons[interaction.index_b].r;
            for k in 0..4 {
                assert!((interaction.r[k] - 0.5 * (ra[k] + rb[k])).abs() < 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn rejects_inverted_impact_range() {
        let mut config = small_collision_config();
        config.min_impact_parameter = 5.0;
        config.max_impact_parameter = 1.0;
        assert!(CollisionEngine::new(&config, None).is_err());
    }

    #[test]
    fn rejects_nonpositive_cross_section() {
        let mut config = small_collision_config();
        config.nn_cross_section = 0.0;
        assert!(CollisionEngine::new(&config, None).is_err());
    }
}
