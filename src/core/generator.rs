use log::warn;
use rand::Rng;

use crate::config::NucleusConfig;
use crate::core::nucleus::{Nucleus, Species};
use crate::core::profile::{RadialProfile, RadialShape};
use crate::error::{Error, Result};

/// Places the nucleons of one nucleus from a tabulated radial profile.
///
/// Placement is sequential: each nucleon draws a spherical position from the
/// profile, optionally retries while it violates the hard-core exclusion
/// against the nucleons already placed, and the whole nucleus is recentered
/// on its target x-offset afterwards. Species are assigned by placement
/// order: the first Z nucleons are protons.
#[derive(Debug)]
pub struct NucleusGenerator {
    profile: RadialProfile,
    use_recentering: bool,
    use_exclusion: bool,
    exclusion_radius_sq: f64,
    max_retries: u32,
}

impl NucleusGenerator {
    /// Build the generator, tabulating the radial profile.
    pub fn new(config: &NucleusConfig) -> Result<Self> {
        let shape =
            RadialShape::from_parameters(config.kind, config.par_a, config.par_b, config.par_c)?;
        let profile = RadialProfile::new(
            shape,
            config.n_radius_bins,
            config.min_radius,
            config.max_radius,
        )?;
        if config.use_nucleon_exclusion {
            if !config.exclusion_radius.is_finite() || config.exclusion_radius <= 0.0 {
                return Err(Error::InvalidConfig(
                    "exclusion radius must be finite and > 0 when exclusion is enabled".into(),
                ));
            }
            if config.max_placement_retries == 0 {
                return Err(Error::InvalidConfig(
                    "placement retry budget must be > 0 when exclusion is enabled".into(),
                ));
            }
            if config.exclusion_radius > config.max_radius {
                warn!(
                    "exclusion radius {} fm exceeds the profile range {} fm; placement will likely exhaust its retry budget",
                    config.exclusion_radius, config.max_radius
                );
            }
        }
        Ok(Self {
            profile,
            use_recentering: config.use_recentering,
            use_exclusion: config.use_nucleon_exclusion,
            exclusion_radius_sq: config.exclusion_radius * config.exclusion_radius,
            max_retries: config.max_placement_retries,
        })
    }

    /// The tabulated radial profile.
    pub fn profile(&self) -> &RadialProfile {
        &self.profile
    }

    /// Fill `nucleus` with freshly placed nucleons, centered at
    /// (`x_shift`, 0, 0).
    ///
    /// The nucleus is mutated in place; its nucleon count is fixed by
    /// construction. The caller resets per-event state beforehand.
    ///
    /// Errors with `SamplingExhausted` when one nucleon is rejected
    /// `max_placement_retries` times in a row by the exclusion constraint;
    /// the counter restarts for every accepted placement.
    pub fn generate<R: Rng>(
        &self,
        nucleus: &mut Nucleus,
        x_shift: f64,
        rng: &mut R,
    ) -> Result<()> {
        let n_nucleons = nucleus.n_nucleons();
        let n_protons = nucleus.n_protons();
        let mut com = [0.0_f64; 3];
        let mut placed = 0usize;
        let mut rejections = 0u32;
        while placed < n_nucleons {
            let (r, cos_theta, phi) = self.profile.sample(rng);
            let (earlier, rest) = nucleus.nucleons.split_at_mut(placed);
            let candidate = &mut rest[0];
            candidate.set_r_cos_theta_phi(r, cos_theta, phi, 0.0);

            if self.use_exclusion
                && earlier
                    .iter()
                    .any(|other| candidate.distance_xyz_sq(other) < self.exclusion_radius_sq)
            {
                rejections += 1;
                if rejections >= self.max_retries {
                    return Err(Error::SamplingExhausted {
                        nucleon: placed,
                        attempts: rejections,
                    });
                }
                continue;
            }
            rejections = 0;

            candidate.species = if placed < n_protons {
                Species::Proton
            } else {
                Species::Neutron
            };
            for (c, rk) in com.iter_mut().zip(candidate.r.iter()) {
                *c += rk;
            }
            placed += 1;
        }

        // Recenter on the target x-offset, or translate only when the
        // center-of-mass correction is disabled.
        let inv = 1.0 / n_nucleons as f64;
        let shift = if self.use_recentering {
            [x_shift - com[0] * inv, -com[1] * inv, -com[2] * inv, 0.0]
        } else {
            [x_shift, 0.0, 0.0, 0.0]
        };
        for nucleon in &mut nucleus.nucleons {
            nucleon.shift(shift);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RadialKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn oxygen_config() -> NucleusConfig {
        NucleusConfig {
            n_protons: 8,
            n_nucleons: 16,
            kind: RadialKind::WoodsSaxon,
            par_a: 2.6,
            par_b: 0.45,
            ..NucleusConfig::default()
        }
    }

    #[test]
    fn species_follow_placement_order() -> Result<()> {
        let generator = NucleusGenerator::new(&oxygen_config())?;
        let mut nucleus = Nucleus::new(8, 16)?;
        let mut rng = StdRng::seed_from_u64(11);
        generator.generate(&mut nucleus, 0.0, &mut rng)?;
        for (i, nucleon) in nucleus.nucleons.iter().enumerate() {
            let expected = if i < 8 {
                Species::Proton
            } else {
                Species::Neutron
            };
            assert_eq!(nucleon.species, expected);
        }
        Ok(())
    }

    #[test]
    fn recentering_lands_on_the_target_offset() -> Result<()> {
        let generator = NucleusGenerator::new(&oxygen_config())?;
        let mut nucleus = Nucleus::new(8, 16)?;
        let mut rng = StdRng::seed_from_u64(23);
        generator.generate(&mut nucleus, -3.5, &mut rng)?;
        let n = nucleus.n_nucleons() as f64;
        let mut com = [0.0_f64; 3];
        for nucleon in &nucleus.nucleons {
            for (c, rk) in com.iter_mut().zip(nucleon.r.iter()) {
                *c += rk / n;
            }
        }
        assert!((com[0] + 3.5).abs() < 1e-9);
        assert!(com[1].abs() < 1e-9);
        assert!(com[2].abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn disabled_recentering_still_translates() -> Result<()> {
        let config = NucleusConfig {
            use_recentering: false,
            n_protons: 1,
            n_nucleons: 1,
            ..oxygen_config()
        };
        let generator = NucleusGenerator::new(&config)?;
        let mut nucleus = Nucleus::new(1, 1)?;

        // Same seed with and without the translation isolates the shift.
        let mut rng = StdRng::seed_from_u64(5);
        generator.generate(&mut nucleus, 0.0, &mut rng)?;
        let untranslated = nucleus.nucleons[0].r;

        nucleus.reset();
        let mut rng = StdRng::seed_from_u64(5);
        generator.generate(&mut nucleus, 4.0, &mut rng)?;
        let translated = nucleus.nucleons[0].r;

        assert!((translated[0] - untranslated[0] - 4.0).abs() < 1e-12);
        assert!((translated[1] - untranslated[1]).abs() < 1e-12);
        assert!((translated[2] - untranslated[2]).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn exclusion_keeps_nucleons_apart() -> Result<()> {
        let config = NucleusConfig {
            use_nucleon_exclusion: true,
            exclusion_radius: 0.8,
            ..oxygen_config()
        };
        let generator = NucleusGenerator::new(&config)?;
        let mut nucleus = Nucleus::new(8, 16)?;
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            nucleus.reset();
            generator.generate(&mut nucleus, 0.0, &mut rng)?;
            for i in 0..nucleus.n_nucleons() {
                for j in 0..i {
                    let dsq = nucleus.nucleons[i].distance_xyz_sq(&nucleus.nucleons[j]);
                    assert!(
                        dsq >= 0.8 * 0.8 - 1e-9,
                        "pair ({i}, {j}) at distance {} fm",
                        dsq.sqrt()
                    );
                }
            }
        }
        Ok(())
    }

    #[test]
    fn infeasible_exclusion_exhausts_the_budget() -> Result<()> {
        // Two nucleons forced into a sphere much smaller than their exclusion
        // distance cannot both be placed.
        let config = NucleusConfig {
            n_protons: 1,
            n_nucleons: 2,
            kind: RadialKind::Uniform,
            par_a: 0.001,
            par_b: 0.0,
            par_c: 0.0,
            min_radius: 0.0,
            max_radius: 0.1,
            use_nucleon_exclusion: true,
            exclusion_radius: 5.0,
            max_placement_retries: 50,
            ..NucleusConfig::default()
        };
        let generator = NucleusGenerator::new(&config)?;
        let mut nucleus = Nucleus::new(1, 2)?;
        let mut rng = StdRng::seed_from_u64(3);
        match generator.generate(&mut nucleus, 0.0, &mut rng) {
            Err(Error::SamplingExhausted { nucleon, attempts }) => {
                assert_eq!(nucleon, 1);
                assert_eq!(attempts, 50);
            }
            other => panic!("expected SamplingExhausted, got {other:?}"),
        }
        Ok(())
    }
}
