use std::f64::consts::PI;

use rand::Rng;

use crate::config::RadialKind;
use crate::error::{Error, Result};

/// Parametric radial density family with its shape parameters bound in.
///
/// The concrete variant is selected once at configuration time; per-sample
/// code only ever calls [`RadialShape::density_at`].
#[derive(Debug, Clone, Copy)]
pub enum RadialShape {
    /// Hard sphere: density = 1 while r^3 < `r_cubed`.
    Uniform { r_cubed: f64 },
    /// Woods-Saxon (Fermi): 1 / (1 + exp((r - radius) / diffuseness)).
    WoodsSaxon { radius: f64, diffuseness: f64 },
    /// exp(-r / scale).
    Exponential { scale: f64 },
    /// exp(-r^2 / (2 width^2)).
    Gaussian { width: f64 },
    /// (1 - fraction) exp(-r^2/a^2)/a^3 + fraction exp(-r^2/b^2)/b^3.
    DoubleGaussian {
        width_a: f64,
        width_b: f64,
        fraction: f64,
    },
}

impl RadialShape {
    /// Bind the generic (parA, parB, parC) triplet of a [`RadialKind`] into a
    /// concrete shape, validating the parameters the family actually uses.
    pub fn from_parameters(kind: RadialKind, par_a: f64, par_b: f64, par_c: f64) -> Result<Self> {
        match kind {
            RadialKind::Uniform => {
                if !par_a.is_finite() || par_a <= 0.0 {
                    return Err(Error::InvalidConfig(
                        "uniform family requires parA = R^3 > 0".into(),
                    ));
                }
                Ok(RadialShape::Uniform { r_cubed: par_a })
            }
            RadialKind::WoodsSaxon => {
                if !par_a.is_finite() || par_a <= 0.0 {
                    return Err(Error::InvalidConfig(
                        "woods-saxon radius parA must be > 0".into(),
                    ));
                }
                if !par_b.is_finite() || par_b <= 0.0 {
                    return Err(Error::InvalidConfig(
                        "woods-saxon diffuseness parB must be > 0".into(),
                    ));
                }
                Ok(RadialShape::WoodsSaxon {
                    radius: par_a,
                    diffuseness: par_b,
                })
            }
            RadialKind::Exponential => {
                if !par_a.is_finite() || par_a <= 0.0 {
                    return Err(Error::InvalidConfig(
                        "exponential scale parA must be > 0".into(),
                    ));
                }
                Ok(RadialShape::Exponential { scale: par_a })
            }
            RadialKind::Gaussian => {
                if !par_a.is_finite() || par_a <= 0.0 {
                    return Err(Error::InvalidConfig(
                        "gaussian width parA must be > 0".into(),
                    ));
                }
                Ok(RadialShape::Gaussian { width: par_a })
            }
            RadialKind::DoubleGaussian => {
                if !par_a.is_finite() || par_a <= 0.0 || !par_b.is_finite() || par_b <= 0.0 {
                    return Err(Error::InvalidConfig(
                        "double-gaussian widths parA and parB must be > 0".into(),
                    ));
                }
                if !par_c.is_finite() || !(0.0..=1.0).contains(&par_c) {
                    return Err(Error::InvalidConfig(
                        "double-gaussian fraction parC must lie in [0, 1]".into(),
                    ));
                }
                Ok(RadialShape::DoubleGaussian {
                    width_a: par_a,
                    width_b: par_b,
                    fraction: par_c,
                })
            }
        }
    }

    /// Unnormalized density at radius `r`.
    pub fn density_at(&self, r: f64) -> f64 {
        match *self {
            RadialShape::Uniform { r_cubed } => {
                if r * r * r < r_cubed {
                    1.0
                } else {
                    0.0
                }
            }
            RadialShape::WoodsSaxon {
                radius,
                diffuseness,
            } => 1.0 / (1.0 + ((r - radius) / diffuseness).exp()),
            RadialShape::Exponential { scale } => (-r / scale).exp(),
            RadialShape::Gaussian { width } => (-r * r / (2.0 * width * width)).exp(),
            RadialShape::DoubleGaussian {
                width_a,
                width_b,
                fraction,
            } => {
                let a3 = width_a * width_a * width_a;
                let b3 = width_b * width_b * width_b;
                (1.0 - fraction) * (-r * r / (width_a * width_a)).exp() / a3
                    + fraction * (-r * r / (width_b * width_b)).exp() / b3
            }
        }
    }
}

/// Tabulated radial density and its sampling weight, immutable after
/// construction.
///
/// The density is evaluated at bin midpoints over [`r_min`, `r_max`] in
/// `n_bins` equal steps; the sampling weight is r^2 * density(r), the Jacobian
/// required to draw an isotropic 3-D position from a radial density. Radii
/// are drawn by inverse CDF over the binned weights with linear interpolation
/// inside the selected bin.
#[derive(Debug, Clone)]
pub struct RadialProfile {
    shape: RadialShape,
    n_bins: usize,
    r_min: f64,
    dr: f64,
    density: Vec<f64>,
    weight: Vec<f64>,
    // Running sum of `weight`; last entry is the total.
    cumulative: Vec<f64>,
}

impl RadialProfile {
    /// Tabulate `shape` over [`r_min`, `r_max`] in `n_bins` equal steps.
    ///
    /// Errors with `InvalidConfig` on an empty binning, an inverted radius
    /// range, or a profile whose total sampling weight vanishes (nothing to
    /// draw from).
    pub fn new(shape: RadialShape, n_bins: usize, r_min: f64, r_max: f64) -> Result<Self> {
        if n_bins == 0 {
            return Err(Error::InvalidConfig(
                "radial profile needs at least one bin".into(),
            ));
        }
        if !r_min.is_finite() || !r_max.is_finite() || r_min < 0.0 {
            return Err(Error::InvalidConfig(
                "radius range must be finite and non-negative".into(),
            ));
        }
        if r_max <= r_min {
            return Err(Error::InvalidConfig(format!(
                "maxRadius ({r_max}) must exceed minRadius ({r_min})"
            )));
        }

        let dr = (r_max - r_min) / n_bins as f64;
        let mut density = Vec::with_capacity(n_bins);
        let mut weight = Vec::with_capacity(n_bins);
        let mut cumulative = Vec::with_capacity(n_bins);
        let mut total = 0.0;
        for i in 0..n_bins {
            let r = r_min + (i as f64 + 0.5) * dr;
            let d = shape.density_at(r);
            density.push(d);
            let w = r * r * d;
            weight.push(w);
            total += w;
            cumulative.push(total);
        }
        if total <= 0.0 {
            return Err(Error::InvalidConfig(
                "radial profile has zero total sampling weight over the configured range".into(),
            ));
        }

        Ok(Self {
            shape,
            n_bins,
            r_min,
            dr,
            density,
            weight,
            cumulative,
        })
    }

    /// The shape this profile was tabulated from.
    pub fn shape(&self) -> &RadialShape {
        &self.shape
    }

    /// Number of tabulation bins.
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Midpoint radius of bin `i`.
    #[inline]
    pub fn bin_center(&self, i: usize) -> f64 {
        self.r_min + (i as f64 + 0.5) * self.dr
    }

    /// Tabulated density values at the bin midpoints.
    pub fn density(&self) -> &[f64] {
        &self.density
    }

    /// Tabulated sampling weights r^2 * density(r).
    pub fn weight(&self) -> &[f64] {
        &self.weight
    }

    /// Draw a radius from the tabulated weight by inverse CDF.
    ///
    /// The bin is located by binary search on the cumulative weights, then the
    /// radius is linearly interpolated inside the bin.
    pub fn sample_radius<R: Rng>(&self, rng: &mut R) -> f64 {
        let total = self.cumulative[self.n_bins - 1];
        let u: f64 = rng.random();
        let target = u * total;
        let bin = self.cumulative.partition_point(|&c| c <= target);
        // u < 1 keeps target below the total, but guard the edge anyway.
        let bin = bin.min(self.n_bins - 1);
        let below = if bin == 0 {
            0.0
        } else {
            self.cumulative[bin - 1]
        };
        let w = self.weight[bin];
        let frac = if w > 0.0 {
            ((target - below) / w).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.r_min + (bin as f64 + frac) * self.dr
    }

    /// Draw a full spherical position: radius by inverse CDF, cos(theta)
    /// uniform on [-1, 1], phi uniform on [0, 2*pi).
    ///
    /// The draw order (r, then cos(theta), then phi) is fixed; reordering
    /// would silently change seeded runs.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> (f64, f64, f64) {
        let r = self.sample_radius(rng);
        let cos_theta = -1.0 + 2.0 * rng.random::<f64>();
        let phi = 2.0 * PI * rng.random::<f64>();
        (r, cos_theta, phi)
    }
}
