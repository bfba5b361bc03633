use crate::config::StatsConfig;
use crate::core::engine::{CollisionEvent, EventProperties};
use crate::error::{Error, Result};

/// Weighted count histogram over a fixed 1-D range.
///
/// Entries outside the range are dropped.
#[derive(Debug, Clone)]
pub struct Histogram1d {
    n_bins: usize,
    min: f64,
    width: f64,
    counts: Vec<f64>,
}

impl Histogram1d {
    pub fn new(n_bins: usize, min: f64, max: f64) -> Result<Self> {
        if n_bins == 0 || !min.is_finite() || !max.is_finite() || max <= min {
            return Err(Error::InvalidConfig(format!(
                "histogram range [{min}, {max}] with {n_bins} bins is invalid"
            )));
        }
        Ok(Self {
            n_bins,
            min,
            width: (max - min) / n_bins as f64,
            counts: vec![0.0; n_bins],
        })
    }

    #[inline]
    fn bin_index(&self, x: f64) -> Option<usize> {
        if !x.is_finite() || x < self.min {
            return None;
        }
        let i = ((x - self.min) / self.width) as usize;
        (i < self.n_bins).then_some(i)
    }

    /// Add `weight` to the bin containing `x`.
    pub fn fill(&mut self, x: f64, weight: f64) {
        if let Some(i) = self.bin_index(x) {
            self.counts[i] += weight;
        }
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    pub fn bin_centers(&self) -> Vec<f64> {
        (0..self.n_bins)
            .map(|i| self.min + (i as f64 + 0.5) * self.width)
            .collect()
    }

    /// Sum of all bin contents.
    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }
}

/// Weighted count histogram over a fixed 2-D range, row-major in x.
#[derive(Debug, Clone)]
pub struct Histogram2d {
    n_bins_x: usize,
    n_bins_y: usize,
    x_min: f64,
    y_min: f64,
    x_width: f64,
    y_width: f64,
    counts: Vec<f64>,
}

impl Histogram2d {
    pub fn new(
        n_bins_x: usize,
        x_min: f64,
        x_max: f64,
        n_bins_y: usize,
        y_min: f64,
        y_max: f64,
    ) -> Result<Self> {
        if n_bins_x == 0 || n_bins_y == 0 || x_max <= x_min || y_max <= y_min {
            return Err(Error::InvalidConfig(
                "2-D histogram needs a non-empty binning on both axes".into(),
            ));
        }
        Ok(Self {
            n_bins_x,
            n_bins_y,
            x_min,
            y_min,
            x_width: (x_max - x_min) / n_bins_x as f64,
            y_width: (y_max - y_min) / n_bins_y as f64,
            counts: vec![0.0; n_bins_x * n_bins_y],
        })
    }

    pub fn fill(&mut self, x: f64, y: f64, weight: f64) {
        if !x.is_finite() || !y.is_finite() || x < self.x_min || y < self.y_min {
            return;
        }
        let ix = ((x - self.x_min) / self.x_width) as usize;
        let iy = ((y - self.y_min) / self.y_width) as usize;
        if ix < self.n_bins_x && iy < self.n_bins_y {
            self.counts[ix * self.n_bins_y + iy] += weight;
        }
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.n_bins_x, self.n_bins_y)
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }
}

/// Two-moment accumulator of an observable against a binned independent
/// variable: per bin, the sum of weights, the weighted sum of the observable
/// and of its square.
///
/// The derived fluctuation quantities (rms, scaled variance, reduced second
/// factorial cumulant) are recomputed from these sums at finalization; they
/// are never accumulated independently.
#[derive(Debug, Clone)]
pub struct BinnedMoments {
    n_bins: usize,
    min: f64,
    width: f64,
    sum_w: Vec<f64>,
    sum_wx: Vec<f64>,
    sum_wx2: Vec<f64>,
}

/// Finalized per-bin quantities of one [`BinnedMoments`] accumulator.
#[derive(Debug, Clone)]
pub struct MomentsDerived {
    pub bin_centers: Vec<f64>,
    pub mean: Vec<f64>,
    pub rms: Vec<f64>,
    pub omega: Vec<f64>,
    pub r2: Vec<f64>,
}

impl BinnedMoments {
    pub fn new(n_bins: usize, min: f64, max: f64) -> Result<Self> {
        if n_bins == 0 || !min.is_finite() || !max.is_finite() || max <= min {
            return Err(Error::InvalidConfig(format!(
                "moment accumulator range [{min}, {max}] with {n_bins} bins is invalid"
            )));
        }
        Ok(Self {
            n_bins,
            min,
            width: (max - min) / n_bins as f64,
            sum_w: vec![0.0; n_bins],
            sum_wx: vec![0.0; n_bins],
            sum_wx2: vec![0.0; n_bins],
        })
    }

    #[inline]
    fn bin_index(&self, v: f64) -> Option<usize> {
        if !v.is_finite() || v < self.min {
            return None;
        }
        let i = ((v - self.min) / self.width) as usize;
        (i < self.n_bins).then_some(i)
    }

    /// Accumulate observable `x` with `weight` into the bin of the
    /// independent variable `v`.
    pub fn fill(&mut self, v: f64, x: f64, weight: f64) {
        if let Some(i) = self.bin_index(v) {
            self.sum_w[i] += weight;
            self.sum_wx[i] += weight * x;
            self.sum_wx2[i] += weight * x * x;
        }
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Mean of the observable in bin `i`; 0 for an empty bin.
    pub fn mean(&self, i: usize) -> f64 {
        if self.sum_w[i] > 0.0 {
            self.sum_wx[i] / self.sum_w[i]
        } else {
            0.0
        }
    }

    /// Mean of the squared observable in bin `i`; 0 for an empty bin.
    pub fn mean_sq(&self, i: usize) -> f64 {
        if self.sum_w[i] > 0.0 {
            self.sum_wx2[i] / self.sum_w[i]
        } else {
            0.0
        }
    }

    /// Finalize the accumulated moments into per-bin mean, rms, scaled
    /// variance omega and reduced second factorial cumulant R2.
    ///
    /// A bin whose mean is not positive yields 0 for all three fluctuation
    /// quantities; that underflow is expected for sparsely populated bins and
    /// is not an error.
    pub fn derived(&self) -> MomentsDerived {
        let mut out = MomentsDerived {
            bin_centers: Vec::with_capacity(self.n_bins),
            mean: Vec::with_capacity(self.n_bins),
            rms: Vec::with_capacity(self.n_bins),
            omega: Vec::with_capacity(self.n_bins),
            r2: Vec::with_capacity(self.n_bins),
        };
        for i in 0..self.n_bins {
            let v = self.mean(i);
            let v2 = self.mean_sq(i);
            let rms = (v2 - v * v).max(0.0).sqrt();
            let (omega, r2) = if v > 0.0 {
                (rms * rms / v, (v2 - v) / (v * v) - 1.0)
            } else {
                (0.0, 0.0)
            };
            out.bin_centers.push(self.min + (i as f64 + 0.5) * self.width);
            out.mean.push(v);
            out.rms.push(rms);
            out.omega.push(omega);
            out.r2.push(r2);
        }
        out
    }
}

/// Run-level statistics of the collision geometry.
///
/// Mirrors the observable grid of the analysis: each dependent quantity in
/// {nPart, nBinary, b} accumulated against each independent axis in
/// {b, nPart, nBinary, fractional cross-section}, plus event counters,
/// spectra and transverse-plane occupancy maps.
#[derive(Debug)]
pub struct GeometryStatistics {
    /// All generated events, keyed by impact parameter (fill + no_fill).
    pub processed_vs_b: Histogram1d,
    /// Accepted events only.
    pub accepted_vs_b: Histogram1d,
    pub n_part_spectrum: Histogram1d,
    pub n_binary_spectrum: Histogram1d,

    pub n_part_vs_b: BinnedMoments,
    pub n_binary_vs_b: BinnedMoments,
    pub n_binary_vs_n_part: BinnedMoments,
    pub b_vs_n_part: BinnedMoments,
    pub n_part_vs_n_binary: BinnedMoments,
    pub b_vs_n_binary: BinnedMoments,
    pub n_part_vs_xsect: BinnedMoments,
    pub n_binary_vs_xsect: BinnedMoments,
    pub b_vs_xsect: BinnedMoments,

    pub xy_nucleons: Histogram2d,
    pub xy_interactions: Histogram2d,
}

/// Finalized fluctuation quantities for every moment family.
#[derive(Debug)]
pub struct GeometryDerived {
    pub n_part_vs_b: MomentsDerived,
    pub n_binary_vs_b: MomentsDerived,
    pub n_binary_vs_n_part: MomentsDerived,
    pub b_vs_n_part: MomentsDerived,
    pub n_part_vs_n_binary: MomentsDerived,
    pub b_vs_n_binary: MomentsDerived,
    pub n_part_vs_xsect: MomentsDerived,
    pub n_binary_vs_xsect: MomentsDerived,
    pub b_vs_xsect: MomentsDerived,
}

impl GeometryStatistics {
    pub fn new(config: &StatsConfig) -> Result<Self> {
        let b = (config.n_bins_b, config.min_b, config.max_b);
        let np = (config.n_bins_n_part, config.min_n_part, config.max_n_part);
        let nb = (
            config.n_bins_n_binary,
            config.min_n_binary,
            config.max_n_binary,
        );
        let xs = (config.n_bins_xsect, config.min_xsect, config.max_xsect);
        Ok(Self {
            processed_vs_b: Histogram1d::new(b.0, b.1, b.2)?,
            accepted_vs_b: Histogram1d::new(b.0, b.1, b.2)?,
            n_part_spectrum: Histogram1d::new(np.0, np.1, np.2)?,
            n_binary_spectrum: Histogram1d::new(nb.0, nb.1, nb.2)?,
            n_part_vs_b: BinnedMoments::new(b.0, b.1, b.2)?,
            n_binary_vs_b: BinnedMoments::new(b.0, b.1, b.2)?,
            n_binary_vs_n_part: BinnedMoments::new(np.0, np.1, np.2)?,
            b_vs_n_part: BinnedMoments::new(np.0, np.1, np.2)?,
            n_part_vs_n_binary: BinnedMoments::new(nb.0, nb.1, nb.2)?,
            b_vs_n_binary: BinnedMoments::new(nb.0, nb.1, nb.2)?,
            n_part_vs_xsect: BinnedMoments::new(xs.0, xs.1, xs.2)?,
            n_binary_vs_xsect: BinnedMoments::new(xs.0, xs.1, xs.2)?,
            b_vs_xsect: BinnedMoments::new(xs.0, xs.1, xs.2)?,
            xy_nucleons: Histogram2d::new(
                config.n_bins_xy,
                -config.max_xy,
                config.max_xy,
                config.n_bins_xy,
                -config.max_xy,
                config.max_xy,
            )?,
            xy_interactions: Histogram2d::new(
                config.n_bins_xy,
                -config.max_xy,
                config.max_xy,
                config.n_bins_xy,
                -config.max_xy,
                config.max_xy,
            )?,
        })
    }

    /// Accumulate an accepted event.
    pub fn fill(&mut self, event: &CollisionEvent, weight: f64) {
        let props = &event.properties;
        let b = props.impact_parameter;
        let n_part = props.n_participants_total as f64;
        let n_binary = props.n_binary_total as f64;

        self.processed_vs_b.fill(b, weight);
        self.accepted_vs_b.fill(b, weight);
        self.n_part_spectrum.fill(n_part, weight);
        self.n_binary_spectrum.fill(n_binary, weight);

        self.n_part_vs_b.fill(b, n_part, weight);
        self.n_binary_vs_b.fill(b, n_binary, weight);
        self.n_binary_vs_n_part.fill(n_part, n_binary, weight);
        self.b_vs_n_part.fill(n_part, b, weight);
        self.n_part_vs_n_binary.fill(n_binary, n_part, weight);
        self.b_vs_n_binary.fill(n_binary, b, weight);

        // The cross-section axes wait for a downstream task to populate the
        // placeholder.
        if let Some(xsect) = props.fractional_cross_section {
            self.n_part_vs_xsect.fill(xsect, n_part, weight);
            self.n_binary_vs_xsect.fill(xsect, n_binary, weight);
            self.b_vs_xsect.fill(xsect, b, weight);
        }

        for nucleon in event
            .nucleus_a
            .nucleons
            .iter()
            .chain(event.nucleus_b.nucleons.iter())
        {
            self.xy_nucleons.fill(nucleon.r[0], nucleon.r[1], weight);
        }
        for interaction in &event.interactions {
            self.xy_interactions
                .fill(interaction.r[0], interaction.r[1], weight);
        }
    }

    /// Record a generated-but-rejected event: only the processed counter
    /// moves, so downstream normalization keeps the correct denominator.
    pub fn no_fill(&mut self, props: &EventProperties, weight: f64) {
        self.processed_vs_b.fill(props.impact_parameter, weight);
    }

    /// Recompute every derived fluctuation quantity from the accumulated
    /// two moments.
    pub fn derived(&self) -> GeometryDerived {
        GeometryDerived {
            n_part_vs_b: self.n_part_vs_b.derived(),
            n_binary_vs_b: self.n_binary_vs_b.derived(),
            n_binary_vs_n_part: self.n_binary_vs_n_part.derived(),
            b_vs_n_part: self.b_vs_n_part.derived(),
            n_part_vs_n_binary: self.n_part_vs_n_binary.derived(),
            b_vs_n_binary: self.b_vs_n_binary.derived(),
            n_part_vs_xsect: self.n_part_vs_xsect.derived(),
            n_binary_vs_xsect: self.n_binary_vs_xsect.derived(),
            b_vs_xsect: self.b_vs_xsect.derived(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_drops_out_of_range_entries() -> Result<()> {
        let mut h = Histogram1d::new(10, 0.0, 10.0)?;
        h.fill(-0.5, 1.0);
        h.fill(10.0, 1.0);
        h.fill(f64::NAN, 1.0);
        assert_eq!(h.total(), 0.0);
        h.fill(0.0, 1.0);
        h.fill(9.999, 2.0);
        assert_eq!(h.counts()[0], 1.0);
        assert_eq!(h.counts()[9], 2.0);
        Ok(())
    }

    #[test]
    fn moments_mean_and_mean_sq() -> Result<()> {
        let mut m = BinnedMoments::new(1, 0.0, 1.0)?;
        m.fill(0.5, 3.0, 1.0);
        m.fill(0.5, 7.0, 1.0);
        assert!((m.mean(0) - 5.0).abs() < 1e-12);
        assert!((m.mean_sq(0) - 29.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn derived_worked_example() -> Result<()> {
        // Two entries engineered so that v = 5 and v2 = 30:
        // x = 5 -+ sqrt(5).
        let mut m = BinnedMoments::new(1, 0.0, 1.0)?;
        let s = 5.0_f64.sqrt();
        m.fill(0.5, 5.0 - s, 1.0);
        m.fill(0.5, 5.0 + s, 1.0);
        let d = m.derived();
        assert!((d.mean[0] - 5.0).abs() < 1e-12);
        assert!((d.rms[0] - s).abs() < 1e-12);
        assert!((d.omega[0] - 1.0).abs() < 1e-12);
        assert!(d.r2[0].abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn derived_underflow_yields_zeros() -> Result<()> {
        let m = BinnedMoments::new(4, 0.0, 4.0)?;
        let d = m.derived();
        for i in 0..4 {
            assert_eq!(d.mean[i], 0.0);
            assert_eq!(d.rms[i], 0.0);
            assert_eq!(d.omega[i], 0.0);
            assert_eq!(d.r2[i], 0.0);
        }
        Ok(())
    }

    #[test]
    fn negative_mean_bin_also_yields_zero_omega_and_r2() -> Result<()> {
        let mut m = BinnedMoments::new(1, 0.0, 1.0)?;
        m.fill(0.5, -2.0, 1.0);
        let d = m.derived();
        assert!((d.mean[0] + 2.0).abs() < 1e-12);
        assert_eq!(d.omega[0], 0.0);
        assert_eq!(d.r2[0], 0.0);
        Ok(())
    }

    #[test]
    fn no_fill_touches_only_the_processed_counter() -> Result<()> {
        let mut stats = GeometryStatistics::new(&StatsConfig::default())?;
        let props = EventProperties {
            impact_parameter: 3.0,
            n_participants_total: 10,
            n_binary_total: 12,
            ..EventProperties::default()
        };
        stats.no_fill(&props, 1.0);
        assert_eq!(stats.processed_vs_b.total(), 1.0);
        assert_eq!(stats.accepted_vs_b.total(), 0.0);
        assert_eq!(stats.n_part_spectrum.total(), 0.0);
        assert_eq!(stats.n_binary_spectrum.total(), 0.0);
        Ok(())
    }
}
