use log::info;
use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

pub mod config;
pub mod core;
pub mod error;

use crate::config::{CollisionConfig, NucleusConfig, StatsConfig};
use crate::core::stats::MomentsDerived;
use crate::core::{CollisionEngine, GeometryStatistics, Histogram2d, Nucleus, Species};
use crate::error::Error;

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn nucleus_dict<'py>(py: Python<'py>, nucleus: &Nucleus) -> PyResult<Bound<'py, PyDict>> {
    let n = nucleus.n_nucleons();
    let mut positions = Array2::<f64>::zeros((n, 4));
    let mut is_proton = Vec::with_capacity(n);
    let mut wounded = Vec::with_capacity(n);
    for (i, nucleon) in nucleus.nucleons.iter().enumerate() {
        for k in 0..4 {
            positions[[i, k]] = nucleon.r[k];
        }
        is_proton.push(nucleon.species == Species::Proton);
        wounded.push(nucleon.wounded);
    }
    let out = PyDict::new(py);
    out.set_item("positions", positions.into_pyarray(py))?;
    out.set_item("is_proton", is_proton.into_pyarray(py))?;
    out.set_item("wounded", wounded.into_pyarray(py))?;
    Ok(out)
}

fn moments_dict<'py>(py: Python<'py>, derived: MomentsDerived) -> PyResult<Bound<'py, PyDict>> {
    let out = PyDict::new(py);
    out.set_item("bin_centers", derived.bin_centers.into_pyarray(py))?;
    out.set_item("mean", derived.mean.into_pyarray(py))?;
    out.set_item("rms", derived.rms.into_pyarray(py))?;
    out.set_item("omega", derived.omega.into_pyarray(py))?;
    out.set_item("r2", derived.r2.into_pyarray(py))?;
    Ok(out)
}

fn map_array<'py>(py: Python<'py>, map: &Histogram2d) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let (nx, ny) = map.dims();
    let arr = Array2::from_shape_vec((nx, ny), map.counts().to_vec()).map_err(py_err)?;
    Ok(arr.into_pyarray(py))
}

/// GlauberMc Python-facing wrapper around the Rust collision-geometry core.
///
/// Workflow:
/// - construct once from the collision configuration (both nuclei, impact
///   parameter range, nucleon-nucleon cross section, seed)
/// - run(n_events) generates and aggregates events
/// - per-event views (get_nucleus_a/get_nucleus_b/get_interactions/
///   get_event_properties) expose the last generated event
/// - run-level getters pull the accumulated statistics as numpy arrays
#[pyclass]
pub struct GlauberMc {
    engine: CollisionEngine,
    statistics: GeometryStatistics,
    require_collision: bool,
}

#[pymethods]
impl GlauberMc {
    /// Initialize a collision-geometry run.
    ///
    /// Parameters (all lengths in fm, cross sections in mb):
    /// - a_nucleus_z / a_nucleus_a, b_nucleus_z / b_nucleus_a: Z and A per side
    /// - a_generator_type / b_generator_type: one of "uniform", "woods-saxon",
    ///   "exponential", "gaussian", "double-gaussian"
    /// - a_par_a..c / b_par_a..c: family shape parameters
    /// - n_radius_bins, min_radius, max_radius: profile tabulation (shared)
    /// - min_impact_parameter, max_impact_parameter: b sampling range
    /// - nn_cross_section: sigma_NN; sigma/pi is the collision threshold d^2
    /// - use_recentering, use_nucleon_exclusion, exclusion_radius,
    ///   max_placement_retries: placement options (shared)
    /// - require_collision: when true, events without a binary collision are
    ///   counted as processed but not accepted
    /// - seed: RNG seed for reproducibility; None for nondeterministic
    ///
    /// Errors: raises ValueError on invalid configuration.
    #[new]
    #[pyo3(signature = (
        a_nucleus_z, a_nucleus_a, b_nucleus_z, b_nucleus_a,
        a_generator_type="woods-saxon", a_par_a=6.62, a_par_b=0.546, a_par_c=0.0,
        b_generator_type="woods-saxon", b_par_a=6.62, b_par_b=0.546, b_par_c=0.0,
        n_radius_bins=100, min_radius=0.0, max_radius=20.0,
        min_impact_parameter=0.0, max_impact_parameter=20.0,
        nn_cross_section=40.0,
        use_recentering=true, use_nucleon_exclusion=false, exclusion_radius=0.4,
        max_placement_retries=200,
        require_collision=false,
        seed=None,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        a_nucleus_z: usize,
        a_nucleus_a: usize,
        b_nucleus_z: usize,
        b_nucleus_a: usize,
        a_generator_type: &str,
        a_par_a: f64,
        a_par_b: f64,
        a_par_c: f64,
        b_generator_type: &str,
        b_par_a: f64,
        b_par_b: f64,
        b_par_c: f64,
        n_radius_bins: usize,
        min_radius: f64,
        max_radius: f64,
        min_impact_parameter: f64,
        max_impact_parameter: f64,
        nn_cross_section: f64,
        use_recentering: bool,
        use_nucleon_exclusion: bool,
        exclusion_radius: f64,
        max_placement_retries: u32,
        require_collision: bool,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        let nucleus_a = NucleusConfig {
            n_protons: a_nucleus_z,
            n_nucleons: a_nucleus_a,
            kind: a_generator_type.parse().map_err(py_err)?,
            par_a: a_par_a,
            par_b: a_par_b,
            par_c: a_par_c,
            n_radius_bins,
            min_radius,
            max_radius,
            use_recentering,
            use_nucleon_exclusion,
            exclusion_radius,
            max_placement_retries,
        };
        let nucleus_b = NucleusConfig {
            n_protons: b_nucleus_z,
            n_nucleons: b_nucleus_a,
            kind: b_generator_type.parse().map_err(py_err)?,
            par_a: b_par_a,
            par_b: b_par_b,
            par_c: b_par_c,
            ..nucleus_a.clone()
        };
        let config = CollisionConfig {
            nucleus_a,
            nucleus_b,
            min_impact_parameter,
            max_impact_parameter,
            nn_cross_section,
        };

        // The statistics b-axis covers the sampled range; a degenerate
        // (fixed-b) run still gets a non-empty axis.
        let stats_defaults = StatsConfig::default();
        let stats_config = StatsConfig {
            min_b: 0.0,
            max_b: if max_impact_parameter > 0.0 {
                max_impact_parameter
            } else {
                stats_defaults.max_b
            },
            ..stats_defaults
        };

        let engine = CollisionEngine::new(&config, seed).map_err(py_err)?;
        let statistics = GeometryStatistics::new(&stats_config).map_err(py_err)?;
        Ok(Self {
            engine,
            statistics,
            require_collision,
        })
    }

    /// Generate and aggregate `n_events` events (releases the GIL).
    ///
    /// Returns the number of accepted events.
    fn run(&mut self, py: Python<'_>, n_events: usize) -> PyResult<usize> {
        let engine = &mut self.engine;
        let statistics = &mut self.statistics;
        let require_collision = self.require_collision;
        info!("run: generating {n_events} events");
        py.allow_threads(|| {
            let mut accepted = 0usize;
            for _ in 0..n_events {
                engine.execute()?;
                let event = engine.event();
                if !require_collision || event.properties.n_binary_total > 0 {
                    statistics.fill(event, 1.0);
                    accepted += 1;
                } else {
                    statistics.no_fill(&event.properties, 1.0);
                }
            }
            Ok::<usize, Error>(accepted)
        })
        .map_err(py_err)
    }

    /// Event-level summary of the last generated event as a dict.
    fn get_event_properties<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let props = &self.engine.event().properties;
        let out = PyDict::new(py);
        out.set_item("impact_parameter", props.impact_parameter)?;
        out.set_item("z_projectile", props.z_projectile)?;
        out.set_item("a_projectile", props.a_projectile)?;
        out.set_item("n_part_projectile", props.n_part_projectile)?;
        out.set_item("z_target", props.z_target)?;
        out.set_item("a_target", props.a_target)?;
        out.set_item("n_part_target", props.n_part_target)?;
        out.set_item("n_participants_total", props.n_participants_total)?;
        out.set_item("n_binary_total", props.n_binary_total)?;
        out.set_item("fractional_cross_section", props.fractional_cross_section)?;
        out.set_item("reference_multiplicity", props.reference_multiplicity)?;
        Ok(out)
    }

    /// Projectile nucleus of the last event: positions (A, 4), is_proton (A,),
    /// wounded (A,).
    fn get_nucleus_a<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        nucleus_dict(py, &self.engine.event().nucleus_a)
    }

    /// Target nucleus of the last event, same layout as get_nucleus_a.
    fn get_nucleus_b<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        nucleus_dict(py, &self.engine.event().nucleus_b)
    }

    /// Nucleon-nucleon interactions of the last event: positions (M, 4) plus
    /// the nucleon indices on each side.
    fn get_interactions<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let interactions = &self.engine.event().interactions;
        let m = interactions.len();
        let mut positions = Array2::<f64>::zeros((m, 4));
        let mut index_a = Vec::with_capacity(m);
        let mut index_b = Vec::with_capacity(m);
        for (i, interaction) in interactions.iter().enumerate() {
            for k in 0..4 {
                positions[[i, k]] = interaction.r[k];
            }
            index_a.push(interaction.index_a as u64);
            index_b.push(interaction.index_b as u64);
        }
        let out = PyDict::new(py);
        out.set_item("positions", positions.into_pyarray(py))?;
        out.set_item("index_a", index_a.into_pyarray(py))?;
        out.set_item("index_b", index_b.into_pyarray(py))?;
        Ok(out)
    }

    /// Processed and accepted event counters binned in impact parameter.
    fn get_event_counts<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let out = PyDict::new(py);
        out.set_item(
            "bin_centers",
            self.statistics.processed_vs_b.bin_centers().into_pyarray(py),
        )?;
        out.set_item(
            "processed",
            self.statistics.processed_vs_b.counts().to_vec().into_pyarray(py),
        )?;
        out.set_item(
            "accepted",
            self.statistics.accepted_vs_b.counts().to_vec().into_pyarray(py),
        )?;
        Ok(out)
    }

    /// Participant and binary-collision multiplicity spectra.
    fn get_spectra<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let out = PyDict::new(py);
        for (key, histogram) in [
            ("n_part", &self.statistics.n_part_spectrum),
            ("n_binary", &self.statistics.n_binary_spectrum),
        ] {
            let inner = PyDict::new(py);
            inner.set_item("bin_centers", histogram.bin_centers().into_pyarray(py))?;
            inner.set_item("counts", histogram.counts().to_vec().into_pyarray(py))?;
            out.set_item(key, inner)?;
        }
        Ok(out)
    }

    /// Every moment family's finalized statistics, keyed
    /// "<observable>_vs_<axis>", each a dict of bin_centers/mean/rms/omega/r2.
    fn get_moments<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let derived = self.statistics.derived();
        let out = PyDict::new(py);
        out.set_item("n_part_vs_b", moments_dict(py, derived.n_part_vs_b)?)?;
        out.set_item("n_binary_vs_b", moments_dict(py, derived.n_binary_vs_b)?)?;
        out.set_item(
            "n_binary_vs_n_part",
            moments_dict(py, derived.n_binary_vs_n_part)?,
        )?;
        out.set_item("b_vs_n_part", moments_dict(py, derived.b_vs_n_part)?)?;
        out.set_item(
            "n_part_vs_n_binary",
            moments_dict(py, derived.n_part_vs_n_binary)?,
        )?;
        out.set_item("b_vs_n_binary", moments_dict(py, derived.b_vs_n_binary)?)?;
        out.set_item("n_part_vs_xsect", moments_dict(py, derived.n_part_vs_xsect)?)?;
        out.set_item(
            "n_binary_vs_xsect",
            moments_dict(py, derived.n_binary_vs_xsect)?,
        )?;
        out.set_item("b_vs_xsect", moments_dict(py, derived.b_vs_xsect)?)?;
        Ok(out)
    }

    /// Transverse-plane occupancy maps accumulated over the run:
    /// "nucleons" and "interactions", each a (n, n) array.
    fn get_xy_maps<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let out = PyDict::new(py);
        out.set_item("nucleons", map_array(py, &self.statistics.xy_nucleons)?)?;
        out.set_item(
            "interactions",
            map_array(py, &self.statistics.xy_interactions)?,
        )?;
        Ok(out)
    }

    /// The tabulated radial profiles both generators draw from:
    /// per side, bin-center radii, density and sampling weight.
    fn get_radial_profiles<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let out = PyDict::new(py);
        for (key, generator) in [
            ("a", self.engine.generator_a()),
            ("b", self.engine.generator_b()),
        ] {
            let profile = generator.profile();
            let centers: Vec<f64> = (0..profile.n_bins()).map(|i| profile.bin_center(i)).collect();
            let inner = PyDict::new(py);
            inner.set_item("r", centers.into_pyarray(py))?;
            inner.set_item("density", profile.density().to_vec().into_pyarray(py))?;
            inner.set_item("weight", profile.weight().to_vec().into_pyarray(py))?;
            out.set_item(key, inner)?;
        }
        Ok(out)
    }
}

/// The glaubersim Python module entry point.
#[pymodule]
fn glaubersim(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<GlauberMc>()?;
    Ok(())
}
