//! # Wishes Python Bindings
//!
//! PyO3 bindings exposing the pull engine to Python.
//!
//! ## Usage
//!
//! ```python
//! import json
//! import wishes
//!
//! config = json.dumps({
//!     "name": "standard banner",
//!     "rules": ["tier_guarantee", "tier_probability", "tier_counter"],
//!     "tier_weights": {"5": 60, "4": 510, "3": 9430},
//!     "tier_thresholds": {"5": 90, "4": 10},
//! })
//!
//! engine = wishes.Engine(config, seed=42)
//! for result in engine.pull_many(10):
//!     print(result.tier, result.category, result.tag)
//!
//! saved = engine.export_state()
//! engine.import_state(saved)
//!
//! stats = wishes.simulate(config, trials=1000, pulls_per_trial=180, seed=7)
//! print(f"Mean wait: {stats.mean_gap}")
//! ```

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use wishes_core::{
    BatchPlan, Engine, LogicConfig, PullResult, PullStats, RuleRegistry, SeededSource,
    StateSnapshot, Tag, Tier,
};

fn value_error(err: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn parse_tag(name: &str) -> PyResult<Tag> {
    [Tag::Standard, Tag::RateUp, Tag::Festival, Tag::Targeted]
        .into_iter()
        .find(|tag| tag.as_str() == name)
        .ok_or_else(|| value_error(format!("unknown tag: {name}")))
}

// =============================================================================
// Engine
// =============================================================================

/// Pull engine for one logic.
#[pyclass(name = "Engine")]
pub struct PyEngine {
    inner: Engine,
}

#[pymethods]
impl PyEngine {
    /// Build an engine from a JSON logic configuration.
    ///
    /// With `strict=True`, unknown rule identifiers raise instead of being ignored.
    #[new]
    #[pyo3(signature = (config_json, seed=0, strict=false))]
    fn new(config_json: &str, seed: u64, strict: bool) -> PyResult<Self> {
        let config = LogicConfig::from_json(config_json).map_err(value_error)?;
        let registry = if strict {
            RuleRegistry::strict()
        } else {
            RuleRegistry::new()
        };
        let inner = Engine::with_registry(&config, &registry, SeededSource::new(seed))
            .map_err(value_error)?;
        Ok(Self { inner })
    }

    /// Name of the logic.
    #[getter]
    fn name(&self) -> &str {
        self.inner.name()
    }

    /// Seed of the random source.
    #[getter]
    fn seed(&self) -> u64 {
        self.inner.source().seed()
    }

    /// Perform one pull.
    fn pull(&mut self) -> PyPullResult {
        self.inner.pull().into()
    }

    /// Perform `count` pulls.
    #[pyo3(signature = (count=10))]
    fn pull_many(&mut self, count: usize) -> Vec<PyPullResult> {
        self.inner
            .pull_many(count)
            .into_iter()
            .map(PyPullResult::from)
            .collect()
    }

    /// Export every counter and weight as a JSON string.
    fn export_state(&self) -> PyResult<String> {
        self.inner.export_state().to_json().map_err(value_error)
    }

    /// Restore counters and weights from a JSON string.
    fn import_state(&mut self, state_json: &str) -> PyResult<()> {
        let snapshot = StateSnapshot::from_json(state_json).map_err(value_error)?;
        self.inner.import_state(&snapshot);
        Ok(())
    }

    /// Restore initial state. Pass `reseed=True` to also rewind the random stream.
    #[pyo3(signature = (reseed=false))]
    fn reset(&mut self, reseed: bool) {
        self.inner.reset();
        if reseed {
            self.inner.source_mut().reseed();
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Engine(name={:?}, rules={})",
            self.inner.name(),
            self.inner.rules().len()
        )
    }
}

// =============================================================================
// Results
// =============================================================================

/// Finalized result of one pull.
#[pyclass(name = "PullResult", frozen, eq, hash)]
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PyPullResult(PullResult);

#[pymethods]
impl PyPullResult {
    /// Rarity tier, 0 if no rule decided one.
    #[getter]
    fn tier(&self) -> u32 {
        self.0.tier.as_u32()
    }

    /// Item category, empty if no rule decided one.
    #[getter]
    fn category(&self) -> &str {
        &self.0.category
    }

    /// Group tag: `standard`, `rate_up`, `festival` or `targeted`.
    #[getter]
    fn tag(&self) -> &'static str {
        self.0.tag.as_str()
    }

    fn __repr__(&self) -> String {
        format!(
            "PullResult(tier={}, category={:?}, tag={})",
            self.0.tier,
            self.0.category,
            self.0.tag
        )
    }
}

impl From<PullResult> for PyPullResult {
    fn from(result: PullResult) -> Self {
        Self(result)
    }
}

/// Aggregated statistics of a batch simulation.
#[pyclass(name = "PullStats", frozen)]
pub struct PyPullStats(PullStats);

#[pymethods]
impl PyPullStats {
    /// Number of pulls simulated.
    #[getter]
    fn total(&self) -> u64 {
        self.0.total()
    }

    /// Tier whose waits are tracked.
    #[getter]
    fn tracked(&self) -> Option<u32> {
        self.0.tracked().map(Tier::as_u32)
    }

    /// Mean pulls between tracked-tier results.
    #[getter]
    fn mean_gap(&self) -> Option<f64> {
        self.0.mean_gap()
    }

    /// Longest wait for the tracked tier.
    #[getter]
    fn max_gap(&self) -> Option<u64> {
        self.0.max_gap()
    }

    /// Number of pulls of `tier`.
    fn tier_count(&self, tier: u32) -> u64 {
        self.0.tier_count(Tier::new(tier))
    }

    /// Fraction of pulls of `tier`.
    fn rate(&self, tier: u32) -> f64 {
        self.0.rate(Tier::new(tier))
    }

    /// Number of pulls tagged `tag`.
    fn tag_count(&self, tag: &str) -> PyResult<u64> {
        Ok(self.0.tag_count(parse_tag(tag)?))
    }

    /// Number of pulls of `category` within `tier`.
    fn category_count(&self, tier: u32, category: &str) -> u64 {
        self.0.category_count(Tier::new(tier), category)
    }

    /// Statistics as a JSON string.
    fn to_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.0).map_err(value_error)
    }

    fn __repr__(&self) -> String {
        format!(
            "PullStats(total={}, mean_gap={:?})",
            self.0.total(),
            self.0.mean_gap()
        )
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Run `trials` independent engines in parallel and aggregate their pulls.
#[pyfunction]
#[pyo3(signature = (config_json, trials, pulls_per_trial, seed=0))]
fn simulate(
    py: Python<'_>,
    config_json: &str,
    trials: usize,
    pulls_per_trial: usize,
    seed: u64,
) -> PyResult<PyPullStats> {
    let config = LogicConfig::from_json(config_json).map_err(value_error)?;
    let plan = BatchPlan::new(trials, pulls_per_trial, seed);
    let stats = py
        .allow_threads(|| wishes_core::simulate(&config, &plan))
        .map_err(value_error)?;
    Ok(PyPullStats(stats))
}

/// Install a stderr log subscriber at `level`.
///
/// Returns False if a subscriber was already installed.
#[pyfunction]
#[pyo3(signature = (level="info"))]
fn enable_logging(level: &str) -> PyResult<bool> {
    let level: tracing::Level = level.parse().map_err(value_error)?;
    Ok(tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok())
}

/// Python module definition.
#[pymodule]
fn _wishes(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyEngine>()?;
    m.add_class::<PyPullResult>()?;
    m.add_class::<PyPullStats>()?;
    m.add_function(wrap_pyfunction!(simulate, m)?)?;
    m.add_function(wrap_pyfunction!(enable_logging, m)?)?;
    Ok(())
}
