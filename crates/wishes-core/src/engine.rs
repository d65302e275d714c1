//! The pull engine.
//!
//! An [`Engine`] owns one logic instance: its ordered rule chain, the
//! evaluation context and the random source. Each pull runs in two phases:
//!
//! 1. **Decide**: reset the outcome, then let every rule, in order, read
//!    the published state and fill in outcome fields it is entitled to
//! 2. **Advance**: finalize the outcome, then let every rule, in order,
//!    update its own counters and weights from the finalized result
//!
//! A pull is synchronous and infallible. The engine provides no locking;
//! a host serving several pools keeps one engine per pool behind its own
//! exclusion boundary.
//!
//! # Persistence
//!
//! [`Engine::export_state`] copies every published state into a
//! [`StateSnapshot`]; [`Engine::import_state`] restores one. Together with
//! [`Engine::reset`] these are the only ways state changes outside a pull.
//!
//! # Example
//!
//! ```
//! use wishes_core::{Engine, LogicConfig, ScriptedSource, Tier};
//!
//! let config = LogicConfig::from_json(r#"{
//!     "name": "pity",
//!     "rules": ["tier_guarantee", "tier_probability", "tier_counter"],
//!     "tier_weights": { "5": 60, "4": 510, "3": 9430 },
//!     "tier_thresholds": { "5": 10 }
//! }"#).unwrap();
//!
//! // The script always picks tier 3 when it gets a choice.
//! let mut engine = Engine::with_source(&config, ScriptedSource::always(2)).unwrap();
//! let results = engine.pull_many(10);
//!
//! assert!(results[..9].iter().all(|r| r.tier == Tier::new(3)));
//! assert_eq!(results[9].tier, Tier::new(5));
//! ```

use crate::config::LogicConfig;
use crate::context::{ParameterTable, RuleContext};
use crate::error::ConfigError;
use crate::outcome::PullResult;
use crate::random::{RandomSource, SeededSource};
use crate::registry::RuleRegistry;
use crate::rule::{PullRule, Rule};
use crate::snapshot::StateSnapshot;

// =============================================================================
// Engine
// =============================================================================

/// Rule-driven pull engine for one card-pool logic.
#[derive(Debug, Clone)]
pub struct Engine<R = SeededSource> {
    name: String,
    rules: Vec<PullRule>,
    ctx: RuleContext,
    /// Published state as declared, for `reset` and `import_state`.
    initial: ParameterTable,
    source: R,
}

impl Engine<SeededSource> {
    /// Builds an engine from `config` with a seeded random source.
    ///
    /// Unknown rule identifiers are ignored; use [`Engine::with_registry`]
    /// to reject them instead.
    ///
    /// # Errors
    ///
    /// Returns any validation or construction error of the logic.
    pub fn from_config(config: &LogicConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_source(config, SeededSource::new(seed))
    }
}

impl<R: RandomSource> Engine<R> {
    /// Builds an engine from `config` drawing from `source`.
    ///
    /// # Errors
    ///
    /// Returns any validation or construction error of the logic.
    pub fn with_source(config: &LogicConfig, source: R) -> Result<Self, ConfigError> {
        Self::with_registry(config, &RuleRegistry::new(), source)
    }

    /// Builds an engine from `config` using `registry` to construct the rules.
    ///
    /// # Errors
    ///
    /// Returns any validation or construction error of the logic.
    pub fn with_registry(
        config: &LogicConfig,
        registry: &RuleRegistry,
        source: R,
    ) -> Result<Self, ConfigError> {
        let span = tracing::debug_span!("engine", logic = %config.name);
        let _guard = span.enter();

        let rules = registry.build(config)?;
        Self::new(config.name.clone(), rules, source)
    }

    /// Assembles an engine from an already built rule chain.
    ///
    /// Every rule declares its state once, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateRule`] if two rules publish under the
    /// same identifier.
    pub fn new(name: impl Into<String>, rules: Vec<PullRule>, source: R) -> Result<Self, ConfigError> {
        let mut ctx = RuleContext::new();
        for rule in &rules {
            rule.declare(&mut ctx)?;
        }
        let initial = ctx.params.clone();

        let name = name.into();
        tracing::debug!(logic = %name, rules = rules.len(), published = initial.len(), "engine ready");

        Ok(Self {
            name,
            rules,
            ctx,
            initial,
            source,
        })
    }

    /// Performs one pull.
    pub fn pull(&mut self) -> PullResult {
        self.ctx.reset_outcome();
        for rule in &self.rules {
            rule.decide(&mut self.ctx, &mut self.source);
        }

        let result = self.ctx.outcome.finalize();

        for rule in &self.rules {
            rule.advance(&mut self.ctx);
        }

        tracing::trace!(logic = %self.name, tier = %result.tier, category = %result.category, tag = %result.tag, "pull");
        result
    }

    /// Performs `count` independent pulls.
    pub fn pull_many(&mut self, count: usize) -> Vec<PullResult> {
        (0..count).map(|_| self.pull()).collect()
    }

    /// Copies every published rule state.
    #[must_use]
    pub fn export_state(&self) -> StateSnapshot {
        StateSnapshot::capture(&self.ctx.params)
    }

    /// Restores rule state from `snapshot`.
    ///
    /// State starts from its configured initial values and is overlaid with
    /// the snapshot: missing tiers or categories read as zero (live weights
    /// fall back to the configured ones), and entries for rules or tiers
    /// this logic does not have are skipped.
    pub fn import_state(&mut self, snapshot: &StateSnapshot) {
        let mut params = self.initial.clone();
        for (kind, saved) in snapshot.iter() {
            match params.lookup_mut(kind) {
                Some(state) => {
                    if !state.overlay(saved) {
                        tracing::warn!(logic = %self.name, rule = %kind, "snapshot state has the wrong shape, skipped");
                    }
                }
                None => {
                    tracing::warn!(logic = %self.name, rule = %kind, "snapshot entry for a rule not in this logic, skipped");
                }
            }
        }
        tracing::debug!(logic = %self.name, entries = snapshot.len(), "state imported");

        self.ctx.params = params;
        self.ctx.reset_outcome();
    }

    /// Restores every counter and weight to its configured initial value.
    ///
    /// The random source is left alone; reseed it to replay a fresh engine.
    pub fn reset(&mut self) {
        self.ctx.params.clone_from(&self.initial);
        self.ctx.reset_outcome();
    }

    /// Name of the logic.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The rule chain in execution order.
    #[must_use]
    pub fn rules(&self) -> &[PullRule] {
        &self.rules
    }

    /// The evaluation context.
    #[must_use]
    pub fn context(&self) -> &RuleContext {
        &self.ctx
    }

    /// The random source.
    #[must_use]
    pub fn source(&self) -> &R {
        &self.source
    }

    /// The random source, mutably.
    pub fn source_mut(&mut self) -> &mut R {
        &mut self.source
    }
}

// =============================================================================
// Tests
// =============================================================================
