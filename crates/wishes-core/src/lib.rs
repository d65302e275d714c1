//! # Wishes Core
//!
//! Rule-composition engine for gacha pull simulation.
//!
//! A pull resolves a rarity [`Tier`], an item category and a campaign
//! [`Tag`]. The decision is made by an ordered chain of small, stateful
//! rules sharing one evaluation context, so that each game or campaign can
//! assemble its own probability, pity and rate-up behavior from
//! configuration without touching the engine.
//!
//! ## Architecture
//!
//! - **Outcome**: the in-progress pull, with decide-once slots ([`outcome`])
//! - **Context**: the outcome plus the parameter table through which rules
//!   publish their counters and weights ([`context`])
//! - **Rules**: counters, probabilities, guarantees, rate-up and escalation
//!   ([`rules`]), unified by the closed [`PullRule`] variant type
//! - **Registry**: identifier to rule construction and load-time validation
//!   ([`registry`])
//! - **Engine**: the two-phase pull driver with snapshot export/import
//!   ([`engine`])
//!
//! The engine only produces an abstract [`PullResult`]; resolving it to a
//! concrete item, recording history and persisting snapshots are the host
//! application's job.
//!
//! ## Usage
//!
//! ```
//! use wishes_core::{Engine, LogicConfig, Tier};
//!
//! let config = LogicConfig::from_json(r#"{
//!     "name": "standard banner",
//!     "rules": ["tier_guarantee", "tier_probability", "tier_counter"],
//!     "tier_weights": { "5": 60, "4": 510, "3": 9430 },
//!     "tier_thresholds": { "5": 90, "4": 10 }
//! }"#).unwrap();
//!
//! let mut engine = Engine::from_config(&config, 42).unwrap();
//! let results = engine.pull_many(10);
//!
//! // The tier-4 guarantee fires no later than the tenth pull.
//! assert!(results.iter().any(|r| r.tier >= Tier::new(4)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod random;
pub mod registry;
pub mod rule;
pub mod rules;
pub mod snapshot;
pub mod state;
pub mod stats;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use batch::{simulate, BatchPlan};
pub use config::{Escalation, LogicCatalog, LogicConfig, DEFAULT_CAPACITY};
pub use context::{ParameterTable, RuleContext};
pub use engine::Engine;
pub use error::{ConfigError, SnapshotError};
pub use outcome::{Outcome, PullResult, Slot, Tag, Tier};
pub use random::{RandomSource, ScriptedSource, SeededSource};
pub use registry::{RuleRegistry, UnknownRulePolicy};
pub use rule::{PullRule, Rule, RuleKind};
pub use snapshot::StateSnapshot;
pub use state::{CategoryCounts, PublishedState, RuleState, TierCounts, TierWeights};
pub use stats::PullStats;
