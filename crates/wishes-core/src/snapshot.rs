//! Persistable copies of an engine's rule state.
//!
//! A [`StateSnapshot`] maps rule identifiers to their published state and
//! serializes in the same shape as the configuration, with tier keys as
//! JSON strings:
//!
//! ```json
//! {
//!     "tier_counter": { "5": 12, "4": 3, "3": 0 },
//!     "tier_probability": { "5": 60, "4": 510, "3": 9430 },
//!     "rate_up": { "5": 1 }
//! }
//! ```
//!
//! Entries for unknown identifiers, or for rules that own no state, are
//! skipped with a warning when decoding.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::context::ParameterTable;
use crate::error::SnapshotError;
use crate::rule::RuleKind;
use crate::state::{CategoryCounts, RuleState, TierCounts, TierWeights};

/// Rule state captured from an engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    entries: BTreeMap<RuleKind, RuleState>,
}

impl StateSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies every entry of `params`.
    #[must_use]
    pub fn capture(params: &ParameterTable) -> Self {
        Self {
            entries: params.iter().map(|(k, s)| (k, s.clone())).collect(),
        }
    }

    /// Adds or replaces the state of `kind`.
    pub fn insert(&mut self, kind: RuleKind, state: RuleState) {
        self.entries.insert(kind, state);
    }

    /// Returns the state captured for `kind`.
    #[must_use]
    pub fn get(&self, kind: RuleKind) -> Option<&RuleState> {
        self.entries.get(&kind)
    }

    /// Iterates over captured entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (RuleKind, &RuleState)> {
        self.entries.iter().map(|(k, s)| (*k, s))
    }

    /// Number of captured entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encodes the snapshot as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] if encoding fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Encodes the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] if encoding fails.
    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decodes a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] for malformed JSON or state of the
    /// wrong shape for its identifier.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Serialize for StateSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (kind, state) in &self.entries {
            map.serialize_entry(kind.identifier(), state)?;
        }
        map.end()
    }
}

struct SnapshotVisitor;

impl<'de> Visitor<'de> for SnapshotVisitor {
    type Value = StateSnapshot;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map from rule identifier to rule state")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut snapshot = StateSnapshot::new();
        while let Some(identifier) = access.next_key::<String>()? {
            let Some(kind) = RuleKind::from_identifier(&identifier) else {
                access.next_value::<IgnoredAny>()?;
                tracing::warn!(identifier = %identifier, "snapshot entry for an unknown rule, skipped");
                continue;
            };
            let state: RuleState = match kind {
                RuleKind::TierCounter | RuleKind::RateUp | RuleKind::Targeted => {
                    access.next_value::<TierCounts>()?.into()
                }
                RuleKind::CategoryCounter | RuleKind::RateUpCategory => {
                    access.next_value::<CategoryCounts>()?.into()
                }
                RuleKind::TierProbability => access.next_value::<TierWeights>()?.into(),
                _ => {
                    access.next_value::<IgnoredAny>()?;
                    tracing::warn!(rule = %kind, "snapshot entry for a stateless rule, skipped");
                    continue;
                }
            };
            snapshot.insert(kind, state);
        }
        Ok(snapshot)
    }
}

impl<'de> Deserialize<'de> for StateSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SnapshotVisitor)
    }
}
