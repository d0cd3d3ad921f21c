// SPDX-License-Identifier: MIT OR Apache-2.0
//! Identifiers for timeline entities and the generators that mint them.
//!
//! Ids are never minted from global state. Whoever builds a timeline owns an
//! [`IdGenerator`] and passes it to the model constructors.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Source of fresh ids for timeline entities
pub trait IdGenerator {
    /// Produce the next id
    fn next_uuid(&mut self) -> Uuid;
}

/// Random (v4) ids, the usual choice for documents
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_uuid(&mut self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Monotonic ids starting at 1. Deterministic, so fixtures and tests can
/// predict every id they create.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    next: u128,
}

impl SequentialIds {
    /// Create a generator whose first id is `Uuid::from_u128(1)`
    pub fn new() -> Self {
        Self { next: 0 }
    }
}

impl IdGenerator for SequentialIds {
    fn next_uuid(&mut self) -> Uuid {
        self.next += 1;
        Uuid::from_u128(self.next)
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Mint a new id from the given generator
            pub fn generate(ids: &mut impl IdGenerator) -> Self {
                Self(ids.next_uuid())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a scene
    SceneId
);
entity_id!(
    /// Unique identifier for a sequence
    SequenceId
);
entity_id!(
    /// Unique identifier for a keyframe
    KeyframeId
);
entity_id!(
    /// Unique identifier for an audio clip
    ClipId
);
entity_id!(
    /// Unique identifier for a scene transition
    TransitionId
);
