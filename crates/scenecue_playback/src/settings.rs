// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default spacing of time-update notifications
pub const DEFAULT_TIME_UPDATE_INTERVAL: Duration = Duration::from_millis(100);

/// Default dot-path of the visual program identifier
pub const DEFAULT_PROGRAM_PATH: &str = "shader";

/// Tunables for a [`crate::PlaybackEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaybackSettings {
    /// Restart from zero at the end instead of stopping
    pub looping: bool,
    /// Minimum wall-clock spacing between time-update notifications
    #[serde(with = "millis")]
    pub time_update_interval: Duration,
    /// Dot-path whose value names the visual program. A change here needs a
    /// full renderer reload; anything else is merged in place.
    pub program_path: String,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            looping: false,
            time_update_interval: DEFAULT_TIME_UPDATE_INTERVAL,
            program_path: DEFAULT_PROGRAM_PATH.to_string(),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
