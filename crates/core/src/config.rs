// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use chrono_tz::Tz;
use time::Duration;
use timeclock_domain::{LayoutConfig, MERGE_THRESHOLD};

/// Tunables for a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Largest gap bridged when stitching components into a shift.
    pub merge_threshold: Duration,
    /// Size of each window fetched from the punch source.
    pub fetch_chunk: Duration,
    /// Row layout tunables.
    pub layout: LayoutConfig,
    /// Time zone of the punch devices.
    pub source_zone: Tz,
    /// How long a component may stay open before it is flagged.
    pub stuck_threshold: Duration,
    /// How far back the first run reaches.
    pub lookback: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            merge_threshold: MERGE_THRESHOLD,
            fetch_chunk: Duration::days(14),
            layout: LayoutConfig::default(),
            source_zone: chrono_tz::America::New_York,
            stuck_threshold: Duration::hours(24),
            lookback: Duration::days(365),
        }
    }
}
