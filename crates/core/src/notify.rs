// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use timeclock_domain::{LiveStateDelta, LiveStateRecord};

/// Receives every live state record right after it is appended.
///
/// Calls arrive in append order and only for records that were stored.
pub trait StateNotifier {
    /// Delivers a freshly appended record and its delta against the
    /// previous one.
    fn notify(&self, record: &LiveStateRecord, delta: &LiveStateDelta);
}
