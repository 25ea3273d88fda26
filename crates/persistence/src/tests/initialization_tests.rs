// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::Persistence;
use crate::error::PersistenceError;
use timeclock::ReconciliationStore;
use time::macros::datetime;

#[test]
fn test_persistence_initialization() {
    let result: Result<Persistence, PersistenceError> = Persistence::new_in_memory();
    assert!(result.is_ok());
}

#[test]
fn test_foreign_keys_are_enforced() {
    let mut db = Persistence::new_in_memory().unwrap();
    assert!(db.verify_foreign_key_enforcement().is_ok());
}

#[test]
fn test_multiple_in_memory_instances_are_isolated() {
    let mut db1 = Persistence::new_in_memory().unwrap();
    let mut db2 = Persistence::new_in_memory().unwrap();

    super::persist_single_shift(
        &mut db1,
        "1",
        datetime!(2026-03-02 09:00 UTC),
        Some(datetime!(2026-03-02 17:00 UTC)),
    );

    assert_eq!(db1.shifts_starting_at_or_after(None).unwrap().len(), 1);
    assert!(db2.shifts_starting_at_or_after(None).unwrap().is_empty());
}

#[test]
fn test_busy_timeout_can_be_set() {
    let mut db = Persistence::new_in_memory().unwrap();
    assert!(
        db.set_busy_timeout(std::time::Duration::from_millis(250))
            .is_ok()
    );
}

#[test]
fn test_file_database_survives_reopen() {
    let dir = std::env::temp_dir().join(format!(
        "timeclock_persistence_test_{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("reopen.sqlite");
    let _ = std::fs::remove_file(&path);

    {
        let mut db = Persistence::new_with_file(&path).unwrap();
        db.record_sync(datetime!(2026-03-04 00:00 UTC)).unwrap();
    }

    let mut reopened = Persistence::new_with_file(&path).unwrap();
    assert_eq!(
        reopened.last_synced_at().unwrap(),
        Some(datetime!(2026-03-04 00:00 UTC))
    );

    drop(reopened);
    let _ = std::fs::remove_dir_all(&dir);
}
