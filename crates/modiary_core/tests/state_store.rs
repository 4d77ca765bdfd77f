use chrono::NaiveDate;
use modiary_core::db::open_db;
use modiary_core::repo::state_repo::STATE_KEY;
use modiary_core::{
    AppState, BackupError, BackupImport, CalendarImport, CalendarImportError, DiaryEntry,
    ImportMode, NewSchedule, RepoError, RepoResult, SequentialIdGenerator,
    SqliteStateRepository, StateRepository, StateStore, StateValidationError, StoreError,
};
use std::cell::{Cell, RefCell};

fn date(value: &str) -> NaiveDate {
    value.parse().unwrap()
}

/// In-memory repository that can be told to fail writes.
#[derive(Default)]
struct FakeRepo {
    saved: RefCell<Option<AppState>>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl StateRepository for &FakeRepo {
    fn load_snapshot(&self) -> RepoResult<Option<AppState>> {
        Ok(self.saved.borrow().clone())
    }

    fn save_snapshot(&self, state: &AppState) -> RepoResult<()> {
        if self.fail_writes.get() {
            return Err(RepoError::InvalidData("disk full".to_string()));
        }
        self.writes.set(self.writes.get() + 1);
        *self.saved.borrow_mut() = Some(state.clone());
        Ok(())
    }
}

#[test]
fn state_survives_reopen_from_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modiary.sqlite3");

    let routine_id = {
        let conn = open_db(&path).unwrap();
        let mut store = StateStore::open(SqliteStateRepository::new(&conn)).unwrap();
        assert_eq!(store.state(), &AppState::default());

        let id = store.add_routine("stretch", [1, 3]).unwrap();
        assert!(store.toggle_check(date("2024-03-18"), id).unwrap());
        store.update_diary(date("2024-03-18"), "felt good").unwrap();
        id
    };

    let conn = open_db(&path).unwrap();
    let repo = SqliteStateRepository::new(&conn);
    assert_eq!(repo.key(), STATE_KEY);
    let store = StateStore::open(repo).unwrap();

    assert_eq!(store.state().routines.len(), 1);
    assert!(store.state().is_completed(date("2024-03-18"), routine_id));
    assert_eq!(
        store.state().diary(date("2024-03-18")).unwrap().content,
        "felt good"
    );
}

#[test]
fn corrupt_snapshot_is_reported_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("modiary.sqlite3")).unwrap();
    conn.execute(
        "INSERT INTO kv_store (key, value) VALUES (?1, 'not json');",
        [STATE_KEY],
    )
    .unwrap();

    let err = StateStore::open(SqliteStateRepository::new(&conn))
        .err()
        .unwrap();
    assert!(matches!(err, StoreError::Repo(RepoError::InvalidData(_))));
}

#[test]
fn failed_write_keeps_previous_state() {
    let repo = FakeRepo::default();
    let mut store = StateStore::open_with_ids(&repo, SequentialIdGenerator::new()).unwrap();
    let id = store.add_routine("stretch", [1]).unwrap();
    let before = store.state().clone();

    repo.fail_writes.set(true);
    let err = store.toggle_check(date("2024-03-18"), id).unwrap_err();

    assert!(matches!(err, StoreError::Repo(_)));
    assert_eq!(store.state(), &before);
    assert_eq!(repo.saved.borrow().as_ref(), Some(&before));
}

#[test]
fn rejected_transition_does_not_write() {
    let repo = FakeRepo::default();
    let mut store = StateStore::open_with_ids(&repo, SequentialIdGenerator::new()).unwrap();

    let err = store.add_routine("   ", [1]).unwrap_err();

    assert!(matches!(err, StoreError::Transition(_)));
    assert_eq!(repo.writes.get(), 0);
}

#[test]
fn deleting_routine_removes_its_checks() {
    let repo = FakeRepo::default();
    let mut store = StateStore::open_with_ids(&repo, SequentialIdGenerator::new()).unwrap();
    let stretch = store.add_routine("stretch", [1, 3]).unwrap();
    let read = store.add_routine("read", [1]).unwrap();
    store.toggle_check(date("2024-03-18"), stretch).unwrap();
    store.toggle_check(date("2024-03-20"), stretch).unwrap();
    store.toggle_check(date("2024-03-18"), read).unwrap();

    store.delete_routine(stretch).unwrap();

    let saved = repo.saved.borrow().clone().unwrap();
    assert_eq!(saved.routines.len(), 1);
    assert_eq!(saved.check_statuses.len(), 1);
    assert_eq!(saved.check_statuses[0].template_id, read);
}

#[test]
fn merge_import_reconciles_and_reports_counts() {
    let repo = FakeRepo::default();
    let mut store = StateStore::open_with_ids(&repo, SequentialIdGenerator::new()).unwrap();
    store.update_diary(date("2024-03-15"), "A").unwrap();

    let backup = r#"{
        "routines": [],
        "checkStatuses": [],
        "schedules": [],
        "diaries": [
            {"date": "2024-03-15", "content": "B"},
            {"date": "2024-03-16", "content": "C"}
        ]
    }"#;
    let outcome = store.import_backup(backup, ImportMode::Merge).unwrap();

    let BackupImport::Merged(summary) = outcome else {
        panic!("expected merge outcome");
    };
    assert_eq!(summary.diaries_combined, 1);
    assert_eq!(summary.diaries_added, 1);
    assert_eq!(
        store.state().diary(date("2024-03-15")).unwrap().content,
        "A\n---\nB"
    );
    assert_eq!(repo.saved.borrow().as_ref(), Some(store.state()));
}

#[test]
fn replace_import_discards_current_state() {
    let repo = FakeRepo::default();
    let mut store = StateStore::open_with_ids(&repo, SequentialIdGenerator::new()).unwrap();
    store.add_routine("stretch", [1]).unwrap();

    let outcome = store
        .import_backup(
            r#"{"diaries": [{"date": "2024-03-16", "content": "C"}]}"#,
            ImportMode::Replace,
        )
        .unwrap();

    assert_eq!(outcome, BackupImport::Replaced);
    assert!(store.state().routines.is_empty());
    assert_eq!(store.state().diaries.len(), 1);
}

#[test]
fn malformed_backup_leaves_state_untouched() {
    let repo = FakeRepo::default();
    let mut store = StateStore::open_with_ids(&repo, SequentialIdGenerator::new()).unwrap();
    store.add_routine("stretch", [1]).unwrap();
    let before = store.state().clone();
    let writes = repo.writes.get();

    for document in ["{ not json", r#"{"routines": 3}"#, "42"] {
        let err = store.import_backup(document, ImportMode::Merge).unwrap_err();
        assert!(matches!(err, StoreError::Backup(BackupError::Malformed(_))));
    }

    assert_eq!(store.state(), &before);
    assert_eq!(repo.writes.get(), writes);
}

#[test]
fn export_then_import_restores_same_state() {
    let repo = FakeRepo::default();
    let mut store = StateStore::open_with_ids(&repo, SequentialIdGenerator::new()).unwrap();
    let id = store.add_routine("stretch", [1, 3]).unwrap();
    store.toggle_check(date("2024-03-18"), id).unwrap();
    store
        .add_schedule(NewSchedule {
            date: date("2024-03-20"),
            time: "09:30".to_string(),
            text: "Dentist".to_string(),
            color: None,
        })
        .unwrap();

    let export = store.export_backup(date("2024-03-21")).unwrap();
    assert_eq!(export.file_name, "modiary_backup_20240321.json");

    let other_repo = FakeRepo::default();
    let mut restored = StateStore::open(&other_repo).unwrap();
    restored
        .import_backup(&export.document, ImportMode::Replace)
        .unwrap();
    assert_eq!(restored.state(), store.state());
}

#[test]
fn calendar_import_counts_duplicates_and_rejects_empty_files() {
    let repo = FakeRepo::default();
    let mut store = StateStore::open_with_ids(&repo, SequentialIdGenerator::new()).unwrap();
    let calendar = "BEGIN:VEVENT\nDTSTART:20240315T093000Z\nSUMMARY:Dentist\nEND:VEVENT\n";

    let first = store.import_calendar(calendar).unwrap();
    assert_eq!(
        first,
        CalendarImport {
            added: 1,
            duplicates: 0
        }
    );

    let second = store.import_calendar(calendar).unwrap();
    assert_eq!(
        second,
        CalendarImport {
            added: 0,
            duplicates: 1
        }
    );
    assert_eq!(store.state().schedules.len(), 1);

    let writes = repo.writes.get();
    let err = store.import_calendar("BEGIN:VCALENDAR\nEND:VCALENDAR\n").unwrap_err();
    assert!(matches!(
        err,
        StoreError::Calendar(CalendarImportError::NoEvents)
    ));
    assert_eq!(repo.writes.get(), writes);
}

#[test]
fn apply_commits_host_supplied_transition() {
    let repo = FakeRepo::default();
    let mut store = StateStore::open_with_ids(&repo, SequentialIdGenerator::new()).unwrap();

    store
        .apply("clear_diaries", |mut state| {
            state.diaries.clear();
            state
        })
        .unwrap();

    assert_eq!(repo.writes.get(), 1);
}

#[test]
fn invalid_transition_result_is_not_saved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modiary.sqlite3");
    let day = date("2024-01-01");

    {
        let conn = open_db(&path).unwrap();
        let mut store = StateStore::open(SqliteStateRepository::new(&conn)).unwrap();
        store.update_diary(day, "kept").unwrap();
        let before = store.state().clone();

        let err = store
            .apply("duplicate_diary", |mut state| {
                state.diaries.push(DiaryEntry {
                    date: day,
                    content: "second".to_string(),
                    mood: None,
                });
                state
            })
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::Invalid(StateValidationError::DuplicateDiaryDate(d)) if d == day
        ));
        assert_eq!(store.state(), &before);
    }

    let conn = open_db(&path).unwrap();
    let store = StateStore::open(SqliteStateRepository::new(&conn)).unwrap();
    assert_eq!(store.state().diaries.len(), 1);
    assert_eq!(store.state().diary(day).unwrap().content, "kept");
}
