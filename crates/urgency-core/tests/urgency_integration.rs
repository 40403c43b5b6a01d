//! Integration tests for urgency scoring over the bundled task stores.
//!
//! These tests exercise the full path from stored tasks through the trait
//! evaluators, the score cache and the comparator.

use chrono::{DateTime, Duration, TimeZone, Utc};
use indoc::indoc;
use urgency_core::{
    CoreError, MemoryTaskStore, Task, TaskAccessor, TaskDb, TraitKind, UrgencyConfig,
    UrgencyEngine,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn engine() -> UrgencyEngine {
    UrgencyEngine::new(UrgencyConfig::default()).with_current_time(now())
}

/// Priority A, overdue by two weeks, not started, created today, tagged
/// `Perl` through its project, blocked by one open task.
fn worked_example(db: &TaskDb) {
    db.create_task(&Task::new("proj", "Perl project").with_tags(["Perl"]))
        .unwrap();
    db.create_task(&Task::new("b1", "Prerequisite").with_state("TODO"))
        .unwrap();
    db.create_task(
        &Task::new("t1", "Port the parser")
            .with_state("TODO")
            .with_priority("A")
            .with_deadline(now() - Duration::days(14))
            .with_created_at(now())
            .with_outline_parent("proj")
            .with_parents(["b1"]),
    )
    .unwrap();
}

#[test]
fn test_worked_example_totals_21() {
    let db = TaskDb::open_memory().unwrap();
    worked_example(&db);

    let breakdown = engine().breakdown(&db, "t1").unwrap();
    assert_eq!(breakdown.trait_score(TraitKind::Priority), 6.0);
    assert_eq!(breakdown.trait_score(TraitKind::Deadline), 12.0);
    assert_eq!(breakdown.trait_score(TraitKind::Activity), 0.0);
    assert_eq!(breakdown.trait_score(TraitKind::Age), 0.0);
    assert_eq!(breakdown.trait_score(TraitKind::Tag), 1.0);
    assert_eq!(breakdown.trait_score(TraitKind::Blocking), 2.0);
    assert_eq!(breakdown.total_score, 21.0);
}

#[test]
fn test_worked_example_table() {
    let db = TaskDb::open_memory().unwrap();
    worked_example(&db);

    let table = engine().describe(&db, "t1").unwrap();
    let expected = indoc! {"
        | Property | Coefficient | Value | Score |
        |-
        | Priority | 1.0 | 6.00 (A) | 6.00 |
        | Deadline | 12.00 | 1.00 <2024-06-01 Sat> | 12.00 |
        | Activity | 4.00 | 0.00 (inactive) | 0.00 |
        | Age | 2.00 | 0.00 (0d) | 0.00 |
        | Tag :Perl: | 1.00 | 1.0 | 1.00 |
        | Blocking b1 | 2.00 | 1.0 | 2.00 |
        |-
        | Total | | | 21.00 |"};
    assert_eq!(table, expected);
}

#[test]
fn test_table_total_matches_cached_score() {
    let mut db = TaskDb::open_memory().unwrap();
    worked_example(&db);
    let engine = engine();

    let cached = engine.get_urgency_score(&mut db, "t1").unwrap();
    let table = engine.describe(&db, "t1").unwrap();
    assert!(table.ends_with(&format!("| Total | | | {cached:.2} |")));
}

#[test]
fn test_absent_rows_are_omitted() {
    let store: MemoryTaskStore = [Task::new("bare", "Bare")].into_iter().collect();
    let table = engine().describe(&store, "bare").unwrap();

    assert!(!table.contains("| Priority"));
    assert!(!table.contains("| Deadline"));
    assert!(!table.contains("| Age"));
    assert!(!table.contains("| Tag"));
    assert!(!table.contains("| Blocking"));
    assert!(table.contains("| Activity | 4.00 | 0.00 (inactive) | 0.00 |"));
    assert!(table.ends_with("| Total | | | 0.00 |"));
}

#[test]
fn test_blocking_done_and_dangling_parents() {
    let store: MemoryTaskStore = [
        Task::new("open", "Open").with_state("NEXT"),
        Task::new("done", "Done").with_state("DONE"),
        Task::new("t", "Blocked").with_parents(["open", "done", "vanished"]),
    ]
    .into_iter()
    .collect();

    let breakdown = engine().breakdown(&store, "t").unwrap();
    assert_eq!(breakdown.trait_score(TraitKind::Blocking), 2.0);
}

#[test]
fn test_tags_next_and_other() {
    let store: MemoryTaskStore = [Task::new("t", "Tagged").with_tags(["other", "next"])]
        .into_iter()
        .collect();
    let breakdown = engine().breakdown(&store, "t").unwrap();
    assert_eq!(breakdown.trait_score(TraitKind::Tag), 16.0);
}

#[test]
fn test_cache_is_stale_until_refresh_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("urgency.db");
    let engine = engine();

    {
        let mut db = TaskDb::open_path(&path).unwrap();
        worked_example(&db);
        assert_eq!(engine.get_urgency_score(&mut db, "t1").unwrap(), 21.0);
    }

    let mut db = TaskDb::open_path(&path).unwrap();
    db.set_state("b1", Some("DONE")).unwrap();
    assert_eq!(engine.get_urgency_score(&mut db, "t1").unwrap(), 21.0);
    assert_eq!(engine.update_urgency_score(&mut db, "t1").unwrap(), 19.0);
    assert_eq!(engine.get_urgency_score(&mut db, "t1").unwrap(), 19.0);
}

#[test]
fn test_corrupted_cache_surfaces() {
    let mut db = TaskDb::open_memory().unwrap();
    worked_example(&db);
    db.set_property("t1", "URGENCY", "21,00").unwrap();

    assert!(matches!(
        engine().get_urgency_score(&mut db, "t1"),
        Err(CoreError::InvalidCachedScore { .. })
    ));
}

#[test]
fn test_stable_sort_30_20_20() {
    let mut db = TaskDb::open_memory().unwrap();
    for (id, score) in [("first20", 20.0), ("top", 30.0), ("second20", 20.0)] {
        db.create_task(&Task::new(id, id).with_property("URGENCY", score.to_string()))
            .unwrap();
    }

    let mut ids = db.task_ids().unwrap();
    engine().sort_by_urgency(&mut db, &mut ids).unwrap();
    assert_eq!(ids, vec!["top", "first20", "second20"]);

    let mut ids = vec!["second20".to_string(), "top".to_string(), "first20".to_string()];
    engine().sort_by_urgency(&mut db, &mut ids).unwrap();
    assert_eq!(ids, vec!["top", "second20", "first20"]);
}

#[test]
fn test_configurations_coexist() {
    let store: MemoryTaskStore = [Task::new("t", "Task").with_priority("B").with_state("NEXT")]
        .into_iter()
        .collect();

    let mut heavy = UrgencyConfig::default();
    heavy.activity_coefficient = 10.0;
    heavy.priority_scores.insert("B".into(), 0.0);

    let default_score = engine().compute_score(&store, "t").unwrap();
    let heavy_score = UrgencyEngine::new(heavy)
        .with_current_time(now())
        .compute_score(&store, "t")
        .unwrap();
    assert!((default_score - 7.9).abs() < 1e-9);
    assert_eq!(heavy_score, 10.0);
}

#[test]
fn test_both_stores_score_repeated_blockers_alike() {
    let tasks = vec![
        Task::new("b", "Blocker").with_state("TODO"),
        Task::new("t", "Twice blocked")
            .with_state("NEXT")
            .with_parents(["b", "b"]),
    ];

    let memory: MemoryTaskStore = tasks.iter().cloned().collect();
    let db = TaskDb::open_memory().unwrap();
    for task in &tasks {
        db.create_task(task).unwrap();
    }

    let from_memory = engine().breakdown(&memory, "t").unwrap();
    let from_db = engine().breakdown(&db, "t").unwrap();
    assert_eq!(from_memory.trait_score(TraitKind::Blocking), 4.0);
    assert_eq!(from_db.trait_score(TraitKind::Blocking), 4.0);
    assert_eq!(from_memory.total_score, from_db.total_score);
    assert_eq!(db.resolve_task("t").unwrap().parents, tasks[1].parents);
}
