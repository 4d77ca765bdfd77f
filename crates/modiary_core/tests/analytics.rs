use chrono::NaiveDate;
use modiary_core::{
    daily_completion_ratio, days_in_month, monthly_diaries, monthly_routine_stats,
    monthly_summary, routines_for_date, AppState, CheckStatus, DiaryEntry, RecurrenceKind,
    RoutineMonthStat, RoutineTemplate,
};
use std::collections::BTreeSet;
use uuid::Uuid;

const WEEKDAYS: [u8; 5] = [1, 2, 3, 4, 5];

fn date(value: &str) -> NaiveDate {
    value.parse().unwrap()
}

fn routine(n: u128, text: &str, days: &[u8], order: i64) -> RoutineTemplate {
    RoutineTemplate {
        id: Uuid::from_u128(n),
        text: text.to_string(),
        kind: RecurrenceKind::Weekly,
        recurrence_days: days.iter().copied().collect::<BTreeSet<u8>>(),
        is_active: true,
        order,
    }
}

fn done(day: &str, n: u128) -> CheckStatus {
    CheckStatus {
        date: date(day),
        template_id: Uuid::from_u128(n),
        completed: true,
    }
}

fn diary(day: &str, content: &str) -> DiaryEntry {
    DiaryEntry {
        date: date(day),
        content: content.to_string(),
        mood: None,
    }
}

fn stat(n: u128, percent: u32) -> RoutineMonthStat {
    RoutineMonthStat {
        routine_id: Uuid::from_u128(n),
        text: format!("routine {n}"),
        scheduled: 4,
        completed: 0,
        percent,
    }
}

#[test]
fn daily_ratio_is_zero_when_nothing_is_checked() {
    let state = AppState {
        routines: vec![routine(1, "stretch", &[1, 3], 0)],
        ..AppState::default()
    };
    assert_eq!(daily_completion_ratio(&state, date("2024-03-18")), 0);
}

#[test]
fn daily_ratio_counts_only_routines_scheduled_that_day() {
    let state = AppState {
        routines: vec![
            routine(1, "stretch", &[1, 3], 0),
            routine(2, "read", &[3], 1),
            routine(3, "run", &[6], 2),
        ],
        check_statuses: vec![done("2024-03-20", 1)],
        ..AppState::default()
    };

    assert_eq!(daily_completion_ratio(&state, date("2024-03-20")), 50);
    assert_eq!(daily_completion_ratio(&state, date("2024-03-18")), 0);
}

#[test]
fn daily_ratio_is_zero_without_scheduled_routines() {
    let state = AppState {
        routines: vec![routine(1, "stretch", &[1], 0)],
        check_statuses: vec![done("2024-03-17", 1)],
        ..AppState::default()
    };
    assert_eq!(daily_completion_ratio(&state, date("2024-03-17")), 0);
    assert_eq!(daily_completion_ratio(&AppState::default(), date("2024-03-17")), 0);
}

#[test]
fn daily_ratio_ignores_archived_routines_and_rounds() {
    let mut archived = routine(4, "old", &[1], 3);
    archived.is_active = false;
    let state = AppState {
        routines: vec![
            routine(1, "a", &[1], 0),
            routine(2, "b", &[1], 1),
            routine(3, "c", &[1], 2),
            archived,
        ],
        check_statuses: vec![done("2024-03-18", 1), done("2024-03-18", 4)],
        ..AppState::default()
    };
    // 1 of 3 active routines: 33.33 rounds down.
    assert_eq!(daily_completion_ratio(&state, date("2024-03-18")), 33);

    let mut two_done = state.clone();
    two_done.check_statuses.push(done("2024-03-18", 2));
    // 2 of 3: 66.67 rounds up.
    assert_eq!(daily_completion_ratio(&two_done, date("2024-03-18")), 67);
}

#[test]
fn routines_for_date_sorts_by_order_and_keeps_completed_archived() {
    let mut archived_done = routine(3, "archived but done", &[1], 0);
    archived_done.is_active = false;
    let mut archived_idle = routine(4, "archived idle", &[1], 1);
    archived_idle.is_active = false;
    let state = AppState {
        routines: vec![
            routine(1, "second", &[1], 5),
            routine(2, "first", &[1], 2),
            archived_done,
            archived_idle,
            routine(5, "other day", &[2], 0),
        ],
        check_statuses: vec![done("2024-03-18", 3)],
        ..AppState::default()
    };

    let texts: Vec<&str> = routines_for_date(&state, date("2024-03-18"))
        .into_iter()
        .map(|routine| routine.text.as_str())
        .collect();
    assert_eq!(texts, vec!["archived but done", "first", "second"]);
}

#[test]
fn days_in_month_handles_leap_february() {
    assert_eq!(days_in_month(date("2024-02-10")).len(), 29);
    assert_eq!(days_in_month(date("2023-02-28")).len(), 28);
    let march = days_in_month(date("2024-03-31"));
    assert_eq!(march.first(), Some(&date("2024-03-01")));
    assert_eq!(march.last(), Some(&date("2024-03-31")));
}

#[test]
fn weekday_routine_is_scheduled_on_every_weekday_of_march_2024() {
    let state = AppState {
        routines: vec![routine(1, "work out", &WEEKDAYS, 0)],
        check_statuses: vec![
            done("2024-03-01", 1),
            done("2024-03-04", 1),
            // Saturday: not scheduled, must not count.
            done("2024-03-02", 1),
            // Other month.
            done("2024-04-01", 1),
        ],
        ..AppState::default()
    };

    let stats = monthly_routine_stats(&state, date("2024-03-15"));

    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].scheduled, 21);
    assert_eq!(stats[0].completed, 2);
    assert_eq!(stats[0].percent, 10);
}

#[test]
fn monthly_stats_skip_archived_and_survive_empty_recurrence() {
    let mut archived = routine(2, "archived", &WEEKDAYS, 1);
    archived.is_active = false;
    let state = AppState {
        routines: vec![routine(1, "never", &[], 0), archived],
        ..AppState::default()
    };

    let stats = monthly_routine_stats(&state, date("2024-03-01"));

    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].scheduled, 0);
    assert_eq!(stats[0].percent, 0);
}

#[test]
fn monthly_summary_averages_and_picks_first_best() {
    let summary = monthly_summary(&[stat(1, 50), stat(2, 75), stat(3, 75), stat(4, 0)]);

    assert_eq!(summary.average_percent, 50);
    assert_eq!(
        summary.best_routine.map(|best| best.routine_id),
        Some(Uuid::from_u128(2))
    );

    let mut counted = stat(5, 100);
    counted.completed = 4;
    let mut other = stat(6, 25);
    other.completed = 1;
    let summary = monthly_summary(&[counted, other]);
    assert_eq!(summary.total_completed, 5);
    // (100 + 25) / 2 = 62.5 rounds up.
    assert_eq!(summary.average_percent, 63);
}

#[test]
fn monthly_summary_of_nothing_is_empty() {
    let summary = monthly_summary(&[]);
    assert_eq!(summary.total_completed, 0);
    assert_eq!(summary.average_percent, 0);
    assert!(summary.best_routine.is_none());
}

#[test]
fn monthly_diaries_are_non_blank_and_newest_first() {
    let state = AppState {
        diaries: vec![
            diary("2024-03-02", "early"),
            diary("2024-03-20", "late"),
            diary("2024-03-10", "   "),
            diary("2024-04-01", "next month"),
            diary("2023-03-15", "last year"),
        ],
        ..AppState::default()
    };

    let dates: Vec<NaiveDate> = monthly_diaries(&state, date("2024-03-05"))
        .into_iter()
        .map(|entry| entry.date)
        .collect();
    assert_eq!(dates, vec![date("2024-03-20"), date("2024-03-02")]);
}
