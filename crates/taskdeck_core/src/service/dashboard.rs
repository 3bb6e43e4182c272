//! Dashboard aggregation over an in-memory task list.
//!
//! # Responsibility
//! - Derive summary statistics and chart series for a trailing day window.
//!
//! # Invariants
//! - Pure: no storage access, time comes from the `now` argument.
//! - Calendar days and weeks are evaluated in `now`'s time zone.
//! - Enum-grouped series contain every enum value, zero counts included,
//!   in declaration order.
//! - `completion_trend` has exactly one point per day, oldest first.

use crate::model::task::{Task, TaskCategory, TaskPriority, TaskStatus};
use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static TIMEFRAME_DAYS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("valid timeframe regex"));

/// Upper bound for a requested window.
pub const MAX_TIMEFRAME_DAYS: u32 = 366;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardError {
    /// Timeframe has no day count, a zero count, or exceeds the maximum.
    InvalidTimeframe(String),
}

impl Display for DashboardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimeframe(value) => write!(
                f,
                "invalid timeframe `{value}`; expected a day count between 1 and {MAX_TIMEFRAME_DAYS} such as `7days`"
            ),
        }
    }
}

impl Error for DashboardError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardRequest {
    /// Free-form window selector, e.g. `7days` or `30`.
    pub timeframe: String,
    /// Task count of the previous period, for `task_trend`.
    pub previous_total: usize,
    pub week_start: Weekday,
}

impl DashboardRequest {
    pub fn new(timeframe: impl Into<String>) -> Self {
        Self {
            timeframe: timeframe.into(),
            previous_total: 0,
            week_start: Weekday::Mon,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_tasks: usize,
    pub due_today: usize,
    pub high_priority: usize,
    pub completed_this_week: usize,
    /// Percent change versus the previous period, one decimal.
    pub task_trend: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartBucket {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub completed: usize,
    pub created: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub status_data: Vec<ChartBucket>,
    pub priority_data: Vec<ChartBucket>,
    pub category_data: Vec<ChartBucket>,
    pub completion_trend: Vec<TrendPoint>,
}

/// Parses the first run of digits in `timeframe` as a day count.
pub fn parse_timeframe_days(timeframe: &str) -> Result<u32, DashboardError> {
    TIMEFRAME_DAYS_RE
        .find(timeframe)
        .and_then(|found| found.as_str().parse::<u32>().ok())
        .filter(|days| (1..=MAX_TIMEFRAME_DAYS).contains(days))
        .ok_or_else(|| DashboardError::InvalidTimeframe(timeframe.to_string()))
}

/// Computes dashboard statistics and chart series.
pub fn compute_dashboard<Tz: TimeZone>(
    tasks: &[Task],
    request: &DashboardRequest,
    now: &DateTime<Tz>,
) -> Result<Dashboard, DashboardError> {
    let days = parse_timeframe_days(&request.timeframe)?;
    let zone = now.timezone();
    let today = now.date_naive();
    let week_start = start_of_week(today, request.week_start);
    let week_end = week_start + Days::new(6);
    let local_date = |epoch_ms: i64| {
        zone.timestamp_millis_opt(epoch_ms)
            .earliest()
            .map(|moment| moment.date_naive())
    };

    let due_today = tasks
        .iter()
        .filter(|task| task.due_date.and_then(local_date) == Some(today))
        .count();
    let high_priority = tasks.iter().filter(|task| task.priority.is_high()).count();
    let completed_this_week = tasks
        .iter()
        .filter(|task| task.status == TaskStatus::Completed)
        .filter_map(|task| task.completed_at.and_then(local_date))
        .filter(|date| (week_start..=week_end).contains(date))
        .count();

    let stats = DashboardStats {
        total_tasks: tasks.len(),
        due_today,
        high_priority,
        completed_this_week,
        task_trend: task_trend(tasks.len(), request.previous_total),
    };

    let status_data = TaskStatus::ALL
        .into_iter()
        .map(|status| bucket(status.as_str(), tasks.iter().filter(|t| t.status == status).count()))
        .collect();
    let priority_data = TaskPriority::ALL
        .into_iter()
        .map(|priority| {
            bucket(
                priority.as_str(),
                tasks.iter().filter(|t| t.priority == priority).count(),
            )
        })
        .collect();
    let category_data = TaskCategory::ALL
        .into_iter()
        .map(|category| {
            bucket(
                category.as_str(),
                tasks.iter().filter(|t| t.category == Some(category)).count(),
            )
        })
        .collect();

    let completion_trend = (0..days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
        .map(|date| TrendPoint {
            date,
            completed: tasks
                .iter()
                .filter(|task| task.completed_at.and_then(local_date) == Some(date))
                .count(),
            created: tasks
                .iter()
                .filter(|task| local_date(task.created_at) == Some(date))
                .count(),
        })
        .collect();

    Ok(Dashboard {
        stats,
        status_data,
        priority_data,
        category_data,
        completion_trend,
    })
}

/// Percent change of `current` versus `previous`; 0 when `previous` is 0.
pub fn task_trend(current: usize, previous: usize) -> f64 {
    if previous == 0 {
        return 0.0;
    }
    let change = (current as f64 - previous as f64) / previous as f64 * 100.0;
    (change * 10.0).round() / 10.0
}

fn start_of_week(day: NaiveDate, week_start: Weekday) -> NaiveDate {
    let back = (7 + day.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    day - Days::new(u64::from(back))
}

fn bucket(name: &str, value: usize) -> ChartBucket {
    ChartBucket {
        name: name.to_string(),
        value,
    }
}
