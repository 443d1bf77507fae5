use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::WorkoutEntry;

/// Everything done on one calendar day.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DayTotals {
    pub sessions: u32,
    pub total_reps: i64,
    pub total_time: f64,
    pub by_workout: BTreeMap<String, i64>,
}

/// How a day is coloured relative to the daily goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Rest,
    Light,
    Moderate,
    Strong,
    GoalMet,
}

impl Intensity {
    pub fn for_day(day: Option<&DayTotals>, daily_goal: i64) -> Self {
        let Some(day) = day.filter(|d| d.sessions > 0) else {
            return Intensity::Rest;
        };

        if daily_goal <= 0 {
            return Intensity::GoalMet;
        }

        let ratio = (day.total_reps.max(0) as f64 / daily_goal as f64).min(1.0);
        if ratio >= 1.0 {
            Intensity::GoalMet
        } else if ratio >= 0.67 {
            Intensity::Strong
        } else if ratio >= 0.34 {
            Intensity::Moderate
        } else {
            Intensity::Light
        }
    }

    /// Single character used by the terminal calendar.
    pub fn symbol(&self) -> char {
        match self {
            Intensity::Rest => '·',
            Intensity::Light => '░',
            Intensity::Moderate => '▒',
            Intensity::Strong => '▓',
            Intensity::GoalMet => '█',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub total_reps: i64,
    pub sessions: u32,
    pub intensity: Intensity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub daily_goal: i64,
    pub days: Vec<CalendarDay>,
}

impl MonthView {
    pub fn active_days(&self) -> usize {
        self.days.iter().filter(|d| d.sessions > 0).count()
    }

    pub fn total_reps(&self) -> i64 {
        self.days.iter().map(|d| d.total_reps).sum()
    }

    /// Monday-first grid, one line per week.
    pub fn render(&self) -> String {
        let mut out = String::from("Mo Tu We Th Fr Sa Su\n");
        let Some(first) = self.days.first() else {
            return out;
        };

        let offset = first.date.weekday().num_days_from_monday() as usize;
        let mut cells: Vec<String> = vec!["  ".to_string(); offset];
        cells.extend(self.days.iter().map(|d| format!("{}{}", d.intensity.symbol(), d.intensity.symbol())));

        for week in cells.chunks(7) {
            out.push_str(&week.join(" "));
            out.push('\n');
        }
        out
    }
}

/// Groups entries by the UTC day they were logged on.
pub fn bucket_by_day<'a>(entries: impl IntoIterator<Item = &'a WorkoutEntry>) -> BTreeMap<NaiveDate, DayTotals> {
    let mut buckets: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();

    for entry in entries {
        let day = buckets.entry(entry.day()).or_default();
        day.sessions += 1;
        day.total_reps += entry.reps;
        day.total_time += entry.time_taken;
        *day.by_workout.entry(entry.workout_name.clone()).or_insert(0) += entry.reps;
    }

    buckets
}

/// One cell per day of `year`-`month`, rest days included.
pub fn month_view(
    year: i32,
    month: u32,
    buckets: &BTreeMap<NaiveDate, DayTotals>,
    daily_goal: i64,
) -> Result<MonthView, String> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| format!("Invalid month: {}-{:02}", year, month))?;

    let days = first
        .iter_days()
        .take_while(|d| d.month() == month)
        .map(|date| {
            let totals = buckets.get(&date);
            CalendarDay {
                date,
                total_reps: totals.map(|t| t.total_reps).unwrap_or(0),
                sessions: totals.map(|t| t.sessions).unwrap_or(0),
                intensity: Intensity::for_day(totals, daily_goal),
            }
        })
        .collect();

    Ok(MonthView {
        year,
        month,
        daily_goal,
        days,
    })
}

/// Parses `YYYY-MM`.
pub fn parse_month(value: &str) -> Result<(i32, u32), String> {
    let (year, month) = value
        .trim()
        .split_once('-')
        .ok_or_else(|| format!("Invalid month '{}', expected YYYY-MM", value))?;

    let year = year.parse::<i32>().map_err(|_| format!("Invalid year in '{}'", value))?;
    let month = month.parse::<u32>().map_err(|_| format!("Invalid month in '{}'", value))?;
    if !(1..=12).contains(&month) {
        return Err(format!("Invalid month in '{}'", value));
    }
    Ok((year, month))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streaks {
    /// Consecutive active days ending today, or yesterday when today is
    /// still empty.
    pub current: u32,
    pub longest: u32,
}

pub fn streaks(buckets: &BTreeMap<NaiveDate, DayTotals>, today: NaiveDate) -> Streaks {
    let active = |day: &NaiveDate| buckets.get(day).map(|t| t.sessions > 0).unwrap_or(false);

    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in buckets.keys().filter(|d| active(d)) {
        run = match previous {
            Some(prev) if *day - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*day);
    }

    let mut cursor = if active(&today) { today } else { today - Duration::days(1) };
    let mut current = 0;
    while active(&cursor) {
        current += 1;
        cursor -= Duration::days(1);
    }

    Streaks { current, longest }
}
