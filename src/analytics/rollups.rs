use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, Local, NaiveDate, TimeZone};
use serde::Serialize;

use crate::models::visit::{UNKNOWN_PLACE, VisitRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub count: usize,
}

impl SeriesPoint {
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// String fields of a visit that can be grouped on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitField {
    City,
    Country,
    Path,
    Language,
    ScreenSize,
    Referrer,
}

impl VisitField {
    fn value<'a>(&self, record: &'a VisitRecord) -> &'a str {
        match self {
            VisitField::City => &record.city,
            VisitField::Country => &record.country,
            VisitField::Path => &record.path,
            VisitField::Language => &record.language,
            VisitField::ScreenSize => &record.screen_size,
            VisitField::Referrer => &record.referrer,
        }
    }
}

/// Local time of a visit. Records without a timestamp count as written now.
pub fn local_time(record: &VisitRecord) -> DateTime<Local> {
    record
        .timestamp
        .and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .unwrap_or_else(Local::now)
}

pub fn total_count(records: &[VisitRecord]) -> usize {
    records.len()
}

pub fn count_on_date(records: &[VisitRecord], date: NaiveDate) -> usize {
    records
        .iter()
        .filter(|r| local_time(r).date_naive() == date)
        .count()
}

/// Count occurrences keeping first-seen order
fn tally<I: IntoIterator<Item = String>>(keys: I) -> Vec<SeriesPoint> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut points: Vec<SeriesPoint> = Vec::new();

    for key in keys {
        match index.get(&key) {
            Some(&i) => points[i].count += 1,
            None => {
                index.insert(key.clone(), points.len());
                points.push(SeriesPoint::new(key, 1));
            }
        }
    }
    points
}

/// Group by an arbitrary key, most frequent first. Ties keep input order.
pub fn top_by<F>(records: &[VisitRecord], key: F, limit: usize) -> Vec<SeriesPoint>
where
    F: Fn(&VisitRecord) -> String,
{
    let mut points = tally(records.iter().map(key));
    points.sort_by(|a, b| b.count.cmp(&a.count));
    points.truncate(limit);
    points
}

pub fn top_by_field(records: &[VisitRecord], field: VisitField, limit: usize) -> Vec<SeriesPoint> {
    top_by(
        records,
        |r| {
            let value = field.value(r);
            if value.trim().is_empty() {
                UNKNOWN_PLACE.to_string()
            } else {
                value.to_string()
            }
        },
        limit,
    )
}

/// Visits per day for the `days` days ending at `today` (inclusive), oldest first
pub fn daily_series(records: &[VisitRecord], days: usize, today: NaiveDate) -> Vec<SeriesPoint> {
    let buckets: Vec<NaiveDate> = (0..days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset as u64)))
        .collect();

    let mut counts = vec![0usize; buckets.len()];
    for record in records {
        let day = local_time(record).date_naive();
        // Visits outside the window are dropped from the series
        if let Some(i) = buckets.iter().position(|bucket| *bucket == day) {
            counts[i] += 1;
        }
    }

    buckets
        .iter()
        .zip(counts)
        .map(|(day, count)| SeriesPoint::new(day.format("%b %-d").to_string(), count))
        .collect()
}

/// Visits per "Month Year", in first-seen order
pub fn monthly_series(records: &[VisitRecord]) -> Vec<SeriesPoint> {
    tally(
        records
            .iter()
            .map(|r| local_time(r).format("%B %Y").to_string()),
    )
}

/// Visits per calendar year, ascending
pub fn yearly_series(records: &[VisitRecord]) -> Vec<SeriesPoint> {
    let mut points = tally(records.iter().map(|r| local_time(r).year().to_string()));
    points.sort_by(|a, b| a.label.cmp(&b.label));
    points
}

/// Mean session length in whole seconds
pub fn average_duration(records: &[VisitRecord]) -> i64 {
    if records.is_empty() {
        return 0;
    }
    // Widened so corrupt durations cannot overflow the sum
    let total: i128 = records.iter().map(|r| i128::from(r.duration)).sum();
    // The mean of i64 values always fits back into an i64
    total.div_euclid(records.len() as i128) as i64
}
