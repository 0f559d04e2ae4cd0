//! Groups 3-hour forecast samples into per-day summaries.

use chrono::{Local, NaiveDate, TimeZone};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::ForecastSample;

/// Aggregated view of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub dominant_condition: String,
    pub avg_humidity: f64,
    pub avg_wind_speed: f64,
    pub samples: Vec<ForecastSample>,
}

/// Extremes and mean over a whole forecast horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Buckets samples by calendar date in the system time zone.
pub fn aggregate(samples: &[ForecastSample]) -> BTreeMap<NaiveDate, DailySummary> {
    aggregate_in(samples, &Local)
}

/// Buckets samples by calendar date in `tz`.
pub fn aggregate_in<Tz: TimeZone>(
    samples: &[ForecastSample],
    tz: &Tz,
) -> BTreeMap<NaiveDate, DailySummary> {
    let mut buckets: BTreeMap<NaiveDate, Vec<ForecastSample>> = BTreeMap::new();
    for sample in samples {
        let date = sample.time.with_timezone(tz).date_naive();
        buckets.entry(date).or_default().push(sample.clone());
    }

    buckets
        .into_iter()
        .filter_map(|(date, bucket)| summarize(date, bucket).map(|s| (date, s)))
        .collect()
}

/// Keeps the first `n` dates.
pub fn first_days(
    daily: BTreeMap<NaiveDate, DailySummary>,
    n: usize,
) -> BTreeMap<NaiveDate, DailySummary> {
    daily.into_iter().take(n).collect()
}

pub fn temperature_stats(samples: &[ForecastSample]) -> Option<TemperatureStats> {
    let temps: Vec<f64> = samples.iter().map(|s| s.temperature).collect();
    let mean = mean(&temps)?;
    Some(TemperatureStats {
        min: temps.iter().copied().fold(f64::INFINITY, f64::min),
        max: temps.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean,
    })
}

fn summarize(date: NaiveDate, samples: Vec<ForecastSample>) -> Option<DailySummary> {
    let temps: Vec<f64> = samples.iter().map(|s| s.temperature).collect();
    let humidity: Vec<f64> = samples.iter().map(|s| f64::from(s.humidity_pct)).collect();
    let wind: Vec<f64> = samples.iter().map(|s| s.wind_speed).collect();

    // An empty bucket yields no summary rather than a division by zero.
    let avg_humidity = mean(&humidity)?;
    let avg_wind_speed = mean(&wind)?;
    let dominant_condition = dominant_condition(&samples)?;

    Some(DailySummary {
        date,
        min_temperature: temps.iter().copied().fold(f64::INFINITY, f64::min),
        max_temperature: temps.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        dominant_condition,
        avg_humidity,
        avg_wind_speed,
        samples,
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Most frequent condition.
///
/// On a tie the winner is the condition whose running count reaches the
/// maximum first, not the one seen first: `rain, clear, clear, rain` gives
/// `clear`.
fn dominant_condition(samples: &[ForecastSample]) -> Option<String> {
    let conditions: Vec<&str> = samples.iter().map(|s| s.condition.as_str()).collect();
    let max = tally(&conditions).into_iter().map(|(_, n)| n).max()?;

    let mut running: Vec<(&str, usize)> = Vec::new();
    for condition in conditions {
        let count = bump(&mut running, condition);
        if count == max {
            return Some(condition.to_string());
        }
    }
    None
}

fn tally<'a>(conditions: &[&'a str]) -> Vec<(&'a str, usize)> {
    let mut counts = Vec::new();
    for condition in conditions {
        bump(&mut counts, *condition);
    }
    counts
}

/// Increments the count for `condition`, returning its new value.
fn bump<'a>(counts: &mut Vec<(&'a str, usize)>, condition: &'a str) -> usize {
    match counts.iter().position(|(c, _)| *c == condition) {
        Some(idx) => {
            counts[idx].1 += 1;
            counts[idx].1
        }
        None => {
            counts.push((condition, 1));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn sample(ts: &str, temp: f64, humidity: u8, wind: f64, condition: &str) -> ForecastSample {
        ForecastSample {
            time: DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc),
            temperature: temp,
            humidity_pct: humidity,
            wind_speed: wind,
            condition: condition.to_string(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_input_gives_empty_map() {
        assert!(aggregate(&[]).is_empty());
        assert!(aggregate_in(&[], &Utc).is_empty());
        assert_eq!(temperature_stats(&[]), None);
    }

    #[test]
    fn single_day_bucket_has_extrema_and_means() {
        let samples = vec![
            sample("2026-03-01T00:00:00Z", 4.0, 80, 2.0, "clear sky"),
            sample("2026-03-01T03:00:00Z", 1.0, 90, 3.0, "clear sky"),
            sample("2026-03-01T06:00:00Z", 9.0, 61, 5.5, "few clouds"),
        ];

        let daily = aggregate_in(&samples, &Utc);
        assert_eq!(daily.len(), 1);

        let day = &daily[&date(2026, 3, 1)];
        assert_eq!(day.min_temperature, 1.0);
        assert_eq!(day.max_temperature, 9.0);
        assert_eq!(day.avg_humidity, 77.0);
        assert!((day.avg_wind_speed - 3.5).abs() < 1e-9);
        assert_eq!(day.dominant_condition, "clear sky");
        assert_eq!(day.samples, samples);
    }

    #[test]
    fn samples_split_across_two_dates() {
        let samples = vec![
            sample("2026-03-01T09:00:00Z", 10.0, 50, 1.0, "rain"),
            sample("2026-03-01T12:00:00Z", 15.0, 50, 1.0, "rain"),
            sample("2026-03-02T09:00:00Z", 20.0, 50, 1.0, "clear sky"),
        ];

        let daily = aggregate_in(&samples, &Utc);
        let dates: Vec<_> = daily.keys().copied().collect();
        assert_eq!(dates, vec![date(2026, 3, 1), date(2026, 3, 2)]);

        let d1 = &daily[&date(2026, 3, 1)];
        assert_eq!((d1.min_temperature, d1.max_temperature), (10.0, 15.0));

        let d2 = &daily[&date(2026, 3, 2)];
        assert_eq!((d2.min_temperature, d2.max_temperature), (20.0, 20.0));
        assert_eq!(d2.samples.len(), 1);
    }

    #[test]
    fn averages_are_not_rounded() {
        let samples = vec![
            sample("2026-03-01T00:00:00Z", 0.0, 70, 1.0, "mist"),
            sample("2026-03-01T03:00:00Z", 0.0, 71, 1.0, "mist"),
            sample("2026-03-01T06:00:00Z", 0.0, 71, 2.0, "mist"),
        ];

        let day = &aggregate_in(&samples, &Utc)[&date(2026, 3, 1)];
        assert!((day.avg_humidity - 212.0 / 3.0).abs() < 1e-9);
        assert!((day.avg_wind_speed - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn dominant_condition_tie_goes_to_first_to_reach_max() {
        let samples = vec![
            sample("2026-03-01T00:00:00Z", 0.0, 50, 0.0, "clear"),
            sample("2026-03-01T03:00:00Z", 0.0, 50, 0.0, "clear"),
            sample("2026-03-01T06:00:00Z", 0.0, 50, 0.0, "rain"),
            sample("2026-03-01T09:00:00Z", 0.0, 50, 0.0, "rain"),
        ];
        assert_eq!(dominant_condition(&samples).as_deref(), Some("clear"));

        let samples = vec![
            sample("2026-03-01T00:00:00Z", 0.0, 50, 0.0, "rain"),
            sample("2026-03-01T03:00:00Z", 0.0, 50, 0.0, "clear"),
            sample("2026-03-01T06:00:00Z", 0.0, 50, 0.0, "clear"),
            sample("2026-03-01T09:00:00Z", 0.0, 50, 0.0, "rain"),
        ];
        assert_eq!(dominant_condition(&samples).as_deref(), Some("clear"));
    }

    #[test]
    fn dominant_condition_prefers_majority() {
        let samples = vec![
            sample("2026-03-01T00:00:00Z", 0.0, 50, 0.0, "snow"),
            sample("2026-03-01T03:00:00Z", 0.0, 50, 0.0, "fog"),
            sample("2026-03-01T06:00:00Z", 0.0, 50, 0.0, "fog"),
        ];
        assert_eq!(dominant_condition(&samples).as_deref(), Some("fog"));
        assert_eq!(dominant_condition(&[]), None);
    }

    #[test]
    fn grouping_follows_the_given_time_zone() {
        let samples = vec![
            sample("2026-03-01T22:00:00Z", 5.0, 50, 0.0, "clear"),
            sample("2026-03-02T01:00:00Z", 6.0, 50, 0.0, "clear"),
        ];

        assert_eq!(aggregate_in(&samples, &Utc).len(), 2);

        let plus_three = chrono::FixedOffset::east_opt(3 * 3600).unwrap();
        let shifted = aggregate_in(&samples, &plus_three);
        assert_eq!(shifted.len(), 1);
        assert!(shifted.contains_key(&date(2026, 3, 2)));
    }

    #[test]
    fn first_days_keeps_earliest_dates() {
        let samples: Vec<_> = (1..=7)
            .map(|d| sample(&format!("2026-03-0{d}T12:00:00Z"), d as f64, 50, 0.0, "clear"))
            .collect();

        let daily = first_days(aggregate_in(&samples, &Utc), 5);
        assert_eq!(daily.len(), 5);
        assert_eq!(daily.keys().next(), Some(&date(2026, 3, 1)));
        assert_eq!(daily.keys().next_back(), Some(&date(2026, 3, 5)));
    }

    #[test]
    fn temperature_stats_cover_all_samples() {
        let samples = vec![
            sample("2026-03-01T00:00:00Z", -2.0, 50, 0.0, "snow"),
            sample("2026-03-02T00:00:00Z", 4.0, 50, 0.0, "snow"),
            sample("2026-03-03T00:00:00Z", 7.0, 50, 0.0, "snow"),
        ];

        let stats = temperature_stats(&samples).unwrap();
        assert_eq!(stats.min, -2.0);
        assert_eq!(stats.max, 7.0);
        assert!((stats.mean - 3.0).abs() < 1e-9);
    }
}
