use chrono::NaiveDate;

use crate::models::{CyclePhase, CycleSettings, Period};

/// Derive cycle settings from the full period history.
///
/// Only `start_date` is read from each period, so an inverted
/// `end_date < start_date` record is tolerated here; that invariant is
/// enforced on the write path.
pub fn recompute(periods: &[Period], settings: &CycleSettings, today: NaiveDate) -> CycleSettings {
    if periods.is_empty() {
        return settings.clone();
    }

    let mut sorted: Vec<&Period> = periods.iter().collect();
    sorted.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    let last_start = sorted[0].start_date;

    let days_since_last_period = (today - last_start).num_days();

    let average_cycle_length = if sorted.len() >= 2 {
        let gaps: Vec<i64> = sorted
            .windows(2)
            .map(|w| (w[0].start_date - w[1].start_date).num_days())
            .collect();
        (gaps.iter().sum::<i64>() as f64 / gaps.len() as f64).round() as i64
    } else {
        settings.average_cycle_length
    };

    let next_period_date = last_start + chrono::Duration::days(average_cycle_length);
    let days_until_next_period = (next_period_date - today).num_days().max(0);

    CycleSettings {
        average_cycle_length,
        average_period_length: settings.average_period_length,
        last_period_date: Some(last_start),
        next_period_date: Some(next_period_date),
        current_phase: phase_for(days_since_last_period),
        days_until_next_period,
        cycle_day: days_since_last_period + 1,
    }
}

/// Phase from days since the last period start. The thresholds are fixed
/// absolute day counts, not scaled to the user's average cycle length.
fn phase_for(days_since_last_period: i64) -> CyclePhase {
    match days_since_last_period {
        d if d <= 5 => CyclePhase::Menstrual,
        d if d <= 13 => CyclePhase::Follicular,
        d if d <= 16 => CyclePhase::Ovulation,
        _ => CyclePhase::Luteal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlowIntensity;
    use chrono::Utc;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn period_starting(start: NaiveDate) -> Period {
        Period {
            id: Uuid::new_v4(),
            start_date: start,
            end_date: None,
            flow_intensity: FlowIntensity::Medium,
            symptoms: BTreeSet::new(),
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    fn days_ago(today: NaiveDate, days: i64) -> NaiveDate {
        today - chrono::Duration::days(days)
    }

    #[test]
    fn empty_history_leaves_settings_untouched() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let settings = CycleSettings::default();
        assert_eq!(recompute(&[], &settings, today), settings);
    }

    #[test]
    fn constant_spacing_yields_that_average() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        for spacing in [21i64, 28, 35] {
            let periods: Vec<Period> = (0i64..4)
                .map(|i| period_starting(days_ago(today, i * spacing)))
                .collect();
            let out = recompute(&periods, &CycleSettings::default(), today);
            assert_eq!(out.average_cycle_length, spacing);
        }
    }

    #[test]
    fn single_period_keeps_override_length() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let settings = CycleSettings {
            average_cycle_length: 31,
            ..CycleSettings::default()
        };
        let out = recompute(&[period_starting(days_ago(today, 3))], &settings, today);
        assert_eq!(out.average_cycle_length, 31);
        assert_eq!(out.next_period_date, Some(days_ago(today, 3) + chrono::Duration::days(31)));
    }

    #[test]
    fn days_until_next_period_never_negative() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        // Last period 40 days ago with a 28-day average puts the predicted
        // next period 12 days in the past.
        let periods = vec![
            period_starting(days_ago(today, 40)),
            period_starting(days_ago(today, 68)),
        ];
        let out = recompute(&periods, &CycleSettings::default(), today);
        assert_eq!(out.days_until_next_period, 0);
    }

    #[test]
    fn phase_boundaries() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let cases = [
            (0, CyclePhase::Menstrual),
            (5, CyclePhase::Menstrual),
            (6, CyclePhase::Follicular),
            (13, CyclePhase::Follicular),
            (14, CyclePhase::Ovulation),
            (16, CyclePhase::Ovulation),
            (17, CyclePhase::Luteal),
            (30, CyclePhase::Luteal),
        ];
        for (days, expected) in cases {
            let out = recompute(
                &[period_starting(days_ago(today, days))],
                &CycleSettings::default(),
                today,
            );
            assert_eq!(out.current_phase, expected, "day {days}");
            assert_eq!(out.cycle_day, days + 1);
        }
    }

    #[test]
    fn four_periods_every_28_days() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let periods: Vec<Period> = [84i64, 56, 28, 0]
            .into_iter()
            .map(|d| period_starting(days_ago(today, d)))
            .collect();
        let out = recompute(&periods, &CycleSettings::default(), today);
        assert_eq!(out.average_cycle_length, 28);
        assert_eq!(out.current_phase, CyclePhase::Menstrual);
        assert_eq!(out.cycle_day, 1);
        assert_eq!(out.days_until_next_period, 28);
        assert_eq!(out.last_period_date, Some(today));
    }

    #[test]
    fn single_period_twenty_days_ago_is_luteal() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let out = recompute(
            &[period_starting(days_ago(today, 20))],
            &CycleSettings::default(),
            today,
        );
        assert_eq!(out.current_phase, CyclePhase::Luteal);
        assert_eq!(out.cycle_day, 21);
        assert_eq!(out.average_cycle_length, 28);
        assert_eq!(out.days_until_next_period, 8);
    }

    #[test]
    fn inverted_end_date_is_tolerated() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let mut p = period_starting(days_ago(today, 2));
        p.end_date = Some(days_ago(today, 10));
        let out = recompute(&[p], &CycleSettings::default(), today);
        assert_eq!(out.cycle_day, 3);
    }

    #[test]
    fn uneven_gaps_round_to_nearest() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        // Gaps of 27 and 30 days; mean 28.5 rounds to 29.
        let periods = vec![
            period_starting(today),
            period_starting(days_ago(today, 27)),
            period_starting(days_ago(today, 57)),
        ];
        let out = recompute(&periods, &CycleSettings::default(), today);
        assert_eq!(out.average_cycle_length, 29);
    }
}
