use chrono::Duration;

use crate::models::{CycleSettings, Prediction};

/// How many cycles ahead to project.
pub const PREDICTION_HORIZON: i64 = 3;

/// Days between ovulation and the next period start. A fixed assumption,
/// deliberately independent of the user's average cycle length.
const LUTEAL_PHASE_DAYS: i64 = 14;

/// Project the next three cycles from the current settings.
///
/// Returns an empty list when no period has ever been logged (no
/// `next_period_date`). Each prediction carries the period span, the
/// estimated ovulation date, and a fertile window of ovulation -5 to +1.
pub fn predictions(settings: &CycleSettings) -> Vec<Prediction> {
    let Some(next_period_date) = settings.next_period_date else {
        return Vec::new();
    };

    (0..PREDICTION_HORIZON)
        .map(|i| {
            let period_start = next_period_date + Duration::days(i * settings.average_cycle_length);
            let period_end = period_start + Duration::days(settings.average_period_length - 1);
            let ovulation_date = period_start - Duration::days(LUTEAL_PHASE_DAYS);
            Prediction {
                period_start,
                period_end,
                ovulation_date,
                fertile_window_start: ovulation_date - Duration::days(5),
                fertile_window_end: ovulation_date + Duration::days(1),
            }
        })
        .collect()
}
