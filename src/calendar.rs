use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::models::{CalendarAnnotation, DayKind, Period, Prediction};

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }?;
    Some((first, next_month - Duration::days(1)))
}

/// Merge actual periods and predictions into one annotation per day of
/// the requested month.
///
/// Overlapping ranges resolve by kind precedence
/// `period > ovulation > luteal > follicular`, applied lowest first so a
/// later pass may overwrite an earlier one but never the reverse. Flags
/// are additive, except that a flag tied to a displaced kind (`is_pms` on
/// luteal, `is_peak` on ovulation) is dropped with it. Pure function;
/// recomputed fully on every call.
pub fn generate_annotations(
    periods: &[Period],
    predictions: &[Prediction],
    year: i32,
    month: u32,
    today: NaiveDate,
) -> BTreeMap<NaiveDate, CalendarAnnotation> {
    let Some((first, last)) = month_bounds(year, month) else {
        return BTreeMap::new();
    };
    let mut marks: BTreeMap<NaiveDate, CalendarAnnotation> = BTreeMap::new();

    // 1. Follicular (lowest): from a period's end to the eve of the next
    // ovulation.
    for (period_end, next_ovulation) in follicular_spans(periods, predictions) {
        for day in clamp_days(period_end, next_ovulation - Duration::days(1), first, last) {
            let entry = marks.entry(day).or_default();
            if entry.kind == DayKind::None {
                entry.kind = DayKind::Follicular;
            }
        }
    }

    // 2. Luteal, with the PMS flag on the final five days before the
    // predicted start. The flag only ever lands on a luteal day.
    for pred in predictions {
        let luteal_start = pred.ovulation_date + Duration::days(2);
        let luteal_end = pred.period_start - Duration::days(1);
        for day in clamp_days(luteal_start, luteal_end, first, last) {
            let entry = marks.entry(day).or_default();
            if entry.kind == DayKind::None {
                entry.kind = DayKind::Luteal;
            }
        }
        let pms_start = luteal_start.max(pred.period_start - Duration::days(5));
        for day in clamp_days(pms_start, luteal_end, first, last) {
            if let Some(entry) = marks.get_mut(&day) {
                if entry.kind == DayKind::Luteal {
                    entry.is_pms = true;
                }
            }
        }
    }

    // 3. Ovulation window overrides predicted phases outright.
    for pred in predictions {
        let window_start = pred.ovulation_date - Duration::days(1);
        let window_end = pred.ovulation_date + Duration::days(1);
        for day in clamp_days(window_start, window_end, first, last) {
            let entry = marks.entry(day).or_default();
            entry.kind = DayKind::Ovulation;
            entry.is_pms = false;
            if day == pred.ovulation_date {
                entry.is_peak = true;
            }
        }
    }

    // 4. Actual period days beat everything predicted.
    for period in periods {
        for day in clamp_days(period.start_date, period.effective_end(), first, last) {
            let entry = marks.entry(day).or_default();
            entry.kind = DayKind::Period;
            entry.is_pms = false;
            entry.is_peak = false;
            if day == period.start_date {
                entry.is_start = true;
            }
        }
    }

    // 5. Today is additive and never changes the kind.
    if today >= first && today <= last {
        marks.entry(today).or_default().is_today = true;
    }

    marks
}

/// Pairs of (period end, following ovulation) bounding a follicular
/// stretch: the most recent actual period feeds the first prediction's
/// ovulation, and each predicted period feeds the next prediction's.
fn follicular_spans(periods: &[Period], predictions: &[Prediction]) -> Vec<(NaiveDate, NaiveDate)> {
    let mut spans = Vec::new();
    if let (Some(first_pred), Some(last_period)) = (
        predictions.first(),
        periods.iter().max_by_key(|p| p.start_date),
    ) {
        spans.push((last_period.effective_end(), first_pred.ovulation_date));
    }
    for pair in predictions.windows(2) {
        spans.push((pair[0].period_end, pair[1].ovulation_date));
    }
    spans
}

/// Days of `[from, to]` intersected with `[lo, hi]`; empty when inverted.
fn clamp_days(
    from: NaiveDate,
    to: NaiveDate,
    lo: NaiveDate,
    hi: NaiveDate,
) -> impl Iterator<Item = NaiveDate> {
    let end = to.min(hi);
    from.max(lo).iter_days().take_while(move |d| *d <= end)
}
