use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of days a period spans when the user never logged an end date.
pub const DEFAULT_PERIOD_SPAN_DAYS: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlowIntensity {
    #[default]
    None,
    Light,
    Medium,
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Neutral,
    Happy,
    Sad,
    Irritable,
    Anxious,
    Energetic,
    Tired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CyclePhase {
    #[default]
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub flow_intensity: FlowIntensity,
    pub symptoms: BTreeSet<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl Period {
    /// Last day of the period, falling back to start + 4 days when the
    /// user never logged an end date.
    pub fn effective_end(&self) -> NaiveDate {
        self.end_date
            .unwrap_or(self.start_date + chrono::Duration::days(DEFAULT_PERIOD_SPAN_DAYS))
    }
}

/// One log per calendar day; writes for an existing date merge in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyLog {
    pub id: Uuid,
    pub date: NaiveDate,
    pub flow: FlowIntensity,
    pub mood: Mood,
    pub symptoms: BTreeSet<String>,
    pub temperature: Option<f32>,
    pub notes: String,
    pub partner_viewable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub kind: String,
    pub severity: u8, // 1-3
    pub notes: String,
}

/// Persisted cycle settings. The two length fields survive as user
/// overrides; everything else is derived and recomputed from the period
/// history whenever it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleSettings {
    pub average_cycle_length: i64,
    pub average_period_length: i64,
    pub last_period_date: Option<NaiveDate>,
    pub next_period_date: Option<NaiveDate>,
    pub current_phase: CyclePhase,
    pub days_until_next_period: i64,
    pub cycle_day: i64,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            average_cycle_length: 28,
            average_period_length: 5,
            last_period_date: None,
            next_period_date: None,
            current_phase: CyclePhase::Menstrual,
            days_until_next_period: 0,
            cycle_day: 1,
        }
    }
}

/// One projected cycle. Never persisted; regenerated from settings on
/// every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub ovulation_date: NaiveDate,
    pub fertile_window_start: NaiveDate,
    pub fertile_window_end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DayKind {
    #[default]
    None,
    Period,
    Follicular,
    Ovulation,
    Luteal,
}

/// The single resolved marker for one calendar day: one kind plus
/// orthogonal, additive flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CalendarAnnotation {
    pub kind: DayKind,
    pub is_start: bool,
    pub is_peak: bool,
    pub is_pms: bool,
    pub is_today: bool,
}

/// Everything the tracker holds in memory, mirroring the four store keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerData {
    pub periods: Vec<Period>,
    pub daily_logs: Vec<DailyLog>,
    pub symptoms: Vec<SymptomEntry>,
    pub settings: CycleSettings,
}
