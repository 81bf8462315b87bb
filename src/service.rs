use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::calendar;
use crate::models::*;
use crate::prediction;
use crate::repository::{CycleRepository, RepositoryError};
use crate::statistics;
use crate::store::KeyValueStore;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("end date {end} precedes start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("invalid month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
    #[error("export failed: {0}")]
    Export(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct NewPeriod {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub flow_intensity: FlowIntensity,
    pub symptoms: BTreeSet<String>,
    pub notes: String,
}

/// Partial period update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PeriodUpdate {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub flow_intensity: Option<FlowIntensity>,
    pub symptoms: Option<BTreeSet<String>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewDailyLog {
    pub date: NaiveDate,
    pub flow: FlowIntensity,
    pub mood: Mood,
    pub symptoms: BTreeSet<String>,
    pub temperature: Option<f32>,
    pub notes: String,
    pub partner_viewable: bool,
}

#[derive(Debug, Clone)]
pub struct NewSymptomEntry {
    pub date: NaiveDate,
    pub kind: String,
    pub severity: u8,
    pub notes: String,
}

/// The two user-override fields; derived settings are recomputed, never
/// set directly.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub average_cycle_length: Option<i64>,
    pub average_period_length: Option<i64>,
}

type TodaySource = Box<dyn Fn() -> NaiveDate + Send + Sync>;

/// The tracker core: explicit in-memory state plus the injected store.
///
/// Every mutation persists the touched collections before returning;
/// statistics are recomputed whenever the period collection changes.
/// Store write failures bubble up without rolling back the in-memory
/// state, and concurrent writers over a shared store are
/// last-writer-wins.
pub struct CycleTracker {
    repo: CycleRepository,
    data: TrackerData,
    today_source: TodaySource,
}

impl CycleTracker {
    /// Load all collections from the store. A corrupted collection comes
    /// back as its default; the rest load normally.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, ServiceError> {
        let repo = CycleRepository::new(store);
        let data = repo.load().await?;
        Ok(Self {
            repo,
            data,
            // Day boundary is device-local midnight. Whether it should
            // instead be UTC is an open product question; see DESIGN.md.
            today_source: Box::new(|| chrono::Local::now().date_naive()),
        })
    }

    /// Replace the "today" source. Intended for tests and callers that
    /// need a fixed day boundary.
    pub fn with_today_source(mut self, source: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today_source = Box::new(source);
        self
    }

    fn today(&self) -> NaiveDate {
        (self.today_source)()
    }

    pub fn data(&self) -> &TrackerData {
        &self.data
    }

    /// Recompute derived settings from the period history and persist
    /// them. Idempotent and side-effect-free on the history itself.
    pub async fn recalculate_statistics(&mut self) -> Result<(), ServiceError> {
        self.data.settings = statistics::recompute(&self.data.periods, &self.data.settings, self.today());
        tracing::debug!(
            cycle_day = self.data.settings.cycle_day,
            phase = ?self.data.settings.current_phase,
            "statistics recomputed"
        );
        self.repo.save_settings(&self.data.settings).await?;
        Ok(())
    }

    pub async fn add_period(&mut self, new: NewPeriod) -> Result<Uuid, ServiceError> {
        if let Some(end) = new.end_date {
            check_range(new.start_date, end)?;
        }
        let id = Uuid::new_v4();
        self.data.periods.push(Period {
            id,
            start_date: new.start_date,
            end_date: new.end_date,
            flow_intensity: new.flow_intensity,
            symptoms: new.symptoms,
            notes: new.notes,
            created_at: Utc::now(),
        });
        self.repo.save_periods(&self.data.periods).await?;
        self.recalculate_statistics().await?;
        Ok(id)
    }

    /// Apply a partial update. An unknown id is a silent no-op returning
    /// `Ok`; see DESIGN.md for why that stays.
    pub async fn update_period(&mut self, id: Uuid, update: PeriodUpdate) -> Result<(), ServiceError> {
        let Some(idx) = self.data.periods.iter().position(|p| p.id == id) else {
            tracing::debug!(%id, "update_period: unknown id, no-op");
            return Ok(());
        };

        let start = update.start_date.unwrap_or(self.data.periods[idx].start_date);
        let end = update.end_date.or(self.data.periods[idx].end_date);
        if let Some(end) = end {
            check_range(start, end)?;
        }

        let period = &mut self.data.periods[idx];
        period.start_date = start;
        period.end_date = end;
        if let Some(flow) = update.flow_intensity {
            period.flow_intensity = flow;
        }
        if let Some(symptoms) = update.symptoms {
            period.symptoms = symptoms;
        }
        if let Some(notes) = update.notes {
            period.notes = notes;
        }

        self.repo.save_periods(&self.data.periods).await?;
        self.recalculate_statistics().await?;
        Ok(())
    }

    /// Same silent no-op semantics as `update_period` for unknown ids.
    pub async fn delete_period(&mut self, id: Uuid) -> Result<(), ServiceError> {
        let before = self.data.periods.len();
        self.data.periods.retain(|p| p.id != id);
        if self.data.periods.len() == before {
            tracing::debug!(%id, "delete_period: unknown id, no-op");
            return Ok(());
        }
        self.repo.save_periods(&self.data.periods).await?;
        self.recalculate_statistics().await?;
        Ok(())
    }

    /// Upsert by date: a second write for the same day merges over the
    /// first, keeping `id` and `created_at` and bumping `updated_at`.
    /// Daily logs never trigger statistics recomputation.
    pub async fn add_daily_log(&mut self, new: NewDailyLog) -> Result<Uuid, ServiceError> {
        let now = Utc::now();
        let id = if let Some(existing) = self.data.daily_logs.iter_mut().find(|l| l.date == new.date) {
            existing.flow = new.flow;
            existing.mood = new.mood;
            existing.symptoms = new.symptoms;
            existing.temperature = new.temperature;
            existing.notes = new.notes;
            existing.partner_viewable = new.partner_viewable;
            existing.updated_at = now;
            existing.id
        } else {
            let id = Uuid::new_v4();
            self.data.daily_logs.push(DailyLog {
                id,
                date: new.date,
                flow: new.flow,
                mood: new.mood,
                symptoms: new.symptoms,
                temperature: new.temperature,
                notes: new.notes,
                partner_viewable: new.partner_viewable,
                created_at: now,
                updated_at: now,
            });
            id
        };
        self.repo.save_daily_logs(&self.data.daily_logs).await?;
        Ok(id)
    }

    pub fn daily_log(&self, date: NaiveDate) -> Option<&DailyLog> {
        self.data.daily_logs.iter().find(|l| l.date == date)
    }

    pub async fn add_symptom(&mut self, new: NewSymptomEntry) -> Result<Uuid, ServiceError> {
        let id = Uuid::new_v4();
        self.data.symptoms.push(SymptomEntry {
            id,
            date: new.date,
            kind: new.kind,
            severity: new.severity.clamp(1, 3),
            notes: new.notes,
        });
        self.repo.save_symptoms(&self.data.symptoms).await?;
        Ok(id)
    }

    pub fn symptoms_by_date(&self, date: NaiveDate) -> Vec<&SymptomEntry> {
        self.data.symptoms.iter().filter(|s| s.date == date).collect()
    }

    /// Merge the user-override lengths, then rederive everything else.
    pub async fn update_settings(&mut self, update: SettingsUpdate) -> Result<(), ServiceError> {
        if let Some(cycle_length) = update.average_cycle_length {
            self.data.settings.average_cycle_length = cycle_length;
        }
        if let Some(period_length) = update.average_period_length {
            self.data.settings.average_period_length = period_length;
        }
        self.recalculate_statistics().await
    }

    /// Three projected cycles, or none before the first logged period.
    pub fn predictions(&self) -> Vec<Prediction> {
        prediction::predictions(&self.data.settings)
    }

    /// One de-conflicted annotation per marked day of the month.
    pub fn calendar_annotations(
        &self,
        year: i32,
        month: u32,
    ) -> Result<BTreeMap<NaiveDate, CalendarAnnotation>, ServiceError> {
        if calendar::month_bounds(year, month).is_none() {
            return Err(ServiceError::InvalidMonth { year, month });
        }
        Ok(calendar::generate_annotations(
            &self.data.periods,
            &self.predictions(),
            year,
            month,
            self.today(),
        ))
    }

    /// Pretty-printed JSON dump of the full dataset.
    pub fn export_json(&self) -> Result<String, ServiceError> {
        Ok(serde_json::to_string_pretty(&self.data)?)
    }

    /// Delete everything, in the store and in memory.
    pub async fn wipe(&mut self) -> Result<(), ServiceError> {
        self.repo.clear().await?;
        self.data = TrackerData::default();
        Ok(())
    }
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), ServiceError> {
    if end < start {
        return Err(ServiceError::InvalidRange { start, end });
    }
    Ok(())
}
