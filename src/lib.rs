//! Cycle tracking and prediction engine.
//!
//! Turns a sparse history of period start/end dates into current-cycle
//! statistics, three-cycle-ahead predictions, and one de-conflicted
//! calendar annotation per day. Persistence goes through an injected
//! [`store::KeyValueStore`]; everything else is synchronous, day-granular
//! calendar arithmetic.

pub mod calendar;
pub mod models;
pub mod prediction;
pub mod repository;
pub mod service;
pub mod statistics;
pub mod store;

pub use models::{
    CalendarAnnotation, CyclePhase, CycleSettings, DailyLog, DayKind, FlowIntensity, Mood, Period,
    Prediction, SymptomEntry, TrackerData,
};
pub use repository::{CycleRepository, RepositoryError};
pub use service::{
    CycleTracker, NewDailyLog, NewPeriod, NewSymptomEntry, PeriodUpdate, ServiceError,
    SettingsUpdate,
};
pub use store::{KeyValueStore, MemoryStore, StoreError};
