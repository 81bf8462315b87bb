use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde::Deserialize;

use crate::models::{CycleSettings, DailyLog, Period, SymptomEntry, TrackerData};
use crate::store::{KeyValueStore, StoreError};

pub const KEY_PERIODS: &str = "periods";
pub const KEY_DAILY_LOGS: &str = "dailyLogs";
pub const KEY_SYMPTOMS: &str = "symptoms";
pub const KEY_SETTINGS: &str = "cycleSettings";

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Versioned wrapper around every persisted collection. Unknown versions
/// and unparseable payloads are rejected on load instead of being
/// silently coerced.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    schema_version: u32,
    items: T,
}

/// Typed load/save of the four collections over an injected keyed store.
pub struct CycleRepository {
    store: Arc<dyn KeyValueStore>,
}

impl CycleRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load all collections. A corrupted or unrecognized collection falls
    /// back to its default without affecting the others; only a store
    /// backend failure aborts the load.
    pub async fn load(&self) -> Result<TrackerData, RepositoryError> {
        Ok(TrackerData {
            periods: self.load_collection(KEY_PERIODS).await?,
            daily_logs: self.load_collection(KEY_DAILY_LOGS).await?,
            symptoms: self.load_collection(KEY_SYMPTOMS).await?,
            settings: self.load_collection(KEY_SETTINGS).await?,
        })
    }

    async fn load_collection<T>(&self, key: &str) -> Result<T, RepositoryError>
    where
        T: DeserializeOwned + Default,
    {
        let Some(value) = self.store.get(key).await? else {
            return Ok(T::default());
        };
        match serde_json::from_value::<Envelope<T>>(value) {
            Ok(env) if env.schema_version == SCHEMA_VERSION => Ok(env.items),
            Ok(env) => {
                tracing::warn!(
                    key,
                    version = env.schema_version,
                    "unknown schema version, using defaults"
                );
                Ok(T::default())
            }
            Err(err) => {
                tracing::warn!(key, %err, "corrupted collection, using defaults");
                Ok(T::default())
            }
        }
    }

    async fn save_collection<T: Serialize>(
        &self,
        key: &str,
        items: &T,
    ) -> Result<(), RepositoryError> {
        let value = serde_json::to_value(Envelope {
            schema_version: SCHEMA_VERSION,
            items,
        })?;
        self.store.set(key, value).await?;
        Ok(())
    }

    pub async fn save_periods(&self, periods: &[Period]) -> Result<(), RepositoryError> {
        self.save_collection(KEY_PERIODS, &periods).await
    }

    pub async fn save_daily_logs(&self, logs: &[DailyLog]) -> Result<(), RepositoryError> {
        self.save_collection(KEY_DAILY_LOGS, &logs).await
    }

    pub async fn save_symptoms(&self, symptoms: &[SymptomEntry]) -> Result<(), RepositoryError> {
        self.save_collection(KEY_SYMPTOMS, &symptoms).await
    }

    pub async fn save_settings(&self, settings: &CycleSettings) -> Result<(), RepositoryError> {
        self.save_collection(KEY_SETTINGS, settings).await
    }

    /// Delete all four collections permanently.
    pub async fn clear(&self) -> Result<(), RepositoryError> {
        for key in [KEY_PERIODS, KEY_DAILY_LOGS, KEY_SYMPTOMS, KEY_SETTINGS] {
            self.store.remove(key).await?;
        }
        Ok(())
    }
}
