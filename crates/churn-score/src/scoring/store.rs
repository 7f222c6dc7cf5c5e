use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use uuid::Uuid;

use super::features::{FeatureName, FeatureVector, FEATURE_COUNT};

/// Name of the materialized view holding one feature row per (user, product).
pub const FEATURE_VIEW: &str = "churn_feature_mv";

/// Read-only access to precomputed behavioral features.
pub trait FeatureStore: Send + Sync {
    fn fetch(
        &self,
        user_id: Uuid,
        product_id: &str,
    ) -> Result<Option<FeatureVector>, FeatureStoreError>;
}

/// Error enumeration for feature store failures.
#[derive(Debug, thiserror::Error)]
pub enum FeatureStoreError {
    #[error("feature store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// Map-backed store used when no database is configured and in tests.
#[derive(Default, Clone)]
pub struct InMemoryFeatureStore {
    rows: Arc<RwLock<HashMap<(Uuid, String), FeatureVector>>>,
}

impl InMemoryFeatureStore {
    pub fn insert(&self, user_id: Uuid, product_id: impl Into<String>, vector: FeatureVector) {
        self.rows.write().insert((user_id, product_id.into()), vector);
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl FeatureStore for InMemoryFeatureStore {
    fn fetch(
        &self,
        user_id: Uuid,
        product_id: &str,
    ) -> Result<Option<FeatureVector>, FeatureStoreError> {
        Ok(self
            .rows
            .read()
            .get(&(user_id, product_id.to_string()))
            .copied())
    }
}

/// SQLite-backed store reading the `churn_feature_mv` view.
///
/// `user_id` is stored as the hyphenated UUID string and `prod_id` as text.
pub struct SqliteFeatureStore {
    conn: Mutex<Connection>,
    query: String,
}

impl SqliteFeatureStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FeatureStoreError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            query: select_statement(),
        }
    }
}

fn select_statement() -> String {
    let columns = FeatureName::ordered()
        .iter()
        .map(|name| name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {columns} FROM {FEATURE_VIEW} WHERE user_id = ?1 AND prod_id = ?2")
}

impl FeatureStore for SqliteFeatureStore {
    fn fetch(
        &self,
        user_id: Uuid,
        product_id: &str,
    ) -> Result<Option<FeatureVector>, FeatureStoreError> {
        let conn = self.conn.lock();
        let mut statement = conn.prepare_cached(&self.query)?;
        let row = statement
            .query_row(
                rusqlite::params![user_id.hyphenated().to_string(), product_id],
                |row| {
                    let mut values = [0.0; FEATURE_COUNT];
                    for (index, value) in values.iter_mut().enumerate() {
                        *value = row.get::<_, Option<f64>>(index)?.unwrap_or(0.0);
                    }
                    Ok(FeatureVector::new(values))
                },
            )
            .optional()?;
        Ok(row)
    }
}
