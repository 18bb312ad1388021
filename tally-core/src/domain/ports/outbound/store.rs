use std::collections::HashMap;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Key for the persisted [`TimerSnapshot`](crate::domain::models::TimerSnapshot).
pub const ACTIVE_TIMER_KEY: &str = "activeTimer";
/// Key for the persisted [`CachedIdentity`](crate::domain::models::CachedIdentity).
pub const IDENTITY_KEY: &str = "identity";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Outbound port for small, local key-value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Values for the requested keys. Missing keys are simply absent.
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError>;

    async fn set(&self, values: HashMap<String, Value>) -> Result<(), StoreError>;

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError>;
}

/// Read and decode a single key.
pub async fn load<T, S>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let mut values = store.get(&[key]).await?;
    match values.remove(key) {
        Some(Value::Null) | None => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

/// Encode and write a single key.
pub async fn save<T, S>(store: &S, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let value = serde_json::to_value(value)?;
    store.set(HashMap::from([(key.to_string(), value)])).await
}
