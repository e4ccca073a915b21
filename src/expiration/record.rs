//! Expiration records and their persisted form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::expiration::timer::TimerHandle;

/// Identity of one expirable object.
///
/// Supplied by the store adapter; the scheduler never generates one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpirableId(String);

impl ExpirableId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExpirableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExpirableId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ExpirableId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A pending expiration with its armed timer.
#[derive(Debug)]
pub struct ExpirationRecord {
    id: ExpirableId,
    expires_at: DateTime<Utc>,
    generation: u64,
    timer: TimerHandle,
}

impl ExpirationRecord {
    pub fn new(
        id: ExpirableId,
        expires_at: DateTime<Utc>,
        generation: u64,
        timer: TimerHandle,
    ) -> Self {
        Self {
            id,
            expires_at,
            generation,
            timer,
        }
    }

    pub fn id(&self) -> &ExpirableId {
        &self.id
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Arm counter of the timer this record owns.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop the timer without dropping the record.
    pub fn stop_timer(&self) {
        self.timer.stop();
    }

    pub fn to_persisted(&self) -> PersistedExpiration {
        PersistedExpiration {
            id: self.id.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// Serialized form of a record; the timer is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedExpiration {
    pub id: ExpirableId,
    pub expires_at: DateTime<Utc>,
}
