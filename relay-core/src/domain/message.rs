//! Result message domain types

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Precision of stored message timestamps, in fractional-second digits.
/// Matches PostgreSQL `TIMESTAMPTZ`, so timestamps survive a round trip.
pub const TIMESTAMP_PRECISION: u16 = 6;

/// A message reported by an execution unit
///
/// Messages are append-only; `(job_id, timestamp)` identifies one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub job_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(with = "crate::encoding::base64")]
    pub payload: Vec<u8>,
}

/// Timestamp for the next message of a job.
///
/// Never returns a value at or before `latest`: if the clock did not move (or
/// went backwards) the new timestamp is `latest` plus one microsecond.
pub fn next_timestamp(now: DateTime<Utc>, latest: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = now.trunc_subsecs(TIMESTAMP_PRECISION);
    match latest {
        Some(latest) if now <= latest => latest + chrono::Duration::microseconds(1),
        _ => now,
    }
}
