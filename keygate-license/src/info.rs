//! Display-ready view of a validated record.

use crate::record::{EntitlementRecord, LicenseStatus, WIRE_UNBOUNDED};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// `expire_display` for a license without expiry.
pub const NEVER_EXPIRES: &str = "never";

/// Format of `expire_display`, always rendered in UTC.
pub const EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Uses left on a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingUses {
    Unlimited,
    Limited(u64),
}

impl Serialize for RemainingUses {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unlimited => serializer.serialize_i64(WIRE_UNBOUNDED),
            Self::Limited(n) => serializer.serialize_u64(*n),
        }
    }
}

/// Summary of a valid license for UIs and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidSummary {
    pub owner_id: String,
    pub features: Vec<String>,
    pub current_uses: u64,
    pub max_uses: Option<u64>,
    pub remaining_uses: RemainingUses,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub expire_at: Option<DateTime<Utc>>,
    pub expire_display: String,
    pub is_expired: bool,
    pub status: LicenseStatus,
}

/// Projects a record that has already passed validation.
///
/// Nothing is re-checked here. `is_expired` is recomputed against `now`,
/// which may be slightly later than the instant used for validation; a
/// record can therefore validate and still project as expired when the two
/// straddle its expiry.
#[must_use]
pub fn project(record: &EntitlementRecord, now: DateTime<Utc>) -> ValidSummary {
    let remaining_uses = match record.max_uses {
        None => RemainingUses::Unlimited,
        Some(max) => RemainingUses::Limited(max.saturating_sub(record.current_uses)),
    };
    let expire_display = match record.expire_at {
        None => NEVER_EXPIRES.to_string(),
        Some(at) => at.format(EXPIRY_FORMAT).to_string(),
    };

    ValidSummary {
        owner_id: record.owner_id.clone(),
        features: record.features.clone(),
        current_uses: record.current_uses,
        max_uses: record.max_uses,
        remaining_uses,
        expire_at: record.expire_at,
        expire_display,
        is_expired: record.is_expired(now),
        status: record.status,
    }
}
