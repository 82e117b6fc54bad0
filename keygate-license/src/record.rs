//! The entitlement record and its wire representation.
//!
//! Registry files and encrypted payloads share one JSON shape:
//!
//! ```json
//! {
//!   "user_id": "demo_user",
//!   "expire_time": 1767225600,
//!   "max_uses": 100,
//!   "current_uses": 0,
//!   "features": ["basic"],
//!   "created": "2025-01-01T00:00:00",
//!   "status": "active"
//! }
//! ```
//!
//! `expire_time` and `max_uses` use `-1` (or `null`) for "never" and
//! "unlimited". Registry entries must carry every field. Encrypted payloads
//! may omit `current_uses`, `status` and `created`.

use crate::error::{DecodeError, LicenseError, LicenseResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel for "never expires" and "unlimited uses" on the wire.
pub const WIRE_UNBOUNDED: i64 = -1;

pub(crate) const CURRENT_USES: &str = "current_uses";
const CREATED: &str = "created";
const STATUS: &str = "status";

/// Administrative status of a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    /// License may be used.
    Active,
    /// License is switched off regardless of expiry or usage.
    Disabled,
}

impl LicenseStatus {
    /// Wire spelling of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }
}

/// One issued license.
///
/// Records are snapshots; nothing in this crate mutates one after decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitlementRecord {
    /// Opaque identifier of the license holder.
    pub owner_id: String,
    /// Expiry instant, or `None` for a license that never expires.
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub expire_at: Option<DateTime<Utc>>,
    /// Usage quota, or `None` for unlimited.
    pub max_uses: Option<u64>,
    /// Uses consumed so far.
    pub current_uses: u64,
    /// Entitlement tags, in issue order.
    pub features: Vec<String>,
    pub status: LicenseStatus,
    /// Issue time. Informational; encrypted payloads may omit it.
    pub created_at: Option<DateTime<Utc>>,
}

impl EntitlementRecord {
    /// Returns true if the record has an expiry and `now` is past it.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_at.is_some_and(|at| now > at)
    }

    /// Returns true if the record has a quota and it is used up.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.max_uses.is_some_and(|max| self.current_uses >= max)
    }

    /// Returns true if `feature` is among the record's entitlements.
    #[must_use]
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    /// Builds a record from a registry entry. Every field is required.
    pub fn from_registry_value(value: &Value) -> Result<Self, DecodeError> {
        parse(value, Shape::Registry).map_err(DecodeError::MalformedRecord)
    }

    /// Builds a record from a decrypted payload.
    pub fn from_payload(value: &Value) -> Result<Self, DecodeError> {
        parse(value, Shape::Payload).map_err(DecodeError::MalformedPayload)
    }

    /// Renders the record in wire form.
    ///
    /// Fails for an expiry at exactly one second before the epoch, which
    /// would be written as the never-expires sentinel.
    pub fn to_wire(&self) -> LicenseResult<Value> {
        if self
            .expire_at
            .is_some_and(|at| at.timestamp() == WIRE_UNBOUNDED && at.timestamp_subsec_nanos() == 0)
        {
            return Err(LicenseError::InvalidRecord(
                "expiry collides with the never-expires sentinel".into(),
            ));
        }

        let wire = WireRecord {
            user_id: self.owner_id.clone(),
            expire_time: self.expire_at,
            max_uses: self.max_uses,
            current_uses: Some(self.current_uses),
            features: self.features.clone(),
            created: self.created_at,
            status: Some(self.status),
        };
        Ok(serde_json::to_value(wire)?)
    }
}

/// Wire shape shared by registry entries and encrypted payloads.
#[derive(Serialize, Deserialize)]
struct WireRecord {
    user_id: String,
    #[serde(with = "unbounded_expiry")]
    expire_time: Option<DateTime<Utc>>,
    #[serde(with = "unbounded_uses")]
    max_uses: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current_uses: Option<u64>,
    features: Vec<String>,
    #[serde(default, with = "iso_created", skip_serializing_if = "Option::is_none")]
    created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<LicenseStatus>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Shape {
    Registry,
    Payload,
}

fn parse(value: &Value, shape: Shape) -> Result<EntitlementRecord, String> {
    let wire = WireRecord::deserialize(value).map_err(|e| e.to_string())?;

    let current_uses = match (wire.current_uses, shape) {
        (Some(uses), _) => uses,
        (None, Shape::Payload) => 0,
        (None, Shape::Registry) => return Err(missing(CURRENT_USES)),
    };
    let status = match (wire.status, shape) {
        (Some(status), _) => status,
        (None, Shape::Payload) => LicenseStatus::Active,
        (None, Shape::Registry) => return Err(missing(STATUS)),
    };
    if wire.created.is_none() && shape == Shape::Registry {
        return Err(missing(CREATED));
    }

    Ok(EntitlementRecord {
        owner_id: wire.user_id,
        expire_at: wire.expire_time,
        max_uses: wire.max_uses,
        current_uses,
        features: wire.features,
        status,
        created_at: wire.created,
    })
}

fn missing(key: &str) -> String {
    format!("missing field `{key}`")
}

/// `expire_time`: epoch seconds, fractional allowed; `-1` or `null` is never.
mod unbounded_expiry {
    use super::WIRE_UNBOUNDED;
    use chrono::{DateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Number;

    const NANOS_PER_SEC: f64 = 1_000_000_000.0;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            None => serializer.serialize_i64(WIRE_UNBOUNDED),
            Some(at) if at.timestamp_subsec_nanos() == 0 => serializer.serialize_i64(at.timestamp()),
            Some(at) => serializer.serialize_f64(
                at.timestamp() as f64 + f64::from(at.timestamp_subsec_nanos()) / NANOS_PER_SEC,
            ),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let invalid = || D::Error::custom("expire_time must be epoch seconds or -1");
        let Some(number) = Option::<Number>::deserialize(deserializer)? else {
            return Ok(None);
        };

        if let Some(secs) = number.as_i64() {
            if secs == WIRE_UNBOUNDED {
                return Ok(None);
            }
            return DateTime::from_timestamp(secs, 0).map(Some).ok_or_else(invalid);
        }

        let value = number.as_f64().filter(|v| v.is_finite()).ok_or_else(invalid)?;
        if value == WIRE_UNBOUNDED as f64 {
            return Ok(None);
        }
        let whole = value.floor();
        if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
            return Err(invalid());
        }
        let mut secs = whole as i64;
        let mut nanos = ((value - whole) * NANOS_PER_SEC).round() as u32;
        if nanos >= 1_000_000_000 {
            secs += 1;
            nanos = 0;
        }
        DateTime::from_timestamp(secs, nanos).map(Some).ok_or_else(invalid)
    }
}

/// `max_uses`: non-negative integer; `-1` or `null` is unlimited.
mod unbounded_uses {
    use super::WIRE_UNBOUNDED;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Number;

    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            None => serializer.serialize_i64(WIRE_UNBOUNDED),
            Some(max) => serializer.serialize_u64(*max),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        match Option::<Number>::deserialize(deserializer)? {
            None => Ok(None),
            Some(n) if n.as_i64() == Some(WIRE_UNBOUNDED) => Ok(None),
            Some(n) => n.as_u64().map(Some).ok_or_else(|| {
                D::Error::custom("max_uses must be a non-negative integer or -1")
            }),
        }
    }
}

/// `created`: RFC 3339, or a naive ISO-8601 timestamp read as UTC.
mod iso_created {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(at) => serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let Some(text) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
            return Ok(Some(dt.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| Some(naive.and_utc()))
            .map_err(|_| D::Error::custom("created must be an ISO-8601 timestamp"))
    }
}
