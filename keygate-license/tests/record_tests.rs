mod common;

use chrono::{DateTime, Duration};
use common::{active_record, fixed_now};
use keygate_license::{DecodeError, EntitlementRecord, LicenseStatus};
use pretty_assertions::assert_eq;
use serde_json::json;

fn registry_entry() -> serde_json::Value {
    json!({
        "user_id": "demo_user",
        "expire_time": 1_751_328_000,
        "max_uses": 100,
        "current_uses": 7,
        "features": ["basic", "video"],
        "created": "2025-05-01T08:30:00.250000",
        "status": "active"
    })
}

// ── Predicates ───────────────────────────────────────────────────

#[test]
fn never_expiring_record_is_not_expired() {
    let record = active_record("u");
    assert!(!record.is_expired(fixed_now() + Duration::days(10_000)));
}

#[test]
fn expiry_is_strictly_after() {
    let mut record = active_record("u");
    record.expire_at = Some(fixed_now());
    assert!(!record.is_expired(fixed_now()));
    assert!(record.is_expired(fixed_now() + Duration::seconds(1)));
}

#[test]
fn exhaustion() {
    let mut record = active_record("u");
    assert!(!record.is_exhausted());
    record.max_uses = Some(3);
    record.current_uses = 2;
    assert!(!record.is_exhausted());
    record.current_uses = 3;
    assert!(record.is_exhausted());
    record.current_uses = 9;
    assert!(record.is_exhausted());
}

#[test]
fn zero_quota_is_exhausted_immediately() {
    let mut record = active_record("u");
    record.max_uses = Some(0);
    assert!(record.is_exhausted());
}

#[test]
fn has_feature() {
    let record = active_record("u");
    assert!(record.has_feature("basic"));
    assert!(!record.has_feature("admin"));
}

// ── Registry entries ─────────────────────────────────────────────

#[test]
fn parse_registry_entry() {
    let record = EntitlementRecord::from_registry_value(&registry_entry()).unwrap();
    assert_eq!(record.owner_id, "demo_user");
    assert_eq!(record.expire_at.unwrap().timestamp(), 1_751_328_000);
    assert_eq!(record.max_uses, Some(100));
    assert_eq!(record.current_uses, 7);
    assert_eq!(record.features, vec!["basic", "video"]);
    assert_eq!(record.status, LicenseStatus::Active);
    assert!(record.created_at.is_some());
}

#[test]
fn sentinels_and_nulls_mean_unbounded() {
    let mut entry = registry_entry();
    entry["expire_time"] = json!(-1);
    entry["max_uses"] = json!(null);
    let record = EntitlementRecord::from_registry_value(&entry).unwrap();
    assert_eq!(record.expire_at, None);
    assert_eq!(record.max_uses, None);
}

#[test]
fn rfc3339_created_accepted() {
    let mut entry = registry_entry();
    entry["created"] = json!("2025-05-01T08:30:00+02:00");
    let record = EntitlementRecord::from_registry_value(&entry).unwrap();
    assert_eq!(
        record.created_at.unwrap().to_rfc3339(),
        "2025-05-01T06:30:00+00:00"
    );
}

#[test]
fn every_registry_field_is_required() {
    for field in [
        "user_id",
        "expire_time",
        "max_uses",
        "current_uses",
        "features",
        "created",
        "status",
    ] {
        let mut entry = registry_entry();
        entry.as_object_mut().unwrap().remove(field);
        match EntitlementRecord::from_registry_value(&entry) {
            Err(DecodeError::MalformedRecord(msg)) => assert!(msg.contains(field), "{msg}"),
            other => panic!("expected MalformedRecord for {field}, got {other:?}"),
        }
    }
}

#[test]
fn mistyped_fields_rejected() {
    let cases = [
        ("current_uses", json!(-1)),
        ("current_uses", json!("3")),
        ("max_uses", json!(-7)),
        ("max_uses", json!(1.5)),
        ("status", json!("suspended")),
        ("status", json!(true)),
        ("features", json!("basic")),
        ("features", json!([1, 2])),
        ("user_id", json!(12)),
        ("expire_time", json!("tomorrow")),
        ("created", json!("last tuesday")),
    ];
    for (field, value) in cases {
        let mut entry = registry_entry();
        entry[field] = value.clone();
        assert!(
            matches!(
                EntitlementRecord::from_registry_value(&entry),
                Err(DecodeError::MalformedRecord(_))
            ),
            "{field} = {value} should be rejected"
        );
    }
}

#[test]
fn non_object_entry_rejected() {
    assert!(matches!(
        EntitlementRecord::from_registry_value(&json!(["not", "a", "record"])),
        Err(DecodeError::MalformedRecord(_))
    ));
}

// ── Encrypted payloads ───────────────────────────────────────────

#[test]
fn payload_requires_core_fields_only() {
    let payload = json!({"user_id": "u", "expire_time": -1, "max_uses": 3, "features": []});
    let record = EntitlementRecord::from_payload(&payload).unwrap();
    assert_eq!(record.max_uses, Some(3));
    assert_eq!(record.current_uses, 0);
}

#[test]
fn payload_missing_core_field_is_malformed_payload() {
    for field in ["user_id", "expire_time", "max_uses", "features"] {
        let mut payload =
            json!({"user_id": "u", "expire_time": -1, "max_uses": 3, "features": []});
        payload.as_object_mut().unwrap().remove(field);
        assert!(matches!(
            EntitlementRecord::from_payload(&payload),
            Err(DecodeError::MalformedPayload(_))
        ));
    }
}

// ── Wire form ────────────────────────────────────────────────────

#[test]
fn wire_form_uses_deployed_field_names() {
    let mut record = active_record("u");
    record.max_uses = Some(4);
    let wire = record.to_wire().unwrap();
    assert_eq!(wire["user_id"], "u");
    assert_eq!(wire["expire_time"], -1);
    assert_eq!(wire["max_uses"], 4);
    assert_eq!(wire["status"], "active");
    assert_eq!(EntitlementRecord::from_registry_value(&wire).unwrap(), record);
}

#[test]
fn fractional_expiry_keeps_subsecond_precision() {
    let mut entry = registry_entry();
    entry["expire_time"] = json!(1_700_000_000.5);
    let record = EntitlementRecord::from_registry_value(&entry).unwrap();

    let at = record.expire_at.unwrap();
    assert_eq!(at.timestamp(), 1_700_000_000);
    assert_eq!(at.timestamp_subsec_nanos(), 500_000_000);
    assert!(!record.is_expired(DateTime::from_timestamp(1_700_000_000, 400_000_000).unwrap()));
    assert!(record.is_expired(DateTime::from_timestamp(1_700_000_000, 600_000_000).unwrap()));

    let wire = record.to_wire().unwrap();
    assert_eq!(EntitlementRecord::from_registry_value(&wire).unwrap(), record);
}
