use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::alerts::types::{AlertCondition, AlertRecord, AlertTable};
use crate::azure::models::RawAlert;
use crate::error::NormalizationError;

/// Maps every raw row into an [`AlertRecord`], keeping input order.
/// The first malformed row fails the whole table.
pub fn normalize(raw: &[Value]) -> Result<AlertTable, NormalizationError> {
    raw.iter()
        .enumerate()
        .map(|(index, value)| normalize_one(index, value))
        .collect()
}

pub fn normalize_one(index: usize, value: &Value) -> Result<AlertRecord, NormalizationError> {
    let fail = |source: serde_json::Error| NormalizationError {
        index,
        name: value.get("name").and_then(Value::as_str).map(String::from),
        source,
    };

    let alert = RawAlert::deserialize(value).map_err(fail)?;
    let ess = alert.essentials;

    let condition = AlertCondition::parse(&ess.monitor_condition).ok_or_else(|| {
        fail(serde::de::Error::custom(format!(
            "unknown monitorCondition `{}`",
            ess.monitor_condition
        )))
    })?;

    Ok(AlertRecord {
        name: alert.name,
        severity: alert.severity,
        affected_resource: alert.resource_group.unwrap_or_default(),
        target_resource_type: ess.target_resource_type,
        condition,
        description: ess.description.unwrap_or_default(),
        monitor_service: ess.monitor_service,
        signal_type: ess.signal_type,
        fire_time: parse_timestamp(&ess.start_date_time),
        last_modified: parse_timestamp(&ess.last_modified_date_time),
        subscription: alert.subscription_id,
        target_resource_group: ess.target_resource_group,
        suppressed: ess.action_status.is_suppressed,
    })
}

/// RFC 3339 first, then offset-less forms read as UTC. Anything else is `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
