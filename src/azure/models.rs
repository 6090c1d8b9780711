use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Envelope printed by `az graph query --output json`.
#[derive(Deserialize, Debug, Default)]
pub struct GraphQueryResponse {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub total_records: Option<u64>,
}

/// One row of the alerts projection, exactly as Resource Graph returns it.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawAlert {
    pub name: String,
    pub severity: String,
    #[serde(default)]
    pub resource_group: Option<String>,
    pub essentials: RawEssentials,
    pub subscription_id: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawEssentials {
    pub target_resource_type: String,
    pub monitor_condition: String,
    #[serde(default)]
    pub description: Option<String>,
    pub monitor_service: String,
    pub signal_type: String,
    pub start_date_time: String,
    pub last_modified_date_time: String,
    pub target_resource_group: String,
    pub action_status: RawActionStatus,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawActionStatus {
    #[serde(deserialize_with = "flexible_bool")]
    pub is_suppressed: bool,
}

/// Accepts `true` as well as `"true"` / `"True"`.
fn flexible_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Str(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::Str(s) => s.trim().to_ascii_lowercase().parse::<bool>().map_err(serde::de::Error::custom),
    }
}
