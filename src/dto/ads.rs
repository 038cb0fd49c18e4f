use serde::Serialize;
use utoipa::ToSchema;

/// Whether the user may watch another rewarded ad.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CooldownResponse {
    pub can_watch_ad: bool,
    /// Whole minutes left before the next ad, rounded up.
    pub time_remaining: i64,
}

impl CooldownResponse {
    pub fn from_remaining(minutes: i64) -> Self {
        Self {
            can_watch_ad: minutes == 0,
            time_remaining: minutes,
        }
    }
}
