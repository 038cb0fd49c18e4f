use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod ads;
pub mod auth;
pub mod common;
pub mod health;
pub mod quiz;
pub mod ranking;
pub mod user;
pub mod validation;
pub mod worldcup;

fn format_timestamp(time: OffsetDateTime) -> String {
    time.format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
