/// Ad cooldown computation.
pub mod ads_service;
/// OAuth login and session token issuance.
pub mod auth_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// External identity providers.
pub mod identity;
/// Quiz score submission and leaderboards.
pub mod quiz_service;
/// Weekly ranking.
pub mod ranking_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// Profile, statistics and ad rewards.
pub mod user_service;
/// World cup votes and tournament sessions.
pub mod worldcup_service;
