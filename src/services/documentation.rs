use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the K-Pop Quiz Arena backend.
#[openapi(
    paths(
        crate::routes::auth::google_login,
        crate::routes::user::me,
        crate::routes::user::my_stats,
        crate::routes::user::point_history,
        crate::routes::user::add_points,
        crate::routes::quiz::submit_score,
        crate::routes::quiz::ranking,
        crate::routes::ranking::weekly,
        crate::routes::ranking::my_weekly_rank,
        crate::routes::ads::check_cooldown,
        crate::routes::worldcup::list_cups,
        crate::routes::worldcup::vote,
        crate::routes::worldcup::results,
        crate::routes::worldcup::start_session,
        crate::routes::worldcup::get_session,
        crate::routes::worldcup::select_winner,
        crate::routes::worldcup::submit_session,
        crate::routes::worldcup::abandon_session,
        crate::routes::health::healthcheck,
    ),
    components(
        schemas(
            crate::dto::common::SuccessResponse,
            crate::dto::common::ErrorResponse,
            crate::dto::health::HealthResponse,
            crate::dto::auth::GoogleLoginRequest,
            crate::dto::auth::LoginResponse,
            crate::dto::user::UserProfileResponse,
            crate::dto::user::UserStatsResponse,
            crate::dto::user::PointHistoryItem,
            crate::dto::user::AddPointsRequest,
            crate::dto::user::AddPointsResponse,
            crate::dto::quiz::SubmitScoreRequest,
            crate::dto::quiz::QuizRankingEntry,
            crate::dto::ranking::WeeklyRankerResponse,
            crate::dto::ranking::MyWeeklyRankResponse,
            crate::dto::ads::CooldownResponse,
            crate::dto::worldcup::CupSummary,
            crate::dto::worldcup::VoteRequest,
            crate::dto::worldcup::CupResultItem,
            crate::dto::worldcup::CupResultsResponse,
            crate::dto::worldcup::StartSessionRequest,
            crate::dto::worldcup::SelectWinnerRequest,
            crate::dto::worldcup::ContestantDto,
            crate::dto::worldcup::SessionView,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "OAuth login"),
        (name = "user", description = "Profile, statistics and ad rewards"),
        (name = "quiz", description = "Quiz scores and leaderboards"),
        (name = "ranking", description = "Weekly leaderboard"),
        (name = "ads", description = "Rewarded ad cooldown"),
        (name = "worldcup", description = "World cup votes and tournament sessions"),
        (name = "health", description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
