use axum::{Router, middleware};

use crate::state::SharedState;

pub mod ads;
pub mod auth;
pub mod docs;
pub mod health;
mod rate_limit;
pub mod quiz;
pub mod ranking;
pub mod user;
pub mod worldcup;

use self::rate_limit::enforce_rate_limit;

/// Compose all route trees, wiring in shared state, rate limits and documentation routes.
///
/// Writes of scores, points and votes share the stricter submission budget; every other API
/// route draws from the general one. Health and documentation are not limited.
pub fn router(state: SharedState) -> Router<()> {
    let limits = state.limits();

    let api_router = auth::router()
        .merge(user::router())
        .merge(quiz::router())
        .merge(ranking::router())
        .merge(ads::router())
        .merge(worldcup::router())
        .route_layer(middleware::from_fn_with_state(limits.api(), enforce_rate_limit));

    let submission_router = user::submission_router()
        .merge(quiz::submission_router())
        .merge(worldcup::submission_router())
        .route_layer(middleware::from_fn_with_state(
            limits.submission(),
            enforce_rate_limit,
        ));

    let docs_router = docs::router(state.clone());

    api_router
        .merge(submission_router)
        .merge(health::router())
        .merge(docs_router)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
        response::Response,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::{TEST_CUP, sign_in, test_config, test_state, test_state_with};

    fn request(method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "198.51.100.1");
        if let Some(bearer) = bearer {
            builder = builder.header(header::AUTHORIZATION, bearer);
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn protected_routes_require_a_valid_token() {
        let (state, _store) = test_state().await;
        let app = router(state);

        let missing = app
            .clone()
            .oneshot(request(Method::GET, "/api/user/me", None, None))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert!(json_body(missing).await["message"].is_string());

        let forged = app
            .oneshot(request(
                Method::GET,
                "/api/user/me",
                Some("Bearer not.a.token"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(forged.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn login_then_profile() {
        let (state, _store) = test_state().await;
        let app = router(state);

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/auth/google",
                None,
                Some(json!({"code": "xyz"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let bearer = format!("Bearer {}", body["token"].as_str().unwrap());

        let profile = app
            .oneshot(request(Method::GET, "/api/user/me", Some(&bearer), None))
            .await
            .unwrap();
        assert_eq!(profile.status(), StatusCode::OK);
        let profile = json_body(profile).await;
        assert_eq!(profile["user_id"], body["user"]["user_id"]);
        assert_eq!(profile["points"], 0);
    }

    #[tokio::test]
    async fn missing_fields_are_bad_requests() {
        let (state, store) = test_state().await;
        let (_, bearer) = sign_in(&state, &store, "army").await;
        let app = router(state);

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/quiz/submit-score",
                Some(&bearer),
                Some(json!({"score": 10})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["message"].is_string());

        let response = app
            .oneshot(request(Method::GET, "/api/quiz/ranking", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn score_submission_is_created_and_ranked() {
        let (state, store) = test_state().await;
        let (_, bearer) = sign_in(&state, &store, "jk").await;
        let app = router(state);

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/quiz/submit-score",
                Some(&bearer),
                Some(json!({"quizId": "bts-basics", "score": 90})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["success"], true);

        let ranking = app
            .clone()
            .oneshot(request(
                Method::GET,
                "/api/quiz/ranking?quizId=bts-basics",
                None,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(json_body(ranking).await, json!([{"nickname": "jk", "picture_url": null, "score": 90}]));

        let rank = app
            .oneshot(request(
                Method::GET,
                "/api/ranking/my-weekly-rank",
                Some(&bearer),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(json_body(rank).await, json!({"rank": 1, "weekly_score": 90}));
    }

    #[tokio::test]
    async fn vote_and_results() {
        let (state, store) = test_state().await;
        let (_, bearer) = sign_in(&state, &store, "once").await;
        let app = router(state);

        let unknown = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/worldcup/vote",
                Some(&bearer),
                Some(json!({"cupId": "nope", "winnerName": "Butter"})),
            ))
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        let voted = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/worldcup/vote",
                Some(&bearer),
                Some(json!({"cupId": TEST_CUP, "winnerName": "Butter"})),
            ))
            .await
            .unwrap();
        assert_eq!(voted.status(), StatusCode::OK);

        let results = app
            .oneshot(request(
                Method::GET,
                &format!("/api/worldcup/results?cupId={TEST_CUP}"),
                None,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(
            json_body(results).await,
            json!({"results": [{"participant_name": "Butter", "votes": 1}]})
        );
    }

    #[tokio::test]
    async fn session_is_played_over_http() {
        let (state, store) = test_state().await;
        let (user_id, bearer) = sign_in(&state, &store, "stay").await;
        let (_, stranger) = sign_in(&state, &store, "stranger").await;
        let app = router(state);

        let opened = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/worldcup/sessions",
                Some(&bearer),
                Some(json!({"cupId": "twice_32_songs"})),
            ))
            .await
            .unwrap();
        assert_eq!(opened.status(), StatusCode::CREATED);
        let view = json_body(opened).await;
        let id = view["id"].as_str().unwrap().to_owned();
        assert_eq!(view["round_name"], "Final");

        let foreign = app
            .clone()
            .oneshot(request(
                Method::GET,
                &format!("/api/worldcup/sessions/{id}"),
                Some(&stranger),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(foreign.status(), StatusCode::FORBIDDEN);

        let wrong = app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/worldcup/sessions/{id}/select"),
                Some(&bearer),
                Some(json!({"name": "Dynamite"})),
            ))
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::CONFLICT);

        let selected = app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/worldcup/sessions/{id}/select"),
                Some(&bearer),
                Some(json!({"name": "FANCY"})),
            ))
            .await
            .unwrap();
        assert_eq!(selected.status(), StatusCode::OK);
        assert_eq!(json_body(selected).await["winner"]["name"], "FANCY");

        let submitted = app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/worldcup/sessions/{id}/submit"),
                Some(&bearer),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(submitted.status(), StatusCode::OK);
        assert_eq!(json_body(submitted).await["vote_recorded"], true);
        assert_eq!(
            store.vote_of(user_id, "twice_32_songs").await.as_deref(),
            Some("FANCY")
        );

        let gone = app
            .oneshot(request(
                Method::DELETE,
                &format!("/api/worldcup/sessions/{id}"),
                Some(&bearer),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn submissions_are_rate_limited_per_address() {
        let mut config = test_config();
        config.rate_limits.submission_max_requests = 2;
        let (state, store) = test_state_with(config).await;
        let (_, bearer) = sign_in(&state, &store, "limited").await;
        let app = router(state);

        let submit = || {
            request(
                Method::POST,
                "/api/quiz/submit-score",
                Some(&bearer),
                Some(json!({"quizId": "q", "score": 1})),
            )
        };
        for _ in 0..2 {
            let response = app.clone().oneshot(submit()).await.unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }
        let limited = app.clone().oneshot(submit()).await.unwrap();
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            json_body(limited).await["message"],
            "Too many requests, please try again later."
        );

        let health = app
            .oneshot(request(Method::GET, "/healthcheck", None, None))
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rotating_leading_forwarded_hops_share_one_budget() {
        let mut config = test_config();
        config.rate_limits.submission_max_requests = 2;
        let (state, store) = test_state_with(config).await;
        let (_, bearer) = sign_in(&state, &store, "rotating").await;
        let app = router(state);

        let mut statuses = Vec::new();
        for i in 0..3 {
            let mut req = request(
                Method::POST,
                "/api/quiz/submit-score",
                Some(&bearer),
                Some(json!({"quizId": "q", "score": 1})),
            );
            req.headers_mut().insert(
                "x-forwarded-for",
                header::HeaderValue::from_str(&format!("10.9.9.{i}, 203.0.113.5")).unwrap(),
            );
            statuses.push(app.clone().oneshot(req).await.unwrap().status());
        }
        assert_eq!(
            statuses,
            [
                StatusCode::CREATED,
                StatusCode::CREATED,
                StatusCode::TOO_MANY_REQUESTS
            ]
        );
    }

    #[tokio::test]
    async fn degraded_storage_answers_503() {
        let (state, store) = test_state().await;
        let (_, bearer) = sign_in(&state, &store, "offline").await;
        state.clear_store().await;
        let app = router(state);

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/api/user/my-stats", Some(&bearer), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let health = app
            .oneshot(request(Method::GET, "/healthcheck", None, None))
            .await
            .unwrap();
        assert_eq!(json_body(health).await, json!({"status": "degraded"}));
    }
}
