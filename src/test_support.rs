//! Fixtures shared by the unit tests: a state backed by the in-memory store.

use std::sync::Arc;

use crate::{
    config::AppConfig,
    dao::{
        arena_store::{ArenaStore, memory::MemoryArenaStore},
        models::{UserId, UserUpsert},
    },
    services::identity::stub::StubIdentityProvider,
    state::{AppState, SharedState, bracket::Contestant, catalog::WorldCup},
};

pub(crate) const TEST_CUP: &str = "bts_32_songs";

pub(crate) fn cup(id: &str, names: &[&str]) -> WorldCup {
    WorldCup {
        id: id.into(),
        title: format!("{id} world cup"),
        contestants: names
            .iter()
            .map(|name| Contestant {
                name: (*name).into(),
                media_ref: format!("{name}-video"),
                thumbnail_ref: format!("https://img.example.com/{name}.jpg"),
            })
            .collect(),
    }
}

pub(crate) fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.jwt_secret = "test-secret".into();
    config.cups = vec![
        cup(TEST_CUP, &["Dynamite", "Butter", "Spring Day", "DNA", "IDOL"]),
        cup("twice_32_songs", &["TT", "FANCY"]),
    ];
    config
}

/// State with an installed in-memory store, returned alongside the store for seeding.
pub(crate) async fn test_state_with(config: AppConfig) -> (SharedState, MemoryArenaStore) {
    let store = MemoryArenaStore::new();
    let state = AppState::new(config, Some(Arc::new(StubIdentityProvider)));
    state.set_store(Arc::new(store.clone())).await;
    (state, store)
}

pub(crate) async fn test_state() -> (SharedState, MemoryArenaStore) {
    test_state_with(test_config()).await
}

/// Register a user and return its identifier with a valid bearer header value.
pub(crate) async fn sign_in(
    state: &SharedState,
    store: &MemoryArenaStore,
    subject: &str,
) -> (UserId, String) {
    let user = store
        .upsert_user(UserUpsert {
            google_id: subject.into(),
            email: Some(format!("{subject}@example.com")),
            nickname: Some(subject.into()),
            picture_url: None,
        })
        .await
        .unwrap();
    let token = state.tokens().issue(user.user_id).unwrap();
    (user.user_id, format!("Bearer {token}"))
}
