//! World cup catalog, votes and server-hosted brackets.

use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        models::{UserId, VoteEntity},
        storage::StorageError,
    },
    dto::{
        common::SuccessResponse,
        worldcup::{
            CupResultsResponse, CupSummary, SelectWinnerRequest, SessionView, StartSessionRequest,
            VoteRequest,
        },
    },
    error::ServiceError,
    state::{SharedState, bracket::Advance, catalog::WorldCup},
};

/// Delay between two sweeps of idle sessions and stale rate-limit keys.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub fn list_cups(state: &SharedState) -> Vec<CupSummary> {
    state.catalog().iter().map(CupSummary::from).collect()
}

fn find_cup<'a>(state: &'a SharedState, cup_id: &str) -> Result<&'a WorldCup, ServiceError> {
    state
        .catalog()
        .get(cup_id)
        .ok_or_else(|| ServiceError::NotFound(format!("world cup `{cup_id}` not found")))
}

/// Record the final pick of a bracket played on the client, replacing any earlier vote.
pub async fn submit_vote(
    state: &SharedState,
    user_id: UserId,
    request: VoteRequest,
) -> Result<SuccessResponse, ServiceError> {
    let Some((cup_id, winner_name)) = request.into_parts() else {
        return Err(ServiceError::InvalidInput(
            "cupId and winnerName are required".into(),
        ));
    };
    let cup = find_cup(state, &cup_id)?;
    if cup.contestant(&winner_name).is_none() {
        return Err(ServiceError::InvalidInput(format!(
            "`{winner_name}` does not compete in `{cup_id}`"
        )));
    }

    let store = state.require_store().await?;
    store
        .record_vote(VoteEntity {
            user_id,
            cup_id: cup_id.clone(),
            winner_name: winner_name.clone(),
        })
        .await?;

    info!(user_id, cup_id = %cup_id, winner = %winner_name, "world cup vote recorded");
    Ok(SuccessResponse::new("Vote recorded successfully"))
}

pub async fn results(state: &SharedState, cup_id: String) -> Result<CupResultsResponse, ServiceError> {
    find_cup(state, &cup_id)?;
    let store = state.require_store().await?;
    let rows = store.cup_results(cup_id).await?;
    Ok(CupResultsResponse {
        results: rows.into_iter().map(Into::into).collect(),
    })
}

/// Open a freshly shuffled bracket on the requested cup.
pub fn start_session(
    state: &SharedState,
    user_id: UserId,
    request: StartSessionRequest,
) -> Result<SessionView, ServiceError> {
    let Some(cup_id) = request.cup_id else {
        return Err(ServiceError::InvalidInput("cupId is required".into()));
    };
    let cup = find_cup(state, &cup_id)?;
    let session = state.sessions().open(user_id, cup)?;

    debug!(user_id, session_id = %session.id, cup_id = %cup_id, "tournament session opened");
    Ok(SessionView::from(&session))
}

pub fn get_session(
    state: &SharedState,
    user_id: UserId,
    session_id: Uuid,
) -> Result<SessionView, ServiceError> {
    let session = state.sessions().snapshot(session_id, user_id)?;
    Ok(SessionView::from(&session))
}

/// Advance the bracket with the winner of the current match.
pub fn select_winner(
    state: &SharedState,
    user_id: UserId,
    session_id: Uuid,
    request: SelectWinnerRequest,
) -> Result<SessionView, ServiceError> {
    let Some(name) = request.name else {
        return Err(ServiceError::InvalidInput("name is required".into()));
    };
    let (session, advance) = state.sessions().select(session_id, user_id, &name)?;

    match &advance {
        Advance::NextMatch => {}
        Advance::NextRound { round, size } => {
            debug!(session_id = %session_id, round, size, "tournament advanced to next round");
        }
        Advance::Champion(champion) => {
            info!(
                session_id = %session_id,
                cup_id = %session.cup_id,
                champion = %champion.name,
                "tournament finished"
            );
        }
    }
    Ok(SessionView::from(&session))
}

/// Record the champion of a finished session as the user's vote.
///
/// The session is discarded once the vote is stored; a storage failure leaves it reportable. The
/// write runs on its own task so a caller going away cannot interrupt it half-way.
pub async fn submit_session(
    state: &SharedState,
    user_id: UserId,
    session_id: Uuid,
) -> Result<SessionView, ServiceError> {
    let state = state.clone();
    tokio::spawn(async move { report_session(&state, user_id, session_id).await })
        .await
        .map_err(|err| {
            ServiceError::Storage(StorageError::backend(
                "tournament report task failed".into(),
                err,
            ))
        })?
}

async fn report_session(
    state: &SharedState,
    user_id: UserId,
    session_id: Uuid,
) -> Result<SessionView, ServiceError> {
    let claim = state.sessions().begin_report(session_id, user_id)?;
    let report = claim.report().clone();

    let outcome = async {
        let store = state.require_store().await?;
        store
            .record_vote(VoteEntity {
                user_id,
                cup_id: report.cup_id.clone(),
                winner_name: report.winner_name.clone(),
            })
            .await
            .map_err(ServiceError::from)
    }
    .await;

    let settled = claim.settle(outcome.is_ok());
    outcome?;

    info!(
        user_id,
        session_id = %session_id,
        cup_id = %report.cup_id,
        winner = %report.winner_name,
        "tournament winner recorded as vote"
    );
    settled
        .map(|session| SessionView::from(&session))
        .ok_or_else(|| ServiceError::NotFound(format!("tournament session `{session_id}` not found")))
}

pub fn abandon_session(
    state: &SharedState,
    user_id: UserId,
    session_id: Uuid,
) -> Result<(), ServiceError> {
    state.sessions().remove(session_id, user_id)?;
    debug!(user_id, session_id = %session_id, "tournament session abandoned");
    Ok(())
}

/// Periodically drop idle sessions and forget replenished rate-limit keys.
pub async fn run_session_sweeper(state: SharedState) {
    let mut ticker = interval(SWEEP_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let removed = state.sessions().sweep_expired();
        if removed > 0 {
            debug!(removed, remaining = state.sessions().len(), "swept idle tournament sessions");
        }
        state.limits().retain_recent();
    }
}
