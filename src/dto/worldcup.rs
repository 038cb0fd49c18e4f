use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::CupResultEntity,
    dto::validation::{validate_identifier, validate_not_blank},
    state::{
        bracket::Contestant,
        catalog::WorldCup,
        sessions::{TournamentSession, VoteStatus},
    },
};

/// Catalog entry of a world cup.
#[derive(Debug, Serialize, ToSchema)]
pub struct CupSummary {
    pub id: String,
    pub title: String,
    pub participant_count: usize,
}

impl From<&WorldCup> for CupSummary {
    fn from(cup: &WorldCup) -> Self {
        Self {
            id: cup.id.clone(),
            title: cup.title.clone(),
            participant_count: cup.contestants.len(),
        }
    }
}

/// Final pick of a bracket played on the client.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    #[validate(required, custom(function = validate_identifier))]
    pub cup_id: Option<String>,
    #[validate(required, custom(function = validate_not_blank))]
    pub winner_name: Option<String>,
}

impl VoteRequest {
    pub fn into_parts(self) -> Option<(String, String)> {
        Some((self.cup_id?, self.winner_name?))
    }
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CupResultsQuery {
    /// World cup whose tallies are requested.
    #[validate(required, custom(function = validate_identifier))]
    pub cup_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CupResultItem {
    pub participant_name: String,
    pub votes: i64,
}

impl From<CupResultEntity> for CupResultItem {
    fn from(row: CupResultEntity) -> Self {
        Self {
            participant_name: row.participant_name,
            votes: row.votes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CupResultsResponse {
    pub results: Vec<CupResultItem>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    #[validate(required, custom(function = validate_identifier))]
    pub cup_id: Option<String>,
}

/// Contestant picked as the winner of the current match.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SelectWinnerRequest {
    #[validate(required, custom(function = validate_not_blank))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContestantDto {
    pub name: String,
    pub media_ref: String,
    pub thumbnail_ref: String,
}

impl From<&Contestant> for ContestantDto {
    fn from(contestant: &Contestant) -> Self {
        Self {
            name: contestant.name.clone(),
            media_ref: contestant.media_ref.clone(),
            thumbnail_ref: contestant.thumbnail_ref.clone(),
        }
    }
}

/// Progress of a server-hosted bracket.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    pub id: Uuid,
    pub cup_id: String,
    pub title: String,
    pub round: usize,
    pub round_name: String,
    /// 1-based number of the current match; absent once a winner exists.
    pub match_number: Option<usize>,
    pub match_count: usize,
    /// The two sides of the current match; empty once a winner exists.
    pub current_match: Vec<ContestantDto>,
    pub winners_this_round: Vec<ContestantDto>,
    /// Contestant advancing without a match this round.
    pub bye: Option<ContestantDto>,
    pub winner: Option<ContestantDto>,
    pub vote_recorded: bool,
}

impl From<&TournamentSession> for SessionView {
    fn from(session: &TournamentSession) -> Self {
        let bracket = &session.bracket;
        let current_match = bracket
            .current_match()
            .map(|current| vec![current.first.into(), current.second.into()])
            .unwrap_or_default();

        Self {
            id: session.id,
            cup_id: session.cup_id.clone(),
            title: session.title.clone(),
            round: bracket.round(),
            round_name: bracket.round_name(),
            match_number: (!bracket.is_complete()).then(|| bracket.match_index() + 1),
            match_count: bracket.match_count(),
            current_match,
            winners_this_round: bracket
                .winners_this_round()
                .iter()
                .map(Into::into)
                .collect(),
            bye: bracket
                .bye()
                .filter(|_| !bracket.is_complete())
                .map(Into::into),
            winner: bracket.winner().map(Into::into),
            vote_recorded: session.vote_status == VoteStatus::Recorded,
        }
    }
}
