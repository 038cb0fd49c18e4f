//! Server-hosted brackets, each driven by the user who opened it.

use std::time::{Duration, Instant};

use dashmap::{DashMap, mapref::one::RefMut};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    dao::models::UserId,
    state::{
        bracket::{Advance, Bracket, BracketError},
        catalog::WorldCup,
    },
};

/// Reporting progress of the final winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteStatus {
    Pending,
    /// A report is being written to storage.
    InFlight,
    Recorded,
}

/// One bracket run owned by a user.
#[derive(Debug, Clone)]
pub struct TournamentSession {
    pub id: Uuid,
    pub owner: UserId,
    pub cup_id: String,
    pub title: String,
    pub bracket: Bracket,
    pub vote_status: VoteStatus,
    touched: Instant,
}

/// Winner to report for a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReport {
    pub cup_id: String,
    pub winner_name: String,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("tournament session `{0}` not found")]
    NotFound(Uuid),
    #[error("tournament session belongs to another user")]
    Forbidden,
    #[error(transparent)]
    Bracket(#[from] BracketError),
    #[error("tournament has no winner yet")]
    NotComplete,
    #[error("the winner of this tournament is already being recorded")]
    ReportInFlight,
}

/// Exclusive right to report the winner of one session, held while the vote is written.
#[must_use = "an unsettled claim is released when dropped"]
pub struct ReportClaim<'a> {
    registry: &'a SessionRegistry,
    id: Uuid,
    report: PendingReport,
    settled: bool,
}

impl ReportClaim<'_> {
    pub fn report(&self) -> &PendingReport {
        &self.report
    }

    /// A recorded winner discards the session and returns its final state; a failed report makes
    /// the session reportable again.
    pub fn settle(mut self, recorded: bool) -> Option<TournamentSession> {
        self.settled = true;
        if !recorded {
            return self.registry.release_report(self.id);
        }
        let (_, mut session) = self.registry.sessions.remove(&self.id)?;
        session.vote_status = VoteStatus::Recorded;
        Some(session)
    }
}

impl Drop for ReportClaim<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.registry.release_report(self.id);
        }
    }
}

/// Concurrent registry of live sessions with an idle time-to-live.
pub struct SessionRegistry {
    sessions: DashMap<Uuid, TournamentSession>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Open a freshly shuffled bracket on `cup` for `owner`.
    pub fn open(&self, owner: UserId, cup: &WorldCup) -> Result<TournamentSession, SessionError> {
        let session = TournamentSession {
            id: Uuid::new_v4(),
            owner,
            cup_id: cup.id.clone(),
            title: cup.title.clone(),
            bracket: Bracket::new(cup.contestants.clone())?,
            vote_status: VoteStatus::Pending,
            touched: Instant::now(),
        };
        self.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    fn owned(
        &self,
        id: Uuid,
        owner: UserId,
    ) -> Result<RefMut<'_, Uuid, TournamentSession>, SessionError> {
        let mut entry = self
            .sessions
            .get_mut(&id)
            .filter(|entry| entry.touched.elapsed() < self.ttl)
            .ok_or(SessionError::NotFound(id))?;
        if entry.owner != owner {
            return Err(SessionError::Forbidden);
        }
        entry.touched = Instant::now();
        Ok(entry)
    }

    pub fn snapshot(&self, id: Uuid, owner: UserId) -> Result<TournamentSession, SessionError> {
        Ok(self.owned(id, owner)?.clone())
    }

    /// Pick the winner of the current match by contestant name.
    pub fn select(
        &self,
        id: Uuid,
        owner: UserId,
        name: &str,
    ) -> Result<(TournamentSession, Advance), SessionError> {
        let mut entry = self.owned(id, owner)?;
        let bracket = &mut entry.bracket;
        let choice = match bracket.find_in_current_match(name) {
            Some(choice) => choice.clone(),
            None if bracket.is_complete() => return Err(BracketError::TournamentComplete.into()),
            None => return Err(BracketError::InvalidChoice(name.to_owned()).into()),
        };
        let advance = bracket.select_winner(&choice)?;
        Ok((entry.clone(), advance))
    }

    /// Claim the right to report the winner of a completed session.
    ///
    /// The claim must be settled with [`ReportClaim::settle`]; dropping it unsettled makes the
    /// session reportable again.
    pub fn begin_report(&self, id: Uuid, owner: UserId) -> Result<ReportClaim<'_>, SessionError> {
        let mut entry = self.owned(id, owner)?;
        let winner_name = entry
            .bracket
            .winner()
            .map(|winner| winner.name.clone())
            .ok_or(SessionError::NotComplete)?;

        match entry.vote_status {
            VoteStatus::Pending => {
                entry.vote_status = VoteStatus::InFlight;
                let report = PendingReport {
                    cup_id: entry.cup_id.clone(),
                    winner_name,
                };
                Ok(ReportClaim {
                    registry: self,
                    id,
                    report,
                    settled: false,
                })
            }
            VoteStatus::InFlight | VoteStatus::Recorded => Err(SessionError::ReportInFlight),
        }
    }

    fn release_report(&self, id: Uuid) -> Option<TournamentSession> {
        let mut entry = self.sessions.get_mut(&id)?;
        entry.vote_status = VoteStatus::Pending;
        entry.touched = Instant::now();
        Some(entry.clone())
    }

    pub fn remove(&self, id: Uuid, owner: UserId) -> Result<(), SessionError> {
        drop(self.owned(id, owner)?);
        self.sessions.remove(&id);
        Ok(())
    }

    /// Drop sessions idle for longer than the time-to-live, returning how many were removed.
    ///
    /// Sessions whose winner is being reported are kept until the claim settles.
    pub fn sweep_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| {
            session.vote_status == VoteStatus::InFlight || session.touched.elapsed() < self.ttl
        });
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::bracket::Contestant;

    fn cup(size: usize) -> WorldCup {
        WorldCup {
            id: "bts_32_songs".into(),
            title: "BTS".into(),
            contestants: (0..size)
                .map(|i| Contestant {
                    name: format!("song-{i}"),
                    media_ref: format!("vid-{i}"),
                    thumbnail_ref: format!("thumb-{i}"),
                })
                .collect(),
        }
    }

    fn play_to_completion(registry: &SessionRegistry, id: Uuid, owner: UserId) -> String {
        loop {
            let session = registry.snapshot(id, owner).unwrap();
            let Some(current) = session.bracket.current_match() else {
                return session.bracket.winner().unwrap().name.clone();
            };
            let pick = current.first.name.clone();
            registry.select(id, owner, &pick).unwrap();
        }
    }

    #[test]
    fn other_users_cannot_drive_a_session() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let session = registry.open(1, &cup(4)).unwrap();
        let first = session.bracket.current_match().unwrap().first.name.clone();

        assert!(matches!(
            registry.select(session.id, 2, &first),
            Err(SessionError::Forbidden)
        ));
        assert!(matches!(
            registry.remove(session.id, 2),
            Err(SessionError::Forbidden)
        ));
        assert_eq!(registry.snapshot(session.id, 1).unwrap().bracket.match_index(), 0);
    }

    #[test]
    fn unknown_name_is_an_invalid_choice() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let session = registry.open(1, &cup(4)).unwrap();

        let err = registry.select(session.id, 1, "nobody").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Bracket(BracketError::InvalidChoice(name)) if name == "nobody"
        ));
    }

    #[test]
    fn winner_is_reported_at_most_once() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let session = registry.open(1, &cup(5)).unwrap();
        assert!(matches!(
            registry.begin_report(session.id, 1),
            Err(SessionError::NotComplete)
        ));

        let winner = play_to_completion(&registry, session.id, 1);
        assert!(matches!(
            registry.select(session.id, 1, &winner),
            Err(SessionError::Bracket(BracketError::TournamentComplete))
        ));

        let claim = registry.begin_report(session.id, 1).unwrap();
        assert_eq!(claim.report().winner_name, winner);
        assert!(matches!(
            registry.begin_report(session.id, 1),
            Err(SessionError::ReportInFlight)
        ));

        let settled = claim.settle(true).unwrap();
        assert_eq!(settled.vote_status, VoteStatus::Recorded);
        assert!(matches!(
            registry.begin_report(session.id, 1),
            Err(SessionError::NotFound(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn failed_report_can_be_retried() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let session = registry.open(1, &cup(2)).unwrap();
        play_to_completion(&registry, session.id, 1);

        let claim = registry.begin_report(session.id, 1).unwrap();
        let released = claim.settle(false).unwrap();
        assert_eq!(released.vote_status, VoteStatus::Pending);
        assert!(registry.begin_report(session.id, 1).is_ok());
    }

    #[test]
    fn dropped_claim_releases_the_session() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let session = registry.open(1, &cup(3)).unwrap();
        play_to_completion(&registry, session.id, 1);

        let claim = registry.begin_report(session.id, 1).unwrap();
        drop(claim);

        assert_eq!(
            registry.snapshot(session.id, 1).unwrap().vote_status,
            VoteStatus::Pending
        );
        let claim = registry.begin_report(session.id, 1).unwrap();
        assert!(claim.settle(true).is_some());
    }

    #[test]
    fn sweep_keeps_sessions_being_reported() {
        let registry = SessionRegistry::new(Duration::from_millis(30));
        let session = registry.open(1, &cup(2)).unwrap();
        play_to_completion(&registry, session.id, 1);

        let claim = registry.begin_report(session.id, 1).unwrap();
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(registry.sweep_expired(), 0);

        let settled = claim.settle(true).unwrap();
        assert_eq!(settled.vote_status, VoteStatus::Recorded);
        assert!(registry.is_empty());
    }

    #[test]
    fn expired_sessions_are_hidden_and_swept() {
        let registry = SessionRegistry::new(Duration::ZERO);
        let session = registry.open(1, &cup(3)).unwrap();

        assert!(matches!(
            registry.snapshot(session.id, 1),
            Err(SessionError::NotFound(_))
        ));
        assert_eq!(registry.sweep_expired(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn cups_too_small_cannot_be_opened() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        assert!(matches!(
            registry.open(1, &cup(1)),
            Err(SessionError::Bracket(BracketError::NotEnoughParticipants(1)))
        ));
    }
}
