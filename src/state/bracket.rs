//! Single-elimination bracket that reduces a field of contestants to one winner, one pairwise
//! choice at a time.
//!
//! A [`Bracket`] is a plain value: it owns its rounds, is mutated only through
//! [`Bracket::select_winner`], and can be serialized as a snapshot at any point.

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One entrant of a world cup (a song, an artist, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contestant {
    /// Display name, also used as the tally key when the winner is recorded.
    pub name: String,
    /// Reference to the playable media (e.g. a video identifier).
    pub media_ref: String,
    /// Reference to the preview image.
    pub thumbnail_ref: String,
}

/// Contract violations raised by a misbehaving driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    /// A bracket cannot be built from fewer than two contestants.
    #[error("a bracket needs at least two participants (got {0})")]
    NotEnoughParticipants(usize),
    /// The chosen contestant is not one of the two sides of the current match.
    #[error("`{0}` is not part of the current match")]
    InvalidChoice(String),
    /// The bracket already produced its winner.
    #[error("tournament already produced a winner")]
    TournamentComplete,
}

/// What a successful selection did to the bracket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The round continues with its next match.
    NextMatch,
    /// The round closed and a new, reshuffled round started.
    NextRound {
        /// 1-based number of the round that just started.
        round: usize,
        /// Number of contestants in the new round.
        size: usize,
    },
    /// Only one contestant remains: the bracket is terminal.
    Champion(Contestant),
}

/// The two sides of the match awaiting a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a> {
    /// Left-hand contestant.
    pub first: &'a Contestant,
    /// Right-hand contestant.
    pub second: &'a Contestant,
}

/// Tournament progress for a single driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    participants: Vec<Contestant>,
    current_round: Vec<Contestant>,
    winners_this_round: Vec<Contestant>,
    match_index: usize,
    round: usize,
    winner: Option<Contestant>,
}

impl Bracket {
    /// Shuffle `participants` with the thread-local RNG and open the first round.
    pub fn new(participants: Vec<Contestant>) -> Result<Self, BracketError> {
        Self::with_rng(participants, &mut rand::rng())
    }

    /// Shuffle `participants` with the given RNG and open the first round.
    pub fn with_rng<R: Rng + ?Sized>(
        participants: Vec<Contestant>,
        rng: &mut R,
    ) -> Result<Self, BracketError> {
        if participants.len() < 2 {
            return Err(BracketError::NotEnoughParticipants(participants.len()));
        }

        let mut first_round = participants.clone();
        first_round.shuffle(rng);

        Ok(Self {
            participants,
            current_round: first_round,
            winners_this_round: Vec::new(),
            match_index: 0,
            round: 1,
            winner: None,
        })
    }

    /// Original field, in the order it was supplied.
    pub fn participants(&self) -> &[Contestant] {
        &self.participants
    }

    /// Pool of the round in progress (or of the final round once terminal).
    pub fn current_round(&self) -> &[Contestant] {
        &self.current_round
    }

    /// Winners already decided in the round in progress.
    pub fn winners_this_round(&self) -> &[Contestant] {
        &self.winners_this_round
    }

    /// Zero-based index of the current match within the round.
    pub fn match_index(&self) -> usize {
        self.match_index
    }

    /// 1-based number of the round in progress.
    pub fn round(&self) -> usize {
        self.round
    }

    /// Final winner, once the bracket is terminal.
    pub fn winner(&self) -> Option<&Contestant> {
        self.winner.as_ref()
    }

    /// Whether the bracket reached its terminal state.
    pub fn is_complete(&self) -> bool {
        self.winner.is_some()
    }

    /// Number of full matches in the round in progress.
    pub fn match_count(&self) -> usize {
        self.current_round.len() / 2
    }

    /// Contestant left without an opponent this round, if the round size is odd.
    pub fn bye(&self) -> Option<&Contestant> {
        if self.current_round.len() % 2 == 1 {
            self.current_round.last()
        } else {
            None
        }
    }

    /// Presentation name of the round in progress.
    pub fn round_name(&self) -> String {
        round_name(self.current_round.len())
    }

    /// The match awaiting a decision, or `None` once terminal.
    pub fn current_match(&self) -> Option<Match<'_>> {
        if self.is_complete() {
            return None;
        }
        let base = self.match_index * 2;
        Some(Match {
            first: self.current_round.get(base)?,
            second: self.current_round.get(base + 1)?,
        })
    }

    /// Look up a side of the current match by name.
    pub fn find_in_current_match(&self, name: &str) -> Option<&Contestant> {
        let current = self.current_match()?;
        [current.first, current.second]
            .into_iter()
            .find(|contestant| contestant.name == name)
    }

    /// Record `choice` as the winner of the current match, reshuffling with the thread-local RNG
    /// when a new round opens.
    pub fn select_winner(&mut self, choice: &Contestant) -> Result<Advance, BracketError> {
        self.select_winner_with_rng(choice, &mut rand::rng())
    }

    /// Record `choice` as the winner of the current match.
    ///
    /// The state is left untouched when an error is returned.
    pub fn select_winner_with_rng<R: Rng + ?Sized>(
        &mut self,
        choice: &Contestant,
        rng: &mut R,
    ) -> Result<Advance, BracketError> {
        let current = self.current_match().ok_or(BracketError::TournamentComplete)?;
        if choice != current.first && choice != current.second {
            return Err(BracketError::InvalidChoice(choice.name.clone()));
        }

        self.winners_this_round.push(choice.clone());

        // A trailing contestant without an opponent is a bye, not a match.
        let next_base = (self.match_index + 1) * 2;
        if next_base + 1 < self.current_round.len() {
            self.match_index += 1;
            return Ok(Advance::NextMatch);
        }

        let mut next_round = std::mem::take(&mut self.winners_this_round);
        if let Some(bye) = self.bye() {
            next_round.push(bye.clone());
        }
        self.match_index = 0;

        if next_round.len() == 1 {
            let champion = next_round[0].clone();
            self.current_round = next_round;
            self.winner = Some(champion.clone());
            return Ok(Advance::Champion(champion));
        }

        next_round.shuffle(rng);
        self.current_round = next_round;
        self.round += 1;

        Ok(Advance::NextRound {
            round: self.round,
            size: self.current_round.len(),
        })
    }
}

/// Name shown for a round with `size` contestants.
pub fn round_name(size: usize) -> String {
    match size {
        0..=2 => "Final".into(),
        3..=4 => "Semi-finals".into(),
        5..=8 => "Quarter-finals".into(),
        _ => format!("Round of {size}"),
    }
}
