use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, error, info};

use super::errors::{PlayDenied, RoomError};
use crate::quiz::{Quiz, QuizPayload, DEFAULT_TIMEOUT_SECS};

/// Where a room is in its round cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// No quiz broadcast; waiting for the first or next publish
    Idle,
    /// Current quiz broadcast, answers accepted
    Open,
    /// Every quiz in the set has been played
    Finished,
}

/// Result of an eligibility check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanPlay {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<PlayDenied>,
}

impl CanPlay {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn denied(reason: PlayDenied) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// Scoring of one closed round
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub correct_count: usize,
    pub total_answered: usize,
    pub sequence: usize,
    pub correct_option_index: usize,
    /// Option index -> number of participants who picked it
    pub histogram: BTreeMap<usize, usize>,
    #[serde(skip)]
    pub correct_participants: Vec<String>,
    #[serde(skip)]
    pub wrong_participants: Vec<String>,
    #[serde(skip)]
    pub is_final: bool,
}

/// Answers for a single sequence, kept in admission order
#[derive(Debug, Clone, Default)]
struct RoundAnswers {
    order: Vec<String>,
    choices: HashMap<String, usize>,
}

impl RoundAnswers {
    fn contains(&self, participant_id: &str) -> bool {
        self.choices.contains_key(participant_id)
    }

    fn record(&mut self, participant_id: &str, option_index: usize) {
        self.order.push(participant_id.to_string());
        self.choices.insert(participant_id.to_string(), option_index);
    }

    fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.order
            .iter()
            .filter_map(|p| self.choices.get(p).map(|choice| (p.as_str(), *choice)))
    }
}

/// State of one live quiz room
///
/// All mutation happens through `&mut self`; the service layer wraps each room
/// in its own async mutex so operations on one room are serialized.
#[derive(Debug, Clone)]
pub struct Room {
    id: String,
    name: String,
    quiz_set: Vec<Quiz>,
    sequence: usize,
    phase: Phase,
    answers: HashMap<usize, RoundAnswers>,
    eliminated: HashSet<String>,
    participants: HashSet<String>,
    encryption_mode: Option<String>,
    pending_invite: Option<String>,
    default_timeout: u32,
}

impl Room {
    pub fn new(
        id: String,
        name: String,
        quiz_set: Vec<Quiz>,
        encryption_mode: Option<String>,
    ) -> Self {
        if quiz_set.is_empty() {
            info!(room_id = %id, "Room created with an empty quiz set");
        }

        Self {
            id,
            name,
            quiz_set,
            sequence: 0,
            phase: Phase::Idle,
            answers: HashMap::new(),
            eliminated: HashSet::new(),
            participants: HashSet::new(),
            encryption_mode,
            pending_invite: None,
            default_timeout: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Generates a room id of two random words, for callers that do not bring one
    pub fn generate_id() -> String {
        petname::Petnames::default().generate_one(2, "-")
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sequence(&self) -> usize {
        self.sequence
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn quiz_count(&self) -> usize {
        self.quiz_set.len()
    }

    pub fn encryption_mode(&self) -> Option<&str> {
        self.encryption_mode.as_deref()
    }

    pub fn pending_invite(&self) -> Option<&str> {
        self.pending_invite.as_deref()
    }

    pub fn default_timeout(&self) -> u32 {
        self.default_timeout
    }

    pub fn is_participant(&self, participant_id: &str) -> bool {
        self.participants.contains(participant_id)
    }

    pub fn is_eliminated(&self, participant_id: &str) -> bool {
        self.eliminated.contains(participant_id)
    }

    pub fn has_answered(&self, participant_id: &str) -> bool {
        self.answers
            .get(&self.sequence)
            .is_some_and(|round| round.contains(participant_id))
    }

    /// Number of answers recorded for a sequence
    pub fn answer_count(&self, sequence: usize) -> usize {
        self.answers.get(&sequence).map_or(0, |r| r.order.len())
    }

    pub fn set_encryption_mode(&mut self, mode: Option<String>) {
        self.encryption_mode = mode;
    }

    pub fn set_default_timeout(&mut self, seconds: u32) {
        self.default_timeout = seconds;
    }

    pub fn set_pending_invite(&mut self, invitee: Option<String>) {
        self.pending_invite = invitee;
    }

    /// Swaps in a new quiz set; callers follow up with `reset`
    pub fn replace_quiz_set(&mut self, quiz_set: Vec<Quiz>) {
        self.quiz_set = quiz_set;
    }

    /// Back to the first quiz. The participant roster survives so a room can be
    /// replayed without everyone answering round 0 again.
    pub fn reset(&mut self) {
        debug!(room_id = %self.id, "Resetting room");
        self.sequence = 0;
        self.phase = Phase::Idle;
        self.answers.clear();
        self.eliminated.clear();
    }

    /// Opens the quiz at the current sequence and returns its outbound payload
    pub fn open_next(&mut self) -> Result<QuizPayload, RoomError> {
        if self.phase == Phase::Open {
            return Err(RoomError::QuizInProgress);
        }
        let quiz = self
            .quiz_set
            .get(self.sequence)
            .ok_or(RoomError::NoMoreQuiz)?;

        let payload = quiz.to_payload(self.sequence, self.quiz_set.len(), self.default_timeout);
        self.phase = Phase::Open;
        self.answers.insert(self.sequence, RoundAnswers::default());

        info!(room_id = %self.id, sequence = self.sequence, quiz_id = %payload.id, "Quiz opened");
        Ok(payload)
    }

    /// Stops accepting answers, advances the sequence and scores the closed round
    pub fn close(&mut self) -> Result<RoundSummary, RoomError> {
        if self.phase != Phase::Open {
            return Err(RoomError::AlreadyClosed);
        }

        let closed = self.sequence;
        self.sequence += 1;
        self.phase = if self.sequence >= self.quiz_set.len() {
            Phase::Finished
        } else {
            Phase::Idle
        };

        info!(room_id = %self.id, sequence = closed, "Quiz closed");
        // open_next only opens a sequence that exists in the set
        self.summarize(closed).ok_or(RoomError::NoMoreQuiz)
    }

    pub fn can_play(&self, participant_id: &str) -> CanPlay {
        if self.sequence == 0 {
            return CanPlay::allowed();
        }
        if !self.participants.contains(participant_id) {
            debug!(room_id = %self.id, participant = %participant_id, "Not a player");
            return CanPlay::denied(PlayDenied::NotAPlayer);
        }
        if self.eliminated.contains(participant_id) {
            debug!(room_id = %self.id, participant = %participant_id, "Already eliminated");
            return CanPlay::denied(PlayDenied::AlreadyEliminated);
        }
        CanPlay::allowed()
    }

    /// Admission checks for an answer followed by the commit itself
    pub fn submit_answer(
        &mut self,
        participant_id: &str,
        sequence_id: usize,
        option_index: usize,
    ) -> Result<(), RoomError> {
        if sequence_id != self.sequence {
            info!(
                room_id = %self.id,
                given = sequence_id,
                current = self.sequence,
                "Mismatched quiz id"
            );
            return Err(RoomError::SequenceMismatch {
                given: sequence_id,
                current: self.sequence,
            });
        }
        if self.phase != Phase::Open {
            return Err(RoomError::RoomClosed);
        }
        let eligibility = self.can_play(participant_id);
        if let Some(reason) = eligibility.reason {
            return Err(RoomError::CannotPlay(reason));
        }
        if self.has_answered(participant_id) {
            return Err(RoomError::AlreadyAnswered);
        }

        self.commit_answer(participant_id, option_index)
    }

    /// Records an answer for the open quiz and applies elimination. Only
    /// reachable through `submit_answer`, which runs the admission checks.
    fn commit_answer(
        &mut self,
        participant_id: &str,
        option_index: usize,
    ) -> Result<(), RoomError> {
        if self.phase != Phase::Open {
            return Err(RoomError::RoomClosed);
        }
        let sequence = self.sequence;
        let quiz = self.quiz_set.get(sequence).ok_or(RoomError::NoMoreQuiz)?;

        if option_index >= quiz.options.len() {
            error!(
                room_id = %self.id,
                participant = %participant_id,
                option = option_index,
                "Invalid answer"
            );
            return Err(RoomError::InvalidOption {
                option: option_index,
                count: quiz.options.len(),
            });
        }
        let correct = quiz.is_correct(option_index);

        let round = self.answers.entry(sequence).or_default();
        if round.contains(participant_id) {
            return Err(RoomError::AlreadyAnswered);
        }
        round.record(participant_id, option_index);

        if sequence == 0 {
            // Round 0 only builds the roster
            self.participants.insert(participant_id.to_string());
        } else if !correct {
            self.eliminated.insert(participant_id.to_string());
        }

        info!(
            room_id = %self.id,
            participant = %participant_id,
            sequence = sequence,
            option = option_index,
            "Answer collected"
        );
        Ok(())
    }

    /// Manual override restoring a participant's eligibility. Returns whether
    /// anything changed.
    pub fn relive(&mut self, participant_id: &str) -> bool {
        if self.can_play(participant_id).allowed {
            debug!(room_id = %self.id, participant = %participant_id, "Revive not needed");
            return false;
        }

        self.eliminated.remove(participant_id);
        self.participants.insert(participant_id.to_string());
        info!(room_id = %self.id, participant = %participant_id, "Participant revived");
        true
    }

    /// Scores the answers recorded for `sequence`
    pub fn summarize(&self, sequence: usize) -> Option<RoundSummary> {
        let quiz = self.quiz_set.get(sequence)?;

        let mut histogram: BTreeMap<usize, usize> = (0..quiz.options.len()).map(|i| (i, 0)).collect();
        let mut correct_participants = Vec::new();
        let mut wrong_participants = Vec::new();

        if let Some(round) = self.answers.get(&sequence) {
            for (participant, choice) in round.iter() {
                if quiz.is_correct(choice) {
                    correct_participants.push(participant.to_string());
                } else {
                    wrong_participants.push(participant.to_string());
                }
                if let Some(count) = histogram.get_mut(&choice) {
                    *count += 1;
                }
            }
        }

        Some(RoundSummary {
            correct_count: correct_participants.len(),
            total_answered: correct_participants.len() + wrong_participants.len(),
            sequence,
            correct_option_index: quiz.correct_option_index,
            histogram,
            correct_participants,
            wrong_participants,
            is_final: sequence + 1 == self.quiz_set.len(),
        })
    }
}
