use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::debug;

use super::actions::ActionOutcome;
use super::errors::DispatchError;

pub type DispatchResult = Result<ActionOutcome, DispatchError>;

/// Bounds for the message id cache
#[derive(Debug, Clone)]
pub struct DedupConfig {
    pub ttl: Duration,
    pub capacity: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(600),
            capacity: 10_000,
        }
    }
}

/// State of a message id at lookup time
#[derive(Debug, Clone, PartialEq)]
pub enum DedupStatus {
    /// First sighting; the id is now recorded and the caller must run the action
    New,
    /// Seen before, first delivery has not finished
    InFlight,
    /// Seen before, this is what the first delivery produced
    Completed(DispatchResult),
}

#[derive(Debug)]
struct DedupEntry {
    seen_at: DateTime<Utc>,
    outcome: Option<DispatchResult>,
}

#[derive(Debug, Default)]
struct DedupState {
    entries: HashMap<String, DedupEntry>,
    // insertion order, oldest first
    order: VecDeque<String>,
}

/// Message ids seen recently, each with the result of its first delivery
pub struct DedupCache {
    config: DedupConfig,
    state: Mutex<DedupState>,
}

impl DedupCache {
    pub fn new(config: DedupConfig) -> Self {
        Self {
            config,
            state: Mutex::new(DedupState::default()),
        }
    }

    pub fn check_and_record(&self, message_id: &str) -> DedupStatus {
        self.check_and_record_at(message_id, Utc::now())
    }

    pub fn check_and_record_at(&self, message_id: &str, now: DateTime<Utc>) -> DedupStatus {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.evict_expired(&mut state, now);

        if let Some(entry) = state.entries.get(message_id) {
            debug!(message_id = %message_id, "Duplicate message");
            return match &entry.outcome {
                Some(result) => DedupStatus::Completed(result.clone()),
                None => DedupStatus::InFlight,
            };
        }

        while state.order.len() >= self.config.capacity.max(1) {
            if let Some(oldest) = state.order.pop_front() {
                state.entries.remove(&oldest);
            }
        }
        state.order.push_back(message_id.to_string());
        state.entries.insert(
            message_id.to_string(),
            DedupEntry {
                seen_at: now,
                outcome: None,
            },
        );
        DedupStatus::New
    }

    /// Stores the result of the first delivery of `message_id`
    pub fn complete(&self, message_id: &str, result: &DispatchResult) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = state.entries.get_mut(message_id) {
            entry.outcome = Some(result.clone());
        }
    }

    /// Drops an id whose first delivery never produced a result, so a
    /// redelivery runs the action again. Completed ids are kept.
    pub fn forget(&self, message_id: &str) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state
            .entries
            .get(message_id)
            .is_some_and(|entry| entry.outcome.is_none())
        {
            state.entries.remove(message_id);
            state.order.retain(|id| id != message_id);
        }
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_expired(&self, state: &mut DedupState, now: DateTime<Utc>) {
        while let Some(oldest) = state.order.front() {
            let expired = state
                .entries
                .get(oldest)
                .map_or(true, |entry| entry.seen_at + self.config.ttl <= now);
            if !expired {
                break;
            }
            if let Some(oldest) = state.order.pop_front() {
                state.entries.remove(&oldest);
            }
        }
    }
}
