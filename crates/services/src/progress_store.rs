//! The learner's progress, kept in memory and mirrored to a key/value store.
//!
//! Every mutator applies its change, writes the whole document, then calls
//! each subscriber with the new state before returning. A failed write keeps
//! the in-memory change and is reported as a [`PersistenceError`].

use std::fmt;
use std::sync::Arc;

use storage::document::{self, DEFAULT_STORAGE_KEY};
use storage::repository::KeyValueStore;
use tutor_core::model::{
    CollectionId, CollectionProgress, ExerciseCompletion, ExerciseId, ProgressState, QuestionId,
    UserAnswer,
};

use crate::error::PersistenceError;

/// Callback invoked with the current state.
pub type Listener = Box<dyn FnMut(&ProgressState) + Send>;

/// Handle returned by [`ProgressStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub storage_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_owned(),
        }
    }
}

pub struct ProgressStore {
    storage: Arc<dyn KeyValueStore>,
    storage_key: String,
    state: ProgressState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressStore")
            .field("storage_key", &self.storage_key)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl ProgressStore {
    /// Loads progress from `storage`, starting empty when nothing usable is
    /// stored.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStore>, config: StoreConfig) -> Self {
        let state = match storage.get(&config.storage_key) {
            None => {
                tracing::debug!(key = %config.storage_key, "no stored progress, starting empty");
                ProgressState::empty()
            }
            Some(raw) => match document::decode(&raw) {
                Ok(state) => {
                    tracing::debug!(
                        key = %config.storage_key,
                        answers = state.answers.len(),
                        completions = state.completions.len(),
                        collections = state.collections.len(),
                        "loaded stored progress"
                    );
                    state
                }
                Err(err) => {
                    tracing::warn!(
                        key = %config.storage_key,
                        error = %err,
                        "stored progress is unusable, starting empty"
                    );
                    ProgressState::empty()
                }
            },
        };

        Self {
            storage,
            storage_key: config.storage_key,
            state,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    #[must_use]
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    //
    // ─── MUTATIONS ─────────────────────────────────────────────────────────────
    //

    /// Records an answer, replacing any earlier answer to the same question.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if storage rejects the write. The answer is
    /// still recorded in memory and subscribers are still notified.
    pub fn save_answer(&mut self, answer: UserAnswer) -> Result<(), PersistenceError> {
        self.state.upsert_answer(answer);
        self.commit()
    }

    /// Records an exercise result, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if storage rejects the write.
    pub fn complete_exercise(&mut self, completion: ExerciseCompletion) -> Result<(), PersistenceError> {
        self.state.upsert_completion(completion);
        self.commit()
    }

    /// Records collection progress, replacing any earlier entry.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if storage rejects the write.
    pub fn update_collection_progress(
        &mut self,
        progress: CollectionProgress,
    ) -> Result<(), PersistenceError> {
        self.state.upsert_collection(progress);
        self.commit()
    }

    /// Forgets everything.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if storage rejects the write.
    pub fn clear_progress(&mut self) -> Result<(), PersistenceError> {
        self.state = ProgressState::empty();
        self.commit()
    }

    fn commit(&mut self) -> Result<(), PersistenceError> {
        let persisted = self.persist();
        if let Err(err) = &persisted {
            tracing::warn!(key = %self.storage_key, error = %err, "progress kept in memory only");
        }
        self.notify();
        persisted
    }

    fn persist(&self) -> Result<(), PersistenceError> {
        let raw = document::encode(&self.state)?;
        self.storage.set(&self.storage_key, &raw)?;
        Ok(())
    }

    fn notify(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }

    //
    // ─── SUBSCRIPTIONS ─────────────────────────────────────────────────────────
    //

    /// Registers `listener`, calling it right away with the current state and
    /// again after every mutation.
    pub fn subscribe<F>(&mut self, mut listener: F) -> SubscriptionId
    where
        F: FnMut(&ProgressState) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        listener(&self.state);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn exercise_answers(&self, exercise_id: &ExerciseId) -> Vec<UserAnswer> {
        self.state.answers_for(exercise_id).cloned().collect()
    }

    #[must_use]
    pub fn is_exercise_completed(&self, exercise_id: &ExerciseId) -> bool {
        self.state.is_completed(exercise_id)
    }

    #[must_use]
    pub fn exercise_completion(&self, exercise_id: &ExerciseId) -> Option<ExerciseCompletion> {
        self.state.completion(exercise_id).cloned()
    }

    #[must_use]
    pub fn collection_progress(&self, collection_id: &CollectionId) -> Option<CollectionProgress> {
        self.state.collection(collection_id).cloned()
    }

    #[must_use]
    pub fn question_answer(
        &self,
        exercise_id: &ExerciseId,
        question_id: &QuestionId,
    ) -> Option<UserAnswer> {
        self.state.answer(exercise_id, question_id).cloned()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
