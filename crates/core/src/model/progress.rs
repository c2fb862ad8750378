use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{CollectionId, ExerciseId, QuestionId};

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// A learner's current selection for one question.
///
/// Keyed by `(exercise_id, question_id)`; re-answering replaces the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub exercise_id: ExerciseId,
    pub question_id: QuestionId,
    #[serde(rename = "selectedAnswer", alias = "selectedAnswerIndex")]
    pub selected_answer_index: usize,
    pub is_correct: bool,
}

impl UserAnswer {
    #[must_use]
    pub fn new(
        exercise_id: impl Into<ExerciseId>,
        question_id: impl Into<QuestionId>,
        selected_answer_index: usize,
        is_correct: bool,
    ) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            question_id: question_id.into(),
            selected_answer_index,
            is_correct,
        }
    }

    fn same_key(&self, other: &Self) -> bool {
        self.exercise_id == other.exercise_id && self.question_id == other.question_id
    }
}

/// Outcome of submitting an exercise. Keyed by `exercise_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseCompletion {
    pub exercise_id: ExerciseId,
    /// Only set for a perfect score.
    pub completed: bool,
    pub score: u32,
    pub total_questions: u32,
}

/// Aggregate progress for one collection. Keyed by `collection_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionProgress {
    pub collection_id: CollectionId,
    pub completed_exercises: u32,
    pub total_exercises: u32,
    pub overall_score: f64,
    #[serde(
        default,
        rename = "lastAccessed",
        alias = "lastAccessedTimestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_accessed: Option<DateTime<Utc>>,
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Everything the learner has done, as persisted.
///
/// Each list holds at most one record per logical key and keeps insertion
/// order; an upsert moves the replaced record to the end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    #[serde(default)]
    pub answers: Vec<UserAnswer>,
    #[serde(default)]
    pub completions: Vec<ExerciseCompletion>,
    #[serde(default)]
    pub collections: Vec<CollectionProgress>,
}

fn upsert<T>(items: &mut Vec<T>, item: T, same_key: impl Fn(&T, &T) -> bool) {
    items.retain(|existing| !same_key(existing, &item));
    items.push(item);
}

impl ProgressState {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty() && self.completions.is_empty() && self.collections.is_empty()
    }

    pub fn upsert_answer(&mut self, answer: UserAnswer) {
        upsert(&mut self.answers, answer, UserAnswer::same_key);
    }

    pub fn upsert_completion(&mut self, completion: ExerciseCompletion) {
        upsert(&mut self.completions, completion, |a, b| {
            a.exercise_id == b.exercise_id
        });
    }

    pub fn upsert_collection(&mut self, progress: CollectionProgress) {
        upsert(&mut self.collections, progress, |a, b| {
            a.collection_id == b.collection_id
        });
    }

    pub fn answers_for<'a>(
        &'a self,
        exercise_id: &'a ExerciseId,
    ) -> impl Iterator<Item = &'a UserAnswer> + 'a {
        self.answers
            .iter()
            .filter(move |a| &a.exercise_id == exercise_id)
    }

    #[must_use]
    pub fn answer(&self, exercise_id: &ExerciseId, question_id: &QuestionId) -> Option<&UserAnswer> {
        self.answers
            .iter()
            .find(|a| &a.exercise_id == exercise_id && &a.question_id == question_id)
    }

    #[must_use]
    pub fn completion(&self, exercise_id: &ExerciseId) -> Option<&ExerciseCompletion> {
        self.completions
            .iter()
            .find(|c| &c.exercise_id == exercise_id)
    }

    #[must_use]
    pub fn is_completed(&self, exercise_id: &ExerciseId) -> bool {
        self.completion(exercise_id).is_some_and(|c| c.completed)
    }

    #[must_use]
    pub fn collection(&self, collection_id: &CollectionId) -> Option<&CollectionProgress> {
        self.collections
            .iter()
            .find(|c| &c.collection_id == collection_id)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
