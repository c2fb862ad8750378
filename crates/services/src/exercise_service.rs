use std::sync::Arc;

use tutor_core::model::{CollectionProgress, ExerciseCompletion, ExerciseId, QuestionId, UserAnswer};
use tutor_core::scoring::{
    ScoreBand, create_exercise_completion, create_user_answer, percentage_score,
    unanswered_questions,
};
use tutor_core::time::Clock;

use crate::catalog::ContentRepository;
use crate::error::{ExerciseError, PersistenceError};
use crate::progress_store::ProgressStore;
use crate::summary::summarize_collection;

/// An answer that was recorded, possibly only in memory.
#[derive(Debug)]
pub struct RecordedAnswer {
    pub answer: UserAnswer,
    pub persistence_warning: Option<PersistenceError>,
}

/// Result of submitting an exercise.
#[derive(Debug)]
pub struct SubmittedExercise {
    pub completion: ExerciseCompletion,
    pub percentage: u32,
    pub band: ScoreBand,
    pub collection: CollectionProgress,
    pub persistence_warning: Option<PersistenceError>,
}

/// Answering and submitting exercises against the progress store.
pub struct ExerciseService {
    clock: Clock,
    content: Arc<dyn ContentRepository>,
    store: ProgressStore,
}

impl ExerciseService {
    #[must_use]
    pub fn new(clock: Clock, content: Arc<dyn ContentRepository>, store: ProgressStore) -> Self {
        Self {
            clock,
            content,
            store,
        }
    }

    #[must_use]
    pub fn content(&self) -> &dyn ContentRepository {
        self.content.as_ref()
    }

    #[must_use]
    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ProgressStore {
        &mut self.store
    }

    /// Records the learner choosing `option_index` for a question.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` if the exercise or question is unknown or the
    /// option does not exist. Storage failures are reported in the result.
    pub fn select_option(
        &mut self,
        exercise_id: &ExerciseId,
        question_id: &QuestionId,
        option_index: usize,
    ) -> Result<RecordedAnswer, ExerciseError> {
        let (_, exercise) = self
            .content
            .exercise_by_id(exercise_id)
            .ok_or_else(|| ExerciseError::ExerciseNotFound(exercise_id.clone()))?;
        let question =
            exercise
                .question(question_id)
                .ok_or_else(|| ExerciseError::QuestionNotFound {
                    exercise: exercise_id.clone(),
                    question: question_id.clone(),
                })?;
        if option_index >= question.options.len() {
            return Err(ExerciseError::OptionOutOfRange {
                index: option_index,
                options: question.options.len(),
            });
        }

        let answer = create_user_answer(exercise_id, question, option_index);
        let persistence_warning = self.store.save_answer(answer.clone()).err();
        tracing::debug!(
            exercise = %exercise_id,
            question = %question_id,
            correct = answer.is_correct,
            "answer recorded"
        );
        Ok(RecordedAnswer {
            answer,
            persistence_warning,
        })
    }

    /// Scores the exercise from its saved answers, records the completion and
    /// refreshes the owning collection's progress.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::Unanswered` until every question has an answer,
    /// or `ExerciseNotFound` for unknown ids.
    pub fn submit(&mut self, exercise_id: &ExerciseId) -> Result<SubmittedExercise, ExerciseError> {
        let (collection, exercise) = self
            .content
            .exercise_by_id(exercise_id)
            .ok_or_else(|| ExerciseError::ExerciseNotFound(exercise_id.clone()))?;

        let answers = self.store.exercise_answers(exercise_id);
        let missing = unanswered_questions(&exercise.questions, &answers);
        if !missing.is_empty() {
            return Err(ExerciseError::Unanswered {
                missing: missing.into_iter().cloned().collect(),
            });
        }

        let completion = create_exercise_completion(exercise_id, &exercise.questions, &answers);
        let saved = self.store.complete_exercise(completion.clone());

        let progress = summarize_collection(collection, self.store.state(), self.clock.now());
        let summarized = self.store.update_collection_progress(progress.clone());

        let percentage = percentage_score(completion.score, completion.total_questions);
        tracing::debug!(
            exercise = %exercise_id,
            score = completion.score,
            total = completion.total_questions,
            "exercise submitted"
        );
        Ok(SubmittedExercise {
            completion,
            percentage,
            band: ScoreBand::from_percentage(percentage),
            collection: progress,
            persistence_warning: saved.and(summarized).err(),
        })
    }

    /// Starts an exercise over with no answers and no completion.
    ///
    /// Records only leave the store through a full clear, so this wipes all
    /// saved progress, not just this exercise's. The returned value is the
    /// storage failure, if the cleared document could not be written.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::ExerciseNotFound` for unknown ids; nothing is
    /// cleared in that case.
    pub fn retry(
        &mut self,
        exercise_id: &ExerciseId,
    ) -> Result<Option<PersistenceError>, ExerciseError> {
        if self.content.exercise_by_id(exercise_id).is_none() {
            return Err(ExerciseError::ExerciseNotFound(exercise_id.clone()));
        }
        let cleared = self.store.clear_progress();
        tracing::debug!(exercise = %exercise_id, "exercise reset for retry");
        Ok(cleared.err())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::progress_store::StoreConfig;
    use storage::repository::InMemoryStorage;
    use tutor_core::model::CollectionId;
    use tutor_core::time::{fixed_clock, fixed_now};

    fn service_with(storage: InMemoryStorage) -> ExerciseService {
        let store = ProgressStore::load(Arc::new(storage), StoreConfig::default());
        ExerciseService::new(
            fixed_clock(),
            Arc::new(StaticCatalog::builtin().unwrap()),
            store,
        )
    }

    fn ex(id: &str) -> ExerciseId {
        ExerciseId::new(id)
    }

    fn q(id: &str) -> QuestionId {
        QuestionId::new(id)
    }

    #[test]
    fn selecting_an_option_records_correctness() {
        let mut svc = service_with(InMemoryStorage::new());
        let recorded = svc.select_option(&ex("daily-life-1"), &q("q1"), 1).unwrap();
        assert!(recorded.answer.is_correct);
        assert!(recorded.persistence_warning.is_none());

        let wrong = svc.select_option(&ex("daily-life-1"), &q("q1"), 0).unwrap();
        assert!(!wrong.answer.is_correct);
        assert_eq!(svc.store().exercise_answers(&ex("daily-life-1")).len(), 1);
    }

    #[test]
    fn unknown_ids_and_options_are_rejected() {
        let mut svc = service_with(InMemoryStorage::new());
        assert!(matches!(
            svc.select_option(&ex("nope"), &q("q1"), 0),
            Err(ExerciseError::ExerciseNotFound(_))
        ));
        assert!(matches!(
            svc.select_option(&ex("daily-life-1"), &q("q9"), 0),
            Err(ExerciseError::QuestionNotFound { .. })
        ));
        assert!(matches!(
            svc.select_option(&ex("daily-life-1"), &q("q1"), 4),
            Err(ExerciseError::OptionOutOfRange {
                index: 4,
                options: 4
            })
        ));
        assert!(svc.store().state().is_empty());
    }

    #[test]
    fn submit_requires_every_answer() {
        let mut svc = service_with(InMemoryStorage::new());
        svc.select_option(&ex("daily-life-1"), &q("q2"), 1).unwrap();
        match svc.submit(&ex("daily-life-1")) {
            Err(ExerciseError::Unanswered { missing }) => assert_eq!(missing, vec![q("q1"), q("q3")]),
            other => panic!("expected Unanswered, got {other:?}"),
        }
        assert!(svc.store().state().completions.is_empty());
    }

    #[test]
    fn partial_submission_is_scored_but_not_completed() {
        let mut svc = service_with(InMemoryStorage::new());
        svc.select_option(&ex("daily-life-1"), &q("q1"), 0).unwrap();
        svc.select_option(&ex("daily-life-1"), &q("q2"), 1).unwrap();
        svc.select_option(&ex("daily-life-1"), &q("q3"), 0).unwrap();

        let result = svc.submit(&ex("daily-life-1")).unwrap();
        assert_eq!(result.completion.score, 1);
        assert!(!result.completion.completed);
        assert_eq!(result.percentage, 33);
        assert_eq!(result.band, ScoreBand::Partial(33));
        assert!(!svc.store().is_exercise_completed(&ex("daily-life-1")));
    }

    #[test]
    fn perfect_submission_updates_collection_progress() {
        let mut svc = service_with(InMemoryStorage::new());
        for question in ["q1", "q2", "q3"] {
            svc.select_option(&ex("daily-life-1"), &q(question), 1).unwrap();
        }

        let result = svc.submit(&ex("daily-life-1")).unwrap();
        assert!(result.completion.completed);
        assert_eq!(result.band, ScoreBand::Perfect);
        assert_eq!(result.collection.completed_exercises, 1);
        assert_eq!(result.collection.total_exercises, 2);
        assert!((result.collection.overall_score - 50.0).abs() < f64::EPSILON);

        let stored = svc
            .store()
            .collection_progress(&CollectionId::new("daily-life"))
            .unwrap();
        assert_eq!(stored.last_accessed, Some(fixed_now()));
    }

    #[test]
    fn retry_returns_the_exercise_to_unanswered() {
        let storage = InMemoryStorage::new();
        let mut svc = service_with(storage.clone());
        for question in ["q1", "q2", "q3"] {
            svc.select_option(&ex("daily-life-1"), &q(question), 1).unwrap();
        }
        svc.submit(&ex("daily-life-1")).unwrap();
        assert!(svc.store().is_exercise_completed(&ex("daily-life-1")));

        assert!(svc.retry(&ex("daily-life-1")).unwrap().is_none());
        assert!(svc.store().exercise_answers(&ex("daily-life-1")).is_empty());
        assert!(!svc.store().is_exercise_completed(&ex("daily-life-1")));
        match svc.submit(&ex("daily-life-1")) {
            Err(ExerciseError::Unanswered { missing }) => {
                assert_eq!(missing, vec![q("q1"), q("q2"), q("q3")]);
            }
            other => panic!("expected Unanswered, got {other:?}"),
        }

        let reloaded = service_with(storage);
        assert!(reloaded.store().state().is_empty());
    }

    #[test]
    fn retry_of_unknown_exercise_keeps_progress() {
        let mut svc = service_with(InMemoryStorage::new());
        svc.select_option(&ex("travel-1"), &q("q1"), 1).unwrap();
        assert!(matches!(
            svc.retry(&ex("nope")),
            Err(ExerciseError::ExerciseNotFound(_))
        ));
        assert_eq!(svc.store().exercise_answers(&ex("travel-1")).len(), 1);
    }

    #[test]
    fn storage_failure_is_a_warning_not_an_error() {
        let mut svc = service_with(InMemoryStorage::new().with_quota(10));
        let recorded = svc.select_option(&ex("travel-1"), &q("q1"), 1).unwrap();
        assert!(recorded.persistence_warning.is_some());
        assert!(
            svc.store()
                .question_answer(&ex("travel-1"), &q("q1"))
                .is_some()
        );
    }
}
