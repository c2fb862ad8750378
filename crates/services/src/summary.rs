use chrono::{DateTime, Utc};

use tutor_core::model::{Collection, CollectionProgress, ProgressState};
use tutor_core::scoring::percentage_score;

/// Aggregates a collection's completions into a `CollectionProgress`.
///
/// `overall_score` is the percentage of all questions in the collection that
/// were correct in each exercise's latest submission; exercises never
/// submitted count as zero correct.
#[must_use]
pub fn summarize_collection(
    collection: &Collection,
    state: &ProgressState,
    now: DateTime<Utc>,
) -> CollectionProgress {
    let mut completed = 0_u32;
    let mut correct = 0_u32;
    for exercise in &collection.exercises {
        if let Some(completion) = state.completion(&exercise.id) {
            if completion.completed {
                completed += 1;
            }
            let cap = u32::try_from(exercise.questions.len()).unwrap_or(u32::MAX);
            correct = correct.saturating_add(completion.score.min(cap));
        }
    }
    let total_questions = u32::try_from(collection.question_count()).unwrap_or(u32::MAX);

    CollectionProgress {
        collection_id: collection.id.clone(),
        completed_exercises: completed,
        total_exercises: u32::try_from(collection.exercises.len()).unwrap_or(u32::MAX),
        overall_score: f64::from(percentage_score(correct, total_questions)),
        last_accessed: Some(now),
    }
}
