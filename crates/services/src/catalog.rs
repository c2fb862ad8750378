//! Built-in reading collections and verb tables.

use std::collections::BTreeMap;

use tutor_core::model::{Collection, CollectionId, Exercise, ExerciseId, Verb, validate_catalogue};

use crate::error::CatalogError;
use crate::markup::visible_len;

const COLLECTIONS_JSON: &str = include_str!("../data/collections.json");
const VERBS_JSON: &str = include_str!("../data/verbs.json");

/// Passages shorter than this are treated as authoring mistakes.
const MIN_READING_CHARS: usize = 11;

/// Read-only access to reading content.
///
/// Unknown ids are not errors: lookups return `None` or an empty slice.
pub trait ContentRepository: Send + Sync {
    fn collections(&self) -> &[Collection];

    fn collection_by_id(&self, id: &CollectionId) -> Option<&Collection> {
        self.collections().iter().find(|c| &c.id == id)
    }

    fn exercises_by_collection(&self, id: &CollectionId) -> &[Exercise] {
        self.collection_by_id(id)
            .map(|c| c.exercises.as_slice())
            .unwrap_or(&[])
    }

    /// The exercise together with the collection that owns it.
    fn exercise_by_id(&self, id: &ExerciseId) -> Option<(&Collection, &Exercise)> {
        self.collections()
            .iter()
            .find_map(|c| c.exercise(id).map(|e| (c, e)))
    }
}

/// Collections held in memory, validated on construction.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    collections: Vec<Collection>,
}

impl StaticCatalog {
    /// The collections shipped with the application.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the embedded data is malformed.
    pub fn builtin() -> Result<Self, CatalogError> {
        let collections: Vec<Collection> = serde_json::from_str(COLLECTIONS_JSON)?;
        Self::from_collections(collections)
    }

    /// # Errors
    ///
    /// Returns `CatalogError` if any content invariant is violated.
    pub fn from_collections(collections: Vec<Collection>) -> Result<Self, CatalogError> {
        validate_catalogue(&collections)?;
        for exercise in collections.iter().flat_map(|c| &c.exercises) {
            if visible_len(&exercise.reading_markup) < MIN_READING_CHARS {
                return Err(CatalogError::ReadingTooShort {
                    exercise: exercise.id.clone(),
                });
            }
        }
        tracing::debug!(collections = collections.len(), "content catalogue loaded");
        Ok(Self { collections })
    }
}

impl ContentRepository for StaticCatalog {
    fn collections(&self) -> &[Collection] {
        &self.collections
    }
}

/// Verbs available to the conjugation quiz.
#[derive(Debug, Clone)]
pub struct VerbCatalog {
    verbs: Vec<Verb>,
}

impl VerbCatalog {
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` if the embedded verb data is malformed.
    pub fn builtin() -> Result<Self, CatalogError> {
        let by_id: BTreeMap<String, Verb> = serde_json::from_str(VERBS_JSON)?;
        Ok(Self {
            verbs: by_id.into_values().collect(),
        })
    }

    #[must_use]
    pub fn from_verbs(verbs: Vec<Verb>) -> Self {
        Self { verbs }
    }

    #[must_use]
    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tutor_core::conjugation::available_forms;
    use tutor_core::model::{ConjugationForm, ContentError, Question};

    fn builtin() -> StaticCatalog {
        StaticCatalog::builtin().unwrap()
    }

    #[test]
    fn builtin_catalogue_is_valid() {
        let catalog = builtin();
        let ids: Vec<_> = catalog.collections().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["daily-life", "school-life", "travel"]);
    }

    #[test]
    fn builtin_questions_are_well_formed() {
        for exercise in builtin().collections().iter().flat_map(|c| &c.exercises) {
            for question in &exercise.questions {
                assert!((2..=6).contains(&question.options.len()));
                assert!(question.question_text.contains('？') || question.question_text.contains('?'));
            }
        }
    }

    #[test]
    fn builtin_exercise_ids_are_globally_unique() {
        let catalog = builtin();
        let all: Vec<_> = catalog
            .collections()
            .iter()
            .flat_map(|c| c.exercises.iter().map(|e| &e.id))
            .collect();
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
    }

    #[test]
    fn collection_by_id_finds_known_ids_only() {
        let catalog = builtin();
        let daily = catalog.collection_by_id(&CollectionId::new("daily-life")).unwrap();
        assert_eq!(daily.title, "日常生活");
        assert!(catalog.collection_by_id(&CollectionId::new("non-existent")).is_none());
        assert!(catalog.collection_by_id(&CollectionId::new("")).is_none());
    }

    #[test]
    fn exercises_by_collection_is_empty_for_unknown_ids() {
        let catalog = builtin();
        let daily = CollectionId::new("daily-life");
        assert_eq!(
            catalog.exercises_by_collection(&daily),
            catalog.collection_by_id(&daily).unwrap().exercises.as_slice()
        );
        assert!(catalog.exercises_by_collection(&CollectionId::new("non-existent")).is_empty());
        assert!(catalog.exercises_by_collection(&CollectionId::new("")).is_empty());
    }

    #[test]
    fn exercise_by_id_reports_owner() {
        let catalog = builtin();
        let (collection, exercise) = catalog.exercise_by_id(&ExerciseId::new("travel-1")).unwrap();
        assert_eq!(collection.id, "travel");
        assert_eq!(exercise.title, "京都旅行");
        assert!(catalog.exercise_by_id(&ExerciseId::new("travel-9")).is_none());
    }

    #[test]
    fn rejects_invalid_content() {
        let mut collections = builtin().collections().to_vec();
        collections[0].exercises[0].questions[0] =
            Question::new("q1", "何時ですか？", vec!["六時".into()], 0);
        assert!(matches!(
            StaticCatalog::from_collections(collections).unwrap_err(),
            CatalogError::Content(ContentError::TooFewOptions { .. })
        ));
    }

    #[test]
    fn rejects_near_empty_passages() {
        let mut collections = builtin().collections().to_vec();
        collections[0].exercises[0].reading_markup = "<p>短い</p>".into();
        assert!(matches!(
            StaticCatalog::from_collections(collections).unwrap_err(),
            CatalogError::ReadingTooShort { .. }
        ));
    }

    #[test]
    fn builtin_verbs_cover_every_form() {
        let verbs = VerbCatalog::builtin().unwrap();
        assert!(!verbs.verbs().is_empty());
        assert_eq!(available_forms(verbs.verbs()), ConjugationForm::ALL.to_vec());
    }
}
