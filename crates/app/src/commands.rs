use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use services::markup::reading_to_markdown;
use services::{
    CatalogError, ContentRepository, ExerciseError, ExerciseService, PersistenceError,
    ProgressStore, StaticCatalog, StoreConfig, VerbCatalog, VerbQuiz, VerbQuizError,
    VerbQuizSettings, generate_questions, summarize_collection,
};
use storage::repository::KeyValueStore;
use storage::LocalStorage;
use tutor_core::Clock;
use tutor_core::model::{CollectionId, ExerciseId, QuestionId};
use tutor_core::scoring::{ScoreBand, percentage_score};

use crate::args::{Command, Config};

#[derive(Debug)]
pub enum AppError {
    Catalog(CatalogError),
    CollectionNotFound(CollectionId),
    Exercise(ExerciseError),
    Quiz(VerbQuizError),
    Persistence(PersistenceError),
    Encode(serde_json::Error),
    Io(io::Error),
}

impl AppError {
    /// Status 2 for unknown ids, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::CollectionNotFound(_)
            | AppError::Exercise(
                ExerciseError::ExerciseNotFound(_) | ExerciseError::QuestionNotFound { .. },
            ) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Catalog(err) => write!(f, "built-in content is invalid: {err}"),
            AppError::CollectionNotFound(id) => write!(f, "collection not found: {id}"),
            AppError::Exercise(ExerciseError::Unanswered { missing }) => {
                let ids: Vec<&str> = missing.iter().map(QuestionId::as_str).collect();
                write!(f, "answer every question first (missing: {})", ids.join(", "))
            }
            AppError::Exercise(err) => write!(f, "{err}"),
            AppError::Quiz(err) => write!(f, "{err}"),
            AppError::Persistence(err) => write!(f, "could not save progress: {err}"),
            AppError::Encode(err) => write!(f, "could not encode progress: {err}"),
            AppError::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::Catalog(err)
    }
}

impl From<ExerciseError> for AppError {
    fn from(err: ExerciseError) -> Self {
        AppError::Exercise(err)
    }
}

impl From<VerbQuizError> for AppError {
    fn from(err: VerbQuizError) -> Self {
        AppError::Quiz(err)
    }
}

impl From<PersistenceError> for AppError {
    fn from(err: PersistenceError) -> Self {
        AppError::Persistence(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Encode(err)
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Io(err)
    }
}

/// Everything a command needs: content, verbs and the learner's progress.
pub struct App {
    clock: Clock,
    service: ExerciseService,
    verbs: VerbCatalog,
}

impl App {
    /// Opens progress under the configured data directory, or in memory when
    /// detached.
    pub fn open(config: &Config) -> Result<Self, AppError> {
        let storage = match &config.data_dir {
            Some(dir) => LocalStorage::open(dir),
            None => LocalStorage::detached(),
        };
        tracing::debug!(path = ?storage.path(), "opening progress storage");
        Self::with_storage(Arc::new(storage), config, Clock::default())
    }

    pub fn with_storage(
        storage: Arc<dyn KeyValueStore>,
        config: &Config,
        clock: Clock,
    ) -> Result<Self, AppError> {
        let store = ProgressStore::load(
            storage,
            StoreConfig {
                storage_key: config.storage_key.clone(),
            },
        );
        let content = Arc::new(StaticCatalog::builtin()?);
        Ok(Self {
            clock,
            service: ExerciseService::new(clock, content, store),
            verbs: VerbCatalog::builtin()?,
        })
    }

    pub fn store(&self) -> &ProgressStore {
        self.service.store()
    }
}

fn warn_unsaved(out: &mut impl Write, warning: Option<&PersistenceError>) -> io::Result<()> {
    if let Some(err) = warning {
        writeln!(out, "warning: {err}; progress is kept for this run only")?;
    }
    Ok(())
}

/// Runs one command, reading quiz answers from `input`.
///
/// # Errors
///
/// Returns `AppError` for unknown ids, refused submissions and output
/// failures.
pub fn run(
    app: &mut App,
    command: Command,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), AppError> {
    match command {
        Command::Collections => list_collections(app, out),
        Command::Show { collection } => show_collection(app, &collection, out),
        Command::Read { exercise } => read_exercise(app, &exercise, out),
        Command::Answer {
            exercise,
            question,
            option,
        } => answer(app, &exercise, &question, option, out),
        Command::Submit { exercise } => submit(app, &exercise, out),
        Command::Retry { exercise } => {
            let warning = app.service.retry(&exercise)?;
            warn_unsaved(out, warning.as_ref())?;
            writeln!(out, "progress cleared; {exercise} is ready to answer again")?;
            Ok(())
        }
        Command::Verbs { settings } => verb_quiz(app, &settings, input, out),
        Command::Progress => {
            let json = serde_json::to_string_pretty(app.store().state())?;
            writeln!(out, "{json}")?;
            Ok(())
        }
        Command::Reset => {
            app.service.store_mut().clear_progress()?;
            writeln!(out, "progress cleared")?;
            Ok(())
        }
        Command::Help => {
            crate::args::print_usage();
            Ok(())
        }
    }
}

fn list_collections(app: &App, out: &mut impl Write) -> Result<(), AppError> {
    for collection in app.service.content().collections() {
        let progress = summarize_collection(collection, app.store().state(), app.clock.now());
        writeln!(
            out,
            "{}  {} [{}]  {}/{} completed, {}%",
            collection.id,
            collection.title,
            collection.level,
            progress.completed_exercises,
            progress.total_exercises,
            progress.overall_score,
        )?;
    }
    Ok(())
}

fn show_collection(app: &App, id: &CollectionId, out: &mut impl Write) -> Result<(), AppError> {
    let collection = app
        .service
        .content()
        .collection_by_id(id)
        .ok_or_else(|| AppError::CollectionNotFound(id.clone()))?;

    writeln!(out, "{} [{}]", collection.title, collection.level)?;
    writeln!(out, "{}", collection.description)?;
    if let Some(last) = app
        .store()
        .collection_progress(id)
        .and_then(|p| p.last_accessed)
    {
        writeln!(out, "last practised {}", last.format("%Y-%m-%d %H:%M UTC"))?;
    }
    writeln!(out)?;

    for exercise in &collection.exercises {
        let status = match app.store().exercise_completion(&exercise.id) {
            Some(c) if c.completed => "done".to_owned(),
            Some(c) => format!("{}/{}", c.score, c.total_questions),
            None => "-".to_owned(),
        };
        writeln!(
            out,
            "  {}  {} ({} questions)  {status}",
            exercise.id,
            exercise.title,
            exercise.questions.len(),
        )?;
    }
    Ok(())
}

fn read_exercise(app: &App, id: &ExerciseId, out: &mut impl Write) -> Result<(), AppError> {
    let (_, exercise) = app
        .service
        .content()
        .exercise_by_id(id)
        .ok_or_else(|| ExerciseError::ExerciseNotFound(id.clone()))?;

    writeln!(out, "# {}", exercise.title)?;
    writeln!(out)?;
    writeln!(out, "{}", reading_to_markdown(&exercise.reading_markup))?;

    for question in &exercise.questions {
        let selected = app
            .store()
            .question_answer(id, &question.id)
            .map(|a| a.selected_answer_index);
        writeln!(out)?;
        writeln!(out, "[{}] {}", question.id, question.question_text)?;
        for (index, option) in question.options.iter().enumerate() {
            let marker = if selected == Some(index) { '*' } else { ' ' };
            writeln!(out, " {marker}{}) {option}", index + 1)?;
        }
    }
    Ok(())
}

fn answer(
    app: &mut App,
    exercise: &ExerciseId,
    question: &QuestionId,
    option: usize,
    out: &mut impl Write,
) -> Result<(), AppError> {
    let recorded = app.service.select_option(exercise, question, option)?;
    warn_unsaved(out, recorded.persistence_warning.as_ref())?;

    let answered = app.store().exercise_answers(exercise).len();
    let total = app
        .service
        .content()
        .exercise_by_id(exercise)
        .map_or(0, |(_, e)| e.questions.len());
    writeln!(out, "saved {question} = {} ({answered}/{total} answered)", option + 1)?;
    Ok(())
}

fn submit(app: &mut App, exercise: &ExerciseId, out: &mut impl Write) -> Result<(), AppError> {
    let result = app.service.submit(exercise)?;
    warn_unsaved(out, result.persistence_warning.as_ref())?;

    writeln!(out, "{}", result.band.message())?;
    writeln!(
        out,
        "score {}/{}",
        result.completion.score, result.completion.total_questions
    )?;
    writeln!(
        out,
        "{}: {}/{} completed, {}%",
        result.collection.collection_id,
        result.collection.completed_exercises,
        result.collection.total_exercises,
        result.collection.overall_score,
    )?;
    Ok(())
}

fn verb_quiz(
    app: &App,
    settings: &VerbQuizSettings,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), AppError> {
    let questions = generate_questions(app.verbs.verbs(), settings, &mut rand::rng())?;
    let mut quiz = VerbQuiz::new(questions);
    let mut line = String::new();

    while let Some(question) = quiz.current() {
        write!(
            out,
            "{}. {}（{}）→ {}: ",
            question.id,
            question.verb.dictionary_form,
            question.verb.reading,
            question.target_form.display_name(),
        )?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }
        let answer = quiz.answer(&line)?;
        if answer.check.is_correct {
            writeln!(out, "正解！")?;
        } else {
            writeln!(out, "不正解: {}", answer.check.correct_answer)?;
        }
    }

    let answered = u32::try_from(quiz.answers().len()).unwrap_or(u32::MAX);
    let percentage = percentage_score(quiz.score(), answered);
    writeln!(out)?;
    writeln!(out, "{}", ScoreBand::from_percentage(percentage).message())?;
    writeln!(out, "score {}/{answered}", quiz.score())?;
    Ok(())
}
