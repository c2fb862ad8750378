use std::fmt;
use std::path::PathBuf;

use services::VerbQuizSettings;
use storage::document::DEFAULT_STORAGE_KEY;
use tutor_core::model::{CollectionId, ConjugationForm, ExerciseId, QuestionId, UnknownFormError};

pub const ENV_DATA_DIR: &str = "JP_TUTOR_DATA";
pub const ENV_STORAGE_KEY: &str = "JP_TUTOR_STORAGE_KEY";
pub const ENV_LOG: &str = "JP_TUTOR_LOG";
pub const DEFAULT_DATA_DIR: &str = ".jp-tutor";

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    EmptyValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    MissingArgument { command: &'static str, name: &'static str },
    InvalidNumber { name: &'static str, raw: String },
    UnknownForm(UnknownFormError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::EmptyValue { flag } => write!(f, "{flag} cannot be empty"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::MissingArgument { command, name } => {
                write!(f, "{command} requires <{name}>")
            }
            ArgsError::InvalidNumber { name, raw } => write!(f, "invalid {name}: {raw}"),
            ArgsError::UnknownForm(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  jp-tutor [options] collections");
    eprintln!("  jp-tutor [options] show <collection-id>");
    eprintln!("  jp-tutor [options] read <exercise-id>");
    eprintln!("  jp-tutor [options] answer <exercise-id> <question-id> <option-number>");
    eprintln!("  jp-tutor [options] submit <exercise-id>");
    eprintln!("  jp-tutor [options] retry <exercise-id>");
    eprintln!("  jp-tutor [options] verbs [--count <n>] [--form <form>]...");
    eprintln!("  jp-tutor [options] progress");
    eprintln!("  jp-tutor [options] reset");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --data <dir>          progress directory (default: {DEFAULT_DATA_DIR})");
    eprintln!("  --storage-key <key>   document key (default: {DEFAULT_STORAGE_KEY})");
    eprintln!("  --detached            keep progress in memory only");
    eprintln!();
    let forms: Vec<&str> = ConjugationForm::ALL.iter().map(|f| f.as_str()).collect();
    eprintln!("Verb forms: {}", forms.join(", "));
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {ENV_DATA_DIR}, {ENV_STORAGE_KEY}, {ENV_LOG}");
}

/// Where progress lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `None` when running detached.
    pub data_dir: Option<PathBuf>,
    pub storage_key: String,
}

impl Config {
    /// Defaults overlaid with environment values.
    pub fn from_env(env: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = env(ENV_DATA_DIR)
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);
        let storage_key = env(ENV_STORAGE_KEY)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_owned());
        Self {
            data_dir: Some(data_dir),
            storage_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Collections,
    Show { collection: CollectionId },
    Read { exercise: ExerciseId },
    Answer {
        exercise: ExerciseId,
        question: QuestionId,
        /// Zero-based; the command line takes the 1-based option number.
        option: usize,
    },
    Submit { exercise: ExerciseId },
    /// Clears saved progress so the exercise can be answered again.
    Retry { exercise: ExerciseId },
    Verbs { settings: VerbQuizSettings },
    Progress,
    Reset,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub config: Config,
    pub command: Command,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    let value = args.next().ok_or(ArgsError::MissingValue { flag })?;
    if value.trim().is_empty() {
        return Err(ArgsError::EmptyValue { flag });
    }
    Ok(value)
}

fn parse_number(name: &'static str, raw: &str) -> Result<usize, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidNumber {
        name,
        raw: raw.to_owned(),
    })
}

/// Parses `args` (without the program name) on top of environment config.
///
/// # Errors
///
/// Returns `ArgsError` for unknown flags/commands and malformed values.
pub fn parse(
    args: impl IntoIterator<Item = String>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Invocation, ArgsError> {
    let mut config = Config::from_env(env);
    let mut positional = Vec::new();
    let mut count = None;
    let mut forms = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--data" => config.data_dir = Some(PathBuf::from(require_value(&mut args, "--data")?)),
            "--storage-key" => config.storage_key = require_value(&mut args, "--storage-key")?,
            "--detached" => config.data_dir = None,
            "--count" => {
                let raw = require_value(&mut args, "--count")?;
                count = Some(parse_number("--count", &raw)?);
            }
            "--form" => {
                let raw = require_value(&mut args, "--form")?;
                forms.push(raw.parse::<ConjugationForm>().map_err(ArgsError::UnknownForm)?);
            }
            "--help" | "-h" => {
                return Ok(Invocation {
                    config,
                    command: Command::Help,
                });
            }
            flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let Some(name) = positional.next() else {
        return Ok(Invocation {
            config,
            command: Command::Help,
        });
    };
    let mut take = |command: &'static str, name: &'static str| {
        positional
            .next()
            .ok_or(ArgsError::MissingArgument { command, name })
    };

    let command = match name.as_str() {
        "collections" => Command::Collections,
        "show" => Command::Show {
            collection: take("show", "collection-id")?.into(),
        },
        "read" => Command::Read {
            exercise: take("read", "exercise-id")?.into(),
        },
        "answer" => {
            let exercise = take("answer", "exercise-id")?.into();
            let question = take("answer", "question-id")?.into();
            let raw = take("answer", "option-number")?;
            let number = parse_number("option number", &raw)?;
            let option = number.checked_sub(1).ok_or(ArgsError::InvalidNumber {
                name: "option number",
                raw,
            })?;
            Command::Answer {
                exercise,
                question,
                option,
            }
        }
        "submit" => Command::Submit {
            exercise: take("submit", "exercise-id")?.into(),
        },
        "retry" => Command::Retry {
            exercise: take("retry", "exercise-id")?.into(),
        },
        "verbs" => {
            let mut settings = VerbQuizSettings::default();
            if let Some(count) = count {
                settings.number_of_questions = count;
            }
            if !forms.is_empty() {
                settings.target_forms = forms;
            }
            Command::Verbs { settings }
        }
        "progress" => Command::Progress,
        "reset" => Command::Reset,
        "help" => Command::Help,
        _ => return Err(ArgsError::UnknownCommand(name)),
    };

    if let Some(extra) = positional.next() {
        return Err(ArgsError::UnknownArg(extra));
    }
    Ok(Invocation { config, command })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn defaults_without_env() {
        let inv = parse(args(&["collections"]), no_env).unwrap();
        assert_eq!(inv.command, Command::Collections);
        assert_eq!(inv.config.data_dir, Some(PathBuf::from(DEFAULT_DATA_DIR)));
        assert_eq!(inv.config.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn env_is_overridden_by_flags() {
        let env = |key: &str| match key {
            ENV_DATA_DIR => Some("/tmp/from-env".to_owned()),
            ENV_STORAGE_KEY => Some("env-key".to_owned()),
            _ => None,
        };
        let inv = parse(args(&["progress"]), env).unwrap();
        assert_eq!(inv.config.data_dir, Some(PathBuf::from("/tmp/from-env")));
        assert_eq!(inv.config.storage_key, "env-key");

        let inv = parse(args(&["--data", "/tmp/flag", "progress", "--storage-key", "k"]), env).unwrap();
        assert_eq!(inv.config.data_dir, Some(PathBuf::from("/tmp/flag")));
        assert_eq!(inv.config.storage_key, "k");
    }

    #[test]
    fn detached_drops_the_data_dir() {
        let inv = parse(args(&["--detached", "reset"]), no_env).unwrap();
        assert_eq!(inv.config.data_dir, None);
        assert_eq!(inv.command, Command::Reset);
    }

    #[test]
    fn answer_takes_one_based_option() {
        let inv = parse(args(&["answer", "daily-life-1", "q2", "3"]), no_env).unwrap();
        assert_eq!(
            inv.command,
            Command::Answer {
                exercise: "daily-life-1".into(),
                question: "q2".into(),
                option: 2,
            }
        );
        assert!(matches!(
            parse(args(&["answer", "daily-life-1", "q2", "0"]), no_env),
            Err(ArgsError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse(args(&["answer", "daily-life-1", "q2"]), no_env),
            Err(ArgsError::MissingArgument {
                name: "option-number",
                ..
            })
        ));
    }

    #[test]
    fn retry_takes_an_exercise() {
        let inv = parse(args(&["retry", "travel-1"]), no_env).unwrap();
        assert_eq!(
            inv.command,
            Command::Retry {
                exercise: "travel-1".into()
            }
        );
        assert!(matches!(
            parse(args(&["retry"]), no_env),
            Err(ArgsError::MissingArgument {
                command: "retry",
                ..
            })
        ));
    }

    #[test]
    fn verbs_collects_forms_and_count() {
        let inv = parse(
            args(&["verbs", "--count", "4", "--form", "te-form", "--form", "past-plain"]),
            no_env,
        )
        .unwrap();
        let Command::Verbs { settings } = inv.command else {
            panic!("expected verbs command");
        };
        assert_eq!(settings.number_of_questions, 4);
        assert_eq!(
            settings.target_forms,
            vec![ConjugationForm::TeForm, ConjugationForm::PastPlain]
        );
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(matches!(
            parse(args(&["dance"]), no_env),
            Err(ArgsError::UnknownCommand(_))
        ));
        assert!(matches!(
            parse(args(&["--colour", "collections"]), no_env),
            Err(ArgsError::UnknownArg(_))
        ));
        assert!(matches!(
            parse(args(&["verbs", "--form", "future"]), no_env),
            Err(ArgsError::UnknownForm(_))
        ));
        assert!(matches!(
            parse(args(&["show", "daily-life", "extra"]), no_env),
            Err(ArgsError::UnknownArg(_))
        ));
        assert!(matches!(
            parse(args(&["--data"]), no_env),
            Err(ArgsError::MissingValue { flag: "--data" })
        ));
    }

    #[test]
    fn no_command_means_help() {
        assert_eq!(parse(args(&[]), no_env).unwrap().command, Command::Help);
        assert_eq!(parse(args(&["-h", "reset"]), no_env).unwrap().command, Command::Help);
    }
}
