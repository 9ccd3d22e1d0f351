use std::fmt;
use std::path::{Path, PathBuf};

use prep_core::model::{DEFAULT_SLOT, QuestionId, TestId};

pub const DEFAULT_DB_URL: &str = "sqlite://prep.sqlite3";
pub const DEFAULT_CATALOG: &str = "data/questions.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { command: &'static str, flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidQuestionId { raw: String },
    AmbiguousTarget,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { command, flag } => write!(f, "{command} requires {flag}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidQuestionId { raw } => write!(f, "invalid --question value: {raw}"),
            ArgsError::AmbiguousTarget => {
                write!(f, "take needs exactly one of --test, --year, --question or --topic")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

/// What `take` should start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Mock(TestId),
    Pyq { year: String, slot: String },
    Practice(QuestionId),
    Generated { topic: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Papers,
    Mocks,
    Stats,
    Signup { name: String, password: String },
    Login { password: String },
    Logout,
    Generate { topic: String },
    Take(Target),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub command: Command,
    pub db_url: String,
    pub catalog: PathBuf,
    pub email: Option<String>,
}

#[derive(Default)]
struct Flags {
    name: Option<String>,
    password: Option<String>,
    topic: Option<String>,
    test: Option<String>,
    year: Option<String>,
    slot: Option<String>,
    question: Option<String>,
}

impl Args {
    pub fn from_env() -> Result<Self, ArgsError> {
        Self::parse(std::env::args().skip(1), |key| std::env::var(key).ok())
    }

    /// Parse `argv` (without the program name), reading defaults through `env`.
    pub fn parse(
        argv: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut args = argv.into_iter();
        let mut db_url = env("PREP_DB_URL").map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut catalog = env("PREP_CATALOG").map_or_else(|| PathBuf::from(DEFAULT_CATALOG), PathBuf::from);
        let mut email = env("PREP_USER").filter(|value| !value.trim().is_empty());

        let Some(name) = args.next() else {
            return Ok(Self {
                command: Command::Help,
                db_url,
                catalog,
                email,
            });
        };

        let mut flags = Flags::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--catalog" => catalog = PathBuf::from(require_value(&mut args, "--catalog")?),
                "--email" => email = Some(require_value(&mut args, "--email")?),
                "--name" => flags.name = Some(require_value(&mut args, "--name")?),
                "--password" => flags.password = Some(require_value(&mut args, "--password")?),
                "--topic" => flags.topic = Some(require_value(&mut args, "--topic")?),
                "--test" => flags.test = Some(require_value(&mut args, "--test")?),
                "--year" => flags.year = Some(require_value(&mut args, "--year")?),
                "--slot" => flags.slot = Some(require_value(&mut args, "--slot")?),
                "--question" => flags.question = Some(require_value(&mut args, "--question")?),
                "--help" | "-h" => {
                    return Ok(Self {
                        command: Command::Help,
                        db_url,
                        catalog,
                        email,
                    });
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = build_command(&name, flags, email.is_some())?;
        Ok(Self {
            command,
            db_url,
            catalog,
            email,
        })
    }
}

fn build_command(name: &str, flags: Flags, has_email: bool) -> Result<Command, ArgsError> {
    let required = |value: Option<String>, command, flag| {
        value.ok_or(ArgsError::MissingFlag { command, flag })
    };

    let command = match name {
        "help" | "--help" | "-h" => Command::Help,
        "papers" => Command::Papers,
        "mocks" => Command::Mocks,
        "stats" => Command::Stats,
        "logout" => Command::Logout,
        "signup" => {
            if !has_email {
                return Err(ArgsError::MissingFlag { command: "signup", flag: "--email" });
            }
            Command::Signup {
                name: required(flags.name, "signup", "--name")?,
                password: required(flags.password, "signup", "--password")?,
            }
        }
        "login" => {
            if !has_email {
                return Err(ArgsError::MissingFlag { command: "login", flag: "--email" });
            }
            Command::Login {
                password: required(flags.password, "login", "--password")?,
            }
        }
        "generate" => Command::Generate {
            topic: required(flags.topic, "generate", "--topic")?,
        },
        "take" => Command::Take(build_target(flags)?),
        other => return Err(ArgsError::UnknownCommand(other.to_string())),
    };
    Ok(command)
}

fn build_target(flags: Flags) -> Result<Target, ArgsError> {
    let Flags {
        test,
        year,
        slot,
        question,
        topic,
        ..
    } = flags;

    match (test, year, question, topic) {
        (Some(id), None, None, None) => Ok(Target::Mock(TestId::new(id))),
        (None, Some(year), None, None) => Ok(Target::Pyq {
            year,
            slot: slot.unwrap_or_else(|| DEFAULT_SLOT.to_string()),
        }),
        (None, None, Some(raw), None) => raw
            .parse::<QuestionId>()
            .map(Target::Practice)
            .map_err(|_| ArgsError::InvalidQuestionId { raw }),
        (None, None, None, Some(topic)) => Ok(Target::Generated { topic }),
        _ => Err(ArgsError::AmbiguousTarget),
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  prep papers   [--catalog <path>]");
    eprintln!("  prep mocks    [--catalog <path>]");
    eprintln!("  prep stats    [--email <email>]");
    eprintln!("  prep signup   --name <name> --email <email> --password <password>");
    eprintln!("  prep login    --email <email> --password <password>");
    eprintln!("  prep logout");
    eprintln!("  prep generate --topic <topic>");
    eprintln!("  prep take     (--test <id> | --year <year> [--slot <slot>] | --question <id> | --topic <topic>)");
    eprintln!();
    eprintln!("Common flags: --db <sqlite_url> --catalog <path> --email <email>");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --catalog {DEFAULT_CATALOG}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PREP_DB_URL, PREP_CATALOG, PREP_USER, RUST_LOG");
    eprintln!("  PREP_AI_API_KEY, PREP_AI_BASE_URL, PREP_AI_MODEL");
}
