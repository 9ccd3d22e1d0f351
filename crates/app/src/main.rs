mod args;
mod exam;

use prep_core::model::Email;
use services::{AppServices, AuthService, Clock};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::args::{Args, ArgsError, Command, Target, print_usage};

const RECENT_HISTORY: usize = 5;

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::from_env().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if args.command == Command::Help {
        print_usage();
        return Ok(());
    }

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    debug!(db = %args.db_url, catalog = %args.catalog.display(), "starting");
    let services = AppServices::new_sqlite(&args.db_url, &args.catalog, Clock::system()).await?;

    match args.command {
        Command::Help => {}
        Command::Papers => {
            for paper in services.catalog().papers() {
                println!("{}  {} questions", paper.key, paper.question_count);
            }
        }
        Command::Mocks => {
            let catalog = services.catalog();
            for test in catalog.mocks() {
                println!(
                    "{:<20} {:<24} {:>3} questions  {:>3} min",
                    test.id(),
                    test.title(),
                    test.len(),
                    test.duration_minutes()
                );
            }
            let counts = catalog.category_counts();
            println!(
                "Catalog: {} Quant, {} VARC, {} DILR",
                counts.quant, counts.varc, counts.dilr
            );
        }
        Command::Stats => {
            let email = resolve_user(&services.auth(), args.email.as_deref()).await?;
            let stats = services.stats().load(&email).await?;
            println!("Stats for {email}");
            println!("  tests taken:         {}", stats.tests_taken);
            println!("  questions attempted: {}", stats.questions_attempted);
            println!("  correct answers:     {}", stats.correct_answers);
            println!("  accuracy:            {:.1}%", stats.accuracy());
            for entry in stats.recent(RECENT_HISTORY) {
                println!(
                    "  {}  {:<20} {}/{}",
                    entry.date.format("%Y-%m-%d %H:%M"),
                    entry.test_id,
                    entry.score,
                    entry.total
                );
            }
        }
        Command::Signup { name, password } => {
            let email = args.email.as_deref().unwrap_or_default();
            let user = services.auth().signup(&name, email, &password).await?;
            println!("Welcome, {}. Signed in as {}.", user.name, user.email);
        }
        Command::Login { password } => {
            let email = args.email.as_deref().unwrap_or_default();
            let user = services.auth().login(email, &password).await?;
            println!("Signed in as {}.", user.email);
        }
        Command::Logout => {
            services.auth().logout().await?;
            println!("Signed out.");
        }
        Command::Generate { topic } => match services.generator().generate(&topic).await {
            Some(question) => exam::print_body(&question),
            None => println!("No question could be generated right now; try again later."),
        },
        Command::Take(target) => {
            let email = resolve_user(&services.auth(), args.email.as_deref()).await?;
            let host = services.host();
            let session = match target {
                Target::Mock(id) => host.start_mock(&id)?,
                Target::Pyq { year, slot } => host.start_pyq(&year, &slot)?,
                Target::Practice(id) => host.start_practice(id)?,
                Target::Generated { topic } => host.start_generated_practice(&topic).await?,
            };
            exam::take(&host, &email, session).await?;
        }
    }

    Ok(())
}

async fn resolve_user(
    auth: &AuthService,
    explicit: Option<&str>,
) -> Result<Email, Box<dyn std::error::Error>> {
    if let Some(raw) = explicit {
        return Ok(Email::parse(raw)?);
    }
    match auth.current_user().await? {
        Some(user) => Ok(user.email),
        None => Err("not signed in: run `prep login` or pass --email".into()),
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
