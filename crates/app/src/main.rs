use std::fmt;

use portal_core::model::{Agent, AgentId, QuizId, TrainingId};
use portal_core::ranking::is_podium;
use services::{AnalyticsService, RankingService};
use storage::repository::{AgentRepository, Storage};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidAgentId { raw: String },
    InvalidQuizId { raw: String },
    InvalidTrainingId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidAgentId { raw } => write!(f, "invalid --agent-id value: {raw}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid --quiz-id value: {raw}"),
            ArgsError::InvalidTrainingId { raw } => {
                write!(f, "invalid --training-id value: {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Ranking,
    Analytics,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "ranking" => Some(Self::Ranking),
            "analytics" => Some(Self::Analytics),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    agent_id: AgentId,
    quiz_id: Option<QuizId>,
    training_id: Option<TrainingId>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("PORTAL_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://portal.sqlite3".into(), normalize_sqlite_url);
        let mut agent_id = std::env::var("PORTAL_AGENT_ID")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or_else(|| AgentId::new(1), AgentId::new);
        let mut quiz_id = None;
        let mut training_id = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--agent-id" => {
                    let value = require_value(args, "--agent-id")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidAgentId { raw: value.clone() })?;
                    agent_id = AgentId::new(parsed);
                }
                "--quiz-id" => {
                    let value = require_value(args, "--quiz-id")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidQuizId { raw: value.clone() })?;
                    quiz_id = Some(QuizId::new(parsed));
                }
                "--training-id" => {
                    let value = require_value(args, "--training-id")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidTrainingId { raw: value.clone() })?;
                    training_id = Some(TrainingId::new(parsed));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            agent_id,
            quiz_id,
            training_id,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- ranking   [--db <sqlite_url>] [--quiz-id <id>]");
    eprintln!("  cargo run -p app -- analytics [--db <sqlite_url>] --agent-id <id>");
    eprintln!("                                [--quiz-id <id>] [--training-id <id>]");
    eprintln!();
    eprintln!("ranking:   general leaderboard, or the per-quiz personal-best board");
    eprintln!("           when --quiz-id is given.");
    eprintln!("analytics: overview and per-agent table as seen by --agent-id");
    eprintln!("           (manager role required for cross-agent views); add");
    eprintln!("           --quiz-id or --training-id for a specific report.");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:portal.sqlite3");
    eprintln!("  --agent-id 1");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PORTAL_DB_URL, PORTAL_AGENT_ID");
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
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

async fn load_viewer(
    agents: &dyn AgentRepository,
    id: AgentId,
) -> Result<Agent, Box<dyn std::error::Error>> {
    agents
        .get_agent(id)
        .await?
        .ok_or_else(|| format!("agent {id} not found; seed the database first").into())
}

async fn print_ranking(storage: &Storage, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let ranking = RankingService::new(storage.agents.clone(), storage.results.clone());

    match args.quiz_id {
        Some(quiz_id) => {
            let board = ranking.for_quiz(quiz_id).await?;
            if board.is_empty() {
                println!("No attempts recorded for quiz {quiz_id}.");
                return Ok(());
            }
            println!("Personal-best leaderboard for quiz {quiz_id}:");
            for (position, result) in board.iter().enumerate() {
                let podium = if is_podium(position) { "*" } else { " " };
                println!(
                    "{podium} {:>3}. {:<24} score {}/{} in {}s",
                    position + 1,
                    result.agent_name(),
                    result.score(),
                    result.total_questions(),
                    result.duration_secs(),
                );
            }
        }
        None => {
            let board = ranking.general().await?;
            if board.is_empty() {
                println!("No agents with completed assessments yet.");
                return Ok(());
            }
            println!("General leaderboard:");
            for (position, entry) in board.iter().enumerate() {
                println!(
                    "  {:>3}. {:<24} avg {:>5.1}%  avg {:>5.1}s  ({} attempts)",
                    position + 1,
                    entry.agent_name,
                    entry.avg_score_pct,
                    entry.avg_duration_secs,
                    entry.completions,
                );
            }
        }
    }

    Ok(())
}

async fn print_analytics(
    storage: &Storage,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let viewer = load_viewer(storage.agents.as_ref(), args.agent_id).await?;
    let analytics = AnalyticsService::new(
        storage.agents.clone(),
        storage.quizzes.clone(),
        storage.trainings.clone(),
        storage.results.clone(),
    );

    if let Some(quiz_id) = args.quiz_id {
        let report = analytics.quiz_report(&viewer, quiz_id).await?;
        println!("{} ({} attempts)", report.stats.title, report.stats.completions);
        println!(
            "  avg score {:.1}%  pass rate {:.1}%",
            report.stats.avg_score_pct, report.stats.pass_rate_pct
        );
        for question in &report.questions {
            println!(
                "  question {}: {} answered, {:.1}% correct",
                question.question_id, question.answered, question.correct_pct
            );
            for (index, pct) in question.option_pcts.iter().enumerate() {
                println!("    option {index}: {pct:.1}%");
            }
        }
        return Ok(());
    }

    if let Some(training_id) = args.training_id {
        let report = analytics.training_report(&viewer, training_id).await?;
        println!(
            "{}: {} completions, {:.1}% of agents",
            report.title, report.completions, report.completion_rate_pct
        );
        return Ok(());
    }

    let overview = analytics.overview(&viewer).await?;
    println!("Portal overview:");
    println!("  agents:          {}", overview.agent_count);
    println!("  training modules:{:>2}", overview.module_count);
    println!("  quizzes:         {}", overview.quiz_count);
    println!("  attempts:        {}", overview.total_attempts);
    println!("  overall average: {:.1}%", overview.overall_avg_pct);

    println!();
    println!("Per-agent performance:");
    for stats in analytics.agent_table(&viewer).await? {
        println!(
            "  {:<24} {} attempts, avg {:.1}%",
            stats.name, stats.completions, stats.avg_score_pct
        );
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    argv.remove(0);

    let mut iter = argv.into_iter();
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup; core and services stay free of I/O setup.
    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;

    match cmd {
        Command::Ranking => print_ranking(&storage, &args).await,
        Command::Analytics => print_analytics(&storage, &args).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
