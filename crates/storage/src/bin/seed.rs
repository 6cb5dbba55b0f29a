use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use portal_core::model::{
    Agent, AgentId, AgentRole, AssessmentResult, MediaRef, Question, QuestionId, Quiz, QuizId,
    ResultId, TrainingId, TrainingMaterial, TrainingStep,
};
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("PORTAL_DB_URL").unwrap_or_else(|_| "sqlite:portal.sqlite3".into());
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, now })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:portal.sqlite3)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  PORTAL_DB_URL");
}

fn sample_agents() -> Result<Vec<Agent>, Box<dyn std::error::Error>> {
    Ok(vec![
        Agent::new(
            AgentId::new(1),
            "Maria Souza",
            "maria.souza@health.example.org",
            AgentRole::Agent,
        )?,
        Agent::new(
            AgentId::new(2),
            "Carlos Lima",
            "carlos.lima@health.example.org",
            AgentRole::Agent,
        )?,
        Agent::new(
            AgentId::new(3),
            "Ana Ferreira",
            "ana.ferreira@health.example.org",
            AgentRole::Manager,
        )?,
    ])
}

fn sample_training() -> Result<TrainingMaterial, Box<dyn std::error::Error>> {
    let check_question = Question::new(
        QuestionId::new(101),
        "Where does Aedes aegypti prefer to lay its eggs?",
        vec![
            "Running rivers".into(),
            "Clean standing water".into(),
            "Salt water".into(),
        ],
        1,
        None,
    )?;

    let steps = vec![
        TrainingStep::content(
            "Knowing the vector",
            "Aedes aegypti is the primary vector of dengue, zika and chikungunya. \
             It bites during the day and breeds close to homes.",
            Some(MediaRef::image(
                "https://cdn.health.example.org/training/aedes-aegypti.jpeg",
            )?),
        )?,
        TrainingStep::content(
            "Breeding sites",
            "Any container that accumulates clean standing water can become a \
             breeding site: tires, plant saucers, water tanks, gutters.",
            None,
        )?,
        TrainingStep::quiz(
            "Quick check",
            "Answer correctly to continue.",
            check_question,
        )?,
        TrainingStep::content(
            "Field inspection routine",
            "Inspect properties weekly. Eliminate or treat every container that \
             can hold water and record each visit.",
            Some(MediaRef::video(
                "https://cdn.health.example.org/training/inspection-routine.mp4",
            )?),
        )?,
    ];

    Ok(TrainingMaterial::new(
        TrainingId::new(1),
        "Vector Control: Aedes aegypti",
        Some("Identification, breeding sites and the weekly inspection routine.".into()),
        steps,
        true,
    )?)
}

fn sample_quiz() -> Result<Quiz, Box<dyn std::error::Error>> {
    let questions = vec![
        Question::new(
            QuestionId::new(1),
            "Which mosquito is the main vector of dengue?",
            vec![
                "Aedes aegypti".into(),
                "Culex quinquefasciatus".into(),
                "Anopheles darlingi".into(),
            ],
            0,
            Some(MediaRef::image(
                "https://cdn.health.example.org/quiz/mosquito-closeup.jpeg",
            )?),
        )?,
        Question::new(
            QuestionId::new(2),
            "What is the most effective community measure against breeding sites?",
            vec![
                "Indoor spraying only".into(),
                "Removing standing water weekly".into(),
                "Closing windows at night".into(),
            ],
            1,
            None,
        )?,
    ];

    Ok(Quiz::new(
        QuizId::new(1),
        "Vector Identification",
        Some("Baseline assessment on vector recognition and prevention.".into()),
        questions,
        true,
    )?)
}

fn sample_results(
    quiz: &Quiz,
    agents: &[Agent],
    now: DateTime<Utc>,
) -> Result<Vec<AssessmentResult>, Box<dyn std::error::Error>> {
    let mut full_marks = HashMap::new();
    full_marks.insert(QuestionId::new(1), 0);
    full_marks.insert(QuestionId::new(2), 1);

    let mut one_miss = HashMap::new();
    one_miss.insert(QuestionId::new(1), 0);
    one_miss.insert(QuestionId::new(2), 0);

    Ok(vec![
        AssessmentResult::new(
            ResultId::generate(),
            quiz.id(),
            quiz.title(),
            agents[0].id(),
            agents[0].name(),
            2,
            2,
            now - Duration::days(2),
            145,
            full_marks,
        )?,
        AssessmentResult::new(
            ResultId::generate(),
            quiz.id(),
            quiz.title(),
            agents[1].id(),
            agents[1].name(),
            1,
            2,
            now - Duration::days(1),
            210,
            one_miss,
        )?,
    ])
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let agents = sample_agents()?;
    for agent in &agents {
        storage.agents.upsert_agent(agent).await?;
    }

    let training = sample_training()?;
    storage.trainings.upsert_training(&training).await?;

    let quiz = sample_quiz()?;
    storage.quizzes.upsert_quiz(&quiz).await?;

    let results = sample_results(&quiz, &agents, now)?;
    for result in &results {
        storage.results.append_result(result).await?;
    }

    println!(
        "Seeded {} agents, 1 training module, 1 quiz and {} results into {}",
        agents.len(),
        results.len(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
