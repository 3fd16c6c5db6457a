use std::fmt;

use chrono::{DateTime, Duration, Utc};
use exam_core::model::{
    AnswerOption, OptionId, Question, QuestionId, TestDefinition, TestDefinitionError, TestId,
};
use storage::repository::{AttemptRecord, ResultRepository, Storage, TestRepository};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    results: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidResults { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidResults { raw } => write!(f, "invalid --results value: {raw}"),
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
            std::env::var("EXAM_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut results = std::env::var("EXAM_RESULTS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(3);
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
                "--results" => {
                    let value = require_value(&mut args, "--results")?;
                    results = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidResults { raw: value.clone() })?;
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

        Ok(Self {
            db_url,
            results,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --results <n>             Sample attempt results to append (default: 3)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  EXAM_DB_URL, EXAM_RESULTS");
}

fn option(id: &str, text: &str) -> AnswerOption {
    AnswerOption::new(OptionId::new(id), text)
}

fn question(
    id: u64,
    prompt: &str,
    options: Vec<AnswerOption>,
    correct: &str,
) -> Result<Question, TestDefinitionError> {
    Question::new(QuestionId::new(id), prompt, options, OptionId::new(correct))
}

/// The demo catalog: a full mathematics exam plus two smaller tests.
fn demo_tests() -> Result<Vec<TestDefinition>, TestDefinitionError> {
    let mathematics = TestDefinition::new(
        TestId::new(1),
        "Mathematics",
        "Academic",
        "Medium",
        45 * 60,
        vec![
            question(
                1,
                "What is the value of \u{3c0} (pi) to two decimal places?",
                vec![
                    option("a", "3.14"),
                    option("b", "3.16"),
                    option("c", "3.12"),
                    option("d", "3.18"),
                ],
                "a",
            )?,
            question(
                2,
                "Solve for x: 2x + 5 = 13",
                vec![
                    option("a", "x = 3"),
                    option("b", "x = 4"),
                    option("c", "x = 5"),
                    option("d", "x = 6"),
                ],
                "b",
            )?,
            question(
                3,
                "What is the area of a circle with radius 5 units?",
                vec![
                    option("a", "25\u{3c0} square units"),
                    option("b", "10\u{3c0} square units"),
                    option("c", "5\u{3c0} square units"),
                    option("d", "15\u{3c0} square units"),
                ],
                "a",
            )?,
            question(
                4,
                "What is the square root of 144?",
                vec![
                    option("a", "12"),
                    option("b", "14"),
                    option("c", "10"),
                    option("d", "16"),
                ],
                "a",
            )?,
            question(
                5,
                "If a triangle has angles measuring 30\u{b0}, 60\u{b0}, and 90\u{b0}, \
                 what type of triangle is it?",
                vec![
                    option("a", "Equilateral"),
                    option("b", "Isosceles"),
                    option("c", "Scalene"),
                    option("d", "Right-angled"),
                ],
                "d",
            )?,
        ],
    )?;

    let grammar = TestDefinition::new(
        TestId::new(2),
        "English Grammar",
        "Language",
        "Easy",
        30 * 60,
        vec![
            question(
                1,
                "Which sentence is grammatically correct?",
                vec![
                    option("a", "She don't like coffee."),
                    option("b", "She doesn't like coffee."),
                    option("c", "She not like coffee."),
                ],
                "b",
            )?,
            question(
                2,
                "What is the past tense of \"go\"?",
                vec![
                    option("a", "goed"),
                    option("b", "gone"),
                    option("c", "went"),
                ],
                "c",
            )?,
            question(
                3,
                "Which word is a preposition?",
                vec![
                    option("a", "quickly"),
                    option("b", "under"),
                    option("c", "running"),
                ],
                "b",
            )?,
        ],
    )?;

    let trivia = TestDefinition::new(
        TestId::new(4),
        "General Knowledge",
        "Trivia",
        "Easy",
        20 * 60,
        vec![
            question(
                1,
                "Which planet is known as the Red Planet?",
                vec![
                    option("a", "Venus"),
                    option("b", "Mars"),
                    option("c", "Jupiter"),
                    option("d", "Saturn"),
                ],
                "b",
            )?,
            question(
                2,
                "How many continents are there?",
                vec![option("a", "5"), option("b", "6"), option("c", "7")],
                "c",
            )?,
        ],
    )?;

    Ok(vec![mathematics, grammar, trivia])
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let tests = demo_tests()?;
    for test in &tests {
        storage.tests.upsert_test(test).await?;
    }

    // Sample results for the mathematics test: the partially answered attempt
    // the results view renders as 3/5 correct.
    let mathematics = &tests[0];
    for i in 0..args.results {
        let completed_at = now - Duration::days(i64::from(i) * 2);
        let answers = [
            (QuestionId::new(1), OptionId::new("a")),
            (QuestionId::new(2), OptionId::new("b")),
            (QuestionId::new(3), OptionId::new("c")),
            (QuestionId::new(5), OptionId::new("d")),
        ]
        .into_iter()
        .collect();

        let record = AttemptRecord {
            test_id: mathematics.id(),
            answers,
            time_spent_seconds: 900 + i * 60,
            completed_at,
        };
        let _ = storage.results.append_result(&record).await?;
    }

    tracing::info!(
        tests = tests.len(),
        results = args.results,
        db = %args.db_url,
        "seeded demo catalog"
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
