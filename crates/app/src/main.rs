use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::{TestPreset, UserId};
use quiz_core::scoring::{
    ScoreBand, average_seconds_per_question, calculate_percentage, format_duration, is_passed,
    motivational_message,
};
use services::{AppServices, Clock};
use storage::JsonQuestionBank;
use storage::repository::{InMemoryRepository, Storage};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidPreset { raw: String },
    InvalidCount { raw: String },
    InvalidUnseen { raw: String },
    InvalidSeed { raw: String },
    InvalidPath { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidPreset { raw } => {
                write!(f, "invalid --preset value (expected quick or full): {raw}")
            }
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::InvalidUnseen { raw } => write!(f, "invalid --unseen value: {raw}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidPath { raw } => write!(f, "invalid --questions value: {raw}"),
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

fn parse_preset(raw: String) -> Result<TestPreset, ArgsError> {
    match raw.trim() {
        "quick" => Ok(TestPreset::quick()),
        "full" => Ok(TestPreset::full()),
        _ => Err(ArgsError::InvalidPreset { raw }),
    }
}

fn parse_count(raw: String) -> Result<usize, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidCount { raw })
}

fn parse_unseen(raw: String) -> Result<f64, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidUnseen { raw })
}

fn parse_seed(raw: String) -> Result<u64, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidSeed { raw })
}

#[derive(Debug, Clone)]
struct Args {
    questions: PathBuf,
    preset: TestPreset,
    count: Option<usize>,
    unseen: Option<f64>,
    seed: Option<u64>,
    category: Option<String>,
    user: String,
    simulate: bool,
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut questions = std::env::var("PRACTICE_QUESTIONS")
            .map_or_else(|_| PathBuf::from("questions.json"), PathBuf::from);
        let mut preset = match std::env::var("PRACTICE_PRESET") {
            Ok(value) => parse_preset(value)?,
            Err(_) => TestPreset::quick(),
        };
        let mut count = std::env::var("PRACTICE_COUNT")
            .ok()
            .map(parse_count)
            .transpose()?;
        let mut unseen = std::env::var("PRACTICE_UNSEEN")
            .ok()
            .map(parse_unseen)
            .transpose()?;
        let mut seed = std::env::var("PRACTICE_SEED")
            .ok()
            .map(parse_seed)
            .transpose()?;
        let mut category = std::env::var("PRACTICE_CATEGORY").ok();
        let mut user = std::env::var("PRACTICE_USER").unwrap_or_else(|_| "local".into());
        let mut simulate = false;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--questions" => {
                    let value = require_value(&mut args, "--questions")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidPath { raw: value });
                    }
                    questions = PathBuf::from(value);
                }
                "--preset" => preset = parse_preset(require_value(&mut args, "--preset")?)?,
                "--count" => count = Some(parse_count(require_value(&mut args, "--count")?)?),
                "--unseen" => unseen = Some(parse_unseen(require_value(&mut args, "--unseen")?)?),
                "--seed" => seed = Some(parse_seed(require_value(&mut args, "--seed")?)?),
                "--category" => category = Some(require_value(&mut args, "--category")?),
                "--user" => user = require_value(&mut args, "--user")?,
                "--simulate" => simulate = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            questions,
            preset,
            count,
            unseen,
            seed,
            category,
            user,
            simulate,
        })
    }

    fn resolved_preset(&self) -> Result<TestPreset, quiz_core::model::PresetError> {
        TestPreset::new(
            self.count.unwrap_or(self.preset.question_count()),
            self.unseen.unwrap_or(self.preset.unseen_fraction()),
        )
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app --bin practice -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --questions <path>        Question bank JSON (default: questions.json)");
    eprintln!("  --preset <quick|full>     Test size preset (default: quick)");
    eprintln!("  --count <n>               Override the number of questions");
    eprintln!("  --unseen <0..1>           Override the share of unseen questions");
    eprintln!("  --seed <n>                Seed for reproducible selection");
    eprintln!("  --category <name>         Only draw from one category");
    eprintln!("  --user <id>               User id for history (default: local)");
    eprintln!("  --simulate                Answer every question correctly and print the result");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!(
        "  PRACTICE_QUESTIONS, PRACTICE_PRESET, PRACTICE_COUNT, PRACTICE_UNSEEN, PRACTICE_SEED,"
    );
    eprintln!("  PRACTICE_CATEGORY, PRACTICE_USER");
    eprintln!("  RUST_LOG controls log output (default: warn)");
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let preset = args.resolved_preset()?;

    let bank = JsonQuestionBank::from_path(&args.questions)?;
    tracing::info!(
        path = %args.questions.display(),
        questions = bank.len(),
        "question bank loaded"
    );

    // Results only live for the duration of the run.
    let storage = Storage {
        questions: Arc::new(bank),
        results: Arc::new(InMemoryRepository::new()),
    };
    let clock = Clock::default();
    let services = match args.seed {
        Some(seed) => AppServices::seeded(&storage, clock, seed),
        None => AppServices::new(&storage, clock),
    };
    let tests = services.tests();
    let user = UserId::new(args.user.clone());

    let mut session = match args.category.as_deref() {
        Some(category) => tests.start_category_test(&user, preset, category).await?,
        None => tests.start_test(&user, preset).await?,
    };

    for (n, question) in session.questions().iter().enumerate() {
        println!("{}. [{}] {}", n + 1, question.category, question.prompt);
        for (i, option) in question.options.iter().enumerate() {
            let letter = char::from(b'A' + u8::try_from(i).unwrap_or(25));
            println!("   {letter}) {option}");
        }
        println!();
    }

    if !args.simulate {
        return Ok(());
    }

    let picks: Vec<usize> = session.questions().iter().map(|q| q.correct_index).collect();
    for selected in picks {
        tests.answer_current(&mut session, selected, 0)?;
    }
    let finished = tests.finish_test(&user, &mut session).await?;
    let result = &finished.result;

    let percentage = calculate_percentage(result.score(), result.total_questions());
    println!(
        "Score: {}/{} ({percentage}%, {:?}) {}",
        result.score(),
        result.total_questions(),
        ScoreBand::from_percentage(percentage),
        if is_passed(percentage) { "bestått" } else { "ikke bestått" }
    );
    println!("{}", motivational_message(percentage));
    println!(
        "Tid: {} ({} s per spørsmål)",
        format_duration(result.duration_ms()),
        average_seconds_per_question(result.duration_ms(), result.total_questions())
    );
    for achievement in &finished.newly_unlocked {
        println!("{} {}: {}", achievement.icon, achievement.title, achievement.description);
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
