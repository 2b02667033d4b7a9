//! wordcard CLI - manage the word list and take four-choice tests in the terminal.

use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use chrono::Local;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use wordcard_core::{
    encode, import_file, parse_lines, recent_first, AppConfig, Error, ExportFormat,
    HistorySummary, Question, QuizEngine, QuizUpdate, Result, ResultStore,
    SqliteStore, SystemClock, WordList,
};

const DEFAULT_CONFIG: &str = "wordcard.toml";
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "wordcard", version, about = "English/Korean vocabulary flashcard trainer")]
struct Cli {
    /// Config file path (defaults to ./wordcard.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overrides the config
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a single word
    Add {
        term: String,
        definition: String,
        /// Part of speech
        #[arg(long, default_value = "")]
        tag: String,
    },

    /// Remove a word by its English term
    Remove { term: String },

    /// Show every word
    List,

    /// Delete all words and the test history
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Import words from an xlsx/xls/json/csv/txt file
    Import {
        path: PathBuf,
        /// CSV delimiter, overrides the config
        #[arg(long)]
        delimiter: Option<char>,
    },

    /// Add words pasted on stdin, one "english,korean" pair per line
    Paste,

    /// Write the word list as xlsx, json, csv or txt
    Export {
        format: String,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Take a four-choice test
    Quiz {
        /// Max questions, overrides the config
        #[arg(long)]
        max: Option<usize>,
    },

    /// Show past test results
    History,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wordcard=warn,wordcard_core=warn")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => AppConfig::load(Path::new(DEFAULT_CONFIG))?,
        None => AppConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.database_path = db.clone();
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli)?;
    let mut store = SqliteStore::open(&config.database_path)?;
    let mut words = WordList::load(&store)?;

    match cli.command {
        Commands::Add {
            term,
            definition,
            tag,
        } => {
            let entry = words.add(&term, &definition, &tag)?.clone();
            words.save(&mut store)?;
            println!("Added '{}' ({} words)", entry.term, words.len());
        }
        Commands::Remove { term } => match words.remove(&term) {
            Some(entry) => {
                words.save(&mut store)?;
                println!("Removed '{}'", entry.term);
            }
            None => println!("'{}' is not in the word list", term),
        },
        Commands::List => {
            if words.is_empty() {
                println!("No words registered.");
            }
            for (i, entry) in words.iter().enumerate() {
                if entry.tag.is_empty() {
                    println!("{:>4}. {} - {}", i + 1, entry.term, entry.definition);
                } else {
                    println!("{:>4}. {} [{}] - {}", i + 1, entry.term, entry.tag, entry.definition);
                }
            }
        }
        Commands::Clear { yes } => {
            if !yes {
                return Err(Error::Validation(format!(
                    "this deletes all {} words and every test result; pass --yes to confirm",
                    words.len()
                )));
            }
            store.wipe_all()?;
            println!("All words and results deleted.");
        }
        Commands::Import { path, delimiter } => {
            if let Some(d) = delimiter {
                config.import.csv_delimiter = d;
                config.validate()?;
            }
            let entries = import_file(&path, &config.import)?;
            let summary = words.merge(entries)?;
            words.save(&mut store)?;
            report_merge(summary.added, summary.duplicates);
        }
        Commands::Paste => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            let summary = words.merge(parse_lines(&text))?;
            words.save(&mut store)?;
            report_merge(summary.added, summary.duplicates);
        }
        Commands::Export { format, out } => {
            let payload = encode(
                ExportFormat::parse(&format)?,
                words.entries(),
                Local::now().date_naive(),
            )?;
            let path = out.join(&payload.filename);
            std::fs::write(&path, &payload.bytes)?;
            println!("Exported {} words to {}", words.len(), path.display());
        }
        Commands::Quiz { max } => {
            if let Some(max) = max {
                config.quiz.max_questions = max;
                config.validate()?;
            }
            run_quiz(&config, &words, &mut store)?;
        }
        Commands::History => show_history(&store)?,
    }
    Ok(())
}

fn report_merge(added: usize, duplicates: usize) {
    println!("{} words added.", added);
    if duplicates > 0 {
        println!("{} duplicate words skipped.", duplicates);
    }
}

/// Forward stdin lines so the quiz loop can poll them alongside its timers.
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn print_question(question: &Question, seconds: u64) {
    println!();
    println!("[{}/{}] {}", question.number, question.total, question.prompt);
    if !question.tag.is_empty() {
        println!("      ({})", question.tag);
    }
    for (i, choice) in question.choices.iter().enumerate() {
        println!("  {}) {}", i + 1, choice);
    }
    print!("Answer 1-{}, s to skip, q to quit ({}s): ", question.choices.len(), seconds);
    let _ = io::stdout().flush();
}

fn run_quiz(config: &AppConfig, words: &WordList, store: &mut SqliteStore) -> Result<()> {
    let seconds = config.quiz.answer_timeout().as_secs();
    let mut engine = QuizEngine::new(config.quiz.clone(), StdRng::from_entropy(), SystemClock::new());
    engine.start_session(words.entries())?;
    let input = spawn_stdin_reader();

    let mut current = engine.next_question()?;
    if let Some(q) = &current {
        print_question(q, seconds);
    }

    while let Some(question) = current.clone() {
        match input.recv_timeout(POLL_INTERVAL) {
            Ok(line) => match line.trim() {
                "q" => break,
                "s" => match engine.skip_question() {
                    Ok(next) => {
                        println!("Skipped. Answer: {}", question.correct_definition);
                        current = next;
                        if let Some(q) = &current {
                            print_question(q, seconds);
                        }
                        continue;
                    }
                    Err(Error::AlreadyAnswered) => {}
                    Err(e) => return Err(e),
                },
                other => match other.parse::<usize>() {
                    Ok(n) if (1..=question.choices.len()).contains(&n) => {
                        match engine.submit_answer(&question.choices[n - 1]) {
                            Ok(outcome) if outcome.correct => println!("Correct!"),
                            Ok(outcome) => {
                                println!("Wrong. Answer: {}", outcome.correct_definition)
                            }
                            Err(Error::AlreadyAnswered) => {}
                            Err(e) => return Err(e),
                        }
                    }
                    _ => println!("Type a number between 1 and {}, s or q.", question.choices.len()),
                },
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        for update in engine.tick()? {
            match update {
                QuizUpdate::TimedOut(outcome) => {
                    println!();
                    println!("Time's up! Answer: {}", outcome.correct_definition);
                }
                QuizUpdate::Question(q) => {
                    print_question(&q, seconds);
                    current = Some(q);
                }
                QuizUpdate::Exhausted => current = None,
            }
        }
    }

    let record = engine.end_session(store)?;
    println!();
    println!("Test complete!");
    println!("Correct: {}", record.correct_count);
    println!("Wrong: {}", record.wrong_count);
    println!("Accuracy: {}%", record.accuracy_percent);

    if let Some(session) = engine.session() {
        if !session.mistakes().is_empty() {
            println!();
            println!("Review:");
        }
        for mistake in session.mistakes() {
            println!(
                "  {} - answer: {}, chosen: {}",
                mistake.entry.term, mistake.correct_answer, mistake.chosen_answer
            );
        }
    }
    Ok(())
}

fn show_history(store: &dyn ResultStore) -> Result<()> {
    let records = store.load_all()?;
    if records.is_empty() {
        println!("No finished tests yet.");
        return Ok(());
    }
    let summary = HistorySummary::from_records(&records);
    println!("Tests taken: {}", summary.sessions);
    println!("Average accuracy: {}%", summary.average_accuracy);
    for record in recent_first(&records) {
        println!(
            "  {}  correct {} | wrong {} | accuracy {}%",
            record.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            record.correct_count,
            record.wrong_count,
            record.accuracy_percent
        );
    }
    Ok(())
}
