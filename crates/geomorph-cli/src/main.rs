//! GeoMorph CLI
//!
//! Runs an adaptive geometry session in the terminal, or prints the geometry
//! description of a single problem.

use std::ops::ControlFlow;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use geomorph_geometry::{ShapeReport, VisualFlags};
use geomorph_session::{
    Config, HttpBackend, NoCamera, SessionEvent, SessionHandle, SessionRuntime, SessionView,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

/// GeoMorph - Adaptive 3D Geometry Tutor
///
/// Fetches geometry questions from the evaluator, adapts difficulty to your
/// answers, and shows hints when you seem stuck.
#[derive(Parser, Debug)]
#[command(name = "geomorph")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an interactive tutoring session
    Run {
        /// Path to configuration file (default: geomorph.json in current directory)
        #[arg(short, long, value_name = "FILE")]
        config: Option<String>,

        /// Evaluator API root, overriding the config file
        #[arg(long, value_name = "URL")]
        api: Option<String>,

        /// Topic to request questions for, overriding the config file
        #[arg(short, long)]
        topic: Option<String>,
    },

    /// Print the geometry, annotations and scene frame for a problem as JSON
    Shape {
        /// Problem topic, e.g. "cylinder" or "bola"
        #[arg(short, long)]
        topic: String,

        /// Problem id; selects composites and problem dimensions
        #[arg(long, value_name = "N")]
        id: Option<u32>,

        /// Render as if a hint had been used (highlight and measurements)
        #[arg(long)]
        hint: bool,

        /// Learner level for spin speed and wireframe
        #[arg(long, default_value_t = 1)]
        level: u32,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match args.command {
        Command::Run { config, api, topic } => run_session(config.as_deref(), api, topic).await,
        Command::Shape {
            topic,
            id,
            hint,
            level,
        } => print_shape(&topic, id, hint, level),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Runs one interactive session until the learner finishes or quits.
async fn run_session(
    config_path: Option<&str>,
    api: Option<String>,
    topic: Option<String>,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(api) = api {
        config.api_base_url = api;
    }
    if let Some(topic) = topic {
        config.topic = topic;
    }

    // Re-validate after overrides
    config.validate()?;
    print_config(&config);

    let backend = Arc::new(HttpBackend::new(&config)?);
    let (handle, runtime) = SessionRuntime::start(config, backend, Arc::new(NoCamera));

    // Subscribe before the loop starts so session_ready is not missed
    let mut events = handle.subscribe();
    let runtime_task = tokio::spawn(runtime.run());

    println!();
    println!("Connecting to evaluator...");
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Ok(()) = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down");
                handle.shutdown().await.ok();
                break;
            }
            event = events.recv() => match event {
                Ok(event) => print_event(&event, &handle.view()),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line() => match line? {
                Some(line) => {
                    if handle_input(line.trim(), &handle).await?.is_break() {
                        break;
                    }
                }
                None => {
                    tracing::debug!("Input closed");
                    handle.shutdown().await.ok();
                    break;
                }
            },
        }
    }

    runtime_task.await?;
    print_summary(&handle.view());
    Ok(())
}

/// Applies one line of learner input.
async fn handle_input(input: &str, handle: &SessionHandle) -> anyhow::Result<ControlFlow<()>> {
    match input {
        "" => {}
        "help" | "?" => print_help(),
        "hint" | "h" => handle.toggle_hint().await?,
        "submit" | "s" => {
            if handle.view().can_submit() {
                handle.submit().await?;
            } else {
                println!("Select an answer first (type its number).");
            }
        }
        "show" => print_question(&handle.view()),
        "shape" => match handle.view().shape() {
            Some(report) => println!("{}", report.to_json_pretty()?),
            None => println!("No live question."),
        },
        "reset" => handle.reset_session().await?,
        "finish" => {
            let acknowledged = handle.finish().await?;
            if acknowledged {
                println!("Session completed.");
            } else {
                println!("Session closed (evaluator did not confirm completion).");
            }
            return Ok(ControlFlow::Break(()));
        }
        "quit" | "q" => {
            handle.shutdown().await?;
            return Ok(ControlFlow::Break(()));
        }
        other => {
            if let Some(id) = other.strip_prefix("dismiss ") {
                match id.trim().parse() {
                    Ok(id) => handle.dismiss_toast(id).await?,
                    Err(_) => println!("Usage: dismiss <toast id>"),
                }
            } else {
                let view = handle.view();
                let options = view
                    .question
                    .as_ref()
                    .map_or(&[][..], |q| q.options.as_slice());
                match option_for(other, options) {
                    Some(answer) => {
                        println!("Selected: {answer}");
                        handle.select_answer(answer).await?;
                    }
                    None => println!("Unknown command '{other}'. Type 'help' for commands."),
                }
            }
        }
    }
    Ok(ControlFlow::Continue(()))
}

/// Maps a 1-based option number to its text.
fn option_for<'a>(input: &str, options: &'a [String]) -> Option<&'a str> {
    let index = input.parse::<usize>().ok()?.checked_sub(1)?;
    options.get(index).map(String::as_str)
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

// ============================================================================
// Shape
// ============================================================================

/// Prints the full geometry description of one problem.
fn print_shape(topic: &str, id: Option<u32>, hint: bool, level: u32) -> anyhow::Result<()> {
    let flags = VisualFlags {
        highlight: hint,
        show_measurements: hint,
        level,
        ..VisualFlags::default()
    };
    let report = ShapeReport::build(topic, id, None, &flags);
    println!("{}", report.to_json_pretty()?);
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

/// Prints the loaded configuration.
fn print_config(config: &Config) {
    println!("Configuration loaded:");
    println!("  Evaluator: {}", config.base_url());
    println!("  Topic: {}", config.topic);
    println!("  Monitor interval: {}ms", config.monitor_interval_ms);
    println!("  Request timeout: {}ms", config.request_timeout_ms);
}

fn print_help() {
    println!();
    println!("Commands:");
    println!("  <n>          select option n");
    println!("  submit, s    submit the selected answer");
    println!("  hint, h      show or hide the hint");
    println!("  show         reprint the current question");
    println!("  shape        print the current 3D scene as JSON");
    println!("  dismiss <id> dismiss a toast");
    println!("  reset        reset level and emotion");
    println!("  finish       complete the session and exit");
    println!("  quit, q      exit without completing");
}

/// Prints the live question and its options.
fn print_question(view: &SessionView) {
    println!();
    match &view.question {
        Some(question) => {
            println!(
                "[Level {} | {}] {}",
                view.session.display_level(),
                question.topic,
                view.display_text()
            );
            for (index, option) in question.options.iter().enumerate() {
                println!("  {}. {option}", index + 1);
            }
        }
        None => println!("{}", view.display_text()),
    }
}

/// Prints what an event means to the learner.
fn print_event(event: &SessionEvent, view: &SessionView) {
    match event {
        SessionEvent::SessionReady(ready) => {
            if ready.fallback {
                println!("Evaluator unavailable, continuing as guest (level {}).", ready.level);
            } else {
                println!("Session {} ready at level {}.", ready.session_id, ready.level);
            }
        }
        SessionEvent::QuestionLoaded(_) | SessionEvent::QuestionFailed(_) => print_question(view),
        SessionEvent::HintRevealed(revealed) => {
            let hint = view.question.as_ref().map_or("", |q| q.hint.as_str());
            if revealed.automatic {
                println!("Looks like you might be stuck. Hint: {hint}");
            } else {
                println!("Hint: {hint}");
            }
        }
        SessionEvent::HintHidden => println!("(hint hidden)"),
        SessionEvent::VisualModeChanged { party } => {
            if *party {
                println!("Switching things up: alternate visual mode on.");
            }
        }
        SessionEvent::FeedbackShown(feedback) => println!("{}", feedback.text),
        SessionEvent::ToastAdded(toast) => println!("[#{}] {}", toast.id, toast.message),
        SessionEvent::SessionReset => println!("Session reset to level 1."),
        SessionEvent::LevelChanged(_)
        | SessionEvent::ToastRemoved { .. }
        | SessionEvent::AffectSampled { .. }
        | SessionEvent::CycleComplete
        | SessionEvent::SessionFinished(_) => {
            tracing::debug!(event = event.event_name(), "Session event");
        }
    }
}

/// Prints a summary when the session ends.
fn print_summary(view: &SessionView) {
    println!();
    println!("=== GeoMorph Summary ===");
    println!("Session: {}", view.session.session_id);
    println!("Final level: {}", view.session.display_level());
    println!("Completed: {}", if view.finished { "yes" } else { "no" });
}
