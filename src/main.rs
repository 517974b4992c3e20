// chalkstep: step through beginner Python lessons, one animated line at a time

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use chalkstep::animation::RecordingRenderer;
use chalkstep::config::Config;
use chalkstep::executor::PythonExecutor;
use chalkstep::explain::walkthrough::VariablePanel;
use chalkstep::explain::{
    ExplanationRequester, ExplanationTransport, HttpExplanationClient, Walkthrough,
};
use chalkstep::lesson::{self, LESSONS};
use chalkstep::logging;
use chalkstep::session::{BackPolicy, RunOutcome, Session, SharedSession, StepOutcome};
use chalkstep::ui::{App, SharedStage, TuiRenderer};
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use eyre::{eyre, Result, WrapErr};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "chalkstep")]
#[command(about = "Step through beginner Python programs with an animated teacher")]
struct Args {
    /// Configuration file (default: ~/.chalkstep.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Explanation service base URL
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// What Back does to the run
    #[arg(long, global = true, value_parser = parse_back_policy)]
    back_policy: Option<BackPolicy>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a lesson in the terminal UI (default)
    Lesson {
        /// Lesson level, 1 to 5
        #[arg(long, short, default_value = "1")]
        level: u8,
    },
    /// Step through FILE headlessly, printing each animation and explanation
    Run {
        file: PathBuf,
        /// Value typed at the next input() prompt; repeat for several
        #[arg(long = "input", short)]
        inputs: Vec<String>,
    },
    /// Ask for a whole-program walkthrough of FILE
    Explain {
        file: PathBuf,
        /// Inputs the program was run with
        #[arg(long = "input", short)]
        inputs: Vec<String>,
    },
    /// List the built-in lessons
    Lessons,
}

fn parse_back_policy(value: &str) -> Result<BackPolicy, String> {
    match value {
        "replay" => Ok(BackPolicy::Replay),
        "view-only" => Ok(BackPolicy::ViewOnly),
        other => Err(format!("unknown back policy '{}' (replay, view-only)", other)),
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(url) = &args.server_url {
        config.server.url = url.clone();
    }
    if let Some(policy) = args.back_policy {
        config.session.back_policy = policy;
    }
    Ok(config)
}

fn transport(config: &Config) -> Result<Arc<dyn ExplanationTransport>> {
    let client = HttpExplanationClient::new(config.server.url.clone(), config.server.timeout())
        .wrap_err("failed to build explanation client")?;
    Ok(Arc::new(client))
}

fn read_source(file: &PathBuf) -> Result<String> {
    fs::read_to_string(file).wrap_err_with(|| format!("failed to read {}", file.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    match args.command.unwrap_or(Command::Lesson { level: 1 }) {
        Command::Lesson { level } => run_tui(&config, level).await,
        Command::Run { file, inputs } => {
            logging::init_console_logging(Level::WARN)?;
            run_headless(&config, &read_source(&file)?, inputs).await
        }
        Command::Explain { file, inputs } => {
            logging::init_console_logging(Level::WARN)?;
            explain(&config, &read_source(&file)?, &inputs).await
        }
        Command::Lessons => {
            for lesson in LESSONS {
                let templates: Vec<&str> = lesson.templates.iter().map(|t| t.label).collect();
                println!("{}. {} ({})", lesson.id, lesson.title, templates.join(", "));
            }
            Ok(())
        }
    }
}

async fn run_tui(config: &Config, level: u8) -> Result<()> {
    let lesson = lesson::by_id(level).ok_or_else(|| eyre!("no lesson with level {}", level))?;
    // Logs go to a file; the terminal belongs to the UI
    let _guard = logging::init_file_logging("tui")?;
    info!(level, server = %config.server.url, "starting lesson");

    let transport = transport(config)?;
    let stage = SharedStage::default();
    let renderer = TuiRenderer::new(stage.clone(), config.animation.effective_speed());
    let requester = ExplanationRequester::new(Arc::clone(&transport), config.server.timeout());
    let session = Session::new(PythonExecutor::new(), renderer, requester)
        .with_lesson(lesson)
        .with_back_policy(config.session.back_policy);
    let mut app = App::new(SharedSession::new(session), stage, lesson, transport);

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // The draw loop blocks; keep the runtime's other workers free for the session
    let res = tokio::task::block_in_place(|| app.run(&mut terminal));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.wrap_err("terminal UI failed")
}

async fn run_headless(config: &Config, source: &str, inputs: Vec<String>) -> Result<()> {
    let transport = transport(config)?;
    let requester = ExplanationRequester::new(transport, config.server.timeout());
    let mut session = Session::new(
        PythonExecutor::new(),
        RecordingRenderer::with_inputs(inputs),
        requester,
    )
    .with_back_policy(config.session.back_policy);

    match session.run(source).await.map_err(|e| eyre!(e))? {
        RunOutcome::Ready { total } => println!("validated: {} steps", total),
        RunOutcome::SyntaxError { error, explanation } => {
            println!("syntax error: {}", error);
            println!("teacher: {}", explanation.text);
            return Ok(());
        }
    }

    loop {
        let outcome = session.step().await.map_err(|e| eyre!(e))?;
        let (step, intent, explanation) = match &outcome {
            StepOutcome::Stepped {
                step,
                intent,
                explanation,
            }
            | StepOutcome::Complete {
                step,
                intent,
                explanation,
                ..
            } => (step, intent, explanation),
            StepOutcome::Failed {
                step,
                error,
                explanation,
            } => {
                println!("line {}: {}", step.line_number + 1, step.code);
                println!("  error: {}", error);
                println!("  teacher: {}", explanation.text);
                break;
            }
        };

        println!("line {}: {}", step.line_number + 1, step.code);
        println!("  animation: {}", serde_json::to_string(intent)?);
        println!("  teacher: {}", explanation.text);

        if let StepOutcome::Complete { celebration, .. } = &outcome {
            println!("{}", celebration);
            break;
        }
    }

    let output = session.output();
    if !output.is_empty() {
        println!("--- output ---");
        print!("{}", output);
    }
    Ok(())
}

async fn explain(config: &Config, source: &str, inputs: &[String]) -> Result<()> {
    let transport = transport(config)?;
    let walkthrough = Walkthrough::request(transport.as_ref(), source, inputs).await;

    for entry in &walkthrough.entries {
        println!("{}", entry.text);
        match &entry.variables {
            VariablePanel::Parsed(vars) => {
                for (name, value) in vars {
                    println!("    {} = {}", name, value);
                }
            }
            VariablePanel::Invalid => println!("    ({})", VariablePanel::INVALID),
            VariablePanel::Absent => {}
        }
        if let Some(highlight) = &entry.highlight {
            println!("    output: {}", highlight);
        }
    }
    Ok(())
}
