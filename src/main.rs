//! careermate: AI career assistant for resumes and job descriptions

use careermate::cli::{self, AnalysisInputs, Cli, Commands, ConfigAction, JobInput};
use careermate::config::Config;
use careermate::error::{CareerMateError, Result};
use careermate::input::rasterizer::PdfiumRenderer;
use careermate::llm::client::GeminiClient;
use careermate::output::formatter::ConsoleFormatter;
use careermate::session::{Command, Reply, Session, SessionHandler};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::future::Future;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

type Handler = SessionHandler<GeminiClient, PdfiumRenderer>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // The API key may come from a .env file
    dotenvy::dotenv().ok();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, cli.config, config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config_path: Option<PathBuf>, config: Config) -> Result<()> {
    let formatter = ConsoleFormatter::new(config.output.color_output);

    match command {
        Commands::Review { inputs } => run_once(&config, &formatter, Some(&inputs), None, Command::Review).await,
        Commands::Match { inputs } => run_once(&config, &formatter, Some(&inputs), None, Command::Match).await,
        Commands::Keywords { inputs, local } => {
            let command = if local { Command::KeywordsLocal } else { Command::Keywords };
            run_once(&config, &formatter, Some(&inputs), None, command).await
        }
        Commands::Project { inputs, save } => {
            let mut handler = build_handler(&config)?;
            let mut session = Session::from_config(&config.cache);
            prepare(&mut handler, &mut session, Some(&inputs), None).await?;

            let reply = run_step(&mut handler, &mut session, Command::Project).await;
            print!("{}", reply.render(&formatter));
            if save.is_some() && !reply.is_error() {
                let saved = run_step(&mut handler, &mut session, Command::SaveProject(save)).await;
                print!("{}", saved.render(&formatter));
            }
            Ok(())
        }
        Commands::Chat { inputs, question } => {
            run_once(&config, &formatter, Some(&inputs), None, Command::Chat(question)).await
        }
        Commands::Suggest { job, kind } => {
            run_once(&config, &formatter, None, Some(&job), Command::Suggest(kind)).await
        }
        Commands::Import { text, output } => {
            let mut handler = build_handler(&config)?;
            let mut session = Session::from_config(&config.cache);

            println!("📄 Importing resume text: {}", text.display());
            let reply = run_step(&mut handler, &mut session, Command::Import(text)).await;
            print!("{}", reply.render(&formatter));
            if !reply.is_error() {
                let exported = run_step(&mut handler, &mut session, Command::Export(output)).await;
                print!("{}", exported.render(&formatter));
            }
            Ok(())
        }
        Commands::Session { resume, job } => {
            let mut handler = build_handler(&config)?;
            let mut session = Session::from_config(&config.cache);
            run_session(&mut handler, &mut session, &formatter, resume, job).await
        }
        Commands::Config { action } => {
            let path = config_path.unwrap_or_else(Config::config_path);
            match action {
                Some(ConfigAction::Show) | None => {
                    println!("⚙️  Current Configuration ({})\n", path.display());
                    let rendered = toml::to_string_pretty(&config)
                        .map_err(|e| CareerMateError::Configuration(e.to_string()))?;
                    println!("{}", rendered);
                }
                Some(ConfigAction::Reset) => {
                    println!("🔄 Resetting configuration to defaults...");
                    Config::default().save_to(&path)?;
                    println!("✅ Configuration reset: {}", path.display());
                }
                Some(ConfigAction::Path) => println!("{}", path.display()),
            }
            Ok(())
        }
    }
}

fn build_handler(config: &Config) -> Result<Handler> {
    let client = GeminiClient::from_env(&config.model)?;
    let renderer = PdfiumRenderer::new(config.render.pdfium_library_path.clone());
    info!("Using model {} (review: {})", config.model.default_model, config.model.review_model);
    Ok(SessionHandler::from_config(client, renderer, config))
}

/// Loads the one-shot inputs into the session, stopping at the first failure
async fn prepare(
    handler: &mut Handler,
    session: &mut Session,
    inputs: Option<&AnalysisInputs>,
    job: Option<&JobInput>,
) -> Result<()> {
    let mut steps = Vec::new();
    if let Some(inputs) = inputs {
        cli::validate_file_extension(&inputs.resume, &["pdf"])
            .map_err(|e| CareerMateError::InvalidInput(format!("Resume file: {}", e)))?;
        println!("📄 Resume: {}", inputs.resume.display());
        steps.push(Command::Resume(inputs.resume.clone()));
    }

    if let Some(job) = job.or(inputs.map(|i| &i.job)) {
        match (&job.job, &job.job_text) {
            (Some(path), _) => {
                cli::validate_file_extension(path, &["txt", "md"])
                    .map_err(|e| CareerMateError::InvalidInput(format!("Job description file: {}", e)))?;
                println!("💼 Job Description: {}", path.display());
                steps.push(Command::Job(path.clone()));
            }
            (None, Some(text)) => steps.push(Command::JobText(text.clone())),
            (None, None) => {}
        }
    }

    for step in steps {
        let reply = run_step(handler, session, step).await;
        if reply.is_error() {
            print!("{}", reply.render(&ConsoleFormatter::default()));
            return Err(CareerMateError::MissingInput("the resume or job description could not be loaded".to_string()));
        }
    }
    Ok(())
}

async fn run_once(
    config: &Config,
    formatter: &ConsoleFormatter,
    inputs: Option<&AnalysisInputs>,
    job: Option<&JobInput>,
    command: Command,
) -> Result<()> {
    let mut handler = build_handler(config)?;
    let mut session = Session::from_config(&config.cache);
    prepare(&mut handler, &mut session, inputs, job).await?;

    let reply = run_step(&mut handler, &mut session, command).await;
    print!("{}", reply.render(formatter));
    Ok(())
}

async fn run_step(handler: &mut Handler, session: &mut Session, command: Command) -> Reply {
    let message = busy_message(&command);
    match message {
        Some(message) => with_spinner(message, handler.handle(session, command)).await,
        None => handler.handle(session, command).await,
    }
}

fn busy_message(command: &Command) -> Option<&'static str> {
    match command {
        Command::Resume(_) => Some("Rendering resume..."),
        Command::Review => Some("Reviewing your resume..."),
        Command::Match => Some("Calculating match percentage..."),
        Command::Keywords | Command::KeywordsLocal => Some("Extracting keywords..."),
        Command::Chat(_) => Some("Thinking..."),
        Command::Project => Some("Generating the ideal project..."),
        Command::Import(_) => Some("Parsing resume text..."),
        Command::Suggest(_) => Some("Drafting suggestions..."),
        _ => None,
    }
}

/// Busy indicator while a handler runs; there is no progress to report
async fn with_spinner<F: Future<Output = Reply>>(message: &str, work: F) -> Reply {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let reply = work.await;
    spinner.finish_and_clear();
    reply
}

async fn run_session(
    handler: &mut Handler,
    session: &mut Session,
    formatter: &ConsoleFormatter,
    resume: Option<PathBuf>,
    job: Option<PathBuf>,
) -> Result<()> {
    println!("{}", "🚀 CareerMate interactive session".bold());
    println!("Type `help` for commands, `quit` to leave.\n");

    for command in [resume.map(Command::Resume), job.map(Command::Job)].into_iter().flatten() {
        let reply = run_step(handler, session, command).await;
        print!("{}", reply.render(formatter));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"careermate> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = match line.parse::<Command>() {
            Ok(command) => run_step(handler, session, command).await,
            Err(e) => Reply::Error(format!("Error: {}", e)),
        };

        if reply == Reply::Quit {
            break;
        }
        print!("{}", reply.render(formatter));
    }

    println!("👋 Session ended");
    Ok(())
}
