use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use crossterm::event::EventStream;
use crossterm::style::Stylize;
use futures::StreamExt;
use serde::Serialize;

mod cli;
mod config;
mod error;
mod host;
mod input;
mod logging;
mod render;
mod runner;

use cli::{Cli, Commands, Target, join_args};
use config::{ConfigEngine, Settings};
use error::{Result, RunnerError};
use host::stream::{StreamHost, prompt_line};
use host::terminal::TerminalHost;
use input::{Intent, KeySequenceState};
use render::Renderer;
use runner::{FileType, Recipe, RunOutcome, RunPlan, RunRequest, Runner, Session, SessionEvent};

/// Exit status of `quickrun run` when nothing knows how to run the file
const EXIT_NO_RECIPE: i32 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    if let Some(path) = logging::init(cli.verbose) {
        tracing::debug!("logging to {}", path.display());
    }

    let settings = load_settings(cli.config.as_deref())?;
    let runner = Runner::with_os(settings);

    match cli.command {
        Commands::Run {
            target,
            prompt,
            args,
        } => cmd_run(&runner, &target, prompt, &args).await,
        Commands::Plan { target, json, args } => cmd_plan(&runner, &target, json, &args),
        Commands::Root { file } => {
            let file = cli::absolute(&file);
            let request = RunRequest::new(file.clone(), FileType::from_path(&file));
            println!("{}", runner.resolve_root(&request).display());
            Ok(0)
        }
        Commands::Session { target } => cmd_session(&runner, &target).await,
        Commands::Config => {
            let json = serde_json::to_string_pretty(runner.settings())
                .map_err(|e| RunnerError::Config(e.to_string()))?;
            println!("{}", json);
            Ok(0)
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let mut engine = ConfigEngine::new();
    match path {
        Some(path) => engine.load_file(path)?,
        None => engine.load_default()?,
    }
    Ok(engine.settings())
}

async fn cmd_run(runner: &Runner, target: &Target, prompt: bool, args: &[String]) -> Result<i32> {
    let mut extra_args = join_args(args);
    if prompt {
        let stdin = io::stdin();
        if let Some(line) = prompt_line(&mut stdin.lock(), &mut io::stderr(), "args: ")? {
            if !extra_args.is_empty() && !line.is_empty() {
                extra_args.push(' ');
            }
            extra_args.push_str(&line);
        }
    }

    let request = target.request(extra_args);
    let mut host = StreamHost::stdio(request.file.clone(), request.filetype.clone());
    let mut session = Session::new(runner.settings().shell.clone());

    let run = match runner.run(&mut host, &mut session, &request) {
        RunOutcome::Started { run, .. } => run,
        RunOutcome::NoRecipe(_) => return Ok(EXIT_NO_RECIPE),
        RunOutcome::Failed(e) => {
            tracing::debug!("run not started: {}", e);
            return Ok(1);
        }
    };

    while let Some(event) = session.next_event().await {
        let ours = matches!(event, SessionEvent::Exited { run: r, .. } if r == run);
        let code = runner.handle_event(&mut host, event);
        if ours {
            return Ok(code.unwrap_or(1));
        }
    }
    Ok(1)
}

#[derive(Serialize)]
struct PlanReport<'a> {
    file: &'a Path,
    filetype: String,
    root: PathBuf,
    plan: Option<RunPlan>,
}

fn cmd_plan(runner: &Runner, target: &Target, json: bool, args: &[String]) -> Result<i32> {
    let request = target.request(join_args(args));
    let (root, recipe) = runner.plan(&request);

    let (plan, code) = match recipe {
        Recipe::Plan(plan) => (Some(plan), 0),
        Recipe::NoRecipe(_) => (None, EXIT_NO_RECIPE),
    };

    if json {
        let report = PlanReport {
            file: &request.file,
            filetype: request.filetype.to_string(),
            root,
            plan,
        };
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| RunnerError::Config(e.to_string()))?;
        println!("{}", out);
        return Ok(code);
    }

    println!("{} {}", "root:".bold(), root.display());
    match plan {
        Some(plan) => {
            println!("{} {}", "cwd:".bold(), plan.working_directory.display());
            println!("{} {}", "command:".bold(), plan.shell_command);
        }
        None => println!(
            "{} no recipe for filetype '{}'",
            "warning:".yellow().bold(),
            request.filetype
        ),
    }
    Ok(code)
}

async fn cmd_session(runner: &Runner, target: &Target) -> Result<i32> {
    let request = target.request(String::new());
    let root = runner.resolve_root(&request);
    let keys = KeySequenceState::with_overrides(&runner.settings().keybinds);
    let mut host = TerminalHost::new(request.file, request.filetype, root, keys);
    let mut session = Session::new(runner.settings().shell.clone());

    Renderer::setup().map_err(RunnerError::Terminal)?;
    let result = event_loop(runner, &mut host, &mut session, target.root.as_deref()).await;
    Renderer::teardown().map_err(RunnerError::Terminal)?;

    result.map(|_| 0)
}

async fn event_loop(
    runner: &Runner,
    host: &mut TerminalHost,
    session: &mut Session,
    explicit_root: Option<&Path>,
) -> Result<()> {
    let mut renderer = Renderer::new().map_err(RunnerError::Terminal)?;
    renderer.render(host).map_err(RunnerError::Terminal)?;

    // Event stream for async key reading
    let mut event_stream = EventStream::new();

    while host.running {
        tokio::select! {
            maybe_event = event_stream.next() => match maybe_event {
                Some(Ok(event)) => match input::handle_event(host, event) {
                    Some(Intent::Run(args)) => {
                        runner.run_active(host, session, &args, explicit_root);
                    }
                    Some(Intent::Resize(width, height)) => renderer.resize(width, height),
                    None => {}
                },
                Some(Err(e)) => return Err(RunnerError::Terminal(e)),
                None => break,
            },
            Some(event) = session.next_event() => {
                runner.handle_event(host, event);
            }
        }

        host.busy = session.in_flight() > 0;
        renderer.render(host).map_err(RunnerError::Terminal)?;
    }

    Ok(())
}
