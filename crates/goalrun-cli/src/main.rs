//! Goalrun CLI - run toolchain build goals through the background job queue
//! while the invoking shell blocks on the outcome.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use goalrun_core::RunMode;
use goalrun_exec::{
    goal::{CONFIGURATION_PROPERTY, REMOTE_BUILD_PROPERTY, SIMULATOR_UDID_PROPERTY},
    BackgroundQueue, CoordinationThread, ExecutionContext, GoalTask, InMemoryPrefs,
    InMemorySettings, LogNotifier, ProcessLauncher, StaticContext, SyncJobRunner,
};

const TOOLCHAIN_HOME_ENV: &str = "GOALRUN_TOOLCHAIN_HOME";

/// Goalrun - synchronous front end for toolchain build goals
#[derive(Parser)]
#[command(name = "goalrun")]
#[command(about = "Run toolchain build goals synchronously", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a build goal and wait for its outcome
    Run {
        #[command(flatten)]
        goal: GoalArgs,

        /// Launcher program, relative to the toolchain home
        #[arg(long, default_value = "bin/build")]
        program: PathBuf,

        /// Print a machine-readable outcome summary
        #[arg(long)]
        json: bool,
    },

    /// Print the assembled goal invocation without executing it
    Print {
        #[command(flatten)]
        goal: GoalArgs,
    },
}

#[derive(Args)]
struct GoalArgs {
    /// Goal to execute (may contain several whitespace-separated tokens)
    #[arg(short, long)]
    goal: String,

    /// Title shown while the job runs
    #[arg(short, long, default_value = "Build")]
    title: String,

    /// Start the job background-eligible
    #[arg(long)]
    background: bool,

    /// Working directory (defaults to the current directory)
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Toolchain installation directory (falls back to $GOALRUN_TOOLCHAIN_HOME)
    #[arg(long)]
    toolchain_home: Option<PathBuf>,

    /// Extra setting as KEY=VALUE (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    settings: Vec<(String, String)>,

    /// Build configuration, e.g. Debug or Release
    #[arg(long)]
    configuration: Option<String>,

    /// Enable remote builds
    #[arg(long)]
    remote_build: bool,

    /// Target simulator device UDID
    #[arg(long)]
    simulator_udid: Option<String>,
}

impl GoalArgs {
    fn run_mode(&self) -> RunMode {
        if self.background {
            RunMode::Background
        } else {
            RunMode::Foreground
        }
    }

    fn context(&self) -> StaticContext {
        let mut context = StaticContext::new();

        let work_dir = self.work_dir.clone().or_else(|| env::current_dir().ok());
        if let Some(dir) = work_dir {
            context = context.with_work_dir(dir);
        }

        let toolchain_home = self
            .toolchain_home
            .clone()
            .or_else(|| env::var_os(TOOLCHAIN_HOME_ENV).map(PathBuf::from));
        if let Some(home) = toolchain_home {
            context = context.with_toolchain_home(home);
        }

        context
    }

    fn task(&self, context: Arc<dyn ExecutionContext>) -> GoalTask {
        let settings: InMemorySettings = self.settings.iter().cloned().collect();

        let mut task = GoalTask::new(
            &self.goal,
            &self.title,
            self.run_mode(),
            context,
            Arc::new(settings),
            Arc::new(LogNotifier),
        );

        if let Some(configuration) = &self.configuration {
            task = task.with_property(CONFIGURATION_PROPERTY, configuration);
        }
        if self.remote_build {
            task = task.with_property(REMOTE_BUILD_PROPERTY, "true");
        }
        if let Some(udid) = &self.simulator_udid {
            task = task.with_property(SIMULATOR_UDID_PROPERTY, udid);
        }

        task
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("failed to initialize logging");
    }

    match cli.command {
        Commands::Run {
            goal,
            program,
            json,
        } => run_goal(&goal, program, json),
        Commands::Print { goal } => print_goal(&goal),
    }
}

fn run_goal(args: &GoalArgs, program: PathBuf, json: bool) -> ExitCode {
    let context = Arc::new(args.context());

    let queue = match BackgroundQueue::new() {
        Ok(queue) => Arc::new(queue),
        Err(e) => {
            error!(error = %e, "failed to start the job queue");
            return ExitCode::FAILURE;
        }
    };
    let dispatcher = match CoordinationThread::new() {
        Ok(dispatcher) => Arc::new(dispatcher),
        Err(e) => {
            error!(error = %e, "failed to start the coordination thread");
            return ExitCode::FAILURE;
        }
    };

    let runner = SyncJobRunner::new(
        context.clone(),
        queue,
        dispatcher,
        Arc::new(InMemoryPrefs::default()),
    );
    let task = args.task(context);
    let launcher = Arc::new(ProcessLauncher::new(program));

    let started = Instant::now();
    let success = task.run(&runner, launcher);
    let duration_ms = started.elapsed().as_millis() as u64;

    if json {
        let summary = serde_json::json!({
            "goal": args.goal,
            "title": args.title,
            "success": success,
            "duration_ms": duration_ms,
        });
        println!("{summary}");
    } else if success {
        info!(goal = %args.goal, duration_ms, "goal succeeded");
    } else {
        error!(goal = %args.goal, duration_ms, "goal failed");
    }

    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_goal(args: &GoalArgs) -> ExitCode {
    let context = Arc::new(args.context());

    let (Some(home), Some(work_dir)) = (context.toolchain_home(), context.work_dir()) else {
        error!("toolchain home or working directory is unresolved");
        return ExitCode::FAILURE;
    };

    let task = args.task(context);

    println!("toolchain home: {}", home.display());
    println!("work dir:       {}", work_dir.display());
    println!("arguments:      {}", task.arguments().join(" "));

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("build.log.level=debug").unwrap(),
            ("build.log.level".to_owned(), "debug".to_owned())
        );
        assert!(parse_key_value("no-equals").is_err());
        assert!(parse_key_value("=value").is_err());
    }

    #[test]
    fn test_run_mode_from_flag() {
        let cli = Cli::parse_from(["goalrun", "run", "--goal", "compile", "--background"]);
        let Commands::Run { goal, .. } = cli.command else {
            panic!("expected run command");
        };
        assert!(goal.run_mode().is_background());
    }
}
