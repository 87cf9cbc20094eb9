use amazed::maze::{Cell, GraphMaze, GridMaze, Maze};
use amazed::solver::{Path, SearchReport, Solver, SolverConfig};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "amazed")]
#[command(about = "amazed - parallel fork/join maze solver")]
#[command(version)]
struct Args {
    /// Maze file: `.yaml`/`.yml` holds a labelled graph, anything else an ASCII grid
    maze: PathBuf,

    /// Solver settings as YAML; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Nodes a task expands before it may fork again (0 = fork at every branch)
    #[arg(long)]
    fork_after: Option<usize>,

    /// Run the whole search in a single task
    #[arg(long)]
    sequential: bool,

    /// Worker threads for the search runtime
    #[arg(long, short = 'j')]
    workers: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Log verbosity (logs go to stderr)
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn build_config(args: &Args) -> anyhow::Result<SolverConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let yaml = std::fs::read_to_string(path)
                .with_context(|| format!("reading solver config {}", path.display()))?;
            SolverConfig::from_yaml_str(&yaml)?
        }
        None => SolverConfig::default(),
    };

    if args.sequential {
        config = config.with_forking(false).with_fork_after_option(None);
    }
    if let Some(fork_after) = args.fork_after {
        config = config.with_fork_after(fork_after);
    }
    if let Some(workers) = args.workers {
        config = config.with_worker_threads(workers);
    }
    config.validate()?;
    Ok(config)
}

fn print_report<N>(
    report: &SearchReport<N>,
    json: bool,
    render: impl Fn(&Path<N>) -> Option<String>,
) -> anyhow::Result<()>
where
    N: amazed::MazeNode + Serialize,
{
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    match &report.path {
        Some(path) => {
            println!("Path found ({} nodes):", path.len());
            println!("  {}", path);
            if let Some(drawing) = render(path) {
                print!("{}", drawing);
            }
        }
        None => println!("No path to a goal."),
    }
    println!("Run {} took {:.2?}", report.run_id, report.elapsed);
    print!("{}", report.stats.format_summary());
    Ok(())
}

fn run<M: Maze>(
    maze: Arc<M>,
    config: SolverConfig,
    json: bool,
    render: impl Fn(&Path<M::Node>) -> Option<String>,
) -> anyhow::Result<()>
where
    M::Node: Serialize,
{
    let report = Solver::new(maze, config).run_blocking()?;
    print_report(&report, json, render)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(args.log_level))
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&args)?;
    let is_graph = matches!(
        args.maze.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );

    if is_graph {
        let maze = Arc::new(GraphMaze::from_file(&args.maze)?);
        run(maze, config, args.json, |_| None)
    } else {
        let maze = Arc::new(GridMaze::from_file(&args.maze)?);
        let drawing = Arc::clone(&maze);
        run(maze, config, args.json, move |path: &Path<Cell>| {
            Some(drawing.render_path(path.nodes()))
        })
    }
}
