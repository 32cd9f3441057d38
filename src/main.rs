// heapscope: line-by-line execution tracer with heap snapshots

use std::fs;
use std::io;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use heapscope::config::TraceConfig;
use heapscope::runner::{self, RunReport};
use heapscope::snapshot::Limits;
use heapscope::ui::App;

const USAGE_ERROR: &str = "Expected a single argument with the path to the code file.";

/// Trace a program and print the recorded steps as JSON
#[derive(Debug, Parser)]
#[command(name = "heapscope", version, about)]
struct Cli {
    /// Program to trace
    #[arg(value_name = "FILE")]
    paths: Vec<PathBuf>,

    /// Snapshot nesting depth before nodes are truncated
    #[arg(long, default_value_t = Limits::default().max_depth)]
    max_depth: usize,

    /// Children recorded per container or object
    #[arg(long, default_value_t = Limits::default().max_items)]
    max_items: usize,

    /// Objects recorded per snapshot
    #[arg(long, default_value_t = Limits::default().max_objects)]
    max_objects: usize,

    /// Longest rendered value, in characters
    #[arg(long, default_value_t = TraceConfig::default().repr_length)]
    repr_length: usize,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// Replay the trace in the terminal instead of printing it
    #[arg(long)]
    view: bool,
}

impl Cli {
    fn trace_config(&self) -> TraceConfig {
        TraceConfig {
            limits: Limits {
                max_depth: self.max_depth,
                max_items: self.max_items,
                max_objects: self.max_objects,
            },
            repr_length: self.repr_length,
            ..TraceConfig::default()
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => err.exit(),
        Err(err) => {
            tracing::debug!(error = %err, "rejected command line");
            print_usage_error();
            return Ok(());
        }
    };
    let [path] = cli.paths.as_slice() else {
        print_usage_error();
        return Ok(());
    };

    let report = runner::run_file(path, &cli.trace_config());
    if !cli.view {
        println!("{}", report.to_json(cli.pretty)?);
        return Ok(());
    }

    let source = fs::read_to_string(path).unwrap_or_default();
    view(report, source)
}

fn print_usage_error() {
    let report = serde_json::json!({ "success": false, "error": USAGE_ERROR });
    println!("{}", report);
}

fn view(report: RunReport, source: String) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(report, source);
    let res = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }
    Ok(())
}
