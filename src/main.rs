use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use logsieve::config;
use logsieve::pattern::PatternTree;
use logsieve::render::{RenderAction, ViewState};
use logsieve::tail::Document;
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "logsieve")]
#[command(about = "Follow a log file through a boolean pattern-tree filter", long_about = None)]
struct Args {
    /// Log file to follow (omit to filter piped stdin)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Pattern expression, e.g. '&(lars,!(Dis))'
    #[arg(short = 'e', long = "expr", value_name = "EXPR")]
    expr: Option<String>,

    /// Named pattern from the config file
    #[arg(long = "pattern-name", value_name = "NAME", conflicts_with = "expr")]
    pattern_name: Option<String>,

    /// Poll interval in milliseconds (overrides the config file)
    #[arg(long, value_name = "MS")]
    interval: Option<u64>,

    /// Render the current contents once and exit instead of following
    #[arg(long)]
    once: bool,

    /// Prefix each line with its source line number
    #[arg(short = 'n', long = "line-numbers")]
    line_numbers: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = config::load_default()?;
    let tree = build_tree(&args, &config)?;
    let interval = Duration::from_millis(args.interval.unwrap_or(config.poll_interval_ms));

    let mut doc = Document::with_fingerprint_window(config.fingerprint_window);
    match &args.file {
        Some(path) => {
            doc.attach_file(path);
            doc.poll();
        }
        None => {
            let stdin = std::io::stdin();
            if stdin.is_terminal() {
                bail!("no file given and nothing piped on stdin (see --help)");
            }
            let mut bytes = Vec::new();
            stdin
                .lock()
                .read_to_end(&mut bytes)
                .context("failed to read stdin")?;
            doc.attach_text(&bytes);
        }
    }

    let mut view = ViewState::new(tree.is_root_active());
    render_lines(&doc, &tree, &mut view, true, args.line_numbers);
    print_status(&doc, &view);

    // Static documents (pasted stdin) have nothing further to poll.
    if args.once || doc.is_frozen() {
        return Ok(());
    }

    loop {
        thread::sleep(interval);
        match view.on_poll_result(doc.poll()) {
            RenderAction::NoAction => {}
            RenderAction::AppendLines => {
                render_lines(&doc, &tree, &mut view, false, args.line_numbers);
                print_status(&doc, &view);
            }
            RenderAction::FullReplace => {
                // The file was truncated, replaced or removed: start over
                // on whatever now lives at the path.
                eprintln!("{}", "--- source replaced, restarting ---".yellow());
                if let Some(path) = &args.file {
                    doc.attach_file(path);
                    doc.poll();
                }
                render_lines(&doc, &tree, &mut view, true, args.line_numbers);
                print_status(&doc, &view);
            }
        }
    }
}

/// Resolve the pattern tree from the CLI expression, a named config
/// pattern, or the always-visible default.
fn build_tree(args: &Args, config: &config::Config) -> Result<PatternTree> {
    let expr = match (&args.expr, &args.pattern_name) {
        (Some(expr), _) => Some(expr.clone()),
        (None, Some(name)) => Some(
            config
                .patterns
                .get(name)
                .with_context(|| format!("pattern '{}' not found in the config file", name))?
                .clone(),
        ),
        (None, None) => None,
    };
    match expr {
        Some(expr) => PatternTree::from_expression(&expr)
            .map_err(|err| anyhow::anyhow!("invalid pattern expression: {}", err)),
        None => Ok(PatternTree::new()),
    }
}

fn render_lines(
    doc: &Document,
    tree: &PatternTree,
    view: &mut ViewState,
    restart: bool,
    line_numbers: bool,
) {
    if restart {
        view.reset_counts();
    }
    doc.iterate_lines(restart, |line, index| {
        let visible = view.record(tree.evaluate(line));
        if visible {
            if line_numbers {
                println!("{} {}", format!("{:>6}", index + 1).dimmed(), line);
            } else {
                println!("{}", line);
            }
        }
        visible
    });
}

fn print_status(doc: &Document, view: &ViewState) {
    let name = doc.short_file_name();
    let mut status = if name.is_empty() {
        view.status()
    } else {
        format!("{}: {}", name, view.status())
    };
    if let Some(modified) = doc.last_modified() {
        status.push_str(&format!(" (modified {})", modified));
    }
    eprintln!("{}", status.dimmed());
}
