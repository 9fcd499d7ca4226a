use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use logsift::{
    highlight, merge_spans, CancellationToken, ConfigOverrides, EncodingMode, Expression,
    MatchRecord, ProgressEvent, ScanOutcome, ScanSink, SearchConfig, SearchError, TraversalMode,
};
use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const EXIT_NO_RESULTS: u8 = 1;
const EXIT_FATAL: u8 = 2;
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser)]
#[command(author, version, about = "Keyword search over mail server logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SearchArgs {
    /// Keywords to search for. Separate groups with `or`; terms in a group
    /// must all appear (`and` is optional). Quote a phrase to keep it whole.
    #[arg(required = true)]
    query: Vec<String>,

    /// Log category (address, audit, bruteforce, ip, fail2ban, mailbox, zimbra, all)
    #[arg(short = 'c', long, default_value = "all", allow_hyphen_values = true)]
    category: String,

    /// Root directory holding the logs
    #[arg(short = 'd', long)]
    root: Option<PathBuf>,

    /// Only look at files directly under the root
    #[arg(long)]
    flat: bool,

    /// Maximum directory depth when recursing
    #[arg(long)]
    max_depth: Option<usize>,

    /// How to handle invalid UTF-8 sequences (failfast|lossy)
    #[arg(long)]
    encoding: Option<EncodingMode>,

    /// File name patterns to skip (glob format)
    #[arg(long)]
    exclude: Vec<String>,

    /// Configuration file to load on top of the default locations
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also save the matched lines to this file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Print one JSON object per match
    #[arg(long)]
    json: bool,

    /// Disable highlighting
    #[arg(long)]
    no_color: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Treat the arguments as one query string and split it on whitespace,
    /// keeping "double-quoted phrases" together
    #[arg(long)]
    raw: bool,

    /// Log level for diagnostics on stderr (overridden by RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search log files for keywords
    Search(Box<SearchArgs>),

    /// List the categories and the file name prefixes they select
    Categories {
        /// Configuration file to load on top of the default locations
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Search(args) => run_search(*args),
        Commands::Categories { config } => {
            let config = SearchConfig::load_from(config.as_deref())?;
            print_categories(&config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();
}

fn run_search(args: SearchArgs) -> Result<ExitCode> {
    if args.no_color {
        colored::control::set_override(false);
    }

    let overrides = ConfigOverrides {
        root_path: args.root.clone(),
        traversal: args.flat.then_some(TraversalMode::Flat),
        max_depth: args.max_depth,
        encoding_mode: args.encoding,
        exclude_patterns: args.exclude.clone(),
        log_level: args.log_level.clone(),
    };
    let config = SearchConfig::load_from(args.config.as_deref())?.merge_with_cli(overrides);
    config.validate()?;
    init_logging(&config.log_level);

    let expression = if args.raw {
        Expression::parse(&args.query.join(" "))?
    } else {
        Expression::from_tokens(&args.query)?
    };
    debug!("Parsed query: {}", expression);

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("Failed to install the Ctrl-C handler")?;

    let mut sink = TerminalSink::new(&expression, &args);
    let summary = logsift::search(&config, &args.category, &expression, &token, &mut sink)?;
    sink.progress.finish_and_clear();

    if let Some(path) = &args.output {
        save_results(path, &sink.saved)?;
    }

    let code = match summary.outcome {
        ScanOutcome::NoFiles => {
            eprintln!("No log files found for category '{}'", args.category);
            ExitCode::from(EXIT_NO_RESULTS)
        }
        ScanOutcome::NoMatches => {
            eprintln!("No matches found for keywords: {}.", expression);
            ExitCode::from(EXIT_NO_RESULTS)
        }
        ScanOutcome::Cancelled => {
            eprintln!("{}", "Search cancelled by user.".yellow());
            ExitCode::from(EXIT_CANCELLED)
        }
        ScanOutcome::Completed => {
            eprintln!(
                "Found {} matches in {} files",
                summary.matches, summary.files_scanned
            );
            eprintln!("{}", "Search completed.".green());
            ExitCode::SUCCESS
        }
    };
    Ok(code)
}

/// Prints matches as they arrive and drives the progress bar
struct TerminalSink {
    terms: Vec<String>,
    json: bool,
    keep: bool,
    saved: Vec<String>,
    progress: ProgressBar,
}

impl TerminalSink {
    fn new(expression: &Expression, args: &SearchArgs) -> Self {
        let progress = if args.no_progress {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files")
            {
                bar.set_style(style.progress_chars("=>-"));
            }
            bar
        };

        Self {
            terms: expression.terms().into_iter().map(String::from).collect(),
            json: args.json,
            keep: args.output.is_some(),
            saved: Vec::new(),
            progress,
        }
    }

    /// The display line with every term occurrence painted, path included
    fn render(&self, record: &MatchRecord) -> String {
        paint(&record.to_string(), &self.terms)
    }
}

impl ScanSink for TerminalSink {
    fn on_match(&mut self, record: MatchRecord) {
        if self.keep {
            self.saved.push(record.to_string());
        }

        let line = if self.json {
            match serde_json::to_string(&record) {
                Ok(json) => json,
                Err(e) => {
                    warn!("Could not encode match as JSON: {}", e);
                    return;
                }
            }
        } else {
            self.render(&record)
        };
        self.progress.suspend(|| println!("{}", line));
    }

    fn on_progress(&mut self, event: ProgressEvent) {
        self.progress.set_length(event.files_total as u64);
        self.progress.set_position(event.files_done as u64);
    }

    fn on_file_error(&mut self, error: &SearchError) {
        self.progress.suspend(|| eprintln!("{}", error.to_string().red()));
    }
}

/// Disjoint spans of every term in a rendered line
fn match_spans(line: &str, terms: &[String]) -> Vec<(usize, usize)> {
    merge_spans(&highlight(line, terms))
}

/// Paints the highlighted spans of `text`; plain when colouring is off
fn paint(text: &str, terms: &[String]) -> String {
    let spans = match_spans(text, terms);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, end) in spans {
        out.push_str(&text[last..start]);
        out.push_str(&text[start..end].red().bold().to_string());
        last = end;
    }
    out.push_str(&text[last..]);
    out
}

fn save_results(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(path, content)
        .with_context(|| format!("Failed to save results to '{}'", path.display()))?;
    eprintln!("Results saved to {}", path.display());
    Ok(())
}

fn print_categories(config: &SearchConfig) -> Result<()> {
    let set = config.category_set()?;
    for category in set.iter() {
        println!(
            "{:<12} {}",
            category.name.bold(),
            category.prefixes.join(", ")
        );
    }
    let all = set.resolve(logsift::categories::ALL)?;
    println!("{:<12} {}", logsift::categories::ALL.bold(), all.join(", "));
    Ok(())
}
