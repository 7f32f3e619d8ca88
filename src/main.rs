use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use colored::*;
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use spellcode::cli::output::{self, OutputFormat};
use spellcode::{Config, Dictionary, Engine, FileTask, Languages, Report, WordSource};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "spellcode")]
#[command(version, about = "A fast spellchecker for identifiers and comments in source code", long_about = None)]
struct Cli {
    /// Files or directories to check
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Extra word list (plain, .gz or compiled .dict); may be repeated
    #[arg(long = "dict", value_name = "PATH")]
    dictionaries: Vec<PathBuf>,

    /// Do not load the embedded base word list
    #[arg(long)]
    no_builtin: bool,

    /// Personal dictionary file
    #[arg(long)]
    personal_dict: Option<PathBuf>,

    /// Word to ignore; may be repeated
    #[arg(long)]
    ignore_word: Vec<String>,

    /// Pattern to ignore (regex)
    #[arg(long)]
    ignore_pattern: Vec<String>,

    /// Suggest corrections for unknown words
    #[arg(short, long)]
    suggest: bool,

    /// Maximum number of suggestions per word
    #[arg(long, value_name = "N")]
    max_suggestions: Option<usize>,

    /// Check words inside string literals too
    #[arg(long)]
    check_strings: bool,

    /// Number of worker threads
    #[arg(short = 'j', long, value_name = "N")]
    threads: Option<usize>,

    /// Output format (text, json)
    #[arg(short = 'o', long, default_value = "text")]
    format: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Exit with code 0 even if errors are found
    #[arg(long)]
    no_fail: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Dictionary management
    Dict {
        #[command(subcommand)]
        action: DictCommands,
    },
}

#[derive(Parser, Debug)]
enum DictCommands {
    /// Compile word lists into a single .dict file
    Compile {
        /// Word lists to merge
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        /// Output path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Show dictionary info
    Info {
        /// Dictionary or word list path
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "spellcode", &mut io::stdout());
        return Ok(());
    }

    if let Some(command) = cli.command {
        return handle_command(command);
    }

    if cli.files.is_empty() {
        anyhow::bail!("No files specified. Use --help for usage information.");
    }

    let config = apply_overrides(Config::load()?, &cli);
    let colored_output = !cli.no_color;

    let dictionary = Arc::new(config.build_dictionary()?);
    let ignore = Arc::new(config.build_ignore_list()?);
    let languages = config.build_languages()?;

    let tasks = collect_files(&cli.files, &languages);
    let mut engine = Engine::new(dictionary, ignore, config.check_options());
    if let Some(threads) = config.threads {
        engine = engine.with_threads(threads)?;
    }

    let progress = if tasks.len() > 1 && io::stderr().is_terminal() {
        let pb = ProgressBar::new(tasks.len() as u64);
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} {pos}/{len}")?);
        pb.set_message("Checking");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let mut total_errors = 0;
    let mut files_checked = 0;

    match cli.format {
        OutputFormat::Text => {
            engine.check_tasks_in_order(&tasks, |file| {
                total_errors += file.diagnostics().len();
                files_checked += 1;
                let rendered = output::render_file(&file, colored_output);
                match &progress {
                    Some(pb) => {
                        pb.suspend(|| print!("{}", rendered));
                        pb.inc(1);
                    }
                    None => print!("{}", rendered),
                }
            });
            if let Some(pb) = &progress {
                pb.finish_and_clear();
            }
            println!();
            println!(
                "{}",
                output::check_summary(total_errors, files_checked, colored_output)
            );
        }
        OutputFormat::Json => {
            let mut report = Report::default();
            engine.check_tasks_in_order(&tasks, |file| {
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
                report.files.push(file);
            });
            if let Some(pb) = &progress {
                pb.finish_and_clear();
            }
            total_errors = report.error_count();
            let rendered = output::render(&report, colored_output, cli.format)
                .context("Failed to render report")?;
            println!("{}", rendered);
        }
    }

    if total_errors > 0 && !cli.no_fail {
        io::stdout().flush()?;
        std::process::exit(1);
    }

    Ok(())
}

fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    config.dictionaries.extend(cli.dictionaries.iter().cloned());
    config.ignore_words.extend(cli.ignore_word.iter().cloned());
    config.ignore_patterns.extend(cli.ignore_pattern.iter().cloned());
    if cli.no_builtin {
        config.use_builtin_dictionary = false;
    }
    if let Some(path) = &cli.personal_dict {
        config.personal_dictionary = Some(path.clone());
    }
    if cli.suggest {
        config.suggest = true;
    }
    if let Some(n) = cli.max_suggestions {
        config.max_suggestions = n;
    }
    if cli.check_strings {
        config.check_strings = true;
    }
    if cli.threads.is_some() {
        config.threads = cli.threads;
    }
    config
}

/// Walk the given paths and pair every file with its language. Nothing is
/// read here; each file is loaded by the worker that checks it.
fn collect_files(paths: &[PathBuf], languages: &Languages) -> Vec<FileTask> {
    let mut tasks = Vec::new();

    for root in paths {
        for entry in WalkBuilder::new(root).build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "failed to walk path");
                    continue;
                }
            };
            if !entry.file_type().map_or(false, |ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            match languages.for_path(path) {
                Some(syntax) => tasks.push(FileTask::new(path, syntax)),
                None => debug!(path = %path.display(), "skipping file with unknown language"),
            }
        }
    }

    tasks
}

fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Dict { action } => match action {
            DictCommands::Compile { sources, output } => {
                let sources: Vec<_> = sources.into_iter().map(WordSource::path).collect();
                let dictionary = Dictionary::build(&sources)?;
                dictionary
                    .write_to(&output)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                println!(
                    "{} Compiled {} words into {}",
                    "✓".green().bold(),
                    dictionary.len(),
                    output.display()
                );
            }
            DictCommands::Info { path } => {
                let dictionary = if path.extension().map_or(false, |ext| ext == "dict") {
                    Dictionary::open(&path)?
                } else {
                    Dictionary::build(&[WordSource::path(&path)])?
                };
                println!("{}", "Dictionary Information".bold().underline());
                println!("  Path:  {}", path.display());
                println!("  Words: {}", dictionary.len());
            }
        },
    }
    Ok(())
}
