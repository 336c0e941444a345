//! Command-line interface for lambdacheck.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::analysis::{Compilation, Document, Project};
use crate::config::{Config, CONFIG_FILE_NAMES, DEFAULT_TEMPLATE};
use crate::detect::{Runner, Severity};
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Find route handler lambdas whose attributes the framework never sees.
///
/// Attributes placed on a method that a lambda merely calls are not applied
/// to the endpoint. lambdacheck reports those attributes so they can be
/// moved onto the lambda itself.
#[derive(Parser)]
#[command(name = "lambdacheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level for diagnostics written to stderr (overridden by RUST_LOG)
    #[arg(long, global = true, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze C# sources for misplaced handler attributes
    #[command(visible_alias = "check")]
    Lint(LintArgs),
    /// Write a default lambdacheck config
    Init(InitArgs),
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Arguments for the lint command.
#[derive(Parser)]
pub struct LintArgs {
    /// Path to check (file or directory)
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty, json, or sarif
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Show suppressed diagnostics in output
    #[arg(long)]
    pub show_suppressed: bool,

    /// Fail the run when any warning is reported
    #[arg(long)]
    pub deny_warnings: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "lambdacheck.yaml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Collect C# sources under `root`, honoring the config's exclusions.
pub fn collect_files(root: &Path, config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            // Skip hidden directories
            if name.starts_with('.') {
                return false;
            }
            config.include_generated || (name != "bin" && name != "obj")
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_csharp = path
            .extension()
            .map_or(false, |ext| ext.to_string_lossy().eq_ignore_ascii_case("cs"));
        if !is_csharp {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        if config.is_path_excluded(relative) || config.is_generated(relative) {
            tracing::debug!(path = %path.display(), "skipping excluded file");
            continue;
        }
        files.push(path.to_path_buf());
    }

    Ok(files)
}

/// Read each file into a document named by its path. Files that are not
/// valid UTF-8 are skipped.
fn read_documents(files: &[PathBuf]) -> anyhow::Result<Vec<Document>> {
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let bytes = std::fs::read(path)?;
        match String::from_utf8(bytes) {
            Ok(text) => documents.push(Document::new(path.to_string_lossy(), text)),
            Err(_) => tracing::warn!(path = %path.display(), "skipping file that is not UTF-8"),
        }
    }
    Ok(documents)
}

/// Build the project for the given documents and config.
fn build_project(
    documents: Vec<Document>,
    config: &Config,
    reference_base: &Path,
) -> anyhow::Result<Project> {
    let mut project = Project::from_documents(documents).with_options(config.compilation_options());
    for reference in config.load_references(reference_base)? {
        tracing::debug!(reference = %reference.display, "adding configured reference");
        project = project.add_metadata_reference(reference);
    }
    Ok(project)
}

/// Run the lint command.
pub fn run_lint(args: &LintArgs) -> anyhow::Result<i32> {
    crate::init();

    // Validate format
    if args.format != "pretty" && args.format != "json" && args.format != "sarif" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty', 'json', or 'sarif'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    // Resolve path
    let abs_path = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };
    let root = if abs_path.is_dir() {
        abs_path.clone()
    } else {
        abs_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| abs_path.clone())
    };

    // Explicit config, else one next to the sources, else one in the working directory
    let explicit = match &args.config {
        Some(path) => Some(path.clone()),
        None => Config::discover(&root).or_else(|| {
            std::env::current_dir()
                .ok()
                .and_then(|cwd| Config::discover(&cwd))
        }),
    };
    let (config, config_path) = match Config::load(explicit.as_deref(), &root) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    if config_path.is_none() {
        tracing::info!(
            "no config found (looked for {}), using defaults",
            CONFIG_FILE_NAMES.join(", ")
        );
    }

    // Collect files to scan
    let files = if abs_path.is_dir() {
        collect_files(&abs_path, &config)?
    } else {
        vec![abs_path.clone()]
    };

    if files.is_empty() {
        eprintln!("Warning: no files to scan");
        return Ok(EXIT_SUCCESS);
    }

    let documents = read_documents(&files)?;
    let reference_base = config_path
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.clone());
    let project = match build_project(documents, &config, &reference_base) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    // Run detection
    let compilation = Compilation::create(&project)?;
    let result = Runner::new(config.analyzer()).run(&compilation);

    let warnings = result.count_by_severity(Severity::Warning);
    let passed = !result.has_errors() && !(args.deny_warnings && warnings > 0);

    // Output results
    let config_str = config_path.as_ref().map(|p| p.to_string_lossy().to_string());
    let path_str = args.path.to_string_lossy().to_string();

    match args.format.as_str() {
        "json" => {
            report::write_json(&path_str, config_str.as_deref(), &result, passed)?;
        }
        "sarif" => {
            report::write_sarif(&root, &result)?;
        }
        _ => {
            report::write_pretty(
                &path_str,
                config_str.as_deref(),
                &result,
                passed,
                args.show_suppressed,
            );
        }
    }

    if passed {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() && !args.force {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Use --force to overwrite it or --output to choose another path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, DEFAULT_TEMPLATE) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize for your project", args.output.display());
    println!("  2. Run: lambdacheck lint . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}
