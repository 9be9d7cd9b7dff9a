use clap::{Args, Parser, Subcommand};
use dircompare_common::{load_config, AppConfig, DiffEntry, DiffStatus, DiffTree, LineStatus, NodeId};
use dircompare_core::{
    export_csv, flatten, hides_stats, list_directories, DetectedMove, DirectoryComparator, EntryKind,
    ExportFilter, Filter, IgnoreMatcher,
};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dircompare")]
#[command(author = "DirCompare Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Directory tree comparison with move detection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two directory trees
    Compare {
        /// Left (old) directory path
        left: PathBuf,

        /// Right (new) directory path
        right: PathBuf,

        #[command(flatten)]
        options: CompareOptions,

        /// Print flattened entries as a table instead of a tree
        #[arg(short, long, conflicts_with = "json")]
        table: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,

        /// Show only differences (hide identical entries)
        #[arg(short = 'd', long)]
        diff_only: bool,

        /// Disable ANSI colors in output
        #[arg(long)]
        no_color: bool,
    },

    /// Show the line diff of one entry
    Diff {
        /// Left root directory
        left_root: PathBuf,

        /// Right root directory
        right_root: PathBuf,

        /// Entry path relative to the right root
        relative_path: String,

        /// Left-side path for moved entries, relative to the left root
        #[arg(short, long)]
        source: Option<String>,

        /// Output the diff as JSON
        #[arg(long)]
        json: bool,

        /// Disable ANSI colors in output
        #[arg(long)]
        no_color: bool,
    },

    /// Export a comparison as CSV
    Export {
        /// Left (old) directory path
        left: PathBuf,

        /// Right (new) directory path
        right: PathBuf,

        #[command(flatten)]
        options: CompareOptions,

        /// Entry type to keep: all, directory, java, xml, json, yaml, props, file
        #[arg(long = "type", default_value = "all")]
        kind: Filter<EntryKind>,

        /// Status to keep: all or a status name such as modified
        #[arg(long, default_value = "all")]
        status: Filter<DiffStatus>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List sub-directories of a path (home directory by default)
    Ls {
        path: Option<PathBuf>,

        /// Ignore-list file (one glob pattern per line)
        #[arg(long)]
        ignore_file: Option<PathBuf>,

        /// Output the listing as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct CompareOptions {
    /// Ignore-list file (one glob pattern per line)
    #[arg(long)]
    ignore_file: Option<PathBuf>,

    /// Ignore patterns (can be specified multiple times)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Disable move detection
    #[arg(long)]
    no_moves: bool,
}

impl CompareOptions {
    fn apply(self, config: &mut AppConfig) {
        if let Some(ignore_file) = self.ignore_file {
            config.ignore_file = Some(ignore_file);
        }
        config.extra_ignore_patterns.extend(self.ignore);
        if self.no_moves {
            config.detect_moves = false;
        }
    }
}

fn main() {
    // Initialize tracing to stderr (so JSON and CSV output can go cleanly to stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn"))
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compare {
            left,
            right,
            options,
            table,
            json,
            diff_only,
            no_color,
        } => run_compare(left, right, options, table, json, diff_only, no_color),
        Commands::Diff {
            left_root,
            right_root,
            relative_path,
            source,
            json,
            no_color,
        } => run_diff(left_root, right_root, relative_path, source, json, no_color),
        Commands::Export {
            left,
            right,
            options,
            kind,
            status,
            output,
        } => run_export(left, right, options, ExportFilter { kind, status }, output),
        Commands::Ls {
            path,
            ignore_file,
            json,
        } => run_ls(path, ignore_file, json),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

fn build_comparator(options: CompareOptions) -> Result<DirectoryComparator, Box<dyn std::error::Error>> {
    let loaded = load_config()?;
    info!("Using config {} (exists: {})", loaded.path.display(), loaded.exists);
    let mut config = loaded.config;
    options.apply(&mut config);
    Ok(DirectoryComparator::new(&config)?)
}

fn validate_roots(left: &Path, right: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !left.exists() {
        return Err(format!("Left path does not exist: {}", left.display()).into());
    }
    if !right.exists() {
        return Err(format!("Right path does not exist: {}", right.display()).into());
    }
    Ok(())
}

fn run_compare(
    left: PathBuf,
    right: PathBuf,
    options: CompareOptions,
    table: bool,
    json: bool,
    diff_only: bool,
    no_color: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    validate_roots(&left, &right)?;

    info!("Comparing:");
    info!("  Left:  {}", left.display());
    info!("  Right: {}", right.display());

    let comparator = build_comparator(options)?;
    let outcome = comparator.compare_detailed(&left, &right)?;
    let entries = flatten(&outcome.tree);
    let summary = Summary::from_entries(&entries);

    if json {
        let report = JsonReport {
            left: left.to_string_lossy().to_string(),
            right: right.to_string_lossy().to_string(),
            summary,
            moves: &outcome.moves,
            entries: entries
                .iter()
                .filter(|e| !diff_only || e.status != DiffStatus::Identical)
                .collect(),
            tree: &outcome.tree,
        };
        let output = serde_json::to_string_pretty(&report)?;
        println!("{output}");
        return Ok(());
    }

    let use_color = !no_color && std::io::stdout().is_terminal();

    println!("\n{}", "=".repeat(80));
    println!("Comparison Results");
    println!("{}", "=".repeat(80));

    if table {
        print_table(&entries, diff_only, use_color);
    } else {
        let tree = &outcome.tree;
        print_tree(tree, tree.root(), 0, diff_only, use_color);
    }

    println!("\n{}", "=".repeat(80));
    println!("Summary:");
    println!("  Total entries:   {}", summary.total);
    for status in DiffStatus::ALL {
        println!(
            "  {:<16} {} {}",
            format!("{}:", status_label(status)),
            summary.count(status),
            paint(&format!("({})", status_symbol(status)), status, use_color)
        );
    }
    println!("{}", "=".repeat(80));

    Ok(())
}

fn print_tree(tree: &DiffTree, id: NodeId, depth: usize, diff_only: bool, use_color: bool) {
    let node = tree.node(id);
    if diff_only && node.status == DiffStatus::Identical {
        return;
    }

    let mut line = format!(
        "{}{} {}",
        "  ".repeat(depth),
        paint(status_symbol(node.status), node.status, use_color),
        node.name
    );
    if node.is_directory {
        line.push('/');
    } else if node.status != DiffStatus::Identical && node.status != DiffStatus::Moved {
        line.push_str(&format!(
            "  [+{} ~{} -{}, {:.1}%]",
            node.added, node.modified, node.removed, node.percentage
        ));
    }
    if let Some(source) = &node.source_path {
        line.push_str(&format!("  (from {})", source));
    }
    println!("{}", line);

    for child in tree.children(id) {
        print_tree(tree, *child, depth + 1, diff_only, use_color);
    }
}

fn print_table(entries: &[DiffEntry], diff_only: bool, use_color: bool) {
    println!(
        "{:<6} {:>7} {:>6} {:>6} {:>6}  {}",
        "Status", "Diff %", "Added", "Mod", "Del", "Path"
    );
    println!("{}", "-".repeat(80));

    for entry in entries {
        if diff_only && entry.status == DiffStatus::Identical {
            continue;
        }

        let (percentage, added, modified, removed) = if hides_stats(entry) {
            ("-".to_string(), "-".to_string(), "-".to_string(), "-".to_string())
        } else {
            (
                format!("{:.1}%", entry.percentage),
                entry.added.to_string(),
                entry.modified.to_string(),
                entry.removed.to_string(),
            )
        };
        let source = entry
            .source_path
            .as_deref()
            .map(|s| format!(" <- {}", s))
            .unwrap_or_default();

        println!(
            "{} {:>7} {:>6} {:>6} {:>6}  {}{}",
            paint(&format!("{:<6}", status_symbol(entry.status)), entry.status, use_color),
            percentage,
            added,
            modified,
            removed,
            truncate_path(&entry.path, 60),
            source
        );
    }
}

fn run_diff(
    left_root: PathBuf,
    right_root: PathBuf,
    relative_path: String,
    source: Option<String>,
    json: bool,
    no_color: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let comparator = DirectoryComparator::default();
    let diff = comparator.diff_entry(&left_root, &right_root, &relative_path, source.as_deref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&diff)?);
        return Ok(());
    }

    let use_color = !no_color && std::io::stdout().is_terminal();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for (index, line) in diff.lines.iter().enumerate() {
        let (marker, color) = match line.status {
            LineStatus::Identical => (' ', ""),
            LineStatus::Added => ('+', "\x1b[34m"),
            LineStatus::Removed => ('-', "\x1b[33m"),
            LineStatus::Modified => ('~', "\x1b[31m"),
        };
        let text = format!(
            "{:>5} {} {:<40} | {}",
            index + 1,
            marker,
            truncate_path(line.left.as_deref().unwrap_or(""), 40),
            line.right.as_deref().unwrap_or("")
        );
        if use_color && !color.is_empty() {
            writeln!(out, "{}{}\x1b[0m", color, text)?;
        } else {
            writeln!(out, "{}", text)?;
        }
    }

    writeln!(
        out,
        "\n{} added, {} modified, {} removed ({:.1}% changed)",
        diff.added, diff.modified, diff.removed, diff.percentage
    )?;
    out.flush()?;
    Ok(())
}

fn run_export(
    left: PathBuf,
    right: PathBuf,
    options: CompareOptions,
    filter: ExportFilter,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    validate_roots(&left, &right)?;

    let comparator = build_comparator(options)?;
    let tree = comparator.compare_directories(&left, &right)?;
    let entries = flatten(&tree);

    let rows = match &output {
        Some(path) => export_csv(&entries, &filter, BufWriter::new(File::create(path)?))?,
        None => export_csv(&entries, &filter, io::stdout().lock())?,
    };
    info!("Exported {} rows", rows);
    Ok(())
}

fn run_ls(
    path: Option<PathBuf>,
    ignore_file: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config()?.config;
    if ignore_file.is_some() {
        config.ignore_file = ignore_file;
    }
    let matcher = IgnoreMatcher::from_config(&config);
    let items = list_directories(path.as_deref(), &matcher)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for item in &items {
            println!("{}", item.path.display());
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    left: String,
    right: String,
    summary: Summary,
    moves: &'a [DetectedMove],
    entries: Vec<&'a DiffEntry>,
    tree: &'a DiffTree,
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    total: usize,
    added: usize,
    removed: usize,
    modified: usize,
    identical: usize,
    moved: usize,
    moved_modified: usize,
}

impl Summary {
    /// Counts over every entry below the root
    fn from_entries(entries: &[DiffEntry]) -> Self {
        let mut summary = Summary::default();
        for entry in entries.iter().skip(1) {
            summary.total += 1;
            *summary.slot(entry.status) += 1;
        }
        summary
    }

    fn slot(&mut self, status: DiffStatus) -> &mut usize {
        match status {
            DiffStatus::Added => &mut self.added,
            DiffStatus::Removed => &mut self.removed,
            DiffStatus::Modified => &mut self.modified,
            DiffStatus::Identical => &mut self.identical,
            DiffStatus::Moved => &mut self.moved,
            DiffStatus::MovedModified => &mut self.moved_modified,
        }
    }

    fn count(&self, status: DiffStatus) -> usize {
        match status {
            DiffStatus::Added => self.added,
            DiffStatus::Removed => self.removed,
            DiffStatus::Modified => self.modified,
            DiffStatus::Identical => self.identical,
            DiffStatus::Moved => self.moved,
            DiffStatus::MovedModified => self.moved_modified,
        }
    }
}

fn status_symbol(status: DiffStatus) -> &'static str {
    match status {
        DiffStatus::Identical => "==",
        DiffStatus::Modified => "!=",
        DiffStatus::Removed => "<<",
        DiffStatus::Added => ">>",
        DiffStatus::Moved => "->",
        DiffStatus::MovedModified => "~>",
    }
}

fn status_label(status: DiffStatus) -> &'static str {
    match status {
        DiffStatus::Identical => "Identical",
        DiffStatus::Modified => "Modified",
        DiffStatus::Removed => "Removed",
        DiffStatus::Added => "Added",
        DiffStatus::Moved => "Moved",
        DiffStatus::MovedModified => "Moved+modified",
    }
}

fn paint(text: &str, status: DiffStatus, use_color: bool) -> String {
    if !use_color {
        return text.to_string();
    }
    let color = match status {
        DiffStatus::Identical => "\x1b[32m",     // Green
        DiffStatus::Modified => "\x1b[31m",      // Red
        DiffStatus::Removed => "\x1b[33m",       // Yellow
        DiffStatus::Added => "\x1b[34m",         // Blue
        DiffStatus::Moved => "\x1b[36m",         // Cyan
        DiffStatus::MovedModified => "\x1b[35m", // Magenta
    };
    format!("{}{}\x1b[0m", color, text)
}

fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    // Keep the end of the path (file name) visible
    let prefix = "...";
    let keep_len = max_len.saturating_sub(prefix.len());
    let skip_count = path.chars().count().saturating_sub(keep_len);
    let suffix: String = path.chars().skip(skip_count).collect();

    format!("{}{}", prefix, suffix)
}
