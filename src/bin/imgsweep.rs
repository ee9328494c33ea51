//! CLI binary for edgequake-imgsweep.
//!
//! A thin shim over the library crate that maps CLI flags to `SweepConfig`
//! and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_imgsweep::{
    sweep, write_report, CaseSensitivity, FsWorkspace, ProgressCallback, RelocationOutput,
    ScanOutput, ScanPhase, SweepConfig, SweepProgressCallback, Workspace,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar reused for the document pass and the
/// move pass, plus a log line per failure.
struct CliProgressCallback {
    bar: ProgressBar,
    root: PathBuf,
    doc_errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new(root: PathBuf) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Discovering");
        bar.set_message("Listing images and documents…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            root,
            doc_errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, prefix: &'static str, unit: &str, total: usize) {
        let style = ProgressStyle::with_template(&format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  [{{bar:42.green/238}}] \
             {{pos:>4}}/{{len}} {unit}  ⏱ {{elapsed_precise}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_position(0);
        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix(prefix);
        self.bar.reset_eta();
    }

    fn short<'a>(&self, path: &'a Path) -> std::borrow::Cow<'a, str> {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
    }
}

impl SweepProgressCallback for CliProgressCallback {
    fn on_discovery_complete(&self, images: usize, documents: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {images} images and {documents} Markdown documents"))
        ));
        self.activate_bar("Scanning", "docs", documents);
    }

    fn on_document_start(&self, path: &Path) {
        self.bar.set_message(self.short(path).into_owned());
    }

    fn on_document_complete(&self, _path: &Path, _matched: usize) {
        self.bar.inc(1);
    }

    fn on_document_error(&self, path: &Path, error: &str) {
        self.doc_errors.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {}  {}",
            red("✗"),
            self.short(path),
            dim(error)
        ));
        self.bar.inc(1);
    }

    fn on_scan_complete(&self, total_images: usize, unused: usize) {
        let errors = self.doc_errors.load(Ordering::SeqCst);
        let mark = if errors == 0 { green("✔") } else { cyan("⚠") };
        self.bar.println(format!(
            "{} {} of {} images unused{}",
            mark,
            bold(&unused.to_string()),
            total_images,
            if errors == 0 {
                String::new()
            } else {
                format!("  ({} unreadable documents)", red(&errors.to_string()))
            }
        ));
    }

    fn on_relocation_start(&self, total: usize) {
        self.activate_bar("Moving", "images", total);
    }

    fn on_image_moved(&self, _source: &Path, _destination: &Path) {
        self.bar.inc(1);
    }

    fn on_image_error(&self, source: &Path, error: &str) {
        let msg = if error.len() > 100 {
            let cut = error
                .char_indices()
                .nth(99)
                .map(|(i, _)| i)
                .unwrap_or(error.len());
            format!("{}\u{2026}", &error[..cut])
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {}  {}",
            red("✗"),
            self.short(source),
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_phase(&self, phase: ScanPhase) {
        if phase == ScanPhase::Done {
            self.bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # List unused images under the current directory without moving anything
  imgsweep --dry-run

  # Move unused images of a docs tree into docs/unused-images/
  imgsweep ./docs

  # Quarantine somewhere else, treating paths as case-insensitive
  imgsweep --quarantine-dir ../attic --case insensitive .

  # Skip generated output and only consider PNG and SVG files
  imgsweep --exclude 'site/**' --image-ext png --image-ext svg .

  # Machine-readable report
  imgsweep --dry-run --json . > report.json
  imgsweep --dry-run --report build/imgsweep.json .

HOW REFERENCES ARE MATCHED:
  ![alt](img/a.png)            relative to the Markdown file's directory
  ![alt](/img/a.png)           relative to the scanned ROOT, not to /
  ![alt](<img/with space.png>) angle brackets allow spaces
  ![alt](a.png "title")        titles are ignored
  ![alt](https://…)            network images are ignored

  Case-insensitive comparison is the default on Windows and macOS.

ENVIRONMENT VARIABLES:
  IMGSWEEP_QUARANTINE_DIR  Same as --quarantine-dir
  IMGSWEEP_CONCURRENCY     Same as --concurrency
  IMGSWEEP_CASE            Same as --case
  RUST_LOG                 Override log filter (e.g. edgequake_imgsweep=trace)
"#;

/// Move images no Markdown document references into a quarantine directory.
#[derive(Parser, Debug)]
#[command(
    name = "imgsweep",
    version,
    about = "Move images no Markdown document references into a quarantine directory",
    long_about = "Scan a project for image files and Markdown documents, find the images no \
document embeds, and move them into a quarantine directory, keeping their paths relative to \
the project root so they can be restored.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Workspace root to scan.
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Destination for unused images, relative to ROOT unless absolute.
    #[arg(short = 'd', long, env = "IMGSWEEP_QUARANTINE_DIR", default_value = "unused-images")]
    quarantine_dir: PathBuf,

    /// Documents and moves processed at once [default: available cores].
    #[arg(short, long, env = "IMGSWEEP_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Path comparison: auto, sensitive, insensitive.
    #[arg(long, env = "IMGSWEEP_CASE", value_enum, default_value = "auto")]
    case: CaseArg,

    /// Extra root-relative glob to exclude (repeatable).
    #[arg(long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// Image extension to consider, replacing the defaults (repeatable).
    #[arg(long = "image-ext", value_name = "EXT")]
    image_ext: Vec<String>,

    /// Report what would move without touching any file.
    #[arg(short = 'n', long, env = "IMGSWEEP_DRY_RUN")]
    dry_run: bool,

    /// Print a JSON report on stdout.
    #[arg(long, env = "IMGSWEEP_JSON")]
    json: bool,

    /// Also write the JSON report to FILE.
    #[arg(long, value_name = "FILE", env = "IMGSWEEP_REPORT")]
    report: Option<PathBuf>,

    /// Disable progress bar.
    #[arg(long, env = "IMGSWEEP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMGSWEEP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "IMGSWEEP_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum CaseArg {
    Auto,
    Sensitive,
    Insensitive,
}

impl From<CaseArg> for CaseSensitivity {
    fn from(v: CaseArg) -> Self {
        match v {
            CaseArg::Auto => CaseSensitivity::Auto,
            CaseArg::Sensitive => CaseSensitivity::Sensitive,
            CaseArg::Insensitive => CaseSensitivity::Insensitive,
        }
    }
}

#[derive(serde::Serialize)]
struct Report<'a> {
    scan: &'a ScanOutput,
    relocation: Option<&'a RelocationOutput>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar provides all the feedback that matters, so library
    // INFO logs are suppressed while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Open workspace ───────────────────────────────────────────────────
    let workspace = FsWorkspace::new(&cli.root)
        .with_context(|| format!("Cannot scan {}", cli.root.display()))?;
    let root = workspace.root()?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new(root.clone());
        Some(cb as Arc<dyn SweepProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Scan, then relocate ──────────────────────────────────────────────
    let output = sweep(&workspace, &config).await.context("Sweep failed")?;
    let scan_output = output.scan;
    let relocation = (!scan_output.unused.is_empty()).then_some(output.relocation);

    // ── Report ───────────────────────────────────────────────────────────
    let report = Report {
        scan: &scan_output,
        relocation: relocation.as_ref(),
    };
    if let Some(ref path) = cli.report {
        write_report(path, &report)
            .await
            .with_context(|| format!("Cannot write report to {}", path.display()))?;
    }
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
        return Ok(());
    }

    if cli.quiet {
        return Ok(());
    }

    print_summary(&root, &scan_output, relocation.as_ref());
    Ok(())
}

/// Map CLI args to `SweepConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SweepConfig> {
    let mut builder = SweepConfig::builder()
        .quarantine_dir(cli.quarantine_dir.clone())
        .case_sensitivity(cli.case.clone().into())
        .dry_run(cli.dry_run);

    if let Some(n) = cli.concurrency {
        builder = builder.concurrency(n);
    }
    if !cli.image_ext.is_empty() {
        builder = builder.image_extensions(cli.image_ext.iter().cloned());
    }
    for pattern in &cli.exclude {
        builder = builder.exclude(pattern.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(root: &Path, scan: &ScanOutput, relocation: Option<&RelocationOutput>) {
    let short = |p: &Path| p.strip_prefix(root).unwrap_or(p).display().to_string();

    for doc in scan.failed_documents() {
        if let Some(ref e) = doc.error {
            eprintln!("{} {}", red("✗"), e);
        }
    }

    let Some(relocation) = relocation else {
        eprintln!(
            "{} No unused images among {} images in {} documents  {}",
            green("✔"),
            scan.stats.total_images,
            scan.stats.total_documents,
            dim(&format!("{}ms", scan.stats.duration_ms)),
        );
        return;
    };

    for mv in &relocation.moves {
        match (&mv.destination, &mv.error) {
            (Some(dst), None) => println!("{}  →  {}", short(&mv.source), dim(&short(dst))),
            (_, Some(e)) => eprintln!("{} {}", red("✗"), e),
            (None, None) => {}
        }
    }

    let verb = if relocation.stats.dry_run {
        "Would move"
    } else {
        "Moved"
    };
    eprintln!(
        "{}  {} {}/{} unused images to {}  {}",
        if relocation.stats.failed == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        verb,
        relocation.stats.moved,
        relocation.stats.total,
        bold(&relocation.quarantine_dir.display().to_string()),
        dim(&format!(
            "{}ms",
            scan.stats.duration_ms + relocation.stats.duration_ms
        )),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["imgsweep"]);
        assert_eq!(cli.root, PathBuf::from("."));
        assert_eq!(cli.quarantine_dir, PathBuf::from("unused-images"));
        assert!(!cli.dry_run);
        assert!(cli.report.is_none());
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.case_sensitivity, CaseSensitivity::Auto);
        assert!(config.concurrency >= 1);
    }

    #[test]
    fn cli_flags_map_to_config() {
        let cli = Cli::parse_from([
            "imgsweep",
            "--dry-run",
            "--case",
            "insensitive",
            "-c",
            "3",
            "--exclude",
            "site/**",
            "--image-ext",
            "PNG",
            "-d",
            "attic",
            "--report",
            "out/report.json",
            "docs",
        ]);
        let config = build_config(&cli, None).unwrap();
        assert!(config.dry_run);
        assert_eq!(config.case_sensitivity, CaseSensitivity::Insensitive);
        assert_eq!(config.concurrency, 3);
        assert!(config.exclude.contains(&"site/**".to_string()));
        assert_eq!(config.image_extensions, vec!["png"]);
        assert_eq!(config.quarantine_dir, PathBuf::from("attic"));
        assert_eq!(cli.root, PathBuf::from("docs"));
        assert_eq!(cli.report, Some(PathBuf::from("out/report.json")));
    }
}
