use std::path::Path;

use console::Style;

use crate::error::MutorError;
use crate::observer::ProgressObserver;
use crate::options::{ReportFormat, RunOptions};
use crate::schemata::{MutationMapping, MutationSchema};
use crate::state::{MutationOutcome, MutationTestOutcome, TestVerdict};

pub const ISSUE_TRACKER_URL: &str = "https://github.com/mutor-mutation-testing/mutor/issues";

pub fn print_error(msg: &str) {
    let style = Style::new().red().bold();
    eprintln!("{} {}", style.apply_to("✗"), msg);
}

pub fn print_success(msg: &str) {
    let style = Style::new().green().bold();
    println!("{} {}", style.apply_to("✓"), msg);
}

/// Boxed diagnostic banner for fatal errors: the raw error detail framed so
/// it stands out in a long build log, plus a pointer to the issue tracker.
pub fn print_fatal(error: &MutorError) {
    let frame = Style::new().red().bold();
    let bar = "⚠".repeat(5);
    eprintln!("{}", frame.apply_to(format!("{bar}  mutor has encountered an error  {bar}")));
    eprintln!("{error}");
    eprintln!("{}", frame.apply_to(format!("{bar}  see the error detail above this line  {bar}")));
    eprintln!();
    eprintln!("If you think this is a bug, please open an issue at {ISSUE_TRACKER_URL}");
}

/// Render the final outcome in the requested format, to stdout or a file.
pub fn report_outcome(
    outcome: &MutationTestOutcome,
    options: &RunOptions,
) -> Result<(), MutorError> {
    let rendered = match options.report_format {
        ReportFormat::Plain => render_plain(outcome),
        ReportFormat::Json => {
            serde_json::to_string_pretty(outcome).unwrap_or_else(|_| "{}".into())
        }
    };
    match &options.report_path {
        Some(path) => std::fs::write(path, rendered).map_err(|e| MutorError::WorkspaceFailed {
            reason: format!("could not write report to {}: {}", path.display(), e),
        }),
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}

fn render_plain(outcome: &MutationTestOutcome) -> String {
    let killed = outcome.killed();
    let survived = outcome.survived();
    let build_errors = outcome.build_errors();
    let score_pct = outcome.score() * 100.0;

    let mut out = String::new();
    out.push_str(&format!(
        "{} mutants tested in {:.1}s: {} killed, {} survived ({:.1}% score)\n",
        outcome.mutations.len(),
        outcome.test_duration_ms as f64 / 1000.0,
        killed,
        survived,
        score_pct,
    ));
    if build_errors > 0 {
        out.push_str(&format!(
            "  · {build_errors} mutants hit build errors (excluded from score)\n"
        ));
    }
    if outcome.coverage > 0.0 {
        out.push_str(&format!("  · project coverage: {:.1}%\n", outcome.coverage));
    }

    let survivors: Vec<&MutationOutcome> = outcome
        .mutations
        .iter()
        .filter(|m| m.verdict == TestVerdict::Passed)
        .collect();
    if !survivors.is_empty() {
        out.push('\n');
        out.push_str("Surviving mutants:\n");
        for m in survivors {
            out.push_str(&format!(
                "  {}:{} [{}]\n",
                m.point.file_path, m.point.position, m.point.operator_id,
            ));
            out.push_str(&snapshot_diff(m));
        }
    }
    out
}

/// Line diff of the before/after snapshot fragments.
fn snapshot_diff(outcome: &MutationOutcome) -> String {
    use similar::TextDiff;
    let diff = TextDiff::from_lines(&outcome.snapshot.before, &outcome.snapshot.after);
    let mut out = String::new();
    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Delete => out.push_str(&format!("    - {}", change)),
            similar::ChangeTag::Insert => out.push_str(&format!("    + {}", change)),
            _ => {}
        }
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Progress rendering during a run. Implements the observer seam with
/// console styling; quiet mode suppresses everything.
pub struct ConsoleObserver {
    quiet: bool,
}

impl ConsoleObserver {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ProgressObserver for ConsoleObserver {
    fn project_copy_started(&self) {
        if !self.quiet {
            println!("Copying project to working copy...");
        }
    }

    fn project_copy_finished(&self, mutated_project: &Path) {
        if !self.quiet {
            println!("Working copy staged at {}", mutated_project.display());
        }
    }

    fn mappings_discovered(&self, mappings: &[MutationMapping]) {
        if !self.quiet {
            println!(
                "Discovered {} mutation points in {} files",
                MutationMapping::total_schemata(mappings),
                mappings.len(),
            );
        }
    }

    fn test_plan_created(&self, path: &Path) {
        if !self.quiet {
            print_success(&format!("Test plan written to {}", path.display()));
        }
    }

    fn test_plan_loaded(&self, path: &Path) {
        if !self.quiet {
            println!("Loaded test plan from {}", path.display());
        }
    }

    fn coverage_discovered(&self, percent: f64) {
        if !self.quiet {
            println!("Project coverage: {percent:.1}%");
        }
    }

    fn coverage_unavailable(&self, reason: &str) {
        if !self.quiet {
            let dim = Style::new().dim();
            println!("{}", dim.apply_to(format!("Coverage unavailable: {reason}")));
        }
    }

    fn mutation_testing_started(&self, total_schemata: usize) {
        if !self.quiet {
            println!("Running baseline, then up to {total_schemata} mutants...");
        }
    }

    fn baseline_passed(&self, duration_ms: u64, remaining: usize) {
        if !self.quiet {
            println!(
                "Baseline passed in {:.1}s; {} mutation points remaining",
                duration_ms as f64 / 1000.0,
                remaining,
            );
        }
    }

    fn activation_failed(&self, schema: &MutationSchema, reason: &str) {
        if !self.quiet {
            let style = Style::new().yellow();
            println!(
                "{} could not activate {} ({reason}); continuing",
                style.apply_to("!"),
                schema.activation_id,
            );
        }
    }

    fn mutation_tested(&self, outcome: &MutationOutcome, _log: &str) {
        if self.quiet {
            return;
        }
        let (mark, style) = match outcome.verdict {
            TestVerdict::Failed => ("✓ killed", Style::new().green()),
            TestVerdict::Passed => ("! survived", Style::new().yellow().bold()),
            TestVerdict::BuildError => ("· build error", Style::new().dim()),
        };
        println!(
            "  {} {}:{} [{}] {} → {}",
            style.apply_to(mark),
            outcome.point.file_path,
            outcome.point.position,
            outcome.point.operator_id,
            outcome.snapshot.before.trim(),
            outcome.snapshot.after.trim(),
        );
    }
}
