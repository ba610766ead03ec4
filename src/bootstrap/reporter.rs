//! Progress and warning events emitted while bootstrapping.

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A declared dependency that a sibling package exists for but does not satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchWarning {
    /// The dependent package.
    pub package: String,
    /// The sibling that was not linked.
    pub dependency: String,
    /// The range the dependent declares.
    pub expected_range: String,
    /// The sibling's actual version.
    pub actual_version: String,
}

impl fmt::Display for MismatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Version mismatch inside \"{}\". Depends on \"{}@{}\" instead of \"{}\".",
            self.package, self.dependency, self.expected_range, self.actual_version
        )
    }
}

/// How one package's pipeline ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageOutcome {
    Succeeded,
    Failed,
}

/// Receives bootstrap events. Implementations must tolerate calls from
/// concurrently running pipelines.
pub trait Reporter: Send + Sync {
    /// A package's pipeline finished, successfully or not.
    fn package_finished(&self, package: &str, outcome: PackageOutcome);

    /// A sibling exists for a declared dependency but its version is out of range.
    fn version_mismatch(&self, warning: &MismatchWarning);
}

/// Prints progress to stdout and warnings to stderr.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    total: usize,
    finished: AtomicUsize,
}

impl ConsoleReporter {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            finished: AtomicUsize::new(0),
        }
    }

    /// Count one more finished package, returning the new total.
    fn next_count(&self) -> usize {
        self.finished.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Reporter for ConsoleReporter {
    fn package_finished(&self, package: &str, outcome: PackageOutcome) {
        let count = self.next_count();
        let status = match outcome {
            PackageOutcome::Succeeded => "bootstrapped",
            PackageOutcome::Failed => "failed",
        };
        println!("   [{}/{}] {} {}", count, self.total, status, package);
    }

    fn version_mismatch(&self, warning: &MismatchWarning) {
        eprintln!("Warning: {}", warning);
    }
}

/// Keeps every event in memory, for tests and summaries.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    finished: Mutex<Vec<(String, PackageOutcome)>>,
    warnings: Mutex<Vec<MismatchWarning>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finished packages in completion order.
    pub fn finished(&self) -> Vec<(String, PackageOutcome)> {
        self.finished
            .lock()
            .map(|f| f.clone())
            .unwrap_or_default()
    }

    pub fn warnings(&self) -> Vec<MismatchWarning> {
        self.warnings
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }
}

impl Reporter for RecordingReporter {
    fn package_finished(&self, package: &str, outcome: PackageOutcome) {
        if let Ok(mut finished) = self.finished.lock() {
            finished.push((package.to_string(), outcome));
        }
    }

    fn version_mismatch(&self, warning: &MismatchWarning) {
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(warning.clone());
        }
    }
}
