use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::context::StageContext;
use crate::copy_strategy::{CopyOutcome, CopyStrategy, StrategyKind};
use crate::error::{StageError, StageResult};
use crate::manifest::{Manifest, StageRule};

/// Outcome of the primary build, as reported by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Succeeded,
    Failed,
}

/// Summary of one staging run. Non-fatal problems are kept in `issues`.
#[derive(Debug, Default)]
pub struct StageReport {
    pub rules_processed: usize,
    pub rules_skipped: usize,
    pub rules_failed: usize,
    pub files_copied: usize,
    pub files_unchanged: usize,
    pub files_failed: usize,
    pub issues: Vec<StageError>,
}

impl StageReport {
    pub fn is_success(&self) -> bool {
        self.rules_failed == 0 && self.files_failed == 0
    }

    /// Issues recorded against the 1-based rule index.
    pub fn issues_for_rule(&self, rule: usize) -> Vec<&StageError> {
        self.issues
            .iter()
            .filter(|issue| match issue {
                StageError::MissingSourceDirectory { rule: r, .. }
                | StageError::InvalidDestination { rule: r, .. }
                | StageError::CopyFailure { rule: r, .. } => *r == rule,
                _ => false,
            })
            .collect()
    }

    /// Rules with a rejected destination or at least one failed file.
    pub fn failed_rules(&self) -> Vec<usize> {
        let rules: BTreeSet<usize> = self
            .issues
            .iter()
            .filter_map(|issue| match issue {
                StageError::InvalidDestination { rule, .. } | StageError::CopyFailure { rule, .. } => {
                    Some(*rule)
                }
                _ => None,
            })
            .collect();
        rules.into_iter().collect()
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rules processed, {} skipped, {} failed; {} files copied, {} unchanged, {} failed",
            self.rules_processed,
            self.rules_skipped,
            self.rules_failed,
            self.files_copied,
            self.files_unchanged,
            self.files_failed
        )
    }
}

/// Runs a manifest against one build context.
pub struct StageExecutor {
    context: StageContext,
    strategy: Box<dyn CopyStrategy>,
}

impl StageExecutor {
    /// Picks the copy strategy from the target platform's family.
    pub fn new(context: StageContext) -> Self {
        let kind = StrategyKind::for_family(context.platform.family());
        Self::with_strategy(context, kind.into_strategy())
    }

    pub fn with_strategy(context: StageContext, strategy: Box<dyn CopyStrategy>) -> Self {
        Self { context, strategy }
    }

    pub fn context(&self) -> &StageContext {
        &self.context
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Stages only after a successful primary build; returns `None` otherwise.
    pub fn run_after(&self, status: BuildStatus, manifest: &Manifest) -> StageResult<Option<StageReport>> {
        match status {
            BuildStatus::Succeeded => self.run(manifest).map(Some),
            BuildStatus::Failed => {
                info!("Primary build failed, skipping staging");
                Ok(None)
            }
        }
    }

    /// Applies every rule in manifest order.
    ///
    /// Returns `Err` only when a rule's destination directory cannot be
    /// created; remaining rules are not run in that case.
    pub fn run(&self, manifest: &Manifest) -> StageResult<StageReport> {
        let output_root = self.context.output_root();
        let mut report = StageReport::default();

        info!(
            "Staging {} rules into {} ({} copy)",
            manifest.len(),
            output_root.display(),
            self.strategy.kind().as_str()
        );

        for (index, rule) in manifest.into_iter().enumerate() {
            let rule_number = index + 1;
            let source = self.context.expand(rule.source_dir());

            if !source.is_dir() {
                let issue = StageError::MissingSourceDirectory {
                    rule: rule_number,
                    path: source,
                };
                warn!("{}, skipping", issue);
                report.rules_skipped += 1;
                report.issues.push(issue);
                continue;
            }

            let Some(subpath) = rule.normalized_destination() else {
                let issue = StageError::InvalidDestination {
                    rule: rule_number,
                    subpath: rule.destination().to_string(),
                };
                warn!("{}, rejecting rule", issue);
                report.rules_failed += 1;
                report.issues.push(issue);
                continue;
            };

            let destination = output_root.join(subpath);
            if let Err(source) = fs::create_dir_all(&destination) {
                let err = StageError::DestinationCreateFailure {
                    rule: rule_number,
                    path: destination,
                    source,
                };
                // The error itself is reported by the caller
                info!("Staging aborted after: {}", report);
                return Err(err);
            }

            info!(
                "Copying {}/{} to {}",
                source.display(),
                rule.file_mask(),
                destination.display()
            );

            self.stage_rule(rule_number, rule, &source, &destination, &mut report);
            report.rules_processed += 1;
        }

        info!("Staging finished: {}", report);

        Ok(report)
    }

    fn stage_rule(
        &self,
        rule_number: usize,
        rule: &StageRule,
        source: &Path,
        destination: &Path,
        report: &mut StageReport,
    ) {
        let walker = WalkDir::new(source)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let from = e.path().unwrap_or(source).to_path_buf();
                    record_failure(report, rule_number, from, destination.to_path_buf(), io::Error::from(e));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy();
            if !rule.file_mask().matches(&file_name) {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(source) else {
                continue;
            };
            let target = destination.join(relative);

            if let Some(parent) = target.parent() {
                if let Err(e) = fs::create_dir_all(parent) {
                    record_failure(report, rule_number, entry.path().to_path_buf(), target, e);
                    continue;
                }
            }

            match self.strategy.copy_file(entry.path(), &target) {
                Ok(CopyOutcome::Copied) => {
                    debug!("Copied {} -> {}", entry.path().display(), target.display());
                    report.files_copied += 1;
                }
                Ok(CopyOutcome::Unchanged) => {
                    debug!("Up to date: {}", target.display());
                    report.files_unchanged += 1;
                }
                Err(e) => record_failure(report, rule_number, entry.path().to_path_buf(), target, e),
            }
        }
    }
}

fn record_failure(report: &mut StageReport, rule: usize, from: PathBuf, to: PathBuf, source: io::Error) {
    let issue = StageError::CopyFailure {
        rule,
        from,
        to,
        source,
    };
    warn!("{}: {}", issue, issue_cause(&issue));
    report.files_failed += 1;
    report.issues.push(issue);
}

fn issue_cause(issue: &StageError) -> String {
    std::error::Error::source(issue)
        .map(|cause| cause.to_string())
        .unwrap_or_default()
}
