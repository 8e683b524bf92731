//! Validation reporting.
//!
//! Every problem found while resolving is collected here, tagged with the
//! object, member and phase it belongs to, and forwarded to the [`Logger`].
//! Nothing fails fast: a run reports as many independent problems as it can.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::logger::Logger;

/// Severity of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    /// Reported; does not fail the run unless warnings are escalated.
    Warning,
    /// Fails the run.
    Error,
}

/// Class of problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueKind {
    /// Malformed or contradictory metamodel input.
    Schema,
    /// An invariant of the resolved graph does not hold.
    Consistency,
}

/// Resolution phase an issue was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Phase {
    /// Interface relationships and super-interfaces.
    Interfaces,
    /// Embedded value objects.
    EmbeddedValues,
    /// Name checks while wrapping objects.
    Names,
    /// Attribute checks.
    Attributes,
    /// Superclass merge.
    Inheritance,
    /// Join analysis and reverse relationships.
    Relationships,
    /// Objects against the interfaces they implement.
    InterfaceConformance,
    /// Final invariants.
    PostValidation,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Interfaces => "interfaces",
            Phase::EmbeddedValues => "embedded values",
            Phase::Names => "names",
            Phase::Attributes => "attributes",
            Phase::Inheritance => "inheritance",
            Phase::Relationships => "relationships",
            Phase::InterfaceConformance => "interface conformance",
            Phase::PostValidation => "post-validation",
        };
        f.write_str(name)
    }
}

/// One collected problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Severity.
    pub severity: Severity,
    /// Class of problem.
    pub kind: IssueKind,
    /// Phase it was raised in.
    pub phase: Phase,
    /// Fully-qualified name of the object (or interface) concerned.
    pub object: String,
    /// Attribute or relationship concerned, if any.
    pub member: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.phase)?;
        if let Some(member) = &self.member {
            write!(f, "{}: ", member)?;
        }
        f.write_str(&self.message)
    }
}

/// Consolidated outcome of a resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Every issue, in the order it was raised.
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    /// Hard errors only.
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    /// Warnings only.
    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    /// Number of hard errors.
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Check if any hard error was collected.
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

impl fmt::Display for ValidationReport {
    /// Groups errors under their object: a header line, then one
    /// tab-indented line per message.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut current: Option<&str> = None;
        for issue in self.errors() {
            if current != Some(issue.object.as_str()) {
                writeln!(f, "{}:", issue.object)?;
                current = Some(issue.object.as_str());
            }
            writeln!(f, "\t{}", issue)?;
        }
        Ok(())
    }
}

/// Collects issues and forwards them to the logger.
pub struct ValidationReporter {
    logger: Arc<dyn Logger>,
    warnings_as_errors: bool,
    report: ValidationReport,
}

impl ValidationReporter {
    /// Create a reporter writing to the given logger.
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            logger,
            warnings_as_errors: false,
            report: ValidationReport::default(),
        }
    }

    /// Escalate warnings to errors.
    pub fn with_warnings_as_errors(mut self, enabled: bool) -> Self {
        self.warnings_as_errors = enabled;
        self
    }

    /// Record a hard error.
    pub fn error(
        &mut self,
        phase: Phase,
        kind: IssueKind,
        object: &str,
        member: Option<&str>,
        message: impl Into<String>,
    ) {
        self.push(Severity::Error, phase, kind, object, member, message.into());
    }

    /// Record a warning.
    pub fn warning(
        &mut self,
        phase: Phase,
        kind: IssueKind,
        object: &str,
        member: Option<&str>,
        message: impl Into<String>,
    ) {
        let severity = if self.warnings_as_errors {
            Severity::Error
        } else {
            Severity::Warning
        };
        self.push(severity, phase, kind, object, member, message.into());
    }

    /// Record every message returned by a member-level validation.
    ///
    /// Returns `true` when `errors` was empty.
    pub fn process_errors(
        &mut self,
        phase: Phase,
        kind: IssueKind,
        object: &str,
        member: Option<&str>,
        errors: Vec<String>,
    ) -> bool {
        let clean = errors.is_empty();
        for message in errors {
            self.error(phase, kind, object, member, message);
        }
        clean
    }

    fn push(
        &mut self,
        severity: Severity,
        phase: Phase,
        kind: IssueKind,
        object: &str,
        member: Option<&str>,
        message: String,
    ) {
        let issue = Issue {
            severity,
            kind,
            phase,
            object: object.to_string(),
            member: member.map(str::to_string),
            message,
        };
        match severity {
            Severity::Error => self.logger.error(&format!("{}: {}", issue.object, issue)),
            Severity::Warning => self.logger.warn(&format!("{}: {}", issue.object, issue)),
        }
        self.report.issues.push(issue);
    }

    /// Number of hard errors collected so far.
    pub fn error_count(&self) -> usize {
        self.report.error_count()
    }

    /// Check if any hard error was collected.
    pub fn has_errors(&self) -> bool {
        self.report.has_errors()
    }

    /// The report collected so far.
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Consume the reporter, keeping its report.
    pub fn into_report(self) -> ValidationReport {
        self.report
    }
}
