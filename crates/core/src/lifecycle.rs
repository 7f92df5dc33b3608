//! Complaint lifecycle: statuses, the transition table, guards, and the
//! derived read-side views (progress, priority).
//!
//! [`Transition::sources`] and [`Transition::target`] are the only place that
//! knows which status may follow which. Everything that mutates a complaint's
//! status goes through [`check_transition`] first.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::access::Action;
use crate::error::CoreError;
use crate::types::{DbId, StatusId, Timestamp};

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum length of an employee or office-head note (characters).
pub const MAX_NOTE_LENGTH: usize = 1000;

/// Employee note stored on claim when the employee gives none.
pub const DEFAULT_ACCEPTANCE_NOTE: &str = "Complaint has been accepted and is being processed";

/// Age below which a complaint is high priority.
pub const HIGH_PRIORITY_HOURS: i64 = 24;
/// Age below which a complaint is medium priority (and at or above high).
pub const MEDIUM_PRIORITY_HOURS: i64 = 72;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Complaint status. Discriminants match the seed order of the
/// `complaint_statuses` lookup table.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Waiting = 1,
    InProgress = 2,
    PendingApproval = 3,
    Approved = 4,
    /// Reserved terminal outcome. No transition targets it today, but rows
    /// in this status still count as terminal in reports.
    Rejected = 5,
    Completed = 6,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 6] = [
        ComplaintStatus::Waiting,
        ComplaintStatus::InProgress,
        ComplaintStatus::PendingApproval,
        ComplaintStatus::Approved,
        ComplaintStatus::Rejected,
        ComplaintStatus::Completed,
    ];

    /// Statuses that count as "being worked on" in summaries and reports.
    pub const IN_PROGRESS_GROUP: [ComplaintStatus; 3] = [
        ComplaintStatus::InProgress,
        ComplaintStatus::PendingApproval,
        ComplaintStatus::Approved,
    ];

    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    pub fn from_id(id: StatusId) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Resolve a status id read from the store, failing loudly on drift
    /// between the lookup table and this enum.
    pub fn try_from_id(id: StatusId) -> Result<Self, CoreError> {
        Self::from_id(id)
            .ok_or_else(|| CoreError::Internal(format!("Unknown complaint status id {id}")))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::InProgress => "in_progress",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown complaint status '{s}'")))
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Progress percentage shown to citizens and office heads.
    pub fn progress_percent(self) -> u8 {
        match self {
            Self::Waiting => 10,
            Self::InProgress => 50,
            Self::PendingApproval => 75,
            Self::Approved => 85,
            Self::Completed => 100,
            Self::Rejected => 0,
        }
    }

    /// Human-readable label paired with [`Self::progress_percent`].
    pub fn label(self) -> &'static str {
        match self {
            Self::Waiting => "Waiting for handling",
            Self::InProgress => "In progress",
            Self::PendingApproval => "Awaiting approval",
            Self::Approved => "Approved",
            Self::Completed => "Completed",
            Self::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-side progress view for a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub percent: u8,
    pub label: &'static str,
}

impl From<ComplaintStatus> for Progress {
    fn from(status: ComplaintStatus) -> Self {
        Progress {
            percent: status.progress_percent(),
            label: status.label(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// A status change on an existing complaint. Creation is not a transition:
/// it has no source status and always lands in [`ComplaintStatus::Waiting`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Claim,
    RequestApproval,
    Approve,
    ReturnForRevision,
    Complete,
}

impl Transition {
    pub const ALL: [Transition; 5] = [
        Transition::Claim,
        Transition::RequestApproval,
        Transition::Approve,
        Transition::ReturnForRevision,
        Transition::Complete,
    ];

    /// Statuses this transition may start from.
    pub fn sources(self) -> &'static [ComplaintStatus] {
        use ComplaintStatus::*;
        match self {
            Transition::Claim => &[Waiting],
            Transition::RequestApproval => &[InProgress],
            Transition::Approve => &[PendingApproval],
            Transition::ReturnForRevision => &[PendingApproval],
            Transition::Complete => &[InProgress, PendingApproval, Approved],
        }
    }

    /// Status after the transition is applied.
    pub fn target(self) -> ComplaintStatus {
        match self {
            Transition::Claim => ComplaintStatus::InProgress,
            Transition::RequestApproval => ComplaintStatus::PendingApproval,
            Transition::Approve => ComplaintStatus::Approved,
            Transition::ReturnForRevision => ComplaintStatus::InProgress,
            Transition::Complete => ComplaintStatus::Completed,
        }
    }

    /// The access-policy action that authorises this transition.
    pub fn action(self) -> Action {
        match self {
            Transition::Claim => Action::Claim,
            Transition::RequestApproval => Action::RequestApproval,
            Transition::Approve => Action::Approve,
            Transition::ReturnForRevision => Action::ReturnForRevision,
            Transition::Complete => Action::Complete,
        }
    }

    /// Only the assigned employee may perform this transition.
    pub fn requires_assignee(self) -> bool {
        matches!(self, Transition::RequestApproval | Transition::Complete)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Claim => "claim",
            Transition::RequestApproval => "request_approval",
            Transition::Approve => "approve",
            Transition::ReturnForRevision => "return_for_revision",
            Transition::Complete => "complete",
        }
    }

    /// Source status ids, for conditional `WHERE status_id = ANY($n)` writes.
    pub fn source_ids(self) -> Vec<StatusId> {
        self.sources().iter().map(|s| s.id()).collect()
    }
}

/// Transitions that may start from `status`.
pub fn available_transitions(status: ComplaintStatus) -> Vec<Transition> {
    Transition::ALL
        .into_iter()
        .filter(|t| t.sources().contains(&status))
        .collect()
}

/// The parts of a complaint the guards look at.
#[derive(Debug, Clone, Copy)]
pub struct GuardSnapshot {
    pub status: ComplaintStatus,
    pub employee_id: Option<DbId>,
}

/// Check `transition` against the complaint's current state.
///
/// The status check runs first, so acting on a complaint in the wrong status
/// is always `InvalidTransition` even for a non-assignee. Returns the target
/// status on success.
pub fn check_transition(
    snapshot: GuardSnapshot,
    transition: Transition,
    actor_id: DbId,
) -> Result<ComplaintStatus, CoreError> {
    if !transition.sources().contains(&snapshot.status) {
        return Err(CoreError::InvalidTransition(format!(
            "Cannot {}: complaint is {}",
            transition.as_str().replace('_', " "),
            snapshot.status.label().to_lowercase()
        )));
    }

    if transition.requires_assignee() && snapshot.employee_id != Some(actor_id) {
        return Err(CoreError::Forbidden(
            "Only the assigned employee can perform this action".into(),
        ));
    }

    Ok(transition.target())
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

/// Citizen-supplied fields of a new complaint.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitComplaint {
    #[validate(range(min = 1, message = "Category is required"))]
    pub category_id: i64,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Title is required and must be at most 255 characters"
    ))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Location is required and must be at most 255 characters"
    ))]
    pub location: String,
}

impl SubmitComplaint {
    /// Trim text fields so whitespace-only input fails the length checks.
    pub fn normalized(self) -> Self {
        Self {
            category_id: self.category_id,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            location: self.location.trim().to_string(),
        }
    }

    /// Normalise and validate, returning per-field errors on failure.
    pub fn validated(self) -> Result<Self, CoreError> {
        let input = self.normalized();
        input.validate()?;
        Ok(input)
    }
}

/// Validate a required note (completion, revision). Returns the trimmed note.
pub fn validate_required_note(field: &str, note: Option<&str>) -> Result<String, CoreError> {
    let note = note.map(str::trim).unwrap_or_default();
    if note.is_empty() {
        return Err(CoreError::field(field, format!("{} is required", humanize(field))));
    }
    validate_note_length(field, note)?;
    Ok(note.to_string())
}

/// Validate an optional note. Returns the trimmed note, empty when absent.
pub fn validate_optional_note(field: &str, note: Option<&str>) -> Result<String, CoreError> {
    let note = note.map(str::trim).unwrap_or_default();
    validate_note_length(field, note)?;
    Ok(note.to_string())
}

fn validate_note_length(field: &str, note: &str) -> Result<(), CoreError> {
    if note.chars().count() > MAX_NOTE_LENGTH {
        return Err(CoreError::field(
            field,
            format!(
                "{} must be at most {MAX_NOTE_LENGTH} characters",
                humanize(field)
            ),
        ));
    }
    Ok(())
}

fn humanize(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Age-derived urgency of a complaint. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Classify by the age of the complaint at `now`.
    pub fn classify(submitted_at: Timestamp, now: Timestamp) -> Self {
        let age = now - submitted_at;
        if age < Duration::hours(HIGH_PRIORITY_HOURS) {
            Self::High
        } else if age < Duration::hours(MEDIUM_PRIORITY_HOURS) {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// `submitted_at` bounds matching this priority at `now`, as
    /// `(strictly_after, at_or_before)`.
    pub fn submitted_bounds(self, now: Timestamp) -> (Option<Timestamp>, Option<Timestamp>) {
        let high_edge = now - Duration::hours(HIGH_PRIORITY_HOURS);
        let medium_edge = now - Duration::hours(MEDIUM_PRIORITY_HOURS);
        match self {
            Self::High => (Some(high_edge), None),
            Self::Medium => (Some(medium_edge), Some(high_edge)),
            Self::Low => (None, Some(medium_edge)),
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(CoreError::Validation(format!(
                "Unknown priority '{other}'. Must be one of: high, medium, low"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
