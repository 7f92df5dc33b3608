//! Who hears about each lifecycle event, and what they are told.

use serde::Serialize;

use crate::lifecycle::Transition;

/// The set of users a lifecycle event fans out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    /// Every active employee. Grows with headcount.
    AllEmployees,
    /// Every active office head.
    AllOfficeHeads,
    /// The citizen who filed the complaint.
    Citizen,
    /// The employee the complaint is assigned to.
    AssignedEmployee,
}

/// Audience for a new submission.
pub const SUBMISSION_AUDIENCE: Audience = Audience::AllEmployees;

pub fn audience_for(transition: Transition) -> Audience {
    match transition {
        Transition::Claim | Transition::Complete => Audience::Citizen,
        Transition::RequestApproval => Audience::AllOfficeHeads,
        Transition::Approve | Transition::ReturnForRevision => Audience::AssignedEmployee,
    }
}

/// Title and body of a notification before it is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub title: String,
    pub body: String,
}

impl NotificationDraft {
    fn new(title: &str, body: String) -> Self {
        Self {
            title: title.to_string(),
            body,
        }
    }
}

pub fn submitted_draft(tracking_number: &str) -> NotificationDraft {
    NotificationDraft::new(
        "New complaint",
        format!("A new complaint {tracking_number} from a citizen needs handling."),
    )
}

/// Notification text for a transition. `note` is the note recorded with it.
pub fn transition_draft(
    transition: Transition,
    tracking_number: &str,
    note: &str,
) -> NotificationDraft {
    match transition {
        Transition::Claim => NotificationDraft::new(
            "Complaint accepted",
            format!(
                "Complaint {tracking_number} has been accepted and is being processed by an employee."
            ),
        ),
        Transition::RequestApproval => NotificationDraft::new(
            "Approval requested",
            format!("Complaint {tracking_number} is waiting for your approval."),
        ),
        Transition::Approve => {
            let mut body =
                format!("Complaint {tracking_number} has been approved by the office head.");
            if !note.is_empty() {
                body.push_str(&format!(" Note: {note}"));
            }
            NotificationDraft::new("Complaint approved", body)
        }
        Transition::ReturnForRevision => NotificationDraft::new(
            "Complaint returned",
            format!(
                "Complaint {tracking_number} was returned for revision by the office head. Note: {note}"
            ),
        ),
        Transition::Complete => NotificationDraft::new(
            "Complaint completed",
            format!("Complaint {tracking_number} has been completed. {note}"),
        ),
    }
}

/// Ledger note for a submission.
pub const SUBMITTED_EVENT_NOTE: &str = "Complaint submitted by citizen";

/// Ledger note for a transition; an actor-supplied note wins when present.
pub fn event_note(transition: Transition, note: &str) -> String {
    if !note.is_empty() {
        return note.to_string();
    }
    match transition {
        Transition::Claim => "Complaint accepted by employee",
        Transition::RequestApproval => "Approval requested by employee",
        Transition::Approve => "Approved by office head",
        Transition::ReturnForRevision => "Returned for revision by office head",
        Transition::Complete => "Completed by employee",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audiences() {
        assert_eq!(SUBMISSION_AUDIENCE, Audience::AllEmployees);
        assert_eq!(audience_for(Transition::Claim), Audience::Citizen);
        assert_eq!(audience_for(Transition::RequestApproval), Audience::AllOfficeHeads);
        assert_eq!(audience_for(Transition::Approve), Audience::AssignedEmployee);
        assert_eq!(
            audience_for(Transition::ReturnForRevision),
            Audience::AssignedEmployee
        );
        assert_eq!(audience_for(Transition::Complete), Audience::Citizen);
    }

    #[test]
    fn revision_note_reaches_employee() {
        let draft =
            transition_draft(Transition::ReturnForRevision, "ADU-20260101-0001", "add photos");
        assert!(draft.body.contains("add photos"));
        assert!(draft.body.contains("ADU-20260101-0001"));
    }

    #[test]
    fn approval_note_is_optional() {
        let bare = transition_draft(Transition::Approve, "ADU-20260101-0001", "");
        assert!(!bare.body.contains("Note:"));
        let noted = transition_draft(Transition::Approve, "ADU-20260101-0001", "good work");
        assert!(noted.body.ends_with("Note: good work"));
    }

    #[test]
    fn event_note_falls_back_to_default() {
        assert_eq!(event_note(Transition::Claim, ""), "Complaint accepted by employee");
        assert_eq!(event_note(Transition::Complete, "fixed"), "fixed");
    }
}
