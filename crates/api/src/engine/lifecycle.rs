//! Complaint submission and status transitions.
//!
//! Every operation follows the same shape: policy check, input validation,
//! guard check on a pre-read snapshot, then one transaction holding the
//! conditional write, the ledger entry and the notification fan-out. The
//! conditional write repeats the guard, so a transition that lost a race
//! after the pre-read fails as `InvalidTransition` with nothing written.

use std::sync::Arc;

use aduan_core::access::{self, Action};
use aduan_core::clock::Clock;
use aduan_core::error::CoreError;
use aduan_core::lifecycle::{self, ComplaintStatus, SubmitComplaint, Transition};
use aduan_core::notification::{self, Audience};
use aduan_core::roles::Role;
use aduan_core::tracking::{self, MAX_ALLOCATION_ATTEMPTS};
use aduan_core::types::{DbId, Timestamp};
use aduan_db::models::complaint::{Complaint, NewComplaint, TransitionWrite};
use aduan_db::repositories::{
    CategoryRepo, ComplaintRepo, NotificationRepo, StatusEventRepo, TrackingSequenceRepo,
    UserRepo,
};
use aduan_db::DbPool;
use chrono::NaiveDate;
use sqlx::{Connection, PgConnection};

use super::{store_error, Actor};

const TRACKING_NUMBER_CONSTRAINT: &str = "uq_complaints_tracking_number";

#[derive(Debug, Clone)]
pub struct LifecycleEngine {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl LifecycleEngine {
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// File a new complaint in `Waiting` and tell every active employee.
    ///
    /// `photo_ref` must already be stored; the caller removes it if this
    /// returns an error.
    pub async fn submit(
        &self,
        actor: Actor,
        input: SubmitComplaint,
        photo_ref: Option<String>,
    ) -> Result<Complaint, CoreError> {
        access::authorize(actor.role, Action::Submit)?;
        let input = input.validated()?;

        let category_exists = CategoryRepo::exists(&self.pool, input.category_id)
            .await
            .map_err(store_error)?;
        if !category_exists {
            return Err(CoreError::field("category_id", "Category does not exist"));
        }

        let now = self.clock.now();
        let new = NewComplaint {
            citizen_id: actor.id,
            category_id: input.category_id,
            title: input.title,
            description: input.description,
            location: input.location,
            photo_ref,
        };

        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let complaint =
            insert_with_tracking_number(&mut tx, &new, tracking::tracking_day(now), now).await?;

        StatusEventRepo::append(
            &mut tx,
            complaint.id,
            ComplaintStatus::Waiting,
            notification::SUBMITTED_EVENT_NOTE,
            actor.id,
            now,
        )
        .await
        .map_err(store_error)?;

        let recipients = recipients(&mut tx, notification::SUBMISSION_AUDIENCE, &complaint)
            .await
            .map_err(store_error)?;
        let draft = notification::submitted_draft(&complaint.tracking_number);
        NotificationRepo::notify_many(
            &mut tx,
            &recipients,
            Some(complaint.id),
            &draft.title,
            &draft.body,
            now,
        )
        .await
        .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;

        tracing::info!(
            complaint_id = complaint.id,
            tracking_number = %complaint.tracking_number,
            citizen_id = actor.id,
            notified = recipients.len(),
            "Complaint submitted",
        );
        Ok(complaint)
    }

    /// Take an unclaimed complaint. Exactly one of several concurrent
    /// claimers succeeds.
    pub async fn claim(
        &self,
        actor: Actor,
        id: DbId,
        note: Option<&str>,
    ) -> Result<Complaint, CoreError> {
        self.transition(actor, id, Transition::Claim, note).await
    }

    /// Hand the complaint to the office heads, with an optional
    /// recommendation.
    pub async fn request_approval(
        &self,
        actor: Actor,
        id: DbId,
        recommendation: Option<&str>,
    ) -> Result<Complaint, CoreError> {
        self.transition(actor, id, Transition::RequestApproval, recommendation)
            .await
    }

    pub async fn approve(
        &self,
        actor: Actor,
        id: DbId,
        note: Option<&str>,
    ) -> Result<Complaint, CoreError> {
        self.transition(actor, id, Transition::Approve, note).await
    }

    /// Send the complaint back to its employee. The note is required.
    pub async fn return_for_revision(
        &self,
        actor: Actor,
        id: DbId,
        note: Option<&str>,
    ) -> Result<Complaint, CoreError> {
        self.transition(actor, id, Transition::ReturnForRevision, note)
            .await
    }

    /// Close the complaint. The note is required.
    pub async fn complete(
        &self,
        actor: Actor,
        id: DbId,
        note: Option<&str>,
    ) -> Result<Complaint, CoreError> {
        self.transition(actor, id, Transition::Complete, note).await
    }

    async fn transition(
        &self,
        actor: Actor,
        id: DbId,
        transition: Transition,
        note: Option<&str>,
    ) -> Result<Complaint, CoreError> {
        access::authorize(actor.role, transition.action())?;

        let note = match transition {
            Transition::ReturnForRevision | Transition::Complete => {
                lifecycle::validate_required_note("note", note)?
            }
            _ => lifecycle::validate_optional_note("note", note)?,
        };

        let current = ComplaintRepo::find_by_id(&self.pool, id)
            .await
            .map_err(store_error)?
            .ok_or(CoreError::NotFound {
                entity: "Complaint",
                id,
            })?;
        let from = current.status()?;
        let target = lifecycle::check_transition(current.guard_snapshot()?, transition, actor.id)?;

        let now = self.clock.now();
        let write = transition_write(transition, target, actor.id, &note, now);

        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let updated = ComplaintRepo::apply_transition(&mut tx, id, &write)
            .await
            .map_err(store_error)?
            .ok_or_else(|| {
                tracing::debug!(
                    complaint_id = id,
                    transition = transition.as_str(),
                    "Conditional write matched no row",
                );
                CoreError::InvalidTransition(format!(
                    "Cannot {}: complaint was changed by another request",
                    transition.as_str().replace('_', " ")
                ))
            })?;

        StatusEventRepo::append(
            &mut tx,
            id,
            target,
            &notification::event_note(transition, &note),
            actor.id,
            now,
        )
        .await
        .map_err(store_error)?;

        let recipients = recipients(&mut tx, notification::audience_for(transition), &updated)
            .await
            .map_err(store_error)?;
        let draft = notification::transition_draft(transition, &updated.tracking_number, &note);
        NotificationRepo::notify_many(
            &mut tx,
            &recipients,
            Some(id),
            &draft.title,
            &draft.body,
            now,
        )
        .await
        .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;

        tracing::info!(
            complaint_id = id,
            tracking_number = %updated.tracking_number,
            transition = transition.as_str(),
            from = %from,
            to = %target,
            actor_id = actor.id,
            notified = recipients.len(),
            "Complaint status changed",
        );
        Ok(updated)
    }
}

/// Allocate the next tracking number for `day` and insert the complaint.
///
/// The insert runs in a savepoint so a collision with an existing number
/// (one not handed out by the counter) can be rolled back and retried
/// without aborting the outer transaction.
async fn insert_with_tracking_number(
    conn: &mut PgConnection,
    input: &NewComplaint,
    day: NaiveDate,
    now: Timestamp,
) -> Result<Complaint, CoreError> {
    for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
        let sequence = TrackingSequenceRepo::next_value(&mut *conn, day)
            .await
            .map_err(store_error)?;
        let tracking_number = tracking::format_tracking_number(day, sequence);

        let mut savepoint = conn.begin().await.map_err(store_error)?;
        match ComplaintRepo::insert(&mut savepoint, input, &tracking_number, now).await {
            Ok(complaint) => {
                savepoint.commit().await.map_err(store_error)?;
                return Ok(complaint);
            }
            Err(e) if aduan_db::is_unique_violation(&e, TRACKING_NUMBER_CONSTRAINT) => {
                savepoint.rollback().await.map_err(store_error)?;
                tracing::warn!(
                    attempt,
                    tracking_number = %tracking_number,
                    "Tracking number already taken, allocating another",
                );
            }
            Err(e) => return Err(store_error(e)),
        }
    }

    Err(CoreError::Unavailable(format!(
        "No free tracking number for {day} after {MAX_ALLOCATION_ATTEMPTS} attempts"
    )))
}

/// Resolve an audience to user ids, on the caller's transaction.
async fn recipients(
    conn: &mut PgConnection,
    audience: Audience,
    complaint: &Complaint,
) -> Result<Vec<DbId>, sqlx::Error> {
    match audience {
        Audience::AllEmployees => UserRepo::active_ids_by_role(conn, Role::Employee).await,
        Audience::AllOfficeHeads => UserRepo::active_ids_by_role(conn, Role::OfficeHead).await,
        Audience::Citizen => Ok(vec![complaint.citizen_id]),
        Audience::AssignedEmployee => Ok(complaint.employee_id.into_iter().collect()),
    }
}

/// Column changes for `transition`, guarded on its source statuses (and
/// on the assignee where only they may act).
fn transition_write(
    transition: Transition,
    target: ComplaintStatus,
    actor_id: DbId,
    note: &str,
    now: Timestamp,
) -> TransitionWrite {
    let given_note = (!note.is_empty()).then(|| note.to_string());
    let mut write = TransitionWrite {
        expected: transition.source_ids(),
        target: target.id(),
        assignee: transition.requires_assignee().then_some(actor_id),
        ..TransitionWrite::default()
    };

    match transition {
        Transition::Claim => {
            write.employee_id = Some(actor_id);
            write.processed_at = Some(now);
            write.employee_note =
                Some(given_note.unwrap_or_else(|| lifecycle::DEFAULT_ACCEPTANCE_NOTE.into()));
        }
        Transition::RequestApproval => {
            write.employee_note = given_note;
        }
        Transition::Approve | Transition::ReturnForRevision => {
            write.office_head_id = Some(actor_id);
            write.office_head_note = Some(note.to_string());
        }
        Transition::Complete => {
            write.completed_at = Some(now);
            write.employee_note = Some(note.to_string());
        }
    }
    write
}
