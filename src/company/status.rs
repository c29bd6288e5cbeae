use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde::Serialize;

use super::draft::{clone_as_draft, CompanyTree};
use super::write::check_len;
use crate::entities::{company, company_status_history, Company, CompanyStatus};
use crate::error::AppError;

/// What a status change does to the company graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    NoOp,
    InPlace(CompanyStatus),
    /// Deactivate the record and clone it into a new draft.
    RevertToDraft,
}

/// Decides the transition from `current` to `target`.
pub fn plan_transition(current: CompanyStatus, target: CompanyStatus) -> Result<Transition, AppError> {
    match current {
        CompanyStatus::Rejected | CompanyStatus::Closed | CompanyStatus::InProgress | CompanyStatus::Draft => {}
        CompanyStatus::Calculating => {
            return Err(AppError::InvalidState(format!(
                "Current company status should be rejected, closed, in_progress or draft, not {}",
                current
            )))
        }
    }

    if current == target {
        Ok(Transition::NoOp)
    } else if target == CompanyStatus::Draft {
        Ok(Transition::RevertToDraft)
    } else {
        Ok(Transition::InPlace(target))
    }
}

/// Requested change: the new status plus optional fields applied alongside it.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: CompanyStatus,
    pub comment: Option<String>,
    pub decision_threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionOutcome {
    /// The company the change was requested for.
    pub id: i32,
    pub status: CompanyStatus,
    /// New draft created by a revert, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_id: Option<i32>,
}

pub(crate) async fn record_status<C: ConnectionTrait>(
    conn: &C,
    company_id: i32,
    status: CompanyStatus,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    company_status_history::ActiveModel {
        company_id: Set(company_id),
        status: Set(status),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Applies a status change in a single transaction.
///
/// Reverting to draft leaves the original row inactive and logs `draft`
/// against the original id; the returned outcome carries the new draft's id.
#[tracing::instrument(skip(db, change), fields(target = %change.status))]
pub async fn change_status(
    db: &DatabaseConnection,
    company_id: i32,
    change: StatusChange,
    acting_user_id: i32,
) -> Result<TransitionOutcome, AppError> {
    if let Some(comment) = change.comment.as_deref() {
        check_len("comment", comment, 500)?;
    }
    if let Some(threshold) = change.decision_threshold {
        if !threshold.is_finite() {
            return Err(AppError::Validation("decision_threshold must be a number".to_string()));
        }
    }

    let txn = db.begin().await?;

    let original = Company::find_by_id(company_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;

    // Dropping txn on error rolls back, so a rejected transition leaves nothing behind
    let plan = plan_transition(original.status, change.status)?;
    let now = Utc::now();

    let mut active: company::ActiveModel = original.clone().into();
    let mut touched = false;
    if let Some(comment) = change.comment {
        active.comment = Set(Some(comment));
        touched = true;
    }
    if let Some(threshold) = change.decision_threshold {
        active.decision_threshold = Set(Some(threshold));
        touched = true;
    }

    let outcome = match plan {
        Transition::NoOp => {
            if touched {
                active.updated_at = Set(now);
                active.update(&txn).await?;
            }
            TransitionOutcome { id: original.id, status: original.status, draft_id: None }
        }
        Transition::InPlace(status) => {
            active.status = Set(status);
            active.updated_at = Set(now);
            active.update(&txn).await?;
            record_status(&txn, original.id, status, now).await?;
            TransitionOutcome { id: original.id, status, draft_id: None }
        }
        Transition::RevertToDraft => {
            active.is_active = Set(false);
            active.updated_at = Set(now);
            let deactivated = active.update(&txn).await?;

            let tree = CompanyTree::load(&txn, deactivated).await?;
            let draft = clone_as_draft(&txn, &tree, acting_user_id, now).await?;
            record_status(&txn, original.id, CompanyStatus::Draft, now).await?;
            TransitionOutcome { id: original.id, status: CompanyStatus::Draft, draft_id: Some(draft.id) }
        }
    };

    txn.commit().await?;
    tracing::info!(company_id = outcome.id, draft_id = ?outcome.draft_id, "Company status is now {}", outcome.status);
    Ok(outcome)
}
