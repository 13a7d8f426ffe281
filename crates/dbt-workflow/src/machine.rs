use dbt_types::{TicketAction, TicketStatus};
use thiserror::Error;

/// An action that the transition table does not define for the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {action} a ticket that is {from}")]
pub struct InvalidTransition {
    pub from: TicketStatus,
    pub action: TicketAction,
}

/// The transition table: `(current status, action) -> next status`.
///
/// Anything not listed here is rejected.
pub fn next_status(
    from: TicketStatus,
    action: TicketAction,
) -> Result<TicketStatus, InvalidTransition> {
    use TicketAction as A;
    use TicketStatus as S;

    let next = match (from, action) {
        (S::NotSubmitted, A::Submit) => S::PendingInstitute,
        (S::PendingInstitute, A::InstituteVerify) => S::PendingAdmin,
        (S::PendingInstitute, A::InstituteReject) => S::Rejected,
        (S::PendingAdmin, A::AdminFinalize) => S::Verified,
        (S::PendingAdmin, A::AdminReject) => S::Rejected,
        (
            S::PendingInstitute | S::PendingAdmin | S::Verified | S::Rejected,
            A::Reapply,
        ) => S::NotSubmitted,
        _ => return Err(InvalidTransition { from, action }),
    };
    Ok(next)
}

/// Actions the table allows from `from`, in declaration order.
pub fn available_actions(from: TicketStatus) -> Vec<TicketAction> {
    TicketAction::ALL
        .into_iter()
        .filter(|action| next_status(from, *action).is_ok())
        .collect()
}
