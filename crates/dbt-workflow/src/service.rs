use chrono::Utc;
use dbt_types::api::StudentTicketView;
use dbt_types::{BankDetails, Role, Ticket, TicketAction, TicketHistoryEntry, TicketStatus};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::machine::{InvalidTransition, available_actions, next_status};
use crate::store::{StoreError, TicketChange, TicketStore};
use crate::validate::{SubmissionForm, ValidationError, validate_submission};

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    pub display_name: String,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("{role} accounts cannot {action} this ticket")]
    Forbidden { role: Role, action: TicketAction },

    #[error("ticket {0} not found")]
    NotFound(Uuid),

    #[error("ticket {ticket_id} was changed by someone else (now {status}, version {version})")]
    Conflict {
        ticket_id: Uuid,
        status: TicketStatus,
        version: i64,
    },

    #[error(transparent)]
    Store(anyhow::Error),
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => WorkflowError::NotFound(id),
            StoreError::Conflict {
                ticket_id,
                actual_status,
                actual_version,
            } => WorkflowError::Conflict {
                ticket_id,
                status: actual_status,
                version: actual_version,
            },
            StoreError::Backend(e) => WorkflowError::Store(e),
        }
    }
}

/// Drives tickets through the transition table against a store.
pub struct TicketWorkflow<'a, S: TicketStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TicketStore + ?Sized> TicketWorkflow<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Student submits (or re-submits after reapplying) their bank details.
    pub fn submit(&self, actor: &Actor, form: &SubmissionForm) -> Result<Ticket, WorkflowError> {
        ensure_role(actor, TicketAction::Submit)?;
        // Validation never touches the store.
        let bank = validate_submission(form)?;
        let description = form.description.trim().to_string();

        let ticket = match self.store.ticket_for_requester(actor.id)? {
            None => {
                let status = next_status(TicketStatus::NotSubmitted, TicketAction::Submit)?;
                let now = Utc::now();
                let ticket = Ticket {
                    id: Uuid::new_v4(),
                    requester_id: actor.id,
                    display_name: actor.display_name.clone(),
                    bank,
                    description,
                    status,
                    version: 1,
                    created_at: now,
                    updated_at: now,
                };
                self.store.insert_ticket(&ticket)?;
                ticket
            }
            Some(existing) => {
                let status = next_status(existing.status, TicketAction::Submit)?;
                self.store.apply_change(&TicketChange {
                    ticket_id: existing.id,
                    action: TicketAction::Submit,
                    actor_id: actor.id,
                    expected_status: existing.status,
                    expected_version: existing.version,
                    next_status: status,
                    bank: Some(bank),
                    description: Some(description),
                    at: Utc::now(),
                })?
            }
        };

        info!("Ticket {} submitted by {}", ticket.id, actor.id);
        Ok(ticket)
    }

    pub fn institute_verify(
        &self,
        actor: &Actor,
        ticket_id: Uuid,
        expected_version: Option<i64>,
    ) -> Result<Ticket, WorkflowError> {
        self.transition(actor, ticket_id, TicketAction::InstituteVerify, expected_version)
    }

    pub fn institute_reject(
        &self,
        actor: &Actor,
        ticket_id: Uuid,
        expected_version: Option<i64>,
    ) -> Result<Ticket, WorkflowError> {
        self.transition(actor, ticket_id, TicketAction::InstituteReject, expected_version)
    }

    pub fn admin_finalize(
        &self,
        actor: &Actor,
        ticket_id: Uuid,
        expected_version: Option<i64>,
    ) -> Result<Ticket, WorkflowError> {
        self.transition(actor, ticket_id, TicketAction::AdminFinalize, expected_version)
    }

    pub fn admin_reject(
        &self,
        actor: &Actor,
        ticket_id: Uuid,
        expected_version: Option<i64>,
    ) -> Result<Ticket, WorkflowError> {
        self.transition(actor, ticket_id, TicketAction::AdminReject, expected_version)
    }

    /// Reset the student's own ticket to `not_submitted` with a blank form.
    /// The row is kept; the history keeps what it was before.
    pub fn reapply(
        &self,
        actor: &Actor,
        ticket_id: Uuid,
        expected_version: Option<i64>,
    ) -> Result<Ticket, WorkflowError> {
        self.transition(actor, ticket_id, TicketAction::Reapply, expected_version)
    }

    /// The student's verification tab.
    pub fn current(&self, actor: &Actor) -> Result<StudentTicketView, WorkflowError> {
        let mut view = match self.store.ticket_for_requester(actor.id)? {
            Some(ticket) => StudentTicketView::from_ticket(&ticket),
            None => StudentTicketView::empty(),
        };
        view.actions = available_actions(view.status)
            .into_iter()
            .filter(|action| action.role() == Role::Student)
            .collect();
        Ok(view)
    }

    /// Review queue for institutes and admins. Bank details come back masked.
    pub fn queue(
        &self,
        actor: &Actor,
        status: Option<TicketStatus>,
    ) -> Result<Vec<Ticket>, WorkflowError> {
        let status = match (actor.role, status) {
            (Role::Institute | Role::Admin, Some(status)) => Some(status),
            (Role::Institute, None) => Some(TicketStatus::PendingInstitute),
            (Role::Admin, None) => None,
            (role, _) => {
                return Err(WorkflowError::Forbidden {
                    role,
                    action: TicketAction::InstituteVerify,
                });
            }
        };
        let tickets = self.store.tickets_with_status(status)?;
        Ok(tickets.into_iter().map(Ticket::masked).collect())
    }

    /// Transition log of a ticket. Students only see their own.
    pub fn history(
        &self,
        actor: &Actor,
        ticket_id: Uuid,
    ) -> Result<Vec<TicketHistoryEntry>, WorkflowError> {
        let ticket = self
            .store
            .ticket(ticket_id)?
            .ok_or(WorkflowError::NotFound(ticket_id))?;
        match actor.role {
            Role::Institute | Role::Admin => {}
            _ if ticket.requester_id == actor.id => {}
            _ => return Err(WorkflowError::NotFound(ticket_id)),
        }
        Ok(self.store.history(ticket_id)?)
    }

    fn transition(
        &self,
        actor: &Actor,
        ticket_id: Uuid,
        action: TicketAction,
        expected_version: Option<i64>,
    ) -> Result<Ticket, WorkflowError> {
        ensure_role(actor, action)?;

        let ticket = self
            .store
            .ticket(ticket_id)?
            .ok_or(WorkflowError::NotFound(ticket_id))?;

        if action == TicketAction::Reapply && ticket.requester_id != actor.id {
            return Err(WorkflowError::Forbidden {
                role: actor.role,
                action,
            });
        }

        if let Some(expected) = expected_version {
            if expected != ticket.version {
                warn!(
                    "Stale {} on ticket {}: expected version {}, found {}",
                    action, ticket_id, expected, ticket.version
                );
                return Err(WorkflowError::Conflict {
                    ticket_id,
                    status: ticket.status,
                    version: ticket.version,
                });
            }
        }

        let next = next_status(ticket.status, action)?;
        let (bank, description) = if action == TicketAction::Reapply {
            (Some(BankDetails::default()), Some(String::new()))
        } else {
            (None, None)
        };

        let updated = self.store.apply_change(&TicketChange {
            ticket_id,
            action,
            actor_id: actor.id,
            expected_status: ticket.status,
            expected_version: ticket.version,
            next_status: next,
            bank,
            description,
            at: Utc::now(),
        })?;

        info!(
            "Ticket {}: {} -> {} ({} by {})",
            ticket_id, ticket.status, updated.status, action, actor.id
        );
        Ok(updated)
    }
}

fn ensure_role(actor: &Actor, action: TicketAction) -> Result<(), WorkflowError> {
    if action.role() == actor.role {
        Ok(())
    } else {
        Err(WorkflowError::Forbidden {
            role: actor.role,
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// In-memory store with the same conditional-update rules as SQLite.
    #[derive(Default)]
    struct MemoryStore {
        tickets: Mutex<HashMap<Uuid, Ticket>>,
        history: Mutex<Vec<TicketHistoryEntry>>,
        calls: AtomicUsize,
    }

    impl MemoryStore {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn touch(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl TicketStore for MemoryStore {
        fn ticket(&self, id: Uuid) -> Result<Option<Ticket>, StoreError> {
            self.touch();
            Ok(self.tickets.lock().unwrap().get(&id).cloned())
        }

        fn ticket_for_requester(&self, requester_id: Uuid) -> Result<Option<Ticket>, StoreError> {
            self.touch();
            Ok(self
                .tickets
                .lock()
                .unwrap()
                .values()
                .find(|t| t.requester_id == requester_id)
                .cloned())
        }

        fn insert_ticket(&self, ticket: &Ticket) -> Result<(), StoreError> {
            self.touch();
            let mut tickets = self.tickets.lock().unwrap();
            if let Some(existing) = tickets.values().find(|t| t.requester_id == ticket.requester_id) {
                return Err(StoreError::Conflict {
                    ticket_id: existing.id,
                    actual_status: existing.status,
                    actual_version: existing.version,
                });
            }
            tickets.insert(ticket.id, ticket.clone());
            self.history.lock().unwrap().push(TicketHistoryEntry {
                ticket_id: ticket.id,
                action: TicketAction::Submit,
                from_status: TicketStatus::NotSubmitted,
                to_status: ticket.status,
                actor_id: ticket.requester_id,
                version: ticket.version,
                at: ticket.created_at,
            });
            Ok(())
        }

        fn apply_change(&self, change: &TicketChange) -> Result<Ticket, StoreError> {
            self.touch();
            let mut tickets = self.tickets.lock().unwrap();
            let ticket = tickets
                .get_mut(&change.ticket_id)
                .ok_or(StoreError::NotFound(change.ticket_id))?;
            if ticket.status != change.expected_status || ticket.version != change.expected_version {
                return Err(StoreError::Conflict {
                    ticket_id: ticket.id,
                    actual_status: ticket.status,
                    actual_version: ticket.version,
                });
            }
            ticket.status = change.next_status;
            ticket.version += 1;
            ticket.updated_at = change.at;
            if let Some(bank) = &change.bank {
                ticket.bank = bank.clone();
            }
            if let Some(description) = &change.description {
                ticket.description = description.clone();
            }
            self.history.lock().unwrap().push(TicketHistoryEntry {
                ticket_id: ticket.id,
                action: change.action,
                from_status: change.expected_status,
                to_status: change.next_status,
                actor_id: change.actor_id,
                version: ticket.version,
                at: change.at,
            });
            Ok(ticket.clone())
        }

        fn tickets_with_status(&self, status: Option<TicketStatus>) -> Result<Vec<Ticket>, StoreError> {
            self.touch();
            Ok(self
                .tickets
                .lock()
                .unwrap()
                .values()
                .filter(|t| status.is_none_or(|s| t.status == s))
                .cloned()
                .collect())
        }

        fn history(&self, ticket_id: Uuid) -> Result<Vec<TicketHistoryEntry>, StoreError> {
            self.touch();
            Ok(self
                .history
                .lock()
                .unwrap()
                .iter()
                .filter(|h| h.ticket_id == ticket_id)
                .cloned()
                .collect())
        }
    }

    fn actor(role: Role) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
            display_name: format!("{} user", role),
        }
    }

    fn form(account: &str, confirm: &str, ifsc: &str) -> SubmissionForm {
        SubmissionForm {
            account_number: account.into(),
            confirm_account_number: confirm.into(),
            ifsc_code: ifsc.into(),
            description: "SBI, Rampur branch".into(),
        }
    }

    #[test]
    fn mismatched_accounts_never_reach_the_store() {
        let store = MemoryStore::default();
        let workflow = TicketWorkflow::new(&store);
        let student = actor(Role::Student);

        let err = workflow
            .submit(&student, &form("123456789", "987654321", "SBIN0001234"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(ValidationError::AccountMismatch)));
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn full_scenario_with_reapply() {
        let store = MemoryStore::default();
        let workflow = TicketWorkflow::new(&store);
        let student = actor(Role::Student);
        let institute = actor(Role::Institute);
        let admin = actor(Role::Admin);

        let ticket = workflow
            .submit(&student, &form("123456789", "123456789", "SBIN0001234"))
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::PendingInstitute);

        let ticket = workflow.institute_verify(&institute, ticket.id, None).unwrap();
        assert_eq!(ticket.status, TicketStatus::PendingAdmin);

        let ticket = workflow.admin_reject(&admin, ticket.id, None).unwrap();
        assert_eq!(ticket.status, TicketStatus::Rejected);

        let view = workflow.current(&student).unwrap();
        assert!(view.can_reapply);
        assert_eq!(view.actions, vec![TicketAction::Reapply]);

        let ticket = workflow.reapply(&student, ticket.id, None).unwrap();
        assert_eq!(ticket.status, TicketStatus::NotSubmitted);
        assert_eq!(ticket.bank.account_number, "");
        assert_eq!(ticket.bank.ifsc_code, "");

        let view = workflow.current(&student).unwrap();
        assert_eq!(view.status, TicketStatus::NotSubmitted);
        assert_eq!(view.bank, BankDetails::default());
        assert_eq!(view.description, "");
        assert!(!view.can_reapply);
        assert_eq!(view.actions, vec![TicketAction::Submit]);

        let history = workflow.history(&student, ticket.id).unwrap();
        let actions: Vec<_> = history.iter().map(|h| h.action).collect();
        assert_eq!(
            actions,
            vec![
                TicketAction::Submit,
                TicketAction::InstituteVerify,
                TicketAction::AdminReject,
                TicketAction::Reapply
            ]
        );
    }

    #[test]
    fn resubmission_reuses_the_ticket() {
        let store = MemoryStore::default();
        let workflow = TicketWorkflow::new(&store);
        let student = actor(Role::Student);
        let institute = actor(Role::Institute);

        let first = workflow
            .submit(&student, &form("123456789", "123456789", "SBIN0001234"))
            .unwrap();
        workflow.institute_reject(&institute, first.id, None).unwrap();
        workflow.reapply(&student, first.id, None).unwrap();

        let second = workflow
            .submit(&student, &form("5556667778", "5556667778", "HDFC0000001"))
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.status, TicketStatus::PendingInstitute);
        assert_eq!(second.bank.ifsc_code, "HDFC0000001");
        assert_eq!(second.version, 4);
    }

    #[test]
    fn second_submission_while_pending_is_rejected() {
        let store = MemoryStore::default();
        let workflow = TicketWorkflow::new(&store);
        let student = actor(Role::Student);

        workflow
            .submit(&student, &form("123456789", "123456789", "SBIN0001234"))
            .unwrap();
        let err = workflow
            .submit(&student, &form("123456789", "123456789", "SBIN0001234"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition(_)));
    }

    #[test]
    fn roles_are_enforced() {
        let store = MemoryStore::default();
        let workflow = TicketWorkflow::new(&store);
        let student = actor(Role::Student);
        let panchayat = actor(Role::Panchayat);
        let admin = actor(Role::Admin);

        let ticket = workflow
            .submit(&student, &form("123456789", "123456789", "SBIN0001234"))
            .unwrap();

        assert!(matches!(
            workflow.institute_verify(&admin, ticket.id, None),
            Err(WorkflowError::Forbidden { .. })
        ));
        assert!(matches!(
            workflow.institute_verify(&panchayat, ticket.id, None),
            Err(WorkflowError::Forbidden { .. })
        ));
        assert!(matches!(
            workflow.submit(&admin, &form("123456789", "123456789", "SBIN0001234")),
            Err(WorkflowError::Forbidden { .. })
        ));

        // Someone else's ticket cannot be reset.
        let other_student = actor(Role::Student);
        assert!(matches!(
            workflow.reapply(&other_student, ticket.id, None),
            Err(WorkflowError::Forbidden { .. })
        ));
        assert!(matches!(
            workflow.history(&other_student, ticket.id),
            Err(WorkflowError::NotFound(_))
        ));
    }

    #[test]
    fn admin_cannot_skip_the_institute() {
        let store = MemoryStore::default();
        let workflow = TicketWorkflow::new(&store);
        let student = actor(Role::Student);
        let admin = actor(Role::Admin);

        let ticket = workflow
            .submit(&student, &form("123456789", "123456789", "SBIN0001234"))
            .unwrap();
        let err = workflow.admin_finalize(&admin, ticket.id, None).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidTransition(InvalidTransition {
                from: TicketStatus::PendingInstitute,
                action: TicketAction::AdminFinalize
            })
        ));
    }

    #[test]
    fn stale_version_is_a_conflict() {
        let store = MemoryStore::default();
        let workflow = TicketWorkflow::new(&store);
        let student = actor(Role::Student);
        let institute = actor(Role::Institute);
        let other_institute = actor(Role::Institute);

        let ticket = workflow
            .submit(&student, &form("123456789", "123456789", "SBIN0001234"))
            .unwrap();
        let seen_version = ticket.version;

        workflow
            .institute_verify(&institute, ticket.id, Some(seen_version))
            .unwrap();
        let err = workflow
            .institute_reject(&other_institute, ticket.id, Some(seen_version))
            .unwrap_err();
        match err {
            WorkflowError::Conflict { status, version, .. } => {
                assert_eq!(status, TicketStatus::PendingAdmin);
                assert_eq!(version, seen_version + 1);
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn missing_ticket_is_not_found() {
        let store = MemoryStore::default();
        let workflow = TicketWorkflow::new(&store);
        let institute = actor(Role::Institute);
        assert!(matches!(
            workflow.institute_verify(&institute, Uuid::new_v4(), None),
            Err(WorkflowError::NotFound(_))
        ));
    }

    #[test]
    fn institute_queue_defaults_to_pending_and_masks_accounts() {
        let store = MemoryStore::default();
        let workflow = TicketWorkflow::new(&store);
        let institute = actor(Role::Institute);

        for _ in 0..2 {
            let student = actor(Role::Student);
            workflow
                .submit(&student, &form("123456789", "123456789", "SBIN0001234"))
                .unwrap();
        }

        let queue = workflow.queue(&institute, None).unwrap();
        assert_eq!(queue.len(), 2);
        assert!(queue.iter().all(|t| t.bank.account_number == "•••• 6789"));

        let student = actor(Role::Student);
        assert!(workflow.queue(&student, None).is_err());
    }
}
