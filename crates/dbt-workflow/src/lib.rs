//! DBT verification workflow.
//!
//! A ticket moves through a fixed set of statuses:
//! - the student submits bank details (`not_submitted -> pending_institute`)
//! - the institute verifies or rejects (`-> pending_admin | rejected`)
//! - the admin finalizes or rejects (`-> verified | rejected`)
//! - the student may reapply from any later status (`-> not_submitted`)
//!
//! Every move goes through the transition table in [`machine`] and is
//! persisted as a conditional update through a [`TicketStore`].

pub mod machine;
pub mod service;
pub mod store;
pub mod validate;

pub use machine::{next_status, InvalidTransition};
pub use service::{Actor, TicketWorkflow, WorkflowError};
pub use store::{StoreError, TicketChange, TicketStore};
pub use validate::{SubmissionForm, ValidationError};
