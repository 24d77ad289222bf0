//! Form-level state and the mutations that forms submit.

use tracing::warn;

use crate::client::TodoApi;
use crate::error::Result;
use crate::types::{Task, TaskPatch, User};

pub const ADMIN_EMAIL: &str = "admin@mail.com";

pub const ADMIN_NOT_ALLOWED: &str = "Admin account is not allowed";
pub const EMAIL_REQUIRED: &str = "Email is required";
pub const TITLE_REQUIRED: &str = "Title is required";

pub fn validate_email(email: &str) -> std::result::Result<(), &'static str> {
    if email.trim().is_empty() {
        return Err(EMAIL_REQUIRED);
    }
    if email == ADMIN_EMAIL {
        return Err(ADMIN_NOT_ALLOWED);
    }
    Ok(())
}

pub fn validate_title(title: &str) -> std::result::Result<(), &'static str> {
    if title.trim().is_empty() {
        return Err(TITLE_REQUIRED);
    }
    Ok(())
}

/// A create form: its text input, last error and number of submissions in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub input: String,
    pub error: Option<String>,
    in_flight: usize,
}

impl FormState {
    pub fn is_pending(&self) -> bool {
        self.in_flight > 0
    }

    /// Input failed validation; nothing was sent.
    pub fn reject(&mut self, input: &str, message: &str) {
        self.input = input.to_string();
        self.error = Some(message.to_string());
    }

    /// Input accepted and on its way; the field clears right away.
    pub fn submit(&mut self) {
        self.input.clear();
        self.error = None;
        self.in_flight += 1;
    }

    pub fn succeed(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Put the submitted text back so the user can retry.
    pub fn fail(&mut self, prior_input: String, message: &str) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.input = prior_input;
        self.error = Some(message.to_string());
    }
}

/// Per-row action state (delete buttons, done toggles).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowState {
    pub pending: bool,
    pub error: Option<String>,
}

/// One network mutation a form can submit.
#[derive(Debug, Clone)]
pub enum Mutation {
    CreateUser(User),
    DeleteUser(String),
    CreateTask(Task),
    DeleteTask(String),
    SetTaskDone { id: String, done: bool },
}

impl Mutation {
    /// Text shown on the submitting form when the call fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Mutation::CreateUser(_) => "Error while creating user",
            Mutation::DeleteUser(_) => "Error while deleting user",
            Mutation::CreateTask(_) => "Error while creating task",
            Mutation::DeleteTask(_) => "Error while deleting task",
            Mutation::SetTaskDone { .. } => "Error while updating task",
        }
    }

    pub async fn run(&self, api: &dyn TodoApi) -> Result<()> {
        let outcome = match self {
            Mutation::CreateUser(user) => api.create_user(user).await.map(|_| ()),
            Mutation::DeleteUser(id) => api.delete_user(id).await,
            Mutation::CreateTask(task) => api.create_task(task).await.map(|_| ()),
            Mutation::DeleteTask(id) => api.delete_task(id).await,
            Mutation::SetTaskDone { id, done } => {
                let patch = TaskPatch {
                    done: Some(*done),
                    ..Default::default()
                };
                api.update_task(id, &patch).await.map(|_| ())
            }
        };

        if let Err(e) = &outcome {
            warn!(mutation = ?self, error = %e, "mutation failed");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_email_rejected() {
        assert_eq!(validate_email("admin@mail.com"), Err(ADMIN_NOT_ALLOWED));
        assert_eq!(validate_email("  "), Err(EMAIL_REQUIRED));
        assert_eq!(validate_email("someone@mail.com"), Ok(()));
    }

    #[test]
    fn test_title_required() {
        assert_eq!(validate_title(""), Err(TITLE_REQUIRED));
        assert_eq!(validate_title("Buy milk"), Ok(()));
    }

    #[test]
    fn test_form_lifecycle() {
        let mut form = FormState {
            input: "Buy milk".into(),
            ..Default::default()
        };

        form.submit();
        assert!(form.input.is_empty());
        assert!(form.is_pending());

        form.fail("Buy milk".into(), "Error while creating task");
        assert!(!form.is_pending());
        assert_eq!(form.input, "Buy milk");
        assert_eq!(form.error.as_deref(), Some("Error while creating task"));

        form.submit();
        assert_eq!(form.error, None);
        form.succeed();
        assert!(!form.is_pending());
        assert!(form.input.is_empty());
    }

    #[test]
    fn test_reject_keeps_input() {
        let mut form = FormState::default();
        form.reject("admin@mail.com", ADMIN_NOT_ALLOWED);
        assert_eq!(form.input, "admin@mail.com");
        assert!(!form.is_pending());
    }
}
