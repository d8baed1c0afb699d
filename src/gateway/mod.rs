//! Seams to the auth and document-database collaborator.
//!
//! The application only talks to these traits. [`LocalBackend`] implements
//! both in-process so the terminal client runs without a network service.

mod local;

pub use local::LocalBackend;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::task::{NewTask, Task, TaskPatch};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("The email address is badly formatted.")]
    InvalidEmail,
    #[error("Password should be at least 6 characters.")]
    WeakPassword,
    #[error("The email address is already in use.")]
    EmailInUse,
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("Auth service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Task not found: {0}")]
    NotFound(String),
    #[error("Task service unavailable: {0}")]
    Unavailable(String),
}

pub type SessionCallback = Box<dyn FnMut(Option<Session>) + Send>;
pub type TasksCallback = Box<dyn FnMut(Vec<Task>) + Send>;

/// Live registration with a collaborator. Dropping it unsubscribes.
#[must_use = "dropping a subscription cancels it"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

pub trait AuthGateway: Send + Sync {
    fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<Session, AuthError>;

    fn sign_out(&self) -> Result<(), AuthError>;

    /// Calls `callback` with the current session right away and again on
    /// every sign-in or sign-out.
    fn on_session_change(&self, callback: SessionCallback) -> Subscription;
}

pub trait TaskGateway: Send + Sync {
    /// Returns the id assigned to the new task.
    fn create(&self, task: NewTask) -> Result<String, GatewayError>;

    fn update(&self, id: &str, patch: TaskPatch) -> Result<(), GatewayError>;

    fn delete(&self, id: &str) -> Result<(), GatewayError>;

    /// Calls `callback` with the user's full task list right away and after
    /// every change to it.
    fn subscribe_by_user(&self, user_id: &str, callback: TasksCallback) -> Subscription;
}
