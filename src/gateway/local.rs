use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    AuthError, AuthGateway, GatewayError, Session, SessionCallback, Subscription, TaskGateway,
    TasksCallback,
};
use crate::{
    error::Result,
    task::{NewTask, Task, TaskPatch},
};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    id: String,
    email: String,
    display_name: String,
    salt: String,
    password_digest: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Documents {
    #[serde(default)]
    users: Vec<UserRecord>,
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    session: Option<Session>,
}

impl Documents {
    fn tasks_of(&self, user_id: &str) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|task| task.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect();
        tasks.sort_by_key(|task| task.created_at);
        tasks
    }
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    sessions: BTreeMap<u64, SessionCallback>,
    tasks: BTreeMap<u64, (String, TasksCallback)>,
}

impl Listeners {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// In-process auth and task collaborator.
///
/// Listener callbacks run on the mutating thread after the document lock is
/// released; they must not drop their own [`Subscription`] from inside the
/// callback.
pub struct LocalBackend {
    documents: Mutex<Documents>,
    listeners: Arc<Mutex<Listeners>>,
    snapshot: Option<PathBuf>,
}

impl LocalBackend {
    pub fn in_memory() -> Self {
        Self {
            documents: Mutex::new(Documents::default()),
            listeners: Arc::new(Mutex::new(Listeners::default())),
            snapshot: None,
        }
    }

    /// Backend whose documents are loaded from and written back to `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let documents = if path.exists() {
            let data = fs::read_to_string(&path)?;
            if data.trim().is_empty() {
                Documents::default()
            } else {
                serde_json::from_str(&data)?
            }
        } else {
            Documents::default()
        };
        info!(
            path = %path.display(),
            users = documents.users.len(),
            tasks = documents.tasks.len(),
            "backend opened"
        );
        Ok(Self {
            documents: Mutex::new(documents),
            listeners: Arc::new(Mutex::new(Listeners::default())),
            snapshot: Some(path),
        })
    }

    pub fn current_session(&self) -> Option<Session> {
        lock(&self.documents).session.clone()
    }

    fn persist(&self, documents: &Documents) {
        let Some(path) = &self.snapshot else {
            return;
        };
        if let Err(err) = write_snapshot(path, documents) {
            warn!(path = %path.display(), error = %err, "failed to write backend snapshot");
        }
    }

    // Listener locks are always taken before the document lock, and the
    // payload is read while the listener lock is held, so deliveries reach
    // each listener in mutation order.

    fn notify_session(&self) {
        let mut listeners = lock(&self.listeners);
        let session = self.current_session();
        for callback in listeners.sessions.values_mut() {
            callback(session.clone());
        }
    }

    fn notify_tasks(&self, user_id: &str) {
        let mut listeners = lock(&self.listeners);
        let tasks = lock(&self.documents).tasks_of(user_id);
        for (owner, callback) in listeners.tasks.values_mut() {
            if owner == user_id {
                callback(tasks.clone());
            }
        }
    }

    fn start_session(&self, documents: &mut Documents, user: &UserRecord) -> Session {
        let session = Session {
            user_id: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
        };
        documents.session = Some(session.clone());
        self.persist(documents);
        session
    }
}

fn write_snapshot(path: &Path, documents: &Documents) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, serde_json::to_string_pretty(documents)?)?;
    fs::rename(&staging, path)?;
    Ok(())
}

impl AuthGateway for LocalBackend {
    fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim().to_lowercase();
        let session = {
            let mut documents = lock(&self.documents);
            let user = documents
                .users
                .iter()
                .find(|user| user.email == email)
                .filter(|user| digest(&user.salt, password) == user.password_digest)
                .cloned()
                .ok_or(AuthError::InvalidCredentials)?;
            self.start_session(&mut documents, &user)
        };
        info!(user_id = %session.user_id, "signed in");
        self.notify_session();
        Ok(session)
    }

    fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<Session, AuthError> {
        let email = email.trim().to_lowercase();
        if !valid_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let session = {
            let mut documents = lock(&self.documents);
            if documents.users.iter().any(|user| user.email == email) {
                return Err(AuthError::EmailInUse);
            }
            let name = name.trim();
            let display_name = if name.is_empty() {
                email.split('@').next().unwrap_or_default().to_string()
            } else {
                name.to_string()
            };
            let salt = Uuid::new_v4().simple().to_string();
            let user = UserRecord {
                id: Uuid::new_v4().to_string(),
                password_digest: digest(&salt, password),
                salt,
                email,
                display_name,
            };
            documents.users.push(user.clone());
            self.start_session(&mut documents, &user)
        };
        info!(user_id = %session.user_id, "registered");
        self.notify_session();
        Ok(session)
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        let previous = {
            let mut documents = lock(&self.documents);
            let previous = documents.session.take();
            self.persist(&documents);
            previous
        };
        if let Some(session) = previous {
            info!(user_id = %session.user_id, "signed out");
        }
        self.notify_session();
        Ok(())
    }

    fn on_session_change(&self, mut callback: SessionCallback) -> Subscription {
        let id = {
            let mut listeners = lock(&self.listeners);
            callback(self.current_session());
            let id = listeners.next_id();
            listeners.sessions.insert(id, callback);
            id
        };
        let listeners = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                lock(&listeners).sessions.remove(&id);
            }
        })
    }
}

impl TaskGateway for LocalBackend {
    fn create(&self, task: NewTask) -> Result<String, GatewayError> {
        let record = Task {
            id: Uuid::new_v4().to_string(),
            user_id: Some(task.user_id.clone()),
            title: task.title,
            description: task.description,
            status: task.status,
            created_at: Some(Utc::now()),
        };
        let id = record.id.clone();
        {
            let mut documents = lock(&self.documents);
            documents.tasks.push(record);
            self.persist(&documents);
        }
        debug!(task_id = %id, user_id = %task.user_id, "task created");
        self.notify_tasks(&task.user_id);
        Ok(id)
    }

    fn update(&self, id: &str, patch: TaskPatch) -> Result<(), GatewayError> {
        let owner = {
            let mut documents = lock(&self.documents);
            let task = documents
                .tasks
                .iter_mut()
                .find(|task| task.id == id)
                .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;
            if patch.is_empty() {
                return Ok(());
            }
            patch.apply(task);
            let owner = task.user_id.clone();
            self.persist(&documents);
            owner
        };
        debug!(task_id = id, ?patch, "task updated");
        if let Some(owner) = owner {
            self.notify_tasks(&owner);
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), GatewayError> {
        let owner = {
            let mut documents = lock(&self.documents);
            let index = documents
                .tasks
                .iter()
                .position(|task| task.id == id)
                .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;
            let removed = documents.tasks.remove(index);
            self.persist(&documents);
            removed.user_id
        };
        debug!(task_id = id, "task deleted");
        if let Some(owner) = owner {
            self.notify_tasks(&owner);
        }
        Ok(())
    }

    fn subscribe_by_user(&self, user_id: &str, mut callback: TasksCallback) -> Subscription {
        let id = {
            let mut listeners = lock(&self.listeners);
            let current = lock(&self.documents).tasks_of(user_id);
            callback(current);
            let id = listeners.next_id();
            listeners.tasks.insert(id, (user_id.to_string(), callback));
            id
        };
        let listeners = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                lock(&listeners).tasks.remove(&id);
            }
        })
    }
}
