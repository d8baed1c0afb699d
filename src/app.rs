//! Application state.
//!
//! The terminal layer never calls a gateway itself: it turns key presses
//! into [`Intent`]s and hands them to [`App::dispatch`]. Realtime callbacks
//! from the gateways go through the same door by sending `Intent`s into the
//! app's channel, drained by [`App::pump`].

use std::sync::{
    mpsc::{self, Receiver, Sender},
    Arc,
};

use tracing::{debug, info, warn};

use crate::{
    error::Result,
    gateway::{AuthGateway, Session, Subscription, TaskGateway},
    router::{Route, Router},
    storage::{KeyValueStore, USER_ID_KEY},
    task::{NewTask, Task, TaskPatch, TaskStatus},
    widgets::{Credentials, LoginForm, RegisterForm, Registration, TaskForm, TaskInput},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Navigate(String),
    Back,
    Forward,
    SignIn(Credentials),
    SignUp(Registration),
    SignOut,
    SessionChanged(Option<Session>),
    TasksChanged(Vec<Task>),
    CreateTask(TaskInput),
    ToggleStatus(String),
    SetStatus(String, TaskStatus),
    DeleteTask(String),
    Quit,
}

#[derive(Debug, Default)]
pub struct HomePage {
    /// Set once the session listener reported that nobody is signed in.
    pub show_options: bool,
    pub selected: usize,
    subscription: Option<Subscription>,
}

#[derive(Debug, Default)]
pub struct TasksPage {
    pub user_id: Option<String>,
    pub tasks: Vec<Task>,
    pub selected: usize,
    pub form: Option<TaskForm>,
    pub error: Option<String>,
    subscription: Option<Subscription>,
}

impl TasksPage {
    pub fn pending(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| !t.status.is_completed())
    }

    pub fn completed(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.status.is_completed())
    }

    /// Pending tasks first, then completed ones: the order rows are shown in.
    pub fn ordered(&self) -> Vec<&Task> {
        self.pending().chain(self.completed()).collect()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.ordered().get(self.selected).copied()
    }

    pub fn select(&mut self, direction: isize) {
        let count = self.tasks.len() as isize;
        self.selected = if count == 0 {
            0
        } else {
            (self.selected as isize + direction).clamp(0, count - 1) as usize
        };
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }
}

#[derive(Debug, Default)]
pub enum Page {
    #[default]
    Blank,
    Home(HomePage),
    Login(LoginForm),
    Register(RegisterForm),
    Tasks(TasksPage),
    NotFound(String),
}

pub struct App {
    auth: Arc<dyn AuthGateway>,
    tasks: Arc<dyn TaskGateway>,
    storage: Arc<dyn KeyValueStore>,
    router: Router,
    page: Page,
    sender: Sender<Intent>,
    inbox: Receiver<Intent>,
    running: bool,
}

impl App {
    pub fn new(
        auth: Arc<dyn AuthGateway>,
        tasks: Arc<dyn TaskGateway>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let (sender, inbox) = mpsc::channel();
        Self {
            auth,
            tasks,
            storage,
            router: Router::new(),
            page: Page::Blank,
            sender,
            inbox,
            running: true,
        }
    }

    pub fn route(&self) -> Option<&Route> {
        self.router.current()
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn user_id(&self) -> Result<Option<String>> {
        self.storage.get(USER_ID_KEY)
    }

    /// Dispatches every queued intent, including ones queued while
    /// dispatching.
    pub fn pump(&mut self) -> Result<()> {
        while let Ok(intent) = self.inbox.try_recv() {
            self.dispatch(intent)?;
        }
        Ok(())
    }

    pub fn dispatch(&mut self, intent: Intent) -> Result<()> {
        match intent {
            Intent::Navigate(path) => {
                let route = self.router.navigate(&path);
                self.mount(route)?;
            }
            Intent::Back => {
                if let Some(route) = self.router.back() {
                    self.mount(route)?;
                }
            }
            Intent::Forward => {
                if let Some(route) = self.router.forward() {
                    self.mount(route)?;
                }
            }
            Intent::SignIn(credentials) => self.sign_in(credentials)?,
            Intent::SignUp(registration) => self.sign_up(registration)?,
            Intent::SignOut => self.sign_out()?,
            Intent::SessionChanged(session) => self.session_changed(session)?,
            Intent::TasksChanged(tasks) => {
                if let Page::Tasks(page) = &mut self.page {
                    debug!(count = tasks.len(), "task feed update");
                    page.tasks = tasks;
                    page.select(0);
                }
            }
            Intent::CreateTask(input) => self.create_task(input),
            Intent::ToggleStatus(id) => {
                let next = match &self.page {
                    Page::Tasks(page) => page
                        .tasks
                        .iter()
                        .find(|t| t.id == id)
                        .map(|t| t.status.toggled()),
                    _ => None,
                };
                if let Some(next) = next {
                    self.update_status(&id, next);
                }
            }
            Intent::SetStatus(id, status) => self.update_status(&id, status),
            Intent::DeleteTask(id) => {
                if let Page::Tasks(page) = &mut self.page {
                    page.error = None;
                    if let Err(err) = self.tasks.delete(&id) {
                        warn!(task_id = %id, error = %err, "delete failed");
                        page.error = Some(format!("Could not delete task: {err}"));
                    }
                }
            }
            Intent::Quit => self.running = false,
        }
        Ok(())
    }

    /// Replaces the current page. The old page is dropped first, which
    /// cancels whatever it was subscribed to.
    fn mount(&mut self, route: Route) -> Result<()> {
        self.page = Page::Blank;
        self.page = match route {
            Route::Home => {
                let sender = self.sender.clone();
                let subscription = self.auth.on_session_change(Box::new(move |session| {
                    let _ = sender.send(Intent::SessionChanged(session));
                }));
                Page::Home(HomePage {
                    subscription: Some(subscription),
                    ..HomePage::default()
                })
            }
            Route::Login => Page::Login(LoginForm::new()),
            Route::Register => Page::Register(RegisterForm::new()),
            Route::Tasks => {
                let user_id = self.user_id()?;
                let subscription = user_id.as_deref().map(|user_id| {
                    let sender = self.sender.clone();
                    self.tasks.subscribe_by_user(
                        user_id,
                        Box::new(move |tasks| {
                            let _ = sender.send(Intent::TasksChanged(tasks));
                        }),
                    )
                });
                Page::Tasks(TasksPage {
                    user_id,
                    subscription,
                    ..TasksPage::default()
                })
            }
            Route::NotFound(path) => Page::NotFound(path),
        };
        Ok(())
    }

    fn session_changed(&mut self, session: Option<Session>) -> Result<()> {
        let Page::Home(home) = &mut self.page else {
            return Ok(());
        };
        match session {
            Some(session) => {
                self.storage.set(USER_ID_KEY, &session.user_id)?;
                self.dispatch(Intent::Navigate("/tasks".to_string()))?;
            }
            None => home.show_options = true,
        }
        Ok(())
    }

    fn sign_in(&mut self, credentials: Credentials) -> Result<()> {
        let Page::Login(form) = &mut self.page else {
            return Ok(());
        };
        match self.auth.sign_in(&credentials.email, &credentials.password) {
            Ok(session) => self.signed_in(session),
            Err(err) => {
                warn!(error = %err, "sign-in failed");
                form.fail(Some(err.to_string()));
                Ok(())
            }
        }
    }

    fn sign_up(&mut self, registration: Registration) -> Result<()> {
        let Page::Register(form) = &mut self.page else {
            return Ok(());
        };
        match self.auth.sign_up(
            &registration.email,
            &registration.password,
            &registration.username,
        ) {
            Ok(session) => self.signed_in(session),
            Err(err) => {
                warn!(error = %err, "registration failed");
                form.fail(Some(err.to_string()));
                Ok(())
            }
        }
    }

    fn signed_in(&mut self, session: Session) -> Result<()> {
        info!(user_id = %session.user_id, "session started");
        self.storage.set(USER_ID_KEY, &session.user_id)?;
        self.dispatch(Intent::Navigate("/tasks".to_string()))
    }

    fn sign_out(&mut self) -> Result<()> {
        if let Err(err) = self.auth.sign_out() {
            warn!(error = %err, "sign-out failed");
            if let Page::Tasks(page) = &mut self.page {
                page.error = Some(err.to_string());
            }
            return Ok(());
        }
        if let Page::Tasks(page) = &mut self.page {
            if let Some(subscription) = page.subscription.take() {
                subscription.unsubscribe();
            }
        }
        self.storage.remove(USER_ID_KEY)?;
        self.dispatch(Intent::Navigate("/".to_string()))
    }

    fn create_task(&mut self, input: TaskInput) {
        if input.title.trim().is_empty() {
            return;
        }
        let Page::Tasks(page) = &mut self.page else {
            return;
        };
        let Some(user_id) = page.user_id.clone() else {
            page.error = Some("Sign in to add tasks.".to_string());
            return;
        };
        page.error = None;
        match self
            .tasks
            .create(NewTask::new(user_id, input.title.trim(), input.description))
        {
            Ok(id) => {
                debug!(task_id = %id, "task submitted");
                page.form = None;
            }
            Err(err) => {
                warn!(error = %err, "create failed");
                let message = format!("Could not save task: {err}");
                if let Some(form) = page.form.as_mut() {
                    form.fail(message.clone());
                }
                page.error = Some(message);
            }
        }
    }

    fn update_status(&mut self, id: &str, status: TaskStatus) {
        let Page::Tasks(page) = &mut self.page else {
            return;
        };
        page.error = None;
        if let Err(err) = self.tasks.update(id, TaskPatch::status(status)) {
            warn!(task_id = id, error = %err, "status update failed");
            page.error = Some(format!("Could not update task: {err}"));
        }
    }
}
