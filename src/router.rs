use std::fmt;

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Tasks,
    NotFound(String),
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        match path {
            "/" => Route::Home,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/tasks" => Route::Tasks,
            other => Route::NotFound(other.to_string()),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Tasks => "/tasks",
            Route::NotFound(path) => path,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Path history with back/forward, the way a browser keeps it.
///
/// There is no current route until the first [`Router::navigate`].
#[derive(Debug, Default)]
pub struct Router {
    history: Vec<Route>,
    cursor: usize,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Route> {
        self.history.get(self.cursor)
    }

    /// Pushes `path`, discarding any forward entries.
    pub fn navigate(&mut self, path: &str) -> Route {
        let route = Route::from_path(path);
        if !self.history.is_empty() {
            self.history.truncate(self.cursor + 1);
        }
        self.history.push(route.clone());
        self.cursor = self.history.len() - 1;
        debug!(path, "navigate");
        route
    }

    pub fn back(&mut self) -> Option<Route> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.current().cloned()
    }

    pub fn forward(&mut self) -> Option<Route> {
        if self.cursor + 1 >= self.history.len() {
            return None;
        }
        self.cursor += 1;
        self.current().cloned()
    }
}
