use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::{button, centered, cycle, error_line, FormEvent, TextField, ACCENT};

const EMAIL: usize = 0;
const PASSWORD: usize = 1;
const SUBMIT: usize = 2;
const LINK: usize = 3;
const SLOTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    email: TextField,
    password: TextField,
    focus: usize,
    error: Option<String>,
    submitting: bool,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            email: TextField::new("Email"),
            password: TextField::masked("Password"),
            focus: EMAIL,
            error: None,
            submitting: false,
        }
    }
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn fill(&mut self, email: &str, password: &str) {
        self.email.set(email);
        self.password.set(password);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<FormEvent<Credentials>> {
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focus = cycle(self.focus, SLOTS, true),
            KeyCode::BackTab | KeyCode::Up => self.focus = cycle(self.focus, SLOTS, false),
            KeyCode::Enter => match self.focus {
                SUBMIT => return self.submit().map(FormEvent::Submit),
                LINK => return Some(FormEvent::Navigate("/register")),
                _ => self.focus += 1,
            },
            code => match self.focus {
                EMAIL => {
                    self.email.input(code);
                }
                PASSWORD => {
                    self.password.input(code);
                }
                _ => {}
            },
        }
        None
    }

    /// Validates the fields and disarms the submit control. Returns `None`
    /// when a submission is already running or a field is empty.
    pub fn submit(&mut self) -> Option<Credentials> {
        if self.submitting {
            return None;
        }
        self.error = None;
        let email = self.email.value().trim().to_string();
        let password = self.password.value().trim().to_string();
        if email.is_empty() || password.is_empty() {
            self.error = Some("Please fill in all fields.".to_string());
            return None;
        }
        self.submitting = true;
        Some(Credentials { email, password })
    }

    /// Shows why sign-in failed and re-arms the submit control.
    pub fn fail(&mut self, message: Option<String>) {
        self.error = Some(
            message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Invalid credentials or connection error.".to_string()),
        );
        self.submitting = false;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let area = centered(area, 48, 13);
        let label = if self.submitting { "Signing in..." } else { "Sign in" };
        let lines = vec![
            self.email.line(self.focus == EMAIL),
            Line::default(),
            self.password.line(self.focus == PASSWORD),
            Line::default(),
            button(label, self.focus == SUBMIT, self.submitting),
            Line::default(),
            error_line(self.error()),
            Line::default(),
            Line::from("No account yet?"),
            button("Register", self.focus == LINK, false),
        ];
        let block = Block::default()
            .title("Login")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ACCENT));
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }
}
