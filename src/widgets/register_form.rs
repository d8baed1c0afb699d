use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::{button, centered, cycle, error_line, FormEvent, TextField, ACCENT};

const MIN_PASSWORD_LEN: usize = 6;

const USERNAME: usize = 0;
const EMAIL: usize = 1;
const PASSWORD: usize = 2;
const CONFIRM: usize = 3;
const SUBMIT: usize = 4;
const LINK: usize = 5;
const SLOTS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct RegisterForm {
    fields: [TextField; 4],
    focus: usize,
    error: Option<String>,
    submitting: bool,
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self {
            fields: [
                TextField::new("Username"),
                TextField::new("Email"),
                TextField::masked("Password"),
                TextField::masked("Confirm password"),
            ],
            focus: USERNAME,
            error: None,
            submitting: false,
        }
    }
}

impl RegisterForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn fill(&mut self, username: &str, email: &str, password: &str, confirm: &str) {
        for (field, value) in self.fields.iter_mut().zip([username, email, password, confirm]) {
            field.set(value);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<FormEvent<Registration>> {
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focus = cycle(self.focus, SLOTS, true),
            KeyCode::BackTab | KeyCode::Up => self.focus = cycle(self.focus, SLOTS, false),
            KeyCode::Enter => match self.focus {
                SUBMIT => return self.submit().map(FormEvent::Submit),
                LINK => return Some(FormEvent::Navigate("/login")),
                _ => self.focus += 1,
            },
            code => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    field.input(code);
                }
            }
        }
        None
    }

    /// Checks, in order: every field present, passwords equal, password
    /// long enough. The first failure becomes the inline error.
    pub fn submit(&mut self) -> Option<Registration> {
        if self.submitting {
            return None;
        }
        self.error = None;
        let username = self.fields[USERNAME].value().trim().to_string();
        let email = self.fields[EMAIL].value().trim().to_string();
        let password = self.fields[PASSWORD].value().to_string();
        let confirm = self.fields[CONFIRM].value();

        let problem = if username.is_empty() || email.is_empty() || password.is_empty() || confirm.is_empty() {
            Some("All fields are required.")
        } else if password != confirm {
            Some("Passwords do not match.")
        } else if password.chars().count() < MIN_PASSWORD_LEN {
            Some("Password must be at least 6 characters.")
        } else {
            None
        };
        if let Some(problem) = problem {
            self.error = Some(problem.to_string());
            return None;
        }

        self.submitting = true;
        Some(Registration {
            username,
            email,
            password,
        })
    }

    pub fn fail(&mut self, message: Option<String>) {
        self.error = Some(
            message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Registration failed.".to_string()),
        );
        self.submitting = false;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let area = centered(area, 52, 17);
        let label = if self.submitting { "Registering..." } else { "Create account" };
        let mut lines = Vec::new();
        for (index, field) in self.fields.iter().enumerate() {
            lines.push(field.line(self.focus == index));
            lines.push(Line::default());
        }
        lines.push(button(label, self.focus == SUBMIT, self.submitting));
        lines.push(Line::default());
        lines.push(error_line(self.error()));
        lines.push(Line::default());
        lines.push(Line::from("Already have an account?"));
        lines.push(button("Sign in", self.focus == LINK, false));

        let block = Block::default()
            .title("Register")
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

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "a@b.c", "secret1", "secret1", "All fields are required.")]
    #[case("ana", "a@b.c", "secret1", "", "All fields are required.")]
    #[case("ana", "a@b.c", "secret1", "secret2", "Passwords do not match.")]
    #[case("ana", "a@b.c", "abc", "abc", "Password must be at least 6 characters.")]
    #[case("ana", "a@b.c", "abc", "abd", "Passwords do not match.")]
    fn reports_first_validation_failure(
        #[case] username: &str,
        #[case] email: &str,
        #[case] password: &str,
        #[case] confirm: &str,
        #[case] expected: &str,
    ) {
        let mut form = RegisterForm::new();
        form.fill(username, email, password, confirm);
        assert_eq!(form.submit(), None);
        assert_eq!(form.error(), Some(expected));
        assert!(!form.is_submitting());
    }

    #[test]
    fn valid_form_submits_once() {
        let mut form = RegisterForm::new();
        form.fill(" ana ", "ana@example.com", "secret1", "secret1");
        assert_eq!(
            form.submit(),
            Some(Registration {
                username: "ana".to_string(),
                email: "ana@example.com".to_string(),
                password: "secret1".to_string(),
            })
        );
        assert!(form.is_submitting());
        assert_eq!(form.submit(), None);

        form.fail(Some("The email address is already in use.".to_string()));
        assert!(!form.is_submitting());
        assert_eq!(form.error(), Some("The email address is already in use."));
    }
}
