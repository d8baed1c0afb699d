use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::{button, centered, cycle, error_line, TextField, ACCENT};

const TITLE: usize = 0;
const DESCRIPTION: usize = 1;
const SAVE: usize = 2;
const CANCEL: usize = 3;
const SLOTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFormEvent {
    Submit(TaskInput),
    Cancel,
}

#[derive(Debug, Clone)]
pub struct TaskForm {
    title: TextField,
    description: TextField,
    focus: usize,
    error: Option<String>,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            title: TextField::new("Title *"),
            description: TextField::new("Description (optional)"),
            focus: TITLE,
            error: None,
        }
    }
}

impl TaskForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn fill(&mut self, title: &str, description: &str) {
        self.title.set(title);
        self.description.set(description);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<TaskFormEvent> {
        match key.code {
            KeyCode::Esc => return Some(TaskFormEvent::Cancel),
            KeyCode::Tab | KeyCode::Down => self.focus = cycle(self.focus, SLOTS, true),
            KeyCode::BackTab | KeyCode::Up => self.focus = cycle(self.focus, SLOTS, false),
            KeyCode::Enter => match self.focus {
                TITLE | SAVE => return self.submit().map(TaskFormEvent::Submit),
                CANCEL => return Some(TaskFormEvent::Cancel),
                _ => self.focus = SAVE,
            },
            code => match self.focus {
                TITLE => {
                    self.title.input(code);
                }
                DESCRIPTION => {
                    self.description.input(code);
                }
                _ => {}
            },
        }
        None
    }

    /// Trimmed input, or `None` with an inline message when the title is
    /// blank. The typed values stay: the host drops the form once the save
    /// went through.
    pub fn submit(&mut self) -> Option<TaskInput> {
        let title = self.title.value().trim().to_string();
        if title.is_empty() {
            self.error = Some("Title is required.".to_string());
            return None;
        }
        self.error = None;
        let description = Some(self.description.value().trim().to_string()).filter(|d| !d.is_empty());
        Some(TaskInput { title, description })
    }

    /// Shows a save failure and leaves the typed values in place for a retry.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let area = centered(area, 64, 12);
        let mut actions = button("Save", self.focus == SAVE, false);
        actions.spans.push(Span::raw(" "));
        actions
            .spans
            .extend(button("Cancel", self.focus == CANCEL, false).spans);
        let lines = vec![
            self.title.line(self.focus == TITLE),
            Line::default(),
            self.description.line(self.focus == DESCRIPTION),
            Line::default(),
            actions,
            Line::default(),
            error_line(self.error()),
        ];
        let block = Block::default()
            .title("New task")
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
