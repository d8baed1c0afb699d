//! Input-capturing widgets. Each one owns its state, draws itself and turns
//! key presses into events for the page that hosts it.

mod input;
mod login_form;
mod register_form;
mod task_card;
mod task_form;

pub use input::TextField;
pub use login_form::{Credentials, LoginForm};
pub use register_form::{Registration, RegisterForm};
pub use task_card::{CardAction, TaskCard};
pub use task_form::{TaskForm, TaskFormEvent, TaskInput};

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// What a form asks its page to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent<T> {
    Submit(T),
    Navigate(&'static str),
}

pub const ACCENT: Color = Color::Cyan;
pub const DANGER: Color = Color::LightRed;

pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub fn button(label: &str, focused: bool, disabled: bool) -> Line<'static> {
    let mut style = Style::default().fg(ACCENT);
    if focused {
        style = style.fg(Color::Black).bg(ACCENT).add_modifier(Modifier::BOLD);
    }
    if disabled {
        style = style.add_modifier(Modifier::DIM);
    }
    Line::from(Span::styled(format!("[ {label} ]"), style))
}

pub fn error_line(error: Option<&str>) -> Line<'static> {
    match error {
        Some(message) => Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(DANGER),
        )),
        None => Line::default(),
    }
}

/// Cycles `focus` through `slots` positions.
pub(crate) fn cycle(focus: usize, slots: usize, forward: bool) -> usize {
    if forward {
        (focus + 1) % slots
    } else {
        (focus + slots - 1) % slots
    }
}
