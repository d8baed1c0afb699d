use crossterm::event::KeyCode;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use super::{ACCENT, DANGER};
use crate::task::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    SetStatus(TaskStatus),
    Delete,
}

fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Pending => Color::Cyan,
        TaskStatus::InProgress => Color::Yellow,
        TaskStatus::Review => Color::Magenta,
        TaskStatus::Completed => Color::Green,
    }
}

/// Detail view of one task with its status buttons.
pub struct TaskCard<'a> {
    task: &'a Task,
}

impl<'a> TaskCard<'a> {
    pub fn new(task: &'a Task) -> Self {
        Self { task }
    }

    /// `1`..`3` pick a status button, `d` is the delete button.
    pub fn action_for(code: KeyCode) -> Option<CardAction> {
        match code {
            KeyCode::Char('d') | KeyCode::Delete => Some(CardAction::Delete),
            KeyCode::Char(c) => c
                .to_digit(10)
                .and_then(|n| (n as usize).checked_sub(1))
                .and_then(|index| TaskStatus::CARD.get(index).copied())
                .map(CardAction::SetStatus),
            _ => None,
        }
    }
}

impl Widget for TaskCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let status = self.task.status;
        let mut buttons = Vec::new();
        for (index, option) in TaskStatus::CARD.iter().enumerate() {
            let style = if *option == status {
                Style::default().fg(Color::Black).bg(status_color(*option))
            } else {
                Style::default().fg(ACCENT)
            };
            buttons.push(Span::styled(format!("[{}] {}", index + 1, option.label()), style));
            buttons.push(Span::raw(" "));
        }
        buttons.push(Span::styled("[d] Delete", Style::default().fg(DANGER)));

        let lines = vec![
            Line::from(vec![
                Span::styled(
                    self.task.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(
                    status.label().to_uppercase(),
                    Style::default().fg(status_color(status)),
                ),
            ]),
            Line::default(),
            Line::from(self.task.description.clone().unwrap_or_default()),
            Line::default(),
            Line::from(buttons),
        ];

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(status_color(status))),
            )
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_keys_to_card_buttons() {
        assert_eq!(
            TaskCard::action_for(KeyCode::Char('2')),
            Some(CardAction::SetStatus(TaskStatus::InProgress))
        );
        assert_eq!(
            TaskCard::action_for(KeyCode::Char('3')),
            Some(CardAction::SetStatus(TaskStatus::Completed))
        );
        assert_eq!(TaskCard::action_for(KeyCode::Char('d')), Some(CardAction::Delete));
        assert_eq!(TaskCard::action_for(KeyCode::Char('0')), None);
        assert_eq!(TaskCard::action_for(KeyCode::Char('4')), None);
    }

    #[test]
    fn renders_title_and_status_tag() {
        let task = Task::new("Buy paper", None).with_status(TaskStatus::InProgress);
        let area = Rect::new(0, 0, 60, 7);
        let mut buf = Buffer::empty(area);
        TaskCard::new(&task).render(area, &mut buf);

        let text: String = buf.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("Buy paper"));
        assert!(text.contains("IN PROGRESS"));
    }
}
