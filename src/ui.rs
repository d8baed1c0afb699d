use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::{
    app::{App, HomePage, Intent, Page, TasksPage},
    error::Result,
    kanban_board::KanbanBoard,
    task::TaskStatus,
    widgets::{button, CardAction, FormEvent, TaskCard, TaskForm, TaskFormEvent, ACCENT, DANGER},
};

const TICK: Duration = Duration::from_millis(200);

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.pump()?;
        if !app.is_running() {
            return Ok(());
        }
        terminal.draw(|f| draw(f, app))?;

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(intent) = handle_key(app, key) {
                app.dispatch(intent)?;
            }
        }
    }
}

/// Turns a key press into an intent. Keys that only touch widget state
/// (typing, focus, selection) are applied here and yield `None`.
pub fn handle_key(app: &mut App, key: KeyEvent) -> Option<Intent> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Intent::Quit);
    }
    match app.page_mut() {
        Page::Blank => None,
        Page::Home(home) => home_key(home, key.code),
        Page::Login(form) => match key.code {
            KeyCode::Esc => Some(Intent::Back),
            _ => form.handle_key(key).map(|event| match event {
                FormEvent::Submit(credentials) => Intent::SignIn(credentials),
                FormEvent::Navigate(path) => Intent::Navigate(path.to_string()),
            }),
        },
        Page::Register(form) => match key.code {
            KeyCode::Esc => Some(Intent::Back),
            _ => form.handle_key(key).map(|event| match event {
                FormEvent::Submit(registration) => Intent::SignUp(registration),
                FormEvent::Navigate(path) => Intent::Navigate(path.to_string()),
            }),
        },
        Page::Tasks(page) => tasks_key(page, key),
        Page::NotFound(_) => match key.code {
            KeyCode::Enter | KeyCode::Char('h') => Some(Intent::Navigate("/".to_string())),
            KeyCode::Esc => Some(Intent::Back),
            KeyCode::Char('q') => Some(Intent::Quit),
            _ => None,
        },
    }
}

fn home_key(home: &mut HomePage, code: KeyCode) -> Option<Intent> {
    match code {
        KeyCode::Char('q') => Some(Intent::Quit),
        _ if !home.show_options => None,
        KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
            home.selected = 1 - home.selected.min(1);
            None
        }
        KeyCode::Char('l') => Some(Intent::Navigate("/login".to_string())),
        KeyCode::Char('r') => Some(Intent::Navigate("/register".to_string())),
        KeyCode::Enter => {
            let path = if home.selected == 0 { "/login" } else { "/register" };
            Some(Intent::Navigate(path.to_string()))
        }
        _ => None,
    }
}

fn tasks_key(page: &mut TasksPage, key: KeyEvent) -> Option<Intent> {
    if let Some(form) = page.form.as_mut() {
        return match form.handle_key(key)? {
            TaskFormEvent::Submit(input) => Some(Intent::CreateTask(input)),
            TaskFormEvent::Cancel => {
                page.form = None;
                None
            }
        };
    }

    let selected = page.selected_task().map(|t| t.id.clone());
    match key.code {
        KeyCode::Char('q') => Some(Intent::Quit),
        KeyCode::Esc => Some(Intent::Back),
        KeyCode::Char('o') => Some(Intent::SignOut),
        KeyCode::Char('a') | KeyCode::Char('n') => {
            page.form = Some(TaskForm::new());
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            page.select(-1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            page.select(1);
            None
        }
        KeyCode::Enter | KeyCode::Char(' ') => selected.map(Intent::ToggleStatus),
        code => match (TaskCard::action_for(code), selected) {
            (Some(CardAction::SetStatus(status)), Some(id)) => Some(Intent::SetStatus(id, status)),
            (Some(CardAction::Delete), Some(id)) => Some(Intent::DeleteTask(id)),
            _ => None,
        },
    }
}

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let path = app.route().map(|r| r.path().to_string()).unwrap_or_default();
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("taskboard ", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
            Span::styled(path, Style::default().fg(Color::DarkGray)),
        ])),
        chunks[0],
    );

    let hints = match app.page() {
        Page::Blank => "",
        Page::Home(_) => "[l] login  [r] register  [Enter] choose  [q] quit",
        Page::Login(_) | Page::Register(_) => "[Tab] next  [Enter] confirm  [Esc] back  [Ctrl+C] quit",
        Page::Tasks(page) if page.form.is_some() => "[Tab] next  [Enter] save  [Esc] cancel",
        Page::Tasks(_) => {
            "[a] new  [Enter] toggle  [1-3] status  [d] delete  [o] sign out  [Esc] back  [q] quit"
        }
        Page::NotFound(_) => "[Enter] go home  [Esc] back  [q] quit",
    };
    frame.render_widget(
        Paragraph::new(Span::styled(hints, Style::default().fg(Color::DarkGray))),
        chunks[2],
    );

    let body = chunks[1];
    match app.page() {
        Page::Blank => {}
        Page::Home(home) => draw_home(frame, body, home),
        Page::Login(form) => form.render(frame, body),
        Page::Register(form) => form.render(frame, body),
        Page::Tasks(page) => draw_tasks(frame, body, page),
        Page::NotFound(path) => draw_not_found(frame, body, path),
    }
}

fn draw_home(frame: &mut Frame, area: Rect, home: &HomePage) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Welcome!",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from("Manage your tasks from the terminal."),
        Line::default(),
    ];
    if home.show_options {
        lines.push(Line::from("Sign in or register to continue."));
        lines.push(Line::default());
        let mut actions = button("Sign in", home.selected == 0, false);
        actions.spans.push(Span::raw("   "));
        actions
            .spans
            .extend(button("Register", home.selected == 1, false).spans);
        lines.push(actions);
    } else {
        lines.push(Line::from("Checking session..."));
    }
    let area = crate::widgets::centered(area, 60, 10);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(ACCENT))),
        area,
    );
}

fn draw_tasks(frame: &mut Frame, area: Rect, page: &TasksPage) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ])
        .split(columns[0]);

    let selected = page.selected_task().map(|t| t.id.as_str());
    let pending: Vec<_> = page.pending().collect();
    let completed: Vec<_> = page.completed().collect();
    for (tasks, title, empty, chunk) in [
        (&pending, "Pending", "No pending tasks", sections[0]),
        (&completed, "Completed", "No completed tasks", sections[1]),
    ] {
        let items: Vec<ListItem> = if tasks.is_empty() {
            vec![ListItem::new(Span::styled(
                empty,
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ))]
        } else {
            tasks
                .iter()
                .map(|t| {
                    let mut style = Style::default().fg(Color::White);
                    if t.status.is_completed() {
                        style = style.add_modifier(Modifier::CROSSED_OUT | Modifier::DIM);
                    }
                    if selected == Some(t.id.as_str()) {
                        style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
                    }
                    let marker = if t.status.is_completed() { "[x] " } else { "[ ] " };
                    ListItem::new(Line::from(vec![
                        Span::raw(marker),
                        Span::styled(t.title.clone(), style),
                    ]))
                })
                .collect()
        };
        let list = List::new(items).block(
            Block::default()
                .title(format!("{title} ({})", tasks.len()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT)),
        );
        frame.render_widget(list, chunk);
    }

    let detail = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(9), Constraint::Min(0)])
        .split(columns[1]);
    if let Some(task) = page.selected_task() {
        frame.render_widget(TaskCard::new(task), detail[0]);
    }
    let mut notes = Vec::new();
    if page.user_id.is_none() {
        notes.push(Line::from("Not signed in: nothing to sync."));
    }
    if let Some(error) = &page.error {
        notes.push(Line::from(Span::styled(error.clone(), Style::default().fg(DANGER))));
    }
    frame.render_widget(Paragraph::new(notes).wrap(Wrap { trim: true }), detail[1]);

    if let Some(form) = &page.form {
        form.render(frame, area);
    }
}

fn draw_not_found(frame: &mut Frame, area: Rect, path: &str) {
    let lines = vec![
        Line::from(Span::styled(
            "404",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from("Page not found"),
        Line::from(Span::styled(
            format!("Nothing lives at {path}."),
            Style::default().fg(Color::DarkGray),
        )),
        Line::default(),
        button("Go home", true, false),
    ];
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        crate::widgets::centered(area, 50, 7),
    );
}

/// Widget state of the board screen that is not part of the board itself.
#[derive(Debug, Default)]
pub struct BoardView {
    pub form: Option<TaskForm>,
    pub error: Option<String>,
}

pub fn run_board<B: Backend>(terminal: &mut Terminal<B>, board: &mut KanbanBoard) -> Result<()> {
    let mut view = BoardView::default();
    loop {
        terminal.draw(|f| draw_board(f, board, &view))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if !handle_board_key(board, &mut view, key) {
                return Ok(());
            }
        }
    }
}

/// Returns `false` when the board should close.
pub fn handle_board_key(board: &mut KanbanBoard, view: &mut BoardView, key: KeyEvent) -> bool {
    if let Some(form) = view.form.as_mut() {
        match form.handle_key(key) {
            Some(TaskFormEvent::Submit(input)) => {
                match board.add_task(input.title, input.description) {
                    Ok(_) => {
                        view.form = None;
                        view.error = None;
                    }
                    Err(err) => form.fail(format!("Could not save task: {err}")),
                }
            }
            Some(TaskFormEvent::Cancel) => view.form = None,
            None => {}
        }
        return true;
    }

    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    match key.code {
        KeyCode::Char('q') => return false,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
        KeyCode::Char('a') => view.form = Some(TaskForm::new()),
        KeyCode::Left if shift => report(view, board.move_task(-1)),
        KeyCode::Right if shift => report(view, board.move_task(1)),
        KeyCode::Char('<') => report(view, board.move_task(-1)),
        KeyCode::Char('>') => report(view, board.move_task(1)),
        KeyCode::Left => board.select_status(-1),
        KeyCode::Right => board.select_status(1),
        KeyCode::Up => board.select_task(-1),
        KeyCode::Down => board.select_task(1),
        KeyCode::Enter | KeyCode::Char(' ') => report(view, board.toggle_selected()),
        KeyCode::Char('d') | KeyCode::Delete => report(view, board.delete_selected()),
        _ => {}
    }
    true
}

fn report(view: &mut BoardView, outcome: Result<()>) {
    view.error = outcome.err().map(|err| err.to_string());
}

fn draw_board(frame: &mut Frame, board: &KanbanBoard, view: &BoardView) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Percentage(25); TaskStatus::ALL.len()])
        .split(rows[0]);

    for (i, list) in board.lists().iter().enumerate() {
        let items: Vec<ListItem> = list
            .tasks()
            .iter()
            .enumerate()
            .map(|(j, t)| {
                let mut style = Style::default().fg(Color::White);
                if board.selected_status == i && board.selected_task == j {
                    style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
                }
                let mut spans = vec![Span::styled(t.title.clone(), style)];
                if let Some(description) = &t.description {
                    spans.push(Span::styled(
                        format!(" - {description}"),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let title = format!("{} ({})", list.status().label(), list.tasks().len());
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(if board.selected_status == i {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            });
        frame.render_widget(List::new(items).block(block), chunks[i]);
    }

    let footer = match &view.error {
        Some(error) => Span::styled(error.clone(), Style::default().fg(DANGER)),
        None => Span::styled(
            "[a] add  [←/→] column  [↑/↓] task  [</>] move  [Enter] toggle done  [d] delete  [q] quit",
            Style::default().fg(Color::DarkGray),
        ),
    };
    frame.render_widget(Paragraph::new(footer), rows[1]);

    if let Some(form) = &view.form {
        let area = frame.area();
        form.render(frame, area);
    }
}
