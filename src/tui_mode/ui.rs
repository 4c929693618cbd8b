use super::app::App;
use super::helpers::{highlight_functions, wrap_text};
use crate::render_help::render_help;
use crate::session::{format_number, HistoryEntry};
use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use exprcalc::calc_engine::Environment;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

const MIN_TERMINAL_WIDTH: u16 = 50;
const MIN_TERMINAL_HEIGHT: u16 = 10;
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const WHEEL_LINES: usize = 3;
const INPUT_PROMPT: &str = "> ";

const KEY_HINTS: [(&str, &str); 5] = [
    ("Enter", "Calculate"),
    ("↑/↓ PgUp/PgDn", "History"),
    ("Ctrl+U", "Clear"),
    ("F1", "Help"),
    ("Esc", "Quit"),
];

pub fn run_ui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|f| {
            if app.show_help {
                render_help(f, app);
            } else {
                draw(f, app);
            }
        })?;

        if !crossterm::event::poll(POLL_INTERVAL)? {
            continue;
        }
        match crossterm::event::read()? {
            Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. }) => {
                if app.show_help {
                    on_help_key(app, code);
                } else {
                    on_input_key(app, code, modifiers);
                }
            }
            Event::Mouse(event) => match event.kind {
                MouseEventKind::ScrollDown => on_wheel(app, true),
                MouseEventKind::ScrollUp => on_wheel(app, false),
                _ => {}
            },
            _ => {}
        }
    }
    Ok(())
}

fn on_help_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Down => app.help_scroll = app.help_scroll.saturating_add(1),
        KeyCode::Up => app.help_scroll = app.help_scroll.saturating_sub(1),
        KeyCode::PageDown => app.help_scroll = app.help_scroll.saturating_add(10),
        KeyCode::PageUp => app.help_scroll = app.help_scroll.saturating_sub(10),
        KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q') => {
            app.show_help = false;
            app.help_scroll = 0;
        }
        _ => {}
    }
}

fn on_input_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    match code {
        KeyCode::Char('u') | KeyCode::Char('U') if ctrl => app.clear_input(),
        KeyCode::Char('c') | KeyCode::Char('d') if ctrl => app.should_quit = true,
        KeyCode::Char(c) if !ctrl && !modifiers.contains(KeyModifiers::ALT) => app.insert_char(c),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete_at_cursor(),
        KeyCode::Left if ctrl => app.move_cursor_by_words(-1),
        KeyCode::Right if ctrl => app.move_cursor_by_words(1),
        KeyCode::Left => app.move_cursor(-1),
        KeyCode::Right => app.move_cursor(1),
        KeyCode::Home => {
            app.cursor_position = 0;
            app.input_scroll = 0;
        }
        KeyCode::End => app.cursor_position = app.input.chars().count(),
        KeyCode::Up => app.navigate_history(-1),
        KeyCode::Down => app.navigate_history(1),
        KeyCode::PageUp => app.scroll_history(-1),
        KeyCode::PageDown => app.scroll_history(1),
        KeyCode::Enter => app.submit(),
        KeyCode::F(1) => {
            app.show_help = true;
            app.help_scroll = 0;
        }
        // Esc clears a half-typed expression first, quits on an empty line.
        KeyCode::Esc if app.input.is_empty() => app.should_quit = true,
        KeyCode::Esc => app.clear_input(),
        _ => {}
    }
}

fn on_wheel(app: &mut App, down: bool) {
    let scroll = if app.show_help {
        &mut app.help_scroll
    } else {
        &mut app.history_scroll
    };
    *scroll = if down {
        scroll.saturating_add(WHEEL_LINES)
    } else {
        scroll.saturating_sub(WHEEL_LINES)
    };
}

fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.size();
    if area.width < MIN_TERMINAL_WIDTH || area.height < MIN_TERMINAL_HEIGHT {
        draw_too_small(frame, area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    draw_input(frame, app, rows[0]);
    draw_key_hints(frame, rows[1]);
    draw_history(frame, app, rows[2]);
    app.list_height = rows[2].height as usize;
}

fn draw_too_small(frame: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled(
            format!(
                "Need at least {}x{}, have {}x{}",
                MIN_TERMINAL_WIDTH, MIN_TERMINAL_HEIGHT, area.width, area.height
            ),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Enlarge the window to continue", Style::default().fg(Color::Yellow))),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" exprcalc ")
        .title_alignment(Alignment::Center);

    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

/// The input box. Its border and title show what Enter would produce.
fn draw_input(frame: &mut Frame, app: &mut App, area: Rect) {
    let (border, title) = match app.session.preview(&app.input) {
        None => (Color::DarkGray, " Expression ".to_string()),
        Some(Ok(value)) => (Color::Green, format!(" = {} ", format_number(value))),
        Some(Err(e)) => (Color::Red, format!(" {} ", e)),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(title, Style::default().fg(border)))
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let prompt_width = INPUT_PROMPT.width();
    let visible_width = (inner.width as usize).saturating_sub(prompt_width);
    app.adjust_input_scroll(visible_width);

    let visible: String = app.input.chars().skip(app.input_scroll).take(visible_width).collect();
    let mut spans = vec![Span::styled(INPUT_PROMPT, Style::default().fg(Color::Green))];
    spans.extend(highlight_functions(&visible, Style::default(), app.session.environment()));
    frame.render_widget(Paragraph::new(Line::from(spans)), inner);

    let before_cursor: String = visible
        .chars()
        .take(app.cursor_position.saturating_sub(app.input_scroll))
        .collect();
    frame.set_cursor(inner.x + (prompt_width + before_cursor.width()) as u16, inner.y);

    let marker = Style::default().fg(Color::DarkGray);
    if app.input_scroll > 0 {
        frame.render_widget(Paragraph::new("<").style(marker), Rect::new(inner.x, inner.y, 1, 1));
    }
    if app.input.chars().count() > app.input_scroll + visible_width {
        let right = inner.x + inner.width.saturating_sub(1);
        frame.render_widget(Paragraph::new(">").style(marker), Rect::new(right, inner.y, 1, 1));
    }
}

fn draw_key_hints(frame: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let hint = Style::default().fg(Color::DarkGray);
    let spans: Vec<Span> = KEY_HINTS
        .iter()
        .flat_map(|&(k, h)| [Span::styled(k, key), Span::styled(format!(" {}  ", h), hint)])
        .collect();
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_history(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" History ({}) ", app.session.history.len()))
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.session.history.is_empty() {
        frame.render_widget(
            Paragraph::new("Type an expression such as sqrt(16) + 2^3 and press Enter")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let width = inner.width.saturating_sub(4) as usize;
    let last = app.session.history.len() - 1;
    let mut items = Vec::new();
    app.item_start_indices.clear();

    for (i, entry) in app.session.history.iter().enumerate() {
        app.item_start_indices.push(items.len());
        let pretty = app.session.pretty(&entry.input);
        items.extend(entry_items(
            entry,
            &pretty,
            i == app.cursor_history,
            width,
            app.session.environment(),
        ));
        if i < last {
            items.push(ListItem::new(Span::styled(
                "─".repeat(inner.width as usize),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    if app.scroll_to_bottom {
        app.history_scroll = items.len().saturating_sub(inner.height as usize);
        app.scroll_to_bottom = false;
    }

    let mut state = ListState::default()
        .with_selected(app.item_start_indices.get(app.cursor_history).copied())
        .with_offset(app.history_scroll);
    let list = List::new(items)
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
    frame.render_stateful_widget(list, inner, &mut state);
}

/// One history entry: the wrapped expression with its result on the first
/// line, then the evaluation steps when the entry was run with `details`.
fn entry_items(
    entry: &HistoryEntry,
    pretty: &str,
    selected: bool,
    width: usize,
    env: &Environment,
) -> Vec<ListItem<'static>> {
    let expr_style = Style::default().fg(if selected { Color::Yellow } else { Color::Cyan });
    let (result_text, result_color) = match &entry.result {
        Ok(value) => (format_number(*value), Color::LightMagenta),
        Err(e) => (format!("Error: {}", e), Color::Red),
    };

    let mut items = Vec::new();
    for (n, line) in wrap_text(pretty, width).into_iter().enumerate() {
        let lead = if n == 0 { INPUT_PROMPT } else { "  " };
        let mut spans = vec![Span::styled(lead, Style::default().fg(Color::Green))];
        spans.extend(highlight_functions(&line, expr_style, env));
        if n == 0 {
            spans.push(Span::styled(" = ", Style::default().fg(Color::Gray)));
            spans.push(Span::styled(
                result_text.clone(),
                Style::default().fg(result_color).add_modifier(Modifier::BOLD),
            ));
        }
        items.push(ListItem::new(Line::from(spans)));
    }

    if entry.detailed_mode {
        for (n, step) in entry.detailed_steps.iter().enumerate() {
            let text = format!("Step {}: {} = {}", n + 1, step.operation, format_number(step.result));
            push_indented(&mut items, &text, width, Color::DarkGray);
        }
        if entry.result.is_err() {
            push_indented(&mut items, &result_text, width, Color::Red);
        }
        let time = format!("Time: {:.6} ms", entry.duration.as_secs_f64() * 1000.0);
        push_indented(&mut items, &time, width, Color::Magenta);
    }
    items
}

fn push_indented(items: &mut Vec<ListItem<'static>>, text: &str, width: usize, color: Color) {
    for (n, line) in wrap_text(text, width.saturating_sub(6)).into_iter().enumerate() {
        let lead = if n == 0 { "    - " } else { "      " };
        items.push(ListItem::new(Span::styled(format!("{}{}", lead, line), Style::default().fg(color))));
    }
}
