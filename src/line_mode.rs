use crate::session::{format_number, HistoryEntry, Outcome, Session};
use anyhow::Result;
use std::io::{stdin, stdout, Write};
use termion::{
    clear::CurrentLine as ClearLine,
    cursor::{DetectCursorPos, Goto},
    event::Key,
    input::TermRead,
    raw::IntoRawMode,
};

const PROMPT: &str = "Expression: ";

fn char_index_to_byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or_else(|| s.len())
}

fn remove_char_at(s: &mut String, char_index: usize) {
    let byte_idx = char_index_to_byte_index(s, char_index);
    if let Some(c) = s[byte_idx..].chars().next() {
        s.drain(byte_idx..byte_idx + c.len_utf8());
    }
}

pub fn run_line(mut session: Session) -> Result<()> {
    println!("Rust Console Calculator");
    println!("Supports: +, -, *, /, %, ^, functions (sin, cos, log, ...)");
    println!("Constants: pi, e, ans (previous result)");
    println!("Navigation: ←/→, Backspace/Delete, Home/End, ↑/↓ for history");
    println!("Special commands: 'quit' to exit, 'clear' to reset history, 'help'");
    println!("\rAdd 'details' before expression for step-by-step evaluation\n");

    let mut stdout = stdout().into_raw_mode()?;
    // typed lines, including commands, for ↑/↓ recall
    let mut recall: Vec<String> = Vec::new();
    let mut recall_index = 0;
    let mut keys = stdin().keys();

    loop {
        write!(stdout, "{}{}", ClearLine, PROMPT)?;
        stdout.flush()?;

        let mut expression = String::new();
        let mut cursor_pos = 0;
        let (_, initial_y) = stdout.cursor_pos()?;

        loop {
            write!(stdout, "{}{}{}{}", Goto(1, initial_y), ClearLine, PROMPT, expression)?;

            let prefix: String = expression.chars().take(cursor_pos).collect();
            let column = 1 + PROMPT.len() + unicode_width::UnicodeWidthStr::width(prefix.as_str());
            write!(stdout, "{}", Goto(column as u16, initial_y))?;
            stdout.flush()?;

            let Some(key) = keys.next() else {
                return Ok(());
            };

            match key? {
                Key::Char('\n') => break,
                Key::Ctrl('c') | Key::Ctrl('d') => {
                    write!(stdout, "\r\n")?;
                    return Ok(());
                }
                Key::Ctrl('u') => {
                    expression.clear();
                    cursor_pos = 0;
                }
                Key::Char(c) => {
                    let byte_idx = char_index_to_byte_index(&expression, cursor_pos);
                    expression.insert(byte_idx, c);
                    cursor_pos += 1;
                }
                Key::Backspace if cursor_pos > 0 => {
                    cursor_pos -= 1;
                    remove_char_at(&mut expression, cursor_pos);
                }
                Key::Delete if cursor_pos < expression.chars().count() => {
                    remove_char_at(&mut expression, cursor_pos);
                }
                Key::Left if cursor_pos > 0 => cursor_pos -= 1,
                Key::Right if cursor_pos < expression.chars().count() => cursor_pos += 1,
                Key::Home => cursor_pos = 0,
                Key::End => cursor_pos = expression.chars().count(),
                Key::Up => {
                    if recall_index > 0 {
                        recall_index -= 1;
                        expression = recall[recall_index].clone();
                        cursor_pos = expression.chars().count();
                    }
                }
                Key::Down => {
                    if recall_index < recall.len().saturating_sub(1) {
                        recall_index += 1;
                        expression = recall[recall_index].clone();
                        cursor_pos = expression.chars().count();
                    } else {
                        recall_index = recall.len();
                        expression.clear();
                        cursor_pos = 0;
                    }
                }
                _ => {}
            }
        }

        let input = expression.trim();
        if !input.is_empty() {
            recall.push(input.to_string());
            recall_index = recall.len();
        }

        match session.submit(input) {
            Outcome::Quit => {
                write!(stdout, "\r\nGoodbye!\r\n")?;
                return Ok(());
            }
            Outcome::Cleared => {
                recall.clear();
                recall_index = 0;
                write!(stdout, "\r\nHistory cleared\r\n\n")?;
            }
            Outcome::Help => {
                let mut names: Vec<&str> = session.environment().names().collect();
                names.sort_unstable();
                write!(stdout, "\r\n  Operators: + - * / % ^\r\n  Names: {}\r\n\n", names.join(", "))?;
            }
            Outcome::Ignored => write!(stdout, "\r\n")?,
            Outcome::Evaluated => {
                if let Some(entry) = session.history.last() {
                    write_entry(&mut stdout, &session, entry)?;
                }
            }
        }
    }
}

fn write_entry(out: &mut impl Write, session: &Session, entry: &HistoryEntry) -> Result<()> {
    let formatted_expr = session.pretty(&entry.input);
    match &entry.result {
        Ok(result) => write!(out, "\r\n  {} = {}\r\n", formatted_expr, format_number(*result))?,
        Err(e) => write!(out, "\r\n  {} = Error: {}\r\n", formatted_expr, e)?,
    }

    if entry.detailed_mode && !entry.detailed_steps.is_empty() {
        write!(out, "\r\n  Step-by-step evaluation:\r\n")?;
        for (i, step) in entry.detailed_steps.iter().enumerate() {
            write!(out, "  Step {}: {} = {}\r\n", i + 1, step.operation, format_number(step.result))?;
        }
        write!(
            out,
            "  Time: {:.6} ms\r\n",
            entry.duration.as_secs_f64() * 1000.0
        )?;
    }
    write!(out, "\r\n")?;
    out.flush()?;
    Ok(())
}
