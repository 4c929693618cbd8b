use exprcalc::calc_engine::{lexer::OPERATORS, Environment};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec!["".to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_width = 0;

    for word in text.split_whitespace() {
        let word_width = word.width();

        if word_width > width {
            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
                current_width = 0;
            }

            let mut chunk = String::new();
            let mut chunk_width = 0;
            for c in word.chars() {
                let char_width = UnicodeWidthChar::width_cjk(c).unwrap_or(1);
                if chunk_width + char_width > width && !chunk.is_empty() {
                    lines.push(std::mem::take(&mut chunk));
                    chunk_width = 0;
                }
                chunk.push(c);
                chunk_width += char_width;
            }
            if !chunk.is_empty() {
                lines.push(chunk);
            }
            continue;
        }

        if current_width + word_width + 1 > width && !current_line.is_empty() {
            lines.push(std::mem::take(&mut current_line));
            current_width = 0;
        }

        if !current_line.is_empty() {
            current_line.push(' ');
            current_width += 1;
        }

        current_line.push_str(word);
        current_width += word_width;
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    lines
}

#[derive(PartialEq, Clone, Copy)]
enum Run {
    Name,
    Number,
}

/// Colors an expression: names bound in `env` are highlighted, unknown
/// names keep `base_style`.
pub fn highlight_functions(expr: &str, base_style: Style, env: &Environment) -> Vec<Span<'static>> {
    let function_style = Style::default()
        .fg(Color::LightBlue)
        .add_modifier(Modifier::BOLD);

    let operator_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let number_style = Style::default().fg(Color::LightGreen);

    let flush = |spans: &mut Vec<Span<'static>>, current: &mut String, run: Option<Run>| {
        if current.is_empty() {
            return;
        }
        let style = match run {
            Some(Run::Name) if env.contains(current) => function_style,
            Some(Run::Number) => number_style,
            _ => base_style,
        };
        spans.push(Span::styled(std::mem::take(current), style));
    };

    let mut spans = Vec::new();
    let mut current = String::new();
    let mut run = None;

    for c in expr.chars() {
        let next = if c.is_alphabetic() || c == '_' || (run == Some(Run::Name) && c.is_ascii_digit()) {
            Some(Run::Name)
        } else if c.is_ascii_digit() || c == '.' {
            Some(Run::Number)
        } else {
            None
        };

        if next != run {
            flush(&mut spans, &mut current, run);
            run = next;
        }

        if run.is_some() {
            current.push(c);
        } else if OPERATORS.contains(&c) {
            spans.push(Span::styled(c.to_string(), operator_style));
        } else if c == ' ' {
            spans.push(Span::raw(" "));
        } else {
            spans.push(Span::styled(c.to_string(), base_style));
        }
    }
    flush(&mut spans, &mut current, run);

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_text_breaks_on_words_and_long_tokens() {
        assert_eq!(wrap_text("1 + 2 + 3", 5), vec!["1 + 2", "+ 3"]);
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap_text("x", 0), vec![""]);
    }

    #[test]
    fn known_names_are_highlighted() {
        let env = Environment::default();
        let base = Style::default();
        let spans = highlight_functions("sqrt(x1) + 2.5", base, &env);

        let texts: Vec<&str> = spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(texts, vec!["sqrt", "(", "x1", ")", " ", "+", " ", "2.5"]);
        assert_eq!(spans[0].style.fg, Some(Color::LightBlue));
        assert_eq!(spans[2].style, base);
        assert_eq!(spans[5].style.fg, Some(Color::Yellow));
        assert_eq!(spans[7].style.fg, Some(Color::LightGreen));
    }
}
