use crate::tui_mode::app::App;
use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

fn heading(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
    ))
}

pub fn render_help(frame: &mut Frame, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" exprcalc Help ")
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black));

    let mut help_text = vec![
        Line::from(Span::styled(
            "exprcalc - Terminal Expression Calculator",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Operators (highest precedence first):"),
        Line::from("  ^     : Power, right-associative   (2 ^ 3 ^ 2 = 512)"),
        Line::from("  -x    : Negation, applied after ^  (-2 ^ 2 = -4)"),
        Line::from("  * / % : Multiply, divide, remainder (10 % 3 = 1)"),
        Line::from("  + -   : Add, subtract               (2 + 3 * 4 = 14)"),
        Line::from(""),
        heading("Functions:"),
        Line::from("  sin(x) cos(x) tan(x)   : Trigonometry (x in degrees)"),
        Line::from("  asin(x) acos(x) atan(x): Inverse trigonometry (result in degrees)"),
        Line::from("  sqrt(x)                : Square root (x >= 0)"),
        Line::from("  log(x)                 : Base-10 logarithm"),
        Line::from("  log(x, b)              : Logarithm of x in base b"),
        Line::from("  ln(x)                  : Natural logarithm"),
        Line::from("  exp(x)                 : e raised to x"),
        Line::from("  abs(x)                 : Absolute value"),
        Line::from("  floor(x) ceil(x) round(x)"),
        Line::from("  factorial(n), fact(n)  : n! for integers n >= 0"),
        Line::from(""),
        heading("Constants:"),
        Line::from("  pi  : π (3.14159...)"),
        Line::from("  e   : Euler's number (2.71828...)"),
        Line::from("  ans : Result of the last successful calculation"),
        Line::from(""),
    ];

    let mut names: Vec<&str> = app.session.environment().names().collect();
    names.sort_unstable();
    help_text.push(heading("All names:"));
    help_text.push(Line::from(format!("  {}", names.join(", "))));
    help_text.push(Line::from(""));

    help_text.extend([
        heading("Commands:"),
        Line::from("  details <expression> : Show step-by-step evaluation with time"),
        Line::from("  clear : Clear calculation history and ans"),
        Line::from("  Ctrl+U : Clear current input"),
        Line::from("  help : Show this help screen"),
        Line::from("  quit : Exit the calculator"),
        Line::from(""),
        heading("Navigation:"),
        Line::from("  ← → : Move cursor left/right"),
        Line::from("  Ctrl+←/→ : Move cursor by words"),
        Line::from("  Home/End : Move to start/end of line"),
        Line::from("  ↑ ↓ : Navigate calculation history"),
        Line::from("  PgUp/PgDn : Page through history"),
        Line::from("  Mouse wheel : Scroll through history"),
        Line::from("  Esc : Clear input, or quit when it is empty"),
        Line::from("  Ctrl+C / Ctrl+D : Quit"),
        Line::from(""),
        heading("Input box:"),
        Line::from("  The border turns green with the value Enter would give,"),
        Line::from("  or red with the error it would report."),
        Line::from(""),
        heading("Examples (Esc, F1 or q closes this screen):"),
        Line::from("  sqrt(16) + 2 ^ 3"),
        Line::from("  log(8, 2)"),
        Line::from("  details factorial(5) / 3"),
        Line::from("  ans * 2"),
    ]);

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll as u16, 0));

    frame.render_widget(Clear, frame.size());
    frame.render_widget(paragraph, frame.size());
}
