use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span, Text},
};

use super::theme::Theme;

pub fn build_help_text() -> Text<'static> {
    let mut lines = Vec::new();

    lines.push(Line::from(Span::styled(
        "Key bindings",
        Style::default()
            .fg(Theme::accent())
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    lines.push(section_title("Day"));
    lines.extend(section_lines(&[
        "Up/Down: Select hour",
        "Left/Right: Previous/next day",
        "t: Jump to today",
        "q: Quit",
        "?: Toggle help",
    ]));

    lines.push(Line::from(""));
    lines.push(section_title("Blocks"));
    lines.extend(section_lines(&[
        "c: Mark completed",
        "x: Mark distracted",
        "p: Back to planned",
        "d: Delete",
        "n: New block at the selected hour",
    ]));

    lines.push(Line::from(""));
    lines.push(section_title("Magic fill"));
    lines.extend(section_lines(&[
        "m: Ask for a suggested day",
        "Space: Pick suggestion, a: Pick all",
        "Enter: Replace the day with the picks",
        "r: Ask again, Esc: Close and stop adding",
    ]));

    lines.push(Line::from(""));
    lines.push(section_title("Popups"));
    lines.extend(section_lines(&[
        "New block: Tab switch field, Up/Down change category, Enter save, Esc cancel",
    ]));

    Text::from(lines)
}

fn section_title(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {title}"),
        Style::default()
            .fg(Theme::secondary())
            .add_modifier(Modifier::BOLD),
    ))
}

fn section_lines(items: &[&str]) -> Vec<Line<'static>> {
    items
        .iter()
        .map(|item| {
            Line::from(Span::styled(
                format!("  - {item}"),
                Style::default().fg(Theme::text()),
            ))
        })
        .collect()
}
