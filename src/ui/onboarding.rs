use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span, Text},
};

use super::helpers::clamp_name;
use super::theme::Theme;
use crate::app::App;
use crate::types::{MAX_WEIGHT, PriorityDomain};

pub fn build_onboarding_text(app: &App) -> Text<'_> {
    let draft = &app.onboarding;
    let mut lines = vec![
        Line::from(Span::styled(
            "What matters to you?",
            Style::default()
                .fg(Theme::accent())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Add a few priorities. Suggestions are weighted by them.",
            Style::default().fg(Theme::dim()),
        )),
        Line::from(""),
    ];

    let mut domains = vec![Span::styled("Domain: ", Style::default().fg(Theme::dim()))];
    for domain in PriorityDomain::ALL {
        let style = if domain == draft.domain {
            Style::default()
                .fg(Theme::highlight())
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Theme::dim())
        };
        domains.push(Span::styled(format!(" {} ", domain.label()), style));
    }
    lines.push(Line::from(domains));
    let mut examples = vec![Span::styled("Ideas:  ", Style::default().fg(Theme::dim()))];
    for (index, name) in draft.domain.examples().iter().enumerate() {
        let style = if draft.example == Some(index) {
            Style::default()
                .fg(Theme::highlight())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Theme::dim())
        };
        examples.push(Span::styled(format!(" {name} "), style));
    }
    lines.push(Line::from(examples));
    lines.push(Line::from(vec![
        Span::styled("Name:   ", Style::default().fg(Theme::dim())),
        Span::styled(
            draft.input.as_str(),
            Style::default()
                .fg(Theme::text())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("_", Style::default().fg(Theme::highlight())),
    ]));
    lines.push(Line::from(""));

    if draft.priorities.is_empty() {
        lines.push(Line::from(Span::styled(
            "  No priorities yet.",
            Style::default().fg(Theme::dim()),
        )));
    }
    for (index, priority) in draft.priorities.iter().enumerate() {
        let selected = index == draft.selected;
        let weight = "●".repeat(usize::from(priority.weight))
            + &"○".repeat(usize::from(MAX_WEIGHT.saturating_sub(priority.weight)));
        lines.push(Line::from(vec![
            Span::styled(
                if selected { "> " } else { "  " },
                Style::default()
                    .fg(Theme::selection_marker())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                clamp_name(priority.domain.label(), 14),
                Style::default().fg(Theme::secondary()),
            ),
            Span::styled(
                clamp_name(&priority.name, 24),
                Style::default().fg(Theme::text()),
            ),
            Span::styled(weight, Style::default().fg(Theme::accent())),
        ]));
    }

    Text::from(lines)
}
