use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span, Text},
};

use super::helpers::{clamp_name, status_marker};
use super::theme::Theme;
use crate::app::App;
use crate::projection::{self, HourSlot};

/// Hour rows of the day view, one line per hour.
pub fn build_day_text(app: &App) -> Text<'_> {
    let lines = projection::day_slots(app.store.blocks())
        .into_iter()
        .map(|slot| hour_line(slot, slot.hour == app.selected_hour))
        .collect::<Vec<_>>();
    Text::from(lines)
}

fn hour_line(slot: HourSlot<'_>, selected: bool) -> Line<'_> {
    let marker_style = Style::default()
        .fg(Theme::selection_marker())
        .add_modifier(Modifier::BOLD);
    let mut label_style = Style::default().fg(Theme::dim());
    if selected {
        label_style = Style::default()
            .fg(Theme::highlight())
            .add_modifier(Modifier::BOLD);
    }
    let mut spans = vec![
        Span::styled(if selected { "> " } else { "  " }, marker_style),
        Span::styled(format!("{:02}:00 ", slot.hour), label_style),
    ];

    match slot.block {
        Some(block) if slot.is_block_start => {
            let color = Theme::category(block.category);
            let span = projection::span_height(block).unwrap_or(1).max(1);
            spans.push(Span::styled("█ ", Style::default().fg(color)));
            spans.push(Span::styled(
                format!("{} ", status_marker(block.status)),
                Style::default().fg(Theme::status(block.status)),
            ));
            spans.push(Span::styled(
                clamp_name(&block.title, 28),
                Style::default()
                    .fg(Theme::text())
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                format!(" {:<13}", block.category.label()),
                Style::default().fg(color),
            ));
            spans.push(Span::styled(
                format!("{}-{} ({span}h)", block.start_time, block.end_time),
                Style::default().fg(Theme::dim()),
            ));
        }
        Some(block) => {
            spans.push(Span::styled(
                "█",
                Style::default().fg(Theme::category(block.category)),
            ));
        }
        None => spans.push(Span::styled("·", Style::default().fg(Theme::dim()))),
    }

    Line::from(spans)
}
