mod help;
mod helpers;
mod onboarding;
mod theme;
mod timeline;

use chrono::Local;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    prelude::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::app::{App, AppView, MagicFillPopup, NewBlockField, NewBlockPopup};
use helpers::{centered_rect, clamp_name};
use theme::Theme;

/// Renders the entire UI for a single frame.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(4),
        ])
        .split(area);

    frame.render_widget(header(app), layout[0]);

    let (title, body_text, scroll) = match app.view {
        AppView::Onboarding => (" Welcome ", onboarding::build_onboarding_text(app), 0),
        AppView::Help => (" Help ", help::build_help_text(), 0),
        AppView::Day => {
            let visible = layout[1].height.saturating_sub(2);
            let offset = (app.selected_hour as u16 + 1).saturating_sub(visible);
            (" Day ", timeline::build_day_text(app), offset)
        }
    };
    let body = Paragraph::new(body_text)
        .style(Style::default().fg(Theme::text()))
        .alignment(Alignment::Left)
        .scroll((scroll, 0))
        .block(bordered().title(title));
    frame.render_widget(body, layout[1]);

    let footer = Paragraph::new(Text::from(footer_lines(app)))
        .alignment(Alignment::Left)
        .block(bordered());
    frame.render_widget(footer, layout[2]);

    if let Some(popup) = &app.new_block_popup {
        render_new_block_popup(frame, popup);
    }
    if let Some(popup) = &app.magic_fill {
        render_magic_fill_popup(frame, popup, app.staged_remaining());
    }
}

fn bordered() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(Theme::secondary()))
}

fn header(app: &App) -> Paragraph<'_> {
    let today = Local::now().date_naive();
    let mut spans = vec![
        Span::styled(
            "  Dayplan  ",
            Style::default().fg(Color::Black).bg(Theme::primary()),
        ),
        Span::raw(" "),
        Span::styled(
            app.selected_date.format("%A, %d %B %Y").to_string(),
            Style::default()
                .fg(Theme::secondary())
                .add_modifier(Modifier::BOLD),
        ),
    ];
    if app.selected_date == today {
        spans.push(Span::styled("  today", Style::default().fg(Theme::dim())));
    }
    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Left)
        .block(bordered())
}

fn footer_lines(app: &App) -> Vec<Line<'_>> {
    let status = match &app.status {
        Some(status) => Line::from(Span::styled(
            status.as_str(),
            Style::default().fg(Theme::warn()),
        )),
        None => Line::from(Span::styled(
            selected_summary(app),
            Style::default().fg(Theme::text()),
        )),
    };
    let hint = match app.view {
        AppView::Onboarding => {
            "Type a name  ←/→: Ideas  Tab: Domain  Enter: Add (empty: Finish)  Up/Down: Select  +/-: Weight  Del: Remove  Esc: Quit"
        }
        AppView::Day => {
            "c/x/p: Status  d: Delete  n: New  m: Magic fill  ←/→: Day  t: Today  ?: Help  q: Quit"
        }
        AppView::Help => "Press ? or ESC to close this help screen",
    };
    vec![
        status,
        Line::from(Span::styled(hint, Style::default().fg(Theme::dim()))),
    ]
}

fn selected_summary(app: &App) -> String {
    match app.selected_block() {
        Some(block) => format!(
            "{:02}:00  {} ({}, {})",
            app.selected_hour,
            block.title,
            block.category.label(),
            block.status
        ),
        None => format!("{:02}:00  free", app.selected_hour),
    }
}

fn field_styles(active: bool) -> (Style, Style) {
    if active {
        let style = Style::default()
            .fg(Theme::highlight())
            .add_modifier(Modifier::BOLD);
        (style, style)
    } else {
        (
            Style::default().fg(Theme::dim()),
            Style::default().fg(Theme::text()),
        )
    }
}

fn render_new_block_popup(frame: &mut Frame, popup: &NewBlockPopup) {
    let area = centered_rect(60, 50, frame.area());
    frame.render_widget(Clear, area);
    let arrow_style = Style::default()
        .fg(Theme::selection_marker())
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(Span::styled(
            "New block",
            Style::default()
                .fg(Theme::accent())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    let fields = [
        (NewBlockField::Title, "Title:    ", popup.title.as_str()),
        (NewBlockField::Category, "Category: ", popup.category.label()),
        (NewBlockField::Start, "Start:    ", popup.start.as_str()),
        (NewBlockField::End, "End:      ", popup.end.as_str()),
    ];
    for (field, label, value) in fields {
        let active = popup.field == field;
        let (label_style, mut value_style) = field_styles(active);
        if field == NewBlockField::Category {
            value_style = value_style.fg(Theme::category(popup.category));
        }
        lines.push(Line::from(vec![
            Span::styled(if active { "> " } else { "  " }, arrow_style),
            Span::styled(label, label_style),
            Span::styled(value, value_style),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab: switch field. Up/Down: category. Enter: save. Esc: cancel.",
        Style::default().fg(Theme::dim()),
    )));

    let widget = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Left)
        .block(bordered().title(" New Block "));
    frame.render_widget(widget, area);
}

fn render_magic_fill_popup(frame: &mut Frame, popup: &MagicFillPopup, remaining: usize) {
    let area = centered_rect(70, 75, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled(
            "Magic fill",
            Style::default()
                .fg(Theme::accent())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if popup.is_loading() {
        lines.push(Line::from(Span::styled(
            "Loading suggestions...",
            Style::default().fg(Theme::dim()),
        )));
    } else {
        if let Some(notice) = &popup.notice {
            lines.push(Line::from(Span::styled(
                notice.as_str(),
                Style::default().fg(Theme::warn()),
            )));
            lines.push(Line::from(""));
        }
        for (index, block) in popup.suggestions.iter().enumerate() {
            let selected = index == popup.cursor;
            let chosen = popup.is_chosen(index);
            lines.push(Line::from(vec![
                Span::styled(
                    if selected { "> " } else { "  " },
                    Style::default()
                        .fg(Theme::selection_marker())
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    if chosen { "[x] " } else { "[ ] " },
                    Style::default().fg(if chosen { Theme::success() } else { Theme::dim() }),
                ),
                Span::styled(
                    format!("{}-{}  ", block.start_time, block.end_time),
                    Style::default().fg(Theme::dim()),
                ),
                Span::styled(
                    clamp_name(&block.title, 26),
                    Style::default().fg(Theme::text()),
                ),
                Span::styled(
                    block.category.label(),
                    Style::default().fg(Theme::category(block.category)),
                ),
            ]));
        }
        lines.push(Line::from(""));
        if popup.staging {
            lines.push(Line::from(Span::styled(
                format!("Adding blocks... {remaining} left"),
                Style::default().fg(Theme::highlight()),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                format!("{} picked", popup.chosen.len()),
                Style::default().fg(Theme::accent()),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Space: pick. a: pick all. Enter: replace the day. r: ask again. Esc: close.",
        Style::default().fg(Theme::dim()),
    )));

    let widget = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Left)
        .block(bordered().title(" Suggestions "));
    frame.render_widget(widget, area);
}
