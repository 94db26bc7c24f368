//! UI rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::app::{App, FormField, RealtimeIndicator};

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_updates_pane(frame, app, chunks[0]);
    draw_form_pane(frame, app, chunks[1]);
    draw_status_bar(frame, app, chunks[2]);

    // Draw realtime indicator in top-right corner
    draw_realtime_indicator(frame, app);

    if app.show_help {
        draw_help_overlay(frame);
    }

    if let Some(message) = &app.alert.message {
        draw_alert(frame, message);
    }
}

/// Draw the updates list (top)
fn draw_updates_pane(frame: &mut Frame, app: &App, area: Rect) {
    let rows = app.rows();

    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let mut spans = vec![
                Span::styled(
                    row.timestamp.clone(),
                    Style::default().add_modifier(Modifier::DIM),
                ),
                Span::raw(" – "),
                Span::styled(
                    row.user_name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ];
            if row.site.is_some() {
                spans.push(Span::styled(
                    row.site_label(),
                    Style::default().fg(Color::Cyan),
                ));
            }
            spans.push(Span::raw(": "));
            spans.push(Span::raw(row.text.clone()));

            ListItem::new(Line::from(spans))
        })
        .collect();

    let block = Block::default()
        .title(format!(" Daily Tag-up ({}) ", rows.len()))
        .borders(Borders::ALL);

    if items.is_empty() {
        let placeholder = Paragraph::new(Line::from(vec![Span::styled(
            "No updates yet",
            Style::default().add_modifier(Modifier::DIM),
        )]))
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    state.select(Some(app.selected));

    frame.render_stateful_widget(list, area, &mut state);
}

/// Draw the post form (middle)
fn draw_form_pane(frame: &mut Frame, app: &App, area: Rect) {
    let fields = [FormField::Name, FormField::Site, FormField::Text];
    let label_width = 8;

    let lines: Vec<Line> = fields
        .iter()
        .map(|&field| {
            let label_style = if field == app.focus {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            Line::from(vec![
                Span::styled(
                    format!("{:<width$}", format!("{}:", field.label()), width = label_width),
                    label_style,
                ),
                Span::raw(app.field(field).to_string()),
            ])
        })
        .collect();

    let block = Block::default()
        .title(" Post update ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    frame.render_widget(Paragraph::new(lines).block(block), area);

    // Position cursor in the focused field
    if !app.has_alert() && !app.show_help {
        let row = fields.iter().position(|&f| f == app.focus).unwrap_or(0) as u16;
        let cursor_x = area.x + 1 + label_width as u16 + app.cursor_column() as u16;
        let cursor_y = area.y + 1 + row;
        if cursor_x < area.x + area.width.saturating_sub(1) {
            frame.set_cursor_position((cursor_x, cursor_y));
        }
    }
}

/// Draw the status bar at the bottom
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let content = if app.is_posting {
        "Posting update...".to_string()
    } else if let Some(msg) = &app.status_message {
        msg.clone()
    } else {
        "Enter:post  Tab:next field  ↑/↓:scroll  Ctrl+R:reload  F1:help  Esc:quit".to_string()
    };

    let paragraph = Paragraph::new(content).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Draw realtime indicator in top-right corner
fn draw_realtime_indicator(frame: &mut Frame, app: &App) {
    let area = frame.area();
    if area.width < 5 {
        return;
    }

    let (icon, style) = match app.realtime {
        RealtimeIndicator::Live => ("✓", Style::default().fg(Color::Green)),
        RealtimeIndicator::Connecting => ("↻", Style::default().fg(Color::Yellow)),
        RealtimeIndicator::Offline => ("⚡", Style::default().fg(Color::DarkGray)),
        RealtimeIndicator::Disabled => ("○", Style::default().add_modifier(Modifier::DIM)),
        RealtimeIndicator::Error => ("✗", Style::default().fg(Color::Red)),
    };

    let indicator = Paragraph::new(Span::styled(icon, style));
    let indicator_area = Rect::new(area.width - 2, 0, 1, 1);
    frame.render_widget(indicator, indicator_area);
}

/// Centered popup area
fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    Rect::new(popup_x, popup_y, popup_width, popup_height)
}

/// Draw the validation alert
fn draw_alert(frame: &mut Frame, message: &str) {
    let area = popup_area(frame.area(), 50, 7);
    frame.render_widget(Clear, area);

    let text = vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to continue",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Alert ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD));

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// Draw help overlay
fn draw_help_overlay(frame: &mut Frame) {
    let area = popup_area(frame.area(), 50, 18);
    frame.render_widget(Clear, area);

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("Form:"),
        Line::from("  Tab         Next field"),
        Line::from("  Shift+Tab   Previous field"),
        Line::from("  ←/→         Move cursor"),
        Line::from("  Enter       Post update"),
        Line::from(""),
        Line::from("List:"),
        Line::from("  ↑/↓         Scroll"),
        Line::from("  PgUp/PgDn   Scroll by page"),
        Line::from("  Ctrl+R      Reload"),
        Line::from(""),
        Line::from("  Esc         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, area);
}
