use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use intake_core::FileStatus;

use crate::app::App;
use crate::model::record::{field_or_na, flatten_json};
use crate::theme::Theme;
use crate::view::truncate;

/// Render the detail screen for one file result.
pub fn render(f: &mut Frame, app: &App, result_index: usize) {
    let theme = &app.theme;
    let area = f.area();

    let Some(result) = app
        .report
        .as_ref()
        .and_then(|r| r.results.get(result_index))
    else {
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(1), // breadcrumb
        Constraint::Min(5),    // scrollable content
        Constraint::Length(1), // footer
    ])
    .split(area);

    // --- Breadcrumb ---
    let breadcrumb = Line::from(vec![
        Span::styled(" INTAKE ", theme.header_style()),
        Span::styled(" > ", Style::default().fg(theme.dim)),
        Span::styled("results", Style::default().fg(theme.text)),
        Span::styled(" > ", Style::default().fg(theme.dim)),
        Span::styled(
            truncate(&result.filename, 48),
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        ),
    ]);
    f.render_widget(Paragraph::new(breadcrumb), chunks[0]);

    // --- Content ---
    let mut lines: Vec<Line> = Vec::new();

    section_header(&mut lines, "FILE", theme);
    labeled_line(&mut lines, "Name", &result.filename, theme);
    labeled_line(
        &mut lines,
        "Type",
        field_or_na(result.file_type.as_deref()),
        theme,
    );
    let time = result
        .processing_time
        .map(|t| format!("{t:.2}s"))
        .unwrap_or_else(|| "N/A".to_string());
    labeled_line(&mut lines, "Processing", &time, theme);

    let status_text = match result.status {
        FileStatus::Success => "Parsed",
        FileStatus::Failed => "Failed",
    };
    let status_color = theme.status_color(&result.status);
    lines.push(Line::from(vec![
        Span::styled("  Status:         ", Style::default().fg(theme.dim)),
        Span::styled(
            status_text,
            Style::default()
                .fg(status_color)
                .add_modifier(Modifier::BOLD),
        ),
    ]));

    match result.status {
        FileStatus::Failed => {
            lines.push(Line::from(""));
            section_header(&mut lines, "ERROR", theme);
            lines.push(Line::from(Span::styled(
                format!("  {}", result.error.as_deref().unwrap_or("unknown error")),
                Style::default().fg(theme.failed),
            )));
            lines.push(Line::from(""));
            let hint = if app.tracked.iter().any(|n| *n == result.filename) {
                "  Press r on the results screen to resubmit this file."
            } else {
                "  Original file no longer available; re-upload it manually."
            };
            lines.push(Line::from(Span::styled(
                hint,
                Style::default().fg(theme.dim),
            )));
        }
        FileStatus::Success => {
            lines.push(Line::from(""));
            section_header(&mut lines, "PARSED DATA", theme);
            match &result.parsed_data {
                Some(value) => {
                    let mut fields = Vec::new();
                    flatten_json(value, &mut fields);
                    for (label, text) in fields {
                        labeled_line(&mut lines, &label, &text, theme);
                    }
                }
                None => lines.push(Line::from(Span::styled(
                    "  No structured data returned.",
                    Style::default().fg(theme.dim),
                ))),
            }
        }
    }

    let content = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style()),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));

    f.render_widget(content, chunks[1]);

    render_footer(f, chunks[2], theme);
}

fn section_header<'a>(lines: &mut Vec<Line<'a>>, title: &'a str, theme: &Theme) {
    lines.push(Line::from(Span::styled(
        format!("  {title}"),
        Style::default()
            .fg(theme.active)
            .add_modifier(Modifier::BOLD),
    )));
}

fn labeled_line<'a>(lines: &mut Vec<Line<'a>>, label: &str, value: &str, theme: &Theme) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {label:<15} "), Style::default().fg(theme.dim)),
        Span::styled(value.to_string(), Style::default().fg(theme.text)),
    ]));
}

fn render_footer(f: &mut Frame, area: Rect, theme: &Theme) {
    let footer = Line::from(Span::styled(
        " j/k:scroll  Esc:back  ?:help  q:quit",
        theme.footer_style(),
    ));
    f.render_widget(Paragraph::new(footer), area);
}
