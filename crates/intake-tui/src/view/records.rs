use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;

use crate::app::{App, RecordsState};
use crate::model::record::{field_or_na, flatten_json, summary_fields};
use crate::theme::Theme;
use crate::view::{spinner_char, truncate};

/// Render the persisted-records list screen.
pub fn render(f: &mut Frame, app: &App) {
    let theme = &app.theme;
    let area = f.area();

    let chunks = Layout::vertical([
        Constraint::Length(1), // header
        Constraint::Min(5),    // table
        Constraint::Length(1), // footer
    ])
    .split(area);

    render_header(f, chunks[0], app);
    render_table(f, chunks[1], app);
    render_footer(f, chunks[2], theme, app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let mut spans = vec![
        Span::styled(" INTAKE ", theme.header_style()),
        Span::styled(
            " Parsed Resumes",
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        ),
    ];
    match &app.records_state {
        RecordsState::Loading => spans.push(Span::styled(
            format!("  {} loading...", spinner_char(app.tick)),
            Style::default().fg(theme.active),
        )),
        RecordsState::Error(message) => spans.push(Span::styled(
            format!("  fetch failed: {message}"),
            Style::default().fg(theme.failed),
        )),
        RecordsState::Idle | RecordsState::Loaded => {}
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_table(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let wide = area.width >= 110;

    let header_cells = if wide {
        vec!["ID", "File", "Candidate", "Email", "Experience", "Created"]
    } else {
        vec!["ID", "File", "Candidate", "Email"]
    };
    let header = Row::new(header_cells.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(theme.text).add_modifier(Modifier::BOLD))
    }))
    .height(1);

    let rows: Vec<Row> = app
        .records
        .iter()
        .map(|record| {
            let [file, candidate, email, experience, created] = summary_fields(record);
            let mut cells = vec![
                Cell::from(format!("{}", record.id)),
                Cell::from(truncate(&file, 24)),
                Cell::from(truncate(&candidate, 22)),
                Cell::from(truncate(&email, 26)),
            ];
            if wide {
                cells.push(Cell::from(truncate(&experience, 12)));
                cells.push(Cell::from(created).style(Style::default().fg(theme.dim)));
            }
            Row::new(cells)
        })
        .collect();

    let widths = if wide {
        vec![
            Constraint::Length(6),
            Constraint::Min(18),
            Constraint::Min(16),
            Constraint::Min(20),
            Constraint::Length(12),
            Constraint::Min(16),
        ]
    } else {
        vec![
            Constraint::Length(6),
            Constraint::Min(16),
            Constraint::Min(14),
            Constraint::Min(18),
        ]
    };

    let table = Table::new(rows, &widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style())
                .title(format!(" {} record(s) ", app.records.len())),
        )
        .row_highlight_style(theme.highlight_style());

    let mut state = TableState::default();
    state.select(Some(app.records_cursor));
    f.render_stateful_widget(table, area, &mut state);
}

fn render_footer(f: &mut Frame, area: Rect, theme: &Theme, app: &App) {
    let mut spans = Vec::new();
    if let Some((level, message)) = &app.notice {
        spans.push(Span::styled(
            format!(" {message} "),
            Style::default().fg(theme.notice_color(level)),
        ));
        spans.push(Span::styled("| ", Style::default().fg(theme.dim)));
    }
    spans.push(Span::styled(
        " f:refresh  d:delete  Enter:detail  Tab:queue  Esc:back  q:quit",
        theme.footer_style(),
    ));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the detail screen for one persisted record.
pub fn render_detail(f: &mut Frame, app: &App, record_index: usize) {
    let theme = &app.theme;
    let area = f.area();

    let Some(record) = app.records.get(record_index) else {
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(1), // breadcrumb
        Constraint::Min(5),    // scrollable content
        Constraint::Length(1), // footer
    ])
    .split(area);

    let file = field_or_na(record.filename.as_deref());
    let breadcrumb = Line::from(vec![
        Span::styled(" INTAKE ", theme.header_style()),
        Span::styled(" > ", Style::default().fg(theme.dim)),
        Span::styled("records", Style::default().fg(theme.text)),
        Span::styled(" > ", Style::default().fg(theme.dim)),
        Span::styled(
            format!("#{} {}", record.id, truncate(file, 40)),
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        ),
    ]);
    f.render_widget(Paragraph::new(breadcrumb), chunks[0]);

    let mut lines: Vec<Line> = Vec::new();

    section_header(&mut lines, "CANDIDATE", theme);
    labeled_line(
        &mut lines,
        "Name",
        field_or_na(record.candidate_name.as_deref()),
        theme,
    );
    labeled_line(
        &mut lines,
        "Email",
        field_or_na(record.candidate_email.as_deref()),
        theme,
    );
    labeled_line(
        &mut lines,
        "Experience",
        field_or_na(record.total_experience.as_deref()),
        theme,
    );

    lines.push(Line::from(""));
    section_header(&mut lines, "FILE", theme);
    labeled_line(&mut lines, "Name", file, theme);
    labeled_line(
        &mut lines,
        "Type",
        field_or_na(record.file_type.as_deref()),
        theme,
    );
    labeled_line(
        &mut lines,
        "Created",
        field_or_na(record.created_at.as_deref()),
        theme,
    );

    lines.push(Line::from(""));
    section_header(&mut lines, "PARSED DATA", theme);
    match record.parsed_json() {
        Some(value) => {
            let mut fields = Vec::new();
            flatten_json(&value, &mut fields);
            for (label, text) in fields {
                labeled_line(&mut lines, &label, &text, theme);
            }
        }
        None => lines.push(Line::from(Span::styled(
            "  No structured data stored.",
            Style::default().fg(theme.dim),
        ))),
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

    let footer = Line::from(Span::styled(
        " j/k:scroll  Esc:back  ?:help  q:quit",
        theme.footer_style(),
    ));
    f.render_widget(Paragraph::new(footer), chunks[2]);
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
