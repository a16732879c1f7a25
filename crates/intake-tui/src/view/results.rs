use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use crate::app::App;
use crate::model::file::RowPhase;
use crate::theme::Theme;
use crate::view::{spinner_char, truncate};

/// Render the Results screen: aggregate counters plus the per-file table.
pub fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    let mut constraints = vec![
        Constraint::Length(1), // header
        Constraint::Length(1), // counters
        Constraint::Min(5),    // table
    ];
    if app.is_processing {
        constraints.push(Constraint::Length(3)); // retry progress
    }
    constraints.push(Constraint::Length(1)); // footer

    let chunks = Layout::vertical(constraints).split(area);

    render_header(f, chunks[0], &app.theme);
    render_counters(f, chunks[1], app);
    render_table(f, chunks[2], app);

    let footer_chunk = if app.is_processing {
        render_progress(f, chunks[3], app);
        chunks[4]
    } else {
        chunks[3]
    };
    render_footer(f, footer_chunk, app);
}

fn render_header(f: &mut Frame, area: Rect, theme: &Theme) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" INTAKE ", theme.header_style()),
        Span::styled(
            " Batch Results",
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        ),
    ]));
    f.render_widget(header, area);
}

fn render_counters(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let counters = &app.counters;

    let line = Line::from(vec![
        Span::styled(
            format!(" {} files ", counters.total),
            Style::default().fg(theme.text),
        ),
        Span::styled(
            format!("OK:{} ", counters.success),
            Style::default().fg(theme.success),
        ),
        Span::styled(
            format!("Failed:{} ", counters.failed),
            Style::default().fg(theme.failed),
        ),
        Span::styled(
            format!("Retryable:{} ", app.tracked.len()),
            Style::default().fg(theme.retrying),
        ),
        Span::styled(
            format!("| {:.2}s server time", counters.processing_time),
            Style::default().fg(theme.dim),
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_table(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let wide = area.width >= 90;

    let header_cells = if wide {
        vec!["#", "File", "Status", "Type", "Detail"]
    } else {
        vec!["#", "File", "Status", "Detail"]
    };
    let header = Row::new(header_cells.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(theme.text).add_modifier(Modifier::BOLD))
    }))
    .height(1);

    let rows: Vec<Row> = app
        .results_sorted
        .iter()
        .enumerate()
        .map(|(display_idx, &row_idx)| {
            let row = &app.results[row_idx];
            let phase_style = Style::default().fg(theme.phase_color(&row.phase));

            let status_text = match row.phase {
                RowPhase::Retrying => {
                    format!("{} {}", spinner_char(app.tick), row.phase.label())
                }
                _ => row.phase.label().to_string(),
            };

            let name = truncate(&row.filename, (area.width as usize).saturating_sub(44));
            let detail = truncate(&row.detail_label(), 40);

            let mut cells = vec![
                Cell::from(format!("{}", display_idx + 1)),
                Cell::from(name),
                Cell::from(status_text).style(phase_style.add_modifier(Modifier::BOLD)),
            ];
            if wide {
                cells.push(
                    Cell::from(row.file_type.clone().unwrap_or_else(|| "—".into()))
                        .style(Style::default().fg(theme.dim)),
                );
            }
            cells.push(Cell::from(detail).style(Style::default().fg(theme.dim)));

            Row::new(cells)
        })
        .collect();

    let widths = if wide {
        vec![
            Constraint::Length(4),
            Constraint::Min(20),
            Constraint::Length(14),
            Constraint::Length(8),
            Constraint::Min(20),
        ]
    } else {
        vec![
            Constraint::Length(4),
            Constraint::Min(16),
            Constraint::Length(14),
            Constraint::Min(16),
        ]
    };

    let table = Table::new(rows, &widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style())
                .title(format!(" Sort: {} (s) ", app.sort_order.label())),
        )
        .row_highlight_style(theme.highlight_style());

    let mut state = TableState::default();
    state.select(Some(app.results_cursor));
    f.render_stateful_widget(table, area, &mut state);
}

fn render_progress(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style()),
        )
        .gauge_style(Style::default().fg(theme.retrying))
        .ratio(f64::from(app.progress_percent) / 100.0)
        .label(format!(
            "{} resubmitting... {}%",
            spinner_char(app.tick),
            app.progress_percent
        ));
    f.render_widget(gauge, area);
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;

    let mut spans = Vec::new();
    if let Some((level, message)) = &app.notice {
        spans.push(Span::styled(
            format!(" {message} "),
            Style::default().fg(theme.notice_color(level)),
        ));
        spans.push(Span::styled("| ", Style::default().fg(theme.dim)));
    }
    spans.push(Span::styled(
        " r:retry-failed  w:save-report  s:sort  Enter:detail  Tab:records  Esc:back  q:quit",
        theme.footer_style(),
    ));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
