use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use intake_core::MAX_BATCH_FILES;

use crate::app::App;
use crate::theme::Theme;
use crate::view::{fmt_size, spinner_char, truncate};

/// Render the upload Queue screen.
pub fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::vertical([
        Constraint::Length(1), // header
        Constraint::Min(5),    // table
        Constraint::Length(3), // upload progress
        Constraint::Length(1), // footer / notices
    ])
    .split(area);

    render_header(f, chunks[0], &app.theme);
    render_table(f, chunks[1], app);
    render_progress(f, chunks[2], app);
    render_footer(f, chunks[3], app);
}

fn render_header(f: &mut Frame, area: Rect, theme: &Theme) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" INTAKE ", theme.header_style()),
        Span::styled(
            " Upload Queue",
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        ),
    ]));
    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;

    let header = Row::new(["#", "File", "Size", "Type"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(theme.text).add_modifier(Modifier::BOLD))
    }))
    .height(1);

    let rows: Vec<Row> = app
        .queue
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let name = truncate(&entry.name, (area.width as usize).saturating_sub(32));
            Row::new(vec![
                Cell::from(format!("{}", idx + 1)),
                Cell::from(name),
                Cell::from(fmt_size(entry.size)),
                Cell::from(entry.mime).style(Style::default().fg(theme.dim)),
            ])
        })
        .collect();

    let widths = vec![
        Constraint::Length(4),
        Constraint::Min(20),
        Constraint::Length(10),
        Constraint::Min(16),
    ];

    let table = Table::new(rows, &widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style())
                .title(format!(" {}/{} queued ", app.queue.len(), MAX_BATCH_FILES)),
        )
        .row_highlight_style(theme.highlight_style());

    let mut state = TableState::default();
    state.select(Some(app.queue_cursor));
    f.render_stateful_widget(table, area, &mut state);
}

fn render_progress(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;

    let label = if app.is_processing {
        format!(
            "{} uploading... {}%",
            spinner_char(app.tick),
            app.progress_percent
        )
    } else {
        "idle".to_string()
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style()),
        )
        .gauge_style(Style::default().fg(theme.active))
        .ratio(f64::from(app.progress_percent) / 100.0)
        .label(label);

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
        if app.is_processing {
            " c:cancel  Tab:results  ?:help  q:quit"
        } else {
            " u:upload  x:remove  j/k:nav  Tab:results  ?:help  q:quit"
        },
        theme.footer_style(),
    ));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
