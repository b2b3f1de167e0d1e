//! Frame drawing and screen layout.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Cell, Paragraph, Row, Table, Wrap};
use recordlens_lib::sink::StatusLevel;

use crate::app::{App, Screen};
use crate::sink::{ImagePanelView, MetadataPanelView, UiState};

/// Screen regions, shared between drawing and mouse hit-testing.
pub(crate) struct AppLayout {
    /// Record list block, borders included.
    pub list: Rect,
    /// Rows inside the list block; one row per window slot.
    pub list_inner: Rect,
    /// Scrollbar track column.
    pub track: Rect,
    /// Image detail panel.
    pub image: Rect,
    /// Metadata detail panel.
    pub metadata: Rect,
    /// Status bar line.
    pub status: Rect,
}

pub(crate) fn compute_layout(area: Rect) -> AppLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(1),
            Constraint::Min(20),
        ])
        .split(rows[0]);
    let panels = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Min(5)])
        .split(columns[2]);

    let list = columns[0];
    let list_inner = Block::bordered().inner(list);

    AppLayout {
        list,
        list_inner,
        track: Rect {
            x: columns[1].x,
            y: list_inner.y,
            width: columns[1].width,
            height: list_inner.height,
        },
        image: panels[0],
        metadata: panels[1],
        status: rows[1],
    }
}

pub(crate) fn draw(f: &mut Frame, app: &App) {
    match app.screen {
        Screen::PathInput => draw_path_input(f, app),
        Screen::Viewer => draw_viewer(f, app),
    }
}

fn draw_path_input(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Length(6),
            Constraint::Min(0),
        ])
        .split(f.area());

    let mut lines = vec![
        Line::styled(
            "Collection path:",
            Style::default().add_modifier(Modifier::DIM),
        ),
        Line::from(format!("> {}█", app.input)),
        Line::from(""),
    ];
    let state = app.state.lock().expect("ui state poisoned");
    match &state.status {
        Some((level, message)) => lines.push(Line::styled(message.clone(), status_style(*level))),
        None => lines.push(Line::styled(
            "Enter to load, Esc to quit",
            Style::default().add_modifier(Modifier::DIM),
        )),
    }

    let block = Block::bordered().title("recordlens");
    f.render_widget(Paragraph::new(lines).block(block), rows[1]);
}

fn draw_viewer(f: &mut Frame, app: &App) {
    let layout = compute_layout(f.area());
    let state = app.state.lock().expect("ui state poisoned");

    draw_list(f, &layout, &state);
    draw_track(f, &layout, &state);
    draw_image_panel(f, layout.image, &state.image);
    draw_metadata_panel(f, layout.metadata, &state.metadata);
    draw_status_bar(f, layout.status, &state);
}

fn draw_list(f: &mut Frame, layout: &AppLayout, state: &UiState) {
    let window = &state.window;
    let title = match window.end() {
        Some(end) => format!(
            "Records {}-{} of {}",
            window.start, end, window.total_records
        ),
        None => "Records".to_string(),
    };

    let dim = Style::default().add_modifier(Modifier::DIM);
    let lines: Vec<Line> = if window.is_empty() {
        vec![Line::styled("No records", dim)]
    } else if !window.has_data() {
        vec![Line::styled("Loading...", dim)]
    } else {
        window
            .entries()
            .map(|(index, slot)| match slot {
                Some(record) => {
                    let style = if window.selected_key.as_deref() == Some(record.key()) {
                        Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
                    } else {
                        Style::default()
                    };
                    Line::styled(format!(" {index:>7}  {}", record.key()), style)
                }
                None => Line::styled(format!(" {index:>7}  ..."), dim),
            })
            .collect()
    };

    f.render_widget(
        Paragraph::new(lines).block(Block::bordered().title(title)),
        layout.list,
    );
}

fn draw_track(f: &mut Frame, layout: &AppLayout, state: &UiState) {
    let track = layout.track;
    if track.height == 0 {
        return;
    }

    let (top, height) = match state.thumb {
        Some(thumb) => {
            let height = (thumb.height_px.round().max(1.0) as u16).min(track.height);
            let top = (thumb.top_px.round() as u16).min(track.height - height);
            (top, height)
        }
        None => (0, track.height),
    };

    let lines: Vec<Line> = (0..track.height)
        .map(|row| {
            if row >= top && row < top + height {
                Line::from("█")
            } else {
                Line::styled("│", Style::default().add_modifier(Modifier::DIM))
            }
        })
        .collect();

    f.render_widget(Paragraph::new(lines), track);
}

fn draw_image_panel(f: &mut Frame, area: Rect, view: &ImagePanelView) {
    let dim = Style::default().add_modifier(Modifier::DIM);
    let lines = match view {
        ImagePanelView::Empty => vec![Line::styled("Select a record", dim)],
        ImagePanelView::Loading => vec![Line::from("Loading image...")],
        ImagePanelView::Failed(message) => vec![Line::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        )],
        ImagePanelView::Ready {
            key,
            source_file,
            fetch_time_ms,
            encoded_len,
            decoded_len,
        } => vec![
            Line::styled(key.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Line::from(format!("Fetch time: {fetch_time_ms:.1} ms")),
            Line::from(match decoded_len {
                Some(len) => format!("Size: {len} bytes"),
                None => "Size: (invalid payload)".to_string(),
            }),
            Line::from(format!("Encoded: {encoded_len} bytes")),
            Line::from(format!("Source: {source_file}")),
        ],
    };

    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::bordered().title("Image")),
        area,
    );
}

fn draw_metadata_panel(f: &mut Frame, area: Rect, view: &MetadataPanelView) {
    let block = Block::bordered().title("Metadata");
    let dim = Style::default().add_modifier(Modifier::DIM);

    match view {
        MetadataPanelView::Ready(rows) => {
            let table_rows: Vec<Row> = rows
                .iter()
                .map(|(field, value)| {
                    Row::new(vec![
                        Cell::from(field.clone()).style(dim),
                        Cell::from(value.clone()),
                    ])
                })
                .collect();
            let table = Table::new(
                table_rows,
                [Constraint::Percentage(35), Constraint::Percentage(65)],
            )
            .block(block);
            f.render_widget(table, area);
        }
        MetadataPanelView::Empty => {
            f.render_widget(
                Paragraph::new(Line::styled("Select a record", dim)).block(block),
                area,
            );
        }
        MetadataPanelView::Loading => {
            f.render_widget(
                Paragraph::new(Line::from("Loading metadata...")).block(block),
                area,
            );
        }
        MetadataPanelView::Failed(message) => {
            f.render_widget(
                Paragraph::new(Line::styled(
                    message.clone(),
                    Style::default().fg(Color::Red),
                ))
                .wrap(Wrap { trim: false })
                .block(block),
                area,
            );
        }
    }
}

fn draw_status_bar(f: &mut Frame, area: Rect, state: &UiState) {
    if let Some((level, message)) = &state.status {
        f.render_widget(
            Paragraph::new(Line::styled(message.clone(), status_style(*level))),
            area,
        );
    }
    if let Some(stats) = &state.stats {
        let text = format!(
            "{} records, {} files",
            stats.formatted_total(),
            stats.formatted_locations()
        );
        f.render_widget(
            Paragraph::new(Line::from(text)).alignment(Alignment::Right),
            area,
        );
    }
}

fn status_style(level: StatusLevel) -> Style {
    match level {
        StatusLevel::Loading => Style::default().fg(Color::Yellow),
        StatusLevel::Success => Style::default().fg(Color::Green),
        StatusLevel::Error => Style::default().fg(Color::Red),
    }
}
