use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState,
    },
};

use crate::domain::HELP_TEXT;
use crate::model::{Model, View};
use crate::theme::Palette;
use crate::view::{self, HeaderCell, NO_DATA_TEXT, TableRender};

const SIDEBAR_WIDTH: u16 = 22;
const MIN_COLUMN_WIDTH: usize = 4;

/// Draws the dashboard. Only keeps scroll state between frames.
#[derive(Debug, Default)]
pub struct TableUI {
    table_state: TableState,
    nav_state: ListState,
    column_offset: usize,
}

impl TableUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let palette = model.theme().palette();
        frame.render_widget(Block::default().style(palette.base()), frame.area());

        let error_height = u16::from(model.error().is_some());
        let [title_area, error_area, body_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(error_height),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        self.draw_title(model, &palette, frame, title_area);
        if let Some(error) = model.error() {
            frame.render_widget(
                Paragraph::new(format!("Error: {error}")).style(palette.error()),
                error_area,
            );
        }

        let content_area = if model.show_sidebar() {
            let [sidebar, content] =
                Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
                    .areas(body_area);
            self.draw_sidebar(model, &palette, frame, sidebar);
            content
        } else {
            body_area
        };

        match model.view() {
            View::Stats => draw_stats(model, &palette, frame, content_area),
            View::Table => self.draw_explorer(model, &palette, frame, content_area),
        }

        frame.render_widget(
            Paragraph::new(model.status_message()).style(palette.dim()),
            status_area,
        );

        if model.show_help() {
            draw_help(&palette, frame);
        }
    }

    fn draw_title(&self, model: &Model, palette: &Palette, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(" filmdash ", palette.title())];
        if model.is_loading() {
            spans.push(Span::styled("loading ...", palette.dim()));
        }
        frame.render_widget(Line::from(spans), area);
        frame.render_widget(
            Line::from(Span::styled(
                format!("theme: {} | ? help ", model.theme().id()),
                palette.dim(),
            ))
            .right_aligned(),
            area,
        );
    }

    fn draw_sidebar(&mut self, model: &Model, palette: &Palette, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = model
            .nav()
            .iter()
            .enumerate()
            .map(|(idx, entry)| ListItem::new(format!("{} {}", idx + 1, entry.label)))
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.border))
                    .title("Views"),
            )
            .highlight_style(palette.selected())
            .highlight_symbol("> ");
        self.nav_state.select(Some(model.selected_nav()));
        frame.render_stateful_widget(list, area, &mut self.nav_state);
    }

    fn draw_explorer(&mut self, model: &Model, palette: &Palette, frame: &mut Frame, area: Rect) {
        let [controls_area, table_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(area);
        self.draw_controls(model, palette, frame, controls_area);

        let title = model
            .explorer()
            .dataset()
            .map(|id| id.label())
            .unwrap_or_default();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(Span::styled(title, palette.title()));

        match model.explorer().rendered() {
            TableRender::Empty => {
                frame.render_widget(
                    Paragraph::new(NO_DATA_TEXT)
                        .style(palette.dim())
                        .centered()
                        .block(block),
                    table_area,
                );
            }
            TableRender::Table { headers, rows } => {
                let inner_width = table_area.width.saturating_sub(2) as usize;
                let widths = column_widths(headers, rows, model.max_column_width());
                let (cursor_row, cursor_column) = model.cursor();
                let visible = self.visible_columns(&widths, cursor_column, inner_width);

                let header = Row::new(visible.clone().map(|idx| {
                    let h = &headers[idx];
                    let style = if h.indicator.is_active() {
                        palette.title()
                    } else {
                        Style::default().add_modifier(Modifier::BOLD)
                    };
                    Cell::from(format!("{} {}", h.name, h.indicator.glyph())).style(style)
                }));

                let body = rows.iter().enumerate().map(|(row_idx, row)| {
                    Row::new(visible.clone().map(|idx| {
                        let cell = &row[idx];
                        let style = match cell {
                            view::Cell::Link { .. } => palette.link(),
                            view::Cell::Text(_) => Style::default(),
                        };
                        let text = match cell {
                            view::Cell::Link { text, .. } => format!("{text} ↗"),
                            view::Cell::Text(text) => text.clone(),
                        };
                        let style = if row_idx == cursor_row && idx == cursor_column {
                            style.patch(palette.selected())
                        } else {
                            style
                        };
                        Cell::from(text).style(style)
                    }))
                });

                let constraints = visible
                    .clone()
                    .map(|idx| Constraint::Length(widths[idx] as u16));
                let table = Table::new(body, constraints)
                    .header(header)
                    .block(block)
                    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

                self.table_state.select(Some(cursor_row));
                frame.render_stateful_widget(table, table_area, &mut self.table_state);
            }
        }
    }

    fn draw_controls(&self, model: &Model, palette: &Palette, frame: &mut Frame, area: Rect) {
        let explorer = model.explorer();
        let input = model.search_input();
        let scope = explorer
            .query()
            .scope_column
            .as_deref()
            .unwrap_or("All Columns");
        let prefix = "Search: ";
        let line = Line::from(vec![
            Span::styled(prefix, palette.dim()),
            Span::raw(format!("{:<20}", explorer.query().search_term)),
            Span::styled("  Scope: ", palette.dim()),
            Span::raw(scope.to_string()),
            Span::styled(
                format!(
                    "  {}/{} rows",
                    explorer.rendered().row_count(),
                    explorer.current_data().len()
                ),
                palette.dim(),
            ),
        ]);
        frame.render_widget(line, area);

        if model.raw_keyevents() {
            let x = area.x + (prefix.len() + input.cursor_pos) as u16;
            frame.set_cursor_position(Position::new(x.min(area.right()), area.y));
        }
    }

    /// Scrolls horizontally so `cursor` is visible and returns the range of
    /// columns that fit into `width`.
    fn visible_columns(
        &mut self,
        widths: &[usize],
        cursor: usize,
        width: usize,
    ) -> std::ops::Range<usize> {
        let cursor = cursor.min(widths.len().saturating_sub(1));
        if cursor < self.column_offset {
            self.column_offset = cursor;
        }
        // Column spacing is one character.
        let span = |from: usize, to: usize| widths[from..=to].iter().map(|w| w + 1).sum::<usize>();
        while self.column_offset < cursor && span(self.column_offset, cursor) > width {
            self.column_offset += 1;
        }
        self.column_offset = self.column_offset.min(widths.len().saturating_sub(1));

        let mut end = self.column_offset;
        let mut used = 0;
        while end < widths.len() && (end == self.column_offset || used + widths[end] + 1 <= width) {
            used += widths[end] + 1;
            end += 1;
        }
        self.column_offset..end
    }
}

/// Widest of header and cell texts per column, capped at `max_width`.
fn column_widths(headers: &[HeaderCell], rows: &[Vec<view::Cell>], max_width: usize) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, h)| {
            let header = h.name.chars().count() + 2;
            let content = rows
                .iter()
                .map(|row| {
                    let cell = &row[idx];
                    let extra = if matches!(cell, view::Cell::Link { .. }) { 2 } else { 0 };
                    cell.text().chars().count() + extra
                })
                .max()
                .unwrap_or(0);
            header.max(content).clamp(MIN_COLUMN_WIDTH, max_width.max(MIN_COLUMN_WIDTH))
        })
        .collect()
}

fn draw_stats(model: &Model, palette: &Palette, frame: &mut Frame, area: Rect) {
    let lines: Vec<Line> = model
        .stats()
        .entries()
        .into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!("{label:<16}"), palette.dim()),
                Span::styled(value.unwrap_or("-").to_string(), palette.title()),
            ])
        })
        .collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(Span::styled("Statistics", palette.title()));
    frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
}

fn draw_help(palette: &Palette, frame: &mut Frame) {
    let area = popup_area(frame.area(), 60, 80);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(Span::styled("Help", palette.title()));
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(HELP_TEXT).style(palette.base()).block(block),
        area,
    );
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DashConfig, Message};
    use crate::prefs::tests::MemoryPreferences;
    use crate::record::Record;
    use crate::tasks::Task;
    use ratatui::{Terminal, backend::TestBackend};

    fn screen(model: &Model) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        let mut ui = TableUI::new();
        terminal.draw(|f| ui.draw(model, f)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn model() -> Model {
        Model::init(&DashConfig::default(), Box::new(MemoryPreferences::default()))
    }

    #[test]
    fn stats_view_shows_unset_slots() {
        let text = screen(&model());
        assert!(text.contains("Films watched"));
        assert!(text.contains("Watchlist"));
        assert!(text.contains("Stats"));
    }

    #[test]
    fn table_view_shows_links_and_placeholder() {
        let mut model = model();
        let Some(Task::LoadDataset { ticket, id }) = model.update(Message::SelectView(1)) else {
            panic!("expected a load task");
        };
        let mut film = Record::new();
        film.insert("Name".into(), "Heat".into());
        film.insert("Letterboxd URI".into(), "https://boxd.it/1".into());
        model.update(Message::DatasetLoaded {
            ticket,
            id,
            result: Ok(vec![film]),
        });

        let text = screen(&model);
        assert!(text.contains("Heat ↗"));
        assert!(text.contains("Name ↕"));
        assert!(text.contains("All Columns"));

        model.update(Message::Search);
        for c in "zzz".chars() {
            model.update(Message::RawKey(crossterm::event::KeyEvent::new(
                crossterm::event::KeyCode::Char(c),
                crossterm::event::KeyModifiers::NONE,
            )));
        }
        assert!(screen(&model).contains(NO_DATA_TEXT));
    }

    #[test]
    fn horizontal_scroll_follows_cursor() {
        let mut ui = TableUI::new();
        let widths = [10, 10, 10, 10];
        assert_eq!(ui.visible_columns(&widths, 0, 25), 0..2);
        assert_eq!(ui.visible_columns(&widths, 3, 25), 2..4);
        assert_eq!(ui.visible_columns(&widths, 1, 25), 1..3);
    }
}
