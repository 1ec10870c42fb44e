//! Pure table view model.
//!
//! `render` turns a list of records and the current sort state into header
//! and body cells. The terminal UI and the HTML export only present what
//! this module computes.

use std::fmt::Write;

use crate::record::{Record, cell, columns_of};

pub const NO_DATA_TEXT: &str = "No data available";

const LINK_PATTERNS: [&str; 3] = ["uri", "url", "link"];
const TITLE_PATTERNS: [&str; 4] = ["name", "title", "film", "movie"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// `column == None` means unsorted: insertion order since load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortState {
    pub column: Option<String>,
    pub order: SortOrder,
}

impl SortState {
    pub fn indicator(&self, column: &str) -> SortIndicator {
        match (&self.column, self.order) {
            (Some(c), SortOrder::Ascending) if c == column => SortIndicator::Ascending,
            (Some(c), SortOrder::Descending) if c == column => SortIndicator::Descending,
            _ => SortIndicator::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortIndicator {
    Ascending,
    Descending,
    Neutral,
}

impl SortIndicator {
    pub fn glyph(self) -> &'static str {
        match self {
            SortIndicator::Ascending => "↑",
            SortIndicator::Descending => "↓",
            SortIndicator::Neutral => "↕",
        }
    }

    pub fn is_active(self) -> bool {
        self != SortIndicator::Neutral
    }
}

/// Columns that get special treatment when rendering a row.
///
/// Detection is a name heuristic: the link column is the first column whose
/// lowercase name contains `uri`, `url` or `link`; the title column is the
/// first containing `name`, `title`, `film` or `movie`. A column such as
/// `Movie Link` therefore qualifies for both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleColumns {
    pub link_column: Option<String>,
    pub title_column: Option<String>,
}

pub fn detect_role_columns<S: AsRef<str>>(columns: &[S]) -> RoleColumns {
    let first_matching = |patterns: &[&str]| {
        columns
            .iter()
            .map(|c| c.as_ref())
            .find(|c| {
                let lower = c.to_lowercase();
                patterns.iter().any(|p| lower.contains(p))
            })
            .map(str::to_string)
    };
    RoleColumns {
        link_column: first_matching(&LINK_PATTERNS),
        title_column: first_matching(&TITLE_PATTERNS),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub name: String,
    pub indicator: SortIndicator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    /// Opens `href` in a new context when activated.
    Link { text: String, href: String },
}

impl Cell {
    pub fn text(&self) -> &str {
        match self {
            Cell::Text(text) | Cell::Link { text, .. } => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TableRender {
    /// Nothing to show, rendered as the "no data" placeholder.
    #[default]
    Empty,
    Table {
        headers: Vec<HeaderCell>,
        rows: Vec<Vec<Cell>>,
    },
}

pub fn render(records: &[&Record], sort: &SortState) -> TableRender {
    let columns = columns_of(records.iter().copied());
    if records.is_empty() {
        return TableRender::Empty;
    }

    let roles = detect_role_columns(&columns);
    let headers = columns
        .iter()
        .map(|name| HeaderCell {
            name: name.clone(),
            indicator: sort.indicator(name),
        })
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            let href = roles
                .link_column
                .as_deref()
                .map(|c| cell(record, c))
                .filter(|v| !v.is_empty());

            columns
                .iter()
                .map(|column| {
                    let text = cell(record, column).to_string();
                    match href {
                        Some(href) if roles.title_column.as_deref() == Some(column.as_str()) => {
                            Cell::Link {
                                text,
                                href: href.to_string(),
                            }
                        }
                        _ => Cell::Text(text),
                    }
                })
                .collect()
        })
        .collect();

    TableRender::Table { headers, rows }
}

impl TableRender {
    pub fn headers(&self) -> &[HeaderCell] {
        match self {
            TableRender::Empty => &[],
            TableRender::Table { headers, .. } => headers,
        }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        match self {
            TableRender::Empty => &[],
            TableRender::Table { rows, .. } => rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows().len()
    }

    pub fn to_html(&self) -> String {
        let (headers, rows) = match self {
            TableRender::Empty => {
                return format!("<div class=\"no-data\">{NO_DATA_TEXT}</div>\n");
            }
            TableRender::Table { headers, rows } => (headers, rows),
        };

        let mut html = String::from("<table>\n<thead>\n<tr>");
        for header in headers {
            let active = if header.indicator.is_active() {
                " active"
            } else {
                ""
            };
            let _ = write!(
                html,
                "<th>{} <span class=\"sort-arrow{active}\">{}</span></th>",
                escape_html(&header.name),
                header.indicator.glyph()
            );
        }
        html.push_str("</tr>\n</thead>\n<tbody>\n");

        for row in rows {
            html.push_str("<tr>");
            for cell in row {
                match cell {
                    Cell::Text(text) => {
                        let _ = write!(html, "<td>{}</td>", escape_html(text));
                    }
                    Cell::Link { text, href } => {
                        let _ = write!(
                            html,
                            "<td><a href=\"{}\" target=\"_blank\" rel=\"noopener\" class=\"movie-link\">{} <span class=\"external-icon\">↗</span></a></td>",
                            escape_html(href),
                            escape_html(text)
                        );
                    }
                }
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>\n");
        html
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn watched() -> Vec<Record> {
        vec![
            record(&[
                ("Date", "2024-01-01"),
                ("Name", "Heat"),
                ("Year", "1995"),
                ("Letterboxd URI", "https://boxd.it/heat"),
            ]),
            record(&[
                ("Date", "2024-01-02"),
                ("Name", "Alien"),
                ("Year", "1979"),
                ("Letterboxd URI", ""),
            ]),
            record(&[("Date", "2024-01-03"), ("Name", "Ran"), ("Year", "1985")]),
        ]
    }

    #[test]
    fn one_header_per_column_in_first_record_order() {
        let data = watched();
        let refs: Vec<&Record> = data.iter().collect();
        let table = render(&refs, &SortState::default());

        let names: Vec<&str> = table.headers().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Date", "Name", "Year", "Letterboxd URI"]);
        assert_eq!(table.row_count(), 3);
        assert!(table.rows().iter().all(|r| r.len() == 4));
    }

    #[test]
    fn title_links_only_when_row_has_uri() {
        let data = watched();
        let refs: Vec<&Record> = data.iter().collect();
        let table = render(&refs, &SortState::default());
        let rows = table.rows();

        assert_eq!(
            rows[0][1],
            Cell::Link {
                text: "Heat".into(),
                href: "https://boxd.it/heat".into()
            }
        );
        assert_eq!(rows[0][3], Cell::Text("https://boxd.it/heat".into()));
        assert_eq!(rows[1][1], Cell::Text("Alien".into()));
        // Missing values render as empty strings.
        assert_eq!(rows[2][1], Cell::Text("Ran".into()));
        assert_eq!(rows[2][3], Cell::Text(String::new()));
    }

    #[test]
    fn indicators_follow_sort_state() {
        let data = watched();
        let refs: Vec<&Record> = data.iter().collect();

        let sort = SortState {
            column: Some("Year".into()),
            order: SortOrder::Descending,
        };
        let glyphs: Vec<&str> = render(&refs, &sort)
            .headers()
            .iter()
            .map(|h| h.indicator.glyph())
            .collect();
        assert_eq!(glyphs, vec!["↕", "↕", "↓", "↕"]);

        let sort = SortState {
            column: Some("Date".into()),
            order: SortOrder::Ascending,
        };
        assert_eq!(render(&refs, &sort).headers()[0].indicator, SortIndicator::Ascending);
    }

    #[test]
    fn empty_input_renders_placeholder() {
        let table = render(&[], &SortState::default());
        assert_eq!(table, TableRender::Empty);
        assert_eq!(table.to_html(), "<div class=\"no-data\">No data available</div>\n");
    }

    #[test]
    fn render_is_deterministic() {
        let data = watched();
        let refs: Vec<&Record> = data.iter().collect();
        let sort = SortState::default();
        assert_eq!(render(&refs, &sort), render(&refs, &sort));
    }

    #[test]
    fn role_detection_first_match_wins() {
        let roles = detect_role_columns(&["Date", "Film Title", "Name", "URL", "Letterboxd URI"]);
        assert_eq!(roles.title_column.as_deref(), Some("Film Title"));
        assert_eq!(roles.link_column.as_deref(), Some("URL"));
    }

    #[test]
    fn role_detection_movie_link_matches_both() {
        let roles = detect_role_columns(&["movie_link", "Name"]);
        assert_eq!(roles.link_column.as_deref(), Some("movie_link"));
        assert_eq!(roles.title_column.as_deref(), Some("movie_link"));

        let roles = detect_role_columns(&["Movie-Link"]);
        assert_eq!(roles.link_column.as_deref(), Some("Movie-Link"));
    }

    #[test]
    fn role_detection_without_matches() {
        let roles = detect_role_columns(&["Date", "Rating", "Tags"]);
        assert_eq!(roles, RoleColumns::default());
        let none: [&str; 0] = [];
        assert_eq!(detect_role_columns(&none), RoleColumns::default());
    }

    #[test]
    fn html_escapes_and_links_titles() {
        let data = vec![record(&[
            ("Name", "Tom & Jerry <1>"),
            ("Letterboxd URI", "https://boxd.it/x?a=1&b=2"),
        ])];
        let refs: Vec<&Record> = data.iter().collect();
        let html = render(&refs, &SortState::default()).to_html();

        assert!(html.contains("<th>Name <span class=\"sort-arrow\">↕</span></th>"));
        assert!(html.contains("href=\"https://boxd.it/x?a=1&amp;b=2\" target=\"_blank\""));
        assert!(html.contains(">Tom &amp; Jerry &lt;1&gt; <span class=\"external-icon\">"));
        assert_eq!(html.matches("<tr>").count(), 2);
    }
}
