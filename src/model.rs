use arboard::Clipboard;
use crossterm::event::KeyEvent;
use tracing::{error, info, trace, warn};

use crate::domain::{DashConfig, DashError, Message};
use crate::explorer::{LoadTicket, TableExplorer};
use crate::inputter::{InputResult, Inputter};
use crate::prefs::PreferenceStore;
use crate::record::{BROWSABLE_DATASETS, DatasetId, Record};
use crate::stats::{DatasetMap, ServerStatistics, StatsAggregator, StatsSlots};
use crate::tasks::Task;
use crate::theme::Theme;

// Terminal rows not available to table body rows.
const TABLE_CHROME_HEIGHT: usize = 7;

#[derive(Debug, PartialEq)]
pub enum Status {
    Ready,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    Stats,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    Normal,
    Search,
    Help,
}

/// One entry of the sidebar. `dataset == None` is the statistics view.
#[derive(Debug, Clone)]
pub struct NavEntry {
    pub label: String,
    pub dataset: Option<DatasetId>,
}

pub struct Model {
    config: DashConfig,
    pub status: Status,
    modus: Modus,
    nav: Vec<NavEntry>,
    selected_nav: usize,
    view: View,
    show_sidebar: bool,
    explorer: TableExplorer,
    stats: StatsAggregator,
    loading_stats: bool,
    loading_dataset: bool,
    error: Option<String>,
    status_message: String,
    input: Inputter,
    last_input: InputResult,
    cursor_row: usize,
    cursor_column: usize,
    page_size: usize,
    theme: Theme,
    prefs: Box<dyn PreferenceStore>,
}

impl Model {
    pub fn init(config: &DashConfig, prefs: Box<dyn PreferenceStore>) -> Self {
        let mut nav = vec![NavEntry {
            label: "Stats".to_string(),
            dataset: None,
        }];
        nav.extend(
            BROWSABLE_DATASETS
                .iter()
                .chain(config.extra_datasets.iter())
                .map(|id| NavEntry {
                    label: id.label(),
                    dataset: Some(id.clone()),
                }),
        );

        let theme = Theme::from_id(&prefs.load_theme().unwrap_or_default());
        info!("Starting with theme {}", theme.id());

        Self {
            config: config.clone(),
            status: Status::Ready,
            modus: Modus::Normal,
            nav,
            selected_nav: 0,
            view: View::Stats,
            show_sidebar: true,
            explorer: TableExplorer::new(),
            stats: StatsAggregator::new(),
            loading_stats: false,
            loading_dataset: false,
            error: None,
            status_message: "Started filmdash!".to_string(),
            input: Inputter::default(),
            last_input: InputResult::default(),
            cursor_row: 0,
            cursor_column: 0,
            page_size: 10,
            theme,
            prefs,
        }
    }

    /// The startup aggregation.
    pub fn start(&mut self) -> Task {
        self.loading_stats = true;
        self.set_status_message("Loading statistics ...");
        Task::LoadAll
    }

    pub fn update(&mut self, message: Message) -> Option<Task> {
        // Task results arrive whatever the user is doing.
        let message = match message {
            Message::StatsLoaded { datasets, server } => {
                self.stats_loaded(&datasets, &server);
                return None;
            }
            Message::DatasetLoaded { ticket, id, result } => {
                self.dataset_loaded(ticket, id, result);
                return None;
            }
            Message::Resize(width, height) => {
                self.resize(width, height);
                return None;
            }
            other => other,
        };

        match self.modus {
            Modus::Search => {
                if let Message::RawKey(key) = message {
                    self.handle_search_key(key);
                }
                None
            }
            Modus::Help => {
                match message {
                    Message::Quit => self.quit(),
                    Message::Exit | Message::Help => self.modus = Modus::Normal,
                    _ => (),
                }
                None
            }
            Modus::Normal => match message {
                Message::Quit => {
                    self.quit();
                    None
                }
                Message::Help => {
                    self.modus = Modus::Help;
                    None
                }
                Message::Exit => {
                    self.error = None;
                    None
                }
                Message::NextView => self.select_view((self.selected_nav + 1) % self.nav.len()),
                Message::PrevView => {
                    self.select_view((self.selected_nav + self.nav.len() - 1) % self.nav.len())
                }
                Message::SelectView(idx) if idx < self.nav.len() => self.select_view(idx),
                Message::ToggleSidebar => {
                    self.show_sidebar = !self.show_sidebar;
                    None
                }
                Message::CycleTheme => {
                    self.cycle_theme();
                    None
                }
                table_message if self.view == View::Table => {
                    self.update_table(table_message);
                    None
                }
                _ => None,
            },
        }
    }

    fn update_table(&mut self, message: Message) {
        match message {
            Message::MoveUp => self.move_row(-1),
            Message::MoveDown => self.move_row(1),
            Message::MovePageUp => self.move_row(-(self.page_size as isize)),
            Message::MovePageDown => self.move_row(self.page_size as isize),
            Message::MoveBeginning => self.cursor_row = 0,
            Message::MoveEnd => self.cursor_row = self.row_count().saturating_sub(1),
            Message::MoveLeft => self.cursor_column = self.cursor_column.saturating_sub(1),
            Message::MoveRight => {
                let ncols = self.explorer.columns().len();
                if self.cursor_column + 1 < ncols {
                    self.cursor_column += 1;
                }
            }
            Message::SortSelected => self.sort_selected(),
            Message::Search => self.enter_search(),
            Message::CycleScope => self.cycle_scope(),
            Message::CopyCell => self.copy_cell(),
            _ => (),
        }
    }

    // -------------------- Navigation ---------------------- //

    fn select_view(&mut self, idx: usize) -> Option<Task> {
        self.selected_nav = idx;
        self.error = None;
        let entry = self.nav[idx].clone();
        match entry.dataset {
            None => {
                self.view = View::Stats;
                None
            }
            Some(id) => {
                self.view = View::Table;
                self.loading_dataset = true;
                self.cursor_row = 0;
                self.cursor_column = 0;
                self.input.clear();
                self.last_input = self.input.get();
                self.set_status_message(format!("Loading {} ...", entry.label));
                let ticket = self.explorer.begin_load();
                Some(Task::LoadDataset { ticket, id })
            }
        }
    }

    fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    fn resize(&mut self, _width: usize, height: usize) {
        self.page_size = height.saturating_sub(TABLE_CHROME_HEIGHT).max(1);
        trace!("Resized, page size is {}", self.page_size);
    }

    fn cycle_theme(&mut self) {
        self.theme = self.theme.next();
        match self.prefs.save_theme(self.theme.id()) {
            Ok(()) => self.set_status_message(format!("Theme: {}", self.theme.id())),
            Err(e) => {
                warn!("Failed to save theme: {e}");
                self.set_status_message(format!("Theme: {} (not saved: {e})", self.theme.id()));
            }
        }
    }

    // -------------------- Task results ---------------------- //

    fn stats_loaded(&mut self, datasets: &DatasetMap, server: &ServerStatistics) {
        self.stats.process(datasets);
        self.stats.compute_server_stats(server);
        self.loading_stats = false;
        self.set_status_message("Statistics ready");
    }

    fn dataset_loaded(
        &mut self,
        ticket: LoadTicket,
        id: DatasetId,
        result: Result<Vec<Record>, DashError>,
    ) {
        let current = self.explorer.is_current(ticket);
        let label = id.label();
        let outcome = self.explorer.finish_load(ticket, id, result);
        if current {
            self.loading_dataset = false;
        }

        match outcome {
            Ok(true) => {
                self.cursor_row = 0;
                self.cursor_column = 0;
                self.set_status_message(format!(
                    "Loaded {} rows from {label}",
                    self.explorer.current_data().len()
                ));
            }
            Ok(false) => {}
            Err(e) => {
                error!("Loading {label} failed: {e}");
                self.error = Some(e.to_string());
                self.set_status_message(format!("Loading {label} failed"));
            }
        }
    }

    // -------------------- Table ---------------------- //

    fn row_count(&self) -> usize {
        self.explorer.rendered().row_count()
    }

    fn move_row(&mut self, step: isize) {
        let last = self.row_count().saturating_sub(1);
        self.cursor_row = self.cursor_row.saturating_add_signed(step).min(last);
    }

    fn clamp_cursor(&mut self) {
        self.cursor_row = self.cursor_row.min(self.row_count().saturating_sub(1));
    }

    fn sort_selected(&mut self) {
        let Some(column) = self.explorer.columns().get(self.cursor_column).cloned() else {
            return;
        };
        self.explorer.sort(&column);
        self.cursor_row = 0;
        let order = self.explorer.sort_state().order;
        self.set_status_message(format!("Sorted by {column} ({order:?})"));
    }

    fn enter_search(&mut self) {
        trace!("Entering search mode ...");
        self.modus = Modus::Search;
        self.input.set(&self.explorer.query().search_term);
        self.input.resume();
        self.last_input = self.input.get();
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let previous = self.last_input.input.clone();
        self.last_input = self.input.read(key);
        if self.last_input.input != previous {
            self.explorer.filter(&self.last_input.input);
            self.clamp_cursor();
        }
        if self.last_input.finished {
            self.modus = Modus::Normal;
            self.set_status_message(format!("{} matching rows", self.row_count()));
        }
    }

    fn cycle_scope(&mut self) {
        self.explorer.cycle_scope();
        self.clamp_cursor();
        let scope = self
            .explorer
            .query()
            .scope_column
            .clone()
            .unwrap_or_else(|| "All Columns".to_string());
        self.set_status_message(format!("Search scope: {scope}"));
    }

    pub fn selected_cell_text(&self) -> Option<String> {
        self.explorer
            .rendered()
            .rows()
            .get(self.cursor_row)
            .and_then(|row| row.get(self.cursor_column))
            .map(|cell| cell.text().to_string())
    }

    fn copy_cell(&mut self) {
        let Some(text) = self.selected_cell_text() else {
            return;
        };
        trace!("Cell content: {}", text);
        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(()) => self.set_status_message("Copied cell to clipboard"),
            Err(e) => {
                warn!("Error copying to clipboard: {e}");
                self.set_status_message(format!("Clipboard unavailable: {e}"));
            }
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    // -------------------- Accessors for the UI ---------------------- //

    /// Key events go straight to the search box while it is open.
    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::Search
    }

    pub fn show_help(&self) -> bool {
        self.modus == Modus::Help
    }

    pub fn is_loading(&self) -> bool {
        self.loading_stats || self.loading_dataset
    }

    pub fn nav(&self) -> &[NavEntry] {
        &self.nav
    }

    pub fn selected_nav(&self) -> usize {
        self.selected_nav
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn show_sidebar(&self) -> bool {
        self.show_sidebar
    }

    pub fn explorer(&self) -> &TableExplorer {
        &self.explorer
    }

    pub fn stats(&self) -> &StatsSlots {
        self.stats.slots()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn search_input(&self) -> &InputResult {
        &self.last_input
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_column)
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn max_column_width(&self) -> usize {
        self.config.max_column_width
    }
}
