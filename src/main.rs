use std::fs::File;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::Parser;
use crossterm::event::EventStream;
use futures::StreamExt;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use filmdash::controller::Controller;
use filmdash::domain::{
    DEFAULT_BASE_URL, DEFAULT_LOG_FILE, DEFAULT_MAX_COLUMN_WIDTH, DEFAULT_THEME_FILE, DashConfig,
    DashError, Message,
};
use filmdash::explorer::TableExplorer;
use filmdash::model::{Model, Status};
use filmdash::prefs::FilePreferences;
use filmdash::record::DatasetId;
use filmdash::source::{DataSource, DirectorySource, HttpSource};
use filmdash::stats::StatsAggregator;
use filmdash::tasks;
use filmdash::ui::TableUI;

/// Terminal dashboard for a personal movie-tracking export.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Base URL of the data server
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    url: String,

    /// Read `<DIR>/<dataset>.csv` files instead of asking the server
    #[arg(long)]
    dir: Option<String>,

    /// Extra dataset for the sidebar, a name or a path ending in .csv
    #[arg(long = "file", value_name = "ID")]
    files: Vec<DatasetId>,

    /// Print the statistics and exit
    #[arg(long)]
    stats: bool,

    /// Print one dataset as an HTML table and exit
    #[arg(long, value_name = "ID")]
    html: Option<DatasetId>,

    #[arg(long, default_value = DEFAULT_THEME_FILE)]
    theme_file: String,

    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: String,

    #[arg(long, default_value_t = DEFAULT_MAX_COLUMN_WIDTH)]
    max_column_width: usize,
}

impl Args {
    fn config(&self) -> DashConfig {
        let config = DashConfig::default()
            .with_base_url(self.url.clone())
            .with_extra_datasets(self.files.clone())
            .with_theme_file(self.theme_file.clone())
            .with_log_file(self.log_file.clone())
            .with_max_column_width(self.max_column_width);
        match &self.dir {
            Some(dir) => config.with_data_dir(dir.clone()),
            None => config,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = args.config();

    if let Err(e) = init_logging(&config.log_file) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    match run(&args, &config).await {
        Err(e) => {
            error!("Exiting with error: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(()) => ExitCode::SUCCESS,
    }
}

fn init_logging(log_file: &str) -> Result<(), DashError> {
    let path = shellexpand::full(log_file)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| log_file.to_string());
    let file = File::create(path)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "filmdash=info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

async fn run(args: &Args, config: &DashConfig) -> Result<(), DashError> {
    let source: Arc<dyn DataSource> = match &config.data_dir {
        Some(dir) => Arc::new(DirectorySource::new(dir)?),
        None => Arc::new(HttpSource::new(config.base_url.clone())),
    };
    info!("Starting filmdash with {config:?}");

    if args.stats {
        let (data, server) = futures::join!(
            StatsAggregator::load_all(source.as_ref()),
            StatsAggregator::load_server_statistics(source.as_ref())
        );
        let mut stats = StatsAggregator::new();
        stats.process(&data);
        stats.compute_server_stats(&server);
        print!("{}", stats.slots());
        return Ok(());
    }

    if let Some(id) = &args.html {
        let mut explorer = TableExplorer::new();
        explorer.load(source.as_ref(), id.clone()).await?;
        println!("{}", explorer.rendered().to_html());
        return Ok(());
    }

    let mut terminal = ratatui::init();
    let result = run_tui(config, source, &mut terminal).await;
    ratatui::restore();
    result
}

async fn run_tui(
    config: &DashConfig,
    source: Arc<dyn DataSource>,
    terminal: &mut DefaultTerminal,
) -> Result<(), DashError> {
    let prefs = FilePreferences::new(&config.theme_file);
    let mut model = Model::init(config, Box::new(prefs));
    let controller = Controller::new();
    let mut ui = TableUI::new();
    let mut events = EventStream::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let size = terminal.size()?;
    model.update(Message::Resize(size.width as usize, size.height as usize));
    tasks::spawn(model.start(), source.clone(), tx.clone());

    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Wait for user input or a finished task
        let message = tokio::select! {
            Some(event) = events.next() => controller.handle_event(&model, event?),
            Some(message) = rx.recv() => Some(message),
        };

        if let Some(message) = message
            && let Some(task) = model.update(message)
        {
            tasks::spawn(task, source.clone(), tx.clone());
        }
    }

    info!("Quitting filmdash");
    Ok(())
}
