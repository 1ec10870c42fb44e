use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::domain::Message;
use crate::explorer::LoadTicket;
use crate::record::DatasetId;
use crate::source::{DataSource, fetch_records};
use crate::stats::StatsAggregator;

/// Work the model asks for. Its outcome comes back as a `Message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    LoadAll,
    LoadDataset { ticket: LoadTicket, id: DatasetId },
}

pub async fn run(task: Task, source: &dyn DataSource) -> Message {
    match task {
        Task::LoadAll => {
            let (datasets, server) = futures::join!(
                StatsAggregator::load_all(source),
                StatsAggregator::load_server_statistics(source)
            );
            Message::StatsLoaded { datasets, server }
        }
        Task::LoadDataset { ticket, id } => {
            let result = fetch_records(source, &id).await;
            Message::DatasetLoaded { ticket, id, result }
        }
    }
}

/// Runs `task` on the runtime and posts the result to `tx`.
pub fn spawn(task: Task, source: Arc<dyn DataSource>, tx: UnboundedSender<Message>) {
    debug!("Spawning {task:?}");
    tokio::spawn(async move {
        let message = run(task, source.as_ref()).await;
        if tx.send(message).is_err() {
            debug!("Receiver gone, dropping task result");
        }
    });
}
