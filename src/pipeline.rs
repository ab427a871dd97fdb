//! Sequences navigation, link collection and per-link extraction.

use crate::browser::{Browser, SessionFactory};
use crate::collector::LinkCollector;
use crate::config::HarvestConfig;
use crate::error::{Error, Result};
use crate::extractor::ItemExtractor;
use crate::navigator::PageNavigator;
use crate::repository::Repository;
use crate::results::{ListingRecord, RunSummary};
use crate::snapshot::{self, RecordWriter};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// Full run: navigate, collect links, then extract and persist every link.
///
/// The primary session and every worker session are released on every exit
/// path, timeouts included.
pub async fn run<F: SessionFactory>(
    factory: &F,
    config: &HarvestConfig,
    repository: &Repository,
) -> Result<RunSummary> {
    let session = factory.open().await?;
    let mut pool = WorkerPool::default();
    let outcome = within_limit(
        config,
        full_run(&session, factory, config, repository, &mut pool),
    )
    .await;
    pool.shutdown().await;
    release(session).await;
    outcome
}

/// Extraction only, over the links stored in the links snapshot
pub async fn harvest_from_snapshot<F: SessionFactory>(
    factory: &F,
    config: &HarvestConfig,
    repository: &Repository,
) -> Result<RunSummary> {
    let links = snapshot::read_links(&config.links_snapshot)?;
    ::log::info!(
        "Read {} links from {}",
        links.len(),
        config.links_snapshot.display()
    );

    let session = factory.open().await?;
    let mut pool = WorkerPool::default();
    let mut summary = RunSummary {
        links_collected: links.len(),
        ..RunSummary::default()
    };
    let outcome = within_limit(
        config,
        harvest_links(&session, factory, config, repository, links, &mut summary, &mut pool),
    )
    .await;
    pool.shutdown().await;
    release(session).await;
    outcome.map(|()| summary)
}

async fn full_run<F: SessionFactory>(
    session: &F::Session,
    factory: &F,
    config: &HarvestConfig,
    repository: &Repository,
    pool: &mut WorkerPool,
) -> Result<RunSummary> {
    let pagination = PageNavigator::new(config).navigate(session).await?;

    let collected = LinkCollector::new(config)
        .collect_and_record(session, repository, &config.links_snapshot)
        .await?;

    let mut summary = RunSummary {
        load_more_clicks: pagination.clicks,
        links_collected: collected.links.len(),
        links_recorded: collected.newly_recorded,
        ..RunSummary::default()
    };
    harvest_links(session, factory, config, repository, collected.links, &mut summary, pool)
        .await?;
    Ok(summary)
}

/// Bounds `work` by the configured run timeout, if any
async fn within_limit<T>(
    config: &HarvestConfig,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    match config.total_timeout() {
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .unwrap_or(Err(Error::TimedOut(limit))),
        None => work.await,
    }
}

/// Extraction tasks spawned during a run
#[derive(Default)]
struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Waits for every worker to stop and close its session
    async fn shutdown(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                ::log::warn!("Worker task failed: {}", e);
            }
        }
    }
}

async fn release<B: Browser>(session: B) {
    if let Err(e) = session.close().await {
        ::log::warn!("Failed to close browser session: {}", e);
    }
}

/// Writes each record to the output snapshot and the repository
struct RecordSink<'a> {
    repository: &'a Repository,
    writer: RecordWriter,
}

impl RecordSink<'_> {
    fn accept(&mut self, record: &ListingRecord, summary: &mut RunSummary) {
        summary.listings_extracted += 1;

        if let Err(e) = self.writer.write(record) {
            ::log::warn!("Couldn't write snapshot row for {}: {}", record.link, e);
        }

        match self.repository.record_listing(record) {
            Ok(id) => {
                summary.listings_persisted += 1;
                ::log::debug!("Stored {} as row {}", record.link, id);
            }
            Err(e) => {
                summary.persistence_failures += 1;
                ::log::warn!("Error inserting data for {}: {}", record.name, e);
            }
        }
    }
}

/// Extracts and persists `links`, on `primary` or across a worker pool
async fn harvest_links<F: SessionFactory>(
    primary: &F::Session,
    factory: &F,
    config: &HarvestConfig,
    repository: &Repository,
    links: Vec<String>,
    summary: &mut RunSummary,
    pool: &mut WorkerPool,
) -> Result<()> {
    let mut sink = RecordSink {
        repository,
        writer: RecordWriter::create(&config.output_snapshot)?,
    };
    let extractor = ItemExtractor::new(config);

    let workers = if config.workers > 1 && links.len() > 1 {
        open_workers(factory, config.workers.min(links.len())).await
    } else {
        Vec::new()
    };

    if workers.is_empty() {
        for link in &links {
            let record = extractor.extract(primary, link).await;
            sink.accept(&record, summary);
        }
    } else {
        let mut results = spawn_workers(workers, extractor, links, pool).await;
        while let Some(record) = results.recv().await {
            sink.accept(&record, summary);
        }
    }

    sink.writer.finish()?;
    ::log::info!(
        "Harvested {} listings ({} stored, {} failed)",
        summary.listings_extracted,
        summary.listings_persisted,
        summary.persistence_failures
    );
    Ok(())
}

async fn open_workers<F: SessionFactory>(factory: &F, count: usize) -> Vec<F::Session> {
    let mut sessions = Vec::with_capacity(count);
    for worker_id in 0..count {
        match factory.open().await {
            Ok(session) => sessions.push(session),
            Err(e) => ::log::warn!("Worker {} couldn't open a session: {}", worker_id, e),
        }
    }
    if sessions.is_empty() {
        ::log::warn!("No worker sessions available, extracting on the primary session");
    }
    sessions
}

/// Fans links out to one task per session; records come back on the returned channel.
///
/// Workers stop taking links once the receiver is dropped.
async fn spawn_workers<B: Browser + 'static>(
    sessions: Vec<B>,
    extractor: ItemExtractor,
    links: Vec<String>,
    pool: &mut WorkerPool,
) -> mpsc::Receiver<ListingRecord> {
    let (link_tx, link_rx) = mpsc::channel::<String>(links.len().max(1));
    for link in links {
        // Capacity covers every link, so this never waits
        let _ = link_tx.send(link).await;
    }
    drop(link_tx);

    let link_rx = Arc::new(Mutex::new(link_rx));
    let extractor = Arc::new(extractor);
    let (result_tx, result_rx) = mpsc::channel::<ListingRecord>(sessions.len() * 2);

    for (worker_id, session) in sessions.into_iter().enumerate() {
        let link_rx = Arc::clone(&link_rx);
        let extractor = Arc::clone(&extractor);
        let result_tx = result_tx.clone();

        let handle = tokio::spawn(async move {
            ::log::debug!("Worker {} started", worker_id);
            loop {
                if result_tx.is_closed() {
                    ::log::debug!("Worker {} stopping, run abandoned", worker_id);
                    break;
                }
                let next = link_rx.lock().await.recv().await;
                let Some(link) = next else { break };

                let record = extractor.extract(&session, &link).await;
                if result_tx.send(record).await.is_err() {
                    ::log::error!("Worker {} failed to send result", worker_id);
                    break;
                }
            }
            if let Err(e) = session.close().await {
                ::log::warn!("Worker {} failed to close session: {}", worker_id, e);
            }
            ::log::debug!("Worker {} completed", worker_id);
        });
        pool.handles.push(handle);
    }

    // Each worker holds its own sender; the channel closes when the last one finishes
    drop(result_tx);

    result_rx
}
