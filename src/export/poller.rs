//! Export poller - batched status polling while any job is INITIATED

use crate::api::ObjectApi;
use crate::error::TransferError;
use crate::store::{Mutation, TransferStore};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::artifact::{ArtifactFetcher, FetchReport};

pub struct ExportPoller {
    store: TransferStore,
    api: Arc<dyn ObjectApi>,
    fetcher: Arc<ArtifactFetcher>,
    poll_interval: Duration,
    settle_delay: Duration,
}

impl ExportPoller {
    pub fn new(
        store: TransferStore,
        api: Arc<dyn ObjectApi>,
        fetcher: Arc<ArtifactFetcher>,
        poll_interval: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            store,
            api,
            fetcher,
            poll_interval,
            settle_delay,
        }
    }

    /// Poll until no job is INITIATED; returns the number of requests issued.
    ///
    /// The first request goes out immediately. Ids are re-read from the store
    /// on every tick, so jobs added mid-poll join the next request.
    pub async fn poll_until_settled(&self, token: &CancellationToken) -> usize {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut requests = 0;
        loop {
            if !self.store.snapshot().has_initiated() {
                break;
            }
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let ids = self.store.snapshot().initiated_ids();
            if ids.is_empty() {
                break;
            }

            requests += 1;
            match self.api.export_progress(&ids).await {
                Ok(jobs) => {
                    for job in jobs {
                        self.store.apply(Mutation::UpdateExportJob(job));
                    }
                }
                Err(e) => {
                    let err = TransferError::Poll(e.to_string());
                    warn!("export_poll_failed: ids={} error={}", ids.join(","), err);
                }
            }
        }
        requests
    }

    /// Wait out the settle delay, then fetch every completed job.
    pub async fn settle_and_fetch(&self, token: &CancellationToken) -> FetchReport {
        tokio::select! {
            _ = token.cancelled() => return FetchReport::default(),
            _ = tokio::time::sleep(self.settle_delay) => {}
        }
        let report = self.fetcher.fetch_completed(&self.store.snapshot()).await;
        info!(
            "export_fetch_done: saved={} expired={} failed={}",
            report.saved.len(),
            report.expired,
            report.failed
        );
        report
    }

    /// Worker loop: re-evaluate the activation predicate on every store change.
    pub async fn run(self, token: CancellationToken) {
        let mut updates = self.store.subscribe();
        loop {
            let state = updates.borrow_and_update().clone();
            if state.has_initiated() {
                info!("export_poll_start: jobs={}", state.initiated_ids().len());
                let requests = self.poll_until_settled(&token).await;
                info!("export_poll_stop: requests={}", requests);
                if token.is_cancelled() {
                    break;
                }
                self.settle_and_fetch(&token).await;
                continue;
            }

            if self.fetcher.has_pending(&state) {
                self.settle_and_fetch(&token).await;
                if token.is_cancelled() {
                    break;
                }
                continue;
            }

            tokio::select! {
                _ = token.cancelled() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("export_worker_stopped");
    }
}
