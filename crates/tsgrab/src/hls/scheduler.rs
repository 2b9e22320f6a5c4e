// Segment Scheduler: downloads a manifest's segments with bounded concurrency.
//
// Results land in slots addressed by manifest position, so completion order never
// affects the output order. The first failure aborts the batch; in-flight transfers
// are dropped with the futures set.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::hls::fetcher::ResourceFetcher;
use crate::hls::playlist::SegmentRef;
use crate::hls::FetchError;

/// A segment whose payload has been written to disk.
#[derive(Debug, Clone)]
pub struct RetrievedSegment {
    pub segment: SegmentRef,
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentProgress {
    pub index: usize,
    pub bytes: u64,
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("segment {index} ({url}) failed: {source}")]
    Segment {
        index: usize,
        url: Url,
        #[source]
        source: FetchError,
    },
    #[error("segment download cancelled")]
    Cancelled,
}

/// File name of a downloaded segment inside the work directory
pub fn segment_file_name(index: usize) -> String {
    format!("segment_{index}.ts")
}

pub struct SegmentScheduler {
    fetcher: Arc<dyn ResourceFetcher>,
    download_concurrency: usize,
    cancel: CancellationToken,
}

impl SegmentScheduler {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, download_concurrency: usize) -> Self {
        Self {
            fetcher,
            download_concurrency: download_concurrency.max(1),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn download_concurrency(&self) -> usize {
        self.download_concurrency
    }

    async fn fetch_one(
        &self,
        slot: usize,
        segment: SegmentRef,
        destination: PathBuf,
    ) -> (usize, Result<RetrievedSegment, ScheduleError>) {
        let result = match self.fetcher.fetch_to_file(&segment.url, &destination).await {
            Ok(size) => Ok(RetrievedSegment {
                segment,
                path: destination,
                size,
            }),
            Err(source) => Err(ScheduleError::Segment {
                index: segment.index,
                url: segment.url,
                source,
            }),
        };
        (slot, result)
    }

    /// Download every segment into `dir`, returning them in manifest order.
    ///
    /// `on_progress` is called once per completed segment, in completion order.
    pub async fn download_all<F>(
        &self,
        segments: &[SegmentRef],
        dir: &Path,
        mut on_progress: F,
    ) -> Result<Vec<RetrievedSegment>, ScheduleError>
    where
        F: FnMut(SegmentProgress),
    {
        let total = segments.len();
        info!(
            total,
            concurrency = self.download_concurrency,
            "Starting segment downloads"
        );

        let mut slots: Vec<Option<RetrievedSegment>> = (0..total).map(|_| None).collect();
        let mut pending = segments.iter().enumerate();
        let mut in_flight = FuturesUnordered::new();
        let mut completed = 0usize;

        loop {
            while in_flight.len() < self.download_concurrency {
                let Some((slot, segment)) = pending.next() else {
                    break;
                };
                let destination = dir.join(segment_file_name(segment.index));
                debug!(index = segment.index, url = %segment.url, "Scheduling segment");
                in_flight.push(self.fetch_one(slot, segment.clone(), destination));
            }

            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    warn!(completed, total, "Segment downloads cancelled");
                    return Err(ScheduleError::Cancelled);
                }

                Some((slot, result)) = in_flight.next() => {
                    match result {
                        Ok(retrieved) => {
                            completed += 1;
                            on_progress(SegmentProgress {
                                index: retrieved.segment.index,
                                bytes: retrieved.size,
                                completed,
                                total,
                            });
                            slots[slot] = Some(retrieved);
                        }
                        Err(e) => {
                            error!(
                                error = %e,
                                in_flight = in_flight.len(),
                                "Segment download failed, aborting batch"
                            );
                            return Err(e);
                        }
                    }
                }
            }
        }

        let retrieved: Vec<RetrievedSegment> = slots.into_iter().flatten().collect();
        debug_assert_eq!(retrieved.len(), total);
        info!(total, "All segments downloaded");
        Ok(retrieved)
    }
}
