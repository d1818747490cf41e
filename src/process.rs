use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use tokio::task::{spawn_blocking, JoinHandle};
use tracing::warn;

use crate::request::{PageFetcher, RawPage};
use crate::sink::CsvSink;
use crate::surface::Surface;
use crate::{info_time, Error, Result, DEFAULT_OUTPUT, DEFAULT_PAGES};

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub output: PathBuf,
    /// Number of pages to request. Every page is attempted exactly once.
    pub pages: usize,
    /// Upper bound on page requests in flight. `1` fetches strictly one page at a time.
    pub prefetch: usize,
}

impl HarvestConfig {
    pub fn new(output: impl Into<PathBuf>, pages: usize) -> Self {
        HarvestConfig {
            output: output.into(),
            pages,
            prefetch: 1,
        }
    }

    pub fn with_prefetch(mut self, prefetch: usize) -> Self {
        self.prefetch = prefetch;
        self
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        HarvestConfig::new(DEFAULT_OUTPUT, DEFAULT_PAGES)
    }
}

/// What happened to one page of a run. `page` is the upstream page number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Appended { page: usize, rows: usize },
    Empty { page: usize },
    Skipped { page: usize, reason: String },
}

impl PageOutcome {
    pub fn page(&self) -> usize {
        match self {
            PageOutcome::Appended { page, .. }
            | PageOutcome::Empty { page }
            | PageOutcome::Skipped { page, .. } => *page,
        }
    }
}

/// The rows of every non-empty page in page order, plus how many were written.
#[derive(Debug, Clone)]
pub struct HarvestReport<R> {
    pub rows: Vec<R>,
    pub written: usize,
    pub outcomes: Vec<PageOutcome>,
}

impl<R> HarvestReport<R> {
    fn new(pages: usize) -> Self {
        HarvestReport {
            rows: Vec::new(),
            written: 0,
            outcomes: Vec::with_capacity(pages.min(1024)),
        }
    }
}

/// Drives fetch -> parse -> append over a page range for one surface.
pub struct Harvester<S, F> {
    surface: Arc<S>,
    fetcher: Arc<F>,
}

impl<S, F> Harvester<S, F>
where
    S: Surface,
    F: PageFetcher + 'static,
{
    pub fn new(surface: S, fetcher: F) -> Self {
        Harvester {
            surface: Arc::new(surface),
            fetcher: Arc::new(fetcher),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Harvests `config.pages` pages of reviews for `target` into `config.output`.
    ///
    /// Failed and empty pages are skipped and the run moves on to the next page.
    /// Only configuration errors (checked before any request) and output
    /// failures end a run early.
    pub async fn harvest(
        &self,
        target: &str,
        config: &HarvestConfig,
    ) -> Result<HarvestReport<S::Row>> {
        let target = target.trim();
        if target.is_empty() {
            return Err(Error::Config("missing target identifier".into()));
        }
        if config.prefetch == 0 {
            return Err(Error::Config("prefetch must be at least 1".into()));
        }

        let start_time = Local::now();
        let surface = self.surface.name();
        info_time!(
            "Downloading the first {} pages from: {target} ({surface})",
            config.pages
        );

        let sink = CsvSink::new(&config.output, self.surface.columns());
        let first = self.surface.first_page();
        let mut pages = first..first.saturating_add(config.pages);
        let mut in_flight: VecDeque<(usize, JoinHandle<Result<RawPage>>)> =
            VecDeque::with_capacity(config.prefetch);
        let mut report = HarvestReport::new(config.pages);

        loop {
            while in_flight.len() < config.prefetch {
                let Some(page) = pages.next() else { break };
                in_flight.push_back((page, self.spawn_fetch(target, page)));
            }
            let Some((page, fetch)) = in_flight.pop_front() else {
                break;
            };

            let rows = match fetch.await? {
                Ok(raw) => self.parse(raw).await?,
                Err(e) => Err(e),
            };

            let outcome = match rows {
                Ok(rows) if rows.is_empty() => {
                    info_time!("Page {page} is empty");
                    PageOutcome::Empty { page }
                }
                Ok(rows) => {
                    info_time!("Retrieved {} reviews from page {page}", rows.len());
                    let written = sink.append(&rows).await?;
                    info_time!("Appended {written} reviews to {}", sink.path().display());
                    report.written += written;
                    report.rows.extend(rows);
                    PageOutcome::Appended {
                        page,
                        rows: written,
                    }
                }
                Err(e) if e.is_page_local() => {
                    warn!(page, surface, "skipping page: {e}");
                    PageOutcome::Skipped {
                        page,
                        reason: e.to_string(),
                    }
                }
                Err(e) => return Err(e),
            };
            report.outcomes.push(outcome);
        }

        if report.written == 0 && sink.ensure_header().await? {
            info_time!("No reviews found, wrote header only");
        }
        info_time!(
            start_time,
            "Finished downloading {} reviews to file {}",
            report.written,
            sink.path().display()
        );
        Ok(report)
    }

    /// Spawns the request for one page. Its failure stays inside its own task.
    fn spawn_fetch(&self, target: &str, page: usize) -> JoinHandle<Result<RawPage>> {
        let request = self.surface.request(target, page);
        let fetcher = Arc::clone(&self.fetcher);
        tokio::spawn(async move { fetcher.fetch(&request).await })
    }

    /// Parsing is CPU-bound, keep it off the async workers.
    async fn parse(&self, raw: RawPage) -> Result<Result<Vec<S::Row>>> {
        let surface = Arc::clone(&self.surface);
        Ok(spawn_blocking(move || surface.parse(&raw)).await?)
    }
}
