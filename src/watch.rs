//! Watch mode: re-run the pipeline on a fixed interval and report deltas.
//!
//! Each cycle runs the orchestrator end-to-end for the same topic, diffs
//! the result against every article key seen in earlier cycles, and
//! reports only the new arrivals: printed to the terminal and exported
//! under cycle-stamped report names. The loop runs until cancelled;
//! cancellation is cooperative, observed at the top of each cycle and
//! during the sleep between cycles, never mid-extraction. Cycle failures
//! are logged and the loop continues.

use std::collections::HashSet;
use std::fmt::{self, Write};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, instrument};

use crate::errors::PipelineError;
use crate::fetcher::FetchAsync;
use crate::models::{Article, NewsReport};
use crate::outputs::ExportPlan;
use crate::pipeline::Pipeline;
use crate::search::SearchNews;

/// Default minutes between watch cycles.
pub const DEFAULT_WATCH_INTERVAL_MIN: u64 = 30;

/// Article keys seen across previous cycles.
///
/// Owned by the scheduler for the life of the process, never persisted;
/// a restart starts blank and reports everything as new again.
#[derive(Debug, Default)]
pub struct WatchState {
    seen: HashSet<String>,
}

impl WatchState {
    pub fn new() -> Self {
        WatchState::default()
    }

    /// Keep only articles whose key has not appeared in any earlier cycle,
    /// merging the new keys in. Input order is preserved.
    pub fn record_new(&mut self, articles: Vec<Article>) -> Vec<Article> {
        articles
            .into_iter()
            .filter(|a| self.seen.insert(a.key.clone()))
            .collect()
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

/// Receiver that flips to `true` once Ctrl-C arrives.
///
/// If signal registration fails the task ends and the sender drops
/// without ever sending; receivers must not read that as cancellation.
pub fn ctrl_c_cancellation() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, finishing current cycle");
            let _ = tx.send(true);
        }
    });
    rx
}

/// Wait out the interval; `true` when it elapsed, `false` when
/// cancellation arrived first. A sender that goes away without ever
/// cancelling leaves the sleep to run its course.
async fn sleep_or_cancel(interval: Duration, cancel: &mut watch::Receiver<bool>) -> bool {
    let mut sleep = Box::pin(tokio::time::sleep(interval));
    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            changed = cancel.changed() => match changed {
                Ok(()) if *cancel.borrow() => return false,
                Ok(()) => {}
                Err(_) => {
                    sleep.as_mut().await;
                    return true;
                }
            },
        }
    }
}

/// Render one cycle's arrivals for the terminal, one block per article.
fn new_arrivals_block(topic: &str, articles: &[Article]) -> String {
    let mut out = String::new();
    writeln!(out, "{} new article(s) for \"{topic}\"", articles.len()).unwrap();
    for article in articles {
        writeln!(out, "\n* {}", article.title).unwrap();
        match article.published_at {
            Some(ts) => {
                writeln!(out, "  {} | {}", article.source, ts.format("%Y-%m-%d %H:%M UTC")).unwrap()
            }
            None => writeln!(out, "  {} | date unknown", article.source).unwrap(),
        }
        if let Some(sentiment) = &article.sentiment {
            writeln!(out, "  Sentiment: {} ({:.2})", sentiment.label, sentiment.score).unwrap();
        }
        if let Some(summary) = &article.summary {
            writeln!(out, "  -> {summary}").unwrap();
        }
        writeln!(out, "  {}", article.url).unwrap();
    }
    out
}

/// Drives repeated pipeline runs and owns the cross-cycle state.
#[derive(Debug)]
pub struct WatchScheduler {
    interval: Duration,
    state: WatchState,
}

impl WatchScheduler {
    pub fn new(interval: Duration) -> Self {
        WatchScheduler {
            interval,
            state: WatchState::new(),
        }
    }

    /// One cycle: pipeline end-to-end, then the delta against everything
    /// seen so far.
    async fn run_cycle<S, F>(
        &mut self,
        pipeline: &Pipeline<S, F>,
        topic: &str,
    ) -> Result<Vec<Article>, PipelineError>
    where
        S: SearchNews,
        F: FetchAsync<Response = String> + Clone + fmt::Debug,
    {
        let articles = pipeline.run(topic).await?;
        Ok(self.state.record_new(articles))
    }

    /// Loop until `cancel` fires, printing and exporting each cycle's new
    /// articles.
    #[instrument(level = "info", skip_all, fields(topic = %topic))]
    pub async fn run<S, F>(
        &mut self,
        pipeline: &Pipeline<S, F>,
        topic: &str,
        exports: &ExportPlan,
        mut cancel: watch::Receiver<bool>,
    ) where
        S: SearchNews,
        F: FetchAsync<Response = String> + Clone + fmt::Debug,
    {
        println!(
            "Watching \"{topic}\" every {} minute(s). Press Ctrl-C to stop.",
            self.interval.as_secs() / 60
        );

        let mut cycle: u64 = 0;
        loop {
            if *cancel.borrow() {
                info!("cancellation observed, stopping watch");
                break;
            }

            cycle += 1;
            info!(cycle, interval_s = self.interval.as_secs(), "watch cycle starting");
            match self.run_cycle(pipeline, topic).await {
                Ok(new) if new.is_empty() => {
                    info!(cycle, seen = self.state.seen_count(), "no new articles this cycle");
                    println!("No new articles for \"{topic}\".");
                }
                Ok(new) => {
                    info!(
                        cycle,
                        new = new.len(),
                        seen = self.state.seen_count(),
                        "new articles this cycle"
                    );
                    print!("\n{}", new_arrivals_block(topic, &new));
                    let report = NewsReport::new(topic, new);
                    if let Err(e) = exports.write_cycle(&report, cycle).await {
                        error!(cycle, error = %e, "failed to write cycle report");
                    }
                }
                Err(PipelineError::NoResults) => {
                    info!(cycle, "no articles survived this cycle");
                    println!("No new articles for \"{topic}\".");
                }
                Err(e) => {
                    error!(cycle, error = %e, "watch cycle failed");
                }
            }

            if !sleep_or_cancel(self.interval, &mut cancel).await {
                info!("cancellation observed during sleep, stopping watch");
                break;
            }
        }
        info!(cycles = cycle, seen = self.state.seen_count(), "watch stopped");
    }
}
