use super::*;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Health of the aggregate poll link. `Failed` is set only from the poller's
/// error path and is what distinguishes "bot reports offline" from "we could
/// not ask the bot at all".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum LinkHealth {
    #[default]
    Live,
    Failed,
}

/// A state slice plus the generation of the poll that last wrote it. Ticks
/// never cancel in-flight requests, so a slow response can land after a
/// newer one; the generation check turns last-resolved-wins into
/// last-requested-wins.
#[derive(Debug, Default)]
pub(crate) struct Guarded<T> {
    value: T,
    applied_gen: u64,
}

impl<T> Guarded<T> {
    pub(crate) fn value(&self) -> &T {
        &self.value
    }

    pub(crate) fn apply(&mut self, gen: u64, value: T) -> bool {
        if gen < self.applied_gen {
            return false;
        }
        self.applied_gen = gen;
        self.value = value;
        true
    }
}

impl<T: Clone> Guarded<T> {
    pub(crate) fn get(&self) -> T {
        self.value.clone()
    }
}

pub(crate) type FetchFut<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

/// One configurable poller: fixed interval, one spawned fetch per tick, no
/// retry and no deduplication; the next tick is the only retry. Results are
/// applied under the slice's generation guard. Fetch errors only touch the
/// link slice (when one is attached) and the log pane, never the data.
pub(crate) fn spawn_poller<T, F>(
    label: &'static str,
    every: Duration,
    slice: Shared<T>,
    link: Option<Shared<LinkHealth>>,
    logs: SharedLogs,
    fetch: F,
) -> tokio::task::JoinHandle<()>
where
    T: Send + Sync + 'static,
    F: Fn() -> FetchFut<T> + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let next_gen = AtomicU64::new(1);
        let mut tick = tokio::time::interval(every);
        loop {
            tick.tick().await;
            let gen = next_gen.fetch_add(1, Ordering::Relaxed);
            let fut = fetch();
            let slice = Arc::clone(&slice);
            let link = link.clone();
            let logs = Arc::clone(&logs);
            tokio::spawn(async move {
                match fut.await {
                    Ok(value) => {
                        let fresh = slice.write().await.apply(gen, value);
                        if let Some(link) = link.as_ref() {
                            link.write().await.apply(gen, LinkHealth::Live);
                        }
                        if !fresh {
                            tracing::warn!(poller = label, gen, "discarding stale response");
                        }
                    }
                    Err(err) => {
                        if let Some(link) = link.as_ref() {
                            link.write().await.apply(gen, LinkHealth::Failed);
                        }
                        push_log(&logs, format!("[{label}] poll failed: {err:#}")).await;
                    }
                }
            });
        }
    })
}
