//! Trigger consumer
//!
//! Receives triggers from the hook thread, classifies the foreground window
//! and resolves its folder off the async runtime before handing the result
//! to the dispatcher. At most one shell lookup is in flight at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::launcher::{DispatchError, Dispatcher};
use crate::events::TriggerEvent;
use crate::explorer::{ExplorerFolderResult, ExplorerLocator, ForegroundExplorer, ShellSession};

/// Anything that can report the folder in front of the user
pub trait FolderSource: Send + Sync + 'static {
    /// Cheap foreground check, `None` when it is not an Explorer window
    fn foreground(&self) -> Option<ForegroundExplorer>;

    /// Shell walk for `target`; may block for as long as the shell does
    fn resolve(&self, target: &ForegroundExplorer) -> ExplorerFolderResult;
}

impl<S> FolderSource for ExplorerLocator<S>
where
    S: ShellSession + Send + Sync + 'static,
{
    fn foreground(&self) -> Option<ForegroundExplorer> {
        self.foreground_explorer()
    }

    fn resolve(&self, target: &ForegroundExplorer) -> ExplorerFolderResult {
        self.resolve_folder(target)
    }
}

/// Processes triggers one at a time
pub struct TriggerConsumer<F, D> {
    source: Arc<F>,
    dispatcher: D,
    resolve_timeout: Duration,
    /// Lookup that outlived its timeout and has not finished yet
    pending: Option<JoinHandle<ExplorerFolderResult>>,
}

impl<F: FolderSource, D: Dispatcher> TriggerConsumer<F, D> {
    pub fn new(source: F, dispatcher: D, resolve_timeout: Duration) -> Self {
        Self {
            source: Arc::new(source),
            dispatcher,
            resolve_timeout,
            pending: None,
        }
    }

    /// Run until the trigger channel closes
    pub async fn run(&mut self, mut trigger_rx: mpsc::Receiver<TriggerEvent>) {
        info!("trigger consumer started");

        while let Some(trigger) = trigger_rx.recv().await {
            info!(%trigger, "hotkey triggered");
            let folder = self.resolve_folder().await;

            if let Err(e) = self.handle(trigger, &folder) {
                warn!(error = %e, episode = trigger.episode, "dispatch failed");
            }
        }

        info!("trigger consumer stopped");
    }

    fn handle(&mut self, trigger: TriggerEvent, folder: &str) -> Result<(), DispatchError> {
        debug!(episode = trigger.episode, folder, "dispatching");
        self.dispatcher.dispatch(trigger, folder)
    }

    /// Classify, then walk the shell on a blocking worker bounded by the timeout
    ///
    /// A non-Explorer foreground yields an empty folder. Once the window is
    /// known to be Explorer, a timeout, a panicked worker or a lookup still
    /// running from an earlier trigger all yield the window title.
    async fn resolve_folder(&mut self) -> String {
        let Some(target) = self.source.foreground() else {
            return String::new();
        };

        if let Some(previous) = self.pending.take() {
            if !previous.is_finished() {
                warn!(
                    title = %target.title,
                    "previous folder lookup still running, using window title"
                );
                self.pending = Some(previous);
                return target.title;
            }
            debug!("late folder lookup finished, result dropped");
        }

        let source = Arc::clone(&self.source);
        let lookup = target.clone();
        let mut task = tokio::task::spawn_blocking(move || source.resolve(&lookup));

        match tokio::time::timeout(self.resolve_timeout, &mut task).await {
            Ok(Ok(result)) => {
                debug!(?result, "folder resolved");
                result.into_folder_string()
            }
            Ok(Err(e)) => {
                error!(?e, "folder resolution worker failed");
                target.title
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.resolve_timeout.as_millis() as u64,
                    title = %target.title,
                    "folder resolution timed out, using window title"
                );
                self.pending = Some(task);
                target.title
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::explorer::WindowHandle;

    fn explorer(title: &str) -> ForegroundExplorer {
        ForegroundExplorer {
            handle: WindowHandle::from_raw(0x1010),
            title: title.to_string(),
        }
    }

    struct StaticSource {
        foreground: Option<ForegroundExplorer>,
        result: ExplorerFolderResult,
    }

    impl StaticSource {
        fn resolving(result: ExplorerFolderResult) -> Self {
            Self {
                foreground: Some(explorer("Documents")),
                result,
            }
        }
    }

    impl FolderSource for StaticSource {
        fn foreground(&self) -> Option<ForegroundExplorer> {
            self.foreground.clone()
        }

        fn resolve(&self, _target: &ForegroundExplorer) -> ExplorerFolderResult {
            self.result.clone()
        }
    }

    /// Counts shell walks, including how many overlapped
    #[derive(Default)]
    struct Lookups {
        started: AtomicUsize,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    /// A shell that takes `hold` to answer every walk
    struct SlowSource {
        hold: Duration,
        lookups: Arc<Lookups>,
    }

    impl SlowSource {
        fn new(hold: Duration) -> (Self, Arc<Lookups>) {
            let lookups = Arc::new(Lookups::default());
            let source = Self {
                hold,
                lookups: Arc::clone(&lookups),
            };
            (source, lookups)
        }
    }

    impl FolderSource for SlowSource {
        fn foreground(&self) -> Option<ForegroundExplorer> {
            Some(explorer("Downloads"))
        }

        fn resolve(&self, _target: &ForegroundExplorer) -> ExplorerFolderResult {
            self.lookups.started.fetch_add(1, Ordering::SeqCst);
            let active = self.lookups.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.lookups.peak.fetch_max(active, Ordering::SeqCst);
            std::thread::sleep(self.hold);
            self.lookups.active.fetch_sub(1, Ordering::SeqCst);
            ExplorerFolderResult::Resolved("C:\\late".to_string())
        }
    }

    struct PanickingSource;

    impl FolderSource for PanickingSource {
        fn foreground(&self) -> Option<ForegroundExplorer> {
            Some(explorer("Pictures"))
        }

        fn resolve(&self, _target: &ForegroundExplorer) -> ExplorerFolderResult {
            panic!("shell went away");
        }
    }

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<(u64, String)>>>,
        fail: bool,
    }

    impl Dispatcher for Recorder {
        fn dispatch(&mut self, trigger: TriggerEvent, folder: &str) -> Result<(), DispatchError> {
            self.calls
                .lock()
                .unwrap()
                .push((trigger.episode, folder.to_string()));
            if self.fail {
                return Err(DispatchError::Spawn {
                    program: "helper.exe".into(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            Ok(())
        }
    }

    async fn run_with<F: FolderSource>(
        source: F,
        recorder: Recorder,
        timeout: Duration,
        episodes: &[u64],
    ) -> Vec<(u64, String)> {
        let (tx, rx) = mpsc::channel(8);
        for &episode in episodes {
            tx.send(TriggerEvent { episode }).await.unwrap();
        }
        drop(tx);

        let calls = Arc::clone(&recorder.calls);
        let mut consumer = TriggerConsumer::new(source, recorder, timeout);
        consumer.run(rx).await;

        let recorded = calls.lock().unwrap().clone();
        recorded
    }

    #[tokio::test]
    async fn test_dispatches_resolved_path() {
        let source =
            StaticSource::resolving(ExplorerFolderResult::Resolved("C:\\Users".to_string()));
        let calls = run_with(source, Recorder::default(), Duration::from_secs(5), &[1]).await;
        assert_eq!(calls, vec![(1, "C:\\Users".to_string())]);
    }

    #[tokio::test]
    async fn test_non_explorer_and_fallback_collapse_to_strings() {
        let source = StaticSource {
            foreground: None,
            result: ExplorerFolderResult::Resolved("C:\\unused".to_string()),
        };
        let calls = run_with(source, Recorder::default(), Duration::from_secs(5), &[1, 2]).await;
        assert_eq!(calls, vec![(1, String::new()), (2, String::new())]);

        let calls = run_with(
            StaticSource::resolving(ExplorerFolderResult::Fallback("Quick access".to_string())),
            Recorder::default(),
            Duration::from_secs(5),
            &[7],
        )
        .await;
        assert_eq!(calls, vec![(7, "Quick access".to_string())]);
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_title() {
        let (source, _) = SlowSource::new(Duration::from_millis(300));
        let calls = run_with(source, Recorder::default(), Duration::from_millis(20), &[1]).await;
        assert_eq!(calls, vec![(1, "Downloads".to_string())]);
    }

    #[tokio::test]
    async fn test_hung_shell_keeps_one_lookup_in_flight() {
        let (source, lookups) = SlowSource::new(Duration::from_millis(400));
        let calls = run_with(
            source,
            Recorder::default(),
            Duration::from_millis(20),
            &[1, 2, 3, 4],
        )
        .await;

        let expected: Vec<_> = (1..=4).map(|n| (n, "Downloads".to_string())).collect();
        assert_eq!(calls, expected);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(lookups.started.load(Ordering::SeqCst), 1);
        assert_eq!(lookups.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_new_lookup_after_late_one_finishes() {
        let (source, lookups) = SlowSource::new(Duration::from_millis(50));
        let recorder = Recorder::default();
        let calls = Arc::clone(&recorder.calls);
        let mut consumer = TriggerConsumer::new(source, recorder, Duration::from_millis(10));

        let (tx, rx) = mpsc::channel(8);
        let running = tokio::spawn(async move { consumer.run(rx).await });

        tx.send(TriggerEvent { episode: 1 }).await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        tx.send(TriggerEvent { episode: 2 }).await.unwrap();
        drop(tx);
        running.await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(lookups.started.load(Ordering::SeqCst), 2);
        assert_eq!(lookups.peak.load(Ordering::SeqCst), 1);
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_panicking_source_falls_back_to_title() {
        let calls = run_with(
            PanickingSource,
            Recorder::default(),
            Duration::from_secs(5),
            &[1],
        )
        .await;
        assert_eq!(calls, vec![(1, "Pictures".to_string())]);
    }

    #[tokio::test]
    async fn test_dispatch_errors_do_not_stop_consumer() {
        let recorder = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let source = StaticSource::resolving(ExplorerFolderResult::Resolved("D:\\".to_string()));
        let calls = run_with(source, recorder, Duration::from_secs(5), &[1, 2, 3]).await;
        assert_eq!(calls.len(), 3);
    }
}
