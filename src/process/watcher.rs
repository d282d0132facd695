//! Asynchronous detection of engine process exit.
//!
//! The watcher thread only flips the shared [`StatusCell`] and posts a
//! [`Termination`] event. It never touches the handle's buffer or pipes.

use std::io;
use std::process::{Child, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use super::status::StatusCell;

/// Published once when an engine process is observed to have exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Termination {
    /// OS process id of the engine, 0 for engines without a process
    pub pid: u32,
    /// Exit status, if it could be collected
    pub status: Option<ExitStatus>,
}

impl Termination {
    /// Exit code for a normal exit.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }

    /// Signal that ended the process, if it was killed by one.
    #[cfg(unix)]
    #[must_use]
    pub fn signal(&self) -> Option<i32> {
        use std::os::unix::process::ExitStatusExt;
        self.status.and_then(|s| s.signal())
    }
}

#[derive(Default)]
struct NotifierInner {
    subscribers: Vec<Sender<Termination>>,
    outcome: Option<Termination>,
}

/// Fan-out of the single termination event to any number of subscribers.
///
/// Subscribers registered after the event still receive it.
#[derive(Clone, Default)]
pub struct ExitNotifier(Arc<Mutex<NotifierInner>>);

impl ExitNotifier {
    /// Notifier with no subscribers and no outcome.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register for the termination event.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<Termination> {
        let (tx, rx) = mpsc::channel();
        let mut inner = self.0.lock();
        match inner.outcome {
            Some(event) => {
                let _ = tx.send(event);
            }
            None => inner.subscribers.push(tx),
        }
        rx
    }

    /// Deliver the event. Only the first call has any effect.
    pub fn publish(&self, event: Termination) -> bool {
        let mut inner = self.0.lock();
        if inner.outcome.is_some() {
            return false;
        }
        inner.outcome = Some(event);
        for tx in inner.subscribers.drain(..) {
            let _ = tx.send(event);
        }
        true
    }

    /// The published event, once there is one.
    #[must_use]
    pub fn outcome(&self) -> Option<Termination> {
        self.0.lock().outcome
    }
}

/// Background thread polling a child for exit.
pub(crate) struct Watcher {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Watcher {
    pub(crate) fn spawn(
        pid: u32,
        child: Arc<Mutex<Child>>,
        status: StatusCell,
        notifier: ExitNotifier,
        interval: Duration,
    ) -> io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name(format!("uci-watch-{pid}"))
            .spawn(move || watch(pid, &child, &status, &notifier, &stop, interval))?;

        Ok(Watcher {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Ask the thread to stop and wait for it.
    pub(crate) fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn watch(
    pid: u32,
    child: &Mutex<Child>,
    status: &StatusCell,
    notifier: &ExitNotifier,
    shutdown: &AtomicBool,
    interval: Duration,
) {
    loop {
        let polled = child.lock().try_wait();
        let exit = match polled {
            Ok(Some(exit)) => Some(exit),
            Ok(None) => {
                if shutdown.load(Ordering::Acquire) {
                    return;
                }
                thread::sleep(interval);
                continue;
            }
            Err(e) => {
                engine_warn!("Could not query engine {pid} exit status: {e}");
                force_exit(pid, &mut child.lock())
            }
        };

        status.terminate();
        match exit {
            Some(s) => engine_info!("Engine process {pid} exited: {s}"),
            None => engine_info!("Engine process {pid} treated as exited"),
        }
        notifier.publish(Termination { pid, status: exit });
        return;
    }
}

/// Kill and reap a child whose status can no longer be polled, so it is
/// not left running once marked terminated.
fn force_exit(pid: u32, child: &mut Child) -> Option<ExitStatus> {
    if let Err(e) = child.kill() {
        engine_debug!("kill({pid}) after failed status query: {e}");
        return None;
    }
    match child.wait() {
        Ok(status) => Some(status),
        Err(e) => {
            engine_debug!("wait({pid}) after failed status query: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_late_subscriber_receives_event() {
        let notifier = ExitNotifier::new();
        assert!(notifier.publish(Termination { pid: 7, status: None }));

        let rx = notifier.subscribe();
        assert_eq!(rx.try_recv().unwrap().pid, 7);
    }

    #[test]
    fn test_publish_happens_once() {
        let notifier = ExitNotifier::new();
        let rx = notifier.subscribe();

        assert!(notifier.publish(Termination { pid: 1, status: None }));
        assert!(!notifier.publish(Termination { pid: 2, status: None }));

        assert_eq!(rx.try_recv().unwrap().pid, 1);
        assert!(rx.try_recv().is_err());
        assert_eq!(notifier.outcome().map(|t| t.pid), Some(1));
    }

    #[test]
    fn test_dropped_subscriber_does_not_block_others() {
        let notifier = ExitNotifier::new();
        drop(notifier.subscribe());
        let rx = notifier.subscribe();

        notifier.publish(Termination { pid: 3, status: None });
        assert_eq!(rx.try_recv().unwrap().pid, 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_force_exit_kills_and_reaps_child() {
        use std::process::Command;

        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let pid = child.id();

        let status = force_exit(pid, &mut child).expect("child was not reaped");
        let event = Termination {
            pid,
            status: Some(status),
        };
        assert_eq!(event.signal(), Some(libc::SIGKILL));
        assert!(child.try_wait().unwrap().is_some());
    }
}
