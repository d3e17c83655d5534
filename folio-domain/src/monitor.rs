/// Session activity timeout
///
/// Tracks wall-clock user inactivity and cancels a token once the idle
/// window elapses, so the UI layer can force a sign-out. The watcher polls;
/// `touch` is called on every user interaction and resets the window.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use folio_domain::monitor::ActivityMonitor;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() {
/// let monitor = ActivityMonitor::new(Duration::from_secs(30 * 60));
/// let expired = CancellationToken::new();
/// let handle = monitor.enforce(expired.clone());
///
/// // on user activity:
/// monitor.touch();
///
/// // elsewhere: sign out when `expired.cancelled()` fires.
/// # handle.abort();
/// # }
/// ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

/// Default idle window (30 minutes)
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Default poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Idle-session watcher
pub struct ActivityMonitor {
    last_activity: Arc<Mutex<Instant>>,
    idle_timeout: Duration,
    poll_interval: Duration,
}

impl ActivityMonitor {
    /// Creates a monitor with the given idle window
    pub fn new(idle_timeout: Duration) -> Self {
        Self::with_poll_interval(idle_timeout, DEFAULT_POLL_INTERVAL)
    }

    /// Creates a monitor with explicit idle window and poll interval
    pub fn with_poll_interval(idle_timeout: Duration, poll_interval: Duration) -> Self {
        ActivityMonitor {
            last_activity: Arc::new(Mutex::new(Instant::now())),
            idle_timeout,
            poll_interval,
        }
    }

    /// Records user activity, resetting the idle window
    pub fn touch(&self) {
        *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// Time since the last recorded activity
    pub fn idle_for(&self) -> Duration {
        self.last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    /// Whether the idle window has elapsed
    pub fn is_expired(&self) -> bool {
        self.idle_for() >= self.idle_timeout
    }

    /// Spawns the watcher
    ///
    /// The task cancels `token` once the idle window elapses, then exits.
    /// It also exits quietly if the token is cancelled externally. Abort
    /// the returned handle on sign-out to stop watching early.
    pub fn enforce(&self, token: CancellationToken) -> JoinHandle<()> {
        let last_activity = self.last_activity.clone();
        let idle_timeout = self.idle_timeout;
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = sleep(poll_interval) => {
                        let idle = last_activity
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .elapsed();
                        if idle >= idle_timeout {
                            tracing::info!(idle_secs = idle.as_secs(), "session idle timeout reached");
                            token.cancel();
                            return;
                        }
                    }
                }
            }
        })
    }
}
