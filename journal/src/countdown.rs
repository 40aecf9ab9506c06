//! Live countdown shown while the gate is closed.

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use chrono::TimeDelta;
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::gate::EligibilityGate;
use crate::store::KvStore;

pub const REOPENED_ALERT: &str = "You can make a new entry now.";

/// Where the countdown is drawn.
pub trait CountdownView: Send + Sync {
    fn render(&self, remaining: &str);
    /// Tear down the overlay.
    fn dismiss(&self);
    fn alert(&self, message: &str);
}

/// `HH:MM:SS`, clamped at zero. Hours are not wrapped at 24.
pub fn format_remaining(remaining: TimeDelta) -> String {
    let secs = remaining.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Owns the repeating tick. Dropping the handle cancels it.
pub struct CountdownHandle {
    task: Option<JoinHandle<()>>,
}

impl CountdownHandle {
    /// Stop ticking without dismissing or alerting.
    pub fn cancel(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Wait for the countdown to reach its deadline.
    pub async fn finished(mut self) {
        // Awaited in place so that dropping this future still aborts the task.
        if let Some(task) = self.task.as_mut() {
            let _ = task.await;
        }
        self.task = None;
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Render the time left until `deadline` every `every`, starting now.
///
/// When the deadline is reached the stored deadline is cleared through the
/// gate, the view is dismissed and alerted, and the tick stops. This happens
/// once; the task ends right after. If the clear fails nothing is shown and
/// the next tick tries again.
pub fn start_countdown<S: KvStore + 'static>(
    gate: EligibilityGate<S>,
    deadline: DateTime<Utc>,
    view: Arc<dyn CountdownView>,
    every: Duration,
) -> CountdownHandle {
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let now = gate.clock().now();
            if now < deadline {
                view.render(&format_remaining(deadline - now));
                continue;
            }
            // The gate stays closed until the clear is stored; retry next tick.
            if let Err(e) = gate.reopen_if_elapsed().await {
                tracing::warn!("clearing deadline after countdown failed: {e}");
                continue;
            }
            view.dismiss();
            view.alert(REOPENED_ALERT);
            break;
        }
    });
    CountdownHandle { task: Some(task) }
}
