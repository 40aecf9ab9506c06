//! Background reminder: polls the stored deadline and notifies once it passes.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::clock::Clock;
use crate::collaborators::Notifier;
use crate::config::JournalConfig;
use crate::deadline;
use crate::error::Result;
use crate::store::KvStore;

/// Stable name the reminder is registered under.
pub const REMINDER_ALARM: &str = "checkNextAvailableTime";

/// Named recurring timers. Registering a name that already exists does
/// nothing, so callers may register on every start-up.
#[derive(Default)]
pub struct AlarmRegistry {
    alarms: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl AlarmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` every `period`, first after one full period. Must be
    /// called from within a tokio runtime. Returns `false` if `name` was
    /// already registered.
    pub fn register<F, Fut>(&self, name: &str, period: Duration, mut callback: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut alarms = self.alarms.lock().unwrap_or_else(|e| e.into_inner());
        if alarms.contains_key(name) {
            tracing::debug!(name, "alarm already registered");
            return false;
        }
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                callback().await;
            }
        });
        alarms.insert(name.to_string(), handle);
        tracing::debug!(name, ?period, "alarm registered");
        true
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.alarms
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(name)
    }

    /// Stop and forget `name`. Returns `false` if it was not registered.
    pub fn clear(&self, name: &str) -> bool {
        let removed = self
            .alarms
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name);
        match removed {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for AlarmRegistry {
    fn drop(&mut self) {
        let alarms = self.alarms.get_mut().unwrap_or_else(|e| e.into_inner());
        for (_, handle) in alarms.drain() {
            handle.abort();
        }
    }
}

/// Reads and clears `nextAvailableTime`; never touches the entry collection.
pub struct ReminderScheduler<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    period: Duration,
    title: String,
    message: String,
}

impl<S: KvStore + 'static> ReminderScheduler<S> {
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        config: &JournalConfig,
    ) -> Self {
        Self {
            store,
            clock,
            notifier,
            period: config.reminder_period,
            title: config.notification_title.clone(),
            message: config.notification_message.clone(),
        }
    }

    /// One poll. Notifies, and returns `true`, only when this call cleared an
    /// elapsed deadline; the cleared value guards every later tick.
    pub async fn tick(&self) -> Result<bool> {
        let cleared = deadline::clear_if_elapsed(self.store.as_ref(), self.clock.now()).await?;
        if cleared {
            self.notifier.notify(&self.title, &self.message);
            tracing::info!(title = %self.title, "reminder sent");
        }
        Ok(cleared)
    }

    /// Register the periodic tick under [`REMINDER_ALARM`]. A second install
    /// on the same registry is a no-op and returns `false`.
    pub fn install(self: &Arc<Self>, registry: &AlarmRegistry) -> bool {
        let scheduler = Arc::clone(self);
        registry.register(REMINDER_ALARM, self.period, move || {
            let scheduler = Arc::clone(&scheduler);
            async move {
                if let Err(e) = scheduler.tick().await {
                    tracing::warn!("reminder tick failed: {e}");
                }
            }
        })
    }
}
