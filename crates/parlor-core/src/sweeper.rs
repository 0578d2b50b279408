//! Inactivity sweeper: periodically evicts participants whose heartbeat
//! went stale and announces each departure to the room.
//!
//! A sweep is one bulk compare-and-delete (`last_status < now - threshold`)
//! followed by one `status` message per evicted participant. The
//! announcements run as a bounded task group and the sweep only completes
//! once every announcement has finished, so the outcome of a tick is
//! observable through [`SweepReport`].
//!
//! Eviction is never rolled back: a participant whose announcement fails
//! stays evicted, and the failure is logged and counted.

use std::sync::Arc;
use std::time::Duration;

use parlor_db::ChatStore;
use parlor_types::{LEAVE_STATUS_TEXT, Message};
use tokio::sync::{Semaphore, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::{ConfigError, PresenceConfig};
use crate::error::ChatError;

/// Outcome of a single sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Names removed from the registry by this sweep.
    pub evicted: Vec<String>,
    /// Departure announcements that were written.
    pub announced: usize,
    /// Departure announcements that failed.
    pub failed: usize,
}

/// Evicts stale participants on a fixed interval.
#[derive(Clone)]
pub struct Sweeper {
    store: Arc<dyn ChatStore>,
    clock: Arc<dyn Clock>,
    threshold_ms: i64,
    interval: Duration,
    max_concurrent_announcements: usize,
}

impl Sweeper {
    /// Create a sweeper using the timing in `presence`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `presence` fails validation.
    pub fn new(
        store: Arc<dyn ChatStore>,
        clock: Arc<dyn Clock>,
        presence: &PresenceConfig,
    ) -> Result<Self, ConfigError> {
        presence.validate()?;
        Ok(Self {
            store,
            clock,
            threshold_ms: presence.inactivity_threshold_millis()?,
            interval: presence.sweep_interval(),
            max_concurrent_announcements: presence.max_concurrent_announcements,
        })
    }

    /// Run one sweep to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::StoreUnavailable`] if the bulk delete fails.
    /// Announcement failures are reported in the [`SweepReport`] instead.
    pub async fn sweep_once(&self) -> Result<SweepReport, ChatError> {
        let cutoff = self.clock.now_millis().saturating_sub(self.threshold_ms);
        let evicted = self.store.delete_stale_participants(cutoff).await?;

        let mut report = SweepReport {
            evicted: evicted.into_iter().map(|p| p.name).collect(),
            ..SweepReport::default()
        };
        if report.evicted.is_empty() {
            debug!(cutoff, "Sweep found no stale participants");
            return Ok(report);
        }

        let permits = Arc::new(Semaphore::new(self.max_concurrent_announcements));
        let mut announcements = JoinSet::new();
        for name in &report.evicted {
            let store = Arc::clone(&self.store);
            let clock = Arc::clone(&self.clock);
            let permits = Arc::clone(&permits);
            let name = name.clone();
            announcements.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let outcome = announce_departure(store.as_ref(), clock.as_ref(), &name).await;
                (name, outcome)
            });
        }

        while let Some(joined) = announcements.join_next().await {
            match joined {
                Ok((_, Ok(()))) => report.announced = report.announced.saturating_add(1),
                Ok((name, Err(e))) => {
                    warn!(name = %name, error = %e, "Failed to announce departure");
                    report.failed = report.failed.saturating_add(1);
                }
                Err(e) => {
                    warn!(error = %e, "Departure announcement task aborted");
                    report.failed = report.failed.saturating_add(1);
                }
            }
        }

        info!(
            cutoff,
            evicted = ?report.evicted,
            announced = report.announced,
            failed = report.failed,
            "Evicted inactive participants"
        );
        Ok(report)
    }

    /// Start the periodic sweep on a background task.
    ///
    /// The first sweep happens one full interval after this call. A sweep
    /// that fails is logged and the loop carries on with the next tick.
    pub fn spawn(&self) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let sweeper = self.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweeper.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick of an interval completes immediately.
            ticker.tick().await;

            info!(
                interval_ms = sweeper.interval.as_millis(),
                threshold_ms = sweeper.threshold_ms,
                "Inactivity sweeper started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = sweeper.sweep_once().await {
                            error!(error = %e, "Inactivity sweep failed");
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }

            info!("Inactivity sweeper stopped");
        });

        SweeperHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Handle to a running sweeper loop.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the loop and wait for it to exit. A sweep already in progress
    /// runs to completion first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "Inactivity sweeper task failed");
        }
    }
}

async fn announce_departure(
    store: &dyn ChatStore,
    clock: &dyn Clock,
    name: &str,
) -> Result<(), ChatError> {
    let time = clock.format_time(clock.now_millis())?;
    store
        .insert_message(&Message::status(name, LEAVE_STATUS_TEXT, time))
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parlor_db::{DbError, MemoryStore};
    use parlor_types::{BROADCAST_AUDIENCE, MessageType, Participant};

    use super::*;
    use crate::clock::ManualClock;

    const THRESHOLD: i64 = 10_000;
    const INTERVAL: Duration = Duration::from_millis(15_000);

    fn presence() -> PresenceConfig {
        PresenceConfig {
            inactivity_threshold_ms: 10_000,
            sweep_interval_ms: 15_000,
            max_concurrent_announcements: 2,
        }
    }

    /// Wraps a [`MemoryStore`], fails selected operations, and can slow
    /// message writes down to record how many overlap.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        refuse_announcement_for: Option<&'static str>,
        failing_deletes: AtomicUsize,
        write_delay: Option<Duration>,
        writes_in_flight: AtomicUsize,
        peak_writes_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl ChatStore for FlakyStore {
        async fn find_participant(&self, name: &str) -> Result<Option<Participant>, DbError> {
            self.inner.find_participant(name).await
        }

        async fn list_participants(&self) -> Result<Vec<Participant>, DbError> {
            self.inner.list_participants().await
        }

        async fn insert_participant(&self, participant: &Participant) -> Result<bool, DbError> {
            self.inner.insert_participant(participant).await
        }

        async fn touch_participant(&self, name: &str, at: i64) -> Result<bool, DbError> {
            self.inner.touch_participant(name, at).await
        }

        async fn delete_stale_participants(
            &self,
            cutoff: i64,
        ) -> Result<Vec<Participant>, DbError> {
            let remaining = self.failing_deletes.load(Ordering::Acquire);
            if remaining > 0 {
                self.failing_deletes
                    .store(remaining.saturating_sub(1), Ordering::Release);
                return Err(DbError::Config("store offline".to_owned()));
            }
            self.inner.delete_stale_participants(cutoff).await
        }

        async fn insert_message(&self, message: &Message) -> Result<(), DbError> {
            if self.refuse_announcement_for == Some(message.from.as_str()) {
                return Err(DbError::Config("write refused".to_owned()));
            }
            if let Some(delay) = self.write_delay {
                let now = self
                    .writes_in_flight
                    .fetch_add(1, Ordering::AcqRel)
                    .saturating_add(1);
                self.peak_writes_in_flight.fetch_max(now, Ordering::AcqRel);
                tokio::time::sleep(delay).await;
                self.writes_in_flight.fetch_sub(1, Ordering::AcqRel);
            }
            self.inner.insert_message(message).await
        }

        async fn messages_visible_to(&self, user: &str) -> Result<Vec<Message>, DbError> {
            self.inner.messages_visible_to(user).await
        }
    }

    async fn seed(store: &dyn ChatStore, name: &str, last_status: i64) {
        assert!(
            store
                .insert_participant(&Participant::new(name, last_status))
                .await
                .unwrap()
        );
    }

    async fn names(store: &dyn ChatStore) -> Vec<String> {
        store
            .list_participants()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect()
    }

    #[tokio::test]
    async fn evicts_exactly_the_stale_participant() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(100_000));
        seed(store.as_ref(), "alice", 95_000).await;
        seed(store.as_ref(), "bob", 99_000).await;
        seed(store.as_ref(), "carol", 100_000 - THRESHOLD - 1).await;

        let sweeper = Sweeper::new(store.clone(), clock, &presence()).unwrap();
        let report = sweeper.sweep_once().await.unwrap();

        assert_eq!(report.evicted, ["carol"]);
        assert_eq!(report.announced, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(names(store.as_ref()).await, ["alice", "bob"]);

        let log = store.messages_visible_to("alice").await.unwrap();
        assert_eq!(log.len(), 1);
        let departure = log.first().unwrap();
        assert_eq!(departure.from, "carol");
        assert_eq!(departure.to, BROADCAST_AUDIENCE);
        assert_eq!(departure.text, LEAVE_STATUS_TEXT);
        assert_eq!(departure.message_type, MessageType::Status);
    }

    #[tokio::test]
    async fn participant_exactly_at_cutoff_survives() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(100_000));
        seed(store.as_ref(), "alice", 100_000 - THRESHOLD).await;

        let sweeper = Sweeper::new(store.clone(), clock, &presence()).unwrap();
        let report = sweeper.sweep_once().await.unwrap();

        assert_eq!(report, SweepReport::default());
        assert_eq!(names(store.as_ref()).await, ["alice"]);
        assert_eq!(store.message_count().await, 0);
    }

    #[tokio::test]
    async fn announcement_is_stamped_at_emission_time() {
        let store = Arc::new(MemoryStore::new());
        // 00:01:40 UTC
        let clock = Arc::new(ManualClock::new(100_000));
        seed(store.as_ref(), "carol", 0).await;

        let sweeper = Sweeper::new(store.clone(), clock, &presence()).unwrap();
        sweeper.sweep_once().await.unwrap();

        let log = store.messages_visible_to("carol").await.unwrap();
        assert_eq!(log.first().unwrap().time, "00:01:40");
    }

    #[tokio::test(start_paused = true)]
    async fn many_evictions_respect_the_concurrency_bound() {
        let store = Arc::new(FlakyStore {
            write_delay: Some(Duration::from_millis(5)),
            ..FlakyStore::default()
        });
        let clock = Arc::new(ManualClock::new(100_000));
        for i in 0..10 {
            seed(store.as_ref(), &format!("idle-{i}"), 0).await;
        }

        let bound = presence().max_concurrent_announcements;
        let sweeper = Sweeper::new(store.clone(), clock, &presence()).unwrap();
        let report = sweeper.sweep_once().await.unwrap();

        assert_eq!(report.evicted.len(), 10);
        assert_eq!(report.announced, 10);
        assert!(names(store.as_ref()).await.is_empty());
        assert_eq!(store.inner.message_count().await, 10);

        let peak = store.peak_writes_in_flight.load(Ordering::Acquire);
        assert!(peak <= bound, "{peak} announcements overlapped, bound is {bound}");
        assert_eq!(peak, bound);
        assert_eq!(store.writes_in_flight.load(Ordering::Acquire), 0);
    }

    #[tokio::test]
    async fn failed_announcement_does_not_undo_eviction() {
        let store = Arc::new(FlakyStore {
            refuse_announcement_for: Some("bob"),
            ..FlakyStore::default()
        });
        let clock = Arc::new(ManualClock::new(100_000));
        seed(store.as_ref(), "alice", 0).await;
        seed(store.as_ref(), "bob", 0).await;

        let sweeper = Sweeper::new(store.clone(), clock, &presence()).unwrap();
        let report = sweeper.sweep_once().await.unwrap();

        assert_eq!(report.evicted.len(), 2);
        assert_eq!(report.announced, 1);
        assert_eq!(report.failed, 1);
        assert!(names(store.as_ref()).await.is_empty());

        let log = store.messages_visible_to("alice").await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.first().unwrap().from, "alice");
    }

    #[tokio::test]
    async fn failed_delete_is_store_unavailable() {
        let store = Arc::new(FlakyStore {
            failing_deletes: AtomicUsize::new(1),
            ..FlakyStore::default()
        });
        let clock = Arc::new(ManualClock::new(100_000));
        seed(store.as_ref(), "alice", 0).await;

        let sweeper = Sweeper::new(store.clone(), clock, &presence()).unwrap();

        assert!(matches!(
            sweeper.sweep_once().await,
            Err(ChatError::StoreUnavailable(_))
        ));
        assert_eq!(names(store.as_ref()).await, ["alice"]);
    }

    #[tokio::test(start_paused = true)]
    async fn first_sweep_waits_one_full_interval() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(100_000));
        seed(store.as_ref(), "carol", 0).await;

        let handle = Sweeper::new(store.clone(), clock, &presence())
            .unwrap()
            .spawn();

        tokio::time::sleep(INTERVAL.saturating_sub(Duration::from_millis(1))).await;
        assert_eq!(names(store.as_ref()).await, ["carol"]);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(names(store.as_ref()).await.is_empty());
        assert_eq!(store.message_count().await, 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn loop_survives_a_failed_tick() {
        let store = Arc::new(FlakyStore {
            failing_deletes: AtomicUsize::new(1),
            ..FlakyStore::default()
        });
        let clock = Arc::new(ManualClock::new(100_000));
        seed(store.as_ref(), "carol", 0).await;

        let handle = Sweeper::new(store.clone(), clock, &presence())
            .unwrap()
            .spawn();

        tokio::time::sleep(INTERVAL.saturating_add(Duration::from_millis(1))).await;
        assert_eq!(names(store.as_ref()).await, ["carol"]);

        tokio::time::sleep(INTERVAL).await;
        assert!(names(store.as_ref()).await.is_empty());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_further_sweeps() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(100_000));

        let handle = Sweeper::new(store.clone(), clock, &presence())
            .unwrap()
            .spawn();
        handle.shutdown().await;

        seed(store.as_ref(), "carol", 0).await;
        tokio::time::sleep(INTERVAL.saturating_mul(3)).await;

        assert_eq!(names(store.as_ref()).await, ["carol"]);
    }

    #[test]
    fn zero_bound_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(0));
        let bad = PresenceConfig {
            max_concurrent_announcements: 0,
            ..presence()
        };

        assert!(Sweeper::new(store, clock, &bad).is_err());
    }
}
