//! Expiry Sweeper
//!
//! Finds active reservations past their `expires_at`, marks them `expired`
//! and hands their slots back. Runs in a tokio interval loop and can also be
//! triggered by hand. A confirmation racing the sweep is resolved by storage:
//! whichever write moves the reservation out of `active` first wins, and the
//! other side observes the changed status.

use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::events::{Event, ReservationReleasedEvent};
use crate::domain::{DomainResult, RepositoryProvider, SharedNotificationSink, StatusMachine};
use crate::shared::errors::DomainError;
use crate::shared::retry::{retry_with_backoff, RetryConfig};
use crate::shared::shutdown::ShutdownSignal;
use crate::shared::time::SharedClock;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Holds moved to `expired` with their slot released.
    pub released: u32,
    /// Holds that were confirmed or cancelled between the scan and the write.
    pub skipped: u32,
}

#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub interval_secs: u64,
    /// Finished reservations older than this are deleted after each sweep.
    pub retention_minutes: i64,
    pub retry: RetryConfig,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            retention_minutes: 24 * 60,
            retry: RetryConfig::default(),
        }
    }
}

pub struct ExpirySweeper {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    notifier: SharedNotificationSink,
}

impl ExpirySweeper {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        clock: SharedClock,
        notifier: SharedNotificationSink,
    ) -> Self {
        Self {
            repos,
            clock,
            notifier,
        }
    }

    /// Release every hold whose window has ended. Safe to run any number of
    /// times; a second run with nothing newly expired releases nothing.
    pub async fn sweep_expired(&self) -> DomainResult<SweepReport> {
        let now = self.clock.now();
        let expired = self.repos.reservations().find_expired_active(now).await?;

        let mut report = SweepReport::default();
        for reservation in expired {
            let release = match reservation.expiry(now) {
                Ok(release) => release,
                Err(err) => {
                    debug!(reservation_id = %reservation.reservation_id, error = %err, "Skipping reservation");
                    report.skipped += 1;
                    continue;
                }
            };

            if !self.repos.reservations().release(release.clone()).await? {
                debug!(
                    reservation_id = %release.reservation_id,
                    "Reservation left active state before expiry"
                );
                report.skipped += 1;
                continue;
            }

            report.released += 1;
            metrics::counter!("parking_reservations_released_total", "reason" => "expired")
                .increment(1);
            self.notifier
                .notify(Event::ReservationReleased(ReservationReleasedEvent {
                    reservation_id: release.reservation_id,
                    slot_id: release.slot_id,
                    status: release.reservation.to.as_str().to_string(),
                    timestamp: now,
                }));
        }

        if report.released > 0 {
            info!(released = report.released, skipped = report.skipped, "Expired reservations released");
        }
        Ok(report)
    }

    /// Delete finished holds whose window ended more than `retention_minutes` ago.
    pub async fn purge(&self, retention_minutes: i64) -> DomainResult<u64> {
        let cutoff = self.clock.now() - ChronoDuration::minutes(retention_minutes.max(0));
        let removed = self.repos.reservations().purge_finished(cutoff).await?;
        if removed > 0 {
            info!(removed, %cutoff, "Purged finished reservations");
        }
        Ok(removed)
    }

    /// Spawn the periodic sweep. Stops when `shutdown` fires.
    pub fn start(self: Arc<Self>, config: SweeperConfig, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_secs = config.interval_secs, "Expiry sweeper started");

            let mut interval = tokio::time::interval(Duration::from_secs(config.interval_secs.max(1)));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => self.tick(&config).await,
                    _ = shutdown.notified().wait() => {
                        info!("Expiry sweeper shutting down");
                        break;
                    }
                }
            }

            info!("Expiry sweeper stopped");
        })
    }

    async fn tick(&self, config: &SweeperConfig) {
        let swept = retry_with_backoff(
            &config.retry,
            "expiry_sweep",
            || self.sweep_expired(),
            DomainError::is_transient,
        )
        .await;
        if let Err(e) = swept {
            warn!(error = %e, "Expiry sweep failed");
            return;
        }

        if let Err(e) = self.purge(config.retention_minutes).await {
            warn!(error = %e, "Reservation purge failed");
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::application::parking::services::allocation::{ReservationSummary, ReserveSlotCommand};
    use crate::application::parking::services::booking::CreateBookingCommand;
    use crate::application::parking::test_support::Fixture;
    use crate::domain::inventory::SlotStatus;
    use crate::domain::ReservationStatus;

    async fn hold(fx: &Fixture, floor_id: i32, minutes: i64) -> ReservationSummary {
        fx.services
            .allocation
            .reserve_random_slot(ReserveSlotCommand {
                floor_id,
                user_id: 1,
                vehicle_type: "Roda Dua".into(),
                duration_minutes: Some(minutes),
            })
            .await
            .unwrap()
    }

    fn start_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T13:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn nothing_to_release_before_the_hold_ends() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        let floor = fx.floor(area.id, 1, "Roda Dua", 1).await;
        let held = hold(&fx, floor.floor.id, 5).await;

        fx.clock.advance(ChronoDuration::seconds(299));
        let report = fx.services.sweeper.sweep_expired().await.unwrap();
        assert_eq!(report.released, 0);
        assert_eq!(fx.slot_status(held.slot.id).await, SlotStatus::Reserved);
    }

    #[tokio::test]
    async fn hold_ending_exactly_now_is_swept() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        let floor = fx.floor(area.id, 1, "Roda Dua", 1).await;
        let held = hold(&fx, floor.floor.id, 1).await;

        fx.clock.advance(ChronoDuration::minutes(1));
        let report = fx.services.sweeper.sweep_expired().await.unwrap();
        assert_eq!(report.released, 1);
        assert_eq!(
            fx.reservation(held.reservation.reservation_id).await.status,
            ReservationStatus::Expired
        );
    }

    #[tokio::test]
    async fn only_overdue_holds_are_released() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        let floor = fx.floor(area.id, 1, "Roda Dua", 2).await;
        let short = hold(&fx, floor.floor.id, 2).await;
        let long = hold(&fx, floor.floor.id, 20).await;

        fx.clock.advance(ChronoDuration::minutes(3));
        let report = fx.services.sweeper.sweep_expired().await.unwrap();
        assert_eq!(report.released, 1);
        assert_eq!(fx.slot_status(short.slot.id).await, SlotStatus::Available);
        assert_eq!(fx.slot_status(long.slot.id).await, SlotStatus::Reserved);
    }

    #[tokio::test]
    async fn released_slot_can_be_reserved_again() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        let floor = fx.floor(area.id, 1, "Roda Dua", 1).await;
        let first = hold(&fx, floor.floor.id, 5).await;

        fx.clock.advance(ChronoDuration::minutes(6));
        fx.services.sweeper.sweep_expired().await.unwrap();

        let second = hold(&fx, floor.floor.id, 5).await;
        assert_eq!(second.slot.id, first.slot.id);
        assert_ne!(second.reservation.reservation_id, first.reservation.reservation_id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sweep_racing_a_confirmation_has_exactly_one_winner() {
        for _ in 0..20 {
            let fx = Fixture::new();
            let area = fx.area(10).await;
            let floor = fx.floor(area.id, 1, "Roda Dua", 1).await;
            let vehicle = fx.vehicle("Roda Dua");
            let held = hold(&fx, floor.floor.id, 5).await;
            let reservation_id = held.reservation.reservation_id;

            // The confirmation may read the clock on either side of the
            // advance; every interleaving must leave one consistent winner.
            let booking = fx.services.booking.clone();
            let confirm = tokio::spawn(async move {
                booking
                    .create_booking(CreateBookingCommand {
                        parking_area_id: area.id,
                        vehicle_id: vehicle,
                        start_time: start_time(),
                        duration_minutes: 60,
                        slot_id: None,
                        reservation_id: Some(reservation_id),
                    })
                    .await
            });
            fx.clock.advance(ChronoDuration::minutes(5));
            let sweep = fx.services.sweeper.sweep_expired().await.unwrap();
            let confirmed = confirm.await.unwrap();

            let reservation = fx.reservation(reservation_id).await;
            let slot = fx.slot_status(held.slot.id).await;
            match reservation.status {
                ReservationStatus::Confirmed => {
                    assert!(confirmed.is_ok());
                    assert_eq!(sweep.released, 0);
                    assert_eq!(slot, SlotStatus::Occupied);
                }
                ReservationStatus::Expired => {
                    assert_eq!(confirmed.unwrap_err().code(), "RESERVATION_EXPIRED");
                    assert_eq!(sweep.released, 1);
                    assert_eq!(slot, SlotStatus::Available);
                }
                other => panic!("unexpected status {other}"),
            }
        }
    }

    #[tokio::test]
    async fn purge_keeps_recent_and_referenced_reservations() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        let floor = fx.floor(area.id, 1, "Roda Dua", 3).await;
        let vehicle = fx.vehicle("Roda Dua");

        let stale = hold(&fx, floor.floor.id, 5).await;
        let cancelled = hold(&fx, floor.floor.id, 5).await;
        let confirmed = hold(&fx, floor.floor.id, 5).await;
        fx.services
            .allocation
            .cancel_reservation(cancelled.reservation.reservation_id)
            .await
            .unwrap();
        fx.services
            .booking
            .create_booking(CreateBookingCommand {
                parking_area_id: area.id,
                vehicle_id: vehicle,
                start_time: start_time(),
                duration_minutes: 60,
                slot_id: None,
                reservation_id: Some(confirmed.reservation.reservation_id),
            })
            .await
            .unwrap();

        fx.clock.advance(ChronoDuration::minutes(6));
        fx.services.sweeper.sweep_expired().await.unwrap();
        assert_eq!(fx.services.sweeper.purge(60).await.unwrap(), 0);

        fx.clock.advance(ChronoDuration::minutes(60));
        assert_eq!(fx.services.sweeper.purge(60).await.unwrap(), 2);
        assert!(fx
            .store
            .reservation(stale.reservation.reservation_id)
            .await
            .is_none());
        assert!(fx
            .store
            .reservation(confirmed.reservation.reservation_id)
            .await
            .is_some());
    }

    #[tokio::test]
    async fn background_task_sweeps_and_stops_on_shutdown() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        let floor = fx.floor(area.id, 1, "Roda Dua", 1).await;
        let held = hold(&fx, floor.floor.id, 1).await;
        fx.clock.advance(ChronoDuration::minutes(2));

        let shutdown = ShutdownSignal::new();
        let handle = fx.services.sweeper.clone().start(
            SweeperConfig {
                interval_secs: 1,
                ..SweeperConfig::default()
            },
            shutdown.clone(),
        );

        // The first interval tick fires immediately.
        for _ in 0..50 {
            if fx.slot_status(held.slot.id).await == SlotStatus::Available {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(fx.slot_status(held.slot.id).await, SlotStatus::Available);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
