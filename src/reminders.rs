//! Renewal reminders - one deferred task per subscription.
//!
//! Each subscription has at most one pending reminder, keyed by its id. Scheduling again
//! replaces the pending task instead of adding a second one. A fired reminder carries only
//! the subscription id; the receiver reloads the subscription and skips it if it has been
//! deleted in the meantime.

use crate::{
    config::settings::ReminderSettings,
    core::{
        subscription::get_subscription_by_id,
        summary::{days_until, format_currency},
    },
    entities::subscription,
};
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use sea_orm::ConnectionTrait;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, instrument, warn};

/// Payload of a fired reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderDue {
    /// The subscription the reminder was scheduled for
    pub subscription_id: i64,
}

#[derive(Debug)]
struct PendingReminder {
    generation: u64,
    fire_at: NaiveDateTime,
    billing_date: Option<NaiveDate>,
    handle: AbortHandle,
}

#[derive(Debug, Default)]
struct Book {
    pending: HashMap<i64, PendingReminder>,
    /// Billing date each subscription was last reminded about
    delivered: HashMap<i64, NaiveDate>,
}

fn lock(book: &Mutex<Book>) -> MutexGuard<'_, Book> {
    book.lock().unwrap_or_else(PoisonError::into_inner)
}

/// When the reminder for a charge on `next_billing_date` should fire.
///
/// Returns `None` only if the date arithmetic overflows.
#[must_use]
pub fn reminder_time(
    next_billing_date: NaiveDate,
    days_before: u32,
    hour_utc: u32,
) -> Option<NaiveDateTime> {
    let day = next_billing_date.checked_sub_signed(ChronoDuration::days(i64::from(days_before)))?;
    let time = NaiveTime::from_hms_opt(hour_utc, 0, 0)?;
    Some(day.and_time(time))
}

/// Text delivered when a reminder fires.
#[must_use]
pub fn reminder_message(sub: &subscription::Model, today: NaiveDate) -> String {
    let when = match days_until(sub.next_billing_date, today) {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        n if n > 1 => format!("in {n} days"),
        _ => format!("on {}", sub.next_billing_date.format("%Y-%m-%d")),
    };

    format!(
        "⏰ **{}** renews {when} ({}) for {}.",
        sub.name,
        sub.next_billing_date.format("%Y-%m-%d"),
        format_currency(sub.price)
    )
}

/// Reloads the subscription a fired reminder points at.
///
/// Returns `None` when it has been deleted since the reminder was scheduled, or when the
/// lookup fails; both cases are logged and the reminder is dropped.
pub async fn resolve_due<C>(db: &C, due: ReminderDue) -> Option<subscription::Model>
where
    C: ConnectionTrait,
{
    match get_subscription_by_id(db, due.subscription_id).await {
        Ok(Some(sub)) => Some(sub),
        Ok(None) => {
            info!(
                "Subscription {} no longer exists, dropping reminder",
                due.subscription_id
            );
            None
        }
        Err(e) => {
            error!("Failed to load subscription {}: {e}", due.subscription_id);
            None
        }
    }
}

/// Schedules, replaces and cancels per-subscription reminder tasks.
#[derive(Debug)]
pub struct ReminderScheduler {
    settings: ReminderSettings,
    sender: mpsc::UnboundedSender<ReminderDue>,
    book: Arc<Mutex<Book>>,
    next_generation: AtomicU64,
}

impl ReminderScheduler {
    /// Creates a scheduler and the receiver that fired reminders are delivered to.
    #[must_use]
    pub fn new(settings: ReminderSettings) -> (Self, mpsc::UnboundedReceiver<ReminderDue>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            settings,
            sender,
            book: Arc::new(Mutex::new(Book::default())),
            next_generation: AtomicU64::new(0),
        };
        (scheduler, receiver)
    }

    /// Schedules (or replaces) the reminder for `sub` relative to the current time.
    pub fn schedule(&self, sub: &subscription::Model) -> Option<NaiveDateTime> {
        self.schedule_from(sub, chrono::Utc::now().naive_utc())
    }

    /// Schedules (or replaces) the reminder for `sub` as if the current time were `now`.
    ///
    /// A billing date in the past cancels any pending reminder and schedules nothing. A
    /// reminder time in the past (with the billing date still ahead) fires immediately,
    /// unless a reminder for this billing date was already delivered. Returns the time the
    /// reminder will fire.
    #[instrument(skip(self, sub), fields(subscription_id = sub.id))]
    pub fn schedule_from(
        &self,
        sub: &subscription::Model,
        now: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        if sub.next_billing_date < now.date() {
            debug!("Billing date {} has passed, not scheduling", sub.next_billing_date);
            self.cancel(sub.id);
            return None;
        }

        let Some(fire_at) =
            reminder_time(sub.next_billing_date, self.settings.days_before, self.settings.hour_utc)
        else {
            warn!("Could not compute reminder time for {}", sub.next_billing_date);
            self.cancel(sub.id);
            return None;
        };
        let fire_at = fire_at.max(now);

        {
            let book = lock(&self.book);
            if book.delivered.get(&sub.id) == Some(&sub.next_billing_date) {
                debug!("Already reminded about {}", sub.next_billing_date);
                return None;
            }
            if let Some(pending) = book.pending.get(&sub.id) {
                if pending.fire_at == fire_at
                    && pending.billing_date == Some(sub.next_billing_date)
                {
                    return Some(fire_at);
                }
            }
        }

        self.spawn(sub.id, fire_at, now, Some(sub.next_billing_date));
        Some(fire_at)
    }

    /// Schedules (or replaces) a reminder for `subscription_id` at `fire_at`.
    pub fn schedule_at(&self, subscription_id: i64, fire_at: NaiveDateTime, now: NaiveDateTime) {
        self.spawn(subscription_id, fire_at, now, None);
    }

    fn spawn(
        &self,
        subscription_id: i64,
        fire_at: NaiveDateTime,
        now: NaiveDateTime,
        billing_date: Option<NaiveDate>,
    ) {
        let delay = (fire_at - now).to_std().unwrap_or_default();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        // Hold the lock while spawning so the task cannot look itself up before it is
        // registered.
        let mut book = lock(&self.book);

        let task_book = Arc::clone(&self.book);
        let sender = self.sender.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            {
                let mut book = lock(&task_book);
                if !book
                    .pending
                    .get(&subscription_id)
                    .is_some_and(|p| p.generation == generation)
                {
                    return;
                }
                book.pending.remove(&subscription_id);
                if let Some(date) = billing_date {
                    book.delivered.insert(subscription_id, date);
                }
            }

            if sender.send(ReminderDue { subscription_id }).is_err() {
                warn!("Reminder receiver dropped; reminder for {subscription_id} lost");
            }
        });

        let replaced = book.pending.insert(
            subscription_id,
            PendingReminder {
                generation,
                fire_at,
                billing_date,
                handle: handle.abort_handle(),
            },
        );
        if let Some(old) = replaced {
            old.handle.abort();
            debug!("Replaced reminder for {subscription_id} (was {})", old.fire_at);
        }

        info!("Reminder for subscription {subscription_id} scheduled at {fire_at}");
    }

    /// Cancels the pending reminder for `subscription_id`. Returns true if one was pending.
    pub fn cancel(&self, subscription_id: i64) -> bool {
        let mut book = lock(&self.book);
        book.delivered.remove(&subscription_id);
        book.pending.remove(&subscription_id).is_some_and(|p| {
            p.handle.abort();
            debug!("Cancelled reminder for {subscription_id}");
            true
        })
    }

    /// Time the pending reminder for `subscription_id` will fire, if any.
    #[must_use]
    pub fn scheduled_time(&self, subscription_id: i64) -> Option<NaiveDateTime> {
        lock(&self.book).pending.get(&subscription_id).map(|p| p.fire_at)
    }

    /// Number of reminders waiting to fire.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        lock(&self.book).pending.len()
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        for (_, pending) in lock(&self.book).pending.drain() {
            pending.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::subscription::delete_subscription;
    use crate::test_utils::{
        create_test_subscription, date, setup_test_db, subscription_model,
    };
    use std::time::Duration;
    use tokio::sync::mpsc::error::TryRecvError;

    fn at(day: NaiveDate, hour: u32) -> NaiveDateTime {
        day.and_hms_opt(hour, 0, 0).unwrap()
    }

    fn scheduler() -> (ReminderScheduler, mpsc::UnboundedReceiver<ReminderDue>) {
        ReminderScheduler::new(ReminderSettings {
            channel_id: None,
            days_before: 1,
            hour_utc: 9,
        })
    }

    #[test]
    fn test_reminder_time() {
        assert_eq!(
            reminder_time(date(2025, 3, 1), 1, 9),
            Some(at(date(2025, 2, 28), 9))
        );
        assert_eq!(reminder_time(date(2025, 3, 1), 0, 0), Some(at(date(2025, 3, 1), 0)));
        assert_eq!(reminder_time(date(2025, 3, 1), 1, 24), None);
    }

    #[tokio::test]
    async fn test_resolve_due_drops_deleted_subscription() -> crate::errors::Result<()> {
        let db = setup_test_db().await?;
        let sub = create_test_subscription(&db, "Netflix", 15.99, "Entertainment").await?;
        let due = ReminderDue {
            subscription_id: sub.id,
        };

        let resolved = resolve_due(&db, due).await.unwrap();
        assert_eq!(resolved.name, "Netflix");

        delete_subscription(&db, sub.id).await?;
        assert!(resolve_due(&db, due).await.is_none());
        assert!(
            resolve_due(&db, ReminderDue { subscription_id: 999 })
                .await
                .is_none()
        );
        Ok(())
    }

    #[test]
    fn test_reminder_message() {
        let sub = subscription_model(1, "Netflix", 15.99, "Entertainment", date(2025, 3, 2));
        let msg = reminder_message(&sub, date(2025, 3, 1));
        assert!(msg.contains("Netflix"));
        assert!(msg.contains("tomorrow"));
        assert!(msg.contains("$15.99"));

        assert!(reminder_message(&sub, date(2025, 3, 2)).contains("today"));
        assert!(reminder_message(&sub, date(2025, 2, 25)).contains("in 5 days"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reminder_fires_with_subscription_id() {
        let (scheduler, mut rx) = scheduler();
        let now = at(date(2025, 1, 1), 0);

        scheduler.schedule_at(7, now + ChronoDuration::seconds(10), now);
        assert_eq!(scheduler.pending_count(), 1);

        let started = tokio::time::Instant::now();
        let due = rx.recv().await.unwrap();
        assert_eq!(due.subscription_id, 7);
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_pending_reminder() {
        let (scheduler, mut rx) = scheduler();
        let now = at(date(2025, 1, 1), 0);

        scheduler.schedule_at(1, now + ChronoDuration::seconds(10), now);
        scheduler.schedule_at(1, now + ChronoDuration::seconds(20), now);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(
            scheduler.scheduled_time(1),
            Some(now + ChronoDuration::seconds(20))
        );

        let started = tokio::time::Instant::now();
        let due = rx.recv().await.unwrap();
        assert_eq!(due.subscription_id, 1);
        assert!(started.elapsed() >= Duration::from_secs(20));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_delivery() {
        let (scheduler, mut rx) = scheduler();
        let now = at(date(2025, 1, 1), 0);

        scheduler.schedule_at(3, now + ChronoDuration::seconds(5), now);
        assert!(scheduler.cancel(3));
        assert!(!scheduler.cancel(3));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_subscriptions_both_fire() {
        let (scheduler, mut rx) = scheduler();
        let now = at(date(2025, 1, 1), 0);

        scheduler.schedule_at(1, now + ChronoDuration::seconds(5), now);
        scheduler.schedule_at(2, now + ChronoDuration::seconds(10), now);

        assert_eq!(rx.recv().await.unwrap().subscription_id, 1);
        assert_eq!(rx.recv().await.unwrap().subscription_id, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_from_uses_settings() {
        let (scheduler, _rx) = scheduler();
        let sub = subscription_model(1, "Netflix", 15.99, "Entertainment", date(2025, 3, 10));

        let fire_at = scheduler.schedule_from(&sub, at(date(2025, 3, 1), 12));
        assert_eq!(fire_at, Some(at(date(2025, 3, 9), 9)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_from_fires_immediately_when_reminder_time_passed() {
        let (scheduler, mut rx) = scheduler();
        let now = at(date(2025, 3, 10), 12);
        let sub = subscription_model(4, "Netflix", 15.99, "Entertainment", date(2025, 3, 10));

        assert_eq!(scheduler.schedule_from(&sub, now), Some(now));
        assert_eq!(rx.recv().await.unwrap().subscription_id, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_from_skips_past_billing_date() {
        let (scheduler, _rx) = scheduler();
        let now = at(date(2025, 3, 10), 12);

        let future = subscription_model(5, "A", 1.0, "Music", date(2025, 4, 1));
        scheduler.schedule_from(&future, now);
        assert_eq!(scheduler.pending_count(), 1);

        // Moving the billing date into the past cancels the pending reminder
        let past = subscription_model(5, "A", 1.0, "Music", date(2025, 3, 1));
        assert_eq!(scheduler.schedule_from(&past, now), None);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivered_reminder_is_not_repeated() {
        let (scheduler, mut rx) = scheduler();
        let now = at(date(2025, 3, 10), 12);
        let sub = subscription_model(6, "Netflix", 15.99, "Entertainment", date(2025, 3, 10));

        scheduler.schedule_from(&sub, now);
        assert_eq!(rx.recv().await.unwrap().subscription_id, 6);

        // A later refresh on the same billing day does not remind again
        let later = now + ChronoDuration::hours(1);
        assert_eq!(scheduler.schedule_from(&sub, later), None);
        assert_eq!(scheduler.pending_count(), 0);

        // The next billing date gets its own reminder
        let next = subscription_model(6, "Netflix", 15.99, "Entertainment", date(2025, 4, 10));
        assert_eq!(scheduler.schedule_from(&next, later), Some(at(date(2025, 4, 9), 9)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_from_same_time_keeps_pending_task() {
        let (scheduler, _rx) = scheduler();
        let now = at(date(2025, 3, 1), 12);
        let sub = subscription_model(8, "Spotify", 9.99, "Music", date(2025, 3, 20));

        let first = scheduler.schedule_from(&sub, now);
        let second = scheduler.schedule_from(&sub, now + ChronoDuration::hours(1));
        assert_eq!(first, second);
        assert_eq!(scheduler.pending_count(), 1);
    }
}
