//! Repository layer - every write goes through [`Store`].
//!
//! The store validates form input, calls into [`crate::core`], keeps renewal reminders in
//! step with the data and bumps a revision counter that the state holders in
//! [`crate::state`] watch. Reads can go straight to the core functions via [`Store::db`].

use crate::{
    core::{
        category::{self, CategoryDeletion},
        preference::{self, Theme},
        subscription,
        validation::{CategoryForm, SubscriptionForm, SubscriptionDraft},
    },
    entities,
    errors::{Error, Result},
    reminders::ReminderScheduler,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

/// Owns the database connection, the change revision and the reminder scheduler.
#[derive(Debug)]
pub struct Store {
    db: DatabaseConnection,
    revision: watch::Sender<u64>,
    theme: watch::Sender<Theme>,
    reminders: ReminderScheduler,
}

impl Store {
    /// Opens the store over an initialized database, loading the saved theme.
    pub async fn open(db: DatabaseConnection, reminders: ReminderScheduler) -> Result<Self> {
        let theme = preference::get_theme(&db).await?;
        Ok(Self {
            db,
            revision: watch::Sender::new(0),
            theme: watch::Sender::new(theme),
            reminders,
        })
    }

    /// The underlying connection, for reads.
    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// The reminder scheduler.
    #[must_use]
    pub const fn reminders(&self) -> &ReminderScheduler {
        &self.reminders
    }

    /// Receiver that changes after every write.
    #[must_use]
    pub fn subscribe_revision(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Receiver for the current theme.
    #[must_use]
    pub fn subscribe_theme(&self) -> watch::Receiver<Theme> {
        self.theme.subscribe()
    }

    /// Signals that the data changed (or that the date moved on).
    pub fn touch(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }

    async fn checked_draft(&self, form: &SubscriptionForm) -> Result<SubscriptionDraft> {
        let mut draft = form.validate()?;
        let owner = category::get_category_by_name(&self.db, &draft.category)
            .await?
            .ok_or_else(|| Error::CategoryNotFound {
                name: draft.category.clone(),
            })?;
        draft.category = owner.name;
        Ok(draft)
    }

    /// Validates and stores a new subscription, then schedules its reminder.
    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn add_subscription(
        &self,
        form: &SubscriptionForm,
    ) -> Result<entities::subscription::Model> {
        let draft = self.checked_draft(form).await?;
        let created = subscription::create_subscription(&self.db, &draft).await?;

        self.reminders.schedule(&created);
        self.touch();
        info!("Added subscription {} ({})", created.id, created.name);
        Ok(created)
    }

    /// Validates and replaces a subscription, then reschedules its reminder.
    #[instrument(skip(self, form))]
    pub async fn update_subscription(
        &self,
        subscription_id: i64,
        form: &SubscriptionForm,
    ) -> Result<entities::subscription::Model> {
        let draft = self.checked_draft(form).await?;
        let updated = subscription::update_subscription(&self.db, subscription_id, &draft).await?;

        self.reminders.schedule(&updated);
        self.touch();
        Ok(updated)
    }

    /// Moves a subscription to another existing category.
    #[instrument(skip(self))]
    pub async fn move_subscription(
        &self,
        subscription_id: i64,
        category_name: &str,
    ) -> Result<entities::subscription::Model> {
        let owner = category::get_category_by_name(&self.db, category_name)
            .await?
            .ok_or_else(|| Error::CategoryNotFound {
                name: category_name.to_string(),
            })?;

        let moved =
            subscription::update_subscription_category(&self.db, subscription_id, &owner.name)
                .await?;
        self.touch();
        Ok(moved)
    }

    /// Deletes a subscription and cancels its reminder.
    #[instrument(skip(self))]
    pub async fn delete_subscription(
        &self,
        subscription_id: i64,
    ) -> Result<entities::subscription::Model> {
        let deleted = subscription::delete_subscription(&self.db, subscription_id).await?;

        self.reminders.cancel(deleted.id);
        self.touch();
        info!("Deleted subscription {} ({})", deleted.id, deleted.name);
        Ok(deleted)
    }

    /// Validates and stores a new category.
    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn add_category(&self, form: &CategoryForm) -> Result<entities::category::Model> {
        let draft = form.validate()?;
        let created = category::create_category(&self.db, &draft).await?;
        self.touch();
        Ok(created)
    }

    /// Validates and replaces the category currently named `current_name`.
    #[instrument(skip(self, form))]
    pub async fn update_category(
        &self,
        current_name: &str,
        form: &CategoryForm,
    ) -> Result<entities::category::Model> {
        let draft = form.validate()?;
        let updated = category::update_category(&self.db, current_name, &draft).await?;
        self.touch();
        Ok(updated)
    }

    /// Deletes a category and its subscriptions, cancelling their reminders.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, name: &str) -> Result<CategoryDeletion> {
        let deletion = category::delete_category(&self.db, name).await?;

        for id in &deletion.removed_subscription_ids {
            self.reminders.cancel(*id);
        }
        self.touch();
        Ok(deletion)
    }

    /// Persists and publishes the theme.
    pub async fn set_theme(&self, theme: Theme) -> Result<()> {
        preference::set_theme(&self.db, theme).await?;
        self.theme.send_replace(theme);
        info!("Theme set to {theme}");
        Ok(())
    }

    /// Current theme.
    #[must_use]
    pub fn theme(&self) -> Theme {
        *self.theme.borrow()
    }

    /// Rolls past-due billing dates forward to `today` and reschedules every reminder.
    ///
    /// Returns how many billing dates were advanced.
    #[instrument(skip(self))]
    pub async fn refresh_billing_dates(&self, today: NaiveDate) -> Result<usize> {
        let advanced = subscription::advance_past_due(&self.db, today).await?;

        for sub in subscription::get_all_subscriptions(&self.db).await? {
            self.reminders.schedule(&sub);
        }

        self.touch();
        Ok(advanced.len())
    }
}

/// Spawns the task that periodically rolls billing dates forward and refreshes the views,
/// so a snapshot never stays on yesterday's date for longer than `period`.
pub fn spawn_maintenance(store: Arc<Store>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately and startup has just refreshed.
        interval.tick().await;
        loop {
            interval.tick().await;
            let today = chrono::Utc::now().date_naive();
            match store.refresh_billing_dates(today).await {
                Ok(advanced) => debug!("Maintenance advanced {advanced} billing dates"),
                Err(e) => error!("Maintenance failed: {e}"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::config::settings::ReminderSettings;
    use crate::test_utils::*;

    async fn test_store() -> Result<Store> {
        let db = setup_test_db().await?;
        let (reminders, _rx) = ReminderScheduler::new(ReminderSettings::default());
        Store::open(db, reminders).await
    }

    fn form(name: &str, price: &str, category: &str) -> SubscriptionForm {
        SubscriptionForm {
            name: name.to_string(),
            price: price.to_string(),
            color: "#1DB954".to_string(),
            next_billing_date: "2099-01-15".to_string(),
            category: category.to_string(),
        }
    }

    fn category_form(name: &str, budget: &str) -> CategoryForm {
        CategoryForm {
            name: name.to_string(),
            icon: "🎵".to_string(),
            budget: budget.to_string(),
            description: String::new(),
            gradient_index: 1,
        }
    }

    #[tokio::test]
    async fn test_add_subscription_schedules_reminder_and_bumps_revision() -> Result<()> {
        let store = test_store().await?;
        let mut revision = store.subscribe_revision();
        store.add_category(&category_form("Music", "20")).await?;
        revision.borrow_and_update();

        let created = store.add_subscription(&form("Spotify", "9.99", "music")).await?;
        assert_eq!(created.category, "Music");
        assert!(store.reminders().scheduled_time(created.id).is_some());
        assert!(revision.has_changed().unwrap());
        Ok(())
    }

    #[tokio::test]
    async fn test_add_subscription_rejects_bad_price() -> Result<()> {
        let store = test_store().await?;
        store.add_category(&category_form("Music", "20")).await?;

        let result = store.add_subscription(&form("Spotify", "9.999", "Music")).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert!(subscription::get_all_subscriptions(store.db()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_add_subscription_requires_existing_category() -> Result<()> {
        let store = test_store().await?;

        let result = store.add_subscription(&form("Spotify", "9.99", "Nope")).await;
        assert!(matches!(result, Err(Error::CategoryNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_subscription_cancels_reminder() -> Result<()> {
        let store = test_store().await?;
        store.add_category(&category_form("Music", "20")).await?;
        let created = store.add_subscription(&form("Spotify", "9.99", "Music")).await?;

        store.delete_subscription(created.id).await?;
        assert!(store.reminders().scheduled_time(created.id).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_category_cancels_cascaded_reminders() -> Result<()> {
        let store = test_store().await?;
        store.add_category(&category_form("Music", "20")).await?;
        store.add_category(&category_form("Video", "20")).await?;
        let a = store.add_subscription(&form("Spotify", "9.99", "Music")).await?;
        let b = store.add_subscription(&form("Tidal", "10.99", "Music")).await?;
        let c = store.add_subscription(&form("Netflix", "15.99", "Video")).await?;

        let deletion = store.delete_category("Music").await?;
        assert_eq!(deletion.removed_subscription_ids.len(), 2);
        assert!(store.reminders().scheduled_time(a.id).is_none());
        assert!(store.reminders().scheduled_time(b.id).is_none());
        assert!(store.reminders().scheduled_time(c.id).is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_add_category_rejects_duplicate_and_bad_budget() -> Result<()> {
        let store = test_store().await?;
        store.add_category(&category_form("Music", "20")).await?;

        let duplicate = store.add_category(&category_form("MUSIC", "20")).await;
        assert!(matches!(duplicate, Err(Error::DuplicateCategory { .. })));

        let bad_budget = store.add_category(&category_form("Video", "lots")).await;
        assert!(matches!(bad_budget, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_move_subscription() -> Result<()> {
        let store = test_store().await?;
        store.add_category(&category_form("Music", "20")).await?;
        store.add_category(&category_form("Audio", "20")).await?;
        let created = store.add_subscription(&form("Spotify", "9.99", "Music")).await?;

        let moved = store.move_subscription(created.id, "audio").await?;
        assert_eq!(moved.category, "Audio");

        let missing = store.move_subscription(created.id, "Nope").await;
        assert!(matches!(missing, Err(Error::CategoryNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_theme_publishes_and_persists() -> Result<()> {
        let store = test_store().await?;
        let theme_rx = store.subscribe_theme();
        assert_eq!(*theme_rx.borrow(), Theme::System);

        store.set_theme(Theme::Dark).await?;
        assert_eq!(*theme_rx.borrow(), Theme::Dark);
        assert_eq!(preference::get_theme(store.db()).await?, Theme::Dark);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_billing_dates() -> Result<()> {
        let store = test_store().await?;
        create_custom_subscription(store.db(), "Old", 5.0, "Music", date(2025, 1, 10)).await?;

        let advanced = store.refresh_billing_dates(date(2025, 3, 1)).await?;
        assert_eq!(advanced, 1);

        let subs = subscription::get_all_subscriptions(store.db()).await?;
        assert_eq!(subs[0].next_billing_date, date(2025, 3, 10));
        Ok(())
    }
}
