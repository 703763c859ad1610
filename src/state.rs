//! Reactive state holders for the views.
//!
//! [`Snapshot`] is everything the home, categories and analytics views display, built by a
//! pure function. [`AppState`] keeps the latest snapshot in a `watch` channel and rebuilds
//! it whenever the store revision changes.

use crate::{
    core::{
        analytics::{self, BudgetComparison, DistributionSlice, MonthlyTrend, SpendingStats},
        category,
        preference::Theme,
        subscription,
        summary::{self, CategoryBreakdown},
    },
    entities,
    errors::Result,
    store::Store,
};
use chrono::NaiveDate;
use sea_orm::ConnectionTrait;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// How far ahead the home view looks for renewals.
pub const UPCOMING_WINDOW_DAYS: i64 = 7;
/// Number of months in the analytics timeline.
pub const TIMELINE_MONTHS: u32 = 6;

/// Home view: the full list with its totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeView {
    /// Every subscription, soonest billing first
    pub subscriptions: Vec<entities::subscription::Model>,
    /// Sum of monthly prices
    pub monthly_total: f64,
    /// Monthly total times 12
    pub yearly_total: f64,
    /// Renewals within [`UPCOMING_WINDOW_DAYS`]
    pub upcoming: Vec<entities::subscription::Model>,
}

/// Categories view: each category with its count and total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoriesView {
    /// Per-category figures
    pub breakdown: CategoryBreakdown,
}

/// Analytics view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsView {
    /// Share of spend per category
    pub distribution: Vec<DistributionSlice>,
    /// Spend against budget per category
    pub budgets: Vec<BudgetComparison>,
    /// Charges per month
    pub timeline: Vec<MonthlyTrend>,
    /// Headline figures
    pub stats: SpendingStats,
}

/// Everything the views render, as of one date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Date the snapshot was computed for
    pub today: NaiveDate,
    /// Home view
    pub home: HomeView,
    /// Categories view
    pub categories: CategoriesView,
    /// Analytics view
    pub analytics: AnalyticsView,
}

impl Snapshot {
    /// Derives every view from the raw rows.
    #[must_use]
    pub fn build(
        subscriptions: Vec<entities::subscription::Model>,
        categories: &[entities::category::Model],
        today: NaiveDate,
    ) -> Self {
        let breakdown = summary::summarize_categories(categories, &subscriptions);

        let analytics = AnalyticsView {
            distribution: analytics::category_distribution(&breakdown),
            budgets: analytics::budget_comparisons(&breakdown.categories),
            timeline: analytics::renewal_timeline(&subscriptions, today, TIMELINE_MONTHS),
            stats: analytics::spending_stats(&subscriptions),
        };

        let home = HomeView {
            monthly_total: summary::monthly_total(&subscriptions),
            yearly_total: summary::yearly_total(&subscriptions),
            upcoming: summary::upcoming_renewals(&subscriptions, today, UPCOMING_WINDOW_DAYS),
            subscriptions,
        };

        Self {
            today,
            home,
            categories: CategoriesView { breakdown },
            analytics,
        }
    }
}

/// Loads the rows and builds a snapshot for `today`.
pub async fn load_snapshot<C>(db: &C, today: NaiveDate) -> Result<Snapshot>
where
    C: ConnectionTrait,
{
    let subscriptions = subscription::get_all_subscriptions(db).await?;
    let categories = category::get_all_categories(db).await?;
    Ok(Snapshot::build(subscriptions, &categories, today))
}

/// Publishes the latest [`Snapshot`] and [`Theme`].
#[derive(Debug)]
pub struct AppState {
    snapshot: watch::Receiver<Snapshot>,
    theme: watch::Receiver<Theme>,
    refresher: JoinHandle<()>,
}

impl AppState {
    /// Builds the first snapshot and starts the task that keeps it current.
    pub async fn start(store: Arc<Store>) -> Result<Self> {
        let today = chrono::Utc::now().date_naive();
        let initial = load_snapshot(store.db(), today).await?;
        let (sender, snapshot) = watch::channel(initial);
        let theme = store.subscribe_theme();

        let mut revision = store.subscribe_revision();
        let refresher = tokio::spawn(async move {
            while revision.changed().await.is_ok() {
                let rev = *revision.borrow_and_update();
                let today = chrono::Utc::now().date_naive();
                match load_snapshot(store.db(), today).await {
                    Ok(next) => {
                        debug!("Snapshot rebuilt at revision {rev}");
                        sender.send_replace(next);
                    }
                    Err(e) => error!("Failed to rebuild snapshot: {e}"),
                }
            }
        });

        Ok(Self {
            snapshot,
            theme,
            refresher,
        })
    }

    /// The latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that observes every rebuilt snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.clone()
    }

    /// The current theme.
    #[must_use]
    pub fn theme(&self) -> Theme {
        *self.theme.borrow()
    }

    /// Receiver that observes theme changes.
    #[must_use]
    pub fn subscribe_theme(&self) -> watch::Receiver<Theme> {
        self.theme.clone()
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        self.refresher.abort();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::config::settings::ReminderSettings;
    use crate::core::validation::SubscriptionForm;
    use crate::reminders::ReminderScheduler;
    use crate::test_utils::*;

    #[test]
    fn test_snapshot_build_totals_and_views() {
        let today = date(2025, 1, 10);
        let categories = vec![category_model("Music", 20.0), category_model("Video", 10.0)];
        let subs = vec![
            subscription_model(1, "Spotify", 10.0, "Music", date(2025, 1, 12)),
            subscription_model(2, "Netflix", 15.0, "Video", date(2025, 1, 30)),
            subscription_model(3, "Stray", 5.0, "Gone", date(2025, 1, 11)),
        ];

        let snapshot = Snapshot::build(subs, &categories, today);

        assert_eq!(snapshot.home.monthly_total, 30.0);
        assert_eq!(snapshot.home.yearly_total, 360.0);
        let upcoming: Vec<_> = snapshot.home.upcoming.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(upcoming, vec!["Stray", "Spotify"]);

        let breakdown = &snapshot.categories.breakdown;
        assert_eq!(breakdown.categories[0].count, 1);
        assert_eq!(breakdown.categories[0].total, 10.0);
        assert_eq!(breakdown.uncategorized_count, 1);

        assert_eq!(snapshot.analytics.stats.count, 3);
        assert_eq!(snapshot.analytics.timeline.len(), TIMELINE_MONTHS as usize);
        assert!(snapshot.analytics.budgets[1].over_budget);
    }

    #[test]
    fn test_snapshot_build_empty() {
        let snapshot = Snapshot::build(Vec::new(), &[], date(2025, 1, 1));
        assert_eq!(snapshot.home.monthly_total, 0.0);
        assert!(snapshot.analytics.distribution.is_empty());
        assert_eq!(snapshot.analytics.stats, SpendingStats::default());
    }

    #[tokio::test]
    async fn test_app_state_follows_store_writes() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_category(&db, "Music").await?;
        let (reminders, _rx) = ReminderScheduler::new(ReminderSettings::default());
        let store = Arc::new(Store::open(db, reminders).await?);

        let state = AppState::start(Arc::clone(&store)).await?;
        let mut rx = state.subscribe();
        assert!(state.snapshot().home.subscriptions.is_empty());

        store
            .add_subscription(&SubscriptionForm {
                name: "Spotify".to_string(),
                price: "9.99".to_string(),
                color: "#1DB954".to_string(),
                next_billing_date: "2099-01-15".to_string(),
                category: "Music".to_string(),
            })
            .await?;

        rx.changed().await.unwrap();
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.home.subscriptions.len(), 1);
        assert_eq!(snapshot.categories.breakdown.categories[0].count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_app_state_theme_follows_store() -> Result<()> {
        let db = setup_test_db().await?;
        let (reminders, _rx) = ReminderScheduler::new(ReminderSettings::default());
        let store = Arc::new(Store::open(db, reminders).await?);
        let state = AppState::start(Arc::clone(&store)).await?;

        store.set_theme(Theme::Light).await?;
        assert_eq!(state.theme(), Theme::Light);
        Ok(())
    }
}
