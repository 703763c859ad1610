//! Analytics over the current subscription set.
//!
//! Distribution of spend across categories, budget comparisons, a month-by-month renewal
//! timeline and a few headline statistics. Every percentage guards against a zero
//! denominator and reports 0 instead.

use crate::{
    core::{
        subscription::billing_date_in_month,
        summary::{CategoryBreakdown, CategorySummary, calculate_usage},
    },
    entities::subscription,
};
use chrono::{Datelike, Months, NaiveDate};

/// One slice of the spend distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionSlice {
    /// Category name
    pub category: String,
    /// Category icon
    pub icon: String,
    /// Monthly total of the category
    pub total: f64,
    /// Share of the grand total, 0-100
    pub share_percent: f64,
}

/// Spend measured against a category budget.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetComparison {
    /// Category name
    pub category: String,
    /// Monthly budget
    pub budget: f64,
    /// Monthly spend in the category
    pub spent: f64,
    /// `budget - spent`, negative when over budget
    pub remaining: f64,
    /// `spent / budget` as a percentage, 0 when there is no budget
    pub usage_percent: f64,
    /// True when a budget is set and spend exceeds it
    pub over_budget: bool,
}

/// Charges falling in one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTrend {
    /// First day of the month
    pub month: NaiveDate,
    /// Sum charged during the month
    pub total: f64,
    /// Number of charges during the month
    pub renewals: usize,
}

/// Headline figures about the subscription set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpendingStats {
    /// Number of subscriptions
    pub count: usize,
    /// Mean monthly price, 0 when there are none
    pub average_price: f64,
    /// Name and price of the most expensive subscription
    pub most_expensive: Option<(String, f64)>,
    /// Name and price of the cheapest subscription
    pub least_expensive: Option<(String, f64)>,
}

/// Label of the slice holding subscriptions that match no category.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// Share of each category in the grand total. Categories with no spend are left out.
///
/// Uncategorized spend counts toward the grand total and gets its own slice.
#[must_use]
pub fn category_distribution(breakdown: &CategoryBreakdown) -> Vec<DistributionSlice> {
    let grand_total: f64 = breakdown.categories.iter().map(|s| s.total).sum::<f64>()
        + breakdown.uncategorized_total;

    let mut slices: Vec<DistributionSlice> = breakdown
        .categories
        .iter()
        .filter(|s| s.total > 0.0)
        .map(|s| DistributionSlice {
            category: s.category.name.clone(),
            icon: s.category.icon.clone(),
            total: s.total,
            share_percent: calculate_usage(s.total, grand_total),
        })
        .collect();

    if breakdown.uncategorized_total > 0.0 {
        slices.push(DistributionSlice {
            category: UNCATEGORIZED_LABEL.to_string(),
            icon: "❔".to_string(),
            total: breakdown.uncategorized_total,
            share_percent: calculate_usage(breakdown.uncategorized_total, grand_total),
        });
    }

    slices.sort_by(|a, b| b.total.total_cmp(&a.total));
    slices
}

/// Compares each category's spend with its budget.
#[must_use]
pub fn budget_comparisons(summaries: &[CategorySummary]) -> Vec<BudgetComparison> {
    summaries
        .iter()
        .map(|s| {
            let budget = s.category.budget;
            BudgetComparison {
                category: s.category.name.clone(),
                budget,
                spent: s.total,
                remaining: budget - s.total,
                usage_percent: calculate_usage(s.total, budget),
                over_budget: budget > 0.0 && s.total > budget,
            }
        })
        .collect()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Charges per calendar month for `months` months starting with the month of `from`.
///
/// Each subscription charges on its next billing date and then every month after, counted
/// from that date. Charges before `from` are ignored.
#[must_use]
pub fn renewal_timeline(
    subscriptions: &[subscription::Model],
    from: NaiveDate,
    months: u32,
) -> Vec<MonthlyTrend> {
    let start = first_of_month(from);
    let mut timeline: Vec<MonthlyTrend> = (0..months)
        .filter_map(|offset| start.checked_add_months(Months::new(offset)))
        .map(|month| MonthlyTrend {
            month,
            total: 0.0,
            renewals: 0,
        })
        .collect();

    let Some(end) = start.checked_add_months(Months::new(months)) else {
        return timeline;
    };

    for sub in subscriptions {
        let anchor = sub.anchor_day();
        let mut step = 0;
        while let Some(month) = sub.next_billing_date.checked_add_months(Months::new(step)) {
            let charge = if step == 0 {
                sub.next_billing_date
            } else {
                billing_date_in_month(month, anchor)
            };
            if charge >= end {
                break;
            }
            if charge >= from {
                let charge_month = first_of_month(charge);
                if let Some(entry) = timeline.iter_mut().find(|t| t.month == charge_month) {
                    entry.total += sub.price;
                    entry.renewals += 1;
                }
            }
            step += 1;
        }
    }

    timeline
}

/// Count, average, most and least expensive.
#[must_use]
pub fn spending_stats(subscriptions: &[subscription::Model]) -> SpendingStats {
    if subscriptions.is_empty() {
        return SpendingStats::default();
    }

    let total: f64 = subscriptions.iter().map(|s| s.price).sum();
    #[allow(clippy::cast_precision_loss)]
    let average_price = total / subscriptions.len() as f64;

    let most_expensive = subscriptions
        .iter()
        .max_by(|a, b| a.price.total_cmp(&b.price))
        .map(|s| (s.name.clone(), s.price));
    let least_expensive = subscriptions
        .iter()
        .min_by(|a, b| a.price.total_cmp(&b.price))
        .map(|s| (s.name.clone(), s.price));

    SpendingStats {
        count: subscriptions.len(),
        average_price,
        most_expensive,
        least_expensive,
    }
}
