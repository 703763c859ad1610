//! Form validation - turns raw user input into typed drafts.
//!
//! Every rejection carries a fixed message that is shown to the user as-is. Amounts must
//! match a plain two-decimal pattern; anything else (signs, exponents, thousands
//! separators, more than two decimals) is rejected rather than coerced.

use crate::errors::{Error, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Number of gradients in the category palette.
pub const GRADIENT_COUNT: i32 = 6;

// Literal patterns; the tests below compile both on first use.
#[allow(clippy::expect_used)]
static AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d{1,2})?$").expect("valid amount regex"));
#[allow(clippy::expect_used)]
static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid color regex"));

const INVALID_PRICE: &str = "Please enter a valid price (e.g. 9.99)";
const INVALID_BUDGET: &str = "Please enter a valid budget (e.g. 50.00)";
const INVALID_COLOR: &str = "Please enter a color as #RRGGBB (e.g. #E50914)";
const INVALID_DATE: &str = "Please enter the next billing date as YYYY-MM-DD";
const INVALID_GRADIENT: &str = "Gradient must be a number from 0 to 5";

/// Which amount field is being parsed; selects the rejection message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountField {
    /// A subscription's monthly price
    Price,
    /// A category's monthly budget
    Budget,
}

impl AmountField {
    const fn message(self) -> &'static str {
        match self {
            Self::Price => INVALID_PRICE,
            Self::Budget => INVALID_BUDGET,
        }
    }
}

/// Parses a price or budget, accepting only digits with up to two decimals.
pub fn parse_amount(input: &str, field: AmountField) -> Result<f64> {
    let trimmed = input.trim();
    if !AMOUNT_RE.is_match(trimmed) {
        return Err(Error::validation(field.message()));
    }

    trimmed
        .parse::<f64>()
        .map_err(|_| Error::validation(field.message()))
}

/// Trims `input` and rejects it when empty. `what` names the field in the message.
pub fn require_name(input: &str, what: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: format!("{what} cannot be empty"),
        });
    }
    Ok(trimmed.to_string())
}

/// Parses a `#RRGGBB` color and normalizes it to uppercase.
pub fn parse_color(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if !COLOR_RE.is_match(trimmed) {
        return Err(Error::validation(INVALID_COLOR));
    }
    Ok(trimmed.to_uppercase())
}

/// Parses a `YYYY-MM-DD` billing date.
pub fn parse_billing_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| Error::validation(INVALID_DATE))
}

/// Checks that a gradient index points into the palette.
pub fn check_gradient_index(index: i32) -> Result<i32> {
    if (0..GRADIENT_COUNT).contains(&index) {
        Ok(index)
    } else {
        Err(Error::validation(INVALID_GRADIENT))
    }
}

/// Raw subscription form input as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionForm {
    /// Subscription name
    pub name: String,
    /// Monthly price text
    pub price: String,
    /// Color text (`#RRGGBB`)
    pub color: String,
    /// Next billing date text (`YYYY-MM-DD`)
    pub next_billing_date: String,
    /// Category name
    pub category: String,
}

/// A validated subscription, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionDraft {
    /// Trimmed name
    pub name: String,
    /// Monthly price
    pub price: f64,
    /// Uppercase `#RRGGBB`
    pub color: String,
    /// Date of the next charge
    pub next_billing_date: NaiveDate,
    /// Trimmed category name
    pub category: String,
}

impl SubscriptionForm {
    /// Validates every field, reporting the first one that fails.
    pub fn validate(&self) -> Result<SubscriptionDraft> {
        Ok(SubscriptionDraft {
            name: require_name(&self.name, "Subscription name")?,
            price: parse_amount(&self.price, AmountField::Price)?,
            color: parse_color(&self.color)?,
            next_billing_date: parse_billing_date(&self.next_billing_date)?,
            category: require_name(&self.category, "Category")?,
        })
    }
}

/// Raw category form input as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct CategoryForm {
    /// Category name
    pub name: String,
    /// Display icon
    pub icon: String,
    /// Monthly budget text
    pub budget: String,
    /// Free-text description, may be empty
    pub description: String,
    /// Gradient palette index
    pub gradient_index: i32,
}

/// A validated category, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDraft {
    /// Trimmed name
    pub name: String,
    /// Trimmed icon
    pub icon: String,
    /// Monthly budget
    pub budget: f64,
    /// Trimmed description
    pub description: String,
    /// Gradient palette index
    pub gradient_index: i32,
}

impl CategoryForm {
    /// Validates every field, reporting the first one that fails.
    pub fn validate(&self) -> Result<CategoryDraft> {
        Ok(CategoryDraft {
            name: require_name(&self.name, "Category name")?,
            icon: require_name(&self.icon, "Category icon")?,
            budget: parse_amount(&self.budget, AmountField::Budget)?,
            description: self.description.trim().to_string(),
            gradient_index: check_gradient_index(self.gradient_index)?,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    fn message_of(result: Result<impl std::fmt::Debug>) -> String {
        match result {
            Err(Error::Validation { message }) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_amount_accepts_two_decimal_numbers() {
        assert_eq!(parse_amount("9.99", AmountField::Price).unwrap(), 9.99);
        assert_eq!(parse_amount("10", AmountField::Price).unwrap(), 10.0);
        assert_eq!(parse_amount("0.5", AmountField::Price).unwrap(), 0.5);
        assert_eq!(parse_amount(" 12.30 ", AmountField::Budget).unwrap(), 12.3);
        assert_eq!(parse_amount("0", AmountField::Budget).unwrap(), 0.0);
    }

    #[test]
    fn test_parse_amount_rejects_everything_else() {
        for input in ["", "abc", "-1", "+1", "1.234", "1.", ".5", "1e3", "1,000", "NaN", "inf"] {
            assert!(
                parse_amount(input, AmountField::Price).is_err(),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_amount_message_depends_on_field() {
        assert_eq!(message_of(parse_amount("x", AmountField::Price)), INVALID_PRICE);
        assert_eq!(message_of(parse_amount("x", AmountField::Budget)), INVALID_BUDGET);
    }

    #[test]
    fn test_require_name() {
        assert_eq!(require_name("  Netflix ", "Name").unwrap(), "Netflix");
        assert_eq!(message_of(require_name("   ", "Name")), "Name cannot be empty");
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#e50914").unwrap(), "#E50914");
        assert!(parse_color("e50914").is_err());
        assert!(parse_color("#e5091").is_err());
        assert!(parse_color("#GGGGGG").is_err());
    }

    #[test]
    fn test_parse_billing_date() {
        assert_eq!(
            parse_billing_date("2025-02-28").unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert!(parse_billing_date("2025-02-30").is_err());
        assert!(parse_billing_date("28/02/2025").is_err());
    }

    #[test]
    fn test_check_gradient_index() {
        assert_eq!(check_gradient_index(0).unwrap(), 0);
        assert_eq!(check_gradient_index(GRADIENT_COUNT - 1).unwrap(), GRADIENT_COUNT - 1);
        assert!(check_gradient_index(-1).is_err());
        assert!(check_gradient_index(GRADIENT_COUNT).is_err());
    }

    #[test]
    fn test_subscription_form_reports_first_failing_field() {
        let form = SubscriptionForm {
            name: "Netflix".to_string(),
            price: "15.999".to_string(),
            color: "nope".to_string(),
            next_billing_date: "2025-01-01".to_string(),
            category: "Entertainment".to_string(),
        };
        assert_eq!(message_of(form.validate()), INVALID_PRICE);
    }

    #[test]
    fn test_subscription_form_valid() {
        let form = SubscriptionForm {
            name: " Netflix ".to_string(),
            price: "15.99".to_string(),
            color: "#e50914".to_string(),
            next_billing_date: "2025-01-01".to_string(),
            category: "Entertainment".to_string(),
        };
        let draft = form.validate().unwrap();
        assert_eq!(draft.name, "Netflix");
        assert_eq!(draft.price, 15.99);
        assert_eq!(draft.color, "#E50914");
    }

    #[test]
    fn test_category_form_rejects_bad_budget() {
        let form = CategoryForm {
            name: "Music".to_string(),
            icon: "🎵".to_string(),
            budget: "twenty".to_string(),
            description: String::new(),
            gradient_index: 1,
        };
        assert_eq!(message_of(form.validate()), INVALID_BUDGET);
    }
}
