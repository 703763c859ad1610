//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions other than commands.

/// Autocomplete handlers for subscription and category names
pub mod autocomplete;
