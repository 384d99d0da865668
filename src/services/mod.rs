//! Service layer for business logic and orchestration.
//!
//! This module sits between the repository layer and the HTTP handlers.
//! Services orchestrate repository calls and implement the planner's
//! business rules: one session per user per day, grid-aligned slots,
//! and the 30-day analytics window.

pub mod analytics;
pub mod planner;
pub mod subscriptions;

pub use analytics::{analytics_summary, export_csv, ANALYTICS_WINDOW_DAYS};
pub use planner::{delete_slot, end_day, get_day, list_slots, save_slot, start_day, DayOverview};
pub use subscriptions::{find_subscription, subscribe, unsubscribe};


#[cfg(test)]
#[path = "analytics_tests.rs"]
mod analytics_tests;
