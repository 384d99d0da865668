//! # Planner Backend
//!
//! Backend for a 15-minute day planner: users start a day, record what
//! they did in each quarter-hour slot alongside a 1–7 condition score,
//! and get reminded every 15 minutes while the day is running.
//!
//! ## Features
//!
//! - **Daily sessions**: one session per user per day with start/end times
//! - **Time slots**: 15-minute grid entries with activity and condition score
//! - **Reminders**: grid-aligned, quiet-hours-aware notification scheduling,
//!   both in-process timers and server-side Web Push dispatch
//! - **Analytics**: trailing 30-day summaries and CSV export
//! - **HTTP API**: RESTful endpoints via Axum
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: Domain types shared across all layers
//! - [`reminder`]: Firing decision, in-process schedulers, worker protocol
//! - [`push`]: VAPID configuration, Web Push sender, dispatch fan-out
//! - [`db`]: Repository pattern and persistence layer
//! - [`services`]: High-level business logic
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod db;

#[cfg(feature = "http-server")]
pub mod http;

pub mod push;

pub mod reminder;

pub mod services;
