//! Server-side Web Push delivery.
//!
//! This is the third reminder channel: an external scheduler hits the
//! dispatch endpoint every 15 minutes, and [`dispatch`] re-checks the grid
//! and quiet-hours rules, finds the users to page, and fans pushes out to
//! their stored subscriptions. Individual delivery failures are counted and
//! logged, never escalated; there is no queue, no retry and no
//! delivery-receipt reconciliation.

pub mod dispatch;
pub mod sender;
pub mod vapid;

pub use dispatch::{run_dispatch, DispatchMode, DispatchOutcome, SkipReason};
pub use sender::{PushError, PushSender, WebPushSender};
pub use vapid::VapidConfig;
