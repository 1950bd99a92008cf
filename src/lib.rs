//! # payout-reconciler
//!
//! Monthly payout reconciliation job for a creator monetization platform.
//!
//! An external scheduler triggers the job over HTTP with a shared-secret
//! bearer token. The job reads the previous calendar month's revenue
//! ledger, nets reconciliation deductions against rewards per account,
//! applies the minimum payout threshold, and writes one pending payout
//! per eligible account. Re-running a period never duplicates a payout.
//!
//! ## Architecture
//!
//! ```text
//! Scheduler (HTTP POST + Bearer secret)
//!     │
//!     ├── REST Handlers + SchedulerAuth (api/)
//!     │
//!     ├── PayoutJob (service/)
//!     ├── aggregate / filter_eligible (domain/)
//!     │
//!     └── PayoutStore (persistence/)
//!           ├── PostgresStore
//!           └── InMemoryStore
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
