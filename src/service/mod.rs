//! Service layer: the monthly payout job.
//!
//! [`PayoutJob`] reads a period's ledger through a
//! [`crate::persistence::PayoutStore`], nets it per account, and writes
//! idempotent payouts.

pub mod payout_job;

pub use payout_job::{JobPhase, JobReport, PayoutJob, PayoutLine, PreviewReport};
