//! Domain layer: ledger rows, payouts, audit entries, and the pure
//! aggregation that turns a period's ledger into payable amounts.

pub mod account_id;
pub mod activity;
pub mod earnings;
pub mod money;
pub mod payout;
pub mod period;
pub mod revenue;

pub use account_id::AccountId;
pub use activity::{ActivityAction, ActivityLogEntry};
pub use earnings::{AccountEarningsSummary, aggregate, filter_eligible};
pub use money::Money;
pub use payout::{NewPayout, PaymentMethod, Payout, PayoutStatus};
pub use period::PayoutPeriod;
pub use revenue::{AccountStatus, RevenueEvent, RevenueKind};
