//! Data Transfer Objects for REST request/response serialization.
//!
//! Money amounts are serialized as decimal strings to avoid float
//! rounding.

pub mod job_dto;

pub use job_dto::*;
