//! # mTLS status
//!
//! Resolves one authoritative mTLS status for a namespace or for the whole
//! mesh out of the peer authentications and destination rules in scope. The
//! destination-rule checkers read the same [`MtlsDetails`] so both views use
//! one set of precedence rules.

mod status;

pub use status::{MtlsDetails, MtlsStatusResolver, TlsStatus};
