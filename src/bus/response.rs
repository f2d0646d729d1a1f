//! Response code reporting policy.
//!
//! A completed register transaction carries a 2-bit response code. Which
//! codes deserve a report is a policy decision: reports are observational
//! only and never abort or retry the transaction.

use serde::Deserialize;

/// Normal access success.
pub const RESP_OKAY: u64 = 0b00;
/// Exclusive access success.
pub const RESP_EXOKAY: u64 = 0b01;
/// Target error.
pub const RESP_SLVERR: u64 = 0b10;
/// Decode error.
pub const RESP_DECERR: u64 = 0b11;

/// Decides which response codes are reported as notable.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponsePolicy {
    /// Reports OKAY and stays silent on every fault code.
    ///
    /// This is the behaviour inherited from the board-level tooling and it
    /// is almost certainly inverted. It remains the default so that existing
    /// logs compare equal; prefer [`ResponsePolicy::FaultIsNotable`].
    #[default]
    OkayIsNotable,
    /// Reports every code other than OKAY.
    FaultIsNotable,
    /// Reports the codes for which the predicate returns `true`.
    #[serde(skip)]
    Custom(fn(u64) -> bool),
}

impl ResponsePolicy {
    /// Returns `true` if `resp` should be reported.
    pub fn is_notable(self, resp: u64) -> bool {
        match self {
            ResponsePolicy::OkayIsNotable => resp == RESP_OKAY,
            ResponsePolicy::FaultIsNotable => resp != RESP_OKAY,
            ResponsePolicy::Custom(predicate) => predicate(resp),
        }
    }
}

/// Human-readable name of a response code.
pub fn response_name(resp: u64) -> &'static str {
    match resp {
        RESP_OKAY => "OKAY",
        RESP_EXOKAY => "EXOKAY",
        RESP_SLVERR => "SLVERR",
        RESP_DECERR => "DECERR",
        _ => "INVALID",
    }
}
