//! Per-connection context threaded into the encoder registry and the
//! rewriter.
//!
//! This is deliberately tiny: real connection state (socket, auth, the
//! statement cache) lives in the transport collaborator, out of scope for
//! this crate (§1). What *does* belong here is state that changes how a
//! value gets encoded, and that must never leak between connections (§5):
//! the client text codec, and the policy for which statement prefixes are
//! allowed onto the binary-parameter path.

use encoding_rs::Encoding;

/// Which statement prefixes may use the typed-parameter (`PQexecParams`)
/// path. The source material disagreed between an allow-list and a
/// deny-list for this (§9 design notes); this core follows the allow-list,
/// per the documented recommendation.
#[derive(Debug, Clone)]
pub enum BinaryPathPolicy {
    /// Only these keywords (case-insensitive, matched against the first
    /// non-space token) may use the binary path. Anything else refuses.
    AllowList(&'static [&'static str]),
    /// No restriction: every statement is offered to the binary path.
    Unrestricted,
}

impl BinaryPathPolicy {
    /// `SELECT` / `INSERT` / `UPDATE` / `DELETE`, matching the restricted
    /// variant called out in §4.3's pass 1 fast-reject.
    pub const DML_ONLY: BinaryPathPolicy =
        BinaryPathPolicy::AllowList(&["SELECT", "INSERT", "UPDATE", "DELETE"]);

    pub fn permits(&self, first_keyword: &str) -> bool {
        match self {
            BinaryPathPolicy::Unrestricted => true,
            BinaryPathPolicy::AllowList(list) => list
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(first_keyword)),
        }
    }
}

/// Context carried through a single `execute` call.
#[derive(Debug, Clone)]
pub struct ConnContext {
    /// Codec used to re-encode textual values before they travel on the
    /// wire (§4.1, "Encoded text" built-in encoder).
    pub client_encoding: &'static Encoding,
    pub binary_path_policy: BinaryPathPolicy,
}

impl Default for ConnContext {
    fn default() -> Self {
        Self {
            client_encoding: encoding_rs::UTF_8,
            binary_path_policy: BinaryPathPolicy::DML_ONLY,
        }
    }
}
