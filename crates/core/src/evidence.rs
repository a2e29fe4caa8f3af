//! Cumulative intelligence extracted from a session.
//!
//! Evidence is semantically a set of sets: five deduplicated, grow-only
//! collections of identifier strings. List representation is purely a
//! serialization concern at the external boundary — internally there is
//! no ordering guarantee beyond `BTreeSet` iteration order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The five disjoint evidence classes accumulated over a session.
///
/// Invariant: sets only grow. There is no removal operation, which makes
/// merging idempotent and the conclusion predicate monotone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Payment handles (`localpart@provider` on a known payment platform)
    pub payment_handles: BTreeSet<String>,

    /// Normalized 10-digit phone numbers
    pub phone_numbers: BTreeSet<String>,

    /// Bank account number candidates
    pub bank_accounts: BTreeSet<String>,

    /// Phishing / suspicious URLs
    pub phishing_links: BTreeSet<String>,

    /// Scam-indicator keyword hits
    pub suspicious_keywords: BTreeSet<String>,
}

impl Evidence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `incoming` into `self` — per-field set union.
    ///
    /// Idempotent and commutative: merging the same extraction result
    /// twice yields the same evidence as merging it once.
    pub fn merge(&mut self, incoming: &Evidence) {
        self.payment_handles
            .extend(incoming.payment_handles.iter().cloned());
        self.phone_numbers
            .extend(incoming.phone_numbers.iter().cloned());
        self.bank_accounts
            .extend(incoming.bank_accounts.iter().cloned());
        self.phishing_links
            .extend(incoming.phishing_links.iter().cloned());
        self.suspicious_keywords
            .extend(incoming.suspicious_keywords.iter().cloned());
    }

    /// High-value evidence permits early conclusion of an engagement:
    /// at least one payment handle, OR a phone number together with a
    /// link, OR a bank account number.
    pub fn is_high_value(&self) -> bool {
        !self.payment_handles.is_empty()
            || (!self.phone_numbers.is_empty() && !self.phishing_links.is_empty())
            || !self.bank_accounts.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.payment_handles.is_empty()
            && self.phone_numbers.is_empty()
            && self.bank_accounts.is_empty()
            && self.phishing_links.is_empty()
            && self.suspicious_keywords.is_empty()
    }

    /// Total identifiers across all classes.
    pub fn total(&self) -> usize {
        self.payment_handles.len()
            + self.phone_numbers.len()
            + self.bank_accounts.len()
            + self.phishing_links.len()
            + self.suspicious_keywords.len()
    }
}
