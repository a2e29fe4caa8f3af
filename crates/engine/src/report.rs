//! Final report assembly.
//!
//! Invoked exactly once per session, at the `Engaged → Concluded`
//! transition, under the `report_sent` guard. The engine flips the guard
//! in the same critical section that builds the payload, so delivery
//! failures can never re-trigger construction.

use mellivora_core::{ExtractedIntelligence, FinalReport, Session};

/// Assemble the collector payload from a concluded session.
pub fn build_report(session: &Session) -> FinalReport {
    let evidence = &session.evidence;

    let agent_notes = format!(
        "Session concluded after {} messages. Scam confidence: {:.2}. \
         Intelligence extracted: {} payment handles, {} phone numbers, \
         {} bank accounts, {} links, {} keywords.",
        session.total_messages(),
        session.scam_confidence,
        evidence.payment_handles.len(),
        evidence.phone_numbers.len(),
        evidence.bank_accounts.len(),
        evidence.phishing_links.len(),
        evidence.suspicious_keywords.len(),
    );

    FinalReport {
        session_id: session.id.to_string(),
        // Only reachable via Engaged, so this is true by construction.
        scam_detected: true,
        total_messages_exchanged: session.total_messages(),
        extracted_intelligence: ExtractedIntelligence::from(evidence),
        agent_notes,
    }
}
