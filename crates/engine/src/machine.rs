//! The conversation state machine — the orchestration core.
//!
//! Per inbound message the engine appends to the session, evaluates the
//! current phase, conditionally invokes the classification and
//! reply-generation collaborators, merges extracted evidence, and checks
//! the conclusion predicate:
//!
//! | Phase         | On inbound message                                   |
//! |---------------|------------------------------------------------------|
//! | `Unevaluated` | classify; engage above threshold, else neutral reply |
//! | `Engaged`     | extract + merge evidence; conclude when ripe         |
//! | `Concluded`   | polite closing reply; no further state change        |
//!
//! Collaborator calls are the only suspension points and run under a
//! bounded timeout, never while a session lock is held. Every failure
//! degrades locally — the caller always receives a reply.

use std::sync::Arc;
use std::time::Duration;

use mellivora_config::EngineConfig;
use mellivora_core::{
    ChannelMetadata, FinalReport, Message, Phase, ReplyContext, ReplyGenerator, ReplyKind,
    ReportSink, ScamClassifier, SessionId, Verdict, FALLBACK_REPLY,
};
use tracing::{debug, info, warn};

use crate::extract::Extractor;
use crate::report::build_report;
use crate::store::SessionStore;

/// Messages handed to the reply generator as conversation context.
/// Wider than the classification window: the persona needs the whole
/// recent exchange to stay coherent.
const REPLY_HISTORY_WINDOW: usize = 10;

/// What one engine evaluation produced.
#[derive(Debug, Clone)]
pub struct EngineReply {
    /// The text to send back — always present, whatever failed upstream
    pub reply: String,

    /// The session's phase after this evaluation
    pub phase: Phase,

    /// True on the evaluation that took the `Engaged → Concluded`
    /// transition (the one that built the report)
    pub concluded_now: bool,
}

/// The per-conversation orchestrator.
pub struct HoneypotEngine {
    classifier: Arc<dyn ScamClassifier>,
    replier: Arc<dyn ReplyGenerator>,
    reporter: Arc<dyn ReportSink>,
    extractor: Extractor,
    store: SessionStore,
    settings: EngineConfig,
}

impl HoneypotEngine {
    pub fn new(
        classifier: Arc<dyn ScamClassifier>,
        replier: Arc<dyn ReplyGenerator>,
        reporter: Arc<dyn ReportSink>,
        extractor: Extractor,
        settings: EngineConfig,
    ) -> Self {
        Self {
            classifier,
            replier,
            reporter,
            extractor,
            store: SessionStore::new(),
            settings,
        }
    }

    /// The session registry, for read-only inspection endpoints.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Evaluate one inbound message. Infallible for well-formed input:
    /// collaborator failures degrade to safe defaults.
    pub async fn handle_message(
        &self,
        session_id: &SessionId,
        message: Message,
        wire_history: &[Message],
        metadata: &ChannelMetadata,
    ) -> EngineReply {
        let inbound_text = message.text.clone();

        // Append and observe. Both context windows are captured in the
        // same critical section the append happens in.
        let (phase, mut classify_history, reply_history) = self
            .store
            .with_session(session_id, |s| {
                s.push(message);
                let classify_history = s.recent_history(self.settings.history_window).to_vec();
                let from = s.messages.len().saturating_sub(REPLY_HISTORY_WINDOW);
                let reply_history = s.messages[from..].to_vec();
                (s.phase, classify_history, reply_history)
            })
            .await;

        // A brand-new session may arrive with caller-supplied history;
        // use it to seed classification context only.
        if classify_history.is_empty() && !wire_history.is_empty() {
            let from = wire_history
                .len()
                .saturating_sub(self.settings.history_window);
            classify_history = wire_history[from..].to_vec();
        }

        let (kind, phase, concluded_now, report) = match phase {
            Phase::Unevaluated => {
                let verdict = self
                    .classify(&inbound_text, &classify_history, metadata)
                    .await;
                let engage = verdict.is_scam && verdict.confidence > self.settings.engage_threshold;

                let (kind, phase) = self
                    .store
                    .with_session(session_id, |s| {
                        // A concurrent message may have advanced the
                        // phase while we were classifying.
                        if s.phase != Phase::Unevaluated {
                            return (kind_for(s.phase), s.phase);
                        }
                        s.scam_confidence = verdict.confidence;
                        if engage {
                            info!(
                                session_id = %s.id,
                                confidence = verdict.confidence,
                                category = %verdict.category,
                                "Scam confirmed — engaging persona agent"
                            );
                            s.engage(verdict.confidence, verdict.category.clone());
                            (ReplyKind::Opening, Phase::Engaged)
                        } else {
                            debug!(
                                session_id = %s.id,
                                confidence = verdict.confidence,
                                "Below engagement threshold — staying neutral"
                            );
                            (ReplyKind::Neutral, Phase::Unevaluated)
                        }
                    })
                    .await;
                (kind, phase, false, None)
            }

            Phase::Engaged => {
                // Extraction and merge run before reply generation so a
                // generation failure cannot stall intelligence gathering.
                let extracted = self.extractor.extract(&inbound_text);

                let min_engagement = self.settings.min_engagement_messages;
                let max_total = self.settings.max_total_messages;

                let (kind, phase, concluded_now, report) = self
                    .store
                    .with_session(session_id, |s| {
                        s.evidence.merge(&extracted);

                        if s.phase == Phase::Concluded {
                            return (ReplyKind::Closing, s.phase, false, None);
                        }

                        let ripe = s.messages_since_engagement() >= min_engagement
                            && (s.evidence.is_high_value() || s.total_messages() >= max_total);

                        if ripe && !s.report_sent {
                            s.conclude();
                            let report = build_report(s);
                            // Flip the guard before any delivery attempt:
                            // at-most-once from the engine's perspective.
                            s.mark_report_sent();
                            info!(
                                session_id = %s.id,
                                total_messages = s.total_messages(),
                                high_value = s.evidence.is_high_value(),
                                "Conclusion predicate fired — report built"
                            );
                            (ReplyKind::Closing, Phase::Concluded, true, Some(report))
                        } else {
                            (ReplyKind::Engaged, s.phase, false, None)
                        }
                    })
                    .await;
                (kind, phase, concluded_now, report)
            }

            // Terminal: polite close, no re-classification, no report.
            Phase::Concluded => (ReplyKind::Closing, Phase::Concluded, false, None),
        };

        if let Some(report) = report {
            self.dispatch_report(report);
        }

        let ctx = ReplyContext {
            kind,
            inbound_text,
            history: reply_history,
            metadata: metadata.clone(),
        };
        let reply = self.generate(&ctx).await;

        EngineReply {
            reply,
            phase,
            concluded_now,
        }
    }

    /// Classify with a bounded timeout. Every failure degrades to the
    /// safe default — never engage on ambiguous signal.
    async fn classify(
        &self,
        text: &str,
        history: &[Message],
        metadata: &ChannelMetadata,
    ) -> Verdict {
        let timeout = Duration::from_secs(self.settings.collaborator_timeout_secs);
        match tokio::time::timeout(timeout, self.classifier.classify(text, history, metadata)).await
        {
            Ok(Ok(verdict)) => verdict.clamped(),
            Ok(Err(e)) => {
                warn!(
                    classifier = self.classifier.name(),
                    error = %e,
                    "Classification failed — treating as not-scam"
                );
                Verdict::not_scam()
            }
            Err(_) => {
                warn!(
                    classifier = self.classifier.name(),
                    timeout_secs = self.settings.collaborator_timeout_secs,
                    "Classification timed out — treating as not-scam"
                );
                Verdict::not_scam()
            }
        }
    }

    /// Generate a reply with a bounded timeout, substituting the fixed
    /// fallback on any failure.
    async fn generate(&self, ctx: &ReplyContext) -> String {
        let timeout = Duration::from_secs(self.settings.collaborator_timeout_secs);
        match tokio::time::timeout(timeout, self.replier.reply(ctx)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(
                    replier = self.replier.name(),
                    error = %e,
                    "Reply generation failed — using fallback"
                );
                FALLBACK_REPLY.to_string()
            }
            Err(_) => {
                warn!(
                    replier = self.replier.name(),
                    timeout_secs = self.settings.collaborator_timeout_secs,
                    "Reply generation timed out — using fallback"
                );
                FALLBACK_REPLY.to_string()
            }
        }
    }

    /// Hand a built report to the sink without blocking the reply path.
    /// Delivery failures are logged and never re-trigger construction.
    fn dispatch_report(&self, report: FinalReport) {
        let reporter = self.reporter.clone();
        tokio::spawn(async move {
            match reporter.deliver(&report).await {
                Ok(()) => {
                    info!(session_id = %report.session_id, "Final report delivered")
                }
                Err(e) => {
                    warn!(
                        session_id = %report.session_id,
                        error = %e,
                        "Final report delivery failed"
                    )
                }
            }
        });
    }
}

fn kind_for(phase: Phase) -> ReplyKind {
    match phase {
        Phase::Unevaluated => ReplyKind::Neutral,
        Phase::Engaged => ReplyKind::Engaged,
        Phase::Concluded => ReplyKind::Closing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mellivora_config::ExtractorConfig;
    use mellivora_core::error::{ClassifierError, ReplyError, ReportError};
    use std::sync::Mutex;

    // ── Scripted collaborators ────────────────────────────────────────

    struct StubClassifier {
        verdict: Verdict,
        calls: Mutex<usize>,
        history_lens: Mutex<Vec<usize>>,
    }

    impl StubClassifier {
        fn confident(confidence: f32) -> Self {
            Self {
                verdict: Verdict {
                    is_scam: confidence > 0.0,
                    confidence,
                    category: "KYC".into(),
                },
                calls: Mutex::new(0),
                history_lens: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl ScamClassifier for StubClassifier {
        fn name(&self) -> &str {
            "stub"
        }

        async fn classify(
            &self,
            _text: &str,
            history: &[Message],
            _metadata: &ChannelMetadata,
        ) -> Result<Verdict, ClassifierError> {
            *self.calls.lock().unwrap() += 1;
            self.history_lens.lock().unwrap().push(history.len());
            Ok(self.verdict.clone())
        }
    }

    struct FailingClassifier;

    #[async_trait::async_trait]
    impl ScamClassifier for FailingClassifier {
        fn name(&self) -> &str {
            "failing"
        }

        async fn classify(
            &self,
            _text: &str,
            _history: &[Message],
            _metadata: &ChannelMetadata,
        ) -> Result<Verdict, ClassifierError> {
            Err(ClassifierError::MalformedOutput("not json".into()))
        }
    }

    /// Replies with the kind name, so tests can assert which voice was used.
    struct KindedReplier;

    #[async_trait::async_trait]
    impl ReplyGenerator for KindedReplier {
        fn name(&self) -> &str {
            "kinded"
        }

        async fn reply(&self, ctx: &ReplyContext) -> Result<String, ReplyError> {
            Ok(match ctx.kind {
                ReplyKind::Neutral => "neutral",
                ReplyKind::Opening => "opening",
                ReplyKind::Engaged => "engaged",
                ReplyKind::Closing => "closing",
            }
            .to_string())
        }
    }

    struct FailingReplier;

    #[async_trait::async_trait]
    impl ReplyGenerator for FailingReplier {
        fn name(&self) -> &str {
            "failing"
        }

        async fn reply(&self, _ctx: &ReplyContext) -> Result<String, ReplyError> {
            Err(ReplyError::EmptyOutput)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<FinalReport>>,
    }

    impl RecordingSink {
        fn count(&self) -> usize {
            self.delivered.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl ReportSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn deliver(&self, report: &FinalReport) -> Result<(), ReportError> {
            self.delivered.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    // ── Harness ───────────────────────────────────────────────────────

    fn engine_with(
        classifier: Arc<dyn ScamClassifier>,
        replier: Arc<dyn ReplyGenerator>,
        sink: Arc<RecordingSink>,
    ) -> HoneypotEngine {
        HoneypotEngine::new(
            classifier,
            replier,
            sink,
            Extractor::new(&ExtractorConfig::default()),
            EngineConfig::default(),
        )
    }

    async fn send(engine: &HoneypotEngine, id: &str, text: &str) -> EngineReply {
        engine
            .handle_message(
                &SessionId::from(id),
                Message::counterparty(text, 0),
                &[],
                &ChannelMetadata::default(),
            )
            .await
    }

    /// Let the spawned report-delivery task run.
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    // ── Scenarios ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn engages_on_high_confidence_first_message() {
        let sink = Arc::new(RecordingSink::default());
        let engine = engine_with(
            Arc::new(StubClassifier::confident(0.92)),
            Arc::new(KindedReplier),
            sink,
        );

        let out = send(&engine, "s1", "Your account is blocked, verify KYC now").await;

        assert_eq!(out.phase, Phase::Engaged);
        assert_eq!(out.reply, "opening");

        let snap = engine.store().snapshot(&SessionId::from("s1")).await.unwrap();
        assert!(snap.scam_detected());
        assert_eq!(snap.scam_confidence, 0.92);
        assert_eq!(snap.scam_category.as_deref(), Some("KYC"));
    }

    #[tokio::test]
    async fn stays_unevaluated_below_threshold() {
        let sink = Arc::new(RecordingSink::default());
        let classifier = Arc::new(StubClassifier::confident(0.4));
        let engine = engine_with(classifier.clone(), Arc::new(KindedReplier), sink);

        let out = send(&engine, "s1", "hello, how are you").await;

        assert_eq!(out.phase, Phase::Unevaluated);
        assert_eq!(out.reply, "neutral");

        let snap = engine.store().snapshot(&SessionId::from("s1")).await.unwrap();
        assert!(!snap.scam_detected());
        assert_eq!(snap.scam_confidence, 0.4);

        // Still classifying on the next message
        send(&engine, "s1", "still chatting").await;
        assert_eq!(classifier.calls(), 2);
    }

    #[tokio::test]
    async fn classifier_failure_fails_safe() {
        let sink = Arc::new(RecordingSink::default());
        let engine = engine_with(Arc::new(FailingClassifier), Arc::new(KindedReplier), sink);

        let out = send(&engine, "s1", "URGENT: verify your account").await;

        // The caller still gets a successful neutral reply
        assert_eq!(out.phase, Phase::Unevaluated);
        assert_eq!(out.reply, "neutral");
        let snap = engine.store().snapshot(&SessionId::from("s1")).await.unwrap();
        assert_eq!(snap.scam_confidence, 0.0);
    }

    #[tokio::test]
    async fn generation_failure_still_gathers_evidence() {
        let sink = Arc::new(RecordingSink::default());
        let engine = engine_with(
            Arc::new(StubClassifier::confident(0.92)),
            Arc::new(FailingReplier),
            sink,
        );

        send(&engine, "s1", "first contact").await; // engages (fallback reply)
        let out = send(&engine, "s1", "pay me at scammer@paytm").await;

        assert_eq!(out.reply, FALLBACK_REPLY);
        let snap = engine.store().snapshot(&SessionId::from("s1")).await.unwrap();
        assert!(snap.evidence.payment_handles.contains("scammer@paytm"));
    }

    #[tokio::test]
    async fn concludes_on_high_value_after_minimum_engagement() {
        let sink = Arc::new(RecordingSink::default());
        let engine = engine_with(
            Arc::new(StubClassifier::confident(0.92)),
            Arc::new(KindedReplier),
            sink.clone(),
        );

        // Message 1 engages. A payment handle lands early; the session
        // must still hold until 8 post-engagement messages.
        send(&engine, "s1", "your KYC expires today").await;
        send(&engine, "s1", "send money to scammer@paytm").await;

        for i in 0..6 {
            let out = send(&engine, "s1", &format!("filler {i}")).await;
            assert_eq!(out.phase, Phase::Engaged, "concluded too early at {i}");
        }

        // 8th post-engagement message: predicate fires (high-value evidence)
        let out = send(&engine, "s1", "are you sending?").await;
        assert_eq!(out.phase, Phase::Concluded);
        assert!(out.concluded_now);
        assert_eq!(out.reply, "closing");

        settle().await;
        assert_eq!(sink.count(), 1);

        let report = sink.delivered.lock().unwrap()[0].clone();
        assert!(report.scam_detected);
        assert_eq!(report.extracted_intelligence.upi_ids, vec!["scammer@paytm"]);
        assert_eq!(report.total_messages_exchanged, 9);
    }

    #[tokio::test]
    async fn concludes_at_message_ceiling_without_evidence() {
        let sink = Arc::new(RecordingSink::default());
        let engine = engine_with(
            Arc::new(StubClassifier::confident(0.95)),
            Arc::new(KindedReplier),
            sink.clone(),
        );

        send(&engine, "s1", "you won a prize").await; // engages at message 1

        let mut concluded_at = None;
        for i in 2..=15 {
            let out = send(&engine, "s1", &format!("plain message {i}")).await;
            if out.concluded_now {
                concluded_at = Some(i);
                break;
            }
        }

        // No evidence at all — the 15-message ceiling forces conclusion.
        assert_eq!(concluded_at, Some(15));
        settle().await;
        assert_eq!(sink.count(), 1);
        let report = sink.delivered.lock().unwrap()[0].clone();
        assert!(report.extracted_intelligence.upi_ids.is_empty());
        assert_eq!(report.total_messages_exchanged, 15);
    }

    #[tokio::test]
    async fn concluded_sessions_stay_concluded() {
        let sink = Arc::new(RecordingSink::default());
        let classifier = Arc::new(StubClassifier::confident(0.92));
        let engine = engine_with(classifier.clone(), Arc::new(KindedReplier), sink.clone());

        send(&engine, "s1", "account blocked, act now").await;
        for i in 0..8 {
            send(&engine, "s1", &format!("call 987654321{i} via bit.ly/x{i}")).await;
        }

        let snap = engine.store().snapshot(&SessionId::from("s1")).await.unwrap();
        assert_eq!(snap.phase, Phase::Concluded);
        let classifier_calls_at_conclusion = classifier.calls();

        // Further messages: polite close, no state change, no report,
        // no re-classification.
        let out = send(&engine, "s1", "hello? still there? 123456789012").await;
        assert_eq!(out.phase, Phase::Concluded);
        assert!(!out.concluded_now);
        assert_eq!(out.reply, "closing");

        settle().await;
        assert_eq!(sink.count(), 1);
        assert_eq!(classifier.calls(), classifier_calls_at_conclusion);

        // Evidence did not grow after conclusion
        let after = engine.store().snapshot(&SessionId::from("s1")).await.unwrap();
        assert!(!after.evidence.bank_accounts.contains("123456789012"));
    }

    #[tokio::test]
    async fn classification_context_is_bounded_and_excludes_current() {
        let sink = Arc::new(RecordingSink::default());
        let classifier = Arc::new(StubClassifier::confident(0.1));
        let engine = engine_with(classifier.clone(), Arc::new(KindedReplier), sink);

        for i in 0..8 {
            send(&engine, "s1", &format!("chit chat {i}")).await;
        }

        let lens = classifier.history_lens.lock().unwrap().clone();
        // First message has no history; later ones cap at the window (5)
        assert_eq!(lens[0], 0);
        assert_eq!(lens[1], 1);
        assert_eq!(*lens.last().unwrap(), 5);
    }

    #[tokio::test]
    async fn wire_history_seeds_new_sessions() {
        let sink = Arc::new(RecordingSink::default());
        let classifier = Arc::new(StubClassifier::confident(0.1));
        let engine = engine_with(classifier.clone(), Arc::new(KindedReplier), sink);

        let wire: Vec<Message> = (0..9)
            .map(|i| Message::counterparty(format!("earlier {i}"), i))
            .collect();
        engine
            .handle_message(
                &SessionId::from("fresh"),
                Message::counterparty("current", 99),
                &wire,
                &ChannelMetadata::default(),
            )
            .await;

        // The store had nothing, so the classifier saw the tail of the
        // caller-supplied history, capped at the window.
        let lens = classifier.history_lens.lock().unwrap().clone();
        assert_eq!(lens, vec![5]);
    }

    #[tokio::test]
    async fn consecutive_same_sender_messages_are_tolerated() {
        let sink = Arc::new(RecordingSink::default());
        let engine = engine_with(
            Arc::new(StubClassifier::confident(0.92)),
            Arc::new(KindedReplier),
            sink.clone(),
        );

        // No turn-taking: the counterparty floods, and the predicate
        // still advances on raw message count.
        send(&engine, "s1", "hello").await;
        for _ in 0..7 {
            send(&engine, "s1", "send to scammer@paytm").await;
        }
        let out = send(&engine, "s1", "now!").await;

        assert_eq!(out.phase, Phase::Concluded);
        settle().await;
        assert_eq!(sink.count(), 1);
    }
}
