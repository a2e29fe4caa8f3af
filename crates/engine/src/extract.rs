//! Pattern extractor — deterministic text → evidence transform.
//!
//! Pure and infallible: the absence of a pattern is simply an empty set.
//! Matchers operate on independent substrings except for the phone/bank
//! rule: phones are matched first and their spans are excluded from
//! bank-account matching, so a phone number is never double-counted as
//! an account.

use mellivora_config::ExtractorConfig;
use mellivora_core::Evidence;
use regex::Regex;

/// Bank accounts are 9–18 digit runs on the wire, but anything under this
/// floor is too phone-shaped to trust.
const MIN_ACCOUNT_DIGITS: usize = 11;

/// Compiled matchers over a configured vocabulary.
pub struct Extractor {
    handle_re: Regex,
    phone_re: Regex,
    digits_re: Regex,
    url_re: Regex,
    payment_suffixes: Vec<String>,
    keywords: Vec<String>,
}

impl Extractor {
    /// Compile the matchers. Configured domain lists are regex-escaped,
    /// so construction cannot fail on user input.
    pub fn new(config: &ExtractorConfig) -> Self {
        let shortener_alt = config
            .url_shorteners
            .iter()
            .map(|d| regex::escape(d))
            .collect::<Vec<_>>()
            .join("|");

        let url_pattern = if shortener_alt.is_empty() {
            r"https?://[^\s]+|www\.[^\s]+".to_string()
        } else {
            format!(r"https?://[^\s]+|www\.[^\s]+|(?:{shortener_alt})/[^\s]+")
        };

        Self {
            handle_re: Regex::new(r"\b([A-Za-z0-9][\w.-]*)@([A-Za-z0-9-]+)\b")
                .expect("payment handle pattern"),
            phone_re: Regex::new(r"(?:\+91|91|0)?[6-9][0-9]{9}\b").expect("phone pattern"),
            digits_re: Regex::new(r"\b[0-9]{9,18}\b").expect("digit run pattern"),
            url_re: Regex::new(&url_pattern).expect("url pattern"),
            payment_suffixes: config
                .payment_suffixes
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            keywords: config.keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Extract all evidence classes from one message.
    pub fn extract(&self, text: &str) -> Evidence {
        let mut evidence = Evidence::new();
        let lower = text.to_lowercase();

        // Payment handles: localpart@domain where the domain is on the
        // payment-platform allow-list. Generic email-like tokens fall out.
        for caps in self.handle_re.captures_iter(text) {
            let domain = caps[2].to_lowercase();
            if self.payment_suffixes.contains(&domain) {
                evidence.payment_handles.insert(caps[0].to_string());
            }
        }

        // Phones first: 10 digits starting 6-9, optional +91/91/0 prefix.
        // The 10-digit core is always the tail of the match.
        let mut phone_ranges: Vec<(usize, usize)> = Vec::new();
        for m in self.phone_re.find_iter(text) {
            let raw = m.as_str();
            let normalized = &raw[raw.len() - 10..];
            phone_ranges.push((m.start(), m.end()));
            evidence.phone_numbers.insert(normalized.to_string());
        }

        // Bank accounts second: digit runs long enough to clear the floor
        // whose span was not already claimed by a phone match.
        for m in self.digits_re.find_iter(text) {
            let overlaps_phone = phone_ranges
                .iter()
                .any(|&(start, end)| m.start() < end && m.end() > start);
            if m.as_str().len() >= MIN_ACCOUNT_DIGITS && !overlaps_phone {
                evidence.bank_accounts.insert(m.as_str().to_string());
            }
        }

        for m in self.url_re.find_iter(text) {
            evidence.phishing_links.insert(m.as_str().to_string());
        }

        for keyword in &self.keywords {
            if lower.contains(keyword.as_str()) {
                evidence.suspicious_keywords.insert(keyword.clone());
            }
        }

        evidence
    }
}
