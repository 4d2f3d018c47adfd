use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::time::Duration;

use crate::domain::models::parse_leading_int;

static JS_PROTOCOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)javascript:").expect("valid regex"));
static EVENT_HANDLER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)on\w+=").expect("valid regex"));
static WHITESPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Best-effort denylist sanitizer applied to every free-text answer before it
/// is written to the store. The steps run in a fixed order: trim, truncate,
/// then strip angle brackets, `javascript:` protocols, inline event-handler
/// attributes and quotes, and finally collapse whitespace runs.
///
/// This strips rather than encodes, so it can over-strip legitimate content
/// (apostrophes in feedback) and is not a parser-grade XSS defense. Kept
/// behind this module so a context-aware encoder can replace it without
/// touching call sites.
pub fn sanitize_input(raw: &str, max_len: usize) -> String {
    let trimmed = raw.trim();
    let truncated: String = trimmed.chars().take(max_len).collect();

    let without_brackets: String = truncated.chars().filter(|c| *c != '<' && *c != '>').collect();
    let without_protocol = JS_PROTOCOL_RE.replace_all(&without_brackets, "");
    let without_handlers = EVENT_HANDLER_RE.replace_all(&without_protocol, "");
    let without_quotes: String = without_handlers
        .chars()
        .filter(|c| *c != '\'' && *c != '"')
        .collect();

    // Stripping can leave whitespace at the boundaries; the final trim keeps
    // the function idempotent.
    WHITESPACE_RUN_RE
        .replace_all(&without_quotes, " ")
        .trim()
        .to_string()
}

/// A pulse rating is valid iff it parses as an integer in 1..=5.
pub fn validate_pulse_score(raw: &str) -> bool {
    matches!(parse_leading_int(raw), Some(score) if (1..=5).contains(&score))
}

/// Sanitize first, then check the cleaned length. Truncation happens inside
/// `sanitize_input`, so over-long input that still carries `min_len` chars
/// after the cut is accepted.
pub fn validate_text_response(raw: &str, min_len: usize, max_len: usize) -> bool {
    let sanitized = sanitize_input(raw, max_len);
    let len = sanitized.chars().count();
    len >= min_len && len <= max_len
}

const ANON_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ANON_FRAGMENT_LEN: usize = 9;

/// Human-scannable submission token: `anon_<base36 fragment>_<epoch millis>`.
/// Not cryptographic and not collision-proof; the store-assigned id is the
/// real identity of a record.
pub fn generate_anonymous_id() -> String {
    let mut rng = rand::thread_rng();
    let fragment: String = (0..ANON_FRAGMENT_LEN)
        .map(|_| ANON_ALPHABET[rng.gen_range(0..ANON_ALPHABET.len())] as char)
        .collect();
    format!("anon_{}_{}", fragment, chrono::Utc::now().timestamp_millis())
}

/// Jittered pause before a submission is written, so response latency does
/// not leak when a form was filled. Uniform in [1000ms, 3000ms); purely a
/// sleep, abandoned along with the surrounding request.
pub async fn add_random_delay() {
    let millis = rand::thread_rng().gen_range(1000..3000);
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
