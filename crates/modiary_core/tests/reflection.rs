use modiary_core::reflection::client::{
    EMPTY_DIARY_MESSAGE, EMPTY_RESPONSE_MESSAGE, FAILURE_MESSAGE,
};
use modiary_core::{
    reflect_or_fallback, DisabledReflectionService, GeminiReflectionService, ReflectionConfig,
    ReflectionError, ReflectionService, ReflectionTracker,
};
use std::cell::Cell;
use std::time::Duration;

struct CannedService {
    reply: fn() -> Result<String, ReflectionError>,
    calls: Cell<usize>,
}

impl CannedService {
    fn new(reply: fn() -> Result<String, ReflectionError>) -> Self {
        Self {
            reply,
            calls: Cell::new(0),
        }
    }
}

impl ReflectionService for CannedService {
    fn reflect(&self, _diary: &str) -> Result<String, ReflectionError> {
        self.calls.set(self.calls.get() + 1);
        (self.reply)()
    }
}

#[test]
fn blank_diary_skips_the_service() {
    let service = CannedService::new(|| Ok("unused".to_string()));

    assert_eq!(reflect_or_fallback(&service, "  \n"), EMPTY_DIARY_MESSAGE);
    assert_eq!(service.calls.get(), 0);
}

#[test]
fn successful_reply_is_trimmed() {
    let service = CannedService::new(|| Ok("  Nice walk!  \n".to_string()));
    assert_eq!(reflect_or_fallback(&service, "walked"), "Nice walk!");
    assert_eq!(service.calls.get(), 1);
}

#[test]
fn empty_reply_uses_gentle_fallback() {
    let blank = CannedService::new(|| Ok("   ".to_string()));
    assert_eq!(reflect_or_fallback(&blank, "walked"), EMPTY_RESPONSE_MESSAGE);

    let missing = CannedService::new(|| Err(ReflectionError::MissingText));
    assert_eq!(reflect_or_fallback(&missing, "walked"), EMPTY_RESPONSE_MESSAGE);
}

#[test]
fn failures_use_cheering_fallback() {
    let status = CannedService::new(|| Err(ReflectionError::Status(503)));
    assert_eq!(reflect_or_fallback(&status, "walked"), FAILURE_MESSAGE);

    assert_eq!(
        reflect_or_fallback(&DisabledReflectionService, "walked"),
        FAILURE_MESSAGE
    );
}

#[test]
fn gemini_service_requires_api_key() {
    let config = ReflectionConfig::default();
    assert!(GeminiReflectionService::from_config(&config).is_none());

    let config = ReflectionConfig {
        api_key: Some("test-key".to_string()),
        ..ReflectionConfig::default()
    };
    assert!(GeminiReflectionService::from_config(&config).is_some());
}

#[test]
fn unreachable_endpoint_degrades_to_fallback() {
    let service = GeminiReflectionService::new("test-key", "test-model", Duration::from_millis(200))
        .with_base_url("http://127.0.0.1:9");

    assert_eq!(reflect_or_fallback(&service, "walked"), FAILURE_MESSAGE);
}

#[test]
fn transport_error_text_never_contains_api_key() {
    let service = GeminiReflectionService::new(
        "SECRET-KEY-123",
        "test-model",
        Duration::from_millis(200),
    )
    .with_base_url("http://127.0.0.1:1");

    let err = service.reflect("walked").unwrap_err();

    assert!(matches!(err, ReflectionError::Http(_)));
    let rendered = format!("{err} {err:?}");
    assert!(!rendered.contains("SECRET-KEY-123"), "{rendered}");
}

#[test]
fn tracker_applies_only_latest_response() {
    let mut tracker = ReflectionTracker::new();
    let first = tracker.issue();
    let second = tracker.issue();
    assert!(tracker.busy());

    assert!(tracker.complete(second, "second answer"));
    assert!(!tracker.complete(first, "late first answer"));

    assert!(!tracker.busy());
    assert_eq!(tracker.message(), Some("second answer"));
    assert!(second.sequence() > first.sequence());
}

#[test]
fn tracker_clear_discards_pending_response() {
    let mut tracker = ReflectionTracker::new();
    let done = tracker.issue();
    assert!(tracker.complete(done, "shown"));

    let pending = tracker.issue();
    tracker.clear();

    assert!(tracker.message().is_none());
    assert!(!tracker.complete(pending, "for the old date"));
    assert!(tracker.message().is_none());
    assert!(!tracker.busy());
}

#[test]
fn tracker_ignores_duplicate_completion() {
    let mut tracker = ReflectionTracker::new();
    let ticket = tracker.issue();
    assert!(tracker.complete(ticket, "first"));
    assert!(!tracker.complete(ticket, "again"));
    assert_eq!(tracker.message(), Some("first"));
}
