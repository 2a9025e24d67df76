use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;

use telegram_api_client::client::{RequestHandler, RequestOptions};
use telegram_api_client::error::RawError;
use telegram_api_client::rate_limit::{
    Admission, LimiterRegistry, RateLimitConfig, RateLimiter, Scope, ScopeKey, ScopeLimit,
};
use telegram_api_client::retry::NoJitter;
use telegram_api_client::types::{MethodName, RequestDescriptor};

fn named_scope(name: &str, window_ms: u64, max_count: u32) -> Scope {
    Scope::new(
        name.parse::<ScopeKey>().unwrap(),
        ScopeLimit::new(Duration::from_millis(window_ms), max_count),
    )
}

#[tokio::test(start_paused = true)]
async fn test_max_count_admissions_then_deny() {
    let registry = LimiterRegistry::new();

    for (name, window_ms, max_count) in [
        ("global", 100, 30),
        ("chat:1", 100, 1),
        ("group:1", 60_000, 20),
        ("method:sendMessage", 100, 30),
    ] {
        let scope = named_scope(name, window_ms, max_count);
        for _ in 0..max_count {
            assert!(registry.check_and_admit(&scope).is_admitted(), "{}", name);
        }

        let denied = registry.check_and_admit(&scope);
        assert!(!denied.is_admitted(), "{}", name);
        assert!(denied.wait_ms() > 0, "{}", name);
    }
}

#[tokio::test(start_paused = true)]
async fn test_admits_again_after_waiting() {
    let registry = LimiterRegistry::new();
    let scope = named_scope("chat:9", 250, 2);

    registry.check_and_admit(&scope);
    registry.check_and_admit(&scope);
    let Admission::Deny { wait } = registry.check_and_admit(&scope) else {
        panic!("scope should be full");
    };

    tokio::time::sleep(wait).await;
    assert!(registry.check_and_admit(&scope).is_admitted());
}

#[tokio::test(start_paused = true)]
async fn test_group_scope_limits_bursts_to_one_chat() {
    let config = RateLimitConfig {
        chat: ScopeLimit::new(Duration::from_millis(1), 100),
        ..Default::default()
    };
    let limiter = RateLimiter::new(config);
    let request = RequestDescriptor::new(MethodName::SEND_MESSAGE).chat(-100123);
    let start = Instant::now();

    for _ in 0..21 {
        limiter.with_rate_limit(&request, || async {}).await;
    }

    // The 21st message waits for the first to leave the 60s group window.
    assert!(start.elapsed() >= Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_global_scope_spans_chats() {
    let config = RateLimitConfig {
        global: ScopeLimit::new(Duration::from_millis(100), 2),
        ..Default::default()
    };
    let limiter = RateLimiter::new(config);
    let start = Instant::now();

    for chat_id in 0..3 {
        let request = RequestDescriptor::new(MethodName::SEND_MESSAGE).chat(chat_id);
        limiter.with_rate_limit(&request, || async {}).await;
    }

    assert!(start.elapsed() >= Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_to_one_chat_are_spaced() {
    let handler = Arc::new(
        RequestHandler::builder()
            .jitter(Arc::new(NoJitter))
            .build()
            .unwrap(),
    );
    let sent = Arc::new(AtomicU32::new(0));
    let start = Instant::now();

    let tasks: Vec<_> = (0..5)
        .map(|_| {
            let handler = handler.clone();
            let sent = sent.clone();
            tokio::spawn(async move {
                handler
                    .request_with_handling(
                        MethodName::SEND_MESSAGE,
                        &json!({ "chat_id": 77 }),
                        || {
                            sent.fetch_add(1, Ordering::SeqCst);
                            async { Ok::<_, RawError>(Instant::now()) }
                        },
                        &RequestOptions::default(),
                    )
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut times = Vec::new();
    for task in tasks {
        times.push(task.await.unwrap());
    }
    times.sort();

    assert_eq!(sent.load(Ordering::SeqCst), 5);
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(100));
    }
    assert!(start.elapsed() >= Duration::from_millis(400));
}

#[test]
fn test_reset_all_admits_immediately() {
    let registry = LimiterRegistry::new();
    let scope = named_scope("group:-1", 60_000, 1);

    registry.check_and_admit(&scope);
    assert!(!registry.check_and_admit(&scope).is_admitted());

    registry.reset_all();
    assert!(registry.check_and_admit(&scope).is_admitted());
}
