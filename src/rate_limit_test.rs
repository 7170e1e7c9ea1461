use super::*;

fn limiter() -> RateLimiter {
    RateLimiter::with_config(RateLimitConfig::default())
}

#[test]
fn per_client_allows_up_to_limit() {
    let rl = limiter();
    let client = Uuid::new_v4();
    let now = Instant::now();

    for i in 0..DEFAULT_PER_CLIENT_LIMIT {
        assert!(rl.check_and_record_at(client, now).is_ok(), "request {i} should succeed");
    }
    assert!(matches!(
        rl.check_and_record_at(client, now),
        Err(RateLimitError::PerClientExceeded { limit: DEFAULT_PER_CLIENT_LIMIT, .. })
    ));
}

#[test]
fn global_allows_up_to_limit() {
    let rl = limiter();
    let now = Instant::now();

    // Distinct clients so the per-client limit never trips first.
    for i in 0..DEFAULT_GLOBAL_LIMIT {
        assert!(rl.check_and_record_at(Uuid::new_v4(), now).is_ok(), "request {i} should succeed");
    }
    assert!(matches!(
        rl.check_and_record_at(Uuid::new_v4(), now),
        Err(RateLimitError::GlobalExceeded { .. })
    ));
}

#[test]
fn window_expiry_allows_new_requests() {
    let rl = limiter();
    let client = Uuid::new_v4();
    let start = Instant::now();

    for _ in 0..DEFAULT_PER_CLIENT_LIMIT {
        rl.check_and_record_at(client, start).unwrap();
    }
    assert!(rl.check_and_record_at(client, start).is_err());

    let after_window = start + Duration::from_secs(DEFAULT_PER_CLIENT_WINDOW_SECS) + Duration::from_millis(1);
    assert!(rl.check_and_record_at(client, after_window).is_ok());
}

#[test]
fn distinct_clients_do_not_interfere() {
    let rl = limiter();
    let client_a = Uuid::new_v4();
    let client_b = Uuid::new_v4();
    let now = Instant::now();

    for _ in 0..DEFAULT_PER_CLIENT_LIMIT {
        rl.check_and_record_at(client_a, now).unwrap();
    }
    assert!(rl.check_and_record_at(client_a, now).is_err());
    assert!(rl.check_and_record_at(client_b, now).is_ok());
}

#[test]
fn rejected_requests_are_not_recorded() {
    let rl = RateLimiter::with_config(RateLimitConfig { per_client_limit: 1, ..RateLimitConfig::default() });
    let client = Uuid::new_v4();
    let now = Instant::now();

    rl.check_and_record_at(client, now).unwrap();
    for _ in 0..5 {
        assert!(rl.check_and_record_at(client, now).is_err());
    }
    // Only the first request counts against the global window.
    for _ in 0..DEFAULT_GLOBAL_LIMIT - 1 {
        rl.check_and_record_at(Uuid::new_v4(), now).unwrap();
    }
    assert!(matches!(rl.check_and_record_at(Uuid::new_v4(), now), Err(RateLimitError::GlobalExceeded { .. })));
}

#[test]
fn errors_carry_the_rate_limited_code() {
    let err = RateLimitError::GlobalExceeded { limit: 20, window_secs: 60 };
    assert_eq!(err.error_code(), "E_RATE_LIMITED");
    assert!(err.retryable());
    assert_eq!(err.to_string(), "global rate limit exceeded (max 20 requests/60s)");
}
