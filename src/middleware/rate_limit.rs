use crate::errors::AuthError;

/// Email-keyed rate limit in Redis, INCR + EXPIRE:
/// - increments a counter for `key`
/// - on first increment, sets TTL to `window_secs`
/// - fails with 429 once the counter exceeds `max_attempts`
///
/// Redis being unreachable does not lock anyone out; the limiter degrades
/// open.
pub async fn check_rate_limit(
    redis: &mut redis::aio::MultiplexedConnection,
    key: &str,
    max_attempts: u64,
    window_secs: u64,
) -> Result<(), AuthError> {
    let count: u64 = redis::cmd("INCR")
        .arg(key)
        .query_async(redis)
        .await
        .unwrap_or(0);

    if count == 1 {
        // Set TTL only on first increment to avoid resetting the window on
        // each attempt.
        let _: Result<(), _> = redis::cmd("EXPIRE")
            .arg(key)
            .arg(window_secs)
            .query_async(redis)
            .await;
    }

    if count > max_attempts {
        return Err(AuthError::TooManyRequests);
    }

    Ok(())
}
