use redis::aio::MultiplexedConnection;

use crate::errors::AuthError;

/// Ephemeral passcode → email mapping in Redis. Entries expire on their own
/// after the configured TTL; consumption is a single atomic GETDEL so two
/// concurrent resets cannot both redeem the same passcode.
#[derive(Clone)]
pub struct PasscodeStore {
    conn: MultiplexedConnection,
    ttl_seconds: u64,
}

impl PasscodeStore {
    pub fn new(conn: MultiplexedConnection, ttl_seconds: u64) -> Self {
        Self { conn, ttl_seconds }
    }

    /// Store the mapping with expiry. Overwrite-safe.
    pub async fn save(&self, passcode: &str, email: &str) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(passcode)
            .arg(email)
            .arg("EX")
            .arg(self.ttl_seconds)
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    /// Atomically fetch and delete. None when absent or expired.
    pub async fn take(&self, passcode: &str) -> Result<Option<String>, AuthError> {
        let mut conn = self.conn.clone();
        let email: Option<String> = redis::cmd("GETDEL")
            .arg(passcode)
            .query_async(&mut conn)
            .await?;
        Ok(email)
    }

    /// Idempotent removal.
    pub async fn delete(&self, passcode: &str) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(passcode)
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }
}
