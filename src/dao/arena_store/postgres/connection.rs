use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::time::sleep;
use tracing::{info, warn};

use super::{
    config::PostgresConfig,
    error::{PostgresDaoError, PostgresResult},
};

struct RetryPolicy;

impl RetryPolicy {
    const MAX_ATTEMPTS: u32 = 5;
    const INITIAL_DELAY_MS: u64 = 250;

    fn initial_delay() -> Duration {
        Duration::from_millis(Self::INITIAL_DELAY_MS)
    }

    fn next_delay(current: Duration) -> Duration {
        (current * 2).min(Duration::from_secs(5))
    }
}

/// Open a pool and wait until PostgreSQL answers a ping.
pub(super) async fn establish_pool(config: &PostgresConfig) -> PostgresResult<PgPool> {
    let mut attempts = 0;
    let mut delay = RetryPolicy::initial_delay();

    loop {
        attempts += 1;
        let result = async {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.acquire_timeout)
                .connect(&config.database_url)
                .await?;
            sqlx::query("SELECT 1").execute(&pool).await?;
            Ok::<_, sqlx::Error>(pool)
        }
        .await;

        match result {
            Ok(pool) => {
                if attempts > 1 {
                    info!(attempts, "connected to PostgreSQL after retry");
                }
                return Ok(pool);
            }
            Err(err) if attempts < RetryPolicy::MAX_ATTEMPTS => {
                warn!(
                    attempts,
                    wait_ms = delay.as_millis(),
                    error = %err,
                    "PostgreSQL connection failed; retrying"
                );
                sleep(delay).await;
                delay = RetryPolicy::next_delay(delay);
            }
            Err(source) => return Err(PostgresDaoError::Connect { attempts, source }),
        }
    }
}
