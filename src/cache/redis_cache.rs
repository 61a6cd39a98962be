//! Redis change cache
//!
//! Keys are product titles and values are prices stored as decimal text,
//! in database 0 of the configured server.

use crate::cache::traits::{CacheError, CacheResult, ChangeCache};
use redis::{Client, Commands, Connection, RedisError, RedisResult};
use std::time::Duration;

/// Bound on connecting and on each read or write
const IO_TIMEOUT: Duration = Duration::from_secs(2);

/// The connection is opened on first use and dropped when it breaks, so a
/// restarted server is picked up by the next lookup.
pub struct RedisChangeCache {
    client: Client,
    timeout: Duration,
    conn: Option<Connection>,
}

impl RedisChangeCache {
    /// Targets the Redis server at `host:port` without connecting yet
    pub fn connect(host: &str, port: u16) -> CacheResult<Self> {
        let client = Client::open(format!("redis://{}:{}/0", host, port))?;
        tracing::info!("Using Redis change cache at {}:{}", host, port);
        Ok(Self {
            client,
            timeout: IO_TIMEOUT,
            conn: None,
        })
    }

    fn open(&self) -> RedisResult<Connection> {
        let conn = self.client.get_connection_with_timeout(self.timeout)?;
        conn.set_read_timeout(Some(self.timeout))?;
        conn.set_write_timeout(Some(self.timeout))?;
        tracing::debug!("Opened Redis connection");
        Ok(conn)
    }

    fn attempt<T>(&mut self, op: &impl Fn(&mut Connection) -> RedisResult<T>) -> RedisResult<T> {
        let mut conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.open()?,
        };
        let result = op(&mut conn);
        match &result {
            Err(e) if is_broken(e) => tracing::debug!("Dropping Redis connection: {}", e),
            _ => self.conn = Some(conn),
        }
        result
    }

    /// Runs `op`, reconnecting once if a kept connection turned out to be dead
    fn run<T>(&mut self, op: impl Fn(&mut Connection) -> RedisResult<T>) -> CacheResult<T> {
        let reused = self.conn.is_some();
        match self.attempt(&op) {
            Err(e) if reused && is_broken(&e) => {
                tracing::warn!("Redis connection lost ({}), reconnecting", e);
                Ok(self.attempt(&op)?)
            }
            result => Ok(result?),
        }
    }
}

fn is_broken(e: &RedisError) -> bool {
    e.is_io_error() || e.is_connection_dropped() || e.is_timeout()
}

impl ChangeCache for RedisChangeCache {
    fn get(&mut self, title: &str) -> CacheResult<Option<f64>> {
        let raw: Option<String> = self.run(|conn| conn.get(title))?;
        raw.map(|value| decode_price(title, value)).transpose()
    }

    fn set(&mut self, title: &str, price: f64) -> CacheResult<()> {
        let value = encode_price(price);
        self.run(|conn| conn.set::<_, _, ()>(title, &value))
    }
}

fn encode_price(price: f64) -> String {
    price.to_string()
}

fn decode_price(key: &str, value: String) -> CacheResult<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| CacheError::Corrupt {
            key: key.to_string(),
            value,
        })
}
