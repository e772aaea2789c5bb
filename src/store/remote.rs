use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, IntoConnectionInfo, ProtocolVersion, RedisError};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::{Fields, HashStore, StoreError};
use crate::config::RedisConfig;

/// Redis-backed hash store.
///
/// Building one never touches the network. The first command opens a single
/// multiplexed connection that every caller then shares; a connection that
/// fails at the transport level is dropped and reopened by the next command.
pub struct RedisStore {
    client: Client,
    connection: Mutex<Slot>,
}

/// Cached connection tagged with the generation that opened it
#[derive(Default)]
struct Slot {
    generation: u64,
    conn: Option<MultiplexedConnection>,
}

impl RedisStore {
    /// Create a client bound to `host:port`, database 0, authenticated by password
    pub fn new(config: &RedisConfig) -> Result<Self, StoreError> {
        let port = config.port_number()?;
        let mut info = (config.host.clone(), port).into_connection_info()?;
        info.redis.db = 0;
        info.redis.password = Some(config.password.clone());
        info.redis.protocol = ProtocolVersion::RESP2;

        let client = Client::open(info)?;
        info!(host = %config.host, port, "redis client configured");

        Ok(Self {
            client,
            connection: Mutex::new(Slot::default()),
        })
    }

    async fn connection(&self) -> Result<(u64, MultiplexedConnection), StoreError> {
        let mut slot = self.connection.lock().await;
        if let Some(conn) = slot.conn.as_ref() {
            return Ok((slot.generation, conn.clone()));
        }

        debug!("opening redis connection");
        let conn = self.client.get_multiplexed_async_connection().await?;
        slot.generation += 1;
        slot.conn = Some(conn.clone());
        Ok((slot.generation, conn))
    }

    /// Forget the cached connection when the failure points at the transport.
    ///
    /// Only the connection of `generation` is dropped; one reopened in the
    /// meantime by another caller stays.
    async fn discard_if_broken(&self, generation: u64, err: &RedisError) {
        if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            let mut slot = self.connection.lock().await;
            if slot.generation == generation {
                slot.conn = None;
            }
        }
    }

    async fn query<T: redis::FromRedisValue>(&self, cmd: &redis::Cmd) -> Result<T, StoreError> {
        let (generation, mut conn) = self.connection().await?;
        match cmd.query_async(&mut conn).await {
            Ok(value) => Ok(value),
            Err(e) => {
                self.discard_if_broken(generation, &e).await;
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl HashStore for RedisStore {
    async fn set(&self, key: &str, fields: &Fields) -> Result<u64, StoreError> {
        if fields.is_empty() {
            return Err(StoreError::EmptyPayload { key: key.to_string() });
        }

        let mut cmd = redis::cmd("HSET");
        cmd.arg(key);
        for (field, value) in fields {
            cmd.arg(field).arg(value);
        }

        self.query(&cmd).await.inspect_err(|e| {
            error!(key, error = %e, "error inserting into redis");
        })
    }

    async fn get(&self, key: &str, field: &str) -> Result<String, StoreError> {
        let value: Option<String> = self
            .query(redis::cmd("HGET").arg(key).arg(field))
            .await
            .inspect_err(|e| {
                error!(key, field, error = %e, "error reading from redis");
            })?;

        value.ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
            field: field.to_string(),
        })
    }

    async fn get_all(&self, key: &str) -> Result<Fields, StoreError> {
        self.query(redis::cmd("HGETALL").arg(key))
            .await
            .inspect_err(|e| {
                error!(key, error = %e, "error reading from redis");
            })
    }
}
