//! Bounded connection pool with health probing on reuse and release.

use std::collections::{HashMap, VecDeque};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::constants::{DEFAULT_ACQUIRE_TIMEOUT_MS, DEFAULT_POOL_SIZE};
use crate::db::connection::{ConnectionInfo, PgConnectionFactory};
use crate::error::{PgShiftError, Result};

/// Creates and checks connections on behalf of a pool
#[async_trait]
pub trait ConnectionFactory: Send + Sync + 'static {
    type Connection: Send + 'static;

    async fn create(&self) -> Result<Self::Connection>;

    /// Round-trip health check; `false` means the connection must be discarded
    async fn probe(&self, conn: &mut Self::Connection) -> bool;

    async fn close(&self, conn: Self::Connection) {
        drop(conn);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_size: usize,
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_POOL_SIZE,
            acquire_timeout: Duration::from_millis(DEFAULT_ACQUIRE_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub max_size: usize,
    pub idle: usize,
    pub active: usize,
    pub waiting: usize,
}

pub struct ConnectionPool<F: ConnectionFactory> {
    config: PoolConfig,
    factory: F,
    idle: Mutex<VecDeque<F::Connection>>,
    semaphore: Arc<Semaphore>,
    active_count: AtomicUsize,
    waiting_count: AtomicUsize,
}

impl<F: ConnectionFactory> ConnectionPool<F> {
    pub fn new(factory: F, config: PoolConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_size.max(1))),
            config,
            factory,
            idle: Mutex::new(VecDeque::new()),
            active_count: AtomicUsize::new(0),
            waiting_count: AtomicUsize::new(0),
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Check out a connection, waiting for a free slot up to the acquire timeout.
    ///
    /// Idle connections are probed before reuse; a fresh one is created when
    /// none is idle or every idle one failed its probe.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<PooledConnection<'_, F>> {
        if cancel.is_cancelled() {
            return Err(PgShiftError::Cancelled);
        }

        self.waiting_count.fetch_add(1, Ordering::SeqCst);
        let permit = tokio::select! {
            _ = cancel.cancelled() => Err(PgShiftError::Cancelled),
            result = tokio::time::timeout(
                self.config.acquire_timeout,
                self.semaphore.clone().acquire_owned(),
            ) => match result {
                Ok(Ok(permit)) => Ok(permit),
                Ok(Err(_)) => Err(PgShiftError::pool("Pool is closed", "acquiring a connection")),
                Err(_) => Err(PgShiftError::Timeout(format!(
                    "Timed out waiting for a connection (timeout: {:?})",
                    self.config.acquire_timeout
                ))),
            },
        };
        self.waiting_count.fetch_sub(1, Ordering::SeqCst);
        let permit = permit?;

        let connection = match self.take_idle().await {
            Some(conn) => conn,
            None => tokio::select! {
                _ = cancel.cancelled() => return Err(PgShiftError::Cancelled),
                created = self.factory.create() => created?,
            },
        };

        self.active_count.fetch_add(1, Ordering::SeqCst);
        Ok(PooledConnection {
            connection: Some(connection),
            pool: self,
            _permit: permit,
        })
    }

    async fn take_idle(&self) -> Option<F::Connection> {
        loop {
            let candidate = { self.idle.lock().pop_front() };
            let mut conn = candidate?;
            if self.factory.probe(&mut conn).await {
                return Some(conn);
            }
            debug!("Idle connection failed health probe, discarding");
            self.factory.close(conn).await;
        }
    }

    /// Return a connection after probing it; an unhealthy one is replaced
    pub async fn release(&self, mut pooled: PooledConnection<'_, F>) {
        let Some(mut conn) = pooled.connection.take() else {
            return;
        };
        self.active_count.fetch_sub(1, Ordering::SeqCst);

        if self.factory.probe(&mut conn).await {
            self.idle.lock().push_back(conn);
            return;
        }

        warn!("Released connection failed health probe, replacing it");
        self.factory.close(conn).await;
        match self.factory.create().await {
            Ok(fresh) => self.idle.lock().push_back(fresh),
            Err(e) => warn!("Could not replace discarded connection: {}", e),
        }
        // The permit is held until the replacement is in place
        drop(pooled);
    }

    fn return_connection(&self, conn: F::Connection) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        self.idle.lock().push_back(conn);
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            max_size: self.config.max_size,
            idle: self.idle.lock().len(),
            active: self.active_count.load(Ordering::SeqCst),
            waiting: self.waiting_count.load(Ordering::SeqCst),
        }
    }

    /// Refuse new checkouts and close every idle connection
    pub async fn close(&self) {
        self.semaphore.close();
        let connections: Vec<_> = { self.idle.lock().drain(..).collect() };
        for conn in connections {
            self.factory.close(conn).await;
        }
    }
}

/// A connection checked out of a pool.
///
/// Dropping it returns the connection unprobed; it is probed again on the
/// next `acquire`.
pub struct PooledConnection<'a, F: ConnectionFactory> {
    connection: Option<F::Connection>,
    pool: &'a ConnectionPool<F>,
    _permit: OwnedSemaphorePermit,
}

impl<F: ConnectionFactory> Deref for PooledConnection<'_, F> {
    type Target = F::Connection;

    fn deref(&self) -> &Self::Target {
        self.connection.as_ref().expect("connection taken")
    }
}

impl<F: ConnectionFactory> DerefMut for PooledConnection<'_, F> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.connection.as_mut().expect("connection taken")
    }
}

impl<F: ConnectionFactory> Drop for PooledConnection<'_, F> {
    fn drop(&mut self) {
        if let Some(conn) = self.connection.take() {
            self.pool.return_connection(conn);
        }
    }
}

pub type PgPool = ConnectionPool<PgConnectionFactory>;

/// One pool per distinct database
#[derive(Default)]
pub struct PoolRegistry {
    config: PoolConfig,
    pools: Mutex<HashMap<ConnectionInfo, Arc<PgPool>>>,
}

impl PoolRegistry {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            pools: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_or_create(&self, info: &ConnectionInfo) -> Arc<PgPool> {
        self.pools
            .lock()
            .entry(info.clone())
            .or_insert_with(|| {
                debug!("Creating connection pool for {}", info);
                Arc::new(ConnectionPool::new(
                    PgConnectionFactory::new(info.clone()),
                    self.config,
                ))
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.pools.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.lock().is_empty()
    }

    pub async fn close_all(&self) {
        let pools: Vec<_> = { self.pools.lock().drain().map(|(_, pool)| pool).collect() };
        for pool in pools {
            pool.close().await;
        }
    }
}
