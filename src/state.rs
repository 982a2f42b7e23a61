use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::Key;
use diesel::{
    SqliteConnection,
    connection::TransactionManager,
    r2d2::{ConnectionManager, Pool, PooledConnection},
};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub key: Key,
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

/// Slot through which the transaction-opening extractor hands the connection
/// back to [`commit_on_success`] once the handler has run.
#[derive(Clone, Default)]
pub struct TxSlot(Arc<tokio::sync::Mutex<Option<ThreadSafeConn<true>>>>);

/// Middleware which finishes the per-request transaction (if one was
/// started): committed for 2xx/3xx responses, rolled back otherwise.
pub async fn commit_on_success(mut req: Request, next: Next) -> Response {
    let slot = TxSlot::default();
    req.extensions_mut().insert(slot.clone());

    let res = next.run(req).await;

    let conn = slot.0.lock().await.take();
    if let Some(conn) = conn {
        let mut conn = match conn.inner.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::error!("connection still locked after handler");
                return res;
            }
        };

        let outcome = if res.status().is_success()
            || res.status().is_redirection()
            || res.status().is_informational()
        {
            <PooledConnection<ConnectionManager<SqliteConnection>> as diesel::Connection>
                ::TransactionManager
                ::commit_transaction(&mut conn)
        } else {
            <PooledConnection<ConnectionManager<SqliteConnection>> as diesel::Connection>
                ::TransactionManager
                ::rollback_transaction(&mut conn)
        };

        if let Err(e) = outcome {
            tracing::error!("failed to finish transaction: {e}");
        }
    }

    res
}

/// A pooled connection shared between the extractors of a single request.
/// When `TX` is true a transaction is opened on first acquisition.
#[derive(Clone)]
pub struct ThreadSafeConn<const TX: bool> {
    pub inner: Arc<
        tokio::sync::Mutex<
            PooledConnection<ConnectionManager<SqliteConnection>>,
        >,
    >,
}

#[async_trait]
impl<const TX: bool, S> FromRequestParts<S> for ThreadSafeConn<TX>
where
    S: Send + Sync,
    DbPool: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        if let Some(cached) = parts.extensions.get::<ThreadSafeConn<TX>>() {
            return Ok(cached.clone());
        }

        let pool = DbPool::from_ref(state);

        let mut conn = tokio::task::spawn_blocking(move || pool.get())
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        if TX {
            <PooledConnection<ConnectionManager<SqliteConnection>> as diesel::Connection>
                ::TransactionManager
                ::begin_transaction(&mut conn)
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        }

        let conn = ThreadSafeConn::<TX> {
            inner: Arc::new(tokio::sync::Mutex::new(conn)),
        };

        parts.extensions.insert(conn.clone());

        if TX {
            if let Some(slot) = parts.extensions.get::<TxSlot>() {
                *slot
                    .0
                    .try_lock()
                    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)? =
                    Some(ThreadSafeConn::<true> {
                        inner: conn.inner.clone(),
                    });
            }
        }

        Ok(conn)
    }
}

/// Exclusive handle on the request's connection, for use inside a handler.
pub struct Conn<const TX: bool> {
    inner: tokio::sync::OwnedMutexGuard<
        PooledConnection<ConnectionManager<SqliteConnection>>,
    >,
}

impl<const TX: bool> Deref for Conn<TX> {
    type Target = PooledConnection<ConnectionManager<SqliteConnection>>;

    fn deref(&self) -> &Self::Target {
        self.inner.deref()
    }
}

impl<const TX: bool> DerefMut for Conn<TX> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.deref_mut()
    }
}

#[async_trait]
impl<const TX: bool, S> FromRequestParts<S> for Conn<TX>
where
    S: Send + Sync,
    DbPool: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let wrapper =
            ThreadSafeConn::<TX>::from_request_parts(parts, state).await?;

        Ok(Conn {
            inner: wrapper
                .inner
                .try_lock_owned()
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?,
        })
    }
}
