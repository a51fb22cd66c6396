// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tracking of the node's current head.
//!
//! A resolved head hash is trusted for `refresh_interval`. After that, the
//! first caller opens a debounce window; every caller arriving before the
//! refresh settles joins the same upstream request. The window is not
//! extended by later arrivals.
//!
//! A failed refresh is handed to every caller that joined it and leaves the
//! previous head in place, still stale, so the next call retries at once.

use futures::FutureExt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn, Instrument};

use crate::cache::{drive, mutex_lock, SharedResult};
use crate::client::NodeRpc;
use crate::errors::RpcError;
use crate::spans;
use crate::types::block::{BlockId, BlockRef};

const SOURCE: &str = "proxy::head";

/// Last observed head hash and when it was observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadState {
    pub hash: BlockId,
    pub refreshed_at: Instant,
}

/// Freshness of the tracked head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadStatus {
    /// No head has been observed yet
    Unknown,
    /// Younger than the refresh interval; served without a request
    Fresh,
    /// Old enough that the next head read refreshes it
    Stale,
}

struct PendingRefresh {
    generation: u64,
    future: SharedResult<BlockId, RpcError>,
}

#[derive(Default)]
struct HeadInner {
    head: Option<HeadState>,
    pending: Option<PendingRefresh>,
    next_generation: u64,
}

/// Resolves "current state" references to a concrete block hash.
pub struct HeadResolver<C> {
    client: Arc<C>,
    refresh_interval: Duration,
    debounce: Duration,
    inner: Arc<Mutex<HeadInner>>,
}

impl<C> std::fmt::Debug for HeadResolver<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadResolver")
            .field("refresh_interval", &self.refresh_interval)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl<C: NodeRpc> HeadResolver<C> {
    pub fn new(client: Arc<C>, refresh_interval: Duration, debounce: Duration) -> Self {
        Self {
            client,
            refresh_interval,
            debounce,
            inner: Arc::new(Mutex::new(HeadInner::default())),
        }
    }

    /// Return `block` unchanged when it is pinned, otherwise the current head.
    pub async fn resolve(&self, block: &BlockRef) -> Result<BlockId, RpcError> {
        match block.pinned() {
            Some(id) => Ok(id.clone()),
            None => self.current().await,
        }
    }

    /// The current head hash, refreshed when unknown or stale.
    pub async fn current(&self) -> Result<BlockId, RpcError> {
        let refresh = {
            let mut inner = mutex_lock(&self.inner, SOURCE, "current");

            if let Some(head) = &inner.head {
                if head.refreshed_at.elapsed() < self.refresh_interval {
                    return Ok(head.hash.clone());
                }
            }

            let pending = inner
                .pending
                .as_ref()
                .map(|pending| (pending.generation, pending.future.clone()));

            match pending {
                Some((generation, future)) => {
                    debug!(generation, "Joining pending head refresh");
                    future
                }
                None => {
                    let refresh = self.start_refresh(&mut inner);
                    drop(inner);
                    drive(&refresh);
                    refresh
                }
            }
        };

        refresh.await
    }

    /// Freshness of the tracked head right now.
    pub fn status(&self) -> HeadStatus {
        let inner = mutex_lock(&self.inner, SOURCE, "status");
        match &inner.head {
            None => HeadStatus::Unknown,
            Some(head) if head.refreshed_at.elapsed() < self.refresh_interval => HeadStatus::Fresh,
            Some(_) => HeadStatus::Stale,
        }
    }

    /// Last observed head, whatever its age.
    pub fn state(&self) -> Option<HeadState> {
        mutex_lock(&self.inner, SOURCE, "state").head.clone()
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    fn start_refresh(&self, inner: &mut HeadInner) -> SharedResult<BlockId, RpcError> {
        let generation = inner.next_generation;
        inner.next_generation += 1;

        let client = Arc::clone(&self.client);
        let state = Arc::downgrade(&self.inner);
        let debounce = self.debounce;
        let span = spans::head_refresh(client.endpoint(), generation);

        let future = async move {
            tokio::time::sleep(debounce).await;
            let result = client.block_hash(&BlockRef::Head).await;
            settle(&state, generation, &result);
            result
        }
        .instrument(span)
        .boxed()
        .shared();

        debug!(generation, "Starting head refresh");
        inner.pending = Some(PendingRefresh {
            generation,
            future: future.clone(),
        });
        future
    }
}

fn settle(state: &Weak<Mutex<HeadInner>>, generation: u64, result: &Result<BlockId, RpcError>) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut inner = mutex_lock(&state, SOURCE, "settle");

    if inner
        .pending
        .as_ref()
        .is_some_and(|pending| pending.generation == generation)
    {
        inner.pending = None;
    }

    match result {
        Ok(hash) => {
            debug!(hash = %hash, generation, "Head refreshed");
            inner.head = Some(HeadState {
                hash: hash.clone(),
                refreshed_at: Instant::now(),
            });
        }
        Err(err) => {
            warn!(error = %err, generation, "Head refresh failed, keeping previous head");
        }
    }
}
