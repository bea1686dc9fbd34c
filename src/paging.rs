// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Paged Reconciliation
//!
//! Coordinator list endpoints return `{ entities, count }` pages addressed by
//! `limit`/`skip`. Reconciliation always starts from offset 0, accumulates
//! every page in server order, then imports entities one at a time.
//!
//! A failure while importing leaves the already-imported prefix in place;
//! no resumption point is kept, the next sync simply starts over.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// Page size used by every reconciliation loop.
pub const PAGE_LIMIT: u64 = 10;

/// The server stopped returning entities before the `count` it reported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("empty page at skip {skip} before reaching reported count {count}")]
pub struct IncompletePage {
    pub skip: u64,
    pub count: u64,
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub entities: Vec<T>,
    /// Total number of entities available on the server.
    pub count: u64,
}

impl<T> Page<T> {
    /// Whether the server reports more entities than this page holds.
    pub fn has_more(&self) -> bool {
        self.count > self.entities.len() as u64
    }
}

/// Fetch every page of a list endpoint.
///
/// The first page is requested at `skip = 0`; each following page starts at
/// the number of entities accumulated so far. Fetching stops once the
/// accumulator holds at least the `count` reported by the first page, so a
/// successful result always has `count` entities or more. An empty page
/// before that point fails with [`IncompletePage`].
pub async fn fetch_all<T, E, F, Fut>(limit: u64, mut fetch: F) -> Result<Vec<T>, E>
where
    E: From<IncompletePage>,
    F: FnMut(u64, u64) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut accumulated = fetch(limit, 0).await?;

    while accumulated.has_more() {
        let skip = accumulated.entities.len() as u64;
        let page = fetch(limit, skip).await?;

        if page.entities.is_empty() {
            tracing::warn!(
                skip,
                count = accumulated.count,
                "Server returned an empty page before reaching reported count"
            );
            return Err(IncompletePage {
                skip,
                count: accumulated.count,
            }
            .into());
        }

        tracing::debug!(skip, fetched = page.entities.len(), "Fetched page");
        accumulated.entities.extend(page.entities);
    }

    Ok(accumulated.entities)
}

/// Run `import` for each item in order, awaiting each call before the next.
///
/// Returns the number of items imported. Stops at the first failure.
pub async fn import_each<T, E, F, Fut>(items: Vec<T>, mut import: F) -> Result<usize, E>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let mut imported = 0;
    for item in items {
        import(item).await?;
        imported += 1;
    }
    Ok(imported)
}
