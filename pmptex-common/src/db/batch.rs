//! Batched IN-list lookups
//!
//! SQLite (and the stores this tool originally targeted) bound the size of a
//! parameterized IN list, so every id-set lookup runs in fixed-size chunks.

use crate::Result;
use std::future::Future;

/// Keys per IN-list chunk
pub const LOOKUP_CHUNK: usize = 1000;

/// Returns `?,?,?,...` with `n` placeholders, for parameterized IN lists
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

/// Run `fetch` over `items` in chunks of `chunk_size`, concatenating results.
///
/// The chunks are issued strictly in sequence, never concurrently. An empty
/// input returns an empty result without calling `fetch`.
pub async fn batched<T, R, F, Fut>(items: &[T], chunk_size: usize, mut fetch: F) -> Result<Vec<R>>
where
    T: Clone,
    F: FnMut(Vec<T>) -> Fut,
    Fut: Future<Output = Result<Vec<R>>>,
{
    let mut out = Vec::new();
    for chunk in items.chunks(chunk_size.max(1)) {
        out.extend(fetch(chunk.to_vec()).await?);
    }
    Ok(out)
}
