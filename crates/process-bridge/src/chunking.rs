//! Adaptive chunk planning.
//!
//! Starting from the full dimension sizes, the planner cycles through the
//! dimensions in declared order and halves one chunk size per step until
//! the number of elements in a chunk is below the budget. The result is
//! deterministic for a given dimension order.

use indexmap::IndexMap;

/// Default element budget per chunk.
pub const DEFAULT_MAX_CHUNK_ELEMENTS: usize = 1_000_000;

/// Chunk sizes per dimension such that their product is below `budget`,
/// or every chunk size is 1.
///
/// A budget of 0 is treated as 1.
pub fn plan_chunks(sizes: &IndexMap<String, usize>, budget: usize) -> IndexMap<String, usize> {
    let budget = budget.max(1);
    let mut chunks: IndexMap<String, usize> = sizes
        .iter()
        .map(|(dim, &len)| (dim.clone(), len.max(1)))
        .collect();

    if chunks.is_empty() {
        return chunks;
    }

    let dims: Vec<String> = chunks.keys().cloned().collect();
    for dim in dims.iter().cycle() {
        if element_count(&chunks) < budget || chunks.values().all(|&c| c == 1) {
            break;
        }
        if let Some(size) = chunks.get_mut(dim) {
            *size = (*size / 2).max(1);
        }
    }

    chunks
}

fn element_count(chunks: &IndexMap<String, usize>) -> usize {
    chunks.values().fold(1usize, |acc, &c| acc.saturating_mul(c))
}
