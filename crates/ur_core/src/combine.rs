//! Lexicographic combination of completed per-parameter orders.
//!
//! Contract:
//! - Every table is a full permutation of `0..n` in **ascending** priority
//!   (highest-priority element last); tables are ordered most-important first.
//! - The result lists element indices highest-priority first.
//! - Deterministic, integers-only, no RNG.
//!
//! The merge splits the element set at the median of the next-most-important
//! table, recursing on the high half before the low half. When the least
//! significant table is reached with ties remaining, the whole cascade is
//! restarted on just the tied subset with every table projected down — the
//! restart guard is the `-1` sentinel ("start at the most important table").

use alloc::vec::Vec;

/// Merge the completed `tables` into one global ordering of `0..num_elements`.
///
/// Returns an empty ordering when there are no tables to merge.
pub fn merge_ordered(tables: &[Vec<usize>], num_elements: usize) -> Vec<usize> {
    if tables.is_empty() {
        return Vec::new();
    }
    let all: Vec<usize> = (0..num_elements).collect();
    let mut out = Vec::with_capacity(num_elements);
    descend(-1, &all, tables, &mut out);
    out
}

fn descend(param: isize, elements: &[usize], tables: &[Vec<usize>], out: &mut Vec<usize>) {
    let last = tables.len() as isize - 1;
    match elements.len() {
        0 => {}
        1 => out.push(elements[0]),
        _ if param < last => {
            // Split by the next table's median; the tail half is the high half.
            let next = (param + 1) as usize;
            let pivot = tables[next].len() / 2;
            let high: Vec<usize> = tables[next][pivot..]
                .iter()
                .copied()
                .filter(|e| elements.contains(e))
                .collect();
            let low: Vec<usize> = tables[next][..pivot]
                .iter()
                .copied()
                .filter(|e| elements.contains(e))
                .collect();
            descend(next as isize, &high, tables, out);
            descend(next as isize, &low, tables, out);
        }
        _ => {
            // Ties survived every table: project each table onto the tied
            // subset (preserving order) and re-run the cascade on it. The
            // projection of the most important table has length >= 2, so the
            // next split strictly shrinks both sides.
            let restricted: Vec<Vec<usize>> = tables
                .iter()
                .map(|t| t.iter().copied().filter(|e| elements.contains(e)).collect())
                .collect();
            descend(-1, elements, &restricted, out);
        }
    }
}
