//! Post-scan deduplication.

use std::collections::HashMap;
use std::hash::Hash;

/// Collapse records sharing a key into the one with the latest stamp.
///
/// Keys keep the position of their first occurrence. On equal stamps the
/// later record in scan order wins, which for an ascending scan is also the
/// most recently indexed one.
pub fn dedup_latest<T, K, S>(
    records: Vec<T>,
    key: impl Fn(&T) -> K,
    stamp: impl Fn(&T) -> S,
) -> Vec<T>
where
    K: Eq + Hash,
    S: Ord,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut deduped: Vec<T> = Vec::new();

    for record in records {
        match positions.get(&key(&record)) {
            Some(&position) => {
                if stamp(&record) >= stamp(&deduped[position]) {
                    deduped[position] = record;
                }
            }
            None => {
                positions.insert(key(&record), deduped.len());
                deduped.push(record);
            }
        }
    }

    deduped
}
