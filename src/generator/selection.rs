use super::GeneratedExample;
use super::rng::RandomSource;
use ahash::AHashMap;
use itertools::Itertools;
use tracing::debug;

struct Group {
    descriptor: String,
    /// Unique value sets, smallest magnitude first.
    pool: Vec<GeneratedExample>,
}

impl Group {
    /// Picks uniformly from the smaller half of the remaining pool.
    fn take_readable(&mut self, rng: &mut dyn RandomSource) -> Option<GeneratedExample> {
        if self.pool.is_empty() {
            return None;
        }
        let half = self.pool.len().div_ceil(2);
        Some(self.pool.remove(rng.pick_index(half)))
    }

    /// Takes the next larger-number variant: the smallest of the larger half.
    fn take_larger(&mut self) -> Option<GeneratedExample> {
        if self.pool.is_empty() {
            return None;
        }
        let index = self.pool.len() / 2;
        Some(self.pool.remove(index))
    }
}

/// Picks one example per route descriptor, simplest routes first, padding with
/// larger-number variants from already-used groups when `count` exceeds the
/// number of groups.
///
/// Works on the whole raw pool at once: the pick-one-per-group step does not
/// distribute over partial results.
pub fn select_diverse(
    examples: Vec<GeneratedExample>,
    count: usize,
    rng: &mut dyn RandomSource,
) -> Vec<GeneratedExample> {
    if count == 0 || examples.is_empty() {
        return Vec::new();
    }

    let mut index: AHashMap<String, usize> = AHashMap::new();
    let mut buckets: Vec<(String, Vec<GeneratedExample>)> = Vec::new();
    for example in examples {
        let slot = *index.entry(example.path_descriptor.clone()).or_insert_with(|| {
            buckets.push((example.path_descriptor.clone(), Vec::new()));
            buckets.len() - 1
        });
        buckets[slot].1.push(example);
    }

    let mut groups: Vec<Group> = buckets
        .into_iter()
        .map(|(descriptor, members)| {
            let mut pool: Vec<GeneratedExample> = members
                .into_iter()
                .unique_by(|e| e.values.clone())
                .collect();
            pool.sort_by(|a, b| a.magnitude().total_cmp(&b.magnitude()));
            Group { descriptor, pool }
        })
        .collect();
    groups.sort_by_key(|g| g.pool.iter().map(|e| e.complexity).min());

    let mut selected: Vec<GeneratedExample> = groups
        .iter_mut()
        .take(count)
        .filter_map(|g| g.take_readable(&mut *rng))
        .collect();

    while selected.len() < count {
        let before = selected.len();
        for group in groups.iter_mut() {
            if selected.len() >= count {
                break;
            }
            if let Some(example) = group.take_larger() {
                selected.push(example);
            }
        }
        if selected.len() == before {
            break;
        }
    }

    debug!(
        groups = groups.len(),
        groups_used = %groups.iter().map(|g| g.descriptor.as_str()).take(count).join(", "),
        selected = selected.len(),
        "diversity selection"
    );
    selected
}
