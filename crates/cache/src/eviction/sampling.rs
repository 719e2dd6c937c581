//! Random skip sampling over an unordered map

use super::traits::{Candidate, EvictionPolicy};
use rand::Rng;

/// Number of elements to sample from `population`, capped at `max_sample`
pub fn sample_size(population: usize, max_sample: usize) -> usize {
    population.min(max_sample)
}

/// Random skip distances for walking a population of `population` elements.
///
/// Each skip is below `population / sample`, so the walk always fits inside
/// the population. A sample covering the whole population yields all-zero
/// skips, i.e. a full scan.
pub fn random_offsets<R: Rng + ?Sized>(
    rng: &mut R,
    population: usize,
    max_sample: usize,
) -> Vec<usize> {
    let sample = sample_size(population, max_sample);
    if sample == 0 {
        return Vec::new();
    }

    let max_offset = population / sample;
    (0..sample).map(|_| rng.gen_range(0..max_offset)).collect()
}

/// Walk `iter`, skipping `offsets[i]` elements before taking the i-th sample.
///
/// An iterator that runs dry early, e.g. because entries were removed
/// concurrently, yields a shorter sample.
pub fn sample_by_offsets<I, T, F>(iter: I, offsets: &[usize], mut take: F) -> Vec<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> T,
{
    let mut iter = iter.into_iter();
    let mut sampled = Vec::with_capacity(offsets.len());
    for &skip in offsets {
        match iter.nth(skip) {
            Some(item) => sampled.push(take(item)),
            None => break,
        }
    }
    sampled
}

/// Pick the policy's preferred victim among `sampled`, skipping excluded keys.
pub fn select_victim<'a, K>(
    policy: &dyn EvictionPolicy,
    sampled: &'a [Candidate<K>],
    is_excluded: impl Fn(&K) -> bool,
) -> Option<&'a Candidate<K>> {
    sampled
        .iter()
        .filter(|candidate| !is_excluded(&candidate.key))
        .fold(None, |best: Option<&Candidate<K>>, candidate| match best {
            Some(current) if !policy.compare(&current.stats, &candidate.stats) => Some(current),
            _ => Some(candidate),
        })
}
