//! Benchmark utilities.

use rand::Rng;
use ringcache_core::{Cache, CacheConfig, CacheResult};
use ringcache_storage::InMemoryBackend;

/// Generate random payload bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate `count` payloads with sizes drawn from `min..=max`.
pub fn random_payloads(count: usize, min: usize, max: usize) -> Vec<Vec<u8>> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| random_data(rng.gen_range(min..=max)))
        .collect()
}

/// Build an in-memory cache filled with `payloads`.
pub fn filled_memory_cache(
    maximum_bytes: u64,
    payloads: &[Vec<u8>],
) -> CacheResult<Cache<InMemoryBackend>> {
    let mut cache = Cache::with_backend(InMemoryBackend::new(), CacheConfig::new(maximum_bytes))?;
    for payload in payloads {
        cache.append(payload)?;
    }
    Ok(cache)
}
