//! Candidate selection among listed assets.

use rand::Rng;

use crate::cache::DedupCache;

use super::types::{Asset, AssetTag};

/// Assets carrying `tag` whose name is not yet in the cache, in listing order.
pub async fn eligible_assets(
    assets: &[Asset],
    tag: AssetTag,
    cache: &dyn DedupCache,
) -> Vec<Asset> {
    let mut pool = Vec::new();
    for asset in assets.iter().filter(|a| a.tag == tag) {
        if cache.get(&asset.name).await.is_none() {
            pool.push(asset.clone());
        }
    }
    pool
}

/// Pick one asset uniformly at random. `None` when the pool is empty.
pub fn pick_uniform<'a, R: Rng + ?Sized>(pool: &'a [Asset], rng: &mut R) -> Option<&'a Asset> {
    if pool.is_empty() {
        return None;
    }
    pool.get(rng.random_range(0..pool.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn asset(name: &str) -> Asset {
        Asset::new(format!("id-{}", name), name, None, "paid_")
    }

    #[tokio::test]
    async fn test_pool_excludes_cached_and_other_tag() {
        let cache = InMemoryCache::new();
        cache.set("b.mp4", "Downloaded on 2024-01-01").await;

        let assets = vec![
            asset("a.mp4"),
            asset("b.mp4"),
            asset("paid_5_c.mp4"),
            asset("d.mp4"),
        ];

        let free = eligible_assets(&assets, AssetTag::Free, &cache).await;
        let names: Vec<_> = free.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a.mp4", "d.mp4"]);

        let paid = eligible_assets(&assets, AssetTag::Paid, &cache).await;
        assert_eq!(paid.len(), 1);
    }

    #[test]
    fn test_pick_from_empty_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(pick_uniform(&[], &mut rng).is_none());
    }

    #[test]
    fn test_pick_is_roughly_uniform() {
        let pool = vec![asset("a.mp4"), asset("b.mp4"), asset("c.mp4")];
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts: HashMap<String, u32> = HashMap::new();

        for _ in 0..3000 {
            let picked = pick_uniform(&pool, &mut rng).unwrap();
            *counts.entry(picked.name.clone()).or_default() += 1;
        }

        assert_eq!(counts.len(), 3);
        for count in counts.values() {
            assert!((800..1200).contains(count), "skewed count {}", count);
        }
    }
}
