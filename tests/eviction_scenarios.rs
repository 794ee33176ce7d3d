//! End-to-end eviction and swap scenarios against a real file-backed
//! swap space.

use std::sync::Arc;
use tempfile::TempDir;
use tileswap::{
    CacheConfig, CacheEventKind, FileSwapSpace, OwnerId, Priority, PriorityComparator,
    RecordingListener, SampleType, Samples, TileAddress, TileCache, TileLayout, TilePayload,
};

fn address(x: i32) -> TileAddress {
    TileAddress::new(OwnerId::from_raw(0xbeef), x, 0)
}

fn payload_f32(values: &[f32]) -> TilePayload {
    TilePayload::new(
        TileLayout {
            sample_type: SampleType::F32,
            width: values.len() as u32,
            height: 1,
            bands: 1,
            origin_x: 0,
            origin_y: 0,
            writable: false,
        },
        Samples::F32(values.to_vec()),
        0,
    )
    .unwrap()
}

/// 300-byte payload whose samples are derived from `seed`, so restored
/// content can be checked byte for byte.
fn payload_seeded(seed: i32) -> TilePayload {
    let values: Vec<f32> = (0..75).map(|i| (seed * 1000 + i) as f32).collect();
    payload_f32(&values)
}

fn file_swap_cache(capacity: u64, threshold: f64) -> (TileCache, TempDir) {
    let dir = TempDir::new().unwrap();
    let swap = Arc::new(FileSwapSpace::new(dir.path()).unwrap());
    let cache = TileCache::new(
        CacheConfig::new(capacity).with_threshold(threshold),
        swap,
    )
    .unwrap();
    (cache, dir)
}

fn cost_comparator() -> PriorityComparator {
    Arc::new(|a: Option<&Priority>, b: Option<&Priority>| {
        let cost = |p: Option<&Priority>| {
            p.and_then(|p| p.downcast_ref::<f64>())
                .copied()
                .unwrap_or(f64::MAX)
        };
        cost(a)
            .partial_cmp(&cost(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

#[test]
fn recency_eviction_swaps_out_and_restores_byte_exact() {
    let (cache, _dir) = file_swap_cache(1000, 0.5);

    // Four 300-byte tiles against a 1000-byte capacity: the fourth add
    // overflows and evicts the least recent tiles to disk.
    for seed in 1..=4 {
        assert!(cache.add(address(seed), payload_seeded(seed)));
    }
    assert!(cache.usage() <= 500);
    assert!(!cache.contains(&address(1)));
    assert!(!cache.contains(&address(2)));

    // The evicted tiles come back from swap with identical content.
    let restored = cache.get(&address(1)).expect("tile 1 restorable from swap");
    assert_eq!(restored, payload_seeded(1));
    let restored = cache.get(&address(2)).expect("tile 2 restorable from swap");
    assert_eq!(restored, payload_seeded(2));

    let stats = cache.stats();
    assert_eq!(stats.swap_restores, 2);
    assert!(stats.swap_stores >= 3);
    assert_eq!(stats.swap_store_failures, 0);
}

#[test]
fn priority_eviction_swaps_cheapest_tiles_first() {
    let (cache, _dir) = file_swap_cache(1000, 0.5);
    let listener = RecordingListener::new();
    cache.add_listener(listener.clone());
    cache.enable_diagnostics();
    cache.set_priority_comparator(cost_comparator());

    // Costs 5, 1, 9, 3 on tiles 1..4. Eviction runs in ascending cost
    // order until usage drops to 500: cost 1, then 3, then 5.
    let costs = [5.0f64, 1.0, 9.0, 3.0];
    for (i, cost) in costs.iter().enumerate() {
        cache.add_with_priority(
            address(i as i32 + 1),
            payload_seeded(i as i32 + 1),
            Some(Arc::new(*cost) as Priority),
        );
    }

    let evicted = listener.addresses_of(CacheEventKind::RemovedByEviction);
    assert_eq!(evicted, vec![address(2), address(4), address(1)]);
    assert!(cache.contains(&address(3)), "highest-cost tile survives");

    // Priority-evicted tiles are swapped, not lost, and carry their
    // metric back with them.
    assert!(cache.get(&address(2)).is_some());
}

#[test]
fn restored_priority_metric_participates_in_later_eviction() {
    let (cache, _dir) = file_swap_cache(1000, 0.5);
    cache.set_priority_comparator(cost_comparator());

    // Evict tile 1 (cost 1.0) to swap.
    cache.add_with_priority(address(1), payload_seeded(1), Some(Arc::new(1.0f64) as Priority));
    cache.add_with_priority(address(2), payload_seeded(2), Some(Arc::new(8.0f64) as Priority));
    cache.add_with_priority(address(3), payload_seeded(3), Some(Arc::new(8.0f64) as Priority));
    cache.add_with_priority(address(4), payload_seeded(4), Some(Arc::new(8.0f64) as Priority));
    assert!(!cache.contains(&address(1)));

    // Restore it, then overflow again: its persisted cost 1.0 should make
    // it the first eviction candidate once more.
    assert!(cache.get(&address(1)).is_some());
    let listener = RecordingListener::new();
    cache.add_listener(listener.clone());
    cache.enable_diagnostics();

    cache.add_with_priority(address(5), payload_seeded(5), Some(Arc::new(8.0f64) as Priority));
    cache.add_with_priority(address(6), payload_seeded(6), Some(Arc::new(8.0f64) as Priority));

    let evicted = listener.addresses_of(CacheEventKind::RemovedByEviction);
    assert_eq!(evicted.first(), Some(&address(1)));
}

#[test]
fn usage_equals_sum_of_resident_sizes_through_churn() {
    let (cache, _dir) = file_swap_cache(2000, 0.75);

    cache.add(address(1), payload_seeded(1));
    cache.add(address(2), payload_seeded(2));
    assert_eq!(cache.usage(), 600);

    cache.remove(&address(1));
    assert_eq!(cache.usage(), 300);

    for seed in 3..=9 {
        cache.add(address(seed), payload_seeded(seed));
    }
    // Whatever was evicted, accounting must match the resident set.
    assert_eq!(cache.usage(), cache.entry_count() as u64 * 300);
    assert!(cache.usage() <= 2000);
}

#[test]
fn usage_never_exceeds_target_after_any_operation() {
    let (cache, _dir) = file_swap_cache(1500, 0.6);

    for seed in 1..=10 {
        cache.add(address(seed), payload_seeded(seed));
        assert!(cache.usage() <= 1500, "usage within capacity after add");
    }
    // After the last eviction pass usage sits at or below the target.
    assert!(cache.usage() <= 900);

    cache.set_capacity(700);
    assert!(cache.usage() <= (700.0 * 0.6) as u64);
}

#[test]
fn immediate_round_trip_returns_identical_payload() {
    let (cache, _dir) = file_swap_cache(100_000, 0.75);
    let payload = payload_f32(&[1.5, -2.5, f32::MIN, f32::MAX]);

    cache.add(address(1), payload.clone());
    assert_eq!(cache.get(&address(1)), Some(payload));
    assert_eq!(cache.hit_count(), 1);
    assert_eq!(cache.miss_count(), 0);
}

#[test]
fn remove_deletes_swap_record_too() {
    let (cache, _dir) = file_swap_cache(1000, 0.5);

    // Force tile 1 out to swap.
    for seed in 1..=4 {
        cache.add(address(seed), payload_seeded(seed));
    }
    assert!(!cache.contains(&address(1)));

    // Removing it must reach through to the swap record, otherwise this
    // get would resurrect the tile.
    cache.remove(&address(1));
    assert!(cache.get(&address(1)).is_none());
    assert_eq!(cache.miss_count(), 1);
}

#[test]
fn flush_clears_memory_but_not_swap() {
    let (cache, _dir) = file_swap_cache(1000, 0.5);

    for seed in 1..=4 {
        cache.add(address(seed), payload_seeded(seed));
    }
    cache.flush();

    assert_eq!(cache.usage(), 0);
    assert_eq!(cache.entry_count(), 0);
    assert_eq!(cache.hit_count(), 0);
    assert_eq!(cache.miss_count(), 0);

    // Tiles evicted to swap before the flush are still restorable.
    assert_eq!(cache.get(&address(1)), Some(payload_seeded(1)));
    // Tiles that were only resident are gone.
    assert!(cache.get(&address(4)).is_none());
}

#[test]
fn swap_files_use_deterministic_names() {
    let dir = TempDir::new().unwrap();
    let swap = Arc::new(FileSwapSpace::new(dir.path()).unwrap());
    let cache = TileCache::new(CacheConfig::new(1000).with_threshold(0.5), swap).unwrap();

    for seed in 1..=4 {
        cache.add(
            TileAddress::new(OwnerId::from_raw(1), seed, 7),
            payload_seeded(seed),
        );
    }

    // Tile (1, 7) of owner 1 was evicted and must be on disk under its
    // canonical name.
    let expected = dir.path().join("t0000000000000001_1_7.swp");
    assert!(expected.exists(), "missing swap file {}", expected.display());
}

#[test]
fn get_all_mixes_memory_hits_swap_restores_and_misses() {
    let (cache, _dir) = file_swap_cache(1000, 0.5);

    for seed in 1..=4 {
        cache.add(address(seed), payload_seeded(seed));
    }
    // 1 through 3 are on disk, 4 is resident, 99 never existed.
    let results = cache.get_all(&[address(1), address(3), address(99)]);

    assert_eq!(results[0], Some(payload_seeded(1)));
    assert_eq!(results[1], Some(payload_seeded(3)));
    assert_eq!(results[2], None);
    assert_eq!(cache.miss_count(), 1);
}

#[test]
fn all_sample_types_survive_the_swap_round_trip() {
    let (cache, _dir) = file_swap_cache(800, 0.5);
    let owner = OwnerId::from_raw(0xcafe);
    let layout = |sample_type| TileLayout {
        sample_type,
        width: 8,
        height: 4,
        bands: 1,
        origin_x: -16,
        origin_y: 32,
        writable: false,
    };

    let payloads = vec![
        TilePayload::new(layout(SampleType::U8), Samples::U8((0u8..32).collect()), 0).unwrap(),
        TilePayload::new(
            layout(SampleType::I16),
            Samples::I16((0i16..32).map(|i| i - 16).collect()),
            0,
        )
        .unwrap(),
        TilePayload::new(
            layout(SampleType::I32),
            Samples::I32((0..32).map(|i| i * -1000).collect()),
            0,
        )
        .unwrap(),
        TilePayload::new(
            layout(SampleType::I64),
            Samples::I64((0..32).map(|i| i as i64 * i64::from(i32::MAX)).collect()),
            0,
        )
        .unwrap(),
        TilePayload::new(
            layout(SampleType::F32),
            Samples::F32((0..32).map(|i| i as f32 / 3.0).collect()),
            0,
        )
        .unwrap(),
        TilePayload::new(
            layout(SampleType::F64),
            Samples::F64((0..32).map(|i| i as f64 * 1e100).collect()),
            0,
        )
        .unwrap(),
    ];

    // Small capacity forces every earlier tile out to disk as the next
    // ones arrive; each must come back identical.
    for (i, payload) in payloads.iter().enumerate() {
        cache.add(TileAddress::new(owner, i as i32, 0), payload.clone());
    }
    for (i, payload) in payloads.iter().enumerate() {
        let restored = cache.get(&TileAddress::new(owner, i as i32, 0));
        assert_eq!(restored.as_ref(), Some(payload), "sample type index {i}");
    }
}

#[test]
fn clearing_comparator_restores_recency_order() {
    let (cache, _dir) = file_swap_cache(1000, 0.6);
    cache.set_priority_comparator(cost_comparator());
    cache.clear_priority_comparator();

    let listener = RecordingListener::new();
    cache.add_listener(listener.clone());
    cache.enable_diagnostics();

    for seed in 1..=4 {
        cache.add_with_priority(
            address(seed),
            payload_seeded(seed),
            // Costs descend, so priority order would evict tile 4 first.
            Some(Arc::new(10.0 - seed as f64) as Priority),
        );
    }

    let evicted = listener.addresses_of(CacheEventKind::RemovedByEviction);
    assert_eq!(evicted, vec![address(1), address(2)]);
}
