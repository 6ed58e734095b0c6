use std::collections::BTreeMap;
use std::time::Instant;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rbtree_map::TreeMap;

const SEED: [u8; 32] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25,
    26, 27, 28, 29, 30, 31, 32,
];

fn run_tree_map(n: usize) -> (std::time::Duration, usize) {
    let mut rng = StdRng::from_seed(SEED);
    let start = Instant::now();
    let mut map = TreeMap::new();
    for _ in 0..n {
        let key: u32 = rng.gen();
        map.insert(key, key + 1);
    }
    let mut hits = 0usize;
    for _ in 0..n {
        let key: u32 = rng.gen();
        if map.get(&key).is_some() {
            hits += 1;
        }
    }
    let keys: Vec<u32> = map.keys().copied().collect();
    for k in keys {
        map.remove(&k);
    }
    assert!(map.is_empty());
    (start.elapsed(), hits)
}

fn run_std_map(n: usize) -> (std::time::Duration, usize) {
    let mut rng = StdRng::from_seed(SEED);
    let start = Instant::now();
    let mut map = BTreeMap::new();
    for _ in 0..n {
        let key: u32 = rng.gen();
        map.insert(key, key + 1);
    }
    let mut hits = 0usize;
    for _ in 0..n {
        let key: u32 = rng.gen();
        if map.get(&key).is_some() {
            hits += 1;
        }
    }
    let keys: Vec<u32> = map.keys().copied().collect();
    for k in keys {
        map.remove(&k);
    }
    assert!(map.is_empty());
    (start.elapsed(), hits)
}

fn main() {
    env_logger::init();

    let n: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(100_000);

    info!("running insert/get/remove workload, n = {}", n);

    let (ours, our_hits) = run_tree_map(n);
    let (std_time, std_hits) = run_std_map(n);
    // Identical seed, identical workload: lookups must agree.
    assert_eq!(our_hits, std_hits);

    info!("TreeMap:       {:?}", ours);
    info!("std::BTreeMap: {:?}", std_time);

    println!("TreeMap:       {:?}", ours);
    println!("std::BTreeMap: {:?}", std_time);
}
