use fibre_expiry::{BoundedExpiryCache, ExpiryCacheBuilder, ExpiryCell, KeyedExpiryCache, Lookup};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc, Barrier,
};
use std::thread;
use std::time::{Duration, Instant};

const NUM_THREADS: usize = 20;

#[test]
fn test_sync_cell_thundering_herd() {
  let cell = Arc::new(ExpiryCell::new(Duration::from_secs(60)));
  let compute_count = Arc::new(AtomicUsize::new(0));
  let barrier = Arc::new(Barrier::new(NUM_THREADS));
  let mut handles = vec![];

  for _ in 0..NUM_THREADS {
    let cell = cell.clone();
    let compute_count = compute_count.clone();
    let barrier = barrier.clone();
    handles.push(thread::spawn(move || {
      barrier.wait();
      cell
        .get_or_update(|| {
          // Simulate a slow remote fetch.
          thread::sleep(Duration::from_millis(100));
          compute_count.fetch_add(1, Ordering::SeqCst);
          Ok::<_, ()>(990u32)
        })
        .unwrap()
    }));
  }

  let results: Vec<Lookup<u32>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

  assert_eq!(
    compute_count.load(Ordering::SeqCst),
    1,
    "Thundering herd protection failed: compute ran more than once"
  );
  assert!(results.iter().all(|lookup| **lookup.value() == 990));
  assert_eq!(
    results.iter().filter(|lookup| !lookup.is_cached()).count(),
    1,
    "Exactly one caller should report a fresh computation"
  );
}

#[test]
fn test_sync_cell_failure_reaches_only_the_leader() {
  let cell = Arc::new(ExpiryCell::new(Duration::from_secs(60)));
  let compute_count = Arc::new(AtomicUsize::new(0));
  let barrier = Arc::new(Barrier::new(NUM_THREADS));
  let mut handles = vec![];

  for _ in 0..NUM_THREADS {
    let cell = cell.clone();
    let compute_count = compute_count.clone();
    let barrier = barrier.clone();
    handles.push(thread::spawn(move || {
      barrier.wait();
      cell.get_or_update(|| {
        thread::sleep(Duration::from_millis(50));
        match compute_count.fetch_add(1, Ordering::SeqCst) {
          0 => Err("backend unavailable"),
          _ => Ok(7u32),
        }
      })
    }));
  }

  let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

  let failures: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
  assert_eq!(failures, vec![&"backend unavailable"]);
  assert!(results
    .iter()
    .filter_map(|r| r.as_ref().ok())
    .all(|lookup| **lookup.value() == 7));
  // One failed attempt, then a single successful retry served everyone else.
  assert_eq!(compute_count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_sync_keyed_thundering_herd_per_key() {
  let cache = Arc::new(KeyedExpiryCache::new(Duration::from_secs(60)));
  let compute_count = Arc::new(AtomicUsize::new(0));
  let barrier = Arc::new(Barrier::new(NUM_THREADS));
  let mut handles = vec![];

  for i in 0..NUM_THREADS {
    let cache = cache.clone();
    let compute_count = compute_count.clone();
    let barrier = barrier.clone();
    handles.push(thread::spawn(move || {
      let key = format!("node-{}", i % 4);
      barrier.wait();
      let expected = key.len();
      let lookup = cache
        .get_or_update(key.clone(), || {
          thread::sleep(Duration::from_millis(50));
          compute_count.fetch_add(1, Ordering::SeqCst);
          Ok::<_, ()>(key.len())
        })
        .unwrap();
      assert_eq!(**lookup.value(), expected);
    }));
  }

  for handle in handles {
    handle.join().unwrap();
  }

  assert_eq!(cache.len(), 4);
  assert_eq!(
    compute_count.load(Ordering::SeqCst),
    4,
    "Each key should be computed exactly once"
  );
}

#[test]
fn test_sync_cell_thundering_herd_on_expired_value() {
  let cell = Arc::new(ExpiryCell::new(Duration::from_millis(10)));
  let t0 = Instant::now();
  cell.get_or_update_at(t0, || Ok::<_, ()>(1u32)).unwrap();

  let refresh_at = t0 + Duration::from_secs(1);
  assert!(cell.get_at(refresh_at).is_none(), "value should be stale at refresh time");

  let compute_count = Arc::new(AtomicUsize::new(0));
  let barrier = Arc::new(Barrier::new(NUM_THREADS));
  let mut handles = vec![];

  for _ in 0..NUM_THREADS {
    let cell = cell.clone();
    let compute_count = compute_count.clone();
    let barrier = barrier.clone();
    handles.push(thread::spawn(move || {
      barrier.wait();
      cell
        .get_or_update_at(refresh_at, || {
          thread::sleep(Duration::from_millis(100));
          compute_count.fetch_add(1, Ordering::SeqCst);
          Ok::<_, ()>(2u32)
        })
        .unwrap()
    }));
  }

  let results: Vec<Lookup<u32>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

  assert_eq!(
    compute_count.load(Ordering::SeqCst),
    1,
    "Refreshing an expired value should run compute once"
  );
  assert!(results.iter().all(|lookup| **lookup.value() == 2));
  assert_eq!(results.iter().filter(|lookup| !lookup.is_cached()).count(), 1);
}

#[test]
fn test_sync_bounded_thundering_herd_same_key() {
  let cache: Arc<BoundedExpiryCache<&str, u32>> = Arc::new(
    ExpiryCacheBuilder::new()
      .time_to_live(Duration::from_secs(60))
      .capacity(4)
      .build_bounded()
      .unwrap(),
  );
  let compute_count = Arc::new(AtomicUsize::new(0));
  let barrier = Arc::new(Barrier::new(NUM_THREADS));
  let mut handles = vec![];

  for _ in 0..NUM_THREADS {
    let cache = cache.clone();
    let compute_count = compute_count.clone();
    let barrier = barrier.clone();
    handles.push(thread::spawn(move || {
      barrier.wait();
      let lookup = cache
        .get_or_update("shared", || {
          thread::sleep(Duration::from_millis(100));
          compute_count.fetch_add(1, Ordering::SeqCst);
          Ok::<_, ()>(11u32)
        })
        .unwrap();
      assert_eq!(**lookup.value(), 11);
    }));
  }

  for handle in handles {
    handle.join().unwrap();
  }

  assert_eq!(
    compute_count.load(Ordering::SeqCst),
    1,
    "Concurrent callers on one key must share a single cell"
  );
  assert_eq!(cache.len(), 1);
}

#[test]
fn test_sync_bounded_capacity_holds_under_contention() {
  const CAPACITY: usize = 8;
  const KEYS_PER_THREAD: u64 = 500;
  let num_threads = 8;

  let cache: Arc<BoundedExpiryCache<u64, u64>> = Arc::new(
    ExpiryCacheBuilder::new()
      .time_to_live(Duration::from_secs(60))
      .capacity(CAPACITY)
      .build_bounded()
      .unwrap(),
  );
  let barrier = Arc::new(Barrier::new(num_threads));
  let mut handles = vec![];

  for t in 0..num_threads as u64 {
    let cache = cache.clone();
    let barrier = barrier.clone();
    handles.push(thread::spawn(move || {
      barrier.wait();
      for i in 0..KEYS_PER_THREAD {
        let key = t * KEYS_PER_THREAD + i;
        cache.get_or_update(key, || Ok::<_, ()>(key)).unwrap();
        if i % 3 == 0 {
          cache.invalidate(&(key / 2));
        }
        assert!(cache.len() <= cache.capacity());
      }
    }));
  }

  for handle in handles {
    handle.join().unwrap();
  }

  assert!(cache.len() <= CAPACITY);
  assert_eq!(cache.capacity(), CAPACITY);
}
