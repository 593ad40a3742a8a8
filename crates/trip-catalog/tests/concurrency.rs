//! Many independent handles hammering one catalog, the way separate
//! processes would.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use trip_catalog::{Catalog, CatalogKey, NamedSemaphore};
use trip_core::TripOffer;

static NEXT: AtomicUsize = AtomicUsize::new(0);

fn unique_key() -> CatalogKey {
    let n = NEXT.fetch_add(1, Ordering::Relaxed);
    CatalogKey::new(format!("tx{}-{}", std::process::id(), n)).unwrap()
}

const WRITERS: usize = 4;
const READERS: usize = 4;
const PER_WRITER: usize = 16;

#[test]
fn concurrent_appends_and_reads_never_tear() {
    let key = unique_key();
    let owner = Catalog::create(&key, WRITERS * PER_WRITER).unwrap();
    let barrier = Arc::new(Barrier::new(WRITERS + READERS));
    let done = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = (0..WRITERS)
        .map(|w| {
            let key = key.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let catalog = Catalog::attach(&key).unwrap();
                barrier.wait();
                let mut slots = Vec::new();
                for i in 0..PER_WRITER {
                    // Price encodes the name so readers can spot torn slots.
                    let n = w * PER_WRITER + i + 1;
                    let offer = TripOffer::new(format!("Trip{}", n), n as f64).unwrap();
                    slots.push(catalog.append(&offer).unwrap());
                }
                slots
            })
        })
        .collect();

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let key = key.clone();
            let barrier = Arc::clone(&barrier);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let catalog = Catalog::attach(&key).unwrap();
                barrier.wait();
                let mut last_count = 0;
                while !done.load(Ordering::Acquire) {
                    let offers = catalog.snapshot().unwrap();
                    assert!(offers.len() >= last_count, "count went backwards");
                    assert!(offers.len() <= catalog.capacity());
                    for (slot, offer) in &offers {
                        assert!(*slot >= 1 && *slot <= offers.len());
                        assert_eq!(offer.name, format!("Trip{}", offer.price as usize));
                    }
                    last_count = offers.len();
                }
            })
        })
        .collect();

    let mut slots: Vec<usize> = writers
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    done.store(true, Ordering::Release);
    for reader in readers {
        reader.join().unwrap();
    }

    slots.sort_unstable();
    assert_eq!(slots, (1..=WRITERS * PER_WRITER).collect::<Vec<_>>());
    assert_eq!(owner.count().unwrap(), WRITERS * PER_WRITER);
    owner.destroy().unwrap();
}

#[test]
fn racing_appends_past_capacity_stop_exactly_at_capacity() {
    let key = unique_key();
    let owner = Catalog::create(&key, 5).unwrap();
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let key = key.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let catalog = Catalog::attach(&key).unwrap();
                barrier.wait();
                let offer = TripOffer::new(format!("Trip{}", t + 1), (t + 1) as f64).unwrap();
                catalog.append(&offer).is_ok()
            })
        })
        .collect();

    let accepted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(accepted, 5);
    assert_eq!(owner.count().unwrap(), 5);
    owner.destroy().unwrap();
}

#[test]
fn semaphore_admits_one_holder_at_a_time() {
    let name = format!("/tx{}-sem", std::process::id());
    let _ = NamedSemaphore::remove(&name);
    let owner = NamedSemaphore::create(&name).unwrap();
    let inside = Arc::new(AtomicUsize::new(0));
    let entered = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let name = name.clone();
            let inside = Arc::clone(&inside);
            let entered = Arc::clone(&entered);
            thread::spawn(move || {
                let sem = NamedSemaphore::open(&name).unwrap();
                for _ in 0..50 {
                    let guard = sem.lock().unwrap();
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    thread::yield_now();
                    inside.fetch_sub(1, Ordering::SeqCst);
                    entered.fetch_add(1, Ordering::Relaxed);
                    guard.unlock().unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(entered.load(Ordering::Relaxed), 400);
    owner.destroy().unwrap();
}
