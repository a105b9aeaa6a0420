use blockq::ConcurrentRingBuffer;
use std::sync::Mutex as StdMutex;
use std::thread;

#[test]
fn spsc_sequence_arrives_in_order() {
    const COUNT: u64 = 200_000;
    let ring = ConcurrentRingBuffer::new(4096).unwrap();

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..COUNT {
                ring.put(i);
            }
        });

        let mut expected = 0;
        while expected < COUNT {
            assert_eq!(ring.get(), expected, "gap or reordering in the stream");
            expected += 1;
        }
    });

    assert!(ring.is_empty());
}

#[test]
fn mpmc_conserves_every_value() {
    const PRODUCERS: u64 = 4;
    const CONSUMERS: u64 = 4;
    const PER_PRODUCER: u64 = 10_000;
    let total = PRODUCERS * PER_PRODUCER;

    let ring = ConcurrentRingBuffer::new(64).unwrap();
    let received = StdMutex::new(Vec::with_capacity(total as usize));

    thread::scope(|s| {
        for p in 0..PRODUCERS {
            let ring = &ring;
            s.spawn(move || {
                for i in 0..PER_PRODUCER {
                    ring.put(p * PER_PRODUCER + i);
                }
            });
        }
        for _ in 0..CONSUMERS {
            let ring = &ring;
            let received = &received;
            s.spawn(move || {
                let local: Vec<_> = (0..total / CONSUMERS).map(|_| ring.get()).collect();
                received.lock().unwrap().extend(local);
            });
        }
    });

    let mut received = received.into_inner().unwrap();
    received.sort_unstable();
    assert_eq!(received, (0..total).collect::<Vec<_>>());
    assert_eq!(ring.len(), 0);
}

#[test]
fn consumers_see_each_producer_in_order() {
    const PER_PRODUCER: u32 = 20_000;
    let ring = ConcurrentRingBuffer::new(16).unwrap();

    thread::scope(|s| {
        for p in 0..3_u32 {
            let ring = &ring;
            s.spawn(move || {
                for i in 0..PER_PRODUCER {
                    ring.put((p, i));
                }
            });
        }

        let mut next = [0_u32; 3];
        for _ in 0..3 * PER_PRODUCER {
            let (p, i) = ring.get();
            assert_eq!(i, next[p as usize]);
            next[p as usize] += 1;
        }
    });
}

#[test]
fn owned_values_survive_slot_reuse() {
    const COUNT: usize = 50_000;
    let ring = ConcurrentRingBuffer::new(2).unwrap();

    thread::scope(|s| {
        for half in 0..2 {
            let ring = &ring;
            s.spawn(move || {
                for i in 0..COUNT / 2 {
                    ring.put(format!("{half}:{i}"));
                }
            });
        }

        let mut seen = Vec::with_capacity(COUNT);
        for _ in 0..COUNT {
            seen.push(ring.get());
        }
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), COUNT);
    });
}

#[test]
fn drop_with_values_in_flight() {
    let ring = ConcurrentRingBuffer::new(8).unwrap();
    for i in 0..8 {
        ring.put(vec![i; 16]);
    }
    assert_eq!(ring.get(), vec![0; 16]);
    drop(ring);
}
