#![cfg(feature = "loom")]

use loom::thread;
use syncring::{Hts, Mt, MultiThreaded, RingConfig, Rts, St, new};

/// Two producers race for slots; one consumer must see both values exactly once
fn two_producers<P: MultiThreaded>() {
    loom::model(|| {
        let (p, mut c) = new::<usize, P, St>(RingConfig::new("l", 4)).unwrap();

        let handles: Vec<_> = [1usize, 2]
            .into_iter()
            .map(|value| {
                let mut p = p.clone();
                thread::spawn(move || {
                    assert!(p.enqueue(value).is_ok());
                })
            })
            .collect();
        drop(p);

        let mut got = Vec::new();
        while got.len() < 2 {
            match c.dequeue() {
                Ok(v) => got.push(v),
                Err(_) => thread::yield_now(),
            }
        }
        for handle in handles {
            handle.join().unwrap();
        }

        got.sort_unstable();
        assert_eq!(got, vec![1, 2]);
        assert!(c.is_empty());
    });
}

/// Two consumers split a pre-filled ring between them without duplicates
fn two_consumers<C: MultiThreaded>() {
    loom::model(|| {
        let (mut p, c) = new::<usize, St, C>(RingConfig::new("l", 4)).unwrap();
        assert_eq!(p.enqueue_bulk(&[1, 2]).transferred, 2);

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let mut c = c.clone();
                thread::spawn(move || c.dequeue().ok())
            })
            .collect();

        let mut got: Vec<usize> = handles
            .into_iter()
            .filter_map(|handle| handle.join().unwrap())
            .collect();
        got.extend(c.clone().drain());

        got.sort_unstable();
        assert_eq!(got, vec![1, 2]);
    });
}

#[test]
fn test_mt_two_producers_loom() {
    two_producers::<Mt>();
}

#[test]
fn test_rts_two_producers_loom() {
    two_producers::<Rts>();
}

#[test]
fn test_hts_two_producers_loom() {
    two_producers::<Hts>();
}

/// Two RTS producers in flight at once; out-of-order finishes must still publish both
#[test]
fn test_rts_concurrent_reservations_loom() {
    loom::model(|| {
        let config = RingConfig::new("l", 4).prod_htd_max(3);
        let (p, mut c) = new::<usize, Rts, St>(config).unwrap();

        let handles: Vec<_> = [1usize, 2]
            .into_iter()
            .map(|value| {
                let mut p = p.clone();
                thread::spawn(move || {
                    assert!(p.enqueue(value).is_ok());
                })
            })
            .collect();
        drop(p);
        for handle in handles {
            handle.join().unwrap();
        }

        let mut got: Vec<usize> = c.drain().collect();
        got.sort_unstable();
        assert_eq!(got, vec![1, 2]);
    });
}

#[test]
fn test_mt_two_consumers_loom() {
    two_consumers::<Mt>();
}

#[test]
fn test_rts_two_consumers_loom() {
    two_consumers::<Rts>();
}

#[test]
fn test_hts_two_consumers_loom() {
    two_consumers::<Hts>();
}
