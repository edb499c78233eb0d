//! Multi-thread discipline: CAS reservation, in-order publication.

use super::{Behavior, HeadTail, HeadTailSync, Reservation, Sealed, SyncKind};
use crate::shim::atomic::Ordering;
use crate::shim::spin_loop;

/// Multi-producer / multi-consumer side
///
/// 多生产者 / 多消费者侧
///
/// Reservations race on a CAS of `head` and are retried without backoff, so a
/// thread may in principle lose every race; no fairness is promised. Tails are
/// published strictly in reservation order: a thread that finished copying
/// waits until every earlier reservation on its side has been published.
///
/// 预留通过对 `head` 的 CAS 竞争完成，失败后直接重试，不做退避，也不保证公平性。
/// tail 严格按预留顺序发布：完成拷贝的线程需等待同侧所有更早的预留发布后才能发布。
pub struct Mt;

impl Sealed for Mt {}

impl HeadTailSync for Mt {
    type State = HeadTail;

    const KIND: SyncKind = SyncKind::Mt;

    fn new_state(_size: u32, _htd_max: u32) -> HeadTail {
        HeadTail::new()
    }

    #[inline]
    fn tail(state: &HeadTail) -> u32 {
        state.tail_acquire()
    }

    #[inline]
    fn head(state: &HeadTail) -> u32 {
        state.head_relaxed()
    }

    #[inline]
    fn move_head<F>(
        state: &HeadTail,
        opposite_tail: F,
        capacity: u32,
        n: u32,
        behavior: Behavior,
    ) -> Reservation
    where
        F: Fn() -> u32,
    {
        let mut old_head = state.head.load(Ordering::Acquire);
        loop {
            // The head load must not be reordered after the opposite tail load,
            // otherwise `entries` could underflow. Acquire on both keeps them ordered.
            let entries = capacity
                .wrapping_add(opposite_tail())
                .wrapping_sub(old_head);

            let n = behavior.clamp(n, entries);
            if n == 0 {
                return Reservation::empty(old_head, entries);
            }

            let new_head = old_head.wrapping_add(n);
            match state.head.compare_exchange_weak(
                old_head,
                new_head,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Reservation {
                        n,
                        old_head,
                        new_head,
                        entries,
                    };
                }
                Err(current) => old_head = current,
            }
        }
    }

    #[inline]
    fn update_tail(state: &HeadTail, reservation: &Reservation) {
        // Earlier reservations on this side must publish first
        while state.tail.load(Ordering::Acquire) != reservation.old_head {
            spin_loop();
        }
        state.tail.store(reservation.new_head, Ordering::Release);
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_reserve_and_publish() {
        let state = Mt::new_state(16, 0);
        let r = Mt::move_head(&state, || 0, 8, 3, Behavior::Fixed);
        assert_eq!((r.n, r.old_head, r.new_head, r.entries), (3, 0, 3, 8));
        assert_eq!(Mt::head(&state), 3);
        assert_eq!(Mt::tail(&state), 0);

        Mt::update_tail(&state, &r);
        assert_eq!(Mt::tail(&state), 3);
    }

    #[test]
    fn test_fixed_reservation_has_no_side_effects() {
        let state = Mt::new_state(16, 0);
        let r = Mt::move_head(&state, || 0, 2, 5, Behavior::Fixed);
        assert_eq!(r.n, 0);
        assert_eq!(r.entries, 2);
        assert_eq!(Mt::head(&state), 0);
    }

    #[test]
    fn test_later_publish_waits_for_earlier() {
        let state = Arc::new(Mt::new_state(16, 0));
        let first = Mt::move_head(&state, || 0, 16, 2, Behavior::Fixed);
        let second = Mt::move_head(&state, || 0, 16, 3, Behavior::Fixed);
        assert_eq!(second.old_head, 2);

        let waiter = {
            let state = state.clone();
            thread::spawn(move || Mt::update_tail(&state, &second))
        };

        // The second publisher is stuck behind the first
        thread::sleep(Duration::from_millis(20));
        assert_eq!(Mt::tail(&state), 0);

        Mt::update_tail(&state, &first);
        waiter.join().unwrap();
        assert_eq!(Mt::tail(&state), 5);
    }
}
