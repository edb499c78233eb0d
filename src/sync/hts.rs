//! Head/tail sync (HTS) discipline.

use super::{Behavior, HeadTailSync, Reservation, Sealed, SyncKind};
use crate::shim::atomic::{AtomicU64, Ordering};
use crate::shim::spin_loop;

/// Multi-thread side with combined head/tail word
///
/// 使用合并 head/tail 字的多线程侧
///
/// Head and tail live in a single 64-bit word. A reservation is only attempted
/// once the word shows `tail == head`, i.e. the previous holder has published,
/// and it is committed by one CAS. At most one reservation is in flight, so
/// publishing is a single atomic add on the tail half with nothing to wait for.
///
/// head 与 tail 位于同一个 64 位字中。只有当该字显示 `tail == head`（即前一个持有者
/// 已发布）时才尝试预留，并通过一次 CAS 提交。任意时刻最多只有一个预留在进行，
/// 因此发布只是对 tail 半字的一次原子加法，无需等待。
pub struct Hts;

impl Sealed for Hts {}

// Layout of the combined word: head in the low half, tail in the high half.
// Adding to the high half wraps off the top of the word and never carries into head.
const TAIL_SHIFT: u32 = 32;

#[inline]
fn unpack(raw: u64) -> (u32, u32) {
    (raw as u32, (raw >> TAIL_SHIFT) as u32)
}

#[inline]
fn pack(head: u32, tail: u32) -> u64 {
    (u64::from(tail) << TAIL_SHIFT) | u64::from(head)
}

/// State of an HTS side
///
/// HTS 侧的状态
pub struct HtsHeadTail {
    ht: AtomicU64,
}

impl HeadTailSync for Hts {
    type State = HtsHeadTail;

    const KIND: SyncKind = SyncKind::MtHts;

    fn new_state(_size: u32, _htd_max: u32) -> HtsHeadTail {
        HtsHeadTail {
            ht: AtomicU64::new(0),
        }
    }

    #[inline]
    fn tail(state: &HtsHeadTail) -> u32 {
        unpack(state.ht.load(Ordering::Acquire)).1
    }

    #[inline]
    fn head(state: &HtsHeadTail) -> u32 {
        unpack(state.ht.load(Ordering::Relaxed)).0
    }

    fn move_head<F>(
        state: &HtsHeadTail,
        opposite_tail: F,
        capacity: u32,
        n: u32,
        behavior: Behavior,
    ) -> Reservation
    where
        F: Fn() -> u32,
    {
        let mut raw = state.ht.load(Ordering::Acquire);
        loop {
            // Wait for the previous holder to publish
            let (mut head, mut tail) = unpack(raw);
            while head != tail {
                spin_loop();
                raw = state.ht.load(Ordering::Acquire);
                (head, tail) = unpack(raw);
            }

            let entries = capacity.wrapping_add(opposite_tail()).wrapping_sub(head);

            let n = behavior.clamp(n, entries);
            if n == 0 {
                return Reservation::empty(head, entries);
            }

            let new_head = head.wrapping_add(n);
            match state.ht.compare_exchange_weak(
                raw,
                pack(new_head, tail),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Reservation {
                        n,
                        old_head: head,
                        new_head,
                        entries,
                    };
                }
                Err(current) => raw = current,
            }
        }
    }

    #[inline]
    fn update_tail(state: &HtsHeadTail, reservation: &Reservation) {
        state
            .ht
            .fetch_add(u64::from(reservation.n) << TAIL_SHIFT, Ordering::Release);
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering as StdOrdering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_pack_roundtrip_and_tail_wrap() {
        assert_eq!(unpack(pack(5, 9)), (5, 9));

        let state = Hts::new_state(16, 0);
        state.ht.store(pack(2, u32::MAX - 1), Ordering::Relaxed);
        let r = Reservation {
            n: 4,
            old_head: u32::MAX - 1,
            new_head: 2,
            entries: 8,
        };
        Hts::update_tail(&state, &r);
        // Tail wrapped to 2 without disturbing head
        assert_eq!(unpack(state.ht.load(Ordering::Relaxed)), (2, 2));
    }

    #[test]
    fn test_reserve_then_publish() {
        let state = Hts::new_state(16, 0);
        let r = Hts::move_head(&state, || 0, 16, 5, Behavior::Fixed);
        assert_eq!((r.n, r.old_head, r.new_head), (5, 0, 5));
        assert_eq!(Hts::head(&state), 5);
        assert_eq!(Hts::tail(&state), 0);

        Hts::update_tail(&state, &r);
        assert_eq!(Hts::tail(&state), 5);
    }

    #[test]
    fn test_second_reservation_waits_for_publish() {
        let state = Arc::new(Hts::new_state(16, 0));
        let first = Hts::move_head(&state, || 0, 16, 3, Behavior::Fixed);
        let reserved = Arc::new(AtomicBool::new(false));

        let contender = {
            let state = state.clone();
            let reserved = reserved.clone();
            thread::spawn(move || {
                let r = Hts::move_head(&state, || 0, 16, 2, Behavior::Fixed);
                reserved.store(true, StdOrdering::SeqCst);
                Hts::update_tail(&state, &r);
                r
            })
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!reserved.load(StdOrdering::SeqCst));

        Hts::update_tail(&state, &first);
        let second = contender.join().unwrap();
        assert_eq!(second.old_head, 3);
        assert_eq!(Hts::tail(&state), 5);
    }
}
