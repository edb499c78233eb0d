//! Relaxed tail sync (RTS) discipline
//!
//! 宽松 tail 同步（RTS）方式
//!
//! Reservations race on a CAS of `head` as in [`Mt`](super::Mt), but nobody
//! waits for a predecessor to publish. A thread that finishes copying leaves a
//! completion mark on the slot where its range starts. Whichever thread holds
//! the tail (the one whose range starts at `tail`) moves it across its own
//! range and then keeps going across every adjacent range already marked
//! finished. When it reaches a range still in flight it leaves a waiting mark
//! there and returns; the owner of that range picks the tail up as soon as it
//! finishes. A preempted thread therefore only hides its own range and the
//! ranges after it, never the finished ranges before it.
//!
//! Handing the tail over happens through a swap on the mark slot: the finisher
//! swaps in "finished", the tail holder swaps in "waiting", and whichever swap
//! comes second sees the other's value and carries on.
//!
//! New reservations wait while `head - tail > htd_max`, which bounds how far
//! unpublished work may run ahead of the published tail.
//!
//! 预留与 [`Mt`](super::Mt) 一样通过对 `head` 的 CAS 竞争完成，但发布时无需等待前驱。
//! 完成拷贝的线程在其区间起始槽位上留下完成标记。持有 tail 的线程（其区间恰好从
//! `tail` 开始）推进 tail 跨过自身区间，并继续跨过所有相邻的已完成区间；遇到仍在
//! 进行中的区间时在其上留下等待标记并返回，由该区间的所有者在完成时接手。
//! 新的预留在 `head - tail > htd_max` 时等待。

use super::{Behavior, HeadTailSync, Reservation, Sealed, SyncKind};
use crate::shim::atomic::{AtomicU32, AtomicU64, Ordering};
use crate::shim::spin_loop;

/// Multi-thread side with relaxed tail sync
///
/// 带宽松 tail 同步的多线程侧
pub struct Rts;

impl Sealed for Rts {}

// Mark layout: range start position in the high half, range length in the low
// half. A length of 0 means the tail is parked here waiting for the range to
// finish. Lengths never exceed 2^30, so an all-ones word cannot be either.
const EMPTY: u64 = u64::MAX;

#[inline]
fn waiting(pos: u32) -> u64 {
    u64::from(pos) << 32
}

#[inline]
fn finished(pos: u32, len: u32) -> u64 {
    (u64::from(pos) << 32) | u64::from(len)
}

/// Length of the finished range starting at `pos`, if `mark` records one
#[inline]
fn finished_len(mark: u64, pos: u32) -> Option<u32> {
    let len = mark as u32;
    if (mark >> 32) as u32 == pos && len != 0 && mark != EMPTY {
        Some(len)
    } else {
        None
    }
}

/// State of an RTS side
///
/// RTS 侧的状态
pub struct RtsHeadTail {
    head: AtomicU32,
    tail: AtomicU32,
    /// One completion mark per slot, keyed by the range start position
    marks: Box<[AtomicU64]>,
    mask: u32,
    htd_max: u32,
}

impl RtsHeadTail {
    /// Maximum allowed distance between head and tail positions
    ///
    /// head 与 tail 位置之间允许的最大距离
    #[inline]
    pub fn htd_max(&self) -> u32 {
        self.htd_max
    }

    #[inline]
    fn mark(&self, pos: u32) -> &AtomicU64 {
        &self.marks[(pos & self.mask) as usize]
    }

    /// Wait until head is within `htd_max` of tail, returning the fresh head
    #[inline]
    fn wait_head_distance(&self, mut head: u32) -> u32 {
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            if head.wrapping_sub(tail) <= self.htd_max {
                return head;
            }
            spin_loop();
            head = self.head.load(Ordering::Acquire);
        }
    }
}

impl HeadTailSync for Rts {
    type State = RtsHeadTail;

    const KIND: SyncKind = SyncKind::MtRts;

    fn new_state(size: u32, htd_max: u32) -> RtsHeadTail {
        // The tail starts parked at position 0
        let marks = (0..size.max(1))
            .map(|i| AtomicU64::new(if i == 0 { waiting(0) } else { EMPTY }))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        RtsHeadTail {
            head: AtomicU32::new(0),
            tail: AtomicU32::new(0),
            marks,
            mask: size.max(1) - 1,
            htd_max,
        }
    }

    #[inline]
    fn tail(state: &RtsHeadTail) -> u32 {
        state.tail.load(Ordering::Acquire)
    }

    #[inline]
    fn head(state: &RtsHeadTail) -> u32 {
        state.head.load(Ordering::Relaxed)
    }

    fn move_head<F>(
        state: &RtsHeadTail,
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
            old_head = state.wait_head_distance(old_head);

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

    fn update_tail(state: &RtsHeadTail, reservation: &Reservation) {
        let mut pos = reservation.old_head;
        let mut end = reservation.new_head;

        let prev = state
            .mark(pos)
            .swap(finished(pos, reservation.n), Ordering::AcqRel);
        if prev != waiting(pos) {
            // An earlier range is still in flight; its owner will carry the tail here
            return;
        }

        // This thread now holds the tail at `pos` and `[pos, end)` is finished
        loop {
            state.mark(pos).store(EMPTY, Ordering::Relaxed);
            state.tail.store(end, Ordering::Release);

            pos = end;
            let next = state.mark(pos).swap(waiting(pos), Ordering::AcqRel);
            match finished_len(next, pos) {
                Some(len) => end = pos.wrapping_add(len),
                None => return,
            }
        }
    }
}
