//! Fixed-size slot table backing a ring
//!
//! 环形队列的固定大小槽位表
//!
//! The table is allocated once at construction and never grows. Each slot is an
//! `UnsafeCell<MaybeUninit<T>>` so producers and consumers may touch disjoint
//! slots through a shared reference; which slots a thread may touch is decided
//! by the head/tail reservation protocol, not by this type.
//!
//! 槽位表在构造时一次性分配，之后不再增长。每个槽位是 `UnsafeCell<MaybeUninit<T>>`，
//! 因此生产者和消费者可以通过共享引用访问互不相交的槽位；线程可访问哪些槽位由
//! head/tail 预留协议决定，而非由此类型决定。

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;

/// Heap-allocated array of uninitialized slots
///
/// 堆上分配的未初始化槽位数组
pub struct SlotArray<T> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

impl<T> SlotArray<T> {
    /// Allocate `len` uninitialized slots
    ///
    /// 分配 `len` 个未初始化槽位
    pub fn new(len: usize) -> Self {
        let slots = (0..len)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { slots }
    }

    /// Adopt storage the caller allocated up front
    ///
    /// 接管调用者预先分配的存储
    pub fn from_storage(storage: Box<[MaybeUninit<T>]>) -> Self {
        let raw = Box::into_raw(storage) as *mut [UnsafeCell<MaybeUninit<T>>];
        // SAFETY: `UnsafeCell<U>` is `repr(transparent)` over `U`, so the slice
        // layout is identical and ownership moves unchanged.
        let slots = unsafe { Box::from_raw(raw) };
        Self { slots }
    }

    /// Number of slots
    ///
    /// 槽位数量
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Raw pointer to the slot at `index`
    ///
    /// 指向 `index` 处槽位的裸指针
    ///
    /// # Safety
    /// `index` must be `< len()`. The returned pointer may be used to read or
    /// write up to `len() - index` contiguous elements.
    ///
    /// # 安全性
    /// `index` 必须 `< len()`。返回的指针可用于读写最多 `len() - index` 个连续元素。
    #[inline]
    pub unsafe fn slot_ptr(&self, index: usize) -> *mut T {
        debug_assert!(index < self.slots.len());
        unsafe { UnsafeCell::raw_get(self.slots.as_ptr().add(index)).cast::<T>() }
    }
}

// SAFETY: slots are only accessed through reserved, disjoint index ranges; the
// ring publishes them with release/acquire pairs on the head/tail words.
unsafe impl<T: Send> Send for SlotArray<T> {}
unsafe impl<T: Send> Sync for SlotArray<T> {}
