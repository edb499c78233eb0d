//! Core ring storage - geometry and copy engine shared by every discipline
//!
//! 核心环形存储 - 所有同步方式共享的几何参数与拷贝引擎
//!
//! This module holds the parts of a ring that do not care how head and tail
//! are synchronized:
//! - Capacity rounding and the exact-size policy
//! - Index masking over a power-of-two slot table
//! - Bulk copy in and out of a reserved index range (with wrap-around handling)
//!
//! 此模块包含与 head/tail 同步方式无关的部分：
//! - 容量取整与精确容量策略
//! - 基于 2 的幂次槽位表的索引掩码
//! - 对已预留索引区间的批量拷入/拷出（带环绕处理）

use super::error::ConfigError;
use super::slots::SlotArray;
use std::mem::MaybeUninit;
use std::ptr;

/// Largest index mask a ring may use; backing sizes must not exceed it
///
/// 环允许的最大索引掩码；槽位表大小不得超过该值
pub const RING_SZ_MASK: u32 = 0x7fff_ffff;

/// Cache line size used when rounding memory requirements
///
/// 计算内存需求时使用的缓存行大小
pub const CACHE_LINE_SIZE: usize = 64;

/// Slot table geometry derived from a requested count
///
/// 由请求数量推导出的槽位表几何参数
///
/// Without the exact-size policy the count is rounded up to a power of two
/// (never below 2) and one slot is kept free to tell "full" from "empty", so
/// the usable capacity is `size - 1`. With exact size the table is sized to
/// `next_power_of_two(count + 1)` and the usable capacity is exactly `count`.
///
/// 非精确容量模式下，数量向上取整到 2 的幂次（至少为 2），并保留一个空槽位用于
/// 区分“满”与“空”，因此可用容量为 `size - 1`。精确容量模式下槽位表大小为
/// `next_power_of_two(count + 1)`，可用容量恰好为 `count`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    size: u32,
    mask: u32,
    capacity: u32,
}

impl Geometry {
    /// Compute the geometry for `count` elements
    ///
    /// 计算 `count` 个元素对应的几何参数
    ///
    /// # Errors
    /// `ZeroCapacity` when `count == 0`, `TooLarge` when the backing size
    /// would exceed [`RING_SZ_MASK`].
    ///
    /// # 错误
    /// `count == 0` 时返回 `ZeroCapacity`，槽位表大小超过 [`RING_SZ_MASK`] 时返回 `TooLarge`。
    pub fn new(count: u32, exact_size: bool) -> Result<Self, ConfigError> {
        if count == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        let wanted = if exact_size {
            u64::from(count) + 1
        } else {
            u64::from(count).max(2)
        };
        let size = wanted.next_power_of_two();
        if size > u64::from(RING_SZ_MASK) {
            return Err(ConfigError::TooLarge {
                count: u64::from(count),
            });
        }

        let size = size as u32;
        let capacity = if exact_size { count } else { size - 1 };
        Ok(Self {
            size,
            mask: size - 1,
            capacity,
        })
    }

    /// Number of slots in the backing table (always a power of two)
    ///
    /// 槽位表中的槽位数量（总是 2 的幂次）
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Index mask (`size - 1`)
    #[inline]
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Number of elements the ring can hold at once
    ///
    /// 环一次可容纳的元素数量
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

/// Bytes of backing storage needed for `count` elements of `element_size` bytes
///
/// 计算 `count` 个大小为 `element_size` 字节的元素所需的存储字节数
///
/// Usable without building a ring, so callers can pre-allocate the slot table
/// and hand it to [`with_storage`](crate::with_storage). The result is rounded
/// up to a cache line.
///
/// 无需构造环即可使用，调用者可据此预先分配槽位表并交给
/// [`with_storage`](crate::with_storage)。结果向上取整到缓存行。
pub fn mem_size(count: u32, element_size: usize, exact_size: bool) -> Result<usize, ConfigError> {
    let geometry = Geometry::new(count, exact_size)?;
    let bytes = (geometry.size() as usize)
        .checked_mul(element_size)
        .ok_or(ConfigError::TooLarge {
            count: u64::from(count),
        })?;
    Ok(bytes.div_ceil(CACHE_LINE_SIZE) * CACHE_LINE_SIZE)
}

/// Slot table plus geometry
///
/// 槽位表与几何参数
///
/// Positions handed to the copy functions are free-running `u32` counters; they
/// are masked here, so callers never reduce them modulo the size themselves.
///
/// 传给拷贝函数的位置是自由递增的 `u32` 计数器，在此处进行掩码，调用者无需自行取模。
pub struct RingCore<T> {
    slots: SlotArray<T>,
    geometry: Geometry,
}

impl<T: Copy> RingCore<T> {
    /// Allocate a core for `geometry`
    pub fn new(geometry: Geometry) -> Self {
        Self {
            slots: SlotArray::new(geometry.size() as usize),
            geometry,
        }
    }

    /// Build a core over caller-provided storage
    ///
    /// 基于调用者提供的存储构造核心
    ///
    /// # Errors
    /// `StorageSize` unless `storage.len() == geometry.size()`.
    pub fn with_storage(
        geometry: Geometry,
        storage: Box<[MaybeUninit<T>]>,
    ) -> Result<Self, ConfigError> {
        let expected = geometry.size() as usize;
        if storage.len() != expected {
            return Err(ConfigError::StorageSize {
                expected,
                actual: storage.len(),
            });
        }
        Ok(Self {
            slots: SlotArray::from_storage(storage),
            geometry,
        })
    }
}

impl<T> RingCore<T> {
    /// Sizing this core was built with
    #[inline]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Usable capacity
    ///
    /// 可用容量
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.geometry.capacity
    }

    /// Backing slot count
    #[inline]
    pub fn size(&self) -> u32 {
        self.geometry.size
    }
}

impl<T: Copy> RingCore<T> {
    /// Split `[start, start + count)` into the contiguous segment lengths
    /// before and after the end of the table.
    #[inline]
    fn segments(&self, start: u32, count: usize) -> (usize, usize, usize) {
        let index = (start & self.geometry.mask) as usize;
        let until_end = self.geometry.size as usize - index;
        if count <= until_end {
            (index, count, 0)
        } else {
            (index, until_end, count - until_end)
        }
    }

    /// Copy `values` into the slots starting at position `start`
    ///
    /// 将 `values` 拷贝到从位置 `start` 开始的槽位中
    ///
    /// Wrap-around is handled by splitting into two copies.
    ///
    /// 通过拆分为两次拷贝处理环绕。
    ///
    /// # Safety
    /// Caller must ensure:
    /// - `values.len()` does not exceed the usable capacity
    /// - The range `[start, start + values.len())` is reserved by the caller and
    ///   no other thread reads or writes it until it is published
    ///
    /// # 安全性
    /// 调用者必须确保：
    /// - `values.len()` 不超过可用容量
    /// - 区间 `[start, start + values.len())` 已由调用者预留，在发布之前没有其他线程读写
    pub unsafe fn copy_in(&self, start: u32, values: &[T]) {
        if values.is_empty() {
            return;
        }

        let (index, first, second) = self.segments(start, values.len());
        unsafe {
            ptr::copy_nonoverlapping(values.as_ptr(), self.slots.slot_ptr(index), first);
            if second > 0 {
                ptr::copy_nonoverlapping(
                    values.as_ptr().add(first),
                    self.slots.slot_ptr(0),
                    second,
                );
            }
        }
    }

    /// Copy `count` elements starting at position `start` out to `dest`
    ///
    /// 将从位置 `start` 开始的 `count` 个元素拷贝到 `dest`
    ///
    /// # Safety
    /// Caller must ensure:
    /// - `dest` is valid for `count` writes of `T`
    /// - The range `[start, start + count)` is reserved by the caller and was
    ///   published by a producer
    ///
    /// # 安全性
    /// 调用者必须确保：
    /// - `dest` 可写入 `count` 个 `T`
    /// - 区间 `[start, start + count)` 已由调用者预留，且已被生产者发布
    pub unsafe fn copy_out(&self, start: u32, dest: *mut T, count: usize) {
        if count == 0 {
            return;
        }

        let (index, first, second) = self.segments(start, count);
        unsafe {
            ptr::copy_nonoverlapping(self.slots.slot_ptr(index), dest, first);
            if second > 0 {
                ptr::copy_nonoverlapping(self.slots.slot_ptr(0), dest.add(first), second);
            }
        }
    }
}
