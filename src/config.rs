//! Ring construction parameters
//!
//! 环形队列构造参数

use crate::core::{self, Geometry};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::mem;

/// Default divisor for the RTS head/tail distance (`capacity / 8`)
pub const HTD_MAX_DIVISOR: u32 = 8;

/// Construction parameters for a ring
///
/// 环形队列的构造参数
///
/// The synchronization discipline is not part of the configuration; it is
/// selected by the `P` and `C` type parameters of [`new`](crate::new).
///
/// 同步方式不属于配置的一部分，而是由 [`new`](crate::new) 的 `P`、`C` 类型参数选择。
///
/// # Examples
///
/// ```
/// use syncring::RingConfig;
///
/// let config = RingConfig::new("rx", 1000).exact_size(true);
/// assert_eq!(config.geometry().unwrap().capacity(), 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Ring name, used for introspection and registry lookup
    pub name: String,
    /// Requested number of elements
    pub count: u32,
    /// Keep exactly `count` usable slots instead of `next_power_of_two(count) - 1`
    pub exact_size: bool,
    /// Producer head/tail distance limit for RTS; `None` means `capacity / 8`
    pub prod_htd_max: Option<u32>,
    /// Consumer head/tail distance limit for RTS; `None` means `capacity / 8`
    pub cons_htd_max: Option<u32>,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            name: String::from("ring"),
            count: 1024,
            exact_size: false,
            prod_htd_max: None,
            cons_htd_max: None,
        }
    }
}

impl RingConfig {
    /// Create a configuration for `count` elements named `name`
    ///
    /// 为 `count` 个元素创建名为 `name` 的配置
    ///
    /// Exact sizing is off and RTS distance limits use their defaults.
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
            ..Self::default()
        }
    }

    /// Set the exact-size policy
    ///
    /// 设置精确容量策略
    pub fn exact_size(mut self, exact_size: bool) -> Self {
        self.exact_size = exact_size;
        self
    }

    /// Set the producer RTS head/tail distance limit
    pub fn prod_htd_max(mut self, htd_max: u32) -> Self {
        self.prod_htd_max = Some(htd_max);
        self
    }

    /// Set the consumer RTS head/tail distance limit
    pub fn cons_htd_max(mut self, htd_max: u32) -> Self {
        self.cons_htd_max = Some(htd_max);
        self
    }

    /// Geometry this configuration produces
    ///
    /// 此配置对应的几何参数
    pub fn geometry(&self) -> Result<Geometry, ConfigError> {
        Geometry::new(self.count, self.exact_size)
    }

    /// Bytes of slot storage a ring of `T` built from this configuration needs
    ///
    /// 用此配置构造 `T` 类型环所需的槽位存储字节数
    pub fn mem_size<T>(&self) -> Result<usize, ConfigError> {
        core::mem_size(self.count, mem::size_of::<T>(), self.exact_size)
    }

    pub(crate) fn resolved_htd_max(&self, geometry: &Geometry) -> (u32, u32) {
        let default = geometry.capacity() / HTD_MAX_DIVISOR;
        (
            self.prod_htd_max.unwrap_or(default),
            self.cons_htd_max.unwrap_or(default),
        )
    }
}
