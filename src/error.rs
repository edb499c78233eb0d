//! Error and outcome types
//!
//! 错误与结果类型

use thiserror::Error;

/// Errors raised while building a ring
///
/// 构造环形队列时产生的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Requested element count was zero
    #[error("ring count must be greater than zero")]
    ZeroCapacity,

    /// Backing size would not fit the index mask
    #[error("ring count {count} exceeds the maximum ring size")]
    TooLarge {
        /// Requested count
        count: u64,
    },

    /// Caller-provided storage does not match the ring geometry
    #[error("storage holds {actual} slots, ring geometry needs {expected}")]
    StorageSize {
        /// Slots required by the geometry
        expected: usize,
        /// Slots in the provided storage
        actual: usize,
    },
}

/// Errors raised by [`RingRegistry`](crate::RingRegistry)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a ring named {0:?} is already registered")]
    Duplicate(String),

    #[error("no ring named {0:?} is registered")]
    NotFound(String),

    #[error("ring name must not be empty")]
    InvalidName,
}

/// Outcome of a single-element enqueue on a full ring
///
/// 队列已满时单元素入队的结果
///
/// The rejected value is handed back to the caller.
///
/// 被拒绝的值会返还给调用者。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushError<T> {
    /// Ring is full
    ///
    /// 队列已满
    Full(T),
}

/// Outcome of a single-element dequeue on an empty ring
///
/// 队列为空时单元素出队的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopError {
    /// Ring is empty
    ///
    /// 队列为空
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::ZeroCapacity.to_string(),
            "ring count must be greater than zero"
        );
        assert_eq!(
            ConfigError::StorageSize { expected: 8, actual: 4 }.to_string(),
            "storage holds 4 slots, ring geometry needs 8"
        );
    }

    #[test]
    fn test_registry_error_messages() {
        assert_eq!(
            RegistryError::NotFound("rx".into()).to_string(),
            "no ring named \"rx\" is registered"
        );
    }
}
