use shiftflow::ModuleError;
use thiserror::Error;

/// Generator configuration error.
///
/// Every variant is raised while elaborating, before any module is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The data width is not a power of two of at least 2.
    #[error("width {width} is not a power of two")]
    NotPowerOfTwo {
        /// Requested width
        width: usize,
    },

    /// The power is zero or exceeds the supported maximum.
    #[error("power {power} is out of range")]
    PowerOutOfRange {
        /// Requested power
        power: usize,
    },

    /// A stage fan-in does not split the width into groups of at least two bits.
    #[error("fan-in {fanin} does not divide width {width}")]
    FaninMismatch {
        /// Data width
        width: usize,
        /// Requested fan-in
        fanin: usize,
    },

    /// The shift-amount bus is not `log2(width)` bits wide.
    #[error("shift amount has {found} bits, expected {expected}")]
    AmountWidthMismatch {
        /// log2 of the data width
        expected: usize,
        /// Width of the given bus
        found: usize,
    },

    /// A data bus is not `width` bits wide.
    #[error("bus has {found} bits, expected {expected}")]
    BusWidthMismatch {
        /// Data width
        expected: usize,
        /// Width of the given bus
        found: usize,
    },

    /// The host DSL rejected the elaborated structure.
    #[error(transparent)]
    Module(#[from] ModuleError),
}
