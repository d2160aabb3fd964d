//! Elaboration plan of the barrel shifter.
//!
//! Everything here is plain data: the stage descriptors and the per-cell wiring tables are computed without touching
//! a [`shiftflow::ModuleBuilder`], so the index arithmetic can be checked on its own.

use std::fmt;

use arrayvec::ArrayVec;
use shiftflow::flog2;
use static_assertions::const_assert;

use crate::ConfigurationError;

/// Largest supported `log2(width)`.
pub const MAX_POWER: usize = 16;

const_assert!(MAX_POWER < usize::BITS as usize);

/// Data width of a barrel shifter, a power of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Width {
    power: usize,
}

impl Width {
    /// Creates a width, which must be a power of two of at least 2.
    pub fn new(width: usize) -> Result<Self, ConfigurationError> {
        if width < 2 || !width.is_power_of_two() {
            return Err(ConfigurationError::NotPowerOfTwo { width });
        }
        Self::from_power(flog2(width))
    }

    /// Creates the width `2^power`.
    pub fn from_power(power: usize) -> Result<Self, ConfigurationError> {
        if power == 0 || power > MAX_POWER {
            return Err(ConfigurationError::PowerOutOfRange { power });
        }
        Ok(Self { power })
    }

    /// Number of data bits.
    pub fn width(self) -> usize { 1 << self.power }

    /// Number of stages, which is also the width of the shift amount.
    pub fn power(self) -> usize { self.power }
}

/// Shift mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Vacated bits are filled with zero.
    #[default]
    LogicalShift,

    /// Vacated bits are filled with the most significant bit of the value.
    ArithmeticShift,

    /// Shifted-out bits re-enter at the top.
    Rotate,
}

impl Mode {
    /// Whether vacated bits take the sign bit.
    pub fn arithmetic(self) -> bool { matches!(self, Mode::ArithmeticShift) }

    /// Whether the network rotates instead of shifting.
    pub fn rotate(self) -> bool { matches!(self, Mode::Rotate) }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::LogicalShift => write!(f, "lsr"),
            Mode::ArithmeticShift => write!(f, "asr"),
            Mode::Rotate => write!(f, "ror"),
        }
    }
}

/// Source bits of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellWiring {
    /// Output bit driven by the cell.
    pub output: usize,
    /// Source bit taken when the select bit is clear.
    pub straight: usize,
    /// Source bit taken when the select bit is set, reduced modulo the width.
    pub shifted: usize,
    /// Whether the unreduced shifted index fell past the top of the bus.
    pub wrap: bool,
}

/// Computes the wiring of one stage whose multiplexers are split in `fanin` groups.
///
/// Within a group of `width / fanin` bits, output `i` reads `i` straight and `i + group / 2` shifted.
pub fn plan_stage(width: Width, fanin: usize) -> Result<Vec<CellWiring>, ConfigurationError> {
    let w = width.width();
    if fanin == 0 || w % fanin != 0 || w / fanin < 2 {
        return Err(ConfigurationError::FaninMismatch { width: w, fanin });
    }

    let group = w / fanin;
    let half = group / 2;
    let cells = (0..fanin)
        .flat_map(|imux| (imux * group)..((imux + 1) * group))
        .map(|i| {
            let j = i + half;
            CellWiring { output: i, straight: i, shifted: j % w, wrap: j >= w }
        })
        .collect();
    Ok(cells)
}

/// Bus read or written by a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusRef {
    /// The value input port.
    Value,
    /// The `n`-th working bus, `1 <= n <= power`.
    Worker(usize),
}

/// Descriptor of one stage.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    pub index: usize,
    pub input: BusRef,
    pub output: BusRef,
    /// Bit of the shift amount gating this stage.
    pub select_bit: usize,
    pub fanin: usize,
    /// Distance shifted when the select bit is set.
    pub distance: usize,
    pub arithmetic: bool,
    pub rotate: bool,
    pub cells: Vec<CellWiring>,
}

/// The stages of a barrel shifter, in elaboration order.
#[derive(Debug, Clone)]
pub struct ShiftNetwork {
    width: Width,
    mode: Mode,
    stages: ArrayVec<StagePlan, MAX_POWER>,
}

impl ShiftNetwork {
    /// Plans the network.
    ///
    /// Stage `s` is gated by amount bit `power - s - 1`, so the coarsest shift comes first.
    pub fn new(width: Width, mode: Mode) -> Result<Self, ConfigurationError> {
        let power = width.power();
        let mut stages = ArrayVec::new();

        for index in 0..power {
            let select_bit = power - index - 1;
            let fanin = 1 << index;
            let stage = StagePlan {
                index,
                input: if index == 0 { BusRef::Value } else { BusRef::Worker(index) },
                output: BusRef::Worker(index + 1),
                select_bit,
                fanin,
                distance: 1 << select_bit,
                arithmetic: mode.arithmetic(),
                rotate: mode.rotate(),
                cells: plan_stage(width, fanin)?,
            };
            stages.try_push(stage).map_err(|_| ConfigurationError::PowerOutOfRange { power })?;
        }

        Ok(Self { width, mode, stages })
    }

    /// Data width.
    pub fn width(&self) -> Width { self.width }

    /// Shift mode.
    pub fn mode(&self) -> Mode { self.mode }

    /// Stage descriptors.
    pub fn stages(&self) -> &[StagePlan] { &self.stages }

    /// Runs the network on plain bits, least significant first.
    ///
    /// Only the low `power` bits of `amount` are used.
    pub fn evaluate(&self, value: &[bool], amount: usize) -> Result<Vec<bool>, ConfigurationError> {
        let w = self.width.width();
        if value.len() != w {
            return Err(ConfigurationError::BusWidthMismatch { expected: w, found: value.len() });
        }

        let msb = value[w - 1];
        let mut bus = value.to_vec();
        for stage in &self.stages {
            let select = (amount >> stage.select_bit) & 1 == 1;
            let mut next = vec![false; w];
            for cell in &stage.cells {
                next[cell.output] = cshift_bit(
                    bus[cell.straight],
                    bus[cell.shifted],
                    select,
                    msb,
                    stage.arithmetic,
                    stage.rotate,
                    cell.wrap,
                );
            }
            bus = next;
        }
        Ok(bus)
    }
}

/// One carry-shift cell as a boolean function.
pub fn cshift_bit(
    straight: bool, shifted: bool, select: bool, msb: bool, arithmetic: bool, rotate: bool, wrap: bool,
) -> bool {
    let carry = arithmetic && select && msb;
    let u = straight && !select;
    let v = if !rotate && wrap { carry } else { shifted && select };
    u || v
}

#[cfg(test)]
mod tests {
    use super::*;

    const POWERS: [usize; 6] = [1, 2, 3, 4, 5, 6];

    #[test]
    fn width_rejects_non_powers() {
        assert_eq!(Width::new(6), Err(ConfigurationError::NotPowerOfTwo { width: 6 }));
        assert_eq!(Width::new(1), Err(ConfigurationError::NotPowerOfTwo { width: 1 }));
        assert_eq!(Width::new(0), Err(ConfigurationError::NotPowerOfTwo { width: 0 }));
        assert_eq!(Width::from_power(0), Err(ConfigurationError::PowerOutOfRange { power: 0 }));
        assert_eq!(Width::from_power(MAX_POWER + 1), Err(ConfigurationError::PowerOutOfRange { power: MAX_POWER + 1 }));
        assert_eq!(Width::new(1 << 20), Err(ConfigurationError::PowerOutOfRange { power: 20 }));

        let width = Width::new(32).unwrap();
        assert_eq!((width.width(), width.power()), (32, 5));
    }

    #[test]
    fn stage_outputs_are_a_bijection() {
        for power in POWERS {
            let width = Width::from_power(power).unwrap();
            let w = width.width();
            for index in 0..power {
                let cells = plan_stage(width, 1 << index).unwrap();
                assert_eq!(cells.len(), w);

                let mut outputs = cells.iter().map(|cell| cell.output).collect::<Vec<_>>();
                outputs.sort_unstable();
                assert_eq!(outputs, (0..w).collect::<Vec<_>>());

                let mut shifted = cells.iter().map(|cell| cell.shifted).collect::<Vec<_>>();
                shifted.sort_unstable();
                assert_eq!(shifted, (0..w).collect::<Vec<_>>());

                for cell in &cells {
                    assert!(cell.straight < w && cell.shifted < w);
                    assert_eq!(cell.output, cell.straight);
                }
            }
        }
    }

    #[test]
    fn wrap_marks_the_top_of_the_bus() {
        let width = Width::from_power(3).unwrap();
        let cells = plan_stage(width, 1).unwrap();
        let wraps = cells.iter().filter(|cell| cell.wrap).map(|cell| cell.output).collect::<Vec<_>>();
        assert_eq!(wraps, vec![4, 5, 6, 7]);

        // Finer groups wrap only inside the last group.
        let cells = plan_stage(width, 4).unwrap();
        let wraps = cells.iter().filter(|cell| cell.wrap).map(|cell| cell.output).collect::<Vec<_>>();
        assert_eq!(wraps, vec![7]);
        assert_eq!(cells[7].shifted, 0);
    }

    #[test]
    fn stage_rejects_bad_fanin() {
        let width = Width::from_power(3).unwrap();
        for fanin in [0, 3, 8, 16] {
            assert_eq!(plan_stage(width, fanin), Err(ConfigurationError::FaninMismatch { width: 8, fanin }));
        }
    }

    #[test]
    fn stages_run_msb_first() {
        let network = ShiftNetwork::new(Width::from_power(3).unwrap(), Mode::Rotate).unwrap();
        let stages = network.stages();
        assert_eq!(stages.len(), 3);
        assert_eq!(stages.iter().map(|stage| stage.select_bit).collect::<Vec<_>>(), vec![2, 1, 0]);
        assert_eq!(stages.iter().map(|stage| stage.fanin).collect::<Vec<_>>(), vec![1, 2, 4]);
        assert_eq!(stages.iter().map(|stage| stage.distance).collect::<Vec<_>>(), vec![4, 2, 1]);
        assert_eq!(stages[0].input, BusRef::Value);
        assert_eq!(stages[2].input, BusRef::Worker(2));
        assert_eq!(stages[2].output, BusRef::Worker(3));
        assert!(stages.iter().all(|stage| stage.rotate && !stage.arithmetic));
    }

    #[test]
    fn evaluate_matches_integer_shifts() {
        for power in [1, 2, 3, 4] {
            let width = Width::from_power(power).unwrap();
            let w = width.width();
            let mask = (1u64 << w) - 1;
            let lsr = ShiftNetwork::new(width, Mode::LogicalShift).unwrap();
            let asr = ShiftNetwork::new(width, Mode::ArithmeticShift).unwrap();
            let ror = ShiftNetwork::new(width, Mode::Rotate).unwrap();

            for value in 0..(1u64 << w) {
                let bits = shiftflow::u64_to_bitvec(w, value);
                let sign = (value >> (w - 1)) & 1 == 1;
                for amount in 0..w {
                    let eval = |network: &ShiftNetwork| shiftflow::bitvec_to_u64(&network.evaluate(&bits, amount).unwrap());

                    assert_eq!(eval(&lsr), value >> amount);

                    let rotated = ((value >> amount) | (value << ((w - amount) % w))) & mask;
                    assert_eq!(eval(&ror), rotated);

                    let fill = if sign { mask & !(mask >> amount) } else { 0 };
                    assert_eq!(eval(&asr), (value >> amount) | fill);
                }
            }
        }
    }

    #[test]
    fn evaluate_rejects_wrong_width() {
        let network = ShiftNetwork::new(Width::from_power(2).unwrap(), Mode::LogicalShift).unwrap();
        assert_eq!(network.evaluate(&[true; 3], 1), Err(ConfigurationError::BusWidthMismatch { expected: 4, found: 3 }));
    }

    #[test]
    fn cell_truth_table() {
        // Rotation ignores wrap.
        assert!(cshift_bit(false, true, true, false, false, true, true));
        // Wrapped cells take the carry.
        assert!(!cshift_bit(false, true, true, false, false, false, true));
        assert!(cshift_bit(false, false, true, true, true, false, true));
        assert!(!cshift_bit(false, false, false, true, true, false, true));
        // Unselected cells pass the straight bit.
        assert!(cshift_bit(true, false, false, true, true, false, true));
    }
}
