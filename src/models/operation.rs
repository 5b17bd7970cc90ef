//! Operation model and type encoding.
//!
//! An operation is the smallest schedulable unit of work: one step of a
//! job template with a type, a duration, and dependency bounds. Operation
//! types form a closed 26-symbol alphabet; machine capabilities over that
//! alphabet are stored as a bitset for O(1) membership tests.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 2

use serde::{Deserialize, Serialize};

/// Operation type: one of 26 closed symbols (`A`..`Z`).
///
/// Carried as a `u8` discriminant throughout the engine; never extended
/// at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
#[rustfmt::skip]
pub enum OpType {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
}

impl OpType {
    /// Number of distinct operation types.
    pub const COUNT: usize = 26;

    #[rustfmt::skip]
    const ALL: [OpType; Self::COUNT] = [
        OpType::A, OpType::B, OpType::C, OpType::D, OpType::E, OpType::F,
        OpType::G, OpType::H, OpType::I, OpType::J, OpType::K, OpType::L,
        OpType::M, OpType::N, OpType::O, OpType::P, OpType::Q, OpType::R,
        OpType::S, OpType::T, OpType::U, OpType::V, OpType::W, OpType::X,
        OpType::Y, OpType::Z,
    ];

    /// Zero-based index of this type (`A` = 0 .. `Z` = 25).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Type for a zero-based index, or `None` if out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Parses an uppercase ASCII letter.
    pub fn from_char(symbol: char) -> Option<Self> {
        if symbol.is_ascii_uppercase() {
            Self::from_index(symbol as usize - 'A' as usize)
        } else {
            None
        }
    }

    /// The uppercase ASCII letter for this type.
    pub fn as_char(self) -> char {
        (b'A' + self as u8) as char
    }

    /// Iterates over all 26 types in order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::ALL.iter().copied()
    }
}

/// A set of operation types a machine can process.
///
/// Backed by a `u32` bitmask over [`OpType`] indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapabilitySet(u32);

impl CapabilitySet {
    /// Creates an empty capability set.
    pub fn empty() -> Self {
        Self(0)
    }

    /// Creates a set from a slice of types.
    pub fn from_types(types: &[OpType]) -> Self {
        let mut set = Self::empty();
        for &t in types {
            set.insert(t);
        }
        set
    }

    /// Adds a type to the set.
    pub fn insert(&mut self, op_type: OpType) {
        self.0 |= 1 << op_type.index();
    }

    /// Whether the set contains a type.
    #[inline]
    pub fn contains(&self, op_type: OpType) -> bool {
        self.0 & (1 << op_type.index()) != 0
    }

    /// Number of types in the set.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns the contained types in alphabetical order.
    pub fn types(&self) -> Vec<OpType> {
        OpType::all().filter(|t| self.contains(*t)).collect()
    }
}

/// Template form of an operation: the immutable definition shared by all
/// repeats of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSpec {
    /// Operation type.
    pub op_type: OpType,
    /// Processing duration in simulation ticks (non-negative).
    pub duration: i64,
    /// Index of the predecessor operation within the same job, if any.
    pub predecessor: Option<usize>,
    /// Earliest allowed start tick. `None` = available at t=0.
    pub earliest_start: Option<i64>,
}

impl OperationSpec {
    /// Creates a spec with no predecessor and no earliest-start bound.
    pub fn new(op_type: OpType, duration: i64) -> Self {
        Self {
            op_type,
            duration,
            predecessor: None,
            earliest_start: None,
        }
    }

    /// Sets the predecessor operation index.
    pub fn with_predecessor(mut self, index: usize) -> Self {
        self.predecessor = Some(index);
        self
    }

    /// Sets the earliest-start bound.
    pub fn with_earliest_start(mut self, tick: i64) -> Self {
        self.earliest_start = Some(tick);
        self
    }
}

/// Instance form of an operation: spec fields plus mutable committed state.
///
/// Each job instance owns its own copy; committing one instance's
/// operation never affects another repeat of the same template.
///
/// Invariants once committed: `finish = start + duration`,
/// `start >= earliest_start`, and `start >= predecessor.finish` when a
/// predecessor exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation type.
    pub op_type: OpType,
    /// Processing duration in ticks.
    pub duration: i64,
    /// Predecessor operation index within the same job, if any.
    pub predecessor: Option<usize>,
    /// Effective earliest-start bound. Starts at the spec value and is
    /// advanced to the previous operation's finish as the job progresses.
    pub earliest_start: i64,
    /// Committed start tick, unset until committed.
    pub start: Option<i64>,
    /// Committed finish tick, unset until committed.
    pub finish: Option<i64>,
    /// Index of the machine this operation was committed to.
    pub machine: Option<usize>,
}

impl Operation {
    /// Instantiates an operation from its template spec.
    pub fn from_spec(spec: &OperationSpec) -> Self {
        Self {
            op_type: spec.op_type,
            duration: spec.duration,
            predecessor: spec.predecessor,
            earliest_start: spec.earliest_start.unwrap_or(0),
            start: None,
            finish: None,
            machine: None,
        }
    }

    /// Whether this operation has been committed to a machine.
    #[inline]
    pub fn is_committed(&self) -> bool {
        self.finish.is_some()
    }

    /// Records the committed placement.
    pub fn commit(&mut self, machine: usize, start: i64) {
        self.start = Some(start);
        self.finish = Some(start + self.duration);
        self.machine = Some(machine);
    }
}
