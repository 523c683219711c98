//! Parsed program representation.
//!
//! A [`Program`] is an immutable, ordered list of operations plus the
//! declared qubit/result counts and profile. Operation order is
//! execution order: classical results are written and later read back
//! in this order, so it is semantically load-bearing.

use serde::Serialize;

/// The QIR profile a program conforms to.
///
/// Only the base profile is accepted; any other declared profile is a
/// parse-time failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Profile {
    /// `base_profile`: straight-line programs over static qubit and
    /// result identifiers.
    Base,
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Profile::Base => write!(f, "base_profile"),
        }
    }
}

/// A single operand of a call instruction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Operand {
    /// A qubit identifier (`%Qubit* inttoptr (i64 n to %Qubit*)`).
    Qubit(u32),
    /// A result identifier (`%Result* inttoptr (i64 n to %Result*)`).
    Result(u32),
    /// A signed integer literal (`i64 n`).
    Int(i64),
    /// A floating-point literal (`double x`).
    Double(f64),
    /// The null placeholder argument (`i8* null`).
    Null,
}

/// The kind of an output-recording marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordKind {
    /// `array_record_output`: declares the size of the output array.
    Array,
    /// `result_record_output`: reports one recorded result.
    Result,
}

/// One instruction of a parsed program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operation {
    /// A gate call. Unknown gate names are preserved here and rejected
    /// only when execution fails to resolve them.
    Gate {
        /// Gate name with the `__quantum__qis__`/`__body` wrapping stripped.
        name: String,
        /// Numeric arguments (e.g. rotation angles) in call order.
        args: Vec<f64>,
        /// Qubit operands in call order.
        qubits: Vec<u32>,
    },

    /// A measurement call writing one classical result.
    Measurement {
        /// Instrument name (`m` is normalized to `mz`).
        name: String,
        /// The measured qubit.
        qubit: u32,
        /// The result identifier written to.
        result: u32,
    },

    /// An output-recording marker.
    OutputMarker {
        /// Array-size declaration or single-result report.
        kind: RecordKind,
        /// The marker's raw operands.
        args: Vec<Operand>,
    },

    /// A structural declaration (`initialize`, `barrier`) that never
    /// affects simulation state.
    NoOp {
        /// The declaration name.
        name: String,
    },
}

/// An immutable straight-line program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    qubit_count: u32,
    result_count: u32,
    profile: Profile,
    operations: Vec<Operation>,
}

impl Program {
    /// Assemble a program from already-validated parts.
    pub fn new(
        qubit_count: u32,
        result_count: u32,
        profile: Profile,
        operations: Vec<Operation>,
    ) -> Self {
        Self {
            qubit_count,
            result_count,
            profile,
            operations,
        }
    }

    /// Number of qubits the program declares.
    pub fn qubit_count(&self) -> u32 {
        self.qubit_count
    }

    /// Number of classical results the program declares.
    pub fn result_count(&self) -> u32 {
        self.result_count
    }

    /// The declared profile.
    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Operations in execution order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }
}
