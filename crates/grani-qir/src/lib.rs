//! Base-profile QIR program parser.
//!
//! This crate turns the textual form of a compiled base-profile QIR
//! module into an immutable [`Program`]: an ordered operation list plus
//! the declared qubit/result counts and profile tag. It accepts exactly
//! one metadata attribute group and exactly one straight-line entry
//! block; branching or multi-block programs are rejected.
//!
//! Unknown instruction names are *not* parse errors — they are kept as
//! [`Operation::Gate`] entries and only fail when an execution engine
//! cannot resolve them against its configuration.
//!
//! # Example
//!
//! ```rust
//! let source = r#"
//! define void @main() #0 {
//! entry:
//!   call void @__quantum__qis__h__body(%Qubit* inttoptr (i64 0 to %Qubit*))
//!   call void @__quantum__qis__mz__body(%Qubit* inttoptr (i64 0 to %Qubit*), %Result* inttoptr (i64 0 to %Result*))
//!   call void @__quantum__rt__result_record_output(%Result* inttoptr (i64 0 to %Result*), i8* null)
//!   ret void
//! }
//! attributes #0 = { "entry_point" "qir_profiles"="base_profile" "required_num_qubits"="1" "required_num_results"="1" }
//! "#;
//!
//! let program = grani_qir::parse(source).unwrap();
//! assert_eq!(program.qubit_count(), 1);
//! assert_eq!(program.operations().len(), 3);
//! ```

pub mod error;
mod lexer;
pub mod parser;
pub mod program;

pub use error::{ParseError, ParseResult};
pub use parser::parse;
pub use program::{Operand, Operation, Profile, Program, RecordKind};
