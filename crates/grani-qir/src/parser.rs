//! Parser for base-profile QIR programs.
//!
//! The accepted input is the textual form of a compiled base-profile
//! module: one attribute group carrying the profile and the qubit and
//! result counts, and one entry-point function whose body is a single
//! straight-line block of `call void @__quantum__...` instructions
//! terminated by `ret`. Anything with branches, loops, or additional
//! blocks is rejected.

use crate::error::{ParseError, ParseResult};
use crate::lexer::{tokenize, Token};
use crate::program::{Operand, Operation, Profile, Program, RecordKind};

/// The only profile this parser accepts.
const SUPPORTED_PROFILE: &str = "base_profile";

/// Names that are structural declarations rather than operations.
const NO_OP_NAMES: [&str; 2] = ["initialize", "barrier"];

/// Parse a QIR module into a [`Program`].
pub fn parse(source: &str) -> ParseResult<Program> {
    let (profile, qubit_count, result_count) = parse_metadata(source)?;
    let body = extract_entry_block(source)?;

    let mut operations = Vec::new();
    for line in body {
        let call = parse_call_line(line)?;
        operations.push(classify(call, qubit_count, result_count)?);
    }

    Ok(Program::new(qubit_count, result_count, profile, operations))
}

/// Extract profile and counts from the `attributes #0` group.
///
/// An absent group, or counts that fail to parse, are reported as
/// missing metadata; an unexpected profile string is its own error so
/// callers can distinguish "not QIR" from "QIR we do not support".
fn parse_metadata(source: &str) -> ParseResult<(Profile, u32, u32)> {
    let line = source
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with("attributes #0"))
        .ok_or(ParseError::MissingMetadata)?;

    let profile = attribute_value(line, "qir_profiles").ok_or(ParseError::MissingMetadata)?;
    let qubits = attribute_value(line, "required_num_qubits").ok_or(ParseError::MissingMetadata)?;
    let results =
        attribute_value(line, "required_num_results").ok_or(ParseError::MissingMetadata)?;

    if profile != SUPPORTED_PROFILE {
        return Err(ParseError::UnsupportedProfile(profile.to_owned()));
    }

    let qubit_count = qubits.parse().map_err(|_| ParseError::MissingMetadata)?;
    let result_count = results.parse().map_err(|_| ParseError::MissingMetadata)?;

    Ok((Profile::Base, qubit_count, result_count))
}

/// Look up `"key"="value"` inside an attribute group line.
fn attribute_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let marker = format!("\"{key}\"=\"");
    let start = line.find(&marker)? + marker.len();
    let end = line[start..].find('"')?;
    Some(&line[start..start + end])
}

/// Collect the instruction lines of the single entry block.
///
/// The entry point is the function definition tagged with the `#0`
/// attribute group. The block runs from an optional leading label to
/// the `ret` terminator; `br`/`switch` instructions, extra labels, or
/// a second entry definition are control flow and rejected.
fn extract_entry_block(source: &str) -> ParseResult<Vec<&str>> {
    let mut lines = source.lines().map(str::trim);

    // Find the entry-point definition.
    loop {
        match lines.next() {
            Some(l) if l.starts_with("define ") && l.contains("#0") && l.ends_with('{') => break,
            Some(_) => continue,
            None => return Err(ParseError::MissingMetadata),
        }
    }

    let mut body = Vec::new();
    let mut seen_label = false;
    let mut terminated = false;

    for line in lines.by_ref() {
        if line.is_empty() {
            continue;
        }
        if line == "}" {
            if !terminated {
                return Err(ParseError::MalformedInstruction(
                    "entry block has no ret terminator".into(),
                ));
            }
            break;
        }
        if terminated {
            // Anything between `ret` and `}` means a second basic block.
            return Err(ParseError::UnsupportedControlFlow(
                "entry point contains more than one block".into(),
            ));
        }
        if is_block_label(line) {
            if seen_label || !body.is_empty() {
                return Err(ParseError::UnsupportedControlFlow(
                    "entry point contains more than one block".into(),
                ));
            }
            seen_label = true;
            continue;
        }
        if line.starts_with("br ") || line.starts_with("br\t") || line.starts_with("switch ") {
            let word = line.split_whitespace().next().unwrap_or("branch");
            return Err(ParseError::UnsupportedControlFlow(format!(
                "'{word}' instruction in entry point"
            )));
        }
        if line.starts_with("ret ") || line == "ret" {
            terminated = true;
            continue;
        }
        body.push(line);
    }

    if !terminated {
        return Err(ParseError::MalformedInstruction(
            "entry block has no ret terminator".into(),
        ));
    }

    // A second #0-tagged definition is a second instruction block.
    for line in lines {
        if line.starts_with("define ") && line.contains("#0") {
            return Err(ParseError::UnsupportedControlFlow(
                "program declares more than one entry block".into(),
            ));
        }
    }

    Ok(body)
}

/// True for LLVM basic-block labels such as `entry:` or `block_0:`.
fn is_block_label(line: &str) -> bool {
    line.strip_suffix(':').is_some_and(|name| {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    })
}

/// A call instruction before classification.
struct Call {
    /// `qis` or `rt`.
    namespace: String,
    /// The operation name with `__quantum__<ns>__`/`__body` stripped.
    name: String,
    operands: Vec<Operand>,
}

/// Parse one `call void @__quantum__...(...)` line.
fn parse_call_line(line: &str) -> ParseResult<Call> {
    let malformed = || ParseError::MalformedInstruction(line.to_owned());
    let tokens = tokenize(line).ok_or_else(malformed)?;
    let mut pos = 0;

    expect(&tokens, &mut pos, &Token::Call).ok_or_else(malformed)?;
    expect(&tokens, &mut pos, &Token::Void).ok_or_else(malformed)?;

    let symbol = match tokens.get(pos) {
        Some(Token::Symbol(s)) => s.clone(),
        _ => return Err(malformed()),
    };
    pos += 1;

    let (namespace, mut name) = symbol
        .strip_prefix("@__quantum__")
        .and_then(|rest| rest.split_once("__"))
        .map(|(ns, name)| (ns.to_owned(), name.to_owned()))
        .ok_or_else(malformed)?;
    if namespace != "qis" && namespace != "rt" {
        return Err(malformed());
    }
    if let Some(stripped) = name.strip_suffix("__body") {
        name = stripped.to_owned();
    }

    expect(&tokens, &mut pos, &Token::LParen).ok_or_else(malformed)?;

    let mut operands = Vec::new();
    if !matches!(tokens.get(pos), Some(Token::RParen)) {
        loop {
            operands.push(parse_operand(&tokens, &mut pos).ok_or_else(malformed)?);
            match tokens.get(pos) {
                Some(Token::Comma) => pos += 1,
                Some(Token::RParen) => break,
                _ => return Err(malformed()),
            }
        }
    }
    expect(&tokens, &mut pos, &Token::RParen).ok_or_else(malformed)?;

    if pos != tokens.len() {
        return Err(malformed());
    }

    Ok(Call {
        namespace,
        name,
        operands,
    })
}

/// Consume one token if it matches.
fn expect(tokens: &[Token], pos: &mut usize, expected: &Token) -> Option<()> {
    if tokens.get(*pos) == Some(expected) {
        *pos += 1;
        Some(())
    } else {
        None
    }
}

/// Parse one operand at the cursor.
fn parse_operand(tokens: &[Token], pos: &mut usize) -> Option<Operand> {
    match tokens.get(*pos)? {
        ptr @ (Token::QubitPtr | Token::ResultPtr) => {
            let ptr = ptr.clone();
            *pos += 1;
            expect(tokens, pos, &Token::IntToPtr)?;
            expect(tokens, pos, &Token::LParen)?;
            expect(tokens, pos, &Token::I64)?;
            let id = match tokens.get(*pos)? {
                Token::IntLiteral(n) if *n >= 0 => u32::try_from(*n).ok()?,
                _ => return None,
            };
            *pos += 1;
            expect(tokens, pos, &Token::To)?;
            expect(tokens, pos, &ptr)?;
            expect(tokens, pos, &Token::RParen)?;
            Some(if ptr == Token::QubitPtr {
                Operand::Qubit(id)
            } else {
                Operand::Result(id)
            })
        }
        Token::Double => {
            *pos += 1;
            let value = match tokens.get(*pos)? {
                Token::FloatLiteral(v) => *v,
                #[allow(clippy::cast_precision_loss)]
                Token::IntLiteral(n) => *n as f64,
                _ => return None,
            };
            *pos += 1;
            Some(Operand::Double(value))
        }
        Token::I64 => {
            *pos += 1;
            let value = match tokens.get(*pos)? {
                Token::IntLiteral(n) => *n,
                _ => return None,
            };
            *pos += 1;
            Some(Operand::Int(value))
        }
        Token::I8Ptr => {
            *pos += 1;
            expect(tokens, pos, &Token::Null)?;
            Some(Operand::Null)
        }
        _ => None,
    }
}

/// Turn a parsed call into an [`Operation`], range-checking qubit and
/// result operands against the declared counts.
fn classify(call: Call, qubit_count: u32, result_count: u32) -> ParseResult<Operation> {
    for operand in &call.operands {
        match *operand {
            Operand::Qubit(index) if index >= qubit_count => {
                return Err(ParseError::OperandOutOfRange {
                    space: "qubit",
                    index,
                    count: qubit_count,
                });
            }
            Operand::Result(index) if index >= result_count => {
                return Err(ParseError::OperandOutOfRange {
                    space: "result",
                    index,
                    count: result_count,
                });
            }
            _ => {}
        }
    }

    if NO_OP_NAMES.contains(&call.name.as_str()) {
        return Ok(Operation::NoOp { name: call.name });
    }

    if call.namespace == "rt" {
        let kind = match call.name.as_str() {
            "array_record_output" => RecordKind::Array,
            "result_record_output" => RecordKind::Result,
            // Unknown runtime calls are late-bound, like unknown gates.
            _ => {
                return Ok(Operation::Gate {
                    name: call.name,
                    args: Vec::new(),
                    qubits: Vec::new(),
                })
            }
        };
        if kind == RecordKind::Result && !matches!(call.operands.first(), Some(Operand::Result(_)))
        {
            return Err(ParseError::MalformedInstruction(format!(
                "result_record_output expects a result operand, got {:?}",
                call.operands
            )));
        }
        return Ok(Operation::OutputMarker {
            kind,
            args: call.operands,
        });
    }

    if let Some(instrument) = measurement_name(&call.name) {
        return match call.operands.as_slice() {
            [Operand::Qubit(qubit), Operand::Result(result)] => Ok(Operation::Measurement {
                name: instrument.to_owned(),
                qubit: *qubit,
                result: *result,
            }),
            _ => Err(ParseError::MalformedInstruction(format!(
                "measurement '{}' expects one qubit and one result operand",
                call.name
            ))),
        };
    }

    let mut args = Vec::new();
    let mut qubits = Vec::new();
    for operand in call.operands {
        match operand {
            Operand::Qubit(q) => qubits.push(q),
            Operand::Double(v) => args.push(v),
            #[allow(clippy::cast_precision_loss)]
            Operand::Int(n) => args.push(n as f64),
            Operand::Result(_) | Operand::Null => {
                return Err(ParseError::MalformedInstruction(format!(
                    "gate '{}' cannot take a result or null operand",
                    call.name
                )));
            }
        }
    }
    Ok(Operation::Gate {
        name: call.name,
        args,
        qubits,
    })
}

/// Measurement-family names, normalized to the instrument they invoke.
fn measurement_name(name: &str) -> Option<&'static str> {
    match name {
        "m" | "mz" => Some("mz"),
        "mresetz" => Some("mresetz"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BELL: &str = r#"
define void @main() #0 {
entry:
  call void @__quantum__rt__initialize(i8* null)
  call void @__quantum__qis__h__body(%Qubit* inttoptr (i64 0 to %Qubit*))
  call void @__quantum__qis__cx__body(%Qubit* inttoptr (i64 0 to %Qubit*), %Qubit* inttoptr (i64 1 to %Qubit*))
  call void @__quantum__qis__m__body(%Qubit* inttoptr (i64 0 to %Qubit*), %Result* inttoptr (i64 0 to %Result*))
  call void @__quantum__qis__m__body(%Qubit* inttoptr (i64 1 to %Qubit*), %Result* inttoptr (i64 1 to %Result*))
  call void @__quantum__rt__array_record_output(i64 2, i8* null)
  call void @__quantum__rt__result_record_output(%Result* inttoptr (i64 0 to %Result*), i8* null)
  call void @__quantum__rt__result_record_output(%Result* inttoptr (i64 1 to %Result*), i8* null)
  ret void
}

attributes #0 = { "entry_point" "output_labeling_schema" "qir_profiles"="base_profile" "required_num_qubits"="2" "required_num_results"="2" }
"#;

    #[test]
    fn test_parse_bell() {
        let program = parse(BELL).unwrap();
        assert_eq!(program.qubit_count(), 2);
        assert_eq!(program.result_count(), 2);
        assert_eq!(program.profile(), Profile::Base);
        assert_eq!(program.profile().to_string(), "base_profile");
        assert_eq!(program.operations().len(), 8);

        assert_eq!(
            program.operations()[0],
            Operation::NoOp {
                name: "initialize".into()
            }
        );
        assert_eq!(
            program.operations()[1],
            Operation::Gate {
                name: "h".into(),
                args: vec![],
                qubits: vec![0],
            }
        );
        assert_eq!(
            program.operations()[2],
            Operation::Gate {
                name: "cx".into(),
                args: vec![],
                qubits: vec![0, 1],
            }
        );
        // 'm' is normalized to the 'mz' instrument.
        assert_eq!(
            program.operations()[3],
            Operation::Measurement {
                name: "mz".into(),
                qubit: 0,
                result: 0,
            }
        );
        assert!(matches!(
            program.operations()[5],
            Operation::OutputMarker {
                kind: RecordKind::Array,
                ..
            }
        ));
        assert_eq!(
            program.operations()[6],
            Operation::OutputMarker {
                kind: RecordKind::Result,
                args: vec![Operand::Result(0), Operand::Null],
            }
        );
    }

    #[test]
    fn test_rotation_angle() {
        let source = r#"
define void @main() #0 {
  call void @__quantum__qis__rz__body(double 5.000000e-01, %Qubit* inttoptr (i64 0 to %Qubit*))
  ret void
}
attributes #0 = { "qir_profiles"="base_profile" "required_num_qubits"="1" "required_num_results"="0" }
"#;
        let program = parse(source).unwrap();
        assert_eq!(
            program.operations()[0],
            Operation::Gate {
                name: "rz".into(),
                args: vec![0.5],
                qubits: vec![0],
            }
        );
    }

    #[test]
    fn test_missing_attributes() {
        let source = "define void @main() #0 {\n  ret void\n}\n";
        assert!(matches!(parse(source), Err(ParseError::MissingMetadata)));
    }

    #[test]
    fn test_unsupported_profile() {
        let source = r#"
define void @main() #0 {
  ret void
}
attributes #0 = { "qir_profiles"="adaptive_profile" "required_num_qubits"="1" "required_num_results"="1" }
"#;
        assert!(matches!(
            parse(source),
            Err(ParseError::UnsupportedProfile(p)) if p == "adaptive_profile"
        ));
    }

    #[test]
    fn test_branch_rejected() {
        let source = r#"
define void @main() #0 {
entry:
  br label %next
next:
  ret void
}
attributes #0 = { "qir_profiles"="base_profile" "required_num_qubits"="1" "required_num_results"="1" }
"#;
        assert!(matches!(
            parse(source),
            Err(ParseError::UnsupportedControlFlow(_))
        ));
    }

    #[test]
    fn test_second_block_rejected() {
        let source = r#"
define void @main() #0 {
entry:
  call void @__quantum__qis__h__body(%Qubit* inttoptr (i64 0 to %Qubit*))
  ret void
again:
  ret void
}
attributes #0 = { "qir_profiles"="base_profile" "required_num_qubits"="1" "required_num_results"="1" }
"#;
        assert!(matches!(
            parse(source),
            Err(ParseError::UnsupportedControlFlow(_))
        ));
    }

    #[test]
    fn test_qubit_out_of_range() {
        let source = r#"
define void @main() #0 {
  call void @__quantum__qis__h__body(%Qubit* inttoptr (i64 3 to %Qubit*))
  ret void
}
attributes #0 = { "qir_profiles"="base_profile" "required_num_qubits"="2" "required_num_results"="0" }
"#;
        assert!(matches!(
            parse(source),
            Err(ParseError::OperandOutOfRange {
                space: "qubit",
                index: 3,
                count: 2,
            })
        ));
    }

    #[test]
    fn test_unknown_gate_is_preserved() {
        let source = r#"
define void @main() #0 {
  call void @__quantum__qis__frobnicate__body(%Qubit* inttoptr (i64 0 to %Qubit*))
  ret void
}
attributes #0 = { "qir_profiles"="base_profile" "required_num_qubits"="1" "required_num_results"="0" }
"#;
        let program = parse(source).unwrap();
        assert_eq!(
            program.operations()[0],
            Operation::Gate {
                name: "frobnicate".into(),
                args: vec![],
                qubits: vec![0],
            }
        );
    }

    #[test]
    fn test_garbage_line_rejected() {
        let source = r#"
define void @main() #0 {
  %0 = add i64 1, 2
  ret void
}
attributes #0 = { "qir_profiles"="base_profile" "required_num_qubits"="1" "required_num_results"="0" }
"#;
        assert!(matches!(
            parse(source),
            Err(ParseError::MalformedInstruction(_))
        ));
    }
}
