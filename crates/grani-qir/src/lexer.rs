//! Lexer for QIR call-instruction lines.
//!
//! Only the operand sublanguage of base-profile call instructions is
//! tokenized here; the surrounding module structure (attribute groups,
//! function definition, block labels) is line-oriented and handled by
//! the parser.

use logos::Logos;

/// Tokens for a base-profile QIR call instruction.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t]+")]
pub enum Token {
    #[token("call")]
    Call,

    #[token("void")]
    Void,

    #[token("inttoptr")]
    IntToPtr,

    #[token("to")]
    To,

    #[token("null")]
    Null,

    #[token("double")]
    Double,

    #[token("i64")]
    I64,

    #[token("i8*")]
    I8Ptr,

    #[token("%Qubit*")]
    QubitPtr,

    #[token("%Result*")]
    ResultPtr,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,

    /// A global symbol such as `@__quantum__qis__rz__body`.
    #[regex(r"@[A-Za-z_][A-Za-z0-9_.]*", |lex| lex.slice().to_owned())]
    Symbol(String),

    /// A floating-point literal, including scientific notation as LLVM
    /// prints it (e.g. `5.000000e-01`).
    #[regex(
        r"-?[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?",
        |lex| lex.slice().parse::<f64>().ok()
    )]
    FloatLiteral(f64),

    /// A signed integer literal.
    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok(), priority = 2)]
    IntLiteral(i64),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Call => write!(f, "call"),
            Token::Void => write!(f, "void"),
            Token::IntToPtr => write!(f, "inttoptr"),
            Token::To => write!(f, "to"),
            Token::Null => write!(f, "null"),
            Token::Double => write!(f, "double"),
            Token::I64 => write!(f, "i64"),
            Token::I8Ptr => write!(f, "i8*"),
            Token::QubitPtr => write!(f, "%Qubit*"),
            Token::ResultPtr => write!(f, "%Result*"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Symbol(s) => write!(f, "{s}"),
            Token::FloatLiteral(v) => write!(f, "{v}"),
            Token::IntLiteral(v) => write!(f, "{v}"),
        }
    }
}

/// Tokenize one call-instruction line. Returns `None` if the line
/// contains anything outside the call grammar.
pub fn tokenize(line: &str) -> Option<Vec<Token>> {
    let mut lexer = Token::lexer(line);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(token),
            Err(()) => return None,
        }
    }

    Some(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_call_tokens() {
        let line = "call void @__quantum__qis__sx__body(%Qubit* inttoptr (i64 0 to %Qubit*))";
        let tokens = tokenize(line).unwrap();

        assert_eq!(tokens[0], Token::Call);
        assert_eq!(tokens[1], Token::Void);
        assert!(matches!(tokens[2], Token::Symbol(ref s) if s == "@__quantum__qis__sx__body"));
        assert_eq!(tokens[3], Token::LParen);
        assert_eq!(tokens[4], Token::QubitPtr);
        assert_eq!(tokens[5], Token::IntToPtr);
        assert_eq!(tokens[6], Token::LParen);
        assert_eq!(tokens[7], Token::I64);
        assert!(matches!(tokens[8], Token::IntLiteral(0)));
        assert_eq!(tokens[9], Token::To);
        assert_eq!(tokens[10], Token::QubitPtr);
        assert_eq!(tokens[11], Token::RParen);
        assert_eq!(tokens[12], Token::RParen);
    }

    #[test]
    fn test_double_literal() {
        let tokens = tokenize("double 5.000000e-01").unwrap();
        assert_eq!(tokens[0], Token::Double);
        assert!(matches!(tokens[1], Token::FloatLiteral(v) if (v - 0.5).abs() < 1e-12));
    }

    #[test]
    fn test_negative_angle() {
        let tokens = tokenize("double -1.5707963267948966").unwrap();
        assert!(
            matches!(tokens[1], Token::FloatLiteral(v) if (v + std::f64::consts::FRAC_PI_2).abs() < 1e-12)
        );
    }

    #[test]
    fn test_null_argument() {
        let tokens = tokenize("i8* null").unwrap();
        assert_eq!(tokens, vec![Token::I8Ptr, Token::Null]);
    }

    #[test]
    fn test_rejects_foreign_syntax() {
        assert!(tokenize("store i64 0, i64* %p").is_none());
    }
}
