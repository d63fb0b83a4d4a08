use winnow::combinator::{alt, delimited};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{one_of, take_until, take_while};

use crate::{BinaryOp, CompareOp};

/// One raw lexical unit, before placeholder resolution and number parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Lexeme<'i> {
    Number(&'i str),
    Ident(&'i str),
    /// Untrimmed text between `{{` and `}}`.
    Placeholder(&'i str),
    Operator(BinaryOp),
    Compare(CompareOp),
    Open,
    Close,
    Comma,
}

// -- Whitespace -------------------------------------------------------------

pub(super) fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., char::is_whitespace)
        .void()
        .parse_next(input)
}

// -- Literals & names -------------------------------------------------------

fn number<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        one_of(|c: char| c.is_ascii_digit()),
        take_while(0.., |c: char| c.is_ascii_digit() || c == '.'),
    )
        .take()
        .parse_next(input)
}

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

fn placeholder<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    delimited("{{", take_until(0.., "}}"), "}}").parse_next(input)
}

// -- Operators --------------------------------------------------------------

fn compare_op(input: &mut &str) -> ModalResult<CompareOp> {
    alt((
        ">=".value(CompareOp::Gte),
        "<=".value(CompareOp::Lte),
        "==".value(CompareOp::Eq),
        "!=".value(CompareOp::Neq),
        ">".value(CompareOp::Gt),
        "<".value(CompareOp::Lt),
    ))
    .parse_next(input)
}

fn binary_op(input: &mut &str) -> ModalResult<BinaryOp> {
    one_of(['+', '-', '*', '/', '^'])
        .verify_map(BinaryOp::from_char)
        .parse_next(input)
}

fn punct<'i>(input: &mut &'i str) -> ModalResult<Lexeme<'i>> {
    alt((
        '('.value(Lexeme::Open),
        ')'.value(Lexeme::Close),
        ','.value(Lexeme::Comma),
    ))
    .parse_next(input)
}

// -- Top level --------------------------------------------------------------

/// Recognize the next lexeme. Leading whitespace must already be consumed.
pub(super) fn lexeme<'i>(input: &mut &'i str) -> ModalResult<Lexeme<'i>> {
    alt((
        placeholder.map(Lexeme::Placeholder),
        number.map(Lexeme::Number),
        ident.map(Lexeme::Ident),
        compare_op.map(Lexeme::Compare),
        binary_op.map(Lexeme::Operator),
        punct,
    ))
    .parse_next(input)
}

/// Whether the remaining input starts an argument list (whitespace allowed).
pub(super) fn opens_call(rest: &str) -> bool {
    rest.trim_start().starts_with('(')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(mut input: &str) -> Vec<Lexeme<'_>> {
        let mut out = Vec::new();
        loop {
            ws(&mut input).unwrap();
            if input.is_empty() {
                return out;
            }
            out.push(lexeme(&mut input).unwrap());
        }
    }

    #[test]
    fn numbers_and_operators() {
        assert_eq!(
            lex_all("12.5 + 3*4"),
            vec![
                Lexeme::Number("12.5"),
                Lexeme::Operator(BinaryOp::Add),
                Lexeme::Number("3"),
                Lexeme::Operator(BinaryOp::Mul),
                Lexeme::Number("4"),
            ]
        );
    }

    #[test]
    fn two_char_comparisons_win() {
        assert_eq!(
            lex_all("1>=2 1<2 1==1 1!=2 1>0 1<=1"),
            vec![
                Lexeme::Number("1"),
                Lexeme::Compare(CompareOp::Gte),
                Lexeme::Number("2"),
                Lexeme::Number("1"),
                Lexeme::Compare(CompareOp::Lt),
                Lexeme::Number("2"),
                Lexeme::Number("1"),
                Lexeme::Compare(CompareOp::Eq),
                Lexeme::Number("1"),
                Lexeme::Number("1"),
                Lexeme::Compare(CompareOp::Neq),
                Lexeme::Number("2"),
                Lexeme::Number("1"),
                Lexeme::Compare(CompareOp::Gt),
                Lexeme::Number("0"),
                Lexeme::Number("1"),
                Lexeme::Compare(CompareOp::Lte),
                Lexeme::Number("1"),
            ]
        );
    }

    #[test]
    fn placeholder_keeps_inner_text() {
        assert_eq!(
            lex_all("{{ price }}*2"),
            vec![
                Lexeme::Placeholder(" price "),
                Lexeme::Operator(BinaryOp::Mul),
                Lexeme::Number("2"),
            ]
        );
    }

    #[test]
    fn identifiers_and_punctuation() {
        assert_eq!(
            lex_all("max_2(a,b)"),
            vec![
                Lexeme::Ident("max_2"),
                Lexeme::Open,
                Lexeme::Ident("a"),
                Lexeme::Comma,
                Lexeme::Ident("b"),
                Lexeme::Close,
            ]
        );
    }

    #[test]
    fn unterminated_placeholder_fails() {
        let mut input = "{{ price";
        assert!(lexeme(&mut input).is_err());
    }

    #[test]
    fn stray_characters_fail() {
        for s in ["=", "!", "{", "}", ":", "."] {
            let mut input = s;
            assert!(lexeme(&mut input).is_err(), "{s:?} should not lex");
        }
    }

    #[test]
    fn call_detection() {
        assert!(opens_call("(1)"));
        assert!(opens_call("   (1)"));
        assert!(!opens_call(" + 1"));
        assert!(!opens_call(""));
    }
}
