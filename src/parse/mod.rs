mod error;
mod grammar;
mod rewrite;

use std::collections::HashMap;

pub use error::ParseError;

use grammar::Lexeme;
use rewrite::{Lexed, Spanned};

use crate::{EvaluationOptions, Paren, Token};

/// Maps the role names used in `{{role}}` placeholders to the opaque
/// identifiers handed to the resolver.
pub type RoleMap = HashMap<String, String>;

/// Lex an expression into an infix token stream.
///
/// Placeholders are resolved through `roles`, identifiers must be function
/// calls (or `true` / `false`), and every comparison `a OP b` is rewritten to
/// the call `fn(a, b)`.
///
/// # Errors
///
/// Returns [`ParseError`] if the expression is empty or too long, contains a
/// character outside the whitelist, references an unknown role, has
/// unbalanced parentheses, or is otherwise not valid formula syntax. A
/// whitespace-only expression lexes to no tokens.
pub fn parse(
    expression: &str,
    roles: &RoleMap,
    options: &EvaluationOptions,
) -> Result<Vec<Token>, ParseError> {
    validate(expression, options)?;
    let lexed = tokenize(expression, roles)?;
    rewrite::rewrite_comparisons(lexed)
}

fn validate(expression: &str, options: &EvaluationOptions) -> Result<(), ParseError> {
    if expression.is_empty() {
        return Err(ParseError::Empty);
    }
    let length = expression.chars().count();
    if length > options.max_expression_length {
        return Err(ParseError::TooLong {
            length,
            max: options.max_expression_length,
        });
    }
    match expression
        .char_indices()
        .find(|&(_, c)| !options.is_allowed(c))
    {
        Some((offset, ch)) => Err(ParseError::IllegalCharacter { ch, offset }),
        None => Ok(()),
    }
}

fn tokenize(expression: &str, roles: &RoleMap) -> Result<Vec<Spanned>, ParseError> {
    let mut rest = expression;
    let mut out = Vec::new();
    let mut depth = 0_usize;

    loop {
        // ws never fails: it matches zero or more characters
        let _ = grammar::ws(&mut rest);
        if rest.is_empty() {
            break;
        }
        let offset = expression.len() - rest.len();
        let lexeme =
            grammar::lexeme(&mut rest).map_err(|_| unexpected(&expression[offset..], offset))?;

        let item = match lexeme {
            Lexeme::Placeholder(inner) => {
                let role = inner.trim();
                let identifier = roles.get(role).ok_or_else(|| ParseError::UnknownRole {
                    role: role.to_owned(),
                })?;
                Lexed::Token(Token::variable(identifier.as_str()))
            }
            Lexeme::Number(text) => {
                let value: f64 = text.parse().map_err(|_| ParseError::MalformedNumber {
                    text: text.to_owned(),
                    offset,
                })?;
                Lexed::Token(Token::Number(value))
            }
            Lexeme::Ident(name) => Lexed::Token(identifier_token(name, rest, offset)?),
            Lexeme::Operator(op) => Lexed::Token(Token::Operator(op)),
            Lexeme::Compare(op) => Lexed::Compare(op),
            Lexeme::Open => {
                depth += 1;
                Lexed::Token(Token::Paren(Paren::Open))
            }
            Lexeme::Close => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(ParseError::UnbalancedParentheses { offset })?;
                Lexed::Token(Token::Paren(Paren::Close))
            }
            Lexeme::Comma => Lexed::Token(Token::Comma),
        };
        out.push(Spanned { item, offset });
    }

    if depth != 0 {
        return Err(ParseError::UnbalancedParentheses {
            offset: expression.len(),
        });
    }
    Ok(out)
}

fn identifier_token(name: &str, rest: &str, offset: usize) -> Result<Token, ParseError> {
    let lower = name.to_ascii_lowercase();
    match lower.as_str() {
        "true" => Ok(Token::Number(1.0)),
        "false" => Ok(Token::Number(0.0)),
        _ if grammar::opens_call(rest) => Ok(Token::function(lower)),
        _ => Err(ParseError::BareIdentifier {
            ident: name.to_owned(),
            offset,
        }),
    }
}

fn unexpected(rest: &str, offset: usize) -> ParseError {
    if rest.starts_with("{{") {
        return ParseError::UnterminatedPlaceholder { offset };
    }
    match rest.chars().next() {
        Some(ch) => ParseError::UnexpectedCharacter { ch, offset },
        None => ParseError::UnterminatedPlaceholder { offset },
    }
}
