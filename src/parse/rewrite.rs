//! Comparison rewrite: `a OP b` becomes `fn ( a , b )`.
//!
//! Operands are single primaries: a number, a variable, a parenthesized
//! group, or a function call with its argument list. Comparisons bind tighter
//! than arithmetic, so `1 + 2 > 3` reads as `1 + gt(2, 3)`. A comparison whose
//! left operand is the result of another rewrite (`a < b < c`) is rejected.

use std::iter::Peekable;
use std::vec::IntoIter;

use super::ParseError;
use crate::{CompareOp, Paren, Token};

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Lexed {
    Token(Token),
    Compare(CompareOp),
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Spanned {
    pub(super) item: Lexed,
    pub(super) offset: usize,
}

/// Output under construction, for the whole expression or for the group on
/// the right of a pending comparison.
#[derive(Debug, Default)]
struct Frame {
    out: Vec<Token>,
    /// `out.len()` right after the latest rewrite.
    rewrite_end: Option<usize>,
    depth: usize,
}

impl Frame {
    fn emit(&mut self, op: CompareOp, left: Vec<Token>, right: Vec<Token>) {
        self.out.push(Token::function(op.function_name()));
        self.out.push(Token::Paren(Paren::Open));
        self.out.extend(left);
        self.out.push(Token::Comma);
        self.out.extend(right);
        self.out.push(Token::Paren(Paren::Close));
        self.rewrite_end = Some(self.out.len());
    }
}

/// A comparison whose right operand is a group that has not closed yet.
#[derive(Debug)]
struct Pending {
    op: CompareOp,
    offset: usize,
    left: Vec<Token>,
    right: Frame,
}

/// Rewrite every comparison in one pass. Groups on the right of a comparison
/// are tracked on an explicit stack, so nesting depth costs heap, not call
/// stack.
pub(super) fn rewrite_comparisons(items: Vec<Spanned>) -> Result<Vec<Token>, ParseError> {
    let mut root = Frame {
        out: Vec::with_capacity(items.len()),
        ..Frame::default()
    };
    let mut pending: Vec<Pending> = Vec::new();
    let mut iter = items.into_iter().peekable();

    while let Some(Spanned { item, offset }) = iter.next() {
        let frame = pending.last_mut().map_or(&mut root, |p| &mut p.right);

        let op = match item {
            Lexed::Token(token) => {
                let closes_group = match token {
                    Token::Paren(Paren::Open) => {
                        frame.depth += 1;
                        false
                    }
                    Token::Paren(Paren::Close) => {
                        frame.depth = frame.depth.saturating_sub(1);
                        frame.depth == 0
                    }
                    _ => false,
                };
                frame.out.push(token);
                if closes_group {
                    if let Some(done) = pending.pop() {
                        let target = pending.last_mut().map_or(&mut root, |p| &mut p.right);
                        target.emit(done.op, done.left, done.right.out);
                    }
                }
                continue;
            }
            Lexed::Compare(op) => op,
        };

        if frame.rewrite_end == Some(frame.out.len()) {
            return Err(ParseError::ChainedComparison { offset });
        }
        let malformed = ParseError::MalformedComparison { op, offset };
        let start = left_operand_start(&frame.out).ok_or_else(|| malformed.clone())?;
        let left = frame.out.split_off(start);

        let Some(Spanned {
            item: Lexed::Token(first),
            ..
        }) = iter.next()
        else {
            return Err(malformed);
        };
        match first {
            Token::Number(_) | Token::Variable(_) => frame.emit(op, left, vec![first]),
            Token::Paren(Paren::Open) => pending.push(Pending {
                op,
                offset,
                left,
                right: Frame {
                    out: vec![first],
                    rewrite_end: None,
                    depth: 1,
                },
            }),
            Token::Function { .. } if opens_group(&mut iter) => pending.push(Pending {
                op,
                offset,
                left,
                right: Frame {
                    out: vec![first],
                    ..Frame::default()
                },
            }),
            _ => return Err(malformed),
        }
    }

    match pending.pop() {
        Some(unclosed) => Err(ParseError::MalformedComparison {
            op: unclosed.op,
            offset: unclosed.offset,
        }),
        None => Ok(root.out),
    }
}

fn opens_group(iter: &mut Peekable<IntoIter<Spanned>>) -> bool {
    matches!(
        iter.peek(),
        Some(Spanned {
            item: Lexed::Token(Token::Paren(Paren::Open)),
            ..
        })
    )
}

/// Index where the primary ending at the tail of `out` begins.
fn left_operand_start(out: &[Token]) -> Option<usize> {
    match out.last()? {
        Token::Number(_) | Token::Variable(_) => Some(out.len() - 1),
        Token::Paren(Paren::Close) => {
            let mut depth = 0_usize;
            for (i, token) in out.iter().enumerate().rev() {
                match token {
                    Token::Paren(Paren::Close) => depth += 1,
                    Token::Paren(Paren::Open) => {
                        depth -= 1;
                        if depth == 0 {
                            let callee = i
                                .checked_sub(1)
                                .filter(|&j| matches!(out[j], Token::Function { .. }));
                            return Some(callee.unwrap_or(i));
                        }
                    }
                    _ => {}
                }
            }
            None
        }
        _ => None,
    }
}
