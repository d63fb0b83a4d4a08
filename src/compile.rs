use crate::{BinaryOp, CompileError, Paren, Token};

enum Pending {
    Operator(BinaryOp),
    Function(String),
    /// An opening parenthesis; `call` is set when it starts an argument list.
    Open { call: bool },
}

/// Argument bookkeeping for one function call being compiled.
struct CallFrame {
    args: usize,
    empty: bool,
}

/// Shunting-yard transform from an infix token stream to a postfix program.
///
/// The output only holds `Number`, `Variable`, `Operator` and `Function`
/// tokens, each function carrying the number of arguments it was called with.
///
/// # Errors
///
/// Returns [`CompileError`] if parentheses do not match, a comma appears
/// outside an argument list, or a function name is not followed by `(`.
pub fn compile(tokens: &[Token]) -> Result<Vec<Token>, CompileError> {
    let mut output: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Pending> = Vec::new();
    let mut calls: Vec<CallFrame> = Vec::new();
    let mut prev: Option<&Token> = None;

    for token in tokens {
        if let Some(Token::Function { name, .. }) = prev {
            if *token != Token::Paren(Paren::Open) {
                return Err(CompileError::DanglingFunction { name: name.clone() });
            }
        }
        if let Some(frame) = calls.last_mut() {
            if *token != Token::Paren(Paren::Close) {
                frame.empty = false;
            }
        }

        match token {
            Token::Number(_) | Token::Variable(_) => output.push(token.clone()),
            Token::Function { name, .. } => stack.push(Pending::Function(name.clone())),
            Token::Operator(op) => {
                while let Some(Pending::Operator(top)) = stack.last() {
                    let pops = if op.is_right_associative() {
                        op.precedence() < top.precedence()
                    } else {
                        op.precedence() <= top.precedence()
                    };
                    if !pops {
                        break;
                    }
                    output.push(Token::Operator(*top));
                    stack.pop();
                }
                stack.push(Pending::Operator(*op));
            }
            Token::Paren(Paren::Open) => {
                let call = matches!(prev, Some(Token::Function { .. }));
                if call {
                    calls.push(CallFrame {
                        args: 1,
                        empty: true,
                    });
                }
                stack.push(Pending::Open { call });
            }
            Token::Paren(Paren::Close) => {
                let call = flush_to_open(&mut stack, &mut output)?;
                stack.pop();
                if call {
                    let frame = calls.pop().ok_or(CompileError::UnbalancedParentheses)?;
                    let arity = if frame.empty { 0 } else { frame.args };
                    match stack.pop() {
                        Some(Pending::Function(name)) => output.push(Token::call(name, arity)),
                        _ => return Err(CompileError::UnbalancedParentheses),
                    }
                }
            }
            Token::Comma => {
                let call = flush_to_open(&mut stack, &mut output)
                    .map_err(|_| CompileError::MisplacedComma)?;
                if !call {
                    return Err(CompileError::MisplacedComma);
                }
                if let Some(frame) = calls.last_mut() {
                    frame.args += 1;
                }
            }
        }
        prev = Some(token);
    }

    if let Some(Token::Function { name, .. }) = prev {
        return Err(CompileError::DanglingFunction { name: name.clone() });
    }

    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Operator(op) => output.push(Token::Operator(op)),
            Pending::Open { .. } => return Err(CompileError::UnbalancedParentheses),
            Pending::Function(name) => return Err(CompileError::DanglingFunction { name }),
        }
    }

    Ok(output)
}

/// Move operators to the output until the nearest open parenthesis, which is
/// left on the stack. Returns whether that parenthesis starts a call.
fn flush_to_open(stack: &mut Vec<Pending>, output: &mut Vec<Token>) -> Result<bool, CompileError> {
    loop {
        match stack.last() {
            Some(Pending::Open { call }) => return Ok(*call),
            Some(Pending::Operator(op)) => {
                output.push(Token::Operator(*op));
                stack.pop();
            }
            Some(Pending::Function(_)) | None => return Err(CompileError::UnbalancedParentheses),
        }
    }
}
