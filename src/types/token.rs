use std::fmt;

/// Binary arithmetic operators. Comparison operators never reach this type:
/// the lexer rewrites them into function calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Comparison operators recognized by the lexer before the rewrite pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Neq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Paren {
    Open,
    Close,
}

/// A single lexical unit of a formula.
///
/// Infix streams produced by [`parse`](crate::parse) may contain every variant.
/// Postfix programs produced by [`compile`](crate::compile) only contain
/// `Number`, `Variable`, `Operator` and `Function` with a resolved arity.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    /// Opaque external identifier handed to the resolver, not the role name.
    Variable(String),
    Operator(BinaryOp),
    Paren(Paren),
    Comma,
    /// Lower-cased function name. `arity` stays `None` until compilation.
    Function { name: String, arity: Option<usize> },
}

impl BinaryOp {
    pub(crate) fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(BinaryOp::Add),
            '-' => Some(BinaryOp::Sub),
            '*' => Some(BinaryOp::Mul),
            '/' => Some(BinaryOp::Div),
            '^' => Some(BinaryOp::Pow),
            _ => None,
        }
    }

    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
            BinaryOp::Pow => '^',
        }
    }

    /// Binding strength: `^` = 3, `* /` = 2, `+ -` = 1.
    #[must_use]
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
            BinaryOp::Pow => 3,
        }
    }

    #[must_use]
    pub fn is_right_associative(self) -> bool {
        matches!(self, BinaryOp::Pow)
    }
}

impl CompareOp {
    /// Name of the built-in function a comparison is rewritten into.
    #[must_use]
    pub fn function_name(self) -> &'static str {
        match self {
            CompareOp::Gt => "gt",
            CompareOp::Gte => "gte",
            CompareOp::Lt => "lt",
            CompareOp::Lte => "lte",
            CompareOp::Eq => "eq",
            CompareOp::Neq => "neq",
        }
    }
}

impl Token {
    #[must_use]
    pub fn number(value: f64) -> Self {
        Token::Number(value)
    }

    #[must_use]
    pub fn variable(identifier: impl Into<String>) -> Self {
        Token::Variable(identifier.into())
    }

    /// A function token whose arity is not yet known.
    #[must_use]
    pub fn function(name: impl Into<String>) -> Self {
        Token::Function {
            name: name.into(),
            arity: None,
        }
    }

    /// A function token carrying a resolved arity, as found in postfix programs.
    #[must_use]
    pub fn call(name: impl Into<String>, arity: usize) -> Self {
        Token::Function {
            name: name.into(),
            arity: Some(arity),
        }
    }

    /// Whether this token can appear in a compiled postfix program.
    #[must_use]
    pub fn is_postfix(&self) -> bool {
        match self {
            Token::Number(_) | Token::Variable(_) | Token::Operator(_) => true,
            Token::Function { arity, .. } => arity.is_some(),
            Token::Paren(_) | Token::Comma => false,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Neq => write!(f, "!="),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(v) => write!(f, "{v}"),
            Token::Variable(id) => write!(f, "${id}"),
            Token::Operator(op) => write!(f, "{op}"),
            Token::Paren(Paren::Open) => write!(f, "("),
            Token::Paren(Paren::Close) => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Function {
                name,
                arity: Some(n),
            } => write!(f, "{name}/{n}"),
            Token::Function { name, arity: None } => write!(f, "{name}"),
        }
    }
}
