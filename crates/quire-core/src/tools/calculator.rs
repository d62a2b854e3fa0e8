//! Arithmetic over `+ - * /`, parentheses, and decimals.

use std::iter::Peekable;
use std::str::Chars;

pub const CALCULATION_ERROR: &str = "Calculation error.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalcError {
    #[error("empty expression")]
    Empty,
    #[error("division by zero")]
    DivisionByZero,
    #[error("unexpected {0:?}")]
    Unexpected(char),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
}

/// Evaluate `expression` and render the result, or [`CALCULATION_ERROR`].
///
/// Characters other than digits, operators, parentheses, dots and spaces are
/// dropped first; `x` and `X` mean multiplication.
#[must_use]
pub fn calculate(expression: &str) -> String {
    match evaluate(&sanitize(expression)) {
        Ok(value) => format_number(value),
        Err(e) => {
            tracing::debug!(expression, "calculation failed: {e}");
            CALCULATION_ERROR.to_owned()
        }
    }
}

#[must_use]
pub fn sanitize(expression: &str) -> String {
    expression
        .chars()
        .filter_map(|c| match c {
            'x' | 'X' => Some('*'),
            '0'..='9' | '+' | '-' | '*' | '/' | '(' | ')' | '.' | ' ' => Some(c),
            _ => None,
        })
        .collect()
}

/// # Errors
///
/// Returns [`CalcError`] for empty or malformed input and division by zero.
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let mut parser = Parser {
        chars: expression.chars().peekable(),
    };
    parser.skip_spaces();
    if parser.chars.peek().is_none() {
        return Err(CalcError::Empty);
    }
    let value = parser.expr()?;
    parser.skip_spaces();
    match parser.chars.next() {
        None => Ok(value),
        Some(c) => Err(CalcError::Unexpected(c)),
    }
}

#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl Parser<'_> {
    fn skip_spaces(&mut self) {
        while self.chars.next_if_eq(&' ').is_some() {}
    }

    fn peek_op(&mut self) -> Option<char> {
        self.skip_spaces();
        self.chars.peek().copied()
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek_op() {
            self.chars.next();
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    // term := factor (('*' | '/') factor)*
    #[allow(clippy::float_cmp)]
    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.factor()?;
        while let Some(op @ ('*' | '/')) = self.peek_op() {
            self.chars.next();
            let rhs = self.factor()?;
            if op == '*' {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    // factor := '-' factor | '+' factor | '(' expr ')' | number
    fn factor(&mut self) -> Result<f64, CalcError> {
        match self.peek_op() {
            Some('-') => {
                self.chars.next();
                Ok(-self.factor()?)
            }
            Some('+') => {
                self.chars.next();
                self.factor()
            }
            Some('(') => {
                self.chars.next();
                let value = self.expr()?;
                match self.peek_op() {
                    Some(')') => {
                        self.chars.next();
                        Ok(value)
                    }
                    Some(c) => Err(CalcError::Unexpected(c)),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(CalcError::Unexpected(c)),
            None => Err(CalcError::UnexpectedEnd),
        }
    }

    fn number(&mut self) -> Result<f64, CalcError> {
        let mut literal = String::new();
        while let Some(c) = self.chars.next_if(|c| c.is_ascii_digit() || *c == '.') {
            literal.push(c);
        }
        literal
            .parse::<f64>()
            .map_err(|_| CalcError::InvalidNumber(literal))
    }
}
