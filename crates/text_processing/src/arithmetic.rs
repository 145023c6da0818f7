//! Safe arithmetic evaluation
//!
//! Messages like "what is 256+256" or "2*(128+64)" are answered directly. The
//! expression is parsed by a small recursive-descent parser over a closed
//! grammar; nothing is ever handed to a general-purpose interpreter.
//!
//! ```text
//! expr   := term   (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := ('+' | '-') factor | number | '(' expr ')'
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Nesting limit for parentheses and unary signs
const MAX_DEPTH: usize = 64;

static QUESTION_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:what\s+is|what's|whats|calculate|calc|compute|was\s+ist|was\s+gibt|berechne|rechne)\s*:?\s*")
        .expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("Not an arithmetic expression")]
    NotArithmetic,

    #[error("Malformed expression at position {0}")]
    Malformed(usize),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Expression nested too deeply")]
    TooDeep,

    #[error("Result is not a finite number")]
    NonFinite,
}

/// Evaluate a chat message as arithmetic, if it is one
///
/// Returns `None` when the text is not an expression, is malformed, divides by
/// zero or produces a non-finite value.
pub fn try_evaluate(text: &str) -> Option<f64> {
    match evaluate(text) {
        Ok(value) => Some(value),
        Err(EvalError::NotArithmetic) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Arithmetic candidate rejected");
            None
        }
    }
}

/// Evaluate a chat message, reporting why it was rejected
pub fn evaluate(text: &str) -> Result<f64, EvalError> {
    let candidate = extract_candidate(text).ok_or(EvalError::NotArithmetic)?;
    evaluate_expression(&candidate)
}

/// Strip a question prefix and trailing "?" / "=" and check the character set
fn extract_candidate(text: &str) -> Option<String> {
    let stripped = QUESTION_PREFIX.replace(text, "");
    let candidate = stripped
        .trim()
        .trim_end_matches(|c: char| c == '?' || c == '=' || c.is_whitespace());

    if candidate.is_empty() {
        return None;
    }
    let allowed = candidate
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_whitespace() || "+-*/().,".contains(c));
    let has_operator = candidate.chars().any(|c| "+-*/".contains(c));
    let has_digit = candidate.chars().any(|c| c.is_ascii_digit());

    (allowed && has_operator && has_digit).then(|| candidate.to_string())
}

/// Evaluate a bare expression over the closed grammar
pub fn evaluate_expression(expr: &str) -> Result<f64, EvalError> {
    let tokens = lex(expr)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if parser.pos != tokens.len() {
        return Err(EvalError::Malformed(parser.pos));
    }
    if !value.is_finite() {
        return Err(EvalError::NonFinite);
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn lex(expr: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '+' => tokens.push(Token::Plus),
            '-' => tokens.push(Token::Minus),
            '*' => tokens.push(Token::Star),
            '/' => tokens.push(Token::Slash),
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            c if c.is_ascii_digit() || c == '.' || c == ',' => {
                let start = i;
                let mut literal = String::new();
                let mut seen_separator = false;
                while i < chars.len() {
                    let d = chars[i];
                    if d.is_ascii_digit() {
                        literal.push(d);
                    } else if (d == '.' || d == ',') && !seen_separator {
                        // decimal comma is read as a decimal point
                        seen_separator = true;
                        literal.push('.');
                    } else {
                        break;
                    }
                    i += 1;
                }
                if !literal.chars().any(|d| d.is_ascii_digit()) {
                    return Err(EvalError::Malformed(start));
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| EvalError::Malformed(start))?;
                tokens.push(Token::Number(value));
                continue;
            }
            _ => return Err(EvalError::Malformed(i)),
        }
        i += 1;
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.factor()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            value = if op == Token::Star {
                value * rhs
            } else {
                if rhs == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                value / rhs
            };
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        let result = self.factor_inner();
        self.depth -= 1;
        result
    }

    fn factor_inner(&mut self) -> Result<f64, EvalError> {
        let at = self.pos;
        match self.advance() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Minus) => Ok(-self.factor()?),
            Some(Token::Plus) => self.factor(),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(EvalError::Malformed(self.pos)),
                }
            }
            _ => Err(EvalError::Malformed(at)),
        }
    }
}

/// Render a result without trailing zeros ("512", "0.5", "-2.25")
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let fixed = format!("{:.10}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
