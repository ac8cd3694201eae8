//! Truth-table generator
//!
//! Expands a boolean interlocking expression over `Input1..InputN` into every
//! input combination. The input columns become raw test-step tokens and the
//! output column becomes the raw assessment row.

use crate::types::{FatError, RawCell, Result, TestMode};
use std::fmt;

/// Largest supported number of inputs
pub const MAX_INPUTS: usize = 10;

/// Deepest accepted nesting of parentheses and `not`
pub const MAX_NESTING: usize = 256;

/// Longest accepted expression, in tokens
pub const MAX_TOKENS: usize = 4096;

/// Parsed boolean expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Const(bool),
    /// Zero-based input index (`Input1` is 0)
    Input(usize),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Xor(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Parse an expression
    ///
    /// Precedence from tightest: `not`, `and`, `xor`/`^`, `or`.
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = tokenize(text)?;
        if tokens.len() > MAX_TOKENS {
            return Err(FatError::InvalidExpression(format!(
                "expression longer than {} tokens",
                MAX_TOKENS
            )));
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.or_expr()?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(FatError::InvalidExpression(format!(
                "unexpected {} after end of expression",
                token
            ))),
        }
    }

    /// Evaluate against one input combination
    pub fn eval(&self, inputs: &[bool]) -> bool {
        match self {
            Expr::Const(v) => *v,
            Expr::Input(i) => inputs.get(*i).copied().unwrap_or(false),
            Expr::Not(e) => !e.eval(inputs),
            Expr::And(a, b) => a.eval(inputs) && b.eval(inputs),
            Expr::Xor(a, b) => a.eval(inputs) ^ b.eval(inputs),
            Expr::Or(a, b) => a.eval(inputs) || b.eval(inputs),
        }
    }

    /// Highest input index referenced, if any
    pub fn max_input(&self) -> Option<usize> {
        match self {
            Expr::Const(_) => None,
            Expr::Input(i) => Some(*i),
            Expr::Not(e) => e.max_input(),
            Expr::And(a, b) | Expr::Xor(a, b) | Expr::Or(a, b) => {
                a.max_input().max(b.max_input())
            }
        }
    }
}

/// `Input1 or Input2 or ... or InputN`
pub fn default_expression(num_inputs: usize) -> String {
    (1..=num_inputs)
        .map(|i| format!("Input{}", i))
        .collect::<Vec<_>>()
        .join(" or ")
}

/// One input combination and its result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthRow {
    pub inputs: Vec<bool>,
    pub output: bool,
}

/// Every input combination of an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthTable {
    num_inputs: usize,
    expression: String,
    rows: Vec<TruthRow>,
}

impl TruthTable {
    /// Enumerate all `2^num_inputs` combinations, `Input1` varying slowest
    pub fn generate(expression: &str, num_inputs: usize) -> Result<Self> {
        if num_inputs == 0 || num_inputs > MAX_INPUTS {
            return Err(FatError::InvalidExpression(format!(
                "number of inputs must be between 1 and {}, got {}",
                MAX_INPUTS, num_inputs
            )));
        }

        let expr = Expr::parse(expression)?;
        if let Some(max) = expr.max_input() {
            if max >= num_inputs {
                return Err(FatError::InvalidExpression(format!(
                    "Input{} referenced but only {} inputs defined",
                    max + 1,
                    num_inputs
                )));
            }
        }

        let rows = (0..1usize << num_inputs)
            .map(|combination| {
                let inputs: Vec<bool> = (0..num_inputs)
                    .map(|i| (combination >> (num_inputs - 1 - i)) & 1 == 1)
                    .collect();
                let output = expr.eval(&inputs);
                TruthRow { inputs, output }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Truth table for {:?}: {} rows, {} true",
            expression,
            rows.len(),
            rows.iter().filter(|r| r.output).count()
        );

        Ok(Self {
            num_inputs,
            expression: expression.to_string(),
            rows,
        })
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn rows(&self) -> &[TruthRow] {
        &self.rows
    }

    /// Step tokens of input `index` (zero-based), one per row
    ///
    /// SPC: `"true"`/`"false"`. DPC: `true` → `"OPEN"`, `false` → `"CLOSED"`.
    pub fn input_tokens(&self, index: usize, mode: TestMode) -> Vec<RawCell> {
        self.rows
            .iter()
            .map(|row| {
                let value = row.inputs.get(index).copied().unwrap_or(false);
                RawCell::Text(input_token(value, mode).to_string())
            })
            .collect()
    }

    /// Output column as a raw assessment row
    pub fn assessment(&self) -> Vec<RawCell> {
        self.rows.iter().map(|row| RawCell::Bool(row.output)).collect()
    }
}

fn input_token(value: bool, mode: TestMode) -> &'static str {
    match (mode, value) {
        (TestMode::SinglePoint, true) => "true",
        (TestMode::SinglePoint, false) => "false",
        (TestMode::DoublePoint, true) => "OPEN",
        (TestMode::DoublePoint, false) => "CLOSED",
    }
}

impl fmt::Display for TruthTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut headers: Vec<String> = (1..=self.num_inputs).map(|i| format!("Input{}", i)).collect();
        headers.push("Output1".to_string());
        let widths: Vec<usize> = headers.iter().map(|h| h.len().max(5)).collect();

        let separator = widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+");
        writeln!(f, "+{}+", separator)?;
        let header_line = headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!(" {:<w$} ", h, w = *w))
            .collect::<Vec<_>>()
            .join("|");
        writeln!(f, "|{}|", header_line)?;
        writeln!(f, "+{}+", separator)?;

        for row in &self.rows {
            let cells = row
                .inputs
                .iter()
                .chain(std::iter::once(&row.output))
                .zip(&widths)
                .map(|(v, w)| format!(" {:<w$} ", v, w = *w))
                .collect::<Vec<_>>()
                .join("|");
            writeln!(f, "|{}|", cells)?;
        }
        write!(f, "+{}+", separator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Not,
    And,
    Or,
    Xor,
    Const(bool),
    Input(usize),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Not => write!(f, "'not'"),
            Token::And => write!(f, "'and'"),
            Token::Or => write!(f, "'or'"),
            Token::Xor => write!(f, "'xor'"),
            Token::Const(v) => write!(f, "'{}'", v),
            Token::Input(i) => write!(f, "'Input{}'", i + 1),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            '^' => {
                tokens.push(Token::Xor);
                chars.next();
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(word_token(&text[start..end])?);
            }
            other => {
                return Err(FatError::InvalidExpression(format!(
                    "unexpected character {:?} at offset {}",
                    other, start
                )))
            }
        }
    }

    Ok(tokens)
}

fn word_token(word: &str) -> Result<Token> {
    let lower = word.to_ascii_lowercase();
    let token = match lower.as_str() {
        "not" => Token::Not,
        "and" => Token::And,
        "or" => Token::Or,
        "xor" => Token::Xor,
        "true" => Token::Const(true),
        "false" => Token::Const(false),
        _ => {
            let index = lower
                .strip_prefix("input")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|&n| n >= 1)
                .ok_or_else(|| {
                    FatError::InvalidExpression(format!("unknown identifier {:?}", word))
                })?;
            Token::Input(index - 1)
        }
    };
    Ok(token)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> Result<Expr>) -> Result<Expr> {
        if self.depth >= MAX_NESTING {
            return Err(FatError::InvalidExpression(
                "expression nested too deeply".to_string(),
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut left = self.xor_expr()?;
        while self.eat(&Token::Or) {
            left = Expr::Or(Box::new(left), Box::new(self.xor_expr()?));
        }
        Ok(left)
    }

    fn xor_expr(&mut self) -> Result<Expr> {
        let mut left = self.and_expr()?;
        while self.eat(&Token::Xor) {
            left = Expr::Xor(Box::new(left), Box::new(self.and_expr()?));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut left = self.unary()?;
        while self.eat(&Token::And) {
            left = Expr::And(Box::new(left), Box::new(self.unary()?));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.eat(&Token::Not) {
            let operand = self.nested(|p| p.unary())?;
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.peek().cloned().ok_or_else(|| {
            FatError::InvalidExpression("unexpected end of expression".to_string())
        })?;
        self.pos += 1;

        match token {
            Token::LParen => {
                let inner = self.nested(|p| p.or_expr())?;
                if !self.eat(&Token::RParen) {
                    return Err(FatError::InvalidExpression("unbalanced parentheses".to_string()));
                }
                Ok(inner)
            }
            Token::Const(v) => Ok(Expr::Const(v)),
            Token::Input(i) => Ok(Expr::Input(i)),
            other => Err(FatError::InvalidExpression(format!("unexpected {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        // not > and > or
        let expr = Expr::parse("not Input1 and Input2 or Input3").unwrap();
        assert!(expr.eval(&[false, true, false]));
        assert!(!expr.eval(&[true, true, false]));
        assert!(expr.eval(&[true, false, true]));

        let grouped = Expr::parse("not (Input1 or Input2)").unwrap();
        assert!(!grouped.eval(&[false, true]));
        assert!(grouped.eval(&[false, false]));
    }

    #[test]
    fn test_xor_and_case_insensitive_keywords() {
        let expr = Expr::parse("INPUT1 XOR input2").unwrap();
        assert!(expr.eval(&[true, false]));
        assert!(!expr.eval(&[true, true]));
        assert_eq!(Expr::parse("Input1 ^ Input2").unwrap(), expr);
    }

    #[test]
    fn test_row_order() {
        let table = TruthTable::generate("Input1 and Input2", 2).unwrap();
        let rows: Vec<_> = table.rows().iter().map(|r| (r.inputs.clone(), r.output)).collect();
        assert_eq!(
            rows,
            vec![
                (vec![false, false], false),
                (vec![false, true], false),
                (vec![true, false], false),
                (vec![true, true], true),
            ]
        );
    }

    #[test]
    fn test_default_expression() {
        assert_eq!(default_expression(3), "Input1 or Input2 or Input3");
        let table = TruthTable::generate(&default_expression(3), 3).unwrap();
        assert_eq!(table.rows().len(), 8);
        assert_eq!(table.rows().iter().filter(|r| r.output).count(), 7);
    }

    #[test]
    fn test_tokens_per_mode() {
        let table = TruthTable::generate("Input1", 1).unwrap();
        assert_eq!(
            table.input_tokens(0, TestMode::DoublePoint),
            vec![RawCell::from("CLOSED"), RawCell::from("OPEN")]
        );
        assert_eq!(
            table.input_tokens(0, TestMode::SinglePoint),
            vec![RawCell::from("false"), RawCell::from("true")]
        );
        assert_eq!(table.assessment(), vec![RawCell::Bool(false), RawCell::Bool(true)]);
    }

    #[test]
    fn test_errors() {
        assert!(TruthTable::generate("Input1", 0).is_err());
        assert!(TruthTable::generate("Input1", 11).is_err());
        assert!(TruthTable::generate("Input3", 2).is_err());
        assert!(Expr::parse("(Input1 and Input2").is_err());
        assert!(Expr::parse("Input1 Input2").is_err());
        assert!(Expr::parse("Input1 and").is_err());
        assert!(Expr::parse("Switch1").is_err());
        assert!(Expr::parse("Input0").is_err());
        assert!(Expr::parse("Input1 & Input2").is_err());
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let deep = format!("{}Input1{}", "(".repeat(50_000), ")".repeat(50_000));
        match TruthTable::generate(&deep, 1) {
            Err(FatError::InvalidExpression(reason)) => {
                assert!(reason.contains("nested too deeply") || reason.contains("tokens"))
            }
            other => panic!("expected invalid expression, got {:?}", other),
        }

        let nots = format!("{}Input1", "not ".repeat(MAX_NESTING + 1));
        match Expr::parse(&nots) {
            Err(FatError::InvalidExpression(reason)) => assert_eq!(reason, "expression nested too deeply"),
            other => panic!("expected invalid expression, got {:?}", other),
        }

        let parens = format!("{}Input1{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert!(matches!(Expr::parse(&parens), Err(FatError::InvalidExpression(_))));

        let ok = format!("{}Input1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert_eq!(Expr::parse(&ok).unwrap(), Expr::Input(0));
    }

    #[test]
    fn test_long_chains_are_bounded() {
        let chain = vec!["Input1"; MAX_TOKENS].join(" or ");
        assert!(matches!(Expr::parse(&chain), Err(FatError::InvalidExpression(_))));

        let short = vec!["Input1"; 100].join(" or ");
        assert!(Expr::parse(&short).unwrap().eval(&[true]));
    }

    #[test]
    fn test_render() {
        let table = TruthTable::generate("Input1", 1).unwrap();
        let text = table.to_string();
        assert!(text.contains("Input1"));
        assert!(text.contains("Output1"));
        assert_eq!(text.lines().count(), 6);
    }
}
