// RFIDE - Robot Framework IDE core
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Python-like expressions.
//!
//! Extended variable syntax (`${list[0]}`, `${name.upper()}`, `${n + 1}`),
//! inline evaluation (`${{ $x * 2 }}`) and static variable files all need a
//! small subset of Python. This module parses that subset into an [`Expr`]
//! tree and evaluates it against a name lookup.
//!
//! # Grammar (informal):
//! ```text
//! expr       = or_expr ("if" or_expr "else" expr)?
//! or_expr    = and_expr ("or" and_expr)*
//! and_expr   = not_expr ("and" not_expr)*
//! not_expr   = "not" not_expr | comparison
//! comparison = sum (comp_op sum)*
//! sum        = term (("+" | "-") term)*
//! term       = unary (("*" | "/" | "//" | "%") unary)*
//! unary      = ("-" | "+") unary | power
//! power      = postfix ("**" unary)?
//! postfix    = atom ("[" subscript "]" | "." name | "(" args ")")*
//! atom       = number | string+ | name | "$" name | "(" ... ")" | "[" ... "]" | "{" ... "}"
//! ```

use crate::value::Value;
use std::cmp::Ordering;
use thiserror::Error;

/// Errors raised while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("invalid syntax: {0}")]
    Syntax(String),
    #[error("name '{0}' is not defined")]
    UndefinedName(String),
    #[error("TypeError: {0}")]
    Type(String),
    #[error("IndexError: {0}")]
    Index(String),
    #[error("KeyError: {0}")]
    Key(String),
    #[error("ValueError: {0}")]
    Value(String),
    #[error("ZeroDivisionError: division by zero")]
    ZeroDivision,
}

type ExprResult<T> = Result<T, ExprError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Is,
    IsNot,
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// A bare name: `x`, `len`.
    Name(String),
    /// A variable reference: `$x`.
    Variable(String),
    List(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// A comparison chain: `a < b <= c`.
    Compare(Box<Expr>, Vec<(CompareOp, Expr)>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Conditional {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Subscript(Box<Expr>, Box<Expr>),
    Slice {
        target: Box<Expr>,
        start: Option<Box<Expr>>,
        stop: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    Attribute(Box<Expr>, String),
    Call(Box<Expr>, Vec<Expr>),
}

/// Parse an expression.
pub fn parse_expression(src: &str) -> ExprResult<Expr> {
    let tokens = tokenize(src)?;
    let mut parser = ExprParser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        other => Err(ExprError::Syntax(format!("unexpected {}", other.describe()))),
    }
}

/// Parse and evaluate an expression; names and `$variables` come from `lookup`.
pub fn evaluate(src: &str, lookup: &dyn Fn(&str) -> Option<Value>) -> ExprResult<Value> {
    let expr = parse_expression(src)?;
    eval(&expr, lookup)
}

/// Evaluate a Python literal such as `['a', 1, {'k': None}]`.
pub fn literal_eval(src: &str) -> ExprResult<Value> {
    evaluate(src, &|_| None)
}

// ==================== Tokens ====================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),
    Var(String),
    Op(&'static str),
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Int(n) => format!("number {}", n),
            Token::Float(n) => format!("number {}", n),
            Token::Str(s) => format!("string {:?}", s),
            Token::Name(n) => format!("name '{}'", n),
            Token::Var(n) => format!("variable '${}'", n),
            Token::Op(op) => format!("'{}'", op),
            Token::Eof => "end of expression".to_string(),
        }
    }
}

const OPERATORS: &[&str] = &[
    "//", "**", "==", "!=", "<=", ">=", "+", "-", "*", "/", "%", "<", ">", "(", ")", "[", "]",
    "{", "}", ",", ":", ".",
];

fn tokenize(src: &str) -> ExprResult<Vec<Token>> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        if ch.is_whitespace() || ch == '\\' && chars.get(pos + 1) == Some(&'\n') {
            pos += 1;
            continue;
        }
        if ch == '#' {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            continue;
        }
        if ch.is_ascii_digit() || ch == '.' && chars.get(pos + 1).is_some_and(char::is_ascii_digit) {
            let (token, next) = lex_number(&chars, pos)?;
            tokens.push(token);
            pos = next;
            continue;
        }
        if ch == '$' {
            let start = pos + 1;
            let end = scan_name(&chars, start);
            if end == start {
                return Err(ExprError::Syntax("'$' must be followed by a name".to_string()));
            }
            tokens.push(Token::Var(chars[start..end].iter().collect()));
            pos = end;
            continue;
        }
        if ch.is_alphabetic() || ch == '_' {
            let end = scan_name(&chars, pos);
            let name: String = chars[pos..end].iter().collect();
            let lower = name.to_ascii_lowercase();
            let is_prefix = matches!(lower.as_str(), "r" | "u" | "b" | "rb" | "br");
            if is_prefix && matches!(chars.get(end), Some('\'') | Some('"')) {
                let (s, next) = lex_string(&chars, end, lower.contains('r'))?;
                tokens.push(Token::Str(s));
                pos = next;
            } else {
                tokens.push(Token::Name(name));
                pos = end;
            }
            continue;
        }
        if ch == '\'' || ch == '"' {
            let (s, next) = lex_string(&chars, pos, false)?;
            tokens.push(Token::Str(s));
            pos = next;
            continue;
        }
        let rest: String = chars[pos..chars.len().min(pos + 2)].iter().collect();
        match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            Some(op) => {
                tokens.push(Token::Op(op));
                pos += op.len();
            }
            None => return Err(ExprError::Syntax(format!("unexpected character '{}'", ch))),
        }
    }
    tokens.push(Token::Eof);
    Ok(tokens)
}

fn scan_name(chars: &[char], mut pos: usize) -> usize {
    while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
        pos += 1;
    }
    pos
}

fn lex_number(chars: &[char], start: usize) -> ExprResult<(Token, usize)> {
    let mut pos = start;
    let radix = match (chars.get(pos), chars.get(pos + 1)) {
        (Some('0'), Some('x' | 'X')) => 16,
        (Some('0'), Some('o' | 'O')) => 8,
        (Some('0'), Some('b' | 'B')) => 2,
        _ => 10,
    };
    if radix != 10 {
        pos += 2;
        let digits_start = pos;
        while pos < chars.len() && (chars[pos].is_digit(radix) || chars[pos] == '_') {
            pos += 1;
        }
        let digits: String = chars[digits_start..pos].iter().filter(|c| **c != '_').collect();
        let value = i64::from_str_radix(&digits, radix)
            .map_err(|_| ExprError::Syntax(format!("invalid number '{}'", digits)))?;
        return Ok((Token::Int(value), pos));
    }

    let mut is_float = false;
    while pos < chars.len() {
        let ch = chars[pos];
        if ch.is_ascii_digit() || ch == '_' {
            pos += 1;
        } else if ch == '.' && !is_float && chars.get(pos + 1).map_or(true, |c| !c.is_alphabetic() && *c != '_') {
            is_float = true;
            pos += 1;
        } else if matches!(ch, 'e' | 'E') {
            let sign = matches!(chars.get(pos + 1), Some('+' | '-'));
            let digit_at = if sign { pos + 2 } else { pos + 1 };
            if !chars.get(digit_at).is_some_and(char::is_ascii_digit) {
                break;
            }
            is_float = true;
            pos = digit_at;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            break;
        } else {
            break;
        }
    }
    let text: String = chars[start..pos].iter().filter(|c| **c != '_').collect();
    let token = if is_float {
        Token::Float(
            text.parse()
                .map_err(|_| ExprError::Syntax(format!("invalid number '{}'", text)))?,
        )
    } else {
        match text.parse() {
            Ok(n) => Token::Int(n),
            Err(_) => Token::Float(
                text.parse()
                    .map_err(|_| ExprError::Syntax(format!("invalid number '{}'", text)))?,
            ),
        }
    };
    Ok((token, pos))
}

fn lex_string(chars: &[char], start: usize, raw: bool) -> ExprResult<(String, usize)> {
    let quote = chars[start];
    let triple = chars.get(start + 1) == Some(&quote) && chars.get(start + 2) == Some(&quote);
    let mut pos = start + if triple { 3 } else { 1 };
    let mut out = String::new();

    loop {
        let Some(&ch) = chars.get(pos) else {
            return Err(ExprError::Syntax("unterminated string".to_string()));
        };
        if ch == quote {
            if !triple {
                return Ok((out, pos + 1));
            }
            if chars.get(pos + 1) == Some(&quote) && chars.get(pos + 2) == Some(&quote) {
                return Ok((out, pos + 3));
            }
        }
        if ch == '\n' && !triple {
            return Err(ExprError::Syntax("unterminated string".to_string()));
        }
        if ch == '\\' && !raw {
            let Some(&next) = chars.get(pos + 1) else {
                return Err(ExprError::Syntax("unterminated string".to_string()));
            };
            pos += 2;
            match next {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                '\\' => out.push('\\'),
                '\'' => out.push('\''),
                '"' => out.push('"'),
                '\n' => {}
                'x' | 'u' | 'U' => {
                    let len = match next {
                        'x' => 2,
                        'u' => 4,
                        _ => 8,
                    };
                    let hex: String = chars.get(pos..pos + len).unwrap_or(&[]).iter().collect();
                    let decoded = u32::from_str_radix(&hex, 16)
                        .ok()
                        .filter(|_| hex.len() == len)
                        .and_then(char::from_u32)
                        .ok_or_else(|| ExprError::Syntax(format!("invalid escape '\\{}{}'", next, hex)))?;
                    out.push(decoded);
                    pos += len;
                }
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
            continue;
        }
        out.push(ch);
        pos += 1;
    }
}

// ==================== Parser ====================

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn is_op(&self, op: &str) -> bool {
        matches!(self.peek(), Token::Op(o) if *o == op)
    }

    fn is_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Token::Name(n) if n == word)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.is_op(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> ExprResult<()> {
        if self.eat_op(op) {
            Ok(())
        } else {
            Err(ExprError::Syntax(format!(
                "expected '{}', found {}",
                op,
                self.peek().describe()
            )))
        }
    }

    fn parse_expr(&mut self) -> ExprResult<Expr> {
        let expr = self.parse_or()?;
        if self.is_keyword("if") {
            self.pos += 1;
            let test = self.parse_or()?;
            if !self.is_keyword("else") {
                return Err(ExprError::Syntax("expected 'else'".to_string()));
            }
            self.pos += 1;
            let otherwise = self.parse_expr()?;
            return Ok(Expr::Conditional {
                test: Box::new(test),
                then: Box::new(expr),
                otherwise: Box::new(otherwise),
            });
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_and()?;
        while self.is_keyword("or") {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_not()?;
        while self.is_keyword("and") {
            self.pos += 1;
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> ExprResult<Expr> {
        if self.is_keyword("not") {
            self.pos += 1;
            let operand = self.parse_not()?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)));
        }
        self.parse_comparison()
    }

    fn compare_op(&mut self) -> Option<CompareOp> {
        let followed_by = |word: &str| matches!(self.peek_at(1), Token::Name(m) if m == word);
        let (op, width) = match self.peek() {
            Token::Op("==") => (CompareOp::Eq, 1),
            Token::Op("!=") => (CompareOp::Ne, 1),
            Token::Op("<") => (CompareOp::Lt, 1),
            Token::Op("<=") => (CompareOp::Le, 1),
            Token::Op(">") => (CompareOp::Gt, 1),
            Token::Op(">=") => (CompareOp::Ge, 1),
            Token::Name(n) if n == "in" => (CompareOp::In, 1),
            Token::Name(n) if n == "not" && followed_by("in") => (CompareOp::NotIn, 2),
            Token::Name(n) if n == "is" && followed_by("not") => (CompareOp::IsNot, 2),
            Token::Name(n) if n == "is" => (CompareOp::Is, 1),
            _ => return None,
        };
        self.pos += width;
        Some(op)
    }

    fn parse_comparison(&mut self) -> ExprResult<Expr> {
        let left = self.parse_sum()?;
        let mut chain = Vec::new();
        while let Some(op) = self.compare_op() {
            chain.push((op, self.parse_sum()?));
        }
        if chain.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare(Box::new(left), chain))
        }
    }

    fn parse_sum(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Token::Op("+") => BinaryOp::Add,
                Token::Op("-") => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_term(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Op("*") => BinaryOp::Mul,
                Token::Op("/") => BinaryOp::Div,
                Token::Op("//") => BinaryOp::FloorDiv,
                Token::Op("%") => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_unary(&mut self) -> ExprResult<Expr> {
        let op = match self.peek() {
            Token::Op("-") => UnaryOp::Neg,
            Token::Op("+") => UnaryOp::Pos,
            _ => return self.parse_power(),
        };
        self.pos += 1;
        let operand = self.parse_unary()?;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn parse_power(&mut self) -> ExprResult<Expr> {
        let base = self.parse_postfix()?;
        if self.eat_op("**") {
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> ExprResult<Expr> {
        let mut expr = self.parse_atom()?;
        loop {
            if self.eat_op("[") {
                expr = self.parse_subscript(expr)?;
            } else if self.eat_op(".") {
                match self.advance() {
                    Token::Name(name) => expr = Expr::Attribute(Box::new(expr), name),
                    other => {
                        return Err(ExprError::Syntax(format!(
                            "expected attribute name, found {}",
                            other.describe()
                        )))
                    }
                }
            } else if self.eat_op("(") {
                let args = self.parse_sequence(")")?.0;
                expr = Expr::Call(Box::new(expr), args);
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_subscript(&mut self, target: Expr) -> ExprResult<Expr> {
        let start = if self.is_op(":") { None } else { Some(Box::new(self.parse_expr()?)) };
        if self.eat_op("]") {
            let index = start.ok_or_else(|| ExprError::Syntax("empty subscript".to_string()))?;
            return Ok(Expr::Subscript(Box::new(target), index));
        }
        self.expect_op(":")?;
        let stop = if self.is_op(":") || self.is_op("]") {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        let step = if self.eat_op(":") && !self.is_op("]") {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.expect_op("]")?;
        Ok(Expr::Slice {
            target: Box::new(target),
            start,
            stop,
            step,
        })
    }

    /// Comma separated expressions up to `close`; the flag is true when a
    /// trailing or separating comma was seen.
    fn parse_sequence(&mut self, close: &str) -> ExprResult<(Vec<Expr>, bool)> {
        let mut items = Vec::new();
        let mut comma = false;
        while !self.eat_op(close) {
            items.push(self.parse_expr()?);
            if self.eat_op(",") {
                comma = true;
            } else {
                self.expect_op(close)?;
                break;
            }
        }
        Ok((items, comma))
    }

    fn parse_atom(&mut self) -> ExprResult<Expr> {
        match self.advance() {
            Token::Int(n) => Ok(Expr::Literal(Value::Int(n))),
            Token::Float(n) => Ok(Expr::Literal(Value::Float(n))),
            Token::Str(mut s) => {
                // Adjacent literals concatenate.
                while matches!(self.peek(), Token::Str(_)) {
                    if let Token::Str(next) = self.advance() {
                        s.push_str(&next);
                    }
                }
                Ok(Expr::Literal(Value::String(s)))
            }
            Token::Var(name) => Ok(Expr::Variable(name)),
            Token::Name(name) => match name.as_str() {
                "True" => Ok(Expr::Literal(Value::Bool(true))),
                "False" => Ok(Expr::Literal(Value::Bool(false))),
                "None" => Ok(Expr::Literal(Value::None)),
                _ => Ok(Expr::Name(name)),
            },
            Token::Op("(") => {
                let (mut items, comma) = self.parse_sequence(")")?;
                if items.len() == 1 && !comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Expr::List(items))
                }
            }
            Token::Op("[") => Ok(Expr::List(self.parse_sequence("]")?.0)),
            Token::Op("{") => self.parse_braces(),
            other => Err(ExprError::Syntax(format!("unexpected {}", other.describe()))),
        }
    }

    /// Dict literal, or a set literal read as a list.
    fn parse_braces(&mut self) -> ExprResult<Expr> {
        let mut pairs = Vec::new();
        let mut set_items = Vec::new();
        while !self.eat_op("}") {
            let key = self.parse_expr()?;
            if self.eat_op(":") {
                pairs.push((key, self.parse_expr()?));
            } else {
                set_items.push(key);
            }
            if !self.eat_op(",") {
                self.expect_op("}")?;
                break;
            }
        }
        match (pairs.is_empty(), set_items.is_empty()) {
            (_, true) => Ok(Expr::Dict(pairs)),
            (true, false) => Ok(Expr::List(set_items)),
            (false, false) => Err(ExprError::Syntax("mixed dict and set literal".to_string())),
        }
    }
}

// ==================== Evaluation ====================

/// Evaluate a parsed expression.
pub fn eval(expr: &Expr, lookup: &dyn Fn(&str) -> Option<Value>) -> ExprResult<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Name(name) | Expr::Variable(name) => {
            lookup(name).ok_or_else(|| ExprError::UndefinedName(name.clone()))
        }
        Expr::List(items) => Ok(Value::List(
            items.iter().map(|e| eval(e, lookup)).collect::<ExprResult<_>>()?,
        )),
        Expr::Dict(pairs) => {
            let mut out: Vec<(Value, Value)> = Vec::with_capacity(pairs.len());
            for (k, v) in pairs {
                let key = eval(k, lookup)?;
                let value = eval(v, lookup)?;
                match out.iter_mut().find(|(existing, _)| values_equal(existing, &key)) {
                    Some(slot) => slot.1 = value,
                    None => out.push((key, value)),
                }
            }
            Ok(Value::Dict(out))
        }
        Expr::Unary(op, operand) => {
            let value = eval(operand, lookup)?;
            unary(*op, value)
        }
        Expr::Binary(op, left, right) => {
            let left = eval(left, lookup)?;
            let right = eval(right, lookup)?;
            binary(*op, &left, &right)
        }
        Expr::Compare(first, chain) => {
            let mut left = eval(first, lookup)?;
            for (op, right) in chain {
                let right = eval(right, lookup)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
        Expr::And(left, right) => {
            let left = eval(left, lookup)?;
            if left.is_truthy() {
                eval(right, lookup)
            } else {
                Ok(left)
            }
        }
        Expr::Or(left, right) => {
            let left = eval(left, lookup)?;
            if left.is_truthy() {
                Ok(left)
            } else {
                eval(right, lookup)
            }
        }
        Expr::Conditional {
            test,
            then,
            otherwise,
        } => {
            if eval(test, lookup)?.is_truthy() {
                eval(then, lookup)
            } else {
                eval(otherwise, lookup)
            }
        }
        Expr::Subscript(target, index) => {
            let target = eval(target, lookup)?;
            let index = eval(index, lookup)?;
            subscript(&target, &index)
        }
        Expr::Slice {
            target,
            start,
            stop,
            step,
        } => {
            let target = eval(target, lookup)?;
            let bound = |e: &Option<Box<Expr>>| -> ExprResult<Option<i64>> {
                match e {
                    None => Ok(None),
                    Some(e) => match eval(e, lookup)? {
                        Value::None => Ok(None),
                        v => v.as_int().map(Some).ok_or_else(|| {
                            ExprError::Type("slice indices must be integers".to_string())
                        }),
                    },
                }
            };
            slice(&target, bound(start)?, bound(stop)?, bound(step)?)
        }
        Expr::Attribute(target, name) => {
            let target = eval(target, lookup)?;
            attribute(&target, name)
        }
        Expr::Call(callee, args) => {
            let args: Vec<Value> = args.iter().map(|a| eval(a, lookup)).collect::<ExprResult<_>>()?;
            match callee.as_ref() {
                Expr::Attribute(target, method) => {
                    let target = eval(target, lookup)?;
                    call_method(&target, method, &args)
                }
                Expr::Name(name) if lookup(name).is_none() => call_builtin(name, &args),
                other => Err(ExprError::Type(format!(
                    "'{}' object is not callable",
                    eval(other, lookup)?.type_name()
                ))),
            }
        }
    }
}

fn unary(op: UnaryOp, value: Value) -> ExprResult<Value> {
    match (op, &value) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| ExprError::Value("integer overflow".to_string())),
        (UnaryOp::Neg, Value::Bool(b)) => Ok(Value::Int(-i64::from(*b))),
        (UnaryOp::Neg, Value::Float(n)) => Ok(Value::Float(-n)),
        (UnaryOp::Pos, Value::Int(_) | Value::Float(_)) => Ok(value),
        (UnaryOp::Pos, Value::Bool(b)) => Ok(Value::Int(i64::from(*b))),
        _ => Err(ExprError::Type(format!(
            "bad operand type for unary operator: '{}'",
            value.type_name()
        ))),
    }
}

fn is_number(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Float(_) | Value::Bool(_))
}

fn overflow() -> ExprError {
    ExprError::Value("integer overflow".to_string())
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> ExprResult<Value> {
    let ints = match (left, right) {
        (Value::Int(_) | Value::Bool(_), Value::Int(_) | Value::Bool(_)) => {
            left.as_int().zip(right.as_int())
        }
        _ => None,
    };

    match op {
        BinaryOp::Add => match (left, right) {
            (Value::String(a), Value::String(b)) => return Ok(Value::String(format!("{}{}", a, b))),
            (Value::List(a), Value::List(b)) => {
                return Ok(Value::List(a.iter().chain(b.iter()).cloned().collect()))
            }
            _ => {}
        },
        BinaryOp::Mul => match (left, right) {
            (Value::String(s), n) | (n, Value::String(s)) if matches!(n, Value::Int(_)) => {
                let count = n.as_int().unwrap_or(0).max(0) as usize;
                return Ok(Value::String(s.repeat(count)));
            }
            (Value::List(items), n) | (n, Value::List(items)) if matches!(n, Value::Int(_)) => {
                let count = n.as_int().unwrap_or(0).max(0) as usize;
                let mut out = Vec::with_capacity(items.len() * count);
                for _ in 0..count {
                    out.extend(items.iter().cloned());
                }
                return Ok(Value::List(out));
            }
            _ => {}
        },
        _ => {}
    }

    if !is_number(left) || !is_number(right) {
        return Err(ExprError::Type(format!(
            "unsupported operand types: '{}' and '{}'",
            left.type_name(),
            right.type_name()
        )));
    }

    if let Some((a, b)) = ints {
        return match op {
            BinaryOp::Add => a.checked_add(b).map(Value::Int).ok_or_else(overflow),
            BinaryOp::Sub => a.checked_sub(b).map(Value::Int).ok_or_else(overflow),
            BinaryOp::Mul => a.checked_mul(b).map(Value::Int).ok_or_else(overflow),
            BinaryOp::Div => {
                if b == 0 {
                    Err(ExprError::ZeroDivision)
                } else {
                    Ok(Value::Float(a as f64 / b as f64))
                }
            }
            BinaryOp::FloorDiv => {
                if b == 0 {
                    return Err(ExprError::ZeroDivision);
                }
                Ok(Value::Int(floor_div(a, b)))
            }
            BinaryOp::Mod => {
                if b == 0 {
                    return Err(ExprError::ZeroDivision);
                }
                Ok(Value::Int(a - b * floor_div(a, b)))
            }
            BinaryOp::Pow => {
                if b < 0 {
                    Ok(Value::Float((a as f64).powf(b as f64)))
                } else {
                    let exp = u32::try_from(b).map_err(|_| overflow())?;
                    a.checked_pow(exp).map(Value::Int).ok_or_else(overflow)
                }
            }
        };
    }

    let a = left.as_float().unwrap_or(f64::NAN);
    let b = right.as_float().unwrap_or(f64::NAN);
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod if b == 0.0 => {
            return Err(ExprError::ZeroDivision)
        }
        BinaryOp::Div => a / b,
        BinaryOp::FloorDiv => (a / b).floor(),
        BinaryOp::Mod => a - b * (a / b).floor(),
        BinaryOp::Pow => a.powf(b),
    };
    Ok(Value::Float(result))
}

fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    if a % b != 0 && (a < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

/// Equality with Python's numeric coercion (`1 == 1.0 == True`).
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        (Value::Dict(x), Value::Dict(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| {
                    y.iter()
                        .any(|(k2, v2)| values_equal(k, k2) && values_equal(v, v2))
                })
        }
        _ if is_number(a) && is_number(b) => match (a.as_int(), b.as_int()) {
            (Some(x), Some(y)) if !matches!(a, Value::Float(_)) && !matches!(b, Value::Float(_)) => {
                x == y
            }
            _ => a.as_float() == b.as_float(),
        },
        _ => a == b,
    }
}

fn ordering(a: &Value, b: &Value) -> ExprResult<Ordering> {
    let unorderable = || {
        ExprError::Type(format!(
            "'<' not supported between instances of '{}' and '{}'",
            a.type_name(),
            b.type_name()
        ))
    };
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (Value::List(x), Value::List(y)) => {
            for (l, r) in x.iter().zip(y) {
                if !values_equal(l, r) {
                    return ordering(l, r);
                }
            }
            Ok(x.len().cmp(&y.len()))
        }
        _ if is_number(a) && is_number(b) => {
            let x = a.as_float().unwrap_or(f64::NAN);
            let y = b.as_float().unwrap_or(f64::NAN);
            x.partial_cmp(&y).ok_or_else(unorderable)
        }
        _ => Err(unorderable()),
    }
}

fn contains(container: &Value, item: &Value) -> ExprResult<bool> {
    match container {
        Value::String(s) => match item {
            Value::String(sub) => Ok(s.contains(sub.as_str())),
            other => Err(ExprError::Type(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) => Ok(items.iter().any(|v| values_equal(v, item))),
        Value::Dict(pairs) => Ok(pairs.iter().any(|(k, _)| values_equal(k, item))),
        other => Err(ExprError::Type(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> ExprResult<bool> {
    Ok(match op {
        CompareOp::Eq => values_equal(left, right),
        CompareOp::Ne => !values_equal(left, right),
        CompareOp::Lt => ordering(left, right)? == Ordering::Less,
        CompareOp::Le => ordering(left, right)? != Ordering::Greater,
        CompareOp::Gt => ordering(left, right)? == Ordering::Greater,
        CompareOp::Ge => ordering(left, right)? != Ordering::Less,
        CompareOp::In => contains(right, left)?,
        CompareOp::NotIn => !contains(right, left)?,
        CompareOp::Is => left == right,
        CompareOp::IsNot => left != right,
    })
}

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { index + len } else { index };
    (0..len).contains(&index).then_some(index as usize)
}

/// `target[index]`.
pub fn subscript(target: &Value, index: &Value) -> ExprResult<Value> {
    match target {
        Value::List(items) => {
            let i = index.as_int().filter(|_| !matches!(index, Value::Float(_))).ok_or_else(|| {
                ExprError::Type(format!(
                    "list indices must be integers, not {}",
                    index.type_name()
                ))
            })?;
            normalize_index(i, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(|| ExprError::Index("list index out of range".to_string()))
        }
        Value::String(s) => {
            let i = index.as_int().ok_or_else(|| {
                ExprError::Type(format!(
                    "string indices must be integers, not {}",
                    index.type_name()
                ))
            })?;
            let chars: Vec<char> = s.chars().collect();
            normalize_index(i, chars.len())
                .map(|i| Value::String(chars[i].to_string()))
                .ok_or_else(|| ExprError::Index("string index out of range".to_string()))
        }
        Value::Dict(pairs) => pairs
            .iter()
            .find(|(k, _)| values_equal(k, index))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| ExprError::Key(index.repr())),
        other => Err(ExprError::Type(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn slice_indices(len: usize, start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> ExprResult<Vec<usize>> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(ExprError::Value("slice step cannot be zero".to_string()));
    }
    let len = len as i64;
    let clamp = |bound: i64, low: i64, high: i64| {
        let bound = if bound < 0 { bound + len } else { bound };
        bound.clamp(low, high)
    };
    let mut out = Vec::new();
    if step > 0 {
        let mut i = start.map_or(0, |s| clamp(s, 0, len));
        let stop = stop.map_or(len, |s| clamp(s, 0, len));
        while i < stop {
            out.push(i as usize);
            i += step;
        }
    } else {
        let mut i = start.map_or(len - 1, |s| clamp(s, -1, len - 1));
        let stop = stop.map_or(-1, |s| clamp(s, -1, len - 1));
        while i > stop {
            out.push(i as usize);
            i += step;
        }
    }
    Ok(out)
}

/// `target[start:stop:step]`.
pub fn slice(target: &Value, start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> ExprResult<Value> {
    match target {
        Value::List(items) => Ok(Value::List(
            slice_indices(items.len(), start, stop, step)?
                .into_iter()
                .map(|i| items[i].clone())
                .collect(),
        )),
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::String(
                slice_indices(chars.len(), start, stop, step)?
                    .into_iter()
                    .map(|i| chars[i])
                    .collect(),
            ))
        }
        other => Err(ExprError::Type(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn attribute(target: &Value, name: &str) -> ExprResult<Value> {
    match target {
        Value::Dict(_) => target
            .get_str(name)
            .cloned()
            .ok_or_else(|| ExprError::Key(format!("'{}'", name))),
        other => Err(ExprError::Type(format!(
            "'{}' object has no attribute '{}'",
            other.type_name(),
            name
        ))),
    }
}

fn string_arg<'a>(args: &'a [Value], index: usize, method: &str) -> ExprResult<&'a str> {
    args.get(index).and_then(Value::as_str).ok_or_else(|| {
        ExprError::Type(format!("{}() argument {} must be str", method, index + 1))
    })
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_cased = false;
    for c in s.chars() {
        if previous_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        previous_cased = c.is_alphabetic();
    }
    out
}

fn call_method(target: &Value, method: &str, args: &[Value]) -> ExprResult<Value> {
    let no_method = || {
        ExprError::Type(format!(
            "'{}' object has no attribute '{}'",
            target.type_name(),
            method
        ))
    };
    match target {
        Value::String(s) => {
            let value: Value = match method {
                "lower" => s.to_lowercase().into(),
                "upper" => s.to_uppercase().into(),
                "strip" => s.trim().into(),
                "lstrip" => s.trim_start().into(),
                "rstrip" => s.trim_end().into(),
                "title" => title_case(s).into(),
                "capitalize" => {
                    let mut chars = s.chars();
                    match chars.next() {
                        Some(first) => first
                            .to_uppercase()
                            .chain(chars.flat_map(char::to_lowercase))
                            .collect::<String>()
                            .into(),
                        None => Value::String(String::new()),
                    }
                }
                "replace" => {
                    let old = string_arg(args, 0, method)?;
                    let new = string_arg(args, 1, method)?;
                    s.replace(old, new).into()
                }
                "split" => {
                    let parts: Vec<Value> = match args.first() {
                        None | Some(Value::None) => s.split_whitespace().map(Value::from).collect(),
                        Some(_) => {
                            let sep = string_arg(args, 0, method)?;
                            if sep.is_empty() {
                                return Err(ExprError::Value("empty separator".to_string()));
                            }
                            match args.get(1).and_then(Value::as_int).filter(|n| *n >= 0) {
                                Some(max) => s.splitn(max as usize + 1, sep).map(Value::from).collect(),
                                None => s.split(sep).map(Value::from).collect(),
                            }
                        }
                    };
                    Value::List(parts)
                }
                "startswith" => Value::Bool(s.starts_with(string_arg(args, 0, method)?)),
                "endswith" => Value::Bool(s.ends_with(string_arg(args, 0, method)?)),
                "join" => match args.first() {
                    Some(Value::List(items)) => items
                        .iter()
                        .map(|v| {
                            v.as_str().map(str::to_string).ok_or_else(|| {
                                ExprError::Type("sequence item must be str".to_string())
                            })
                        })
                        .collect::<ExprResult<Vec<_>>>()?
                        .join(s.as_str())
                        .into(),
                    _ => return Err(ExprError::Type("join() argument must be a list".to_string())),
                },
                _ => return Err(no_method()),
            };
            Ok(value)
        }
        Value::List(items) => match method {
            "index" => {
                let item = args.first().ok_or_else(|| ExprError::Type("index() takes one argument".to_string()))?;
                items
                    .iter()
                    .position(|v| values_equal(v, item))
                    .map(|i| Value::Int(i as i64))
                    .ok_or_else(|| ExprError::Value(format!("{} is not in list", item.repr())))
            }
            "count" => {
                let item = args.first().ok_or_else(|| ExprError::Type("count() takes one argument".to_string()))?;
                Ok(Value::Int(items.iter().filter(|v| values_equal(v, item)).count() as i64))
            }
            _ => Err(no_method()),
        },
        Value::Dict(pairs) => match method {
            "keys" => Ok(Value::List(pairs.iter().map(|(k, _)| k.clone()).collect())),
            "values" => Ok(Value::List(pairs.iter().map(|(_, v)| v.clone()).collect())),
            "items" => Ok(Value::List(
                pairs
                    .iter()
                    .map(|(k, v)| Value::List(vec![k.clone(), v.clone()]))
                    .collect(),
            )),
            "get" => {
                let key = args.first().ok_or_else(|| ExprError::Type("get() takes a key".to_string()))?;
                Ok(pairs
                    .iter()
                    .find(|(k, _)| values_equal(k, key))
                    .map(|(_, v)| v.clone())
                    .unwrap_or_else(|| args.get(1).cloned().unwrap_or(Value::None)))
            }
            _ => Err(no_method()),
        },
        _ => Err(no_method()),
    }
}

fn call_builtin(name: &str, args: &[Value]) -> ExprResult<Value> {
    let first = || {
        args.first()
            .ok_or_else(|| ExprError::Type(format!("{}() takes exactly one argument", name)))
    };
    match name {
        "len" => match first()? {
            Value::String(s) => Ok(Value::Int(s.chars().count() as i64)),
            Value::List(items) => Ok(Value::Int(items.len() as i64)),
            Value::Dict(pairs) => Ok(Value::Int(pairs.len() as i64)),
            other => Err(ExprError::Type(format!(
                "object of type '{}' has no len()",
                other.type_name()
            ))),
        },
        "str" => Ok(Value::String(args.first().map(Value::to_string).unwrap_or_default())),
        "bool" => Ok(Value::Bool(args.first().is_some_and(Value::is_truthy))),
        "int" => match first()? {
            Value::String(s) => s
                .trim()
                .parse()
                .map(Value::Int)
                .map_err(|_| ExprError::Value(format!("invalid literal for int(): {}", repr_of(s)))),
            Value::Float(f) => Ok(Value::Int(f.trunc() as i64)),
            other => other
                .as_int()
                .map(Value::Int)
                .ok_or_else(|| ExprError::Type(format!("int() argument must not be '{}'", other.type_name()))),
        },
        "float" => match first()? {
            Value::String(s) => s
                .trim()
                .parse()
                .map(Value::Float)
                .map_err(|_| ExprError::Value(format!("could not convert string to float: {}", repr_of(s)))),
            other => other
                .as_float()
                .map(Value::Float)
                .ok_or_else(|| ExprError::Type(format!("float() argument must not be '{}'", other.type_name()))),
        },
        "abs" => match first()? {
            Value::Float(f) => Ok(Value::Float(f.abs())),
            other => other
                .as_int()
                .map(|n| Value::Int(n.abs()))
                .ok_or_else(|| ExprError::Type(format!("bad operand type for abs(): '{}'", other.type_name()))),
        },
        "list" => match args.first() {
            None => Ok(Value::List(Vec::new())),
            Some(Value::List(items)) => Ok(Value::List(items.clone())),
            Some(Value::String(s)) => Ok(Value::List(s.chars().map(|c| Value::String(c.to_string())).collect())),
            Some(Value::Dict(pairs)) => Ok(Value::List(pairs.iter().map(|(k, _)| k.clone()).collect())),
            Some(other) => Err(ExprError::Type(format!("'{}' object is not iterable", other.type_name()))),
        },
        _ => Err(ExprError::UndefinedName(name.to_string())),
    }
}

fn repr_of(s: &str) -> String {
    Value::from(s).repr()
}
