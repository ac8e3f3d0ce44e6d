use crate::errors::{DomainError, EvalError, SyntaxError};
use crate::traits::ScalarFunction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// The variable an expression is written in.
///
/// Functions under study use `x`; calculator expressions use `Ans`, the previous result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placeholder {
    X,
    Ans,
}

impl Placeholder {
    pub fn name(self) -> &'static str {
        match self {
            Placeholder::X => "x",
            Placeholder::Ans => "Ans",
        }
    }
}

/// A placeholder together with the value it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub placeholder: Placeholder,
    pub value: f64,
}

impl Binding {
    pub fn x(value: f64) -> Self {
        Self {
            placeholder: Placeholder::X,
            value,
        }
    }

    pub fn ans(value: f64) -> Self {
        Self {
            placeholder: Placeholder::Ans,
            value,
        }
    }
}

/// Named unary functions accepted by the grammar. Trigonometry works in radians.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sqrt,
    /// Base-10 logarithm.
    Log,
    /// Natural logarithm.
    Ln,
    Sin,
    Cos,
    Tan,
    Exp,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sqrt" => Some(Function::Sqrt),
            "log" => Some(Function::Log),
            "ln" => Some(Function::Ln),
            "sin" => Some(Function::Sin),
            "cos" => Some(Function::Cos),
            "tan" => Some(Function::Tan),
            "exp" => Some(Function::Exp),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Sqrt => "sqrt",
            Function::Log => "log",
            Function::Ln => "ln",
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Exp => "exp",
        }
    }

    fn in_domain(self, arg: f64) -> bool {
        match self {
            Function::Sqrt => arg >= 0.0,
            Function::Log | Function::Ln => arg > 0.0,
            Function::Sin | Function::Cos | Function::Tan | Function::Exp => true,
        }
    }

    fn apply(self, arg: f64) -> f64 {
        match self {
            Function::Sqrt => arg.sqrt(),
            Function::Log => arg.log10(),
            Function::Ln => arg.ln(),
            Function::Sin => arg.sin(),
            Function::Cos => arg.cos(),
            Function::Tan => arg.tan(),
            Function::Exp => arg.exp(),
        }
    }
}

/// OpCodes for the stack-based virtual machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpCode {
    /// Pushes a constant onto the stack.
    LoadConst(f64),
    /// Pushes the value bound to the placeholder.
    LoadVar,
    /// Pops top two values (b, a), pushes (a + b).
    Add,
    /// Pops top two values (b, a), pushes (a - b).
    Sub,
    /// Pops top two values (b, a), pushes (a * b).
    Mul,
    /// Pops top two values (b, a), pushes (a / b).
    Div,
    /// Pops top two values (b, a), pushes (a ^ b).
    Pow,
    /// Pops top value (a), pushes -a.
    Neg,
    /// Pops top value (a), pushes f(a).
    Call(Function),
}

impl OpCode {
    fn symbol(&self) -> &'static str {
        match self {
            OpCode::LoadConst(_) => "literal",
            OpCode::LoadVar => "variable",
            OpCode::Add => "+",
            OpCode::Sub => "-",
            OpCode::Mul => "*",
            OpCode::Div => "/",
            OpCode::Pow => "^",
            OpCode::Neg => "negation",
            OpCode::Call(function) => function.name(),
        }
    }
}

/// A compiled sequence of operations. Only the `Compiler` produces one.
#[derive(Debug, Clone, PartialEq)]
pub struct Bytecode {
    ops: Vec<OpCode>,
}

impl Bytecode {
    pub fn ops(&self) -> &[OpCode] {
        &self.ops
    }
}

/// Stack-based virtual machine for evaluating compiled expressions.
///
/// The VM is stateless; `execute` takes the bytecode, the placeholder value and
/// a scratch stack. Every intermediate value is checked, so a NaN or infinity
/// is reported at the operation that produced it.
pub struct VM;

impl VM {
    pub fn execute(bytecode: &Bytecode, value: f64, stack: &mut Vec<f64>) -> Result<f64, EvalError> {
        if !value.is_finite() {
            return Err(DomainError::NonFiniteInput { value }.into());
        }
        stack.clear();

        for op in &bytecode.ops {
            let result = match *op {
                OpCode::LoadConst(val) => val,
                OpCode::LoadVar => value,
                OpCode::Add => {
                    let (a, b) = pop_pair(stack)?;
                    a + b
                }
                OpCode::Sub => {
                    let (a, b) = pop_pair(stack)?;
                    a - b
                }
                OpCode::Mul => {
                    let (a, b) = pop_pair(stack)?;
                    a * b
                }
                OpCode::Div => {
                    let (a, b) = pop_pair(stack)?;
                    if b == 0.0 {
                        return Err(DomainError::DivisionByZero.into());
                    }
                    a / b
                }
                OpCode::Pow => {
                    let (a, b) = pop_pair(stack)?;
                    a.powf(b)
                }
                OpCode::Neg => -pop(stack)?,
                OpCode::Call(function) => {
                    let arg = pop(stack)?;
                    if !function.in_domain(arg) {
                        return Err(DomainError::OutOfDomain {
                            function: function.name(),
                            argument: arg,
                        }
                        .into());
                    }
                    function.apply(arg)
                }
            };

            if !result.is_finite() {
                return Err(DomainError::NonFinite {
                    operation: op.symbol(),
                }
                .into());
            }
            stack.push(result);
        }

        let result = pop(stack)?;
        if !stack.is_empty() {
            return Err(SyntaxError::Malformed.into());
        }
        Ok(result)
    }
}

fn pop(stack: &mut Vec<f64>) -> Result<f64, EvalError> {
    stack.pop().ok_or_else(|| SyntaxError::Malformed.into())
}

fn pop_pair(stack: &mut Vec<f64>) -> Result<(f64, f64), EvalError> {
    let b = pop(stack)?;
    let a = pop(stack)?;
    Ok((a, b))
}

// --- AST & Compiler ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Abstract Syntax Tree nodes for expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable { name: String, position: usize },
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    Neg(Box<Expr>),
    Call(Function, Box<Expr>),
}

/// Compiles an AST into `Bytecode`, resolving the placeholder name.
pub struct Compiler {
    placeholder: Placeholder,
}

impl Compiler {
    pub fn new(placeholder: Placeholder) -> Self {
        Self { placeholder }
    }

    pub fn compile(&self, expr: &Expr) -> Result<Bytecode, SyntaxError> {
        let mut ops = Vec::new();
        self.compile_recursive(expr, &mut ops)?;
        Ok(Bytecode { ops })
    }

    fn compile_recursive(&self, expr: &Expr, ops: &mut Vec<OpCode>) -> Result<(), SyntaxError> {
        match expr {
            Expr::Number(n) => ops.push(OpCode::LoadConst(*n)),
            Expr::Variable { name, position } => {
                if name != self.placeholder.name() {
                    return Err(SyntaxError::UnknownIdentifier {
                        name: name.clone(),
                        position: *position,
                    });
                }
                ops.push(OpCode::LoadVar);
            }
            Expr::Binary(left, op, right) => {
                self.compile_recursive(left, ops)?;
                self.compile_recursive(right, ops)?;
                ops.push(match op {
                    BinaryOp::Add => OpCode::Add,
                    BinaryOp::Sub => OpCode::Sub,
                    BinaryOp::Mul => OpCode::Mul,
                    BinaryOp::Div => OpCode::Div,
                    BinaryOp::Pow => OpCode::Pow,
                });
            }
            Expr::Neg(operand) => {
                self.compile_recursive(operand, ops)?;
                ops.push(OpCode::Neg);
            }
            Expr::Call(function, arg) => {
                self.compile_recursive(arg, ops)?;
                ops.push(OpCode::Call(*function));
            }
        }
        Ok(())
    }
}

// --- Parser ---

/// Parses a string expression into an AST.
///
/// Precedence, lowest first: `+ -`, `* /`, unary sign, `^` (right associative),
/// then literals, placeholders, calls and parentheses.
pub fn parse(input: &str) -> Result<Expr, SyntaxError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(SyntaxError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let (expr, _) = parser.parse_expression()?;
    match parser.consume() {
        None => Ok(expr),
        Some(extra) => Err(extra.unexpected()),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Identifier(name) => write!(f, "{name}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    position: usize,
}

impl Spanned {
    fn unexpected(&self) -> SyntaxError {
        SyntaxError::UnexpectedToken {
            token: self.token.to_string(),
            position: self.position,
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Spanned>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
            let end = scan_number(&mut chars, position);
            let literal = &input[position..end];
            let value = literal
                .parse::<f64>()
                .map_err(|_| SyntaxError::InvalidNumber {
                    literal: literal.to_string(),
                    position,
                })?;
            tokens.push(Spanned {
                token: Token::Number(value),
                position,
            });
        } else if c.is_alphabetic() {
            let mut end = position;
            while let Some(&(i, d)) = chars.peek() {
                if d.is_alphanumeric() || d == '_' {
                    end = i + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Spanned {
                token: Token::Identifier(input[position..end].to_string()),
                position,
            });
        } else {
            let token = match c {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' | '×' => Token::Star,
                '/' | '÷' => Token::Slash,
                '^' => Token::Caret,
                '(' => Token::LParen,
                ')' => Token::RParen,
                _ => return Err(SyntaxError::UnexpectedCharacter { ch: c, position }),
            };
            chars.next();
            tokens.push(Spanned { token, position });
        }
    }
    Ok(tokens)
}

/// Consumes a run of digits and dots plus an optional exponent, returning the end offset.
/// The literal is validated by the caller, so `1.2.3` is consumed whole and rejected there.
fn scan_number(chars: &mut Peekable<CharIndices<'_>>, start: usize) -> usize {
    let mut end = start;
    while let Some(&(i, d)) = chars.peek() {
        if d.is_ascii_digit() || d == '.' {
            end = i + 1;
            chars.next();
        } else {
            break;
        }
    }

    // `2e3` is a literal but `2exp(1)` is not: only take the `e` if digits follow.
    if let Some(&(_, marker)) = chars.peek() {
        if marker == 'e' || marker == 'E' {
            let mut lookahead = chars.clone();
            lookahead.next();
            if let Some(&(_, sign)) = lookahead.peek() {
                if sign == '+' || sign == '-' {
                    lookahead.next();
                }
            }
            let mut exponent_end = None;
            while let Some(&(j, d)) = lookahead.peek() {
                if d.is_ascii_digit() {
                    exponent_end = Some(j + 1);
                    lookahead.next();
                } else {
                    break;
                }
            }
            if let Some(exponent_end) = exponent_end {
                *chars = lookahead;
                end = exponent_end;
            }
        }
    }
    end
}

/// Deepest nesting accepted by the parser, counting parentheses, calls, signs
/// and the height of operator chains. Deeper input is `SyntaxError::TooDeep`.
pub const MAX_NESTING_DEPTH: usize = 256;

/// An expression paired with the height of its tree.
type Parsed = (Expr, usize);

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|spanned| &spanned.token)
    }

    fn consume(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.pos).cloned();
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    /// Byte offset of the next token, or of the last one at end of input.
    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |spanned| spanned.position)
    }

    fn height(height: usize, position: usize) -> Result<usize, SyntaxError> {
        if height > MAX_NESTING_DEPTH {
            return Err(SyntaxError::TooDeep { position });
        }
        Ok(height)
    }

    fn parse_expression(&mut self) -> Result<Parsed, SyntaxError> {
        let (mut left, mut height) = self.parse_term()?;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            let position = self.position();
            self.consume();
            let (right, right_height) = self.parse_term()?;
            height = Self::height(height.max(right_height) + 1, position)?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok((left, height))
    }

    fn parse_term(&mut self) -> Result<Parsed, SyntaxError> {
        let (mut left, mut height) = self.parse_unary()?;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => break,
            };
            let position = self.position();
            self.consume();
            let (right, right_height) = self.parse_unary()?;
            height = Self::height(height.max(right_height) + 1, position)?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok((left, height))
    }

    // Every parenthesis, call argument, sign and exponent passes through here.
    fn parse_unary(&mut self) -> Result<Parsed, SyntaxError> {
        let position = self.position();
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(SyntaxError::TooDeep { position });
        }
        self.depth += 1;
        let parsed = self.parse_signed(position);
        self.depth -= 1;
        parsed
    }

    fn parse_signed(&mut self, position: usize) -> Result<Parsed, SyntaxError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.consume();
                let (expr, height) = self.parse_unary()?;
                Ok((Expr::Neg(Box::new(expr)), Self::height(height + 1, position)?))
            }
            Some(Token::Plus) => {
                self.consume();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Parsed, SyntaxError> {
        let (base, base_height) = self.parse_primary()?;
        if let Some(Token::Caret) = self.peek() {
            let position = self.position();
            self.consume();
            // Right associative, and the exponent may carry its own sign: 2^-1.
            let (exponent, exponent_height) = self.parse_unary()?;
            let height = Self::height(base_height.max(exponent_height) + 1, position)?;
            return Ok((
                Expr::Binary(Box::new(base), BinaryOp::Pow, Box::new(exponent)),
                height,
            ));
        }
        Ok((base, base_height))
    }

    fn parse_primary(&mut self) -> Result<Parsed, SyntaxError> {
        let spanned = self.consume().ok_or(SyntaxError::UnexpectedEnd)?;
        match spanned.token {
            Token::Number(n) => Ok((Expr::Number(n), 1)),
            Token::Identifier(name) => {
                let is_call = matches!(self.peek(), Some(Token::LParen));
                match Function::from_name(&name) {
                    Some(function) if is_call => {
                        let open = self.consume().map_or(spanned.position, |t| t.position);
                        let (arg, height) = self.parse_expression()?;
                        self.expect_close(open)?;
                        let height = Self::height(height + 1, spanned.position)?;
                        Ok((Expr::Call(function, Box::new(arg)), height))
                    }
                    Some(_) => Err(SyntaxError::MissingArgument {
                        name,
                        position: spanned.position,
                    }),
                    None if is_call => Err(SyntaxError::UnknownFunction {
                        name,
                        position: spanned.position,
                    }),
                    None => Ok((
                        Expr::Variable {
                            name,
                            position: spanned.position,
                        },
                        1,
                    )),
                }
            }
            Token::LParen => {
                let parsed = self.parse_expression()?;
                self.expect_close(spanned.position)?;
                Ok(parsed)
            }
            _ => Err(spanned.unexpected()),
        }
    }

    fn expect_close(&mut self, open: usize) -> Result<(), SyntaxError> {
        match self.consume() {
            Some(Spanned {
                token: Token::RParen,
                ..
            }) => Ok(()),
            Some(other) => Err(other.unexpected()),
            None => Err(SyntaxError::UnclosedParen { position: open }),
        }
    }
}

// --- Equation ---

/// A parsed and compiled single-variable expression.
///
/// Compiled once, immutable afterwards; each evaluation uses its own scratch
/// stack, so an `Equation` can be shared across threads freely.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    source: String,
    placeholder: Placeholder,
    bytecode: Bytecode,
}

impl Equation {
    /// Parses a function of `x`.
    pub fn parse(source: &str) -> Result<Self, SyntaxError> {
        Self::with_placeholder(source, Placeholder::X)
    }

    pub fn with_placeholder(source: &str, placeholder: Placeholder) -> Result<Self, SyntaxError> {
        let expr = parse(source)?;
        let bytecode = Compiler::new(placeholder).compile(&expr)?;
        Ok(Self {
            source: source.to_string(),
            placeholder,
            bytecode,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn placeholder(&self) -> Placeholder {
        self.placeholder
    }

    pub fn bytecode(&self) -> &Bytecode {
        &self.bytecode
    }

    pub fn evaluate(&self, value: f64) -> Result<f64, EvalError> {
        let mut stack = Vec::with_capacity(self.bytecode.ops.len());
        VM::execute(&self.bytecode, value, &mut stack)
    }
}

impl ScalarFunction for Equation {
    fn eval(&self, x: f64) -> Result<f64, EvalError> {
        self.evaluate(x)
    }
}

/// Parses `expression` with the binding's placeholder and evaluates it at the bound value.
pub fn evaluate(expression: &str, binding: Binding) -> Result<f64, EvalError> {
    Equation::with_placeholder(expression, binding.placeholder)?.evaluate(binding.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_x(expression: &str, x: f64) -> f64 {
        evaluate(expression, Binding::x(x)).expect("expression should evaluate")
    }

    fn syntax_error(expression: &str) -> SyntaxError {
        match evaluate(expression, Binding::x(1.0)) {
            Err(EvalError::Syntax(err)) => err,
            other => panic!("expected syntax error for {expression:?}, got {other:?}"),
        }
    }

    fn domain_error(expression: &str, x: f64) -> DomainError {
        match evaluate(expression, Binding::x(x)) {
            Err(EvalError::Domain(err)) => err,
            other => panic!("expected domain error for {expression:?}, got {other:?}"),
        }
    }

    #[test]
    fn evaluates_polynomials_with_precedence() {
        assert_eq!(eval_x("x^3 - 7", 2.0), 1.0);
        assert_eq!(eval_x("1 + 2 * 3", 0.0), 7.0);
        assert_eq!(eval_x("(1 + 2) * 3", 0.0), 9.0);
        assert_eq!(eval_x("8 / 4 / 2", 0.0), 1.0);
        assert_eq!(eval_x("10 - 4 - 3", 0.0), 3.0);
    }

    #[test]
    fn power_is_right_associative_and_binds_tighter_than_sign() {
        assert_eq!(eval_x("2^3^2", 0.0), 512.0);
        assert_eq!(eval_x("-x^2", 3.0), -9.0);
        assert_eq!(eval_x("(-x)^2", 3.0), 9.0);
        assert_eq!(eval_x("2^-1", 0.0), 0.5);
        assert_eq!(eval_x("--x", 4.0), 4.0);
        assert_eq!(eval_x("+x", 4.0), 4.0);
    }

    #[test]
    fn evaluates_named_functions() {
        assert!((eval_x("sqrt(x)", 16.0) - 4.0).abs() < 1e-12);
        assert!((eval_x("log(x)", 1000.0) - 3.0).abs() < 1e-12);
        assert!((eval_x("ln(exp(x))", 1.5) - 1.5).abs() < 1e-12);
        assert!(eval_x("sin(x)", 0.0).abs() < 1e-12);
        assert!((eval_x("cos(x)", 0.0) - 1.0).abs() < 1e-12);
        assert!((eval_x("tan(x)", std::f64::consts::FRAC_PI_4) - 1.0).abs() < 1e-12);
        assert!((eval_x("sin(x) - x/2", 2.0) - (2.0_f64.sin() - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn accepts_number_formats_and_calculator_glyphs() {
        assert!((eval_x("1e-3 * 2E+3", 0.0) - 2.0).abs() < 1e-12);
        assert_eq!(eval_x("2.5e2", 0.0), 250.0);
        assert_eq!(eval_x(".5 + 5.", 0.0), 5.5);
        assert_eq!(eval_x("6 × x ÷ 4", 2.0), 3.0);
    }

    #[test]
    fn ans_placeholder_binds_previous_result() {
        let value = evaluate("Ans - (Ans^3 - 7)/(3*Ans^2)", Binding::ans(2.0))
            .expect("newton formula should evaluate");
        assert!((value - (2.0 - 1.0 / 12.0)).abs() < 1e-12);
    }

    #[test]
    fn placeholder_must_match_binding() {
        assert_eq!(
            match evaluate("Ans + 1", Binding::x(1.0)) {
                Err(EvalError::Syntax(err)) => err,
                other => panic!("unexpected {other:?}"),
            },
            SyntaxError::UnknownIdentifier {
                name: "Ans".to_string(),
                position: 0
            }
        );
        assert!(evaluate("x + 1", Binding::ans(1.0))
            .expect_err("x is not bound")
            .is_syntax());
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert_eq!(syntax_error(""), SyntaxError::Empty);
        assert_eq!(syntax_error("   "), SyntaxError::Empty);
        assert_eq!(syntax_error("x +"), SyntaxError::UnexpectedEnd);
        assert_eq!(syntax_error("(x + 1"), SyntaxError::UnclosedParen { position: 0 });
        assert_eq!(
            syntax_error("x + 1)"),
            SyntaxError::UnexpectedToken {
                token: ")".to_string(),
                position: 5
            }
        );
        assert_eq!(
            syntax_error("x $ 2"),
            SyntaxError::UnexpectedCharacter { ch: '$', position: 2 }
        );
        assert_eq!(
            syntax_error("1.2.3"),
            SyntaxError::InvalidNumber {
                literal: "1.2.3".to_string(),
                position: 0
            }
        );
        assert_eq!(
            syntax_error("foo(x)"),
            SyntaxError::UnknownFunction {
                name: "foo".to_string(),
                position: 0
            }
        );
        assert_eq!(
            syntax_error("sin x"),
            SyntaxError::MissingArgument {
                name: "sin".to_string(),
                position: 0
            }
        );
        assert!(matches!(
            syntax_error("2x"),
            SyntaxError::UnexpectedToken { position: 1, .. }
        ));
        assert!(matches!(
            syntax_error("2exp(1)"),
            SyntaxError::UnexpectedToken { position: 1, .. }
        ));
        assert!(matches!(syntax_error("y + 1"), SyntaxError::UnknownIdentifier { .. }));
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let parens = format!("{}x{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(
            syntax_error(&parens),
            SyntaxError::TooDeep {
                position: MAX_NESTING_DEPTH
            }
        );

        let signs = format!("{}x", "-".repeat(200_000));
        assert!(matches!(syntax_error(&signs), SyntaxError::TooDeep { .. }));

        let calls = format!("{}x{}", "sin(".repeat(10_000), ")".repeat(10_000));
        assert!(matches!(syntax_error(&calls), SyntaxError::TooDeep { .. }));

        let sum = vec!["x"; 10_000].join(" + ");
        assert!(matches!(syntax_error(&sum), SyntaxError::TooDeep { .. }));

        let tower = vec!["x"; 10_000].join("^");
        assert!(matches!(syntax_error(&tower), SyntaxError::TooDeep { .. }));
    }

    #[test]
    fn nesting_below_the_limit_still_evaluates() {
        let parens = format!("{}x{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(eval_x(&parens, 3.0), 3.0);
        assert_eq!(eval_x(&vec!["x"; 200].join(" + "), 1.0), 200.0);
        assert_eq!(eval_x(&format!("{}x", "-".repeat(200)), 2.0), 2.0);
    }

    #[test]
    fn non_finite_results_are_domain_errors() {
        assert_eq!(
            domain_error("sqrt(-1)", 0.0),
            DomainError::OutOfDomain {
                function: "sqrt",
                argument: -1.0
            }
        );
        assert_eq!(
            domain_error("sqrt(x)", -4.0),
            DomainError::OutOfDomain {
                function: "sqrt",
                argument: -4.0
            }
        );
        assert!(matches!(
            domain_error("log(x)", 0.0),
            DomainError::OutOfDomain { function: "log", .. }
        ));
        assert!(matches!(
            domain_error("ln(x)", -1.0),
            DomainError::OutOfDomain { function: "ln", .. }
        ));
        assert_eq!(domain_error("1/x", 0.0), DomainError::DivisionByZero);
        assert_eq!(
            domain_error("exp(x)", 1000.0),
            DomainError::NonFinite { operation: "exp" }
        );
        assert_eq!(
            domain_error("x^0.5", -1.0),
            DomainError::NonFinite { operation: "^" }
        );
        assert!(matches!(
            domain_error("x", f64::NAN),
            DomainError::NonFiniteInput { .. }
        ));
    }

    #[test]
    fn evaluation_never_leaks_non_finite_values() {
        let expressions = ["x^3 - 7", "1/x", "sqrt(x)", "ln(x)", "tan(x)", "exp(x^2)", "x^x"];
        let points = [-1e6, -3.0, -1.0, 0.0, 1e-300, 0.5, 2.0, 700.0, 1e6];
        for expression in expressions {
            let equation = Equation::parse(expression).expect("expression should parse");
            for x in points {
                if let Ok(value) = equation.evaluate(x) {
                    assert!(value.is_finite(), "{expression} at {x} leaked {value}");
                }
            }
        }
    }

    #[test]
    fn compiled_equation_is_reusable_and_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Equation>();

        let equation = Equation::parse("x^2 - 4").expect("parse");
        assert_eq!(equation.source(), "x^2 - 4");
        assert_eq!(equation.placeholder(), Placeholder::X);
        assert_eq!(equation.evaluate(3.0), Ok(5.0));
        assert_eq!(equation.evaluate(3.0), Ok(5.0));
        assert_eq!(equation.eval(-2.0), Ok(0.0));
    }

    #[test]
    fn compiler_emits_postfix_order() {
        let expr = parse("-(x + 2) * sqrt(x)").expect("parse");
        let bytecode = Compiler::new(Placeholder::X).compile(&expr).expect("compile");
        assert_eq!(
            bytecode.ops(),
            &[
                OpCode::LoadVar,
                OpCode::LoadConst(2.0),
                OpCode::Add,
                OpCode::Neg,
                OpCode::LoadVar,
                OpCode::Call(Function::Sqrt),
                OpCode::Mul,
            ]
        );
    }
}
