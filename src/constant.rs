//! Typed constant-expression evaluation.
//!
//! Literal/operator trees with eager evaluation on construction. Every
//! node ends up carrying a signed *and* unsigned 64-bit representation
//! plus a "natural" integer width, so later rendering passes can cast
//! correctly per target (see module doc in spec §4.3/§9 "Constant
//! evaluation width"). Grounded on the teacher's `Type`/`Effect` tagged-enum
//! style (`types.rs`) for the node shape, and on the original's universal
//! promotion-to-`long long` discipline (carried here as dual signed/unsigned
//! i64/u64 fields instead of one C++ `int64_t`).

use crate::error::{HidlError, Result};
use std::fmt;

/// Integer storage widths a constant can be declared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
}

impl IntKind {
    pub fn bits(self) -> u32 {
        match self {
            IntKind::I8 | IntKind::U8 => 8,
            IntKind::I16 | IntKind::U16 => 16,
            IntKind::I32 | IntKind::U32 => 32,
            IntKind::I64 | IntKind::U64 => 64,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, IntKind::I8 | IntKind::I16 | IntKind::I32 | IntKind::I64)
    }

    pub fn unsigned_equivalent(self) -> IntKind {
        match self {
            IntKind::I8 | IntKind::U8 => IntKind::U8,
            IntKind::I16 | IntKind::U16 => IntKind::U16,
            IntKind::I32 | IntKind::U32 => IntKind::U32,
            IntKind::I64 | IntKind::U64 => IntKind::U64,
        }
    }

    fn at_bits(bits: u32, signed: bool) -> IntKind {
        match (bits, signed) {
            (8, true) => IntKind::I8,
            (8, false) => IntKind::U8,
            (16, true) => IntKind::I16,
            (16, false) => IntKind::U16,
            (32, true) => IntKind::I32,
            (32, false) => IntKind::U32,
            _ if signed => IntKind::I64,
            _ => IntKind::U64,
        }
    }

    /// C-family integer promotion applied to the widest of two operand
    /// kinds: widen to the larger bit width; if the widths tie and either
    /// side is unsigned, the result is unsigned.
    pub fn promote(self, other: IntKind) -> IntKind {
        let bits = self.bits().max(other.bits());
        let signed = if self.bits() == other.bits() {
            self.is_signed() && other.is_signed()
        } else if self.bits() > other.bits() {
            self.is_signed()
        } else {
            other.is_signed()
        };
        IntKind::at_bits(bits, signed)
    }

    pub fn min_value(self) -> i64 {
        if !self.is_signed() {
            return 0;
        }
        match self.bits() {
            8 => i8::MIN as i64,
            16 => i16::MIN as i64,
            32 => i32::MIN as i64,
            _ => i64::MIN,
        }
    }

    pub fn max_value(self) -> i64 {
        match (self.bits(), self.is_signed()) {
            (8, true) => i8::MAX as i64,
            (8, false) => u8::MAX as i64,
            (16, true) => i16::MAX as i64,
            (16, false) => u16::MAX as i64,
            (32, true) => i32::MAX as i64,
            (32, false) => u32::MAX as i64,
            (_, true) => i64::MAX,
            (_, false) => i64::MAX, // u64::MAX doesn't fit in i64; callers compare via unsigned path
        }
    }
}

impl fmt::Display for IntKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntKind::I8 => "i8",
            IntKind::U8 => "u8",
            IntKind::I16 => "i16",
            IntKind::U16 => "u16",
            IntKind::I32 => "i32",
            IntKind::U32 => "u32",
            IntKind::I64 => "i64",
            IntKind::U64 => "u64",
        };
        write!(f, "{s}")
    }
}

/// The dual signed/unsigned result of evaluating a constant expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstValue {
    pub signed: i64,
    pub unsigned: u64,
    pub kind: IntKind,
}

impl ConstValue {
    pub fn new(bits: u64, kind: IntKind) -> ConstValue {
        ConstValue {
            signed: bits as i64,
            unsigned: bits,
            kind,
        }
    }

    /// `add-one`, so enum auto-fill can chain off the previous value
    /// without re-parsing a literal.
    pub fn add_one(&self) -> ConstValue {
        ConstValue::new(self.unsigned.wrapping_add(1), self.kind)
    }

    /// Widen/reinterpret to `storage`, the declared enum storage kind.
    /// Narrowing into a signed destination sign-extends from the source
    /// bit pattern's new width, so a negative value stays negative
    /// instead of reappearing as a large unsigned magnitude.
    pub fn cast_to(&self, storage: IntKind) -> ConstValue {
        let mask = mask_for(storage.bits());
        let masked = self.unsigned & mask;
        if storage.is_signed() {
            ConstValue {
                signed: sign_extend(masked, storage.bits()),
                unsigned: masked,
                kind: storage,
            }
        } else {
            ConstValue::new(masked, storage)
        }
    }

    /// Native (C-family) literal rendering: unsigned values render as hex
    /// with the kind's suffix.
    pub fn render_native(&self) -> String {
        if self.kind.is_signed() {
            self.signed.to_string()
        } else {
            format!("0x{:x}{}", self.unsigned, native_suffix(self.kind))
        }
    }

    /// Managed (JVM-style) literal rendering: the target's integer types
    /// are always signed, so unsigned storage above half-range is
    /// reinterpreted as negative the way Java's `byte`/`short`/`int` would
    /// see the same bit pattern.
    pub fn render_managed(&self) -> String {
        let bits = self.kind.bits();
        let signed_kind = IntKind::at_bits(bits, true);
        let reinterpreted = sign_extend(self.unsigned, bits);
        let _ = signed_kind;
        reinterpreted.to_string()
    }
}

fn mask_for(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

fn sign_extend(bits_value: u64, bits: u32) -> i64 {
    if bits >= 64 {
        return bits_value as i64;
    }
    let shift = 64 - bits;
    ((bits_value << shift) as i64) >> shift
}

fn native_suffix(kind: IntKind) -> &'static str {
    match kind {
        IntKind::U8 => "u8",
        IntKind::U16 => "u16",
        IntKind::U32 => "u32",
        IntKind::U64 => "u64",
        _ => "",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    BitNot,
    LogicalNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    LogicalAnd,
    LogicalOr,
}

#[derive(Debug, Clone)]
enum ExprNode {
    Literal,
    Unary(UnaryOp, Box<ConstantExpression>),
    Binary(BinaryOp, Box<ConstantExpression>, Box<ConstantExpression>),
    Ternary(Box<ConstantExpression>, Box<ConstantExpression>, Box<ConstantExpression>),
    Ident(String),
}

/// An evaluated constant expression: the AST node plus its eagerly
/// computed [`ConstValue`].
#[derive(Debug, Clone)]
pub struct ConstantExpression {
    node: ExprNode,
    value: ConstValue,
}

impl ConstantExpression {
    pub fn value(&self) -> ConstValue {
        self.value
    }

    /// Parse a single numeric literal: binary (`0b`), octal (`0o`/leading
    /// `0`), decimal, or hex (`0x`), with an optional `u`/`l`/`ul` suffix.
    pub fn literal(text: &str) -> Result<ConstantExpression> {
        let (digits, base, rest) = if let Some(d) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            (d, 16, &text[2..])
        } else if let Some(d) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
            (d, 2, &text[2..])
        } else if let Some(d) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
            (d, 8, &text[2..])
        } else if text.len() > 1 && text.starts_with('0') {
            (&text[1..], 8, &text[1..])
        } else {
            (text, 10, text)
        };
        let _ = rest;

        let (number_part, suffix) = split_suffix(digits);
        let unsigned_suffix = suffix.to_lowercase().contains('u');

        let bits = u64::from_str_radix(number_part, base)
            .map_err(|_| HidlError::TypeConstraint(format!("invalid integer literal '{text}'")))?;

        let kind = natural_kind(bits, unsigned_suffix || base != 10);
        Ok(ConstantExpression {
            node: ExprNode::Literal,
            value: ConstValue::new(bits, kind),
        })
    }

    pub fn unary(op: UnaryOp, operand: ConstantExpression) -> ConstantExpression {
        let kind = operand.value.kind;
        let value = match op {
            UnaryOp::Plus => operand.value,
            UnaryOp::Minus => ConstValue::new((-(operand.value.signed)) as u64, kind),
            UnaryOp::BitNot => ConstValue::new(!operand.value.unsigned, kind),
            UnaryOp::LogicalNot => ConstValue::new((operand.value.unsigned == 0) as u64, IntKind::I32),
        };
        ConstantExpression {
            node: ExprNode::Unary(op, Box::new(operand)),
            value,
        }
    }

    pub fn binary(op: BinaryOp, lhs: ConstantExpression, rhs: ConstantExpression) -> Result<ConstantExpression> {
        // Shifts adopt the left operand's kind (spec §4.3); everything else
        // promotes to the widest of the two operand kinds.
        let kind = match op {
            BinaryOp::Shl | BinaryOp::Shr => lhs.value.kind,
            _ => lhs.value.kind.promote(rhs.value.kind),
        };
        let a = lhs.value.signed;
        let b = rhs.value.signed;
        let au = lhs.value.unsigned;
        let bu = rhs.value.unsigned;
        let signed = kind.is_signed();

        let raw: u64 = match op {
            BinaryOp::Add => if signed { (a.wrapping_add(b)) as u64 } else { au.wrapping_add(bu) },
            BinaryOp::Sub => if signed { (a.wrapping_sub(b)) as u64 } else { au.wrapping_sub(bu) },
            BinaryOp::Mul => if signed { (a.wrapping_mul(b)) as u64 } else { au.wrapping_mul(bu) },
            BinaryOp::Div => {
                if bu == 0 {
                    return Err(HidlError::TypeConstraint("division by zero in constant expression".to_string()));
                }
                if signed { (a.wrapping_div(b)) as u64 } else { au / bu }
            }
            BinaryOp::Mod => {
                if bu == 0 {
                    return Err(HidlError::TypeConstraint("modulo by zero in constant expression".to_string()));
                }
                if signed { (a.wrapping_rem(b)) as u64 } else { au % bu }
            }
            BinaryOp::BitAnd => au & bu,
            BinaryOp::BitOr => au | bu,
            BinaryOp::BitXor => au ^ bu,
            BinaryOp::Shl => au.wrapping_shl(bu as u32 & 63),
            BinaryOp::Shr => {
                if signed {
                    (a.wrapping_shr(bu as u32 & 63)) as u64
                } else {
                    au.wrapping_shr(bu as u32 & 63)
                }
            }
            BinaryOp::Lt => ((if signed { a < b } else { au < bu }) as u64),
            BinaryOp::Le => ((if signed { a <= b } else { au <= bu }) as u64),
            BinaryOp::Gt => ((if signed { a > b } else { au > bu }) as u64),
            BinaryOp::Ge => ((if signed { a >= b } else { au >= bu }) as u64),
            BinaryOp::Eq => ((au == bu) as u64),
            BinaryOp::Ne => ((au != bu) as u64),
            BinaryOp::LogicalAnd => (((au != 0) && (bu != 0)) as u64),
            BinaryOp::LogicalOr => (((au != 0) || (bu != 0)) as u64),
        };

        let result_kind = match op {
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
            | BinaryOp::LogicalAnd | BinaryOp::LogicalOr => IntKind::I32,
            _ => kind,
        };

        Ok(ConstantExpression {
            node: ExprNode::Binary(op, Box::new(lhs), Box::new(rhs)),
            value: ConstValue::new(raw, result_kind),
        })
    }

    pub fn ternary(
        cond: ConstantExpression,
        then_branch: ConstantExpression,
        else_branch: ConstantExpression,
    ) -> ConstantExpression {
        let value = if cond.value.unsigned != 0 {
            then_branch.value
        } else {
            else_branch.value
        };
        ConstantExpression {
            node: ExprNode::Ternary(Box::new(cond), Box::new(then_branch), Box::new(else_branch)),
            value,
        }
    }

    /// An identifier reference to a named enum value, already resolved to
    /// its value at construction time (name resolution happens before the
    /// expression tree is built; see [`crate::scope::Scope`]).
    pub fn ident(name: impl Into<String>, value: ConstValue) -> ConstantExpression {
        ConstantExpression {
            node: ExprNode::Ident(name.into()),
            value,
        }
    }
}

fn split_suffix(s: &str) -> (&str, &str) {
    let split_at = s
        .char_indices()
        .find(|(_, c)| matches!(c, 'u' | 'U' | 'l' | 'L'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    (&s[..split_at], &s[split_at..])
}

fn natural_kind(bits: u64, unsigned: bool) -> IntKind {
    if unsigned {
        if bits <= u32::MAX as u64 {
            IntKind::U32
        } else {
            IntKind::U64
        }
    } else if bits <= i32::MAX as u64 {
        IntKind::I32
    } else {
        IntKind::I64
    }
}
