use std::fmt;

/// The fixed operator catalogue. Every operator has a declared arity of one or two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    // Binary arithmetic.
    Add,
    Sub,
    Mul,
    /// Truncating division for integers, IEEE division for floats.
    Div,
    /// Always divides in floating point.
    TrueDiv,
    FloorDiv,
    /// Remainder with the sign of the dividend.
    Mod,
    /// Remainder with the sign of the divisor.
    PyMod,
    Pow,

    // Binary comparison.
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,

    // Binary bitwise.
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,

    // Binary logical.
    LogicalAnd,
    LogicalOr,

    // Null-safe binary.
    /// Equality where two nulls compare equal; never null.
    NullEqual,
    /// Kleene AND: `false` wins over null.
    NullLogicalAnd,
    /// Kleene OR: `true` wins over null.
    NullLogicalOr,
    /// First valid operand.
    Coalesce,

    // Aggregate-style combinators over the two operand values.
    Mean,
    Variance,
    StdDev,

    // Unary.
    Identity,
    IsNull,
    IsValid,
    Not,
    BitInvert,
    Negate,
    Abs,
    Ceil,
    Floor,
    Rint,
    Sqrt,
    Cbrt,
    Exp,
    Log,
    Sin,
    Cos,
    Tan,
    ArcSin,
    ArcCos,
    ArcTan,
    Sinh,
    Cosh,
    Tanh,
    ArcSinh,
    ArcCosh,
    ArcTanh,
    CastToInt64,
    CastToUInt64,
    CastToFloat64,
}

const ALL: &[Operator] = &[
    Operator::Add,
    Operator::Sub,
    Operator::Mul,
    Operator::Div,
    Operator::TrueDiv,
    Operator::FloorDiv,
    Operator::Mod,
    Operator::PyMod,
    Operator::Pow,
    Operator::Equal,
    Operator::NotEqual,
    Operator::Less,
    Operator::Greater,
    Operator::LessEqual,
    Operator::GreaterEqual,
    Operator::BitwiseAnd,
    Operator::BitwiseOr,
    Operator::BitwiseXor,
    Operator::LogicalAnd,
    Operator::LogicalOr,
    Operator::NullEqual,
    Operator::NullLogicalAnd,
    Operator::NullLogicalOr,
    Operator::Coalesce,
    Operator::Mean,
    Operator::Variance,
    Operator::StdDev,
    Operator::Identity,
    Operator::IsNull,
    Operator::IsValid,
    Operator::Not,
    Operator::BitInvert,
    Operator::Negate,
    Operator::Abs,
    Operator::Ceil,
    Operator::Floor,
    Operator::Rint,
    Operator::Sqrt,
    Operator::Cbrt,
    Operator::Exp,
    Operator::Log,
    Operator::Sin,
    Operator::Cos,
    Operator::Tan,
    Operator::ArcSin,
    Operator::ArcCos,
    Operator::ArcTan,
    Operator::Sinh,
    Operator::Cosh,
    Operator::Tanh,
    Operator::ArcSinh,
    Operator::ArcCosh,
    Operator::ArcTanh,
    Operator::CastToInt64,
    Operator::CastToUInt64,
    Operator::CastToFloat64,
];

impl Operator {
    pub fn all() -> &'static [Operator] {
        ALL
    }

    pub fn arity(self) -> usize {
        if self.is_unary() {
            1
        } else {
            2
        }
    }

    pub fn is_unary(self) -> bool {
        matches!(
            self,
            Operator::Identity
                | Operator::IsNull
                | Operator::IsValid
                | Operator::Not
                | Operator::BitInvert
                | Operator::Negate
                | Operator::Abs
                | Operator::Ceil
                | Operator::Floor
                | Operator::Rint
                | Operator::Sqrt
                | Operator::Cbrt
                | Operator::Exp
                | Operator::Log
                | Operator::Sin
                | Operator::Cos
                | Operator::Tan
                | Operator::ArcSin
                | Operator::ArcCos
                | Operator::ArcTan
                | Operator::Sinh
                | Operator::Cosh
                | Operator::Tanh
                | Operator::ArcSinh
                | Operator::ArcCosh
                | Operator::ArcTanh
                | Operator::CastToInt64
                | Operator::CastToUInt64
                | Operator::CastToFloat64
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::Equal
                | Operator::NotEqual
                | Operator::Less
                | Operator::Greater
                | Operator::LessEqual
                | Operator::GreaterEqual
                | Operator::NullEqual
        )
    }

    /// Null-safe operators define their own validity rule instead of "valid iff every operand is
    /// valid".
    pub fn is_null_safe(self) -> bool {
        matches!(
            self,
            Operator::IsNull
                | Operator::IsValid
                | Operator::NullEqual
                | Operator::NullLogicalAnd
                | Operator::NullLogicalOr
                | Operator::Coalesce
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Operator::Add => "ADD",
            Operator::Sub => "SUB",
            Operator::Mul => "MUL",
            Operator::Div => "DIV",
            Operator::TrueDiv => "TRUE_DIV",
            Operator::FloorDiv => "FLOOR_DIV",
            Operator::Mod => "MOD",
            Operator::PyMod => "PYMOD",
            Operator::Pow => "POW",
            Operator::Equal => "EQUAL",
            Operator::NotEqual => "NOT_EQUAL",
            Operator::Less => "LESS",
            Operator::Greater => "GREATER",
            Operator::LessEqual => "LESS_EQUAL",
            Operator::GreaterEqual => "GREATER_EQUAL",
            Operator::BitwiseAnd => "BITWISE_AND",
            Operator::BitwiseOr => "BITWISE_OR",
            Operator::BitwiseXor => "BITWISE_XOR",
            Operator::LogicalAnd => "LOGICAL_AND",
            Operator::LogicalOr => "LOGICAL_OR",
            Operator::NullEqual => "NULL_EQUAL",
            Operator::NullLogicalAnd => "NULL_LOGICAL_AND",
            Operator::NullLogicalOr => "NULL_LOGICAL_OR",
            Operator::Coalesce => "COALESCE",
            Operator::Mean => "MEAN",
            Operator::Variance => "VARIANCE",
            Operator::StdDev => "STD",
            Operator::Identity => "IDENTITY",
            Operator::IsNull => "IS_NULL",
            Operator::IsValid => "IS_VALID",
            Operator::Not => "NOT",
            Operator::BitInvert => "BIT_INVERT",
            Operator::Negate => "NEGATE",
            Operator::Abs => "ABS",
            Operator::Ceil => "CEIL",
            Operator::Floor => "FLOOR",
            Operator::Rint => "RINT",
            Operator::Sqrt => "SQRT",
            Operator::Cbrt => "CBRT",
            Operator::Exp => "EXP",
            Operator::Log => "LOG",
            Operator::Sin => "SIN",
            Operator::Cos => "COS",
            Operator::Tan => "TAN",
            Operator::ArcSin => "ARCSIN",
            Operator::ArcCos => "ARCCOS",
            Operator::ArcTan => "ARCTAN",
            Operator::Sinh => "SINH",
            Operator::Cosh => "COSH",
            Operator::Tanh => "TANH",
            Operator::ArcSinh => "ARCSINH",
            Operator::ArcCosh => "ARCCOSH",
            Operator::ArcTanh => "ARCTANH",
            Operator::CastToInt64 => "CAST_TO_INT64",
            Operator::CastToUInt64 => "CAST_TO_UINT64",
            Operator::CastToFloat64 => "CAST_TO_FLOAT64",
        }
    }

    /// Case-insensitive lookup by [`Operator::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        ALL.iter().copied().find(|op| op.name() == upper)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
