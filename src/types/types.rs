use std::fmt::Display;

use crate::ast::ast::DeclId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
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

    pub fn min(self) -> i128 {
        if self.is_signed() {
            -(1i128 << (self.bits() - 1))
        } else {
            0
        }
    }

    pub fn max(self) -> i128 {
        if self.is_signed() {
            (1i128 << (self.bits() - 1)) - 1
        } else {
            (1i128 << self.bits()) - 1
        }
    }

    pub fn contains(self, value: i128) -> bool {
        (self.min()..=self.max()).contains(&value)
    }

    /// Truncates `value` to this width, two's complement.
    pub fn wrap(self, value: i128) -> i128 {
        let bits = self.bits();
        let modulus = 1i128 << bits;
        let truncated = value.rem_euclid(modulus);

        if self.is_signed() && truncated > self.max() {
            truncated - modulus
        } else {
            truncated
        }
    }

    fn with_signedness(bits: u32, signed: bool) -> IntKind {
        match (bits, signed) {
            (8, true) => IntKind::I8,
            (16, true) => IntKind::I16,
            (32, true) => IntKind::I32,
            (64, true) => IntKind::I64,
            (8, false) => IntKind::U8,
            (16, false) => IntKind::U16,
            (32, false) => IntKind::U32,
            _ => IntKind::U64,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntKind::I8 => "i8",
            IntKind::I16 => "i16",
            IntKind::I32 => "i32",
            IntKind::I64 => "i64",
            IntKind::U8 => "u8",
            IntKind::U16 => "u16",
            IntKind::U32 => "u32",
            IntKind::U64 => "u64",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatKind {
    F32,
    F64,
}

impl FloatKind {
    pub fn bits(self) -> u32 {
        match self {
            FloatKind::F32 => 32,
            FloatKind::F64 => 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<Type>,
    pub ret: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Void,
    Bool,
    Int(IntKind),
    Float(FloatKind),
    /// Type of an integer literal before it meets a concrete type.
    ComptimeInt,
    ComptimeFloat,
    String,
    Pointer(Box<Type>),
    Array(Box<Type>, u64),
    VarArray(Box<Type>),
    Struct {
        decl: DeclId,
        name: String,
        is_union: bool,
    },
    Enum {
        decl: DeclId,
        name: String,
        backing: IntKind,
    },
    Alias {
        name: String,
        target: Box<Type>,
    },
    Function(Box<Signature>),
    /// Type of an expression that names a type.
    TypeInfo,
}

impl Type {
    pub fn builtin(name: &str) -> Option<Type> {
        let ty = match name {
            "void" => Type::Void,
            "bool" => Type::Bool,
            "i8" => Type::Int(IntKind::I8),
            "i16" => Type::Int(IntKind::I16),
            "i32" => Type::Int(IntKind::I32),
            "i64" => Type::Int(IntKind::I64),
            "u8" => Type::Int(IntKind::U8),
            "u16" => Type::Int(IntKind::U16),
            "u32" => Type::Int(IntKind::U32),
            "u64" => Type::Int(IntKind::U64),
            "f32" => Type::Float(FloatKind::F32),
            "f64" => Type::Float(FloatKind::F64),
            "string" => Type::String,
            _ => return None,
        };
        Some(ty)
    }

    pub fn pointer_to(ty: Type) -> Type {
        Type::Pointer(Box::new(ty))
    }

    /// The type of `nil`.
    pub fn void_pointer() -> Type {
        Type::pointer_to(Type::Void)
    }

    /// Strips aliases.
    pub fn canonical(&self) -> &Type {
        match self {
            Type::Alias { target, .. } => target.canonical(),
            other => other,
        }
    }

    pub fn same_as(&self, other: &Type) -> bool {
        self.canonical().strip_aliases() == other.canonical().strip_aliases()
    }

    fn strip_aliases(&self) -> Type {
        match self.canonical() {
            Type::Pointer(inner) => Type::pointer_to(inner.strip_aliases()),
            Type::Array(inner, len) => Type::Array(Box::new(inner.strip_aliases()), *len),
            Type::VarArray(inner) => Type::VarArray(Box::new(inner.strip_aliases())),
            other => other.clone(),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.canonical(), Type::Int(_) | Type::ComptimeInt)
    }

    pub fn is_float(&self) -> bool {
        matches!(self.canonical(), Type::Float(_) | Type::ComptimeFloat)
    }

    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_comptime(&self) -> bool {
        matches!(self.canonical(), Type::ComptimeInt | Type::ComptimeFloat)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.canonical(), Type::Bool)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.canonical(), Type::Pointer(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self.canonical(), Type::Void)
    }

    pub fn may_negate(&self) -> bool {
        match self.canonical() {
            Type::Int(kind) => kind.is_signed(),
            Type::ComptimeInt | Type::Float(_) | Type::ComptimeFloat => true,
            _ => false,
        }
    }

    pub fn int_kind(&self) -> Option<IntKind> {
        match self.canonical() {
            Type::Int(kind) => Some(*kind),
            Type::Enum { backing, .. } => Some(*backing),
            _ => None,
        }
    }

    pub fn bit_width(&self) -> Option<u32> {
        match self.canonical() {
            Type::Int(kind) => Some(kind.bits()),
            Type::Float(kind) => Some(kind.bits()),
            Type::Bool => Some(1),
            Type::Pointer(_) => Some(64),
            _ => None,
        }
    }

    pub fn pointee(&self) -> Option<&Type> {
        match self.canonical() {
            Type::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// Size in bytes of types whose layout needs no declaration lookup.
    pub fn builtin_size(&self) -> Option<u64> {
        match self.canonical() {
            Type::Bool => Some(1),
            Type::Int(kind) => Some(kind.bits() as u64 / 8),
            Type::Float(kind) => Some(kind.bits() as u64 / 8),
            Type::Pointer(_) | Type::Function(_) => Some(8),
            Type::String | Type::VarArray(_) => Some(16),
            _ => None,
        }
    }

    /// Usual arithmetic conversion of two numeric types.
    pub fn promote(left: &Type, right: &Type) -> Option<Type> {
        let (left, right) = (left.canonical(), right.canonical());

        let promoted = match (left, right) {
            (Type::ComptimeInt, Type::ComptimeInt) => Type::ComptimeInt,
            (Type::ComptimeInt | Type::ComptimeFloat, Type::ComptimeInt | Type::ComptimeFloat) => {
                Type::ComptimeFloat
            }
            (Type::ComptimeInt, other) | (other, Type::ComptimeInt) if other.is_number() => {
                other.clone()
            }
            (Type::ComptimeFloat, Type::Int(_)) | (Type::Int(_), Type::ComptimeFloat) => {
                Type::Float(FloatKind::F64)
            }
            (Type::ComptimeFloat, Type::Float(kind)) | (Type::Float(kind), Type::ComptimeFloat) => {
                Type::Float(*kind)
            }
            (Type::Float(a), Type::Float(b)) => Type::Float(if a.bits() >= b.bits() { *a } else { *b }),
            (Type::Float(kind), Type::Int(_)) | (Type::Int(_), Type::Float(kind)) => Type::Float(*kind),
            (Type::Int(a), Type::Int(b)) => {
                let bits = a.bits().max(b.bits());
                let signed = if a.bits() == b.bits() {
                    a.is_signed() && b.is_signed()
                } else if a.bits() > b.bits() {
                    a.is_signed()
                } else {
                    b.is_signed()
                };
                Type::Int(IntKind::with_signedness(bits, signed))
            }
            _ => return None,
        };

        Some(promoted)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "bool"),
            Type::Int(kind) => write!(f, "{}", kind.name()),
            Type::Float(FloatKind::F32) => write!(f, "f32"),
            Type::Float(FloatKind::F64) => write!(f, "f64"),
            Type::ComptimeInt => write!(f, "untyped int"),
            Type::ComptimeFloat => write!(f, "untyped float"),
            Type::String => write!(f, "string"),
            Type::Pointer(inner) => write!(f, "{}*", inner),
            Type::Array(inner, len) => write!(f, "{}[{}]", inner, len),
            Type::VarArray(inner) => write!(f, "{}[]", inner),
            Type::Struct { name, .. } | Type::Enum { name, .. } | Type::Alias { name, .. } => {
                write!(f, "{}", name)
            }
            Type::Function(signature) => {
                let params = signature
                    .params
                    .iter()
                    .map(|param| param.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "fn ({}) -> {}", params, signature.ret)
            }
            Type::TypeInfo => write!(f, "typeid"),
        }
    }
}
