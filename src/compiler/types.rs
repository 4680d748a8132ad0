//! The semantic type representation (spec §3.3) and its flags.
//!
//! `Type` is a tagged enum, not the teacher's `Box<dyn TypeData>` graph — see
//! `DESIGN.md` for why. Types are cheap to clone (`Rc` for the variants that
//! own non-trivial payloads) since, once constructed, they are immutable
//! value-like records (spec §3.3 "Ownership / lifecycle").

use bitflags::bitflags;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::compiler::ast::node_flags::Variance;

bitflags! {
    /// Coarse classification of a `Type`, mirroring the teacher's
    /// `compiler::types::TypeFlags` bit layout for the variants this crate
    /// implements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u32 {
        const NONE = 0;
        const ANY = 1 << 0;
        const UNKNOWN = 1 << 1;
        const STRING = 1 << 2;
        const NUMBER = 1 << 3;
        const BOOLEAN = 1 << 4;
        const BIGINT = 1 << 5;
        const STRING_LITERAL = 1 << 6;
        const NUMBER_LITERAL = 1 << 7;
        const BOOLEAN_LITERAL = 1 << 8;
        const BIGINT_LITERAL = 1 << 9;
        const UNIQUE_SYMBOL = 1 << 10;
        const VOID = 1 << 11;
        const UNDEFINED = 1 << 12;
        const NULL = 1 << 13;
        const NEVER = 1 << 14;
        const TYPE_PARAMETER = 1 << 15;
        const OBJECT = 1 << 16;
        const UNION = 1 << 17;
        const INTERSECTION = 1 << 18;
        const INDEX = 1 << 19;
        const INDEXED_ACCESS = 1 << 20;
        const CONDITIONAL = 1 << 21;
        const TEMPLATE_LITERAL = 1 << 22;
        const ENUM = 1 << 23;

        const ANY_OR_UNKNOWN = Self::ANY.bits() | Self::UNKNOWN.bits();
        const NULLABLE = Self::UNDEFINED.bits() | Self::NULL.bits();
        const LITERAL = Self::STRING_LITERAL.bits() | Self::NUMBER_LITERAL.bits()
            | Self::BOOLEAN_LITERAL.bits() | Self::BIGINT_LITERAL.bits();
        const UNIT = Self::ENUM.bits() | Self::LITERAL.bits() | Self::UNIQUE_SYMBOL.bits() | Self::NULLABLE.bits();
    }
}

bitflags! {
    /// Fine-grained classification of `Type::Object` payloads, mirroring the
    /// teacher's `ObjectFlags`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ObjectFlags: u32 {
        const NONE = 0;
        const CLASS = 1 << 0;
        const INTERFACE = 1 << 1;
        const REFERENCE = 1 << 2;
        const TUPLE = 1 << 3;
        const ANONYMOUS = 1 << 4;
        const MAPPED = 1 << 5;
        const INSTANTIATED = 1 << 6;
        const FRESH_LITERAL = 1 << 7;

        const CLASS_OR_INTERFACE = Self::CLASS.bits() | Self::INTERFACE.bits();
    }
}

/// Declared variance plus a name, as carried by `Type::TypeParameter`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParameter {
    pub name: String,
    pub constraint: Option<Type>,
    pub default: Option<Type>,
    pub variance: Variance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericDef {
    pub name: String,
    pub type_params: Vec<TypeParameter>,
    /// The type parameters substituted into `body` when instantiated.
    pub body: Rc<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleElementType {
    pub label: Option<String>,
    pub ty: Type,
    pub optional: bool,
    pub rest: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    /// Ordered for deterministic display; membership/lookup goes through `fields`.
    pub fields: BTreeMap<String, Type>,
    pub optional_fields: std::collections::BTreeSet<String>,
    pub readonly_fields: std::collections::BTreeSet<String>,
    pub string_index: Option<Box<Type>>,
    pub number_index: Option<Box<Type>>,
}

impl RecordType {
    pub fn empty() -> Self {
        RecordType {
            fields: BTreeMap::new(),
            optional_fields: Default::default(),
            readonly_fields: Default::default(),
            string_index: None,
            number_index: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub type_params: Vec<TypeParameter>,
    pub params: Vec<ParamType>,
    pub this_type: Option<Box<Type>>,
    pub return_type: Box<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamType {
    pub name: String,
    pub ty: Type,
    pub optional: bool,
    pub rest: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassType {
    pub name: String,
    pub type_params: Vec<TypeParameter>,
    pub superclass: Option<Box<Type>>,
    pub implements: Vec<Type>,
    pub members: BTreeMap<String, Type>,
    pub static_members: BTreeMap<String, Type>,
    pub is_abstract: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceType {
    pub name: String,
    pub type_params: Vec<TypeParameter>,
    pub extends: Vec<Type>,
    pub members: BTreeMap<String, Type>,
    pub optional_members: std::collections::BTreeSet<String>,
    pub call_signatures: Vec<FunctionSignature>,
    pub construct_signatures: Vec<FunctionSignature>,
    pub string_index: Option<Box<Type>>,
    pub number_index: Option<Box<Type>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub is_const: bool,
    pub members: Vec<(String, EnumMemberValue)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnumMemberValue {
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModifierOp {
    Add,
    Remove,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappedType {
    pub type_param_name: String,
    pub key_source: Box<Type>,
    pub name_type: Option<Box<Type>>,
    pub value_template: Box<Type>,
    pub optional_modifier: ModifierOp,
    pub readonly_modifier: ModifierOp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalType {
    pub check: Box<Type>,
    pub extends: Box<Type>,
    pub then: Box<Type>,
    pub else_: Box<Type>,
    /// Names bound by `infer` within `extends`, for the unification pass.
    pub infer_params: Vec<String>,
}

/// The central type representation (spec §3.3). Canonical forms (flattened
/// unions/intersections, literal widening) are maintained by
/// `compiler::substitution`, not by this enum's constructors.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Any,
    Unknown,
    Never,
    Void,
    Null,
    Undefined,
    String,
    Number,
    Boolean,
    BigInt,
    UniqueSymbol(String),

    StringLiteral(String),
    NumberLiteral(u64 /* bits of f64, for Eq */),
    BooleanLiteral(bool),
    BigIntLiteral(String),

    Union(Vec<Type>),
    Intersection(Vec<Type>),

    Array(Box<Type>),
    Tuple(Vec<TupleElementType>),
    Record(Box<RecordType>),

    Class(Rc<ClassType>),
    /// An instantiated `new`-value of a class, carried by name (lookup key
    /// into the environment, never an owning pointer — spec §3.3 allows
    /// declaration-order cycles like `class A { b: B }` / `class B { a: A }`).
    Instance {
        class_name: String,
        type_args: Vec<Type>,
    },
    Interface(Rc<InterfaceType>),
    Enum(Rc<EnumType>),
    EnumMember {
        enum_name: String,
        member_name: String,
    },

    Function(Rc<FunctionSignature>),
    /// Overloaded function: every signature must be satisfied by a caller
    /// of the merged declaration (spec §4.5 rule 18).
    Overloaded(Vec<FunctionSignature>),

    Generic(Rc<GenericDef>),
    /// A generic definition applied to concrete type arguments.
    Instantiation {
        target: Rc<GenericDef>,
        type_args: Vec<Type>,
    },

    TypeParameter(String),

    KeyOf(Box<Type>),
    IndexedAccess {
        object: Box<Type>,
        index: Box<Type>,
    },
    Mapped(Rc<MappedType>),
    Conditional(Rc<ConditionalType>),
    TemplateLiteral {
        quasis: Vec<String>,
        types: Vec<Type>,
    },

    /// Intrinsic string-type evaluators (`Uppercase<S>` and friends).
    StringMapping {
        kind: StringMappingKind,
        inner: Box<Type>,
    },

    TypePredicate {
        param_name: String,
        ty: Option<Box<Type>>,
    },
    AssertsPredicate {
        param_name: String,
        ty: Option<Box<Type>>,
    },

    /// Placeholder substituted in place of a recursive generic-alias
    /// expansion; re-expanded lazily by `compiler::substitution` on each
    /// assignability query that hits it (spec §4.4).
    RecursiveTypeAlias {
        key: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMappingKind {
    Uppercase,
    Lowercase,
    Capitalize,
    Uncapitalize,
}

impl Type {
    pub fn number_literal(v: f64) -> Type {
        Type::NumberLiteral(v.to_bits())
    }

    pub fn number_literal_value(bits: u64) -> f64 {
        f64::from_bits(bits)
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Type::Never)
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Any)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Type::Null | Type::Undefined)
    }

    /// The primitive parent a literal widens to at an unannotated `let` (spec §4.6).
    pub fn widen(&self) -> Type {
        match self {
            Type::StringLiteral(_) => Type::String,
            Type::NumberLiteral(_) => Type::Number,
            Type::BooleanLiteral(_) => Type::Boolean,
            Type::BigIntLiteral(_) => Type::BigInt,
            Type::Union(members) => Type::Union(members.iter().map(Type::widen).collect()),
            other => other.clone(),
        }
    }

    /// The runtime `typeof` kind this type would report, used by narrowing
    /// (spec §4.7) — `None` for types with no single runtime kind (unions of
    /// mixed kind, objects, etc. fall through to structural narrowing instead).
    pub fn typeof_kind(&self) -> Option<&'static str> {
        match self {
            Type::String | Type::StringLiteral(_) => Some("string"),
            Type::Number | Type::NumberLiteral(_) => Some("number"),
            Type::Boolean | Type::BooleanLiteral(_) => Some("boolean"),
            Type::BigInt | Type::BigIntLiteral(_) => Some("bigint"),
            Type::Undefined => Some("undefined"),
            Type::Function(_) | Type::Overloaded(_) => Some("function"),
            _ => None,
        }
    }
}
