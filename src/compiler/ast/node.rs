//! The core AST: two tagged-sum families, `Stmt` and `Expr`, plus the
//! declaration/member structs they're built from.
//!
//! Kept as plain enums rather than the trait-object `NodeData` hierarchy the
//! teacher's prototype sketched (see `DESIGN.md`) — exhaustive `match` over a
//! closed enum is the idiom the spec's own design notes call for (spec §9:
//! "Representing nodes as tagged variants of an enumeration avoids the
//! inheritance hierarchy").

use super::node_flags::{ModifierFlags, NodeFlags, Variance};
use super::type_node::TypeNode;
use std::rc::Rc;

/// Every node records its source span for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize) -> Self {
        Span { start, end, line }
    }
}

#[derive(Debug, Clone)]
pub struct Program {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub span: Span,
    pub kind: StmtKind,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Empty,
    Expr(Expr),
    VarDecl(VarDecl),
    /// Desugared destructuring / classic for-loop output: a sequence of
    /// statements sharing the enclosing scope (no new lexical scope).
    Sequence(Vec<Stmt>),
    FunctionDecl(Rc<FunctionDecl>),
    ClassDecl(Rc<ClassDecl>),
    InterfaceDecl(Rc<InterfaceDecl>),
    TypeAliasDecl(Rc<TypeAliasDecl>),
    EnumDecl(Rc<EnumDecl>),
    NamespaceDecl(Rc<NamespaceDecl>),
    ModuleAugmentation(Rc<NamespaceDecl>),
    GlobalAugmentation(Vec<Stmt>),
    Import(ImportDecl),
    ExportNamed(ExportNamedDecl),
    ExportDefault(Box<Expr>),
    ExportDecl(Box<Stmt>),
    ExportAssignment(Box<Expr>),
    ImportEquals {
        name: String,
        is_export: bool,
        target: Vec<String>,
    },
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then: Box<Stmt>,
        else_: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    ForOf {
        decl_kind: Option<VarKind>,
        binding: String,
        is_await: bool,
        expr: Expr,
        body: Box<Stmt>,
    },
    ForIn {
        decl_kind: Option<VarKind>,
        binding: String,
        expr: Expr,
        body: Box<Stmt>,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    Try {
        block: Vec<Stmt>,
        catch: Option<CatchClause>,
        finally: Option<Vec<Stmt>>,
    },
    Throw(Expr),
    Return(Option<Expr>),
    Break(Option<String>),
    Continue(Option<String>),
    Labeled {
        label: String,
        body: Box<Stmt>,
    },
    /// `using x = expr, y = expr2;` — disposal ordering is the evaluator's concern.
    Using {
        is_await: bool,
        bindings: Vec<(String, Expr)>,
    },
    Debugger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub kind: VarKind,
    pub name: String,
    pub type_ann: Option<TypeNode>,
    pub init: Option<Expr>,
    pub definite_assignment: bool,
    pub flags: NodeFlags,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub type_ann: Option<TypeNode>,
    pub optional: bool,
    pub rest: bool,
    pub default: Option<Expr>,
    /// `Some` when this parameter is a parameter-property
    /// (`constructor(private x: number)`), carrying its access modifiers.
    pub property_modifiers: Option<ModifierFlags>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FunctionFlags {
    pub is_async: bool,
    pub is_generator: bool,
}

#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: String,
    pub constraint: Option<TypeNode>,
    pub default: Option<TypeNode>,
    pub variance: Variance,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Option<String>,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeNode>,
    pub this_param: Option<TypeNode>,
    /// `None` for an overload signature with no implementation body.
    pub body: Option<Vec<Stmt>>,
    pub flags: FunctionFlags,
    pub modifiers: ModifierFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessibility {
    Public,
    Private,
    Protected,
}

#[derive(Debug, Clone)]
pub enum ClassMember {
    Field {
        name: String,
        type_ann: Option<TypeNode>,
        init: Option<Expr>,
        modifiers: ModifierFlags,
        is_private_name: bool,
    },
    Method {
        name: String,
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        return_type: Option<TypeNode>,
        body: Option<Vec<Stmt>>,
        flags: FunctionFlags,
        modifiers: ModifierFlags,
        is_private_name: bool,
    },
    Constructor {
        params: Vec<Param>,
        body: Option<Vec<Stmt>>,
        modifiers: ModifierFlags,
    },
    Getter {
        name: String,
        return_type: Option<TypeNode>,
        body: Option<Vec<Stmt>>,
        modifiers: ModifierFlags,
    },
    Setter {
        name: String,
        param: Param,
        body: Option<Vec<Stmt>>,
        modifiers: ModifierFlags,
    },
    IndexSignature {
        key_name: String,
        key_type: TypeNode,
        value_type: TypeNode,
        readonly: bool,
    },
    StaticBlock(Vec<Stmt>),
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: Option<String>,
    pub type_params: Vec<TypeParam>,
    pub superclass: Option<(String, Vec<TypeNode>)>,
    pub implements: Vec<TypeNode>,
    pub members: Vec<ClassMember>,
    pub is_abstract: bool,
    pub modifiers: ModifierFlags,
}

#[derive(Debug, Clone)]
pub enum InterfaceMember {
    Property {
        name: String,
        optional: bool,
        readonly: bool,
        ty: TypeNode,
    },
    Method {
        name: String,
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        return_type: Option<TypeNode>,
        optional: bool,
    },
    CallSignature {
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        return_type: Option<TypeNode>,
    },
    ConstructSignature {
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        return_type: Option<TypeNode>,
    },
    IndexSignature {
        key_name: String,
        key_type: TypeNode,
        value_type: TypeNode,
        readonly: bool,
    },
}

#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub extends: Vec<TypeNode>,
    pub members: Vec<InterfaceMember>,
}

#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub ty: TypeNode,
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: String,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: String,
    pub is_const: bool,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone)]
pub struct NamespaceDecl {
    pub name: String,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum ImportSpecifier {
    Named { imported: String, local: String },
    Default(String),
    Namespace(String),
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    pub source: String,
    pub type_only: bool,
}

#[derive(Debug, Clone)]
pub struct ExportSpecifier {
    pub local: String,
    pub exported: String,
}

#[derive(Debug, Clone)]
pub struct ExportNamedDecl {
    pub specifiers: Vec<ExportSpecifier>,
    pub source: Option<String>,
    pub type_only: bool,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub param: Option<String>,
    pub param_type: Option<TypeNode>,
    pub body: Vec<Stmt>,
}

// ---- Expressions -----------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Debug, Clone)]
pub enum LiteralValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    Undefined,
    BigInt(String),
}

#[derive(Debug, Clone)]
pub struct TemplateLiteral {
    /// Cooked (escape-processed) string chunks, one more than `exprs`.
    pub cooked: Vec<String>,
    /// Raw (unescaped) string chunks, parallel to `cooked`.
    pub raw: Vec<String>,
    pub exprs: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
    In,
    InstanceOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    TypeOf,
    Void,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    PowAssign,
    ShlAssign,
    ShrAssign,
    UShrAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    AndAssign,
    OrAssign,
    NullishAssign,
}

#[derive(Debug, Clone)]
pub enum ArrayElement {
    Item(Expr),
    Spread(Expr),
    Hole,
}

#[derive(Debug, Clone)]
pub enum ObjectProp {
    KeyValue {
        key: String,
        computed: bool,
        value: Expr,
    },
    Shorthand(String),
    Method {
        key: String,
        params: Vec<Param>,
        return_type: Option<TypeNode>,
        body: Vec<Stmt>,
        flags: FunctionFlags,
    },
    Getter {
        key: String,
        return_type: Option<TypeNode>,
        body: Vec<Stmt>,
    },
    Setter {
        key: String,
        param: Param,
        body: Vec<Stmt>,
    },
    Spread(Expr),
}

#[derive(Debug, Clone)]
pub enum ArrowBody {
    Expr(Box<Expr>),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone)]
pub enum MemberProp {
    Name(String),
    PrivateName(String),
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(LiteralValue),
    Template(TemplateLiteral),
    TaggedTemplate {
        tag: Box<Expr>,
        quasi: TemplateLiteral,
    },
    Ident(String),
    This,
    Super,
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        else_: Box<Expr>,
    },
    Grouping(Box<Expr>),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Update {
        op: UnaryOp,
        prefix: bool,
        expr: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Member {
        object: Box<Expr>,
        prop: MemberProp,
        optional: bool,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
    },
    New {
        callee: Box<Expr>,
        type_args: Vec<TypeNode>,
        args: Vec<ArrayElement>,
    },
    Call {
        callee: Box<Expr>,
        type_args: Vec<TypeNode>,
        args: Vec<ArrayElement>,
        optional: bool,
    },
    Array(Vec<ArrayElement>),
    Object {
        props: Vec<ObjectProp>,
        is_fresh: bool,
    },
    Arrow {
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        return_type: Option<TypeNode>,
        this_param: Option<TypeNode>,
        body: ArrowBody,
        is_async: bool,
    },
    FunctionExpr(Rc<FunctionDecl>),
    ClassExpr(Rc<ClassDecl>),
    Spread(Box<Expr>),
    As {
        expr: Box<Expr>,
        ty: TypeNode,
    },
    Satisfies {
        expr: Box<Expr>,
        ty: TypeNode,
    },
    AngleBracketAssertion {
        ty: TypeNode,
        expr: Box<Expr>,
    },
    NonNull(Box<Expr>),
    Await(Box<Expr>),
    Yield {
        arg: Option<Box<Expr>>,
        delegate: bool,
    },
}
