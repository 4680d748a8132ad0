//! The type checker (spec §4.5–§4.8): statement/expression checking, type-node
//! evaluation (including the built-in utility types), generic inference,
//! control-flow narrowing, and diagnostic reporting.
//!
//! `Checker` owns everything that must be process-private to a single pass
//! (spec §5): the assignability memo table, the recursive-alias cycle guard,
//! and the per-span expression-type side table the emitter/evaluator query
//! afterward. The environment itself stays the persistent, Rc-sharing value
//! from `compiler::environment` — each statement threads a (mostly shared)
//! new `Environment` forward rather than mutating one in place.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::rc::Rc;

use super::assignability::{self, Context as AssignContext, MemoTable};
use super::ast::node::{
    ArrayElement, ArrowBody, BinaryOp, CatchClause, ClassDecl, ClassMember, Expr, ExprKind,
    FunctionDecl, InterfaceDecl, LiteralValue, LogicalOp, MemberProp, ObjectProp, Param, Program,
    Span, Stmt, StmtKind, SwitchCase, TypeAliasDecl, TypeParam, UnaryOp, VarDecl, VarKind,
};
use super::ast::symbol::Symbol;
use super::ast::symbol_flags::SymbolFlags;
use super::ast::type_node::{ModifierOp as TnModifierOp, TypeNode};
use super::diagnostics::{self, DiagnosticCategory, Message};
use super::environment::{value_symbol, Environment};
use super::inference::{self, InferenceCandidates};
use super::narrowing::{self, Narrowing};
use super::substitution::{self, union_of};
use super::types::{
    ClassType, EnumMemberValue, EnumType, FunctionSignature, GenericDef, InterfaceType,
    MappedType, ModifierOp, ParamType, RecordType, StringMappingKind, TupleElementType, Type,
    TypeParameter,
};

/// A checker-emitted diagnostic, in the same shape `compile::Diagnostic`
/// expects before line/column resolution (spec §7).
#[derive(Debug, Clone)]
pub struct CheckerDiagnostic {
    pub span: Span,
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: String,
}

fn format_message(template: &str, args: &[&str]) -> String {
    let mut out = template.to_string();
    for (i, a) in args.iter().enumerate() {
        out = out.replace(&format!("{{{}}}", i), a);
    }
    out
}

fn describe(ty: &Type) -> String {
    format!("{:?}", ty)
}

/// Interface-specific bookkeeping that `Environment::merge_type_declaration`
/// doesn't know about (it only merges the generic per-member `SymbolTable`).
/// Accumulated across every `interface X { ... }` occurrence sharing a name,
/// then flattened into the final `InterfaceType` once the block is hoisted.
#[derive(Default, Clone)]
struct InterfaceAux {
    type_params: Vec<TypeParameter>,
    extends: Vec<Type>,
    optional_members: BTreeSet<String>,
    call_signatures: Vec<FunctionSignature>,
    construct_signatures: Vec<FunctionSignature>,
    string_index: Option<Box<Type>>,
    number_index: Option<Box<Type>>,
}

/// Synthetic member key a class's constructor signature is stored under;
/// `ClassType` has no dedicated constructor field (spec §3.2's class shape
/// does not separate one out either — a constructor is just another member
/// with an implicit "returns an instance" contract).
const CONSTRUCTOR_KEY: &str = "__constructor__";

pub struct Checker {
    diagnostics: Vec<CheckerDiagnostic>,
    memo: MemoTable,
    visiting: RefCell<HashSet<(String, String)>>,
    /// One level of re-expansion for a `RecursiveTypeAlias` placeholder, keyed
    /// by alias name (spec §4.4). For generic aliases this holds the
    /// unsubstituted body — expanding past the first recursive position loses
    /// the instantiation's concrete type arguments, a documented
    /// simplification (see DESIGN.md).
    alias_bodies: RefCell<HashMap<String, Type>>,
    /// Set while evaluating a type alias's own body, so a direct
    /// self-reference resolves to a placeholder instead of looping through
    /// `eval_type_node` forever.
    defining_alias: RefCell<Option<String>>,
    interface_aux: RefCell<HashMap<String, InterfaceAux>>,
    expr_types: RefCell<HashMap<(usize, usize), Type>>,
    return_type_stack: Vec<Option<Type>>,
    loop_depth: u32,
    switch_depth: u32,
    symbol_counter: Cell<u32>,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

impl Checker {
    pub fn new() -> Self {
        Checker {
            diagnostics: Vec::new(),
            memo: assignability::new_memo_table(),
            visiting: RefCell::new(HashSet::new()),
            alias_bodies: RefCell::new(HashMap::new()),
            defining_alias: RefCell::new(None),
            interface_aux: RefCell::new(HashMap::new()),
            expr_types: RefCell::new(HashMap::new()),
            return_type_stack: Vec::new(),
            loop_depth: 0,
            switch_depth: 0,
            symbol_counter: Cell::new(0),
        }
    }

    pub fn diagnostics(&self) -> &[CheckerDiagnostic] {
        &self.diagnostics
    }

    /// Evaluator/emitter contract (spec §6): the inferred type recorded for
    /// an expression at `span`, once the pass has finished.
    pub fn expression_type(&self, span: Span) -> Option<Type> {
        self.expr_types.borrow().get(&(span.start, span.end)).cloned()
    }

    fn push_diag(&mut self, span: Span, msg: Message, args: &[&str]) {
        self.diagnostics.push(CheckerDiagnostic {
            span,
            code: msg.code,
            category: msg.category,
            message: format_message(msg.template, args),
        });
    }

    fn fresh_unique_symbol(&self, hint: &str) -> Type {
        let n = self.symbol_counter.get();
        self.symbol_counter.set(n + 1);
        Type::UniqueSymbol(format!("{}#{}", hint, n))
    }

    // ---- Assignability -----------------------------------------------------

    fn is_assignable(&self, expected: &Type, actual: &Type, env: &Environment) -> bool {
        let alias_bodies = &self.alias_bodies;
        let expand = |key: &str| alias_bodies.borrow().get(key).cloned();
        let ctx = AssignContext {
            env,
            memo: &self.memo,
            expand_recursive_alias: &expand,
            visiting: &self.visiting,
        };
        assignability::is_compatible(expected, actual, &ctx)
    }

    /// Re-expands a generic with an instantiation-cycle guard: `substitution::
    /// instantiate` performs no termination check itself, so a self-
    /// referential generic alias (`type List<T> = {head:T, tail: List<T>|null}`)
    /// would recurse through `substitute`'s `Instantiation` arm forever if
    /// forced eagerly. We only ever instantiate lazily (callers hold on to
    /// `Type::Instantiation` until a concrete comparison needs its shape), so
    /// this guard exists for the rare eager call site (e.g. `InstanceType`).
    fn instantiate_generic(&self, def: &GenericDef, args: &[Type]) -> Type {
        let key = format!(
            "{}<{}>",
            def.name,
            args.iter().map(describe).collect::<Vec<_>>().join(",")
        );
        if !self.visiting.borrow_mut().insert((key.clone(), key.clone())) {
            return Type::RecursiveTypeAlias { key };
        }
        let result = substitution::instantiate(def, args);
        self.visiting.borrow_mut().remove(&(key.clone(), key));
        result
    }

    // ---- Type-node evaluation (spec §4.4, §4.8) ----------------------------

    pub fn eval_type_node(&mut self, node: &TypeNode, env: &Environment) -> Type {
        use super::ast::type_node::KeywordType as KT;
        match node {
            TypeNode::Keyword(kw) => match kw {
                KT::Any => Type::Any,
                KT::Unknown => Type::Unknown,
                KT::Never => Type::Never,
                KT::Void => Type::Void,
                KT::String => Type::String,
                KT::Number => Type::Number,
                KT::Boolean => Type::Boolean,
                KT::BigInt => Type::BigInt,
                KT::Symbol => self.fresh_unique_symbol("symbol"),
                KT::Object => Type::Record(Box::new(RecordType::empty())),
                KT::Null => Type::Null,
                KT::Undefined => Type::Undefined,
            },
            TypeNode::Reference { name, type_args } => self.eval_reference(name, type_args, env),
            TypeNode::Literal(lit) => {
                use super::ast::type_node::LiteralTypeValue as LV;
                match lit {
                    LV::String(s) => Type::StringLiteral(s.clone()),
                    LV::Number(n) => Type::number_literal(*n),
                    LV::Boolean(b) => Type::BooleanLiteral(*b),
                    LV::BigInt(s) => Type::BigIntLiteral(s.clone()),
                }
            }
            TypeNode::Union(members) => {
                let evaluated: Vec<Type> = members.iter().map(|m| self.eval_type_node(m, env)).collect();
                union_of(evaluated)
            }
            TypeNode::Intersection(members) => {
                let evaluated: Vec<Type> = members.iter().map(|m| self.eval_type_node(m, env)).collect();
                substitution::intersection_of(evaluated)
            }
            TypeNode::Array(el) => Type::Array(Box::new(self.eval_type_node(el, env))),
            TypeNode::Tuple(elements) => Type::Tuple(
                elements
                    .iter()
                    .map(|e| TupleElementType {
                        label: e.label.clone(),
                        ty: self.eval_type_node(&e.ty, env),
                        optional: e.optional,
                        rest: e.rest,
                    })
                    .collect(),
            ),
            TypeNode::Object(obj) => {
                let mut fields = BTreeMap::new();
                let mut optional_fields = BTreeSet::new();
                let mut readonly_fields = BTreeSet::new();
                for m in &obj.members {
                    let ty = self.eval_type_node(&m.ty, env);
                    if m.optional {
                        optional_fields.insert(m.name.clone());
                    }
                    if m.readonly {
                        readonly_fields.insert(m.name.clone());
                    }
                    fields.insert(m.name.clone(), ty);
                }
                let string_index = obj.string_index.as_ref().map(|t| Box::new(self.eval_type_node(t, env)));
                let number_index = obj.number_index.as_ref().map(|t| Box::new(self.eval_type_node(t, env)));
                Type::Record(Box::new(RecordType {
                    fields,
                    optional_fields,
                    readonly_fields,
                    string_index,
                    number_index,
                }))
            }
            TypeNode::Function(f) | TypeNode::Constructor(f) => {
                let type_params = self.build_type_param_nodes(&f.type_params, env);
                let fn_env = self.declare_type_params(env.clone(), &type_params);
                let params = f
                    .params
                    .iter()
                    .map(|p| ParamType {
                        name: p.name.clone(),
                        ty: self.eval_type_node(&p.ty, &fn_env),
                        optional: p.optional,
                        rest: p.rest,
                    })
                    .collect();
                let return_type = Box::new(self.eval_type_node(&f.return_type, &fn_env));
                Type::Function(Rc::new(FunctionSignature {
                    type_params,
                    params,
                    this_type: None,
                    return_type,
                }))
            }
            TypeNode::KeyOf(inner) => Type::KeyOf(Box::new(self.eval_type_node(inner, env))),
            TypeNode::TypeOf(name) => env
                .lookup_value(name)
                .and_then(|s| s.resolved_type.clone())
                .unwrap_or(Type::Any),
            TypeNode::UniqueSymbol => self.fresh_unique_symbol("unique"),
            TypeNode::IndexedAccess { object, index } => Type::IndexedAccess {
                object: Box::new(self.eval_type_node(object, env)),
                index: Box::new(self.eval_type_node(index, env)),
            },
            TypeNode::Mapped(m) => {
                let optional_modifier = match m.optional_modifier {
                    Some(TnModifierOp::Add) => ModifierOp::Add,
                    Some(TnModifierOp::Remove) => ModifierOp::Remove,
                    None => ModifierOp::Unchanged,
                };
                let readonly_modifier = match m.readonly_modifier {
                    Some(TnModifierOp::Add) => ModifierOp::Add,
                    Some(TnModifierOp::Remove) => ModifierOp::Remove,
                    None => ModifierOp::Unchanged,
                };
                let mapped_env = env.declare_type(
                    m.type_param.clone(),
                    Symbol::new(m.type_param.clone(), SymbolFlags::TYPE_PARAMETER),
                );
                Type::Mapped(Rc::new(MappedType {
                    type_param_name: m.type_param.clone(),
                    key_source: Box::new(self.eval_type_node(&m.key_source, env)),
                    name_type: m.name_type.as_ref().map(|t| Box::new(self.eval_type_node(t, &mapped_env))),
                    value_template: Box::new(self.eval_type_node(&m.value, &mapped_env)),
                    optional_modifier,
                    readonly_modifier,
                }))
            }
            TypeNode::Conditional { check, extends, then, else_ } => {
                let mut infer_params = Vec::new();
                collect_infer_params(extends, &mut infer_params);
                let extends_env = self.declare_type_params(
                    env.clone(),
                    &infer_params
                        .iter()
                        .map(|n| TypeParameter {
                            name: n.clone(),
                            constraint: None,
                            default: None,
                            variance: super::ast::node_flags::Variance::Invariant,
                        })
                        .collect::<Vec<_>>(),
                );
                Type::Conditional(Rc::new(super::types::ConditionalType {
                    check: Box::new(self.eval_type_node(check, env)),
                    extends: Box::new(self.eval_type_node(extends, &extends_env)),
                    then: Box::new(self.eval_type_node(then, &extends_env)),
                    else_: Box::new(self.eval_type_node(else_, env)),
                    infer_params,
                }))
            }
            TypeNode::Infer(name) => Type::TypeParameter(name.clone()),
            TypeNode::TemplateLiteral { quasis, types } => Type::TemplateLiteral {
                quasis: quasis.clone(),
                types: types.iter().map(|t| self.eval_type_node(t, env)).collect(),
            },
            TypeNode::Predicate { param_name, ty } => Type::TypePredicate {
                param_name: param_name.clone(),
                ty: ty.as_ref().map(|t| Box::new(self.eval_type_node(t, env))),
            },
            TypeNode::AssertsPredicate { param_name, ty } => Type::AssertsPredicate {
                param_name: param_name.clone(),
                ty: ty.as_ref().map(|t| Box::new(self.eval_type_node(t, env))),
            },
            TypeNode::Parenthesized(inner) => self.eval_type_node(inner, env),
            TypeNode::TypeParameterRef(name) => Type::TypeParameter(name.clone()),
            TypeNode::This => Type::TypeParameter("this".to_string()),
        }
    }

    fn eval_reference(&mut self, name: &str, type_args: &[TypeNode], env: &Environment) -> Type {
        if self.defining_alias.borrow().as_deref() == Some(name) {
            return Type::RecursiveTypeAlias { key: name.to_string() };
        }

        let args: Vec<Type> = type_args.iter().map(|t| self.eval_type_node(t, env)).collect();

        if name == "Array" || name == "ReadonlyArray" {
            return Type::Array(Box::new(args.into_iter().next().unwrap_or(Type::Any)));
        }
        if let Some(ty) = self.eval_utility(name, &args, env) {
            return ty;
        }

        match env.lookup_type(name) {
            Some(sym) => match &sym.resolved_type {
                Some(Type::Generic(def)) => {
                    if args.is_empty() {
                        Type::Generic(def.clone())
                    } else {
                        Type::Instantiation {
                            target: def.clone(),
                            type_args: args,
                        }
                    }
                }
                Some(ty) => ty.clone(),
                None if sym.flags.contains(SymbolFlags::TYPE_PARAMETER) => Type::TypeParameter(name.to_string()),
                None => Type::Any,
            },
            None => {
                self.push_diag(
                    Span::new(0, 0, 0),
                    diagnostics::CANNOT_FIND_NAME_2304,
                    &[name],
                );
                Type::Any
            }
        }
    }

    /// Expands the spec §4.8 built-in utility types. `None` means `name`
    /// isn't one of these (fall through to an ordinary reference lookup).
    fn eval_utility(&self, name: &str, args: &[Type], env: &Environment) -> Option<Type> {
        match name {
            "Partial" => {
                let (fields, _opt, ro, si, ni) = object_shape(args.first()?)?;
                let all: BTreeSet<String> = fields.keys().cloned().collect();
                Some(record_ty(fields, all, ro, si, ni))
            }
            "Required" => {
                let (fields, _opt, ro, si, ni) = object_shape(args.first()?)?;
                Some(record_ty(fields, BTreeSet::new(), ro, si, ni))
            }
            "Readonly" => {
                let (fields, opt, _ro, si, ni) = object_shape(args.first()?)?;
                let all: BTreeSet<String> = fields.keys().cloned().collect();
                Some(record_ty(fields, opt, all, si, ni))
            }
            "Record" => {
                let k = args.first()?;
                let v = args.get(1)?.clone();
                let keys = literal_keys(k);
                if !keys.is_empty() {
                    let fields = keys.into_iter().map(|k| (k, v.clone())).collect();
                    Some(record_ty(fields, BTreeSet::new(), BTreeSet::new(), None, None))
                } else {
                    match k {
                        Type::String => Some(record_ty(
                            BTreeMap::new(),
                            BTreeSet::new(),
                            BTreeSet::new(),
                            Some(Box::new(v)),
                            None,
                        )),
                        Type::Number => Some(record_ty(
                            BTreeMap::new(),
                            BTreeSet::new(),
                            BTreeSet::new(),
                            None,
                            Some(Box::new(v)),
                        )),
                        _ => Some(Type::Record(Box::new(RecordType::empty()))),
                    }
                }
            }
            "Pick" => {
                let (fields, opt, ro, ..) = object_shape(args.first()?)?;
                let keep: HashSet<String> = literal_keys(args.get(1)?).into_iter().collect();
                let fields: BTreeMap<String, Type> = fields.into_iter().filter(|(k, _)| keep.contains(k)).collect();
                let opt = opt.into_iter().filter(|k| keep.contains(k)).collect();
                let ro = ro.into_iter().filter(|k| keep.contains(k)).collect();
                Some(record_ty(fields, opt, ro, None, None))
            }
            "Omit" => {
                let (fields, opt, ro, si, ni) = object_shape(args.first()?)?;
                let drop: HashSet<String> = literal_keys(args.get(1)?).into_iter().collect();
                let fields: BTreeMap<String, Type> = fields.into_iter().filter(|(k, _)| !drop.contains(k)).collect();
                let opt = opt.into_iter().filter(|k| !drop.contains(k)).collect();
                let ro = ro.into_iter().filter(|k| !drop.contains(k)).collect();
                Some(record_ty(fields, opt, ro, si, ni))
            }
            "NonNullable" => {
                let t = args.first()?.clone();
                Some(narrowing::subtract(&t, &Type::Union(vec![Type::Null, Type::Undefined])))
            }
            "Extract" => {
                let t = args.first()?.clone();
                let u = args.get(1)?.clone();
                let members = union_members(t);
                Some(union_of(members.into_iter().filter(|m| self.is_assignable(&u, m, env)).collect()))
            }
            "Exclude" => {
                let t = args.first()?.clone();
                let u = args.get(1)?.clone();
                let members = union_members(t);
                Some(union_of(members.into_iter().filter(|m| !self.is_assignable(&u, m, env)).collect()))
            }
            "ReturnType" => match args.first()? {
                Type::Function(sig) => Some((*sig.return_type).clone()),
                Type::Overloaded(sigs) => Some(union_of(sigs.iter().map(|s| (*s.return_type).clone()).collect())),
                _ => Some(Type::Any),
            },
            "Parameters" => match args.first()? {
                Type::Function(sig) => Some(params_tuple(&sig.params)),
                Type::Overloaded(sigs) => sigs.first().map(|s| params_tuple(&s.params)),
                _ => Some(Type::Tuple(Vec::new())),
            },
            "ConstructorParameters" => match args.first()? {
                Type::Class(c) => match c.members.get(CONSTRUCTOR_KEY) {
                    Some(Type::Function(sig)) => Some(params_tuple(&sig.params)),
                    _ => Some(Type::Tuple(Vec::new())),
                },
                _ => Some(Type::Tuple(Vec::new())),
            },
            "InstanceType" => match args.first()? {
                Type::Class(c) => Some(Type::Instance {
                    class_name: c.name.clone(),
                    type_args: c.type_params.iter().map(|p| Type::TypeParameter(p.name.clone())).collect(),
                }),
                _ => Some(Type::Any),
            },
            "ThisType" => args.first().cloned(),
            "Awaited" => Some(unwrap_promise(args.first()?.clone())),
            "Uppercase" => Some(inference::apply_string_mapping(StringMappingKind::Uppercase, args.first()?)),
            "Lowercase" => Some(inference::apply_string_mapping(StringMappingKind::Lowercase, args.first()?)),
            "Capitalize" => Some(inference::apply_string_mapping(StringMappingKind::Capitalize, args.first()?)),
            "Uncapitalize" => Some(inference::apply_string_mapping(StringMappingKind::Uncapitalize, args.first()?)),
            _ => None,
        }
    }

    // ---- Generic scaffolding -------------------------------------------------

    fn build_type_params(&mut self, params: &[TypeParam], env: &Environment) -> Vec<TypeParameter> {
        let mut out = Vec::new();
        let mut running_env = env.clone();
        for p in params {
            running_env = running_env.declare_type(
                p.name.clone(),
                Symbol::new(p.name.clone(), SymbolFlags::TYPE_PARAMETER),
            );
            out.push(TypeParameter {
                name: p.name.clone(),
                constraint: p.constraint.as_ref().map(|t| self.eval_type_node(t, &running_env)),
                default: p.default.as_ref().map(|t| self.eval_type_node(t, &running_env)),
                variance: p.variance,
            });
        }
        out
    }

    fn build_type_param_nodes(
        &mut self,
        params: &[super::ast::type_node::TypeParamNode],
        env: &Environment,
    ) -> Vec<TypeParameter> {
        let mut out = Vec::new();
        let mut running_env = env.clone();
        for p in params {
            running_env = running_env.declare_type(
                p.name.clone(),
                Symbol::new(p.name.clone(), SymbolFlags::TYPE_PARAMETER),
            );
            out.push(TypeParameter {
                name: p.name.clone(),
                constraint: p.constraint.as_ref().map(|t| self.eval_type_node(t, &running_env)),
                default: p.default.as_ref().map(|t| self.eval_type_node(t, &running_env)),
                variance: p.variance,
            });
        }
        out
    }

    fn declare_type_params(&self, env: Environment, params: &[TypeParameter]) -> Environment {
        let mut env = env;
        for p in params {
            env = env.declare_type(p.name.clone(), Symbol::new(p.name.clone(), SymbolFlags::TYPE_PARAMETER));
        }
        env
    }

    fn build_function_signature(
        &mut self,
        type_params: &[TypeParam],
        params: &[Param],
        return_type: &Option<TypeNode>,
        this_param: Option<&TypeNode>,
        env: &Environment,
    ) -> (FunctionSignature, Environment) {
        let tps = self.build_type_params(type_params, env);
        let sig_env = self.declare_type_params(env.clone(), &tps);
        let mut param_env = sig_env.clone();
        let mut param_types = Vec::new();
        for p in params {
            let ty = p
                .type_ann
                .as_ref()
                .map(|t| self.eval_type_node(t, &sig_env))
                .or_else(|| p.default.as_ref().map(|e| self.check_expr(e, &sig_env).widen()))
                .unwrap_or(Type::Any);
            param_env = param_env.declare_value(
                p.name.clone(),
                value_symbol(&p.name, ty.clone(), SymbolFlags::FUNCTION_SCOPED_VARIABLE),
            );
            param_types.push(ParamType {
                name: p.name.clone(),
                ty,
                optional: p.optional,
                rest: p.rest,
            });
        }
        let this_type = this_param.map(|t| Box::new(self.eval_type_node(t, &sig_env)));
        let ret = return_type.as_ref().map(|t| self.eval_type_node(t, &sig_env));
        let sig = FunctionSignature {
            type_params: tps,
            params: param_types,
            this_type,
            return_type: Box::new(ret.unwrap_or(Type::Any)),
        };
        (sig, param_env)
    }

    // ---- Program-level checking --------------------------------------------

    /// First pass over a block: registers every forward-referenceable name
    /// (functions, classes, interfaces with merging, type aliases, enums,
    /// namespaces) before any statement body is checked, so sibling
    /// declarations can reference each other regardless of source order
    /// (spec §4.3).
    pub fn hoist_block(&mut self, stmts: &[Stmt], env: Environment) -> Environment {
        let mut env = env;

        // Interfaces merge by name across every occurrence in the block
        // before any member type is resolved, so mutually referencing
        // interfaces see each other's full (post-merge) member set.
        for stmt in stmts {
            if let StmtKind::InterfaceDecl(decl) = unwrap_export(&stmt.kind) {
                env = self.predeclare_interface(decl, stmt.span, env);
            }
        }
        for stmt in stmts {
            match unwrap_export(&stmt.kind) {
                StmtKind::InterfaceDecl(decl) => env = self.finalize_interface(decl, &env),
                StmtKind::TypeAliasDecl(decl) => env = self.build_type_alias(decl, env),
                StmtKind::ClassDecl(decl) => env = self.predeclare_class(decl, stmt.span, env),
                StmtKind::EnumDecl(decl) => env = self.build_enum(decl, stmt.span, env),
                StmtKind::FunctionDecl(decl) => env = self.predeclare_function(decl, stmt.span, env),
                StmtKind::NamespaceDecl(decl) => {
                    let mut inner = env.push_child();
                    inner = self.hoist_block(&decl.body, inner);
                    env = env.declare_namespace(decl.name.clone(), inner);
                }
                _ => {}
            }
        }
        env
    }

    fn predeclare_interface(&mut self, decl: &InterfaceDecl, span: Span, env: Environment) -> Environment {
        let mut aux_table = self.interface_aux.borrow_mut();
        let aux = aux_table.entry(decl.name.clone()).or_default();
        aux.type_params = self.build_type_params_no_mut(&decl.type_params);
        drop(aux_table);

        let mut members = std::collections::HashMap::new();
        for m in &decl.members {
            match m {
                super::ast::node::InterfaceMember::Property { name, optional, ty, .. } => {
                    let evaluated = self.eval_type_node(ty, &env);
                    if *optional {
                        self.interface_aux
                            .borrow_mut()
                            .entry(decl.name.clone())
                            .or_default()
                            .optional_members
                            .insert(name.clone());
                    }
                    members.insert(name.clone(), Rc::new(value_symbol(name, evaluated, SymbolFlags::PROPERTY)));
                }
                super::ast::node::InterfaceMember::Method {
                    name,
                    type_params,
                    params,
                    return_type,
                    optional,
                } => {
                    let (sig, _) = self.build_function_signature(type_params, params, return_type, None, &env);
                    if *optional {
                        self.interface_aux
                            .borrow_mut()
                            .entry(decl.name.clone())
                            .or_default()
                            .optional_members
                            .insert(name.clone());
                    }
                    members.insert(
                        name.clone(),
                        Rc::new(value_symbol(name, Type::Function(Rc::new(sig)), SymbolFlags::METHOD)),
                    );
                }
                super::ast::node::InterfaceMember::CallSignature { type_params, params, return_type } => {
                    let (sig, _) = self.build_function_signature(type_params, params, return_type, None, &env);
                    self.interface_aux
                        .borrow_mut()
                        .entry(decl.name.clone())
                        .or_default()
                        .call_signatures
                        .push(sig);
                }
                super::ast::node::InterfaceMember::ConstructSignature { type_params, params, return_type } => {
                    let (sig, _) = self.build_function_signature(type_params, params, return_type, None, &env);
                    self.interface_aux
                        .borrow_mut()
                        .entry(decl.name.clone())
                        .or_default()
                        .construct_signatures
                        .push(sig);
                }
                super::ast::node::InterfaceMember::IndexSignature { key_type, value_type, .. } => {
                    let key_ty = self.eval_type_node(key_type, &env);
                    let value_ty = Box::new(self.eval_type_node(value_type, &env));
                    let mut aux_table = self.interface_aux.borrow_mut();
                    let aux = aux_table.entry(decl.name.clone()).or_default();
                    if matches!(key_ty, Type::Number) {
                        aux.number_index = Some(value_ty);
                    } else {
                        aux.string_index = Some(value_ty);
                    }
                }
            }
        }
        for extend in &decl.extends {
            let ty = self.eval_type_node(extend, &env);
            self.interface_aux
                .borrow_mut()
                .entry(decl.name.clone())
                .or_default()
                .extends
                .push(ty);
        }

        match env.merge_type_declaration(decl.name.clone(), span, members, SymbolFlags::INTERFACE) {
            Ok(next) => next,
            Err(_) => {
                self.push_diag(span, diagnostics::DUPLICATE_IDENTIFIER_2300, &[&decl.name]);
                env
            }
        }
    }

    fn build_type_params_no_mut(&self, params: &[TypeParam]) -> Vec<TypeParameter> {
        params
            .iter()
            .map(|p| TypeParameter {
                name: p.name.clone(),
                constraint: None,
                default: None,
                variance: p.variance,
            })
            .collect()
    }

    fn finalize_interface(&mut self, decl: &InterfaceDecl, env: &Environment) -> Environment {
        let sym = match env.lookup_type(&decl.name) {
            Some(s) => s,
            None => return env.clone(),
        };
        let aux = self.interface_aux.borrow().get(&decl.name).cloned().unwrap_or_default();
        let members: BTreeMap<String, Type> = sym
            .members
            .iter()
            .map(|(k, v)| (k.clone(), v.resolved_type.clone().unwrap_or(Type::Any)))
            .collect();
        let iface = InterfaceType {
            name: decl.name.clone(),
            type_params: aux.type_params,
            extends: aux.extends,
            members,
            optional_members: aux.optional_members,
            call_signatures: aux.call_signatures,
            construct_signatures: aux.construct_signatures,
            string_index: aux.string_index,
            number_index: aux.number_index,
        };
        let mut final_sym = (*sym).clone();
        final_sym.resolved_type = Some(Type::Interface(Rc::new(iface)));
        env.declare_type(decl.name.clone(), final_sym)
    }

    fn build_type_alias(&mut self, decl: &TypeAliasDecl, env: Environment) -> Environment {
        let type_params = self.build_type_params(&decl.type_params, &env);
        let alias_env = self.declare_type_params(env.clone(), &type_params);
        let prev = self.defining_alias.replace(Some(decl.name.clone()));
        let body_ty = self.eval_type_node(&decl.ty, &alias_env);
        *self.defining_alias.borrow_mut() = prev;
        self.alias_bodies.borrow_mut().insert(decl.name.clone(), body_ty.clone());

        let final_ty = if type_params.is_empty() {
            body_ty
        } else {
            Type::Generic(Rc::new(GenericDef {
                name: decl.name.clone(),
                type_params,
                body: Rc::new(body_ty),
            }))
        };
        let sym = value_symbol(&decl.name, final_ty, SymbolFlags::TYPE_ALIAS);
        env.declare_type(decl.name.clone(), sym)
    }

    fn predeclare_class(&mut self, decl: &ClassDecl, span: Span, env: Environment) -> Environment {
        let class_ty = self.build_class(decl, &env);
        let name = decl.name.clone().unwrap_or_default();
        let sym = value_symbol(&name, Type::Class(Rc::new(class_ty)), SymbolFlags::CLASS).with_declaration(span);
        let env = env.declare_type(name.clone(), sym.clone());
        env.declare_value(name, sym)
    }

    fn build_class(&mut self, decl: &ClassDecl, env: &Environment) -> ClassType {
        let type_params = self.build_type_params(&decl.type_params, env);
        let class_env = self.declare_type_params(env.clone(), &type_params);
        let superclass = decl.superclass.as_ref().map(|(name, args)| {
            let targs: Vec<Type> = args.iter().map(|a| self.eval_type_node(a, &class_env)).collect();
            Box::new(Type::Instance {
                class_name: name.clone(),
                type_args: targs,
            })
        });
        let implements: Vec<Type> = decl.implements.iter().map(|t| self.eval_type_node(t, &class_env)).collect();

        let mut members = BTreeMap::new();
        let mut static_members = BTreeMap::new();
        for m in &decl.members {
            match m {
                ClassMember::Field { name, type_ann, init, modifiers, is_private_name } => {
                    let key = if *is_private_name { format!("#{}", name) } else { name.clone() };
                    let ty = type_ann
                        .as_ref()
                        .map(|t| self.eval_type_node(t, &class_env))
                        .or_else(|| init.as_ref().map(|e| self.check_expr(e, &class_env).widen()))
                        .unwrap_or(Type::Any);
                    if modifiers.contains(super::ast::node_flags::ModifierFlags::STATIC) {
                        static_members.insert(key, ty);
                    } else {
                        members.insert(key, ty);
                    }
                }
                ClassMember::Method {
                    name,
                    type_params,
                    params,
                    return_type,
                    modifiers,
                    is_private_name,
                    ..
                } => {
                    let key = if *is_private_name { format!("#{}", name) } else { name.clone() };
                    let (sig, _) = self.build_function_signature(type_params, params, return_type, None, &class_env);
                    let ty = Type::Function(Rc::new(sig));
                    if modifiers.contains(super::ast::node_flags::ModifierFlags::STATIC) {
                        static_members.insert(key, ty);
                    } else {
                        members.insert(key, ty);
                    }
                }
                ClassMember::Constructor { params, .. } => {
                    let (sig, _) = self.build_function_signature(&[], params, &None, None, &class_env);
                    members.insert(CONSTRUCTOR_KEY.to_string(), Type::Function(Rc::new(sig)));
                    for p in params {
                        if p.property_modifiers.is_some() {
                            let ty = p.type_ann.as_ref().map(|t| self.eval_type_node(t, &class_env)).unwrap_or(Type::Any);
                            members.insert(p.name.clone(), ty);
                        }
                    }
                }
                ClassMember::Getter { name, return_type, .. } => {
                    let ty = return_type.as_ref().map(|t| self.eval_type_node(t, &class_env)).unwrap_or(Type::Any);
                    members.insert(name.clone(), ty);
                }
                ClassMember::Setter { name, param, .. } => {
                    let ty = param.type_ann.as_ref().map(|t| self.eval_type_node(t, &class_env)).unwrap_or(Type::Any);
                    members.entry(name.clone()).or_insert(ty);
                }
                ClassMember::IndexSignature { .. } | ClassMember::StaticBlock(_) => {}
            }
        }

        ClassType {
            name: decl.name.clone().unwrap_or_default(),
            type_params,
            superclass,
            implements,
            members,
            static_members,
            is_abstract: decl.is_abstract,
        }
    }

    fn build_enum(&mut self, decl: &super::ast::node::EnumDecl, span: Span, env: Environment) -> Environment {
        let mut members = Vec::new();
        let mut next_numeric = 0.0_f64;
        for m in &decl.members {
            let value = match &m.init {
                Some(Expr { kind: ExprKind::Literal(LiteralValue::Number(n)), .. }) => {
                    next_numeric = *n + 1.0;
                    EnumMemberValue::Number(*n)
                }
                Some(Expr { kind: ExprKind::Literal(LiteralValue::String(s)), .. }) => EnumMemberValue::String(s.clone()),
                Some(other) => {
                    let _ = self.check_expr(other, &env);
                    let v = next_numeric;
                    next_numeric += 1.0;
                    EnumMemberValue::Number(v)
                }
                None => {
                    let v = next_numeric;
                    next_numeric += 1.0;
                    EnumMemberValue::Number(v)
                }
            };
            members.push((m.name.clone(), value));
        }
        let enum_ty = Rc::new(EnumType {
            name: decl.name.clone(),
            is_const: decl.is_const,
            members,
        });
        let sym = value_symbol(&decl.name, Type::Enum(enum_ty), SymbolFlags::ENUM).with_declaration(span);
        let env = env.declare_type(decl.name.clone(), sym.clone());
        env.declare_value(decl.name.clone(), sym)
    }

    fn predeclare_function(&mut self, decl: &Rc<FunctionDecl>, span: Span, env: Environment) -> Environment {
        let name = match &decl.name {
            Some(n) => n.clone(),
            None => return env,
        };
        let (sig, _) = self.build_function_signature(&decl.type_params, &decl.params, &decl.return_type, decl.this_param.as_ref(), &env);

        if decl.body.is_none() {
            // Overload signature: merge into the existing declaration rather
            // than checking a (nonexistent) body.
            return match env.lookup_value(&name) {
                Some(existing) => {
                    let merged = match &existing.resolved_type {
                        Some(Type::Function(first)) => Type::Overloaded(vec![(**first).clone(), sig]),
                        Some(Type::Overloaded(sigs)) => {
                            let mut sigs = sigs.clone();
                            sigs.push(sig);
                            Type::Overloaded(sigs)
                        }
                        _ => Type::Function(Rc::new(sig)),
                    };
                    env.declare_value(name, value_symbol(&existing.name, merged, SymbolFlags::FUNCTION).with_declaration(span))
                }
                None => env.declare_value(name.clone(), value_symbol(&name, Type::Function(Rc::new(sig)), SymbolFlags::FUNCTION).with_declaration(span)),
            };
        }

        match env.lookup_value(&name) {
            Some(existing) if matches!(existing.resolved_type, Some(Type::Overloaded(_))) => {
                // The implementation signature for a preceding set of
                // overload signatures; keep the overload set as the public
                // type and check the body against its own declared shape.
                env
            }
            _ => env.declare_value(name.clone(), value_symbol(&name, Type::Function(Rc::new(sig)), SymbolFlags::FUNCTION).with_declaration(span)),
        }
    }

    // ---- Statement checking (spec §4.5–§4.7) -------------------------------

    pub fn check_stmt(&mut self, stmt: &Stmt, env: &Environment) -> Environment {
        match &stmt.kind {
            StmtKind::Empty | StmtKind::Debugger => env.clone(),
            StmtKind::Expr(e) => {
                self.check_expr(e, env);
                if let Some(n) = self.assertion_narrowing(e, env) {
                    return env.declare_value(n.name.clone(), value_symbol(&n.name, n.then_type, SymbolFlags::BLOCK_SCOPED_VARIABLE));
                }
                env.clone()
            }
            StmtKind::VarDecl(decl) => self.check_var_decl(decl, stmt.span, env),
            StmtKind::Sequence(stmts) => {
                let mut env = env.clone();
                for s in stmts {
                    env = self.check_stmt(s, &env);
                }
                env
            }
            StmtKind::Block(stmts) => {
                let mut inner = env.push_child();
                inner = self.hoist_block(stmts, inner);
                for s in stmts {
                    inner = self.check_stmt(s, &inner);
                }
                env.clone()
            }
            StmtKind::FunctionDecl(decl) => {
                self.check_function_body(decl, env);
                env.clone()
            }
            StmtKind::ClassDecl(_) | StmtKind::InterfaceDecl(_) | StmtKind::TypeAliasDecl(_) | StmtKind::EnumDecl(_) => {
                // Fully resolved during hoisting.
                env.clone()
            }
            StmtKind::NamespaceDecl(decl) => {
                let mut inner = env.push_child();
                inner = self.hoist_block(&decl.body, inner);
                for s in &decl.body {
                    inner = self.check_stmt(s, &inner);
                }
                env.declare_namespace(decl.name.clone(), inner)
            }
            StmtKind::ModuleAugmentation(decl) => {
                let mut inner = env.push_child();
                inner = self.hoist_block(&decl.body, inner);
                for s in &decl.body {
                    inner = self.check_stmt(s, &inner);
                }
                env.merge_namespace(decl.name.clone(), inner)
            }
            StmtKind::GlobalAugmentation(stmts) => {
                let mut env = env.clone();
                env = self.hoist_block(stmts, env);
                for s in stmts {
                    env = self.check_stmt(s, &env);
                }
                env
            }
            StmtKind::Import(decl) => {
                let mut env = env.clone();
                for spec in &decl.specifiers {
                    let local = match spec {
                        super::ast::node::ImportSpecifier::Named { local, .. } => local.clone(),
                        super::ast::node::ImportSpecifier::Default(local) => local.clone(),
                        super::ast::node::ImportSpecifier::Namespace(local) => local.clone(),
                    };
                    if decl.type_only {
                        env = env.declare_type(local.clone(), value_symbol(&local, Type::Any, SymbolFlags::TYPE_ALIAS));
                    } else {
                        env = env.declare_value(local.clone(), value_symbol(&local, Type::Any, SymbolFlags::ALIAS));
                    }
                }
                env
            }
            StmtKind::ExportNamed(_) => env.clone(),
            StmtKind::ExportDefault(expr) => {
                self.check_expr(expr, env);
                env.clone()
            }
            StmtKind::ExportDecl(inner) => self.check_stmt(inner, env),
            StmtKind::ExportAssignment(expr) => {
                self.check_expr(expr, env);
                env.clone()
            }
            StmtKind::ImportEquals { name, target, .. } => env.declare_import_alias(name.clone(), target.clone()),
            StmtKind::If { cond, then, else_ } => self.check_if(cond, then, else_.as_deref(), env),
            StmtKind::While { cond, body } => {
                self.check_expr(cond, env);
                self.loop_depth += 1;
                self.check_stmt(body, env);
                self.loop_depth -= 1;
                env.clone()
            }
            StmtKind::DoWhile { body, cond } => {
                self.loop_depth += 1;
                self.check_stmt(body, env);
                self.loop_depth -= 1;
                self.check_expr(cond, env);
                env.clone()
            }
            StmtKind::ForOf { decl_kind, binding, expr, body, .. } => {
                let iterable_ty = self.check_expr(expr, env);
                let elem_ty = match iterable_ty {
                    Type::Array(el) => *el,
                    Type::Tuple(els) => union_of(els.into_iter().map(|e| e.ty).collect()),
                    _ => Type::Any,
                };
                let flags = decl_kind_flags(*decl_kind);
                let mut inner = env.push_child();
                inner = inner.declare_value(binding.clone(), value_symbol(binding, elem_ty, flags));
                self.loop_depth += 1;
                self.check_stmt(body, &inner);
                self.loop_depth -= 1;
                env.clone()
            }
            StmtKind::ForIn { decl_kind, binding, expr, body } => {
                self.check_expr(expr, env);
                let flags = decl_kind_flags(*decl_kind);
                let mut inner = env.push_child();
                inner = inner.declare_value(binding.clone(), value_symbol(binding, Type::String, flags));
                self.loop_depth += 1;
                self.check_stmt(body, &inner);
                self.loop_depth -= 1;
                env.clone()
            }
            StmtKind::Switch { discriminant, cases } => self.check_switch(discriminant, cases, env),
            StmtKind::Try { block, catch, finally } => {
                let mut inner = env.push_child();
                inner = self.hoist_block(block, inner);
                for s in block {
                    inner = self.check_stmt(s, &inner);
                }
                if let Some(CatchClause { param, param_type, body }) = catch {
                    let mut catch_env = env.push_child();
                    if let Some(p) = param {
                        let ty = param_type
                            .as_ref()
                            .map(|t| self.eval_type_node(t, &catch_env))
                            .unwrap_or(Type::Any);
                        catch_env = catch_env.declare_value(p.clone(), value_symbol(p, ty, SymbolFlags::BLOCK_SCOPED_VARIABLE));
                    }
                    catch_env = self.hoist_block(body, catch_env);
                    for s in body {
                        catch_env = self.check_stmt(s, &catch_env);
                    }
                }
                if let Some(fin) = finally {
                    let mut fin_env = env.push_child();
                    fin_env = self.hoist_block(fin, fin_env);
                    for s in fin {
                        fin_env = self.check_stmt(s, &fin_env);
                    }
                }
                env.clone()
            }
            StmtKind::Throw(e) => {
                self.check_expr(e, env);
                env.clone()
            }
            StmtKind::Return(e) => {
                let ty = e.as_ref().map(|e| self.check_expr(e, env)).unwrap_or(Type::Void);
                if let Some(slot) = self.return_type_stack.last_mut() {
                    *slot = Some(match slot.take() {
                        Some(prev) => union_of(vec![prev, ty]),
                        None => ty,
                    });
                }
                env.clone()
            }
            StmtKind::Break(_) | StmtKind::Continue(_) => env.clone(),
            StmtKind::Labeled { label, body } => {
                let env = env.declare_label(label.clone());
                self.check_stmt(body, &env);
                env
            }
            StmtKind::Using { bindings, .. } => {
                let mut env = env.clone();
                for (name, expr) in bindings {
                    let ty = self.check_expr(expr, &env);
                    env = env.declare_value(name.clone(), value_symbol(name, ty, SymbolFlags::BLOCK_SCOPED_VARIABLE));
                }
                env
            }
        }
    }

    fn check_var_decl(&mut self, decl: &VarDecl, span: Span, env: &Environment) -> Environment {
        let declared_ty = decl.type_ann.as_ref().map(|t| self.eval_type_node(t, env));
        let init_ty = decl.init.as_ref().map(|e| self.check_expr(e, env));

        if let (Some(expected), Some(init_expr)) = (&declared_ty, &decl.init) {
            self.check_excess_properties(expected, init_expr, span);
        }

        let final_ty = match (&declared_ty, &init_ty) {
            (Some(expected), Some(actual)) => {
                if !self.is_assignable(expected, actual, env) {
                    self.push_diag(
                        span,
                        diagnostics::TYPE_NOT_ASSIGNABLE_2322,
                        &[&describe(actual), &describe(expected)],
                    );
                }
                expected.clone()
            }
            (Some(expected), None) => expected.clone(),
            (None, Some(actual)) => {
                if decl.kind == VarKind::Const {
                    actual.clone()
                } else {
                    actual.widen()
                }
            }
            (None, None) => Type::Any,
        };

        let flags = match decl.kind {
            VarKind::Var => SymbolFlags::FUNCTION_SCOPED_VARIABLE,
            VarKind::Let | VarKind::Const => SymbolFlags::BLOCK_SCOPED_VARIABLE,
        };
        env.declare_value(decl.name.clone(), value_symbol(&decl.name, final_ty, flags).with_declaration(span))
    }

    fn check_excess_properties(&mut self, expected: &Type, actual_expr: &Expr, span: Span) {
        if let ExprKind::Object { props, is_fresh: true } = &actual_expr.kind {
            let actual_fields: Vec<String> = props
                .iter()
                .filter_map(|p| match p {
                    ObjectProp::KeyValue { key, computed: false, .. } => Some(key.clone()),
                    ObjectProp::Shorthand(name) => Some(name.clone()),
                    ObjectProp::Method { key, .. } => Some(key.clone()),
                    ObjectProp::Getter { key, .. } => Some(key.clone()),
                    ObjectProp::Setter { key, .. } => Some(key.clone()),
                    _ => None,
                })
                .collect();
            if let Some(bad) = assignability::excess_property_check(expected, &actual_fields) {
                self.push_diag(span, diagnostics::OBJECT_LITERAL_MAY_ONLY_SPECIFY_KNOWN_PROPERTIES_2353, &[&bad, &describe(expected)]);
            }
        }
    }

    fn check_function_body(&mut self, decl: &FunctionDecl, env: &Environment) {
        let body = match &decl.body {
            Some(b) => b,
            None => return,
        };
        let (sig, param_env) = self.build_function_signature(
            &decl.type_params,
            &decl.params,
            &decl.return_type,
            decl.this_param.as_ref(),
            env,
        );
        self.return_type_stack.push(None);
        let mut inner = param_env.push_child();
        inner = self.hoist_block(body, inner);
        for s in body {
            inner = self.check_stmt(s, &inner);
        }
        let inferred = self.return_type_stack.pop().flatten();
        if decl.return_type.is_none() {
            let _ = inference::merge_return_types(inferred.into_iter().collect());
        }
        let _ = sig;
    }

    fn check_if(&mut self, cond: &Expr, then: &Stmt, else_: Option<&Stmt>, env: &Environment) -> Environment {
        self.check_expr(cond, env);
        let narrowing = self.narrow_for(cond, env);

        let then_env = self.env_with_narrowing(env, narrowing.as_ref(), true);
        self.check_stmt(then, &then_env);

        if let Some(e) = else_ {
            let else_env = self.env_with_narrowing(env, narrowing.as_ref(), false);
            self.check_stmt(e, &else_env);
        }

        if let Some(n) = narrowing {
            let then_terminates = stmt_terminates(then);
            let else_terminates = else_.map(stmt_terminates).unwrap_or(false);
            if then_terminates && !else_terminates {
                return env.declare_value(n.name.clone(), value_symbol(&n.name, n.else_type, SymbolFlags::BLOCK_SCOPED_VARIABLE));
            }
            if else_.is_some() && else_terminates && !then_terminates {
                return env.declare_value(n.name.clone(), value_symbol(&n.name, n.then_type, SymbolFlags::BLOCK_SCOPED_VARIABLE));
            }
        }
        env.clone()
    }

    fn narrow_for(&self, cond: &Expr, env: &Environment) -> Option<Narrowing> {
        let type_of = |name: &str| env.lookup_value(name).and_then(|s| s.resolved_type.clone());
        narrowing::narrow_condition(cond, &type_of).or_else(|| self.type_predicate_narrowing(cond, env))
    }

    /// `f(x)` where `f`'s resolved signature returns `v is T` (spec §4.7's
    /// user-defined type-guard form). `narrowing::narrow_condition` cannot
    /// recognize this by itself since it never looks up a callee's
    /// signature; the callee's type is already sitting in `expr_types`
    /// because `check_if` type-checked the whole condition (including this
    /// call) before asking for a narrowing.
    fn type_predicate_narrowing(&self, expr: &Expr, env: &Environment) -> Option<Narrowing> {
        match &expr.kind {
            ExprKind::Unary { op: UnaryOp::Not, expr: inner } => {
                self.type_predicate_narrowing(inner, env).map(|n| Narrowing {
                    name: n.name,
                    then_type: n.else_type,
                    else_type: n.then_type,
                })
            }
            ExprKind::Call { callee, args, .. } => {
                let sig = self.callee_signature(callee, |ty| matches!(ty, Type::TypePredicate { .. }))?;
                let (param_name, target) = match sig.return_type.as_ref() {
                    Type::TypePredicate { param_name, ty: Some(ty) } => (param_name.clone(), (**ty).clone()),
                    _ => return None,
                };
                let arg_index = sig.params.iter().position(|p| p.name == param_name)?;
                let arg_expr = match args.get(arg_index)? {
                    ArrayElement::Item(e) => e,
                    _ => return None,
                };
                let name = match &arg_expr.kind {
                    ExprKind::Ident(n) => n.clone(),
                    _ => return None,
                };
                let ambient = env.lookup_value(&name).and_then(|s| s.resolved_type.clone())?;
                let mut narrowing = narrowing::narrow_by_type_predicate(&ambient, &target);
                narrowing.name = name;
                Some(narrowing)
            }
            _ => None,
        }
    }

    /// `f(x)` where `f`'s resolved signature returns `asserts x` / `asserts x
    /// is T` (spec §4.7): a statement-level effect rather than a branch
    /// narrowing, applied by `check_stmt`'s `StmtKind::Expr` arm to the
    /// environment that reaches the statements after it.
    fn assertion_narrowing(&self, expr: &Expr, env: &Environment) -> Option<Narrowing> {
        let ExprKind::Call { callee, args, .. } = &expr.kind else {
            return None;
        };
        let sig = self.callee_signature(callee, |ty| matches!(ty, Type::AssertsPredicate { .. }))?;
        let (param_name, target) = match sig.return_type.as_ref() {
            Type::AssertsPredicate { param_name, ty } => (param_name.clone(), ty.as_deref().cloned()),
            _ => return None,
        };
        let arg_index = sig.params.iter().position(|p| p.name == param_name)?;
        let arg_expr = match args.get(arg_index)? {
            ArrayElement::Item(e) => e,
            _ => return None,
        };
        let name = match &arg_expr.kind {
            ExprKind::Ident(n) => n.clone(),
            _ => return None,
        };
        let ambient = env.lookup_value(&name).and_then(|s| s.resolved_type.clone())?;
        let then_type = match target {
            Some(t) => t,
            None => narrowing::subtract(&ambient, &Type::Union(vec![Type::Null, Type::Undefined])),
        };
        Some(Narrowing { name, then_type, else_type: ambient })
    }

    /// Resolves `callee`'s already-checked type (from `expr_types`) to a
    /// single signature whose return type matches `wants`, picking the first
    /// overload that does for `Type::Overloaded`.
    fn callee_signature(&self, callee: &Expr, wants: impl Fn(&Type) -> bool) -> Option<Rc<FunctionSignature>> {
        match self.expression_type(callee.span)? {
            Type::Function(sig) if wants(sig.return_type.as_ref()) => Some(sig),
            Type::Overloaded(sigs) => sigs
                .into_iter()
                .find(|s| wants(s.return_type.as_ref()))
                .map(Rc::new),
            _ => None,
        }
    }

    fn env_with_narrowing(&self, env: &Environment, narrowing: Option<&Narrowing>, then_branch: bool) -> Environment {
        let child = env.push_child();
        match narrowing {
            Some(n) => {
                let ty = if then_branch { n.then_type.clone() } else { n.else_type.clone() };
                child.declare_value(n.name.clone(), value_symbol(&n.name, ty, SymbolFlags::BLOCK_SCOPED_VARIABLE))
            }
            None => child,
        }
    }

    fn check_switch(&mut self, discriminant: &Expr, cases: &[SwitchCase], env: &Environment) -> Environment {
        self.switch_depth += 1;
        let disc_ty = self.check_expr(discriminant, env);
        let disc_binding = match &discriminant.kind {
            ExprKind::Member { object, prop: MemberProp::Name(key), .. } => match &object.kind {
                ExprKind::Ident(name) => Some((name.clone(), key.clone())),
                _ => None,
            },
            _ => None,
        };

        let mut remaining = disc_ty;
        for case in cases {
            let mut case_env = env.push_child();
            match (&disc_binding, &case.test) {
                (Some((name, key)), Some(test)) => {
                    let lit_ty = self.check_expr(test, env);
                    let (matched, rest) = narrow_discriminated(&remaining, key, &lit_ty);
                    case_env = case_env.declare_value(name.clone(), value_symbol(name, matched, SymbolFlags::BLOCK_SCOPED_VARIABLE));
                    remaining = rest;
                }
                (Some((name, _)), None) => {
                    case_env = case_env.declare_value(name.clone(), value_symbol(name, remaining.clone(), SymbolFlags::BLOCK_SCOPED_VARIABLE));
                }
                (None, Some(test)) => {
                    self.check_expr(test, env);
                }
                (None, None) => {}
            }
            case_env = self.hoist_block(&case.body, case_env);
            for s in &case.body {
                case_env = self.check_stmt(s, &case_env);
            }
        }
        self.switch_depth -= 1;
        env.clone()
    }

    // ---- Expression checking (spec §4.6) -----------------------------------

    pub fn check_expr(&mut self, expr: &Expr, env: &Environment) -> Type {
        let ty = self.check_expr_inner(expr, env);
        self.expr_types.borrow_mut().insert((expr.span.start, expr.span.end), ty.clone());
        ty
    }

    fn check_expr_inner(&mut self, expr: &Expr, env: &Environment) -> Type {
        match &expr.kind {
            ExprKind::Literal(lit) => match lit {
                LiteralValue::String(s) => Type::StringLiteral(s.clone()),
                LiteralValue::Number(n) => Type::number_literal(*n),
                LiteralValue::Boolean(b) => Type::BooleanLiteral(*b),
                LiteralValue::Null => Type::Null,
                LiteralValue::Undefined => Type::Undefined,
                LiteralValue::BigInt(s) => Type::BigIntLiteral(s.clone()),
            },
            ExprKind::Template(t) => {
                for e in &t.exprs {
                    self.check_expr(e, env);
                }
                Type::String
            }
            ExprKind::TaggedTemplate { tag, quasi } => {
                self.check_expr(tag, env);
                for e in &quasi.exprs {
                    self.check_expr(e, env);
                }
                Type::Any
            }
            ExprKind::Ident(name) => match env.lookup_value(name) {
                Some(sym) => sym.resolved_type.clone().unwrap_or(Type::Any),
                None => {
                    self.push_diag(expr.span, diagnostics::CANNOT_FIND_NAME_2304, &[name]);
                    Type::Any
                }
            },
            ExprKind::This => env
                .lookup_value(super::ast::symbol::internal_symbol_names::THIS)
                .and_then(|s| s.resolved_type.clone())
                .unwrap_or(Type::Any),
            ExprKind::Super => Type::Any,
            ExprKind::Binary { op, left, right } => self.check_binary(*op, left, right, env),
            ExprKind::Logical { op, left, right } => self.check_logical(*op, left, right, env),
            ExprKind::Ternary { cond, then, else_ } => {
                self.check_expr(cond, env);
                let narrowing = self.narrow_for(cond, env);
                let then_env = self.env_with_narrowing(env, narrowing.as_ref(), true);
                let else_env = self.env_with_narrowing(env, narrowing.as_ref(), false);
                let then_ty = self.check_expr(then, &then_env);
                let else_ty = self.check_expr(else_, &else_env);
                union_of(vec![then_ty, else_ty])
            }
            ExprKind::Grouping(inner) => self.check_expr(inner, env),
            ExprKind::Unary { op, expr: inner } => {
                let inner_ty = self.check_expr(inner, env);
                match op {
                    UnaryOp::TypeOf => Type::String,
                    UnaryOp::Not => Type::Boolean,
                    UnaryOp::Plus | UnaryOp::Minus | UnaryOp::BitNot => Type::Number,
                    UnaryOp::Void => Type::Undefined,
                    UnaryOp::Delete => Type::Boolean,
                }
                .tap(|_| {
                    let _ = &inner_ty;
                })
            }
            ExprKind::Update { expr: inner, .. } => {
                self.check_expr(inner, env);
                Type::Number
            }
            ExprKind::Assign { op, target, value } => {
                let value_ty = self.check_expr(value, env);
                let target_ty = self.check_expr(target, env);
                if matches!(op, super::ast::node::AssignOp::Assign) && !self.is_assignable(&target_ty, &value_ty, env) {
                    self.push_diag(
                        expr.span,
                        diagnostics::TYPE_NOT_ASSIGNABLE_2322,
                        &[&describe(&value_ty), &describe(&target_ty)],
                    );
                }
                target_ty
            }
            ExprKind::Member { object, prop, optional } => {
                let object_ty = self.check_expr(object, env);
                let key = match prop {
                    MemberProp::Name(n) => n.clone(),
                    MemberProp::PrivateName(n) => format!("#{}", n),
                };
                let member_ty = self.member_type_of(&object_ty, &key, env);
                if *optional && object_ty.is_nullish() {
                    union_of(vec![member_ty, Type::Undefined])
                } else {
                    member_ty
                }
            }
            ExprKind::Index { object, index, .. } => {
                let object_ty = self.check_expr(object, env);
                let index_ty = self.check_expr(index, env);
                self.index_type_of(&object_ty, &index_ty)
            }
            ExprKind::New { callee, type_args, args } => {
                let callee_ty = self.check_expr(callee, env);
                for a in args {
                    self.check_array_element(a, env);
                }
                match callee_ty {
                    Type::Class(c) => {
                        let targs: Vec<Type> = type_args.iter().map(|t| self.eval_type_node(t, env)).collect();
                        let targs = if targs.is_empty() {
                            c.type_params.iter().map(|p| p.default.clone().unwrap_or(Type::Any)).collect()
                        } else {
                            targs
                        };
                        Type::Instance {
                            class_name: c.name.clone(),
                            type_args: targs,
                        }
                    }
                    _ => Type::Any,
                }
            }
            ExprKind::Call { callee, type_args, args, .. } => self.check_call(callee, type_args, args, env, expr.span),
            ExprKind::Array(elements) => {
                let mut spread_all_any = false;
                let mut elem_types = Vec::new();
                for el in elements {
                    match el {
                        ArrayElement::Item(e) => elem_types.push(self.check_expr(e, env)),
                        ArrayElement::Spread(e) => {
                            let spread_ty = self.check_expr(e, env);
                            match spread_ty {
                                Type::Array(inner) => elem_types.push(*inner),
                                Type::Tuple(tup) => elem_types.extend(tup.into_iter().map(|t| t.ty)),
                                _ => spread_all_any = true,
                            }
                        }
                        ArrayElement::Hole => elem_types.push(Type::Undefined),
                    }
                }
                if spread_all_any {
                    Type::Array(Box::new(Type::Any))
                } else {
                    Type::Array(Box::new(union_of(elem_types)))
                }
            }
            ExprKind::Object { props, .. } => self.check_object_literal(props, env),
            ExprKind::Arrow { type_params, params, return_type, this_param, body, .. } => {
                let (sig, param_env) = self.build_function_signature(type_params, params, return_type, this_param.as_ref(), env);
                self.return_type_stack.push(None);
                let body_ty = match body {
                    ArrowBody::Expr(e) => self.check_expr(e, &param_env),
                    ArrowBody::Block(stmts) => {
                        let mut inner = param_env.push_child();
                        inner = self.hoist_block(stmts, inner);
                        for s in stmts {
                            inner = self.check_stmt(s, &inner);
                        }
                        self.return_type_stack.last().cloned().flatten().unwrap_or(Type::Void)
                    }
                };
                self.return_type_stack.pop();
                let return_type = if return_type.is_some() { *sig.return_type.clone() } else { body_ty };
                Type::Function(Rc::new(FunctionSignature {
                    type_params: sig.type_params,
                    params: sig.params,
                    this_type: sig.this_type,
                    return_type: Box::new(return_type),
                }))
            }
            ExprKind::FunctionExpr(decl) => {
                let (sig, _) = self.build_function_signature(&decl.type_params, &decl.params, &decl.return_type, decl.this_param.as_ref(), env);
                self.check_function_body(decl, env);
                Type::Function(Rc::new(sig))
            }
            ExprKind::ClassExpr(decl) => Type::Class(Rc::new(self.build_class(decl, env))),
            ExprKind::Spread(inner) => self.check_expr(inner, env),
            ExprKind::As { expr: inner, ty } | ExprKind::Satisfies { expr: inner, ty } => {
                self.check_expr(inner, env);
                self.eval_type_node(ty, env)
            }
            ExprKind::AngleBracketAssertion { ty, expr: inner } => {
                self.check_expr(inner, env);
                self.eval_type_node(ty, env)
            }
            ExprKind::NonNull(inner) => {
                let ty = self.check_expr(inner, env);
                narrowing::subtract(&ty, &Type::Union(vec![Type::Null, Type::Undefined]))
            }
            ExprKind::Await(inner) => {
                let ty = self.check_expr(inner, env);
                unwrap_promise(ty)
            }
            ExprKind::Yield { arg, .. } => arg.as_ref().map(|e| self.check_expr(e, env)).unwrap_or(Type::Undefined),
        }
    }

    fn check_array_element(&mut self, el: &ArrayElement, env: &Environment) {
        match el {
            ArrayElement::Item(e) | ArrayElement::Spread(e) => {
                self.check_expr(e, env);
            }
            ArrayElement::Hole => {}
        }
    }

    fn check_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, env: &Environment) -> Type {
        let left_ty = self.check_expr(left, env);
        let right_ty = self.check_expr(right, env);
        match op {
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::StrictEq
            | BinaryOp::StrictNotEq
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::LtEq
            | BinaryOp::GtEq
            | BinaryOp::In
            | BinaryOp::InstanceOf => Type::Boolean,
            BinaryOp::Add => {
                if matches!(left_ty, Type::String | Type::StringLiteral(_)) || matches!(right_ty, Type::String | Type::StringLiteral(_)) {
                    Type::String
                } else {
                    Type::Number
                }
            }
            _ => Type::Number,
        }
    }

    fn check_logical(&mut self, op: LogicalOp, left: &Expr, right: &Expr, env: &Environment) -> Type {
        let left_ty = self.check_expr(left, env);
        let narrowing = self.narrow_for(left, env);
        let right_env = match op {
            LogicalOp::And => self.env_with_narrowing(env, narrowing.as_ref(), true),
            LogicalOp::Or | LogicalOp::Nullish => self.env_with_narrowing(env, narrowing.as_ref(), false),
        };
        let right_ty = self.check_expr(right, &right_env);
        match op {
            LogicalOp::And => right_ty,
            LogicalOp::Or | LogicalOp::Nullish => union_of(vec![left_ty, right_ty]),
        }
    }

    fn check_object_literal(&mut self, props: &[ObjectProp], env: &Environment) -> Type {
        let mut fields = BTreeMap::new();
        for p in props {
            match p {
                ObjectProp::KeyValue { key, computed: false, value } => {
                    fields.insert(key.clone(), self.check_expr(value, env));
                }
                ObjectProp::KeyValue { value, computed: true, .. } => {
                    self.check_expr(value, env);
                }
                ObjectProp::Shorthand(name) => {
                    let ty = env.lookup_value(name).and_then(|s| s.resolved_type.clone()).unwrap_or(Type::Any);
                    fields.insert(name.clone(), ty);
                }
                ObjectProp::Method { key, params, return_type, .. } => {
                    let (sig, _) = self.build_function_signature(&[], params, return_type, None, env);
                    fields.insert(key.clone(), Type::Function(Rc::new(sig)));
                }
                ObjectProp::Getter { key, return_type, .. } => {
                    let ty = return_type.as_ref().map(|t| self.eval_type_node(t, env)).unwrap_or(Type::Any);
                    fields.insert(key.clone(), ty);
                }
                ObjectProp::Setter { key, param, .. } => {
                    let ty = param.type_ann.as_ref().map(|t| self.eval_type_node(t, env)).unwrap_or(Type::Any);
                    fields.entry(key.clone()).or_insert(ty);
                }
                ObjectProp::Spread(e) => {
                    let spread_ty = self.check_expr(e, env);
                    if let Some((f, _, _, _, _)) = object_shape(&spread_ty) {
                        for (k, v) in f {
                            fields.insert(k, v);
                        }
                    }
                }
            }
        }
        Type::Record(Box::new(RecordType {
            fields,
            optional_fields: BTreeSet::new(),
            readonly_fields: BTreeSet::new(),
            string_index: None,
            number_index: None,
        }))
    }

    fn member_type_of(&mut self, object_ty: &Type, key: &str, env: &Environment) -> Type {
        match object_ty {
            Type::Record(r) => r.fields.get(key).cloned().or_else(|| r.string_index.as_ref().map(|t| (**t).clone())).unwrap_or(Type::Any),
            Type::Interface(i) => i
                .members
                .get(key)
                .cloned()
                .or_else(|| i.string_index.as_ref().map(|t| (**t).clone()))
                .unwrap_or(Type::Any),
            Type::Class(c) => c.members.get(key).or_else(|| c.static_members.get(key)).cloned().unwrap_or(Type::Any),
            Type::Instance { class_name, .. } => env
                .lookup_type(class_name)
                .and_then(|s| match &s.resolved_type {
                    Some(Type::Class(c)) => c.members.get(key).cloned(),
                    _ => None,
                })
                .unwrap_or(Type::Any),
            Type::Array(_) if key == "length" => Type::Number,
            Type::Tuple(_) if key == "length" => Type::Number,
            Type::Enum(e) => {
                if e.members.iter().any(|(n, _)| n == key) {
                    Type::EnumMember {
                        enum_name: e.name.clone(),
                        member_name: key.to_string(),
                    }
                } else {
                    Type::Any
                }
            }
            Type::Union(members) => union_of(members.iter().map(|m| self.member_type_of(m, key, env)).collect()),
            _ => Type::Any,
        }
    }

    fn index_type_of(&self, object_ty: &Type, index_ty: &Type) -> Type {
        match object_ty {
            Type::Array(el) => (**el).clone(),
            Type::Tuple(els) => match index_ty {
                Type::NumberLiteral(bits) => {
                    let i = Type::number_literal_value(*bits) as usize;
                    els.get(i).map(|e| e.ty.clone()).unwrap_or(Type::Any)
                }
                _ => union_of(els.iter().map(|e| e.ty.clone()).collect()),
            },
            Type::Record(r) => match index_ty {
                Type::StringLiteral(s) => r.fields.get(s).cloned().unwrap_or_else(|| r.string_index.as_ref().map(|t| (**t).clone()).unwrap_or(Type::Any)),
                Type::Number | Type::NumberLiteral(_) => r.number_index.as_ref().map(|t| (**t).clone()).unwrap_or(Type::Any),
                _ => r.string_index.as_ref().map(|t| (**t).clone()).unwrap_or(Type::Any),
            },
            _ => Type::Any,
        }
    }

    fn check_call(&mut self, callee: &Expr, type_args: &[TypeNode], args: &[ArrayElement], env: &Environment, span: Span) -> Type {
        let callee_ty = self.check_expr(callee, env);
        let arg_types: Vec<Type> = args
            .iter()
            .map(|a| match a {
                ArrayElement::Item(e) | ArrayElement::Spread(e) => self.check_expr(e, env),
                ArrayElement::Hole => Type::Undefined,
            })
            .collect();

        let explicit_type_args: Vec<Type> = type_args.iter().map(|t| self.eval_type_node(t, env)).collect();

        match &callee_ty {
            Type::Function(sig) => self.check_signature_call(sig, &explicit_type_args, &arg_types, args, env, span),
            Type::Overloaded(sigs) => sigs
                .first()
                .map(|s| self.check_signature_call(&Rc::new(s.clone()), &explicit_type_args, &arg_types, args, env, span))
                .unwrap_or(Type::Any),
            _ => Type::Any,
        }
    }

    fn check_signature_call(
        &mut self,
        sig: &Rc<FunctionSignature>,
        explicit_type_args: &[Type],
        arg_types: &[Type],
        args: &[ArrayElement],
        env: &Environment,
        span: Span,
    ) -> Type {
        let required = sig.params.iter().filter(|p| !p.optional && !p.rest).count();
        if arg_types.len() < required {
            self.push_diag(
                span,
                diagnostics::EXPECTED_N_ARGUMENTS_2554,
                &[&required.to_string(), &arg_types.len().to_string()],
            );
        }

        let type_param_names: Vec<String> = sig.type_params.iter().map(|p| p.name.clone()).collect();
        let mapping: HashMap<String, Type> = if !explicit_type_args.is_empty() {
            type_param_names
                .iter()
                .cloned()
                .zip(explicit_type_args.iter().cloned())
                .collect()
        } else if !type_param_names.is_empty() {
            let mut candidates = InferenceCandidates::new();
            for (p, a) in sig.params.iter().zip(arg_types.iter()) {
                inference::unify(&p.ty, a, &type_param_names, &mut candidates);
            }
            candidates.resolve(&type_param_names)
        } else {
            HashMap::new()
        };

        if !explicit_type_args.is_empty() {
            for (i, param) in sig.params.iter().enumerate() {
                let expected = substitution::substitute(&param.ty, &mapping);
                if let Some(actual) = arg_types.get(i) {
                    if !self.is_assignable(&expected, actual, env) {
                        self.push_diag(
                            span,
                            diagnostics::TYPE_NOT_ASSIGNABLE_2322,
                            &[&describe(actual), &describe(&expected)],
                        );
                    }
                }
            }
        } else {
            for (i, param) in sig.params.iter().enumerate() {
                if let (Some(actual_expr), Some(actual)) = (args.get(i), arg_types.get(i)) {
                    let expected = substitution::substitute(&param.ty, &mapping);
                    if let ArrayElement::Item(e) = actual_expr {
                        self.check_excess_properties(&expected, e, span);
                    }
                    let _ = actual;
                }
            }
        }

        substitution::substitute(&sig.return_type, &mapping)
    }
}

/// Pure termination analysis (spec §4.7 "if exactly one branch terminates").
/// Block/Sequence use "any contained statement terminates" as a deliberate
/// simplification, not full unreachable-code analysis.
pub fn stmt_terminates(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return(_) | StmtKind::Throw(_) | StmtKind::Break(_) | StmtKind::Continue(_) => true,
        StmtKind::Block(stmts) | StmtKind::Sequence(stmts) => stmts.iter().any(stmt_terminates),
        StmtKind::If { then, else_: Some(e), .. } => stmt_terminates(then) && stmt_terminates(e),
        StmtKind::Try { block, catch, finally } => {
            let finally_terminates = finally.as_ref().map(|f| f.iter().any(stmt_terminates)).unwrap_or(false);
            let block_terminates = block.iter().any(stmt_terminates);
            let catch_terminates = catch.as_ref().map(|c| c.body.iter().any(stmt_terminates)).unwrap_or(true);
            finally_terminates || (block_terminates && catch_terminates)
        }
        StmtKind::Labeled { body, .. } => stmt_terminates(body),
        _ => false,
    }
}

fn decl_kind_flags(decl_kind: Option<VarKind>) -> SymbolFlags {
    match decl_kind {
        Some(VarKind::Var) => SymbolFlags::FUNCTION_SCOPED_VARIABLE,
        _ => SymbolFlags::BLOCK_SCOPED_VARIABLE,
    }
}

fn unwrap_export(kind: &StmtKind) -> &StmtKind {
    match kind {
        StmtKind::ExportDecl(inner) => unwrap_export(&inner.kind),
        other => other,
    }
}

/// Switch-statement discriminated-union narrowing (spec §4.7): keeps union
/// members whose `key` field is a literal equal to `literal`, splitting
/// `ambient` into (matched, remainder). Reimplemented locally since
/// `narrowing`'s equivalent helper is private to that module.
fn narrow_discriminated(ambient: &Type, key: &str, literal: &Type) -> (Type, Type) {
    match ambient {
        Type::Union(members) => {
            let mut kept = Vec::new();
            let mut rest = Vec::new();
            for m in members {
                let is_match = object_shape(m).and_then(|(fields, ..)| fields.get(key).cloned()).map(|t| &t == literal).unwrap_or(false);
                if is_match {
                    kept.push(m.clone());
                } else {
                    rest.push(m.clone());
                }
            }
            (union_of(kept), union_of(rest))
        }
        other => (other.clone(), other.clone()),
    }
}

/// Extracts a shape's fields/optional/readonly/index-signature data,
/// reimplemented locally since `assignability`'s equivalent helpers are
/// private to that module (spec §4.8 utility-type expansion needs it too).
fn object_shape(ty: &Type) -> Option<(BTreeMap<String, Type>, BTreeSet<String>, BTreeSet<String>, Option<Box<Type>>, Option<Box<Type>>)> {
    match ty {
        Type::Record(r) => Some((r.fields.clone(), r.optional_fields.clone(), r.readonly_fields.clone(), r.string_index.clone(), r.number_index.clone())),
        Type::Interface(i) => Some((i.members.clone(), i.optional_members.clone(), BTreeSet::new(), i.string_index.clone(), i.number_index.clone())),
        Type::Class(c) => Some((c.members.clone(), BTreeSet::new(), BTreeSet::new(), None, None)),
        _ => None,
    }
}

fn record_ty(
    fields: BTreeMap<String, Type>,
    optional_fields: BTreeSet<String>,
    readonly_fields: BTreeSet<String>,
    string_index: Option<Box<Type>>,
    number_index: Option<Box<Type>>,
) -> Type {
    Type::Record(Box::new(RecordType {
        fields,
        optional_fields,
        readonly_fields,
        string_index,
        number_index,
    }))
}

fn literal_keys(ty: &Type) -> Vec<String> {
    match ty {
        Type::StringLiteral(s) => vec![s.clone()],
        Type::Union(members) => members.iter().flat_map(literal_keys).collect(),
        _ => Vec::new(),
    }
}

fn union_members(ty: Type) -> Vec<Type> {
    match ty {
        Type::Union(members) => members,
        other => vec![other],
    }
}

fn params_tuple(params: &[ParamType]) -> Type {
    Type::Tuple(
        params
            .iter()
            .map(|p| TupleElementType {
                label: Some(p.name.clone()),
                ty: p.ty.clone(),
                optional: p.optional,
                rest: p.rest,
            })
            .collect(),
    )
}

fn unwrap_promise(ty: Type) -> Type {
    match ty {
        Type::Instance { class_name, mut type_args } if class_name == "Promise" => {
            unwrap_promise(type_args.pop().unwrap_or(Type::Any))
        }
        other => other,
    }
}

fn collect_infer_params(node: &TypeNode, out: &mut Vec<String>) {
    match node {
        TypeNode::Infer(name) => out.push(name.clone()),
        TypeNode::Union(members) | TypeNode::Intersection(members) => {
            for m in members {
                collect_infer_params(m, out);
            }
        }
        TypeNode::Array(inner) | TypeNode::KeyOf(inner) | TypeNode::Parenthesized(inner) => collect_infer_params(inner, out),
        TypeNode::Tuple(elements) => {
            for e in elements {
                collect_infer_params(&e.ty, out);
            }
        }
        TypeNode::Function(f) | TypeNode::Constructor(f) => {
            for p in &f.params {
                collect_infer_params(&p.ty, out);
            }
            collect_infer_params(&f.return_type, out);
        }
        TypeNode::IndexedAccess { object, index } => {
            collect_infer_params(object, out);
            collect_infer_params(index, out);
        }
        TypeNode::Reference { type_args, .. } => {
            for t in type_args {
                collect_infer_params(t, out);
            }
        }
        _ => {}
    }
}

trait Tap: Sized {
    fn tap(self, f: impl FnOnce(&Self)) -> Self {
        f(&self);
        self
    }
}
impl<T> Tap for T {}

/// Entry point: checks a whole parsed program and returns every diagnostic
/// raised along the way (spec §6 "a fully typed AST" / "a list of
/// diagnostics" on failure).
pub fn check_program(program: &Program) -> Vec<CheckerDiagnostic> {
    let mut checker = Checker::new();
    let env = Environment::new();
    let env = checker.hoist_block(&program.body, env);
    let mut env = env;
    for stmt in &program.body {
        env = checker.check_stmt(stmt, &env);
    }
    checker.diagnostics
}

/// Checks a program and hands back both the diagnostics and the checker, so
/// callers (tests, the LSP-shaped future host) can still query
/// `expression_type`.
pub fn check_program_with_checker(program: &Program) -> (Vec<CheckerDiagnostic>, Checker) {
    let mut checker = Checker::new();
    let env = Environment::new();
    let env = checker.hoist_block(&program.body, env);
    let mut env = env;
    for stmt in &program.body {
        env = checker.check_stmt(stmt, &env);
    }
    (checker.diagnostics.clone(), checker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parser::parse_program;
    use crate::compiler::scanner::scan;

    fn check_source(src: &str) -> Vec<CheckerDiagnostic> {
        let (tokens, _scan_errors) = scan(src);
        let (program, _parse_errors) = parse_program(tokens);
        check_program(&program)
    }

    #[test]
    fn literal_let_widens_to_primitive() {
        let diags = check_source("let x: number = 10;");
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn explicit_generic_argument_mismatch_is_reported() {
        let diags = check_source(
            r#"
            function id<T>(v: T): T { return v; }
            id<string>(42);
            "#,
        );
        assert!(diags.iter().any(|d| d.code == diagnostics::TYPE_NOT_ASSIGNABLE_2322.code));
    }

    #[test]
    fn discriminated_union_narrows_in_branch() {
        let diags = check_source(
            r#"
            type Shape = {kind: "c"; r: number} | {kind: "s"; side: number};
            function area(s: Shape): number {
                if (s.kind === "c") { return s.r * s.r; }
                return s.side * s.side;
            }
            "#,
        );
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn interface_merging_requires_every_member() {
        let diags = check_source(
            r#"
            interface A { x: number }
            interface A { y: string }
            const v: A = {x: 1, y: "q"};
            "#,
        );
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn missing_name_is_reported() {
        let diags = check_source("doesNotExist();");
        assert!(diags.iter().any(|d| d.code == diagnostics::CANNOT_FIND_NAME_2304.code));
    }
}
