//! Control-flow narrowing (spec §4.7): recognizing guard expressions and
//! computing the then/else narrowed types for the name they discriminate.
//!
//! This module is deliberately expression-shape-only: it does not touch the
//! `Environment`. The checker calls `narrow_condition` while checking an
//! `if`/ternary/logical expression, then pushes the returned narrowed type
//! as a shadowing child-scope binding (spec §4.7 "the checker maintains the
//! environment immutably per branch").

use super::ast::node::{BinaryOp, Expr, ExprKind, LiteralValue, UnaryOp};
use super::substitution::union_of;
use super::types::Type;

/// A narrowing outcome for a single discriminated name: the type it has in
/// the "then" arm and the type it has in the "else" arm.
#[derive(Debug, Clone)]
pub struct Narrowing {
    pub name: String,
    pub then_type: Type,
    pub else_type: Type,
}

/// Looks up a name's declared/current type; supplied by the checker since
/// narrowing needs it to compute set differences against `typeof`/`instanceof`
/// guards.
pub type TypeOf<'a> = dyn Fn(&str) -> Option<Type> + 'a;

/// Attempts to recognize `expr` as one of the guard forms in spec §4.7,
/// returning the narrowing it implies. Returns `None` for conditions with no
/// recognized narrowing shape (the checker just checks both branches against
/// the ambient type unchanged).
pub fn narrow_condition(expr: &Expr, type_of: &TypeOf) -> Option<Narrowing> {
    match &expr.kind {
        ExprKind::Binary { op, left, right } => narrow_binary(*op, left, right, type_of),
        ExprKind::Unary {
            op: UnaryOp::Not,
            expr: inner,
        } => narrow_condition(inner, type_of).map(|n| Narrowing {
            name: n.name,
            then_type: n.else_type,
            else_type: n.then_type,
        }),
        ExprKind::Call { callee, args, .. } => narrow_call(callee, args, type_of),
        _ => None,
    }
}

fn ident_name(expr: &Expr) -> Option<&str> {
    match &expr.kind {
        ExprKind::Ident(name) => Some(name),
        _ => None,
    }
}

fn narrow_binary(op: BinaryOp, left: &Expr, right: &Expr, type_of: &TypeOf) -> Option<Narrowing> {
    use BinaryOp::*;
    match op {
        InstanceOf => {
            let name = ident_name(left)?;
            let class_name = ident_name(right)?;
            let ambient = type_of(name)?;
            let instance_ty = Type::Instance {
                class_name: class_name.to_string(),
                type_args: Vec::new(),
            };
            Some(Narrowing {
                name: name.to_string(),
                then_type: instance_ty,
                else_type: ambient,
            })
        }
        In => {
            let key = string_literal(left)?;
            let name = ident_name(right)?;
            let ambient = type_of(name)?;
            Some(Narrowing {
                name: name.to_string(),
                then_type: narrow_by_property_presence(&ambient, &key, true),
                else_type: narrow_by_property_presence(&ambient, &key, false),
            })
        }
        Eq | NotEq | StrictEq | StrictNotEq => narrow_equality(op, left, right, type_of),
        _ => None,
    }
}

fn narrow_equality(op: BinaryOp, left: &Expr, right: &Expr, type_of: &TypeOf) -> Option<Narrowing> {
    use BinaryOp::*;
    let is_positive = matches!(op, Eq | StrictEq);

    // `typeof x === "kind"`, accepting the mirror operand order.
    if let Some((name, kind)) = typeof_comparison(left, right).or_else(|| typeof_comparison(right, left)) {
        let ambient = type_of(&name)?;
        let (then_ty, else_ty) = narrow_by_typeof(&ambient, &kind);
        return Some(if is_positive {
            Narrowing { name, then_type: then_ty, else_type: else_ty }
        } else {
            Narrowing { name, then_type: else_ty, else_type: then_ty }
        });
    }

    // `x === null` / `x === undefined`, either operand order.
    if let Some(name) = nullish_comparison(left, right, is_null).or_else(|| nullish_comparison(right, left, is_null)) {
        let ambient = type_of(&name)?;
        let (then_ty, else_ty) = narrow_nullish(&ambient, true);
        return Some(if is_positive {
            Narrowing { name, then_type: then_ty, else_type: else_ty }
        } else {
            Narrowing { name, then_type: else_ty, else_type: then_ty }
        });
    }
    if let Some(name) =
        nullish_comparison(left, right, is_undefined).or_else(|| nullish_comparison(right, left, is_undefined))
    {
        let ambient = type_of(&name)?;
        let (then_ty, else_ty) = narrow_nullish(&ambient, false);
        return Some(if is_positive {
            Narrowing { name, then_type: then_ty, else_type: else_ty }
        } else {
            Narrowing { name, then_type: else_ty, else_type: then_ty }
        });
    }

    // `x.tag === "lit"` discriminated-union narrowing, either operand order.
    if let Some((name, key, lit)) =
        member_literal_comparison(left, right).or_else(|| member_literal_comparison(right, left))
    {
        let ambient = type_of(&name)?;
        let (then_ty, else_ty) = narrow_discriminated_union(&ambient, &key, &lit);
        return Some(if is_positive {
            Narrowing { name, then_type: then_ty, else_type: else_ty }
        } else {
            Narrowing { name, then_type: else_ty, else_type: then_ty }
        });
    }

    None
}

fn is_null(v: &LiteralValue) -> bool {
    matches!(v, LiteralValue::Null)
}
fn is_undefined(v: &LiteralValue) -> bool {
    matches!(v, LiteralValue::Undefined)
}

fn nullish_comparison(name_side: &Expr, lit_side: &Expr, matches_lit: fn(&LiteralValue) -> bool) -> Option<String> {
    let name = ident_name(name_side)?.to_string();
    if let ExprKind::Literal(lit) = &lit_side.kind {
        if matches_lit(lit) {
            return Some(name);
        }
    }
    None
}

fn typeof_comparison(typeof_side: &Expr, string_side: &Expr) -> Option<(String, String)> {
    let ExprKind::Unary { op: UnaryOp::TypeOf, expr } = &typeof_side.kind else {
        return None;
    };
    let name = ident_name(expr)?.to_string();
    let kind = string_literal(string_side)?;
    Some((name, kind))
}

fn string_literal(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Literal(LiteralValue::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn member_literal_comparison(member_side: &Expr, lit_side: &Expr) -> Option<(String, String, Type)> {
    let ExprKind::Member { object, prop, .. } = &member_side.kind else {
        return None;
    };
    let name = ident_name(object)?.to_string();
    let super::ast::node::MemberProp::Name(key) = prop else {
        return None;
    };
    let lit_ty = literal_expr_type(lit_side)?;
    Some((name, key.clone(), lit_ty))
}

fn literal_expr_type(expr: &Expr) -> Option<Type> {
    match &expr.kind {
        ExprKind::Literal(LiteralValue::String(s)) => Some(Type::StringLiteral(s.clone())),
        ExprKind::Literal(LiteralValue::Number(n)) => Some(Type::number_literal(*n)),
        ExprKind::Literal(LiteralValue::Boolean(b)) => Some(Type::BooleanLiteral(*b)),
        _ => None,
    }
}

fn narrow_call(callee: &Expr, args: &[super::ast::node::ArrayElement], type_of: &TypeOf) -> Option<Narrowing> {
    let arg = args.first()?;
    let super::ast::node::ArrayElement::Item(arg_expr) = arg else {
        return None;
    };
    let name = ident_name(arg_expr)?.to_string();
    let ambient = type_of(&name)?;

    // `Array.isArray(x)`.
    if is_array_is_array(callee) {
        let then_ty = narrow_to_array_like(&ambient, true);
        let else_ty = narrow_to_array_like(&ambient, false);
        return Some(Narrowing { name, then_type: then_ty, else_type: else_ty });
    }

    None
}

fn is_array_is_array(callee: &Expr) -> bool {
    if let ExprKind::Member { object, prop, .. } = &callee.kind {
        if let (ExprKind::Ident(obj), super::ast::node::MemberProp::Name(p)) = (&object.kind, prop) {
            return obj == "Array" && p == "isArray";
        }
    }
    false
}

fn narrow_to_array_like(ambient: &Type, keep_array: bool) -> Type {
    match ambient {
        Type::Union(members) => {
            let filtered: Vec<Type> = members
                .iter()
                .filter(|m| matches!(m, Type::Array(_) | Type::Tuple(_)) == keep_array)
                .cloned()
                .collect();
            union_of(filtered)
        }
        Type::Array(_) | Type::Tuple(_) if keep_array => ambient.clone(),
        _ if keep_array => Type::Never,
        other => other.clone(),
    }
}

/// `typeof x === "kind"`: keep members whose runtime kind matches, exclude
/// them for the else branch.
fn narrow_by_typeof(ambient: &Type, kind: &str) -> (Type, Type) {
    match ambient {
        Type::Union(members) => {
            let (matching, rest): (Vec<Type>, Vec<Type>) = members
                .iter()
                .cloned()
                .partition(|m| m.typeof_kind() == Some(kind));
            (union_of(matching), union_of(rest))
        }
        single => {
            if single.typeof_kind() == Some(kind) {
                (single.clone(), Type::Never)
            } else {
                (Type::Never, single.clone())
            }
        }
    }
}

fn narrow_nullish(ambient: &Type, is_null: bool) -> (Type, Type) {
    let is_target = |t: &Type| if is_null { matches!(t, Type::Null) } else { matches!(t, Type::Undefined) };
    match ambient {
        Type::Union(members) => {
            let (matching, rest): (Vec<Type>, Vec<Type>) = members.iter().cloned().partition(is_target);
            (union_of(matching), union_of(rest))
        }
        single => {
            if is_target(single) {
                (single.clone(), Type::Never)
            } else {
                (Type::Never, single.clone())
            }
        }
    }
}

/// `"k" in x`: keep union members that structurally have property `k`.
fn narrow_by_property_presence(ambient: &Type, key: &str, keep_has_property: bool) -> Type {
    let has_property = |t: &Type| match t {
        Type::Record(r) => r.fields.contains_key(key),
        Type::Interface(i) => i.members.contains_key(key),
        Type::Class(c) => c.members.contains_key(key),
        _ => false,
    };
    match ambient {
        Type::Union(members) => {
            let filtered: Vec<Type> = members.iter().filter(|m| has_property(m) == keep_has_property).cloned().collect();
            union_of(filtered)
        }
        single if has_property(single) == keep_has_property => single.clone(),
        _ if keep_has_property => Type::Never,
        other => other.clone(),
    }
}

/// `x.tag === "lit"` against a discriminated union: keep members whose
/// `tag` literal matches `lit`.
fn narrow_discriminated_union(ambient: &Type, key: &str, lit: &Type) -> (Type, Type) {
    let matches_lit = |member: &Type| -> bool {
        let field = match member {
            Type::Record(r) => r.fields.get(key),
            Type::Interface(i) => i.members.get(key),
            Type::Class(c) => c.members.get(key),
            _ => None,
        };
        field == Some(lit)
    };
    match ambient {
        Type::Union(members) => {
            let (matching, rest): (Vec<Type>, Vec<Type>) = members.iter().cloned().partition(matches_lit);
            (union_of(matching), union_of(rest))
        }
        single if matches_lit(single) => (single.clone(), Type::Never),
        single => (Type::Never, single.clone()),
    }
}

/// User-defined type guard `f(x)` where `f: (v: T) => v is U` / `asserts v
/// is U`: the checker supplies the predicate's target type directly (it
/// already resolved `f`'s signature), this just builds the narrowing.
pub fn narrow_by_type_predicate(ambient: &Type, target: &Type) -> Narrowing {
    Narrowing {
        name: String::new(),
        then_type: target.clone(),
        else_type: subtract(ambient, target),
    }
}

/// Set-difference used for the else-branch of a type-predicate guard and
/// for exhaustiveness checking: removes every union member assignable to
/// `excluded`.
pub fn subtract(ambient: &Type, excluded: &Type) -> Type {
    match ambient {
        Type::Union(members) => union_of(members.iter().filter(|m| *m != excluded).cloned().collect()),
        single if single == excluded => Type::Never,
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::ast::node::Span;

    fn ident(name: &str) -> Expr {
        Expr { span: Span::new(0, 0, 1), kind: ExprKind::Ident(name.to_string()) }
    }

    fn typeof_expr(name: &str) -> Expr {
        Expr { span: Span::new(0, 0, 1), kind: ExprKind::Unary { op: UnaryOp::TypeOf, expr: Box::new(ident(name)) } }
    }

    fn str_lit(s: &str) -> Expr {
        Expr { span: Span::new(0, 0, 1), kind: ExprKind::Literal(LiteralValue::String(s.to_string())) }
    }

    #[test]
    fn narrows_typeof_string_guard() {
        let cond = Expr {
            span: Span::new(0, 0, 1),
            kind: ExprKind::Binary {
                op: BinaryOp::StrictEq,
                left: Box::new(typeof_expr("x")),
                right: Box::new(str_lit("string")),
            },
        };
        let ambient = Type::Union(vec![Type::String, Type::Number]);
        let type_of = move |n: &str| if n == "x" { Some(ambient.clone()) } else { None };
        let narrowing = narrow_condition(&cond, &type_of).expect("recognized guard");
        assert_eq!(narrowing.name, "x");
        assert_eq!(narrowing.then_type, Type::String);
        assert_eq!(narrowing.else_type, Type::Number);
    }

    #[test]
    fn discriminated_union_narrows_on_tag() {
        let member_c = super::super::assignability::record_from_fields([
            ("kind".to_string(), Type::StringLiteral("c".to_string())),
            ("r".to_string(), Type::Number),
        ]);
        let member_s = super::super::assignability::record_from_fields([
            ("kind".to_string(), Type::StringLiteral("s".to_string())),
            ("side".to_string(), Type::Number),
        ]);
        let ambient = Type::Union(vec![member_c.clone(), member_s.clone()]);
        let (then_ty, else_ty) = narrow_discriminated_union(&ambient, "kind", &Type::StringLiteral("c".to_string()));
        assert_eq!(then_ty, member_c);
        assert_eq!(else_ty, member_s);
    }
}
