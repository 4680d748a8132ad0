//! `IsCompatible(expected, actual)` — the central assignability relation
//! (spec §4.5), implemented as the precedence-ordered rule list in the spec
//! verbatim.
//!
//! Memoized by a structural key of the `(expected, actual)` pair within a
//! single `Checker` pass (spec §4.4/§9: "a reference-equality identity works
//! only if types are interned ... without it, use a structural hash"); the
//! memo table is owned by the caller (`Checker`) and handed in by reference
//! so it is scoped to one pass, never shared across passes (spec §5).

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use super::ast::node_flags::Variance;
use super::environment::Environment;
use super::types::{FunctionSignature, RecordType, Type};

pub type MemoTable = RefCell<HashMap<(String, String), bool>>;

pub fn new_memo_table() -> MemoTable {
    RefCell::new(HashMap::new())
}

fn type_key(ty: &Type) -> String {
    format!("{:?}", ty)
}

/// Re-expands one level of a recursive type-alias placeholder. The
/// `Checker` owns the alias body registry; this takes a lookup closure so
/// `assignability` does not need to know about declaration storage.
pub struct Context<'a> {
    pub env: &'a Environment,
    pub memo: &'a MemoTable,
    /// Resolves a `RecursiveTypeAlias { key }` placeholder to the type it
    /// stands for, one expansion step.
    pub expand_recursive_alias: &'a dyn Fn(&str) -> Option<Type>,
    /// Guards against infinite recursion through interdependent structural
    /// types (classes/interfaces referencing each other) that are not
    /// recursive-alias placeholders.
    pub visiting: &'a RefCell<HashSet<(String, String)>>,
}

pub fn is_compatible(expected: &Type, actual: &Type, ctx: &Context) -> bool {
    let key = (type_key(expected), type_key(actual));
    if let Some(&cached) = ctx.memo.borrow().get(&key) {
        return cached;
    }
    if !ctx.visiting.borrow_mut().insert(key.clone()) {
        // Already computing this exact pair further up the call stack:
        // assume compatible so mutually-recursive structural types
        // terminate (spec §4.4 recursive-alias guard, generalized).
        return true;
    }
    let result = is_compatible_uncached(expected, actual, ctx);
    ctx.visiting.borrow_mut().remove(&key);
    ctx.memo.borrow_mut().insert(key, result);
    result
}

fn is_compatible_uncached(expected: &Type, actual: &Type, ctx: &Context) -> bool {
    // Rule 1: `any` on either side.
    if matches!(expected, Type::Any) || matches!(actual, Type::Any) {
        return true;
    }

    // Rule 2: recursive-alias placeholder on either side expands one level.
    if let Type::RecursiveTypeAlias { key } = expected {
        return match (ctx.expand_recursive_alias)(key) {
            Some(expanded) => is_compatible(&expanded, actual, ctx),
            None => true,
        };
    }
    if let Type::RecursiveTypeAlias { key } = actual {
        return match (ctx.expand_recursive_alias)(key) {
            Some(expanded) => is_compatible(expected, &expanded, ctx),
            None => true,
        };
    }

    // Rule 3: never.
    if matches!(actual, Type::Never) {
        return true;
    }
    if matches!(expected, Type::Never) {
        return false;
    }

    // Rule 4: unknown.
    if matches!(expected, Type::Unknown) {
        return true;
    }
    if matches!(actual, Type::Unknown) {
        return matches!(expected, Type::Any | Type::Unknown);
    }

    // Rule 5: type predicates / assertion predicates as a return type.
    if let Type::TypePredicate { .. } = expected {
        return matches!(actual, Type::Boolean | Type::BooleanLiteral(_));
    }
    if let Type::AssertsPredicate { .. } = expected {
        return matches!(actual, Type::Void | Type::Never);
    }

    // Rule 6: type parameters compare by name, else fall back to constraint.
    if let (Type::TypeParameter(a), Type::TypeParameter(b)) = (expected, actual) {
        return a == b;
    }
    if let Type::TypeParameter(name) = expected {
        if let Some(constraint) = ctx.env.lookup_type(name).and_then(|s| s.resolved_type.clone()) {
            return is_compatible(&constraint, actual, ctx);
        }
        return false;
    }

    // Rule 7: null/undefined only assignable to themselves or a union
    // containing them (unions handled generically by rule 10 below; bare
    // primitive case here).
    if matches!(actual, Type::Null) && !matches!(expected, Type::Null) {
        if let Type::Union(members) = expected {
            return members.iter().any(|m| matches!(m, Type::Null));
        }
        return false;
    }
    if matches!(actual, Type::Undefined) && !matches!(expected, Type::Undefined) {
        if let Type::Union(members) = expected {
            return members.iter().any(|m| matches!(m, Type::Undefined));
        }
        return false;
    }

    // Rule 8: literal -> primitive widening is one-way.
    if is_literal_of(actual, expected) {
        return true;
    }

    // Rule 9: template-literal type expected, string-literal actual.
    if let (Type::TemplateLiteral { quasis, types }, Type::StringLiteral(s)) = (expected, actual) {
        return match_template_literal(quasis, types, s, ctx);
    }

    // Rule 10: unions.
    if let Type::Union(expected_members) = expected {
        return expected_members.iter().any(|m| is_compatible(m, actual, ctx));
    }
    if let Type::Union(actual_members) = actual {
        return actual_members.iter().all(|m| is_compatible(expected, m, ctx));
    }

    // Rule 11: intersections.
    if let Type::Intersection(expected_members) = expected {
        return expected_members.iter().all(|m| is_compatible(m, actual, ctx));
    }
    if let Type::Intersection(actual_members) = actual {
        return actual_members.iter().any(|m| is_compatible(expected, m, ctx));
    }

    // Rule 12: keyof / indexed-access / conditional / string-mapping —
    // evaluate one step and recur, unless blocked on an unsubstituted
    // parameter (then fall back to structural kind compatibility).
    if let Type::KeyOf(inner) = expected {
        if let Type::TypeParameter(_) = inner.as_ref() {
            return is_compatible(&keyof_fallback(), actual, ctx);
        }
        return is_compatible(&evaluate_keyof(inner), actual, ctx);
    }
    if let Type::KeyOf(inner) = actual {
        if let Type::TypeParameter(_) = inner.as_ref() {
            return is_compatible(expected, &keyof_fallback(), ctx);
        }
        return is_compatible(expected, &evaluate_keyof(inner), ctx);
    }
    if let Type::IndexedAccess { object, index } = expected {
        if let Some(evaluated) = evaluate_indexed_access(object, index) {
            return is_compatible(&evaluated, actual, ctx);
        }
        return true;
    }
    if let Type::IndexedAccess { object, index } = actual {
        if let Some(evaluated) = evaluate_indexed_access(object, index) {
            return is_compatible(expected, &evaluated, ctx);
        }
        return true;
    }
    if let Type::StringMapping { kind, inner } = expected {
        return is_compatible(&super::inference::apply_string_mapping(*kind, inner), actual, ctx);
    }
    if let Type::StringMapping { kind, inner } = actual {
        return is_compatible(expected, &super::inference::apply_string_mapping(*kind, inner), ctx);
    }

    // Rule 13: enums.
    if let (Type::Enum(e1), Type::Enum(e2)) = (expected, actual) {
        return e1.name == e2.name;
    }
    if let Type::Enum(e) = expected {
        return match actual {
            Type::Number | Type::NumberLiteral(_) => e.members.iter().all(|(_, v)| matches!(v, super::types::EnumMemberValue::Number(_))),
            Type::String | Type::StringLiteral(_) => e.members.iter().all(|(_, v)| matches!(v, super::types::EnumMemberValue::String(_))),
            _ => false,
        };
    }

    // Rule 14: classes / instances — nominal via inheritance chain.
    if let (Type::Instance { class_name: en, type_args: eargs }, Type::Instance { class_name: an, type_args: aargs }) = (expected, actual) {
        if !class_chain_includes(ctx.env, an, en) {
            return false;
        }
        return eargs
            .iter()
            .zip(aargs.iter())
            .enumerate()
            .all(|(i, (e, a))| {
                let variance = class_type_param_variance(ctx.env, en, i);
                check_variance(variance, e, a, ctx)
            });
    }

    // Rule 15: interfaces — structural.
    if let Type::Interface(iface) = expected {
        return structural_match(
            &iface.members,
            &iface.optional_members,
            iface.string_index.as_deref(),
            iface.number_index.as_deref(),
            actual,
            ctx,
        ) && call_signatures_satisfied(&iface.call_signatures, actual, ctx)
            && construct_signatures_satisfied(&iface.construct_signatures, actual, ctx);
    }

    // Rule 16: records — structural, with index-signature fallback.
    if let Type::Record(record) = expected {
        return structural_match(
            &record.fields,
            &record.optional_fields,
            record.string_index.as_deref(),
            record.number_index.as_deref(),
            actual,
            ctx,
        );
    }

    // Rule 17: tuples.
    if let (Type::Tuple(expected_els), Type::Tuple(actual_els)) = (expected, actual) {
        return tuple_compatible(expected_els, actual_els, ctx);
    }
    if let Type::Tuple(expected_els) = expected {
        if let Type::Array(actual_el) = actual {
            return expected_els.iter().all(|e| is_compatible(&e.ty, actual_el, ctx));
        }
    }
    if let Type::Array(expected_el) = expected {
        if let Type::Array(actual_el) = actual {
            return is_compatible(expected_el, actual_el, ctx);
        }
        if let Type::Tuple(actual_els) = actual {
            return actual_els.iter().all(|a| is_compatible(expected_el, &a.ty, ctx));
        }
    }

    // Rule 18: functions.
    if let (Type::Function(e), Type::Function(a)) = (expected, actual) {
        return function_compatible(e, a, ctx);
    }
    if let Type::Overloaded(expected_sigs) = expected {
        // A caller satisfying every expected signature: actual must be
        // compatible treated as a function against each one.
        return expected_sigs
            .iter()
            .all(|sig| is_compatible(&Type::Function(std::rc::Rc::new(sig.clone())), actual, ctx));
    }
    if let Type::Overloaded(actual_sigs) = actual {
        if let Type::Function(expected_sig) = expected {
            return actual_sigs
                .iter()
                .any(|sig| function_compatible(expected_sig, sig, ctx));
        }
    }

    // Primitive/literal/void/other leaf equality fallback.
    structurally_equal_leaf(expected, actual)
}

fn is_literal_of(actual: &Type, expected: &Type) -> bool {
    matches!(
        (expected, actual),
        (Type::String, Type::StringLiteral(_))
            | (Type::Number, Type::NumberLiteral(_))
            | (Type::Boolean, Type::BooleanLiteral(_))
            | (Type::BigInt, Type::BigIntLiteral(_))
    )
}

fn structurally_equal_leaf(expected: &Type, actual: &Type) -> bool {
    expected == actual
}

fn keyof_fallback() -> Type {
    super::substitution::union_of(vec![Type::String, Type::Number])
}

fn evaluate_keyof(inner: &Type) -> Type {
    match inner {
        Type::Record(r) => {
            let mut keys: Vec<Type> = r.fields.keys().map(|k| Type::StringLiteral(k.clone())).collect();
            if r.string_index.is_some() {
                keys.push(Type::String);
            }
            if r.number_index.is_some() {
                keys.push(Type::Number);
            }
            super::substitution::union_of(keys)
        }
        Type::Interface(iface) => {
            let keys: Vec<Type> = iface
                .members
                .keys()
                .map(|k| Type::StringLiteral(k.clone()))
                .collect();
            super::substitution::union_of(keys)
        }
        Type::Class(class) => {
            let keys: Vec<Type> = class
                .members
                .keys()
                .map(|k| Type::StringLiteral(k.clone()))
                .collect();
            super::substitution::union_of(keys)
        }
        Type::Array(_) | Type::Tuple(_) => super::substitution::union_of(vec![Type::Number]),
        _ => keyof_fallback(),
    }
}

fn evaluate_indexed_access(object: &Type, index: &Type) -> Option<Type> {
    match (object, index) {
        (Type::Record(r), Type::StringLiteral(key)) => r.fields.get(key).cloned(),
        (Type::Interface(iface), Type::StringLiteral(key)) => iface.members.get(key).cloned(),
        (Type::Class(class), Type::StringLiteral(key)) => class.members.get(key).cloned(),
        (Type::Array(el), Type::Number) => Some((**el).clone()),
        (Type::Tuple(els), Type::Number) => {
            Some(super::substitution::union_of(els.iter().map(|e| e.ty.clone()).collect()))
        }
        _ => None,
    }
}

fn match_template_literal(quasis: &[String], types: &[Type], s: &str, ctx: &Context) -> bool {
    // quasis.len() == types.len() + 1: static segments anchor the match.
    fn go(quasis: &[String], types: &[Type], rest: &str, ctx: &Context) -> bool {
        if types.is_empty() {
            return rest == quasis[0];
        }
        let prefix = &quasis[0];
        let Some(after_prefix) = rest.strip_prefix(prefix.as_str()) else {
            return false;
        };
        // Try every possible split point for this hole, preferring the
        // longest static anchor first is unnecessary for the closed
        // placeholder types we support.
        let placeholder = &types[0];
        for split in 0..=after_prefix.len() {
            if !after_prefix.is_char_boundary(split) {
                continue;
            }
            let (candidate, remainder) = after_prefix.split_at(split);
            if placeholder_matches(placeholder, candidate, ctx) && go(&quasis[1..], &types[1..], remainder, ctx) {
                return true;
            }
        }
        false
    }
    go(quasis, types, s, ctx)
}

fn placeholder_matches(placeholder: &Type, candidate: &str, ctx: &Context) -> bool {
    match placeholder {
        Type::String => true,
        Type::Number => candidate.parse::<f64>().is_ok(),
        Type::Boolean => candidate == "true" || candidate == "false",
        Type::StringLiteral(s) => s == candidate,
        Type::NumberLiteral(bits) => candidate
            .parse::<f64>()
            .is_ok_and(|v| v == Type::number_literal_value(*bits)),
        Type::BooleanLiteral(b) => candidate == if *b { "true" } else { "false" },
        Type::Union(members) => members.iter().any(|m| placeholder_matches(m, candidate, ctx)),
        _ => is_compatible(placeholder, &Type::StringLiteral(candidate.to_string()), ctx),
    }
}

fn structural_match(
    expected_fields: &std::collections::BTreeMap<String, Type>,
    optional: &std::collections::BTreeSet<String>,
    string_index: Option<&Type>,
    number_index: Option<&Type>,
    actual: &Type,
    ctx: &Context,
) -> bool {
    let actual_fields = actual_member_map(actual, ctx);
    for (name, expected_ty) in expected_fields {
        match actual_fields.get(name) {
            Some(actual_ty) => {
                if !is_compatible(expected_ty, actual_ty, ctx) {
                    return false;
                }
            }
            None => {
                if optional.contains(name) {
                    continue;
                }
                // `actual` has no field literally named `name`; it can still
                // satisfy the requirement through its own index signature
                // (e.g. `const d: D = someRecordWithStringIndex`), never
                // through `expected`'s.
                match actual_index_signature(actual, name) {
                    Some(actual_idx_ty) => {
                        if !is_compatible(expected_ty, &actual_idx_ty, ctx) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
        }
    }
    // Rule 16: expected's own index signature is a fallback value type for
    // keys `actual` supplies beyond expected's declared member set.
    if string_index.is_some() || number_index.is_some() {
        for (name, actual_ty) in &actual_fields {
            if expected_fields.contains_key(name) {
                continue;
            }
            let idx = if name.parse::<f64>().is_ok() {
                number_index.or(string_index)
            } else {
                string_index
            };
            if let Some(idx_ty) = idx {
                if !is_compatible(idx_ty, actual_ty, ctx) {
                    return false;
                }
            }
        }
    }
    true
}

/// An index signature on `actual` itself that would supply a value for
/// `key`, if any — used only to decide whether a field missing from
/// `actual`'s explicit members is nonetheless genuinely present.
fn actual_index_signature(actual: &Type, key: &str) -> Option<Type> {
    let numeric = key.parse::<f64>().is_ok();
    match actual {
        Type::Record(r) => {
            if numeric {
                r.number_index.as_deref().or(r.string_index.as_deref()).cloned()
            } else {
                r.string_index.as_deref().cloned()
            }
        }
        Type::Interface(i) => {
            if numeric {
                i.number_index.as_deref().or(i.string_index.as_deref()).cloned()
            } else {
                i.string_index.as_deref().cloned()
            }
        }
        _ => None,
    }
}

/// Produces the flattened member-type map a structural check reads from,
/// regardless of whether `actual` is a record, interface, class instance,
/// or another object-shaped type (post-merging/post-inheritance, spec §6
/// "any interface/class's full member set").
fn actual_member_map(actual: &Type, ctx: &Context) -> std::collections::BTreeMap<String, Type> {
    match actual {
        Type::Record(r) => r.fields.clone(),
        Type::Interface(i) => i.members.clone(),
        Type::Class(c) => c.members.clone(),
        Type::Instance { class_name, .. } => class_member_map(ctx.env, class_name),
        _ => Default::default(),
    }
}

/// A class's own members plus its superclass chain's, innermost-declared
/// member winning on a name collision — the "post-inheritance flattening"
/// spec §6 names, following the same chain `class_chain_includes` walks for
/// rule 14.
fn class_member_map(env: &Environment, class_name: &str) -> std::collections::BTreeMap<String, Type> {
    let Some(sym) = env.lookup_type(class_name) else {
        return Default::default();
    };
    let Some(Type::Class(class)) = &sym.resolved_type else {
        return Default::default();
    };
    let mut members = class.members.clone();
    if let Some(sup) = &class.superclass {
        if let Type::Instance { class_name: sup_name, .. } = sup.as_ref() {
            for (k, v) in class_member_map(env, sup_name) {
                members.entry(k).or_insert(v);
            }
        }
    }
    members
}

fn call_signatures_satisfied(sigs: &[FunctionSignature], actual: &Type, ctx: &Context) -> bool {
    if sigs.is_empty() {
        return true;
    }
    sigs.iter().all(|expected_sig| match actual {
        Type::Function(a) => function_compatible(expected_sig, a, ctx),
        Type::Overloaded(a_sigs) => a_sigs.iter().any(|a| function_compatible(expected_sig, a, ctx)),
        _ => false,
    })
}

fn construct_signatures_satisfied(sigs: &[FunctionSignature], actual: &Type, ctx: &Context) -> bool {
    if sigs.is_empty() {
        return true;
    }
    match actual {
        Type::Class(_) => true,
        _ => call_signatures_satisfied(sigs, actual, ctx),
    }
}

fn tuple_compatible(
    expected: &[super::types::TupleElementType],
    actual: &[super::types::TupleElementType],
    ctx: &Context,
) -> bool {
    let e_spread = expected.iter().position(|e| e.rest);
    let a_spread = actual.iter().position(|e| e.rest);

    match (e_spread, a_spread) {
        (None, None) => {
            let min_arity = expected.iter().filter(|e| !e.optional).count();
            if actual.len() < min_arity {
                return false;
            }
            if actual.len() > expected.len() {
                return false;
            }
            expected
                .iter()
                .zip(actual.iter())
                .all(|(e, a)| is_compatible(&e.ty, &a.ty, ctx) || (e.optional && false))
        }
        _ => {
            // Variadic tuples: match leading and trailing fixed segments
            // around the spread, which absorbs the middle (spec §4.5 rule 17).
            let e_idx = e_spread.unwrap_or(expected.len());
            let e_lead = &expected[..e_idx.min(expected.len())];
            let e_trail = if e_spread.is_some() {
                &expected[e_idx + 1..]
            } else {
                &[]
            };
            if actual.len() < e_lead.len() + e_trail.len() {
                return false;
            }
            for (i, e) in e_lead.iter().enumerate() {
                if !is_compatible(&e.ty, &actual[i].ty, ctx) {
                    return false;
                }
            }
            let trail_start = actual.len() - e_trail.len();
            for (i, e) in e_trail.iter().enumerate() {
                if !is_compatible(&e.ty, &actual[trail_start + i].ty, ctx) {
                    return false;
                }
            }
            true
        }
    }
}

fn function_compatible(expected: &FunctionSignature, actual: &FunctionSignature, ctx: &Context) -> bool {
    // Parameter contravariance: actual may require fewer parameters than
    // expected supplies (minimum-arity rule), and each actual parameter
    // must accept what expected would pass to it.
    let actual_required = actual.params.iter().filter(|p| !p.optional && !p.rest).count();
    if expected.params.len() < actual_required {
        return false;
    }
    for (i, a_param) in actual.params.iter().enumerate() {
        if a_param.rest {
            let remaining = &expected.params[i.min(expected.params.len())..];
            if !remaining.iter().all(|e| is_compatible(&a_param.ty, &e.ty, ctx)) {
                return false;
            }
            break;
        }
        let Some(e_param) = expected.params.get(i) else {
            continue;
        };
        if e_param.rest {
            if !is_compatible(&a_param.ty, element_type_of_rest(&e_param.ty), ctx) {
                return false;
            }
            continue;
        }
        if !is_compatible(&a_param.ty, &e_param.ty, ctx) {
            return false;
        }
    }
    if !is_compatible(&actual.return_type, &expected.return_type, ctx) {
        return false;
    }
    match (&expected.this_type, &actual.this_type) {
        (Some(e), Some(a)) => is_compatible(a, e, ctx),
        _ => true,
    }
}

fn element_type_of_rest(ty: &Type) -> &Type {
    match ty {
        Type::Array(el) => el,
        other => other,
    }
}

fn class_chain_includes(env: &Environment, actual_name: &str, expected_name: &str) -> bool {
    if actual_name == expected_name {
        return true;
    }
    let Some(sym) = env.lookup_type(actual_name) else {
        return false;
    };
    match &sym.resolved_type {
        Some(Type::Class(class)) => match &class.superclass {
            Some(sup) => match sup.as_ref() {
                Type::Instance { class_name, .. } => class_chain_includes(env, class_name, expected_name),
                _ => false,
            },
            None => class.implements.iter().any(|i| match i {
                Type::Instance { class_name, .. } => class_chain_includes(env, class_name, expected_name),
                _ => false,
            }),
        },
        _ => false,
    }
}

fn class_type_param_variance(env: &Environment, class_name: &str, index: usize) -> Variance {
    env.lookup_type(class_name)
        .and_then(|sym| match &sym.resolved_type {
            Some(Type::Class(class)) => class.type_params.get(index).map(|p| p.variance),
            _ => None,
        })
        .unwrap_or(Variance::Invariant)
}

fn check_variance(variance: Variance, expected_arg: &Type, actual_arg: &Type, ctx: &Context) -> bool {
    match variance {
        Variance::Out => is_compatible(expected_arg, actual_arg, ctx),
        Variance::In => is_compatible(actual_arg, expected_arg, ctx),
        Variance::InOut => {
            is_compatible(expected_arg, actual_arg, ctx) || is_compatible(actual_arg, expected_arg, ctx)
        }
        Variance::Invariant => {
            is_compatible(expected_arg, actual_arg, ctx) && is_compatible(actual_arg, expected_arg, ctx)
        }
    }
}

/// Excess-property check for a fresh object literal against a record or
/// interface with no index signature (spec §4.5 "Excess property check").
pub fn excess_property_check(expected: &Type, actual_fresh_fields: &[String]) -> Option<String> {
    let (known, has_index): (Vec<&String>, bool) = match expected {
        Type::Record(r) => (r.fields.keys().collect(), r.string_index.is_some() || r.number_index.is_some()),
        Type::Interface(i) => (i.members.keys().collect(), i.string_index.is_some() || i.number_index.is_some()),
        Type::Class(c) => (c.members.keys().collect(), false),
        _ => return None,
    };
    if has_index {
        return None;
    }
    actual_fresh_fields
        .iter()
        .find(|name| !known.iter().any(|k| *k == *name))
        .cloned()
}

pub fn record_from_fields(fields: impl IntoIterator<Item = (String, Type)>) -> Type {
    let mut record = RecordType::empty();
    for (k, v) in fields {
        record.fields.insert(k, v);
    }
    Type::Record(Box::new(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(
        env: &'a Environment,
        memo: &'a MemoTable,
        visiting: &'a RefCell<HashSet<(String, String)>>,
    ) -> Context<'a> {
        Context {
            env,
            memo,
            expand_recursive_alias: &|_| None,
            visiting,
        }
    }

    #[test]
    fn any_absorbs_everything() {
        let env = Environment::new();
        let memo = new_memo_table();
        let visiting = RefCell::new(HashSet::new());
        let c = ctx(&env, &memo, &visiting);
        assert!(is_compatible(&Type::Any, &Type::String, &c));
        assert!(is_compatible(&Type::String, &Type::Any, &c));
    }

    #[test]
    fn never_is_bottom() {
        let env = Environment::new();
        let memo = new_memo_table();
        let visiting = RefCell::new(HashSet::new());
        let c = ctx(&env, &memo, &visiting);
        assert!(is_compatible(&Type::String, &Type::Never, &c));
        assert!(!is_compatible(&Type::Never, &Type::String, &c));
        assert!(is_compatible(&Type::Never, &Type::Never, &c));
    }

    #[test]
    fn literal_widens_one_way() {
        let env = Environment::new();
        let memo = new_memo_table();
        let visiting = RefCell::new(HashSet::new());
        let c = ctx(&env, &memo, &visiting);
        assert!(is_compatible(&Type::String, &Type::StringLiteral("x".into()), &c));
        assert!(!is_compatible(&Type::StringLiteral("x".into()), &Type::String, &c));
    }

    #[test]
    fn union_expected_any_alternative() {
        let env = Environment::new();
        let memo = new_memo_table();
        let visiting = RefCell::new(HashSet::new());
        let c = ctx(&env, &memo, &visiting);
        let u = Type::Union(vec![Type::String, Type::Number]);
        assert!(is_compatible(&u, &Type::Number, &c));
        assert!(!is_compatible(&u, &Type::Boolean, &c));
    }

    #[test]
    fn tuple_variadic_matches_leading_and_trailing() {
        let env = Environment::new();
        let memo = new_memo_table();
        let visiting = RefCell::new(HashSet::new());
        let c = ctx(&env, &memo, &visiting);
        let expected = vec![
            super::super::types::TupleElementType { label: None, ty: Type::String, optional: false, rest: false },
            super::super::types::TupleElementType { label: None, ty: Type::Array(Box::new(Type::Number)), optional: false, rest: true },
            super::super::types::TupleElementType { label: None, ty: Type::Boolean, optional: false, rest: false },
        ];
        let actual = vec![
            super::super::types::TupleElementType { label: None, ty: Type::String, optional: false, rest: false },
            super::super::types::TupleElementType { label: None, ty: Type::Number, optional: false, rest: false },
            super::super::types::TupleElementType { label: None, ty: Type::Number, optional: false, rest: false },
            super::super::types::TupleElementType { label: None, ty: Type::Boolean, optional: false, rest: false },
        ];
        assert!(tuple_compatible(&expected, &actual, &c));
    }
}
