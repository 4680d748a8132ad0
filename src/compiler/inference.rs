//! Inference & contextual typing (spec §4.6) and the intrinsic string-type
//! evaluators used by both the checker's utility-type expansion (spec §4.8)
//! and assignability's template-literal matching (spec §4.5 rule 9/12).

use std::collections::HashMap;

use super::substitution::union_of;
use super::types::{StringMappingKind, Type};

/// One inferred candidate for a type parameter, collected from an argument
/// position during call-site inference (spec §4.6).
#[derive(Debug, Clone)]
pub struct InferenceCandidates {
    candidates: HashMap<String, Vec<Type>>,
}

impl Default for InferenceCandidates {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceCandidates {
    pub fn new() -> Self {
        InferenceCandidates {
            candidates: HashMap::new(),
        }
    }

    pub fn add(&mut self, param: &str, candidate: Type) {
        self.candidates.entry(param.to_string()).or_default().push(candidate);
    }

    /// Merges every type parameter's candidate set into its common
    /// supertype (union if incompatible, per spec §4.6).
    pub fn resolve(self, type_params: &[String]) -> HashMap<String, Type> {
        let mut out = HashMap::new();
        for name in type_params {
            let ty = match self.candidates.get(name) {
                Some(candidates) if !candidates.is_empty() => union_of(candidates.clone()),
                _ => Type::Unknown,
            };
            out.insert(name.clone(), ty);
        }
        out
    }
}

/// Runs bidirectional unification: walks `expected_shape` (the declared
/// parameter type, which may mention type parameters) against `actual` (the
/// argument's type), recording a candidate for every type parameter
/// position encountered (spec §4.6, §4.8 `infer` unification).
pub fn unify(expected_shape: &Type, actual: &Type, type_params: &[String], out: &mut InferenceCandidates) {
    match (expected_shape, actual) {
        (Type::TypeParameter(name), _) if type_params.iter().any(|p| p == name) => {
            out.add(name, actual.clone());
        }
        (Type::Array(e), Type::Array(a)) => unify(e, a, type_params, out),
        (Type::Array(e), Type::Tuple(els)) => {
            for el in els {
                unify(e, &el.ty, type_params, out);
            }
        }
        (Type::Tuple(e_els), Type::Tuple(a_els)) => {
            for (e, a) in e_els.iter().zip(a_els.iter()) {
                unify(&e.ty, &a.ty, type_params, out);
            }
        }
        (Type::Union(e_members), _) => {
            for e in e_members {
                unify(e, actual, type_params, out);
            }
        }
        (Type::Function(e), Type::Function(a)) => {
            for (ep, ap) in e.params.iter().zip(a.params.iter()) {
                // Parameter positions are contravariant, but for inference
                // purposes TypeScript still reads candidates off them directly.
                unify(&ep.ty, &ap.ty, type_params, out);
            }
            unify(&e.return_type, &a.return_type, type_params, out);
        }
        (Type::Record(e), Type::Record(a)) => {
            for (k, e_ty) in &e.fields {
                if let Some(a_ty) = a.fields.get(k) {
                    unify(e_ty, a_ty, type_params, out);
                }
            }
        }
        (Type::Instantiation { target, type_args: e_args }, Type::Instance { type_args: a_args, .. }) => {
            let _ = target;
            for (e, a) in e_args.iter().zip(a_args.iter()) {
                unify(e, a, type_params, out);
            }
        }
        (Type::Conditional(c), _) => {
            // `infer` positions live inside `extends`; unify against the
            // check type directly since actual plays the role of `check`.
            unify(&c.check, actual, type_params, out);
        }
        _ => {}
    }
}

/// Resolves `infer`-bound type parameters within a conditional type's
/// `extends` clause by unifying it against the check type, then evaluates
/// the conditional to `then` or `else_` with those bindings substituted
/// (spec §4.8).
pub fn evaluate_conditional(
    check: &Type,
    extends: &Type,
    then: &Type,
    else_: &Type,
    infer_params: &[String],
    is_assignable: impl Fn(&Type, &Type) -> bool,
) -> Type {
    let mut candidates = InferenceCandidates::new();
    unify(extends, check, infer_params, &mut candidates);
    let bindings = candidates.resolve(infer_params);

    if matches!(check, Type::TypeParameter(_)) {
        // Distribute over bare type-parameter checks (spec §4.8): without a
        // concrete check type there's nothing to test membership against,
        // so fall back to the `then` branch with inferred bindings applied —
        // callers substitute the parameter before reaching here in the
        // common case; this is the conservative fallback.
        return super::substitution::substitute(then, &bindings);
    }

    if is_assignable(extends, check) {
        super::substitution::substitute(then, &bindings)
    } else {
        super::substitution::substitute(else_, &bindings)
    }
}

/// Distributes a conditional type over a union check type: `(A|B) extends
/// U ? X : Y` is `(A extends U ? X : Y) | (B extends U ? X : Y)` (spec §4.8).
pub fn distribute_conditional(
    check: &Type,
    extends: &Type,
    then: &Type,
    else_: &Type,
    infer_params: &[String],
    is_assignable: impl Fn(&Type, &Type) -> bool + Copy,
) -> Type {
    if let Type::Union(members) = check {
        let evaluated: Vec<Type> = members
            .iter()
            .map(|m| evaluate_conditional(m, extends, then, else_, infer_params, &is_assignable))
            .collect();
        union_of(evaluated)
    } else {
        evaluate_conditional(check, extends, then, else_, infer_params, is_assignable)
    }
}

/// Intrinsic string-type evaluators (`Uppercase<S>` and friends, spec §4.8),
/// applied pointwise over a union of string-literal types.
pub fn apply_string_mapping(kind: StringMappingKind, inner: &Type) -> Type {
    match inner {
        Type::StringLiteral(s) => Type::StringLiteral(apply_to_str(kind, s)),
        Type::Union(members) => union_of(members.iter().map(|m| apply_string_mapping(kind, m)).collect()),
        Type::String => Type::String,
        other => other.clone(),
    }
}

fn apply_to_str(kind: StringMappingKind, s: &str) -> String {
    match kind {
        StringMappingKind::Uppercase => s.to_uppercase(),
        StringMappingKind::Lowercase => s.to_lowercase(),
        StringMappingKind::Capitalize => capitalize(s),
        StringMappingKind::Uncapitalize => uncapitalize(s),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn uncapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Merges a set of contextual-typing candidates for an inferred return type
/// of an arrow body with multiple `return` statements: the common
/// supertype, per spec §4.6.
pub fn merge_return_types(returns: Vec<Type>) -> Type {
    if returns.is_empty() {
        Type::Void
    } else {
        union_of(returns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unify_collects_array_element_candidate() {
        let mut out = InferenceCandidates::new();
        unify(
            &Type::Array(Box::new(Type::TypeParameter("T".into()))),
            &Type::Array(Box::new(Type::Number)),
            &["T".to_string()],
            &mut out,
        );
        let resolved = out.resolve(&["T".to_string()]);
        assert_eq!(resolved.get("T"), Some(&Type::Number));
    }

    #[test]
    fn string_mapping_uppercase() {
        assert_eq!(
            apply_string_mapping(StringMappingKind::Uppercase, &Type::StringLiteral("ab".into())),
            Type::StringLiteral("AB".into())
        );
    }

    #[test]
    fn string_mapping_capitalize_over_union() {
        let u = Type::Union(vec![Type::StringLiteral("ab".into()), Type::StringLiteral("cd".into())]);
        let result = apply_string_mapping(StringMappingKind::Capitalize, &u);
        assert_eq!(
            result,
            Type::Union(vec![Type::StringLiteral("Ab".into()), Type::StringLiteral("Cd".into())])
        );
    }
}
