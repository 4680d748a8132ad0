//! Type-parameter substitution and canonical-form construction (spec §4.4).
//!
//! `substitute` is capture-free because every generic declaration's type
//! parameters are uniquely named by the parser/checker (spec §4.4), so a
//! plain name-keyed map is enough — no alpha-renaming machinery is needed.
//! `union_of`/`intersection_of` are the canonicalizing constructors: every
//! other module should build unions/intersections through these rather than
//! the bare `Type::Union`/`Type::Intersection` variants, so canonical form
//! (flattened, deduplicated, `never`/`any`/`unknown` absorbed) is a property
//! of construction rather than something re-checked at every use site.

use std::collections::HashMap;
use std::rc::Rc;

use super::types::{
    ClassType, ConditionalType, EnumType, FunctionSignature, GenericDef, InterfaceType,
    MappedType, ParamType, RecordType, Type, TupleElementType,
};

pub type SubstMap = HashMap<String, Type>;

/// Walks `ty`, replacing every `Type::TypeParameter(name)` found in `mapping`.
pub fn substitute(ty: &Type, mapping: &SubstMap) -> Type {
    match ty {
        Type::TypeParameter(name) => mapping.get(name).cloned().unwrap_or_else(|| ty.clone()),

        Type::Any
        | Type::Unknown
        | Type::Never
        | Type::Void
        | Type::Null
        | Type::Undefined
        | Type::String
        | Type::Number
        | Type::Boolean
        | Type::BigInt
        | Type::UniqueSymbol(_)
        | Type::StringLiteral(_)
        | Type::NumberLiteral(_)
        | Type::BooleanLiteral(_)
        | Type::BigIntLiteral(_)
        | Type::RecursiveTypeAlias { .. } => ty.clone(),

        Type::Union(members) => union_of(members.iter().map(|m| substitute(m, mapping)).collect()),
        Type::Intersection(members) => {
            intersection_of(members.iter().map(|m| substitute(m, mapping)).collect())
        }

        Type::Array(el) => Type::Array(Box::new(substitute(el, mapping))),
        Type::Tuple(elements) => Type::Tuple(
            elements
                .iter()
                .map(|e| TupleElementType {
                    label: e.label.clone(),
                    ty: substitute(&e.ty, mapping),
                    optional: e.optional,
                    rest: e.rest,
                })
                .collect(),
        ),
        Type::Record(record) => Type::Record(Box::new(substitute_record(record, mapping))),

        Type::Class(class) => Type::Class(Rc::new(substitute_class(class, mapping))),
        Type::Instance {
            class_name,
            type_args,
        } => Type::Instance {
            class_name: class_name.clone(),
            type_args: type_args.iter().map(|t| substitute(t, mapping)).collect(),
        },
        Type::Interface(iface) => Type::Interface(Rc::new(substitute_interface(iface, mapping))),
        Type::Enum(e) => Type::Enum(e.clone()),
        Type::EnumMember { .. } => ty.clone(),

        Type::Function(sig) => Type::Function(Rc::new(substitute_signature(sig, mapping))),
        Type::Overloaded(sigs) => Type::Overloaded(
            sigs.iter()
                .map(|s| substitute_signature(s, mapping))
                .collect(),
        ),

        Type::Generic(def) => Type::Generic(def.clone()),
        Type::Instantiation { target, type_args } => Type::Instantiation {
            target: target.clone(),
            type_args: type_args.iter().map(|t| substitute(t, mapping)).collect(),
        },

        Type::KeyOf(inner) => Type::KeyOf(Box::new(substitute(inner, mapping))),
        Type::IndexedAccess { object, index } => Type::IndexedAccess {
            object: Box::new(substitute(object, mapping)),
            index: Box::new(substitute(index, mapping)),
        },
        Type::Mapped(m) => Type::Mapped(Rc::new(MappedType {
            type_param_name: m.type_param_name.clone(),
            key_source: Box::new(substitute(&m.key_source, mapping)),
            name_type: m.name_type.as_ref().map(|t| Box::new(substitute(t, mapping))),
            value_template: Box::new(substitute(&m.value_template, mapping)),
            optional_modifier: m.optional_modifier.clone(),
            readonly_modifier: m.readonly_modifier.clone(),
        })),
        Type::Conditional(c) => Type::Conditional(Rc::new(ConditionalType {
            check: Box::new(substitute(&c.check, mapping)),
            extends: Box::new(substitute(&c.extends, mapping)),
            then: Box::new(substitute(&c.then, mapping)),
            else_: Box::new(substitute(&c.else_, mapping)),
            infer_params: c.infer_params.clone(),
        })),
        Type::TemplateLiteral { quasis, types } => Type::TemplateLiteral {
            quasis: quasis.clone(),
            types: types.iter().map(|t| substitute(t, mapping)).collect(),
        },
        Type::StringMapping { kind, inner } => Type::StringMapping {
            kind: *kind,
            inner: Box::new(substitute(inner, mapping)),
        },
        Type::TypePredicate { param_name, ty } => Type::TypePredicate {
            param_name: param_name.clone(),
            ty: ty.as_ref().map(|t| Box::new(substitute(t, mapping))),
        },
        Type::AssertsPredicate { param_name, ty } => Type::AssertsPredicate {
            param_name: param_name.clone(),
            ty: ty.as_ref().map(|t| Box::new(substitute(t, mapping))),
        },
    }
}

fn substitute_record(record: &RecordType, mapping: &SubstMap) -> RecordType {
    RecordType {
        fields: record
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), substitute(v, mapping)))
            .collect(),
        optional_fields: record.optional_fields.clone(),
        readonly_fields: record.readonly_fields.clone(),
        string_index: record
            .string_index
            .as_ref()
            .map(|t| Box::new(substitute(t, mapping))),
        number_index: record
            .number_index
            .as_ref()
            .map(|t| Box::new(substitute(t, mapping))),
    }
}

fn substitute_class(class: &ClassType, mapping: &SubstMap) -> ClassType {
    // Don't substitute through a class's own type parameters when they
    // shadow the mapping (a class's member types are only substituted when
    // instantiating that class's own parameters, handled by the caller
    // narrowing `mapping` first).
    ClassType {
        name: class.name.clone(),
        type_params: class.type_params.clone(),
        superclass: class
            .superclass
            .as_ref()
            .map(|t| Box::new(substitute(t, mapping))),
        implements: class
            .implements
            .iter()
            .map(|t| substitute(t, mapping))
            .collect(),
        members: class
            .members
            .iter()
            .map(|(k, v)| (k.clone(), substitute(v, mapping)))
            .collect(),
        static_members: class
            .static_members
            .iter()
            .map(|(k, v)| (k.clone(), substitute(v, mapping)))
            .collect(),
        is_abstract: class.is_abstract,
    }
}

fn substitute_interface(iface: &InterfaceType, mapping: &SubstMap) -> InterfaceType {
    InterfaceType {
        name: iface.name.clone(),
        type_params: iface.type_params.clone(),
        extends: iface.extends.iter().map(|t| substitute(t, mapping)).collect(),
        members: iface
            .members
            .iter()
            .map(|(k, v)| (k.clone(), substitute(v, mapping)))
            .collect(),
        optional_members: iface.optional_members.clone(),
        call_signatures: iface
            .call_signatures
            .iter()
            .map(|s| substitute_signature(s, mapping))
            .collect(),
        construct_signatures: iface
            .construct_signatures
            .iter()
            .map(|s| substitute_signature(s, mapping))
            .collect(),
        string_index: iface
            .string_index
            .as_ref()
            .map(|t| Box::new(substitute(t, mapping))),
        number_index: iface
            .number_index
            .as_ref()
            .map(|t| Box::new(substitute(t, mapping))),
    }
}

fn substitute_signature(sig: &FunctionSignature, mapping: &SubstMap) -> FunctionSignature {
    FunctionSignature {
        type_params: sig.type_params.clone(),
        params: sig
            .params
            .iter()
            .map(|p| ParamType {
                name: p.name.clone(),
                ty: substitute(&p.ty, mapping),
                optional: p.optional,
                rest: p.rest,
            })
            .collect(),
        this_type: sig
            .this_type
            .as_ref()
            .map(|t| Box::new(substitute(t, mapping))),
        return_type: Box::new(substitute(&sig.return_type, mapping)),
    }
}

/// Instantiates a generic definition with concrete type arguments,
/// substituting defaults for omitted trailing arguments.
pub fn instantiate(def: &GenericDef, type_args: &[Type]) -> Type {
    let mut mapping = SubstMap::new();
    for (i, param) in def.type_params.iter().enumerate() {
        let arg = type_args
            .get(i)
            .cloned()
            .or_else(|| param.default.clone())
            .unwrap_or(Type::Any);
        mapping.insert(param.name.clone(), arg);
    }
    substitute(&def.body, &mapping)
}

/// Flattens nested unions, deduplicates by structural equality, drops
/// `never` (identity element), and collapses to `any`/`unknown` when either
/// absorbs the rest (spec §4.4 "Canonical forms").
pub fn union_of(members: Vec<Type>) -> Type {
    let mut flat: Vec<Type> = Vec::new();
    flatten_union_into(members, &mut flat);
    if flat.iter().any(|t| matches!(t, Type::Any)) {
        return Type::Any;
    }
    flat.retain(|t| !matches!(t, Type::Never));
    let mut deduped: Vec<Type> = Vec::new();
    for t in flat {
        if !deduped.contains(&t) {
            deduped.push(t);
        }
    }
    match deduped.len() {
        0 => Type::Never,
        1 => deduped.into_iter().next().unwrap(),
        _ => Type::Union(deduped),
    }
}

fn flatten_union_into(members: Vec<Type>, out: &mut Vec<Type>) {
    for m in members {
        match m {
            Type::Union(inner) => flatten_union_into(inner, out),
            other => out.push(other),
        }
    }
}

/// Flattens nested intersections and reduces an intersection of mutually
/// exclusive primitives to `never` (spec §4.4).
pub fn intersection_of(members: Vec<Type>) -> Type {
    let mut flat: Vec<Type> = Vec::new();
    flatten_intersection_into(members, &mut flat);
    if flat.iter().any(|t| matches!(t, Type::Any)) {
        return Type::Any;
    }
    let mut deduped: Vec<Type> = Vec::new();
    for t in flat {
        if !deduped.contains(&t) {
            deduped.push(t);
        }
    }
    if has_incompatible_primitives(&deduped) {
        return Type::Never;
    }
    match deduped.len() {
        0 => Type::Unknown,
        1 => deduped.into_iter().next().unwrap(),
        _ => Type::Intersection(deduped),
    }
}

fn flatten_intersection_into(members: Vec<Type>, out: &mut Vec<Type>) {
    for m in members {
        match m {
            Type::Intersection(inner) => flatten_intersection_into(inner, out),
            other => out.push(other),
        }
    }
}

fn primitive_kind(ty: &Type) -> Option<&'static str> {
    match ty {
        Type::String | Type::StringLiteral(_) => Some("string"),
        Type::Number | Type::NumberLiteral(_) => Some("number"),
        Type::Boolean | Type::BooleanLiteral(_) => Some("boolean"),
        Type::BigInt | Type::BigIntLiteral(_) => Some("bigint"),
        Type::Undefined => Some("undefined"),
        Type::Null => Some("null"),
        _ => None,
    }
}

fn has_incompatible_primitives(members: &[Type]) -> bool {
    let kinds: Vec<&'static str> = members.iter().filter_map(primitive_kind).collect();
    kinds.windows(2).any(|w| w[0] != w[1]) && kinds.len() >= 2 && {
        let first = kinds[0];
        kinds.iter().any(|k| *k != first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_flattens_and_dedupes() {
        let a = union_of(vec![Type::String, Type::Number]);
        let b = union_of(vec![a, Type::Number]);
        assert_eq!(b, Type::Union(vec![Type::String, Type::Number]));
    }

    #[test]
    fn union_absorbs_never() {
        let u = union_of(vec![Type::String, Type::Never]);
        assert_eq!(u, Type::String);
    }

    #[test]
    fn union_absorbs_any() {
        let u = union_of(vec![Type::String, Type::Any]);
        assert_eq!(u, Type::Any);
    }

    #[test]
    fn intersection_of_incompatible_primitives_is_never() {
        let i = intersection_of(vec![Type::String, Type::Number]);
        assert_eq!(i, Type::Never);
    }

    #[test]
    fn substitute_replaces_type_parameter() {
        let mut mapping = SubstMap::new();
        mapping.insert("T".to_string(), Type::Number);
        let ty = Type::Array(Box::new(Type::TypeParameter("T".to_string())));
        assert_eq!(substitute(&ty, &mapping), Type::Array(Box::new(Type::Number)));
    }
}
