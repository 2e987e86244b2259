// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Ordering over arbitrary generic values.
//!
//! Any two values are ordered, whatever their types, so values can key
//! ordered containers:
//!
//! 1. A value without type sorts before any typed value.
//! 2. Values of the same type use the type's own comparator, except
//!    strings, which always take rule 4.
//! 3. Values of different kinds: Int and Float compare numerically,
//!    anything else by [`Kind`] order.
//! 4. Same kind, different types: numbers numerically, strings by length
//!    then bytes, lists and maps by element count then element-wise. The
//!    remaining kinds compare by storage address.
//!
//! Lists and maps take the count-first rule under rule 2 as well, and the two
//! float zeros are equal, so mixing rules never produces a cycle.
//!
//! Length-first string ordering is intentional: `"zz" < "aaa"`.

use crate::types::{IntDescriptor, Kind, TypeKind, TypeRef};
use crate::value::{Storage, ValueRef};
use std::cmp::Ordering;

/// Strict weak order: `a` sorts before `b`.
pub fn less(a: ValueRef<'_>, b: ValueRef<'_>) -> bool {
    compare(a, b) == Ordering::Less
}

/// Equivalence under [`less`]; iterators of the same type compare cursors.
pub fn equals(a: ValueRef<'_>, b: ValueRef<'_>) -> bool {
    if let (Some(ta), Some(tb)) = (a.ty(), b.ty()) {
        if let (TypeKind::Iterator(it), Kind::Iterator) = (ta.type_kind(), tb.kind()) {
            if ta.info() == tb.info() {
                return it.equals(a.storage(), b.storage());
            }
        }
    }
    compare(a, b) == Ordering::Equal
}

/// Three-way form of [`less`].
pub fn compare(a: ValueRef<'_>, b: ValueRef<'_>) -> Ordering {
    let (ta, tb) = match (a.ty(), b.ty()) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(ta), Some(tb)) => (ta, tb),
    };

    if ta.same_type(tb) && ta.kind() != Kind::String {
        return storage_cmp(ta, a.storage(), b.storage());
    }

    let (ka, kb) = (ta.kind(), tb.kind());
    if ka != kb {
        return match (number(a), number(b)) {
            (Some(x), Some(y)) => x.cmp(y),
            _ => ka.cmp(&kb),
        };
    }

    match ka {
        Kind::Void => Ordering::Equal,
        Kind::Int | Kind::Float => match (number(a), number(b)) {
            (Some(x), Some(y)) => x.cmp(y),
            _ => a.address().cmp(&b.address()),
        },
        Kind::String => match (a.storage(), b.storage()) {
            (Storage::String(x), Storage::String(y)) => {
                x.len().cmp(&y.len()).then_with(|| x.cmp(y))
            }
            _ => a.address().cmp(&b.address()),
        },
        Kind::List | Kind::Map => match (elements(ta, a.storage()), elements(tb, b.storage())) {
            (Some(x), Some(y)) => sequence_cmp(x, y),
            _ => a.address().cmp(&b.address()),
        },
        Kind::Object
        | Kind::Pointer
        | Kind::Tuple
        | Kind::Dynamic
        | Kind::Raw
        | Kind::Unknown
        | Kind::Iterator => a.address().cmp(&b.address()),
    }
}

/// The own comparator of `ty` over two storages of that type.
///
/// Unlike [`compare`], strings order lexicographically here; this is the
/// order map entries are kept in. List and map elements still go through
/// [`compare`].
pub(crate) fn storage_cmp(ty: TypeRef, a: &Storage, b: &Storage) -> Ordering {
    match (ty.type_kind(), a, b) {
        (TypeKind::Void, _, _) => Ordering::Equal,
        (TypeKind::Int(d), Storage::Int(_), Storage::Int(_)) => int_value(d, a).cmp(&int_value(d, b)),
        (TypeKind::Float(_), Storage::Float(x), Storage::Float(y)) => float_cmp(*x, *y),
        (TypeKind::String, Storage::String(x), Storage::String(y)) => x.cmp(y),
        (TypeKind::Raw, Storage::Raw(x), Storage::Raw(y)) => x.cmp(y),
        (TypeKind::List(list), Storage::List(x), Storage::List(y)) => {
            let element = list.element_type();
            sequence_cmp((element, x.as_slice()), (element, y.as_slice()))
        }
        (TypeKind::Map(map), Storage::Map(x), Storage::Map(y)) => {
            let entry = map.entry_type();
            sequence_cmp((entry, x.as_slice()), (entry, y.as_slice()))
        }
        (TypeKind::Tuple(tuple), Storage::Tuple(x), Storage::Tuple(y)) => x
            .iter()
            .zip(y)
            .zip(tuple.members())
            .map(|((p, q), member)| storage_cmp(*member, p, q))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (TypeKind::Dynamic, Storage::Dynamic(x), Storage::Dynamic(y)) => {
            compare((**x).as_ref(), (**y).as_ref())
        }
        (TypeKind::Iterator(_), Storage::Iterator(x), Storage::Iterator(y)) => {
            (x.container, x.position).cmp(&(y.container, y.position))
        }
        _ => a.address().cmp(&b.address()),
    }
}

/// Element type and elements of a List, entry type and entries of a Map.
fn elements<'s>(ty: TypeRef, storage: &'s Storage) -> Option<(TypeRef, &'s [Storage])> {
    match (ty.type_kind(), storage) {
        (TypeKind::List(list), Storage::List(items)) => {
            Some((list.element_type(), items.as_slice()))
        }
        (TypeKind::Map(map), Storage::Map(entries)) => Some((map.entry_type(), entries.as_slice())),
        _ => None,
    }
}

/// Count first, then element-wise. Shared by same-type and cross-type
/// comparisons so both agree.
fn sequence_cmp(x: (TypeRef, &[Storage]), y: (TypeRef, &[Storage])) -> Ordering {
    let ((tx, xs), (ty, ys)) = (x, y);
    xs.len().cmp(&ys.len()).then_with(|| {
        xs.iter()
            .zip(ys)
            .map(|(p, q)| compare(ValueRef::new(tx, p), ValueRef::new(ty, q)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    })
}

/// Numeric float order with both zeros equal and NaN last.
fn float_cmp(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

fn int_value(d: &IntDescriptor, s: &Storage) -> i128 {
    d.value(s).unwrap_or_default()
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i128),
    Float(f64),
}

impl Number {
    fn cmp(self, other: Number) -> Ordering {
        match (self, other) {
            (Number::Int(x), Number::Int(y)) => x.cmp(&y),
            (Number::Float(x), Number::Float(y)) => float_cmp(x, y),
            (Number::Int(x), Number::Float(y)) => int_float_cmp(x, y),
            (Number::Float(x), Number::Int(y)) => int_float_cmp(y, x).reverse(),
        }
    }
}

fn number(v: ValueRef<'_>) -> Option<Number> {
    match v.ty()?.type_kind() {
        TypeKind::Int(d) => d.value(v.storage()).ok().map(Number::Int),
        TypeKind::Float(d) => d.get(v.storage()).ok().map(Number::Float),
        _ => None,
    }
}

/// Exact comparison of an integer with a float; NaN sorts last.
fn int_float_cmp(i: i128, f: f64) -> Ordering {
    const LIMIT: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0; // 2^127
    if f.is_nan() || f >= LIMIT {
        return Ordering::Less;
    }
    if f < -LIMIT {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i128)) {
        Ordering::Equal => float_cmp(0.0, f - whole),
        other => other,
    }
}
