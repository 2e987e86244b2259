// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conversion between generic values of compatible types.
//!
//! [`Converter::convert`] never mutates its source. The result says whether
//! it borrows the source, aliases existing storage or was freshly built:
//!
//! | Rule                              | Result     |
//! |-----------------------------------|------------|
//! | same descriptor                   | `Borrowed` |
//! | Int, Float, String, List, Map     | `Owned`    |
//! | Tuple, Dynamic, Raw               | `Owned`    |
//! | pointer to object, object to ptr  | `Alias`    |
//! | object to inherited base          | `Alias`    |
//! | proxy substitution                | `Owned`    |

use crate::config::{ConversionConfig, ListFailurePolicy, RuntimeConfig};
use crate::error::{Error, Result};
use crate::object::ObjectPtr;
use crate::proxy::ProxyRegistry;
use crate::types::{FromStorage, Kind, TypeInfo, TypeKind, TypeRef, TypeRegistry};
use crate::value::{Storage, Value, ValueRef};
use std::any::TypeId;
use std::sync::Arc;

/// Outcome of a conversion.
#[derive(Debug)]
pub enum Converted<'a> {
    /// The source itself; nothing was allocated.
    Borrowed(ValueRef<'a>),
    /// A new view sharing the source's object instance.
    Alias(Value),
    /// Freshly built storage owned by the caller.
    Owned(Value),
}

impl<'a> Converted<'a> {
    /// Whether the result was freshly allocated.
    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    pub fn value_ref(&self) -> ValueRef<'_> {
        match self {
            Self::Borrowed(v) => *v,
            Self::Alias(v) | Self::Owned(v) => v.as_ref(),
        }
    }

    pub fn ty(&self) -> Option<TypeRef> {
        self.value_ref().ty()
    }

    pub fn storage(&self) -> &Storage {
        match self {
            Self::Borrowed(v) => v.storage(),
            Self::Alias(v) | Self::Owned(v) => v.storage(),
        }
    }

    /// Owning value; a borrowed result is deep-copied.
    pub fn into_value(self) -> Value {
        match self {
            Self::Borrowed(v) => v.to_owned_value(),
            Self::Alias(v) | Self::Owned(v) => v,
        }
    }

    pub fn into_storage(self) -> Storage {
        match self {
            Self::Borrowed(v) => v.storage().clone(),
            Self::Alias(v) | Self::Owned(v) => v.into_storage(),
        }
    }
}

/// Conversion engine bound to a type registry, a proxy registry and a
/// configuration snapshot.
pub struct Converter<'r> {
    registry: &'r TypeRegistry,
    proxies: &'r ProxyRegistry,
    config: Arc<ConversionConfig>,
}

impl Converter<'static> {
    /// Converter over the global registries and current configuration.
    pub fn global() -> Self {
        Self::new(
            TypeRegistry::global(),
            ProxyRegistry::global(),
            RuntimeConfig::global().conversion(),
        )
    }
}

impl<'r> Converter<'r> {
    pub fn new(
        registry: &'r TypeRegistry,
        proxies: &'r ProxyRegistry,
        config: Arc<ConversionConfig>,
    ) -> Self {
        Self {
            registry,
            proxies,
            config,
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert `value` to `target`.
    pub fn convert<'a>(&self, value: ValueRef<'a>, target: TypeRef) -> Result<Converted<'a>> {
        self.convert_at(value, target, 0)
    }

    /// Convert `value` to `target`, deep-copying unless the conversion
    /// already allocated. Object instances are shared, never cloned.
    pub fn convert_copy(&self, value: ValueRef<'_>, target: TypeRef) -> Result<Value> {
        Ok(self.convert(value, target)?.into_value())
    }

    fn convert_at<'a>(
        &self,
        value: ValueRef<'a>,
        target: TypeRef,
        depth: usize,
    ) -> Result<Converted<'a>> {
        let source = match value.ty() {
            Some(ty) if std::ptr::eq(ty, target) => return Ok(Converted::Borrowed(value)),
            Some(ty) => ty,
            None => {
                log::warn!("Conversion error: can't convert to/from a null type");
                return Err(Error::NullType);
            }
        };
        if depth > self.config.max_depth {
            return Err(Error::conversion(
                source,
                target,
                format!("nesting deeper than {}", self.config.max_depth),
            ));
        }

        let (skind, dkind) = (source.kind(), target.kind());
        if skind == dkind {
            if let Some(converted) = self.convert_same_kind(value, source, target, depth)? {
                return Ok(converted);
            }
        }

        match (source.type_kind(), target.type_kind()) {
            (TypeKind::Float(_), TypeKind::Int(d)) => {
                let v = float_of(value.storage());
                let bits = d
                    .encode_double(v)
                    .ok_or_else(|| Error::conversion(source, target, format!("{} out of range", v)))?;
                return Ok(owned(target, Storage::Int(bits)));
            }
            (TypeKind::Int(s), TypeKind::Float(d)) => {
                let v = s.value(value.storage())?;
                return Ok(owned(target, Storage::Float(d.narrow(v as f64))));
            }
            (TypeKind::String, TypeKind::Raw) => {
                return Ok(owned(target, Storage::Raw(bytes_of(value.storage()))));
            }
            (TypeKind::Raw, TypeKind::String) => {
                log::warn!("Conversion attempt from raw to string");
                return Err(Error::conversion(source, target, "raw buffers do not convert to strings"));
            }
            _ => {}
        }

        if dkind == Kind::Dynamic {
            return Ok(wrap_dynamic(value, target));
        }

        if let Some(converted) = self.substitute_proxy(value, source, target) {
            return Ok(converted);
        }

        if skind == Kind::Dynamic {
            return self.convert_at(value.as_dynamic()?, target, depth + 1);
        }

        if skind == Kind::Object {
            if let Some(pointer) = target.as_pointer() {
                let pointee = self.convert_at(value, pointer.pointee(), depth + 1)?;
                return Ok(alias(
                    target,
                    Storage::Pointer(Some(Box::new(pointee.into_storage()))),
                ));
            }

            if let (Kind::Object, Storage::Object(object)) = (dkind, value.storage()) {
                if let Some(offset) = self.registry.inherits(source, target) {
                    log::trace!(
                        "'{}' viewed as '{}' at offset {}",
                        source.name(),
                        target.name(),
                        offset.bytes()
                    );
                    return Ok(alias(target, Storage::Object(object.rebased(offset))));
                }
            }
        }

        if source.info() == target.info() {
            return Ok(Converted::Borrowed(value));
        }
        Err(Error::conversion(source, target, "no conversion rule"))
    }

    /// Rules for source and target of the same kind.
    ///
    /// `Ok(None)` hands over to the cross-kind rules.
    fn convert_same_kind<'a>(
        &self,
        value: ValueRef<'a>,
        source: TypeRef,
        target: TypeRef,
        depth: usize,
    ) -> Result<Option<Converted<'a>>> {
        let storage = value.storage();
        let converted = match (source.type_kind(), target.type_kind()) {
            (TypeKind::Int(s), TypeKind::Int(d)) => {
                let raw = s.get(storage)?;
                let bits = if s.is_signed() {
                    d.encode_int(raw)
                } else {
                    d.encode_uint(raw as u64)
                };
                let bits = bits.ok_or_else(|| {
                    let v = s.value(storage).unwrap_or_default();
                    Error::conversion(source, target, format!("{} out of range", v))
                })?;
                owned(target, Storage::Int(bits))
            }
            (TypeKind::Float(_), TypeKind::Float(d)) => {
                owned(target, Storage::Float(d.narrow(float_of(storage))))
            }
            (TypeKind::String, TypeKind::String) => {
                if source.info() == target.info() {
                    Converted::Borrowed(value)
                } else {
                    owned(target, Storage::String(bytes_of(storage)))
                }
            }
            (TypeKind::List(s), TypeKind::List(d)) => {
                let (from, to) = (s.element_type(), d.element_type());
                let same = from.info() == to.info();
                let mut items = Vec::new();
                for item in s.items(storage)? {
                    if same {
                        items.push(item.clone());
                        continue;
                    }
                    match self.convert_at(ValueRef::new(from, item), to, depth + 1) {
                        Ok(c) => items.push(c.into_storage()),
                        Err(e) if self.config.list_failure == ListFailurePolicy::Skip => {
                            log::debug!("list conversion: skipped element ({})", e);
                        }
                        Err(e) => return Err(e),
                    }
                }
                owned(target, Storage::List(items))
            }
            (TypeKind::Map(s), TypeKind::Map(d)) => {
                let same_key = s.key_type().info() == d.key_type().info();
                let same_elem = s.element_type().info() == d.element_type().info();
                let mut result = Storage::Map(Vec::new());
                for entry in s.entries(storage)? {
                    let (k, v) = match entry {
                        Storage::Tuple(pair) if pair.len() == 2 => (&pair[0], &pair[1]),
                        _ => return Err(Error::invalid_operation("map entry", Kind::Map)),
                    };
                    let k = if same_key {
                        k.clone()
                    } else {
                        self.convert_at(ValueRef::new(s.key_type(), k), d.key_type(), depth + 1)?
                            .into_storage()
                    };
                    let v = if same_elem {
                        v.clone()
                    } else {
                        self.convert_at(
                            ValueRef::new(s.element_type(), v),
                            d.element_type(),
                            depth + 1,
                        )?
                        .into_storage()
                    };
                    d.insert(&mut result, k, v)?;
                }
                owned(target, result)
            }
            (TypeKind::Pointer(s), TypeKind::Pointer(d)) => {
                if s.pointee().kind() != Kind::Object || d.pointee().kind() != Kind::Object {
                    if source.info() == target.info() {
                        return Ok(Some(Converted::Borrowed(value)));
                    }
                    return Err(Error::conversion(
                        source,
                        target,
                        "only pointers to objects convert",
                    ));
                }
                let pointed = ValueRef::new(s.pointee(), s.dereference(storage)?);
                let converted = self.convert_at(pointed, d.pointee(), depth + 1)?;
                if converted.is_owned() {
                    log::warn!(
                        "pointer conversion {} -> {} allocated its target",
                        source.name(),
                        target.name()
                    );
                }
                alias(
                    target,
                    Storage::Pointer(Some(Box::new(converted.into_storage()))),
                )
            }
            (TypeKind::Tuple(s), TypeKind::Tuple(d)) => {
                let (from, to) = (s.members(), d.members());
                if from.len() != to.len() {
                    log::warn!(
                        "Conversion failure: tuple size mismatch ({} -> {})",
                        from.len(),
                        to.len()
                    );
                    return Err(Error::conversion(
                        source,
                        target,
                        format!("tuple arity {} differs from {}", from.len(), to.len()),
                    ));
                }
                let mut members = Vec::with_capacity(to.len());
                for (i, (&f, &t)) in from.iter().zip(to).enumerate() {
                    let member = s
                        .get(storage, i)?
                        .ok_or(Error::Index { index: i as i64, length: from.len() })?;
                    match self.convert_at(ValueRef::new(f, member), t, depth + 1) {
                        Ok(c) => members.push(c.into_storage()),
                        Err(e) => {
                            log::warn!(
                                "Conversion failure in tuple member between {} and {}",
                                f.name(),
                                t.name()
                            );
                            return Err(e);
                        }
                    }
                }
                owned(target, Storage::Tuple(members))
            }
            (TypeKind::Dynamic, TypeKind::Dynamic) => wrap_dynamic(value, target),
            (TypeKind::Raw, TypeKind::Raw) => owned(target, Storage::Raw(bytes_of(storage))),
            _ => return Ok(None),
        };
        Ok(Some(converted))
    }

    /// Generic object handle to a pointer-to-object type with a registered
    /// proxy factory.
    fn substitute_proxy<'a>(
        &self,
        value: ValueRef<'a>,
        source: TypeRef,
        target: TypeRef,
    ) -> Option<Converted<'a>> {
        if source.info() != &TypeInfo::Native(TypeId::of::<ObjectPtr>()) {
            return None;
        }
        let pointee = target.as_pointer()?.pointee();
        if pointee.kind() != Kind::Object {
            return None;
        }
        let factory = self.proxies.lookup(pointee.info())?;
        let object = ObjectPtr::from_storage(value.storage())?;
        log::debug!("proxy substitution for '{}'", pointee.name());
        Some(Converted::Owned(factory(&object)))
    }
}

fn owned<'a>(ty: TypeRef, storage: Storage) -> Converted<'a> {
    Converted::Owned(Value::from_parts(ty, storage))
}

fn alias<'a>(ty: TypeRef, storage: Storage) -> Converted<'a> {
    Converted::Alias(Value::from_parts(ty, storage))
}

fn wrap_dynamic<'a>(value: ValueRef<'_>, target: TypeRef) -> Converted<'a> {
    owned(target, Storage::Dynamic(Box::new(value.to_owned_value())))
}

fn float_of(storage: &Storage) -> f64 {
    match storage {
        Storage::Float(v) => *v,
        _ => 0.0,
    }
}

fn bytes_of(storage: &Storage) -> Vec<u8> {
    match storage {
        Storage::String(bytes) | Storage::Raw(bytes) => bytes.clone(),
        _ => Vec::new(),
    }
}
