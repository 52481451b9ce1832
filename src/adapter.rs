//! The user-extensible half of the Value Encoder Registry (§4.1, resolution
//! step 3): the "microprotocol" an adapter exposes, and the `AdapterMap`
//! that resolves a foreign value's concrete type to a registered adapter.
//!
//! `Value::Other` wraps a type that already implements [`ToSql`] directly —
//! the Rust analogue of registering an adapter at the same site the type is
//! defined. For a type that does *not* implement `ToSql` (most commonly a
//! third-party type the orphan rules forbid implementing it for), the
//! caller instead registers an [`Adapter`] against a predicate over
//! [`std::any::Any`] in the process-wide [`AdapterMap`]. Both paths funnel
//! through the same `get_raw`/`get_quoted`/`prepare` capabilities.

use std::any::Any;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::conn_context::ConnContext;
use crate::error::Error;
use crate::oid::Oid;
use crate::value::Value;

/// What an adapter's `getraw` step produced (§4.1 resolution step 3).
pub enum GetRaw {
    /// `getraw` is not implemented by this adapter; refuse (-2) and let the
    /// caller fall back to the textual path.
    Unimplemented,
    /// `getraw` produced a (possibly still-opaque) value; the registry
    /// recurses by calling `encode` on it.
    Value(Value),
}

/// How an adapter's `getraw_oid` should influence the OID written for the
/// recursively-encoded value (§4.1 resolution step 3).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OidHint {
    /// `getraw_oid` returned "null": force `type_oid=0` so the backend
    /// infers (only valid if the recursive encode produced `format=text`).
    Infer,
    /// `getraw_oid` returned "false": leave the OID as the recursive
    /// encode produced it.
    AsProduced,
    /// `getraw_oid` returned a concrete OID: use it verbatim.
    Use(Oid),
}

/// A value's microprotocol: the capabilities the encoder registry and the
/// textual fallback mogrifier need from a runtime value whose type is not
/// one of the built-in fast-path kinds.
///
/// All methods have a refusing/no-op default so an adapter only needs to
/// implement the capability it actually supports, matching the "optional
/// methods" framing from §9's design notes.
pub trait ToSql: Send + Sync + 'static {
    /// Produce a raw (binary- or text-ready) value for the typed-parameter
    /// path. The default refuses, forcing textual fallback.
    fn get_raw(&self, _ctx: &ConnContext) -> GetRaw {
        GetRaw::Unimplemented
    }

    fn get_raw_oid(&self, _ctx: &ConnContext) -> OidHint {
        OidHint::AsProduced
    }

    /// Produce a fully quoted, self-contained SQL literal for the textual
    /// fallback mogrifier.
    fn get_quoted(&self, ctx: &ConnContext) -> Result<String, Error>;

    /// An optional preparation step run once before `get_raw`/`get_quoted`
    /// (e.g. to resolve a custom type's OID against the connection). The
    /// default is a no-op.
    fn prepare(&self, _ctx: &ConnContext) {}
}

/// An opaque runtime value paired with the (possibly foreign) adapter
/// resolved for it. `Value::Other` carries this when the value implements
/// [`ToSql`] directly.
pub struct Adapted {
    pub(crate) value: Arc<dyn Any + Send + Sync>,
    pub(crate) adapter: Arc<dyn ToSql>,
}

impl Adapted {
    pub fn new<T: ToSql>(value: T) -> Self {
        let value = Arc::new(value);
        Adapted {
            adapter: value.clone() as Arc<dyn ToSql>,
            value,
        }
    }

    /// Whether `other` wraps the exact same underlying value as `self`,
    /// rather than merely an equal one. Used to detect an adapter whose
    /// `get_raw` returned its own input unchanged, which would otherwise
    /// recurse forever (§9 design notes).
    pub(crate) fn same_underlying_value(&self, other: &Adapted) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }

    /// Resolve a foreign value (one that does not implement [`ToSql`]
    /// directly, most commonly a third-party type the orphan rules forbid
    /// implementing it for) against `registry`, and wrap it for encoding.
    ///
    /// Callers normally pass [`ADAPTERS`]; `registry` is a parameter rather
    /// than hardcoded so tests can resolve against a private map instead of
    /// mutating shared process-wide state.
    pub fn from_foreign<T: Any + Send + Sync>(value: T, registry: &AdapterMap) -> Result<Self, Error> {
        let value: Arc<dyn Any + Send + Sync> = Arc::new(value);
        let adapter = registry
            .resolve(value.as_ref())
            .ok_or_else(|| Error::ty("no adapter is registered for this value's type"))?;
        Ok(Adapted {
            adapter: Arc::new(ForeignBridge { value: value.clone(), adapter }),
            value,
        })
    }
}

/// Bridges a foreign value to the [`ToSql`] capability interface via a
/// predicate-matched [`Adapter`], so [`Adapted`] has one capability object
/// to hold regardless of which registration path produced it.
struct ForeignBridge {
    value: Arc<dyn Any + Send + Sync>,
    adapter: Arc<dyn Adapter>,
}

impl ToSql for ForeignBridge {
    fn get_raw(&self, ctx: &ConnContext) -> GetRaw {
        self.adapter.get_raw(self.value.as_ref(), ctx)
    }

    fn get_raw_oid(&self, ctx: &ConnContext) -> OidHint {
        self.adapter.get_raw_oid(self.value.as_ref(), ctx)
    }

    fn get_quoted(&self, ctx: &ConnContext) -> Result<String, Error> {
        self.adapter.get_quoted(self.value.as_ref(), ctx)
    }

    fn prepare(&self, ctx: &ConnContext) {
        self.adapter.prepare(self.value.as_ref(), ctx)
    }
}

impl Clone for Adapted {
    fn clone(&self) -> Self {
        Adapted {
            value: self.value.clone(),
            adapter: self.adapter.clone(),
        }
    }
}

/// Resolves a foreign (non-`ToSql`) value's concrete type to a registered
/// [`Adapter`], by walking registrations in declaration order and taking
/// the first predicate match.
///
/// The original source walks a type's *ancestry* (its MRO) looking for a
/// registered adapter; Rust values don't have a runtime class hierarchy to
/// walk, so this is rendered as an ordered predicate chain, which is the
/// closest faithful analogue (see DESIGN.md). Matches are **not** memoized,
/// matching the source's stated intent of not growing the map unboundedly
/// for dynamically generated types.
pub trait Adapter: Send + Sync + 'static {
    fn get_raw(&self, value: &dyn Any, ctx: &ConnContext) -> GetRaw {
        let _ = (value, ctx);
        GetRaw::Unimplemented
    }

    fn get_raw_oid(&self, _value: &dyn Any, _ctx: &ConnContext) -> OidHint {
        OidHint::AsProduced
    }

    fn get_quoted(&self, value: &dyn Any, ctx: &ConnContext) -> Result<String, Error>;

    fn prepare(&self, _value: &dyn Any, _ctx: &ConnContext) {}
}

type Predicate = Box<dyn Fn(&dyn Any) -> bool + Send + Sync>;

struct Registration {
    predicate: Predicate,
    adapter: Arc<dyn Adapter>,
}

/// Process-wide, append-only registry of foreign-type adapters.
///
/// Registration is additive (§3 lifecycle summary): there is no
/// `unregister`. Readers never take a lock on the hot path beyond the
/// `RwLock::read` needed to walk the `Vec`; writers (`register`) briefly
/// take the write lock. This satisfies §5's "publication happens-before
/// subsequent reads" requirement without needing an atomic pointer swap.
pub struct AdapterMap {
    registrations: RwLock<Vec<Registration>>,
}

impl AdapterMap {
    const fn new() -> Self {
        AdapterMap {
            registrations: RwLock::new(Vec::new()),
        }
    }

    /// Register `adapter` for every value where `predicate` returns true.
    /// Later registrations are only consulted if no earlier one matches.
    pub fn register<P>(&self, predicate: P, adapter: Arc<dyn Adapter>)
    where
        P: Fn(&dyn Any) -> bool + Send + Sync + 'static,
    {
        let mut registrations = self.registrations.write().expect("adapter map poisoned");
        registrations.push(Registration {
            predicate: Box::new(predicate),
            adapter,
        });
    }

    pub fn resolve(&self, value: &dyn Any) -> Option<Arc<dyn Adapter>> {
        let registrations = self.registrations.read().expect("adapter map poisoned");
        registrations
            .iter()
            .find(|reg| (reg.predicate)(value))
            .map(|reg| reg.adapter.clone())
    }
}

/// The process-wide adapter map, initialized once at first use (§3, §5).
pub static ADAPTERS: Lazy<AdapterMap> = Lazy::new(AdapterMap::new);

#[cfg(test)]
mod tests {
    use super::*;

    struct UppercasingAdapter;

    impl Adapter for UppercasingAdapter {
        fn get_raw(&self, value: &dyn Any, _ctx: &ConnContext) -> GetRaw {
            let s = value.downcast_ref::<String>().unwrap();
            GetRaw::Value(Value::Text(s.to_uppercase()))
        }

        fn get_quoted(&self, value: &dyn Any, _ctx: &ConnContext) -> Result<String, Error> {
            let s = value.downcast_ref::<String>().unwrap();
            Ok(format!("'{}'", s.to_uppercase()))
        }
    }

    #[test]
    fn first_registration_wins() {
        let map = AdapterMap::new();
        map.register(|v| v.is::<String>(), Arc::new(UppercasingAdapter));

        struct Refuser;
        impl Adapter for Refuser {
            fn get_quoted(&self, _value: &dyn Any, _ctx: &ConnContext) -> Result<String, Error> {
                Ok("NEVER".into())
            }
        }
        // registered second; should never be consulted for `String`
        map.register(|v| v.is::<String>(), Arc::new(Refuser));

        let value: Box<dyn Any> = Box::new(String::from("hi"));
        let adapter = map.resolve(value.as_ref()).expect("a match");
        let ctx = ConnContext::default();
        match adapter.get_raw(value.as_ref(), &ctx) {
            GetRaw::Value(Value::Text(s)) => assert_eq!(s, "HI"),
            _ => panic!("expected a text value"),
        }
    }

    #[test]
    fn unregistered_type_has_no_match() {
        let map = AdapterMap::new();
        map.register(|v| v.is::<String>(), Arc::new(UppercasingAdapter));
        let value: Box<dyn Any> = Box::new(42i32);
        assert!(map.resolve(value.as_ref()).is_none());
    }

    #[test]
    fn from_foreign_bridges_a_registered_adapter_into_tosql() {
        let map = AdapterMap::new();
        map.register(|v| v.is::<String>(), Arc::new(UppercasingAdapter));

        let adapted = Adapted::from_foreign(String::from("hi"), &map).unwrap();
        let ctx = ConnContext::default();
        match adapted.adapter.get_raw(&ctx) {
            GetRaw::Value(Value::Text(s)) => assert_eq!(s, "HI"),
            _ => panic!("expected a text value"),
        }
        assert_eq!(adapted.adapter.get_quoted(&ctx).unwrap(), "'HI'");
    }

    #[test]
    fn from_foreign_with_no_matching_registration_is_a_type_error() {
        let map = AdapterMap::new();
        let err = Adapted::from_foreign(42i32, &map).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn identity_detects_non_progress() {
        let a = Adapted::new(NonProgressing);
        let b = a.clone();
        assert!(a.same_underlying_value(&b));
    }

    struct NonProgressing;
    impl ToSql for NonProgressing {
        fn get_quoted(&self, _ctx: &ConnContext) -> Result<String, Error> {
            Ok("NULL".into())
        }
    }
}
