//! Constructors for polymorphic destinations.
//!
//! A trait object cannot be decoded by looking at its type alone. Instead a
//! constructor registered for the trait inspects the node, typically a
//! discriminating field, and builds the matching concrete value.
//!
//! ```
//! use jtree::{Abstract, Context, Node, Options, Poly, Result, TypeRegistry};
//! use std::sync::Arc;
//!
//! trait Shape {
//!     fn area(&self) -> f64;
//! }
//!
//! struct Square(f64);
//!
//! impl Shape for Square {
//!     fn area(&self) -> f64 {
//!         self.0 * self.0
//!     }
//! }
//!
//! impl Abstract for dyn Shape {}
//!
//! let types = TypeRegistry::new();
//! types.register::<dyn Shape, _>(|node: &Node, ctx: &Context| -> Result<Box<dyn Shape>> {
//!     let mut side = 0f64;
//!     node["side"].decode_with(&mut side, &Options::new().context(ctx.clone()))?;
//!     Ok(Box::new(Square(side)))
//! });
//!
//! let node = jtree::parse_str(r#"{"side": 3}"#).unwrap();
//! let mut shape = Poly::<dyn Shape>::default();
//! node.decode_with(&mut shape, &Options::new().types(Arc::new(types))).unwrap();
//! assert_eq!(shape.area(), 9.0);
//! ```

use crate::de::Decode;
use crate::error::{Error, ErrorCode, Result};
use crate::node::Node;
use crate::options::{Context, Options};
use crate::value::Value;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, OnceLock, RwLock};

/// A type that can be the target of a registered constructor, usually a
/// trait object type such as `dyn Shape`.
pub trait Abstract: 'static {
    /// Converts a default-synthesized [`Value`] into `Self`, used when no
    /// constructor is registered. Returning `None` makes the decode fail with
    /// an incompatible types error.
    fn from_value(value: Value) -> Option<Box<Self>> {
        let _ = value;
        None
    }
}

/// A registered constructor for `T`.
pub type Constructor<T> = Arc<dyn Fn(&Node, &Context) -> Result<Box<T>> + Send + Sync>;

/// Maps abstract destination types to their constructors.
///
/// Lookups take a shared lock, registration an exclusive one, so a registry
/// may be filled while other threads decode with it.
pub struct TypeRegistry {
    // Each value is a `Constructor<T>` stored under `TypeId::of::<T>()`.
    constructors: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        TypeRegistry {
            constructors: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry used when the decode context names none.
    pub fn global() -> &'static TypeRegistry {
        static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();
        GLOBAL.get_or_init(TypeRegistry::new)
    }

    /// Registers the constructor of `T`.
    ///
    /// # Panics
    ///
    /// Panics if a constructor for `T` is already registered. Registration
    /// belongs to program setup; a clash is a programming error.
    pub fn register<T, F>(&self, constructor: F)
    where
        T: ?Sized + Abstract,
        F: Fn(&Node, &Context) -> Result<Box<T>> + Send + Sync + 'static,
    {
        let mut constructors = match self.constructors.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let id = TypeId::of::<T>();
        if constructors.contains_key(&id) {
            panic!("jtree: type `{}` is already registered", type_name::<T>());
        }
        tracing::debug!(ty = type_name::<T>(), "registered type constructor");
        let constructor: Constructor<T> = Arc::new(constructor);
        constructors.insert(id, Box::new(constructor));
    }

    /// Returns the constructor registered for `T`.
    pub fn lookup<T>(&self) -> Option<Constructor<T>>
    where
        T: ?Sized + Abstract,
    {
        let constructors = match self.constructors.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        constructors
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_ref::<Constructor<T>>())
            .cloned()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        TypeRegistry::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let len = match self.constructors.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        };
        f.debug_struct("TypeRegistry").field("len", &len).finish()
    }
}

/// A dynamic destination: a slot for some `T`, typically a trait object,
/// filled by the constructor registered for `T`.
///
/// Without a registered constructor the node is decoded into a [`Value`] and
/// handed to [`Abstract::from_value`].
pub struct Poly<T: ?Sized>(pub Option<Box<T>>);

impl<T: ?Sized> Poly<T> {
    /// Returns the decoded value, if any.
    pub fn get(&self) -> Option<&T> {
        self.0.as_deref()
    }

    /// Consumes the slot and returns its content.
    pub fn into_inner(self) -> Option<Box<T>> {
        self.0
    }
}

impl<T: ?Sized> Default for Poly<T> {
    fn default() -> Self {
        Poly(None)
    }
}

impl<T: ?Sized> From<Box<T>> for Poly<T> {
    fn from(value: Box<T>) -> Self {
        Poly(Some(value))
    }
}

/// Dereferences to the decoded value.
///
/// # Panics
///
/// Panics if the slot is empty, as it is after decoding `null`.
impl<T: ?Sized> Deref for Poly<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.0 {
            Some(value) => value,
            None => panic!("jtree: empty Poly<{}>", type_name::<T>()),
        }
    }
}

impl<T: ?Sized> DerefMut for Poly<T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.0 {
            Some(value) => value,
            None => panic!("jtree: empty Poly<{}>", type_name::<T>()),
        }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Poly<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Poly").field(&self.0).finish()
    }
}

impl<T> Decode for Poly<T>
where
    T: ?Sized + Abstract,
{
    fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()> {
        if let Some(constructor) = opts.ctx().types().lookup::<T>() {
            tracing::trace!(
                ty = type_name::<T>(),
                kind = node.kind(),
                "calling registered constructor"
            );
            self.0 = Some(tri!(constructor(node, opts.ctx())));
            return Ok(());
        }
        let value = tri!(Value::synthesize(node, opts));
        let from = value.type_name();
        match T::from_value(value) {
            Some(value) => {
                self.0 = Some(value);
                Ok(())
            }
            None => Err(Error::data(ErrorCode::IncompatibleTypes(
                from,
                type_name::<T>(),
            ))),
        }
    }

    fn set_null(&mut self) {
        self.0 = None;
    }
}
