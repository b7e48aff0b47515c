//! Decode a syntax tree into Rust data structures.
//!
//! Every destination implements [`Decode`]. The library implements it for
//! the primitive and standard collection types; records get it from the
//! [`record!`](crate::record!) macro; leaf types with their own JSON form
//! implement it by hand and receive the raw [`Node`].

use crate::base64;
use crate::error::{Error, ErrorCode, Result};
use crate::map::Map;
use crate::node::Node;
use crate::number::Number;
use crate::options::Options;
use crate::record::{EmbedInfo, Record};
use indexmap::IndexMap;
use num_bigint::BigInt;
use std::any::{type_name, Any};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::{BuildHasher, Hash};
use std::num::{IntErrorKind, ParseIntError};
use std::rc::Rc;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A destination that a [`Node`] can be decoded into.
///
/// Implementations convert a non-null node in
/// [`decode_node`](Decode::decode_node) and reset themselves in
/// [`set_null`](Decode::set_null). `null` never reaches `decode_node`: the
/// dispatcher in [`Node::decode_with`] handles it for every destination.
pub trait Decode {
    /// Converts a node which is not `null` into `self`.
    fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()>;

    /// Resets `self` to the zero value of its type: `None`, empty, zero or
    /// `false`.
    fn set_null(&mut self);

    /// Returns `self` as a record if it is one. Optional wrappers allocate
    /// their content and forward the call.
    fn as_record(&mut self) -> Option<&mut dyn Record> {
        None
    }

    /// Describes the record that a field of this type embeds, or `None` if
    /// the type is not a record.
    fn embed_info() -> Option<EmbedInfo>
    where
        Self: Sized,
    {
        None
    }
}

impl Node {
    /// Decodes this node into `dest` with default options.
    ///
    /// ```
    /// let node = jtree::parse_str("[1, 2.9, -3]").unwrap();
    /// let mut v: Vec<i32> = Vec::new();
    /// node.decode(&mut v).unwrap();
    /// assert_eq!(v, [1, 2, -3]);
    /// ```
    pub fn decode<T>(&self, dest: &mut T) -> Result<()>
    where
        T: ?Sized + Decode,
    {
        self.decode_with(dest, &Options::new())
    }

    /// Decodes this node into `dest`.
    ///
    /// A `null` node resets the destination whatever its type, so decoding
    /// `null` into an `i32` holding 123 leaves 0 and into a `Some` leaves
    /// `None`. Any other node is handed to [`Decode::decode_node`].
    pub fn decode_with<T>(&self, dest: &mut T, opts: &Options) -> Result<()>
    where
        T: ?Sized + Decode,
    {
        match self {
            Node::Null => {
                dest.set_null();
                Ok(())
            }
            node => dest.decode_node(node, opts),
        }
    }

    /// The error for a node whose kind the destination `ty` does not accept.
    #[cold]
    pub fn mismatch(&self, ty: &'static str) -> Error {
        Error::data(match self {
            Node::Number(_) => ErrorCode::CannotConvertNumber(ty),
            Node::String(_) => ErrorCode::CannotConvertString(ty),
            Node::Bool(_) => ErrorCode::CannotConvertBoolean(ty),
            Node::Object(_) => ErrorCode::StructOrMapExpected(ty),
            Node::Array(_) => ErrorCode::SequenceExpected(ty),
            Node::Null => ErrorCode::IncompatibleTypes("null", ty),
        })
    }
}

//////////////////////////////////////////////////////////////////////////////

fn parse_int<T>(text: &str, ty: &'static str) -> Result<T>
where
    T: FromStr<Err = ParseIntError>,
{
    text.parse().map_err(|err: ParseIntError| match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            Error::data(ErrorCode::NumberOutOfRange(ty))
        }
        _ => Error::data(ErrorCode::InvalidNumberText(text.into())),
    })
}

// Numbers are truncated toward zero and saturated to 64 bits (128 for the
// 128-bit types); narrower types keep the low bits of that.
macro_rules! impl_decode_int {
    ($($ty:ident)* => $wide:ident) => {
        $(
            impl Decode for $ty {
                fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()> {
                    *self = match node {
                        Node::Number(n) => n.$wide() as $ty,
                        Node::Bool(b) => *b as $ty,
                        Node::String(s) if opts.is_string() => {
                            tri!(parse_int::<$ty>(s, stringify!($ty)))
                        }
                        _ => return Err(node.mismatch(stringify!($ty))),
                    };
                    Ok(())
                }

                fn set_null(&mut self) {
                    *self = 0;
                }
            }
        )*
    };
}

impl_decode_int!(i8 i16 i32 i64 isize => to_i64_saturating);
impl_decode_int!(u8 u16 u32 u64 usize => to_u64_saturating);
impl_decode_int!(i128 => to_i128_saturating);
impl_decode_int!(u128 => to_u128_saturating);

macro_rules! impl_decode_float {
    ($($ty:ident => $conv:ident)*) => {
        $(
            impl Decode for $ty {
                fn decode_node(&mut self, node: &Node, _opts: &Options) -> Result<()> {
                    *self = match node {
                        Node::Number(n) => n.$conv(),
                        Node::Bool(b) => u8::from(*b) as $ty,
                        _ => return Err(node.mismatch(stringify!($ty))),
                    };
                    Ok(())
                }

                fn set_null(&mut self) {
                    *self = 0.0;
                }
            }
        )*
    };
}

impl_decode_float! {
    f32 => to_f32
    f64 => to_f64
}

impl Decode for bool {
    fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()> {
        *self = match node {
            Node::Bool(b) => *b,
            Node::Number(n) => !n.is_zero(),
            Node::String(s) if opts.is_string() => match s.as_str() {
                "true" => true,
                "false" => false,
                _ => return Err(Error::data(ErrorCode::InvalidBoolText(s.as_str().into()))),
            },
            _ => return Err(node.mismatch("bool")),
        };
        Ok(())
    }

    fn set_null(&mut self) {
        *self = false;
    }
}

impl Decode for String {
    /// Strings are copied, or decoded with the explicit encoding and checked
    /// to be UTF-8. Numbers render in their canonical form and booleans as
    /// `true` or `false`.
    fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()> {
        *self = match node {
            Node::String(s) => match opts.encoding_scheme() {
                Some(encoding) => {
                    let bytes = tri!(encoding.decode(s).map_err(Error::encoding));
                    tri!(String::from_utf8(bytes).map_err(Error::encoding))
                }
                None => s.clone(),
            },
            Node::Number(n) => n.to_string(),
            Node::Bool(b) => b.to_string(),
            _ => return Err(node.mismatch("String")),
        };
        Ok(())
    }

    fn set_null(&mut self) {
        self.clear();
    }
}

impl Decode for BigInt {
    fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()> {
        *self = match node {
            Node::Number(n) => match n.to_bigint() {
                Some(i) => i,
                None => return Err(Error::data(ErrorCode::NumberOutOfRange("BigInt"))),
            },
            Node::String(s) if opts.is_string() => match s.parse() {
                Ok(i) => i,
                Err(_) => return Err(Error::data(ErrorCode::InvalidNumberText(s.as_str().into()))),
            },
            _ => return Err(node.mismatch("BigInt")),
        };
        Ok(())
    }

    fn set_null(&mut self) {
        *self = BigInt::default();
    }
}

impl Decode for Number {
    fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()> {
        *self = match node {
            Node::Number(n) => n.clone(),
            Node::String(s) if opts.is_string() => tri!(s.parse()),
            _ => return Err(node.mismatch("Number")),
        };
        Ok(())
    }

    fn set_null(&mut self) {
        *self = Number::default();
    }
}

/// Numbers are seconds since the Unix epoch; the fractional part is dropped.
impl Decode for SystemTime {
    fn decode_node(&mut self, node: &Node, _opts: &Options) -> Result<()> {
        let n = match node {
            Node::Number(n) => n,
            _ => return Err(node.mismatch("SystemTime")),
        };
        let secs = n.to_i128_saturating();
        let time = if secs >= 0 {
            u64::try_from(secs)
                .ok()
                .and_then(|secs| UNIX_EPOCH.checked_add(Duration::from_secs(secs)))
        } else {
            u64::try_from(secs.unsigned_abs())
                .ok()
                .and_then(|secs| UNIX_EPOCH.checked_sub(Duration::from_secs(secs)))
        };
        match time {
            Some(time) => {
                *self = time;
                Ok(())
            }
            None => Err(Error::data(ErrorCode::NumberOutOfRange("SystemTime"))),
        }
    }

    fn set_null(&mut self) {
        *self = UNIX_EPOCH;
    }
}

/// Stores a copy of the node itself.
impl Decode for Node {
    fn decode_node(&mut self, node: &Node, _opts: &Options) -> Result<()> {
        *self = node.clone();
        Ok(())
    }

    fn set_null(&mut self) {
        *self = Node::Null;
    }
}

//////////////////////////////////////////////////////////////////////////////

impl<T> Decode for Option<T>
where
    T: Decode + Default,
{
    fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()> {
        self.get_or_insert_with(T::default).decode_node(node, opts)
    }

    fn set_null(&mut self) {
        *self = None;
    }

    fn as_record(&mut self) -> Option<&mut dyn Record> {
        self.get_or_insert_with(T::default).as_record()
    }

    fn embed_info() -> Option<EmbedInfo> {
        T::embed_info().map(EmbedInfo::by_pointer)
    }
}

impl<T> Decode for Box<T>
where
    T: Decode,
{
    fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()> {
        (**self).decode_node(node, opts)
    }

    fn set_null(&mut self) {
        (**self).set_null();
    }

    fn as_record(&mut self) -> Option<&mut dyn Record> {
        (**self).as_record()
    }

    fn embed_info() -> Option<EmbedInfo> {
        T::embed_info().map(EmbedInfo::by_pointer)
    }
}

//////////////////////////////////////////////////////////////////////////////

fn decode_bytes(text: &str, opts: &Options) -> Result<Vec<u8>> {
    match opts.encoding_scheme() {
        Some(encoding) => encoding.decode(text).map_err(Error::encoding),
        None if opts.is_string() => Ok(text.as_bytes().to_vec()),
        None => base64::decode(text).map_err(Error::encoding),
    }
}

fn decode_elements<'a, T, I>(elems: I, opts: &Options) -> Result<Vec<T>>
where
    T: Decode + Default,
    I: ExactSizeIterator<Item = &'a Node>,
{
    let child = tri!(opts.child());
    let mut out = Vec::with_capacity(elems.len());
    for elem in elems {
        let mut value = T::default();
        tri!(elem.decode_with(&mut value, &child));
        out.push(value);
    }
    Ok(out)
}

/// An array node fills the vector with one element per node. A string node
/// is accepted by `Vec<u8>` only and holds the bytes in a binary encoding,
/// Base64 unless the options name another or ask for the raw text.
impl<T> Decode for Vec<T>
where
    T: Decode + Default + 'static,
{
    fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()> {
        match node {
            Node::Array(array) => {
                *self = tri!(decode_elements(array.iter(), opts));
                Ok(())
            }
            Node::String(s) => match (self as &mut dyn Any).downcast_mut::<Vec<u8>>() {
                Some(bytes) => {
                    *bytes = tri!(decode_bytes(s, opts));
                    Ok(())
                }
                None => Err(node.mismatch(type_name::<Self>())),
            },
            _ => Err(node.mismatch(type_name::<Self>())),
        }
    }

    fn set_null(&mut self) {
        self.clear();
    }
}

impl<T> Decode for VecDeque<T>
where
    T: Decode + Default,
{
    fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()> {
        match node {
            Node::Array(array) => {
                *self = tri!(decode_elements(array.iter(), opts)).into();
                Ok(())
            }
            _ => Err(node.mismatch(type_name::<Self>())),
        }
    }

    fn set_null(&mut self) {
        self.clear();
    }
}

/// Elements beyond the length of the array are ignored; elements without a
/// counterpart in the node keep their value.
impl<T, const N: usize> Decode for [T; N]
where
    T: Decode,
{
    fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()> {
        match node {
            Node::Array(array) => {
                let child = tri!(opts.child());
                for (slot, elem) in self.iter_mut().zip(array) {
                    tri!(elem.decode_with(slot, &child));
                }
                Ok(())
            }
            _ => Err(node.mismatch(type_name::<Self>())),
        }
    }

    fn set_null(&mut self) {
        for slot in self {
            slot.set_null();
        }
    }
}

//////////////////////////////////////////////////////////////////////////////

/// A textual map key. Object keys are always strings, so maps with any other
/// key type cannot be decoded.
pub trait MapKey: Sized {
    /// Builds the key from an object key.
    fn from_key(key: &str) -> Self;
}

impl MapKey for String {
    fn from_key(key: &str) -> Self {
        key.to_owned()
    }
}

impl MapKey for Box<str> {
    fn from_key(key: &str) -> Self {
        key.into()
    }
}

impl MapKey for Rc<str> {
    fn from_key(key: &str) -> Self {
        key.into()
    }
}

impl MapKey for Arc<str> {
    fn from_key(key: &str) -> Self {
        key.into()
    }
}

fn decode_entries<K, V, M>(node: &Node, opts: &Options, map: &mut M) -> Result<()>
where
    K: MapKey,
    V: Decode + Default,
    M: Default + Extend<(K, V)> + 'static,
{
    let object = match node {
        Node::Object(object) => object,
        _ => return Err(node.mismatch(type_name::<M>())),
    };
    let child = tri!(opts.child());
    let mut out = M::default();
    for (key, elem) in object {
        let mut value = V::default();
        tri!(elem.decode_with(&mut value, &child));
        out.extend(Some((K::from_key(key), value)));
    }
    *map = out;
    Ok(())
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: MapKey + Eq + Hash + 'static,
    V: Decode + Default + 'static,
    S: BuildHasher + Default + 'static,
{
    fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()> {
        decode_entries(node, opts, self)
    }

    fn set_null(&mut self) {
        self.clear();
    }
}

impl<K, V> Decode for BTreeMap<K, V>
where
    K: MapKey + Ord + 'static,
    V: Decode + Default + 'static,
{
    fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()> {
        decode_entries(node, opts, self)
    }

    fn set_null(&mut self) {
        self.clear();
    }
}

impl<K, V, S> Decode for IndexMap<K, V, S>
where
    K: MapKey + Eq + Hash + 'static,
    V: Decode + Default + 'static,
    S: BuildHasher + Default + 'static,
{
    fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()> {
        decode_entries(node, opts, self)
    }

    fn set_null(&mut self) {
        self.clear();
    }
}

impl<K, V> Decode for Map<K, V>
where
    K: MapKey + Eq + Hash + 'static,
    V: Decode + Default + 'static,
{
    fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()> {
        decode_entries(node, opts, self)
    }

    fn set_null(&mut self) {
        self.clear();
    }
}

//////////////////////////////////////////////////////////////////////////////

/// Implements [`Decode`] for a type with a textual JSON form through its
/// `FromStr` implementation. String nodes are parsed, parse errors are
/// wrapped as custom errors, and every other node kind is rejected.
///
/// The zero value defaults to `Default::default()`; types without a
/// `Default` implementation name one explicitly.
///
/// ```
/// use std::str::FromStr;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Version(u32, u32);
///
/// impl FromStr for Version {
///     type Err = std::num::ParseIntError;
///
///     fn from_str(s: &str) -> Result<Self, Self::Err> {
///         let (major, minor) = s.split_once('.').unwrap_or((s, "0"));
///         Ok(Version(major.parse()?, minor.parse()?))
///     }
/// }
///
/// jtree::impl_decode_from_str!(Version);
///
/// let mut v = Version::default();
/// jtree::parse_str(r#""1.12""#).unwrap().decode(&mut v).unwrap();
/// assert_eq!(v, Version(1, 12));
/// ```
#[macro_export]
macro_rules! impl_decode_from_str {
    ($ty:ty) => {
        $crate::impl_decode_from_str!($ty, ::std::default::Default::default());
    };
    ($ty:ty, $zero:expr) => {
        impl $crate::Decode for $ty {
            fn decode_node(
                &mut self,
                node: &$crate::Node,
                _opts: &$crate::Options,
            ) -> $crate::Result<()> {
                match node {
                    $crate::Node::String(s) => match s.parse::<$ty>() {
                        ::std::result::Result::Ok(value) => {
                            *self = value;
                            ::std::result::Result::Ok(())
                        }
                        ::std::result::Result::Err(err) => {
                            ::std::result::Result::Err($crate::Error::custom(err))
                        }
                    },
                    _ => ::std::result::Result::Err(node.mismatch(stringify!($ty))),
                }
            }

            fn set_null(&mut self) {
                *self = $zero;
            }
        }
    };
}

impl_decode_from_str!(std::net::IpAddr, std::net::Ipv4Addr::UNSPECIFIED.into());
impl_decode_from_str!(std::net::Ipv4Addr, std::net::Ipv4Addr::UNSPECIFIED);
impl_decode_from_str!(std::net::Ipv6Addr, std::net::Ipv6Addr::UNSPECIFIED);
impl_decode_from_str!(
    std::net::SocketAddr,
    (std::net::Ipv4Addr::UNSPECIFIED, 0).into()
);
impl_decode_from_str!(std::path::PathBuf);
