//! Records: destinations with named fields.
//!
//! A record describes its fields once, with [`Record::fields`], and hands out
//! access to them by position, with [`Record::field_mut`]. From the
//! description the decoder derives a table from JSON key to field, flattening
//! embedded records along the way. The [`record!`](crate::record!) macro
//! writes both methods.
//!
//! # Field tags
//!
//! A tag has the form `name,opt,...`. An empty `name` keeps the field name
//! and `-` hides the field. The options are `string`, which turns on string
//! mode, and the name of a registered encoding. An option in brackets, such
//! as `[hex]`, applies to the elements of the field instead of the field
//! itself.
//!
//! # Embedding
//!
//! A field marked as embedded whose type is a record, or an `Option` or
//! `Box` of one, contributes the fields of that record as if they were
//! declared in place. When two fields end up with the same name the one
//! nested less deeply wins, and among equally deep ones the first declared.

use crate::de::Decode;
use crate::error::{Error, ErrorCode, Result};
use crate::node::Node;
use crate::options::Options;
use indexmap::IndexMap;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

/// A destination with named fields.
pub trait Record: Decode {
    /// Describes the fields in declaration order.
    fn fields() -> Vec<FieldDef>
    where
        Self: Sized;

    /// Returns the field at `index` in the order of [`fields`](Record::fields).
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Decode>;
}

/// The declaration of one record field.
#[derive(Clone)]
pub struct FieldDef {
    name: &'static str,
    tag: &'static str,
    public: bool,
    embedded: bool,
    embed_info: fn() -> Option<EmbedInfo>,
}

impl FieldDef {
    /// A public, untagged field of type `T`.
    pub fn of<T: Decode>(name: &'static str) -> Self {
        FieldDef {
            name,
            tag: "",
            public: true,
            embedded: false,
            embed_info: T::embed_info,
        }
    }

    /// Like [`of`](FieldDef::of), with `T` taken from a field accessor.
    pub fn of_field<R, T: Decode>(name: &'static str, _field: fn(&mut R) -> &mut T) -> Self {
        FieldDef::of::<T>(name)
    }

    /// Sets the field tag.
    pub fn tag(mut self, tag: &'static str) -> Self {
        self.tag = tag;
        self
    }

    /// Marks the field as private. Private fields are never decoded.
    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    /// Marks the field as embedded.
    pub fn embed(mut self) -> Self {
        self.embedded = true;
        self
    }
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("public", &self.public)
            .field("embedded", &self.embedded)
            .finish()
    }
}

/// What the field table needs to know about an embeddable record type.
#[derive(Clone, Copy)]
pub struct EmbedInfo {
    type_id: TypeId,
    type_name: &'static str,
    pointer: bool,
    fields: fn() -> Vec<FieldDef>,
}

impl EmbedInfo {
    /// Describes the record `R`.
    pub fn of<R: Record + 'static>() -> Self {
        EmbedInfo {
            type_id: TypeId::of::<R>(),
            type_name: type_name::<R>(),
            pointer: false,
            fields: R::fields,
        }
    }

    /// The same record reached through an `Option` or a `Box`.
    pub fn by_pointer(self) -> Self {
        EmbedInfo {
            pointer: true,
            ..self
        }
    }
}

/// Field options parsed from a tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldOptions {
    as_string: bool,
    encoding: Option<String>,
    elem: Option<Box<FieldOptions>>,
}

impl FieldOptions {
    /// Returns true if the tag asks for string mode.
    pub fn is_string(&self) -> bool {
        self.as_string
    }

    /// The encoding named by the tag. Names unknown to the encoding registry
    /// in effect are ignored when decoding.
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// Options in brackets, for the elements of the field.
    pub fn elem(&self) -> Option<&FieldOptions> {
        self.elem.as_deref()
    }

    fn set(&mut self, opt: &str) {
        if opt == "string" {
            self.as_string = true;
        } else {
            self.encoding = Some(opt.to_owned());
        }
    }
}

/// Splits a tag into the external name and its options.
fn parse_tag(tag: &str) -> (&str, FieldOptions) {
    let mut parts = tag.split(',');
    let name = parts.next().unwrap_or("");
    let mut options = FieldOptions::default();
    for opt in parts {
        if opt.is_empty() {
            continue;
        }
        match opt.strip_prefix('[') {
            Some(rest) => match rest.strip_suffix(']') {
                Some(inner) if !inner.is_empty() => options
                    .elem
                    .get_or_insert_with(Default::default)
                    .set(inner),
                _ => continue,
            },
            None => options.set(opt),
        }
    }
    (name, options)
}

/// A field as seen from JSON: its external name and where it lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructField {
    name: String,
    path: Vec<usize>,
    options: FieldOptions,
}

impl StructField {
    /// The key that selects this field.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field positions from the outer record down to this field, one per
    /// level of embedding.
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    /// Options from the field tag.
    pub fn options(&self) -> &FieldOptions {
        &self.options
    }
}

type FieldTable = IndexMap<String, StructField>;

fn collect_fields(
    fields: &[FieldDef],
    prefix: &[usize],
    pointers: &mut Vec<TypeId>,
    out: &mut FieldTable,
) {
    for (index, def) in fields.iter().enumerate() {
        let (name, options) = parse_tag(def.tag);
        if name == "-" || !def.public {
            continue;
        }
        let mut path = prefix.to_vec();
        path.push(index);

        if name.is_empty() && def.embedded {
            if let Some(info) = (def.embed_info)() {
                if info.pointer {
                    if pointers.contains(&info.type_id) {
                        tracing::warn!(
                            ty = info.type_name,
                            field = def.name,
                            "embedding cycle detected, skipping field"
                        );
                        continue;
                    }
                    pointers.push(info.type_id);
                    collect_fields(&(info.fields)(), &path, pointers, out);
                    pointers.pop();
                } else {
                    collect_fields(&(info.fields)(), &path, pointers, out);
                }
                continue;
            }
        }

        let name = if name.is_empty() { def.name } else { name };
        if let Some(prev) = out.get(name) {
            if prev.path.len() <= path.len() {
                continue;
            }
        }
        out.insert(
            name.to_owned(),
            StructField {
                name: name.to_owned(),
                path,
                options,
            },
        );
    }
}

fn field_table<R: Record + 'static>() -> Arc<FieldTable> {
    static CACHE: OnceLock<RwLock<HashMap<TypeId, Arc<FieldTable>>>> = OnceLock::new();
    let cache = CACHE.get_or_init(Default::default);
    let id = TypeId::of::<R>();

    let cached = match cache.read() {
        Ok(guard) => guard.get(&id).cloned(),
        Err(poisoned) => poisoned.into_inner().get(&id).cloned(),
    };
    if let Some(table) = cached {
        return table;
    }

    let mut table = FieldTable::new();
    collect_fields(&R::fields(), &[], &mut Vec::new(), &mut table);
    tracing::debug!(ty = type_name::<R>(), fields = table.len(), "computed field table");
    let table = Arc::new(table);
    let mut guard = match cache.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard.entry(id).or_insert(table).clone()
}

/// Returns the fields of `R` that object keys can select, after tags,
/// embedding and name conflicts are resolved.
///
/// ```
/// #[derive(Default)]
/// pub struct Point {
///     pub x: f64,
///     pub y: f64,
///     cache: Option<f64>,
/// }
///
/// jtree::record! {
///     Point {
///         #[tag = "X"] pub x,
///         pub y,
///         cache,
///     }
/// }
///
/// let fields = jtree::visible_fields::<Point>();
/// let names: Vec<&str> = fields.iter().map(|f| f.name()).collect();
/// assert_eq!(names, ["X", "y"]);
/// ```
pub fn visible_fields<R: Record + 'static>() -> Vec<StructField> {
    field_table::<R>().values().cloned().collect()
}

/// Decodes an object node into the record `rec`. This is the
/// [`Decode::decode_node`] of every record.
pub fn decode_record<R>(rec: &mut R, node: &Node, opts: &Options) -> Result<()>
where
    R: Record + 'static,
{
    let object = match node {
        Node::Object(object) => object,
        _ => return Err(node.mismatch(type_name::<R>())),
    };
    let table = field_table::<R>();
    let child = tri!(opts.child());

    'keys: for (key, elem) in object {
        let field = match table.get(key.as_str()) {
            Some(field) => field,
            None if opts.ctx().disallows_unknown_fields() => {
                return Err(Error::data(ErrorCode::UndefinedField(
                    key.as_str().into(),
                    type_name::<R>(),
                )));
            }
            None => continue,
        };

        let (last, embedded) = match field.path.split_last() {
            Some(split) => split,
            None => continue,
        };
        let mut dest: &mut dyn Record = &mut *rec;
        for &index in embedded {
            let outer = dest;
            dest = match outer.field_mut(index).and_then(|field| field.as_record()) {
                Some(inner) => inner,
                None => continue 'keys,
            };
        }
        let slot = match dest.field_mut(*last) {
            Some(slot) => slot,
            None => continue,
        };
        let field_opts = child.clone().with_field(&field.options);
        tri!(elem.decode_with(slot, &field_opts));
    }
    Ok(())
}

/// Implements [`Record`] and [`Decode`] for a struct.
///
/// The struct must implement `Default`, which is its zero value. List the
/// fields in declaration order with their visibility; only `pub` fields are
/// decoded. A field may carry `#[tag = "..."]` (see the
/// [module documentation](crate::record) for the syntax) and `#[embed]`.
///
/// ```
/// #[derive(Debug, Default, PartialEq)]
/// pub struct Meta {
///     pub id: u64,
/// }
///
/// #[derive(Debug, Default, PartialEq)]
/// pub struct Disk {
///     pub meta: Meta,
///     pub size: u64,
///     pub blob: Vec<u8>,
/// }
///
/// jtree::record! {
///     Meta { pub id }
/// }
///
/// jtree::record! {
///     Disk {
///         #[embed] pub meta,
///         #[tag = ",string"] pub size,
///         #[tag = "data,hex"] pub blob,
///     }
/// }
///
/// let node = jtree::parse_str(r#"{"id": 7, "size": "1024", "data": "cafe"}"#).unwrap();
/// let mut disk = Disk::default();
/// node.decode(&mut disk).unwrap();
/// assert_eq!(disk.meta.id, 7);
/// assert_eq!(disk.size, 1024);
/// assert_eq!(disk.blob, [0xca, 0xfe]);
/// ```
#[macro_export]
macro_rules! record {
    (@attr $def:ident, embed) => {
        $def = $def.embed();
    };
    (@attr $def:ident, tag = $tag:literal) => {
        $def = $def.tag($tag);
    };
    (
        $name:ident {
            $( $(#[$attr:ident $(= $value:literal)?])* $vis:vis $field:ident ),* $(,)?
        }
    ) => {
        impl $crate::Record for $name {
            fn fields() -> ::std::vec::Vec<$crate::FieldDef> {
                let mut fields = ::std::vec::Vec::new();
                $(
                    #[allow(unused_mut)]
                    let mut def = $crate::FieldDef::of_field(
                        stringify!($field),
                        |rec: &mut $name| &mut rec.$field,
                    );
                    if stringify!($vis).is_empty() {
                        def = def.private();
                    }
                    $( $crate::record!(@attr def, $attr $(= $value)?); )*
                    fields.push(def);
                )*
                fields
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field_mut(
                &mut self,
                index: usize,
            ) -> ::std::option::Option<&mut dyn $crate::Decode> {
                let mut i = 0usize;
                $(
                    if index == i {
                        return ::std::option::Option::Some(&mut self.$field as &mut dyn $crate::Decode);
                    }
                    i += 1;
                )*
                ::std::option::Option::None
            }
        }

        impl $crate::Decode for $name {
            fn decode_node(
                &mut self,
                node: &$crate::Node,
                opts: &$crate::Options,
            ) -> $crate::Result<()> {
                $crate::decode_record(self, node, opts)
            }

            fn set_null(&mut self) {
                *self = ::std::default::Default::default();
            }

            fn as_record(&mut self) -> ::std::option::Option<&mut dyn $crate::Record> {
                ::std::option::Option::Some(self)
            }

            fn embed_info() -> ::std::option::Option<$crate::EmbedInfo> {
                ::std::option::Option::Some($crate::EmbedInfo::of::<Self>())
            }
        }
    };
}
