//! Decode configuration.
//!
//! [`Options`] tune how a single node is converted and are rebuilt for each
//! level of the tree. The [`Context`] part they carry is call-wide policy and
//! reaches every nested decode unchanged.

use crate::encoding::{Encoding, EncodingRegistry};
use crate::error::{Error, ErrorCode, Result};
use crate::record::FieldOptions;
use crate::registry::TypeRegistry;
use std::fmt;
use std::sync::Arc;

/// Call-wide decode policy: the registries in effect and the unknown field
/// rule. It also carries the depth left at the node being decoded, so a
/// constructor that decodes through [`Options::context`] keeps counting from
/// where its caller was.
#[derive(Clone)]
pub struct Context {
    disallow_unknown_fields: bool,
    types: Option<Arc<TypeRegistry>>,
    encodings: Option<Arc<EncodingRegistry>>,
    remaining_depth: u8,
}

impl Default for Context {
    fn default() -> Self {
        Context {
            disallow_unknown_fields: false,
            types: None,
            encodings: None,
            remaining_depth: 128,
        }
    }
}

impl Context {
    /// Whether object keys without a matching record field are errors.
    pub fn disallows_unknown_fields(&self) -> bool {
        self.disallow_unknown_fields
    }

    /// The type registry in effect, [`TypeRegistry::global`] unless one was
    /// supplied.
    pub fn types(&self) -> &TypeRegistry {
        match &self.types {
            Some(types) => types,
            None => TypeRegistry::global(),
        }
    }

    /// The encoding registry in effect, [`EncodingRegistry::global`] unless
    /// one was supplied.
    pub fn encodings(&self) -> &EncodingRegistry {
        match &self.encodings {
            Some(encodings) => encodings,
            None => EncodingRegistry::global(),
        }
    }

    /// Nesting levels still allowed below the current node.
    pub fn remaining_depth(&self) -> u8 {
        self.remaining_depth
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Context")
            .field("disallow_unknown_fields", &self.disallow_unknown_fields)
            .field("types", &self.types.is_some())
            .field("encodings", &self.encodings.is_some())
            .field("remaining_depth", &self.remaining_depth)
            .finish()
    }
}

/// Options for one decode call.
///
/// Options are built left to right. Later calls overwrite the plain settings
/// of earlier ones, while [`elem`](Options::elem) adds to the element
/// options collected so far.
///
/// ```
/// use jtree::{Hex, Options};
///
/// let opts = Options::new()
///     .elem(|e| e.as_string())
///     .elem(|e| e.encoding(Hex))
///     .disallow_unknown_fields();
/// # let _ = opts;
/// ```
#[derive(Clone)]
pub struct Options {
    as_string: bool,
    encoding: Option<Arc<dyn Encoding>>,
    elem: Option<Box<Options>>,
    context: Context,
}

impl Options {
    /// Options with every setting off and the default registries.
    pub fn new() -> Self {
        Options {
            as_string: false,
            encoding: None,
            elem: None,
            context: Context::default(),
        }
    }

    /// Numbers are decoded to and from their text: a number node fills a
    /// string with its exact digits and a string node may fill a numeric or
    /// boolean destination. Byte buffers take the raw text, skipping the
    /// binary encoding.
    pub fn as_string(mut self) -> Self {
        self.as_string = true;
        self
    }

    /// Binary encoding for byte buffers filled from string nodes. Base64 is
    /// used when none is given.
    pub fn encoding<E>(mut self, encoding: E) -> Self
    where
        E: Encoding + 'static,
    {
        self.encoding = Some(Arc::new(encoding));
        self
    }

    /// Like [`encoding`](Options::encoding) for a shared scheme, such as one
    /// returned by [`EncodingRegistry::lookup`].
    pub fn shared_encoding(mut self, encoding: Arc<dyn Encoding>) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Options for the elements of a container, one level down only.
    pub fn elem<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Options) -> Options,
    {
        let elem = match self.elem.take() {
            Some(elem) => *elem,
            None => Options::new(),
        };
        self.elem = Some(Box::new(f(elem)));
        self
    }

    /// Type registry for the whole call.
    pub fn types(mut self, types: Arc<TypeRegistry>) -> Self {
        self.context.types = Some(types);
        self
    }

    /// Encoding registry for the whole call.
    pub fn encodings(mut self, encodings: Arc<EncodingRegistry>) -> Self {
        self.context.encodings = Some(encodings);
        self
    }

    /// Makes object keys that match no field of the destination record an
    /// error for the whole call.
    pub fn disallow_unknown_fields(mut self) -> Self {
        self.context.disallow_unknown_fields = true;
        self
    }

    /// Replaces the whole context, depth included. Constructors and custom
    /// decoders use this to pass on the context they were called with.
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Limits the nesting depth of the decode. A limit of `n` admits up to
    /// `n - 1` levels of nesting. The default is 128.
    pub fn recursion_limit(mut self, limit: u8) -> Self {
        self.context.remaining_depth = limit;
        self
    }

    /// Returns true if string mode is on.
    pub fn is_string(&self) -> bool {
        self.as_string
    }

    /// The explicit binary encoding, if any.
    pub fn encoding_scheme(&self) -> Option<&Arc<dyn Encoding>> {
        self.encoding.as_ref()
    }

    /// The call-wide policy.
    pub fn ctx(&self) -> &Context {
        &self.context
    }

    /// Options for a nested value: the element options (or none) with this
    /// call's context and one level less of depth.
    pub(crate) fn child(&self) -> Result<Options> {
        let remaining_depth = match self.context.remaining_depth.checked_sub(1) {
            Some(depth) if depth > 0 => depth,
            _ => return Err(Error::data(ErrorCode::RecursionLimitExceeded)),
        };
        let mut child = match &self.elem {
            Some(elem) => (**elem).clone(),
            None => Options::new(),
        };
        child.elem = None;
        child.context = self.context.clone();
        child.context.remaining_depth = remaining_depth;
        Ok(child)
    }

    /// Layers the options of a field tag on top. Encoding names resolve
    /// against the registry of this call's context.
    pub(crate) fn with_field(mut self, field: &FieldOptions) -> Self {
        let context = self.context.clone();
        self.apply_field(field, &context);
        self
    }

    fn apply_field(&mut self, field: &FieldOptions, context: &Context) {
        if field.is_string() {
            self.as_string = true;
        }
        if let Some(name) = field.encoding() {
            match context.encodings().lookup(name) {
                Some(encoding) => self.encoding = Some(encoding),
                None => tracing::trace!(name, "ignoring unknown encoding in field tag"),
            }
        }
        if let Some(elem) = field.elem() {
            let mut options = match self.elem.take() {
                Some(options) => *options,
                None => Options::new(),
            };
            options.apply_field(elem, context);
            self.elem = Some(Box::new(options));
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::new()
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Options")
            .field("as_string", &self.as_string)
            .field("encoding", &self.encoding.is_some())
            .field("elem", &self.elem)
            .field("context", &self.context)
            .finish()
    }
}
