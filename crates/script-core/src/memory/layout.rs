//! Struct layouts: ordered primitive fields at contiguous, unpadded offsets.

use std::collections::HashSet;
use std::sync::Arc;

use crate::memory::bind::{bind_layout, BoundObject};
use crate::{PrimitiveType, ScriptError};

/// One `(name, type)` entry of a struct definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FieldDescriptor {
    /// Property name on bound objects.
    pub name: String,
    /// Primitive type of the field.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub ty: PrimitiveType,
}

impl FieldDescriptor {
    /// Creates a descriptor from an already validated type.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: PrimitiveType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// Creates a descriptor from a script type tag.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnrecognizedType`] when `tag` is not a
    /// registered primitive type.
    pub fn parse(name: impl Into<String>, tag: &str) -> Result<Self, ScriptError> {
        Ok(Self::new(name, PrimitiveType::from_tag(tag)?))
    }
}

/// A field placed at its byte offset inside a [`StructLayout`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutField {
    /// Field name and type.
    pub descriptor: FieldDescriptor,
    /// Byte offset from the struct base.
    pub offset: u32,
}

/// Ordered field list with precomputed offsets and total size.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructLayout {
    fields: Vec<LayoutField>,
    size: u32,
}

impl StructLayout {
    /// Lays out `fields` in declaration order with no padding.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::DuplicateField`] when a name repeats.
    pub fn new(fields: impl IntoIterator<Item = FieldDescriptor>) -> Result<Self, ScriptError> {
        let mut seen = HashSet::new();
        let mut placed = Vec::new();
        let mut offset = 0_u32;

        for descriptor in fields {
            if !seen.insert(descriptor.name.clone()) {
                return Err(ScriptError::DuplicateField(descriptor.name));
            }
            let width = descriptor.ty.byte_width();
            placed.push(LayoutField { descriptor, offset });
            offset += width;
        }

        Ok(Self {
            fields: placed,
            size: offset,
        })
    }

    /// Lays out `(name, tag)` pairs, validating every tag before anything is
    /// placed.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnrecognizedType`] for the first unknown tag, or
    /// [`ScriptError::DuplicateField`] when a name repeats.
    pub fn from_tags<'a>(
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ScriptError> {
        let descriptors = fields
            .into_iter()
            .map(|(name, tag)| FieldDescriptor::parse(name, tag))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(descriptors)
    }

    /// Total size in bytes (sum of all field widths).
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[LayoutField] {
        &self.fields
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&LayoutField> {
        self.fields.iter().find(|field| field.descriptor.name == name)
    }

    /// Byte offset of `name`, if present.
    #[must_use]
    pub fn offset_of(&self, name: &str) -> Option<u32> {
        self.field(name).map(|field| field.offset)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` when the layout has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Reusable struct definition produced by [`typedef`].
///
/// Instances are independent bound objects; only the layout is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructType {
    layout: Arc<StructLayout>,
}

impl StructType {
    /// Wraps an already validated layout.
    #[must_use]
    pub fn from_layout(layout: StructLayout) -> Self {
        Self {
            layout: Arc::new(layout),
        }
    }

    /// Total size of one instance in bytes.
    #[must_use]
    pub fn sizeof(&self) -> u32 {
        self.layout.size()
    }

    /// Shared layout.
    #[must_use]
    pub fn layout(&self) -> &StructLayout {
        &self.layout
    }

    /// Constructs a new object with every field bound relative to `base`.
    #[must_use]
    pub fn at(&self, base: u32) -> BoundObject {
        let mut object = BoundObject::new();
        bind_layout(&mut object, base, &self.layout);
        object
    }

    /// Element `index` of an array of this struct starting at `base`.
    #[must_use]
    pub fn element(&self, base: u32, index: u32) -> BoundObject {
        self.at(base.wrapping_add(index.wrapping_mul(self.sizeof())))
    }
}

/// Defines a reusable struct type from ordered field descriptors.
///
/// # Errors
///
/// Returns [`ScriptError::DuplicateField`] when a name repeats.
pub fn typedef(fields: impl IntoIterator<Item = FieldDescriptor>) -> Result<StructType, ScriptError> {
    StructLayout::new(fields).map(StructType::from_layout)
}
