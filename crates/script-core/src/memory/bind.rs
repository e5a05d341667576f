//! Named live properties over main memory (`bindvar`, `bindvars`,
//! `bindstruct`).

use crate::memory::access::{read_value, write_value};
use crate::memory::layout::StructLayout;
use crate::{MemoryHost, MemorySpace, PrimitiveType, Scalar, ScriptError, Value};

/// Address and type a bound property delegates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarBinding {
    /// Main-memory address of the property.
    pub address: u32,
    /// Primitive type used for every access.
    pub ty: PrimitiveType,
}

/// Object whose properties read and write main memory on every access.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoundObject {
    props: Vec<(String, VarBinding)>,
}

impl BoundObject {
    /// Creates an object with no bound properties.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binding behind `name`, if bound.
    #[must_use]
    pub fn binding(&self, name: &str) -> Option<VarBinding> {
        self.props
            .iter()
            .find_map(|(prop, binding)| (prop == name).then_some(*binding))
    }

    /// `true` when `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.binding(name).is_some()
    }

    /// Property names in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.props.iter().map(|(name, _)| name.as_str())
    }

    /// Number of bound properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.props.len()
    }

    /// `true` when nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Reads property `name` from memory.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnknownField`] when `name` is not bound, or the
    /// host failure.
    pub fn get<H: MemoryHost + ?Sized>(&self, host: &mut H, name: &str) -> Result<Value, ScriptError> {
        let binding = self.require(name)?;
        read_value(host, MemorySpace::Main, binding.address, binding.ty)
    }

    /// Reads property `name` narrowed to `T`.
    ///
    /// # Errors
    ///
    /// Same as [`BoundObject::get`].
    pub fn get_as<T: Scalar, H: MemoryHost + ?Sized>(
        &self,
        host: &mut H,
        name: &str,
    ) -> Result<T, ScriptError> {
        self.get(host, name).map(T::from_value)
    }

    /// Writes property `name` to memory.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnknownField`] when `name` is not bound, or the
    /// host failure.
    pub fn set<H: MemoryHost + ?Sized>(
        &self,
        host: &mut H,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<(), ScriptError> {
        let binding = self.require(name)?;
        write_value(host, MemorySpace::Main, binding.address, binding.ty, value.into())
    }

    fn require(&self, name: &str) -> Result<VarBinding, ScriptError> {
        self.binding(name)
            .ok_or_else(|| ScriptError::UnknownField(name.to_owned()))
    }

    fn define(&mut self, name: &str, binding: VarBinding) {
        self.props.push((name.to_owned(), binding));
    }
}

/// Defines property `name` on `target`, bound to `ty` at `address`.
///
/// # Errors
///
/// Returns [`ScriptError::PropertyRedefined`] when `target` already has a
/// property called `name`.
pub fn bindvar<'t>(
    target: &'t mut BoundObject,
    address: u32,
    name: &str,
    ty: PrimitiveType,
) -> Result<&'t mut BoundObject, ScriptError> {
    if target.contains(name) {
        return Err(ScriptError::PropertyRedefined(name.to_owned()));
    }
    target.define(name, VarBinding { address, ty });
    Ok(target)
}

/// Applies [`bindvar`] for each `(address, name, type)` entry.
///
/// Either every entry is bound or none is.
///
/// # Errors
///
/// Returns [`ScriptError::PropertyRedefined`] when a name is already bound
/// or appears twice in `list`.
pub fn bindvars<'t>(
    target: &'t mut BoundObject,
    list: &[(u32, &str, PrimitiveType)],
) -> Result<&'t mut BoundObject, ScriptError> {
    for (index, (_, name, _)) in list.iter().enumerate() {
        let repeated = list[..index].iter().any(|(_, earlier, _)| earlier == name);
        if repeated || target.contains(name) {
            return Err(ScriptError::PropertyRedefined((*name).to_owned()));
        }
    }
    for &(address, name, ty) in list {
        target.define(name, VarBinding { address, ty });
    }
    Ok(target)
}

/// Binds every field of `layout` onto `target` relative to `base`.
///
/// Either every field is bound or none is.
///
/// # Errors
///
/// Returns [`ScriptError::PropertyRedefined`] when `target` already has a
/// property named like one of the fields.
pub fn bindstruct<'t>(
    target: &'t mut BoundObject,
    base: u32,
    layout: &StructLayout,
) -> Result<&'t mut BoundObject, ScriptError> {
    if let Some(field) = layout
        .fields()
        .iter()
        .find(|field| target.contains(&field.descriptor.name))
    {
        return Err(ScriptError::PropertyRedefined(field.descriptor.name.clone()));
    }
    bind_layout(target, base, layout);
    Ok(target)
}

pub(crate) fn bind_layout(target: &mut BoundObject, base: u32, layout: &StructLayout) {
    for field in layout.fields() {
        target.define(
            &field.descriptor.name,
            VarBinding {
                address: base.wrapping_add(field.offset),
                ty: field.descriptor.ty,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{bindstruct, bindvar, bindvars, BoundObject};
    use crate::test_support::FakeHost;
    use crate::{FieldDescriptor, MemorySpace, PrimitiveType, ScriptError, StructLayout, Value};

    #[test]
    fn bindvar_delegates_to_typed_accessor() {
        let mut host = FakeHost::default();
        host.poke(MemorySpace::Main, 0x8033_B21E, &[0x00, 0x07]);

        let mut mario = BoundObject::new();
        bindvar(&mut mario, 0x8033_B21E, "lives", PrimitiveType::S16).unwrap();

        assert_eq!(mario.get(&mut host, "lives").unwrap(), Value::Int(7));
        mario.set(&mut host, "lives", 99_i16).unwrap();
        assert_eq!(host.peek(MemorySpace::Main, 0x8033_B21E, 2), vec![0x00, 0x63]);
    }

    #[test]
    fn bindvars_binds_unrelated_addresses() {
        let mut obj = BoundObject::new();
        bindvars(
            &mut obj,
            &[
                (0x8000_0010, "coins", PrimitiveType::U16),
                (0x8000_0400, "speed", PrimitiveType::Float),
            ],
        )
        .unwrap();

        assert_eq!(obj.binding("coins").unwrap().address, 0x8000_0010);
        assert_eq!(obj.binding("speed").unwrap().ty, PrimitiveType::Float);
        assert_eq!(obj.names().collect::<Vec<_>>(), vec!["coins", "speed"]);
    }

    #[test]
    fn bindvars_is_all_or_nothing() {
        let mut obj = BoundObject::new();
        let err = bindvars(
            &mut obj,
            &[
                (0x10, "a", PrimitiveType::U8),
                (0x20, "a", PrimitiveType::U8),
            ],
        )
        .unwrap_err();

        assert_eq!(err, ScriptError::PropertyRedefined("a".into()));
        assert!(obj.is_empty());
    }

    #[test]
    fn redefining_a_property_is_rejected() {
        let mut obj = BoundObject::new();
        bindvar(&mut obj, 0, "x", PrimitiveType::U8).unwrap();
        assert_eq!(
            bindvar(&mut obj, 4, "x", PrimitiveType::U32).unwrap_err(),
            ScriptError::PropertyRedefined("x".into())
        );
        assert_eq!(obj.binding("x").unwrap().address, 0);
    }

    #[test]
    fn bindstruct_places_fields_at_running_offsets() {
        let layout = StructLayout::new([
            FieldDescriptor::new("f1", PrimitiveType::U16),
            FieldDescriptor::new("f2", PrimitiveType::U32),
            FieldDescriptor::new("f3", PrimitiveType::U8),
        ])
        .unwrap();
        let mut obj = BoundObject::new();
        let bound = bindstruct(&mut obj, 0x1000, &layout).unwrap();

        assert_eq!(bound.binding("f1").unwrap().address, 0x1000);
        assert_eq!(bound.binding("f2").unwrap().address, 0x1002);
        assert_eq!(bound.binding("f3").unwrap().address, 0x1006);
    }

    #[test]
    fn bindstruct_extends_an_existing_object() {
        let layout = StructLayout::from_tags([("hp", "u8")]).unwrap();
        let mut obj = BoundObject::new();
        bindvar(&mut obj, 0x40, "id", PrimitiveType::U32).unwrap();
        bindstruct(&mut obj, 0x80, &layout).unwrap();

        assert_eq!(obj.len(), 2);
        assert_eq!(
            bindstruct(&mut obj, 0x90, &layout).unwrap_err(),
            ScriptError::PropertyRedefined("hp".into())
        );
        assert_eq!(obj.len(), 2);
    }

    #[test]
    fn unknown_field_access_issues_no_host_call() {
        let mut host = FakeHost::default();
        let obj = BoundObject::new();

        assert_eq!(
            obj.get(&mut host, "missing").unwrap_err(),
            ScriptError::UnknownField("missing".into())
        );
        assert!(host.calls.is_empty());
    }

    #[test]
    fn typed_property_reads_narrow_host_values() {
        let mut host = FakeHost::default();
        host.poke(MemorySpace::Main, 0x20, &[0xFF]);
        let mut obj = BoundObject::new();
        bindvar(&mut obj, 0x20, "flag", PrimitiveType::S8).unwrap();

        assert_eq!(obj.get_as::<i8, _>(&mut host, "flag").unwrap(), -1);
    }
}
