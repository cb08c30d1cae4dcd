//! Static type descriptions.
//!
//! The mapper never looks at values, only at the shape of a type. That shape
//! is described by a [`TypeDescriptor`], obtained through [`Mappable`]:
//! implemented here for primitives, std collections and chrono timestamps,
//! and for user records through [`mappable_record!`](crate::mappable_record).
//! Catalog files describe records at run time, see [`catalog`].
pub mod catalog;
mod impls;

use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

// ------------------------------- Trait ----------------------------------- //

pub trait Mappable {
    fn type_descriptor() -> TypeDescriptor;
}

// ------------------------------- Types ----------------------------------- //

/// Closed set of type categories the mapper dispatches on.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    Record(RecordDescriptor),
    /// Arrays, slices, vectors, sets: anything holding many values of one type.
    Sequence(Box<TypeDescriptor>),
    /// Signed or unsigned, any width.
    Integer,
    /// Any width.
    Float,
    String,
    Boolean,
    /// Pointer-like types. Named after the full type.
    Reference(String),
    Unknown(String),
}

type FieldsFn = dyn Fn() -> Vec<FieldDescriptor> + Send + Sync;

/// A record type. Fields are produced on demand, which is what allows a
/// record to mention itself (e.g. through `Vec<Self>`) without the
/// description itself recursing forever.
#[derive(Clone)]
pub struct RecordDescriptor {
    key: RecordKey,
    type_name: String,
    timestamp: bool,
    fields: Arc<FieldsFn>,
}

/// Identity of a record type, used to detect cycles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    /// A compiled Rust type.
    Type(TypeId),
    /// A record known only by name, e.g. from a catalog where names are unique.
    Name(String),
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    ty: TypeDescriptor,
    tag: String,
}

// ---------------------------- Implementation ------------------------------ //

impl TypeDescriptor {
    pub fn of<T: Mappable + ?Sized>() -> Self {
        T::type_descriptor()
    }

    /// Descriptor of the static type of `value`. The value itself is unused.
    pub fn of_val<T: Mappable + ?Sized>(_value: &T) -> Self {
        T::type_descriptor()
    }

    pub fn sequence(element: TypeDescriptor) -> Self {
        Self::Sequence(Box::new(element))
    }

    pub fn is_timestamp(&self) -> bool {
        matches!(self, Self::Record(record) if record.is_timestamp())
    }

    pub fn as_record(&self) -> Option<&RecordDescriptor> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Human readable name used in diagnostics and errors.
    pub fn type_name(&self) -> String {
        match self {
            Self::Record(record) => record.type_name().to_owned(),
            Self::Sequence(element) => format!("[{}]", element.type_name()),
            Self::Integer => "integer".to_owned(),
            Self::Float => "float".to_owned(),
            Self::String => "string".to_owned(),
            Self::Boolean => "boolean".to_owned(),
            Self::Reference(name) | Self::Unknown(name) => name.clone(),
        }
    }
}

impl RecordDescriptor {
    /// A record identified by its name. Two descriptors with the same name
    /// are treated as the same record.
    pub fn new<F>(type_name: impl Into<String>, fields: F) -> Self
    where
        F: Fn() -> Vec<FieldDescriptor> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        Self {
            key: RecordKey::Name(type_name.clone()),
            type_name,
            timestamp: false,
            fields: Arc::new(fields),
        }
    }

    /// The record of the Rust type `T`, identified by its `TypeId`.
    pub fn for_type<T, F>(fields: F) -> Self
    where
        T: ?Sized + 'static,
        F: Fn() -> Vec<FieldDescriptor> + Send + Sync + 'static,
    {
        Self {
            key: RecordKey::Type(TypeId::of::<T>()),
            type_name: type_name::<T>().to_owned(),
            timestamp: false,
            fields: Arc::new(fields),
        }
    }

    /// The well-known timestamp record. Mapped as a single `date`, never
    /// expanded field by field.
    pub fn timestamp(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            key: RecordKey::Name(type_name.clone()),
            type_name,
            timestamp: true,
            fields: Arc::new(Vec::<FieldDescriptor>::new),
        }
    }

    /// Display name for diagnostics and errors. For compiled types this is
    /// [`std::any::type_name`], which is not guaranteed to be unique; compare
    /// [`RecordDescriptor::key`] to tell records apart.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    pub fn is_timestamp(&self) -> bool {
        self.timestamp
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> Vec<FieldDescriptor> {
        (self.fields)()
    }
}

impl fmt::Debug for RecordDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDescriptor")
            .field("key", &self.key)
            .field("type_name", &self.type_name)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            tag: tag.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// Raw annotation string, unparsed.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

// ------------------------------- Macro ----------------------------------- //

/// Implement [`Mappable`] for one or more existing record types.
///
/// Each field is listed with its type and an optional annotation after `=>`.
/// Field names become mapping keys as written.
///
/// ```
/// use elastic_mapping::mappable_record;
///
/// struct Article { title: String, views: u64, tags: Vec<String> }
///
/// mappable_record! {
///     Article {
///         title: String => "text",
///         views: u64,
///         tags: Vec<String>,
///     }
/// }
/// ```
#[macro_export]
macro_rules! mappable_record {
    ($($record:ty { $($field:ident : $ty:ty $(=> $tag:literal)?),* $(,)? })+) => {
        $(
            impl $crate::descriptor::Mappable for $record {
                fn type_descriptor() -> $crate::descriptor::TypeDescriptor {
                    $crate::descriptor::TypeDescriptor::Record(
                        $crate::descriptor::RecordDescriptor::for_type::<$record, _>(
                            || ::std::vec![
                                $(
                                    $crate::descriptor::FieldDescriptor::new(
                                        ::std::stringify!($field),
                                        <$ty as $crate::descriptor::Mappable>::type_descriptor(),
                                        ::std::concat!("" $(, $tag)?),
                                    )
                                ),*
                            ],
                        ),
                    )
                }
            }
        )+
    };
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    struct Tagged {
        a: String,
        b: i64,
        children: Vec<Tagged>,
    }

    crate::mappable_record! {
        Tagged {
            a: String => "text, hello",
            b: i64,
            children: Vec<Tagged>,
        }
    }

    #[test]
    fn macro_lists_fields_in_order_with_tags() {
        let ty = TypeDescriptor::of::<Tagged>();
        let record = ty.as_record().unwrap();
        assert!(record.type_name().ends_with("Tagged"));
        let fields = record.fields();
        let names: Vec<_> = fields.iter().map(FieldDescriptor::name).collect();
        assert_eq!(names, ["a", "b", "children"]);
        assert_eq!(fields[0].tag(), "text, hello");
        assert_eq!(fields[1].tag(), "");
        assert!(matches!(fields[1].ty(), TypeDescriptor::Integer));
    }

    #[test]
    fn self_reference_is_described_lazily() {
        let fields = TypeDescriptor::of::<Tagged>().as_record().unwrap().fields();
        let TypeDescriptor::Sequence(element) = fields[2].ty() else {
            panic!("children should be a sequence");
        };
        let inner = element.as_record().unwrap();
        assert_eq!(inner.fields().len(), 3);
    }

    #[test]
    fn compiled_records_are_keyed_by_type_id() {
        let ty = TypeDescriptor::of::<Tagged>();
        let record = ty.as_record().unwrap();
        assert_eq!(record.key(), &RecordKey::Type(TypeId::of::<Tagged>()));

        let same_name = RecordDescriptor::new(record.type_name(), Vec::<FieldDescriptor>::new);
        assert_eq!(same_name.type_name(), record.type_name());
        assert_ne!(same_name.key(), record.key());
    }

    #[test]
    fn timestamp_records_have_no_fields() {
        let record = RecordDescriptor::timestamp("clock");
        assert!(record.is_timestamp());
        assert!(record.fields().is_empty());
        assert!(TypeDescriptor::Record(record).is_timestamp());
    }

    #[test]
    fn type_names_for_diagnostics() {
        let ty = TypeDescriptor::sequence(TypeDescriptor::sequence(TypeDescriptor::Float));
        assert_eq!(ty.type_name(), "[[float]]");
        assert_eq!(TypeDescriptor::Reference("Box<u8>".into()).type_name(), "Box<u8>");
    }
}
