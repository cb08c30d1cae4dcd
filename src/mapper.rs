//! Type walker: derives an index mapping from a [`TypeDescriptor`].
//!
//! Records become `properties` trees, nested records `object` nodes, arrays of
//! records `nested` nodes, timestamps `date` leaves. Arrays of scalars collapse
//! onto the scalar's own leaf.
//!
//! Two failure tiers:
//! - types with no mapping (references, maps, ...) produce a [`Diagnostic`]
//!   and no node; siblings are still mapped.
//! - tree conflicts and cyclic records abort the derivation with a
//!   [`MappingError`].
use std::fmt;

use serde::ser::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::annotation::{AnnotationSet, EmptyTokens};
use crate::descriptor::{FieldDescriptor, Mappable, RecordDescriptor, RecordKey, TypeDescriptor};
use crate::error::MappingError;
use crate::tree::{MappingNode, PROPERTIES_KEY};

// ------------------------------- Policy ---------------------------------- //

pub const MAPPINGS_KEY: &str = "mappings";

pub const LONG: &str = "long";
pub const DOUBLE: &str = "double";
pub const KEYWORD: &str = "keyword";
pub const TEXT: &str = "text";
pub const BOOLEAN: &str = "boolean";
pub const DATE: &str = "date";
pub const OBJECT: &str = "object";
pub const NESTED: &str = "nested";

#[derive(Debug, Clone, Copy, Default)]
pub struct MapperOptions {
    /// How empty annotation tokens are treated, see [`EmptyTokens`].
    pub empty_tokens: EmptyTokens,
}

// ------------------------------- Output ---------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Pointer-like type.
    Reference,
    /// Any other type without a mapping.
    Unsupported,
}

/// A field left out of the mapping because its type cannot be mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Dotted path of the field from the root record.
    pub path: String,
    pub type_name: String,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            DiagnosticKind::Reference => "reference types are not supported",
            DiagnosticKind::Unsupported => "unsupported type",
        };
        write!(f, "{}: {what} (`{}`), field skipped", self.path, self.type_name)
    }
}

/// A complete mapping document:
/// `{"mappings": {<root>: {"properties": {...}}}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    root_name: String,
    document: MappingNode,
}

impl Mapping {
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn document(&self) -> &MappingNode {
        &self.document
    }

    /// The root `properties` node.
    pub fn properties(&self) -> Option<&MappingNode> {
        self.document
            .get(&[MAPPINGS_KEY, self.root_name.as_str(), PROPERTIES_KEY])
    }

    /// Lookup relative to the root `properties`, e.g. `["author", "properties", "name"]`.
    pub fn get(&self, path: &[&str]) -> Option<&MappingNode> {
        self.properties()?.get(path)
    }

    pub fn to_value(&self) -> serde_json::Value {
        self.document.to_value()
    }

    pub fn to_string_pretty(&self) -> String {
        format!("{:#}", self.to_value())
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.document.serialize(serializer)
    }
}

#[derive(Debug, Clone)]
pub struct Derivation {
    pub mapping: Mapping,
    pub diagnostics: Vec<Diagnostic>,
}

// ------------------------------- Front API -------------------------------- //

#[derive(Debug, Clone, Default)]
pub struct Mapper {
    options: MapperOptions,
}

impl Mapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MapperOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    pub fn derive<T: Mappable + ?Sized>(&self, root_name: &str) -> Result<Derivation, MappingError> {
        self.derive_descriptor(&T::type_descriptor(), root_name)
    }

    /// Map the static type of `value`; its contents are never read.
    pub fn derive_value<T: Mappable + ?Sized>(
        &self,
        value: &T,
        root_name: &str,
    ) -> Result<Derivation, MappingError> {
        self.derive_descriptor(&TypeDescriptor::of_val(value), root_name)
    }

    pub fn derive_descriptor(
        &self,
        ty: &TypeDescriptor,
        root_name: &str,
    ) -> Result<Derivation, MappingError> {
        let record = match ty {
            TypeDescriptor::Record(record) if !record.is_timestamp() => record,
            other => {
                return Err(MappingError::RootNotRecord {
                    type_name: other.type_name(),
                });
            }
        };

        let mut document = MappingNode::object();
        let mut walk = Walk::new(&self.options);
        walk.record(
            record,
            document.object_at(&[MAPPINGS_KEY, root_name, PROPERTIES_KEY])?,
        )?;

        Ok(Derivation {
            mapping: Mapping {
                root_name: root_name.to_owned(),
                document,
            },
            diagnostics: walk.diagnostics,
        })
    }
}

// ------------------------------- Walker ----------------------------------- //

struct Walk<'a> {
    options: &'a MapperOptions,
    /// Records currently being expanded, outermost first.
    expanding: Vec<RecordKey>,
    /// Field names from the root record down to the current field.
    path: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Walk<'a> {
    fn new(options: &'a MapperOptions) -> Self {
        Self {
            options,
            expanding: Vec::new(),
            path: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn path_string(&self) -> String {
        if self.path.is_empty() {
            "<root>".to_owned()
        } else {
            self.path.join(".")
        }
    }

    /// Expand every field of `record` into `properties`.
    fn record(
        &mut self,
        record: &RecordDescriptor,
        properties: &mut MappingNode,
    ) -> Result<(), MappingError> {
        let type_name = record.type_name();
        if self.expanding.contains(record.key()) {
            return Err(MappingError::CyclicType {
                type_name: type_name.to_owned(),
                path: self.path_string(),
            });
        }
        debug!(record = type_name, path = %self.path_string(), "expanding record");

        self.expanding.push(record.key().clone());
        for field in record.fields() {
            self.path.push(field.name().to_owned());
            let result = self.field(&field, properties);
            self.path.pop();
            result?;
        }
        self.expanding.pop();
        Ok(())
    }

    fn field(
        &mut self,
        field: &FieldDescriptor,
        properties: &mut MappingNode,
    ) -> Result<(), MappingError> {
        let annotations = AnnotationSet::parse_with(field.tag(), self.options.empty_tokens);
        if annotations.is_excluded() {
            debug!(field = %self.path_string(), "field excluded by annotation");
            return Ok(());
        }

        let name = field.name();
        match field.ty() {
            ty if ty.is_timestamp() => properties.child(name)?.set_type(DATE)?,
            TypeDescriptor::Record(record) => {
                let node = properties.child(name)?;
                node.set_type(OBJECT)?;
                self.record(record, node.child(PROPERTIES_KEY)?)?;
            }
            ty => {
                self.derive(ty, properties.child(name)?, annotations.renders_as_text())?;
                // nothing was mappable below this field
                properties.remove_if_empty(name);
            }
        }
        Ok(())
    }

    /// Write the mapping of `ty` into `target`, the node of the current field.
    fn derive(
        &mut self,
        ty: &TypeDescriptor,
        target: &mut MappingNode,
        render_as_text: bool,
    ) -> Result<(), MappingError> {
        match ty {
            TypeDescriptor::Record(record) if record.is_timestamp() => target.set_type(DATE)?,
            TypeDescriptor::Record(record) => {
                target.set_type(OBJECT)?;
                self.record(record, target.child(PROPERTIES_KEY)?)?;
            }
            TypeDescriptor::Sequence(element) => self.sequence(element, target, render_as_text)?,
            TypeDescriptor::Integer => target.set_type(LONG)?,
            TypeDescriptor::Float => target.set_type(DOUBLE)?,
            TypeDescriptor::String if render_as_text => target.set_type(TEXT)?,
            TypeDescriptor::String => target.set_type(KEYWORD)?,
            TypeDescriptor::Boolean => target.set_type(BOOLEAN)?,
            TypeDescriptor::Reference(type_name) => {
                self.skip(DiagnosticKind::Reference, type_name);
            }
            TypeDescriptor::Unknown(type_name) => {
                self.skip(DiagnosticKind::Unsupported, type_name);
            }
        }
        Ok(())
    }

    fn sequence(
        &mut self,
        element: &TypeDescriptor,
        target: &mut MappingNode,
        render_as_text: bool,
    ) -> Result<(), MappingError> {
        match element {
            // dates and arrays of dates index the same way
            ty if ty.is_timestamp() => target.set_type(DATE)?,
            // one entry describes every element
            TypeDescriptor::Record(record) => {
                target.set_type(NESTED)?;
                self.record(record, target.child(PROPERTIES_KEY)?)?;
            }
            ty => self.derive(ty, target, render_as_text)?,
        }
        Ok(())
    }

    fn skip(&mut self, kind: DiagnosticKind, type_name: &str) {
        let diagnostic = Diagnostic {
            path: self.path_string(),
            type_name: type_name.to_owned(),
            kind,
        };
        warn!(field = %diagnostic.path, type_name, "{diagnostic}");
        self.diagnostics.push(diagnostic);
    }
}

// ------------------------------- Tests ------------------------------------ //
