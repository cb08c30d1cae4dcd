//! Record types declared in a JSON document.
//!
//! ```json
//! {
//!   "root": "Article",
//!   "records": {
//!     "Article": { "fields": [
//!       { "name": "title",     "type": "string", "tag": "text" },
//!       { "name": "published", "type": "timestamp" },
//!       { "name": "tags",      "type": { "sequence": "string" } },
//!       { "name": "author",    "type": { "record": "Person" } }
//!     ]},
//!     "Person": { "fields": [ { "name": "name", "type": "string" } ] }
//!   }
//! }
//! ```
//!
//! Records may refer to each other in any order, including cyclically; the
//! mapper rejects cycles when it reaches them.
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use super::{FieldDescriptor, RecordDescriptor, TypeDescriptor};
use crate::error::CatalogError;
use crate::path_de;

const TIMESTAMP_TYPE_NAME: &str = "timestamp";

// ------------------------------- Document -------------------------------- //

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct Document {
    #[serde(default)]
    root: Option<String>,
    /// Every entry as written; a repeated name must not silently replace the
    /// earlier definition.
    #[serde(deserialize_with = "record_entries")]
    records: Vec<(String, RecordDef)>,
}

/// Validated form of a [`Document`].
#[derive(Debug)]
struct Definitions {
    root: Option<String>,
    records: IndexMap<String, RecordDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordDef {
    fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDef {
    name: String,
    #[serde(rename = "type")]
    ty: TypeExpr,
    #[serde(default)]
    tag: String,
}

/// Type of a catalog field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeExpr {
    Integer,
    Float,
    String,
    Boolean,
    Timestamp,
    Sequence(Box<TypeExpr>),
    /// A record declared in the same catalog, by name.
    Record(String),
    Reference(Box<TypeExpr>),
    /// Anything the mapper has no mapping for, e.g. `"map<string, long>"`.
    Unsupported(String),
}

impl TypeExpr {
    fn label(&self) -> String {
        match self {
            TypeExpr::Integer => "integer".to_owned(),
            TypeExpr::Float => "float".to_owned(),
            TypeExpr::String => "string".to_owned(),
            TypeExpr::Boolean => "boolean".to_owned(),
            TypeExpr::Timestamp => TIMESTAMP_TYPE_NAME.to_owned(),
            TypeExpr::Sequence(element) => format!("[{}]", element.label()),
            TypeExpr::Record(name) => name.clone(),
            TypeExpr::Reference(target) => format!("&{}", target.label()),
            TypeExpr::Unsupported(label) => label.clone(),
        }
    }

    fn referenced_records(&self) -> Vec<&str> {
        match self {
            TypeExpr::Record(name) => vec![name.as_str()],
            TypeExpr::Sequence(inner) | TypeExpr::Reference(inner) => inner.referenced_records(),
            _ => Vec::new(),
        }
    }
}

// ------------------------------- Catalog --------------------------------- //

/// A validated catalog. Cheap to clone; descriptors produced from it share it.
#[derive(Debug, Clone)]
pub struct Catalog {
    doc: Arc<Definitions>,
}

impl FromStr for Catalog {
    type Err = CatalogError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Self::from_document(path_de::from_str_with_path(src)?)
    }
}

impl Catalog {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CatalogError> {
        Self::from_document(path_de::from_slice_with_path(bytes)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&bytes)
    }

    fn from_document(doc: Document) -> Result<Self, CatalogError> {
        let mut records = IndexMap::with_capacity(doc.records.len());
        for (name, def) in doc.records {
            if records.contains_key(&name) {
                return Err(CatalogError::DuplicateRecord(name));
            }
            records.insert(name, def);
        }
        let definitions = Definitions {
            root: doc.root,
            records,
        };
        validate(&definitions)?;
        Ok(Self {
            doc: Arc::new(definitions),
        })
    }

    /// Root record declared by the document, if any.
    pub fn root(&self) -> Option<&str> {
        self.doc.root.as_deref()
    }

    pub fn record_names(&self) -> impl Iterator<Item = &str> {
        self.doc.records.keys().map(String::as_str)
    }

    pub fn descriptor(&self, record: &str) -> Result<TypeDescriptor, CatalogError> {
        if !self.doc.records.contains_key(record) {
            return Err(CatalogError::MissingRecord(record.to_owned()));
        }
        Ok(self.record_descriptor(record))
    }

    /// `requested` if given, otherwise the document's root.
    pub fn root_descriptor(
        &self,
        requested: Option<&str>,
    ) -> Result<(String, TypeDescriptor), CatalogError> {
        let name = requested.or(self.root()).ok_or(CatalogError::NoRoot)?;
        Ok((name.to_owned(), self.descriptor(name)?))
    }

    fn record_descriptor(&self, name: &str) -> TypeDescriptor {
        let catalog = self.clone();
        let record = name.to_owned();
        TypeDescriptor::Record(RecordDescriptor::new(name, move || {
            catalog
                .doc
                .records
                .get(&record)
                .map(|def| {
                    def.fields
                        .iter()
                        .map(|field| {
                            FieldDescriptor::new(&field.name, catalog.resolve(&field.ty), &field.tag)
                        })
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        }))
    }

    fn resolve(&self, expr: &TypeExpr) -> TypeDescriptor {
        match expr {
            TypeExpr::Integer => TypeDescriptor::Integer,
            TypeExpr::Float => TypeDescriptor::Float,
            TypeExpr::String => TypeDescriptor::String,
            TypeExpr::Boolean => TypeDescriptor::Boolean,
            TypeExpr::Timestamp => {
                TypeDescriptor::Record(RecordDescriptor::timestamp(TIMESTAMP_TYPE_NAME))
            }
            TypeExpr::Sequence(element) => TypeDescriptor::sequence(self.resolve(element)),
            TypeExpr::Record(name) => self.record_descriptor(name),
            TypeExpr::Reference(_) => TypeDescriptor::Reference(expr.label()),
            TypeExpr::Unsupported(label) => TypeDescriptor::Unknown(label.clone()),
        }
    }
}

fn record_entries<'de, D>(deserializer: D) -> Result<Vec<(String, RecordDef)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Entries;

    impl<'de> Visitor<'de> for Entries {
        type Value = Vec<(String, RecordDef)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of record names to record definitions")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry::<String, RecordDef>()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(Entries)
}

fn validate(doc: &Definitions) -> Result<(), CatalogError> {
    for (record, def) in &doc.records {
        let mut seen = HashSet::new();
        for field in &def.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(CatalogError::DuplicateField {
                    record: record.clone(),
                    field: field.name.clone(),
                });
            }
            if let Some(target) = field
                .ty
                .referenced_records()
                .into_iter()
                .find(|target| !doc.records.contains_key(*target))
            {
                return Err(CatalogError::UnknownRecord {
                    record: record.clone(),
                    field: field.name.clone(),
                    target: target.to_owned(),
                });
            }
        }
    }
    if let Some(root) = &doc.root {
        if !doc.records.contains_key(root) {
            return Err(CatalogError::MissingRecord(root.clone()));
        }
    }
    Ok(())
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"{
        "root": "Article",
        "records": {
            "Article": { "fields": [
                { "name": "title", "type": "string", "tag": "text" },
                { "name": "published", "type": "timestamp" },
                { "name": "tags", "type": { "sequence": "string" } },
                { "name": "author", "type": { "record": "Person" } },
                { "name": "editor", "type": { "reference": { "record": "Person" } } }
            ]},
            "Person": { "fields": [ { "name": "name", "type": "string" } ] }
        }
    }"#;

    #[test]
    fn parses_and_resolves_fields() {
        let catalog: Catalog = ARTICLE.parse().unwrap();
        assert_eq!(catalog.root(), Some("Article"));
        assert_eq!(catalog.record_names().collect::<Vec<_>>(), ["Article", "Person"]);

        let (name, ty) = catalog.root_descriptor(None).unwrap();
        assert_eq!(name, "Article");
        let fields = ty.as_record().unwrap().fields();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[0].tag(), "text");
        assert_eq!(fields[2].tag(), "");
        assert!(fields[1].ty().is_timestamp());
        assert!(matches!(fields[2].ty(), TypeDescriptor::Sequence(_)));
        assert_eq!(fields[3].ty().as_record().unwrap().type_name(), "Person");
        assert_eq!(fields[4].ty().type_name(), "&Person");
    }

    #[test]
    fn requested_record_overrides_root() {
        let catalog: Catalog = ARTICLE.parse().unwrap();
        let (name, _) = catalog.root_descriptor(Some("Person")).unwrap();
        assert_eq!(name, "Person");
        assert!(matches!(
            catalog.root_descriptor(Some("Nobody")),
            Err(CatalogError::MissingRecord(missing)) if missing == "Nobody"
        ));
    }

    #[test]
    fn missing_root_is_reported() {
        let catalog: Catalog = r#"{"records": {"A": {"fields": []}}}"#.parse().unwrap();
        assert!(matches!(catalog.root_descriptor(None), Err(CatalogError::NoRoot)));
    }

    #[test]
    fn undefined_record_reference_is_rejected() {
        let err = r#"{"records": {"A": {"fields": [
            {"name": "b", "type": {"sequence": {"record": "B"}}}
        ]}}}"#
            .parse::<Catalog>()
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::UnknownRecord { ref record, ref field, ref target }
                if record == "A" && field == "b" && target == "B"
        ));
    }

    #[test]
    fn duplicate_fields_are_rejected() {
        let err = r#"{"records": {"A": {"fields": [
            {"name": "x", "type": "integer"},
            {"name": "x", "type": "string"}
        ]}}}"#
            .parse::<Catalog>()
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateField { .. }));
    }

    #[test]
    fn duplicate_records_are_rejected() {
        let err = r#"{"records": {
            "A": {"fields": [{"name": "x", "type": "integer"}]},
            "B": {"fields": []},
            "A": {"fields": [{"name": "y", "type": "string"}]}
        }}"#
            .parse::<Catalog>()
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateRecord(ref name) if name == "A"));
        assert_eq!(err.to_string(), "record `A` is declared more than once");
    }

    #[test]
    fn malformed_documents_report_the_json_path() {
        let err = r#"{"records": {"A": {"fields": [
            {"name": "x", "type": "complex"}
        ]}}}"#
            .parse::<Catalog>()
            .unwrap_err();
        match &err {
            CatalogError::Json { path, .. } => assert!(path.starts_with("records.A.fields[0]"), "{path}"),
            other => panic!("expected a JSON error, got {other:?}"),
        }
    }

    #[test]
    fn cyclic_records_are_accepted_at_load_time() {
        let catalog: Catalog = r#"{"root": "A", "records": {
            "A": {"fields": [{"name": "b", "type": {"record": "B"}}]},
            "B": {"fields": [{"name": "a", "type": {"record": "A"}}]}
        }}"#
            .parse()
            .unwrap();
        let (_, ty) = catalog.root_descriptor(None).unwrap();
        let b = ty.as_record().unwrap().fields().remove(0);
        let a = b.ty().as_record().unwrap().fields().remove(0);
        assert_eq!(a.ty().as_record().unwrap().type_name(), "A");
    }

    #[test]
    fn load_reports_io_errors_with_path() {
        let err = Catalog::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
