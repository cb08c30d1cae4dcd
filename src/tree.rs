//! Output tree for index mappings.
//!
//! Mirrors the JSON document being built: a node is either a string leaf or
//! an ordered object. A field node like `{"type": "object", "properties": {..}}`
//! is an object whose `type` child is a leaf, so "has a type" and "has
//! children" are not exclusive. Keeping those coherent is up to the mapper.
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::TreeError;

pub const TYPE_KEY: &str = "type";
pub const PROPERTIES_KEY: &str = "properties";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingNode {
    Leaf(String),
    Object(IndexMap<String, MappingNode>),
}

impl Default for MappingNode {
    fn default() -> Self {
        Self::object()
    }
}

impl MappingNode {
    pub fn object() -> Self {
        Self::Object(IndexMap::new())
    }

    pub fn leaf(value: impl Into<String>) -> Self {
        Self::Leaf(value.into())
    }

    /// Obtain or create the object node at `path`, creating every missing
    /// intermediate node on the way. An empty path addresses `self`.
    ///
    /// Fails when the path runs into (or ends on) an existing leaf.
    pub fn object_at(&mut self, path: &[&str]) -> Result<&mut MappingNode, TreeError> {
        let mut node = self;
        for (depth, segment) in path.iter().enumerate() {
            node = match node {
                MappingNode::Object(children) => children
                    .entry((*segment).to_owned())
                    .or_insert_with(MappingNode::object),
                MappingNode::Leaf(_) => return Err(conflict(path, depth)),
            };
        }
        if matches!(node, MappingNode::Leaf(_)) {
            return Err(conflict(path, path.len()));
        }
        Ok(node)
    }

    /// Shorthand for a single-segment [`MappingNode::object_at`].
    pub fn child(&mut self, name: &str) -> Result<&mut MappingNode, TreeError> {
        self.object_at(&[name])
    }

    /// Write the `type` designator of this node. Re-setting overwrites.
    pub fn set_type(&mut self, designator: &str) -> Result<(), TreeError> {
        match self {
            MappingNode::Object(children) => {
                children.insert(TYPE_KEY.to_owned(), MappingNode::leaf(designator));
                Ok(())
            }
            MappingNode::Leaf(_) => Err(conflict(&[TYPE_KEY], 0)),
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        match self.get(&[TYPE_KEY])? {
            MappingNode::Leaf(value) => Some(value),
            MappingNode::Object(_) => None,
        }
    }

    pub fn get(&self, path: &[&str]) -> Option<&MappingNode> {
        let mut node = self;
        for segment in path {
            node = match node {
                MappingNode::Object(children) => children.get(*segment)?,
                MappingNode::Leaf(_) => return None,
            };
        }
        Some(node)
    }

    pub fn children(&self) -> Option<&IndexMap<String, MappingNode>> {
        match self {
            MappingNode::Object(children) => Some(children),
            MappingNode::Leaf(_) => None,
        }
    }

    /// An object without children. Leaves are never empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, MappingNode::Object(children) if children.is_empty())
    }

    /// Remove the child `name` if it is an empty object. Returns whether it
    /// was removed. Sibling order is preserved.
    pub fn remove_if_empty(&mut self, name: &str) -> bool {
        let MappingNode::Object(children) = self else {
            return false;
        };
        if children.get(name).is_some_and(MappingNode::is_empty) {
            children.shift_remove(name);
            return true;
        }
        false
    }

    pub fn to_value(&self) -> serde_json::Value {
        match self {
            MappingNode::Leaf(value) => serde_json::Value::String(value.clone()),
            MappingNode::Object(children) => serde_json::Value::Object(
                children
                    .iter()
                    .map(|(key, child)| (key.clone(), child.to_value()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for MappingNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MappingNode::Leaf(value) => serializer.serialize_str(value),
            MappingNode::Object(children) => {
                let mut map = serializer.serialize_map(Some(children.len()))?;
                for (key, child) in children {
                    map.serialize_entry(key, child)?;
                }
                map.end()
            }
        }
    }
}

fn conflict(path: &[&str], leaf_depth: usize) -> TreeError {
    let leaf = if leaf_depth == 0 {
        "<root>".to_owned()
    } else {
        path[..leaf_depth].join("/")
    };
    TreeError::Conflict {
        path: path.join("/"),
        leaf,
    }
}

// ------------------------------- Tests ------------------------------------ //
