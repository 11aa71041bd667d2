use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Opaque server-issued identifier, tagged with the resource it names.
///
/// Identifiers are never parsed or normalized; they are only threaded
/// through request paths and query strings.
pub struct Id<T> {
    value: String,
    _phantom: PhantomData<T>,
}

/// Marker types for different identifier kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpaceMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FolderMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileMarker;

pub type DocumentId = Id<DocumentMarker>;
pub type BlockId = Id<BlockMarker>;
pub type SpaceId = Id<SpaceMarker>;
pub type NodeToken = Id<NodeMarker>;
pub type FolderToken = Id<FolderMarker>;
pub type FileToken = Id<FileMarker>;

/// Human-readable name of an identifier kind, used in validation messages.
pub trait IdKind {
    const KIND: &'static str;
}

impl IdKind for DocumentMarker {
    const KIND: &'static str = "document id";
}
impl IdKind for BlockMarker {
    const KIND: &'static str = "block id";
}
impl IdKind for SpaceMarker {
    const KIND: &'static str = "space id";
}
impl IdKind for NodeMarker {
    const KIND: &'static str = "node token";
}
impl IdKind for FolderMarker {
    const KIND: &'static str = "folder token";
}
impl IdKind for FileMarker {
    const KIND: &'static str = "file token";
}

impl<T: IdKind> Id<T> {
    /// Wraps a raw identifier, rejecting empty or whitespace-only input
    /// and anything containing a path separator.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::InvalidIdentifier {
                kind: T::KIND,
                reason: "identifier cannot be empty".to_string(),
            });
        }
        if trimmed.contains('/') || trimmed.contains('?') {
            return Err(ValidationError::InvalidIdentifier {
                kind: T::KIND,
                reason: format!("'{}' contains a path or query separator", trimmed),
            });
        }
        Ok(Self::from_server(trimmed.to_string()))
    }
}

impl<T> Id<T> {
    /// Wraps an identifier returned by the server without validation.
    pub(crate) fn from_server(value: String) -> Self {
        Self {
            value,
            _phantom: PhantomData,
        }
    }

    /// Reinterprets this identifier as another kind.
    ///
    /// A document's root block shares the document's id, so listing the
    /// top-level blocks of a document uses its id as the parent block id.
    pub fn retag<U>(&self) -> Id<U> {
        Id::from_server(self.value.clone())
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

// Derives would put bounds on the marker type, so these are written out.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::from_server(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_server(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_passed_through_unchanged() {
        let id = DocumentId::new("doxcnAbC123").unwrap();
        assert_eq!(id.as_str(), "doxcnAbC123");

        let token = NodeToken::new("  wikcnXyz  ").unwrap();
        assert_eq!(token.as_str(), "wikcnXyz");
    }

    #[test]
    fn test_invalid_ids() {
        assert!(DocumentId::new("").is_err());
        assert!(BlockId::new("   ").is_err());
        assert!(FolderToken::new("abc/def").is_err());
        assert!(SpaceId::new("abc?x=1").is_err());
    }

    #[test]
    fn test_document_id_doubles_as_root_block_id() {
        let doc = DocumentId::new("doccn42").unwrap();
        let root: BlockId = doc.retag();
        assert_eq!(root.as_str(), doc.as_str());
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = BlockId::new("blk1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"blk1\"");
        let back: BlockId = serde_json::from_str("\"blk1\"").unwrap();
        assert_eq!(back, id);
    }
}
