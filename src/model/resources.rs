//! Server records returned by the document, wiki, drive and search endpoints.
//!
//! All records tolerate missing optional fields and ignore unknown ones; the
//! service adds fields without notice.

use crate::types::{DocumentId, FileToken, FolderToken, NodeToken, SpaceId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Document metadata, as returned under `data.document`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub document_id: DocumentId,
    #[serde(default)]
    pub revision_id: Option<i64>,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiSpace {
    pub space_id: SpaceId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A node in a wiki space; `obj_token` names the document behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiNode {
    #[serde(default)]
    pub space_id: Option<SpaceId>,
    pub node_token: NodeToken,
    #[serde(default)]
    pub obj_token: Option<String>,
    #[serde(default)]
    pub obj_type: Option<String>,
    #[serde(default)]
    pub parent_node_token: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub has_child: bool,
}

/// Result of creating a wiki node: the node and the document it wraps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedWikiNode {
    pub node_token: NodeToken,
    pub document_id: DocumentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootFolder {
    pub token: FolderToken,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A file or folder inside a drive folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    pub token: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub parent_token: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl FolderEntry {
    pub fn is_folder(&self) -> bool {
        self.kind == "folder"
    }
}

/// One search result. Fields the client does not model are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Response of the media upload endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadedMedia {
    pub file_token: FileToken,
}
