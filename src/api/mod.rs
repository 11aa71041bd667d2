// src/api/mod.rs
//! Feishu open platform access: credentials, dispatch, pagination and the
//! document operations built on them.

pub mod client;
pub mod pagination;
pub mod public;
pub mod sync_client;
pub mod token;

use crate::error::AppError;
use crate::model::{DocumentBlock, DocumentInfo};
use crate::types::DocumentId;

/// The ability to read a document's content.
///
/// Fallback paths depend on this trait rather than on a concrete client.
#[async_trait::async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn document_info(&self, document: &DocumentId) -> Result<DocumentInfo, AppError>;
    async fn top_level_blocks(&self, document: &DocumentId)
        -> Result<Vec<DocumentBlock>, AppError>;
}

pub use client::{ApiRequest, FeishuHttpClient, MultipartUpload, RequestBody};
pub use pagination::{collect_pages, stream_pages, Page};
pub use public::{
    parse_resource_url, AccessPath, FetchedResource, PublicFetcher, ResourceKind, ResourceRef,
};
pub use sync_client::DocumentSyncClient;
pub use token::{Credential, TokenManager};
