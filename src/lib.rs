// src/lib.rs
//! feishu-docs library: a session client for Feishu/Lark structured documents.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ValidationError`, `ErrorCodePolicy`
//! - **Configuration**: `ClientConfig`, `SecretsProvider` and its implementations
//! - **Block model**: `Block`, `TextStyle`, `TextElement`, composition helpers in `model::compose`
//! - **Domain types**: `DocumentId`, `BlockId`, `Color`, `HeadingLevel`, etc.
//! - **API client**: `TokenManager`, `FeishuHttpClient`, `DocumentSyncClient`, `PublicFetcher`
//! - **Formatting**: `render_block`, `render_blocks`, `render_forest`, `render_resource`

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod formatting;
pub mod model;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, ErrorClass, ErrorCodePolicy};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{
    ClientConfig, ConfigFileSecrets, EnvSecrets, SecretsChain, SecretsProvider, StaticSecrets,
};

// --- Block Model ---
pub use crate::model::{
    Block, BlockForest, CreatedWikiNode, DocumentBlock, DocumentInfo, FolderEntry, RootFolder,
    SearchHit, TextElement, TextStyle, UserMention, WikiNode, WikiSpace,
};

// --- Domain Types ---
pub use crate::types::{
    BlockId, CodeLanguage, Color, CredentialSecrets, DocumentId, FileToken, FolderToken,
    HeadingLevel, NodeToken, SpaceId,
};

// --- API Client ---
pub use crate::api::{
    collect_pages, parse_resource_url, stream_pages, AccessPath, ApiRequest, Credential,
    DocumentRepository, DocumentSyncClient, FeishuHttpClient, FetchedResource, Page,
    PublicFetcher, ResourceKind, ResourceRef, TokenManager,
};

// --- Formatting ---
pub use crate::formatting::{render_block, render_blocks, render_forest, render_resource};
