// src/api/sync_client.rs
//! Document, block, wiki, drive, search and media operations.

use super::client::{ApiRequest, FeishuHttpClient, MultipartUpload};
use super::pagination::{collect_pages, stream_pages, Page};
use super::token::TokenManager;
use super::DocumentRepository;
use crate::config::{setup_instructions, ClientConfig, SecretsProvider};
use crate::constants::{BATCH_CREATE_MAX_BLOCKS, BLOCK_MAX_TREE_DEPTH};
use crate::error::AppError;
use crate::model::{
    Block, BlockForest, CreatedWikiNode, DocumentBlock, DocumentInfo, FolderEntry, RootFolder,
    SearchHit, WikiNode, WikiSpace,
};
use crate::types::{
    BlockId, CredentialSecrets, DocumentId, FileToken, FolderToken, NodeToken, SpaceId,
};
use futures::Stream;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

/// Revision selector meaning "the latest revision".
const LATEST_REVISION: &str = "-1";

#[derive(Deserialize)]
struct DocumentEnvelope {
    document: DocumentInfo,
}

#[derive(Deserialize)]
struct WikiNodeEnvelope {
    node: WikiNode,
}

#[derive(Deserialize)]
struct CreatedFile {
    token: FolderToken,
}

#[derive(Deserialize)]
struct FileEnvelope {
    file: CreatedFile,
}

#[derive(Deserialize)]
struct SearchResults {
    #[serde(default)]
    items: Vec<SearchHit>,
}

/// Authenticated client for a single session.
#[derive(Clone)]
pub struct DocumentSyncClient {
    http: FeishuHttpClient,
}

impl DocumentSyncClient {
    pub fn new(http: FeishuHttpClient) -> Self {
        Self { http }
    }

    pub fn from_secrets(config: ClientConfig, secrets: CredentialSecrets) -> Result<Self, AppError> {
        let tokens = Arc::new(TokenManager::new(&config, secrets)?);
        Ok(Self::new(FeishuHttpClient::authenticated(config, tokens)?))
    }

    /// Builds a client from whatever secrets `provider` yields.
    pub fn from_provider(
        config: ClientConfig,
        provider: &dyn SecretsProvider,
    ) -> Result<Self, AppError> {
        let secrets = provider
            .credential_secrets()
            .ok_or_else(|| AppError::NoCredentialsConfigured {
                instructions: setup_instructions(),
            })?;
        Self::from_secrets(config, secrets)
    }

    pub fn http(&self) -> &FeishuHttpClient {
        &self.http
    }

    fn config(&self) -> &ClientConfig {
        self.http.config()
    }

    // --- Documents ---

    pub async fn create_document(
        &self,
        title: &str,
        folder: Option<&FolderToken>,
    ) -> Result<DocumentId, AppError> {
        let mut body = json!({ "title": title });
        if let Some(folder) = folder {
            body["folder_token"] = json!(folder.as_str());
        }
        let created: DocumentEnvelope = self
            .http
            .send_json(ApiRequest::post("/docx/v1/documents").json(body))
            .await?;
        log::info!("Created document {}", created.document.document_id);
        Ok(created.document.document_id)
    }

    pub async fn get_document_info(&self, document: &DocumentId) -> Result<DocumentInfo, AppError> {
        let info: DocumentEnvelope = self
            .http
            .send_json(ApiRequest::get(format!("/docx/v1/documents/{}", document)))
            .await?;
        Ok(info.document)
    }

    /// Top-level blocks of a document, across all pages.
    pub async fn get_all_blocks(&self, document: &DocumentId) -> Result<Vec<DocumentBlock>, AppError> {
        self.get_block_children(document, &document.retag()).await
    }

    /// Direct children of one block, across all pages.
    pub async fn get_block_children(
        &self,
        document: &DocumentId,
        block: &BlockId,
    ) -> Result<Vec<DocumentBlock>, AppError> {
        let path = children_path(document, block);
        let query = vec![
            ("document_revision_id", LATEST_REVISION.to_string()),
            ("page_size", self.config().page_size.to_string()),
        ];
        self.collect_listing(&path, &query).await
    }

    /// Same as `get_all_blocks`, fetching each page on demand.
    pub fn stream_all_blocks<'a>(
        &'a self,
        document: &DocumentId,
    ) -> impl Stream<Item = Result<DocumentBlock, AppError>> + 'a {
        let path = children_path(document, &document.retag());
        let query = vec![
            ("document_revision_id", LATEST_REVISION.to_string()),
            ("page_size", self.config().page_size.to_string()),
        ];
        self.stream_listing(path, query)
    }

    /// The whole block tree of a document, one children listing per parent.
    pub async fn get_block_tree(&self, document: &DocumentId) -> Result<BlockForest, AppError> {
        let root: BlockId = document.retag();
        let mut forest = BlockForest::new(root.clone());
        let mut pending = VecDeque::from([(root, 0usize)]);

        while let Some((parent, depth)) = pending.pop_front() {
            let children = self.get_block_children(document, &parent).await?;
            let nested = nested_children(&children, &parent);
            if depth + 1 < BLOCK_MAX_TREE_DEPTH {
                pending.extend(nested.into_iter().map(|id| (id, depth + 1)));
            } else if !nested.is_empty() {
                log::warn!(
                    "Block tree of {} exceeds {} levels; {} nested blocks under {} not fetched",
                    document,
                    BLOCK_MAX_TREE_DEPTH,
                    nested.len(),
                    parent
                );
            }
            forest.insert_children(parent, children);
        }
        Ok(forest)
    }

    // --- Blocks ---

    /// Inserts one block under `parent` at `index` (`APPEND_INDEX` appends).
    pub async fn create_block(
        &self,
        document: &DocumentId,
        parent: &BlockId,
        block: &Block,
        index: i32,
    ) -> Result<BlockId, AppError> {
        let request = ApiRequest::post(children_path(document, parent))
            .query("document_revision_id", LATEST_REVISION)
            .json(json!({ "children": [block.to_wire()], "index": index }));
        let data = self.http.send(request).await?;
        created_block_ids(&data)?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Protocol("block creation returned no blocks".to_string()))
    }

    /// Inserts several blocks in one request; ids come back in request order.
    ///
    /// The service rejects more than `BATCH_CREATE_MAX_BLOCKS` children per
    /// request; callers chunk, this only logs.
    pub async fn batch_create_blocks(
        &self,
        document: &DocumentId,
        parent: &BlockId,
        blocks: &[Block],
        index: i32,
    ) -> Result<Vec<BlockId>, AppError> {
        if blocks.len() > BATCH_CREATE_MAX_BLOCKS {
            log::warn!(
                "Batch of {} blocks exceeds the service limit of {}",
                blocks.len(),
                BATCH_CREATE_MAX_BLOCKS
            );
        }
        let children: Vec<Value> = blocks.iter().map(Block::to_wire).collect();
        let request = ApiRequest::post(format!("/docx/v1/documents/{}/blocks/batch_create", document))
            .query("document_revision_id", LATEST_REVISION)
            .json(json!({
                "requests": [{
                    "parent_block_id": parent.as_str(),
                    "children": children,
                    "index": index,
                }]
            }));
        let data = self.http.send(request).await?;
        created_block_ids(&data)
    }

    /// Replaces the content of an existing block.
    pub async fn update_block(
        &self,
        document: &DocumentId,
        block_id: &BlockId,
        block: &Block,
    ) -> Result<(), AppError> {
        let request = ApiRequest::patch(block_path(document, block_id))
            .query("document_revision_id", LATEST_REVISION)
            .json(block.to_wire());
        self.http.send(request).await?;
        Ok(())
    }

    pub async fn delete_block(&self, document: &DocumentId, block_id: &BlockId) -> Result<(), AppError> {
        let request = ApiRequest::delete(block_path(document, block_id))
            .query("document_revision_id", LATEST_REVISION);
        self.http.send(request).await?;
        Ok(())
    }

    // --- Wiki ---

    pub async fn list_wiki_spaces(&self) -> Result<Vec<WikiSpace>, AppError> {
        let query = vec![("page_size", self.config().directory_page_size.to_string())];
        self.collect_listing("/wiki/v2/spaces", &query).await
    }

    /// Creates a document-backed node, at the space root when `parent` is `None`.
    pub async fn create_wiki_node(
        &self,
        space: &SpaceId,
        title: &str,
        parent: Option<&NodeToken>,
    ) -> Result<CreatedWikiNode, AppError> {
        let mut body = json!({ "obj_type": "docx", "node_type": "origin", "title": title });
        if let Some(parent) = parent {
            body["parent_node_token"] = json!(parent.as_str());
        }
        let created: WikiNodeEnvelope = self
            .http
            .send_json(ApiRequest::post(format!("/wiki/v2/spaces/{}/nodes", space)).json(body))
            .await?;
        let obj_token = created.node.obj_token.ok_or_else(|| {
            AppError::Protocol("created wiki node has no obj_token".to_string())
        })?;
        Ok(CreatedWikiNode {
            node_token: created.node.node_token,
            document_id: DocumentId::new(obj_token)?,
        })
    }

    pub async fn list_wiki_children(
        &self,
        space: &SpaceId,
        parent: Option<&NodeToken>,
    ) -> Result<Vec<WikiNode>, AppError> {
        let mut query = vec![("page_size", self.config().directory_page_size.to_string())];
        if let Some(parent) = parent {
            query.push(("parent_node_token", parent.to_string()));
        }
        self.collect_listing(&format!("/wiki/v2/spaces/{}/nodes", space), &query)
            .await
    }

    // --- Drive ---

    pub async fn get_root_folder(&self) -> Result<RootFolder, AppError> {
        self.http
            .send_json(ApiRequest::get("/drive/v1/root_folder/meta"))
            .await
    }

    pub async fn list_folder_children(&self, folder: &FolderToken) -> Result<Vec<FolderEntry>, AppError> {
        let query = vec![("page_size", self.config().directory_page_size.to_string())];
        self.collect_listing(&format!("/drive/v1/files/{}/children", folder), &query)
            .await
    }

    pub fn stream_folder_children<'a>(
        &'a self,
        folder: &FolderToken,
    ) -> impl Stream<Item = Result<FolderEntry, AppError>> + 'a {
        let query = vec![("page_size", self.config().directory_page_size.to_string())];
        self.stream_listing(format!("/drive/v1/files/{}/children", folder), query)
    }

    pub async fn create_folder(&self, parent: &FolderToken, name: &str) -> Result<FolderToken, AppError> {
        let created: FileEnvelope = self
            .http
            .send_json(
                ApiRequest::post(format!("/drive/v1/files/{}/children", parent))
                    .json(json!({ "type": "folder", "name": name })),
            )
            .await?;
        Ok(created.file.token)
    }

    // --- Search ---

    /// One page of document search results; no cursor is followed.
    pub async fn search_documents(
        &self,
        query: &str,
        doc_type: Option<&str>,
        count: u32,
    ) -> Result<Vec<SearchHit>, AppError> {
        let mut body = json!({ "query": query, "search_type": "document", "count": count });
        if let Some(doc_type) = doc_type {
            body["filter"] = json!({ "document_formats": [doc_type] });
        }
        let results: SearchResults = self
            .http
            .send_json(ApiRequest::post("/search/v2/message").json(body))
            .await?;
        Ok(results.items)
    }

    // --- Media ---

    /// Uploads an image and returns the token an image block refers to.
    pub async fn upload_image(&self, path: &Path, file_name: Option<&str>) -> Result<FileToken, AppError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = match file_name {
            Some(name) => name.to_string(),
            None => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    AppError::MissingConfiguration(format!("{} has no file name", path.display()))
                })?,
        };
        let upload = MultipartUpload {
            fields: vec![
                ("file_type".to_string(), "image".to_string()),
                ("file_name".to_string(), file_name.clone()),
                ("size".to_string(), bytes.len().to_string()),
            ],
            file_field: "file".to_string(),
            mime_type: image_mime_type(&file_name).to_string(),
            file_name,
            bytes,
        };
        let uploaded: crate::model::resources::UploadedMedia = self
            .http
            .send_json(ApiRequest::post("/drive/v1/medias/upload_all").multipart(upload))
            .await?;
        Ok(uploaded.file_token)
    }

    // --- Listings ---

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        cursor: Option<String>,
    ) -> Result<Page<T>, AppError> {
        let request = query
            .iter()
            .fold(ApiRequest::get(path), |request, (name, value)| {
                request.query(name, value)
            })
            .query_opt("page_token", cursor);
        self.http.send_json(request).await
    }

    async fn collect_listing<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, AppError> {
        collect_pages(move |cursor| self.fetch_page::<T>(path, query, cursor)).await
    }

    fn stream_listing<'a, T: DeserializeOwned + 'a>(
        &'a self,
        path: String,
        query: Vec<(&'static str, String)>,
    ) -> impl Stream<Item = Result<T, AppError>> + 'a {
        stream_pages(move |cursor| {
            let path = path.clone();
            let query = query.clone();
            async move { self.fetch_page::<T>(&path, &query, cursor).await }
        })
    }
}

/// Children that have children of their own, skipping a self-reference.
fn nested_children(children: &[DocumentBlock], parent: &BlockId) -> Vec<BlockId> {
    children
        .iter()
        .filter(|child| !child.children.is_empty() && &child.block_id != parent)
        .map(|child| child.block_id.clone())
        .collect()
}

fn children_path(document: &DocumentId, block: &BlockId) -> String {
    format!("/docx/v1/documents/{}/blocks/{}/children", document, block)
}

fn block_path(document: &DocumentId, block: &BlockId) -> String {
    format!("/docx/v1/documents/{}/blocks/{}", document, block)
}

/// Ids of newly created blocks, from `children` or (older responses) `blocks`.
fn created_block_ids(data: &Value) -> Result<Vec<BlockId>, AppError> {
    let created = data
        .get("children")
        .or_else(|| data.get("blocks"))
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::Protocol("block creation response has no children".to_string()))?;
    created
        .iter()
        .map(|block| {
            block
                .get("block_id")
                .and_then(Value::as_str)
                .map(|id| BlockId::from_server(id.to_string()))
                .ok_or_else(|| AppError::Protocol("created block has no block_id".to_string()))
        })
        .collect()
}

fn image_mime_type(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => "image/png",
    }
}

#[async_trait::async_trait]
impl DocumentRepository for DocumentSyncClient {
    async fn document_info(&self, document: &DocumentId) -> Result<DocumentInfo, AppError> {
        self.get_document_info(document).await
    }

    async fn top_level_blocks(&self, document: &DocumentId) -> Result<Vec<DocumentBlock>, AppError> {
        self.get_all_blocks(document).await
    }
}
