// src/api/public.rs
//! Read-only access to shared documents, without credentials when possible.
//!
//! A fetch first tries the public endpoints anonymously. Only when the
//! service answers with a permission-class code does it fall back to the
//! authenticated API, using whatever secrets are configured.

use super::client::{ApiRequest, FeishuHttpClient};
use super::sync_client::DocumentSyncClient;
use super::DocumentRepository;
use crate::config::{setup_instructions, ClientConfig, SecretsProvider};
use crate::error::{AppError, ErrorClass};
use crate::model::{DocumentBlock, DocumentInfo, WikiNode};
use crate::types::DocumentId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use url::Url;

static FEISHU_HOST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+\.(feishu\.cn|larksuite\.com)$")
        .expect("Failed to compile Feishu host regex - this is a bug in the code")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Wiki,
    Document,
}

/// What a share link points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub id: String,
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// Parses `https://<tenant>.feishu.cn/{wiki|docx}/<id>` (or the
/// `larksuite.com` equivalent). Query and fragment are ignored.
pub fn parse_resource_url(raw: &str) -> Result<ResourceRef, AppError> {
    let invalid = || AppError::InvalidUrl(raw.to_string());
    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if url.scheme() != "https" {
        return Err(invalid());
    }
    let host = url.host_str().ok_or_else(invalid)?;
    if !FEISHU_HOST.is_match(host) {
        return Err(invalid());
    }

    let mut segments = url.path_segments().ok_or_else(invalid)?;
    let kind = match segments.next() {
        Some("wiki") => ResourceKind::Wiki,
        Some("docx") => ResourceKind::Document,
        _ => return Err(invalid()),
    };
    let id = segments
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(invalid)?;
    Ok(ResourceRef::new(kind, id))
}

/// How a fetched resource was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPath {
    Public,
    Authenticated,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FetchedResource {
    Wiki {
        access: AccessPath,
        node: Option<WikiNode>,
        /// The full public payload, including fields not modelled here.
        data: Value,
    },
    Document {
        access: AccessPath,
        document: Option<DocumentInfo>,
        blocks: Vec<DocumentBlock>,
    },
}

impl FetchedResource {
    pub fn access(&self) -> AccessPath {
        match self {
            FetchedResource::Wiki { access, .. } | FetchedResource::Document { access, .. } => {
                *access
            }
        }
    }
}

/// Fetches share links, anonymously first.
pub struct PublicFetcher {
    anonymous: FeishuHttpClient,
    secrets: Box<dyn SecretsProvider>,
}

impl PublicFetcher {
    pub fn new(config: ClientConfig, secrets: Box<dyn SecretsProvider>) -> Result<Self, AppError> {
        Ok(Self {
            anonymous: FeishuHttpClient::anonymous(config)?,
            secrets,
        })
    }

    pub async fn fetch_url(&self, url: &str) -> Result<FetchedResource, AppError> {
        let resource = parse_resource_url(url)?;
        self.fetch(&resource).await
    }

    pub async fn fetch(&self, resource: &ResourceRef) -> Result<FetchedResource, AppError> {
        match self.fetch_public(resource).await {
            Err(AppError::Api { code, message })
                if self.anonymous.error_codes().classify(code) == ErrorClass::PermissionDenied =>
            {
                log::info!(
                    "{} is not public ({}: {}), trying configured credentials",
                    resource.id,
                    code,
                    message
                );
                self.fetch_authenticated(resource).await
            }
            outcome => outcome,
        }
    }

    async fn fetch_public(&self, resource: &ResourceRef) -> Result<FetchedResource, AppError> {
        let language = self.anonymous.config().language.clone();
        match resource.kind {
            ResourceKind::Wiki => {
                let request = ApiRequest::get("/wiki/v2/publics/get_node")
                    .query("node_token", &resource.id)
                    .query("language", language);
                let data = self.anonymous.send(request).await?;
                let node = data
                    .get("node")
                    .filter(|node| !node.is_null())
                    .map(|node| serde_json::from_value(node.clone()))
                    .transpose()?;
                Ok(FetchedResource::Wiki {
                    access: AccessPath::Public,
                    node,
                    data,
                })
            }
            ResourceKind::Document => {
                let request = ApiRequest::get("/docx/v1/publics/get_document")
                    .query("document_id", &resource.id)
                    .query("language", language);
                let data = self.anonymous.send(request).await?;
                let document = data
                    .get("document")
                    .filter(|doc| !doc.is_null())
                    .map(|doc| serde_json::from_value(doc.clone()))
                    .transpose()?;
                let blocks = match data.get("blocks").and_then(Value::as_array) {
                    Some(blocks) => blocks
                        .iter()
                        .map(DocumentBlock::from_wire)
                        .collect::<Result<Vec<_>, _>>()?,
                    None => Vec::new(),
                };
                Ok(FetchedResource::Document {
                    access: AccessPath::Public,
                    document,
                    blocks,
                })
            }
        }
    }

    async fn fetch_authenticated(&self, resource: &ResourceRef) -> Result<FetchedResource, AppError> {
        let secrets = self
            .secrets
            .credential_secrets()
            .ok_or_else(|| AppError::NoCredentialsConfigured {
                instructions: setup_instructions(),
            })?;

        match resource.kind {
            ResourceKind::Wiki => Err(AppError::UnsupportedOperation(format!(
                "wiki node {} is private; reading it with credentials needs its space id \
                 (use `wiki-children --space-id`)",
                resource.id
            ))),
            ResourceKind::Document => {
                let client = DocumentSyncClient::from_secrets(self.anonymous.config().clone(), secrets)?;
                let document = DocumentId::new(resource.id.as_str())?;
                read_document(&client, &document).await
            }
        }
    }
}

/// Metadata plus top-level blocks through an authenticated repository.
pub async fn read_document(
    repository: &dyn DocumentRepository,
    document: &DocumentId,
) -> Result<FetchedResource, AppError> {
    let info = repository.document_info(document).await?;
    let blocks = repository.top_level_blocks(document).await?;
    Ok(FetchedResource::Document {
        access: AccessPath::Authenticated,
        document: Some(info),
        blocks,
    })
}
