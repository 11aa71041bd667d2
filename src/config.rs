// src/config.rs
use crate::constants::{
    BLOCK_PAGE_SIZE, DEFAULT_BASE_URL, DEFAULT_PUBLIC_LANGUAGE, DEFAULT_REQUEST_TIMEOUT_SECS,
    DIRECTORY_PAGE_SIZE,
};
use crate::error::{AppError, ErrorCodePolicy};
use crate::types::CredentialSecrets;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_APP_ID: &str = "FEISHU_APP_ID";
pub const ENV_APP_SECRET: &str = "FEISHU_APP_SECRET";
pub const ENV_BASE_URL: &str = "FEISHU_BASE_URL";
pub const ENV_STALE_CREDENTIAL_CODES: &str = "FEISHU_STALE_CREDENTIAL_CODES";
pub const ENV_PERMISSION_DENIED_CODES: &str = "FEISHU_PERMISSION_DENIED_CODES";

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about = "Read and write Feishu/Lark documents", long_about = None)]
pub struct CommandLineInput {
    /// Feishu App ID (overrides config files and FEISHU_APP_ID)
    #[arg(long, global = true)]
    pub app_id: Option<String>,

    /// Feishu App Secret (overrides config files and FEISHU_APP_SECRET)
    #[arg(long, global = true)]
    pub app_secret: Option<String>,

    /// Print raw JSON instead of a summary
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new document
    CreateDocument {
        #[arg(long)]
        title: String,
        /// Folder token to create the document in
        #[arg(long)]
        folder: Option<String>,
    },
    /// Show document metadata
    GetInfo {
        #[arg(long)]
        doc_id: String,
    },
    /// List the top-level blocks of a document
    GetBlocks {
        #[arg(long)]
        doc_id: String,
        /// Render the full block tree as markdown
        #[arg(long, default_value_t = false)]
        render: bool,
    },
    /// Search documents
    Search {
        #[arg(long)]
        query: String,
        /// Document type filter (e.g. doc, docx, wiki)
        #[arg(long = "type")]
        doc_type: Option<String>,
        #[arg(long, default_value_t = crate::constants::DEFAULT_SEARCH_COUNT)]
        count: u32,
    },
    /// List wiki spaces
    WikiSpaces,
    /// List the children of a wiki node (or the space root)
    WikiChildren {
        #[arg(long)]
        space_id: String,
        #[arg(long)]
        parent: Option<String>,
    },
    /// List the entries of a drive folder
    FolderChildren {
        #[arg(long)]
        folder_token: String,
    },
    /// Fetch a document or wiki page, without credentials when it is public
    FetchPublic {
        #[arg(long, conflicts_with_all = ["doc_id", "kind"])]
        url: Option<String>,
        #[arg(long, requires = "kind")]
        doc_id: Option<String>,
        #[arg(long = "type", value_enum)]
        kind: Option<ResourceKindArg>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKindArg {
    Wiki,
    Document,
}

/// Connection settings shared by every client in a session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    /// Page size for block children listings.
    pub page_size: u32,
    /// Page size for wiki and drive listings.
    pub directory_page_size: u32,
    pub error_codes: ErrorCodePolicy,
    /// Language hint for the public endpoints.
    pub language: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            page_size: BLOCK_PAGE_SIZE,
            directory_page_size: DIRECTORY_PAGE_SIZE,
            error_codes: ErrorCodePolicy::default(),
            language: DEFAULT_PUBLIC_LANGUAGE.to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults, overridden by `FEISHU_BASE_URL` and the error code variables.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(base_url);
        }
        if let Some(raw) = lookup(ENV_STALE_CREDENTIAL_CODES) {
            config.error_codes.stale_credential = ErrorCodePolicy::parse_codes(&raw)?;
        }
        if let Some(raw) = lookup(ENV_PERMISSION_DENIED_CODES) {
            config.error_codes.permission_denied = ErrorCodePolicy::parse_codes(&raw)?;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_directory_page_size(mut self, page_size: u32) -> Self {
        self.directory_page_size = page_size;
        self
    }

    pub fn with_error_codes(mut self, error_codes: ErrorCodePolicy) -> Self {
        self.error_codes = error_codes;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Joins an API path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Shown when a private resource is requested and no secrets are configured.
pub fn setup_instructions() -> String {
    format!(
        "This resource requires authentication, and no Feishu credentials are configured.

1. Create a self-built app at https://open.feishu.cn/ and copy its App ID and App Secret.
2. Grant it the docx:document scope (wiki:wiki:readonly and drive:drive:readonly are optional).
3. Provide the secrets in one of these ways:
   - {id} and {secret} environment variables
   - a \"feishu\" section in ~/.claude/config.json:
       {{\"feishu\": {{\"app_id\": \"cli_xxx\", \"app_secret\": \"...\"}}}}
   - --app-id and --app-secret on the command line

Public documents can be read without any setup.",
        id = ENV_APP_ID,
        secret = ENV_APP_SECRET,
    )
}

/// Source of the application identity used for the credential exchange.
pub trait SecretsProvider: Send + Sync {
    /// `None` when nothing is configured.
    fn credential_secrets(&self) -> Option<CredentialSecrets>;
}

/// `FEISHU_APP_ID` / `FEISHU_APP_SECRET`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecrets;

impl SecretsProvider for EnvSecrets {
    fn credential_secrets(&self) -> Option<CredentialSecrets> {
        let app_id = std::env::var(ENV_APP_ID).ok()?;
        let app_secret = std::env::var(ENV_APP_SECRET).ok()?;
        CredentialSecrets::new(app_id, app_secret).ok()
    }
}

/// Secrets known up front, e.g. from command-line flags.
#[derive(Debug, Clone)]
pub struct StaticSecrets(pub Option<CredentialSecrets>);

impl SecretsProvider for StaticSecrets {
    fn credential_secrets(&self) -> Option<CredentialSecrets> {
        self.0.clone()
    }
}

/// The `feishu` section of a JSON config file:
/// `{"feishu": {"app_id": "...", "app_secret": "..."}}`.
///
/// The first file that exists and parses is used.
#[derive(Debug, Clone)]
pub struct ConfigFileSecrets {
    paths: Vec<PathBuf>,
}

impl ConfigFileSecrets {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// `~/.claude/config.json`.
    pub fn default_location() -> Self {
        let paths = std::env::var_os("HOME")
            .map(|home| vec![PathBuf::from(home).join(".claude").join("config.json")])
            .unwrap_or_default();
        Self { paths }
    }

    fn read(path: &Path) -> Result<Option<CredentialSecrets>, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let config: serde_json::Value = serde_json::from_str(&raw)?;
        let Some(section) = config.get("feishu") else {
            return Ok(None);
        };
        let field = |name: &str| section.get(name).and_then(|v| v.as_str()).unwrap_or_default();
        Ok(CredentialSecrets::new(field("app_id"), field("app_secret")).ok())
    }
}

impl SecretsProvider for ConfigFileSecrets {
    fn credential_secrets(&self) -> Option<CredentialSecrets> {
        for path in self.paths.iter().filter(|p| p.exists()) {
            match Self::read(path) {
                Ok(secrets) => return secrets,
                Err(e) => log::debug!("Skipping config file {}: {}", path.display(), e),
            }
        }
        None
    }
}

/// Tries each provider in order; the first that yields secrets wins.
pub struct SecretsChain {
    providers: Vec<Box<dyn SecretsProvider>>,
}

impl SecretsChain {
    pub fn new(providers: Vec<Box<dyn SecretsProvider>>) -> Self {
        Self { providers }
    }

    /// Config file first, then the environment.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(ConfigFileSecrets::default_location()),
            Box::new(EnvSecrets),
        ])
    }
}

impl SecretsProvider for SecretsChain {
    fn credential_secrets(&self) -> Option<CredentialSecrets> {
        self.providers
            .iter()
            .find_map(|provider| provider.credential_secrets())
    }
}

impl CommandLineInput {
    /// Secrets from `--app-id`/`--app-secret` when both are given, else the
    /// standard chain.
    pub fn secrets_provider(&self) -> Result<Box<dyn SecretsProvider>, AppError> {
        match (&self.app_id, &self.app_secret) {
            (Some(app_id), Some(app_secret)) => Ok(Box::new(StaticSecrets(Some(
                CredentialSecrets::new(app_id.as_str(), app_secret.as_str())?,
            )))),
            (None, None) => Ok(Box::new(SecretsChain::standard())),
            _ => Err(AppError::MissingConfiguration(
                "--app-id and --app-secret must be given together".to_string(),
            )),
        }
    }
}
