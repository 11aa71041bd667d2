// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains. Values that
//! a deployment may need to change (error codes, base URL) are defaults
//! consumed by `ClientConfig`, not hard limits.

// ---------------------------------------------------------------------------
// Remote service
// ---------------------------------------------------------------------------

/// Root of the Feishu open platform API.
pub const DEFAULT_BASE_URL: &str = "https://open.feishu.cn/open-apis";

/// Endpoint for the application-identity credential exchange.
pub const TENANT_TOKEN_PATH: &str = "/auth/v3/tenant_access_token/internal";

/// Seconds subtracted from the server-reported credential lifetime.
///
/// Covers clock skew and requests that are already in flight when the
/// credential would otherwise lapse.
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Credential lifetime assumed when the exchange response omits `expire`.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 7200;

/// Per-request timeout handed to the HTTP transport.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Language hint sent to the public (unauthenticated) endpoints.
pub const DEFAULT_PUBLIC_LANGUAGE: &str = "zh_cn";

/// Codes the service returns when the bearer credential went stale mid-session.
pub const DEFAULT_STALE_CREDENTIAL_CODES: [i64; 2] = [99991401, 99991677];

/// Codes the service returns when the caller may not read a resource.
pub const DEFAULT_PERMISSION_DENIED_CODES: [i64; 2] = [99991404, 99991663];

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// Page size for block children listings (service maximum is 500).
pub const BLOCK_PAGE_SIZE: u32 = 100;

/// Page size for wiki and drive listings.
pub const DIRECTORY_PAGE_SIZE: u32 = 50;

/// Number of results requested from search when the caller does not say.
pub const DEFAULT_SEARCH_COUNT: u32 = 20;

/// The service rejects batch block creation above this many children.
///
/// Callers are expected to chunk; the client only warns.
pub const BATCH_CREATE_MAX_BLOCKS: usize = 50;

/// Insertion index meaning "append after the last child".
pub const APPEND_INDEX: i32 = -1;

// ---------------------------------------------------------------------------
// Block model
// ---------------------------------------------------------------------------

pub const HEADING_LEVEL_MIN: u8 = 1;
pub const HEADING_LEVEL_MAX: u8 = 9;

/// Languages a code block may be tagged with.
pub const SUPPORTED_CODE_LANGUAGES: [&str; 39] = [
    "python",
    "javascript",
    "java",
    "c",
    "cpp",
    "go",
    "rust",
    "typescript",
    "php",
    "ruby",
    "swift",
    "kotlin",
    "scala",
    "csharp",
    "fsharp",
    "vb",
    "html",
    "css",
    "sql",
    "bash",
    "shell",
    "powershell",
    "json",
    "yaml",
    "xml",
    "markdown",
    "latex",
    "r",
    "matlab",
    "perl",
    "lua",
    "dart",
    "elixir",
    "haskell",
    "julia",
    "ocaml",
    "scheme",
    "clojure",
    "groovy",
];

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Estimated characters per block, used to pre-allocate output strings.
pub const CHARS_PER_BLOCK_ESTIMATE: usize = 128;

/// Number of spaces per nesting level in rendered output.
pub const INDENT_SPACES: usize = 2;

/// Maximum nesting depth followed when rendering or fetching a block tree.
pub const BLOCK_MAX_TREE_DEPTH: usize = 64;

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing unparseable response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
