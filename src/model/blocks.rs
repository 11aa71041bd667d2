//! Typed document content blocks and their wire representation.

use crate::error::AppError;
use crate::types::{BlockId, CodeLanguage, Color, FileToken, HeadingLevel, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::str::FromStr;

/// Independent styling flags plus optional palette colors for one text run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub inline_code: bool,
    pub text_color: Option<Color>,
    pub background: Option<Color>,
}

impl TextStyle {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn with_underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn with_strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    pub fn with_inline_code(mut self) -> Self {
        self.inline_code = true;
        self
    }

    pub fn with_text_color(mut self, color: Color) -> Self {
        self.text_color = Some(color);
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Sets the text color from a palette name, failing for anything else.
    pub fn with_text_color_named(self, name: &str) -> Result<Self, ValidationError> {
        Ok(self.with_text_color(Color::from_str(name)?))
    }

    /// Sets the background color from a palette name, failing for anything else.
    pub fn with_background_named(self, name: &str) -> Result<Self, ValidationError> {
        Ok(self.with_background(Color::from_str(name)?))
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    /// Only the flags that are set are sent; a plain style sends nothing.
    fn to_wire(&self) -> Option<Value> {
        if self.is_plain() {
            return None;
        }
        let mut styles = Map::new();
        for (name, set) in [
            ("bold", self.bold),
            ("italic", self.italic),
            ("underline", self.underline),
            ("strikethrough", self.strikethrough),
            ("inline_code", self.inline_code),
        ] {
            if set {
                styles.insert(name.to_string(), Value::Bool(true));
            }
        }
        if let Some(color) = self.text_color {
            styles.insert("text_color".to_string(), json!(color.as_str()));
        }
        if let Some(color) = self.background {
            styles.insert("background".to_string(), json!(color.as_str()));
        }
        Some(Value::Object(styles))
    }

    fn from_wire(value: Option<&Value>) -> Self {
        let Some(styles) = value.and_then(Value::as_object) else {
            return Self::default();
        };
        let flag = |name: &str| styles.get(name).and_then(Value::as_bool).unwrap_or(false);
        let color = |name: &str| {
            styles
                .get(name)
                .and_then(Value::as_str)
                .and_then(|raw| match Color::from_str(raw) {
                    Ok(color) => Some(color),
                    Err(_) => {
                        log::debug!("Ignoring unknown {} '{}' in fetched block", name, raw);
                        None
                    }
                })
        };
        Self {
            bold: flag("bold"),
            italic: flag("italic"),
            underline: flag("underline"),
            strikethrough: flag("strikethrough"),
            inline_code: flag("inline_code"),
            text_color: color("text_color"),
            background: color("background"),
        }
    }
}

/// A user referenced inline in a text run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMention {
    pub user_id: String,
}

/// One styled run of text inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextElement {
    pub content: String,
    pub style: TextStyle,
    pub mention: Option<UserMention>,
}

impl TextElement {
    pub fn new(content: impl Into<String>, style: TextStyle) -> Self {
        Self {
            content: content.into(),
            style,
            mention: None,
        }
    }

    pub fn plain(content: impl Into<String>) -> Self {
        Self::new(content, TextStyle::plain())
    }

    pub fn mention(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self {
            content: format!("@{}", user_id),
            style: TextStyle::plain(),
            mention: Some(UserMention { user_id }),
        }
    }

    fn to_wire(&self) -> Value {
        let mut run = Map::new();
        run.insert("content".to_string(), json!(self.content));
        if let Some(style) = self.style.to_wire() {
            run.insert("text_element_style".to_string(), style);
        }
        if let Some(mention) = &self.mention {
            run.insert(
                "mention".to_string(),
                json!({ "user_id": mention.user_id, "type": "user" }),
            );
        }
        json!({ "text_run": Value::Object(run) })
    }

    fn from_wire(value: &Value) -> Option<Self> {
        if let Some(run) = value.get("text_run") {
            let content = run.get("content").and_then(Value::as_str).unwrap_or_default();
            let mention = run
                .get("mention")
                .and_then(|m| m.get("user_id"))
                .and_then(Value::as_str)
                .map(|user_id| UserMention {
                    user_id: user_id.to_string(),
                });
            return Some(Self {
                content: content.to_string(),
                style: TextStyle::from_wire(run.get("text_element_style")),
                mention,
            });
        }
        // The service reports standalone mentions as their own element kind
        let user_id = value
            .get("mention_user")
            .and_then(|m| m.get("user_id"))
            .and_then(Value::as_str)?;
        Some(Self::mention(user_id))
    }
}

/// A typed unit of document content.
///
/// Blocks are value objects: they are validated when built and hold no
/// reference to a live document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Text {
        elements: Vec<TextElement>,
    },
    Heading {
        level: HeadingLevel,
        elements: Vec<TextElement>,
    },
    Bullet {
        elements: Vec<TextElement>,
    },
    Ordered {
        elements: Vec<TextElement>,
    },
    /// `language` is only `None` for fetched blocks tagged with a language
    /// outside the supported set.
    Code {
        language: Option<CodeLanguage>,
        elements: Vec<TextElement>,
    },
    Image {
        token: String,
    },
    Equation {
        elements: Vec<TextElement>,
    },
    Table {
        rows: u32,
        columns: u32,
    },
    Canvas,
    /// A fetched block of a kind this client does not model.
    Generic {
        block_type: String,
        elements: Vec<TextElement>,
    },
}

// --- Constructors ---

impl Block {
    pub fn text(content: impl Into<String>, style: TextStyle) -> Self {
        Block::Text {
            elements: vec![TextElement::new(content, style)],
        }
    }

    /// A paragraph made of several differently styled runs.
    pub fn text_runs(elements: Vec<TextElement>) -> Self {
        Block::Text { elements }
    }

    /// Headings default to bold when no style is given.
    pub fn heading(
        content: impl Into<String>,
        level: u8,
        style: Option<TextStyle>,
    ) -> Result<Self, ValidationError> {
        let level = HeadingLevel::new(level)?;
        let style = style.unwrap_or_else(|| TextStyle::plain().with_bold());
        Ok(Block::Heading {
            level,
            elements: vec![TextElement::new(content, style)],
        })
    }

    pub fn bullet(content: impl Into<String>, style: TextStyle) -> Self {
        Block::Bullet {
            elements: vec![TextElement::new(content, style)],
        }
    }

    pub fn ordered(content: impl Into<String>, style: TextStyle) -> Self {
        Block::Ordered {
            elements: vec![TextElement::new(content, style)],
        }
    }

    pub fn code(content: impl Into<String>, language: &str) -> Result<Self, ValidationError> {
        let language = CodeLanguage::new(language)?;
        Ok(Block::Code {
            language: Some(language),
            elements: vec![TextElement::plain(content)],
        })
    }

    pub fn image(token: &FileToken) -> Self {
        Block::Image {
            token: token.as_str().to_string(),
        }
    }

    /// A LaTeX equation.
    pub fn equation(expression: impl Into<String>) -> Self {
        Block::Equation {
            elements: vec![TextElement::plain(expression)],
        }
    }

    pub fn table(rows: u32, columns: u32) -> Result<Self, ValidationError> {
        if rows < 1 || columns < 1 {
            return Err(ValidationError::TableDimensions { rows, columns });
        }
        Ok(Block::Table { rows, columns })
    }

    /// An empty whiteboard.
    pub fn canvas() -> Self {
        Block::Canvas
    }
}

// --- Accessors ---

impl Block {
    /// The wire name of this block's kind.
    pub fn kind_name(&self) -> &str {
        match self {
            Block::Text { .. } => "text",
            Block::Heading { .. } => "heading",
            Block::Bullet { .. } => "bullet",
            Block::Ordered { .. } => "ordered",
            Block::Code { .. } => "code",
            Block::Image { .. } => "image",
            Block::Equation { .. } => "equation",
            Block::Table { .. } => "table",
            Block::Canvas => "canvas",
            Block::Generic { block_type, .. } => block_type,
        }
    }

    pub fn elements(&self) -> &[TextElement] {
        match self {
            Block::Text { elements }
            | Block::Heading { elements, .. }
            | Block::Bullet { elements }
            | Block::Ordered { elements }
            | Block::Code { elements, .. }
            | Block::Equation { elements }
            | Block::Generic { elements, .. } => elements,
            Block::Image { .. } | Block::Table { .. } | Block::Canvas => &[],
        }
    }

    /// Concatenated content of all text runs, without styling.
    pub fn plain_text(&self) -> String {
        self.elements().iter().map(|e| e.content.as_str()).collect()
    }
}

// --- Wire format ---

/// Body keys recognized when a block's tag is not a string.
const KNOWN_BODY_KEYS: [&str; 10] = [
    "text", "bullet", "ordered", "equation", "code", "heading", "image", "table", "canvas", "board",
];

fn elements_to_wire(elements: &[TextElement]) -> Value {
    Value::Array(elements.iter().map(TextElement::to_wire).collect())
}

fn elements_from_wire(body: &Value) -> Vec<TextElement> {
    body.get("elements")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(TextElement::from_wire).collect())
        .unwrap_or_default()
}

impl Block {
    /// Serializes to `{"block_type": kind, kind: body}`.
    pub fn to_wire(&self) -> Value {
        let body = match self {
            Block::Text { elements }
            | Block::Bullet { elements }
            | Block::Ordered { elements }
            | Block::Equation { elements }
            | Block::Generic { elements, .. } => json!({ "elements": elements_to_wire(elements) }),
            Block::Heading { level, elements } => json!({
                "level": level.get(),
                "elements": elements_to_wire(elements),
            }),
            Block::Code { language, elements } => {
                let mut body = json!({ "elements": elements_to_wire(elements) });
                if let Some(language) = language {
                    body["language"] = json!(language.as_str());
                }
                body
            }
            Block::Image { token } => json!({ "token": token }),
            Block::Table { rows, columns } => json!({ "rows": rows, "columns": columns }),
            Block::Canvas => json!({ "elements": [] }),
        };
        let kind = self.kind_name();
        let mut wire = Map::new();
        wire.insert("block_type".to_string(), json!(kind));
        wire.insert(kind.to_string(), body);
        Value::Object(wire)
    }

    /// Decodes a block from its wire shape.
    ///
    /// Accepts string tags (`"text"`, `"heading"`, `"heading2"`) and, when
    /// the tag is numeric or missing, finds the body by its key. Unknown
    /// kinds become `Block::Generic`.
    pub fn from_wire(value: &Value) -> Result<Self, AppError> {
        let object = value.as_object().ok_or_else(|| {
            AppError::Protocol(format!("block is not a JSON object: {}", value))
        })?;

        let tag = match object.get("block_type") {
            Some(Value::String(tag)) => Some(tag.clone()),
            _ => None,
        };
        let kind = tag.clone().or_else(|| find_body_key(object));
        let Some(kind) = kind else {
            let block_type = object
                .get("block_type")
                .map(|v| v.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            return Ok(Block::Generic {
                block_type,
                elements: Vec::new(),
            });
        };

        let body = object.get(&kind).or_else(|| {
            // A "heading3" tag may carry its body under the generic key
            kind.starts_with("heading")
                .then(|| object.get("heading"))
                .flatten()
        });
        let Some(body) = body else {
            return Ok(Block::Generic {
                block_type: kind,
                elements: Vec::new(),
            });
        };

        let block = match kind.as_str() {
            "text" => Block::Text {
                elements: elements_from_wire(body),
            },
            "bullet" => Block::Bullet {
                elements: elements_from_wire(body),
            },
            "ordered" => Block::Ordered {
                elements: elements_from_wire(body),
            },
            "equation" => Block::Equation {
                elements: elements_from_wire(body),
            },
            "code" => {
                let language = body
                    .get("language")
                    .or_else(|| body.get("style").and_then(|s| s.get("language")))
                    .and_then(Value::as_str)
                    .and_then(|raw| CodeLanguage::new(raw).ok());
                Block::Code {
                    language,
                    elements: elements_from_wire(body),
                }
            }
            "image" => Block::Image {
                token: body
                    .get("token")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            "table" => {
                // A missing dimension reads as 1; one that does not fit u32 is None
                let dimension = |flat: &str, nested: &str| {
                    match body
                        .get(flat)
                        .or_else(|| body.get("property").and_then(|p| p.get(nested)))
                        .and_then(Value::as_u64)
                    {
                        Some(raw) => u32::try_from(raw).ok(),
                        None => Some(1),
                    }
                };
                match (dimension("rows", "row_size"), dimension("columns", "column_size")) {
                    (Some(rows), Some(columns)) => Block::Table { rows, columns },
                    _ => Block::Generic {
                        block_type: kind.clone(),
                        elements: Vec::new(),
                    },
                }
            }
            "canvas" | "board" => Block::Canvas,
            heading if heading.starts_with("heading") => {
                let level = match body.get("level").and_then(Value::as_u64) {
                    Some(raw) => u8::try_from(raw).ok(),
                    None => Some(heading.trim_start_matches("heading").parse().unwrap_or(1)),
                };
                match level.and_then(|level| HeadingLevel::new(level).ok()) {
                    Some(level) => Block::Heading {
                        level,
                        elements: elements_from_wire(body),
                    },
                    None => Block::Generic {
                        block_type: kind.clone(),
                        elements: elements_from_wire(body),
                    },
                }
            }
            _ => Block::Generic {
                block_type: kind.clone(),
                elements: elements_from_wire(body),
            },
        };
        Ok(block)
    }
}

/// Finds the body key of a block whose tag is not a string.
fn find_body_key(object: &Map<String, Value>) -> Option<String> {
    if let Some(key) = KNOWN_BODY_KEYS.iter().find(|key| object.contains_key(**key)) {
        return Some(key.to_string());
    }
    (1..=9)
        .map(|level| format!("heading{}", level))
        .find(|key| object.contains_key(key))
}

/// A block as it exists in a fetched document: content plus tree position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentBlock {
    pub block_id: BlockId,
    pub parent_id: Option<BlockId>,
    pub children: Vec<BlockId>,
    pub block: Block,
}

impl DocumentBlock {
    pub fn from_wire(value: &Value) -> Result<Self, AppError> {
        let block_id = value
            .get("block_id")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Protocol("fetched block has no block_id".to_string()))?;
        let parent_id = value
            .get("parent_id")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .map(|p| BlockId::from_server(p.to_string()));
        let children = value
            .get("children")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(|id| BlockId::from_server(id.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            block_id: BlockId::from_server(block_id.to_string()),
            parent_id,
            children,
            block: Block::from_wire(value)?,
        })
    }
}

impl DocumentBlock {
    /// The block's wire shape plus its tree position.
    pub fn to_wire(&self) -> Value {
        let mut wire = self.block.to_wire();
        if let Value::Object(map) = &mut wire {
            map.insert("block_id".to_string(), json!(self.block_id.as_str()));
            if let Some(parent) = &self.parent_id {
                map.insert("parent_id".to_string(), json!(parent.as_str()));
            }
            if !self.children.is_empty() {
                let children: Vec<&str> = self.children.iter().map(BlockId::as_str).collect();
                map.insert("children".to_string(), json!(children));
            }
        }
        wire
    }
}

impl Serialize for DocumentBlock {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_wire().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DocumentBlock {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        DocumentBlock::from_wire(&value).map_err(serde::de::Error::custom)
    }
}
