//! Content type generator.
//!
//! `ponzu generate content <name> field:kind[:editor]...` writes a declarative
//! definition to `<content>/<snake_name>.toml`. The server and the API service
//! read those definitions back.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("no content type name provided")]
    MissingName,

    #[error("invalid name '{0}': use letters, digits, '_' or '-', starting with a letter")]
    InvalidName(String),

    #[error("content type '{0}' needs at least one field (name:kind)")]
    NoFields(String),

    #[error("invalid field '{0}': expected name:kind or name:kind:editor")]
    InvalidField(String),

    #[error("unknown field kind '{0}' (use string, int, float, bool, time or []kind)")]
    UnknownKind(String),

    #[error("unknown editor '{0}'")]
    UnknownEditor(String),

    #[error("field '{0}' is defined more than once")]
    DuplicateField(String),

    #[error("content type already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("failed to encode definition: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("failed to write definition: {0}")]
    Io(#[from] std::io::Error),
}

const EDITORS: &[&str] = &[
    "input", "textarea", "richtext", "select", "checkbox", "file", "tags", "date",
];

/// The value type of a content field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldKind {
    String,
    Int,
    Float,
    Bool,
    Time,
    List(Box<FieldKind>),
}

impl FieldKind {
    /// Editor used when the field spec names none
    pub fn default_editor(&self) -> &'static str {
        match self {
            FieldKind::Bool => "checkbox",
            FieldKind::Time => "date",
            FieldKind::List(_) => "tags",
            FieldKind::String | FieldKind::Int | FieldKind::Float => "input",
        }
    }
}

impl FromStr for FieldKind {
    type Err = GenerateError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if let Some(inner) = raw.strip_prefix("[]") {
            let inner: FieldKind = inner
                .parse()
                .map_err(|_| GenerateError::UnknownKind(raw.to_string()))?;
            if matches!(inner, FieldKind::List(_)) {
                return Err(GenerateError::UnknownKind(raw.to_string()));
            }
            return Ok(FieldKind::List(Box::new(inner)));
        }

        match raw {
            "string" => Ok(FieldKind::String),
            "int" => Ok(FieldKind::Int),
            "float" => Ok(FieldKind::Float),
            "bool" => Ok(FieldKind::Bool),
            "time" => Ok(FieldKind::Time),
            other => Err(GenerateError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::String => write!(f, "string"),
            FieldKind::Int => write!(f, "int"),
            FieldKind::Float => write!(f, "float"),
            FieldKind::Bool => write!(f, "bool"),
            FieldKind::Time => write!(f, "time"),
            FieldKind::List(inner) => write!(f, "[]{}", inner),
        }
    }
}

impl TryFrom<String> for FieldKind {
    type Error = GenerateError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub editor: String,
}

impl FromStr for Field {
    type Err = GenerateError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = spec.split(':').collect();
        let (name, kind, editor) = match parts.as_slice() {
            [name, kind] => (*name, *kind, None),
            [name, kind, editor] => (*name, *kind, Some(*editor)),
            _ => return Err(GenerateError::InvalidField(spec.to_string())),
        };

        if !is_identifier(name) {
            return Err(GenerateError::InvalidField(spec.to_string()));
        }

        let kind: FieldKind = kind.parse()?;
        let editor = match editor {
            Some(editor) if EDITORS.contains(&editor) => editor.to_string(),
            Some(editor) => return Err(GenerateError::UnknownEditor(editor.to_string())),
            None => kind.default_editor().to_string(),
        };

        Ok(Field {
            name: name.to_string(),
            kind,
            editor,
        })
    }
}

/// A content type definition as stored on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentType {
    pub name: String,
    pub fields: Vec<Field>,
}

impl ContentType {
    /// Parse `<name> field:kind[:editor]...`
    pub fn parse(args: &[String]) -> Result<Self, GenerateError> {
        let (raw_name, field_specs) = args.split_first().ok_or(GenerateError::MissingName)?;

        if !is_identifier(raw_name) {
            return Err(GenerateError::InvalidName(raw_name.clone()));
        }
        let name = to_pascal_case(raw_name);

        if field_specs.is_empty() {
            return Err(GenerateError::NoFields(name));
        }

        let mut fields: Vec<Field> = Vec::with_capacity(field_specs.len());
        for spec in field_specs {
            let field: Field = spec.parse()?;
            if fields.iter().any(|f| f.name == field.name) {
                return Err(GenerateError::DuplicateField(field.name));
            }
            fields.push(field);
        }

        Ok(Self { name, fields })
    }

    /// File name of this definition inside the content directory
    pub fn file_name(&self) -> String {
        format!("{}.toml", to_snake_case(&self.name))
    }
}

/// Generate a content type definition into `content_dir`.
pub fn generate_content_type(content_dir: &Path, args: &[String]) -> Result<PathBuf, GenerateError> {
    let content_type = ContentType::parse(args)?;
    let path = content_dir.join(content_type.file_name());

    if path.exists() {
        return Err(GenerateError::AlreadyExists(path));
    }

    fs::create_dir_all(content_dir)?;
    fs::write(&path, toml::to_string_pretty(&content_type)?)?;

    tracing::info!(
        path = %path.display(),
        name = %content_type.name,
        fields = content_type.fields.len(),
        "Generated content type"
    );

    Ok(path)
}

/// Load every definition in `content_dir`, sorted by name.
///
/// A missing directory yields no types; unreadable or malformed files are
/// skipped with a warning.
pub fn list_content_types(content_dir: &Path) -> std::io::Result<Vec<ContentType>> {
    if !content_dir.exists() {
        return Ok(Vec::new());
    }

    let mut types = Vec::new();
    for entry in fs::read_dir(content_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            continue;
        }

        let parsed = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|contents| toml::from_str::<ContentType>(&contents).map_err(|e| e.to_string()));

        match parsed {
            Ok(content_type) => types.push(content_type),
            Err(e) => tracing::warn!(path = %path.display(), "Skipping content type: {}", e),
        }
    }

    types.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(types)
}

fn is_identifier(raw: &str) -> bool {
    let mut chars = raw.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn to_pascal_case(raw: &str) -> String {
    raw.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn to_snake_case(pascal: &str) -> String {
    let mut out = String::with_capacity(pascal.len() + 4);
    for (i, c) in pascal.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
