//! # Error Types
//!
//! Error types for the meshlint analyzer using `thiserror`.
//!
//! Analysis itself never fails: malformed objects contribute no findings.
//! These errors only surface while loading configuration or snapshots.

use validator::ValidationErrorsKind;

/// Custom result type for meshlint operations
pub type Result<T> = std::result::Result<T, MeshlintError>;

/// Main error type for meshlint
#[derive(thiserror::Error, Debug)]
pub enum MeshlintError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// YAML serialization/deserialization errors
    #[error("YAML error: {context}")]
    Yaml {
        #[source]
        source: serde_yaml::Error,
        context: String,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// A snapshot document that cannot be turned into a mesh object
    #[error("Invalid snapshot: {message}")]
    Snapshot {
        message: String,
        document: Option<usize>,
    },
}

impl MeshlintError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a snapshot error pointing at one document of a multi-document file
    pub fn snapshot<S: Into<String>>(message: S, document: Option<usize>) -> Self {
        Self::Snapshot {
            message: message.into(),
            document,
        }
    }

    /// Prefix the context of an error (used by `ErrorContext`)
    pub(crate) fn add_context(&mut self, context: String) {
        match self {
            MeshlintError::Io { context: ref mut ctx, .. }
            | MeshlintError::Serialization { context: ref mut ctx, .. }
            | MeshlintError::Yaml { context: ref mut ctx, .. } => {
                *ctx = format!("{}: {}", context, ctx);
            }
            MeshlintError::Config { message, .. }
            | MeshlintError::Validation { message, .. }
            | MeshlintError::Snapshot { message, .. } => {
                *message = format!("{}: {}", context, message);
            }
        }
    }

    /// Process exit code the CLI reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            MeshlintError::Config { .. } | MeshlintError::Validation { .. } => 78,
            MeshlintError::Io { .. } => 74,
            MeshlintError::Serialization { .. }
            | MeshlintError::Yaml { .. }
            | MeshlintError::Snapshot { .. } => 65,
        }
    }
}

/// Attach context to a fallible result
pub trait ErrorContext<T> {
    fn context<S: Into<String>>(self, context: S) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<MeshlintError>,
{
    fn context<S: Into<String>>(self, context: S) -> Result<T> {
        self.map_err(|e| {
            let mut error = e.into();
            error.add_context(context.into());
            error
        })
    }
}

impl From<std::io::Error> for MeshlintError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            source: error,
            context: "I/O operation failed".to_string(),
        }
    }
}

impl From<serde_json::Error> for MeshlintError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            source: error,
            context: "JSON serialization failed".to_string(),
        }
    }
}

impl From<serde_yaml::Error> for MeshlintError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Yaml {
            source: error,
            context: "YAML parsing failed".to_string(),
        }
    }
}

impl From<config::ConfigError> for MeshlintError {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for MeshlintError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        collect_validation_errors("", &errors, &mut fields);
        fields.sort();

        let message = format!(
            "Validation failed: {}",
            fields
                .iter()
                .map(|(field, reason)| format!("{}: {}", field, reason))
                .collect::<Vec<_>>()
                .join("; ")
        );
        match fields.as_slice() {
            [(field, _)] => Self::validation_field(message, field.clone()),
            _ => Self::validation(message),
        }
    }
}

/// Flatten nested struct and list errors into `(dotted.path, reasons)` pairs.
fn collect_validation_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    fields: &mut Vec<(String, String)>,
) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let reasons: Vec<String> = field_errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string()))
                    .collect();
                fields.push((path, reasons.join(", ")));
            }
            ValidationErrorsKind::Struct(nested) => collect_validation_errors(&path, nested, fields),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_errors(&format!("{}[{}]", path, index), nested, fields);
                }
            }
        }
    }
}
