//! Error types for a generation run.
//!
//! Every variant is fatal: the generator is a single batch pass with no
//! retry layer, so callers propagate these up to the binary which reports
//! the failing step and exits. Files written before the failure stay on disk.

use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, GenError>;

#[derive(Debug)]
pub enum GenError {
    /// Unknown precision, quantization or folding tag
    Config(String),

    /// Output directory could not be created (anything but "already exists")
    CreateDir { path: PathBuf, source: io::Error },

    /// Missing template, undefined attribute or template syntax fault
    Template { template: String, message: String },

    /// Generated file could not be written
    Write { path: PathBuf, source: io::Error },

    /// `cmixgen.toml` could not be read or parsed
    Manifest(String),
}

impl GenError {
    pub(crate) fn template(template: impl Into<String>, err: tera::Error) -> Self {
        GenError::Template {
            template: template.into(),
            message: describe_tera_error(&err),
        }
    }
}

/// Flatten a tera error chain into one line; tera keeps the useful part
/// (the undefined variable, the parse position) in the sources.
fn describe_tera_error(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    message
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenError::Config(e) => write!(f, "configuration error: {}", e),
            GenError::CreateDir { path, source } => {
                write!(f, "failed to create directory {}: {}", path.display(), source)
            }
            GenError::Template { template, message } => {
                write!(f, "failed to render template '{}': {}", template, message)
            }
            GenError::Write { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            GenError::Manifest(e) => write!(f, "manifest error: {}", e),
        }
    }
}

impl std::error::Error for GenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenError::CreateDir { source, .. } | GenError::Write { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_names_failing_step() {
        let err = GenError::Write {
            path: PathBuf::from("Source/NNSupportFunctions/arm_u8_to_int16_reordered.c"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let text = err.to_string();
        assert!(text.starts_with("failed to write"));
        assert!(text.contains("arm_u8_to_int16_reordered.c"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_has_no_source() {
        let err = GenError::Config("unknown precision 'u16'".to_string());
        assert_eq!(err.to_string(), "configuration error: unknown precision 'u16'");
        assert!(err.source().is_none());
    }
}
