use miette::{Diagnostic, LabeledSpan};
use thiserror::Error;

/// Errors produced while parsing a hotkey descriptor.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("hotkey descriptor is empty")]
    #[diagnostic(code(hotkey_mux::parse::empty))]
    Empty,

    #[error("unknown modifier '{token}' in '{input}'")]
    #[diagnostic(
        code(hotkey_mux::parse::unknown_modifier),
        help("valid modifiers are Control, Shift, Alt, Meta and Mod")
    )]
    UnknownModifier { input: String, token: String },

    #[error("no key found in '{input}'")]
    #[diagnostic(code(hotkey_mux::parse::missing_key))]
    MissingKey { input: String },
}

/// Raised by the throwing validation wrapper when a descriptor is invalid.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[error("invalid hotkey '{descriptor}': {}", .errors.join("; "))]
#[diagnostic(code(hotkey_mux::validate::invalid))]
pub struct ValidationError {
    pub descriptor: String,
    pub errors: Vec<String>,
}

/// A descriptor in a bindings file that failed to parse.
#[derive(Debug, Clone)]
pub struct InvalidDescriptorInfo {
    pub descriptor: String,
    pub reason: String,
    pub location: SourceLocation,
}

/// Location of a node or entry in a bindings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// 1-indexed line
    pub line: usize,
    /// 1-indexed column
    pub column: usize,
    pub offset: usize,
    pub len: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize, offset: usize, len: usize) -> Self {
        Self {
            line,
            column,
            offset,
            len,
        }
    }
}

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Failed to parse KDL")]
    #[diagnostic(code(hotkey_mux::config::parse_error))]
    ParseError {
        #[source_code]
        src: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source]
        source: kdl::KdlError,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(hotkey_mux::config::invalid))]
    Invalid { message: String },

    #[error("Missing required field: {field}")]
    #[diagnostic(code(hotkey_mux::config::missing_field))]
    MissingField { field: String },

    #[error("{} invalid hotkey descriptor(s)", .invalid.len())]
    #[diagnostic(code(hotkey_mux::config::invalid_descriptors))]
    InvalidDescriptors {
        #[source_code]
        src: String,
        #[label(collection)]
        labels: Vec<LabeledSpan>,
        invalid: Vec<InvalidDescriptorInfo>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
