use crate::model::ErrorObject;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum JsonApiError {
    #[error("Invalid JSON: {message}")]
    #[diagnostic(
        code(jsonapi::syntax),
        help("A JSON:API document must be well-formed JSON text.")
    )]
    Syntax {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
        message: String,
    },

    #[error("{message} (at {path})")]
    #[diagnostic(
        code(jsonapi::format),
        help("The document violates a MUST requirement of the JSON:API format.")
    )]
    Format { message: String, path: String },

    #[error("{message}")]
    #[diagnostic(
        code(jsonapi::configuration),
        help("This is a setup problem: check registered types and relationship fields.")
    )]
    Configuration { message: String },

    #[error("Expected resource type '{expected}' but found '{found}' (at {path})")]
    #[diagnostic(
        code(jsonapi::type_mismatch),
        help("Strict types are enabled; the type member must equal the declared type name.")
    )]
    TypeMismatch {
        expected: String,
        found: String,
        path: String,
    },

    #[error("Resource type '{type_name}' is not registered (at {path})")]
    #[diagnostic(
        code(jsonapi::unregistered_type),
        help("Register the type or allow unregistered types on the registry builder.")
    )]
    UnregisteredType { type_name: String, path: String },

    #[error("Attributes of '{type_name}' could not be mapped: {message} (at {path})")]
    #[diagnostic(code(jsonapi::attributes))]
    Attributes {
        type_name: String,
        message: String,
        path: String,
    },

    #[error("The document holds {} error object(s){}", .errors.len(), first_title(.errors))]
    #[diagnostic(
        code(jsonapi::errors),
        help("The document is an errors document; inspect `errors` for details.")
    )]
    Errors { errors: Vec<ErrorObject> },

    #[error("Failed to read '{path}': {message}")]
    #[diagnostic(code(jsonapi::io))]
    Io { path: String, message: String },
}

impl JsonApiError {
    pub(crate) fn format(message: impl Into<String>, path: impl Into<String>) -> Self {
        JsonApiError::Format {
            message: message.into(),
            path: path.into(),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        JsonApiError::Configuration {
            message: message.into(),
        }
    }
}

fn first_title(errors: &[ErrorObject]) -> String {
    errors
        .iter()
        .find_map(|error| error.title.as_deref().or(error.detail.as_deref()))
        .map(|title| format!(": {title}"))
        .unwrap_or_default()
}
