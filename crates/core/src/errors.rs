use std::path::PathBuf;

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("content could not be parsed: {0}")]
    Parse(String),
    #[error("could not read content file `{path}`: {reason}")]
    ReadFile { path: PathBuf, reason: String },
    #[error("invalid value for `{field}`: {reason}")]
    InvalidField { field: String, reason: String },
}

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("package i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("package archive failure: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("package part `{part}` is not well-formed xml: {source}")]
    Xml { part: &'static str, source: roxmltree::Error },
    #[error("package part `{part}` is not valid utf-8")]
    Encoding { part: &'static str },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("could not write proposal document to `{path}`: {source}")]
    OutputWrite { path: PathBuf, source: PackageError },
    #[error("could not load style template `{path}`: {source}")]
    Template { path: PathBuf, source: PackageError },
    #[error("could not serialize proposal document: {0}")]
    Serialize(#[source] PackageError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("render failure: {0}")]
    Render(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<RenderError> for ApplicationError {
    fn from(value: RenderError) -> Self {
        Self::Render(value.to_string())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The content service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Content(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Render(message) | ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
