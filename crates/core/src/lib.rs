pub mod config;
pub mod document;
pub mod domain;
pub mod errors;
pub mod ooxml;
pub mod render;
pub mod template;

pub use config::{AppConfig, ConfigError, ContentBackend, LoadOptions, LogFormat};
pub use document::{Block, Document};
pub use domain::content::{ContentSchema, License, Requirement, Resource, Task};
pub use domain::section::Section;
pub use errors::{
    ApplicationError, ContentError, InterfaceError, PackageError, RenderError,
};
pub use render::{ProposalDocument, ProposalRenderer, DEFAULT_OUTPUT_PATH};
pub use template::builder::TemplateBuilder;
pub use template::{StyleDefinition, StyleSheet, Template};
