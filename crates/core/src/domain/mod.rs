pub mod content;
pub mod section;
