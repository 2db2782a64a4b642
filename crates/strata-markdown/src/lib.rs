//! Markdown frontmatter parsing and context file loading for strata profiles
//!
//! Context files are markdown documents with an optional YAML frontmatter
//! block:
//!
//! ```text
//! ---
//! title: Rust conventions
//! tags: [rust, style]
//! priority: 5
//! ---
//! # Rust conventions
//! ...
//! ```
//!
//! - [`FrontmatterParser`] splits a document into a frontmatter mapping and a
//!   body. Missing frontmatter is not an error.
//! - [`extract_metadata`] adds word/line/header/code-block/link counts and
//!   promotes well-known frontmatter keys.
//! - [`ContextLoader`] loads [`ContextFile`]s and caches them until the file's
//!   modification time advances.
//!
//! ```ignore
//! use strata_markdown::ContextLoader;
//!
//! let loader = ContextLoader::new("library");
//! let file = loader.load_context_file("contexts/rust.md")?;
//! println!("{} words", file.metadata["word_count"]);
//! ```

pub mod context;
pub mod error;
pub mod loader;
pub mod metadata;
pub mod parser;

pub use context::{parse_priority, parse_string_set, ContextFile};
pub use error::{MarkdownError, MarkdownResult};
pub use loader::{path_identity, CacheStats, ContextLoader, FsMtime, MtimeSource};
pub use metadata::{extract_metadata, DocumentStats, PROMOTED_KEYS};
pub use parser::{value_kind, Frontmatter, FrontmatterParser, ParsedDocument};
