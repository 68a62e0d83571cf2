//! # docfill-docx
//!
//! Document side of docfill: opens a template, locates bookmarks across all
//! story parts and rewrites them with text, tables and image links. Chart
//! parts are matched by title and get fresh series caches.
//!
//! ```no_run
//! use docfill_docx::{BookmarkRewriter, RenderOptions, TemplateDocument};
//!
//! let bytes = std::fs::read("template.docx")?;
//! let mut doc = TemplateDocument::from_bytes(&bytes)?;
//! let options = RenderOptions::default();
//! BookmarkRewriter::new(&options).replace(&mut doc, "Customer", "ACME Corp")?;
//! std::fs::write("out.docx", doc.to_bytes()?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bookmark;
pub mod chart;
pub mod cleanup;
pub mod document;
pub mod error;
pub mod image;
mod markup;
pub mod options;
pub mod table;

#[cfg(test)]
mod test_support;

pub use bookmark::{BookmarkRegion, BookmarkRewriter, RewriteOutcome};
pub use chart::{fill_chart, ChartRenderer};
pub use cleanup::{request_field_update, strip_bookmarks};
pub use document::{DocumentPart, PartKind, TemplateChart, TemplateDocument};
pub use error::{DocxError, DocxResult};
pub use image::ImageRenderer;
pub use options::RenderOptions;
pub use table::TableRenderer;
