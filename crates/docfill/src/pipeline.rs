//! Extraction followed by rendering
//!
//! The request is fully built before the template is touched, and output
//! bytes exist only once every step has succeeded.

use std::path::{Path, PathBuf};

use docfill_core::Request;
use docfill_docx::{
    request_field_update, strip_bookmarks, BookmarkRewriter, ChartRenderer, ImageRenderer,
    RewriteOutcome, TableRenderer, TemplateDocument,
};
use docfill_xlsx::XlsxWorkbook;

use crate::assembler::RequestAssembler;
use crate::error::ConvertResult;
use crate::options::ConvertOptions;

/// What a render pass placed into the template
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Chart parts rewritten
    pub charts: usize,
    /// Bookmark occurrences replaced by a table
    pub tables: usize,
    /// Bookmark occurrences given an image
    pub images: usize,
    /// Bookmark occurrences given text
    pub text: usize,
    /// Bookmarks stripped during cleanup
    pub bookmarks_removed: usize,
}

/// Convert with default options
pub fn convert(spreadsheet: &[u8], template: &[u8]) -> ConvertResult<Vec<u8>> {
    convert_with_options(spreadsheet, template, &ConvertOptions::default())
}

/// Fill `template` from `spreadsheet` and return the new document bytes
pub fn convert_with_options(
    spreadsheet: &[u8],
    template: &[u8],
    options: &ConvertOptions,
) -> ConvertResult<Vec<u8>> {
    let workbook = XlsxWorkbook::from_bytes(spreadsheet)?;
    let mut doc = TemplateDocument::from_bytes(template)?;

    let request = RequestAssembler::new(&workbook, &doc, &options.extract).assemble()?;
    render(&mut doc, &request, options)?;
    Ok(doc.to_bytes()?)
}

/// Read the request a conversion would render, without rendering it
pub fn extract(
    spreadsheet: &[u8],
    template: &[u8],
    options: &ConvertOptions,
) -> ConvertResult<Request> {
    let workbook = XlsxWorkbook::from_bytes(spreadsheet)?;
    let doc = TemplateDocument::from_bytes(template)?;
    RequestAssembler::new(&workbook, &doc, &options.extract).assemble()
}

/// Render a request into an open template, then clean it up
///
/// Order: charts, tables, images, text. Cleanup requests a field refresh
/// and strips every remaining bookmark.
pub fn render(
    doc: &mut TemplateDocument,
    request: &Request,
    options: &ConvertOptions,
) -> ConvertResult<RenderSummary> {
    let mut summary = RenderSummary::default();

    let charts = ChartRenderer::new();
    for chart in &request.charts {
        summary.charts += charts.render(doc, chart);
    }

    let tables = TableRenderer::new(&options.render);
    for table in &request.tables {
        summary.tables += occurrences(tables.render(doc, table)?);
    }

    let images = ImageRenderer::new(&options.render);
    for image in &request.images {
        summary.images += occurrences(images.render(doc, image)?);
    }

    let text = BookmarkRewriter::new(&options.render);
    for (name, value) in &request.text {
        summary.text += occurrences(text.replace(doc, name, value)?);
    }

    request_field_update(doc)?;
    summary.bookmarks_removed = strip_bookmarks(doc);

    log::info!(
        "Rendered {} charts, {} tables, {} images, {} text values",
        summary.charts,
        summary.tables,
        summary.images,
        summary.text
    );
    Ok(summary)
}

fn occurrences(outcome: RewriteOutcome) -> usize {
    match outcome {
        RewriteOutcome::Rewritten(n) => n,
        _ => 0,
    }
}

/// Convert files on disk
///
/// Without an explicit `output`, the result is written next to the
/// spreadsheet with a `.docx` extension. Nothing is written on failure.
pub fn convert_files<P, Q>(
    spreadsheet: P,
    template: Q,
    output: Option<&Path>,
    options: &ConvertOptions,
) -> ConvertResult<PathBuf>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let spreadsheet = spreadsheet.as_ref();
    let bytes = convert_with_options(
        &std::fs::read(spreadsheet)?,
        &std::fs::read(template.as_ref())?,
        options,
    )?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(spreadsheet));
    std::fs::write(&output, bytes)?;
    log::info!("Wrote {}", output.display());
    Ok(output)
}

/// The spreadsheet path with its extension replaced by `.docx`
pub fn default_output_path(spreadsheet: &Path) -> PathBuf {
    spreadsheet.with_extension("docx")
}
