//! Building the [`Request`] from a workbook
//!
//! Only names the template can place are read: a named range needs a
//! bookmark of the identical name, and a chart needs a template chart with
//! the same title (case-insensitive).

use std::collections::HashMap;

use docfill_core::{ImageData, NamedRange, Request};
use docfill_docx::TemplateDocument;
use docfill_xlsx::{
    read_single_value, ChartExtractor, ExtractOptions, SingleValue, TableExtractor, Worksheet,
    XlsxError, XlsxResult, XlsxWorkbook,
};

use crate::error::ConvertResult;

/// Worksheets parsed on first use
struct SheetCache<'a> {
    workbook: &'a XlsxWorkbook,
    sheets: HashMap<String, Worksheet>,
}

impl<'a> SheetCache<'a> {
    fn new(workbook: &'a XlsxWorkbook) -> Self {
        Self {
            workbook,
            sheets: HashMap::new(),
        }
    }

    fn get(&mut self, name: &str) -> XlsxResult<&Worksheet> {
        let key = name.to_lowercase();
        if !self.sheets.contains_key(&key) {
            let sheet = self.workbook.worksheet(name)?;
            self.sheets.insert(key.clone(), sheet);
        }
        self.sheets
            .get(&key)
            .ok_or_else(|| XlsxError::SheetNotFound(name.to_string()))
    }
}

/// Collects everything the template asks for out of a workbook
pub struct RequestAssembler<'a> {
    workbook: &'a XlsxWorkbook,
    template: &'a TemplateDocument,
    options: &'a ExtractOptions,
}

impl<'a> RequestAssembler<'a> {
    pub fn new(
        workbook: &'a XlsxWorkbook,
        template: &'a TemplateDocument,
        options: &'a ExtractOptions,
    ) -> Self {
        Self {
            workbook,
            template,
            options,
        }
    }

    /// Read every honored named range and chart
    ///
    /// A malformed reference on an honored name aborts the run; a name
    /// pointing at a missing worksheet is skipped with a warning.
    pub fn assemble(&self) -> ConvertResult<Request> {
        let mut request = Request::default();
        let mut sheets = SheetCache::new(self.workbook);
        let tables = TableExtractor::new(self.workbook.styles(), self.options);

        for defined in self.workbook.names().iter() {
            if !self.template.has_bookmark(&defined.name) {
                log::debug!("Named range '{}' has no bookmark, ignoring", defined.name);
                continue;
            }
            let range = NamedRange::from_defined(defined)?;
            let sheet = match sheets.get(&range.sheet) {
                Ok(sheet) => sheet,
                Err(XlsxError::SheetNotFound(sheet)) => {
                    log::warn!(
                        "Named range '{}' refers to missing worksheet '{}', skipping",
                        range.name,
                        sheet
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if defined.is_multi_cell() {
                let table = tables.extract(sheet, &range);
                log::debug!("Read table '{}' ({} cells)", range.name, table.cells.len());
                request.tables.push(table);
                continue;
            }
            match read_single_value(sheet, &range) {
                SingleValue::Text(text) => {
                    request.text.insert(range.name, text);
                }
                SingleValue::ImageLink(link) => {
                    request.images.push(ImageData {
                        bookmark: range.name,
                        link,
                    });
                }
            }
        }

        request.charts = self.charts()?;
        log::info!(
            "Extracted {} text values, {} tables, {} images, {} charts",
            request.text.len(),
            request.tables.len(),
            request.images.len(),
            request.charts.len()
        );
        Ok(request)
    }

    fn charts(&self) -> ConvertResult<Vec<docfill_core::ChartData>> {
        let template_titles: Vec<String> = self
            .template
            .chart_titles()
            .iter()
            .map(|t| t.to_lowercase())
            .collect();
        if template_titles.is_empty() {
            return Ok(Vec::new());
        }

        let extractor = ChartExtractor::new(self.workbook)?;
        let charts = extractor
            .titles()
            .into_iter()
            .filter(|title| template_titles.contains(&title.to_lowercase()))
            .filter_map(|title| extractor.extract(&title))
            .collect();
        Ok(charts)
    }
}
