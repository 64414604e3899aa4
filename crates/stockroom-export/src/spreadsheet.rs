//! # Spreadsheet Export
//!
//! One sheet, a header row, then one row per product in the order given.
//!
//! ```text
//!      A    B         C                 ...  F        G       ...  K
//!   1  ID   Nombre    Código de Barras  ...  Precio   Costo   ...  Fecha Actualización
//!   2  7    Café 500g 7501055300075     ...  8.99     (empty) ...  19/10/2026, 14:05:09
//! ```
//!
//! Price, cost, stock and id are numeric cells so the sheet can be summed
//! without conversion.

use std::io::Cursor;

use stockroom_core::Product;
use umya_spreadsheet::helper::coordinate::coordinate_from_index;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::error::{ExportError, ExportResult};
use crate::locale::ExportOptions;

enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl From<Option<&str>> for CellValue {
    fn from(text: Option<&str>) -> Self {
        match text {
            Some(t) => CellValue::Text(t.to_string()),
            None => CellValue::Empty,
        }
    }
}

fn set_cell(sheet: &mut Worksheet, col: u32, row: u32, value: CellValue) {
    let addr = coordinate_from_index(&col, &row);
    match value {
        CellValue::Number(n) => {
            sheet.get_cell_mut(addr.as_str()).set_value_number(n);
        }
        CellValue::Text(t) => {
            sheet.get_cell_mut(addr.as_str()).set_value(t);
        }
        CellValue::Empty => {}
    }
}

fn row_values(product: &Product, options: &ExportOptions) -> [CellValue; 11] {
    [
        CellValue::Number(product.id as f64),
        CellValue::Text(product.name.clone()),
        product.barcode.as_deref().into(),
        product.category_name.as_deref().into(),
        product.description.as_deref().into(),
        CellValue::Number(product.price.to_f64_lossy()),
        product
            .cost
            .map(|c| CellValue::Number(c.to_f64_lossy()))
            .unwrap_or(CellValue::Empty),
        CellValue::Number(product.stock as f64),
        CellValue::Number(product.min_stock as f64),
        CellValue::Text(options.format_datetime(product.created_at)),
        CellValue::Text(options.format_datetime(product.updated_at)),
    ]
}

/// Builds the workbook in memory.
pub fn build_workbook(products: &[&Product], options: &ExportOptions) -> ExportResult<Spreadsheet> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    let sheet = book
        .new_sheet(options.locale.sheet_name())
        .map_err(|e| ExportError::Spreadsheet(e.to_string()))?;

    for (idx, header) in options.locale.headers().iter().enumerate() {
        let col = idx as u32 + 1;
        set_cell(sheet, col, 1, CellValue::Text((*header).to_string()));
        let addr = coordinate_from_index(&col, &1);
        sheet
            .get_style_mut(addr.as_str())
            .get_font_mut()
            .set_bold(true);
    }

    for (row_idx, product) in products.iter().enumerate() {
        let row = row_idx as u32 + 2;
        for (col_idx, value) in row_values(product, options).into_iter().enumerate() {
            set_cell(sheet, col_idx as u32 + 1, row, value);
        }
    }

    Ok(book)
}

/// Serializes the workbook as xlsx bytes.
pub fn to_xlsx(products: &[&Product], options: &ExportOptions) -> ExportResult<Vec<u8>> {
    let book = build_workbook(products, options)?;

    let mut cursor = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut cursor)
        .map_err(|e| ExportError::Spreadsheet(e.to_string()))?;

    Ok(cursor.into_inner())
}
