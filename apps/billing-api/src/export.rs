//! # Report Export Renderer
//!
//! Renders a [`DashboardReport`] into a six-sheet xlsx workbook and hands it
//! back base64-encoded.
//!
//! ```text
//! ┌──────────────┬────────────────────────────────────────────────────────┐
//! │ Sheet        │ Layout                                                 │
//! ├──────────────┼────────────────────────────────────────────────────────┤
//! │ Summary      │ label / value pairs, trends                            │
//! │ Product Rev. │ name, quantity, revenue, TOTAL (SUM)                   │
//! │ Price Comp.  │ std, vendor, difference, variance % (colour coded)     │
//! │ Sales Rev.   │ date × product (Quantity, Revenue), Total, TOTAL       │
//! │ Quantity     │ receipt × product quantities, TOTALS (SUM)             │
//! │ Revenue      │ receipt × product revenue, TOTALS (SUM)                │
//! └──────────────┴────────────────────────────────────────────────────────┘
//! ```
//!
//! Money goes into cells as major-unit numbers; formatting adds the
//! currency symbol.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rust_xlsxwriter::utility::cell_range;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use billing_core::dashboard::{DashboardReport, ReceiptPivot};
use billing_core::Money;

pub const EXPORT_FILENAME: &str = "dashboard_comprehensive_report.xlsx";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const HEADER_FILL: u32 = 0x4472C4;
const SUBHEADER_FILL: u32 = 0xD9E1F2;
const TOTAL_FILL: u32 = 0xFF6B35;
const DAY_TOTAL_FILL: u32 = 0xFFE5CC;
const HIGH_VARIANCE_FILL: u32 = 0x90EE90;
const NEGATIVE_VARIANCE_FILL: u32 = 0xFFB6C1;

/// Variance above this percentage is highlighted.
const HIGH_VARIANCE_PCT: f64 = 20.0;

/// A rendered workbook ready for download.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedReport {
    /// Base64 of the xlsx bytes.
    pub blob: String,
    pub filename: String,
    pub content_type: String,
}

/// Renders the workbook for `report`, formatting money with `currency`.
pub fn render_workbook(report: &DashboardReport, currency: &str) -> ApiResult<ExportedReport> {
    let bytes = build_workbook(report, currency)
        .map_err(|e| ApiError::Internal(format!("Failed to render workbook: {e}")))?;

    Ok(ExportedReport {
        blob: BASE64.encode(bytes),
        filename: EXPORT_FILENAME.to_string(),
        content_type: XLSX_CONTENT_TYPE.to_string(),
    })
}

fn build_workbook(report: &DashboardReport, currency: &str) -> Result<Vec<u8>, XlsxError> {
    let styles = Styles::new(currency);
    let mut workbook = Workbook::new();

    workbook.push_worksheet(summary_sheet(report, &styles)?);
    workbook.push_worksheet(product_revenue_sheet(report, &styles)?);
    workbook.push_worksheet(price_comparison_sheet(report, &styles)?);
    workbook.push_worksheet(sales_revenue_sheet(report, &styles)?);
    workbook.push_worksheet(pivot_sheet("Quantity Report", &report.quantity_pivot, &styles, |v| {
        *v as f64
    })?);
    workbook.push_worksheet(pivot_sheet("Revenue Report", &report.revenue_pivot, &styles, |v| {
        v.to_major_f64()
    })?);

    workbook.save_to_buffer()
}

// =============================================================================
// Styles
// =============================================================================

struct Styles {
    title: Format,
    header: Format,
    subheader: Format,
    label: Format,
    text: Format,
    number: Format,
    money: Format,
    money_total: Format,
    number_total: Format,
    total_label: Format,
    day_total: Format,
    grand_total: Format,
    grand_total_header: Format,
    percent: Format,
    percent_high: Format,
    percent_negative: Format,
}

impl Styles {
    fn new(currency: &str) -> Self {
        let money_format = format!("\"{currency}\"#,##0.00");
        let bordered = || Format::new().set_border(FormatBorder::Thin);
        let right = || bordered().set_align(FormatAlign::Right);

        Styles {
            title: Format::new().set_bold().set_font_size(14),
            header: bordered()
                .set_bold()
                .set_font_color(Color::White)
                .set_font_size(11)
                .set_background_color(Color::RGB(HEADER_FILL))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            subheader: bordered()
                .set_bold()
                .set_font_size(10)
                .set_background_color(Color::RGB(SUBHEADER_FILL))
                .set_align(FormatAlign::Center),
            label: bordered().set_bold().set_background_color(Color::RGB(SUBHEADER_FILL)),
            text: bordered(),
            number: right().set_num_format("0"),
            money: right().set_num_format(&money_format),
            money_total: right()
                .set_bold()
                .set_background_color(Color::RGB(SUBHEADER_FILL))
                .set_num_format(&money_format),
            number_total: right()
                .set_bold()
                .set_background_color(Color::RGB(SUBHEADER_FILL))
                .set_num_format("0"),
            total_label: bordered()
                .set_bold()
                .set_background_color(Color::RGB(SUBHEADER_FILL))
                .set_align(FormatAlign::Right),
            day_total: right()
                .set_background_color(Color::RGB(DAY_TOTAL_FILL))
                .set_num_format(&money_format),
            grand_total: right()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(TOTAL_FILL))
                .set_num_format(&money_format),
            grand_total_header: bordered()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(TOTAL_FILL))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            percent: right().set_num_format("0.00\"%\""),
            percent_high: right()
                .set_num_format("0.00\"%\"")
                .set_background_color(Color::RGB(HIGH_VARIANCE_FILL)),
            percent_negative: right()
                .set_num_format("0.00\"%\"")
                .set_background_color(Color::RGB(NEGATIVE_VARIANCE_FILL)),
        }
    }
}

fn write_headers(ws: &mut Worksheet, row: u32, headers: &[&str], style: &Format) -> Result<(), XlsxError> {
    for (col, header) in headers.iter().enumerate() {
        ws.write_string_with_format(row, col_at(0, col, 1)?, *header, style)?;
    }
    Ok(())
}

/// Column `base + index × stride`, or a limit error instead of wrapping.
fn col_at(base: u16, index: usize, stride: u16) -> Result<u16, XlsxError> {
    u16::try_from(index)
        .ok()
        .and_then(|i| i.checked_mul(stride))
        .and_then(|offset| offset.checked_add(base))
        .ok_or(XlsxError::RowColumnLimitError)
}

/// Row `base + index`, or a limit error instead of wrapping.
fn row_at(base: u32, index: usize) -> Result<u32, XlsxError> {
    u32::try_from(index)
        .ok()
        .and_then(|i| i.checked_add(base))
        .ok_or(XlsxError::RowColumnLimitError)
}

fn money(value: Money) -> f64 {
    value.to_major_f64()
}

/// `=SUM(<col><first>:<col><last>)` over zero-based rows; 0 when the range is empty.
fn sum_formula(col: u16, first_row: u32, last_row: u32) -> String {
    if last_row < first_row {
        return "=0".to_string();
    }
    format!("=SUM({})", cell_range(first_row, col, last_row, col))
}

// =============================================================================
// Sheet 1: Summary
// =============================================================================

fn summary_sheet(report: &DashboardReport, styles: &Styles) -> Result<Worksheet, XlsxError> {
    let mut ws = Worksheet::new();
    ws.set_name("Summary")?;
    ws.merge_range(0, 0, 0, 1, "Dashboard Summary Report", &styles.title)?;

    let summary = &report.summary;
    let trends = &report.trends;

    enum Value<'a> {
        Text(&'a str),
        Count(i64),
        Money(Money),
    }

    let rows = [
        ("Period", Value::Text(&report.period_label)),
        ("Growth Trend", Value::Text(&trends.growth_trend)),
        ("Total Products", Value::Count(summary.total_quantity)),
        ("Unique Products", Value::Count(summary.unique_product_count)),
        ("Total Receipts", Value::Count(summary.total_receipts)),
        ("Total Revenue", Value::Money(summary.total_revenue)),
        ("Standard Revenue", Value::Money(summary.total_standard_revenue)),
        ("Revenue Trend", Value::Text(&trends.revenue.label)),
        ("Receipts Trend", Value::Text(&trends.receipts.label)),
        ("Product Trend", Value::Text(&trends.quantity.label)),
        ("Unique Product Trend", Value::Text(&trends.unique_products.label)),
    ];

    for (offset, (label, value)) in rows.iter().enumerate() {
        let row = row_at(2, offset)?;
        ws.write_string_with_format(row, 0, *label, &styles.label)?;
        match value {
            Value::Text(text) => ws.write_string_with_format(row, 1, *text, &styles.text)?,
            Value::Count(n) => ws.write_number_with_format(row, 1, *n as f64, &styles.number)?,
            Value::Money(m) => ws.write_number_with_format(row, 1, money(*m), &styles.money)?,
        };
    }

    ws.set_column_width(0, 25)?;
    ws.set_column_width(1, 20)?;
    Ok(ws)
}

// =============================================================================
// Sheet 2: Product Revenue
// =============================================================================

fn product_revenue_sheet(report: &DashboardReport, styles: &Styles) -> Result<Worksheet, XlsxError> {
    let mut ws = Worksheet::new();
    ws.set_name("Product Revenue")?;
    write_headers(&mut ws, 0, &["Product Name", "Quantity Sold", "Revenue"], &styles.header)?;

    let products = &report.summary.product_breakdown;
    for (i, product) in products.iter().enumerate() {
        let row = row_at(1, i)?;
        ws.write_string_with_format(row, 0, &product.product_name, &styles.text)?;
        ws.write_number_with_format(row, 1, product.quantity as f64, &styles.number)?;
        ws.write_number_with_format(row, 2, money(product.revenue), &styles.money)?;
    }

    let total_row = row_at(1, products.len())?;
    ws.write_string_with_format(total_row, 0, "TOTAL", &styles.total_label)?;
    ws.write_formula_with_format(total_row, 1, sum_formula(1, 1, total_row - 1).as_str(), &styles.number_total)?;
    ws.write_formula_with_format(total_row, 2, sum_formula(2, 1, total_row - 1).as_str(), &styles.money_total)?;

    ws.set_column_width(0, 28)?;
    ws.set_column_width(1, 15)?;
    ws.set_column_width(2, 15)?;
    Ok(ws)
}

// =============================================================================
// Sheet 3: Price Comparison
// =============================================================================

fn price_comparison_sheet(report: &DashboardReport, styles: &Styles) -> Result<Worksheet, XlsxError> {
    let mut ws = Worksheet::new();
    ws.set_name("Price Comparison")?;
    write_headers(
        &mut ws,
        0,
        &["Product Name", "Standard Price", "Vendor Price", "Difference", "Variance %"],
        &styles.header,
    )?;

    for (i, variance) in report.summary.price_variance.iter().enumerate() {
        let row = row_at(1, i)?;
        ws.write_string_with_format(row, 0, &variance.product_name, &styles.text)?;
        ws.write_number_with_format(row, 1, money(variance.std_price), &styles.money)?;
        ws.write_number_with_format(row, 2, money(variance.vend_price), &styles.money)?;
        ws.write_number_with_format(row, 3, money(variance.difference), &styles.money)?;

        let pct_style = if variance.variance_pct > HIGH_VARIANCE_PCT {
            &styles.percent_high
        } else if variance.variance_pct < 0.0 {
            &styles.percent_negative
        } else {
            &styles.percent
        };
        ws.write_number_with_format(row, 4, variance.variance_pct, pct_style)?;
    }

    ws.set_column_width(0, 28)?;
    ws.set_column_width(1, 18)?;
    ws.set_column_width(2, 18)?;
    ws.set_column_width(3, 15)?;
    ws.set_column_width(4, 12)?;
    Ok(ws)
}

// =============================================================================
// Sheet 4: Sales Revenue Data
// =============================================================================

fn sales_revenue_sheet(report: &DashboardReport, styles: &Styles) -> Result<Worksheet, XlsxError> {
    let mut ws = Worksheet::new();
    ws.set_name("Sales Revenue Data")?;

    let matrix = &report.daily_products;
    let total_col = col_at(1, matrix.products.len(), 2)?;

    // Two header rows: product names span (Quantity, Revenue).
    ws.merge_range(0, 0, 1, 0, "Date", &styles.header)?;
    for (i, product) in matrix.products.iter().enumerate() {
        let col = col_at(1, i, 2)?;
        ws.merge_range(0, col, 0, col + 1, product, &styles.header)?;
        ws.write_string_with_format(1, col, "Quantity", &styles.subheader)?;
        ws.write_string_with_format(1, col + 1, "Revenue", &styles.subheader)?;
    }
    ws.merge_range(0, total_col, 1, total_col, "Total Revenue", &styles.grand_total_header)?;

    let first_data_row = 2;
    for (i, day) in matrix.rows.iter().enumerate() {
        let row = row_at(first_data_row, i)?;
        ws.write_string_with_format(row, 0, day.date.format("%Y-%m-%d").to_string(), &styles.text)?;
        for (j, cell) in day.cells.iter().enumerate() {
            let col = col_at(1, j, 2)?;
            ws.write_number_with_format(row, col, cell.quantity as f64, &styles.number)?;
            ws.write_number_with_format(row, col + 1, money(cell.revenue), &styles.money)?;
        }
        ws.write_number_with_format(row, total_col, money(day.total_revenue()), &styles.day_total)?;
    }

    let total_row = row_at(first_data_row, matrix.rows.len())?;
    let last_data_row = total_row.saturating_sub(1);
    ws.write_string_with_format(total_row, 0, "TOTAL", &styles.total_label)?;
    for j in 0..matrix.products.len() {
        let col = col_at(1, j, 2)?;
        ws.write_formula_with_format(
            total_row,
            col,
            sum_formula(col, first_data_row, last_data_row).as_str(),
            &styles.number_total,
        )?;
        ws.write_formula_with_format(
            total_row,
            col + 1,
            sum_formula(col + 1, first_data_row, last_data_row).as_str(),
            &styles.money_total,
        )?;
    }
    ws.write_formula_with_format(
        total_row,
        total_col,
        sum_formula(total_col, first_data_row, last_data_row).as_str(),
        &styles.grand_total,
    )?;

    ws.set_column_width(0, 15)?;
    for col in 1..=total_col {
        ws.set_column_width(col, 14)?;
    }
    Ok(ws)
}

// =============================================================================
// Sheets 5-6: Receipt pivots
// =============================================================================

fn pivot_sheet<T>(
    name: &str,
    pivot: &ReceiptPivot<T>,
    styles: &Styles,
    to_cell: impl Fn(&T) -> f64,
) -> Result<Worksheet, XlsxError> {
    let is_money = name == "Revenue Report";
    let (value_style, total_style) = if is_money {
        (&styles.money, &styles.money_total)
    } else {
        (&styles.number, &styles.number_total)
    };

    let mut ws = Worksheet::new();
    ws.set_name(name)?;

    ws.write_string_with_format(0, 0, "Receipt Number", &styles.subheader)?;
    ws.write_string_with_format(0, 1, "Created At", &styles.subheader)?;
    for (i, product) in pivot.products.iter().enumerate() {
        ws.write_string_with_format(0, col_at(2, i, 1)?, product, &styles.subheader)?;
    }

    for (i, row) in pivot.rows.iter().enumerate() {
        let r = row_at(1, i)?;
        ws.write_string_with_format(r, 0, &row.receipt_number, &styles.text)?;
        ws.write_string_with_format(
            r,
            1,
            row.created_at.format("%Y-%m-%d %H:%M").to_string(),
            &styles.text,
        )?;
        for (j, value) in row.values.iter().enumerate() {
            ws.write_number_with_format(r, col_at(2, j, 1)?, to_cell(value), value_style)?;
        }
    }

    let total_row = row_at(1, pivot.rows.len())?;
    ws.write_string_with_format(total_row, 0, "TOTALS", &styles.total_label)?;
    for j in 0..pivot.products.len() {
        let col = col_at(2, j, 1)?;
        ws.write_formula_with_format(total_row, col, sum_formula(col, 1, total_row - 1).as_str(), total_style)?;
    }

    ws.set_column_width(0, 24)?;
    ws.set_column_width(1, 18)?;
    for (j, product) in pivot.products.iter().enumerate() {
        let width = product.chars().count().max(10) + 2;
        ws.set_column_width(col_at(2, j, 1)?, width as f64)?;
    }
    Ok(ws)
}

// =============================================================================
// Unit Tests
// =============================================================================
