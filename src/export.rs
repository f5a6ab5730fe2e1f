use crate::error::Result;
use crate::model::{FormState, ImageSlot};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Image, Workbook, Worksheet};
use std::path::{Path, PathBuf};
use tracing::info;

const A4_PAPER: u8 = 9;
const LAST_COL: u16 = 7;
const BRAND_BLUE: u32 = 0x00_33_66;

const FORM_TITLE: &str = "EICR Rectification Form";
const BRAND_LINE: &str = "BOOKER Wholesale  |  makro";
const FOOTER: &str = "Everyone, every day, home safely.   Safety First - be the difference";
const NO_IMAGE: &str = "No Image Selected";

/// `EICR_Form_<won>.xlsx`, or `EICR_Form_Untitled.xlsx` with no work order.
pub fn export_file_name(won: &str) -> String {
    let stem = if won.is_empty() { "Untitled" } else { won };
    format!("EICR_Form_{}.xlsx", stem)
}

struct FormFormats {
    brand: Format,
    title: Format,
    label: Format,
    sub_label: Format,
    value: Format,
    footer: Format,
    panel_title: Format,
    panel: Format,
}

impl FormFormats {
    fn new() -> Self {
        Self {
            brand: Format::new()
                .set_bold()
                .set_font_size(14)
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(BRAND_BLUE))
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::VerticalCenter),
            title: Format::new()
                .set_bold()
                .set_font_size(18)
                .set_font_color(Color::RGB(BRAND_BLUE))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            label: Format::new()
                .set_bold()
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap(),
            sub_label: Format::new()
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Right)
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap(),
            value: Format::new()
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap(),
            footer: Format::new()
                .set_italic()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(BRAND_BLUE))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            panel_title: Format::new()
                .set_bold()
                .set_font_size(14)
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Center),
            panel: Format::new()
                .set_border(FormatBorder::Thin)
                .set_font_color(Color::Gray)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
        }
    }
}

fn setup_page(ws: &mut Worksheet, name: &str) -> Result<()> {
    ws.set_name(name)?;
    ws.set_paper_size(A4_PAPER)
        .set_portrait()
        .set_print_fit_to_pages(1, 1)
        .set_print_center_horizontally(true);
    Ok(())
}

fn with_unit(value: &str, unit: &str) -> String {
    format!("{} {}", value, unit).trim().to_string()
}

/// Label over columns A:B and the value over the rest of the row.
fn write_labelled_row(
    ws: &mut Worksheet,
    row: u32,
    label: &str,
    value: &str,
    fmt: &FormFormats,
) -> Result<()> {
    ws.merge_range(row, 0, row, 1, label, &fmt.label)?;
    ws.merge_range(row, 2, row, LAST_COL, value, &fmt.value)?;
    Ok(())
}

/// Label over A:B followed by `(sub label, value)` pairs from column C.
fn write_pair_row(
    ws: &mut Worksheet,
    row: u32,
    label: &str,
    pairs: &[(&str, String)],
    fmt: &FormFormats,
) -> Result<()> {
    ws.merge_range(row, 0, row, 1, label, &fmt.label)?;
    let mut col = 2;
    for (sub_label, value) in pairs {
        ws.write_string_with_format(row, col, *sub_label, &fmt.sub_label)?;
        ws.write_string_with_format(row, col + 1, value, &fmt.value)?;
        col += 2;
    }
    while col <= LAST_COL {
        ws.write_blank(row, col, &fmt.value)?;
        col += 1;
    }
    Ok(())
}

fn write_details_page(ws: &mut Worksheet, form: &FormState, fmt: &FormFormats) -> Result<()> {
    setup_page(ws, "Page 1")?;

    ws.set_row_height(0, 28)?;
    ws.merge_range(0, 0, 0, LAST_COL, BRAND_LINE, &fmt.brand)?;
    ws.set_row_height(1, 36)?;
    ws.merge_range(1, 0, 1, LAST_COL, FORM_TITLE, &fmt.title)?;

    let mut row = 3;
    write_labelled_row(ws, row, "EDN Number :", &form.edn_number, fmt)?;
    row += 1;
    write_labelled_row(ws, row, "Store Number and Name:", &form.store_number_name, fmt)?;
    row += 1;
    ws.set_row_height(row, 32)?;
    write_labelled_row(
        ws,
        row,
        "DB Identification Number & Circuit Reference:",
        &form.db_id,
        fmt,
    )?;
    row += 1;
    ws.set_row_height(row, 90)?;
    write_labelled_row(
        ws,
        row,
        "Description of Work Undertaken:",
        &form.description,
        fmt,
    )?;
    row += 2;

    write_pair_row(
        ws,
        row,
        "Protective Device:",
        &[
            ("BS EN:", form.bs_en.clone()),
            ("Type:", form.device_type.clone()),
            ("Rating:", form.rating.clone()),
        ],
        fmt,
    )?;
    row += 1;
    ws.set_row_height(row, 30)?;
    write_pair_row(
        ws,
        row,
        "Conductor:",
        &[
            ("CSA of Live Conductors:", form.csa_live.clone()),
            ("CSA of CPC:", form.csa_cpc.clone()),
        ],
        fmt,
    )?;
    row += 1;
    write_pair_row(
        ws,
        row,
        "Test Results:",
        &[
            ("Ze / ZDb:", with_unit(&form.ze, "Ω")),
            ("Zs:", with_unit(&form.zs, "Ω")),
            ("R1+R2:", with_unit(&form.r1r2, "Ω")),
        ],
        fmt,
    )?;
    row += 1;
    write_pair_row(ws, row, "", &[("RCD x1:", with_unit(&form.rcd, "mS"))], fmt)?;
    row += 2;

    write_labelled_row(ws, row, "Date Work Completed:", &form.date_completed, fmt)?;
    row += 1;
    write_labelled_row(ws, row, "WON for Completed Work:", &form.won, fmt)?;
    row += 1;
    write_labelled_row(ws, row, "Name of Technician:", &form.technician_name, fmt)?;
    row += 1;
    write_labelled_row(ws, row, "Supervisor Verification:", &form.supervisor_name, fmt)?;
    row += 2;

    ws.set_row_height(row, 28)?;
    ws.merge_range(row, 0, row, LAST_COL, FOOTER, &fmt.footer)?;

    let widths = [14, 14, 12, 12, 12, 12, 12, 12];
    for (col, w) in widths.iter().enumerate() {
        ws.set_column_width(col as u16, *w)?;
    }
    Ok(())
}

fn write_image_panel(
    ws: &mut Worksheet,
    row: u32,
    slot: ImageSlot,
    form: &FormState,
    fmt: &FormFormats,
) -> Result<()> {
    // Excel caps row height at 409pt.
    const PANEL_HEIGHT: f64 = 340.0;

    ws.write_string_with_format(row, 0, slot.to_string(), &fmt.panel_title)?;
    ws.set_row_height(row + 1, PANEL_HEIGHT)?;
    match form.image(slot) {
        Some(attachment) => {
            let image = Image::new_from_buffer(&attachment.bytes)?;
            ws.write_blank(row + 1, 0, &fmt.panel)?;
            ws.insert_image_fit_to_cell(row + 1, 0, &image, true)?;
        }
        None => {
            ws.write_string_with_format(row + 1, 0, NO_IMAGE, &fmt.panel)?;
        }
    }
    Ok(())
}

fn write_images_page(ws: &mut Worksheet, form: &FormState, fmt: &FormFormats) -> Result<()> {
    setup_page(ws, "Page 2")?;
    ws.set_column_width(0, 90)?;
    write_image_panel(ws, 0, ImageSlot::First, form, fmt)?;
    write_image_panel(ws, 3, ImageSlot::Second, form, fmt)?;
    Ok(())
}

/// Writes the two-page form to `path`.
pub fn write_form(form: &FormState, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let fmt = FormFormats::new();

    write_details_page(workbook.add_worksheet(), form, &fmt)?;
    write_images_page(workbook.add_worksheet(), form, &fmt)?;

    workbook.save(path)?;
    Ok(())
}

/// Writes the form into `dir` under its conventional name and returns the path.
pub fn export_form(form: &FormState, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(export_file_name(&form.won));
    write_form(form, &path)?;
    info!(path = %path.display(), "form exported");
    Ok(path)
}
