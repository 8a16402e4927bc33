//! Printable pay stub layout
//!
//! The stub is drawn on a single page exactly as tall as its content, the
//! way a screen capture of the printable card would be. Pagination happens
//! later, on the rasterized bitmap.

use crate::error::{RenderError, Result};
use paystub_core::*;
use printpdf::graphics::{LinePoint, PaintMode, Point, Polygon, PolygonRing, WindingOrder};
use printpdf::image::RawImage;
use printpdf::xobject::XObjectTransform;
use printpdf::{BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Pt, Rgb, TextItem};

const MARGIN_PT: f32 = 28.0;
const LINE_HEIGHT: f32 = 1.4;

const TITLE_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 15.0;
const ISSUER_SIZE: f32 = 13.5;
const BODY_SIZE: f32 = 10.0;
const SMALL_SIZE: f32 = 9.0;
const NET_SIZE: f32 = 13.5;

const LOGO_HEIGHT: f32 = 40.0;

/// Approximate glyph advance for Helvetica, as a fraction of the font size
const HELVETICA_CHAR_WIDTH_RATIO: f32 = 0.5;

const RULE_WIDTH: f32 = 0.75;
const RULE_GRAY: f32 = 0.93;
const MUTED_GRAY: f32 = 0.35;

/// A laid-out pay stub, ready for a rasterizer
#[derive(Debug, Clone)]
pub struct StubSurface {
    /// Width in points
    pub width: f32,
    /// Height in points
    pub height: f32,
    /// Single-page PDF holding the drawing
    pub pdf_bytes: Vec<u8>,
    /// Every text run on the surface, top to bottom
    pub lines: Vec<String>,
}

impl StubSurface {
    pub fn contains_text(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

/// Lay out `stub` at the output page width.
///
/// `totals` is passed in rather than recomputed so the printed figures are
/// the same ones the caller already showed. `logo` holds encoded image bytes
/// for the top of the card; bytes that do not decode are left out.
pub fn layout_pay_stub(
    stub: &PayStub,
    totals: &Totals,
    options: &StubOptions,
    logo: Option<&[u8]>,
) -> Result<StubSurface> {
    let width = options.page_size().width;
    let mut canvas = Canvas::new(width);

    if let Some(bytes) = logo {
        draw_logo(&mut canvas, bytes);
    }
    draw_header(&mut canvas, stub);
    draw_issuer(&mut canvas, &options.issuer_lines);
    draw_contractor(&mut canvas, &stub.contractor);
    draw_items(&mut canvas, &stub.items, &options.mileage);
    draw_totals(&mut canvas, totals);

    canvas.finish()
}

fn date_label(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn draw_logo(canvas: &mut Canvas, bytes: &[u8]) {
    let mut warnings = Vec::new();
    let image = match RawImage::decode_from_bytes(bytes, &mut warnings) {
        Ok(image) => image,
        Err(e) => {
            log::warn!("Skipping logo: {}", e);
            return;
        }
    };
    if image.width == 0 || image.height == 0 {
        log::warn!("Skipping empty logo");
        return;
    }

    let aspect = image.width as f32 / image.height as f32;
    let max_width = canvas.right_edge() - canvas.left_edge();
    let width = (LOGO_HEIGHT * aspect).min(max_width);
    let height = width / aspect;

    canvas.logo = Some(PlacedLogo {
        x: canvas.left_edge(),
        top: canvas.cursor,
        width,
        height,
        image,
    });
    canvas.gap(height + 8.0);
}

fn draw_header(canvas: &mut Canvas, stub: &PayStub) {
    let period = &stub.period;
    let right = canvas.right_edge();

    let baseline = canvas.advance(TITLE_SIZE);
    canvas.text(canvas.left_edge(), baseline, TITLE_SIZE, Weight::Bold, Align::Left, "Contractor Pay Stub");

    let details = [
        format!("Pay Period: {} - {}", date_label(period.start), date_label(period.end)),
        format!("Pay Date: {}", date_label(period.pay_date)),
        format!(
            "Paid via: {}",
            stub.paid_via.map(PaymentMethod::label).unwrap_or("-")
        ),
    ];
    for (i, line) in details.into_iter().enumerate() {
        // The first detail line shares the title's row
        let baseline = if i == 0 { baseline } else { canvas.advance(SMALL_SIZE) };
        canvas.text(right, baseline, SMALL_SIZE, Weight::Regular, Align::Right, line);
    }

    canvas.gap(8.0);
}

fn draw_issuer(canvas: &mut Canvas, issuer_lines: &[String]) {
    for line in issuer_lines {
        let baseline = canvas.advance(ISSUER_SIZE);
        canvas.text(canvas.left_edge(), baseline, ISSUER_SIZE, Weight::Bold, Align::Left, line);
    }
    canvas.gap(8.0);
}

fn draw_contractor(canvas: &mut Canvas, contractor: &Contractor) {
    let name = match contractor.name.trim() {
        "" => "-",
        name => name,
    };
    let baseline = canvas.advance(HEADING_SIZE);
    canvas.text(
        canvas.left_edge(),
        baseline,
        HEADING_SIZE,
        Weight::Bold,
        Align::Left,
        format!("Pay Stub for {name}"),
    );

    let mut contact = Vec::new();
    if !contractor.id.trim().is_empty() {
        contact.push(format!("ID: {}", contractor.id.trim()));
    }
    if !contractor.email.trim().is_empty() {
        contact.push(format!("Email: {}", contractor.email.trim()));
    }
    if !contact.is_empty() {
        let baseline = canvas.advance(SMALL_SIZE);
        canvas.text(canvas.left_edge(), baseline, SMALL_SIZE, Weight::Regular, Align::Left, contact.join("    "));
    }
    canvas.gap(6.0);
}

/// Column anchors as fractions of the content width
struct Columns {
    category: f32,
    note: f32,
    note_width: f32,
    quantity_right: f32,
    rate_right: f32,
    amount_right: f32,
}

impl Columns {
    fn for_canvas(canvas: &Canvas) -> Self {
        let left = canvas.left_edge();
        let content = canvas.right_edge() - left;
        Self {
            category: left,
            note: left + content * 0.30,
            note_width: content * 0.32,
            quantity_right: left + content * 0.70,
            rate_right: left + content * 0.85,
            amount_right: left + content,
        }
    }
}

fn draw_items(canvas: &mut Canvas, items: &ItemList, policy: &MileagePolicy) {
    let columns = Columns::for_canvas(canvas);

    let baseline = canvas.advance(BODY_SIZE);
    let header = [
        (columns.category, Align::Left, "Category"),
        (columns.note, Align::Left, "Notes"),
        (columns.quantity_right, Align::Right, "Qty"),
        (columns.rate_right, Align::Right, "Rate"),
        (columns.amount_right, Align::Right, "Amount"),
    ];
    for (x, align, label) in header {
        canvas.muted_text(x, baseline, BODY_SIZE, align, label);
    }
    canvas.rule();

    for item in items {
        let baseline = canvas.advance(BODY_SIZE);
        let note = match item.note.trim() {
            "" => "-".to_string(),
            note => fit_text(note, columns.note_width, BODY_SIZE),
        };
        canvas.text(columns.category, baseline, BODY_SIZE, Weight::Regular, Align::Left, item.category.label());
        canvas.text(columns.note, baseline, BODY_SIZE, Weight::Regular, Align::Left, note);
        canvas.text(
            columns.quantity_right,
            baseline,
            BODY_SIZE,
            Weight::Regular,
            Align::Right,
            format_number(item.quantity_or_zero()),
        );
        canvas.text(
            columns.rate_right,
            baseline,
            BODY_SIZE,
            Weight::Regular,
            Align::Right,
            format_currency(item.rate_or_zero()),
        );
        canvas.text(
            columns.amount_right,
            baseline,
            BODY_SIZE,
            Weight::Bold,
            Align::Right,
            format_currency(item.amount()),
        );
        canvas.rule();

        if policy.applies_to(item.category) && item.miles_or_zero() > 0.0 {
            let baseline = canvas.advance(BODY_SIZE);
            canvas.text(
                columns.category + 14.0,
                baseline,
                BODY_SIZE,
                Weight::Regular,
                Align::Left,
                format!("Mileage ({})", item.category.label()),
            );
            canvas.text(
                columns.quantity_right,
                baseline,
                BODY_SIZE,
                Weight::Regular,
                Align::Right,
                format_number(item.miles_or_zero()),
            );
            canvas.text(
                columns.rate_right,
                baseline,
                BODY_SIZE,
                Weight::Regular,
                Align::Right,
                format!("{}/mi", format_currency(policy.rate)),
            );
            canvas.text(
                columns.amount_right,
                baseline,
                BODY_SIZE,
                Weight::Bold,
                Align::Right,
                format_currency(policy.reimbursement(item)),
            );
            canvas.rule();
        }
    }

    canvas.gap(10.0);
}

fn draw_totals(canvas: &mut Canvas, totals: &Totals) {
    let right = canvas.right_edge();
    let rows = [
        (BODY_SIZE, Weight::Regular, format!("Gross Earnings: {}", format_currency(totals.earnings))),
        (BODY_SIZE, Weight::Regular, format!("+ Mileage: {}", format_currency(totals.mileage))),
        (NET_SIZE, Weight::Bold, format!("Net Pay: {}", format_currency(totals.net))),
    ];
    for (size, weight, text) in rows {
        let baseline = canvas.advance(size);
        canvas.text(right, baseline, size, weight, Align::Right, text);
    }
}

/// Quantities print without trailing zeros, like a form field shows them
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let text = format!("{value:.4}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * HELVETICA_CHAR_WIDTH_RATIO
}

/// Shorten `text` with a trailing "..." so it fits in `max_width`
fn fit_text(text: &str, max_width: f32, size: f32) -> String {
    if text_width(text, size) <= max_width {
        return text.to_string();
    }
    let keep = ((max_width / (size * HELVETICA_CHAR_WIDTH_RATIO)) as usize).saturating_sub(3);
    let mut shortened: String = text.chars().take(keep).collect();
    shortened.push_str("...");
    shortened
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Weight {
    Regular,
    Bold,
}

impl Weight {
    fn font(self) -> BuiltinFont {
        match self {
            Weight::Regular => BuiltinFont::Helvetica,
            Weight::Bold => BuiltinFont::HelveticaBold,
        }
    }
}

struct TextRun {
    x: f32,
    /// Distance from the top of the surface
    baseline: f32,
    size: f32,
    weight: Weight,
    gray: f32,
    text: String,
}

struct PlacedLogo {
    x: f32,
    /// Distance from the top of the surface to the logo's top edge
    top: f32,
    width: f32,
    height: f32,
    image: RawImage,
}

/// Top-down drawing surface that grows as content is added
struct Canvas {
    width: f32,
    cursor: f32,
    runs: Vec<TextRun>,
    rules: Vec<f32>,
    logo: Option<PlacedLogo>,
}

impl Canvas {
    fn new(width: f32) -> Self {
        Self {
            width,
            cursor: MARGIN_PT,
            runs: Vec::new(),
            rules: Vec::new(),
            logo: None,
        }
    }

    fn left_edge(&self) -> f32 {
        MARGIN_PT
    }

    fn right_edge(&self) -> f32 {
        self.width - MARGIN_PT
    }

    /// Move down one line of `size` and return its baseline
    fn advance(&mut self, size: f32) -> f32 {
        self.cursor += size * LINE_HEIGHT;
        self.cursor
    }

    fn gap(&mut self, points: f32) {
        self.cursor += points;
    }

    /// Horizontal rule just below the current line
    fn rule(&mut self) {
        self.cursor += 4.0;
        self.rules.push(self.cursor);
    }

    fn text(
        &mut self,
        x: f32,
        baseline: f32,
        size: f32,
        weight: Weight,
        align: Align,
        text: impl Into<String>,
    ) {
        self.push_run(x, baseline, size, weight, align, 0.0, text.into());
    }

    fn muted_text(&mut self, x: f32, baseline: f32, size: f32, align: Align, text: &str) {
        self.push_run(x, baseline, size, Weight::Regular, align, MUTED_GRAY, text.to_string());
    }

    #[allow(clippy::too_many_arguments)]
    fn push_run(
        &mut self,
        x: f32,
        baseline: f32,
        size: f32,
        weight: Weight,
        align: Align,
        gray: f32,
        text: String,
    ) {
        let x = match align {
            Align::Left => x,
            Align::Right => x - text_width(&text, size),
        };
        self.runs.push(TextRun {
            x,
            baseline,
            size,
            weight,
            gray,
            text,
        });
    }

    fn finish(self) -> Result<StubSurface> {
        let height = self.cursor + MARGIN_PT;
        let mut doc = PdfDocument::new("Pay Stub");
        let mut ops = Vec::new();

        if let Some(logo) = &self.logo {
            let id = doc.add_image(&logo.image);
            ops.push(Op::UseXobject {
                id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(logo.x)),
                    translate_y: Some(Pt(height - logo.top - logo.height)),
                    scale_x: Some(logo.width / logo.image.width as f32),
                    scale_y: Some(logo.height / logo.image.height as f32),
                    rotate: None,
                    dpi: Some(72.0),
                },
            });
        }

        if !self.rules.is_empty() {
            ops.push(Op::SetOutlineThickness { pt: Pt(RULE_WIDTH) });
            ops.push(Op::SetOutlineColor {
                col: gray(RULE_GRAY),
            });
        }
        for y in &self.rules {
            let y = height - y;
            ops.push(Op::DrawPolygon {
                polygon: Polygon {
                    rings: vec![PolygonRing {
                        points: vec![
                            LinePoint {
                                p: Point {
                                    x: Pt(MARGIN_PT),
                                    y: Pt(y),
                                },
                                bezier: false,
                            },
                            LinePoint {
                                p: Point {
                                    x: Pt(self.width - MARGIN_PT),
                                    y: Pt(y),
                                },
                                bezier: false,
                            },
                        ],
                    }],
                    mode: PaintMode::Stroke,
                    winding_order: WindingOrder::EvenOdd,
                },
            });
        }

        let mut lines = Vec::with_capacity(self.runs.len());
        for run in self.runs {
            ops.push(Op::SetFillColor { col: gray(run.gray) });
            ops.push(Op::StartTextSection);
            ops.push(Op::SetTextCursor {
                pos: Point {
                    x: Pt(run.x),
                    y: Pt(height - run.baseline),
                },
            });
            ops.push(Op::SetFontSizeBuiltinFont {
                font: run.weight.font(),
                size: Pt(run.size),
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(run.text.clone())],
                font: run.weight.font(),
            });
            ops.push(Op::EndTextSection);
            lines.push(run.text);
        }

        doc.pages = vec![PdfPage::new(
            Mm::from(Pt(self.width)),
            Mm::from(Pt(height)),
            ops,
        )];

        let mut warnings = Vec::new();
        let pdf_bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if pdf_bytes.is_empty() {
            return Err(RenderError::Write("Laid-out stub produced no bytes".to_string()));
        }

        Ok(StubSurface {
            width: self.width,
            height,
            pdf_bytes,
            lines,
        })
    }
}

fn gray(level: f32) -> printpdf::color::Color {
    printpdf::color::Color::Rgb(Rgb::new(level, level, level, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stub() -> PayStub {
        let items = ItemList::new()
            .with_item(
                LineItem::new(Category::PhotoCapture)
                    .with_quantity(1.0)
                    .with_rate(5.0)
                    .with_miles(30.0)
                    .with_note("Smith claim"),
            )
            .with_item(
                LineItem::new(Category::Bookkeeping)
                    .with_quantity(2.0)
                    .with_rate(10.0)
                    .with_miles(50.0),
            );
        PayStub {
            contractor: Contractor {
                name: "Jane Doe".into(),
                ..Default::default()
            },
            items,
            ..Default::default()
        }
    }

    #[test]
    fn test_layout_prints_rows_and_totals() {
        let stub = sample_stub();
        let options = StubOptions::default();
        let totals = stub.totals(&options.mileage);
        let surface = layout_pay_stub(&stub, &totals, &options, None).unwrap();

        assert!(surface.contains_text("Pay Stub for Jane Doe"));
        assert!(surface.contains_text("Smith claim"));
        assert!(surface.contains_text("Gross Earnings: $25.00"));
        assert!(surface.contains_text("+ Mileage: $6.00"));
        assert!(surface.contains_text("Net Pay: $31.00"));
        assert!(surface.pdf_bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_mileage_row_only_for_eligible_items_with_miles() {
        let stub = sample_stub();
        let options = StubOptions::default();
        let surface = layout_pay_stub(&stub, &stub.totals(&options.mileage), &options, None).unwrap();

        let mileage_rows = surface
            .lines
            .iter()
            .filter(|line| line.starts_with("Mileage ("))
            .count();
        assert_eq!(mileage_rows, 1);
        assert!(surface.contains_text("$0.20/mi"));
    }

    #[test]
    fn test_surface_grows_with_items() {
        let options = StubOptions::default();
        let short = PayStub::default();
        let long = PayStub {
            items: (0..40).map(|_| LineItem::new(Category::Others)).collect(),
            ..Default::default()
        };

        let short_surface = layout_pay_stub(&short, &Totals::default(), &options, None).unwrap();
        let long_surface = layout_pay_stub(&long, &Totals::default(), &options, None).unwrap();

        assert_eq!(short_surface.width, long_surface.width);
        assert!(long_surface.height > short_surface.height * 2.0);
    }

    #[test]
    fn test_missing_details_use_placeholders() {
        let options = StubOptions::default();
        let surface = layout_pay_stub(&PayStub::default(), &Totals::default(), &options, None).unwrap();

        assert!(surface.contains_text("Pay Stub for -"));
        assert!(surface.contains_text("Paid via: -"));
        assert!(surface.contains_text("adjuster@dollcappraisals.com"));
    }

    fn logo_png(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([20, 60, 140, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_logo_sits_above_the_header() {
        let stub = sample_stub();
        let options = StubOptions::default();
        let totals = stub.totals(&options.mileage);

        let plain = layout_pay_stub(&stub, &totals, &options, None).unwrap();
        let png = logo_png(80, 20);
        let with_logo = layout_pay_stub(&stub, &totals, &options, Some(png.as_slice())).unwrap();

        assert!((with_logo.height - plain.height - LOGO_HEIGHT - 8.0).abs() < 1e-3);
        assert_eq!(with_logo.lines, plain.lines);
        assert!(with_logo.pdf_bytes.len() > plain.pdf_bytes.len());
    }

    #[test]
    fn test_wide_logo_is_held_to_the_content_width() {
        let options = StubOptions::default();
        let plain = layout_pay_stub(&PayStub::default(), &Totals::default(), &options, None).unwrap();
        let png = logo_png(400, 10);
        let surface =
            layout_pay_stub(&PayStub::default(), &Totals::default(), &options, Some(png.as_slice())).unwrap();

        let content_width = options.page_size().width - 2.0 * MARGIN_PT;
        let logo_height = content_width / 40.0;
        assert!((surface.height - plain.height - logo_height - 8.0).abs() < 1e-3);
    }

    #[test]
    fn test_undecodable_logo_is_left_out() {
        let options = StubOptions::default();
        let plain = layout_pay_stub(&PayStub::default(), &Totals::default(), &options, None).unwrap();
        let garbage = layout_pay_stub(
            &PayStub::default(),
            &Totals::default(),
            &options,
            Some(&b"not an image"[..]),
        )
        .unwrap();

        assert_eq!(garbage.height, plain.height);
        assert!(garbage.pdf_bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.125), "0.125");
    }

    #[test]
    fn test_fit_text_truncates_long_notes() {
        let long = "x".repeat(200);
        let fitted = fit_text(&long, 100.0, 10.0);
        assert!(fitted.ends_with("..."));
        assert!(text_width(&fitted, 10.0) <= 100.0);
        assert_eq!(fit_text("short", 100.0, 10.0), "short");
    }
}
