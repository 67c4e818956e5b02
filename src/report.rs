use crate::analysis::SensorStatistics;
use crate::chart::ChartSet;
use crate::config::AssetConfig;
use crate::error::ReportError;
use anyhow::{Context, Result};
use printpdf::image_crate::codecs::jpeg::JpegDecoder;
use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Rgb,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

// Letter page, in millimeters.
const PAGE_WIDTH: f64 = 215.9;
const PAGE_HEIGHT: f64 = 279.4;

// Header and footer bands span the page width at fixed page-relative
// positions on every page, independent of content flow.
const BAND_HEIGHT: f64 = 17.6;
const CONTENT_TOP: f64 = PAGE_HEIGHT - BAND_HEIGHT - 4.0;
const CONTENT_BOTTOM: f64 = BAND_HEIGHT + 4.0;

const CHART_WIDTH: f64 = 152.4;
const CHART_HEIGHT: f64 = 88.9;
const ELEMENT_GAP: f64 = 4.0;
const TRAILING_SPACE: f64 = 8.5;

const IMAGE_DPI: f64 = 300.0;

const TABLE_ROW_HEIGHT: f64 = 7.5;
const TABLE_FONT_SIZE: f64 = 9.0;
const TABLE_COL_WIDTHS: [f64; 7] = [38.1, 25.4, 25.4, 25.4, 25.4, 25.4, 25.4];
const TABLE_HEADERS: [&str; 7] = [
    "Sensor",
    "Min Value",
    "Max Value",
    "Average Value",
    "Mean Value",
    "Median Value",
    "No. Deviations",
];

/// Lays the rendered charts and the statistics table out into a paginated
/// PDF with the branding images drawn on every page.
pub struct ReportAssembler {
    header: PathBuf,
    footer: PathBuf,
}

impl ReportAssembler {
    /// Verify the branding assets up front.
    ///
    /// # Errors
    /// Returns [`ReportError::MissingAsset`] if either image is absent, so
    /// the run can abort before any rendering or document write happens.
    pub fn new(assets: &AssetConfig) -> Result<Self, ReportError> {
        for path in [&assets.header, &assets.footer] {
            if !path.is_file() {
                return Err(ReportError::MissingAsset(path.clone()));
            }
        }

        Ok(Self {
            header: assets.header.clone(),
            footer: assets.footer.clone(),
        })
    }

    /// Assemble the report document and write it to `out`.
    ///
    /// Fixed order: combined chart, one chart per sensor in active-set
    /// order, then the statistics table and trailing spacing. The file is
    /// fully written and flushed before this returns.
    pub fn assemble(
        &self,
        charts: &ChartSet,
        statistics: &[SensorStatistics],
        out: &Path,
    ) -> Result<()> {
        let (doc, page, layer) = PdfDocument::new(
            "Daily Deviation Report",
            Mm(PAGE_WIDTH as f32),
            Mm(PAGE_HEIGHT as f32),
            "content",
        );

        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .context("failed to load body font")?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .context("failed to load heading font")?;

        let first_layer = doc.get_page(page).get_layer(layer);
        let mut cursor = Cursor {
            doc,
            layer: first_layer,
            y: CONTENT_TOP,
            font,
            bold,
            header: &self.header,
            footer: &self.footer,
        };
        // First page decorations; later pages get theirs on creation.
        cursor.decorate_page()?;

        cursor.place_image(&charts.combined, CHART_WIDTH, CHART_HEIGHT)?;
        for (_, path) in &charts.sensors {
            cursor.place_image(path, CHART_WIDTH, CHART_HEIGHT)?;
        }

        cursor.draw_table(statistics)?;
        cursor.y -= TRAILING_SPACE;

        let file = File::create(out).with_context(|| format!("failed to create {out:?}"))?;
        let mut writer = BufWriter::new(file);
        cursor
            .doc
            .save(&mut writer)
            .context("failed to write report document")?;
        writer.flush().context("failed to flush report document")?;

        Ok(())
    }
}

/// Flowing layout state: current page layer and the y position (in mm from
/// the page bottom) where the next element starts.
struct Cursor<'a> {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    y: f64,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    header: &'a Path,
    footer: &'a Path,
}

impl Cursor<'_> {
    fn decorate_page(&self) -> Result<()> {
        self.draw_image_at(self.header, 0.0, PAGE_HEIGHT - BAND_HEIGHT, PAGE_WIDTH, BAND_HEIGHT)
            .context("failed to draw header image")?;
        self.draw_image_at(self.footer, 0.0, 0.0, PAGE_WIDTH, BAND_HEIGHT)
            .context("failed to draw footer image")?;
        Ok(())
    }

    fn new_page(&mut self) -> Result<()> {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH as f32), Mm(PAGE_HEIGHT as f32), "content");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = CONTENT_TOP;
        self.decorate_page()
    }

    fn ensure_space(&mut self, height: f64) -> Result<()> {
        if self.y - height < CONTENT_BOTTOM {
            self.new_page()?;
        }
        Ok(())
    }

    fn place_image(&mut self, path: &Path, width: f64, height: f64) -> Result<()> {
        self.ensure_space(height + ELEMENT_GAP)?;
        let x = (PAGE_WIDTH - width) / 2.0;
        self.draw_image_at(path, x, self.y - height, width, height)
            .with_context(|| format!("failed to place image {path:?}"))?;
        self.y -= height + ELEMENT_GAP;
        Ok(())
    }

    fn draw_image_at(&self, path: &Path, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        let image = load_image(path)?;

        let native_width = image.image.width.0 as f64 * 25.4 / IMAGE_DPI;
        let native_height = image.image.height.0 as f64 * 25.4 / IMAGE_DPI;

        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(x as f32)),
                translate_y: Some(Mm(y as f32)),
                scale_x: Some((width / native_width) as f32),
                scale_y: Some((height / native_height) as f32),
                dpi: Some(IMAGE_DPI as f32),
                ..Default::default()
            },
        );

        Ok(())
    }

    fn draw_table(&mut self, statistics: &[SensorStatistics]) -> Result<()> {
        // The table is kept together: it moves to a fresh page rather than
        // splitting across a page boundary.
        let table_height = (statistics.len() + 1) as f64 * TABLE_ROW_HEIGHT;
        self.ensure_space(table_height + ELEMENT_GAP)?;

        let table_width: f64 = TABLE_COL_WIDTHS.iter().sum();
        let x0 = (PAGE_WIDTH - table_width) / 2.0;
        let y0 = self.y;

        self.draw_row(x0, y0, &TABLE_HEADERS.map(String::from), true);
        for (row_idx, stats) in statistics.iter().enumerate() {
            let cells = [
                stats.name.clone(),
                format!("{:.2}", stats.min),
                format!("{:.2}", stats.max),
                format!("{:.2}", stats.mean),
                format!("{:.2}", stats.mean),
                format!("{:.2}", stats.median),
                format!("{}", stats.deviation_count),
            ];
            let y = y0 - (row_idx + 1) as f64 * TABLE_ROW_HEIGHT;
            self.draw_row(x0, y, &cells, false);
        }

        self.draw_grid(x0, y0, statistics.len() + 1);

        self.y -= table_height + ELEMENT_GAP;
        Ok(())
    }

    fn draw_row(&self, x0: f64, y_top: f64, cells: &[String; 7], heading: bool) {
        let font = if heading { &self.bold } else { &self.font };
        // Baseline sits a little above the lower rule of the row.
        let baseline = y_top - TABLE_ROW_HEIGHT + 2.2;

        let mut x = x0;
        for (cell, width) in cells.iter().zip(TABLE_COL_WIDTHS) {
            self.layer
                .use_text(cell.clone(), TABLE_FONT_SIZE as f32, Mm((x + 1.8) as f32), Mm(baseline as f32), font);
            x += width;
        }
    }

    fn draw_grid(&self, x0: f64, y0: f64, n_rows: usize) {
        let table_width: f64 = TABLE_COL_WIDTHS.iter().sum();
        let y_bottom = y0 - n_rows as f64 * TABLE_ROW_HEIGHT;

        self.layer
            .set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        self.layer.set_outline_thickness(0.75);

        for row in 0..=n_rows {
            let y = y0 - row as f64 * TABLE_ROW_HEIGHT;
            self.stroke_line(x0, y, x0 + table_width, y);
        }

        let mut x = x0;
        self.stroke_line(x, y0, x, y_bottom);
        for width in TABLE_COL_WIDTHS {
            x += width;
            self.stroke_line(x, y0, x, y_bottom);
        }
    }

    fn stroke_line(&self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1 as f32), Mm(y1 as f32)), false),
                (Point::new(Mm(x2 as f32), Mm(y2 as f32)), false),
            ],
            is_closed: false,
        });
    }
}

fn load_image(path: &Path) -> Result<Image> {
    let file = File::open(path).with_context(|| format!("failed to open {path:?}"))?;
    let mut reader = BufReader::new(file);

    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let image = match extension.as_str() {
        "png" => Image::try_from(
            PngDecoder::new(&mut reader).with_context(|| format!("failed to decode {path:?}"))?,
        ),
        _ => Image::try_from(
            JpegDecoder::new(&mut reader).with_context(|| format!("failed to decode {path:?}"))?,
        ),
    };

    image.with_context(|| format!("failed to embed {path:?}"))
}
