// ============================================================
// Layer 6 — Report Writer
// ============================================================
// The two batch outputs:
//
//   1. One annotated copy of every successfully analysed scan —
//      the matched reference points get a red dot inside a red
//      square, every crossed box gets a red square frame. A
//      glance at the annotated image shows what the classifier
//      decided and where the alignment anchored.
//
//   2. results.csv — one row per analysed sheet (crossed count,
//      empty count, crossed options per question) plus a TOTAL
//      row for the batch. Opens directly in any spreadsheet
//      application.

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::aggregate::Aggregator;
use crate::domain::geometry::Pixel;
use crate::domain::sheet::SheetResult;

/// Marker square radius around a matched reference point.
const POINT_MARKER_RADIUS: i32 = 20;

/// Marker square radius around a crossed box.
const BOX_MARKER_RADIUS: i32 = 30;

/// Line width of the marker squares, drawn inward.
const MARKER_LINE_WIDTH: i32 = 2;

/// Radius of the dot drawn on a matched reference point.
const POINT_DOT_RADIUS: i32 = 1;

const MARKER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

pub struct ReportWriter {
    out_dir: PathBuf,
}

impl ReportWriter {
    /// Create the writer, creating the output directory if needed.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let out_dir = PathBuf::from(dir.into());
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("Cannot create output directory '{}'", out_dir.display()))?;
        Ok(Self { out_dir })
    }

    /// Write the annotated copy of one scan, under the same file
    /// name as the input. Returns the path written.
    pub fn write_annotated_image(&self, scan_path: &Path, sheet: &SheetResult) -> Result<PathBuf> {
        let mut img = image::open(scan_path)
            .with_context(|| format!("Cannot reopen scan '{}'", scan_path.display()))?
            .to_rgb8();

        for mark in &sheet.marks {
            draw_dot(&mut img, *mark);
            draw_square(&mut img, *mark, POINT_MARKER_RADIUS);
        }
        for center in sheet.crossed_centers() {
            draw_square(&mut img, center, BOX_MARKER_RADIUS);
        }

        let out_path = self.out_dir.join(&sheet.file_name);
        img.save(&out_path)
            .with_context(|| format!("Cannot save annotated image '{}'", out_path.display()))?;
        Ok(out_path)
    }

    /// Write results.csv from the aggregate. Returns the path written.
    pub fn write_spreadsheet(&self, aggregate: &Aggregator) -> Result<PathBuf> {
        let path = self.out_dir.join("results.csv");
        let mut f = fs::File::create(&path)
            .with_context(|| format!("Cannot create spreadsheet '{}'", path.display()))?;

        write!(f, "file,crossed,empty")?;
        for q in 1..=aggregate.question_count() {
            write!(f, ",q{q}")?;
        }
        writeln!(f)?;

        for tally in aggregate.tallies() {
            write!(f, "{},{},{}", tally.file_name, tally.crossed, tally.empty)?;
            for options in &tally.selections {
                let cell = options
                    .iter()
                    .map(|o| o.to_string())
                    .collect::<Vec<_>>()
                    .join(";");
                write!(f, ",{cell}")?;
            }
            writeln!(f)?;
        }

        let summary = aggregate.summary();
        write!(f, "TOTAL,{},{}", summary.crossed, summary.empty)?;
        for _ in 0..aggregate.question_count() {
            write!(f, ",")?;
        }
        writeln!(f)?;

        tracing::info!("Spreadsheet written to '{}'", path.display());
        Ok(path)
    }
}

/// A hollow square frame around `center`, MARKER_LINE_WIDTH pixels
/// thick, drawn inward from the given radius.
fn draw_square(img: &mut RgbImage, center: Pixel, radius: i32) {
    for inset in 0..MARKER_LINE_WIDTH {
        let r = radius - inset;
        let side = (2 * r + 1) as u32;
        draw_hollow_rect_mut(
            img,
            Rect::at(center.x - r, center.y - r).of_size(side, side),
            MARKER_COLOR,
        );
    }
}

/// A filled dot directly on a matched reference point.
fn draw_dot(img: &mut RgbImage, center: Pixel) {
    for dy in -POINT_DOT_RADIUS..=POINT_DOT_RADIUS {
        for dx in -POINT_DOT_RADIUS..=POINT_DOT_RADIUS {
            let x = center.x + dx;
            let y = center.y + dy;
            if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
                img.put_pixel(x as u32, y as u32, MARKER_COLOR);
            }
        }
    }
}
