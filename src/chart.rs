//! Bar-chart rendering for course marks histograms.
//!
//! The renderer sits behind a trait so report generation can be exercised
//! without touching the filesystem or a raster backend.

use anyhow::{Result, anyhow};
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::aggregate::Histogram;

/// Turns a marks histogram into an image file and returns its path.
pub trait ChartRenderer {
    fn render(&self, course_id: u32, histogram: &Histogram) -> Result<PathBuf>;
}

/// Renders marks-frequency bar charts as PNG files via plotters.
///
/// The output file is named `<course_id>.png` inside the configured images
/// directory, so repeated renders for the same course overwrite the previous
/// image. Bars are drawn in ascending marks order, making the output a pure
/// function of the histogram contents.
pub struct BarChartRenderer {
    images_dir: PathBuf,
}

impl BarChartRenderer {
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
        }
    }
}

impl ChartRenderer for BarChartRenderer {
    fn render(&self, course_id: u32, histogram: &Histogram) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.images_dir)?;
        let path = self.images_dir.join(format!("{course_id}.png"));

        let entries = histogram.sorted_entries();
        debug!(course_id, bars = entries.len(), path = %path.display(), "Rendering bar chart");

        draw_bars(&path, course_id, &entries)
            .map_err(|e| anyhow!("failed to render chart for course {course_id}: {e}"))?;

        Ok(path)
    }
}

fn draw_bars(
    path: &Path,
    course_id: u32,
    entries: &[(u32, u32)],
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (800, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_min = entries.first().map(|(m, _)| *m as i32).unwrap_or(0);
    let x_max = entries.last().map(|(m, _)| *m as i32).unwrap_or(0);
    let y_max = entries.iter().map(|(_, c)| *c as i32).max().unwrap_or(0);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Marks Frequency Distribution for Course id: {course_id}"),
            ("sans-serif", 22),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d((x_min - 1)..(x_max + 2), 0..(y_max + 1))?;

    chart
        .configure_mesh()
        .x_desc("Marks")
        .y_desc("Frequency")
        .disable_x_mesh()
        .draw()?;

    chart.draw_series(entries.iter().map(|(marks, count)| {
        Rectangle::new(
            [(*marks as i32, 0), (*marks as i32 + 1, *count as i32)],
            BLUE.filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}
