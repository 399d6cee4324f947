use std::fs;
use std::ops::Range;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};
use plotters::coord::Shift;
use plotters::prelude::*;
use pmu_stats::{Metric, MissRate, Table};

use crate::config::{ChartConfig, ImageFormat};
use crate::dataset::{ChartKind, Dataset};

/// Width of each bar in the grouped chart; bars sit at `row ± width / 2`
const GROUPED_BAR_WIDTH: f64 = 0.35;
const STACKED_BAR_WIDTH: f64 = 0.8;

const FONT: &str = "sans-serif";

/// Glyphs for all chart text, so rendering does not depend on system fonts
static FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Makes the bundled face available to plotters under [`FONT`].
///
/// Registering again replaces the entry, so this is safe to call per render.
fn register_fonts() -> Result<()> {
    plotters::style::register_font(FONT, FontStyle::Normal, FONT_DATA)
        .map_err(|_| anyhow::anyhow!("Bundled chart font is not a valid font file"))
}

/// Renders the three charts for `table` into the configured directory.
///
/// Returns the files written. An empty table renders nothing.
pub fn render_all(table: &Table, dataset: &Dataset, config: &ChartConfig) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            config.output_dir.display()
        )
    })?;

    if table.is_empty() {
        warn!("No rows for {}, skipping charts", dataset.prefix());
        return Ok(Vec::new());
    }
    register_fonts()?;

    let mut written = Vec::with_capacity(ChartKind::ALL.len());
    for chart in ChartKind::ALL {
        let path = config
            .output_dir
            .join(dataset.file_name(chart, config.format));
        let size = (config.width, config.height);

        let result = match config.format {
            ImageFormat::Png => {
                draw(BitMapBackend::new(&path, size).into_drawing_area(), chart, table, dataset)
            }
            ImageFormat::Svg => {
                draw(SVGBackend::new(&path, size).into_drawing_area(), chart, table, dataset)
            }
        };
        result.with_context(|| format!("Failed to render chart: {}", path.display()))?;

        info!("Wrote {}", path.display());
        written.push(path);
    }

    Ok(written)
}

fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    chart: ChartKind,
    table: &Table,
    dataset: &Dataset,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let title = dataset.title(chart);
    match chart {
        ChartKind::InstructionsCycles => grouped_bars(&root, &title, table)?,
        ChartKind::CacheMisses => stacked_bars(&root, &title, table)?,
        ChartKind::MissRates => miss_rate_lines(&root, &title, table)?,
    }
    root.present()?;
    Ok(())
}

fn grouped_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    table: &Table,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let labels: Vec<&str> = table.labels().collect();
    let instructions = table.column_or_zero(Metric::Instructions.name());
    let cycles = table.column_or_zero(Metric::Cycles.name());
    let y_range = value_range(instructions.iter().chain(&cycles).copied());

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 24).into_font())
        .margin(15)
        .x_label_area_size(x_label_area(&labels))
        .y_label_area_size(90)
        .build_cartesian_2d(row_range(labels.len()), y_range)?;

    let formatter = |x: &f64| row_label(&labels, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&formatter)
        .x_label_style((FONT, 14).into_font().transform(FontTransform::Rotate90))
        .y_desc("Count")
        .draw()?;

    let series = [
        ("Instructions", &instructions, -GROUPED_BAR_WIDTH / 2.0),
        ("Cycles", &cycles, GROUPED_BAR_WIDTH / 2.0),
    ];
    for (index, &(name, values, offset)) in series.iter().enumerate() {
        let style = Palette99::pick(index).filled();
        chart
            .draw_series(values.iter().enumerate().map(|(row, value)| {
                let center = row as f64 + offset;
                Rectangle::new(
                    [
                        (center - GROUPED_BAR_WIDTH / 2.0, 0.0),
                        (center + GROUPED_BAR_WIDTH / 2.0, *value),
                    ],
                    style,
                )
            }))?
            .label(name)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], style));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn stacked_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    table: &Table,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let labels: Vec<&str> = table.labels().collect();
    let layers = [
        ("L1I Misses", table.column_or_zero(Metric::L1iMiss.name())),
        ("L1D Misses", table.column_or_zero(Metric::L1dMiss.name())),
        ("LLC Misses", table.column_or_zero(Metric::LlcMiss.name())),
    ];

    // Running base of each bar as layers are stacked bottom up
    let mut bases = vec![0.0; labels.len()];
    let mut stacks = Vec::with_capacity(layers.len());
    for (_, values) in &layers {
        let stack: Vec<(f64, f64)> = bases
            .iter()
            .zip(values)
            .map(|(base, value)| (*base, base + value))
            .collect();
        bases = stack.iter().map(|(_, top)| *top).collect();
        stacks.push(stack);
    }
    let y_range = value_range(stacks.iter().flatten().flat_map(|(low, high)| [*low, *high]));

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 24).into_font())
        .margin(15)
        .x_label_area_size(x_label_area(&labels))
        .y_label_area_size(90)
        .build_cartesian_2d(row_range(labels.len()), y_range)?;

    let formatter = |x: &f64| row_label(&labels, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&formatter)
        .x_label_style((FONT, 14).into_font().transform(FontTransform::Rotate90))
        .y_desc("Miss Count")
        .draw()?;

    for (index, ((name, _), stack)) in layers.iter().zip(&stacks).enumerate() {
        let style = Palette99::pick(index).filled();
        chart
            .draw_series(stack.iter().enumerate().map(|(row, (low, high))| {
                let center = row as f64;
                Rectangle::new(
                    [
                        (center - STACKED_BAR_WIDTH / 2.0, *low),
                        (center + STACKED_BAR_WIDTH / 2.0, *high),
                    ],
                    style,
                )
            }))?
            .label(*name)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], style));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn miss_rate_lines<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    table: &Table,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let labels: Vec<&str> = table.labels().collect();
    let rates: Vec<(MissRate, Vec<f64>)> = MissRate::ALL
        .into_iter()
        .map(|rate| (rate, table.column_or_zero(rate.name())))
        .collect();

    // Rates are plotted from a floor of 0
    let top = rates
        .iter()
        .flat_map(|(_, values)| values.iter().copied())
        .fold(0.0_f64, f64::max);
    let top = if top > 0.0 { top * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 24).into_font())
        .margin(15)
        .x_label_area_size(x_label_area(&labels))
        .y_label_area_size(90)
        .build_cartesian_2d(row_range(labels.len()), 0.0..top)?;

    let formatter = |x: &f64| row_label(&labels, *x);
    chart
        .configure_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&formatter)
        .x_label_style((FONT, 14).into_font().transform(FontTransform::Rotate90))
        .y_desc("Miss Rate")
        .draw()?;

    for (index, (rate, values)) in rates.iter().enumerate() {
        let color = Palette99::pick(index).mix(1.0);
        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(row, value)| (row as f64, *value))
            .collect();

        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
            .label(rate.label())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart.draw_series(
            points
                .into_iter()
                .map(|point| Circle::new(point, 4, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

/// X range putting row `i` at `i`, with half a slot of room at either end
fn row_range(rows: usize) -> Range<f64> {
    -0.5..(rows as f64 - 0.5)
}

/// Tick label for x position `x`: the row label at integral positions
fn row_label(labels: &[&str], x: f64) -> String {
    let nearest = x.round();
    if (x - nearest).abs() > 1e-6 || nearest < 0.0 {
        return String::new();
    }
    labels
        .get(nearest as usize)
        .map(|label| label.to_string())
        .unwrap_or_default()
}

/// Y range covering `values` and 0, padded at the top
fn value_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (low, high) = values.fold((0.0_f64, 0.0_f64), |(low, high), value| {
        (low.min(value), high.max(value))
    });
    if high <= low {
        return low..low + 1.0;
    }
    low..high + (high - low) * 0.05
}

/// Room below the plot for rotated row labels
fn x_label_area(labels: &[&str]) -> u32 {
    let longest = labels.iter().map(|label| label.len()).max().unwrap_or(0) as u32;
    (longest * 9 + 20).clamp(40, 240)
}
