//! Plotters-based renderers for the two summary charts.

use std::io::Cursor;

use plotters::prelude::*;
use tracing::debug;

use threadvibe_core::{ChartRenderer, LabelDistribution};

const PIE_SIZE: (u32, u32) = (600, 600);
const BAR_SIZE: (u32, u32) = (800, 400);

/// Fixed sentiment vocabulary: raw model label, human-named variant
/// newer exports use, display name, slice color.
const SENTIMENT_SLICES: &[(&str, &str, &str, RGBColor)] = &[
    ("LABEL_0", "negative", "Negative", RGBColor(0xff, 0x6b, 0x6b)),
    ("LABEL_1", "neutral", "Neutral", RGBColor(0x4e, 0xcd, 0xc4)),
    ("LABEL_2", "positive", "Positive", RGBColor(0x45, 0xb7, 0xd1)),
];

const BAR_COLOR: RGBColor = RGBColor(0x6c, 0x5c, 0xe7);

/// Renders distributions into PNG bytes via an in-memory bitmap.
#[derive(Debug, Default)]
pub struct PngChartRenderer;

impl PngChartRenderer {
    pub fn new() -> Self {
        Self
    }

    fn sentiment_png(&self, dist: &LabelDistribution) -> anyhow::Result<Vec<u8>> {
        let sizes: Vec<f64> = SENTIMENT_SLICES
            .iter()
            .map(|&(raw, named, _, _)| slice_mass(dist, raw, named))
            .collect();
        let total: f64 = sizes.iter().sum();
        anyhow::ensure!(total > 0.0, "sentiment distribution has no mass to chart");

        let labels: Vec<String> = SENTIMENT_SLICES
            .iter()
            .map(|(_, _, display, _)| display.to_string())
            .collect();
        let colors: Vec<RGBColor> = SENTIMENT_SLICES.iter().map(|(_, _, _, c)| *c).collect();

        let (w, h) = PIE_SIZE;
        let mut rgb = vec![0u8; (w * h * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut rgb, (w, h)).into_drawing_area();
            root.fill(&WHITE)?;
            let root = root.titled("Sentiment Distribution", ("sans-serif", 30))?;

            let dims = root.dim_in_pixel();
            let center = (dims.0 as i32 / 2, dims.1 as i32 / 2);
            let radius = dims.0.min(dims.1) as f64 * 0.35;
            let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            pie.label_style(("sans-serif", 24).into_font());
            pie.percentages(("sans-serif", 18).into_font());
            root.draw(&pie)?;
            root.present()?;
        }

        debug!(total, "rendered sentiment pie");
        encode_png(w, h, rgb)
    }

    fn emotion_png(&self, dist: &LabelDistribution) -> anyhow::Result<Vec<u8>> {
        let bars = emotion_bars(dist);
        anyhow::ensure!(!bars.is_empty(), "emotion distribution has no mass to chart");
        let y_max = bars[0].1 * 1.15;

        let (w, h) = BAR_SIZE;
        let mut rgb = vec![0u8; (w * h * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut rgb, (w, h)).into_drawing_area();
            root.fill(&WHITE)?;

            let mut chart = ChartBuilder::on(&root)
                .caption("Emotional Tone Distribution", ("sans-serif", 30))
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(0i32..bars.len() as i32, 0f64..y_max)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(bars.len())
                .x_label_formatter(&|x| {
                    bars.get(*x as usize)
                        .map(|(label, _)| label.clone())
                        .unwrap_or_default()
                })
                .y_desc("Share of comments")
                .draw()?;

            chart.draw_series(bars.iter().enumerate().map(|(i, (_, share))| {
                Rectangle::new([(i as i32, 0.0), (i as i32 + 1, *share)], BAR_COLOR.filled())
            }))?;
            root.present()?;
        }

        debug!(bars = bars.len(), "rendered emotion bars");
        encode_png(w, h, rgb)
    }
}

impl ChartRenderer for PngChartRenderer {
    fn render_sentiment(&self, dist: &LabelDistribution) -> anyhow::Result<Vec<u8>> {
        self.sentiment_png(dist)
    }

    fn render_emotion(&self, dist: &LabelDistribution) -> anyhow::Result<Vec<u8>> {
        self.emotion_png(dist)
    }
}

/// Mass of one sentiment slice; either label variant counts, absent
/// labels contribute zero.
fn slice_mass(dist: &LabelDistribution, raw: &str, named: &str) -> f64 {
    dist.get(raw)
        .or_else(|| dist.get(named))
        .copied()
        .unwrap_or(0.0)
}

/// Emotion bars sorted by descending share, labels title-cased for
/// display, zero-share labels dropped.
fn emotion_bars(dist: &LabelDistribution) -> Vec<(String, f64)> {
    let mut bars: Vec<(String, f64)> = dist
        .iter()
        .filter(|&(_, &share)| share > 0.0)
        .map(|(label, &share)| (title_case(label), share))
        .collect();
    bars.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    bars
}

fn title_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn encode_png(w: u32, h: u32, rgb: Vec<u8>) -> anyhow::Result<Vec<u8>> {
    let img = image::RgbImage::from_raw(w, h, rgb)
        .ok_or_else(|| anyhow::anyhow!("rgb buffer size mismatch"))?;
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok(png)
}
