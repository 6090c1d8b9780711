use std::f64::consts::PI;

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD as B64, Engine};
use handlebars::html_escape;
use image::{ExtendedColorType, ImageEncoder};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::options::{ChartFormat, ChartOptions};

// --- DARK PALETTE ---
const BG: RGBColor = RGBColor(0, 0, 0);
const TEXT: RGBColor = RGBColor(255, 255, 255);
const GRID: RGBColor = RGBColor(80, 80, 80);
const SERIES: [RGBColor; 10] = [
    RGBColor(99, 110, 250),
    RGBColor(239, 85, 59),
    RGBColor(0, 204, 150),
    RGBColor(171, 99, 250),
    RGBColor(255, 161, 90),
    RGBColor(25, 211, 243),
    RGBColor(255, 102, 146),
    RGBColor(182, 232, 128),
    RGBColor(255, 151, 255),
    RGBColor(254, 203, 82),
];

/// Most x-axis labels drawn before plotters starts skipping.
const MAX_X_LABELS: usize = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    StackedBar,
    GroupedBar,
    Pie,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub name: String,
    /// One value per category.
    pub values: Vec<usize>,
}

/// Renderer input: categories along x (or pie slices) and one or more series.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub kind: ChartKind,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

/// Embeddable markup for one chart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartFragment(pub String);

pub trait ChartRenderer: Send + Sync {
    fn render(&self, spec: &ChartSpec) -> Result<ChartFragment>;
}

impl ChartSpec {
    pub fn bar(title: impl Into<String>, x_label: &str, y_label: &str, rows: Vec<(String, usize)>) -> Self {
        Self::single(ChartKind::Bar, title.into(), x_label, y_label, rows)
    }

    pub fn pie(title: impl Into<String>, rows: Vec<(String, usize)>) -> Self {
        Self::single(ChartKind::Pie, title.into(), "", "", rows)
    }

    /// `rows` are `(category, series, count)`; both axes keep first-seen order.
    pub fn multi(
        kind: ChartKind,
        title: impl Into<String>,
        x_label: &str,
        y_label: &str,
        rows: Vec<(String, String, usize)>,
    ) -> Self {
        let mut categories: Vec<String> = Vec::new();
        let mut series: Vec<Series> = Vec::new();

        for (cat, name, count) in rows {
            let ci = position_or_push(&mut categories, cat);
            let si = match series.iter().position(|s| s.name == name) {
                Some(i) => i,
                None => {
                    series.push(Series { name, values: Vec::new() });
                    series.len() - 1
                }
            };
            let values = &mut series[si].values;
            if values.len() <= ci {
                values.resize(ci + 1, 0);
            }
            values[ci] += count;
        }

        for s in &mut series {
            s.values.resize(categories.len(), 0);
        }

        Self {
            title: title.into(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            kind,
            categories,
            series,
        }
    }

    fn single(kind: ChartKind, title: String, x_label: &str, y_label: &str, rows: Vec<(String, usize)>) -> Self {
        let (categories, values) = rows.into_iter().unzip();
        Self {
            title,
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            kind,
            categories,
            series: vec![Series { name: String::new(), values }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() || self.series.iter().all(|s| s.values.iter().all(|v| *v == 0))
    }

    /// Tallest bar: the per-category sum when stacked.
    pub fn y_max(&self) -> usize {
        match self.kind {
            ChartKind::StackedBar => (0..self.categories.len())
                .map(|i| self.series.iter().map(|s| s.values[i]).sum::<usize>())
                .max()
                .unwrap_or(0),
            _ => self.series.iter().flat_map(|s| s.values.iter().copied()).max().unwrap_or(0),
        }
    }

    /// Pie slices as `(label, share)`, shares summing to 1.
    pub fn pie_shares(&self) -> Vec<(String, f64)> {
        let Some(values) = self.series.first().map(|s| &s.values) else {
            return Vec::new();
        };
        let total: usize = values.iter().sum();
        if total == 0 {
            return Vec::new();
        }
        self.categories
            .iter()
            .zip(values)
            .map(|(c, v)| (c.clone(), *v as f64 / total as f64))
            .collect()
    }
}

fn position_or_push(items: &mut Vec<String>, item: String) -> usize {
    match items.iter().position(|c| *c == item) {
        Some(i) => i,
        None => {
            items.push(item);
            items.len() - 1
        }
    }
}

/// Placeholder used instead of an empty axis.
pub fn no_data_fragment(title: &str) -> ChartFragment {
    ChartFragment(format!(
        r#"<div class="chart chart-empty"><h3>{}</h3><p>No data</p></div>"#,
        html_escape(title)
    ))
}

pub struct PlottersRenderer {
    options: ChartOptions,
}

impl PlottersRenderer {
    pub fn new(options: ChartOptions) -> Self {
        Self { options }
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render(&self, spec: &ChartSpec) -> Result<ChartFragment> {
        if spec.is_empty() {
            return Ok(no_data_fragment(&spec.title));
        }

        let (w, h) = (self.options.chart_width, self.options.chart_height);
        let max_label = self.options.max_label_len;

        match self.options.chart_format {
            ChartFormat::Svg => {
                let mut svg = String::new();
                {
                    let root = SVGBackend::with_string(&mut svg, (w, h)).into_drawing_area();
                    draw_chart(&root, spec, max_label)?;
                    root.present()?;
                }
                Ok(ChartFragment(format!(r#"<div class="chart">{}</div>"#, svg)))
            }
            ChartFormat::Png => {
                let mut buffer = vec![0u8; w as usize * h as usize * 3];
                {
                    let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
                    draw_chart(&root, spec, max_label)?;
                    root.present()?;
                }
                let png = encode_png(&buffer, w, h)?;
                Ok(ChartFragment(format!(
                    r#"<div class="chart"><img alt="{}" src="data:image/png;base64,{}"/></div>"#,
                    html_escape(&spec.title),
                    B64.encode(png)
                )))
            }
        }
    }
}

fn draw_chart<B: DrawingBackend>(root: &DrawingArea<B, Shift>, spec: &ChartSpec, max_label: usize) -> Result<()>
where
    B::ErrorType: 'static,
{
    root.fill(&BG)?;
    match spec.kind {
        ChartKind::Pie => draw_pie(root, spec, max_label),
        _ => draw_bars(root, spec, max_label),
    }
}

fn draw_bars<B: DrawingBackend>(root: &DrawingArea<B, Shift>, spec: &ChartSpec, max_label: usize) -> Result<()>
where
    B::ErrorType: 'static,
{
    let n = spec.categories.len();
    let y_max = (spec.y_max() as f64 * 1.1).max(1.0);

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, ("sans-serif", 22).into_font().color(&TEXT))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)?;

    let labels = &spec.categories;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n.min(MAX_X_LABELS))
        .y_labels(8)
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .axis_style(GRID)
        .label_style(("sans-serif", 13).into_font().color(&TEXT))
        .axis_desc_style(("sans-serif", 15).into_font().color(&TEXT))
        .x_label_formatter(&|x| category_label(labels, *x, max_label))
        .y_label_formatter(&|y| format!("{:.0}", y))
        .draw()?;

    let series_count = spec.series.len().max(1);
    let mut stacked = vec![0usize; n];

    for (si, series) in spec.series.iter().enumerate() {
        let color = SERIES[si % SERIES.len()];
        let bars: Vec<Rectangle<(f64, f64)>> = series
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0)
            .map(|(i, v)| {
                let x = i as f64;
                let (x0, x1, y0, y1) = match spec.kind {
                    ChartKind::StackedBar => (x - 0.4, x + 0.4, stacked[i], stacked[i] + v),
                    ChartKind::GroupedBar => {
                        let width = 0.8 / series_count as f64;
                        let left = x - 0.4 + width * si as f64;
                        (left, left + width, 0, *v)
                    }
                    _ => (x - 0.4, x + 0.4, 0, *v),
                };
                Rectangle::new([(x0, y0 as f64), (x1, y1 as f64)], color.filled())
            })
            .collect();

        if spec.kind == ChartKind::StackedBar {
            for (i, v) in series.values.iter().enumerate() {
                stacked[i] += v;
            }
        }

        let anno = chart.draw_series(bars)?;
        if !series.name.is_empty() {
            anno.label(series.name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
    }

    if spec.series.iter().any(|s| !s.name.is_empty()) {
        chart
            .configure_series_labels()
            .background_style(&BG)
            .border_style(&GRID)
            .label_font(("sans-serif", 13).into_font().color(&TEXT))
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;
    }

    Ok(())
}

fn draw_pie<B: DrawingBackend>(root: &DrawingArea<B, Shift>, spec: &ChartSpec, max_label: usize) -> Result<()>
where
    B::ErrorType: 'static,
{
    let area = root.titled(&spec.title, ("sans-serif", 22).into_font().color(&TEXT))?;
    let (w, h) = area.dim_in_pixel();
    let radius = (w.min(h) as f64 * 0.4).max(10.0);
    let center = ((w as f64 * 0.35) as i32, (h as f64 / 2.0) as i32);

    let mut start = -PI / 2.0;
    for (i, (label, share)) in spec.pie_shares().into_iter().enumerate() {
        let color = SERIES[i % SERIES.len()];
        let sweep = share * 2.0 * PI;

        if share > 0.0 {
            area.draw(&Polygon::new(wedge(center, radius, start, sweep), color.filled()))?;
        }
        start += sweep;

        let lx = (w as f64 * 0.7) as i32;
        let ly = 20 + i as i32 * 22;
        area.draw(&Rectangle::new([(lx, ly), (lx + 12, ly + 12)], color.filled()))?;
        area.draw(&Text::new(
            format!("{} ({:.1}%)", truncate(&label, max_label), share * 100.0),
            (lx + 18, ly),
            ("sans-serif", 14).into_font().color(&TEXT),
        ))?;
    }
    Ok(())
}

/// Polygon approximating a pie slice, about one point per degree.
fn wedge(center: (i32, i32), radius: f64, start: f64, sweep: f64) -> Vec<(i32, i32)> {
    let steps = ((sweep.to_degrees()).ceil() as usize).max(2);
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for k in 0..=steps {
        let a = start + sweep * k as f64 / steps as f64;
        points.push((
            center.0 + (radius * a.cos()).round() as i32,
            center.1 + (radius * a.sin()).round() as i32,
        ));
    }
    points
}

fn category_label(labels: &[String], x: f64, max_len: usize) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels
        .get(idx as usize)
        .map(|l| truncate(l, max_len))
        .unwrap_or_default()
}

fn truncate(label: &str, max_len: usize) -> String {
    if label.is_empty() {
        return "(none)".to_string();
    }
    if label.chars().count() <= max_len {
        return label.to_string();
    }
    let head: String = label.chars().take(max_len.saturating_sub(1)).collect();
    format!("{}…", head)
}

fn encode_png(buffer: &[u8], w: u32, h: u32) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png_bytes)
        .write_image(buffer, w, h, ExtendedColorType::Rgb8)
        .map_err(|e| anyhow!("PNG Error: {}", e))?;
    Ok(png_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(items: &[(&str, &str, usize)]) -> Vec<(String, String, usize)> {
        items.iter().map(|(c, s, n)| (c.to_string(), s.to_string(), *n)).collect()
    }

    #[test]
    fn multi_pivots_rows_into_series() {
        let spec = ChartSpec::multi(
            ChartKind::StackedBar,
            "Fired Alerts by Hour",
            "Hour",
            "Number of Alerts",
            rows(&[("9", "CPUHigh", 1), ("13", "CPUHigh", 2), ("13", "DiskLow", 4)]),
        );

        assert_eq!(spec.categories, vec!["9", "13"]);
        assert_eq!(spec.series.len(), 2);
        assert_eq!(spec.series[0].values, vec![1, 2]);
        assert_eq!(spec.series[1].values, vec![0, 4]);
        assert_eq!(spec.y_max(), 6);
    }

    #[test]
    fn grouped_y_max_is_tallest_single_bar() {
        let spec = ChartSpec::multi(
            ChartKind::GroupedBar,
            "Alert Types by Subscription",
            "Subscription",
            "Count",
            rows(&[("sub-a", "Fired", 3), ("sub-a", "Resolved", 2)]),
        );
        assert_eq!(spec.y_max(), 3);
    }

    #[test]
    fn pie_shares_sum_to_one() {
        let spec = ChartSpec::pie("Alerts by Severity", vec![("Sev1".into(), 1), ("Sev3".into(), 3)]);
        let shares = spec.pie_shares();
        assert_eq!(shares.len(), 2);
        assert!((shares.iter().map(|(_, s)| s).sum::<f64>() - 1.0).abs() < 1e-9);
        assert!((shares[1].1 - 0.75).abs() < 1e-9);
    }

    #[test]
    fn empty_spec_renders_placeholder() {
        let spec = ChartSpec::bar("Alerts by <Resource>", "Resource", "Number of Alerts", Vec::new());
        assert!(spec.is_empty());

        let fragment = PlottersRenderer::new(ChartOptions::default()).render(&spec).unwrap();
        assert!(fragment.0.contains("No data"));
        assert!(fragment.0.contains("Alerts by &lt;Resource&gt;"));
    }

    fn renderer(format: ChartFormat) -> PlottersRenderer {
        PlottersRenderer::new(ChartOptions {
            chart_width: 480,
            chart_height: 320,
            chart_format: format,
            ..ChartOptions::default()
        })
    }

    fn sample_specs() -> Vec<ChartSpec> {
        vec![
            ChartSpec::bar("Alerts by Resource", "Resource", "Number of Alerts", vec![("CPU<High>".into(), 3), ("vm-2".into(), 1)]),
            ChartSpec::pie("Alerts by Severity", vec![("Sev1".into(), 2), ("Sev3".into(), 5)]),
            ChartSpec::multi(
                ChartKind::StackedBar,
                "Fired Alerts by Hour",
                "Hour",
                "Number of Alerts",
                rows(&[("9", "CPUHigh", 1), ("13", "CPUHigh", 2), ("13", "DiskLow", 4)]),
            ),
            ChartSpec::multi(
                ChartKind::GroupedBar,
                "Alert Types by Subscription",
                "Subscription",
                "Count",
                rows(&[("sub-a", "Fired", 3), ("sub-a", "Resolved", 2), ("sub-b", "Fired", 1)]),
            ),
        ]
    }

    #[test]
    fn svg_charts_use_dark_scheme() {
        let r = renderer(ChartFormat::Svg);
        for spec in sample_specs() {
            let svg = r.render(&spec).unwrap().0;
            let lower = svg.to_lowercase();

            assert!(svg.contains("<svg"), "{}", spec.title);
            assert!(lower.contains("#000000"), "no dark background in {}", spec.title);
            assert!(lower.contains("#ffffff"), "no white text in {}", spec.title);
            assert!(!svg.contains("No data"));
        }
    }

    #[test]
    fn svg_labels_are_escaped() {
        let spec = &sample_specs()[0];
        let svg = renderer(ChartFormat::Svg).render(spec).unwrap().0;

        assert!(!svg.contains("CPU<High>"));
        assert!(svg.contains("CPU&lt;High&gt;"));
    }

    #[test]
    fn single_named_series_still_gets_legend() {
        let spec = ChartSpec::multi(
            ChartKind::StackedBar,
            "Unresolved Alerts by Hour for sub-x",
            "Hour",
            "Number of Alerts",
            rows(&[("13", "DiskLow", 2)]),
        );
        let svg = renderer(ChartFormat::Svg).render(&spec).unwrap().0;
        assert!(svg.contains("DiskLow"));
    }

    #[test]
    fn png_charts_embed_data_uri() {
        let r = renderer(ChartFormat::Png);
        for spec in sample_specs() {
            let html = r.render(&spec).unwrap().0;

            let (_, rest) = html.split_once(r#"src="data:image/png;base64,"#).unwrap();
            let encoded = rest.split('"').next().unwrap();
            let png = B64.decode(encoded).unwrap();
            assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n", "{}", spec.title);
        }
    }

    #[test]
    fn png_alt_text_is_escaped() {
        let spec = ChartSpec::bar("Alerts by <Resource>", "Resource", "Number of Alerts", vec![("vm-1".into(), 1)]);
        let html = renderer(ChartFormat::Png).render(&spec).unwrap().0;
        assert!(html.contains(r#"alt="Alerts by &lt;Resource&gt;""#));
    }

    #[test]
    fn wedge_starts_at_center_and_spans_arc() {
        let pts = wedge((100, 100), 50.0, -PI / 2.0, PI / 2.0);
        assert_eq!(pts[0], (100, 100));
        assert_eq!(pts[1], (100, 50));
        assert_eq!(*pts.last().unwrap(), (150, 100));
    }

    #[test]
    fn labels_only_on_whole_categories() {
        let labels = vec!["CPUHigh".to_string(), String::new(), "AVeryLongAlertRuleName".to_string()];
        assert_eq!(category_label(&labels, 0.0, 10), "CPUHigh");
        assert_eq!(category_label(&labels, 0.5, 10), "");
        assert_eq!(category_label(&labels, 1.0, 10), "(none)");
        assert_eq!(category_label(&labels, 2.0, 10), "AVeryLong…");
        assert_eq!(category_label(&labels, 3.0, 10), "");
    }
}
