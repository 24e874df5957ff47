//! SVG charts rendered with Plotters.
//!
//! Every entry point renders one file and maps drawing failures to exit
//! code 5. Histograms are drawn as step outlines with a statistics box
//! (entries, mean, std dev) in the top-right corner of their panel.

use std::error::Error;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::AppError;
use crate::hist::Histogram1D;

type DrawResult = Result<(), Box<dyn Error>>;

/// Size of a single-panel chart in pixels.
pub const CHART_SIZE: (u32, u32) = (800, 600);

/// A straight dashed guide line in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guide {
    pub from: (f64, f64),
    pub to: (f64, f64),
}

/// Description of a scan chart.
#[derive(Debug, Clone)]
pub struct LineChart<'a> {
    pub title: &'a str,
    pub x_label: &'a str,
    pub y_label: &'a str,
    /// Fixed y range; when `None` the range follows the data.
    pub y_range: Option<(f64, f64)>,
    pub guides: Vec<Guide>,
}

/// Draw `hists` on a `rows × cols` grid, one histogram per panel.
pub fn draw_histogram_grid(
    path: &Path,
    hists: &[Histogram1D],
    (rows, cols): (usize, usize),
    line_width: u32,
) -> Result<(), AppError> {
    let size = (CHART_SIZE.0 * cols.max(1) as u32 / 2 + 200, CHART_SIZE.1 * rows.max(1) as u32 / 2 + 150);
    render_grid(path, hists, (rows, cols), line_width, size).map_err(|e| render_error(path, e))
}

/// Draw the toy NLL distribution with the data value marked.
pub fn draw_toy_nll(path: &Path, nll_hist: &Histogram1D, nll_data: f64, p_value: f64) -> Result<(), AppError> {
    render_toys(path, nll_hist, nll_data, p_value).map_err(|e| render_error(path, e))
}

/// Draw a scan curve with optional dashed guides.
pub fn draw_line_chart(path: &Path, points: &[(f64, f64)], chart: &LineChart<'_>) -> Result<(), AppError> {
    render_line_chart(path, points, chart).map_err(|e| render_error(path, e))
}

fn render_error(path: &Path, err: Box<dyn Error>) -> AppError {
    AppError::new(5, format!("Failed to render {}: {err}", path.display()))
}

fn render_grid(
    path: &Path,
    hists: &[Histogram1D],
    (rows, cols): (usize, usize),
    line_width: u32,
    size: (u32, u32),
) -> DrawResult {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((rows, cols));

    for (panel, hist) in panels.iter().zip(hists) {
        draw_histogram(panel, hist, line_width, &BLUE)?;
        draw_stats_box(panel, hist)?;
    }

    root.present()?;
    Ok(())
}

fn render_toys(path: &Path, nll_hist: &Histogram1D, nll_data: f64, p_value: f64) -> DrawResult {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let y_top = nll_hist.maximum().max(1.0) * 1.05;
    let mut chart = ChartBuilder::on(&root)
        .caption(&nll_hist.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(nll_hist.x_min()..nll_hist.x_max(), 0.0..y_top * 1.15)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc(nll_hist.x_label.as_str())
        .y_desc(nll_hist.y_label.as_str())
        .draw()?;

    chart
        .draw_series(LineSeries::new(step_points(nll_hist), BLUE.stroke_width(2)))?
        .label("Toys NLL")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

    chart
        .draw_series(LineSeries::new(
            vec![(nll_data, 0.0), (nll_data, y_top)],
            RED.stroke_width(2),
        ))?
        .label(format!("Data NLL = {nll_data:.2}"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    let span = nll_hist.x_max() - nll_hist.x_min();
    chart.draw_series(std::iter::once(Text::new(
        format!("p-value (NLL_toy ≥ NLL_data) = {p_value:.3}"),
        (nll_hist.x_min() + 0.05 * span, y_top * 1.08),
        ("sans-serif", 16).into_font(),
    )))?;

    root.present()?;
    Ok(())
}

fn render_line_chart(path: &Path, points: &[(f64, f64)], spec: &LineChart<'_>) -> DrawResult {
    let (x_min, x_max) = bounds(points.iter().map(|p| p.0)).ok_or("no finite points to draw")?;
    let (y_min, y_max) = match spec.y_range {
        Some(range) => range,
        None => {
            let (lo, hi) = bounds(points.iter().map(|p| p.1)).ok_or("no finite points to draw")?;
            let pad = ((hi - lo) * 0.05).max(1e-9);
            (lo - pad, hi + pad)
        }
    };

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(spec.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc(spec.x_label)
        .y_desc(spec.y_label)
        .draw()?;

    // Points outside a fixed y range are clipped by the plotting area.
    chart.draw_series(LineSeries::new(
        points.iter().copied().filter(|(_, y)| y.is_finite()),
        BLUE.stroke_width(2),
    ))?;

    for guide in &spec.guides {
        chart.draw_series(DashedLineSeries::new(
            vec![guide.from, guide.to],
            6,
            4,
            BLACK.stroke_width(1),
        ))?;
    }

    root.present()?;
    Ok(())
}

fn draw_histogram(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    hist: &Histogram1D,
    line_width: u32,
    color: &RGBColor,
) -> DrawResult {
    let y_top = hist.maximum().max(1.0) * 1.1;
    let mut chart = ChartBuilder::on(area)
        .caption(&hist.title, ("sans-serif", 16))
        .margin(8)
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d(hist.x_min()..hist.x_max(), 0.0..y_top)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc(hist.x_label.as_str())
        .y_desc(hist.y_label.as_str())
        .x_labels(6)
        .y_labels(6)
        .draw()?;

    chart.draw_series(LineSeries::new(step_points(hist), color.stroke_width(line_width)))?;
    Ok(())
}

fn draw_stats_box(area: &DrawingArea<SVGBackend<'_>, Shift>, hist: &Histogram1D) -> DrawResult {
    let (w, _) = area.dim_in_pixel();
    let (box_w, line_h) = (150i32, 16i32);
    let x0 = w as i32 - box_w - 12;
    let y0 = 30i32;

    let lines = [
        hist.name.clone(),
        format!("Entries  {}", hist.entries()),
        format!("Mean     {:.4}", hist.mean()),
        format!("Std Dev  {:.4}", hist.std_dev()),
    ];

    area.draw(&Rectangle::new(
        [(x0, y0), (x0 + box_w, y0 + line_h * lines.len() as i32 + 6)],
        WHITE.filled(),
    ))?;
    area.draw(&Rectangle::new(
        [(x0, y0), (x0 + box_w, y0 + line_h * lines.len() as i32 + 6)],
        BLACK.stroke_width(1),
    ))?;
    for (i, line) in lines.iter().enumerate() {
        area.draw(&Text::new(
            line.as_str(),
            (x0 + 6, y0 + 4 + line_h * i as i32),
            ("monospace", 12).into_font(),
        ))?;
    }
    Ok(())
}

/// Outline of a histogram: `(x_min, 0)`, then the top edge of every bin,
/// then back down to `(x_max, 0)`.
pub fn step_points(hist: &Histogram1D) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(2 * hist.n_bins() + 2);
    out.push((hist.x_min(), 0.0));
    for i in 0..hist.n_bins() {
        let c = hist.bin_content(i);
        out.push((hist.bin_low_edge(i), c));
        out.push((hist.bin_up_edge(i), c));
    }
    out.push((hist.x_max(), 0.0));
    out
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (lo.is_finite() && hi > lo).then_some((lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_hist() -> Histogram1D {
        let mut h = Histogram1D::new("h", "Test", 4, 0.0, 4.0).unwrap().with_labels("x", "Counts");
        for x in [0.5, 1.5, 1.5, 2.5, 2.5, 2.5] {
            h.fill(x);
        }
        h
    }

    #[test]
    fn step_outline_traces_every_bin() {
        let pts = step_points(&sample_hist());
        assert_eq!(pts.len(), 10);
        assert_eq!(pts[0], (0.0, 0.0));
        assert_eq!(pts[3], (1.0, 2.0));
        assert_eq!(pts[6], (3.0, 3.0));
        assert_eq!(*pts.last().unwrap(), (4.0, 0.0));
    }

    #[test]
    fn charts_are_written_as_svg() {
        let dir = tempfile::tempdir().unwrap();
        let grid = dir.path().join("grid.svg");
        let toys = dir.path().join("toys.svg");
        let scan = dir.path().join("scan.svg");
        let h = sample_hist();

        draw_histogram_grid(&grid, &[h.clone(), h.clone()], (1, 2), 2).unwrap();
        draw_toy_nll(&toys, &h, 2.0, 0.25).unwrap();
        draw_line_chart(
            &scan,
            &[(0.0, 1.0), (1.0, 0.0), (2.0, 1.0)],
            &LineChart {
                title: "scan",
                x_label: "μ",
                y_label: "2ΔNLL",
                y_range: Some((0.0, 4.5)),
                guides: vec![Guide { from: (0.0, 1.0), to: (1.0, 1.0) }],
            },
        )
        .unwrap();

        for path in [&grid, &toys, &scan] {
            let text = std::fs::read_to_string(path).unwrap();
            assert!(text.contains("<svg"), "{}", path.display());
        }
        assert!(std::fs::read_to_string(&toys).unwrap().contains("Data NLL = 2.00"));
    }

    #[test]
    fn flat_curve_is_a_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.svg");
        let chart = LineChart {
            title: "t",
            x_label: "x",
            y_label: "y",
            y_range: None,
            guides: Vec::new(),
        };
        let err = draw_line_chart(&path, &[(1.0, 1.0)], &chart).unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }
}
