use plotters::prelude::*;

use crate::calculator::{
    operations::{LineKind, WaterfallStep},
    wholesale::WholesaleTrend,
};

pub type ChartResult = Result<String, Box<dyn std::error::Error>>;

const COST: RGBColor = RGBColor(217, 83, 79);
const REVENUE: RGBColor = RGBColor(40, 167, 69);
const BUDGET: RGBColor = RGBColor(253, 126, 20);
const AXIS: RGBColor = RGBColor(120, 120, 120);

fn step_color(kind: LineKind) -> RGBColor {
    match kind {
        LineKind::Cost => COST,
        LineKind::Revenue => REVENUE,
        _ => BUDGET,
    }
}

/// Min and max of `values`, padded by 10% of the span so bars never touch the frame.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = ((hi - lo) * 0.1).max(1.0);
    (lo - pad, hi + pad)
}

fn empty_chart(width: u32, height: u32, message: &str) -> ChartResult {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;
        let x = i32::try_from(width / 2).unwrap_or(0) - 40;
        let y = i32::try_from(height / 2).unwrap_or(0);
        root.draw(&Text::new(message, (x, y), ("sans-serif", 16).into_font().color(&AXIS)))?;
        root.present()?;
    }
    Ok(svg)
}

/// Village operation waterfall: one floating bar per step, starting at the
/// running total before it.
pub fn waterfall_svg(steps: &[WaterfallStep], width: u32, height: u32) -> ChartResult {
    if steps.is_empty() {
        return empty_chart(width, height, "No budget data");
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let (y_min, y_max) = padded_range(steps.iter().flat_map(|s| [s.base, s.base + s.value]));
        let n = steps.len() as f64;

        let mut chart = ChartBuilder::on(&root)
            .caption("Village Operation Budget", ("sans-serif", 20))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(-0.5..n - 0.5, y_min..y_max)?;

        let label_at = |x: &f64| {
            let i = x.round();
            if (x - i).abs() > 1e-6 || i < 0.0 {
                return String::new();
            }
            steps
                .get(i as usize)
                .map(|s| s.label.to_string())
                .unwrap_or_default()
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(steps.len())
            .x_label_formatter(&label_at)
            .y_label_formatter(&|v| crate::format::money(*v))
            .y_desc("Annual ($)")
            .label_style(("sans-serif", 11))
            .axis_style(AXIS)
            .draw()?;

        chart.draw_series(steps.iter().enumerate().map(|(i, s)| {
            let x = i as f64;
            Rectangle::new(
                [(x - 0.35, s.base), (x + 0.35, s.base + s.value)],
                step_color(s.kind).filled(),
            )
        }))?;

        root.present()?;
    }
    Ok(svg)
}

/// Smoothed wholesale prices, one line per state, in c/kWh.
pub fn wholesale_svg(trend: &WholesaleTrend, width: u32, height: u32) -> ChartResult {
    let has_points = trend
        .series
        .iter()
        .any(|s| s.points.iter().any(|p| p.display_c_per_kwh.is_some()));
    if trend.periods.is_empty() || !has_points {
        return empty_chart(width, height, "No wholesale data");
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let values = trend
            .series
            .iter()
            .flat_map(|s| s.points.iter().filter_map(|p| p.display_c_per_kwh));
        let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let pad = ((hi - lo) * 0.1).max(1.0);
        let n = trend.periods.len() as f64;

        let mut chart = ChartBuilder::on(&root)
            .caption("Wholesale price trend (rolling average)", ("sans-serif", 20))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..n - 0.5, (lo - pad)..(hi + pad))?;

        let tick_label = |x: &f64| {
            let i = x.round();
            if (x - i).abs() > 1e-6 || i < 0.0 {
                return String::new();
            }
            trend
                .year_ticks
                .iter()
                .find(|(pos, _)| *pos == i as usize)
                .map(|(_, year)| year.to_string())
                .unwrap_or_default()
        };

        chart
            .configure_mesh()
            .x_labels(trend.periods.len())
            .x_label_formatter(&tick_label)
            .y_desc("c/kWh")
            .label_style(("sans-serif", 12))
            .axis_style(AXIS)
            .draw()?;

        for (i, series) in trend.series.iter().enumerate() {
            let color = Palette99::pick(i).to_rgba();
            let points: Vec<(f64, f64)> = series
                .points
                .iter()
                .filter_map(|p| p.display_c_per_kwh.map(|v| (p.position as f64, v)))
                .collect();

            chart
                .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
                .label(series.state.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            chart.draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
            )?;
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(AXIS)
            .draw()?;

        root.present()?;
    }
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::wholesale::{build_trend, TrendParams};
    use tariff_client::domain::WholesalePricePoint;

    fn step(label: &'static str, value: f64, base: f64, kind: LineKind) -> WaterfallStep {
        WaterfallStep {
            label,
            value,
            base,
            kind,
        }
    }

    #[test]
    fn waterfall_renders_svg_with_labels() {
        let steps = vec![
            step("Total Cost", -1000.0, 0.0, LineKind::Cost),
            step("Usage Revenue", 600.0, -1000.0, LineKind::Revenue),
            step("OPEX Budget", 400.0, -400.0, LineKind::Budget),
        ];
        let svg = waterfall_svg(&steps, 640, 360).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Usage Revenue"));
    }

    #[test]
    fn empty_inputs_render_placeholder() {
        let svg = waterfall_svg(&[], 640, 360).unwrap();
        assert!(svg.contains("No budget data"));
        assert!(svg.contains("#787878"));

        let svg = wholesale_svg(&WholesaleTrend::default(), 640, 360).unwrap();
        assert!(svg.contains("No wholesale data"));
    }

    #[test]
    fn wholesale_renders_state_legend() {
        let points: Vec<WholesalePricePoint> = (1..=4)
            .map(|q| WholesalePricePoint {
                state: Some("NSW".to_string()),
                year: 2022,
                quarter: format!("Q{q}"),
                average_price: Some(100.0 + f64::from(q)),
            })
            .collect();
        let trend = build_trend(&points, &TrendParams::default(), None);
        let svg = wholesale_svg(&trend, 800, 400).unwrap();
        assert!(svg.contains("NSW"));
        assert!(svg.contains("2022"));
    }
}
