use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Serialize;
use tariff_client::domain::WholesalePricePoint;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendParams {
    pub min_year: i32,
    pub rolling_window: usize,
    /// Added to the smoothed price (converted to c/kWh) to approximate a retail level.
    pub retail_offset_c_per_kwh: f64,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            min_year: 2021,
            rolling_window: 4,
            retail_offset_c_per_kwh: 23.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period: String,
    /// Index into [`WholesaleTrend::periods`].
    pub position: usize,
    pub average_price: Option<f64>,
    pub smoothed: Option<f64>,
    pub display_c_per_kwh: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSeries {
    pub state: String,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WholesaleTrend {
    pub periods: Vec<String>,
    /// Position of each year's Q1, for axis ticks.
    pub year_ticks: Vec<(usize, i32)>,
    /// Every state present in the data, sorted.
    pub all_states: Vec<String>,
    /// Series for the selected states only.
    pub series: Vec<StateSeries>,
}

/// Trailing mean over up to `window` points; missing prices are skipped and a
/// window with no prices at all has no mean.
fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    let mut buf: VecDeque<Option<f64>> = VecDeque::with_capacity(window);
    values
        .iter()
        .map(|v| {
            if buf.len() == window {
                buf.pop_front();
            }
            buf.push_back(*v);
            let present: Vec<f64> = buf.iter().flatten().copied().collect();
            (!present.is_empty()).then(|| present.iter().sum::<f64>() / present.len() as f64)
        })
        .collect()
}

/// Smoothed quarterly price per state.
///
/// `states` restricts the returned series; `None` or an empty slice keeps all.
pub fn build_trend(
    points: &[WholesalePricePoint],
    params: &TrendParams,
    states: Option<&[String]>,
) -> WholesaleTrend {
    let recent: Vec<&WholesalePricePoint> =
        points.iter().filter(|p| p.year >= params.min_year).collect();

    let period_keys: BTreeSet<(i32, &str)> =
        recent.iter().map(|p| (p.year, p.quarter.as_str())).collect();
    let periods: Vec<String> = period_keys.iter().map(|(y, q)| format!("{y}-{q}")).collect();
    let position = |p: &WholesalePricePoint| {
        period_keys
            .iter()
            .position(|(y, q)| *y == p.year && *q == p.quarter)
            .unwrap_or_default()
    };

    let year_ticks: Vec<(usize, i32)> = period_keys
        .iter()
        .enumerate()
        .filter(|(_, (_, q))| *q == "Q1")
        .map(|(i, (y, _))| (i, *y))
        .collect();

    let mut by_state: BTreeMap<&str, Vec<&WholesalePricePoint>> = BTreeMap::new();
    for p in &recent {
        if let Some(state) = p.state.as_deref() {
            by_state.entry(state).or_default().push(p);
        }
    }
    let all_states: Vec<String> = by_state.keys().map(|s| s.to_string()).collect();

    let wanted = |state: &str| match states {
        Some(list) if !list.is_empty() => list.iter().any(|s| s.eq_ignore_ascii_case(state)),
        _ => true,
    };

    let series = by_state
        .into_iter()
        .filter(|(state, _)| wanted(state))
        .map(|(state, mut group)| {
            group.sort_by(|a, b| (a.year, &a.quarter).cmp(&(b.year, &b.quarter)));
            let prices: Vec<Option<f64>> = group.iter().map(|p| p.average_price).collect();
            let smoothed = rolling_mean(&prices, params.rolling_window);

            let points = group
                .iter()
                .zip(smoothed)
                .map(|(p, s)| TrendPoint {
                    period: p.period(),
                    position: position(p),
                    average_price: p.average_price,
                    smoothed: s,
                    display_c_per_kwh: s.map(|v| v / 10.0 + params.retail_offset_c_per_kwh),
                })
                .collect();

            StateSeries {
                state: state.to_string(),
                points,
            }
        })
        .collect();

    WholesaleTrend {
        periods,
        year_ticks,
        all_states,
        series,
    }
}
