use tracing::warn;

use crate::common::collections::HashMap;
use crate::model::window::WindowShared;
use crate::toolkit::{PlotBounds, PlotSeriesRef, Toolkit};
use crate::view::WindowRender;

struct SeriesData {
    name: String,
    color: Option<[f32; 4]>,
    xs: Vec<f64>,
    ys: Vec<f64>,
}

/// Live line plot. Producers append samples into the shared inbox; each
/// frame the accumulated batch is swapped out and merged into the
/// frame-side series buffers here, so the inbox lock is never held while
/// drawing.
#[derive(Default)]
pub struct PlotView {
    series: HashMap<u64, SeriesData>,
    order: Vec<u64>,
    bounds: Option<PlotBounds>,
    auto_fit: bool,
}

impl PlotView {
    pub fn new() -> Self {
        Self { auto_fit: true, ..Default::default() }
    }

    fn absorb(&mut self, shared: &WindowShared) {
        let (samples, defs) = shared.drain_plot();
        for def in defs {
            let color = def.style.as_deref().and_then(parse_style);
            self.series.entry(def.id).or_insert_with(|| {
                self.order.push(def.id);
                SeriesData { name: def.name, color, xs: Vec::new(), ys: Vec::new() }
            });
        }
        for sample in samples {
            let Some(data) = self.series.get_mut(&sample.series) else {
                // A sample can only precede its definition if the inbox was
                // tampered with; ignore rather than invent a series.
                continue;
            };
            data.xs.push(sample.x);
            data.ys.push(sample.y);
            self.bounds = Some(match self.bounds {
                None => PlotBounds {
                    x_min: sample.x,
                    x_max: sample.x,
                    y_min: sample.y,
                    y_max: sample.y,
                },
                Some(b) => PlotBounds {
                    x_min: b.x_min.min(sample.x),
                    x_max: b.x_max.max(sample.x),
                    y_min: b.y_min.min(sample.y),
                    y_max: b.y_max.max(sample.y),
                },
            });
        }
    }
}

impl WindowRender for PlotView {
    fn render(&mut self, shared: &WindowShared, ui: &mut dyn Toolkit) {
        self.absorb(shared);
        if self.series.is_empty() {
            return;
        }
        let refs: Vec<PlotSeriesRef<'_>> = self
            .order
            .iter()
            .filter_map(|id| self.series.get(id))
            .map(|data| PlotSeriesRef {
                name: &data.name,
                color: data.color,
                xs: &data.xs,
                ys: &data.ys,
            })
            .collect();
        let limits = if self.auto_fit { self.bounds } else { None };
        ui.draw_plot(&refs, limits);
    }
}

/// Parse a `#RRGGBBAA` style string into normalized RGBA. Malformed input
/// is a configuration error: warn and fall back to the default color.
pub fn parse_style(style: &str) -> Option<[f32; 4]> {
    let parsed = (|| {
        let hex = style.strip_prefix('#')?;
        if hex.len() != 8 || !hex.is_ascii() {
            return None;
        }
        let mut out = [0.0f32; 4];
        for (i, slot) in out.iter_mut().enumerate() {
            let byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
            *slot = f32::from(byte) / 255.0;
        }
        Some(out)
    })();
    if parsed.is_none() {
        warn!("ignoring malformed plot style {style:?}, expected \"#RRGGBBAA\"");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::geometry::Vec2;
    use crate::toolkit::HeadlessToolkit;

    #[test]
    fn parses_rrggbbaa() {
        assert_eq!(parse_style("#ff0000ff"), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(parse_style("#00ff7f80"), Some([0.0, 1.0, 127.0 / 255.0, 128.0 / 255.0]));
    }

    #[test]
    fn rejects_malformed_styles() {
        assert_eq!(parse_style(""), None);
        assert_eq!(parse_style("ff0000ff"), None);
        assert_eq!(parse_style("#f00"), None);
        assert_eq!(parse_style("#zzzzzzzz"), None);
    }

    #[test]
    fn merges_samples_and_draws_in_first_seen_order() {
        let shared = WindowShared::new("timings");
        shared.add_plot_sample("render", 0.0, 16.0, None);
        shared.add_plot_sample("upload", 0.0, 4.0, None);
        shared.add_plot_sample("render", 1.0, 17.0, None);

        let mut view = PlotView::new();
        let mut ui = HeadlessToolkit::new(Vec2::new(800.0, 600.0));
        view.render(&shared, &mut ui);

        assert_eq!(view.order.len(), 2);
        assert_eq!(view.series[&view.order[0]].name, "render");
        assert_eq!(view.series[&view.order[0]].xs, vec![0.0, 1.0]);
        assert_eq!(view.series[&view.order[1]].name, "upload");
        assert_eq!(ui.calls, vec!["plot(2 series)"]);

        let bounds = view.bounds.unwrap();
        assert_eq!((bounds.x_min, bounds.x_max), (0.0, 1.0));
        assert_eq!((bounds.y_min, bounds.y_max), (4.0, 17.0));
    }
}
