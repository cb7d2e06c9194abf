//! Auto-tile packer: places every visible window inside the viewport by
//! shelf packing rows left-to-right, top-to-bottom, retrying the whole
//! pass at a 5% smaller scale whenever the set does not fit.
//!
//! Deterministic by construction: items are sorted by a strict total order
//! before placement, so identical inputs always produce identical layouts.

use thiserror::Error;

use crate::model::geometry::{Rect, Vec2};
use crate::registry::WindowKey;

pub const SCALE_DECAY: f32 = 0.95;

/// A pass either fits everything or shrinks the scale, so termination only
/// needs a cap for degenerate inputs. 256 passes is a scale below 2e-6.
const MAX_PASSES: u32 = 256;

#[derive(Debug, Error)]
pub enum TileError {
    #[error("viewport has no usable area ({width}x{height})")]
    DegenerateViewport { width: f32, height: f32 },
    #[error("windows still overflow the viewport after {0} scale-down passes")]
    PassesExhausted(u32),
}

/// One window the packer should place.
#[derive(Clone, Debug)]
pub struct TileItem {
    pub key: WindowKey,
    /// Tie-breaker of the placement order; also the toolkit window title.
    pub name: String,
    pub preferred_size: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub key: WindowKey,
    pub frame: Rect,
}

#[derive(Clone, Debug, Default)]
pub struct TileResult {
    /// In the deterministic placement order (not the input order).
    pub placements: Vec<Placement>,
    pub scale: f32,
}

/// Pack `items` into `viewport`. The viewport is expected to already
/// exclude any reserved chrome such as the side panel.
pub fn tile(viewport: Rect, items: &[TileItem]) -> Result<TileResult, TileError> {
    if viewport.size.x <= 0.0 || viewport.size.y <= 0.0 {
        return Err(TileError::DegenerateViewport {
            width: viewport.size.x,
            height: viewport.size.y,
        });
    }
    if items.is_empty() {
        return Ok(TileResult { placements: Vec::new(), scale: 1.0 });
    }

    let mut sorted: Vec<&TileItem> = items.iter().collect();
    sorted.sort_by(|a, b| {
        a.preferred_size
            .y
            .total_cmp(&b.preferred_size.y)
            .then(a.preferred_size.x.total_cmp(&b.preferred_size.x))
            .then_with(|| a.name.cmp(&b.name))
    });

    let start_x = viewport.origin.x;
    let end_x = viewport.max_x();
    let end_y = viewport.max_y();

    let mut scale = 1.0f32;
    for _ in 0..MAX_PASSES {
        let mut placements = Vec::with_capacity(sorted.len());
        let mut x = start_x;
        let mut y = viewport.origin.y;
        let mut row_height = 0.0f32;
        let mut fits = true;

        for item in &sorted {
            let size = item.preferred_size.scaled(scale);

            if x > start_x && x + size.x > end_x {
                x = start_x;
                y += row_height;
                row_height = 0.0;
            }

            if y + size.y > end_y {
                fits = false;
                break;
            }

            placements.push(Placement {
                key: item.key,
                frame: Rect { origin: Vec2::new(x, y), size },
            });
            x += size.x;
            row_height = row_height.max(size.y);
        }

        if fits {
            return Ok(TileResult { placements, scale });
        }
        scale *= SCALE_DECAY;
    }

    Err(TileError::PassesExhausted(MAX_PASSES))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use slotmap::SlotMap;

    use super::*;

    fn items(specs: &[(&str, f32, f32)]) -> Vec<TileItem> {
        let mut keys: SlotMap<WindowKey, ()> = SlotMap::with_key();
        specs
            .iter()
            .map(|&(name, w, h)| TileItem {
                key: keys.insert(()),
                name: name.to_owned(),
                preferred_size: Vec2::new(w, h),
            })
            .collect()
    }

    fn assert_disjoint_and_contained(viewport: Rect, result: &TileResult) {
        for p in &result.placements {
            assert!(
                viewport.contains_rect(&p.frame),
                "{:?} escapes viewport {viewport:?}",
                p.frame
            );
        }
        for (i, a) in result.placements.iter().enumerate() {
            for b in &result.placements[i + 1..] {
                assert!(!a.frame.intersects(&b.frame), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn three_windows_fit_in_two_rows_at_full_scale() {
        // 1000x800 display minus the 200-wide panel: rows of 800.
        let viewport = Rect::new(200.0, 0.0, 800.0, 800.0);
        let set = items(&[("a", 320.0, 240.0), ("b", 320.0, 240.0), ("c", 480.0, 360.0)]);

        let result = tile(viewport, &set).unwrap();
        assert_eq!(result.scale, 1.0);
        assert_eq!(result.placements.len(), 3);
        assert_disjoint_and_contained(viewport, &result);

        // Two small windows share the first shelf, the big one wraps.
        assert_eq!(result.placements[0].frame, Rect::new(200.0, 0.0, 320.0, 240.0));
        assert_eq!(result.placements[1].frame, Rect::new(520.0, 0.0, 320.0, 240.0));
        assert_eq!(result.placements[2].frame, Rect::new(200.0, 240.0, 480.0, 360.0));
    }

    #[test]
    fn overflow_shrinks_in_five_percent_steps() {
        let viewport = Rect::new(0.0, 0.0, 400.0, 300.0);
        let set = items(&[("a", 400.0, 300.0), ("b", 400.0, 300.0)]);

        let result = tile(viewport, &set).unwrap();
        assert!(result.scale < 1.0);
        // The scale is always a whole number of decay steps.
        let steps = (result.scale.ln() / SCALE_DECAY.ln()).round();
        let reconstructed = SCALE_DECAY.powi(steps as i32);
        assert!((result.scale - reconstructed).abs() < 1e-5);
        assert_disjoint_and_contained(viewport, &result);
    }

    #[test]
    fn sort_is_by_height_then_width_then_name() {
        let viewport = Rect::new(0.0, 0.0, 10_000.0, 10_000.0);
        let set = items(&[
            ("zeta", 100.0, 100.0),
            ("alpha", 100.0, 100.0),
            ("wide", 200.0, 100.0),
            ("tall", 50.0, 200.0),
        ]);

        let result = tile(viewport, &set).unwrap();
        let order: Vec<usize> = result
            .placements
            .iter()
            .map(|p| set.iter().position(|i| i.key == p.key).unwrap())
            .collect();
        // alpha, zeta (name tie-break), wide (wider), tall (tallest).
        assert_eq!(order, vec![1, 0, 2, 3]);
    }

    #[test]
    fn identical_inputs_give_identical_layouts() {
        let viewport = Rect::new(200.0, 0.0, 640.0, 480.0);
        let set = items(&[("a", 320.0, 240.0), ("b", 480.0, 360.0), ("c", 100.0, 700.0)]);

        let first = tile(viewport, &set).unwrap();
        let second = tile(viewport, &set).unwrap();
        assert_eq!(first.placements, second.placements);
        assert_eq!(first.scale, second.scale);
    }

    #[test]
    fn degenerate_viewport_is_an_error_not_a_hang() {
        let set = items(&[("a", 320.0, 240.0)]);
        assert!(matches!(
            tile(Rect::new(0.0, 0.0, 0.0, 600.0), &set),
            Err(TileError::DegenerateViewport { .. })
        ));
        assert!(matches!(
            tile(Rect::new(0.0, 0.0, 800.0, -1.0), &set),
            Err(TileError::DegenerateViewport { .. })
        ));
    }

    #[test]
    fn empty_input_is_a_noop() {
        let result = tile(Rect::new(0.0, 0.0, 800.0, 600.0), &[]).unwrap();
        assert!(result.placements.is_empty());
        assert_eq!(result.scale, 1.0);
    }
}
