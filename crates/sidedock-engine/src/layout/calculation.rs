//! Placement calculation: anchor geometry plus sibling order to satellite
//! geometry.

use sidedock_common::Geometry;

use super::{DockLayout, Placement, SlotInput, WidthSync};

impl DockLayout {
    pub fn place(&self, input: &SlotInput<'_>) -> Placement {
        let s = input.satellite;
        let a = input.anchor;

        let mut left = if self.dock_right {
            a.right() + self.gap
        } else {
            a.left - s.width - self.gap
        };

        let mut band = None;
        let mut height = s.height;
        if self.sync_height {
            if self.tile_height {
                let count = input.sibling_count.max(1);
                let b = div_round(a.height, count);
                band = Some(b);
                height = b;
                if input.ordinal + 1 < count {
                    height -= self.tile_height_margin;
                }
            } else {
                height = a.height;
            }
        }

        let mut top = a.top;
        if input.ordinal > 0 {
            if self.tile_height {
                top += match band {
                    Some(b) => b * input.ordinal as i32,
                    None => sum_earlier(input, |g| g.height),
                };
            } else if self.tile_width {
                let offset = match input.uniform_width {
                    Some(w) => (w + self.gap) * input.ordinal as i32,
                    None => sum_earlier(input, |g| g.width + self.gap),
                };
                if self.dock_right {
                    left += offset;
                } else {
                    left -= offset;
                }
            }
        }

        let width = input.target_width.filter(|w| *w >= 0);
        let height = Some(height).filter(|h| *h != s.height && *h >= 0);

        let effective_width = width.filter(|w| *w != 0).unwrap_or(s.width);
        let min_left = self
            .horizontal_min
            .unwrap_or_else(|| -div_round(effective_width, 2));
        left = left.max(min_left);
        if let Some(max) = self.horizontal_max {
            left = left.min(max - effective_width);
        }

        Placement {
            left,
            top,
            width,
            height,
        }
    }

    /// Decide how a satellite's `actual` width relates to the `configured`
    /// width, given the width this engine last synced for it.
    pub fn sync_width(&self, configured: i32, actual: i32, synced: Option<i32>) -> WidthSync {
        if !self.sync_width || actual == configured {
            WidthSync::Keep
        } else if synced == Some(configured) {
            WidthSync::Adopt(actual)
        } else {
            WidthSync::Request(configured)
        }
    }
}

fn sum_earlier(input: &SlotInput<'_>, measure: impl Fn(&Geometry) -> i32) -> i32 {
    input
        .earlier_siblings
        .iter()
        .take(input.ordinal)
        .map(measure)
        .sum()
}

/// `value / divisor` rounded half up.
fn div_round(value: i32, divisor: usize) -> i32 {
    (f64::from(value) / divisor as f64).round() as i32
}
