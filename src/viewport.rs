use crate::state::{Point, Rect};

pub const MIN_ZOOM: f64 = 0.3;
pub const MAX_ZOOM: f64 = 3.0;
pub const ZOOM_IN_FACTOR: f64 = 1.1;
pub const ZOOM_OUT_FACTOR: f64 = 0.9;

/// Pan/zoom transform of the board layer. The layer is rendered with
/// `transform-origin: 0 0`, so `screen = offset + board * zoom`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }

    pub fn apply_zoom_delta(&mut self, factor: f64) {
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn screen_to_board(&self, screen: Point) -> Point {
        Point::new((screen.x - self.x) / self.zoom, (screen.y - self.y) / self.zoom)
    }

    pub fn board_to_screen(&self, board: Point) -> Point {
        Point::new(board.x * self.zoom + self.x, board.y * self.zoom + self.y)
    }

    pub fn project(&self, rect: &Rect) -> Rect {
        let origin = self.board_to_screen(Point::new(rect.x, rect.y));
        Rect::new(origin.x, origin.y, rect.width * self.zoom, rect.height * self.zoom)
    }

    pub fn css_transform(&self) -> String {
        format!("translate({}px, {}px) scale({})", self.x, self.y, self.zoom)
    }
}

/// Wheel zoom only reacts while Ctrl/Meta is held so plain scrolling is left alone.
pub fn zoom_factor_for_wheel(delta_y: f64, modifier: bool) -> Option<f64> {
    if !modifier {
        return None;
    }
    Some(if delta_y > 0.0 { ZOOM_OUT_FACTOR } else { ZOOM_IN_FACTOR })
}

#[cfg(test)]
mod tests {
    use super::*;

    mod transform_tests {
        use super::*;

        #[test]
        fn new_has_default_values() {
            let vp = Viewport::new();
            assert_eq!(vp.x, 0.0);
            assert_eq!(vp.y, 0.0);
            assert_eq!(vp.zoom, 1.0);
        }

        #[test]
        fn identity_at_origin() {
            let vp = Viewport::new();
            assert_eq!(vp.screen_to_board(Point::new(100.0, 200.0)), Point::new(100.0, 200.0));
            assert_eq!(vp.board_to_screen(Point::new(100.0, 200.0)), Point::new(100.0, 200.0));
        }

        #[test]
        fn pan_shifts_screen_position() {
            let vp = Viewport { x: 50.0, y: -20.0, zoom: 1.0 };
            assert_eq!(vp.board_to_screen(Point::new(10.0, 10.0)), Point::new(60.0, -10.0));
            assert_eq!(vp.screen_to_board(Point::new(60.0, -10.0)), Point::new(10.0, 10.0));
        }

        #[test]
        fn zoom_scales_around_layer_origin() {
            let vp = Viewport { x: 10.0, y: 10.0, zoom: 2.0 };
            assert_eq!(vp.board_to_screen(Point::new(100.0, 50.0)), Point::new(210.0, 110.0));
            let rect = vp.project(&Rect::new(100.0, 50.0, 130.0, 130.0));
            assert_eq!(rect, Rect::new(210.0, 110.0, 260.0, 260.0));
        }

        #[test]
        fn board_screen_board_is_stable() {
            let vp = Viewport { x: 123.0, y: 456.0, zoom: 1.5 };
            let back = vp.screen_to_board(vp.board_to_screen(Point::new(500.0, 600.0)));
            assert!((back.x - 500.0).abs() < 1e-10);
            assert!((back.y - 600.0).abs() < 1e-10);
        }

        #[test]
        fn css_transform_format() {
            let vp = Viewport { x: 12.5, y: -4.0, zoom: 1.1 };
            assert_eq!(vp.css_transform(), "translate(12.5px, -4px) scale(1.1)");
        }
    }

    mod gesture_tests {
        use super::*;

        #[test]
        fn zoom_stays_in_bounds_for_any_sequence() {
            let mut vp = Viewport::new();
            for _ in 0..100 {
                vp.apply_zoom_delta(ZOOM_IN_FACTOR);
                assert!(vp.zoom <= MAX_ZOOM && vp.zoom >= MIN_ZOOM);
            }
            assert_eq!(vp.zoom, MAX_ZOOM);
            for i in 0..300 {
                let factor = if i % 3 == 0 { ZOOM_IN_FACTOR } else { ZOOM_OUT_FACTOR };
                vp.apply_zoom_delta(factor);
                assert!(vp.zoom <= MAX_ZOOM && vp.zoom >= MIN_ZOOM);
            }
            vp.apply_zoom_delta(0.0);
            assert_eq!(vp.zoom, MIN_ZOOM);
            vp.apply_zoom_delta(1000.0);
            assert_eq!(vp.zoom, MAX_ZOOM);
        }

        #[test]
        fn wheel_requires_modifier() {
            assert_eq!(zoom_factor_for_wheel(120.0, false), None);
            assert_eq!(zoom_factor_for_wheel(-120.0, false), None);
            assert_eq!(zoom_factor_for_wheel(120.0, true), Some(ZOOM_OUT_FACTOR));
            assert_eq!(zoom_factor_for_wheel(-120.0, true), Some(ZOOM_IN_FACTOR));
        }

        #[test]
        fn pan_is_unclamped() {
            let mut vp = Viewport::new();
            vp.pan_by(-1e6, 2e6);
            vp.pan_by(-1.0, 1.0);
            assert_eq!(vp.x, -1_000_001.0);
            assert_eq!(vp.y, 2_000_001.0);
        }

        #[test]
        fn reset_restores_identity() {
            let mut vp = Viewport { x: 40.0, y: 80.0, zoom: 2.5 };
            vp.reset();
            assert_eq!(vp, Viewport::new());
        }
    }
}
