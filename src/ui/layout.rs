// ── Window layout ─────────────────────────────────────────────────────────────
//
// Pure geometry: where the open button, text view, and position label go for
// a given client size.  Metrics are defined at 96 DPI and scaled.

pub(crate) const BASE_DPI: u32 = 96;

const MARGIN: i32 = 6;
const TOOLBAR_HEIGHT: i32 = 32;
const BUTTON_WIDTH: i32 = 88;
const STATUS_HEIGHT: i32 = 22;
const LABEL_WIDTH: i32 = 140;

/// Scale a pixel value defined at 96 DPI to `dpi`.
pub(crate) fn scale(px: i32, dpi: u32) -> i32 {
    px * dpi as i32 / BASE_DPI as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rect {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) width: i32,
    pub(crate) height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) open_button: Rect,
    pub(crate) text_view: Rect,
    pub(crate) cursor_pos: Rect,
}

impl Layout {
    /// Lay out a `width` × `height` client area.  Sizes never go negative,
    /// so a minimised window yields empty rectangles.
    pub(crate) fn compute(width: i32, height: i32, dpi: u32) -> Self {
        let margin = scale(MARGIN, dpi);
        let toolbar = scale(TOOLBAR_HEIGHT, dpi);
        let status = scale(STATUS_HEIGHT, dpi);
        let label_width = scale(LABEL_WIDTH, dpi);

        let open_button = Rect {
            x: margin,
            y: margin,
            width: scale(BUTTON_WIDTH, dpi),
            height: (toolbar - 2 * margin).max(0),
        };

        let text_top = toolbar;
        let text_view = Rect {
            x: 0,
            y: text_top,
            width: width.max(0),
            height: (height - text_top - status).max(0),
        };

        // Right-aligned in the status row.
        let cursor_pos = Rect {
            x: (width - label_width - margin).max(0),
            y: (height - status).max(0) + scale(3, dpi),
            width: label_width.min(width.max(0)),
            height: (status - scale(3, dpi)).max(0),
        };

        Self { open_button, text_view, cursor_pos }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_identity_at_base_dpi() {
        assert_eq!(scale(32, BASE_DPI), 32);
        assert_eq!(scale(32, 144), 48);
        assert_eq!(scale(32, 192), 64);
    }

    #[test]
    fn text_view_fills_between_toolbar_and_status() {
        let l = Layout::compute(800, 600, BASE_DPI);
        assert_eq!(l.text_view, Rect { x: 0, y: 32, width: 800, height: 600 - 32 - 22 });
        assert_eq!(l.cursor_pos.x, 800 - 140 - 6);
        assert!(l.cursor_pos.y >= l.text_view.y + l.text_view.height);
    }

    #[test]
    fn high_dpi_scales_chrome() {
        let l = Layout::compute(1600, 1200, 192);
        assert_eq!(l.text_view.y, 64);
        assert_eq!(l.open_button.width, 176);
    }

    #[test]
    fn tiny_client_area_never_goes_negative() {
        let l = Layout::compute(10, 10, BASE_DPI);
        assert_eq!(l.text_view.height, 0);
        assert!(l.cursor_pos.width >= 0 && l.cursor_pos.x >= 0);
    }
}
