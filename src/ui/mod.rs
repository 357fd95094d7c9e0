// ── Window template slots ─────────────────────────────────────────────────────
//
// Pure Rust contracts for the four named widgets the window is built from.
// No Win32 calls here; the platform layer implements the traits over real
// controls and hands them in through `SlotBindings`.

pub(crate) mod layout;

use crate::{
    app::Action,
    editor::TextSurface,
    error::{Result, ViewerError},
};

/// The window's title area.
pub(crate) trait HeaderBar {
    fn set_title(&mut self, title: &str);
}

/// The control that starts the open flow.
pub(crate) trait OpenTrigger {
    /// Route activations of this control to `action`.
    fn bind_action(&mut self, action: Action);
}

/// The status label that shows the caret position.
pub(crate) trait PositionLabel {
    /// Replace the label's full text.
    fn set_text(&mut self, text: &str);
}

/// The bound template: every slot present.
pub(crate) struct TemplateSlots {
    pub(crate) header_bar: Box<dyn HeaderBar>,
    pub(crate) main_text_view: Box<dyn TextSurface>,
    pub(crate) open_button: Box<dyn OpenTrigger>,
    pub(crate) cursor_pos: Box<dyn PositionLabel>,
}

/// Collects slot bindings from the front end.
#[derive(Default)]
pub(crate) struct SlotBindings {
    header_bar: Option<Box<dyn HeaderBar>>,
    main_text_view: Option<Box<dyn TextSurface>>,
    open_button: Option<Box<dyn OpenTrigger>>,
    cursor_pos: Option<Box<dyn PositionLabel>>,
}

impl SlotBindings {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn header_bar(mut self, slot: impl HeaderBar + 'static) -> Self {
        self.header_bar = Some(Box::new(slot));
        self
    }

    pub(crate) fn main_text_view(mut self, slot: impl TextSurface + 'static) -> Self {
        self.main_text_view = Some(Box::new(slot));
        self
    }

    pub(crate) fn open_button(mut self, slot: impl OpenTrigger + 'static) -> Self {
        self.open_button = Some(Box::new(slot));
        self
    }

    pub(crate) fn cursor_pos(mut self, slot: impl PositionLabel + 'static) -> Self {
        self.cursor_pos = Some(Box::new(slot));
        self
    }

    /// Finish binding.  Every slot is mandatory; the first missing one is
    /// named in the error.
    pub(crate) fn build(self) -> Result<TemplateSlots> {
        Ok(TemplateSlots {
            header_bar: self.header_bar.ok_or(ViewerError::MissingSlot("header_bar"))?,
            main_text_view: self
                .main_text_view
                .ok_or(ViewerError::MissingSlot("main_text_view"))?,
            open_button: self.open_button.ok_or(ViewerError::MissingSlot("open_button"))?,
            cursor_pos: self.cursor_pos.ok_or(ViewerError::MissingSlot("cursor_pos"))?,
        })
    }
}

// ── Test doubles ──────────────────────────────────────────────────────────────
//
// Shared with the controller tests in `app`.


// ── Tests ─────────────────────────────────────────────────────────────────────
