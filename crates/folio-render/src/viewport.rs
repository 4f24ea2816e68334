//! Zoom and page-navigation state for the preview viewport.
//!
//! A plain synchronous state machine: every transition is an in-place
//! state update the page-stack builder picks up on its next pass. Manual
//! zoom, once engaged, wins over auto-fit until the content or geometry
//! itself changes; a container resize alone never reverts a zoom the
//! user chose.

use serde::Serialize;

/// Lower zoom bound.
pub const MIN_SCALE: f32 = 0.3;
/// Upper zoom bound.
pub const MAX_SCALE: f32 = 2.0;
/// Fixed horizontal gutter subtracted from the container before fitting.
pub const FIT_PADDING_PX: f32 = 48.0;

/// Current viewport values consumed by the page-stack builder and toolbar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewportState {
    /// Current scale factor.
    pub scale: f32,
    /// 1-based index of the page in view.
    pub current_page: usize,
    /// True once the user explicitly changed zoom.
    pub manual_zoom_engaged: bool,
}

/// Controller owning scale and page position.
#[derive(Clone, Debug)]
pub struct ZoomController {
    state: ViewportState,
    initial_scale: f32,
    page_count: usize,
}

impl ZoomController {
    /// Controller starting at the given initial scale and one page.
    pub fn new(initial_scale: f32) -> Self {
        let initial_scale = initial_scale.clamp(MIN_SCALE, MAX_SCALE);
        Self {
            state: ViewportState {
                scale: initial_scale,
                current_page: 1,
                manual_zoom_engaged: false,
            },
            initial_scale,
            page_count: 1,
        }
    }

    /// Current viewport values.
    pub fn state(&self) -> ViewportState {
        self.state
    }

    /// Current scale factor.
    pub fn scale(&self) -> f32 {
        self.state.scale
    }

    /// 1-based page currently in view.
    pub fn current_page(&self) -> usize {
        self.state.current_page
    }

    /// Total pages known to the controller.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Set zoom explicitly. Clamps to `[MIN_SCALE, MAX_SCALE]` and
    /// engages manual mode, disabling auto-fit.
    pub fn set_zoom(&mut self, scale: f32) {
        self.state.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        self.state.manual_zoom_engaged = true;
    }

    /// Fit the page width to the container, unless manual zoom is engaged.
    ///
    /// The fitted scale never exceeds the configured initial scale and
    /// never drops below `MIN_SCALE`.
    pub fn auto_fit(&mut self, container_width_px: f32, page_width_px: f32) {
        if self.state.manual_zoom_engaged {
            return;
        }
        if page_width_px <= 0.0 {
            return;
        }
        let usable = container_width_px - FIT_PADDING_PX;
        let fitted = (usable / page_width_px).clamp(MIN_SCALE, self.initial_scale);
        self.state.scale = fitted;
    }

    /// Navigate to a 1-based page number, clamped to the page count.
    ///
    /// Returns the page actually navigated to so the host can scroll the
    /// matching surface into view.
    pub fn navigate_to(&mut self, page_number: usize) -> usize {
        let target = page_number.clamp(1, self.page_count.max(1));
        self.state.current_page = target;
        target
    }

    /// Record the page currently in view from scroll tracking.
    ///
    /// Never alters scale.
    pub fn scroll_observed(&mut self, visible_page: usize) {
        self.state.current_page = visible_page.clamp(1, self.page_count.max(1));
    }

    /// Update the page count after repagination, clamping the current
    /// page into range.
    pub fn set_page_count(&mut self, page_count: usize) {
        self.page_count = page_count.max(1);
        self.state.current_page = self.state.current_page.clamp(1, self.page_count);
    }

    /// Content or page geometry changed: manual zoom no longer pins the
    /// scale, so auto-fit may apply again.
    pub fn content_invalidated(&mut self) {
        self.state.manual_zoom_engaged = false;
    }

    /// Reset scale to the configured initial value and drop manual mode.
    pub fn reset(&mut self) {
        self.state.scale = self.initial_scale;
        self.state.manual_zoom_engaged = false;
    }
}

impl Default for ZoomController {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_zoom_clamps_and_engages_manual_mode() {
        let mut zoom = ZoomController::new(1.0);
        zoom.set_zoom(5.0);
        assert_eq!(zoom.scale(), MAX_SCALE);
        assert!(zoom.state().manual_zoom_engaged);

        zoom.set_zoom(0.01);
        assert_eq!(zoom.scale(), MIN_SCALE);
    }

    #[test]
    fn auto_fit_scales_to_container_width() {
        let mut zoom = ZoomController::new(1.0);
        // 864px page in a 480px container.
        zoom.auto_fit(480.0, 864.0);
        let expected = (480.0 - FIT_PADDING_PX) / 864.0;
        assert!((zoom.scale() - expected).abs() < 1e-6);
        assert!(!zoom.state().manual_zoom_engaged);
    }

    #[test]
    fn auto_fit_never_exceeds_initial_scale() {
        let mut zoom = ZoomController::new(1.0);
        zoom.auto_fit(10_000.0, 864.0);
        assert_eq!(zoom.scale(), 1.0);
    }

    #[test]
    fn manual_zoom_survives_container_resizes() {
        let mut zoom = ZoomController::new(1.0);
        zoom.set_zoom(1.5);
        zoom.auto_fit(480.0, 864.0);
        assert_eq!(zoom.scale(), 1.5);

        // Content change re-enables fitting.
        zoom.content_invalidated();
        zoom.auto_fit(480.0, 864.0);
        assert!(zoom.scale() < 1.5);
    }

    #[test]
    fn navigation_clamps_to_page_count() {
        let mut zoom = ZoomController::new(1.0);
        zoom.set_page_count(3);
        assert_eq!(zoom.navigate_to(5), 3);
        assert_eq!(zoom.current_page(), 3);
        assert_eq!(zoom.navigate_to(0), 1);
    }

    #[test]
    fn shrinking_page_count_clamps_current_page() {
        let mut zoom = ZoomController::new(1.0);
        zoom.set_page_count(8);
        zoom.navigate_to(7);
        zoom.set_page_count(2);
        assert_eq!(zoom.current_page(), 2);
    }

    #[test]
    fn scroll_tracking_updates_page_without_touching_scale() {
        let mut zoom = ZoomController::new(1.0);
        zoom.set_page_count(4);
        zoom.set_zoom(0.8);
        zoom.scroll_observed(3);
        assert_eq!(zoom.current_page(), 3);
        assert_eq!(zoom.scale(), 0.8);
    }

    #[test]
    fn reset_restores_initial_scale() {
        let mut zoom = ZoomController::new(0.9);
        zoom.set_zoom(2.0);
        zoom.reset();
        assert_eq!(zoom.scale(), 0.9);
        assert!(!zoom.state().manual_zoom_engaged);
    }
}
