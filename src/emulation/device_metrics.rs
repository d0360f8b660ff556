//! Device metric overrides.

// ============================================================================
// DeviceMetrics
// ============================================================================

/// Screen and input characteristics of an emulated device.
///
/// Immutable once constructed; the override manager owns one and re-sends
/// it verbatim on every re-application.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceMetrics {
    /// Viewport width in CSS pixels.
    pub width: u32,
    /// Viewport height in CSS pixels.
    pub height: u32,
    /// Device scale factor; 0 uses the browser default.
    pub device_scale_factor: f64,
    /// Whether touch events are emulated.
    pub touch: bool,
    /// Whether the mobile viewport and layout quirks apply.
    pub mobile: bool,
    /// Whether the view fits the emulated size to the window.
    pub fit_window: bool,
    /// Whether mobile text autosizing applies.
    pub text_autosizing: bool,
    /// Font scale factor for text autosizing.
    pub font_scale_factor: f64,
}

impl DeviceMetrics {
    /// Creates metrics with the standard defaults for the remaining
    /// fields: no window fitting, text autosizing on, font scale 1.0.
    #[must_use]
    pub fn new(width: u32, height: u32, device_scale_factor: f64, touch: bool, mobile: bool) -> Self {
        Self {
            width,
            height,
            device_scale_factor,
            touch,
            mobile,
            fit_window: false,
            text_autosizing: true,
            font_scale_factor: 1.0,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
