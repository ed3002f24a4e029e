//! UI Theme - Design system constants
//!
//! This module defines the visual elements used in reclaim's console output:
//! - Colors
//! - Icons
//! - Box dimensions

use crossterm::style::Color;
use reclaim_core::Level;

/// Default theme for reclaim output
#[derive(Debug, Clone, Default)]
pub struct Theme {
    /// Colors for different UI elements
    pub colors: ColorScheme,
    /// Status icons
    pub icons: Icons,
    /// Layout constants
    pub layout: Layout,
}

impl Theme {
    /// Icon and color for a journal level.
    pub fn level_style(&self, level: Level) -> (&'static str, Color) {
        match level {
            Level::Info => (self.icons.info, self.colors.text),
            Level::Success => (self.icons.success, self.colors.success),
            Level::Warning => (self.icons.warning, self.colors.warning),
            Level::Error => (self.icons.error, self.colors.error),
        }
    }
}

/// Color scheme for UI elements
#[derive(Debug, Clone)]
pub struct ColorScheme {
    /// Regular narrative text
    pub text: Color,
    /// Timestamps and secondary info
    pub secondary: Color,
    /// Section banners
    pub header: Color,
    /// Success states
    pub success: Color,
    /// Warning states
    pub warning: Color,
    /// Error states
    pub error: Color,
    /// Borders
    pub border: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            text: Color::Reset,
            secondary: Color::DarkGrey,
            header: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            border: Color::DarkGrey,
        }
    }
}

/// Status icons for different states
#[derive(Debug, Clone)]
pub struct Icons {
    /// Success/completed state (✓)
    pub success: &'static str,
    /// Error/failed state (✗)
    pub error: &'static str,
    /// Warning state (⚠)
    pub warning: &'static str,
    /// Info state (ℹ)
    pub info: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            success: "✓",
            error: "✗",
            warning: "⚠",
            info: "ℹ",
        }
    }
}

/// Layout constants
#[derive(Debug, Clone)]
pub struct Layout {
    /// Width of section banners
    pub banner_width: usize,
    /// Minimum inner width of the summary box
    pub min_box_width: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            banner_width: 60,
            min_box_width: 50,
        }
    }
}
