//! Configuration types for Schematic layout and export.
//!
//! This module provides configuration structures that control how flattened
//! diagrams are laid out and how positions are mapped onto a drawing grid.
//! All types implement [`serde::Deserialize`] for loading from external
//! sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level application configuration.
//! - [`LayoutConfig`] - Output cycle offset and grid spacing.
//!
//! # Example
//!
//! ```
//! # use schematic::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.layout().output_cycle_offset(), 0);
//! assert_eq!(config.layout().column_spacing(), 100.0);
//! ```

use serde::Deserialize;

const DEFAULT_SPACING: f64 = 100.0;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the given layout configuration.
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }
}

/// Layout settings.
///
/// Cycles are horizontal grid indices and rows vertical grid indices; the
/// spacings convert them into drawing units for renderers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Extra cycles added to every `output` primitive.
    output_cycle_offset: u32,

    /// Horizontal distance between two cycle columns.
    column_spacing: f64,

    /// Vertical distance between two rows.
    row_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            output_cycle_offset: 0,
            column_spacing: DEFAULT_SPACING,
            row_spacing: DEFAULT_SPACING,
        }
    }
}

impl LayoutConfig {
    /// Creates a new [`LayoutConfig`].
    ///
    /// # Arguments
    ///
    /// * `output_cycle_offset` - Trailing cycles appended to `output` primitives.
    /// * `column_spacing` - Drawing units between cycle columns.
    /// * `row_spacing` - Drawing units between rows.
    pub fn new(output_cycle_offset: u32, column_spacing: f64, row_spacing: f64) -> Self {
        Self {
            output_cycle_offset,
            column_spacing,
            row_spacing,
        }
    }

    pub fn output_cycle_offset(&self) -> u32 {
        self.output_cycle_offset
    }

    pub fn column_spacing(&self) -> f64 {
        self.column_spacing
    }

    pub fn row_spacing(&self) -> f64 {
        self.row_spacing
    }
}
