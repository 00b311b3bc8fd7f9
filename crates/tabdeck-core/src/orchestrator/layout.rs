use tabdeck_common::{Rect, Size};
use tabdeck_config::schema::TabsConfig;

/// Header band geometry for a tabbed window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabLayout {
    pub header_height: f64,
    /// Used when the host reports no usable window size.
    pub fallback: Size,
}

impl Default for TabLayout {
    fn default() -> Self {
        Self::from_config(&TabsConfig::default())
    }
}

impl TabLayout {
    pub fn from_config(config: &TabsConfig) -> Self {
        Self {
            header_height: f64::from(config.header_height),
            fallback: Size::new(
                f64::from(config.fallback_width),
                f64::from(config.fallback_height),
            ),
        }
    }

    /// Bounds of the active container: everything below the header band.
    pub fn content_bounds(&self, window_size: Option<Size>) -> Rect {
        let size = window_size
            .filter(|s| !s.is_empty())
            .unwrap_or(self.fallback);
        Rect {
            x: 0.0,
            y: self.header_height,
            width: size.width,
            height: (size.height - self.header_height).max(0.0),
        }
    }
}
