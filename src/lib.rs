//! RFox Slides
//!
//! Timer-driven page behaviour over a headless document tree: an image
//! rotator that cycles an `<img>` element's `src` through a fixed list, and a
//! dismisser that fades and then removes flash messages after a delay.
//!
//! Time is virtual and advanced explicitly, which keeps every behaviour
//! deterministic in tests. The `realtime` feature maps the virtual clock onto
//! wall-clock time with tokio.
//!
//! # Example
//!
//! ```
//! use rfslides::{Page, PageEvent, SlideshowConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SlideshowConfig {
//!     images: vec!["a.jpg".into(), "b.jpg".into()],
//!     ..Default::default()
//! };
//! let html = r#"<html><body><img id="slideshow"></body></html>"#;
//! let mut page = Page::from_html(config, html)?;
//! page.advance(10_000);
//! assert_eq!(page.events()[0], PageEvent::ImageShown { at: 10_000, src: "a.jpg".into() });
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod dismisser;
pub mod dom;
pub mod error;
pub mod page;
pub mod rotator;
pub mod timers;

// Wall-clock driver for pages (tokio)
#[cfg(feature = "realtime")]
pub mod realtime;

pub use dom::{Document, DocumentTree, NodeId};
pub use error::{Error, Result};
pub use page::{EventLog, Page, PageEvent};
pub use timers::{TimerHandle, TimerQueue};

/// Images rotated when no list is configured
pub const DEFAULT_IMAGES: [&str; 5] = [
    "/images/ssssource.jpg",
    "/images/ssssource2.jpg",
    "/images/ssssource3.jpg",
    "/images/ssssource4.jpg",
    "/images/ssssource5.jpg",
];

/// Demo page with a display target and two flash messages
pub const DEFAULT_PAGE: &str = include_str!("default_page.html");

/// Page behaviour configuration
///
/// Every field has a default, so a config file only needs the fields it
/// changes:
///
/// ```
/// let cfg = rfslides::SlideshowConfig::from_json(r#"{ "interval_ms": 3000 }"#).unwrap();
/// assert_eq!(cfg.interval_ms, 3000);
/// assert_eq!(cfg.display_id, "slideshow");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideshowConfig {
    /// Image references in display order
    pub images: Vec<String>,
    /// `id` of the element whose `src` is rotated
    pub display_id: String,
    /// Rotation period in milliseconds
    pub interval_ms: u64,
    /// Flash message dismissal
    pub dismiss: DismissConfig,
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self {
            images: DEFAULT_IMAGES.iter().map(|s| s.to_string()).collect(),
            display_id: "slideshow".to_string(),
            interval_ms: 10_000,
            dismiss: DismissConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DismissConfig {
    pub enabled: bool,
    /// Class carried by elements to dismiss
    pub marker_class: String,
    /// Delay before the fade, from page start
    pub fade_delay_ms: u64,
    /// Delay between an element's fade and its removal
    pub removal_delay_ms: u64,
}

impl Default for DismissConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            marker_class: "flash".to_string(),
            fade_delay_ms: dismisser::DEFAULT_FADE_DELAY_MS,
            removal_delay_ms: dismisser::DEFAULT_REMOVAL_DELAY_MS,
        }
    }
}

impl SlideshowConfig {
    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: SlideshowConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Reject configs that could never rotate or dismiss anything
    pub fn validate(&self) -> Result<()> {
        if self.images.is_empty() {
            return Err(Error::ConfigError("images must not be empty".into()));
        }
        if self.images.iter().any(|s| s.trim().is_empty()) {
            return Err(Error::ConfigError("image references must not be blank".into()));
        }
        if self.display_id.trim().is_empty() {
            return Err(Error::ConfigError("display_id must not be empty".into()));
        }
        if self.interval_ms == 0 {
            return Err(Error::ConfigError("interval_ms must be greater than zero".into()));
        }
        if self.dismiss.enabled && self.dismiss.marker_class.trim().is_empty() {
            return Err(Error::ConfigError("dismiss.marker_class must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(feature = "html")]
impl Page<Document> {
    /// Parse `html` and install the page's timers on it
    pub fn from_html(config: SlideshowConfig, html: &str) -> Result<Self> {
        Page::new(config, Document::from_html(html))
    }

    /// The bundled demo page
    pub fn with_default_page(config: SlideshowConfig) -> Result<Self> {
        Self::from_html(config, DEFAULT_PAGE)
    }
}

/// Create a page from an optional HTML file, falling back to the demo page
#[cfg(feature = "html")]
pub fn new_page(config: SlideshowConfig, page: Option<&Path>) -> Result<Page<Document>> {
    match page {
        Some(path) => {
            let html = std::fs::read_to_string(path)?;
            Page::from_html(config, &html)
        }
        None => Page::with_default_page(config),
    }
}
