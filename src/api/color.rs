/*!
 * Document Colors
 * RGBA color model, canonical text renderings and the color provider contract
 */

use ahash::RandomState;
use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::vfs::resource::{Authority, ResourceId};
use crate::vfs::Disposable;

#[derive(Error, Debug, Clone, PartialEq, Diagnostic)]
pub enum ColorError {
    #[error("Color component {component} out of range [0, 1]: {value}")]
    #[diagnostic(code(color::component_range))]
    ComponentOutOfRange { component: &'static str, value: f64 },

    #[error("Color range must not be empty")]
    #[diagnostic(code(color::empty_range))]
    EmptyRange,

    #[error("Color provider failed: {0}")]
    #[diagnostic(code(color::provider))]
    Provider(String),
}

/// Color in RGBA space, every component in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColorParts")]
pub struct Color {
    red: f64,
    green: f64,
    blue: f64,
    alpha: f64,
}

#[derive(Deserialize)]
struct ColorParts {
    red: f64,
    green: f64,
    blue: f64,
    alpha: f64,
}

impl TryFrom<ColorParts> for Color {
    type Error = ColorError;

    fn try_from(parts: ColorParts) -> Result<Self, Self::Error> {
        Color::new(parts.red, parts.green, parts.blue, parts.alpha)
    }
}

impl Color {
    pub fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Result<Self, ColorError> {
        for (component, value) in [("red", red), ("green", green), ("blue", blue), ("alpha", alpha)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ColorError::ComponentOutOfRange { component, value });
            }
        }
        Ok(Self {
            red,
            green,
            blue,
            alpha,
        })
    }

    /// Opaque color from 8-bit channels
    pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: f64::from(red) / 255.0,
            green: f64::from(green) / 255.0,
            blue: f64::from(blue) / 255.0,
            alpha: 1.0,
        }
    }

    pub fn red(&self) -> f64 {
        self.red
    }

    pub fn green(&self) -> f64 {
        self.green
    }

    pub fn blue(&self) -> f64 {
        self.blue
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn is_opaque(&self) -> bool {
        self.alpha >= 1.0
    }

    fn channels8(&self) -> [u8; 3] {
        [self.red, self.green, self.blue].map(to_u8)
    }

    /// Hue in degrees, saturation and lightness in [0, 1]
    pub fn to_hsl(&self) -> (f64, f64, f64) {
        let (r, g, b) = (self.red, self.green, self.blue);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let lightness = (max + min) / 2.0;

        if max == min {
            return (0.0, 0.0, lightness);
        }

        let delta = max - min;
        let saturation = if lightness > 0.5 {
            delta / (2.0 - max - min)
        } else {
            delta / (max + min)
        };
        let sector = if max == r {
            (g - b) / delta + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        (sector * 60.0, saturation, lightness)
    }

    /// Canonical text form in `format`
    ///
    /// Opaque colors use the short forms (`rgb`, `#rrggbb`, `hsl`); translucent
    /// ones carry alpha (`rgba`, `#rrggbbaa`, `hsla`).
    pub fn render(&self, format: ColorFormat) -> String {
        let [r, g, b] = self.channels8();
        match format {
            ColorFormat::Rgb if self.is_opaque() => format!("rgb({r}, {g}, {b})"),
            ColorFormat::Rgb => format!("rgba({r}, {g}, {b}, {})", format_alpha(self.alpha)),
            ColorFormat::Hex => {
                let mut out = format!("#{r:02x}{g:02x}{b:02x}");
                if !self.is_opaque() {
                    let _ = write!(out, "{:02x}", to_u8(self.alpha));
                }
                out
            }
            ColorFormat::Hsl => {
                let (h, s, l) = self.to_hsl();
                let (h, s, l) = (h.round() as u16 % 360, percent(s), percent(l));
                if self.is_opaque() {
                    format!("hsl({h}, {s}%, {l}%)")
                } else {
                    format!("hsla({h}, {s}%, {l}%, {})", format_alpha(self.alpha))
                }
            }
        }
    }
}

fn to_u8(component: f64) -> u8 {
    (component * 255.0).round().clamp(0.0, 255.0) as u8
}

fn percent(fraction: f64) -> u8 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

fn format_alpha(alpha: f64) -> String {
    let rounded = (alpha * 100.0).round() / 100.0;
    rounded.to_string()
}

/// Text representations a color can be rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ColorFormat {
    Rgb = 0,
    Hex = 1,
    Hsl = 2,
}

/// Zero-based line and character offset in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Ordered span between two positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Build a range, swapping the ends if given in reverse
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }
}

/// A color found at a non-empty range of a document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    range: Range,
    color: Color,
}

impl ColorRange {
    pub fn new(range: Range, color: Color) -> Result<Self, ColorError> {
        if range.is_empty() {
            return Err(ColorError::EmptyRange);
        }
        Ok(Self { range, color })
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn color(&self) -> Color {
        self.color
    }
}

/// Finds colors in documents and renders them back to text
#[async_trait]
pub trait DocumentColorProvider: Send + Sync {
    /// Colors in `document`
    ///
    /// `Ok(None)` and an empty list both mean the document has no colors;
    /// an `Err` means the provider failed.
    async fn provide_document_colors(
        &self,
        document: &ResourceId,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<ColorRange>>, ColorError>;

    async fn resolve_document_color(
        &self,
        color: &Color,
        format: ColorFormat,
    ) -> Result<String, ColorError> {
        Ok(color.render(format))
    }
}

struct ColorRegistration {
    selector: Authority,
    provider: Arc<dyn DocumentColorProvider>,
}

/// Color providers keyed by the authority of the documents they handle
#[derive(Clone)]
pub struct ColorProviderRegistry {
    providers: Arc<DashMap<u64, ColorRegistration, RandomState>>,
    next_id: Arc<AtomicU64>,
}

impl ColorProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: Arc::new(DashMap::with_hasher(RandomState::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Route documents under `selector` to `provider`
    ///
    /// Several providers may share an authority; their results are merged.
    pub fn register(&self, selector: Authority, provider: Arc<dyn DocumentColorProvider>) -> Disposable {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.providers.insert(id, ColorRegistration { selector, provider });

        let providers = Arc::downgrade(&self.providers);
        Disposable::new(move || {
            if let Some(providers) = providers.upgrade() {
                providers.remove(&id);
            }
        })
    }

    /// Colors from every provider matching `document`, merged in registration order
    ///
    /// An empty list means no provider found any colors. If any provider
    /// fails, the first failure in registration order is returned instead.
    pub async fn provide_colors(
        &self,
        document: &ResourceId,
        cancel: &CancellationToken,
    ) -> Result<Vec<ColorRange>, ColorError> {
        let mut matching: Vec<(u64, Arc<dyn DocumentColorProvider>)> = self
            .providers
            .iter()
            .filter(|entry| &entry.selector == document.authority())
            .map(|entry| (*entry.key(), Arc::clone(&entry.provider)))
            .collect();
        matching.sort_by_key(|(id, _)| *id);

        let queries = matching
            .iter()
            .map(|(_, provider)| provider.provide_document_colors(document, cancel));
        let results = join_all(queries).await;

        let mut colors = Vec::new();
        for result in results {
            match result {
                Ok(found) => colors.extend(found.unwrap_or_default()),
                Err(e) => {
                    warn!(document = %document, error = %e, "color provider failed");
                    return Err(e);
                }
            }
        }
        Ok(colors)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ColorProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
