//! Image size descriptors (`WxH`) and aspect-ratio derivation.

use std::fmt;

/// Canvas used whenever a size descriptor cannot be parsed.
pub const DEFAULT_SIZE: ImageSize = ImageSize {
    width: 1024,
    height: 1024,
};

/// Aspect ratio reported when a size descriptor cannot be reduced.
pub const DEFAULT_ASPECT_RATIO: &str = "1:1";

/// Largest pixel count the local renderer will allocate (one 7680x4320 frame).
const MAX_PIXELS: u64 = 7680 * 4320;

/// A pixel size parsed from a `WIDTHxHEIGHT` descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse a `WxH` descriptor such as `1920x1080`.
    ///
    /// The separator is case-insensitive and surrounding whitespace is ignored.
    /// Returns `None` for malformed input or a zero side.
    pub fn parse(descriptor: &str) -> Option<Self> {
        let lower = descriptor.trim().to_lowercase();
        let (w, h) = lower.split_once('x')?;
        let width: u32 = w.trim().parse().ok()?;
        let height: u32 = h.trim().parse().ok()?;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self { width, height })
    }

    /// Parse a descriptor for local rendering, falling back to 1024x1024.
    ///
    /// Sizes whose area exceeds 7680x4320 are treated as unparseable. Either
    /// orientation is fine, so `4320x7680` renders as asked.
    pub fn parse_or_default(descriptor: &str) -> Self {
        match Self::parse(descriptor) {
            Some(size) if u64::from(size.width) * u64::from(size.height) <= MAX_PIXELS => size,
            _ => DEFAULT_SIZE,
        }
    }

    /// Width:height reduced to lowest terms, e.g. `16:9`.
    pub fn aspect_ratio(&self) -> String {
        let g = gcd(self.width, self.height);
        format!("{}:{}", self.width / g, self.height / g)
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Derive an aspect ratio from a raw `WxH` descriptor, `1:1` if unparseable.
pub fn aspect_ratio_from_size(descriptor: &str) -> String {
    ImageSize::parse(descriptor)
        .map(|size| size.aspect_ratio())
        .unwrap_or_else(|| DEFAULT_ASPECT_RATIO.to_string())
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}
