//! Mapping cell values to colors.
//!
//! A [`ColorScale`] maps the matrix [`Extent`] onto a sequential
//! [`ColorScheme`]. Missing cells get [`CellColor::Missing`], which no value
//! can map to.

use core::fmt;
use core::str::FromStr;

use crate::error::Error;
use crate::matrix::{Cell, Extent};

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb {
    const fn hex(v: u32) -> Self {
        Self {
            r: (v >> 16) as u8,
            g: (v >> 8) as u8,
            b: v as u8,
        }
    }

    fn lerp(self, other: Self, t: f64) -> Self {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Color of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellColor {
    /// A value mapped through the scale.
    Value(Rgb),
    /// No data.
    Missing,
}

/// Sequential color schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorScheme {
    /// Red → yellow → green (ColorBrewer RdYlGn).
    #[default]
    RdYlGn,
    /// Perceptually uniform purple → green → yellow.
    Viridis,
    /// White → dark blue.
    Blues,
    /// White → black.
    Greys,
}

const RD_YL_GN: [Rgb; 11] = [
    Rgb::hex(0xa50026),
    Rgb::hex(0xd73027),
    Rgb::hex(0xf46d43),
    Rgb::hex(0xfdae61),
    Rgb::hex(0xfee08b),
    Rgb::hex(0xffffbf),
    Rgb::hex(0xd9ef8b),
    Rgb::hex(0xa6d96a),
    Rgb::hex(0x66bd63),
    Rgb::hex(0x1a9850),
    Rgb::hex(0x006837),
];

const VIRIDIS: [Rgb; 10] = [
    Rgb::hex(0x440154),
    Rgb::hex(0x482878),
    Rgb::hex(0x3e4989),
    Rgb::hex(0x31688e),
    Rgb::hex(0x26828e),
    Rgb::hex(0x1f9e89),
    Rgb::hex(0x35b779),
    Rgb::hex(0x6ece58),
    Rgb::hex(0xb5de2b),
    Rgb::hex(0xfde725),
];

const BLUES: [Rgb; 9] = [
    Rgb::hex(0xf7fbff),
    Rgb::hex(0xdeebf7),
    Rgb::hex(0xc6dbef),
    Rgb::hex(0x9ecae1),
    Rgb::hex(0x6baed6),
    Rgb::hex(0x4292c6),
    Rgb::hex(0x2171b5),
    Rgb::hex(0x08519c),
    Rgb::hex(0x08306b),
];

const GREYS: [Rgb; 2] = [Rgb::hex(0xffffff), Rgb::hex(0x000000)];

impl ColorScheme {
    /// All schemes, for building a selector.
    pub const ALL: [ColorScheme; 4] = [
        ColorScheme::RdYlGn,
        ColorScheme::Viridis,
        ColorScheme::Blues,
        ColorScheme::Greys,
    ];

    fn stops(self) -> &'static [Rgb] {
        match self {
            ColorScheme::RdYlGn => &RD_YL_GN,
            ColorScheme::Viridis => &VIRIDIS,
            ColorScheme::Blues => &BLUES,
            ColorScheme::Greys => &GREYS,
        }
    }

    /// Color at `t` in `[0, 1]`, piecewise linear between stops. `t` is clamped.
    pub fn interpolate(self, t: f64) -> Rgb {
        let stops = self.stops();
        let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (stops.len() - 1) as f64;
        let i = (scaled.floor() as usize).min(stops.len() - 2);
        stops[i].lerp(stops[i + 1], scaled - i as f64)
    }

    /// Scheme name.
    pub fn name(self) -> &'static str {
        match self {
            ColorScheme::RdYlGn => "RdYlGn",
            ColorScheme::Viridis => "Viridis",
            ColorScheme::Blues => "Blues",
            ColorScheme::Greys => "Greys",
        }
    }
}

impl FromStr for ColorScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorScheme::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidParameter {
                name: "scheme",
                message: format!("unknown color scheme '{s}'"),
            })
    }
}

/// Maps values in an extent to colors of a scheme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    extent: Option<Extent>,
    scheme: ColorScheme,
}

impl ColorScale {
    /// Scale over `extent`; `None` when the matrix holds no value.
    pub fn new(extent: Option<Extent>, scheme: ColorScheme) -> Self {
        Self { extent, scheme }
    }

    /// The value range.
    pub fn extent(&self) -> Option<Extent> {
        self.extent
    }

    /// The scheme.
    pub fn scheme(&self) -> ColorScheme {
        self.scheme
    }

    /// Position of `value` in the extent, in `[0, 1]`. A zero-width extent maps to `0.5`.
    pub fn normalize(&self, value: f64) -> f64 {
        match self.extent {
            Some(Extent { min, max }) if max > min => ((value - min) / (max - min)).clamp(0.0, 1.0),
            _ => 0.5,
        }
    }

    /// Color of a cell.
    pub fn color(&self, cell: Cell) -> CellColor {
        match cell {
            Some(v) => CellColor::Value(self.scheme.interpolate(self.normalize(v))),
            None => CellColor::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        assert_eq!(ColorScheme::RdYlGn.interpolate(0.0), Rgb::hex(0xa50026));
        assert_eq!(ColorScheme::RdYlGn.interpolate(1.0), Rgb::hex(0x006837));
        assert_eq!(ColorScheme::RdYlGn.interpolate(0.5), Rgb::hex(0xffffbf));
        assert_eq!(ColorScheme::Greys.interpolate(0.5), Rgb { r: 128, g: 128, b: 128 });
    }

    #[test]
    fn test_scale() {
        let scale = ColorScale::new(Some(Extent { min: 0.0, max: 10.0 }), ColorScheme::Greys);
        assert_eq!(scale.normalize(5.0), 0.5);
        assert_eq!(scale.normalize(20.0), 1.0);
        assert_eq!(scale.color(Some(0.0)), CellColor::Value(Rgb::hex(0xffffff)));
        assert_eq!(scale.color(None), CellColor::Missing);
    }

    #[test]
    fn test_degenerate_extent_is_midpoint() {
        let scale = ColorScale::new(Some(Extent { min: 3.0, max: 3.0 }), ColorScheme::RdYlGn);
        assert_eq!(scale.normalize(3.0), 0.5);
        assert_eq!(ColorScale::new(None, ColorScheme::RdYlGn).normalize(1.0), 0.5);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("viridis".parse::<ColorScheme>().unwrap(), ColorScheme::Viridis);
        assert!("rainbow".parse::<ColorScheme>().is_err());
        assert_eq!(Rgb::hex(0x0a0b0c).to_string(), "#0a0b0c");
    }
}
