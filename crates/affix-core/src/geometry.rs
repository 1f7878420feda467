//! Geometry strings and scale/crop math
//!
//! A geometry is written `<width>x<height>` with an optional modifier suffix,
//! following the conversion tool's syntax. Either dimension may be omitted to let
//! that axis scale freely. The `#` modifier asks for crop-to-fill: scale until the
//! target box is fully covered, then cut the centre out.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ConfigError, ConfigResult};

static GEOMETRY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d*)(?:x(\d*))?([#><!%@^])?$").expect("geometry pattern is valid")
});

pub const CROP_MODIFIER: char = '#';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub modifier: Option<char>,
    /// Offset of a crop region, rendered as `+x+y`.
    pub offset: Option<(u32, u32)>,
}

/// Result of fitting a source geometry into a target one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformation {
    pub scale: Geometry,
    pub crop: Option<Geometry>,
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            modifier: None,
            offset: None,
        }
    }

    pub fn parse(input: &str) -> ConfigResult<Self> {
        let trimmed = input.trim();
        let invalid = || ConfigError::InvalidGeometry {
            input: input.to_string(),
        };

        let caps = GEOMETRY_PATTERN.captures(trimmed).ok_or_else(invalid)?;
        let dimension = |idx: usize| -> ConfigResult<Option<u32>> {
            match caps.get(idx).map(|m| m.as_str()).filter(|s| !s.is_empty()) {
                Some(digits) => digits.parse().map(Some).map_err(|_| invalid()),
                None => Ok(None),
            }
        };

        let width = dimension(1)?;
        let height = dimension(2)?;
        if width.is_none() && height.is_none() {
            return Err(invalid());
        }

        Ok(Self {
            width,
            height,
            modifier: caps.get(3).and_then(|m| m.as_str().chars().next()),
            offset: None,
        })
    }

    /// Parse the `<width>x<height>` line printed by the identification tool.
    pub fn from_identify_output(output: &str) -> ConfigResult<Self> {
        let line = output.lines().next().unwrap_or_default();
        let geometry = Self::parse(line)?;
        match (geometry.width, geometry.height) {
            (Some(width), Some(height)) => Ok(Self::new(width, height)),
            _ => Err(ConfigError::InvalidGeometry {
                input: output.to_string(),
            }),
        }
    }

    pub fn is_crop(&self) -> bool {
        self.modifier == Some(CROP_MODIFIER)
    }

    /// Compute how `self` (the source image) must be resized, and optionally
    /// cropped, to produce `target`.
    ///
    /// Without crop the target is used as-is. With crop the source is scaled by the
    /// larger of the two axis ratios so it covers the target box; the scale geometry
    /// pins only the binding axis, and the crop region is centred on the other one.
    pub fn transformation_to(&self, target: &Geometry, crop: bool) -> ConfigResult<Transformation> {
        if !crop {
            return Ok(Transformation {
                scale: *target,
                crop: None,
            });
        }

        let (target_width, target_height) = match (target.width, target.height) {
            (Some(w), Some(h)) => (w, h),
            _ => {
                return Err(ConfigError::IncompleteCropGeometry {
                    geometry: target.to_string(),
                })
            }
        };
        let (source_width, source_height) = match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => {
                return Err(ConfigError::InvalidGeometry {
                    input: self.to_string(),
                })
            }
        };

        let width_ratio = f64::from(target_width) / f64::from(source_width);
        let height_ratio = f64::from(target_height) / f64::from(source_height);

        let (scale, offset) = if width_ratio > height_ratio {
            let scaled_height = f64::from(source_height) * width_ratio;
            let offset_y = centre_offset(scaled_height, target_height);
            (
                Geometry {
                    width: Some(target_width),
                    ..Geometry::default()
                },
                (0, offset_y),
            )
        } else {
            let scaled_width = f64::from(source_width) * height_ratio;
            let offset_x = centre_offset(scaled_width, target_width);
            (
                Geometry {
                    height: Some(target_height),
                    ..Geometry::default()
                },
                (offset_x, 0),
            )
        };

        Ok(Transformation {
            scale,
            crop: Some(Geometry {
                width: Some(target_width),
                height: Some(target_height),
                modifier: None,
                offset: Some(offset),
            }),
        })
    }
}

fn centre_offset(scaled: f64, target: u32) -> u32 {
    ((scaled - f64::from(target)) / 2.0).max(0.0).floor() as u32
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(width) = self.width {
            write!(f, "{}", width)?;
        }
        f.write_str("x")?;
        if let Some(height) = self.height {
            write!(f, "{}", height)?;
        }
        if let Some((x, y)) = self.offset {
            write!(f, "+{}+{}", x, y)?;
        }
        if let Some(modifier) = self.modifier {
            write!(f, "{}", modifier)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Geometry {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_geometry() {
        let geometry = Geometry::parse("100x200").unwrap();
        assert_eq!(geometry.width, Some(100));
        assert_eq!(geometry.height, Some(200));
        assert_eq!(geometry.modifier, None);
        assert!(!geometry.is_crop());
    }

    #[test]
    fn test_parse_crop_modifier() {
        let geometry = Geometry::parse("50x50#").unwrap();
        assert_eq!(geometry.modifier, Some('#'));
        assert!(geometry.is_crop());
        assert_eq!(geometry.to_string(), "50x50#");
    }

    #[test]
    fn test_parse_free_axis() {
        let geometry = Geometry::parse("x50").unwrap();
        assert_eq!(geometry.width, None);
        assert_eq!(geometry.height, Some(50));
        assert_eq!(geometry.to_string(), "x50");

        let geometry = Geometry::parse("75x>").unwrap();
        assert_eq!(geometry.width, Some(75));
        assert_eq!(geometry.height, None);
        assert_eq!(geometry.modifier, Some('>'));

        let geometry = Geometry::parse("120").unwrap();
        assert_eq!(geometry.width, Some(120));
        assert_eq!(geometry.height, None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "x", "abc", "10x10x10", "10y10", "#"] {
            assert!(
                matches!(Geometry::parse(input), Err(ConfigError::InvalidGeometry { .. })),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_non_crop_transformation_keeps_target() {
        let source = Geometry::new(640, 480);
        let target = Geometry::parse("100x100").unwrap();
        let transformation = source.transformation_to(&target, false).unwrap();
        assert_eq!(transformation.scale.to_string(), "100x100");
        assert!(transformation.crop.is_none());
    }

    #[test]
    fn test_crop_wide_source() {
        let source = Geometry::new(300, 100);
        let target = Geometry::parse("50x50#").unwrap();
        let transformation = source.transformation_to(&target, true).unwrap();
        assert_eq!(transformation.scale.to_string(), "x50");
        assert_eq!(transformation.crop.unwrap().to_string(), "50x50+50+0");
    }

    #[test]
    fn test_crop_tall_source() {
        let source = Geometry::new(100, 300);
        let target = Geometry::parse("50x50#").unwrap();
        let transformation = source.transformation_to(&target, true).unwrap();
        assert_eq!(transformation.scale.to_string(), "50x");
        assert_eq!(transformation.crop.unwrap().to_string(), "50x50+0+50");
    }

    #[test]
    fn test_crop_odd_remainder_floors() {
        // 400x300 into 100x50: width ratio .25 wins, height scales to 75, (75-50)/2 = 12.5
        let source = Geometry::new(400, 300);
        let target = Geometry::parse("100x50#").unwrap();
        let transformation = source.transformation_to(&target, true).unwrap();
        assert_eq!(transformation.scale.to_string(), "100x");
        assert_eq!(transformation.crop.unwrap().to_string(), "100x50+0+12");
    }

    #[test]
    fn test_crop_requires_both_target_dimensions() {
        let source = Geometry::new(300, 100);
        let target = Geometry::parse("50x#").unwrap();
        assert!(matches!(
            source.transformation_to(&target, true),
            Err(ConfigError::IncompleteCropGeometry { .. })
        ));
    }

    #[test]
    fn test_from_identify_output() {
        let geometry = Geometry::from_identify_output("300x100\n").unwrap();
        assert_eq!(geometry, Geometry::new(300, 100));
        assert!(Geometry::from_identify_output("x100").is_err());
        assert!(Geometry::from_identify_output("").is_err());
    }
}
