use std::fmt;

use serde::Deserialize;

use crate::error::SceneError;

/// RGB identity of a hotspot in the mask pass.
///
/// `(0, 0, 0)` is reserved: the mask target is cleared to it, so reading it
/// back means "no hit".
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct ColorKey {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorKey {
    pub const NONE: ColorKey = ColorKey::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Parses `rrggbb` or `#rrggbb`.
    pub fn from_hex(s: &str) -> Result<Self, SceneError> {
        let hex = s.trim().trim_start_matches('#');
        let invalid = || SceneError::InvalidColorKey(s.to_string());
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Key stored in a read-back `Rgba8Unorm` texel. Fully transparent texels
    /// were never written by the mask pass and map to [`ColorKey::NONE`].
    #[inline]
    pub fn from_texel(texel: [u8; 4]) -> Self {
        if texel[3] == 0 {
            Self::NONE
        } else {
            Self::new(texel[0], texel[1], texel[2])
        }
    }

    /// Channels in `[0, 1]` for shader uniforms.
    #[inline]
    pub fn to_unit(self) -> [f32; 3] {
        [self.r as f32 / 255.0, self.g as f32 / 255.0, self.b as f32 / 255.0]
    }
}

impl fmt::Display for ColorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for ColorKey {
    type Error = SceneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_hash() {
        assert_eq!(ColorKey::from_hex("ff0080").ok(), Some(ColorKey::new(255, 0, 128)));
        assert_eq!(ColorKey::from_hex("#0A0b0C").ok(), Some(ColorKey::new(10, 11, 12)));
    }

    #[test]
    fn rejects_malformed_hex() {
        for bad in ["", "fff", "gg0000", "#12345", "1234567", "ééé"] {
            assert!(
                matches!(ColorKey::from_hex(bad), Err(SceneError::InvalidColorKey(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn display_round_trips_through_hex() {
        let key = ColorKey::new(1, 171, 255);
        assert_eq!(key.to_string(), "#01abff");
    }

    #[test]
    fn transparent_texel_is_no_hit() {
        assert!(ColorKey::from_texel([255, 0, 0, 0]).is_none());
        assert_eq!(ColorKey::from_texel([255, 0, 0, 255]), ColorKey::new(255, 0, 0));
    }
}
