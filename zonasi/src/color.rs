//! Couleurs d'affichage des zones

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ZonasiError;

/// Couleur RGB 24 bits, sérialisée en `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(u32);

impl Color {
    /// Gris neutre utilisé quand un code de zone est inconnu
    pub const FALLBACK: Color = Color(0xCCCCCC);

    /// Valeur soustraite pour obtenir la couleur de contour
    const STROKE_SHIFT: u32 = 0x333333;

    pub const fn from_rgb_u32(rgb: u32) -> Self {
        Self(rgb & 0xFFFFFF)
    }

    /// Couleur de contour dérivée de la couleur de remplissage.
    ///
    /// Soustraction sur la valeur 24 bits entière (avec retenue entre canaux),
    /// saturée à zéro : `#90EE90` donne `#5DBB5D`.
    pub fn darken(self) -> Self {
        Self(self.0.saturating_sub(Self::STROKE_SHIFT))
    }
}

impl FromStr for Color {
    type Err = ZonasiError;

    /// Accepte `#RRGGBB` et `#RGB` (casse indifférente)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ZonasiError::InvalidColor(s.to_string());

        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        match hex.len() {
            6 => u32::from_str_radix(hex, 16)
                .map(Self)
                .map_err(|_| invalid()),
            3 => {
                // #ABC → #AABBCC
                let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
                u32::from_str_radix(&expanded, 16)
                    .map(Self)
                    .map_err(|_| invalid())
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ZonasiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!("#90EE90".parse::<Color>().unwrap(), Color(0x90EE90));
        assert_eq!("#90ee90".parse::<Color>().unwrap(), Color(0x90EE90));
        assert_eq!("#abc".parse::<Color>().unwrap(), Color(0xAABBCC));
    }

    #[test]
    fn test_parse_invalid() {
        assert!("90EE90".parse::<Color>().is_err());
        assert!("#90EE9".parse::<Color>().is_err());
        assert!("#GGGGGG".parse::<Color>().is_err());
        assert!("#+12345".parse::<Color>().is_err());
        assert!("".parse::<Color>().is_err());
    }

    #[test]
    fn test_darken_matches_stroke_palette() {
        assert_eq!(Color(0x90EE90).darken().to_string(), "#5DBB5D");
        assert_eq!(Color::FALLBACK.darken().to_string(), "#999999");
        assert_eq!(Color(0x87CEEB).darken().to_string(), "#549BB8");
        // Retenue entre canaux (bleu 0x00 < 0x33)
        assert_eq!(Color(0xFFD700).darken().to_string(), "#CCA3CD");
        assert_eq!(Color(0x101010).darken(), Color(0));
    }

    #[test]
    fn test_serde_roundtrip_format() {
        let json = serde_json::to_string(&Color(0x32CD32)).unwrap();
        assert_eq!(json, "\"#32CD32\"");
        let back: Color = serde_json::from_str("\"#32cd32\"").unwrap();
        assert_eq!(back, Color(0x32CD32));
        assert!(serde_json::from_str::<Color>("\"red\"").is_err());
    }
}
