//! Catalogue des classifications de zones (code → couleur, libellés)

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::color::Color;
use crate::types::{ZoneCategory, ZoneClassification};
use crate::ZonasiError;

/// Table de correspondance code de zone → classification.
///
/// L'ordre d'insertion est conservé pour l'affichage.
#[derive(Debug, Clone, Default)]
pub struct ZoneCatalog {
    zones: Vec<ZoneClassification>,
    index: HashMap<String, usize>,
}

impl ZoneCatalog {
    /// Construit un catalogue ; un code en double est une erreur
    pub fn new(zones: Vec<ZoneClassification>) -> Result<Self, ZonasiError> {
        let mut index = HashMap::with_capacity(zones.len());
        for (i, zone) in zones.iter().enumerate() {
            if index.insert(zone.code.clone(), i).is_some() {
                return Err(ZonasiError::DuplicateZone(zone.code.clone()));
            }
        }
        Ok(Self { zones, index })
    }

    /// Charge un catalogue depuis du JSON (tableau de classifications).
    ///
    /// Les couleurs invalides sont rejetées par la désérialisation de `Color`.
    pub fn from_json_str(json: &str) -> Result<Self, ZonasiError> {
        let zones: Vec<ZoneClassification> = serde_json::from_str(json)?;
        Self::new(zones)
    }

    /// Charge un catalogue depuis un fichier
    pub fn load(path: &Path) -> Result<Self, ZonasiError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Charge un catalogue depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self, ZonasiError> {
        match preset {
            "default" | "rdtr" => Self::from_json_str(include_str!("presets/default.json")),
            _ => Err(ZonasiError::UnknownPreset(preset.to_string())),
        }
    }

    /// Preset par défaut (zones RDTR usuelles)
    pub fn builtin() -> Self {
        Self::from_preset("default").unwrap_or_default()
    }

    pub fn get(&self, code: &str) -> Option<&ZoneClassification> {
        self.index.get(code).map(|&i| &self.zones[i])
    }

    /// Couleur d'un code de zone, gris neutre si le code est inconnu
    pub fn color_for(&self, code: &str) -> Color {
        match self.get(code) {
            Some(zone) => zone.color,
            None => {
                debug!(zone = code, "Zone code missing from catalog, using fallback color");
                Color::FALLBACK
            }
        }
    }

    pub fn zones(&self) -> &[ZoneClassification] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Classifications groupées par catégorie, dans l'ordre de première apparition
    pub fn group_by_category(&self) -> Vec<(ZoneCategory, Vec<&ZoneClassification>)> {
        let mut groups: Vec<(ZoneCategory, Vec<&ZoneClassification>)> = Vec::new();
        for zone in &self.zones {
            match groups.iter_mut().find(|(c, _)| *c == zone.category) {
                Some((_, members)) => members.push(zone),
                None => groups.push((zone.category, vec![zone])),
            }
        }
        groups
    }
}

/// Couleur représentative d'une catégorie
pub fn category_color(category: ZoneCategory) -> Color {
    let rgb = match category {
        ZoneCategory::Residential => 0x90EE90,
        ZoneCategory::Commercial => 0x87CEEB,
        ZoneCategory::Industrial => 0xFFD700,
        ZoneCategory::MixedUse => 0xDDA0DD,
        ZoneCategory::Infrastructure => 0xFFB6C1,
        ZoneCategory::OpenSpace => 0x32CD32,
        ZoneCategory::Special => 0xF0E68C,
    };
    Color::from_rgb_u32(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bilingual;

    fn zone(code: &str, color: &str) -> ZoneClassification {
        ZoneClassification {
            code: code.to_string(),
            name: Bilingual::new(code, code),
            color: color.parse().unwrap(),
            category: ZoneCategory::Residential,
            density: None,
            description: Bilingual::default(),
        }
    }

    #[test]
    fn test_builtin_preset() {
        let catalog = ZoneCatalog::builtin();
        assert_eq!(catalog.len(), 11);
        assert_eq!(catalog.color_for("R1").to_string(), "#90EE90");
        assert_eq!(catalog.color_for("KS").to_string(), "#F0E68C");
        assert_eq!(catalog.get("RTH").unwrap().category, ZoneCategory::OpenSpace);
    }

    #[test]
    fn test_unknown_code_falls_back_to_gray() {
        let catalog = ZoneCatalog::builtin();
        assert_eq!(catalog.color_for("ZZ9"), Color::FALLBACK);
        assert_eq!(ZoneCatalog::default().color_for("R1"), Color::FALLBACK);
    }

    #[test]
    fn test_duplicate_codes_rejected() {
        let result = ZoneCatalog::new(vec![zone("R1", "#111111"), zone("R1", "#222222")]);
        assert!(matches!(result, Err(ZonasiError::DuplicateZone(code)) if code == "R1"));
    }

    #[test]
    fn test_invalid_color_rejected() {
        let json = r##"[{"code":"R1","name":{"id":"a","en":"a"},"color":"green",
            "category":"residential","description":{"id":"","en":""}}]"##;
        assert!(ZoneCatalog::from_json_str(json).is_err());
    }

    #[test]
    fn test_unknown_preset() {
        assert!(matches!(
            ZoneCatalog::from_preset("rtrw-bali"),
            Err(ZonasiError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_group_by_category() {
        let catalog = ZoneCatalog::builtin();
        let groups = catalog.group_by_category();
        assert_eq!(groups[0].0, ZoneCategory::Residential);
        assert_eq!(groups[0].1.len(), 3);
        assert_eq!(groups.len(), 7);
    }

    #[test]
    fn test_category_color() {
        assert_eq!(category_color(ZoneCategory::OpenSpace).to_string(), "#32CD32");
    }
}
