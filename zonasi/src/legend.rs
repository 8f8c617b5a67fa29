//! Légende dynamique et statistiques d'occupation du sol
//!
//! Calculs purs sur la collection rendue, sans dépendance à l'état du
//! renderer.

use std::collections::HashSet;

use serde::Serialize;

use crate::catalog::ZoneCatalog;
use crate::color::Color;
use crate::format::{format_area, format_percentage};
use crate::types::{Locale, PlanningFeatureCollection, ZoneCategory, ZoneClassification};

/// Une entrée de légende : un code de zone présent dans la collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub zone: String,
    /// Usage du sol de la première feature portant ce code
    pub land_use: String,
    pub color: Color,
    /// Classification connue du catalogue, le cas échéant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<ZoneClassification>,
}

/// Légende dérivée d'une collection, dans l'ordre de première apparition
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Legend {
    entries: Vec<LegendEntry>,
}

impl Legend {
    /// Toutes les entrées dérivées
    pub fn entries(&self) -> &[LegendEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entrées affichées, limitées à `cap`
    pub fn displayed(&self, cap: usize) -> &[LegendEntry] {
        &self.entries[..self.entries.len().min(cap)]
    }

    /// Nombre d'entrées masquées par la limite d'affichage
    pub fn hidden(&self, cap: usize) -> usize {
        self.entries.len().saturating_sub(cap)
    }

    /// Rendu texte du panneau de légende
    pub fn render_text(&self, locale: Locale, cap: usize) -> String {
        let (title, more, total) = match locale {
            Locale::Id => ("Legenda Zonasi", "lainnya", "Total zona"),
            Locale::En => ("Zoning Legend", "more", "Total zones"),
        };

        let mut out = String::new();
        out.push_str(title);
        out.push('\n');
        for entry in self.displayed(cap) {
            out.push_str(&format!("  {} {:<4} {}\n", entry.color, entry.zone, entry.land_use));
        }
        let hidden = self.hidden(cap);
        if hidden > 0 {
            out.push_str(&format!("  ... +{} {}\n", hidden, more));
        }
        out.push_str(&format!("{}: {}", total, self.entries.len()));
        out
    }
}

/// Dérive la légende : codes de zone distincts, ordre de première apparition
///
/// Une entrée par code de zone : si un code porte plusieurs libellés
/// d'occupation, seul le libellé de la première feature est affiché.
pub fn derive_legend(collection: &PlanningFeatureCollection, catalog: &ZoneCatalog) -> Legend {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for feature in &collection.features {
        let zone = feature.zone();
        if !seen.insert(zone) {
            continue;
        }
        entries.push(LegendEntry {
            zone: zone.to_string(),
            land_use: feature.properties.land_use.clone(),
            color: catalog.color_for(zone),
            classification: catalog.get(zone).cloned(),
        });
    }

    Legend { entries }
}

/// Agrégats d'une catégorie
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryStats {
    /// Surface cumulée (ha)
    pub area: f64,
    /// Nombre de features
    pub count: usize,
    /// Part de la surface totale (0 à 100)
    pub percentage: f64,
}

/// Statistiques par catégorie, dans l'ordre de première apparition
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LandUseStatistics {
    pub total_area: f64,
    /// Nombre de features comptabilisées
    pub zone_count: usize,
    pub categories: Vec<(ZoneCategory, CategoryStats)>,
}

impl LandUseStatistics {
    pub fn get(&self, category: ZoneCategory) -> Option<&CategoryStats> {
        self.categories
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, s)| s)
    }

    /// Somme des pourcentages (100 dès que la surface totale est non nulle)
    pub fn percentage_sum(&self) -> f64 {
        self.categories.iter().map(|(_, s)| s.percentage).sum()
    }

    fn add(&mut self, category: ZoneCategory, area: f64, count: usize) {
        self.total_area += area;
        self.zone_count += count;
        match self.categories.iter_mut().find(|(c, _)| *c == category) {
            Some((_, stats)) => {
                stats.area += area;
                stats.count += count;
            }
            None => self.categories.push((
                category,
                CategoryStats {
                    area,
                    count,
                    percentage: 0.0,
                },
            )),
        }
    }

    fn finalize(&mut self) {
        let total = self.total_area;
        for (_, stats) in self.categories.iter_mut() {
            stats.percentage = if total > 0.0 {
                stats.area / total * 100.0
            } else {
                0.0
            };
        }
    }

    /// Fusionne plusieurs statistiques (pourcentages recalculés)
    pub fn merge<'a>(parts: impl IntoIterator<Item = &'a LandUseStatistics>) -> Self {
        let mut merged = Self::default();
        for part in parts {
            for (category, stats) in &part.categories {
                merged.add(*category, stats.area, stats.count);
            }
        }
        merged.finalize();
        merged
    }

    /// Rendu texte du panneau de statistiques
    pub fn render_text(&self, locale: Locale) -> String {
        let (title, features, total) = match locale {
            Locale::Id => ("Statistik Penggunaan Lahan", "fitur", "Total luas"),
            Locale::En => ("Land Use Statistics", "features", "Total area"),
        };

        let mut out = String::new();
        out.push_str(title);
        out.push('\n');
        for (category, stats) in &self.categories {
            out.push_str(&format!(
                "  {}: {} ({}), {} {}\n",
                category.label(locale),
                format_area(stats.area),
                format_percentage(stats.percentage),
                stats.count,
                features
            ));
        }
        out.push_str(&format!("{}: {}", total, format_area(self.total_area)));
        out
    }
}

/// Agrège surface et nombre de features par catégorie.
///
/// Une surface totale nulle donne des pourcentages nuls. Les surfaces non
/// finies ou négatives sont ignorées.
pub fn compute_statistics(collection: &PlanningFeatureCollection) -> LandUseStatistics {
    let mut stats = LandUseStatistics::default();
    for feature in &collection.features {
        let area = feature.properties.area;
        if !area.is_finite() || area < 0.0 {
            continue;
        }
        stats.add(feature.properties.zone_category, area, 1);
    }
    stats.finalize();
    stats
}
