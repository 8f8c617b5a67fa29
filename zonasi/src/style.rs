//! Règles de style des features selon leur zone

use serde::{Deserialize, Serialize};

use crate::catalog::ZoneCatalog;
use crate::color::Color;

/// Paramètres de style configurables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleOptions {
    /// Opacité du remplissage (lisibilité au-dessus des tuiles)
    pub fill_opacity: f64,
    /// Épaisseur du contour en pixels
    pub weight: f64,
    /// Opacité du contour
    pub opacity: f64,
    /// Motif de pointillés du contour (syntaxe SVG `stroke-dasharray`)
    pub dash_array: Option<String>,
    /// Épaisseur du contour au survol
    pub highlight_weight: f64,
    /// Opacité du remplissage au survol
    pub highlight_fill_opacity: f64,
    /// Remonter la feature survolée au premier plan
    pub bring_to_front: bool,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            fill_opacity: 0.7,
            weight: 2.0,
            opacity: 1.0,
            dash_array: Some("3".to_string()),
            highlight_weight: 4.0,
            highlight_fill_opacity: 0.9,
            bring_to_front: true,
        }
    }
}

/// Style de tracé d'une feature
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStyle {
    pub fill_color: Color,
    /// Couleur du contour
    pub color: Color,
    pub weight: f64,
    pub opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
    pub fill_opacity: f64,
}

impl PathStyle {
    /// Style par défaut d'une zone : remplissage selon le catalogue,
    /// contour assombri
    pub fn for_zone(zone: &str, catalog: &ZoneCatalog, options: &StyleOptions) -> Self {
        Self::from_fill(catalog.color_for(zone), options)
    }

    pub fn from_fill(fill: Color, options: &StyleOptions) -> Self {
        Self {
            fill_color: fill,
            color: fill.darken(),
            weight: options.weight,
            opacity: options.opacity,
            dash_array: options.dash_array.clone(),
            fill_opacity: options.fill_opacity,
        }
    }

    /// Variante « survolée » : contour plus épais, remplissage plus opaque
    pub fn highlighted(&self, options: &StyleOptions) -> Self {
        Self {
            weight: options.highlight_weight,
            fill_opacity: options.highlight_fill_opacity,
            ..self.clone()
        }
    }
}
