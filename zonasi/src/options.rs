//! Configuration du composant carte

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::{IconUrls, TileLayerOptions};
use crate::render::RenderOptions;
use crate::style::StyleOptions;
use crate::surface::CssLength;
use crate::types::{LatLng, Locale};
use crate::ZonasiError;

/// Centre par défaut : Jakarta
pub const DEFAULT_CENTER: LatLng = LatLng::new(-6.2088, 106.8456);

/// Nombre d'entrées de légende affichées par défaut
pub const DEFAULT_LEGEND_CAP: usize = 8;

/// Options de la carte de planification (toutes ont une valeur par défaut)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapOptions {
    pub center: LatLng,
    pub zoom: u8,
    /// Hauteur du conteneur
    pub height: CssLength,
    pub show_popups: bool,
    pub locale: Locale,
    /// Nombre maximal d'entrées de légende affichées
    pub legend_cap: usize,
    /// Marge (px) lors de l'ajustement de la vue aux données
    pub fit_padding: [u32; 2],
    pub zoom_control: bool,
    pub scale_control: bool,
    pub scroll_wheel_zoom: bool,
    pub tiles: TileLayerOptions,
    pub style: StyleOptions,
    /// Répertoire des icônes de marqueurs (`marker-icon.png`, ...)
    pub icon_base_url: Option<String>,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: 12,
            height: CssLength::default(),
            show_popups: true,
            locale: Locale::default(),
            legend_cap: DEFAULT_LEGEND_CAP,
            fit_padding: [20, 20],
            zoom_control: true,
            scale_control: true,
            scroll_wheel_zoom: true,
            tiles: TileLayerOptions::default(),
            style: StyleOptions::default(),
            icon_base_url: None,
        }
    }
}

impl MapOptions {
    /// Charge les options depuis un fichier JSON
    pub fn load(path: &Path) -> Result<Self, ZonasiError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ZonasiError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn icons(&self) -> Option<IconUrls> {
        self.icon_base_url.as_deref().map(IconUrls::from_base)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            style: self.style.clone(),
            show_popups: self.show_popups,
            locale: self.locale,
            fit_padding: self.fit_padding,
        }
    }
}
