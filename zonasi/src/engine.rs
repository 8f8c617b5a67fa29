//! Interface avec le moteur cartographique
//!
//! Le composant ne dépend d'aucun moteur concret : tout passe par le trait
//! [`MapEngine`]. [`crate::headless::HeadlessEngine`] en fournit une
//! implémentation en mémoire.

use std::fmt;

use geo::{Geometry, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::style::PathStyle;
use crate::surface::Surface;
use crate::types::LatLng;

/// Identifiant d'une instance de carte dans le moteur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapId(pub u64);

/// Identifiant d'une couche dans le moteur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map#{}", self.0)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// Erreurs remontées par le moteur
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Unknown map: {0}")]
    UnknownMap(MapId),

    #[error("Unknown layer: {0}")]
    UnknownLayer(LayerId),

    #[error("Unknown feature {feature_id} in {layer}")]
    UnknownFeature { layer: LayerId, feature_id: String },

    /// La surface héberge déjà une carte ou n'est plus montée
    #[error("Surface {0} cannot host a new map")]
    SurfaceUnavailable(String),

    #[error("Engine backend error: {0}")]
    Backend(String),
}

/// URLs des icônes de marqueurs, fournies explicitement à la création
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconUrls {
    pub icon_url: String,
    pub icon_retina_url: String,
    pub shadow_url: String,
}

impl IconUrls {
    /// Dérive les trois URLs d'un répertoire d'assets
    pub fn from_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            icon_url: format!("{base}/marker-icon.png"),
            icon_retina_url: format!("{base}/marker-icon-2x.png"),
            shadow_url: format!("{base}/marker-shadow.png"),
        }
    }
}

/// Paramètres de création d'une carte
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub center: LatLng,
    pub zoom: f64,
    pub zoom_control: bool,
    pub scale_control: bool,
    pub scroll_wheel_zoom: bool,
    pub icons: Option<IconUrls>,
}

/// Couche de tuiles de fond
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TileLayerOptions {
    /// Gabarit d'URL (`{s}`, `{z}`, `{x}`, `{y}`)
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
    pub subdomains: Vec<String>,
}

impl Default for TileLayerOptions {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors | <a href=\"https://plan.forpublic.id\">Plan ForPublic.id</a>".to_string(),
            max_zoom: 19,
            subdomains: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        }
    }
}

impl TileLayerOptions {
    /// URL d'une tuile donnée
    pub fn tile_url(&self, tile: TileCoord) -> String {
        let subdomain = if self.subdomains.is_empty() {
            ""
        } else {
            let i = (tile.x.wrapping_add(tile.y) as usize) % self.subdomains.len();
            self.subdomains[i].as_str()
        };
        self.url_template
            .replace("{s}", subdomain)
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }
}

/// Coordonnées d'une tuile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Événements de chargement de la couche de tuiles
#[derive(Debug, Clone, PartialEq)]
pub enum TileEvent {
    Loading,
    Loaded,
    Error { tile: TileCoord, reason: String },
}

/// Feature prête à être dessinée
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFeature {
    pub id: String,
    /// Géométrie en (lng, lat)
    pub geometry: Geometry<f64>,
    pub style: PathStyle,
    /// Contenu HTML du popup, si activé
    pub popup: Option<String>,
}

/// Moteur cartographique (Leaflet, MapLibre, rendu headless...)
pub trait MapEngine {
    /// Crée une carte sur la surface
    fn create_map(&mut self, surface: &Surface, config: &MapConfig) -> Result<MapId, EngineError>;

    /// Détruit la carte et toutes ses couches
    fn remove_map(&mut self, map: MapId) -> Result<(), EngineError>;

    fn add_tile_layer(
        &mut self,
        map: MapId,
        options: &TileLayerOptions,
    ) -> Result<LayerId, EngineError>;

    fn add_feature_layer(
        &mut self,
        map: MapId,
        features: &[RenderedFeature],
    ) -> Result<LayerId, EngineError>;

    fn remove_layer(&mut self, map: MapId, layer: LayerId) -> Result<(), EngineError>;

    fn set_feature_style(
        &mut self,
        layer: LayerId,
        feature_id: &str,
        style: &PathStyle,
    ) -> Result<(), EngineError>;

    /// Place la feature au sommet de l'ordre de dessin
    fn bring_to_front(&mut self, layer: LayerId, feature_id: &str) -> Result<(), EngineError>;

    /// Ajuste la vue à une emprise (x = lng, y = lat), avec une marge en pixels
    fn fit_bounds(
        &mut self,
        map: MapId,
        bounds: Rect<f64>,
        padding: [u32; 2],
    ) -> Result<(), EngineError>;

    /// Recalcule la taille en pixels de la carte depuis sa surface
    fn invalidate_size(&mut self, map: MapId) -> Result<(), EngineError>;

    /// Centre et zoom courants
    fn view(&self, map: MapId) -> Option<(LatLng, f64)>;
}
