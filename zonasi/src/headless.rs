//! Moteur cartographique en mémoire
//!
//! Conserve l'état de chaque carte (vue, couches, styles, ordre de dessin)
//! sans rien afficher. Sert aux tests et aux exports en ligne de commande.

use std::cell::RefCell;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::rc::Rc;

use geo::Rect;

use crate::engine::{
    EngineError, LayerId, MapConfig, MapEngine, MapId, RenderedFeature, TileLayerOptions,
};
use crate::style::PathStyle;
use crate::surface::Surface;
use crate::types::LatLng;

/// Taille d'une tuile en pixels
const TILE_SIZE: f64 = 256.0;

/// Zoom maximal quand aucune couche de tuiles n'en impose
const DEFAULT_MAX_ZOOM: u8 = 18;

/// Couche enregistrée par le moteur
#[derive(Debug, Clone)]
pub enum HeadlessLayer {
    Tiles(TileLayerOptions),
    Features {
        features: Vec<RenderedFeature>,
        /// Identifiants dans l'ordre de dessin (le dernier est au-dessus)
        paint_order: Vec<String>,
    },
}

#[derive(Debug)]
struct HeadlessMap {
    surface: Surface,
    config: MapConfig,
    center: LatLng,
    zoom: f64,
    size: (u32, u32),
    layers: Vec<LayerId>,
    size_invalidations: usize,
}

#[derive(Debug, Default)]
struct HeadlessState {
    next_id: u64,
    maps: HashMap<MapId, HeadlessMap>,
    layers: HashMap<LayerId, (MapId, HeadlessLayer)>,
    fail_next_create: Option<String>,
}

impl HeadlessState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn map_mut(&mut self, map: MapId) -> Result<&mut HeadlessMap, EngineError> {
        self.maps.get_mut(&map).ok_or(EngineError::UnknownMap(map))
    }

    fn features_mut(
        &mut self,
        layer: LayerId,
    ) -> Result<(&mut Vec<RenderedFeature>, &mut Vec<String>), EngineError> {
        match self.layers.get_mut(&layer) {
            Some((_, HeadlessLayer::Features { features, paint_order })) => {
                Ok((features, paint_order))
            }
            _ => Err(EngineError::UnknownLayer(layer)),
        }
    }

    fn max_zoom(&self, map: &HeadlessMap) -> u8 {
        map.layers
            .iter()
            .filter_map(|id| match self.layers.get(id) {
                Some((_, HeadlessLayer::Tiles(options))) => Some(options.max_zoom),
                _ => None,
            })
            .max()
            .unwrap_or(DEFAULT_MAX_ZOOM)
    }
}

/// Moteur headless. Les clones partagent le même état.
#[derive(Debug, Clone, Default)]
pub struct HeadlessEngine {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fait échouer la prochaine création de carte (simulation d'erreur moteur)
    pub fn fail_next_create(&self, reason: impl Into<String>) {
        self.state.borrow_mut().fail_next_create = Some(reason.into());
    }

    /// Nombre de cartes vivantes
    pub fn map_count(&self) -> usize {
        self.state.borrow().maps.len()
    }

    /// Nombre de cartes vivantes sur une surface
    pub fn maps_on(&self, surface: &Surface) -> usize {
        self.state
            .borrow()
            .maps
            .values()
            .filter(|m| m.surface.same_as(surface))
            .count()
    }

    /// Couches d'une carte, dans l'ordre d'ajout
    pub fn layers(&self, map: MapId) -> Vec<HeadlessLayer> {
        let state = self.state.borrow();
        state
            .maps
            .get(&map)
            .map(|m| {
                m.layers
                    .iter()
                    .filter_map(|id| state.layers.get(id).map(|(_, l)| l.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn tile_layer_count(&self, map: MapId) -> usize {
        self.layers(map)
            .iter()
            .filter(|l| matches!(l, HeadlessLayer::Tiles(_)))
            .count()
    }

    /// Features de toutes les couches vectorielles d'une carte
    pub fn rendered_features(&self, map: MapId) -> Vec<RenderedFeature> {
        self.layers(map)
            .into_iter()
            .filter_map(|l| match l {
                HeadlessLayer::Features { features, .. } => Some(features),
                HeadlessLayer::Tiles(_) => None,
            })
            .flatten()
            .collect()
    }

    pub fn feature_style(&self, layer: LayerId, feature_id: &str) -> Option<PathStyle> {
        match self.state.borrow().layers.get(&layer) {
            Some((_, HeadlessLayer::Features { features, .. })) => features
                .iter()
                .find(|f| f.id == feature_id)
                .map(|f| f.style.clone()),
            _ => None,
        }
    }

    pub fn paint_order(&self, layer: LayerId) -> Vec<String> {
        match self.state.borrow().layers.get(&layer) {
            Some((_, HeadlessLayer::Features { paint_order, .. })) => paint_order.clone(),
            _ => Vec::new(),
        }
    }

    /// Taille en pixels connue de la carte
    pub fn map_size(&self, map: MapId) -> Option<(u32, u32)> {
        self.state.borrow().maps.get(&map).map(|m| m.size)
    }

    pub fn size_invalidations(&self, map: MapId) -> usize {
        self.state
            .borrow()
            .maps
            .get(&map)
            .map_or(0, |m| m.size_invalidations)
    }

    pub fn map_config(&self, map: MapId) -> Option<MapConfig> {
        self.state.borrow().maps.get(&map).map(|m| m.config.clone())
    }
}

impl MapEngine for HeadlessEngine {
    fn create_map(&mut self, surface: &Surface, config: &MapConfig) -> Result<MapId, EngineError> {
        let mut state = self.state.borrow_mut();

        if let Some(reason) = state.fail_next_create.take() {
            return Err(EngineError::Backend(reason));
        }

        if !surface.is_mounted() || state.maps.values().any(|m| m.surface.same_as(surface)) {
            return Err(EngineError::SurfaceUnavailable(surface.id().to_string()));
        }

        let id = MapId(state.next_id());
        state.maps.insert(
            id,
            HeadlessMap {
                surface: surface.clone(),
                config: config.clone(),
                center: config.center,
                zoom: config.zoom,
                size: surface.size(),
                layers: Vec::new(),
                size_invalidations: 0,
            },
        );
        Ok(id)
    }

    fn remove_map(&mut self, map: MapId) -> Result<(), EngineError> {
        let mut state = self.state.borrow_mut();
        let removed = state.maps.remove(&map).ok_or(EngineError::UnknownMap(map))?;
        for layer in removed.layers {
            state.layers.remove(&layer);
        }
        Ok(())
    }

    fn add_tile_layer(
        &mut self,
        map: MapId,
        options: &TileLayerOptions,
    ) -> Result<LayerId, EngineError> {
        let mut state = self.state.borrow_mut();
        let id = LayerId(state.next_id());
        state.map_mut(map)?.layers.push(id);
        state
            .layers
            .insert(id, (map, HeadlessLayer::Tiles(options.clone())));
        Ok(id)
    }

    fn add_feature_layer(
        &mut self,
        map: MapId,
        features: &[RenderedFeature],
    ) -> Result<LayerId, EngineError> {
        let mut state = self.state.borrow_mut();
        let id = LayerId(state.next_id());
        state.map_mut(map)?.layers.push(id);
        let paint_order = features.iter().map(|f| f.id.clone()).collect();
        state.layers.insert(
            id,
            (
                map,
                HeadlessLayer::Features {
                    features: features.to_vec(),
                    paint_order,
                },
            ),
        );
        Ok(id)
    }

    fn remove_layer(&mut self, map: MapId, layer: LayerId) -> Result<(), EngineError> {
        let mut state = self.state.borrow_mut();
        match state.layers.get(&layer) {
            Some((owner, _)) if *owner == map => {}
            _ => return Err(EngineError::UnknownLayer(layer)),
        }
        state.layers.remove(&layer);
        state.map_mut(map)?.layers.retain(|l| *l != layer);
        Ok(())
    }

    fn set_feature_style(
        &mut self,
        layer: LayerId,
        feature_id: &str,
        style: &PathStyle,
    ) -> Result<(), EngineError> {
        let mut state = self.state.borrow_mut();
        let (features, _) = state.features_mut(layer)?;
        let feature = features
            .iter_mut()
            .find(|f| f.id == feature_id)
            .ok_or_else(|| EngineError::UnknownFeature {
                layer,
                feature_id: feature_id.to_string(),
            })?;
        feature.style = style.clone();
        Ok(())
    }

    fn bring_to_front(&mut self, layer: LayerId, feature_id: &str) -> Result<(), EngineError> {
        let mut state = self.state.borrow_mut();
        let (_, paint_order) = state.features_mut(layer)?;
        let pos = paint_order
            .iter()
            .position(|id| id == feature_id)
            .ok_or_else(|| EngineError::UnknownFeature {
                layer,
                feature_id: feature_id.to_string(),
            })?;
        let id = paint_order.remove(pos);
        paint_order.push(id);
        Ok(())
    }

    fn fit_bounds(
        &mut self,
        map: MapId,
        bounds: Rect<f64>,
        padding: [u32; 2],
    ) -> Result<(), EngineError> {
        let mut state = self.state.borrow_mut();
        let max_zoom = {
            let m = state.maps.get(&map).ok_or(EngineError::UnknownMap(map))?;
            state.max_zoom(m)
        };
        let m = state.map_mut(map)?;

        let center = bounds.center();
        m.center = LatLng::new(center.y, center.x);
        m.zoom = zoom_for_bounds(&bounds, m.size, padding, max_zoom);
        Ok(())
    }

    fn invalidate_size(&mut self, map: MapId) -> Result<(), EngineError> {
        let mut state = self.state.borrow_mut();
        let m = state.map_mut(map)?;
        m.size = m.surface.size();
        m.size_invalidations += 1;
        Ok(())
    }

    fn view(&self, map: MapId) -> Option<(LatLng, f64)> {
        self.state
            .borrow()
            .maps
            .get(&map)
            .map(|m| (m.center, m.zoom))
    }
}

/// Ordonnée Web Mercator normalisée d'une latitude (en radians projetés)
fn mercator_y(lat: f64) -> f64 {
    let lat = lat.clamp(-85.051_128_78, 85.051_128_78).to_radians();
    (PI / 4.0 + lat / 2.0).tan().ln()
}

/// Zoom entier le plus grand qui fait tenir l'emprise dans la vue.
///
/// Une carte de taille nulle (surface masquée) se rabat sur une tuile.
fn zoom_for_bounds(bounds: &Rect<f64>, size: (u32, u32), padding: [u32; 2], max_zoom: u8) -> f64 {
    let usable = |px: u32, pad: u32| -> f64 {
        let px = if px == 0 { TILE_SIZE as u32 } else { px };
        (px.saturating_sub(2 * pad)).max(1) as f64
    };
    let width = usable(size.0, padding[0]);
    let height = usable(size.1, padding[1]);

    let dx = bounds.width();
    let dy = mercator_y(bounds.max().y) - mercator_y(bounds.min().y);

    let zoom_x = if dx > 0.0 {
        (width * 360.0 / (TILE_SIZE * dx)).log2()
    } else {
        f64::INFINITY
    };
    let zoom_y = if dy > 0.0 {
        (height * 2.0 * PI / (TILE_SIZE * dy)).log2()
    } else {
        f64::INFINITY
    };

    zoom_x.min(zoom_y).floor().clamp(0.0, max_zoom as f64)
}
