//! Rendu de la couche de features et routage des interactions
//!
//! Chaque `render` remplace entièrement la couche précédente. Les
//! interactions (survol, clic) passent par le renderer, qui garantit un seul
//! événement par transition d'état.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use geo::Rect;
use tracing::{debug, warn};

use crate::catalog::ZoneCatalog;
use crate::engine::{EngineError, LayerId, MapEngine, MapId, RenderedFeature};
use crate::event::{EventBus, MapEvent};
use crate::geometry::{combined_bounds, feature_geometry, has_extent};
use crate::popup::{InfoPanel, PopupContent};
use crate::style::{PathStyle, StyleOptions};
use crate::types::{Locale, PlanningFeature, PlanningFeatureCollection};
use crate::ZonasiError;

/// Options du renderer
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub style: StyleOptions,
    pub show_popups: bool,
    pub locale: Locale,
    /// Marge en pixels lors de l'ajustement de la vue
    pub fit_padding: [u32; 2],
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            style: StyleOptions::default(),
            show_popups: true,
            locale: Locale::default(),
            fit_padding: [20, 20],
        }
    }
}

/// Bilan d'un rendu
#[derive(Debug, Default)]
pub struct RenderReport {
    /// Nombre de features dessinées
    pub rendered: usize,
    /// Features écartées (géométrie ou propriétés invalides)
    pub skipped: Vec<ZonasiError>,
    /// Emprise sur laquelle la vue a été ajustée
    pub fitted: Option<Rect<f64>>,
    /// Rendu différé : la carte n'était pas encore prête
    pub queued: bool,
    /// Erreur moteur ayant empêché l'ajout de la couche
    pub engine_error: Option<EngineError>,
}

impl RenderReport {
    pub(crate) fn queued() -> Self {
        Self {
            queued: true,
            ..Self::default()
        }
    }
}

/// Résultat de la préparation : features dessinables et features écartées
#[derive(Debug, Default)]
pub struct PreparedFeatures {
    pub features: Vec<RenderedFeature>,
    /// Index de chaque feature préparée dans la collection source
    pub source_index: Vec<usize>,
    pub skipped: Vec<ZonasiError>,
}

/// Convertit une collection en features stylées.
///
/// Une feature invalide est écartée et signalée, sans interrompre les autres.
/// Seule la première feature d'un identifiant donné est conservée.
pub fn prepare_features(
    collection: &PlanningFeatureCollection,
    catalog: &ZoneCatalog,
    options: &RenderOptions,
) -> PreparedFeatures {
    let mut prepared = PreparedFeatures::default();
    let mut seen = HashSet::new();

    for (i, feature) in collection.features.iter().enumerate() {
        let geometry = match feature
            .properties
            .validate()
            .and_then(|_| feature_geometry(feature))
        {
            Ok(geometry) => geometry,
            Err(e) => {
                warn!(feature_id = %feature.id(), error = %e, "Skipping invalid feature");
                prepared.skipped.push(e);
                continue;
            }
        };

        if !seen.insert(feature.id()) {
            warn!(feature_id = %feature.id(), "Skipping feature with duplicate id");
            prepared
                .skipped
                .push(ZonasiError::invalid_feature(feature.id(), "duplicate feature id"));
            continue;
        }

        let popup = options.show_popups.then(|| {
            PopupContent::from_feature(feature, options.locale).to_html(options.locale)
        });

        prepared.features.push(RenderedFeature {
            id: feature.id().to_string(),
            geometry,
            style: PathStyle::for_zone(feature.zone(), catalog, &options.style),
            popup,
        });
        prepared.source_index.push(i);
    }

    prepared
}

/// Couche actuellement affichée
#[derive(Debug)]
struct ActiveLayer {
    layer: LayerId,
    /// Style par défaut de chaque feature dessinée
    default_styles: HashMap<String, PathStyle>,
    /// Identifiant → index dans la collection rendue
    by_id: HashMap<String, usize>,
}

/// Renderer de la couche de features
#[derive(Debug)]
pub struct FeatureLayerRenderer {
    catalog: ZoneCatalog,
    options: RenderOptions,
    collection: Option<Arc<PlanningFeatureCollection>>,
    active: Option<ActiveLayer>,
    rendered: Vec<RenderedFeature>,
    hovered: Option<String>,
    selected: Option<String>,
}

impl FeatureLayerRenderer {
    pub fn new(catalog: ZoneCatalog, options: RenderOptions) -> Self {
        Self {
            catalog,
            options,
            collection: None,
            active: None,
            rendered: Vec::new(),
            hovered: None,
            selected: None,
        }
    }

    pub fn catalog(&self) -> &ZoneCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Collection actuellement rendue, restreinte aux features dessinées
    pub fn collection(&self) -> Option<&Arc<PlanningFeatureCollection>> {
        self.collection.as_ref()
    }

    /// Features dessinées, avec leur style par défaut
    pub fn rendered(&self) -> &[RenderedFeature] {
        &self.rendered
    }

    pub fn layer(&self) -> Option<LayerId> {
        self.active.as_ref().map(|a| a.layer)
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Remplace la couche courante par la collection donnée
    pub fn render<E: MapEngine>(
        &mut self,
        engine: &mut E,
        map: MapId,
        collection: Arc<PlanningFeatureCollection>,
        bus: &mut EventBus,
    ) -> RenderReport {
        self.clear(engine, map, bus);

        let prepared = prepare_features(&collection, &self.catalog, &self.options);
        let mut report = RenderReport {
            skipped: prepared.skipped,
            ..RenderReport::default()
        };

        let drawn = if report.skipped.is_empty() {
            collection
        } else {
            Arc::new(PlanningFeatureCollection {
                kind: collection.kind.clone(),
                metadata: collection.metadata.clone(),
                features: prepared
                    .source_index
                    .iter()
                    .filter_map(|&i| collection.features.get(i).cloned())
                    .collect(),
            })
        };

        if self
            .selected
            .as_deref()
            .is_some_and(|id| drawn.feature(id).is_none())
        {
            self.selected = None;
        }

        if prepared.features.is_empty() {
            debug!(skipped = report.skipped.len(), "Nothing to draw, viewport unchanged");
            self.collection = Some(drawn);
            return report;
        }

        let layer = match engine.add_feature_layer(map, &prepared.features) {
            Ok(layer) => layer,
            Err(e) => {
                warn!(error = %e, "Engine refused the feature layer");
                report.engine_error = Some(e);
                return report;
            }
        };

        let bounds = combined_bounds(prepared.features.iter().map(|f| &f.geometry));
        if let Some(bounds) = bounds.filter(has_extent) {
            match engine.fit_bounds(map, bounds, self.options.fit_padding) {
                Ok(()) => report.fitted = Some(bounds),
                Err(e) => warn!(error = %e, "Failed to fit view to rendered features"),
            }
        }

        report.rendered = prepared.features.len();
        self.active = Some(ActiveLayer {
            layer,
            default_styles: prepared
                .features
                .iter()
                .map(|f| (f.id.clone(), f.style.clone()))
                .collect(),
            by_id: prepared
                .features
                .iter()
                .enumerate()
                .map(|(i, f)| (f.id.clone(), i))
                .collect(),
        });
        self.rendered = prepared.features;
        self.collection = Some(drawn);
        report
    }

    /// Retire la couche courante ; un survol en cours se termine par `None`
    pub fn clear<E: MapEngine>(&mut self, engine: &mut E, map: MapId, bus: &mut EventBus) {
        if self.hovered.take().is_some() {
            bus.emit(MapEvent::HoverChanged(None));
        }

        if let Some(active) = self.active.take() {
            if let Err(e) = engine.remove_layer(map, active.layer) {
                warn!(layer = %active.layer, error = %e, "Failed to remove feature layer");
            }
        }
        self.rendered.clear();
        self.collection = None;
    }

    /// Oublie l'état sans toucher au moteur (carte déjà détruite)
    pub(crate) fn reset(&mut self) {
        self.active = None;
        self.rendered.clear();
        self.collection = None;
        self.hovered = None;
        self.selected = None;
    }

    fn lookup(&self, feature_id: &str) -> Option<&PlanningFeature> {
        let index = *self.active.as_ref()?.by_id.get(feature_id)?;
        self.collection.as_ref()?.features.get(index)
    }

    /// Le pointeur entre sur une feature
    pub fn pointer_enter<E: MapEngine>(&mut self, engine: &mut E, feature_id: &str, bus: &mut EventBus) {
        if self.hovered.as_deref() == Some(feature_id) {
            return;
        }
        let Some(active) = &self.active else {
            debug!(feature_id, "Pointer enter ignored: no feature layer");
            return;
        };
        let Some(default_style) = active.default_styles.get(feature_id) else {
            debug!(feature_id, "Pointer enter ignored: unknown feature");
            return;
        };
        let layer = active.layer;
        let highlight = default_style.highlighted(&self.options.style);

        // Alternance stricte : on quitte d'abord la feature précédente
        if let Some(previous) = self.hovered.clone() {
            self.pointer_leave(engine, &previous, bus);
        }

        if let Err(e) = engine.set_feature_style(layer, feature_id, &highlight) {
            warn!(feature_id, error = %e, "Failed to highlight feature");
        }
        if self.options.style.bring_to_front {
            if let Err(e) = engine.bring_to_front(layer, feature_id) {
                debug!(feature_id, error = %e, "Failed to bring feature to front");
            }
        }

        self.hovered = Some(feature_id.to_string());
        if let Some(feature) = self.lookup(feature_id) {
            bus.emit(MapEvent::HoverChanged(Some(feature)));
        }
    }

    /// Le pointeur quitte une feature
    pub fn pointer_leave<E: MapEngine>(&mut self, engine: &mut E, feature_id: &str, bus: &mut EventBus) {
        if self.hovered.as_deref() != Some(feature_id) {
            debug!(feature_id, "Pointer leave ignored: feature not hovered");
            return;
        }

        if let Some(active) = &self.active {
            if let Some(style) = active.default_styles.get(feature_id) {
                if let Err(e) = engine.set_feature_style(active.layer, feature_id, style) {
                    warn!(feature_id, error = %e, "Failed to reset feature style");
                }
            }
        }

        self.hovered = None;
        bus.emit(MapEvent::HoverChanged(None));
    }

    /// Clic sur une feature : sélection sans changement de style
    pub fn click(&mut self, feature_id: &str, bus: &mut EventBus) {
        let Some(feature) = self.lookup(feature_id) else {
            debug!(feature_id, "Click ignored: unknown feature");
            return;
        };
        bus.emit(MapEvent::SelectionChanged(feature));
        self.selected = Some(feature_id.to_string());
    }

    /// Popup HTML d'une feature dessinée
    pub fn popup(&self, feature_id: &str) -> Option<&str> {
        self.rendered
            .iter()
            .find(|f| f.id == feature_id)
            .and_then(|f| f.popup.as_deref())
    }

    /// Panneau d'information de la feature survolée
    pub fn info_panel(&self) -> Option<InfoPanel> {
        self.hovered
            .as_deref()
            .and_then(|id| self.lookup(id))
            .map(InfoPanel::from_feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MapConfig;
    use crate::headless::HeadlessEngine;
    use crate::surface::{CssLength, Surface};
    use crate::types::fixtures::*;
    use crate::types::{LatLng, ZoneCategory};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Harness {
        engine: HeadlessEngine,
        map: MapId,
        renderer: FeatureLayerRenderer,
        bus: EventBus,
        events: Rc<RefCell<Vec<String>>>,
    }

    fn harness() -> Harness {
        let mut engine = HeadlessEngine::new();
        let surface = Surface::new("map", CssLength::default()).with_size(800, 600);
        let map = engine
            .create_map(
                &surface,
                &MapConfig {
                    center: LatLng::new(-6.2088, 106.8456),
                    zoom: 12.0,
                    zoom_control: true,
                    scale_control: true,
                    scroll_wheel_zoom: true,
                    icons: None,
                },
            )
            .unwrap();

        let events = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::default();
        let sink = Rc::clone(&events);
        bus.subscribe(move |e| {
            let label = match e {
                MapEvent::Ready => "ready".to_string(),
                MapEvent::HoverChanged(Some(f)) => format!("hover:{}", f.id()),
                MapEvent::HoverChanged(None) => "hover:none".to_string(),
                MapEvent::SelectionChanged(f) => format!("select:{}", f.id()),
            };
            sink.borrow_mut().push(label);
        });

        Harness {
            engine,
            map,
            renderer: FeatureLayerRenderer::new(ZoneCatalog::builtin(), RenderOptions::default()),
            bus,
            events,
        }
    }

    fn two_zones() -> Arc<PlanningFeatureCollection> {
        Arc::new(collection(vec![
            feature("a", "R1", ZoneCategory::Residential, 1.0, square(106.80, -6.22, 0.02)),
            feature("b", "K1", ZoneCategory::Commercial, 2.0, square(106.82, -6.20, 0.02)),
        ]))
    }

    #[test]
    fn test_invalid_feature_is_isolated() {
        let mut h = harness();
        let bad = json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 0]]]});
        let data = Arc::new(collection(vec![
            feature("bad", "R1", ZoneCategory::Residential, 1.0, bad),
            feature("good", "K1", ZoneCategory::Commercial, 1.0, square(106.8, -6.2, 0.01)),
        ]));

        let report = h.renderer.render(&mut h.engine, h.map, data, &mut h.bus);

        assert_eq!(report.rendered, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].feature_id(), Some("bad"));
        let drawn = h.engine.rendered_features(h.map);
        assert_eq!(drawn.len(), 1);
        assert_eq!(drawn[0].id, "good");
    }

    #[test]
    fn test_collection_holds_only_drawn_features() {
        let mut h = harness();
        let bad = json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1]]]});
        let data = Arc::new(collection(vec![
            feature("bad", "I1", ZoneCategory::Industrial, 5.0, bad),
            feature("good", "R1", ZoneCategory::Residential, 1.0, square(106.8, -6.2, 0.01)),
        ]));

        let report = h.renderer.render(&mut h.engine, h.map, data, &mut h.bus);
        assert_eq!(report.skipped.len(), 1);

        let drawn = h.renderer.collection().unwrap();
        assert_eq!(drawn.len(), 1);
        assert!(drawn.feature("bad").is_none());
        assert_eq!(drawn.features[0].zone(), "R1");

        // Les recherches par identifiant suivent la collection restreinte
        h.renderer.click("good", &mut h.bus);
        h.renderer.click("bad", &mut h.bus);
        assert_eq!(*h.events.borrow(), vec!["select:good"]);
    }

    #[test]
    fn test_refused_layer_leaves_no_collection() {
        let mut h = harness();
        h.engine.remove_map(h.map).unwrap();

        let report = h.renderer.render(&mut h.engine, h.map, two_zones(), &mut h.bus);

        assert!(report.engine_error.is_some());
        assert_eq!(report.rendered, 0);
        assert!(h.renderer.collection().is_none());
        assert!(h.renderer.rendered().is_empty());
    }

    #[test]
    fn test_duplicate_id_keeps_first_feature() {
        let mut h = harness();
        let data = Arc::new(collection(vec![
            feature("dup", "R1", ZoneCategory::Residential, 1.0, square(106.80, -6.22, 0.02)),
            feature("dup", "K1", ZoneCategory::Commercial, 2.0, square(106.82, -6.20, 0.02)),
        ]));

        let report = h.renderer.render(&mut h.engine, h.map, data, &mut h.bus);
        assert_eq!(report.rendered, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].feature_id(), Some("dup"));
        assert!(report.skipped[0].to_string().contains("duplicate feature id"));

        let layer = h.renderer.layer().unwrap();
        h.renderer.pointer_enter(&mut h.engine, "dup", &mut h.bus);
        let hl = h.engine.feature_style(layer, "dup").unwrap();
        assert_eq!(hl.fill_color.to_string(), "#90EE90");
        assert_eq!(h.renderer.info_panel().unwrap().zone, "R1");

        h.renderer.pointer_leave(&mut h.engine, "dup", &mut h.bus);
        let reset = h.engine.feature_style(layer, "dup").unwrap();
        assert_eq!(reset.fill_color.to_string(), "#90EE90");
        assert_eq!(reset.weight, 2.0);
    }

    #[test]
    fn test_render_replaces_previous_layer() {
        let mut h = harness();
        h.renderer.render(&mut h.engine, h.map, two_zones(), &mut h.bus);
        let first = h.renderer.layer().unwrap();

        let single = Arc::new(collection(vec![feature(
            "c",
            "I1",
            ZoneCategory::Industrial,
            1.0,
            square(106.9, -6.1, 0.01),
        )]));
        h.renderer.render(&mut h.engine, h.map, single, &mut h.bus);

        assert_ne!(h.renderer.layer(), Some(first));
        let drawn = h.engine.rendered_features(h.map);
        assert_eq!(drawn.len(), 1);
        assert_eq!(drawn[0].id, "c");
    }

    #[test]
    fn test_empty_collection_clears_and_keeps_view() {
        let mut h = harness();
        h.renderer.render(&mut h.engine, h.map, two_zones(), &mut h.bus);
        let view = h.engine.view(h.map).unwrap();

        let report = h.renderer.render(
            &mut h.engine,
            h.map,
            Arc::new(collection(Vec::new())),
            &mut h.bus,
        );

        assert_eq!(report.rendered, 0);
        assert!(report.fitted.is_none());
        assert!(h.engine.rendered_features(h.map).is_empty());
        assert_eq!(h.engine.view(h.map).unwrap(), view);
    }

    #[test]
    fn test_fit_to_rendered_bounds() {
        let mut h = harness();
        let report = h.renderer.render(&mut h.engine, h.map, two_zones(), &mut h.bus);

        let fitted = report.fitted.unwrap();
        assert!((fitted.min().x - 106.80).abs() < 1e-9);
        assert!((fitted.max().y - -6.18).abs() < 1e-9);
        let (center, _) = h.engine.view(h.map).unwrap();
        assert!((center.lng - 106.82).abs() < 1e-9);
    }

    #[test]
    fn test_single_point_does_not_move_view() {
        let mut h = harness();
        let before = h.engine.view(h.map).unwrap();
        let point = json!({"type": "Point", "coordinates": [110.0, -7.0]});
        let data = Arc::new(collection(vec![feature(
            "p",
            "SPU",
            ZoneCategory::Infrastructure,
            0.1,
            point,
        )]));

        let report = h.renderer.render(&mut h.engine, h.map, data, &mut h.bus);
        assert_eq!(report.rendered, 1);
        assert!(report.fitted.is_none());
        assert_eq!(h.engine.view(h.map).unwrap(), before);
    }

    #[test]
    fn test_hover_highlight_and_reset() {
        let mut h = harness();
        h.renderer.render(&mut h.engine, h.map, two_zones(), &mut h.bus);
        let layer = h.renderer.layer().unwrap();
        let default = h.engine.feature_style(layer, "a").unwrap();

        h.renderer.pointer_enter(&mut h.engine, "a", &mut h.bus);
        let hl = h.engine.feature_style(layer, "a").unwrap();
        assert_eq!(hl.weight, 4.0);
        assert_eq!(hl.fill_opacity, 0.9);
        assert_eq!(h.engine.paint_order(layer).last().map(String::as_str), Some("a"));

        h.renderer.pointer_leave(&mut h.engine, "a", &mut h.bus);
        assert_eq!(h.engine.feature_style(layer, "a").unwrap(), default);
        assert_eq!(*h.events.borrow(), vec!["hover:a", "hover:none"]);
    }

    #[test]
    fn test_hover_events_alternate() {
        let mut h = harness();
        h.renderer.render(&mut h.engine, h.map, two_zones(), &mut h.bus);

        // Le moteur peut livrer l'entrée sur "b" avant la sortie de "a"
        h.renderer.pointer_enter(&mut h.engine, "a", &mut h.bus);
        h.renderer.pointer_enter(&mut h.engine, "a", &mut h.bus);
        h.renderer.pointer_enter(&mut h.engine, "b", &mut h.bus);
        h.renderer.pointer_leave(&mut h.engine, "a", &mut h.bus);
        h.renderer.pointer_leave(&mut h.engine, "b", &mut h.bus);

        assert_eq!(
            *h.events.borrow(),
            vec!["hover:a", "hover:none", "hover:b", "hover:none"]
        );
        let layer = h.renderer.layer().unwrap();
        assert_eq!(h.engine.feature_style(layer, "a").unwrap().weight, 2.0);
    }

    #[test]
    fn test_click_emits_selection_without_restyle() {
        let mut h = harness();
        h.renderer.render(&mut h.engine, h.map, two_zones(), &mut h.bus);
        let layer = h.renderer.layer().unwrap();
        let before = h.engine.feature_style(layer, "b").unwrap();

        h.renderer.click("b", &mut h.bus);
        h.renderer.click("missing", &mut h.bus);

        assert_eq!(*h.events.borrow(), vec!["select:b"]);
        assert_eq!(h.renderer.selected(), Some("b"));
        assert_eq!(h.engine.feature_style(layer, "b").unwrap(), before);
    }

    #[test]
    fn test_rerender_ends_hover() {
        let mut h = harness();
        h.renderer.render(&mut h.engine, h.map, two_zones(), &mut h.bus);
        h.renderer.pointer_enter(&mut h.engine, "a", &mut h.bus);
        h.renderer.render(&mut h.engine, h.map, two_zones(), &mut h.bus);

        assert_eq!(*h.events.borrow(), vec!["hover:a", "hover:none"]);
        assert!(h.renderer.hovered().is_none());
    }

    #[test]
    fn test_popups_follow_option() {
        let mut h = harness();
        h.renderer.render(&mut h.engine, h.map, two_zones(), &mut h.bus);
        assert!(h.renderer.popup("a").unwrap().contains("Land use R1"));

        let mut no_popups = FeatureLayerRenderer::new(
            ZoneCatalog::builtin(),
            RenderOptions {
                show_popups: false,
                ..RenderOptions::default()
            },
        );
        no_popups.render(&mut h.engine, h.map, two_zones(), &mut h.bus);
        assert!(no_popups.popup("a").is_none());
    }

    #[test]
    fn test_unknown_zone_rendered_gray() {
        let data = collection(vec![feature(
            "x",
            "ZZ",
            ZoneCategory::Special,
            1.0,
            square(0.0, 0.0, 1.0),
        )]);
        let prepared = prepare_features(&data, &ZoneCatalog::builtin(), &RenderOptions::default());
        assert_eq!(prepared.features[0].style.fill_color.to_string(), "#CCCCCC");
    }
}
