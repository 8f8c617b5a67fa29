//! Cycle de vie de la carte : création, couche de fond, destruction
//!
//! `Uninitialized → Initializing → Ready → Destroyed`
//!
//! L'initialisation se fait en deux temps ([`PlanningMap::begin_initialize`]
//! puis [`PlanningMap::complete_initialize`]) pour couvrir le chargement
//! asynchrone du moteur. Un ticket dont la génération ne correspond plus
//! (carte détruite entre-temps) est ignoré sans toucher à la surface.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::catalog::ZoneCatalog;
use crate::engine::{LayerId, MapConfig, MapEngine, MapId, RenderedFeature, TileEvent};
use crate::event::{EventBus, ListenerId, MapEvent};
use crate::legend::{compute_statistics, derive_legend, LandUseStatistics, Legend};
use crate::options::MapOptions;
use crate::popup::InfoPanel;
use crate::render::{FeatureLayerRenderer, RenderReport};
use crate::surface::{OwnerId, Surface};
use crate::types::{LatLng, MapViewState, PlanningFeatureCollection};

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// État du cycle de vie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
    Destroyed,
}

/// Résultat d'une tentative d'initialisation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// Carte créée et prête
    Ready,
    /// Déjà en cours d'initialisation ou prête : aucune action
    AlreadyInitialized,
    /// La surface est détenue par une autre carte : aucune action
    SurfaceBusy,
    /// La surface n'est pas (ou plus) montée
    SurfaceUnmounted,
    /// Ticket périmé (carte détruite ou réinitialisée entre-temps), ignoré
    Stale,
    /// La carte a été détruite, elle ne peut plus être initialisée
    Destroyed,
    /// Le moteur a refusé de créer la carte
    EngineFailed(String),
}

/// Ticket d'initialisation en cours, à présenter à `complete_initialize`
#[derive(Debug)]
#[must_use = "the map stays in Initializing until the ticket is completed"]
pub struct InitTicket {
    owner: OwnerId,
    generation: u64,
}

/// Compteurs de la couche de tuiles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileStats {
    pub loading: usize,
    pub loaded: usize,
    pub errors: usize,
}

/// Carte de planification interactive.
///
/// Possède exclusivement son instance de carte, sa couche de fond et sa
/// couche de features. La destruction est garantie au `Drop`.
pub struct PlanningMap<E: MapEngine> {
    owner: OwnerId,
    engine: E,
    options: MapOptions,
    state: LifecycleState,
    generation: u64,
    surface: Option<Surface>,
    requested_view: (LatLng, u8),
    map: Option<MapId>,
    base_layer: Option<LayerId>,
    renderer: FeatureLayerRenderer,
    pending: Option<Arc<PlanningFeatureCollection>>,
    /// Bilan du rendu différé appliqué à la fin de l'initialisation
    queued_report: Option<RenderReport>,
    bus: EventBus,
    tiles: TileStats,
}

impl<E: MapEngine> PlanningMap<E> {
    pub fn new(engine: E, catalog: ZoneCatalog, options: MapOptions) -> Self {
        let renderer = FeatureLayerRenderer::new(catalog, options.render_options());
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            engine,
            requested_view: (options.center, options.zoom),
            options,
            state: LifecycleState::Uninitialized,
            generation: 0,
            surface: None,
            map: None,
            base_layer: None,
            renderer,
            pending: None,
            queued_report: None,
            bus: EventBus::default(),
            tiles: TileStats::default(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == LifecycleState::Ready
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn map_id(&self) -> Option<MapId> {
        self.map
    }

    pub fn tile_stats(&self) -> TileStats {
        self.tiles
    }

    /// Initialise la carte de façon synchrone (moteur déjà chargé)
    pub fn initialize(&mut self, surface: &Surface, center: LatLng, zoom: u8) -> InitOutcome {
        match self.begin_initialize(surface, center, zoom) {
            Ok(ticket) => self.complete_initialize(ticket),
            Err(outcome) => outcome,
        }
    }

    /// Première phase : réserve la surface et passe en `Initializing`
    pub fn begin_initialize(
        &mut self,
        surface: &Surface,
        center: LatLng,
        zoom: u8,
    ) -> Result<InitTicket, InitOutcome> {
        match self.state {
            LifecycleState::Initializing | LifecycleState::Ready => {
                warn!(surface = surface.id(), "Map already initialized, skipping");
                return Err(InitOutcome::AlreadyInitialized);
            }
            LifecycleState::Destroyed => {
                warn!(surface = surface.id(), "Map was destroyed, cannot initialize again");
                return Err(InitOutcome::Destroyed);
            }
            LifecycleState::Uninitialized => {}
        }

        if !surface.is_mounted() {
            warn!(surface = surface.id(), "Surface is not mounted, skipping");
            return Err(InitOutcome::SurfaceUnmounted);
        }

        if !surface.claim(self.owner) {
            warn!(surface = surface.id(), "Surface already hosts a map instance, skipping");
            return Err(InitOutcome::SurfaceBusy);
        }

        self.generation += 1;
        self.state = LifecycleState::Initializing;
        self.surface = Some(surface.clone());
        self.requested_view = (center, zoom);
        debug!(surface = surface.id(), generation = self.generation, "Map initializing");

        Ok(InitTicket {
            owner: self.owner,
            generation: self.generation,
        })
    }

    /// Seconde phase : crée la carte si le ticket est toujours valide
    pub fn complete_initialize(&mut self, ticket: InitTicket) -> InitOutcome {
        if ticket.owner != self.owner
            || ticket.generation != self.generation
            || self.state != LifecycleState::Initializing
        {
            debug!(generation = ticket.generation, "Discarding stale initialization");
            return InitOutcome::Stale;
        }

        let Some(surface) = self.surface.clone() else {
            return InitOutcome::Stale;
        };

        if !surface.is_mounted() {
            debug!(surface = surface.id(), "Surface unmounted during initialization");
            self.abort_initialization(&surface);
            return InitOutcome::Stale;
        }

        let (center, zoom) = self.requested_view;
        let config = MapConfig {
            center,
            zoom: zoom as f64,
            zoom_control: self.options.zoom_control,
            scale_control: self.options.scale_control,
            scroll_wheel_zoom: self.options.scroll_wheel_zoom,
            icons: self.options.icons(),
        };

        let map = match self.engine.create_map(&surface, &config) {
            Ok(map) => map,
            Err(e) => {
                error!(surface = surface.id(), error = %e, "Error initializing map");
                self.abort_initialization(&surface);
                return InitOutcome::EngineFailed(e.to_string());
            }
        };

        self.map = Some(map);
        self.state = LifecycleState::Ready;
        self.attach_base_layer();

        info!(
            surface = surface.id(),
            center = %center,
            zoom,
            width = surface.size().0,
            height = surface.size().1,
            "Map initialized"
        );
        self.bus.emit(MapEvent::Ready);

        if let Some(collection) = self.pending.take() {
            debug!(features = collection.len(), "Applying queued render");
            let report = self.render(collection);
            for skipped in &report.skipped {
                warn!(error = %skipped, "Queued render skipped a feature");
            }
            self.queued_report = Some(report);
        }

        InitOutcome::Ready
    }

    /// Bilan du rendu différé, disponible une fois après `complete_initialize`
    pub fn take_queued_report(&mut self) -> Option<RenderReport> {
        self.queued_report.take()
    }

    fn abort_initialization(&mut self, surface: &Surface) {
        surface.release(self.owner);
        self.surface = None;
        self.state = LifecycleState::Uninitialized;
    }

    /// Ajoute la couche de tuiles de fond (une seule par carte)
    pub fn attach_base_layer(&mut self) -> bool {
        let Some(map) = self.map else {
            debug!("Base layer requested before map is ready");
            return false;
        };
        if self.base_layer.is_some() {
            return false;
        }

        match self.engine.add_tile_layer(map, &self.options.tiles) {
            Ok(layer) => {
                self.base_layer = Some(layer);
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to attach base tile layer");
                false
            }
        }
    }

    /// Événement de chargement de tuiles remonté par le moteur
    pub fn handle_tile_event(&mut self, event: TileEvent) {
        if self.state != LifecycleState::Ready {
            return;
        }
        match event {
            TileEvent::Loading => {
                self.tiles.loading += 1;
                debug!("Tiles loading");
            }
            TileEvent::Loaded => {
                self.tiles.loaded += 1;
                debug!("Tiles loaded");
            }
            TileEvent::Error { tile, reason } => {
                self.tiles.errors += 1;
                warn!(
                    tile = %tile,
                    url = %self.options.tiles.tile_url(tile),
                    reason = %reason,
                    "Tile loading error"
                );
            }
        }
    }

    /// Recalcule la taille de la vue (après qu'une surface masquée devient visible)
    pub fn resize(&mut self) {
        let Some(map) = self.map else {
            debug!("Resize ignored: map not ready");
            return;
        };
        if let Err(e) = self.engine.invalidate_size(map) {
            warn!(error = %e, "Failed to invalidate map size");
        }
    }

    /// Détruit la carte, libère la surface et détache tous les abonnés.
    ///
    /// Idempotent ; appelé aussi au `Drop`.
    pub fn teardown(&mut self) {
        match self.state {
            LifecycleState::Uninitialized | LifecycleState::Destroyed => {
                self.state = LifecycleState::Destroyed;
                self.bus.clear();
                self.pending = None;
                self.queued_report = None;
                return;
            }
            LifecycleState::Initializing | LifecycleState::Ready => {}
        }

        // Invalide tout ticket en vol
        self.generation += 1;

        if let Some(map) = self.map.take() {
            if let Some(layer) = self.renderer.layer() {
                if let Err(e) = self.engine.remove_layer(map, layer) {
                    debug!(error = %e, "Failed to remove feature layer");
                }
            }
            if let Some(layer) = self.base_layer.take() {
                if let Err(e) = self.engine.remove_layer(map, layer) {
                    debug!(error = %e, "Failed to remove base layer");
                }
            }
            if let Err(e) = self.engine.remove_map(map) {
                error!(error = %e, "Error cleaning up map");
            }
        }
        self.renderer.reset();
        self.base_layer = None;

        if let Some(surface) = self.surface.take() {
            surface.release(self.owner);
            info!(surface = surface.id(), "Map cleaned up");
        }

        self.pending = None;
        self.queued_report = None;
        self.bus.clear();
        self.state = LifecycleState::Destroyed;
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&MapEvent<'_>) + 'static) -> ListenerId {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Affiche une collection (remplace la précédente).
    ///
    /// Avant que la carte soit prête, seule la dernière collection est
    /// conservée et sera rendue à la fin de l'initialisation.
    pub fn render(&mut self, collection: impl Into<Arc<PlanningFeatureCollection>>) -> RenderReport {
        let collection = collection.into();

        match (self.state, self.map) {
            (LifecycleState::Ready, Some(map)) => {
                let report = self
                    .renderer
                    .render(&mut self.engine, map, collection, &mut self.bus);
                info!(
                    rendered = report.rendered,
                    skipped = report.skipped.len(),
                    "Feature layer rendered"
                );
                report
            }
            (LifecycleState::Uninitialized | LifecycleState::Initializing, _) => {
                debug!(features = collection.len(), "Map not ready, render queued");
                self.pending = Some(collection);
                self.queued_report = None;
                RenderReport::queued()
            }
            _ => {
                debug!("Render dropped: map destroyed");
                RenderReport::default()
            }
        }
    }

    /// Retire la couche de features sans toucher à la vue
    pub fn clear(&mut self) {
        self.pending = None;
        if let Some(map) = self.map {
            self.renderer.clear(&mut self.engine, map, &mut self.bus);
        }
    }

    pub fn pointer_enter(&mut self, feature_id: &str) {
        if !self.is_ready() {
            debug!(feature_id, "Pointer enter dropped: map not ready");
            return;
        }
        self.renderer
            .pointer_enter(&mut self.engine, feature_id, &mut self.bus);
    }

    pub fn pointer_leave(&mut self, feature_id: &str) {
        if !self.is_ready() {
            debug!(feature_id, "Pointer leave dropped: map not ready");
            return;
        }
        self.renderer
            .pointer_leave(&mut self.engine, feature_id, &mut self.bus);
    }

    pub fn click(&mut self, feature_id: &str) {
        if !self.is_ready() {
            debug!(feature_id, "Click dropped: map not ready");
            return;
        }
        self.renderer.click(feature_id, &mut self.bus);
    }

    /// État de la vue (centre, zoom, survol, sélection) quand la carte est prête
    pub fn view_state(&self) -> Option<MapViewState> {
        let map = self.map?;
        let (center, zoom) = self.engine.view(map)?;
        Some(MapViewState {
            center,
            zoom,
            hovered: self.renderer.hovered().map(str::to_string),
            selected: self.renderer.selected().map(str::to_string),
        })
    }

    pub fn rendered_features(&self) -> &[RenderedFeature] {
        self.renderer.rendered()
    }

    pub fn collection(&self) -> Option<&Arc<PlanningFeatureCollection>> {
        self.renderer.collection()
    }

    /// Légende de la collection actuellement rendue
    pub fn legend(&self) -> Option<Legend> {
        self.collection()
            .map(|c| derive_legend(c, self.renderer.catalog()))
    }

    /// Statistiques d'occupation du sol de la collection actuellement rendue
    pub fn statistics(&self) -> Option<LandUseStatistics> {
        self.collection().map(|c| compute_statistics(c))
    }

    pub fn popup(&self, feature_id: &str) -> Option<&str> {
        self.renderer.popup(feature_id)
    }

    pub fn info_panel(&self) -> Option<InfoPanel> {
        self.renderer.info_panel()
    }
}

impl<E: MapEngine> Drop for PlanningMap<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<E: MapEngine> std::fmt::Debug for PlanningMap<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanningMap")
            .field("owner", &self.owner)
            .field("state", &self.state)
            .field("map", &self.map)
            .field("base_layer", &self.base_layer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TileCoord;
    use crate::headless::HeadlessEngine;
    use crate::options::DEFAULT_CENTER;
    use crate::surface::CssLength;
    use crate::types::fixtures::*;
    use crate::types::ZoneCategory;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn planning_map(engine: &HeadlessEngine) -> PlanningMap<HeadlessEngine> {
        PlanningMap::new(engine.clone(), ZoneCatalog::builtin(), MapOptions::default())
    }

    fn surface() -> Surface {
        Surface::new("map-1", CssLength::Px(500.0)).with_size(800, 500)
    }

    fn data() -> PlanningFeatureCollection {
        collection(vec![
            feature("a", "R1", ZoneCategory::Residential, 1.0, square(106.80, -6.22, 0.02)),
            feature("b", "K1", ZoneCategory::Commercial, 3.0, square(106.82, -6.20, 0.02)),
        ])
    }

    #[test]
    fn test_initialize_twice_creates_one_map() {
        let engine = HeadlessEngine::new();
        let surface = surface();
        let mut map = planning_map(&engine);

        assert_eq!(map.initialize(&surface, DEFAULT_CENTER, 12), InitOutcome::Ready);
        assert_eq!(
            map.initialize(&surface, DEFAULT_CENTER, 12),
            InitOutcome::AlreadyInitialized
        );
        assert_eq!(engine.maps_on(&surface), 1);
        assert_eq!(engine.tile_layer_count(map.map_id().unwrap()), 1);
    }

    #[test]
    fn test_second_manager_cannot_take_surface() {
        let engine = HeadlessEngine::new();
        let surface = surface();
        let mut first = planning_map(&engine);
        let mut second = planning_map(&engine);

        let ticket = first
            .begin_initialize(&surface, DEFAULT_CENTER, 12)
            .unwrap();
        assert_eq!(
            second.initialize(&surface, DEFAULT_CENTER, 12),
            InitOutcome::SurfaceBusy
        );
        assert_eq!(second.state(), LifecycleState::Uninitialized);

        assert_eq!(first.complete_initialize(ticket), InitOutcome::Ready);
        assert_eq!(engine.maps_on(&surface), 1);

        first.teardown();
        assert_eq!(
            second.initialize(&surface, DEFAULT_CENTER, 12),
            InitOutcome::Ready
        );
    }

    #[test]
    fn test_teardown_is_idempotent_and_releases_everything() {
        let engine = HeadlessEngine::new();
        let surface = surface();
        let mut map = planning_map(&engine);
        map.initialize(&surface, DEFAULT_CENTER, 12);
        map.render(data());
        map.subscribe(|_| {});

        map.teardown();
        map.teardown();

        assert_eq!(map.state(), LifecycleState::Destroyed);
        assert_eq!(engine.map_count(), 0);
        assert!(surface.owner().is_none());
        assert!(map.legend().is_none());
        assert_eq!(
            map.initialize(&surface, DEFAULT_CENTER, 12),
            InitOutcome::Destroyed
        );
    }

    #[test]
    fn test_drop_tears_down() {
        let engine = HeadlessEngine::new();
        let surface = surface();
        {
            let mut map = planning_map(&engine);
            map.initialize(&surface, DEFAULT_CENTER, 12);
            assert_eq!(engine.map_count(), 1);
        }
        assert_eq!(engine.map_count(), 0);
        assert!(surface.owner().is_none());
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let engine = HeadlessEngine::new();
        let surface = surface();
        let mut map = planning_map(&engine);

        let ticket = map
            .begin_initialize(&surface, DEFAULT_CENTER, 12)
            .unwrap();
        map.teardown();

        assert_eq!(map.complete_initialize(ticket), InitOutcome::Stale);
        assert_eq!(engine.map_count(), 0);
        assert!(surface.owner().is_none());
    }

    #[test]
    fn test_unmounted_surface_during_init() {
        let engine = HeadlessEngine::new();
        let surface = surface();
        let mut map = planning_map(&engine);

        let ticket = map
            .begin_initialize(&surface, DEFAULT_CENTER, 12)
            .unwrap();
        surface.unmount();

        assert_eq!(map.complete_initialize(ticket), InitOutcome::Stale);
        assert_eq!(map.state(), LifecycleState::Uninitialized);
        assert_eq!(engine.map_count(), 0);
    }

    #[test]
    fn test_render_before_ready_is_queued() {
        let engine = HeadlessEngine::new();
        let surface = surface();
        let mut map = planning_map(&engine);

        let ticket = map
            .begin_initialize(&surface, DEFAULT_CENTER, 12)
            .unwrap();
        assert!(map.render(collection(Vec::new())).queued);
        assert!(map.render(data()).queued);
        map.pointer_enter("a");

        assert_eq!(map.complete_initialize(ticket), InitOutcome::Ready);
        assert_eq!(map.rendered_features().len(), 2);
        assert_eq!(engine.rendered_features(map.map_id().unwrap()).len(), 2);
        assert!(map.view_state().unwrap().hovered.is_none());
        assert_eq!(map.take_queued_report().unwrap().rendered, 2);
        assert!(map.take_queued_report().is_none());
    }

    #[test]
    fn test_queued_render_reports_skipped_features() {
        let engine = HeadlessEngine::new();
        let surface = surface();
        let mut map = planning_map(&engine);

        let ticket = map
            .begin_initialize(&surface, DEFAULT_CENTER, 12)
            .unwrap();
        let broken = serde_json::json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 0]]]});
        let mut queued = data();
        queued
            .features
            .push(feature("bad", "I1", ZoneCategory::Industrial, 2.0, broken));
        assert!(map.render(queued).queued);
        assert!(map.take_queued_report().is_none());

        assert_eq!(map.complete_initialize(ticket), InitOutcome::Ready);
        let report = map.take_queued_report().unwrap();
        assert!(!report.queued);
        assert_eq!(report.rendered, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].feature_id(), Some("bad"));
    }

    #[test]
    fn test_ready_event_then_hover_events() {
        let engine = HeadlessEngine::new();
        let surface = surface();
        let mut map = planning_map(&engine);

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        map.subscribe(move |e| {
            sink.borrow_mut().push(match e {
                MapEvent::Ready => "ready".to_string(),
                MapEvent::HoverChanged(f) => format!("hover:{:?}", f.map(|f| f.id())),
                MapEvent::SelectionChanged(f) => format!("select:{}", f.id()),
            })
        });

        map.initialize(&surface, DEFAULT_CENTER, 12);
        map.render(data());
        map.pointer_enter("b");
        assert_eq!(map.view_state().unwrap().hovered.as_deref(), Some("b"));
        assert!(map.info_panel().unwrap().land_use.contains("K1"));
        map.click("b");
        map.pointer_leave("b");

        assert_eq!(
            *events.borrow(),
            vec![
                "ready",
                "hover:Some(\"b\")",
                "select:b",
                "hover:None",
            ]
        );
        assert_eq!(map.view_state().unwrap().selected.as_deref(), Some("b"));
    }

    #[test]
    fn test_engine_failure_allows_retry() {
        let engine = HeadlessEngine::new();
        let surface = surface();
        let mut map = planning_map(&engine);

        engine.fail_next_create("WebGL context lost");
        assert!(matches!(
            map.initialize(&surface, DEFAULT_CENTER, 12),
            InitOutcome::EngineFailed(_)
        ));
        assert_eq!(map.state(), LifecycleState::Uninitialized);
        assert!(surface.owner().is_none());

        assert_eq!(
            map.initialize(&surface, DEFAULT_CENTER, 12),
            InitOutcome::Ready
        );
    }

    #[test]
    fn test_tile_errors_are_not_fatal() {
        let engine = HeadlessEngine::new();
        let surface = surface();
        let mut map = planning_map(&engine);
        map.initialize(&surface, DEFAULT_CENTER, 12);

        map.handle_tile_event(TileEvent::Loading);
        map.handle_tile_event(TileEvent::Error {
            tile: TileCoord { x: 6534, y: 4230, z: 13 },
            reason: "HTTP 503".to_string(),
        });
        map.handle_tile_event(TileEvent::Loaded);

        assert_eq!(
            map.tile_stats(),
            TileStats {
                loading: 1,
                loaded: 1,
                errors: 1
            }
        );
        assert!(map.is_ready());
        assert_eq!(map.render(data()).rendered, 2);
    }

    #[test]
    fn test_resize_after_surface_becomes_visible() {
        let engine = HeadlessEngine::new();
        let surface = Surface::new("hidden", CssLength::Percent(100.0));
        let mut map = planning_map(&engine);

        map.resize();
        map.initialize(&surface, DEFAULT_CENTER, 12);
        let id = map.map_id().unwrap();
        assert_eq!(engine.map_size(id), Some((0, 0)));

        surface.set_size(1280, 720);
        map.resize();
        assert_eq!(engine.map_size(id), Some((1280, 720)));
    }

    #[test]
    fn test_icon_urls_passed_at_creation() {
        let engine = HeadlessEngine::new();
        let surface = surface();
        let options = MapOptions {
            icon_base_url: Some("https://cdn.example.org/leaflet".to_string()),
            ..MapOptions::default()
        };
        let mut map = PlanningMap::new(engine.clone(), ZoneCatalog::builtin(), options);
        map.initialize(&surface, DEFAULT_CENTER, 12);

        let config = engine.map_config(map.map_id().unwrap()).unwrap();
        assert_eq!(
            config.icons.unwrap().icon_url,
            "https://cdn.example.org/leaflet/marker-icon.png"
        );
    }

    #[test]
    fn test_legend_follows_rendered_collection() {
        let engine = HeadlessEngine::new();
        let surface = surface();
        let mut map = planning_map(&engine);
        map.initialize(&surface, DEFAULT_CENTER, 12);
        assert!(map.legend().is_none());

        map.render(data());
        let zones: Vec<_> = map
            .legend()
            .unwrap()
            .entries()
            .iter()
            .map(|e| e.zone.clone())
            .collect();
        assert_eq!(zones, vec!["R1", "K1"]);
        assert_eq!(map.statistics().unwrap().total_area, 4.0);

        // Une feature écartée ne compte ni dans la légende ni dans les statistiques
        let broken = serde_json::json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 0]]]});
        let mut partial = data();
        partial
            .features
            .push(feature("bad", "I1", ZoneCategory::Industrial, 20.0, broken));
        assert_eq!(map.render(partial).skipped.len(), 1);
        assert_eq!(map.legend().unwrap().len(), 2);
        let stats = map.statistics().unwrap();
        assert_eq!(stats.total_area, 4.0);
        assert!(stats.get(ZoneCategory::Industrial).is_none());

        map.clear();
        assert!(map.legend().is_none());
    }
}
