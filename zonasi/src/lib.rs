//! # zonasi
//!
//! Carte interactive de zonage pour les plans d'aménagement indonésiens
//! (RTRW, RDTR).
//!
//! ## Features
//!
//! - Modèle de données GeoJSON typé (zones, règles de construction, métadonnées)
//! - Catalogue de classifications de zones avec couleurs et libellés bilingues
//! - Rendu d'une couche de features stylées, avec isolement des géométries invalides
//! - Cycle de vie de la carte en deux temps, derrière le trait [`MapEngine`]
//! - Légende dynamique et statistiques d'occupation du sol
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zonasi::{HeadlessEngine, MapOptions, PlanningFeatureCollection, PlanningMap, ZoneCatalog};
//! use zonasi::surface::{CssLength, Surface};
//! use std::path::Path;
//!
//! let options = MapOptions::default();
//! let surface = Surface::new("peta", CssLength::Px(500.0)).with_size(800, 500);
//! let mut map = PlanningMap::new(HeadlessEngine::new(), ZoneCatalog::builtin(), options);
//!
//! map.initialize(&surface, zonasi::options::DEFAULT_CENTER, 12);
//! let report = map.render(PlanningFeatureCollection::load(Path::new("rdtr.geojson"))?);
//! println!("{} features, {} ignorées", report.rendered, report.skipped.len());
//!
//! if let Some(legend) = map.legend() {
//!     println!("{}", legend.render_text(zonasi::Locale::Id, 8));
//! }
//! ```

pub mod catalog;
pub mod color;
pub mod engine;
pub mod error;
pub mod event;
pub mod format;
pub mod geometry;
pub mod headless;
pub mod legend;
pub mod lifecycle;
pub mod options;
pub mod popup;
pub mod render;
pub mod style;
pub mod surface;
pub mod types;

pub use catalog::ZoneCatalog;
pub use color::Color;
pub use engine::{EngineError, MapEngine};
pub use error::ZonasiError;
pub use event::MapEvent;
pub use format::{format_area, format_coverage, format_far, format_height, format_percentage};
pub use headless::HeadlessEngine;
pub use legend::{compute_statistics, derive_legend, LandUseStatistics, Legend};
pub use lifecycle::{InitOutcome, LifecycleState, PlanningMap};
pub use options::MapOptions;
pub use render::{prepare_features, RenderReport};
pub use types::{
    Locale, PlanningFeature, PlanningFeatureCollection, PlanningMetadata, ZoneCategory,
    ZoneClassification,
};
