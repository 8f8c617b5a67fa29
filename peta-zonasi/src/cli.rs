//! Définition et implémentation des commandes CLI
//!
//! - `legend`: légende dynamique d'un jeu de données
//! - `stats`: statistiques d'occupation du sol (fichier ou répertoire)
//! - `render`: session de carte headless + export GeoJSON stylé
//! - `popup`: contenu HTML du popup d'une feature

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use zonasi::popup::PopupContent;
use zonasi::surface::Surface;
use zonasi::{
    compute_statistics, derive_legend, HeadlessEngine, InitOutcome, LandUseStatistics, Locale,
    MapOptions, PlanningFeatureCollection, PlanningMap, ZoneCatalog,
};

use crate::export::export_styled_geojson;

/// Variable d'environnement fixant la langue par défaut
const LOCALE_ENV: &str = "PETA_ZONASI_LOCALE";

#[derive(Subcommand)]
pub enum Commands {
    /// Print the zoning legend of a planning dataset
    Legend {
        /// Planning dataset (GeoJSON FeatureCollection)
        #[arg(short, long)]
        input: PathBuf,

        /// Zone catalog preset name (default/rdtr) or path to a JSON catalog
        #[arg(long, default_value = "default")]
        zones: String,

        /// Display language: id or en (défaut : env PETA_ZONASI_LOCALE / id)
        #[arg(long)]
        locale: Option<Locale>,

        /// Maximum number of legend entries displayed
        #[arg(long, default_value_t = zonasi::options::DEFAULT_LEGEND_CAP)]
        cap: usize,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Compute land-use statistics for a dataset or a directory of datasets
    Stats {
        /// GeoJSON file or directory (processed in parallel)
        #[arg(short, long)]
        input: PathBuf,

        /// Display language: id or en
        #[arg(long)]
        locale: Option<Locale>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run a headless map session and export the styled features as GeoJSON
    Render {
        /// Planning dataset (GeoJSON FeatureCollection)
        #[arg(short, long)]
        input: PathBuf,

        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,

        /// Map options (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Zone catalog preset name (default/rdtr) or path to a JSON catalog
        #[arg(long, default_value = "default")]
        zones: String,

        /// Viewport width in pixels
        #[arg(long, default_value_t = 1024)]
        width: u32,

        /// Viewport height in pixels
        #[arg(long, default_value_t = 500)]
        height: u32,
    },

    /// Print the popup HTML of one feature
    Popup {
        /// Planning dataset (GeoJSON FeatureCollection)
        #[arg(short, long)]
        input: PathBuf,

        /// Feature identifier
        #[arg(short, long)]
        feature: String,

        /// Display language: id or en
        #[arg(long)]
        locale: Option<Locale>,
    },
}

/// Langue : option explicite, sinon variable d'environnement, sinon indonésien
pub fn resolve_locale(explicit: Option<Locale>) -> Locale {
    if let Some(locale) = explicit {
        return locale;
    }
    match std::env::var(LOCALE_ENV) {
        Ok(value) => value.parse().unwrap_or_else(|e| {
            warn!("{}: {}, falling back to id", LOCALE_ENV, e);
            Locale::default()
        }),
        Err(_) => Locale::default(),
    }
}

/// Charge un catalogue : fichier JSON s'il existe, sinon preset embarqué
pub fn load_catalog(source: &str) -> Result<ZoneCatalog> {
    let path = Path::new(source);
    if path.is_file() {
        debug!(path = %path.display(), "Loading zone catalog file");
        return ZoneCatalog::load(path)
            .with_context(|| format!("Failed to load zone catalog {}", path.display()));
    }
    ZoneCatalog::from_preset(source).with_context(|| format!("Invalid zone catalog: {}", source))
}

fn load_dataset(path: &Path) -> Result<PlanningFeatureCollection> {
    PlanningFeatureCollection::load(path)
        .with_context(|| format!("Failed to load planning dataset {}", path.display()))
}

/// Exécute la commande legend
pub fn cmd_legend(input: &Path, zones: &str, locale: Locale, cap: usize, json: bool) -> Result<()> {
    let catalog = load_catalog(zones)?;
    let collection = load_dataset(input)?;
    let legend = derive_legend(&collection, &catalog);

    info!(
        features = collection.len(),
        zones = legend.len(),
        "Legend derived"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&legend)?);
    } else {
        println!("{}", legend.render_text(locale, cap));
    }
    Ok(())
}

/// Exécute la commande stats
pub fn cmd_stats(input: &Path, locale: Locale, json: bool) -> Result<()> {
    let datasets = collect_datasets(input)?;
    if datasets.is_empty() {
        anyhow::bail!("No GeoJSON datasets found in {}", input.display());
    }

    info!("Found {} datasets", datasets.len());

    let results: Vec<(PathBuf, Result<LandUseStatistics>)> = datasets
        .par_iter()
        .map(|path| {
            let stats = load_dataset(path).map(|c| compute_statistics(&c));
            (path.clone(), stats)
        })
        .collect();

    let mut succeeded = Vec::with_capacity(results.len());
    for (path, result) in results {
        match result {
            Ok(stats) => succeeded.push((path, stats)),
            Err(e) => warn!("Skipping {}: {:#}", path.display(), e),
        }
    }

    if succeeded.is_empty() {
        anyhow::bail!("No dataset could be loaded from {}", input.display());
    }

    let combined = LandUseStatistics::merge(succeeded.iter().map(|(_, s)| s));

    if json {
        let per_file: serde_json::Map<String, serde_json::Value> = succeeded
            .iter()
            .map(|(path, stats)| {
                serde_json::to_value(stats).map(|value| (path.display().to_string(), value))
            })
            .collect::<Result<_, _>>()?;
        let doc = serde_json::json!({ "datasets": per_file, "combined": combined });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    for (path, stats) in &succeeded {
        println!("== {}", path.display());
        println!("{}\n", stats.render_text(locale));
    }
    if succeeded.len() > 1 {
        println!("== {} datasets", succeeded.len());
        println!("{}", combined.render_text(locale));
    }

    Ok(())
}

/// Exécute la commande render
pub fn cmd_render(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    zones: &str,
    size: (u32, u32),
) -> Result<()> {
    let options = match config {
        Some(path) => MapOptions::load(path)
            .with_context(|| format!("Failed to load map options {}", path.display()))?,
        None => MapOptions::default(),
    };
    let catalog = load_catalog(zones)?;
    let collection = load_dataset(input)?;

    let surface = Surface::new("peta-zonasi", options.height).with_size(size.0, size.1);
    let mut map = PlanningMap::new(HeadlessEngine::new(), catalog, options.clone());

    match map.initialize(&surface, options.center, options.zoom) {
        InitOutcome::Ready => {}
        other => anyhow::bail!("Map initialization failed: {:?}", other),
    }

    let report = map.render(collection);
    for skipped in &report.skipped {
        warn!("{}", skipped);
    }
    if let Some(e) = &report.engine_error {
        anyhow::bail!("Engine refused the feature layer: {}", e);
    }

    let exported = match map.collection() {
        Some(collection) => export_styled_geojson(map.rendered_features(), collection, output)?,
        None => 0,
    };

    println!(
        "Rendered {} features ({} skipped), exported {} to {}",
        report.rendered,
        report.skipped.len(),
        exported,
        output.display()
    );
    if let Some(view) = map.view_state() {
        println!("View: center {} zoom {}", view.center, view.zoom);
    }
    if let Some(legend) = map.legend() {
        println!("\n{}", legend.render_text(options.locale, options.legend_cap));
    }

    map.teardown();
    Ok(())
}

/// Exécute la commande popup
pub fn cmd_popup(input: &Path, feature_id: &str, locale: Locale) -> Result<()> {
    let collection = load_dataset(input)?;
    let feature = collection
        .feature(feature_id)
        .with_context(|| format!("Feature not found: {}", feature_id))?;

    println!("{}", PopupContent::from_feature(feature, locale).to_html(locale));
    Ok(())
}

/// Collecte les fichiers GeoJSON d'un chemin (récursif pour un répertoire)
fn collect_datasets(path: &Path) -> Result<Vec<PathBuf>> {
    let mut datasets = Vec::new();

    if path.is_file() {
        datasets.push(path.to_path_buf());
        return Ok(datasets);
    }

    for entry in std::fs::read_dir(path)
        .with_context(|| format!("Cannot read directory {}", path.display()))?
    {
        let entry = entry?;
        let entry_path = entry.path();

        if entry_path.is_dir() {
            datasets.extend(collect_datasets(&entry_path)?);
        } else if is_geojson(&entry_path) {
            datasets.push(entry_path);
        }
    }

    datasets.sort();
    Ok(datasets)
}

fn is_geojson(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "geojson" || ext == "json")
}
