//! Types de données pour le crate zonasi
//!
//! Le schéma suit le GeoJSON publié par plan.forpublic.id : une
//! `FeatureCollection` enrichie d'un bloc `metadata`, dont chaque feature
//! porte les propriétés d'urbanisme (zone, COS, hauteurs, reculs...).

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::ZonasiError;

/// Langue d'affichage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Bahasa Indonesia
    #[default]
    Id,
    /// English
    En,
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "en" => Ok(Self::En),
            other => Err(format!("Unknown locale: {other} (expected id or en)")),
        }
    }
}

/// Texte bilingue indonésien / anglais
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bilingual {
    pub id: String,
    pub en: String,
}

impl Bilingual {
    pub fn new(id: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            en: en.into(),
        }
    }

    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::Id => &self.id,
            Locale::En => &self.en,
        }
    }
}

/// Coordonnée (latitude, longitude) en degrés WGS84.
///
/// Les géométries GeoJSON restent en `[lng, lat]` ; ce type ne sert qu'au
/// centre de la vue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for LatLng {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

/// Catégorie de zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZoneCategory {
    Residential,
    Commercial,
    Industrial,
    MixedUse,
    OpenSpace,
    Infrastructure,
    Special,
}

impl ZoneCategory {
    /// Identifiant utilisé dans le GeoJSON (`mixed-use`, `open-space`...)
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Residential => "residential",
            Self::Commercial => "commercial",
            Self::Industrial => "industrial",
            Self::MixedUse => "mixed-use",
            Self::OpenSpace => "open-space",
            Self::Infrastructure => "infrastructure",
            Self::Special => "special",
        }
    }

    /// Libellé affiché dans la légende
    pub fn label(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::Residential, Locale::Id) => "Perumahan",
            (Self::Residential, Locale::En) => "Residential",
            (Self::Commercial, Locale::Id) => "Perdagangan",
            (Self::Commercial, Locale::En) => "Commercial",
            (Self::Industrial, Locale::Id) => "Industri",
            (Self::Industrial, Locale::En) => "Industrial",
            (Self::MixedUse, Locale::Id) => "Campuran",
            (Self::MixedUse, Locale::En) => "Mixed Use",
            (Self::OpenSpace, Locale::Id) => "Ruang Terbuka",
            (Self::OpenSpace, Locale::En) => "Open Space",
            (Self::Infrastructure, Locale::Id) => "Infrastruktur",
            (Self::Infrastructure, Locale::En) => "Infrastructure",
            (Self::Special, Locale::Id) => "Khusus",
            (Self::Special, Locale::En) => "Special",
        }
    }
}

impl fmt::Display for ZoneCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Densité indicative d'une zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Low,
    Medium,
    High,
}

/// Entrée de légende : une classification de zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneClassification {
    /// Code de zone (clé unique, ex: "R1", "K1")
    pub code: String,

    pub name: Bilingual,

    /// Couleur de remplissage sur la carte
    pub color: Color,

    pub category: ZoneCategory,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<Density>,

    pub description: Bilingual,
}

/// Type de document de planification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanType {
    #[serde(rename = "RTRW")]
    Rtrw,
    #[serde(rename = "RDTR")]
    Rdtr,
    #[serde(rename = "RTBL")]
    Rtbl,
    #[serde(rename = "Master Plan")]
    MasterPlan,
    #[serde(rename = "Sectoral Plan")]
    SectoralPlan,
}

/// Statut du document de planification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanStatus {
    Draft,
    Approved,
    #[serde(rename = "Under Review")]
    UnderReview,
    Expired,
}

/// Période de validité (dates ISO)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidPeriod {
    pub start: String,
    pub end: String,
}

/// Découpage administratif couvert
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdministrativeArea {
    pub province: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
}

/// Métadonnées d'un jeu de données de planification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningMetadata {
    #[serde(default)]
    pub id: String,

    /// Région administrative
    pub region: String,

    pub plan_type: PlanType,

    #[serde(default)]
    pub valid_period: ValidPeriod,

    #[serde(default)]
    pub last_updated: Option<String>,

    #[serde(default)]
    pub source: Option<String>,

    pub status: PlanStatus,

    #[serde(default)]
    pub legal_basis: Option<String>,

    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<AdministrativeArea>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Bilingual>,
}

/// Hauteurs autorisées (mètres)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HeightLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    pub max: f64,
    /// Nombre maximal de niveaux
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floors: Option<u32>,
}

/// Reculs obligatoires (mètres)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Setback {
    pub front: f64,
    pub side: f64,
    pub back: f64,
}

/// Règles de construction applicables à une zone
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingRegulations {
    /// Coefficient d'occupation des sols (KLB / FAR)
    pub far: f64,
    /// Emprise au sol (KDB), en %
    pub coverage: f64,
    pub height: HeightLimits,
    pub setback: Setback,
    /// Places de stationnement par 100 m²
    pub parking_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ownership {
    Public,
    Private,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DevelopmentStatus {
    Vacant,
    Developed,
    UnderDevelopment,
    Planned,
}

impl DevelopmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vacant => "vacant",
            Self::Developed => "developed",
            Self::UnderDevelopment => "under-development",
            Self::Planned => "planned",
        }
    }
}

impl fmt::Display for DevelopmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Propriétés d'urbanisme d'une feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningFeatureProperties {
    /// Identifiant unique de la feature
    pub id: String,

    /// Code de zone
    pub zone: String,

    /// Usage du sol (actuel ou projeté)
    pub land_use: String,

    pub zone_category: ZoneCategory,

    pub regulations: BuildingRegulations,

    /// Surface en hectares
    pub area: f64,

    pub ownership: Ownership,

    pub development_status: DevelopmentStatus,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restrictions: Vec<String>,

    pub permit_required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planning_notes: Option<Bilingual>,
}

impl PlanningFeatureProperties {
    /// Vérifie les invariants : surface ≥ 0, COS ≥ 0, hauteur max ≥ min
    pub fn validate(&self) -> Result<(), ZonasiError> {
        if !self.area.is_finite() || self.area < 0.0 {
            return Err(ZonasiError::invalid_feature(
                &self.id,
                format!("area must be a non-negative number, got {}", self.area),
            ));
        }

        if !self.regulations.far.is_finite() || self.regulations.far < 0.0 {
            return Err(ZonasiError::invalid_feature(
                &self.id,
                format!("floor-area ratio must be non-negative, got {}", self.regulations.far),
            ));
        }

        if let Some(min) = self.regulations.height.min {
            if self.regulations.height.max < min {
                return Err(ZonasiError::invalid_feature(
                    &self.id,
                    format!(
                        "height max {} is below height min {}",
                        self.regulations.height.max, min
                    ),
                ));
            }
        }

        Ok(())
    }
}

/// Une unité spatiale (parcelle, îlot ou zone)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningFeature {
    #[serde(rename = "type", default = "feature_tag")]
    pub kind: String,

    pub properties: PlanningFeatureProperties,

    /// Géométrie GeoJSON brute, convertie seulement au rendu : une géométrie
    /// malformée ne doit pas empêcher le chargement des autres features
    #[serde(default)]
    pub geometry: serde_json::Value,
}

fn feature_tag() -> String {
    "Feature".to_string()
}

impl PlanningFeature {
    pub fn id(&self) -> &str {
        &self.properties.id
    }

    pub fn zone(&self) -> &str {
        &self.properties.zone
    }
}

/// Collection de features pour une zone et un instantané donnés
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningFeatureCollection {
    #[serde(rename = "type", default = "collection_tag")]
    pub kind: String,

    pub metadata: PlanningMetadata,

    #[serde(default)]
    pub features: Vec<PlanningFeature>,
}

fn collection_tag() -> String {
    "FeatureCollection".to_string()
}

impl PlanningFeatureCollection {
    /// Collection vide (sans feature) pour des métadonnées données
    pub fn empty(metadata: PlanningMetadata) -> Self {
        Self {
            kind: collection_tag(),
            metadata,
            features: Vec::new(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ZonasiError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Charge une collection depuis un fichier GeoJSON
    pub fn load(path: &Path) -> Result<Self, ZonasiError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn feature(&self, id: &str) -> Option<&PlanningFeature> {
        self.features.iter().find(|f| f.id() == id)
    }
}

/// État éphémère de la vue, possédé par le gestionnaire de carte.
///
/// Les features survolée et sélectionnée sont référencées par identifiant.
#[derive(Debug, Clone, PartialEq)]
pub struct MapViewState {
    pub center: LatLng,
    pub zoom: f64,
    pub hovered: Option<String>,
    pub selected: Option<String>,
}
