//! Types d'erreurs pour le crate zonasi

use thiserror::Error;

/// Erreurs pouvant survenir lors du chargement ou du rendu des données de zonage
#[derive(Debug, Error)]
pub enum ZonasiError {
    /// Erreur d'I/O lors de la lecture d'un fichier
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON illisible ou ne respectant pas le schéma attendu
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Géométrie invalide pour une feature
    #[error("Invalid geometry for {feature_id}: {reason}")]
    InvalidGeometry { feature_id: String, reason: String },

    /// Propriétés d'une feature violant un invariant (surface négative, etc.)
    #[error("Invalid feature {feature_id}: {reason}")]
    InvalidFeature { feature_id: String, reason: String },

    /// Couleur d'affichage non reconnue
    #[error("Invalid color value: {0}")]
    InvalidColor(String),

    /// Code de zone présent deux fois dans un même catalogue
    #[error("Duplicate zone code in catalog: {0}")]
    DuplicateZone(String),

    /// Preset de catalogue inconnu
    #[error("Unknown zone catalog preset: {0}")]
    UnknownPreset(String),

    /// Longueur CSS non reconnue
    #[error("Invalid CSS length: {0}")]
    InvalidLength(String),
}

impl ZonasiError {
    /// Crée une erreur de géométrie invalide
    pub fn invalid_geometry(feature_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            feature_id: feature_id.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de feature invalide
    pub fn invalid_feature(feature_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFeature {
            feature_id: feature_id.into(),
            reason: reason.into(),
        }
    }

    /// Identifiant de la feature concernée, si l'erreur porte sur une feature
    pub fn feature_id(&self) -> Option<&str> {
        match self {
            Self::InvalidGeometry { feature_id, .. } | Self::InvalidFeature { feature_id, .. } => {
                Some(feature_id)
            }
            _ => None,
        }
    }
}
