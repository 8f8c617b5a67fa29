//! Contenu des popups et du panneau d'information d'une feature

use crate::format::{format_area, format_far, format_height};
use crate::types::{DevelopmentStatus, Locale, PlanningFeature};

/// Résumé affiché dans le popup d'une feature
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub land_use: String,
    pub zone: String,
    pub area: String,
    pub far: String,
    pub max_height: String,
    pub status: DevelopmentStatus,
    pub note: Option<String>,
}

impl PopupContent {
    pub fn from_feature(feature: &PlanningFeature, locale: Locale) -> Self {
        let props = &feature.properties;
        Self {
            land_use: props.land_use.clone(),
            zone: props.zone.clone(),
            area: format_area(props.area),
            far: format_far(props.regulations.far),
            max_height: format_height(props.regulations.height.max),
            status: props.development_status,
            note: props
                .planning_notes
                .as_ref()
                .map(|n| n.get(locale))
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }

    /// Rendu HTML au format fixe du popup
    pub fn to_html(&self, locale: Locale) -> String {
        let labels = Labels::for_locale(locale);
        let mut html = String::with_capacity(256);

        html.push_str("<div class=\"planning-popup\">");
        html.push_str(&format!("<h3>{}</h3>", escape_html(&self.land_use)));
        for (label, value) in [
            (labels.zone, self.zone.as_str()),
            (labels.area, self.area.as_str()),
            (labels.far, self.far.as_str()),
            (labels.max_height, self.max_height.as_str()),
            (labels.status, self.status.as_str()),
        ] {
            html.push_str(&format!(
                "<p><strong>{}:</strong> {}</p>",
                label,
                escape_html(value)
            ));
        }
        if let Some(note) = &self.note {
            html.push_str(&format!("<p class=\"note\">{}</p>", escape_html(note)));
        }
        html.push_str("</div>");
        html
    }
}

/// Panneau d'information affiché pendant le survol
#[derive(Debug, Clone, PartialEq)]
pub struct InfoPanel {
    pub land_use: String,
    pub zone: String,
    pub area: String,
    pub far: String,
    pub height: String,
}

impl InfoPanel {
    pub fn from_feature(feature: &PlanningFeature) -> Self {
        let props = &feature.properties;
        Self {
            land_use: props.land_use.clone(),
            zone: props.zone.clone(),
            area: format_area(props.area),
            far: format_far(props.regulations.far),
            height: format_height(props.regulations.height.max),
        }
    }

    pub fn render_text(&self, locale: Locale) -> String {
        let labels = Labels::for_locale(locale);
        format!(
            "{}\n{}: {}  {}: {}\n{}: {}  {}: {}",
            self.land_use,
            labels.zone,
            self.zone,
            labels.area,
            self.area,
            labels.far,
            self.far,
            labels.height,
            self.height,
        )
    }
}

struct Labels {
    zone: &'static str,
    area: &'static str,
    far: &'static str,
    max_height: &'static str,
    height: &'static str,
    status: &'static str,
}

impl Labels {
    fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::Id => Self {
                zone: "Zona",
                area: "Luas",
                far: "KLB",
                max_height: "Tinggi Maks",
                height: "Tinggi",
                status: "Status",
            },
            Locale::En => Self {
                zone: "Zone",
                area: "Area",
                far: "FAR",
                max_height: "Max Height",
                height: "Height",
                status: "Status",
            },
        }
    }
}

/// Échappe une chaîne pour une insertion dans du HTML
fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            c => result.push(c),
        }
    }
    result
}
