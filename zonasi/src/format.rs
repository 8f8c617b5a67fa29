//! Formatage des valeurs d'urbanisme pour l'affichage

/// Formate une surface exprimée en hectares.
///
/// En dessous d'un hectare la valeur est affichée en m² (arrondie à l'unité),
/// sinon en hectares avec une décimale.
pub fn format_area(hectares: f64) -> String {
    if hectares < 1.0 {
        format!("{:.0} m²", round_half_up(hectares * 10_000.0, 0))
    } else {
        format!("{:.1} ha", round_half_up(hectares, 1))
    }
}

/// Hauteur en mètres
pub fn format_height(meters: f64) -> String {
    format!("{} m", meters)
}

/// Coefficient d'occupation des sols, une décimale
pub fn format_far(far: f64) -> String {
    format!("{:.1}", round_half_up(far, 1))
}

/// Emprise au sol en %
pub fn format_coverage(coverage: f64) -> String {
    format!("{}%", coverage)
}

/// Pourcentage de surface, une décimale
pub fn format_percentage(percentage: f64) -> String {
    format!("{:.1}%", round_half_up(percentage, 1))
}

/// Arrondi « demi vers le haut » à `decimals` décimales.
///
/// `format!("{:.0}", 0.5)` arrondit au pair le plus proche ; l'affichage web
/// historique arrondit 0.5 à 1.
fn round_half_up(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
