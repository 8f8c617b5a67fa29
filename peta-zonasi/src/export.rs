//! Export des features rendues en GeoJSON stylé (streaming avec geozero)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;

use zonasi::engine::RenderedFeature;
use zonasi::{format_area, PlanningFeatureCollection};

/// Exporte les features rendues, avec leur style calculé, en GeoJSON
pub fn export_styled_geojson(
    rendered: &[RenderedFeature],
    collection: &PlanningFeatureCollection,
    output_path: &Path,
) -> Result<usize> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    // Header FeatureCollection avec les métadonnées du plan
    write!(writer, r#"{{"type":"FeatureCollection","metadata":"#)?;
    serde_json::to_writer(&mut writer, &collection.metadata)?;
    write!(writer, r#","features":["#)?;

    for (i, feature) in rendered.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(&mut writer, feature, collection)?;
    }

    write!(writer, "]}}")?;
    writer.flush()?;

    Ok(rendered.len())
}

/// Écrit une feature stylée
fn write_feature<W: Write>(
    writer: &mut W,
    feature: &RenderedFeature,
    collection: &PlanningFeatureCollection,
) -> Result<()> {
    write!(
        writer,
        r#"{{"type":"Feature","id":"{}","#,
        escape_json(&feature.id)
    )?;

    write!(writer, r#""geometry":"#)?;
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    feature.geometry.process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    write!(writer, r#","properties":{{"id":"{}""#, escape_json(&feature.id))?;
    if let Some(source) = collection.feature(&feature.id) {
        let props = &source.properties;
        write!(
            writer,
            r#","zone":"{}","landUse":"{}","zoneCategory":"{}","area":{},"areaLabel":"{}""#,
            escape_json(&props.zone),
            escape_json(&props.land_use),
            props.zone_category,
            props.area,
            escape_json(&format_area(props.area))
        )?;
    }

    write!(writer, r#","style":"#)?;
    serde_json::to_writer(&mut *writer, &feature.style)?;

    if let Some(popup) = &feature.popup {
        write!(writer, r#","popup":"{}""#, escape_json(popup))?;
    }
    write!(writer, "}}}}")?;

    Ok(())
}

/// Échappe une chaîne pour JSON
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}
