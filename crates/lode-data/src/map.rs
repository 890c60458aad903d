//! Map aggregation: turn the joined sites view into a center, a zoom hint,
//! and one colored marker per plottable site.
//!
//! Clustering and tile rendering are the front end's concern; the contract
//! here ends at the marker list.

use std::collections::HashMap;

use serde::Serialize;

use lode_core::record::JoinedSite;

/// Fixed qualitative palette, assigned per distinct mineral name in
/// filtered row order. Reproducible for a given filter and data snapshot;
/// not required to be stable across different filters.
pub const MINERAL_PALETTE: [&str; 10] = [
  "#636efa", "#ef553b", "#00cc96", "#ab63fa", "#ffa15a",
  "#19d3f3", "#ff6692", "#b6e880", "#ff97ff", "#fecb52",
];

/// Continental-scale default for the African dataset.
pub const DEFAULT_ZOOM: u8 = 3;

/// The filter value meaning "no mineral filter".
pub const ALL_MINERALS: &str = "All";

// ─── Model ───────────────────────────────────────────────────────────────────

/// One plottable site.
#[derive(Debug, Clone, Serialize)]
pub struct Marker {
  pub latitude:  f64,
  pub longitude: f64,
  /// Hex color keyed by the site's mineral.
  pub color:     String,
  /// Site name, mineral, country, and grouped production tonnage.
  pub label:     String,
}

/// A legend entry: mineral name and its assigned color.
#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
  pub mineral: String,
  pub color:   String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapModel {
  pub center_latitude:  f64,
  pub center_longitude: f64,
  pub zoom:             u8,
  pub legend:           Vec<LegendEntry>,
  pub markers:          Vec<Marker>,
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

/// Build the map model for `sites`, optionally filtered to one mineral
/// (exact, case-sensitive match unless [`ALL_MINERALS`]).
///
/// Returns `None` when `sites` is empty. Sites whose coordinates did not
/// parse are excluded from both the center mean and the marker list; if
/// nothing plottable remains, the center falls back to (0, 0).
pub fn build(sites: &[JoinedSite], mineral_filter: &str) -> Option<MapModel> {
  if sites.is_empty() {
    return None;
  }

  let filtered: Vec<&JoinedSite> = if mineral_filter == ALL_MINERALS {
    sites.iter().collect()
  } else {
    sites
      .iter()
      .filter(|s| s.mineral_name == mineral_filter)
      .collect()
  };

  // Color assignment walks the filtered rows, not just the plottable ones,
  // so an unplottable site still claims its mineral's palette slot.
  let mut legend: Vec<LegendEntry> = Vec::new();
  let mut color_of: HashMap<&str, &'static str> = HashMap::new();
  for site in &filtered {
    let name = site.mineral_name.as_str();
    if !color_of.contains_key(name) {
      let color = MINERAL_PALETTE[color_of.len() % MINERAL_PALETTE.len()];
      color_of.insert(name, color);
      legend.push(LegendEntry { mineral: name.to_string(), color: color.to_string() });
    }
  }

  let plottable: Vec<(&JoinedSite, f64, f64)> = filtered
    .iter()
    .filter_map(|s| Some((*s, s.latitude?, s.longitude?)))
    .collect();

  let (center_latitude, center_longitude) = if plottable.is_empty() {
    (0.0, 0.0)
  } else {
    let n = plottable.len() as f64;
    (
      plottable.iter().map(|(_, lat, _)| lat).sum::<f64>() / n,
      plottable.iter().map(|(_, _, lon)| lon).sum::<f64>() / n,
    )
  };

  let markers = plottable
    .into_iter()
    .map(|(site, latitude, longitude)| Marker {
      latitude,
      longitude,
      color: color_of[site.mineral_name.as_str()].to_string(),
      label: format!(
        "{}: {}, {}, {} t",
        site.site_name,
        site.mineral_name,
        site.country_name,
        group_thousands(site.production_tonnes.unwrap_or(0.0)),
      ),
    })
    .collect();

  Some(MapModel {
    center_latitude,
    center_longitude,
    zoom: DEFAULT_ZOOM,
    legend,
    markers,
  })
}

/// Format a tonnage as a grouped integer, e.g. `1234567.8` -> `"1,234,567"`.
fn group_thousands(value: f64) -> String {
  let value = value as i64;
  let digits = value.unsigned_abs().to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(ch);
  }
  if value < 0 { format!("-{out}") } else { out }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn site(
    id: i64,
    name: &str,
    mineral: &str,
    lat: Option<f64>,
    lon: Option<f64>,
  ) -> JoinedSite {
    JoinedSite {
      site_id:           id,
      site_name:         name.to_string(),
      country_id:        1,
      mineral_id:        1,
      latitude:          lat,
      longitude:         lon,
      production_tonnes: Some(1234567.0),
      country_name:      "Zed".to_string(),
      mining_revenue:    Some(2.0),
      mineral_name:      mineral.to_string(),
    }
  }

  #[test]
  fn empty_input_yields_no_model() {
    assert!(build(&[], ALL_MINERALS).is_none());
  }

  #[test]
  fn one_valid_row_yields_one_marker() {
    let sites = [site(1, "Kolwezi", "Cobalt", Some(-10.7), Some(25.5))];
    let model = build(&sites, ALL_MINERALS).unwrap();

    assert_eq!(model.markers.len(), 1);
    assert_eq!(model.zoom, DEFAULT_ZOOM);
    assert!((model.center_latitude - -10.7).abs() < 1e-9);
    assert!((model.center_longitude - 25.5).abs() < 1e-9);

    let marker = &model.markers[0];
    assert_eq!(marker.color, MINERAL_PALETTE[0]);
    assert_eq!(marker.label, "Kolwezi: Cobalt, Zed, 1,234,567 t");
  }

  #[test]
  fn colors_are_deterministic_across_repeated_calls() {
    let sites = [
      site(1, "A", "Cobalt", Some(1.0), Some(1.0)),
      site(2, "B", "Lithium", Some(2.0), Some(2.0)),
      site(3, "C", "Cobalt", Some(3.0), Some(3.0)),
    ];
    let first = build(&sites, ALL_MINERALS).unwrap();
    let second = build(&sites, ALL_MINERALS).unwrap();

    for (a, b) in first.markers.iter().zip(&second.markers) {
      assert_eq!(a.color, b.color);
    }
    // Cobalt was encountered first, so it owns the first palette slot.
    assert_eq!(first.markers[0].color, MINERAL_PALETTE[0]);
    assert_eq!(first.markers[1].color, MINERAL_PALETTE[1]);
    assert_eq!(first.markers[2].color, MINERAL_PALETTE[0]);
  }

  #[test]
  fn filter_is_exact_and_case_sensitive() {
    let sites = [
      site(1, "A", "Cobalt", Some(1.0), Some(1.0)),
      site(2, "B", "Lithium", Some(2.0), Some(2.0)),
    ];
    let model = build(&sites, "Cobalt").unwrap();
    assert_eq!(model.markers.len(), 1);

    let none_match = build(&sites, "cobalt").unwrap();
    assert!(none_match.markers.is_empty());
  }

  #[test]
  fn unparseable_coordinates_are_excluded_not_zeroed() {
    let sites = [
      site(1, "A", "Cobalt", Some(10.0), Some(20.0)),
      site(2, "B", "Cobalt", None, Some(30.0)),
    ];
    let model = build(&sites, ALL_MINERALS).unwrap();

    // The broken row contributes neither a marker nor a (0, 0) pull on
    // the center.
    assert_eq!(model.markers.len(), 1);
    assert!((model.center_latitude - 10.0).abs() < 1e-9);
    assert!((model.center_longitude - 20.0).abs() < 1e-9);
  }

  #[test]
  fn entirely_unplottable_set_centers_on_origin() {
    let sites = [site(1, "A", "Cobalt", None, None)];
    let model = build(&sites, ALL_MINERALS).unwrap();
    assert!(model.markers.is_empty());
    assert_eq!(
      (model.center_latitude, model.center_longitude),
      (0.0, 0.0)
    );
  }

  #[test]
  fn palette_wraps_after_ten_minerals() {
    let sites: Vec<JoinedSite> = (0..11)
      .map(|i| site(i, "S", &format!("M{i}"), Some(i as f64), Some(0.0)))
      .collect();
    let model = build(&sites, ALL_MINERALS).unwrap();
    assert_eq!(model.markers[10].color, MINERAL_PALETTE[0]);
  }

  #[test]
  fn grouped_integers() {
    assert_eq!(group_thousands(0.0), "0");
    assert_eq!(group_thousands(999.0), "999");
    assert_eq!(group_thousands(1000.0), "1,000");
    assert_eq!(group_thousands(1234567.8), "1,234,567");
  }
}
