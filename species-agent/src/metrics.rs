//! Intelligence metrics and triangle coordinates.
//!
//! Scores each facet of a profile in [0, 1] and places the profile inside
//! the Perceive/Relate/Apply triangle by barycentric interpolation:
//!
//! ```text
//!                relate
//!                  /\
//!                 /  \
//!                /    \
//!               /______\
//!         perceive     apply
//! ```

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::profile::{Facet, SpeciesProfile, TextField};

/// Score contributed by each detail item.
pub const DETAIL_WEIGHT: f64 = 0.2;

/// Score contributed by each researched signal.
pub const SIGNAL_WEIGHT: f64 = 0.1;

/// Per-facet scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct IntelligenceMetrics {
    pub perceive: f64,
    pub relate: f64,
    pub apply: f64,
    pub overall: f64,
}

/// Text fields that count as research signals for a facet.
pub fn signals(facet: Facet) -> [TextField; 2] {
    match facet {
        Facet::Perceive => [TextField::QuantumAspects, TextField::EnergeticIntelligence],
        Facet::Relate => [TextField::CollectiveWisdom, TextField::ConservationWisdom],
        Facet::Apply => [TextField::AdaptiveStrategies, TextField::TemporalIntelligence],
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl IntelligenceMetrics {
    /// Build from raw scores, clamping each and deriving `overall`.
    pub fn new(perceive: f64, relate: f64, apply: f64) -> Self {
        let perceive = clamp_unit(perceive);
        let relate = clamp_unit(relate);
        let apply = clamp_unit(apply);
        Self {
            perceive,
            relate,
            apply,
            overall: clamp_unit((perceive + relate + apply) / 3.0),
        }
    }

    /// Score a profile.
    ///
    /// A facet earns [`DETAIL_WEIGHT`] per detail item plus [`SIGNAL_WEIGHT`]
    /// per associated text field that came from upstream research.
    pub fn from_profile(profile: &SpeciesProfile) -> Self {
        let score = |facet: Facet| {
            let details = profile.section(facet).details.len() as f64 * DETAIL_WEIGHT;
            let researched = signals(facet)
                .iter()
                .filter(|field| profile.is_researched(field.profile_field()))
                .count() as f64;
            details + researched * SIGNAL_WEIGHT
        };

        Self::new(
            score(Facet::Perceive),
            score(Facet::Relate),
            score(Facet::Apply),
        )
    }

    pub fn get(&self, facet: Facet) -> f64 {
        match facet {
            Facet::Perceive => self.perceive,
            Facet::Relate => self.relate,
            Facet::Apply => self.apply,
        }
    }

    /// HSL colour for this profile's map marker.
    ///
    /// Hue blends 240 (perceive), 120 (relate) and 280 (apply); saturation
    /// and lightness grow with `overall`.
    pub fn color(&self) -> String {
        let hue = (self.perceive * 240.0 + self.relate * 120.0 + self.apply * 280.0) % 360.0;
        let saturation = 60.0 + self.overall * 35.0;
        let lightness = 45.0 + self.overall * 25.0;
        format!("hsl({:.0}, {:.0}%, {:.0}%)", hue, saturation, lightness)
    }
}

/// A 2-D point in canvas coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Equilateral triangle geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangleLayout {
    pub center: Point,
    pub size: f64,
}

impl Default for TriangleLayout {
    fn default() -> Self {
        Self {
            center: Point { x: 200.0, y: 200.0 },
            size: 280.0,
        }
    }
}

impl TriangleLayout {
    pub fn new(center: Point, size: f64) -> Self {
        Self { center, size }
    }

    /// Vertex of a facet. `center` is the triangle's centroid.
    pub fn vertex(&self, facet: Facet) -> Point {
        let Point { x: cx, y: cy } = self.center;
        let s = self.size;
        let root3 = 3f64.sqrt();
        match facet {
            Facet::Perceive => Point {
                x: cx - s / 2.0,
                y: cy + s * root3 / 6.0,
            },
            Facet::Relate => Point {
                x: cx,
                y: cy - s * root3 / 3.0,
            },
            Facet::Apply => Point {
                x: cx + s / 2.0,
                y: cy + s * root3 / 6.0,
            },
        }
    }

    /// Barycentric interpolation of the vertices by normalized weights.
    ///
    /// Negative and NaN weights count as zero; all-zero weights map to the
    /// centroid.
    pub fn position(&self, perceive: f64, relate: f64, apply: f64) -> Point {
        let weight = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let (p, r, a) = (weight(perceive), weight(relate), weight(apply));
        let total = p + r + a;
        if total <= 0.0 {
            return self.center;
        }

        let (vp, vr, va) = (
            self.vertex(Facet::Perceive),
            self.vertex(Facet::Relate),
            self.vertex(Facet::Apply),
        );
        let (p, r, a) = (p / total, r / total, a / total);
        Point {
            x: p * vp.x + r * vr.x + a * va.x,
            y: p * vp.y + r * vr.y + a * va.y,
        }
    }

    /// Map marker for a species.
    pub fn map_point(&self, species: impl Into<String>, metrics: IntelligenceMetrics) -> MapPoint {
        let Point { x, y } = self.position(metrics.perceive, metrics.relate, metrics.apply);
        MapPoint {
            species: species.into(),
            x,
            y,
            color: metrics.color(),
            metrics,
        }
    }
}

/// A species placed on the triangle map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct MapPoint {
    pub species: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub metrics: IntelligenceMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback;
    use crate::profile::ProfileField;

    const EPS: f64 = 1e-9;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    fn researched_profile() -> SpeciesProfile {
        let mut profile = fallback::profile("dolphins", "");
        profile.research_backed = true;
        profile.fallback_reason = None;
        profile.fallback_fields.clear();
        profile
    }

    #[test]
    fn test_fallback_profile_scores_details_only() {
        let profile = fallback::profile("dolphins", "no upstream response");
        let metrics = IntelligenceMetrics::from_profile(&profile);

        assert!((metrics.perceive - 0.8).abs() < EPS);
        assert!((metrics.relate - 0.8).abs() < EPS);
        assert!((metrics.apply - 0.8).abs() < EPS);
        assert!((metrics.overall - 0.8).abs() < EPS);
    }

    #[test]
    fn test_researched_signals_raise_scores() {
        let mut profile = researched_profile();
        profile.perceive.details.truncate(3);
        profile.fallback_fields = vec![ProfileField::CollectiveWisdom];

        let metrics = IntelligenceMetrics::from_profile(&profile);
        // 3 details + 2 signals
        assert!((metrics.perceive - 0.8).abs() < EPS);
        // 4 details + 1 signal
        assert!((metrics.relate - 0.9).abs() < EPS);
        // 4 details + 2 signals
        assert!((metrics.apply - 1.0).abs() < EPS);
    }

    #[test]
    fn test_metrics_always_in_unit_interval() {
        let cases = [
            (0.0, 0.0, 0.0),
            (5.0, -3.0, 0.5),
            (f64::NAN, 1.0, f64::INFINITY),
            (1.0, 1.0, 1.0),
        ];
        for (p, r, a) in cases {
            let m = IntelligenceMetrics::new(p, r, a);
            for v in [m.perceive, m.relate, m.apply, m.overall] {
                assert!((0.0..=1.0).contains(&v), "{:?}", m);
            }
        }
    }

    #[test]
    fn test_zero_weights_map_to_centroid() {
        let layout = TriangleLayout::default();
        assert_eq!(layout.position(0.0, 0.0, 0.0), Point { x: 200.0, y: 200.0 });

        let centroid = {
            let v: Vec<Point> = Facet::ALL.iter().map(|f| layout.vertex(*f)).collect();
            Point {
                x: (v[0].x + v[1].x + v[2].x) / 3.0,
                y: (v[0].y + v[1].y + v[2].y) / 3.0,
            }
        };
        assert!(close(centroid, layout.center));
    }

    #[test]
    fn test_unit_weight_lands_on_vertex() {
        let layout = TriangleLayout::default();
        assert!(close(layout.position(1.0, 0.0, 0.0), layout.vertex(Facet::Perceive)));
        assert!(close(layout.position(0.0, 1.0, 0.0), layout.vertex(Facet::Relate)));
        assert!(close(layout.position(0.0, 0.0, 1.0), layout.vertex(Facet::Apply)));
        // Scale does not matter, only proportions
        assert!(close(layout.position(0.0, 0.0, 0.3), layout.vertex(Facet::Apply)));
    }

    #[test]
    fn test_vertex_orientation() {
        let layout = TriangleLayout::default();
        let relate = layout.vertex(Facet::Relate);
        let perceive = layout.vertex(Facet::Perceive);
        let apply = layout.vertex(Facet::Apply);

        assert!(relate.y < perceive.y);
        assert!(perceive.x < apply.x);
        assert_eq!(perceive.y, apply.y);
    }

    #[test]
    fn test_color() {
        let metrics = IntelligenceMetrics::new(0.0, 0.0, 0.0);
        assert_eq!(metrics.color(), "hsl(0, 60%, 45%)");

        let metrics = IntelligenceMetrics::new(1.0, 1.0, 1.0);
        // (240 + 120 + 280) % 360 = 280
        assert_eq!(metrics.color(), "hsl(280, 95%, 70%)");
    }

    #[test]
    fn test_map_point() {
        let layout = TriangleLayout::default();
        let metrics = IntelligenceMetrics::new(0.5, 0.5, 0.5);
        let point = layout.map_point("whales", metrics);

        assert_eq!(point.species, "whales");
        assert!((point.x - 200.0).abs() < EPS);
        assert!((point.y - 200.0).abs() < EPS);
        assert_eq!(point.metrics, metrics);
    }
}
