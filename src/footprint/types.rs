use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RingType {
    Horizon,
    Partial,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FootprintMode {
    /// Radii derived from the propagated altitude.
    Orbital,
    /// Fixed illustrative radii around a given point.
    Static,
}

/// One closed polygon; the last coordinate repeats the first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FootprintRing {
    pub ring_type: RingType,
    pub color: String,
    pub opacity: f64,
    pub radius_deg: f64,
    /// `[longitude, latitude]` pairs in degrees.
    pub coordinates: Vec<[f64; 2]>,
}

/// Three nested rings, ordered horizon, partial, high.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityFootprint {
    pub mode: FootprintMode,
    /// `[longitude, latitude]` of the sub-satellite or static point.
    pub center: [f64; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_km: Option<f64>,
    pub rings: [FootprintRing; 3],
}

impl VisibilityFootprint {
    #[cfg(test)]
    pub fn ring(&self, ring_type: RingType) -> &FootprintRing {
        match ring_type {
            RingType::Horizon => &self.rings[0],
            RingType::Partial => &self.rings[1],
            RingType::High => &self.rings[2],
        }
    }
}
