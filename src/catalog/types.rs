use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

use crate::propagation::ElementSet;

/// Upper altitude bound of low Earth orbit (km).
pub const LEO_MAX_ALTITUDE_KM: f64 = 2000.0;
/// Upper altitude bound of medium Earth orbit (km). Everything above counts as
/// GEO, which keeps the geostationary belt at ~35786 km well inside the class.
pub const MEO_MAX_ALTITUDE_KM: f64 = 35000.0;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    Station,
    Weather,
    Navigation,
    Communication,
    EarthObservation,
    Science,
    #[default]
    Other,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, strum_macros::Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum OrbitRegime {
    Leo,
    Meo,
    Geo,
}

impl OrbitRegime {
    pub fn classify(altitude_km: f64) -> Self {
        if altitude_km <= LEO_MAX_ALTITUDE_KM {
            OrbitRegime::Leo
        } else if altitude_km <= MEO_MAX_ALTITUDE_KM {
            OrbitRegime::Meo
        } else {
            OrbitRegime::Geo
        }
    }
}

/// Curated attributes merged over whatever the source published.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectOverride {
    pub name: Option<String>,
    pub operator: Option<String>,
    pub mission_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedObject {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub orbit_regime: OrbitRegime,
    pub inclination_deg: f64,
    pub altitude_km: f64,
    pub period_min: f64,
    pub velocity_km_s: f64,
    pub lat_deg: f64,
    pub lng_deg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mission_type: Option<String>,
    pub source: String,
    #[serde(rename = "elementPair", serialize_with = "serialize_pair")]
    pub elements: ElementSet,
}

impl TrackedObject {
    pub fn apply_override(&mut self, ov: &ObjectOverride) {
        if let Some(name) = &ov.name {
            self.name = name.clone();
        }
        if ov.operator.is_some() {
            self.operator = ov.operator.clone();
        }
        if ov.mission_type.is_some() {
            self.mission_type = ov.mission_type.clone();
        }
    }
}

fn serialize_pair<S: Serializer>(elements: &ElementSet, serializer: S) -> Result<S::Ok, S::Error> {
    elements.pair.serialize(serializer)
}

/// An immutable, deduplicated snapshot of every tracked object.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    objects: Vec<TrackedObject>,
    index: HashMap<String, usize>,
    fetched_at: Option<DateTime<Utc>>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a snapshot; on duplicate ids the first object wins.
    pub fn new(objects: Vec<TrackedObject>, fetched_at: DateTime<Utc>) -> Self {
        let mut kept = Vec::with_capacity(objects.len());
        let mut index = HashMap::with_capacity(objects.len());
        for object in objects {
            if index.contains_key(&object.id) {
                continue;
            }
            index.insert(object.id.clone(), kept.len());
            kept.push(object);
        }
        Self {
            objects: kept,
            index,
            fetched_at: Some(fetched_at),
        }
    }

    pub fn get(&self, id: &str) -> Option<&TrackedObject> {
        self.index.get(id).map(|&i| &self.objects[i])
    }

    pub fn objects(&self) -> &[TrackedObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// `None` for a catalog that was never successfully fetched.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn regime_counts(&self) -> BTreeMap<OrbitRegime, usize> {
        let mut counts = BTreeMap::new();
        for object in &self.objects {
            *counts.entry(object.orbit_regime).or_insert(0) += 1;
        }
        counts
    }
}
