//! Durable record shapes produced by the drainer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::codec::{DimensionTuple, UNKNOWN};
use crate::types::{ActivityAction, ActivityFamily, GeoAction};

/// Counted fields shared by [`AggregateStat`] and [`PostStat`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCounts {
    pub likes_added: i64,
    pub likes_removed: i64,
    pub shares_added: i64,
    pub comments_added: i64,
    pub replies_added: i64,
}

impl ActivityCounts {
    /// Maps one drained bucket field onto the counted columns. `removed` is
    /// only tracked for likes; for other families it maps to all zeros.
    pub fn from_field(family: ActivityFamily, action: ActivityAction, count: i64) -> Self {
        let mut counts = Self::default();

        let column = match action {
            ActivityAction::Added => match family {
                ActivityFamily::Likes => &mut counts.likes_added,
                ActivityFamily::Shares => &mut counts.shares_added,
                ActivityFamily::Comments => &mut counts.comments_added,
                ActivityFamily::Replies => &mut counts.replies_added,
            },
            ActivityAction::Removed if family.tracks_removed() => &mut counts.likes_removed,
            ActivityAction::Removed => return counts,
        };
        *column = count;

        counts
    }

    pub fn is_zero(&self) -> bool {
        ripple_model::ActivityDelta::from(*self).is_zero()
    }
}

impl From<ActivityCounts> for ripple_model::ActivityDelta {
    fn from(counts: ActivityCounts) -> Self {
        ripple_model::ActivityDelta {
            likes_added: counts.likes_added,
            likes_removed: counts.likes_removed,
            shares_added: counts.shares_added,
            comments_added: counts.comments_added,
            replies_added: counts.replies_added,
        }
    }
}

/// Geographic columns of geo records. Absent text values are stored as
/// `unknown`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoFields {
    pub ip: String,
    pub country: String,
    pub country_code: String,
    pub region: String,
    pub region_code: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<&DimensionTuple> for GeoFields {
    fn from(dims: &DimensionTuple) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_else(|| UNKNOWN.to_string());

        Self {
            ip: text(&dims.ip),
            country: text(&dims.country),
            country_code: text(&dims.country_code),
            region: text(&dims.region),
            region_code: text(&dims.region_code),
            city: text(&dims.city),
            latitude: dims.latitude,
            longitude: dims.longitude,
        }
    }
}

impl GeoFields {
    pub fn dimensions<'a>(&'a self, action: &'a str) -> ripple_model::GeoDimensions<'a> {
        ripple_model::GeoDimensions {
            action,
            ip: &self.ip,
            country: &self.country,
            country_code: &self.country_code,
            region: &self.region,
            region_code: &self.region_code,
            city: &self.city,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStat {
    pub client: String,
    #[serde(flatten)]
    pub counts: ActivityCounts,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostStat {
    pub client: String,
    pub entity: String,
    #[serde(flatten)]
    pub counts: ActivityCounts,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoStat {
    pub client: String,
    pub action: GeoAction,
    #[serde(flatten)]
    pub geo: GeoFields,
    pub count: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPostStat {
    pub client: String,
    pub entity: String,
    pub action: GeoAction,
    #[serde(flatten)]
    pub geo: GeoFields,
    pub count: i64,
    pub timestamp: DateTime<Utc>,
}

/// One durable record, in whichever of the four shapes the router chose.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape")]
pub enum StatRecord {
    Aggregate(AggregateStat),
    Post(PostStat),
    Geo(GeoStat),
    GeoPost(GeoPostStat),
}

impl StatRecord {
    pub fn client(&self) -> &str {
        match self {
            StatRecord::Aggregate(r) => &r.client,
            StatRecord::Post(r) => &r.client,
            StatRecord::Geo(r) => &r.client,
            StatRecord::GeoPost(r) => &r.client,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            StatRecord::Aggregate(r) => r.timestamp,
            StatRecord::Post(r) => r.timestamp,
            StatRecord::Geo(r) => r.timestamp,
            StatRecord::GeoPost(r) => r.timestamp,
        }
    }

    /// A record whose counted fields are all zero is never persisted.
    pub fn is_zero(&self) -> bool {
        match self {
            StatRecord::Aggregate(r) => r.counts.is_zero(),
            StatRecord::Post(r) => r.counts.is_zero(),
            StatRecord::Geo(r) => r.count == 0,
            StatRecord::GeoPost(r) => r.count == 0,
        }
    }
}
