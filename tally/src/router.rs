//! Destination routing.
//!
//! Every drained field lands in exactly one of four durable shapes, picked
//! by whether it carries an entity and whether it carries geographic
//! dimensions:
//!
//! | entity | geo | shape          |
//! |--------|-----|----------------|
//! | no     | no  | `AggregateStat` |
//! | yes    | no  | `PostStat`      |
//! | no     | yes | `GeoStat`       |
//! | yes    | yes | `GeoPostStat`   |

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::records::{
    ActivityCounts, AggregateStat, GeoFields, GeoPostStat, GeoStat, PostStat, StatRecord,
};
use crate::types::GeoAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatShape {
    AggregateStat,
    PostStat,
    GeoStat,
    GeoPostStat,
}

impl StatShape {
    pub fn select(has_entity: bool, has_geo: bool) -> Self {
        match (has_entity, has_geo) {
            (false, false) => StatShape::AggregateStat,
            (true, false) => StatShape::PostStat,
            (false, true) => StatShape::GeoStat,
            (true, true) => StatShape::GeoPostStat,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatShape::AggregateStat => "aggregate_stat",
            StatShape::PostStat => "post_stat",
            StatShape::GeoStat => "geo_stat",
            StatShape::GeoPostStat => "geo_post_stat",
        }
    }
}

impl fmt::Display for StatShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What was counted, before the router attaches identity.
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    Activity(ActivityCounts),
    Geo {
        action: GeoAction,
        geo: GeoFields,
        count: i64,
    },
}

impl Measurement {
    pub fn has_geo(&self) -> bool {
        matches!(self, Measurement::Geo { .. })
    }
}

/// Builds the durable record for one drained field.
pub fn route(
    client: &str,
    entity: Option<&str>,
    measurement: Measurement,
    timestamp: DateTime<Utc>,
) -> StatRecord {
    let client = client.to_string();
    let shape = StatShape::select(entity.is_some(), measurement.has_geo());
    let entity = entity.unwrap_or_default().to_string();

    match measurement {
        Measurement::Activity(counts) if shape == StatShape::AggregateStat => {
            StatRecord::Aggregate(AggregateStat {
                client,
                counts,
                timestamp,
            })
        }
        Measurement::Activity(counts) => StatRecord::Post(PostStat {
            client,
            entity,
            counts,
            timestamp,
        }),
        Measurement::Geo { action, geo, count } if shape == StatShape::GeoStat => {
            StatRecord::Geo(GeoStat {
                client,
                action,
                geo,
                count,
                timestamp,
            })
        }
        Measurement::Geo { action, geo, count } => StatRecord::GeoPost(GeoPostStat {
            client,
            entity,
            action,
            geo,
            count,
            timestamp,
        }),
    }
}

impl StatRecord {
    pub fn shape(&self) -> StatShape {
        match self {
            StatRecord::Aggregate(_) => StatShape::AggregateStat,
            StatRecord::Post(_) => StatShape::PostStat,
            StatRecord::Geo(_) => StatShape::GeoStat,
            StatRecord::GeoPost(_) => StatShape::GeoPostStat,
        }
    }
}
