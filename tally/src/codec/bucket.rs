//! Bucket key wire formats.
//!
//! ```text
//! activity:<family>:<client>[:<entity>]
//! activity:timestamp:<family>:<client>[:<entity>]:<YYYYMMDDHHmm>
//! geo:activity:<action>
//! geo:activity:timestamp:<action>:<YYYYMMDDHHmm>
//! post:views:<client>:<entity>
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::time_bucket::{bucket_time_token, parse_bucket_time_token, truncate_to_minute};
use super::validate_identifier;
use crate::error::{Result, TallyError};
use crate::types::{ActivityFamily, GeoAction};

const ACTIVITY: &str = "activity";
const GEO: &str = "geo";
const TIMESTAMP: &str = "timestamp";
const POST: &str = "post";
const VIEWS: &str = "views";

pub const LIVE_ACTIVITY_PATTERN: &str = "activity:*";
pub const TIMESTAMPED_ACTIVITY_PATTERN: &str = "activity:timestamp:*";
pub const LIVE_GEO_PATTERN: &str = "geo:activity:*";
pub const TIMESTAMPED_GEO_PATTERN: &str = "geo:activity:timestamp:*";
pub const POST_VIEWS_PATTERN: &str = "post:views:*";

/// The `activity:<family>:<client>` key handed to the recorder by callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivityKey {
    pub family: ActivityFamily,
    pub client: String,
}

impl ActivityKey {
    pub fn new(family: ActivityFamily, client: &str) -> Result<Self> {
        validate_identifier("client", client)?;

        Ok(Self {
            family,
            client: client.to_string(),
        })
    }
}

impl FromStr for ActivityKey {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(':');

        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(ACTIVITY), Some(family), Some(client), None) => {
                ActivityKey::new(family.parse()?, client)
            }
            _ => Err(TallyError::decode(s, "expected activity:<family>:<client>")),
        }
    }
}

impl fmt::Display for ActivityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ACTIVITY}:{}:{}", self.family, self.client)
    }
}

/// A parsed counter bucket key. `minute` is set for timestamped buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketKey {
    Activity {
        family: ActivityFamily,
        client: String,
        entity: Option<String>,
        minute: Option<DateTime<Utc>>,
    },
    Geo {
        action: GeoAction,
        minute: Option<DateTime<Utc>>,
    },
    PostViews {
        client: String,
        entity: String,
    },
}

impl BucketKey {
    pub fn activity(key: &ActivityKey, entity: Option<&str>, at: Option<DateTime<Utc>>) -> Self {
        BucketKey::Activity {
            family: key.family,
            client: key.client.clone(),
            entity: entity.map(str::to_string),
            minute: at.map(truncate_to_minute),
        }
    }

    pub fn geo(action: GeoAction, at: Option<DateTime<Utc>>) -> Self {
        BucketKey::Geo {
            action,
            minute: at.map(truncate_to_minute),
        }
    }

    pub fn post_views(client: &str, entity: &str) -> Self {
        BucketKey::PostViews {
            client: client.to_string(),
            entity: entity.to_string(),
        }
    }

    pub fn minute(&self) -> Option<DateTime<Utc>> {
        match self {
            BucketKey::Activity { minute, .. } | BucketKey::Geo { minute, .. } => *minute,
            BucketKey::PostViews { .. } => None,
        }
    }

    pub fn is_timestamped(&self) -> bool {
        self.minute().is_some()
    }

    /// Parses any bucket key, validating ids and the time token.
    pub fn parse(raw: &str) -> Result<Self> {
        let tokens: Vec<&str> = raw.split(':').collect();

        match tokens.as_slice() {
            [GEO, ACTIVITY, TIMESTAMP, action, token] => Ok(BucketKey::Geo {
                action: action.parse()?,
                minute: Some(parse_bucket_time_token(token)?),
            }),
            [GEO, ACTIVITY, action] => Ok(BucketKey::Geo {
                action: action.parse()?,
                minute: None,
            }),
            [ACTIVITY, TIMESTAMP, family, client, token] => {
                activity_from_parts(family, client, None, Some(*token))
            }
            [ACTIVITY, TIMESTAMP, family, client, entity, token] => {
                activity_from_parts(family, client, Some(*entity), Some(*token))
            }
            [ACTIVITY, family, client] => activity_from_parts(family, client, None, None),
            [ACTIVITY, family, client, entity] => {
                activity_from_parts(family, client, Some(*entity), None)
            }
            [POST, VIEWS, client, entity] => {
                validate_identifier("client", client)?;
                validate_identifier("entity", entity)?;
                Ok(BucketKey::post_views(client, entity))
            }
            _ => Err(TallyError::decode(raw, "unrecognized bucket key")),
        }
    }
}

fn activity_from_parts(
    family: &str,
    client: &str,
    entity: Option<&str>,
    token: Option<&str>,
) -> Result<BucketKey> {
    let family: ActivityFamily = family.parse()?;
    validate_identifier("client", client)?;
    if let Some(entity) = entity {
        validate_identifier("entity", entity)?;
    }

    Ok(BucketKey::Activity {
        family,
        client: client.to_string(),
        entity: entity.map(str::to_string),
        minute: token.map(parse_bucket_time_token).transpose()?,
    })
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Activity {
                family,
                client,
                entity,
                minute,
            } => {
                f.write_str(ACTIVITY)?;
                if minute.is_some() {
                    write!(f, ":{TIMESTAMP}")?;
                }
                write!(f, ":{family}:{client}")?;
                if let Some(entity) = entity {
                    write!(f, ":{entity}")?;
                }
                if let Some(minute) = minute {
                    write!(f, ":{}", bucket_time_token(*minute))?;
                }
                Ok(())
            }
            BucketKey::Geo { action, minute } => match minute {
                Some(minute) => write!(
                    f,
                    "{GEO}:{ACTIVITY}:{TIMESTAMP}:{action}:{}",
                    bucket_time_token(*minute)
                ),
                None => write!(f, "{GEO}:{ACTIVITY}:{action}"),
            },
            BucketKey::PostViews { client, entity } => {
                write!(f, "{POST}:{VIEWS}:{client}:{entity}")
            }
        }
    }
}
