//! Vocabulary shared by the recorder, codec and drainer.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::TallyError;

/// Geo-tagged action recorded into `geo:activity:*` buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoAction {
    Like,
    Share,
    Comment,
    Reply,
    Hit,
}

impl GeoAction {
    pub const ALL: [GeoAction; 5] = [
        GeoAction::Like,
        GeoAction::Share,
        GeoAction::Comment,
        GeoAction::Reply,
        GeoAction::Hit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GeoAction::Like => "like",
            GeoAction::Share => "share",
            GeoAction::Comment => "comment",
            GeoAction::Reply => "reply",
            GeoAction::Hit => "hit",
        }
    }
}

impl FromStr for GeoAction {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GeoAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| TallyError::decode(s, "unknown geo action"))
    }
}

impl fmt::Display for GeoAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate counter family recorded into `activity:*` buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityFamily {
    Likes,
    Shares,
    Comments,
    Replies,
}

impl ActivityFamily {
    pub const ALL: [ActivityFamily; 4] = [
        ActivityFamily::Likes,
        ActivityFamily::Shares,
        ActivityFamily::Comments,
        ActivityFamily::Replies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityFamily::Likes => "likes",
            ActivityFamily::Shares => "shares",
            ActivityFamily::Comments => "comments",
            ActivityFamily::Replies => "replies",
        }
    }

    /// Only likes can be withdrawn; every other family counts additions only.
    pub fn tracks_removed(&self) -> bool {
        matches!(self, ActivityFamily::Likes)
    }
}

impl FromStr for ActivityFamily {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityFamily::ALL
            .into_iter()
            .find(|family| family.as_str() == s)
            .ok_or_else(|| TallyError::decode(s, "unknown activity family"))
    }
}

impl fmt::Display for ActivityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field written inside an aggregate bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityAction {
    Added,
    Removed,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Added => "added",
            ActivityAction::Removed => "removed",
        }
    }
}

impl FromStr for ActivityAction {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "added" => Ok(ActivityAction::Added),
            "removed" => Ok(ActivityAction::Removed),
            other => Err(TallyError::decode(other, "unknown activity field")),
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a geo hit concerns the client as a whole or one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Scope {
    #[default]
    General,
    Entity(String),
}

impl Scope {
    pub fn from_entity(entity: Option<&str>) -> Self {
        match entity {
            Some(id) => Scope::Entity(id.to_string()),
            None => Scope::General,
        }
    }

    pub fn entity(&self) -> Option<&str> {
        match self {
            Scope::General => None,
            Scope::Entity(id) => Some(id),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::General => f.write_str("general"),
            Scope::Entity(id) => write!(f, "entity:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_action_parse() {
        for action in GeoAction::ALL {
            assert_eq!(action.as_str().parse::<GeoAction>().unwrap(), action);
        }
        assert!("likes".parse::<GeoAction>().is_err());
    }

    #[test]
    fn test_family_tracks_removed_only_for_likes() {
        assert!(ActivityFamily::Likes.tracks_removed());
        assert!(!ActivityFamily::Shares.tracks_removed());
        assert!(!ActivityFamily::Comments.tracks_removed());
        assert!(!ActivityFamily::Replies.tracks_removed());
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(Scope::General.to_string(), "general");
        assert_eq!(Scope::Entity("POST1".into()).to_string(), "entity:POST1");
    }
}
