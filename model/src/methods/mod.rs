mod aggregate_stats;
mod geo_stats;
mod post_stats;
mod posts;

use crate::{Error, Result};

/// Counts added to an activity row in one accumulate call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityDelta {
    pub likes_added: i64,
    pub likes_removed: i64,
    pub shares_added: i64,
    pub comments_added: i64,
    pub replies_added: i64,
}

impl ActivityDelta {
    pub fn is_zero(&self) -> bool {
        self.likes_added == 0
            && self.likes_removed == 0
            && self.shares_added == 0
            && self.comments_added == 0
            && self.replies_added == 0
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let negative = [
            self.likes_added,
            self.likes_removed,
            self.shares_added,
            self.comments_added,
            self.replies_added,
        ]
        .iter()
        .any(|value| *value < 0);

        if negative {
            return Err(Error::invalid("counts", "Counts must be non-negative"));
        }

        Ok(())
    }
}

/// Identity of a geo row apart from client, entity and timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoDimensions<'a> {
    pub action: &'a str,
    pub ip: &'a str,
    pub country: &'a str,
    pub country_code: &'a str,
    pub region: &'a str,
    pub region_code: &'a str,
    pub city: &'a str,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid(field, &format!("{field} is required")));
    }

    Ok(())
}
