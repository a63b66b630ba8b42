//! Dimension tuple encoding for geo bucket fields.
//!
//! A field is an ordered, `:`-joined tuple with a leading type discriminant:
//!
//! ```text
//! G:<client>:<ip>:<country>:<countryCode>:<region>:<regionCode>:<city>:<lat>:<lon>
//! E:<entity>:<client>:<ip>:<country>:<countryCode>:<region>:<regionCode>:<city>:<lat>:<lon>
//! ```
//!
//! Every token is percent-escaped (`%` as `%25`, `:` as `%3A`), so IPv6
//! addresses and any other value carrying the delimiter survive intact.
//! Absent values are written as the literal [`UNKNOWN`].

use std::borrow::Cow;

use crate::codec::validate_identifier;
use crate::error::{Result, TallyError};
use crate::types::Scope;

pub const UNKNOWN: &str = "unknown";

const DELIMITER: char = ':';
const GENERAL_TAG: &str = "G";
const ENTITY_TAG: &str = "E";
const GENERAL_TOKENS: usize = 10;
const ENTITY_TOKENS: usize = 11;

/// Geographic and client attributes of one observed event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DimensionTuple {
    pub client: String,
    pub scope: Scope,
    pub ip: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub region_code: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl DimensionTuple {
    /// Drops empty strings, the reserved `unknown` marker and non-finite
    /// coordinates so that every value left is one the codec round-trips.
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.ip,
            &mut self.country,
            &mut self.country_code,
            &mut self.region,
            &mut self.region_code,
            &mut self.city,
        ] {
            if field.as_deref().is_some_and(|v| v.is_empty() || v == UNKNOWN) {
                *field = None;
            }
        }

        self.latitude = self.latitude.filter(|v| v.is_finite());
        self.longitude = self.longitude.filter(|v| v.is_finite());
        self
    }

    pub fn entity(&self) -> Option<&str> {
        self.scope.entity()
    }
}

fn escape(value: &str) -> Cow<'_, str> {
    if value.contains(['%', DELIMITER]) {
        Cow::Owned(value.replace('%', "%25").replace(DELIMITER, "%3A"))
    } else {
        Cow::Borrowed(value)
    }
}

fn unescape(token: &str) -> Result<String> {
    if !token.contains('%') {
        return Ok(token.to_string());
    }

    let mut out = String::with_capacity(token.len());
    let mut rest = token;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let escape = rest.get(pos + 1..pos + 3);

        match escape {
            Some("25") => out.push('%'),
            Some("3A") | Some("3a") => out.push(DELIMITER),
            _ => return Err(TallyError::decode(token, "invalid escape sequence")),
        }

        rest = &rest[pos + 3..];
    }

    out.push_str(rest);
    Ok(out)
}

fn optional_token(value: Option<&str>) -> Cow<'_, str> {
    value.map(escape).unwrap_or(Cow::Borrowed(UNKNOWN))
}

fn optional_value(token: &str) -> Result<Option<String>> {
    if token == UNKNOWN {
        return Ok(None);
    }

    unescape(token).map(Some)
}

fn coordinate(token: &str, raw: &str) -> Result<Option<f64>> {
    if token == UNKNOWN {
        return Ok(None);
    }

    token
        .parse::<f64>()
        .map(Some)
        .map_err(|_| TallyError::decode(raw, format!("invalid coordinate {token:?}")))
}

/// Encodes a dimension tuple into a single geo bucket field.
pub fn encode_geo_key(dims: &DimensionTuple) -> String {
    let mut tokens: Vec<Cow<'_, str>> = Vec::with_capacity(ENTITY_TOKENS);

    match &dims.scope {
        Scope::General => tokens.push(Cow::Borrowed(GENERAL_TAG)),
        Scope::Entity(id) => {
            tokens.push(Cow::Borrowed(ENTITY_TAG));
            tokens.push(escape(id));
        }
    }

    tokens.push(escape(&dims.client));
    tokens.push(optional_token(dims.ip.as_deref()));
    tokens.push(optional_token(dims.country.as_deref()));
    tokens.push(optional_token(dims.country_code.as_deref()));
    tokens.push(optional_token(dims.region.as_deref()));
    tokens.push(optional_token(dims.region_code.as_deref()));
    tokens.push(optional_token(dims.city.as_deref()));
    tokens.push(
        dims.latitude
            .map(|v| Cow::Owned(v.to_string()))
            .unwrap_or(Cow::Borrowed(UNKNOWN)),
    );
    tokens.push(
        dims.longitude
            .map(|v| Cow::Owned(v.to_string()))
            .unwrap_or(Cow::Borrowed(UNKNOWN)),
    );

    tokens.join(":")
}

/// Decodes a geo bucket field. Shapes are selected by the discriminant and
/// then checked for their exact token count.
pub fn decode_geo_key(raw: &str) -> Result<DimensionTuple> {
    let tokens: Vec<&str> = raw.split(DELIMITER).collect();

    let (scope, rest) = match tokens.first().copied() {
        Some(GENERAL_TAG) if tokens.len() == GENERAL_TOKENS => (Scope::General, &tokens[1..]),
        Some(ENTITY_TAG) if tokens.len() == ENTITY_TOKENS => {
            let entity = unescape(tokens[1])?;
            validate_identifier("entity", &entity)?;
            (Scope::Entity(entity), &tokens[2..])
        }
        Some(tag @ (GENERAL_TAG | ENTITY_TAG)) => {
            let expected = if tag == GENERAL_TAG {
                GENERAL_TOKENS
            } else {
                ENTITY_TOKENS
            };
            return Err(TallyError::decode(
                raw,
                format!("expected {expected} tokens, found {}", tokens.len()),
            ));
        }
        _ => return Err(TallyError::decode(raw, "missing type discriminant")),
    };

    let client = unescape(rest[0])?;
    validate_identifier("client", &client)?;

    Ok(DimensionTuple {
        client,
        scope,
        ip: optional_value(rest[1])?,
        country: optional_value(rest[2])?,
        country_code: optional_value(rest[3])?,
        region: optional_value(rest[4])?,
        region_code: optional_value(rest[5])?,
        city: optional_value(rest[6])?,
        latitude: coordinate(rest[7], raw)?,
        longitude: coordinate(rest[8], raw)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn madrid(scope: Scope) -> DimensionTuple {
        DimensionTuple {
            client: "CID1".to_string(),
            scope,
            ip: Some("1.2.3.4".to_string()),
            country: Some("Spain".to_string()),
            country_code: Some("ES".to_string()),
            region: Some("Madrid".to_string()),
            region_code: Some("MD".to_string()),
            city: Some("Madrid".to_string()),
            latitude: Some(40.4168),
            longitude: Some(-3.7038),
        }
    }

    #[test]
    fn test_general_roundtrip() {
        let dims = madrid(Scope::General);
        let key = encode_geo_key(&dims);

        assert_eq!(
            key,
            "G:CID1:1.2.3.4:Spain:ES:Madrid:MD:Madrid:40.4168:-3.7038"
        );
        assert_eq!(decode_geo_key(&key).unwrap(), dims);
    }

    #[test]
    fn test_entity_roundtrip() {
        let dims = madrid(Scope::Entity("POST1".to_string()));
        let key = encode_geo_key(&dims);

        assert!(key.starts_with("E:POST1:CID1:"));
        assert_eq!(decode_geo_key(&key).unwrap(), dims);
    }

    #[test]
    fn test_ipv6_survives() {
        let mut dims = madrid(Scope::General);
        dims.ip = Some("2001:db8::ff00:42:8329".to_string());

        let key = encode_geo_key(&dims);
        assert_eq!(key.split(':').count(), 10);
        assert_eq!(decode_geo_key(&key).unwrap().ip, dims.ip);
    }

    #[test]
    fn test_delimiters_and_percent_in_values() {
        let mut dims = madrid(Scope::Entity("POST1".to_string()));
        dims.city = Some("Ciudad: 100% Real".to_string());
        dims.region = Some("%3A".to_string());

        let decoded = decode_geo_key(&encode_geo_key(&dims)).unwrap();
        assert_eq!(decoded, dims);
    }

    #[test]
    fn test_absent_fields_are_unknown() {
        let dims = DimensionTuple {
            client: "CID1".to_string(),
            country: Some("Spain".to_string()),
            ..Default::default()
        };

        let key = encode_geo_key(&dims);
        assert_eq!(
            key,
            "G:CID1:unknown:Spain:unknown:unknown:unknown:unknown:unknown:unknown"
        );
        assert_eq!(decode_geo_key(&key).unwrap(), dims);
    }

    #[test]
    fn test_normalized_drops_reserved_values() {
        let dims = DimensionTuple {
            client: "CID1".to_string(),
            city: Some(UNKNOWN.to_string()),
            region: Some(String::new()),
            latitude: Some(f64::NAN),
            ..Default::default()
        }
        .normalized();

        assert_eq!(dims.city, None);
        assert_eq!(dims.region, None);
        assert_eq!(dims.latitude, None);
    }

    #[test]
    fn test_rejects_wrong_shapes() {
        // Legacy token-count layout without a discriminant
        assert!(decode_geo_key("CID1:general:1.2.3.4:Spain:ES:M:MD:M:1:2").is_err());
        assert!(decode_geo_key("G:CID1:1.2.3.4").is_err());
        assert!(decode_geo_key("E:POST1:CID1:1.2.3.4:Spain:ES:M:MD:M:1").is_err());
        assert!(decode_geo_key("").is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = decode_geo_key("E:bad id:CID1:ip:c:cc:r:rc:city:1:2").unwrap_err();
        assert!(matches!(err, TallyError::Validation { .. }));

        let err = decode_geo_key("G:CID1:ip:c:cc:r:rc:city:north:2").unwrap_err();
        assert!(matches!(err, TallyError::Decode { .. }));

        let err = decode_geo_key("G:CID1:ip%zz:c:cc:r:rc:city:1:2").unwrap_err();
        assert!(matches!(err, TallyError::Decode { .. }));
    }
}
