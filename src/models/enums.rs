//! Enumeration types shared by the API services.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// Market an instrument is listed on.
///
/// The legacy digital API encodes this as a bare integer: `0` for the
/// Mexican stock exchange and `2` for the international quotation system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InstrumentType {
    /// Bolsa Mexicana de Valores
    #[default]
    Bmv,
    /// Sistema Internacional de Cotizaciones
    Sic,
}

impl InstrumentType {
    /// Wire value of the instrument type.
    pub fn value(self) -> i32 {
        match self {
            InstrumentType::Bmv => 0,
            InstrumentType::Sic => 2,
        }
    }
}

impl TryFrom<i32> for InstrumentType {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(InstrumentType::Bmv),
            2 => Ok(InstrumentType::Sic),
            other => Err(Error::InvalidInput(format!(
                "Invalid instrument type {}",
                other
            ))),
        }
    }
}

impl Serialize for InstrumentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.value())
    }
}

impl<'de> Deserialize<'de> for InstrumentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = i32::deserialize(deserializer)?;
        InstrumentType::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// HTTP verbs the API wrappers issue. No others are used upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// DELETE
    Delete,
    /// OPTIONS
    Options,
}

impl HttpMethod {
    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_type_wire_values() {
        assert_eq!(serde_json::to_value(InstrumentType::Bmv).unwrap(), 0);
        assert_eq!(serde_json::to_value(InstrumentType::Sic).unwrap(), 2);
        let sic: InstrumentType = serde_json::from_str("2").unwrap();
        assert_eq!(sic, InstrumentType::Sic);
    }

    #[test]
    fn test_instrument_type_rejects_unknown() {
        assert!(InstrumentType::try_from(1).is_err());
        assert!(serde_json::from_str::<InstrumentType>("7").is_err());
    }

    #[test]
    fn test_http_method_mapping() {
        assert_eq!(HttpMethod::Options.as_reqwest(), reqwest::Method::OPTIONS);
        assert_eq!(HttpMethod::Delete.as_reqwest(), reqwest::Method::DELETE);
    }
}
