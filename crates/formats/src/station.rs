use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::feed::Feature;
use crate::measurement::{Measurement, lenient_text};

/// Station properties keyed by the feed's native names; English aliases are
/// accepted too.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StationProperties {
    #[serde(rename = "id", deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(rename = "nombreEstacion", alias = "name", deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(
        rename = "institucion_sigla",
        alias = "institution",
        deserialize_with = "lenient_text"
    )]
    pub institution: Option<String>,
    #[serde(rename = "momento", alias = "observed_at", deserialize_with = "lenient_text")]
    pub observed_at: Option<String>,
    /// Metres above sea level.
    #[serde(rename = "altura", alias = "elevation_m")]
    pub elevation: Measurement,
    /// °C
    #[serde(rename = "temperatura", alias = "temperature")]
    pub temperature: Measurement,
    /// %
    #[serde(rename = "humedadRelativa", alias = "relative_humidity")]
    pub relative_humidity: Measurement,
    /// mm accumulated over the last 24 h.
    #[serde(rename = "aguaCaida24Horas", alias = "precipitation_24h")]
    pub precipitation_24h: Measurement,
    /// km/h
    #[serde(rename = "fuerzaDelViento_kmh", alias = "wind_speed_kmh")]
    pub wind_speed: Measurement,
    /// Degrees clockwise from north.
    #[serde(rename = "direccionDelViento", alias = "wind_direction_deg")]
    pub wind_direction: Measurement,
}

impl StationProperties {
    /// Institution code, if present and non-blank.
    pub fn institution_code(&self) -> Option<&str> {
        self.institution
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn reading(&self, variable: Variable) -> &Measurement {
        (variable.accessor())(self)
    }
}

pub type StationFeature = Feature<StationProperties>;

/// The measured quantity that drives station encoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variable {
    #[serde(rename = "temperature")]
    Temperature,
    #[serde(rename = "relative-humidity")]
    RelativeHumidity,
    #[serde(rename = "precipitation-24h")]
    Precipitation24h,
    #[serde(rename = "wind-speed")]
    WindSpeed,
}

pub type Accessor = fn(&StationProperties) -> &Measurement;

fn temperature(p: &StationProperties) -> &Measurement {
    &p.temperature
}

fn relative_humidity(p: &StationProperties) -> &Measurement {
    &p.relative_humidity
}

fn precipitation_24h(p: &StationProperties) -> &Measurement {
    &p.precipitation_24h
}

fn wind_speed(p: &StationProperties) -> &Measurement {
    &p.wind_speed
}

impl Variable {
    pub const ALL: [Variable; 4] = [
        Variable::Temperature,
        Variable::RelativeHumidity,
        Variable::Precipitation24h,
        Variable::WindSpeed,
    ];

    /// Property accessor for this variable.
    pub fn accessor(self) -> Accessor {
        match self {
            Variable::Temperature => temperature,
            Variable::RelativeHumidity => relative_humidity,
            Variable::Precipitation24h => precipitation_24h,
            Variable::WindSpeed => wind_speed,
        }
    }

    /// Stable identifier used in URLs and serialized state.
    pub fn slug(self) -> &'static str {
        match self {
            Variable::Temperature => "temperature",
            Variable::RelativeHumidity => "relative-humidity",
            Variable::Precipitation24h => "precipitation-24h",
            Variable::WindSpeed => "wind-speed",
        }
    }

    /// Property key on the station feed.
    pub fn feed_key(self) -> &'static str {
        match self {
            Variable::Temperature => "temperatura",
            Variable::RelativeHumidity => "humedadRelativa",
            Variable::Precipitation24h => "aguaCaida24Horas",
            Variable::WindSpeed => "fuerzaDelViento_kmh",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Variable::Temperature => "Temperature",
            Variable::RelativeHumidity => "Humidity",
            Variable::Precipitation24h => "Rainfall 24h",
            Variable::WindSpeed => "Wind",
        }
    }

    /// Accepts slugs and feed keys.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Variable::ALL
            .into_iter()
            .find(|v| v.slug().eq_ignore_ascii_case(name) || v.feed_key() == name)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariable(pub String);

impl fmt::Display for UnknownVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variable: {:?}", self.0)
    }
}

impl std::error::Error for UnknownVariable {}

impl FromStr for Variable {
    type Err = UnknownVariable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::from_name(s).ok_or_else(|| UnknownVariable(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{StationProperties, Variable};
    use crate::measurement::Measurement;

    #[test]
    fn parses_feed_keys() {
        let p: StationProperties = serde_json::from_value(serde_json::json!({
            "nombreEstacion": "Quinta Normal",
            "institucion_sigla": "DMC",
            "temperatura": 21.4,
            "humedadRelativa": "s/i",
            "aguaCaida24Horas": "3.2",
            "fuerzaDelViento_kmh": 11.1,
            "direccionDelViento": 250,
            "altura": 527,
            "momento": "2025-01-10 12:00:00",
            "id": 17
        }))
        .expect("props");

        assert_eq!(p.name.as_deref(), Some("Quinta Normal"));
        assert_eq!(p.institution_code(), Some("DMC"));
        assert_eq!(p.id.as_deref(), Some("17"));
        assert_eq!(p.temperature, Measurement::Number(21.4));
        assert_eq!(p.relative_humidity, Measurement::Text("s/i".into()));
        assert_eq!(p.precipitation_24h.coerce(), Some(3.2));
        assert_eq!(p.wind_direction.as_number(), Some(250.0));
    }

    #[test]
    fn accepts_english_aliases_and_missing_fields() {
        let p: StationProperties = serde_json::from_value(serde_json::json!({
            "name": "Alto",
            "institution": "  ",
            "temperature": 3
        }))
        .expect("props");
        assert_eq!(p.name.as_deref(), Some("Alto"));
        assert_eq!(p.institution_code(), None);
        assert!(p.wind_speed.is_missing());
    }

    #[test]
    fn accessor_table_is_exhaustive() {
        let p = StationProperties {
            temperature: 1.0.into(),
            relative_humidity: 2.0.into(),
            precipitation_24h: 3.0.into(),
            wind_speed: 4.0.into(),
            ..Default::default()
        };
        let values: Vec<_> = Variable::ALL
            .iter()
            .map(|v| p.reading(*v).as_number())
            .collect();
        assert_eq!(values, vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn names_round_trip() {
        for v in Variable::ALL {
            assert_eq!(v.slug().parse::<Variable>(), Ok(v));
            assert_eq!(Variable::from_name(v.feed_key()), Some(v));
        }
        assert!("pressure".parse::<Variable>().is_err());
    }
}
