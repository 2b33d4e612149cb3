use std::collections::BTreeSet;
use std::fmt;

use formats::StationCollection;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Which institution's stations are shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum InstitutionFilter {
    #[default]
    All,
    Code(String),
}

impl InstitutionFilter {
    /// `"all"` (any case) and blank select everything.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            InstitutionFilter::All
        } else {
            InstitutionFilter::Code(raw.to_string())
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            InstitutionFilter::All => None,
            InstitutionFilter::Code(code) => Some(code.as_str()),
        }
    }

    pub fn matches(&self, institution: Option<&str>) -> bool {
        match self {
            InstitutionFilter::All => true,
            InstitutionFilter::Code(code) => institution == Some(code.as_str()),
        }
    }
}

impl fmt::Display for InstitutionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code().unwrap_or("all"))
    }
}

impl Serialize for InstitutionFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for InstitutionFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(InstitutionFilter::parse(&raw))
    }
}

/// Narrows stations to one institution, preserving order.
///
/// `All` (or no selector) hands back the input's storage without copying.
pub fn filter_by_institution(
    stations: &StationCollection,
    selector: Option<&InstitutionFilter>,
) -> StationCollection {
    match selector {
        None | Some(InstitutionFilter::All) => stations.clone(),
        Some(filter) => {
            stations.filtered(|f| filter.matches(f.properties.institution_code()))
        }
    }
}

/// Distinct non-blank institution codes, ascending.
pub fn institution_options(stations: &StationCollection) -> Vec<String> {
    stations
        .iter()
        .filter_map(|f| f.properties.institution_code())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{InstitutionFilter, filter_by_institution, institution_options};
    use formats::StationCollection;
    use formats::feed::Feature;
    use formats::station::StationProperties;
    use foundation::geo::LatLon;
    use pretty_assertions::assert_eq;

    fn dataset(codes: &[Option<&str>]) -> StationCollection {
        codes
            .iter()
            .enumerate()
            .map(|(i, code)| {
                Feature::new(
                    LatLon::new(-30.0 - i as f64, -70.0),
                    StationProperties {
                        id: Some(i.to_string()),
                        institution: code.map(str::to_string),
                        ..Default::default()
                    },
                )
            })
            .collect::<Vec<_>>()
            .into()
    }

    fn ids(c: &StationCollection) -> Vec<String> {
        c.iter().filter_map(|f| f.properties.id.clone()).collect()
    }

    #[test]
    fn all_returns_shared_input() {
        let data = dataset(&[Some("DMC"), Some("INIA"), None]);
        let out = filter_by_institution(&data, Some(&InstitutionFilter::All));
        assert!(out.shares_storage(&data));
        assert!(filter_by_institution(&data, None).shares_storage(&data));
    }

    #[test]
    fn code_keeps_matching_in_order() {
        let data = dataset(&[Some("DMC"), Some("INIA"), Some("DMC"), None]);
        let out = filter_by_institution(&data, Some(&InstitutionFilter::parse("DMC")));
        assert_eq!(ids(&out), vec!["0", "2"]);

        let none = filter_by_institution(&data, Some(&InstitutionFilter::parse("CEAZA")));
        assert!(none.is_empty());
    }

    #[test]
    fn options_are_distinct_and_sorted() {
        let data = dataset(&[Some("INIA"), Some("DMC"), Some(" "), None, Some("INIA")]);
        assert_eq!(institution_options(&data), vec!["DMC", "INIA"]);
    }

    #[test]
    fn parse_treats_all_and_blank_alike() {
        assert_eq!(InstitutionFilter::parse("ALL"), InstitutionFilter::All);
        assert_eq!(InstitutionFilter::parse(""), InstitutionFilter::All);
        assert_eq!(
            InstitutionFilter::parse(" DMC "),
            InstitutionFilter::Code("DMC".into())
        );
        assert_eq!(InstitutionFilter::All.to_string(), "all");
    }
}
