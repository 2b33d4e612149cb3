use serde::{Deserialize, Serialize};

use crate::feed::Feature;
use crate::measurement::{Measurement, lenient_text};

/// Fire detection properties as published by the FIRMS area API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FirmsProperties {
    /// Brightness temperature (K); detections are typically above 300.
    pub brightness: Measurement,
    /// `high` / `nominal` / `low` for VIIRS; MODIS ships a 0-100 number.
    pub confidence: Measurement,
    #[serde(deserialize_with = "lenient_text")]
    pub acq_date: Option<String>,
    /// `HHMM` UTC; leading zeros are frequently lost upstream.
    #[serde(deserialize_with = "lenient_text")]
    pub acq_time: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub satellite: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub daynight: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub time: Option<String>,
}

impl FirmsProperties {
    pub fn confidence_class(&self) -> Confidence {
        match &self.confidence {
            Measurement::Text(s) => Confidence::from_label(s),
            _ => Confidence::Unknown,
        }
    }

    /// Acquisition time zero-padded to `HHMM`.
    pub fn acq_time_hhmm(&self) -> Option<String> {
        let raw = self.acq_time.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        Some(format!("{raw:0>4}"))
    }
}

pub type FirmsFeature = Feature<FirmsProperties>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Nominal,
    Low,
    Unknown,
}

impl Confidence {
    /// Exact labels only; anything else is unknown.
    pub fn from_label(label: &str) -> Self {
        match label {
            "high" => Confidence::High,
            "nominal" => Confidence::Nominal,
            "low" => Confidence::Low,
            _ => Confidence::Unknown,
        }
    }
}
