//! Per-feature visual descriptors.
//!
//! Everything here is a pure function of one feature (or one group of
//! features) and the current variable. Pixel sizes are screen pixels; footprint
//! radii are ground metres.

use foundation::color::Color;
use formats::firms::{Confidence, FirmsProperties};
use formats::measurement::Measurement;
use formats::station::{StationProperties, Variable};
use serde::Serialize;

use crate::symbology::{self, escape_html};

pub const STATION_OUTER_PX: f32 = 44.0;
pub const STATION_INNER_PX: f32 = 30.0;
pub const CLUSTER_PX: f32 = 42.0;

pub const SPIKE_MIN_PX: f64 = 8.0;
pub const SPIKE_MAX_PX: f64 = 32.0;
/// km/h per pixel of spike length.
pub const SPIKE_KMH_PER_PX: f64 = 4.5;
/// Spikes start at the edge of the inner disk.
pub const SPIKE_OFFSET_PX: f64 = 15.0;
const SPIKE_OUTLINE_EXTRA_PX: f64 = 6.0;
const SPIKE_OUTLINE_HALF_WIDTH_PX: f64 = 6.0;
const SPIKE_FILL_HALF_WIDTH_PX: f64 = 4.0;
const SPIKE_OUTLINE_OPACITY: f32 = 0.95;

pub const RAINFALL_METRES_PER_MM: f64 = 900.0;
pub const RAINFALL_MIN_RADIUS_M: f64 = 1500.0;
pub const RAINFALL_MAX_RADIUS_M: f64 = 22000.0;
const RAINFALL_FILL_OPACITY: f32 = 0.25;

pub const HUMIDITY_RADIUS_M: f64 = 14000.0;
pub const HUMIDITY_COLOR: Color = Color::hex(0x2171b5);
pub const HUMIDITY_MIN_OPACITY: f64 = 0.12;
pub const HUMIDITY_MAX_OPACITY: f64 = 0.5;

pub const FIRE_MIN_RADIUS_PX: f64 = 4.0;
/// Kelvin below which a detection gets the minimum radius.
pub const FIRE_BRIGHTNESS_BASE_K: f64 = 300.0;
pub const FIRE_KELVIN_PER_PX: f64 = 50.0;
const FIRE_FILL_OPACITY: f32 = 0.8;

/// Shown in popups for absent values.
pub const PLACEHOLDER: &str = "–";

/// Fill and stroke styling shared by circle-like descriptors.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct CircleStyle {
    pub stroke: Color,
    /// Zero means no stroke.
    pub weight: f32,
    pub fill: Color,
    pub fill_opacity: f32,
}

impl CircleStyle {
    pub const fn new(stroke: Color, weight: f32, fill: Color, fill_opacity: f32) -> Self {
        Self {
            stroke,
            weight,
            fill,
            fill_opacity,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct SpikeLayer {
    pub length_px: f32,
    pub half_width_px: f32,
    pub color: Color,
    pub opacity: f32,
}

/// Wind direction indicator drawn behind a station's disk.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct WindSpike {
    /// Degrees clockwise from north.
    pub rotation_deg: f32,
    pub offset_px: f32,
    pub outline: SpikeLayer,
    pub fill: SpikeLayer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationGlyph {
    pub outer_px: f32,
    pub outer_color: Color,
    pub inner_px: f32,
    pub fill: Color,
    pub label: String,
    pub text_color: Color,
    pub spike: Option<WindSpike>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterGlyph {
    pub size_px: f32,
    pub fill: Color,
    pub text_color: Color,
    pub count: usize,
    pub mean: f64,
}

/// A ground-anchored circle sized in metres.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FootprintCircle {
    pub radius_m: f64,
    pub style: CircleStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FireMarker {
    pub radius_px: f64,
    pub confidence: Confidence,
    pub style: CircleStyle,
}

pub fn wind_spike_length(speed_kmh: f64) -> f64 {
    (speed_kmh / SPIKE_KMH_PER_PX).clamp(SPIKE_MIN_PX, SPIKE_MAX_PX)
}

/// Spike for a station; non-numeric speed or direction read as 0.
pub fn wind_spike(props: &StationProperties) -> WindSpike {
    let speed = props.wind_speed.as_number().unwrap_or(0.0);
    let direction = props.wind_direction.as_number().unwrap_or(0.0);
    let length = wind_spike_length(speed);
    WindSpike {
        rotation_deg: direction as f32,
        offset_px: SPIKE_OFFSET_PX as f32,
        outline: SpikeLayer {
            length_px: (length + SPIKE_OUTLINE_EXTRA_PX) as f32,
            half_width_px: SPIKE_OUTLINE_HALF_WIDTH_PX as f32,
            color: Color::WHITE,
            opacity: SPIKE_OUTLINE_OPACITY,
        },
        fill: SpikeLayer {
            length_px: length as f32,
            half_width_px: SPIKE_FILL_HALF_WIDTH_PX as f32,
            color: symbology::color(speed, Variable::WindSpeed),
            opacity: 1.0,
        },
    }
}

pub fn station_glyph(props: &StationProperties, variable: Variable) -> StationGlyph {
    let reading = props.reading(variable);
    let value = reading.coerce().unwrap_or(f64::NAN);
    StationGlyph {
        outer_px: STATION_OUTER_PX,
        outer_color: Color::WHITE,
        inner_px: STATION_INNER_PX,
        fill: symbology::color(value, variable),
        label: reading.label(),
        text_color: symbology::text_color(variable),
        spike: (variable == Variable::WindSpeed).then(|| wind_spike(props)),
    }
}

/// Aggregate for a group of stations. Only strictly numeric readings count
/// toward the mean; a group without any has mean 0.
pub fn cluster_glyph<'a>(
    readings: impl IntoIterator<Item = &'a Measurement>,
    variable: Variable,
) -> ClusterGlyph {
    let mut count = 0;
    let mut sum = 0.0;
    let mut valid = 0usize;
    for reading in readings {
        count += 1;
        if let Some(n) = reading.as_number() {
            sum += n;
            valid += 1;
        }
    }
    let mean = if valid > 0 { sum / valid as f64 } else { 0.0 };
    ClusterGlyph {
        size_px: CLUSTER_PX,
        fill: symbology::color(mean, variable),
        text_color: symbology::text_color(variable),
        count,
        mean,
    }
}

pub fn rainfall_radius_m(mm: f64) -> f64 {
    (mm * RAINFALL_METRES_PER_MM).clamp(RAINFALL_MIN_RADIUS_M, RAINFALL_MAX_RADIUS_M)
}

pub fn rainfall_footprint(props: &StationProperties) -> Option<FootprintCircle> {
    let mm = props.precipitation_24h.coerce()?;
    let color = symbology::color(mm, Variable::Precipitation24h);
    Some(FootprintCircle {
        radius_m: rainfall_radius_m(mm),
        style: CircleStyle::new(color, 1.0, color, RAINFALL_FILL_OPACITY),
    })
}

pub fn humidity_opacity(percent: f64) -> f64 {
    (percent / 100.0 * HUMIDITY_MAX_OPACITY).clamp(HUMIDITY_MIN_OPACITY, HUMIDITY_MAX_OPACITY)
}

pub fn humidity_footprint(props: &StationProperties) -> Option<FootprintCircle> {
    let percent = props.relative_humidity.coerce()?;
    Some(FootprintCircle {
        radius_m: HUMIDITY_RADIUS_M,
        style: CircleStyle::new(
            HUMIDITY_COLOR,
            0.0,
            HUMIDITY_COLOR,
            humidity_opacity(percent) as f32,
        ),
    })
}

/// Missing or non-numeric brightness gets the minimum radius.
pub fn fire_radius_px(brightness: Option<f64>) -> f64 {
    brightness.map_or(FIRE_MIN_RADIUS_PX, |b| {
        ((b - FIRE_BRIGHTNESS_BASE_K) / FIRE_KELVIN_PER_PX).max(FIRE_MIN_RADIUS_PX)
    })
}

pub fn confidence_color(confidence: Confidence) -> Color {
    match confidence {
        Confidence::High => Color::RED,
        Confidence::Nominal => Color::ORANGE,
        Confidence::Low => Color::YELLOW,
        Confidence::Unknown => Color::GRAY,
    }
}

pub fn fire_marker(props: &FirmsProperties) -> FireMarker {
    let confidence = props.confidence_class();
    FireMarker {
        radius_px: fire_radius_px(props.brightness.coerce()),
        confidence,
        style: CircleStyle::new(
            Color::BLACK,
            1.0,
            confidence_color(confidence),
            FIRE_FILL_OPACITY,
        ),
    }
}

fn reading_line(name: &str, value: &Measurement, unit: &str) -> String {
    format!(
        "{}: {} {}",
        name,
        escape_html(&value.label_or(PLACEHOLDER)),
        unit
    )
}

fn wind_line(props: &StationProperties) -> String {
    format!(
        "{} ({}°)",
        reading_line(
            Variable::WindSpeed.display_name(),
            &props.wind_speed,
            symbology::unit(Variable::WindSpeed)
        ),
        escape_html(&props.wind_direction.label_or(PLACEHOLDER))
    )
}

fn variable_line(props: &StationProperties, variable: Variable) -> String {
    match variable {
        Variable::WindSpeed => wind_line(props),
        v => reading_line(v.display_name(), props.reading(v), symbology::unit(v)),
    }
}

fn text_or_placeholder(value: Option<&str>) -> String {
    escape_html(value.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(PLACEHOLDER))
}

/// Station name, the selected reading in bold, all readings, then a footer.
pub fn station_popup(props: &StationProperties, variable: Variable) -> String {
    let mut html = format!(
        "<b>{}</b><br><b>{}</b><br><hr>",
        text_or_placeholder(props.name.as_deref()),
        variable_line(props, variable)
    );
    for v in Variable::ALL {
        html.push_str(&variable_line(props, v));
        html.push_str("<br>");
    }
    html.push_str(&format!(
        "<small>Observed: {} • {} • {} m</small>",
        text_or_placeholder(props.observed_at.as_deref()),
        text_or_placeholder(props.institution_code()),
        escape_html(&props.elevation.label_or(PLACEHOLDER)),
    ));
    html
}

pub fn fire_popup(props: &FirmsProperties) -> String {
    let time = props.acq_time_hhmm();
    format!(
        "<strong>Fire detected</strong><br>Brightness: {}<br>Confidence: {}<br>Acquired: {} {} UTC<br>Satellite: {}",
        escape_html(&props.brightness.label_or(PLACEHOLDER)),
        escape_html(&props.confidence.label_or(PLACEHOLDER)),
        text_or_placeholder(props.acq_date.as_deref()),
        text_or_placeholder(time.as_deref()),
        text_or_placeholder(props.satellite.as_deref()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn station(json: serde_json::Value) -> StationProperties {
        serde_json::from_value(json).expect("station props")
    }

    #[test]
    fn rainfall_radii_clamp_to_range() {
        let radii: Vec<f64> = [0.0, 5.0, 60.0].into_iter().map(rainfall_radius_m).collect();
        assert_eq!(radii, vec![1500.0, 4500.0, 22000.0]);
    }

    #[test]
    fn rainfall_radius_is_monotone_and_bounded() {
        let mut prev = 0.0;
        for i in 0..400 {
            let r = rainfall_radius_m(i as f64 * 0.1 - 5.0);
            assert!(r >= prev);
            assert!((RAINFALL_MIN_RADIUS_M..=RAINFALL_MAX_RADIUS_M).contains(&r));
            prev = r;
        }
    }

    #[test]
    fn humidity_opacity_is_monotone_and_bounded() {
        let mut prev = 0.0;
        for h in 0..=120 {
            let o = humidity_opacity(h as f64);
            assert!(o >= prev);
            assert!((HUMIDITY_MIN_OPACITY..=HUMIDITY_MAX_OPACITY).contains(&o));
            prev = o;
        }
        assert_eq!(humidity_opacity(60.0), 0.3);
    }

    #[test]
    fn footprints_skip_unusable_readings() {
        let p = station(serde_json::json!({ "aguaCaida24Horas": "s/i", "humedadRelativa": null }));
        assert_eq!(rainfall_footprint(&p), None);
        assert_eq!(humidity_footprint(&p), None);

        let p = station(serde_json::json!({ "aguaCaida24Horas": " 12.5 ", "humedadRelativa": 80 }));
        let rain = rainfall_footprint(&p).expect("rain");
        assert_eq!(rain.radius_m, 11250.0);
        assert_eq!(rain.style.stroke, Color::hex(0x1d91c0));
        assert_eq!(rain.style.weight, 1.0);
        let hum = humidity_footprint(&p).expect("humidity");
        assert_eq!(hum.radius_m, HUMIDITY_RADIUS_M);
        assert_eq!(hum.style.weight, 0.0);
        assert_eq!(hum.style.fill, HUMIDITY_COLOR);
    }

    #[test]
    fn nominal_fire_at_350k_is_small_and_orange() {
        let p: FirmsProperties = serde_json::from_value(serde_json::json!({
            "brightness": 350,
            "confidence": "nominal"
        }))
        .expect("props");
        let m = fire_marker(&p);
        assert_eq!(m.radius_px, 4.0);
        assert_eq!(m.style.fill, Color::ORANGE);
        assert_eq!(m.style.stroke, Color::BLACK);
    }

    #[test]
    fn fire_radius_grows_without_upper_bound() {
        assert_eq!(fire_radius_px(None), 4.0);
        assert_eq!(fire_radius_px(Some(250.0)), 4.0);
        assert_eq!(fire_radius_px(Some(600.0)), 6.0);
        assert_eq!(fire_radius_px(Some(2300.0)), 40.0);
    }

    #[test]
    fn station_glyph_labels_raw_value() {
        let p = station(serde_json::json!({ "temperatura": "s/i" }));
        let g = station_glyph(&p, Variable::Temperature);
        assert_eq!(g.label, "s/i");
        assert_eq!(g.fill, Color::hex(0xffffb2));
        assert_eq!(g.spike, None);

        let p = station(serde_json::json!({}));
        assert_eq!(station_glyph(&p, Variable::Temperature).label, "");
    }

    #[test]
    fn wind_glyph_carries_spike() {
        let p = station(serde_json::json!({
            "fuerzaDelViento_kmh": 90,
            "direccionDelViento": 225
        }));
        let g = station_glyph(&p, Variable::WindSpeed);
        let spike = g.spike.expect("spike");
        assert_eq!(spike.rotation_deg, 225.0);
        assert_eq!(spike.fill.length_px, 20.0);
        assert_eq!(spike.outline.length_px, 26.0);
        assert_eq!(spike.fill.color, Color::hex(0x54278f));
        assert_eq!(spike.outline.color, Color::WHITE);

        // Textual speed does not count.
        let p = station(serde_json::json!({ "fuerzaDelViento_kmh": "90" }));
        let spike = wind_spike(&p);
        assert_eq!(spike.fill.length_px, 8.0);
        assert_eq!(spike.rotation_deg, 0.0);
    }

    #[test]
    fn cluster_mean_ignores_non_numbers() {
        let readings = [
            Measurement::Number(10.0),
            Measurement::Text("40".into()),
            Measurement::Missing,
            Measurement::Number(30.0),
        ];
        let g = cluster_glyph(&readings, Variable::Temperature);
        assert_eq!(g.count, 4);
        assert_eq!(g.mean, 20.0);
        assert_eq!(g.fill, Color::hex(0xfd8d3c));

        let empty = cluster_glyph(&[Measurement::Missing, Measurement::Missing], Variable::Temperature);
        assert_eq!(empty.count, 2);
        assert_eq!(empty.mean, 0.0);
        assert_eq!(empty.fill, Color::hex(0xffffb2));
    }

    #[test]
    fn popups_escape_and_fill_placeholders() {
        let p = station(serde_json::json!({
            "nombreEstacion": "<Quinta>",
            "temperatura": 21.5,
            "fuerzaDelViento_kmh": 12,
            "direccionDelViento": 90
        }));
        let html = station_popup(&p, Variable::WindSpeed);
        assert!(html.starts_with("<b>&lt;Quinta&gt;</b><br><b>Wind: 12 km/h (90°)</b>"));
        assert!(html.contains("Temperature: 21.5 °C<br>"));
        assert!(html.contains("Humidity: – %<br>"));
        assert!(html.ends_with("<small>Observed: – • – • – m</small>"));

        let f: FirmsProperties = serde_json::from_value(serde_json::json!({
            "brightness": 330.1,
            "confidence": "high",
            "acq_date": "2025-01-10",
            "acq_time": 45,
            "satellite": "N"
        }))
        .expect("props");
        let html = fire_popup(&f);
        assert!(html.contains("Brightness: 330.1<br>"));
        assert!(html.contains("Acquired: 2025-01-10 0045 UTC"));
    }
}
