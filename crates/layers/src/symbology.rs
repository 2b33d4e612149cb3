//! Variable-driven color encoding.
//!
//! Every variable owns a fixed ramp of `(lower bound, color)` thresholds. A
//! value takes the color of the highest bound it strictly exceeds.

use foundation::color::Color;
use formats::measurement::format_number;
use formats::station::Variable;
use serde::Serialize;

/// Fallback for anything the encoder does not know about.
pub const NEUTRAL: Color = Color::hex(0x999999);
pub const TEXT_DARK: Color = Color::hex(0x111111);
pub const TEXT_LIGHT: Color = Color::WHITE;

/// Offset above a bucket's lower bound used to sample its swatch.
pub const LEGEND_EPSILON: f64 = 0.1;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Threshold {
    pub above: f64,
    pub color: Color,
}

const fn t(above: f64, color: u32) -> Threshold {
    Threshold {
        above,
        color: Color::hex(color),
    }
}

#[derive(Debug)]
pub struct ColorRamp {
    /// Ascending by `above`.
    pub thresholds: &'static [Threshold],
    pub below: Color,
}

impl ColorRamp {
    pub fn color(&self, value: f64) -> Color {
        self.thresholds
            .iter()
            .rev()
            .find(|t| value > t.above)
            .map_or(self.below, |t| t.color)
    }

    pub fn palette(&self) -> impl Iterator<Item = Color> + '_ {
        std::iter::once(self.below).chain(self.thresholds.iter().map(|t| t.color))
    }
}

static TEMPERATURE: ColorRamp = ColorRamp {
    thresholds: &[
        t(5.0, 0xfed976),
        t(10.0, 0xfeb24c),
        t(15.0, 0xfd8d3c),
        t(20.0, 0xfc4e2a),
        t(25.0, 0xe31a1c),
        t(30.0, 0xb10026),
    ],
    below: Color::hex(0xffffb2),
};

static RELATIVE_HUMIDITY: ColorRamp = ColorRamp {
    thresholds: &[
        t(20.0, 0xc6dbef),
        t(40.0, 0x6baed6),
        t(60.0, 0x2171b5),
        t(80.0, 0x08306b),
    ],
    below: Color::hex(0xf7fbff),
};

static PRECIPITATION_24H: ColorRamp = ColorRamp {
    thresholds: &[
        t(0.0, 0x74c476),
        t(5.0, 0x41ab5d),
        t(10.0, 0x1d91c0),
        t(20.0, 0x225ea8),
        t(50.0, 0x08306b),
    ],
    below: Color::hex(0xedf8fb),
};

static WIND_SPEED: ColorRamp = ColorRamp {
    thresholds: &[
        t(5.0, 0xcbc9e2),
        t(15.0, 0x9e9ac8),
        t(30.0, 0x756bb1),
        t(50.0, 0x54278f),
    ],
    below: Color::hex(0xf2f0f7),
};

pub fn ramp(variable: Variable) -> &'static ColorRamp {
    match variable {
        Variable::Temperature => &TEMPERATURE,
        Variable::RelativeHumidity => &RELATIVE_HUMIDITY,
        Variable::Precipitation24h => &PRECIPITATION_24H,
        Variable::WindSpeed => &WIND_SPEED,
    }
}

/// NaN sits below every threshold.
pub fn color(value: f64, variable: Variable) -> Color {
    ramp(variable).color(value)
}

/// Encoding by variable name (slug or feed key); unknown names map to
/// [`NEUTRAL`].
pub fn color_for_name(value: f64, name: &str) -> Color {
    Variable::from_name(name).map_or(NEUTRAL, |v| color(value, v))
}

/// Label color on top of a variable's fills.
pub fn text_color(variable: Variable) -> Color {
    match variable {
        Variable::Precipitation24h => TEXT_DARK,
        _ => TEXT_LIGHT,
    }
}

pub fn unit(variable: Variable) -> &'static str {
    match variable {
        Variable::Temperature => "°C",
        Variable::RelativeHumidity => "%",
        Variable::Precipitation24h => "mm",
        Variable::WindSpeed => "km/h",
    }
}

/// Empty for unknown names.
pub fn unit_for_name(name: &str) -> &'static str {
    Variable::from_name(name).map_or("", unit)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub from: f64,
    /// `None` for the open-ended top bucket.
    pub to: Option<f64>,
    pub color: Color,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

impl Legend {
    fn from_bounds(title: String, bounds: &[f64], sample: impl Fn(f64) -> Color) -> Self {
        let entries = bounds
            .iter()
            .enumerate()
            .map(|(i, &from)| {
                let to = bounds.get(i + 1).copied();
                let label = match to {
                    Some(to) => format!("{}–{}", format_number(from), format_number(to)),
                    None => format!("{}+", format_number(from)),
                };
                LegendEntry {
                    from,
                    to,
                    color: sample(from + LEGEND_EPSILON),
                    label,
                }
            })
            .collect();
        Self { title, entries }
    }

    /// Legend control markup: a bold title then one swatch row per bucket.
    pub fn to_html(&self) -> String {
        let mut html = format!("<b>{}</b><br>", escape_html(&self.title));
        for entry in &self.entries {
            html.push_str(&format!(
                "<i style=\"background:{}\"></i> {}",
                entry.color,
                escape_html(&entry.label)
            ));
            if entry.to.is_some() {
                html.push_str("<br>");
            }
        }
        html
    }
}

pub fn legend(variable: Variable) -> Legend {
    let ramp = ramp(variable);
    let bounds: Vec<f64> = ramp.thresholds.iter().map(|t| t.above).collect();
    let title = format!("{} ({})", variable.display_name(), unit(variable));
    Legend::from_bounds(title, &bounds, |v| ramp.color(v))
}

/// Unknown names get a single gray `0+` bucket titled with the raw name.
pub fn legend_for_name(name: &str) -> Legend {
    match Variable::from_name(name) {
        Some(v) => legend(v),
        None => Legend::from_bounds(name.to_string(), &[0.0], |_| NEUTRAL),
    }
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
