use formats::station::Variable;
use serde::{Deserialize, Serialize};

/// A user-controlled checkbox gating an optional overlay.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    Rainfall,
    Humidity,
    Fires,
}

impl Toggle {
    pub const ALL: [Toggle; 3] = [Toggle::Rainfall, Toggle::Humidity, Toggle::Fires];

    pub fn name(self) -> &'static str {
        match self {
            Toggle::Rainfall => "rainfall",
            Toggle::Humidity => "humidity",
            Toggle::Fires => "fires",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Toggle::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name.trim()))
    }

    /// The variable whose overlay this toggle gates; `None` for toggles that
    /// apply regardless of the variable.
    pub fn variable(self) -> Option<Variable> {
        match self {
            Toggle::Rainfall => Some(Variable::Precipitation24h),
            Toggle::Humidity => Some(Variable::RelativeHumidity),
            Toggle::Fires => None,
        }
    }

    /// Whether the control is worth showing while `variable` is current.
    pub fn is_relevant(self, variable: Variable) -> bool {
        self.variable().is_none_or(|v| v == variable)
    }
}

/// Checkbox states. `None` means the control does not exist, which reads as off.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleState {
    pub rainfall: Option<bool>,
    pub humidity: Option<bool>,
    pub fires: Option<bool>,
}

impl ToggleState {
    /// All controls present with the given checked states.
    pub fn with_controls(rainfall: bool, humidity: bool, fires: bool) -> Self {
        Self {
            rainfall: Some(rainfall),
            humidity: Some(humidity),
            fires: Some(fires),
        }
    }

    pub fn control(&self, toggle: Toggle) -> Option<bool> {
        match toggle {
            Toggle::Rainfall => self.rainfall,
            Toggle::Humidity => self.humidity,
            Toggle::Fires => self.fires,
        }
    }

    pub fn is_on(&self, toggle: Toggle) -> bool {
        self.control(toggle).unwrap_or(false)
    }

    pub fn set(&mut self, toggle: Toggle, checked: bool) {
        let slot = match toggle {
            Toggle::Rainfall => &mut self.rainfall,
            Toggle::Humidity => &mut self.humidity,
            Toggle::Fires => &mut self.fires,
        };
        *slot = Some(checked);
    }

    /// Overlay gated by `toggle` should be built for `variable`.
    pub fn overlay_enabled(&self, toggle: Toggle, variable: Variable) -> bool {
        toggle.is_relevant(variable) && self.is_on(toggle)
    }
}

/// Controls that should be shown for `variable`.
pub fn relevant_controls(variable: Variable) -> Vec<Toggle> {
    Toggle::ALL
        .into_iter()
        .filter(|t| t.is_relevant(variable))
        .collect()
}
