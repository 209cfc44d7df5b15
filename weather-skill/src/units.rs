/// Measurement system applied to provider fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    /// Resolve a requested unit string. Only exactly `"imperial"` selects
    /// [`UnitSystem::Imperial`]; anything else, unknown values included, is metric.
    pub fn from_requested(units: &str) -> Self {
        if units == "imperial" { UnitSystem::Imperial } else { UnitSystem::Metric }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    // Label helpers for human-readable output.

    pub fn temperature_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "°C",
            UnitSystem::Imperial => "°F",
        }
    }

    pub fn speed_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "km/h",
            UnitSystem::Imperial => "mph",
        }
    }

    pub fn pressure_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "mb",
            UnitSystem::Imperial => "inHg",
        }
    }

    pub fn precipitation_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "mm",
            UnitSystem::Imperial => "in",
        }
    }

    pub fn distance_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "km",
            UnitSystem::Imperial => "miles",
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
