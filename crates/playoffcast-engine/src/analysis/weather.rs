// Weather impact analysis.
//
// Conditions are bucketed into severity bands, turned into passing, rushing,
// kicking, and defense sub-impacts, and combined with weights chosen by the
// team's offensive style. Dome games are neutral.

use serde::Serialize;

use playoffcast_core::model::roster::active_starters;
use playoffcast_core::model::{OffensiveStyle, Position, Precipitation, Team, WeatherSnapshot};

/// Wind speed above which field goals become unreliable.
pub const KICKING_WIND_THRESHOLD_MPH: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    Mild,
    Moderate,
    Severe,
    Extreme,
}

impl SeverityBand {
    pub fn factor(&self) -> f64 {
        match self {
            SeverityBand::Mild => 0.0,
            SeverityBand::Moderate => 0.33,
            SeverityBand::Severe => 0.66,
            SeverityBand::Extreme => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeverityBand::Mild => "mild",
            SeverityBand::Moderate => "moderate",
            SeverityBand::Severe => "severe",
            SeverityBand::Extreme => "extreme",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherBands {
    pub temperature: SeverityBand,
    pub wind: SeverityBand,
    pub precipitation: SeverityBand,
}

impl WeatherBands {
    pub fn worst(&self) -> SeverityBand {
        self.temperature.max(self.wind).max(self.precipitation)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WeatherReport {
    /// Overall impact in [-1, 1]; negative hurts the team.
    pub impact: f64,
    pub bands: Option<WeatherBands>,
    pub passing: f64,
    pub rushing: f64,
    pub kicking: f64,
    pub defense: f64,
    pub style: OffensiveStyle,
    pub position_impacts: Vec<(Position, f64)>,
    pub details: Vec<String>,
}

impl WeatherReport {
    fn neutral(style: OffensiveStyle, detail: &str) -> Self {
        WeatherReport {
            impact: 0.0,
            bands: None,
            passing: 0.0,
            rushing: 0.0,
            kicking: 0.0,
            defense: 0.0,
            style,
            position_impacts: Vec::new(),
            details: vec![detail.to_string()],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WeatherAnalyzer;

impl WeatherAnalyzer {
    pub fn new() -> Self {
        WeatherAnalyzer
    }

    pub fn classify(weather: &WeatherSnapshot) -> WeatherBands {
        let t = weather.temperature_f;
        let temperature = if t < 10.0 {
            SeverityBand::Extreme
        } else if t < 25.0 || t > 100.0 {
            SeverityBand::Severe
        } else if t < 40.0 || t > 90.0 {
            SeverityBand::Moderate
        } else {
            SeverityBand::Mild
        };

        let w = weather.wind_mph;
        let wind = if w >= 30.0 {
            SeverityBand::Extreme
        } else if w >= KICKING_WIND_THRESHOLD_MPH {
            SeverityBand::Severe
        } else if w >= 15.0 {
            SeverityBand::Moderate
        } else {
            SeverityBand::Mild
        };

        let precipitation = match weather.precipitation {
            Precipitation::Clear => SeverityBand::Mild,
            Precipitation::Light => SeverityBand::Moderate,
            Precipitation::Moderate | Precipitation::Snow => SeverityBand::Severe,
            Precipitation::Heavy => SeverityBand::Extreme,
        };

        WeatherBands {
            temperature,
            wind,
            precipitation,
        }
    }

    /// Impact of `weather` on `team`. `None` (no forecast) and dome games
    /// are neutral.
    pub fn analyze(&self, team: &Team, weather: Option<&WeatherSnapshot>) -> WeatherReport {
        let style = team.style.unwrap_or_else(|| infer_style(team));
        let Some(weather) = weather else {
            return WeatherReport::neutral(style, "No forecast available");
        };
        if weather.dome {
            return WeatherReport::neutral(style, "Dome game: weather has no effect");
        }

        let bands = Self::classify(weather);
        let (t, w, p) = (
            bands.temperature.factor(),
            bands.wind.factor(),
            bands.precipitation.factor(),
        );

        let passing = -(0.45 * w + 0.35 * p + 0.20 * t);
        let rushing = -(0.10 * w + 0.35 * p + 0.15 * t);
        let mut kicking = -(0.70 * w + 0.20 * p + 0.10 * t);
        if weather.wind_mph >= KICKING_WIND_THRESHOLD_MPH {
            kicking -= 0.25;
        }
        let kicking = kicking.max(-1.0);
        let defense = 0.3 * (passing.abs() + rushing.abs()) / 2.0;

        let (wp, wr, wk, wd) = style_weights(style);
        let impact = (wp * passing + wr * rushing + wk * kicking + wd * defense).clamp(-1.0, 1.0);

        let position_impacts = vec![
            (Position::Quarterback, passing),
            (Position::WideReceiver, 0.9 * passing),
            (Position::TightEnd, 0.6 * passing + 0.4 * rushing),
            (Position::RunningBack, rushing),
            (Position::Kicker, kicking),
            (Position::Defense, defense),
        ];

        let mut details = Vec::new();
        if bands.worst() == SeverityBand::Mild {
            details.push("Conditions are mild".to_string());
        } else {
            details.push(format!(
                "{:.0}F ({}), wind {:.0} mph ({}), precipitation {}",
                weather.temperature_f,
                bands.temperature.label(),
                weather.wind_mph,
                bands.wind.label(),
                bands.precipitation.label()
            ));
        }
        if weather.wind_mph >= KICKING_WIND_THRESHOLD_MPH {
            details.push("High wind: kicking game sharply degraded".to_string());
        }
        if impact < -0.1 {
            details.push(format!(
                "{} offense loses {:.0}% of its weather-neutral edge",
                style.label(),
                impact.abs() * 100.0
            ));
        }

        WeatherReport {
            impact,
            bands: Some(bands),
            passing,
            rushing,
            kicking,
            defense,
            style,
            position_impacts,
            details,
        }
    }
}

/// (passing, rushing, kicking, defense) weights for a style.
fn style_weights(style: OffensiveStyle) -> (f64, f64, f64, f64) {
    match style {
        OffensiveStyle::PassHeavy => (0.55, 0.20, 0.15, 0.10),
        OffensiveStyle::RunHeavy => (0.20, 0.55, 0.15, 0.10),
        OffensiveStyle::Balanced => (0.375, 0.375, 0.15, 0.10),
        OffensiveStyle::Defensive => (0.30, 0.30, 0.15, 0.25),
    }
}

/// Infer a style from where the active lineup's projected points come from.
pub fn infer_style(team: &Team) -> OffensiveStyle {
    let mut passing = 0.0;
    let mut rushing = 0.0;
    let mut defense = 0.0;
    let mut total = 0.0;
    for starter in active_starters(&team.roster) {
        let pts = starter.player.effective_projection();
        total += pts;
        match starter.player.position {
            Position::Quarterback | Position::WideReceiver | Position::TightEnd => passing += pts,
            Position::RunningBack => rushing += pts,
            Position::Defense => defense += pts,
            Position::Kicker => {}
        }
    }
    if total <= 0.0 {
        return OffensiveStyle::Balanced;
    }
    if defense / total >= 0.14 {
        return OffensiveStyle::Defensive;
    }
    let offense = passing + rushing;
    if offense <= 0.0 {
        return OffensiveStyle::Balanced;
    }
    let pass_share = passing / offense;
    if pass_share >= 0.72 {
        OffensiveStyle::PassHeavy
    } else if pass_share <= 0.55 {
        OffensiveStyle::RunHeavy
    } else {
        OffensiveStyle::Balanced
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::roster;

    fn team(style: Option<OffensiveStyle>) -> Team {
        let mut team = Team::new("t", "Test", "East");
        team.roster = roster("t", 1.0);
        team.style = style;
        team
    }

    fn storm() -> WeatherSnapshot {
        WeatherSnapshot {
            temperature_f: 20.0,
            wind_mph: 28.0,
            precipitation: Precipitation::Snow,
            dome: false,
        }
    }

    #[test]
    fn dome_is_exactly_neutral() {
        let mut w = storm();
        w.dome = true;
        let report = WeatherAnalyzer::new().analyze(&team(None), Some(&w));
        assert_eq!(report.impact, 0.0);
        assert!(report.bands.is_none());
    }

    #[test]
    fn missing_forecast_is_neutral() {
        let report = WeatherAnalyzer::new().analyze(&team(None), None);
        assert_eq!(report.impact, 0.0);
    }

    #[test]
    fn mild_weather_is_neutral() {
        let w = WeatherSnapshot {
            temperature_f: 65.0,
            wind_mph: 5.0,
            precipitation: Precipitation::Clear,
            dome: false,
        };
        let report = WeatherAnalyzer::new().analyze(&team(None), Some(&w));
        assert_eq!(report.impact, 0.0);
    }

    #[test]
    fn storm_hurts_passing_teams_more() {
        let analyzer = WeatherAnalyzer::new();
        let pass = analyzer.analyze(&team(Some(OffensiveStyle::PassHeavy)), Some(&storm()));
        let run = analyzer.analyze(&team(Some(OffensiveStyle::RunHeavy)), Some(&storm()));
        assert!(pass.impact < run.impact);
        assert!(run.impact < 0.0);
        assert!(pass.impact >= -1.0);
    }

    #[test]
    fn high_wind_degrades_kicking_sharply() {
        let analyzer = WeatherAnalyzer::new();
        let breezy = WeatherSnapshot {
            temperature_f: 60.0,
            wind_mph: 20.0,
            precipitation: Precipitation::Clear,
            dome: false,
        };
        let gusty = WeatherSnapshot {
            wind_mph: 26.0,
            ..breezy
        };
        let a = analyzer.analyze(&team(None), Some(&breezy));
        let b = analyzer.analyze(&team(None), Some(&gusty));
        assert!(b.kicking < a.kicking - 0.4);
    }

    #[test]
    fn classify_bands() {
        let bands = WeatherAnalyzer::classify(&storm());
        assert_eq!(bands.temperature, SeverityBand::Severe);
        assert_eq!(bands.wind, SeverityBand::Severe);
        assert_eq!(bands.precipitation, SeverityBand::Severe);
        assert_eq!(bands.worst(), SeverityBand::Severe);
    }

    #[test]
    fn infers_style_from_lineup() {
        let t = team(None);
        assert_eq!(infer_style(&t), OffensiveStyle::Balanced);

        let mut runners = team(None);
        for p in runners.roster.iter_mut() {
            if p.position == Position::RunningBack {
                p.projected_points *= 3.0;
            }
        }
        assert_eq!(infer_style(&runners), OffensiveStyle::RunHeavy);
    }
}
