// ── Display heuristics ──
//
// Pure functions over the domain model: severity filtering, the
// ventilation effectiveness score shown on the dashboard, door roll-ups,
// and chart series extraction. None of these talk to the network.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{
    DoorEvent, DoorSummary, HistoryPoint, Incident, Metric, SensorReading, Severity, Zone,
};
use crate::units::TemperatureUnit;

// ── Incidents ──────────────────────────────────────────────────────

/// Incidents at or above `min`, order preserved.
pub fn filter_by_min_severity(incidents: &[Incident], min: Severity) -> Vec<Incident> {
    incidents
        .iter()
        .filter(|i| i.severity >= min)
        .cloned()
        .collect()
}

pub fn active_incidents(incidents: &[Incident]) -> Vec<Incident> {
    incidents.iter().filter(|i| i.is_active()).cloned().collect()
}

// ── Ventilation effectiveness ──────────────────────────────────────

/// Indoor/outdoor difference (°C) at which the score saturates at 100.
const FULL_SCORE_DELTA_C: f64 = 5.0;
/// Difference (°C) above which an idle fan is worth turning on.
const OPPORTUNITY_DELTA_C: f64 = 2.0;
/// Outdoor humidity (%) above which ventilating imports moisture.
const HUMID_OUTDOOR_PCT: f64 = 80.0;
const HUMIDITY_PENALTY: f64 = 20.0;

/// What the fan is achieving right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum Verdict {
    /// Fan on, pulling in cooler air.
    Effective,
    /// Fan on, but outside is as warm or warmer.
    Counterproductive,
    /// Fan off while outside is markedly cooler.
    Opportunity,
    /// Fan off and nothing to gain.
    Idle,
    /// Missing temperature or fan state.
    Unknown,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, strum::Display,
)]
pub enum Rating {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl Rating {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => Self::Excellent,
            s if s >= 60.0 => Self::Good,
            s if s >= 40.0 => Self::Fair,
            _ => Self::Poor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VentilationAssessment {
    pub verdict: Verdict,
    /// 0-100 while the fan runs, otherwise `None`.
    pub score: Option<f64>,
    pub rating: Option<Rating>,
    /// Indoor minus outdoor, °C.
    pub delta_c: Option<f64>,
}

impl VentilationAssessment {
    fn unknown(delta_c: Option<f64>) -> Self {
        Self {
            verdict: Verdict::Unknown,
            score: None,
            rating: None,
            delta_c,
        }
    }

    /// One-line copy for the dashboard.
    pub fn headline(&self, unit: TemperatureUnit) -> String {
        let delta = self
            .delta_c
            .map(|d| format!("{:+.1}{}", unit.delta_from_celsius(d), unit.symbol()))
            .unwrap_or_default();
        match self.verdict {
            Verdict::Effective => format!("Cooling effectively ({delta} inside vs outside)"),
            Verdict::Counterproductive => "Fan is pulling in warmer air".into(),
            Verdict::Opportunity => format!("Outside is cooler ({delta}), consider ventilating"),
            Verdict::Idle => "Fan off, no benefit from ventilating".into(),
            Verdict::Unknown => "Not enough data".into(),
        }
    }
}

/// Score how well ventilation is working.
///
/// With the fan running the score is `min(delta / 5, 1) * 100`, minus 20
/// when outdoor humidity exceeds 80 %, floored at 0. A non-positive delta
/// scores 0. With the fan off there is no score, only a verdict.
pub fn assess_ventilation(
    indoor: &SensorReading,
    outdoor: &SensorReading,
    fan_on: Option<bool>,
) -> VentilationAssessment {
    let (Some(inside), Some(outside)) = (indoor.temperature_c, outdoor.temperature_c) else {
        return VentilationAssessment::unknown(None);
    };
    let delta = inside - outside;
    let Some(fan_on) = fan_on else {
        return VentilationAssessment::unknown(Some(delta));
    };

    if fan_on {
        if delta <= 0.0 {
            return VentilationAssessment {
                verdict: Verdict::Counterproductive,
                score: Some(0.0),
                rating: Some(Rating::Poor),
                delta_c: Some(delta),
            };
        }
        let mut score = (delta / FULL_SCORE_DELTA_C).min(1.0) * 100.0;
        if outdoor.humidity_pct.is_some_and(|h| h > HUMID_OUTDOOR_PCT) {
            score -= HUMIDITY_PENALTY;
        }
        let score = score.max(0.0);
        VentilationAssessment {
            verdict: Verdict::Effective,
            score: Some(score),
            rating: Some(Rating::from_score(score)),
            delta_c: Some(delta),
        }
    } else {
        VentilationAssessment {
            verdict: if delta >= OPPORTUNITY_DELTA_C {
                Verdict::Opportunity
            } else {
                Verdict::Idle
            },
            score: None,
            rating: None,
            delta_c: Some(delta),
        }
    }
}

// ── Doors ──────────────────────────────────────────────────────────

/// Per-door counts and latest state, sorted by door name.
pub fn summarize_doors(events: &[DoorEvent]) -> Vec<DoorSummary> {
    struct Acc {
        summary: DoorSummary,
        confidence_sum: f64,
        confidence_n: u32,
    }

    let mut by_door: HashMap<&str, Acc> = HashMap::new();
    for event in events {
        let acc = by_door.entry(event.door_id.as_str()).or_insert_with(|| Acc {
            summary: DoorSummary {
                door_id: event.door_id.clone(),
                door_name: event.door_name.clone(),
                opens: 0,
                closes: 0,
                last_event_at: None,
                last_opened: None,
                mean_confidence: None,
            },
            confidence_sum: 0.0,
            confidence_n: 0,
        });

        if event.opened {
            acc.summary.opens += 1;
        } else {
            acc.summary.closes += 1;
        }
        if let Some(ts) = event.timestamp {
            if acc.summary.last_event_at.is_none_or(|last| ts > last) {
                acc.summary.last_event_at = Some(ts);
                acc.summary.last_opened = Some(event.opened);
            }
        }
        if let Some(c) = event.confidence {
            acc.confidence_sum += c;
            acc.confidence_n += 1;
        }
    }

    let mut out: Vec<DoorSummary> = by_door
        .into_values()
        .map(|mut acc| {
            if acc.confidence_n > 0 {
                acc.summary.mean_confidence =
                    Some(acc.confidence_sum / f64::from(acc.confidence_n));
            }
            acc.summary
        })
        .collect();
    out.sort_by(|a, b| {
        a.door_name
            .cmp(&b.door_name)
            .then_with(|| a.door_id.cmp(&b.door_id))
    });
    out
}

// ── Charts ─────────────────────────────────────────────────────────

/// `(unix seconds, value)` pairs for one zone and metric, skipping gaps.
/// Temperatures are converted into `unit`.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn chart_series(
    points: &[HistoryPoint],
    zone: Zone,
    metric: Metric,
    unit: TemperatureUnit,
) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter_map(|p| {
            let value = p.reading(zone).get(metric)?;
            let value = match metric {
                Metric::Temperature => unit.from_celsius(value),
                Metric::Humidity | Metric::Pressure => value,
            };
            Some((p.timestamp.timestamp() as f64, value))
        })
        .collect()
}
