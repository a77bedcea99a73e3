use serde::{Deserialize, Serialize};

use super::accuracy::PitchMetrics;
use super::vibrato::VibratoMetrics;

/// Everything known about one performance.
///
/// Built once by the scoring engine and never modified afterwards; this is
/// what the application displays and stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Overall score, 0-100.
    pub total_score: f64,
    pub pitch_metrics: PitchMetrics,
    pub vibrato_metrics: VibratoMetrics,
    /// Seconds covered by the analysis grid.
    pub duration: f64,
    pub notes: Feedback,
}

/// Human-readable feedback per category.
///
/// Serializes as a map keyed `pitch_accuracy`, `stability`, `vibrato`
/// (only when vibrato was detected) and `overall`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub pitch_accuracy: String,
    pub stability: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibrato: Option<String>,
    pub overall: String,
}

impl Feedback {
    /// (category, text) pairs in display order.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        let mut entries = vec![
            ("pitch_accuracy", self.pitch_accuracy.as_str()),
            ("stability", self.stability.as_str()),
        ];
        if let Some(ref vibrato) = self.vibrato {
            entries.push(("vibrato", vibrato.as_str()));
        }
        entries.push(("overall", self.overall.as_str()));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::vibrato::VibratoRejection;

    fn sample_report() -> ScoreReport {
        ScoreReport {
            total_score: 72.5,
            pitch_metrics: PitchMetrics {
                mean_error_hz: Some(4.2),
                std_error_hz: Some(2.1),
                accuracy: 62.5,
                stability: 0.66,
                voiced_frames: 180,
                total_frames: 200,
            },
            vibrato_metrics: VibratoMetrics::NotDetected(VibratoRejection::NoPeriodicPeak),
            duration: 1.99,
            notes: Feedback {
                pitch_accuracy: "Good pitch accuracy. Try to stay closer to the target.".into(),
                stability: "Good stability. Try to reduce pitch wavering.".into(),
                vibrato: None,
                overall: "Keep practicing! You'll improve with time.".into(),
            },
        }
    }

    #[test]
    fn report_json_layout() {
        let json = serde_json::to_value(sample_report()).unwrap();

        assert_eq!(json["total_score"], 72.5);
        assert_eq!(json["pitch_metrics"]["voiced_frames"], 180);
        assert_eq!(json["vibrato_metrics"]["detected"], false);
        assert_eq!(json["duration"], 1.99);

        let notes = json["notes"].as_object().unwrap();
        assert!(notes.contains_key("pitch_accuracy"));
        assert!(notes.contains_key("overall"));
        assert!(!notes.contains_key("vibrato"));
    }

    #[test]
    fn report_roundtrip() {
        let report = sample_report();
        let json = serde_json::to_string_pretty(&report).unwrap();
        let loaded: ScoreReport = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, report);
    }

    #[test]
    fn undefined_error_serializes_as_null() {
        let mut report = sample_report();
        report.pitch_metrics = PitchMetrics::degenerate(10);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["pitch_metrics"]["mean_error_hz"].is_null());
    }

    #[test]
    fn entries_in_display_order() {
        let mut feedback = sample_report().notes;
        feedback.vibrato = Some("Nice vibrato detected! (6.0 Hz, 45 cents)".into());

        let keys: Vec<&str> = feedback.entries().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["pitch_accuracy", "stability", "vibrato", "overall"]);
    }
}
