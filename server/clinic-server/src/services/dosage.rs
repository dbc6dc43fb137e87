//! Dosage arithmetic: how many units a prescribed line consumes from stock

use serde_json::Value;

/// Frequency labels understood by the clinic front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    OnceDaily,
    TwiceDaily,
    ThriceDaily,
    FourTimesDaily,
    Every6Hours,
    Every8Hours,
    Every12Hours,
    OnceWeekly,
    AsNeeded,
}

impl Frequency {
    pub const ALL: [Frequency; 9] = [
        Frequency::OnceDaily,
        Frequency::TwiceDaily,
        Frequency::ThriceDaily,
        Frequency::FourTimesDaily,
        Frequency::Every6Hours,
        Frequency::Every8Hours,
        Frequency::Every12Hours,
        Frequency::OnceWeekly,
        Frequency::AsNeeded,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Frequency::OnceDaily => "Once daily",
            Frequency::TwiceDaily => "Twice daily",
            Frequency::ThriceDaily => "Thrice daily",
            Frequency::FourTimesDaily => "Four times daily",
            Frequency::Every6Hours => "Every 6 hours",
            Frequency::Every8Hours => "Every 8 hours",
            Frequency::Every12Hours => "Every 12 hours",
            Frequency::OnceWeekly => "Once weekly",
            Frequency::AsNeeded => "As needed",
        }
    }

    /// Exact, case-sensitive label match
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.label() == label)
    }

    /// Doses per day
    pub fn daily_multiplier(self) -> f64 {
        match self {
            Frequency::OnceDaily => 1.0,
            Frequency::TwiceDaily => 2.0,
            Frequency::ThriceDaily => 3.0,
            Frequency::FourTimesDaily => 4.0,
            Frequency::Every6Hours => 4.0,
            Frequency::Every8Hours => 3.0,
            Frequency::Every12Hours => 2.0,
            Frequency::OnceWeekly => 1.0 / 7.0,
            // Reserved as one dose per day of the course
            Frequency::AsNeeded => 1.0,
        }
    }
}

/// Multiplier for a free-text frequency; unknown or missing labels count as once daily
pub fn frequency_multiplier(frequency: Option<&str>) -> f64 {
    frequency
        .and_then(Frequency::from_label)
        .map(Frequency::daily_multiplier)
        .unwrap_or(1.0)
}

fn duration_days(duration: &Value) -> Option<f64> {
    let days = match duration {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    days.is_finite().then_some(days)
}

/// Units of stock a line consumes: `floor(duration × multiplier)`, or 0 when
/// the duration is missing, non-numeric or not positive. Products beyond the
/// `i64` range saturate to `i64::MAX` so they fail the stock check.
pub fn required_quantity(duration: &Value, frequency: Option<&str>) -> i64 {
    let Some(days) = duration_days(duration) else {
        return 0;
    };
    if days <= 0.0 {
        return 0;
    }
    let total = days * frequency_multiplier(frequency);
    if total <= 0.0 || total.is_nan() {
        0
    } else if total >= i64::MAX as f64 {
        i64::MAX
    } else {
        total.floor() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn multipliers_match_label_table() {
        let expected = [
            ("Once daily", 1.0),
            ("Twice daily", 2.0),
            ("Thrice daily", 3.0),
            ("Four times daily", 4.0),
            ("Every 6 hours", 4.0),
            ("Every 8 hours", 3.0),
            ("Every 12 hours", 2.0),
            ("As needed", 1.0),
        ];
        for (label, multiplier) in expected {
            assert_eq!(frequency_multiplier(Some(label)), multiplier, "{label}");
        }
        assert!((frequency_multiplier(Some("Once weekly")) - 1.0 / 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_frequency_counts_once() {
        assert_eq!(frequency_multiplier(Some("twice daily")), 1.0);
        assert_eq!(frequency_multiplier(Some("")), 1.0);
        assert_eq!(frequency_multiplier(None), 1.0);
    }

    #[test]
    fn labels_round_trip() {
        for frequency in Frequency::ALL {
            assert_eq!(Frequency::from_label(frequency.label()), Some(frequency));
        }
    }

    #[test]
    fn required_quantity_floors_the_product() {
        assert_eq!(required_quantity(&json!(3), Some("Twice daily")), 6);
        assert_eq!(required_quantity(&json!("5"), Some("Thrice daily")), 15);
        assert_eq!(required_quantity(&json!(2.5), Some("Twice daily")), 5);
        assert_eq!(required_quantity(&json!(1.5), Some("Once daily")), 1);
        assert_eq!(required_quantity(&json!(14), Some("Once weekly")), 2);
        assert_eq!(required_quantity(&json!(6), Some("Once weekly")), 0);
    }

    #[test]
    fn invalid_durations_need_nothing() {
        assert_eq!(required_quantity(&json!(0), Some("Twice daily")), 0);
        assert_eq!(required_quantity(&json!(-4), Some("Twice daily")), 0);
        assert_eq!(required_quantity(&json!("a week"), Some("Twice daily")), 0);
        assert_eq!(required_quantity(&json!(""), Some("Twice daily")), 0);
        assert_eq!(required_quantity(&Value::Null, Some("Twice daily")), 0);
        assert_eq!(required_quantity(&json!(true), None), 0);
        assert_eq!(required_quantity(&json!("inf"), None), 0);
    }

    #[test]
    fn oversized_durations_saturate() {
        assert_eq!(required_quantity(&json!(1e19), Some("Twice daily")), i64::MAX);
        assert_eq!(required_quantity(&json!("1e300"), Some("Once daily")), i64::MAX);
        assert_eq!(required_quantity(&json!(1e300), Some("Four times daily")), i64::MAX);
    }

    #[test]
    fn unknown_frequency_uses_duration() {
        assert_eq!(required_quantity(&json!(7), Some("Bedtime")), 7);
        assert_eq!(required_quantity(&json!(" 4 "), None), 4);
    }
}
