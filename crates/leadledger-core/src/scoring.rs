//! Lead scoring.
//!
//! Classifies an enquiry into a [`Priority`] tier from its service category,
//! budget range and message. Rules are evaluated in a fixed order and the
//! first match wins:
//!
//! | Order | Signal | Tier |
//! |-------|--------|------|
//! | 1 | max budget ≥ 1,500,000 | HOT |
//! | 2 | service mentions "full service" | HOT |
//! | 3 | message longer than 500 characters | HOT |
//! | 4 | max budget ≥ 750,000 | WARM |
//! | 5 | service mentions negotiation, auction, property investment or NDIS | WARM |
//! | 6 | anything else | COLD |

use serde::{Deserialize, Serialize};

/// Budget at or above which a lead is HOT.
pub const HOT_BUDGET: u64 = 1_500_000;

/// Budget at or above which a lead is WARM.
pub const WARM_BUDGET: u64 = 750_000;

/// Message length (in characters) above which a lead is HOT.
pub const LONG_MESSAGE_CHARS: usize = 500;

/// Service fragments that mark a lead WARM, checked in order.
const WARM_SERVICES: [&str; 4] = ["negotiation", "auction", "property invest", "ndis"];

/// Service labels offered on the enquiry form.
pub const SERVICE_LABELS: [&str; 6] = [
    "Full Service Buyers Agency",
    "Property Search & Evaluation",
    "Negotiation Only",
    "Auction Bidding",
    "Property Investment Strategy",
    "NDIS Property Investment",
];

/// Value/urgency tier of an enquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    /// High value or urgent.
    Hot,
    /// Worth chasing.
    Warm,
    /// Low signal.
    #[default]
    Cold,
}

impl Priority {
    /// Parse from database string representation.
    ///
    /// Unknown values fall back to `Cold`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        Self::try_parse(s).unwrap_or_default()
    }

    /// Parse a user-supplied value, rejecting anything unknown.
    #[must_use]
    pub fn try_parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "HOT" => Some(Self::Hot),
            "WARM" => Some(Self::Warm),
            "COLD" => Some(Self::Cold),
            _ => None,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hot => "HOT",
            Self::Warm => "WARM",
            Self::Cold => "COLD",
        }
    }

    /// Whether leads of this tier get an automated follow-up.
    #[must_use]
    pub const fn is_follow_up_worthy(&self) -> bool {
        matches!(self, Self::Hot | Self::Warm)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score a lead.
///
/// Pure and total: the same inputs always give the same tier.
#[must_use]
pub fn score_lead(service: Option<&str>, budget: Option<&str>, message: &str) -> Priority {
    let budget = budget.map_or(0, max_budget);
    let service = service.map(str::to_lowercase).unwrap_or_default();

    if budget >= HOT_BUDGET {
        return Priority::Hot;
    }
    if service.contains("full service") {
        return Priority::Hot;
    }
    if message.chars().count() > LONG_MESSAGE_CHARS {
        return Priority::Hot;
    }
    if budget >= WARM_BUDGET {
        return Priority::Warm;
    }
    if WARM_SERVICES.iter().any(|s| service.contains(s)) {
        return Priority::Warm;
    }
    Priority::Cold
}

/// Largest number mentioned in a budget string.
///
/// A comma between two digits is a thousands separator, so
/// `"$750,000 - $1,000,000"` yields `1_000_000`. Only `,` is a separator:
/// `"1.500.000"` and `"1 500 000"` read as separate numbers. Returns 0 when the string
/// has no digits. Values too large for `u64` saturate.
#[must_use]
pub fn max_budget(budget: &str) -> u64 {
    let chars: Vec<char> = budget.chars().collect();
    let mut max = 0;
    let mut current: Option<u64> = None;

    for (i, &c) in chars.iter().enumerate() {
        if let Some(digit) = c.to_digit(10) {
            let value = current.unwrap_or(0);
            current = Some(
                value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(u64::from(digit)))
                    .unwrap_or(u64::MAX),
            );
            continue;
        }

        let separator = c == ','
            && current.is_some()
            && chars.get(i + 1).is_some_and(char::is_ascii_digit);
        if separator {
            continue;
        }

        if let Some(value) = current.take() {
            max = max.max(value);
        }
    }

    current.map_or(max, |value| max.max(value))
}

/// Whether a service label is one the enquiry form offers.
#[must_use]
pub fn is_known_service(service: &str) -> bool {
    SERVICE_LABELS
        .iter()
        .any(|label| label.eq_ignore_ascii_case(service.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_priority_roundtrip() {
        for priority in [Priority::Hot, Priority::Warm, Priority::Cold] {
            assert_eq!(Priority::parse(priority.as_str()), priority);
        }
        assert_eq!(Priority::parse("warm"), Priority::Warm);
        assert_eq!(Priority::parse("lukewarm"), Priority::Cold);
        assert_eq!(Priority::try_parse("lukewarm"), None);
    }

    #[test]
    fn test_max_budget() {
        assert_eq!(max_budget("$750,000 - $1,000,000"), 1_000_000);
        assert_eq!(max_budget("$1,500,000+"), 1_500_000);
        assert_eq!(max_budget("Under $500k"), 500);
        assert_eq!(max_budget("1,2,3"), 123);
        assert_eq!(max_budget("600000, 700000"), 700_000);
        assert_eq!(max_budget("not sure"), 0);
        assert_eq!(max_budget(""), 0);
    }

    #[test]
    fn test_only_comma_separates_thousands() {
        assert_eq!(max_budget("1.500.000"), 500);
        assert_eq!(max_budget("1 500 000"), 500);
        assert_eq!(score_lead(None, Some("1.500.000"), "short"), Priority::Cold);
    }

    #[test]
    fn test_max_budget_saturates() {
        assert_eq!(max_budget("99999999999999999999999999"), u64::MAX);
    }

    #[test]
    fn test_full_service_is_hot() {
        assert_eq!(score_lead(Some("Full Service"), None, "short"), Priority::Hot);
        assert_eq!(
            score_lead(Some("Full Service Buyers Agency"), None, "short"),
            Priority::Hot
        );
    }

    #[test]
    fn test_budget_boundaries() {
        assert_eq!(score_lead(None, Some("$1,500,000+"), "short"), Priority::Hot);
        assert_eq!(score_lead(None, Some("$1,499,999"), "short"), Priority::Warm);
        assert_eq!(score_lead(None, Some("$750,000"), "short"), Priority::Warm);
        assert_eq!(score_lead(None, Some("$749,999"), "short"), Priority::Cold);
        assert_eq!(
            score_lead(None, Some("$750,000 - $1,000,000"), "short"),
            Priority::Warm
        );
    }

    #[test]
    fn test_message_length_boundary() {
        let long = "a".repeat(501);
        let limit = "a".repeat(500);
        assert_eq!(score_lead(None, None, &long), Priority::Hot);
        assert_eq!(score_lead(None, None, &limit), Priority::Cold);
    }

    #[test]
    fn test_message_length_counts_characters() {
        // 300 two-byte characters is 600 bytes but only 300 characters.
        let message = "é".repeat(300);
        assert_eq!(score_lead(None, None, &message), Priority::Cold);
    }

    #[test]
    fn test_warm_services() {
        for service in [
            "Negotiation Only",
            "Auction Bidding",
            "Property Investment Strategy",
            "NDIS Property Investment",
        ] {
            assert_eq!(score_lead(Some(service), None, "short"), Priority::Warm);
        }
    }

    #[test]
    fn test_earlier_rules_take_precedence() {
        // Budget HOT beats a WARM service.
        assert_eq!(
            score_lead(Some("Auction Bidding"), Some("$2,000,000"), "short"),
            Priority::Hot
        );
        // A long message beats a WARM budget.
        assert_eq!(
            score_lead(None, Some("$800,000"), &"x".repeat(600)),
            Priority::Hot
        );
    }

    #[test]
    fn test_message_keywords_are_ignored() {
        assert_eq!(
            score_lead(None, None, "I need full service help at auction"),
            Priority::Cold
        );
    }

    #[test]
    fn test_known_services() {
        assert!(is_known_service("auction bidding"));
        assert!(!is_known_service("Lawn mowing"));
    }

    proptest! {
        #[test]
        fn prop_digitless_budget_never_elevates(budget in "[^0-9]{0,40}") {
            prop_assert_eq!(score_lead(None, Some(&budget), "short"), Priority::Cold);
        }

        #[test]
        fn prop_scoring_is_deterministic(
            service in proptest::option::of(".{0,30}"),
            budget in proptest::option::of(".{0,30}"),
            message in ".{0,600}",
        ) {
            let first = score_lead(service.as_deref(), budget.as_deref(), &message);
            let second = score_lead(service.as_deref(), budget.as_deref(), &message);
            prop_assert_eq!(first, second);
        }
    }
}
