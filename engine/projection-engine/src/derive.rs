//! Efficiency fields derived from volume fields

use crate::projection::StatLine;
use crate::stats::StatType;

/// `rate = numerator / denominator`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedRule {
    pub rate: StatType,
    pub numerator: StatType,
    pub denominator: StatType,
}

const fn rule(rate: StatType, numerator: StatType, denominator: StatType) -> DerivedRule {
    DerivedRule { rate, numerator, denominator }
}

pub static DERIVED_RULES: [DerivedRule; 8] = [
    rule(StatType::CompPct, StatType::Completions, StatType::PassAttempts),
    rule(StatType::YardsPerAtt, StatType::PassYards, StatType::PassAttempts),
    rule(StatType::PassTdRate, StatType::PassTd, StatType::PassAttempts),
    rule(StatType::IntRate, StatType::Interceptions, StatType::PassAttempts),
    rule(StatType::YardsPerCarry, StatType::RushYards, StatType::RushAttempts),
    rule(StatType::CatchPct, StatType::Receptions, StatType::Targets),
    rule(StatType::YardsPerTarget, StatType::RecYards, StatType::Targets),
    rule(StatType::YardsPerReception, StatType::RecYards, StatType::Receptions),
];

/// Ratio of two optional values; unset unless the denominator is positive
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0.0 => Some(n / d),
        _ => None,
    }
}

impl DerivedRule {
    /// Whether a line's layout carries all three fields of this rule
    pub fn applies_to(&self, line: &StatLine) -> bool {
        line.carries(self.rate) && line.carries(self.numerator) && line.carries(self.denominator)
    }

    /// Value the rate field should hold given the line's current volumes
    pub fn expected(&self, line: &StatLine) -> Option<f64> {
        ratio(line.get(self.numerator), line.get(self.denominator))
    }
}

/// Whether `stat` is computed from other fields rather than counted
pub fn is_derived(stat: StatType) -> bool {
    DERIVED_RULES.iter().any(|r| r.rate == stat)
}

/// Rules whose fields exist in `line`'s layout
pub fn rules_for(line: &StatLine) -> impl Iterator<Item = &'static DerivedRule> + '_ {
    DERIVED_RULES.iter().filter(move |r| r.applies_to(line))
}

/// Recompute every efficiency field from the current volume fields
pub fn derive_efficiency(line: &mut StatLine) {
    for rule in DERIVED_RULES.iter() {
        if !rule.applies_to(line) {
            continue;
        }
        let value = rule.expected(line);
        line.set(rule.rate, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Position;
    use proptest::prelude::*;

    #[test]
    fn test_ratio_guards_denominator() {
        assert_eq!(ratio(Some(10.0), Some(4.0)), Some(2.5));
        assert_eq!(ratio(Some(10.0), Some(0.0)), None);
        assert_eq!(ratio(Some(10.0), None), None);
        assert_eq!(ratio(None, Some(4.0)), None);
    }

    #[test]
    fn test_qb_efficiency() {
        let mut line = StatLine::for_position(Position::QB);
        line.set(StatType::PassAttempts, Some(580.0));
        line.set(StatType::Completions, Some(380.0));
        line.set(StatType::PassYards, Some(4100.0));
        line.set(StatType::PassTd, Some(28.0));
        line.set(StatType::Interceptions, Some(10.0));
        line.set(StatType::RushAttempts, Some(0.0));
        line.set(StatType::RushYards, Some(0.0));

        derive_efficiency(&mut line);

        assert!((line.get(StatType::CompPct).unwrap() - 380.0 / 580.0).abs() < 1e-12);
        assert!((line.get(StatType::YardsPerAtt).unwrap() - 4100.0 / 580.0).abs() < 1e-12);
        assert!((line.get(StatType::IntRate).unwrap() - 10.0 / 580.0).abs() < 1e-12);
        // zero rushing attempts leaves yards per carry unset
        assert_eq!(line.get(StatType::YardsPerCarry), None);
    }

    #[test]
    fn test_skill_rules_skip_passing() {
        let line = StatLine::for_position(Position::WR);
        let rates: Vec<StatType> = rules_for(&line).map(|r| r.rate).collect();
        assert!(!rates.contains(&StatType::CompPct));
        assert!(rates.contains(&StatType::CatchPct));
        assert!(rates.contains(&StatType::YardsPerReception));
    }

    #[test]
    fn test_stale_rate_is_cleared() {
        let mut line = StatLine::for_position(Position::RB);
        line.set(StatType::CatchPct, Some(0.9));
        line.set(StatType::Targets, Some(0.0));
        line.set(StatType::Receptions, Some(0.0));
        derive_efficiency(&mut line);
        assert_eq!(line.get(StatType::CatchPct), None);
    }

    proptest! {
        #[test]
        fn prop_derived_fields_match_ratios(
            targets in 1.0f64..200.0,
            catch in 0.0f64..1.0,
            ypr in 0.0f64..25.0,
            carries in 0.0f64..350.0,
            ypc in 0.0f64..7.0,
        ) {
            let receptions = targets * catch;
            let mut line = StatLine::for_position(Position::RB);
            line.set(StatType::Targets, Some(targets));
            line.set(StatType::Receptions, Some(receptions));
            line.set(StatType::RecYards, Some(receptions * ypr));
            line.set(StatType::RushAttempts, Some(carries));
            line.set(StatType::RushYards, Some(carries * ypc));

            derive_efficiency(&mut line);

            for rule in rules_for(&line) {
                match (line.get(rule.rate), rule.expected(&line)) {
                    (Some(stored), Some(expected)) => prop_assert!((stored - expected).abs() < 1e-6),
                    (None, None) => {}
                    (stored, expected) => prop_assert!(false, "{}: {:?} vs {:?}", rule.rate, stored, expected),
                }
            }
        }
    }
}
