//! Loyalty points and tier math
//!
//! Points are earned at 10 per currency unit of a confirmed bill. Tiers are
//! fixed bands over the cumulative point total and are always recomputed
//! from that total — never incrementally tracked — so manual adjustments to
//! a user's balance can't leave the tier stale.

use serde::{Deserialize, Serialize};

/// Minimum cumulative points for each tier above `member`
pub const HERO_MIN: i64 = 10;
pub const CHAMPION_MIN: i64 = 1_200;
pub const LEGEND_MIN: i64 = 10_000;

/// Points earned for a confirmed bill: `floor(bill × 10)`
pub fn points_for_bill(bill: f64) -> i64 {
    if bill <= 0.0 {
        return 0;
    }
    (bill * 10.0).floor() as i64
}

/// Loyalty tier, ordered lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoyaltyTier {
    Member,
    Hero,
    Champion,
    Legend,
}

impl LoyaltyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoyaltyTier::Member => "member",
            LoyaltyTier::Hero => "hero",
            LoyaltyTier::Champion => "champion",
            LoyaltyTier::Legend => "legend",
        }
    }
}

impl std::fmt::Display for LoyaltyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tier for a cumulative point total
pub fn tier_for_points(points: i64) -> LoyaltyTier {
    if points >= LEGEND_MIN {
        LoyaltyTier::Legend
    } else if points >= CHAMPION_MIN {
        LoyaltyTier::Champion
    } else if points >= HERO_MIN {
        LoyaltyTier::Hero
    } else {
        LoyaltyTier::Member
    }
}

/// Result of a successful bill confirmation, returned to the consumer app
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillReceipt {
    pub redemption_token_id: i64,
    pub points_earned: i64,
    pub new_points_total: i64,
    pub previous_tier: LoyaltyTier,
    pub new_tier: LoyaltyTier,
    pub tier_changed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_formula_floors_tenths() {
        assert_eq!(points_for_bill(10.00), 100);
        assert_eq!(points_for_bill(10.04), 100);
        assert_eq!(points_for_bill(10.05), 100);
        assert_eq!(points_for_bill(0.09), 0);
    }

    #[test]
    fn points_for_non_positive_bills() {
        assert_eq!(points_for_bill(0.0), 0);
        assert_eq!(points_for_bill(-5.0), 0);
    }

    #[test]
    fn tier_band_boundaries() {
        assert_eq!(tier_for_points(0), LoyaltyTier::Member);
        assert_eq!(tier_for_points(9), LoyaltyTier::Member);
        assert_eq!(tier_for_points(10), LoyaltyTier::Hero);
        assert_eq!(tier_for_points(1_199), LoyaltyTier::Hero);
        assert_eq!(tier_for_points(1_200), LoyaltyTier::Champion);
        assert_eq!(tier_for_points(9_999), LoyaltyTier::Champion);
        assert_eq!(tier_for_points(10_000), LoyaltyTier::Legend);
    }

    #[test]
    fn tier_is_monotonic_in_points() {
        let mut last = tier_for_points(0);
        for points in 0..12_000 {
            let tier = tier_for_points(points);
            assert!(tier >= last, "tier regressed at {points} points");
            last = tier;
        }
    }
}
