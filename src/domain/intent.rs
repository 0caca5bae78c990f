//! Trade Decision Engine
//!
//! Turns a wallet's current balances into one of buy / sell-all /
//! sell-partial / hold. Stateless: the same snapshot and the same random
//! draw always produce the same intent.

use alloy::primitives::U256;
use rand::Rng;
use rust_decimal::Decimal;
use std::fmt;

use super::balance::WalletBalanceSnapshot;
use super::units::{format_units, random_wei, UnitsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeKind {
    Buy,
    SellAll,
    SellPartial,
    Hold,
}

impl TradeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeKind::Buy => "buy",
            TradeKind::SellAll => "sell-all",
            TradeKind::SellPartial => "sell-partial",
            TradeKind::Hold => "hold",
        }
    }
}

/// What to do with the active wallet this round.
///
/// `amount` is native wei to spend for `Buy`, token units to sell for the
/// sell kinds, and the drawn keep amount for `Hold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeIntent {
    pub kind: TradeKind,
    pub amount: U256,
}

impl TradeIntent {
    pub fn buy(amount: U256) -> Self {
        Self { kind: TradeKind::Buy, amount }
    }

    pub fn sell_all(amount: U256) -> Self {
        Self { kind: TradeKind::SellAll, amount }
    }

    pub fn sell_partial(amount: U256) -> Self {
        Self { kind: TradeKind::SellPartial, amount }
    }

    pub fn hold(keep: U256) -> Self {
        Self { kind: TradeKind::Hold, amount: keep }
    }

    /// Every trading intent is preceded by a funding attempt; holds are not
    pub fn requires_funding(&self) -> bool {
        !matches!(self.kind, TradeKind::Hold)
    }

    pub fn is_sell(&self) -> bool {
        matches!(self.kind, TradeKind::SellAll | TradeKind::SellPartial)
    }
}

impl fmt::Display for TradeIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.as_str(), format_units(self.amount))
    }
}

/// Configured sizing bounds, in human units
#[derive(Debug, Clone, PartialEq)]
pub struct TradeBounds {
    /// Below this token balance the wallet buys instead of selling
    pub min_token_balance: U256,
    /// Native amount to spend on a buy
    pub amount_range: (Decimal, Decimal),
    /// Token amount to keep when selling
    pub balance_range: (Decimal, Decimal),
}

/// Decide the next trade for a wallet.
pub fn decide<R: Rng>(
    snapshot: &WalletBalanceSnapshot,
    bounds: &TradeBounds,
    rng: &mut R,
) -> Result<TradeIntent, UnitsError> {
    if snapshot.token.is_zero() || snapshot.token < bounds.min_token_balance {
        let (lo, hi) = bounds.amount_range;
        return Ok(TradeIntent::buy(random_wei(lo, hi, rng)?));
    }

    let (lo, hi) = bounds.balance_range;
    let keep = random_wei(lo, hi, rng)?;

    let intent = if keep > snapshot.token {
        TradeIntent::hold(keep)
    } else if keep.is_zero() {
        TradeIntent::sell_all(snapshot.token)
    } else {
        TradeIntent::sell_partial(snapshot.token - keep)
    };
    Ok(intent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::units::to_wei;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    fn bounds() -> TradeBounds {
        TradeBounds {
            min_token_balance: to_wei(dec!(100)).unwrap(),
            amount_range: (dec!(0.001), dec!(0.005)),
            balance_range: (dec!(10), dec!(50)),
        }
    }

    fn ether(d: Decimal) -> U256 {
        to_wei(d).unwrap()
    }

    #[test]
    fn test_zero_token_always_buys() {
        let mut rng = StdRng::seed_from_u64(7);
        let snapshot = WalletBalanceSnapshot::new(ether(dec!(1)), U256::ZERO);
        for _ in 0..100 {
            let intent = decide(&snapshot, &bounds(), &mut rng).unwrap();
            assert_eq!(intent.kind, TradeKind::Buy);
            assert!(intent.amount >= ether(dec!(0.001)));
            assert!(intent.amount <= ether(dec!(0.005)));
        }
    }

    #[test]
    fn test_below_min_token_buys() {
        let mut rng = StdRng::seed_from_u64(7);
        let snapshot = WalletBalanceSnapshot::new(ether(dec!(1)), ether(dec!(99.9)));
        let intent = decide(&snapshot, &bounds(), &mut rng).unwrap();
        assert_eq!(intent.kind, TradeKind::Buy);
    }

    #[test]
    fn test_zero_keep_sells_everything() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut b = bounds();
        b.balance_range = (Decimal::ZERO, Decimal::ZERO);
        let token = ether(dec!(250));
        let snapshot = WalletBalanceSnapshot::new(ether(dec!(1)), token);

        let intent = decide(&snapshot, &b, &mut rng).unwrap();
        assert_eq!(intent, TradeIntent::sell_all(token));
    }

    #[test]
    fn test_keep_above_balance_holds() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut b = bounds();
        b.balance_range = (dec!(1000), dec!(2000));
        let snapshot = WalletBalanceSnapshot::new(ether(dec!(1)), ether(dec!(150)));

        let intent = decide(&snapshot, &b, &mut rng).unwrap();
        assert_eq!(intent.kind, TradeKind::Hold);
        assert!(!intent.requires_funding());
    }

    #[test]
    fn test_partial_sell_keeps_drawn_amount() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut b = bounds();
        b.balance_range = (dec!(40), dec!(40));
        let token = ether(dec!(150));
        let snapshot = WalletBalanceSnapshot::new(ether(dec!(1)), token);

        let intent = decide(&snapshot, &b, &mut rng).unwrap();
        assert_eq!(intent, TradeIntent::sell_partial(ether(dec!(110))));
        assert!(intent.is_sell());
        assert!(intent.requires_funding());
    }

    #[test]
    fn test_keep_equal_to_balance_sells_nothing_but_is_partial() {
        // keep == balance is not "greater than", so it is a zero-sized partial sell
        let mut rng = StdRng::seed_from_u64(7);
        let mut b = bounds();
        b.balance_range = (dec!(150), dec!(150));
        let snapshot = WalletBalanceSnapshot::new(ether(dec!(1)), ether(dec!(150)));

        let intent = decide(&snapshot, &b, &mut rng).unwrap();
        assert_eq!(intent, TradeIntent::sell_partial(U256::ZERO));
    }
}
