//! Property-based tests for stress testing core math.
//!
//! These tests verify invariants hold under random inputs.

use ovm_core::fixed_point::{exp_down, exp_up, pow_down, pow_up, sub_floor};
use ovm_core::roller::Snapshot;
use ovm_core::tick::{price_to_tick, tick_to_price};
use ovm_core::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// Strategies for generating test data
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|x| Decimal::new(x, 4)) // $0.0001 to $100,000
}

fn volume_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|x| Decimal::new(x, 4)) // 0 to 1.0 of cap
}

fn small_exponent_strategy() -> impl Strategy<Value = Decimal> {
    (-50_000i64..=50_000i64).prop_map(|x| Decimal::new(x, 3)) // -50 to 50
}

fn market_at(price: Decimal) -> Market<MockFeed> {
    let mut feed = MockFeed::new(price);
    feed.set_timestamp(Timestamp::from_secs(1_000));
    let mut market = Market::new(
        MarketId(1),
        feed,
        RiskParams::default(),
        AccountId(u64::MAX),
        AccountId(2),
        EngineConfig::default(),
    );
    market.set_time(Timestamp::from_secs(1_000));
    market
}

proptest! {
    /// Tick round trip loses at most one basis point.
    #[test]
    fn tick_round_trip_within_one_bp(price in price_strategy()) {
        let tick = price_to_tick(price).unwrap();
        let back = tick_to_price(tick).unwrap();

        prop_assert!(back <= price, "tick floor must not exceed price");
        prop_assert!(
            back * dec!(1.0001) >= price,
            "round trip lost more than 1bp: {} -> {}", price, back
        );
    }

    /// Quantized prices are monotone in the original price.
    #[test]
    fn tick_is_monotone(a in price_strategy(), b in price_strategy()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(price_to_tick(lo).unwrap() <= price_to_tick(hi).unwrap());
    }

    /// Directional rounding brackets the true exponential.
    #[test]
    fn exp_bounds_bracket(x in small_exponent_strategy()) {
        let down = exp_down(x).unwrap();
        let up = exp_up(x).unwrap();
        prop_assert!(down <= up);
        prop_assert!(down >= Decimal::ZERO);
    }

    /// pow rounding never crosses: down <= up.
    #[test]
    fn pow_bounds_bracket(
        base in (100i64..10_000i64).prop_map(|x| Decimal::new(x, 3)),
        exponent in (-20_000i64..=20_000i64).prop_map(|x| Decimal::new(x, 3)),
    ) {
        let down = pow_down(base, exponent).unwrap();
        let up = pow_up(base, exponent).unwrap();
        prop_assert!(down <= up);
    }

    /// sub_floor never goes negative and matches subtraction when safe.
    #[test]
    fn sub_floor_properties(
        a in (0i64..1_000_000i64).prop_map(|x| Decimal::new(x, 2)),
        b in (0i64..1_000_000i64).prop_map(|x| Decimal::new(x, 2)),
    ) {
        let out = sub_floor(a, b);
        prop_assert!(out >= Decimal::ZERO);
        if a >= b {
            prop_assert_eq!(out, a - b);
        } else {
            prop_assert_eq!(out, Decimal::ZERO);
        }
    }

    /// Ask is increasing and bid decreasing in registered volume, and the
    /// spread always brackets the feed.
    #[test]
    fn quotes_bracket_and_widen(
        price in (100i64..10_000_000i64).prop_map(|x| Decimal::new(x, 2)),
        vol_lo in volume_strategy(),
        vol_hi in volume_strategy(),
    ) {
        let market = market_at(price);
        let data = market.feed().latest();
        let (lo, hi) = if vol_lo <= vol_hi { (vol_lo, vol_hi) } else { (vol_hi, vol_lo) };

        let bid_lo = market.bid(&data, lo).unwrap();
        let bid_hi = market.bid(&data, hi).unwrap();
        let ask_lo = market.ask(&data, lo).unwrap();
        let ask_hi = market.ask(&data, hi).unwrap();

        prop_assert!(ask_lo <= ask_hi, "ask must widen with volume");
        prop_assert!(bid_lo >= bid_hi, "bid must widen with volume");
        prop_assert!(bid_lo < price && price < ask_lo, "spread must bracket the feed");
    }

    /// The zero-volume quote is independent of lambda.
    #[test]
    fn zero_volume_quote_ignores_lambda(
        price in (100i64..10_000_000i64).prop_map(|x| Decimal::new(x, 2)),
        lambda in (0i64..=5_000i64).prop_map(|x| Decimal::new(x, 3)),
    ) {
        let mut a = market_at(price);
        let mut b = market_at(price);
        a.set_risk_param(RiskParamKind::Lambda, Decimal::ZERO).unwrap();
        b.set_risk_param(RiskParamKind::Lambda, lambda).unwrap();
        let data = a.feed().latest();

        prop_assert_eq!(a.bid(&data, Decimal::ZERO).unwrap(), b.bid(&data, Decimal::ZERO).unwrap());
        prop_assert_eq!(a.ask(&data, Decimal::ZERO).unwrap(), b.ask(&data, Decimal::ZERO).unwrap());
    }

    /// A roller never reports more than the sum of magnitudes it was fed.
    #[test]
    fn roller_never_exceeds_contributions(
        contributions in proptest::collection::vec((1u32..10_000u32, 1i64..1_000i64), 1..20),
        window in 60u32..10_000u32,
    ) {
        let mut snapshot = Snapshot::cold();
        let mut now = Timestamp::from_secs(1_000);
        let mut fed = Decimal::ZERO;

        for (gap, value) in contributions {
            now = Timestamp::from_secs(now.as_secs() + gap);
            let value = Decimal::from(value);
            snapshot = snapshot.transform(now, Decimal::from(window), value);
            fed += value;
            prop_assert!(snapshot.cumulative() <= fed);
            prop_assert!(snapshot.cumulative() >= Decimal::ZERO);
        }
    }

    /// Decay is monotone: folding in zero later never raises the value.
    #[test]
    fn roller_decay_is_monotone(
        value in 1i64..1_000_000i64,
        window in 60u32..10_000u32,
        gap_a in 0u32..10_000u32,
        gap_b in 0u32..10_000u32,
    ) {
        let start = Timestamp::from_secs(1_000);
        let snapshot = Snapshot::cold().transform(start, Decimal::from(window), Decimal::from(value));
        let (lo, hi) = if gap_a <= gap_b { (gap_a, gap_b) } else { (gap_b, gap_a) };

        let early = snapshot
            .transform(Timestamp::from_secs(1_000 + lo), Decimal::from(window), Decimal::ZERO)
            .cumulative();
        let late = snapshot
            .transform(Timestamp::from_secs(1_000 + hi), Decimal::from(window), Decimal::ZERO)
            .cumulative();
        prop_assert!(late <= early);
    }

    /// Funding conserves sign ordering and never grows total OI.
    #[test]
    fn funding_contracts_the_market(
        over_raw in 1i64..1_000_000i64,
        under_raw in 0i64..1_000_000i64,
        elapsed in 1u32..31_536_000u32,
    ) {
        let over = Decimal::new(over_raw.max(under_raw), 2);
        let under = Decimal::new(over_raw.min(under_raw), 2);
        let k = dec!(0.0000012);

        let (over_now, under_now) =
            ovm_core::engine::oi_after_funding(over, under, Decimal::from(elapsed), k).unwrap();

        prop_assert!(over_now >= under_now, "sides must not cross equilibrium");
        prop_assert!(over_now <= over + dec!(0.0000001), "overweight side never gains");
        prop_assert!(under_now >= Decimal::ZERO);
        prop_assert!(
            over_now + under_now <= over + under + dec!(0.0000001),
            "funding must not grow total OI"
        );
    }

    /// The leverage guard accepts exactly the caps under its closed form.
    #[test]
    fn leverage_guard_matches_closed_form(
        delta in (0i64..=20_000i64).prop_map(|x| Decimal::new(x, 6)),
        mmf in (1_000i64..=200_000i64).prop_map(|x| Decimal::new(x, 6)),
        cap_leverage in (1_000i64..=20_000i64).prop_map(|x| Decimal::new(x, 3)),
    ) {
        let mut params = RiskParams::default();
        params.delta = delta;
        params.maintenance_margin_fraction = mmf;
        params.cap_leverage = cap_leverage;

        let denom = dec!(2) * delta + mmf / (Decimal::ONE - params.liquidation_fee_rate);
        let expected = cap_leverage <= Decimal::ONE / denom;
        prop_assert_eq!(params.max_leverage_is_safe(), expected);
    }
}
