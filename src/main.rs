//! Synthetic Perpetuals Venue Simulation.
//!
//! Walks the full market lifecycle: deployment through the factory, position
//! builds against feed-derived quotes, funding decay, liquidation, the
//! circuit breaker, and shutdown.

use ovm_core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const GOV: AccountId = AccountId(1);
const FEES: AccountId = AccountId(2);
const ALICE: AccountId = AccountId(10);
const BOB: AccountId = AccountId(11);
const KEEPER: AccountId = AccountId(12);

fn main() {
    println!("Synthetic Perpetuals Venue Simulation");
    println!("Single Token, Factory-Deployed Markets, Full Lifecycle\n");

    scenario_1_build_and_unwind();
    scenario_2_pnl_and_supply();
    scenario_3_funding_decay();
    scenario_4_liquidation();
    scenario_5_circuit_breaker();
    scenario_6_shutdown();

    println!("\nAll simulations completed successfully.");
}

/// Deploy a market and seed two traders. Feed starts at `price`.
fn deploy(price: Decimal) -> (Factory<MockFeed>, MarketId) {
    let mut factory = Factory::new(GOV, FEES);
    factory.approve_feed_factory(GOV, FeedFactoryId(1)).unwrap();

    let mut feed = MockFeed::new(price);
    feed.set_timestamp(Timestamp::from_secs(1_000));
    let id = factory
        .deploy_market(GOV, feed, RiskParams::default())
        .unwrap();
    factory
        .market_mut(id)
        .unwrap()
        .set_time(Timestamp::from_secs(1_000));

    factory.token_mut().credit(ALICE, dec!(100_000));
    factory.token_mut().credit(BOB, dec!(100_000));
    (factory, id)
}

fn build(
    factory: &mut Factory<MockFeed>,
    id: MarketId,
    owner: AccountId,
    collateral: Decimal,
    leverage: Decimal,
    is_long: bool,
) -> BuildResult {
    let (market, token) = factory.market_and_token_mut(id).unwrap();
    market
        .build(
            token,
            owner,
            collateral,
            leverage,
            is_long,
            if is_long { dec!(1_000_000_000) } else { Decimal::ZERO },
        )
        .unwrap()
}

/// Basic build and unwind round trip.
fn scenario_1_build_and_unwind() {
    println!("Scenario 1: Build and Unwind\n");

    let (mut factory, id) = deploy(dec!(100));
    println!("  Market deployed at feed price $100");
    println!("  Alice builds 2x long with 500 collateral...");

    let built = build(&mut factory, id, ALICE, dec!(500), dec!(2), true);
    println!(
        "  Entry: ${:.4}, oi: {:.4}, debt: {}, fee: {}",
        built.price, built.oi, built.debt, built.trading_fee
    );

    let (market, token) = factory.market_and_token_mut(id).unwrap();
    let unwound = market
        .unwind(token, ALICE, built.position_id, Decimal::ONE, Decimal::ZERO)
        .unwrap();

    println!(
        "  Unwound at ${:.4}: value {:.4}, cost {}, mint {:.4}",
        unwound.price, unwound.value, unwound.cost, unwound.mint
    );
    println!("  Alice balance: {:.4}\n", factory.token().balance_of(ALICE));
}

/// Price moves settle as token supply changes.
fn scenario_2_pnl_and_supply() {
    println!("Scenario 2: PnL and Token Supply\n");

    let (mut factory, id) = deploy(dec!(100));
    let built = build(&mut factory, id, ALICE, dec!(500), dec!(2), true);
    println!("  Alice long at ${:.4}", built.price);
    println!("  Supply before move: {:.4}", factory.token().total_supply());

    let market = factory.market_mut(id).unwrap();
    market.feed_mut().set_price(dec!(115));
    market.feed_mut().settle_history();
    println!("  Feed rises to $115");

    let (market, token) = factory.market_and_token_mut(id).unwrap();
    let unwound = market
        .unwind(token, ALICE, built.position_id, Decimal::ONE, Decimal::ZERO)
        .unwrap();

    println!(
        "  Unwound: value {:.4} vs cost {}, minted {:.4}",
        unwound.value, unwound.cost, unwound.value - unwound.cost
    );
    println!("  Supply after: {:.4}\n", factory.token().total_supply());
}

/// Imbalanced open interest decays toward equilibrium.
fn scenario_3_funding_decay() {
    println!("Scenario 3: Funding Decay\n");

    let (mut factory, id) = deploy(dec!(100));
    build(&mut factory, id, ALICE, dec!(3_000), dec!(2), true);
    build(&mut factory, id, BOB, dec!(1_000), dec!(2), false);

    let market = factory.market(id).unwrap();
    println!(
        "  OI after builds: {:.4} long, {:.4} short",
        market.oi(Side::Long),
        market.oi(Side::Short)
    );

    let market = factory.market_mut(id).unwrap();
    market.advance_time(7 * 86_400);
    market.update().unwrap();

    println!(
        "  One week later:  {:.4} long, {:.4} short",
        market.oi(Side::Long),
        market.oi(Side::Short)
    );
    println!("  Events: {}\n", market.events().len());
}

/// A crash leaves a long under maintenance; a keeper takes it out.
fn scenario_4_liquidation() {
    println!("Scenario 4: Liquidation\n");

    let (mut factory, id) = deploy(dec!(100));
    let built = build(&mut factory, id, ALICE, dec!(500), dec!(5), true);
    println!("  Alice 5x long at ${:.4}", built.price);

    let market = factory.market_mut(id).unwrap();
    market.feed_mut().set_price(dec!(81));
    market.feed_mut().settle_history();
    println!("  Feed crashes to $81");

    let liquidatable = market.liquidatable_positions().unwrap();
    println!("  Liquidatable positions: {}", liquidatable.len());

    let (market, token) = factory.market_and_token_mut(id).unwrap();
    let res = market
        .liquidate(token, KEEPER, ALICE, built.position_id)
        .unwrap();

    println!(
        "  Liquidated at ${:.4}: value {:.4}, keeper fee {:.4}, burned {:.4}",
        res.price, res.value, res.liquidation_fee, res.margin_burned
    );
    println!("  Keeper balance: {:.4}\n", factory.token().balance_of(KEEPER));
}

/// Heavy minting trips the circuit breaker and throttles new builds.
fn scenario_5_circuit_breaker() {
    println!("Scenario 5: Circuit Breaker\n");

    let (mut factory, id) = deploy(dec!(100));
    factory
        .set_risk_param(GOV, id, RiskParamKind::CircuitBreakerMintTarget, dec!(100))
        .unwrap();

    let built = build(&mut factory, id, ALICE, dec!(5_000), dec!(2), true);
    let market = factory.market_mut(id).unwrap();
    market.feed_mut().set_price(dec!(150));
    market.feed_mut().settle_history();
    println!("  Alice doubles up as the feed jumps to $150");

    let (market, token) = factory.market_and_token_mut(id).unwrap();
    let unwound = market
        .unwind(token, ALICE, built.position_id, Decimal::ONE, Decimal::ZERO)
        .unwrap();

    println!("  Unwind minted {:.4} against a target of 100", unwound.mint);

    let blocked = market.build(token, BOB, dec!(500), dec!(2), true, dec!(1_000_000));

    match blocked {
        Err(EngineError::OiAboveCap { oi, cap }) => {
            println!("  Bob's build rejected: oi {:.4} above throttled cap {:.4}\n", oi, cap)
        }
        other => println!("  Unexpected: {:?}\n", other),
    }
}

/// Shutdown blocks builds but never exits.
fn scenario_6_shutdown() {
    println!("Scenario 6: Shutdown\n");

    let (mut factory, id) = deploy(dec!(100));
    let built = build(&mut factory, id, ALICE, dec!(500), dec!(2), true);

    factory.shutdown_market(GOV, id).unwrap();
    println!("  Governor shuts the market down");

    let (market, token) = factory.market_and_token_mut(id).unwrap();

    let blocked = market.build(token, BOB, dec!(500), dec!(2), true, dec!(1_000_000));
    println!("  Bob's build: {:?}", blocked.err());

    let unwound = market
        .unwind(token, ALICE, built.position_id, Decimal::ONE, Decimal::ZERO)
        .unwrap();

    println!(
        "  Alice still exits: value {:.4}, closed: {}\n",
        unwound.value, unwound.closed
    );
}
