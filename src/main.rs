//! Perpetual futures paper trading simulation.
//!
//! Replays scripted BTC/USDT feed messages through the adapters and walks the
//! dashboard through its whole lifecycle: price ticks, candles, opening and
//! closing positions, rejected actions, history clearing and reset.
//!
//! With the `live` feature, `perps-paper --live` streams the real Binance feed instead.

use perps_paper::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type AppResult = Result<(), Box<dyn std::error::Error>>;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> AppResult {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = DashboardConfig::from_env()?;

    if std::env::args().any(|arg| arg == "--live") {
        return run_live(config);
    }

    println!("Perpetual Futures Paper Trading Simulation");
    println!("BTC/USDT, single position, virtual balance\n");

    scenario_1_feed_ingestion(&config)?;
    scenario_2_long_round_trip(&config)?;
    scenario_3_short_and_liquidation(&config)?;
    scenario_4_rejected_actions(&config)?;
    scenario_5_history_and_reset(&config)?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

fn ticker_json(close: &str, open: &str) -> String {
    format!(r#"{{"e":"24hrMiniTicker","E":1729333815000,"s":"BTCUSDT","c":"{close}","o":"{open}"}}"#)
}

fn kline_json(start_ms: i64, o: &str, h: &str, l: &str, c: &str) -> String {
    format!(r#"{{"e":"kline","s":"BTCUSDT","k":{{"t":{start_ms},"i":"1m","o":"{o}","h":"{h}","l":"{l}","c":"{c}"}}}}"#)
}

fn tick(engine: &mut Engine, price: Decimal) {
    engine.update_price(price, dec!(50000));
}

fn print_position(engine: &Engine) {
    let Some(pos) = engine.trading().position() else {
        println!("  No open position");
        return;
    };
    println!(
        "  {} {} @ {} ({}, notional {})",
        pos.side,
        format_usd(pos.size.value()),
        format_price(pos.entry_price.value(), 2),
        pos.leverage,
        format_usd(pos.notional().value())
    );
    if let Some(m) = engine.position_metrics() {
        println!(
            "    mark {} | pnl {} | roe {} | liq {} ({} away)",
            format_price(m.mark_price.value(), 2),
            format_usd(m.unrealized_pnl.value()),
            format_percentage(m.roe),
            format_price(m.liquidation_price, 2),
            format_percentage(m.liquidation_buffer_pct)
        );
    }
}

/// Raw feed messages through the adapters and the channel.
fn scenario_1_feed_ingestion(config: &DashboardConfig) -> AppResult {
    println!("Scenario 1: Feed Ingestion\n");

    let mut engine = Engine::new(config.clone());
    let ticker = MiniTickerAdapter::new(config.feed.mini_ticker_url.as_str());
    let kline = KlineAdapter::new(config.feed.kline_url.as_str());
    let (tx, mut rx) = feed_channel();

    forward(&kline, &kline_json(1_729_333_800_000, "66900", "67010", "66880", "66950"), &tx)?;
    forward(&kline, &kline_json(1_729_333_800_000, "66900", "67300", "66880", "67250.10"), &tx)?;
    forward(&kline, &kline_json(1_729_333_860_000, "67250.10", "67260", "67200", "67210"), &tx)?;
    forward(&ticker, &ticker_json("67250.10", "66000"), &tx)?;

    match forward(&ticker, r#"{"e":"24hrMiniTicker","c":"oops","o":"66000"}"#, &tx) {
        Ok(_) => println!("  Unexpectedly accepted a malformed tick"),
        Err(e) => println!("  Dropped malformed tick: {e}"),
    }

    let applied = engine.drain_feed(&mut rx);
    let price = engine.price();

    println!("  Applied {applied} feed events");
    println!(
        "  BTC {} | 24h {} ({})",
        format_price(price.current_price, 2),
        format_usd(price.price_change_24h),
        price.price_change_percent_24h.map(format_percentage).unwrap_or_else(|| "n/a".to_string())
    );
    println!("  Chart has {} candles", engine.candles().len());
    if let Some(last) = engine.candles().last() {
        println!(
            "  Last candle {} close {}\n",
            format_timestamp(Timestamp::from_secs(last.time)),
            format_price(last.close, 2)
        );
    }
    Ok(())
}

/// Default-size long at 5x, price rises 2%, close.
fn scenario_2_long_round_trip(config: &DashboardConfig) -> AppResult {
    println!("Scenario 2: Long Round Trip\n");

    let mut engine = Engine::new(config.clone());
    engine.set_time(Timestamp::from_millis(1_729_333_815_000));
    tick(&mut engine, dec!(50000));

    let size = engine.trading().default_position_size();
    let leverage = engine.trading().params().clamp_leverage(5);
    engine.open_market_position(Side::Long, size.value(), leverage.value())?;
    println!("  Opened with {}% of balance", config.trading.default_position_size_pct);
    print_position(&engine);

    engine.advance_time(754_000);
    tick(&mut engine, dec!(51000));
    println!("\n  Price rises to $51,000");
    print_position(&engine);

    let trade = engine.close_market_position()?;
    println!(
        "\n  Closed {} after {}: {} ({})",
        trade.id,
        format_duration(trade.duration_millis()),
        format_usd(trade.realized_pnl.value()),
        format_percentage(trade.pnl_percent)
    );
    println!("  Balance: {}\n", format_usd(engine.trading().balance().value()));
    Ok(())
}

/// Max leverage short, watch the liquidation buffer shrink.
fn scenario_3_short_and_liquidation(config: &DashboardConfig) -> AppResult {
    println!("Scenario 3: Short and Liquidation Estimate\n");

    let mut engine = Engine::new(config.clone());
    tick(&mut engine, dec!(50000));

    let max = config.trading.max_leverage.value();
    engine.open_market_position(Side::Short, dec!(5000), max)?;
    print_position(&engine);

    for price in [dec!(51000), dec!(53000), dec!(54500)] {
        tick(&mut engine, price);
        println!("\n  Price moves to {}", format_price(price, 2));
        print_position(&engine);
    }

    // the dashboard only estimates liquidation; nothing force-closes the position
    let trade = engine.close_market_position()?;
    println!("\n  Closed manually: {}\n", format_usd(trade.realized_pnl.value()));
    Ok(())
}

/// Every transition that must be refused, and proof the state did not move.
fn scenario_4_rejected_actions(config: &DashboardConfig) -> AppResult {
    println!("Scenario 4: Rejected Actions\n");

    let mut engine = Engine::new(config.clone());

    if let Err(e) = engine.open_market_position(Side::Long, dec!(1000), 2) {
        println!("  Open before first tick: {e}");
    }

    tick(&mut engine, dec!(50000));

    if let Err(e) = engine.close_market_position() {
        println!("  Close while flat: {e}");
    }

    let too_big = engine.trading().balance().value() + dec!(1);
    if let Err(e) = engine.open_market_position(Side::Long, too_big, 2) {
        println!("  Oversized open: {e}");
    }

    if let Err(e) = engine.open_market_position(Side::Long, dec!(1000), 50) {
        println!("  Leverage out of range: {e}");
    }

    engine.open_market_position(Side::Long, dec!(1000), 2)?;
    if let Err(e) = engine.open_market_position(Side::Short, dec!(1000), 2) {
        println!("  Second open: {e}");
    }

    let rejected = engine
        .events()
        .iter()
        .filter(|e| matches!(e.payload, EventPayload::TransitionRejected(_)))
        .count();
    println!("  {rejected} rejections logged, balance still {}\n", format_usd(engine.trading().balance().value()));
    Ok(())
}

/// A few trades, then clear the log, then reset the account.
fn scenario_5_history_and_reset(config: &DashboardConfig) -> AppResult {
    println!("Scenario 5: History, Clear and Reset\n");

    let mut engine = Engine::new(config.clone());
    tick(&mut engine, dec!(50000));

    for (side, exit) in [(Side::Long, dec!(50500)), (Side::Short, dec!(50800)), (Side::Long, dec!(50400))] {
        engine.open_market_position(side, dec!(2000), 3)?;
        engine.advance_time(60_000);
        tick(&mut engine, exit);
        engine.close_market_position()?;
    }

    for trade in engine.trading().trade_history() {
        println!(
            "  {} {} {} -> {}: {}",
            trade.id,
            trade.side,
            format_price(trade.entry_price.value(), 2),
            format_price(trade.exit_price.value(), 2),
            format_usd(trade.realized_pnl.value())
        );
    }

    let stats = engine.trading().stats();
    println!(
        "  {} trades, win rate {}, balance {}",
        stats.total_trades,
        format_percentage(stats.win_rate),
        format_usd(engine.trading().balance().value())
    );

    engine.clear_history();
    println!(
        "  History cleared: {} trades, balance {}",
        engine.trading().total_trades(),
        format_usd(engine.trading().balance().value())
    );

    engine.reset_trading();
    println!("  Reset: balance {}", format_usd(engine.trading().balance().value()));

    let snapshot = serde_json::to_string(&engine.snapshot())?;
    println!("  Snapshot: {snapshot}");
    Ok(())
}

#[cfg(feature = "live")]
fn run_live(config: DashboardConfig) -> AppResult {
    use perps_paper::live::run_stream;

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async move {
        let mut engine = Engine::new(config.clone());
        let (tx, mut rx) = feed_channel();

        tokio::spawn(run_stream(MiniTickerAdapter::new(config.feed.mini_ticker_url.as_str()), tx.clone()));
        tokio::spawn(run_stream(KlineAdapter::new(config.feed.kline_url.as_str()), tx));

        while let Some(event) = rx.recv().await {
            engine.set_time(Timestamp::now());
            engine.apply_feed_event(event);

            if let FeedEvent::PriceTick(_) = event {
                let price = engine.price();
                println!(
                    "{}  BTC {}  24h {}",
                    format_timestamp(engine.time()),
                    format_price(price.current_price, 2),
                    price.price_change_percent_24h.map(format_percentage).unwrap_or_else(|| "n/a".to_string())
                );
            }
        }
    });

    Ok(())
}

#[cfg(not(feature = "live"))]
fn run_live(_config: DashboardConfig) -> AppResult {
    Err("built without the `live` feature; rebuild with --features live".into())
}
