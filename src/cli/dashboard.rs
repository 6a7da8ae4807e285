use super::ui;
use crate::core::{EquityData, SeriesMap, SourceResult};
use crate::indicators::IndicatorEngine;
use crate::orchestrator::{DataAcquisitionOrchestrator, Snapshot};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};
use std::time::Duration;
use tracing::info;

fn price_cell(price: f64) -> Cell {
    Cell::new(format!("{price:.2}")).set_alignment(CellAlignment::Right)
}

fn crypto_section(
    crypto: &SourceResult<SeriesMap>,
    engine: &IndicatorEngine,
    vs_currency: &str,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Coin"),
        ui::header_cell(&format!("Last ({})", vs_currency.to_uppercase())),
        ui::header_cell("Change"),
        ui::header_cell(&format!("SMA {}", engine.short_window)),
        ui::header_cell(&format!("SMA {}", engine.long_window)),
        ui::header_cell(&format!("RSI {}", engine.rsi_window)),
        ui::header_cell("As of (UTC)"),
    ]);

    for (coin, series) in crypto.data() {
        let frame = engine.compute(series);
        let Some(latest) = frame.latest() else {
            table.add_row(vec![Cell::new(coin), Cell::new("no data")]);
            continue;
        };
        table.add_row(vec![
            Cell::new(coin),
            price_cell(latest.price),
            ui::change_cell(series.change_pct()),
            ui::format_optional_cell(latest.sma_short, |v| format!("{v:.2}")),
            ui::format_optional_cell(latest.sma_long, |v| format!("{v:.2}")),
            ui::format_optional_cell(latest.rsi, |v| format!("{v:.1}")),
            Cell::new(latest.timestamp.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }

    format!(
        "{} {}\n\n{}",
        ui::style_text("Crypto", ui::StyleType::Title),
        ui::provenance_label(crypto.provenance()),
        table
    )
}

fn equity_section(equities: &SourceResult<EquityData>) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell("Last"),
        ui::header_cell("Change"),
    ]);

    let latest = equities.data().latest_prices();
    for (ticker, price) in &latest {
        let change = match equities.data() {
            EquityData::History(history) => history.get(ticker).and_then(|s| s.change_pct()),
            EquityData::Snapshot(_) => None,
        };
        table.add_row(vec![
            Cell::new(ticker),
            price_cell(*price),
            ui::change_cell(change),
        ]);
    }

    format!(
        "{} {}\n\n{}",
        ui::style_text("VN30", ui::StyleType::Title),
        ui::provenance_label(equities.provenance()),
        table
    )
}

/// Renders one acquisition cycle. Each section carries its provenance label.
pub fn render(snapshot: &Snapshot, engine: &IndicatorEngine, vs_currency: &str) -> String {
    format!(
        "{}\n\n{}\n\n{}",
        crypto_section(&snapshot.crypto, engine, vs_currency),
        equity_section(&snapshot.equities),
        ui::style_text(
            &format!(
                "Fetched at {}. Sources: CoinGecko (crypto), CafeF (VN30).",
                snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            ui::StyleType::Subtle
        )
    )
}

pub async fn run(orchestrator: &DataAcquisitionOrchestrator<'_>, vs_currency: &str) -> Result<()> {
    let pb = ui::new_spinner("Fetching prices...");
    let snapshot = orchestrator.acquire_all().await;
    pb.finish_and_clear();

    println!(
        "{}",
        render(&snapshot, &IndicatorEngine::default(), vs_currency)
    );
    Ok(())
}

/// Re-runs the whole pipeline every `interval` until Ctrl-C.
pub async fn watch(
    orchestrator: &DataAcquisitionOrchestrator<'_>,
    vs_currency: &str,
    interval: Duration,
) -> Result<()> {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    watch_until(orchestrator, vs_currency, interval, ctrl_c).await
}

/// Refresh loop that stops as soon as `shutdown` completes, whether the
/// pipeline is fetching or waiting for the next interval.
pub async fn watch_until<F>(
    orchestrator: &DataAcquisitionOrchestrator<'_>,
    vs_currency: &str,
    interval: Duration,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            result = run(orchestrator, vs_currency) => result?,
            _ = &mut shutdown => break,
        }
        ui::print_separator();
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = &mut shutdown => break,
        }
    }
    info!("Interrupted, stopping refresh loop");
    Ok(())
}
