//! Export: JSON, CSV and a Markdown summary.
//!
//! CSV columns use the same names as the JSON fields so a spreadsheet and an
//! API consumer see one vocabulary.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::equity::EquityPoint;
use crate::service::TradeView;
use crate::stats::AggregateStatistics;

// ─── JSON export ────────────────────────────────────────────────────

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize to JSON")
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = to_json(value)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Equity curve as CSV: label, timestamp, pnl, cumulativePnl.
pub fn equity_csv(points: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["label", "timestamp", "pnl", "cumulativePnl"])?;
    for p in points {
        wtr.write_record([
            p.label.clone(),
            p.timestamp.to_rfc3339(),
            format!("{:.2}", p.pnl),
            format!("{:.2}", p.cumulative_pnl),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Trade list with derived metrics as CSV.
///
/// Open trades and records without metrics leave the metric columns empty.
pub fn trades_csv(views: &[TradeView]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "id",
        "symbol",
        "direction",
        "assetType",
        "timestampEntry",
        "timestampExit",
        "entryPrice",
        "exitPrice",
        "stopLoss",
        "quantity",
        "fees",
        "grossPnl",
        "netPnl",
        "riskAmount",
        "rMultiple",
        "accountRiskPercent",
        "strategyId",
        "emotion",
        "setupGrade",
        "metricSource",
    ])?;

    for v in views {
        let t = &v.trade;
        let m = v.metrics.filter(|m| m.is_closed);
        wtr.write_record([
            t.id.to_string(),
            t.symbol.clone(),
            t.direction.as_str().to_string(),
            t.asset_type.as_str().to_string(),
            t.entry_time.to_rfc3339(),
            t.exit_time.map(|e| e.to_rfc3339()).unwrap_or_default(),
            t.entry_price.to_string(),
            opt(t.exit_price),
            opt(t.stop_loss),
            t.quantity.to_string(),
            format!("{:.2}", t.fees),
            opt_fixed(m.map(|m| m.gross_pnl)),
            opt_fixed(m.map(|m| m.net_pnl)),
            opt_fixed(v.metrics.map(|m| m.risk_amount)),
            opt_fixed(m.and_then(|m| m.r_multiple)),
            opt_fixed(v.metrics.and_then(|m| m.account_risk_percent)),
            t.strategy_id.as_ref().map(ToString::to_string).unwrap_or_default(),
            t.emotion_tag().unwrap_or("").to_string(),
            t.setup_grade.map(|g| g.letter().to_string()).unwrap_or_default(),
            source_label(v),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn opt(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn opt_fixed(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_default()
}

fn source_label(v: &TradeView) -> String {
    serde_json::to_value(v.metric_source)
        .ok()
        .and_then(|s| s.as_str().map(str::to_string))
        .unwrap_or_default()
}

pub fn write_csv(path: &Path, csv: &str) -> Result<()> {
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))
}

// ─── Markdown summary ───────────────────────────────────────────────

/// Human-readable summary table.
pub fn summary_markdown(s: &AggregateStatistics) -> String {
    let mut md = String::with_capacity(1024);

    md.push_str("# Trading Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Total P&L | {:.2} |\n", s.total_pnl));
    md.push_str(&format!(
        "| Trades | {} ({} W / {} L / {} BE) |\n",
        s.total_trades, s.wins, s.losses, s.breakevens
    ));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", s.win_rate));
    md.push_str(&format!("| Profit Factor | {} |\n", s.profit_factor));
    md.push_str(&format!("| Expectancy | {:.2} |\n", s.expectancy));
    md.push_str(&format!("| Average R | {:.2} |\n", s.average_r));
    md.push_str(&format!("| Max Drawdown | {:.2} |\n", s.max_drawdown));
    md.push_str(&format!(
        "| Best / Worst Streak | {} W / {} L |\n",
        s.streaks.best_win_streak, s.streaks.worst_loss_streak
    ));
    md.push_str(&format!(
        "| Open Trades | {} ({:.2} at risk) |\n",
        s.exposure.open_trades, s.exposure.open_risk_amount
    ));
    md.push('\n');

    if !s.breakdowns.by_weekday.is_empty() {
        md.push_str("## By Weekday\n\n");
        md.push_str("| Day | Trades | P&L | Avg |\n");
        md.push_str("| --- | ---: | ---: | ---: |\n");
        for (day, b) in &s.breakdowns.by_weekday {
            md.push_str(&format!(
                "| {day} | {} | {:.2} | {:.2} |\n",
                b.count, b.pnl, b.avg_pnl
            ));
        }
        md.push('\n');
    }

    if s.degraded_records > 0 || s.skipped_records > 0 {
        md.push_str("## Data Quality\n\n");
        md.push_str(&format!(
            "- {} record(s) used stored P&L\n",
            s.degraded_records
        ));
        md.push_str(&format!(
            "- {} record(s) had no usable P&L\n",
            s.skipped_records
        ));
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyticsOptions;
    use crate::resolve::resolve_all;
    use crate::test_support::{closed_trade, open_trade, ts};

    #[test]
    fn equity_csv_has_header_and_rows() {
        let trades = vec![closed_trade("a", ts(4, 9), 10.0), closed_trade("b", ts(5, 9), -2.5)];
        let stats = AggregateStatistics::compute(&trades, &AnalyticsOptions::default());
        let csv = equity_csv(&stats.equity_curve).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "label,timestamp,pnl,cumulativePnl");
        assert_eq!(lines.len(), 3);
        assert!(lines[2].ends_with(",-2.50,7.50"));
    }

    #[test]
    fn trades_csv_leaves_open_trade_pnl_empty() {
        let trades = vec![closed_trade("a", ts(4, 9), 10.0), open_trade("o", ts(5, 9))];
        let views: Vec<TradeView> = resolve_all(&trades).iter().map(TradeView::from).collect();
        let csv = trades_csv(&views).unwrap();

        let mut rdr = csv::Reader::from_reader(csv.as_bytes());
        let headers = rdr.headers().unwrap().clone();
        let net = headers.iter().position(|h| h == "netPnl").unwrap();
        let source = headers.iter().position(|h| h == "metricSource").unwrap();
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][net], "10.00");
        assert_eq!(&rows[1][net], "");
        assert_eq!(&rows[0][source], "computed");
    }

    #[test]
    fn json_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let stats = AggregateStatistics::compute(
            &[closed_trade("a", ts(4, 9), 10.0)],
            &AnalyticsOptions::default(),
        );
        write_json(&path, &stats).unwrap();
        let back: AggregateStatistics =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.total_pnl, 10.0);
        assert!(back.profit_factor.is_unbounded());
    }

    #[test]
    fn markdown_mentions_degraded_records_only_when_present() {
        let clean = AggregateStatistics::compute(
            &[closed_trade("a", ts(4, 9), 10.0)],
            &AnalyticsOptions::default(),
        );
        let md = summary_markdown(&clean);
        assert!(md.contains("| Profit Factor | Infinity |"));
        assert!(md.contains("| Monday | 1 | 10.00 | 10.00 |"));
        assert!(!md.contains("Data Quality"));

        let mut degraded = clean.clone();
        degraded.degraded_records = 2;
        assert!(summary_markdown(&degraded).contains("2 record(s) used stored P&L"));
    }
}
