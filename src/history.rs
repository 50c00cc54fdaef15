//! History assembly: arbitrary `[from, to]` windows stitched together from
//! capped upstream kline calls.
//!
//! The exchange returns at most [`MAX_KLINES_PER_CALL`] bars per call, so a
//! request is partitioned into consecutive sub-windows each covering at most
//! that many bar slots. Sub-windows are fetched with a bounded fan-out and
//! combined in window order, so the output is deterministic regardless of
//! completion order. Any sub-window failure aborts the whole request; a
//! truncated series must never be labeled `ok`.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use rust_decimal::Decimal;

use crate::catalog::SymbolCatalog;
use crate::error::Error;
use crate::resolution::{self, ResolutionSpec};
use crate::upstream::{KlineRow, Upstream};

/// Binance's documented klines cap per call.
pub const MAX_KLINES_PER_CALL: i64 = 1_000;

/// How many sub-window fetches may be in flight at once.
const FETCH_FANOUT: usize = 4;

/// One OHLCV bar. `time` is the bar open time in epoch seconds, strictly
/// increasing within an assembled series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bar {
    pub time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    fn from_kline(row: KlineRow) -> Self {
        Self {
            time: row.open_time_ms / 1_000,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }

    /// OHLCV integrity: low and high bound open and close, volume is
    /// non-negative.
    pub fn is_valid(&self) -> bool {
        self.low <= self.open
            && self.low <= self.close
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.high
            && self.volume >= Decimal::ZERO
    }
}

/// Outcome of a history request. An empty range is a success state, never
/// an error; `next_time` hints at the closest earlier bar when one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum History {
    Ok(Vec<Bar>),
    NoData { next_time: Option<i64> },
}

/// Assembles UDF history responses from capped upstream kline calls.
pub struct HistoryAssembler {
    upstream: Arc<dyn Upstream>,
    catalog: Arc<SymbolCatalog>,
}

impl HistoryAssembler {
    pub fn new(upstream: Arc<dyn Upstream>, catalog: Arc<SymbolCatalog>) -> Self {
        Self { upstream, catalog }
    }

    /// Fetch the bar series for `ticker` at `resolution_token` over the
    /// inclusive `[from, to]` window (epoch seconds).
    ///
    /// Symbol and resolution are resolved before any kline call is made;
    /// `SymbolNotFound` and `InvalidResolution` propagate unchanged.
    pub async fn fetch(
        &self,
        ticker: &str,
        resolution_token: &str,
        from: i64,
        to: i64,
    ) -> Result<History, Error> {
        let info = self.catalog.lookup(ticker).await?;
        let spec = resolution::resolve(resolution_token)?;

        if to < from {
            return Ok(History::NoData { next_time: None });
        }

        let windows = partition(from, to, spec.seconds);
        tracing::debug!(
            ticker,
            resolution = spec.udf_token,
            windows = windows.len(),
            "assembling history"
        );

        let chunks: Vec<Vec<KlineRow>> = stream::iter(
            windows
                .into_iter()
                .map(|window| self.fetch_window(&info.symbol, spec, window)),
        )
        .buffered(FETCH_FANOUT)
        .try_collect()
        .await?;

        let bars = stitch(chunks);
        if bars.is_empty() {
            let next_time = self.probe_next_time(&info.symbol, spec, from).await?;
            return Ok(History::NoData { next_time });
        }

        Ok(History::Ok(bars))
    }

    async fn fetch_window(
        &self,
        symbol: &str,
        spec: &ResolutionSpec,
        (start, end): (i64, i64),
    ) -> Result<Vec<KlineRow>, Error> {
        self.upstream
            .klines(
                symbol,
                spec.upstream_interval,
                Some(start * 1_000),
                Some(end * 1_000 + 999),
                MAX_KLINES_PER_CALL as u32,
            )
            .await
    }

    /// Open time of the closest bar before `from`, for the UDF `nextTime`
    /// hint on `no_data` responses. The exchange returns the most recent
    /// bars when only an end bound is given.
    async fn probe_next_time(
        &self,
        symbol: &str,
        spec: &ResolutionSpec,
        from: i64,
    ) -> Result<Option<i64>, Error> {
        if from <= 0 {
            return Ok(None);
        }

        let rows = self
            .upstream
            .klines(symbol, spec.upstream_interval, None, Some(from * 1_000 - 1), 1)
            .await?;

        Ok(rows.last().map(|row| row.open_time_ms / 1_000))
    }
}

/// Partition the inclusive `[from, to]` second window into consecutive
/// sub-windows, each spanning at most `MAX_KLINES_PER_CALL` bar slots at
/// `seconds` per bar.
fn partition(from: i64, to: i64, seconds: i64) -> Vec<(i64, i64)> {
    let span = seconds * MAX_KLINES_PER_CALL;
    let mut windows = Vec::new();
    let mut start = from;

    while start <= to {
        let end = (start + span - 1).min(to);
        windows.push((start, end));
        start = end + 1;
    }

    windows
}

/// Concatenate sub-window results in window order, dropping any bar whose
/// open time is not strictly greater than the last accepted one. Adjacent
/// windows may overlap at their boundary; the first occurrence wins.
fn stitch(chunks: Vec<Vec<KlineRow>>) -> Vec<Bar> {
    let mut bars: Vec<Bar> = Vec::new();

    for row in chunks.into_iter().flatten() {
        let time = row.open_time_ms / 1_000;
        if bars.last().is_none_or(|last| time > last.time) {
            bars.push(Bar::from_kline(row));
        }
    }

    bars
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(open_time_secs: i64) -> KlineRow {
        KlineRow {
            open_time_ms: open_time_secs * 1_000,
            open: dec!(100),
            high: dec!(110),
            low: dec!(90),
            close: dec!(105),
            volume: dec!(1.5),
        }
    }

    #[test]
    fn single_window_when_range_fits_one_call() {
        let windows = partition(0, 3_600 * 999, 3_600);
        assert_eq!(windows, vec![(0, 3_600 * 999)]);
    }

    #[test]
    fn partition_covers_range_without_gaps() {
        let from = 1_700_000_000;
        let to = from + 3_600 * 4_999;
        let windows = partition(from, to, 3_600);

        assert_eq!(windows.len(), 5);
        assert_eq!(windows[0].0, from);
        assert_eq!(windows[4].1, to);
        for pair in windows.windows(2) {
            assert_eq!(pair[1].0, pair[0].1 + 1);
        }
        // Each window covers at most 1000 bar slots.
        for (start, end) in windows {
            assert!(end - start + 1 <= 3_600 * MAX_KLINES_PER_CALL);
        }
    }

    #[test]
    fn stitch_drops_boundary_duplicates_keeping_first() {
        let chunks = vec![
            vec![row(0), row(60), row(120)],
            vec![row(120), row(180)],
            vec![row(180), row(240), row(300)],
        ];

        let bars = stitch(chunks);
        let times: Vec<i64> = bars.iter().map(|bar| bar.time).collect();
        assert_eq!(times, [0, 60, 120, 180, 240, 300]);
        for pair in bars.windows(2) {
            assert!(pair[1].time > pair[0].time);
        }
    }

    #[test]
    fn stitch_drops_out_of_order_rows() {
        let chunks = vec![vec![row(60), row(0), row(120)]];
        let times: Vec<i64> = stitch(chunks).iter().map(|bar| bar.time).collect();
        assert_eq!(times, [60, 120]);
    }

    #[test]
    fn bar_validity_bounds_open_and_close() {
        let bar = Bar::from_kline(row(0));
        assert!(bar.is_valid());

        let inverted = Bar {
            high: dec!(80),
            ..bar
        };
        assert!(!inverted.is_valid());
    }
}
