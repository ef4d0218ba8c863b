use crate::error::TrackerError;
use core_types::{normalize, percent_change, PriceChangeEvent};
use dashmap::DashMap;
use rust_decimal::Decimal;

/// Remembers the last normalized price of every pair and flags large moves.
///
/// Each pair lives in its own map entry, so updates for different pairs
/// never wait on each other. The stored price is always the most recent
/// observation, whether or not that observation raised an event.
#[derive(Debug)]
pub struct PriceTracker {
    threshold_pct: Decimal,
    last_prices: DashMap<String, Decimal>,
}

impl PriceTracker {
    pub fn new(threshold_pct: Decimal) -> Self {
        Self {
            threshold_pct,
            last_prices: DashMap::new(),
        }
    }

    pub fn threshold_pct(&self) -> Decimal {
        self.threshold_pct
    }

    /// Records a new price for `pair` and compares it with the previous one.
    ///
    /// - The first price seen for a pair only seeds the tracker and never yields an event.
    /// - A change of exactly `threshold_pct` yields an event.
    /// - A stored previous price of zero yields `ZeroPreviousPrice`; the new
    ///   price is still stored so the next observation compares against it.
    /// - A move too large for `Decimal` yields `ChangeOutOfRange`; the new price is stored as well.
    /// - A price that fails normalization is rejected without touching the stored value.
    pub fn record_and_compare(
        &self,
        pair: &str,
        current_raw: Decimal,
    ) -> Result<Option<PriceChangeEvent>, TrackerError> {
        let current = normalize(current_raw)?;

        // Swap under the entry lock: read previous and write current in one step.
        let Some(previous) = self.last_prices.insert(pair.to_string(), current) else {
            tracing::debug!(pair, price = %current, "First price recorded.");
            return Ok(None);
        };

        if previous.is_zero() {
            return Err(TrackerError::ZeroPreviousPrice { pair: pair.to_string() });
        }
        let change_pct = percent_change(previous, current).ok_or_else(|| TrackerError::ChangeOutOfRange {
            pair: pair.to_string(),
            previous,
            current,
        })?;

        tracing::trace!(pair, %previous, %current, %change_pct, "Price compared.");

        if change_pct < self.threshold_pct {
            return Ok(None);
        }

        Ok(Some(PriceChangeEvent {
            pair: pair.to_string(),
            previous,
            current,
            change_pct,
        }))
    }

    /// The last stored price for a pair, if it has been seen.
    pub fn last_price(&self, pair: &str) -> Option<Decimal> {
        self.last_prices.get(pair).map(|entry| *entry.value())
    }

    /// Number of pairs with a stored price.
    pub fn len(&self) -> usize {
        self.last_prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_prices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::CoreError;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[test]
    fn first_observation_never_alerts() {
        let tracker = PriceTracker::new(Decimal::ZERO);
        assert_eq!(tracker.record_and_compare("BTC-USD", dec!(50000)).unwrap(), None);
        assert_eq!(tracker.last_price("BTC-USD"), Some(dec!(50000)));
    }

    #[test]
    fn change_equal_to_threshold_alerts() {
        let tracker = PriceTracker::new(dec!(1.00));
        tracker.record_and_compare("BTC-USD", dec!(100.0000)).unwrap();

        let event = tracker.record_and_compare("BTC-USD", dec!(101.0000)).unwrap().unwrap();
        assert_eq!(event.pair, "BTC-USD");
        assert_eq!(event.previous, dec!(100));
        assert_eq!(event.current, dec!(101));
        assert_eq!(event.change_pct, dec!(1.0000));
    }

    #[test]
    fn change_below_threshold_still_updates_previous() {
        let tracker = PriceTracker::new(dec!(1.00));
        tracker.record_and_compare("BTC-USD", dec!(100.0000)).unwrap();

        assert_eq!(tracker.record_and_compare("BTC-USD", dec!(100.5000)).unwrap(), None);
        assert_eq!(tracker.last_price("BTC-USD"), Some(dec!(100.5000)));

        // 100.5 -> 101.505 is 1%: compared against the updated value, not the first 100.
        let event = tracker.record_and_compare("BTC-USD", dec!(101.505)).unwrap().unwrap();
        assert_eq!(event.previous, dec!(100.5));
        assert_eq!(event.change_pct, dec!(1));
    }

    #[test]
    fn downward_moves_count_too() {
        let tracker = PriceTracker::new(dec!(5));
        tracker.record_and_compare("ETH-USD", dec!(3000)).unwrap();
        let event = tracker.record_and_compare("ETH-USD", dec!(2700)).unwrap().unwrap();
        assert_eq!(event.change_pct, dec!(10));
    }

    #[test]
    fn prices_are_normalized_before_comparison() {
        let tracker = PriceTracker::new(dec!(0.0001));
        tracker.record_and_compare("BTC-USD", dec!(100.00001)).unwrap();
        // Both round to 100.0000, so there is no movement at all.
        assert_eq!(tracker.record_and_compare("BTC-USD", dec!(99.99996)).unwrap(), None);
        assert_eq!(tracker.last_price("BTC-USD"), Some(dec!(100.0000)));
    }

    #[test]
    fn zero_previous_price_is_an_error_and_recovers() {
        let tracker = PriceTracker::new(dec!(1));
        tracker.record_and_compare("DOGE-USD", Decimal::ZERO).unwrap();

        let err = tracker.record_and_compare("DOGE-USD", dec!(0.25)).unwrap_err();
        assert!(matches!(err, TrackerError::ZeroPreviousPrice { ref pair } if pair == "DOGE-USD"));
        assert_eq!(tracker.last_price("DOGE-USD"), Some(dec!(0.25)));

        // The next observation compares against 0.25 as usual.
        let event = tracker.record_and_compare("DOGE-USD", dec!(0.5)).unwrap().unwrap();
        assert_eq!(event.change_pct, dec!(100));
    }

    #[test]
    fn huge_move_is_out_of_range_not_a_panic() {
        let tracker = PriceTracker::new(dec!(1));
        tracker.record_and_compare("X-USD", dec!(0.0001)).unwrap();

        let err = tracker
            .record_and_compare("X-USD", dec!(1000000000000000000000000))
            .unwrap_err();
        assert!(matches!(err, TrackerError::ChangeOutOfRange { ref pair, .. } if pair == "X-USD"));
        assert_eq!(tracker.last_price("X-USD"), Some(dec!(1000000000000000000000000)));
    }

    #[test]
    fn overflowing_ratio_is_not_reported_as_zero_previous() {
        let tracker = PriceTracker::new(dec!(1));
        tracker.record_and_compare("Y-USD", dec!(0.0001)).unwrap();

        let err = tracker
            .record_and_compare("Y-USD", dec!(50000000000000000000000000000))
            .unwrap_err();
        assert!(matches!(
            err,
            TrackerError::ChangeOutOfRange { previous, .. } if previous == dec!(0.0001)
        ));
    }

    #[test]
    fn negative_price_is_rejected_without_touching_state() {
        let tracker = PriceTracker::new(dec!(1));
        tracker.record_and_compare("BTC-USD", dec!(100)).unwrap();

        let err = tracker.record_and_compare("BTC-USD", dec!(-1)).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidPrice(CoreError::NegativePrice(_))));
        assert_eq!(tracker.last_price("BTC-USD"), Some(dec!(100)));
    }

    #[test]
    fn stored_value_is_always_the_latest_fetch() {
        let tracker = PriceTracker::new(dec!(2));
        let prices = [dec!(10), dec!(10.1), dec!(12), dec!(12.05), dec!(11.123456)];
        for price in prices {
            let _ = tracker.record_and_compare("XRP-USD", price).unwrap();
        }
        assert_eq!(tracker.last_price("XRP-USD"), Some(dec!(11.1235)));
    }

    #[test]
    fn pairs_are_tracked_independently() {
        let tracker = Arc::new(PriceTracker::new(dec!(1)));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    let pair = format!("P{i}-USD");
                    for step in 1..=100u32 {
                        tracker.record_and_compare(&pair, Decimal::from(step)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tracker.len(), 8);
        for i in 0..8 {
            assert_eq!(tracker.last_price(&format!("P{i}-USD")), Some(dec!(100)));
        }
    }
}
