//! Property tests for signal invariants.
//!
//! Uses proptest to verify:
//! 1. Price change matches the hand formula within rounding
//! 2. RSI stays in [0, 100], saturates without losses, needs 15 bars
//! 3. Reconciliation is the mean of successes and survives partial failure
//! 4. Decision rules are deterministic and ordered

use chrono::NaiveDate;
use dipwatch_core::decision::{decide, DecisionInputs};
use dipwatch_core::domain::{Bar, Recommendation};
use dipwatch_core::indicators::{price_change, round2, Rsi};
use dipwatch_core::oscillator::{reconcile, OscillatorReading};
use proptest::prelude::*;

// ── Helpers ──────────────────────────────────────────────────────────

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: base + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: (close - 1.0).max(0.01),
            close,
            volume: 1_000,
        })
        .collect()
}

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..1000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_closes(min: usize, max: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(arb_price(), min..max)
}

fn arb_reading() -> impl Strategy<Value = OscillatorReading> {
    prop_oneof![
        (0.0..=100.0_f64).prop_map(OscillatorReading::Value),
        Just(OscillatorReading::Unavailable("timeout".into())),
    ]
}

// ── 1. Price change ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn change_matches_formula(closes in arb_closes(2, 40)) {
        let bars = bars_from_closes(&closes);
        let c = price_change(&bars).unwrap();
        let prev = closes[closes.len() - 2];
        let last = closes[closes.len() - 1];
        let expected = (last - prev) / prev * 100.0;
        prop_assert!((c.change_pct - expected).abs() <= 0.005 + 1e-9);
        prop_assert_eq!(c.change_pct, price_change(&bars).unwrap().change_pct);
    }
}

// ── 2. RSI ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_bounded(closes in arb_closes(15, 80)) {
        let v = Rsi::default().compute(&bars_from_closes(&closes)).unwrap();
        prop_assert!((0.0..=100.0).contains(&v), "rsi out of bounds: {}", v);
    }

    #[test]
    fn rsi_saturates_without_losses(start in arb_price(), steps in prop::collection::vec(0.0..5.0_f64, 14..40)) {
        let mut closes = vec![start];
        for s in steps {
            let last = *closes.last().unwrap();
            closes.push(last + s);
        }
        prop_assert_eq!(Rsi::default().compute(&bars_from_closes(&closes)), Some(100.0));
    }

    #[test]
    fn rsi_unavailable_below_fifteen(closes in arb_closes(0, 15)) {
        prop_assert_eq!(Rsi::default().compute(&bars_from_closes(&closes)), None);
    }
}

// ── 3. Reconciliation ────────────────────────────────────────────────

proptest! {
    #[test]
    fn reconcile_is_mean_of_successes(readings in prop::collection::vec(arb_reading(), 0..5)) {
        let values: Vec<f64> = readings.iter().filter_map(|r| r.value()).collect();
        let r = reconcile(&readings);
        prop_assert_eq!(r.used, values.len());
        prop_assert_eq!(r.failed, readings.len() - values.len());
        if values.is_empty() {
            prop_assert_eq!(r.value, None);
        } else {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            prop_assert_eq!(r.value, Some(round2(mean)));
        }
    }

    #[test]
    fn single_survivor_carries_the_value(value in 0.0..=100.0_f64, failing in 0usize..4, position in 0usize..4) {
        let mut readings: Vec<OscillatorReading> =
            (0..failing).map(|i| OscillatorReading::Unavailable(format!("p{i}"))).collect();
        readings.insert(position.min(readings.len()), OscillatorReading::Value(value));
        prop_assert_eq!(reconcile(&readings).value, Some(round2(value)));
    }
}

// ── 4. Decision ──────────────────────────────────────────────────────

fn arb_inputs() -> impl Strategy<Value = DecisionInputs> {
    (
        -15.0..15.0_f64,
        -1.0..=1.0_f64,
        prop::option::of(0.0..=100.0_f64),
        prop::option::of(0.0..5.0_f64),
    )
        .prop_map(|(change_pct, sentiment, oscillator, volume_ratio)| DecisionInputs {
            change_pct,
            sentiment,
            oscillator,
            volume_ratio,
        })
}

proptest! {
    #[test]
    fn decision_is_deterministic(inputs in arb_inputs()) {
        prop_assert_eq!(decide(&inputs), decide(&inputs));
    }

    #[test]
    fn buy_takes_precedence_over_volatile(
        change in -15.0..-3.01_f64,
        sentiment in 0.31..=1.0_f64,
        osc in 0.0..34.9_f64,
        vol in 2.01..5.0_f64,
    ) {
        let inputs = DecisionInputs {
            change_pct: change,
            sentiment,
            oscillator: Some(osc),
            volume_ratio: Some(vol),
        };
        prop_assert_eq!(decide(&inputs), Recommendation::BuyOpportunity);
    }

    #[test]
    fn quiet_days_hold(change in -2.0..=2.0_f64, inputs in arb_inputs()) {
        // Within +/-2% no rule can fire.
        let inputs = DecisionInputs { change_pct: change, ..inputs };
        prop_assert_eq!(decide(&inputs), Recommendation::Hold);
    }
}
