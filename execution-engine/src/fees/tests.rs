use super::*;
use chrono::NaiveDate;
use proptest::prelude::*;
use std::sync::Arc;
use trading::memory::{MemoryMarketData, WeekdayCalendar};
use trading::InstrumentKind;

fn day(d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[test]
fn test_absolute_fee_without_bounds() {
    let fees = FeeSchedule::new(0.02, 0.0, 0.0);
    assert!((fees.per_unit(100.0, 10.0) - 0.02).abs() < 1e-12);
}

#[test]
fn test_negative_fee_is_a_rate_on_price() {
    let fees = FeeSchedule::new(-0.001, 0.0, 0.0);
    let fee = fees.per_unit(50.0, 10.0);
    assert!((fee - 0.05).abs() < 1e-12, "Expected 0.05, got {}", fee);
}

#[test]
fn test_min_fee_lifts_small_tickets() {
    // 10 units * 0.01 = 0.1 total, below the 1.0 minimum ticket.
    let fees = FeeSchedule::new(0.01, 1.0, 0.0);
    let fee = fees.per_unit(20.0, -10.0);
    assert!((fee - 0.1).abs() < 1e-12, "Expected 0.1, got {}", fee);
}

#[test]
fn test_max_fee_caps_large_tickets() {
    let fees = FeeSchedule::new(0.5, 0.0, 10.0);
    let fee = fees.per_unit(20.0, 100.0);
    assert!((fee - 0.1).abs() < 1e-12, "Expected 0.1, got {}", fee);
}

#[test]
fn test_negative_bounds_scale_with_notional() {
    // min = 0.01 * 10 * 5 = 0.5 total.
    let fees = FeeSchedule::new(0.0, -0.01, 0.0);
    let fee = fees.per_unit(10.0, 5.0);
    assert!((fee - 0.1).abs() < 1e-12, "Expected 0.1, got {}", fee);
}

proptest! {
    #[test]
    fn prop_fee_stays_within_configured_bounds(
        fee in -0.01f64..1.0,
        min_raw in -0.01f64..50.0,
        span in 0.0f64..50.0,
        price in 0.5f64..500.0,
        unit in prop_oneof![-1_000.0f64..-1.0, 1.0f64..1_000.0],
    ) {
        let units = unit.abs();
        let min_total = if min_raw < 0.0 { -min_raw * price * units } else { min_raw };
        let max_total = min_total + span;
        prop_assume!(min_total > 0.0 && max_total > 0.0);

        let fees = FeeSchedule::new(fee, min_raw, max_total);
        let charged = fees.per_unit(price, unit);
        prop_assert!(charged >= min_total / units - 1e-9);
        prop_assert!(charged <= max_total / units + 1e-9);
    }
}

fn impact_market() -> Arc<MemoryMarketData> {
    let md = Arc::new(MemoryMarketData::new());
    md.add_instrument(InstrumentInfo::new(5, "ACME", InstrumentKind::Equity, "USD"));
    for d in [1, 4, 5, 6, 7, 8, 11, 12, 13, 14] {
        md.set_last(5, day(d), 10.0);
        md.set_value(5, day(d), SeriesField::Volume, 1_000.0);
    }
    md
}

#[test]
fn test_impact_scales_with_share_of_daily_value() {
    let md = impact_market();
    let info = md.instrument(5).unwrap();
    let inputs = ImpactInputs {
        market: md.as_ref(),
        calendar: &WeekdayCalendar,
        instrument: &info,
        point_size: 1.0,
        portfolio_currency: "USD",
        window: 10,
    };
    assert!((inputs.average_daily_value(day(14)) - 10_000.0).abs() < 1e-9);

    // 100 units * 10 = 1000 notional, a tenth of the daily value.
    let impact = inputs.impact(day(14), -100.0, 10.0, 0.5);
    assert!((impact - 0.5).abs() < 1e-9, "Expected 0.5, got {}", impact);
}

#[test]
fn test_impact_without_volume_is_zero() {
    let md = Arc::new(MemoryMarketData::new());
    md.add_instrument(InstrumentInfo::new(6, "THIN", InstrumentKind::Equity, "USD"));
    md.set_last(6, day(14), 10.0);
    let info = md.instrument(6).unwrap();
    let inputs = ImpactInputs {
        market: md.as_ref(),
        calendar: &WeekdayCalendar,
        instrument: &info,
        point_size: 1.0,
        portfolio_currency: "USD",
        window: 10,
    };
    assert_eq!(inputs.impact(day(14), 100.0, 10.0, 1.0), 0.0);
}
