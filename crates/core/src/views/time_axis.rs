//! Adaptive axis: pick a tick granularity for the current zoom, then walk the
//! calendar across the visible window.

use careerline_protocol::{AxisInfo, Bracket, Tick, TickUnit, TimeWindow};
use chrono::{DateTime, Datelike, Months, NaiveDate, TimeDelta, Timelike, Utc};
use tracing::warn;

use crate::scale::{DAY_MS, HOUR_MS, MONTH_MS, Scale, YEAR_MS, to_pixel, width_of};

/// How a tick or bracket instant is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelFormat {
    /// `9 AM`
    HourOfDay,
    /// `16`
    DayOfMonth,
    /// `May`
    MonthShort,
    /// `2024`
    Year,
    /// `16th May 2024`
    OrdinalDate,
    /// `May 2024`
    MonthYear,
}

impl LabelFormat {
    pub fn format(self, at: DateTime<Utc>) -> String {
        match self {
            Self::HourOfDay => at.format("%-I %p").to_string(),
            Self::DayOfMonth => at.format("%-d").to_string(),
            Self::MonthShort => at.format("%b").to_string(),
            Self::Year => at.format("%Y").to_string(),
            Self::OrdinalDate => {
                let day = at.day();
                format!("{day}{} {}", ordinal_suffix(day), at.format("%B %Y"))
            }
            Self::MonthYear => at.format("%B %Y").to_string(),
        }
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// A discrete zoom level for the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickStrategy {
    pub unit: TickUnit,
    pub step: u32,
    pub primary: LabelFormat,
    /// Bracket label format; `None` hides the bracket row.
    pub secondary: Option<LabelFormat>,
}

struct Rule {
    unit: TickUnit,
    step: u32,
    unit_ms: f64,
    /// Pixels one `unit` must exceed for the rule to apply.
    min_px: f64,
}

const fn rule(unit: TickUnit, step: u32, unit_ms: f64, min_px: f64) -> Rule {
    Rule {
        unit,
        step,
        unit_ms,
        min_px,
    }
}

/// Finest first. The first rule whose unit is wide enough wins.
const RULES: &[Rule] = &[
    rule(TickUnit::Hour, 1, HOUR_MS, 60.0),
    rule(TickUnit::Hour, 2, HOUR_MS, 30.0),
    rule(TickUnit::Hour, 4, HOUR_MS, 15.0),
    rule(TickUnit::Hour, 6, HOUR_MS, 10.0),
    rule(TickUnit::Hour, 12, HOUR_MS, 5.0),
    rule(TickUnit::Day, 1, DAY_MS, 200.0),
    rule(TickUnit::Day, 2, DAY_MS, 100.0),
    rule(TickUnit::Day, 5, DAY_MS, 50.0),
    rule(TickUnit::Day, 10, DAY_MS, 25.0),
    rule(TickUnit::Month, 1, MONTH_MS, 150.0),
    rule(TickUnit::Month, 3, MONTH_MS, 70.0),
    rule(TickUnit::Year, 1, YEAR_MS, 100.0),
    rule(TickUnit::Year, 2, YEAR_MS, 50.0),
    rule(TickUnit::Year, 5, YEAR_MS, 25.0),
];

/// Decades, when nothing finer is readable.
const FALLBACK_STEP: u32 = 10;

impl TickStrategy {
    /// Choose the tick granularity for `scale`.
    ///
    /// Adjacent scales often map to the same strategy, which keeps labels
    /// steady while zooming.
    pub fn select(scale: Scale) -> Self {
        RULES
            .iter()
            .find(|r| scale.px_per(r.unit_ms) > r.min_px)
            .map(|r| Self::for_unit(r.unit, r.step))
            .unwrap_or_else(|| Self::for_unit(TickUnit::Year, FALLBACK_STEP))
    }

    fn for_unit(unit: TickUnit, step: u32) -> Self {
        let (primary, secondary) = match unit {
            TickUnit::Hour => (LabelFormat::HourOfDay, Some(LabelFormat::OrdinalDate)),
            TickUnit::Day => (LabelFormat::DayOfMonth, Some(LabelFormat::MonthYear)),
            TickUnit::Month => (LabelFormat::MonthShort, Some(LabelFormat::Year)),
            TickUnit::Year => (LabelFormat::Year, None),
        };
        Self {
            unit,
            step,
            primary,
            secondary,
        }
    }

    pub fn show_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    pub fn axis_info(&self) -> AxisInfo {
        AxisInfo {
            unit: self.unit,
            step: self.step,
        }
    }

    /// The coarser unit brackets group ticks by.
    pub fn bracket_unit(&self) -> Option<TickUnit> {
        match self.unit {
            TickUnit::Hour => Some(TickUnit::Day),
            TickUnit::Day => Some(TickUnit::Month),
            TickUnit::Month => Some(TickUnit::Year),
            TickUnit::Year => None,
        }
    }
}

/// Round `at` down to the start of its hour, day, month or year.
fn snap(unit: TickUnit, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let date = at.date_naive();
    let start = match unit {
        TickUnit::Hour => date.and_hms_opt(at.hour(), 0, 0)?,
        TickUnit::Day => date.and_hms_opt(0, 0, 0)?,
        TickUnit::Month => date.with_day(1)?.and_hms_opt(0, 0, 0)?,
        TickUnit::Year => NaiveDate::from_ymd_opt(at.year(), 1, 1)?.and_hms_opt(0, 0, 0)?,
    };
    Some(start.and_utc())
}

fn advance(unit: TickUnit, step: u32, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match unit {
        TickUnit::Hour => at.checked_add_signed(TimeDelta::try_hours(i64::from(step))?),
        TickUnit::Day => at.checked_add_signed(TimeDelta::try_days(i64::from(step))?),
        TickUnit::Month => at.checked_add_months(Months::new(step)),
        TickUnit::Year => at.checked_add_months(Months::new(step.checked_mul(12)?)),
    }
}

fn instant(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms.floor() as i64)
}

fn millis(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64
}

/// Primary ticks from the start of the unit containing `window.start`, one
/// every `step` units, up to but not including `window.end`. `left` is
/// measured from `origin`.
///
/// At most `max_ticks` are produced.
pub fn generate_ticks(
    strategy: &TickStrategy,
    window: TimeWindow,
    origin: f64,
    scale: Scale,
    max_ticks: usize,
) -> Vec<Tick> {
    let mut ticks = Vec::new();
    let Some(mut current) = instant(window.start).and_then(|at| snap(strategy.unit, at)) else {
        warn!(start = window.start, "visible window starts outside the calendar range");
        return ticks;
    };

    while millis(current) < window.end {
        if ticks.len() >= max_ticks {
            warn!(max_ticks, unit = ?strategy.unit, "tick budget exhausted, axis truncated");
            break;
        }
        let at = millis(current);
        ticks.push(Tick {
            instant: at,
            label: strategy.primary.format(current),
            left: to_pixel(origin, at, scale),
        });
        match advance(strategy.unit, strategy.step, current) {
            Some(next) => current = next,
            None => break,
        }
    }
    ticks
}

/// Secondary brackets: one `[start, next_start)` span per coarser unit that
/// intersects the window. Empty when the strategy hides the bracket row.
pub fn generate_brackets(
    strategy: &TickStrategy,
    window: TimeWindow,
    origin: f64,
    scale: Scale,
    max_brackets: usize,
) -> Vec<Bracket> {
    let mut brackets = Vec::new();
    let (Some(unit), Some(format)) = (strategy.bracket_unit(), strategy.secondary) else {
        return brackets;
    };
    let Some(mut current) = instant(window.start).and_then(|at| snap(unit, at)) else {
        return brackets;
    };

    while millis(current) < window.end && brackets.len() < max_brackets {
        let Some(next) = advance(unit, 1, current) else {
            break;
        };
        let (start, end) = (millis(current), millis(next));
        brackets.push(Bracket {
            start,
            end,
            label: format.format(current),
            left: to_pixel(origin, start, scale),
            width: width_of(start, end, scale),
        });
        current = next;
    }
    brackets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeWindow {
        TimeWindow::new(millis(start), millis(end))
    }

    #[test]
    fn dense_scale_selects_single_hours() {
        // 0.01 px/ms is 36 000 px per hour.
        let strategy = TickStrategy::select(Scale::new(0.01).unwrap());
        assert_eq!(strategy.unit, TickUnit::Hour);
        assert_eq!(strategy.step, 1);
        assert_eq!(strategy.primary, LabelFormat::HourOfDay);
        assert_eq!(strategy.secondary, Some(LabelFormat::OrdinalDate));
        assert!(strategy.show_secondary());
    }

    #[test]
    fn selection_walks_the_table() {
        let cases = [
            (Scale::per_hour(40.0), TickUnit::Hour, 2),
            (Scale::per_hour(6.0), TickUnit::Hour, 12),
            (Scale::per_day(110.0), TickUnit::Day, 2),
            (Scale::per_day(30.0), TickUnit::Day, 10),
            (Scale::per_day(3.0), TickUnit::Month, 3),
            (Scale::per_day(1.0), TickUnit::Year, 1),
            (Scale::per_year(60.0), TickUnit::Year, 2),
            (Scale::per_year(30.0), TickUnit::Year, 5),
        ];
        for (scale, unit, step) in cases {
            let strategy = TickStrategy::select(scale.unwrap());
            assert_eq!((strategy.unit, strategy.step), (unit, step), "{strategy:?}");
        }
    }

    #[test]
    fn coarsest_scale_falls_back_to_decades() {
        let strategy = TickStrategy::select(Scale::per_year(1.0).unwrap());
        assert_eq!(strategy.unit, TickUnit::Year);
        assert_eq!(strategy.step, 10);
        assert!(!strategy.show_secondary());
        assert_eq!(strategy.bracket_unit(), None);
    }

    #[test]
    fn selection_is_deterministic() {
        for px_per_day in [0.05, 0.5, 2.0, 7.5, 40.0, 120.0, 500.0, 5_000.0] {
            let scale = Scale::per_day(px_per_day).unwrap();
            assert_eq!(TickStrategy::select(scale), TickStrategy::select(scale));
        }
    }

    #[test]
    fn finer_scales_never_pick_coarser_steps() {
        fn nominal_ms(strategy: TickStrategy) -> f64 {
            let unit = match strategy.unit {
                TickUnit::Hour => HOUR_MS,
                TickUnit::Day => DAY_MS,
                TickUnit::Month => MONTH_MS,
                TickUnit::Year => YEAR_MS,
            };
            unit * f64::from(strategy.step)
        }
        let mut previous = f64::INFINITY;
        let mut px_per_year = 1.0;
        while px_per_year < 1.0e7 {
            let strategy = TickStrategy::select(Scale::per_year(px_per_year).unwrap());
            let span = nominal_ms(strategy);
            assert!(span <= previous, "{strategy:?} at {px_per_year} px/year");
            previous = span;
            px_per_year *= 1.1;
        }
    }

    #[test]
    fn day_ticks_snap_to_midnight_and_exclude_window_end() {
        let strategy = TickStrategy::for_unit(TickUnit::Day, 1);
        let visible = window(at(2024, 5, 16, 12, 0), at(2024, 5, 19, 0, 0));
        let ticks = generate_ticks(&strategy, visible, 0.0, Scale::per_day(300.0).unwrap(), 100);
        let labels: Vec<_> = ticks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["16", "17", "18"]);
        assert_eq!(ticks[0].instant, millis(at(2024, 5, 16, 0, 0)));
    }

    #[test]
    fn hour_ticks_step_from_the_first_visible_hour() {
        let scale = Scale::per_hour(20.0).unwrap();
        let strategy = TickStrategy::select(scale);
        assert_eq!(strategy.step, 4);
        let visible = window(at(2024, 5, 16, 5, 30), at(2024, 5, 16, 17, 0));
        let ticks = generate_ticks(&strategy, visible, 0.0, scale, 100);
        let labels: Vec<_> = ticks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["5 AM", "9 AM", "1 PM"]);
        assert_eq!(ticks[0].instant, millis(at(2024, 5, 16, 5, 0)));
    }

    #[test]
    fn quarter_ticks_start_at_the_first_visible_month() {
        let scale = Scale::per_day(3.0).unwrap();
        let strategy = TickStrategy::select(scale);
        let visible = window(at(2024, 5, 10, 0, 0), at(2025, 1, 1, 0, 0));
        let ticks = generate_ticks(&strategy, visible, 0.0, scale, 100);
        let labels: Vec<_> = ticks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["May", "Aug", "Nov"]);
    }

    #[test]
    fn decade_ticks_count_from_the_first_visible_year() {
        let scale = Scale::per_year(2.0).unwrap();
        let strategy = TickStrategy::select(scale);
        let visible = window(at(1987, 3, 1, 0, 0), at(2021, 1, 1, 0, 0));
        let ticks = generate_ticks(&strategy, visible, 0.0, scale, 100);
        let labels: Vec<_> = ticks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["1987", "1997", "2007", "2017"]);
    }

    #[test]
    fn tick_positions_are_measured_from_origin() {
        let scale = Scale::per_day(300.0).unwrap();
        let strategy = TickStrategy::for_unit(TickUnit::Day, 1);
        let origin = millis(at(2024, 1, 1, 0, 0));
        let visible = window(at(2024, 1, 3, 0, 0), at(2024, 1, 5, 0, 0));
        let ticks = generate_ticks(&strategy, visible, origin, scale, 100);
        assert_eq!(ticks.len(), 2);
        assert!((ticks[0].left - 600.0).abs() < 1e-6);
        assert!((ticks[1].left - 900.0).abs() < 1e-6);
    }

    #[test]
    fn tick_budget_truncates() {
        let scale = Scale::new(0.01).unwrap();
        let strategy = TickStrategy::select(scale);
        let visible = window(at(2020, 1, 1, 0, 0), at(2024, 1, 1, 0, 0));
        let ticks = generate_ticks(&strategy, visible, 0.0, scale, 10);
        assert_eq!(ticks.len(), 10);
    }

    #[test]
    fn brackets_are_half_open_months() {
        let scale = Scale::per_day(300.0).unwrap();
        let strategy = TickStrategy::for_unit(TickUnit::Day, 1);
        let visible = window(at(2024, 5, 20, 0, 0), at(2024, 7, 10, 0, 0));
        let brackets = generate_brackets(&strategy, visible, 0.0, scale, 100);
        let labels: Vec<_> = brackets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["May 2024", "June 2024", "July 2024"]);
        assert_eq!(brackets[0].start, millis(at(2024, 5, 1, 0, 0)));
        assert_eq!(brackets[0].end, brackets[1].start);
        assert!((brackets[1].width - 30.0 * 300.0).abs() < 1e-6);
    }

    #[test]
    fn hour_brackets_use_ordinal_dates() {
        let scale = Scale::new(0.01).unwrap();
        let strategy = TickStrategy::select(scale);
        let visible = window(at(2024, 5, 16, 22, 0), at(2024, 5, 17, 2, 0));
        let brackets = generate_brackets(&strategy, visible, 0.0, scale, 100);
        let labels: Vec<_> = brackets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["16th May 2024", "17th May 2024"]);
    }

    #[test]
    fn year_strategy_has_no_brackets() {
        let scale = Scale::per_year(150.0).unwrap();
        let strategy = TickStrategy::select(scale);
        let visible = window(at(2000, 1, 1, 0, 0), at(2010, 1, 1, 0, 0));
        assert!(generate_brackets(&strategy, visible, 0.0, scale, 100).is_empty());
    }

    #[test]
    fn ordinal_suffixes() {
        let cases = [
            (1, "1st"),
            (2, "2nd"),
            (3, "3rd"),
            (4, "4th"),
            (11, "11th"),
            (12, "12th"),
            (13, "13th"),
            (21, "21st"),
            (22, "22nd"),
            (23, "23rd"),
            (31, "31st"),
        ];
        for (day, expected) in cases {
            let label = LabelFormat::OrdinalDate.format(at(2024, 1, day, 0, 0));
            assert!(label.starts_with(expected), "{label}");
        }
    }
}
