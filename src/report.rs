//! Stdout report formatting.
//!
//! Verbose mode prints one line per output; quiet mode with no change
//! requested prints the average percentage across all outputs. Diagnostics
//! never go through here — they stay on stderr via the logger.

use crate::fade::FadePlan;
use crate::output::{BrightnessRange, OutputId};
use crate::resolver::ReadingSet;

/// Format one verbose report line:
/// `[screen:output] min, cur, max (pct%)`, plus ` => new (newpct%)` when a
/// change was written.
pub fn reading_line(id: &OutputId, range: &BrightnessRange, new: Option<i32>) -> String {
    let mut line = format!(
        "[{}:{}] {}, {}, {} ({:.2}%)",
        id.screen,
        id.output,
        range.min,
        range.current,
        range.max,
        range.current_percent()
    );
    if let Some(value) = new {
        line.push_str(&format!(" => {} ({:.2}%)", value, range.percent_of(value)));
    }
    line
}

/// Average brightness percentage across all readings.
///
/// Callers must not pass an empty set.
pub fn average_percent(readings: &ReadingSet) -> f64 {
    let sum: f64 = readings.iter().map(|(_, r)| r.current_percent()).sum();
    sum / readings.len() as f64
}

/// Print the report for one invocation.
pub fn print_report(readings: &ReadingSet, plan: Option<&FadePlan>, verbose: bool) {
    if verbose {
        for (id, range) in readings.iter() {
            let new = plan.and_then(|p| p.get(id)).copied();
            println!("{}", reading_line(id, range, new));
        }
    } else if plan.is_none() && !readings.is_empty() {
        println!("{:.6}", average_percent(readings));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(min: i32, current: i32, max: i32) -> BrightnessRange {
        BrightnessRange { min, current, max }
    }

    #[test]
    fn test_reading_line_without_change() {
        let id = OutputId { screen: 105, output: 68 };
        let line = reading_line(&id, &reading(0, 50, 100), None);
        assert_eq!(line, "[105:68] 0, 50, 100 (50.00%)");
    }

    #[test]
    fn test_reading_line_with_change() {
        let id = OutputId { screen: 105, output: 68 };
        let line = reading_line(&id, &reading(0, 50, 100), Some(30));
        assert_eq!(line, "[105:68] 0, 50, 100 (50.00%) => 30 (30.00%)");
    }

    #[test]
    fn test_reading_line_offset_range_percentages() {
        let id = OutputId { screen: 0, output: 1 };
        let line = reading_line(&id, &reading(10, 60, 110), Some(10));
        assert_eq!(line, "[0:1] 10, 60, 110 (50.00%) => 10 (0.00%)");
    }

    #[test]
    fn test_average_percent_over_mixed_ranges() {
        let mut readings = ReadingSet::new(Some(1));
        readings.insert(
            OutputId { screen: 0, output: 1 },
            reading(0, 25, 100),
        );
        readings.insert(
            OutputId { screen: 0, output: 2 },
            reading(0, 75, 100),
        );
        assert_eq!(average_percent(&readings), 50.0);
    }

    #[test]
    fn test_average_percent_six_decimal_rendering() {
        let mut readings = ReadingSet::new(Some(1));
        readings.insert(OutputId { screen: 0, output: 1 }, reading(0, 1, 3));
        let rendered = format!("{:.6}", average_percent(&readings));
        assert_eq!(rendered, "33.333333");
    }
}
