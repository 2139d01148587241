//! Collapses the provider's 3-hour forecast samples into one averaged
//! entry per calendar day.

use chrono::{Days, NaiveDate};

use crate::model::{ForecastDay, ForecastSample};

/// Number of calendar days in the forecast window (today included).
pub const WINDOW_DAYS: u64 = 7;

/// Average `samples` per calendar day over the window starting at
/// `today`. Samples outside the window are dropped; days without any
/// sample produce no entry. Output is ascending by date, so its length
/// is at most [`WINDOW_DAYS`].
///
/// Pure function of its inputs: `today` is passed in rather than read
/// from the clock.
pub fn aggregate(samples: &[ForecastSample], description: &str, today: NaiveDate) -> Vec<ForecastDay> {
    let mut days = Vec::new();

    for offset in 0..WINDOW_DAYS {
        let Some(date) = today.checked_add_days(Days::new(offset)) else {
            continue;
        };

        let temps: Vec<f64> = samples
            .iter()
            .filter(|s| s.at.date() == date)
            .map(|s| s.temp_c)
            .collect();

        if temps.is_empty() {
            continue;
        }

        let mean = temps.iter().sum::<f64>() / temps.len() as f64;

        days.push(ForecastDay {
            date,
            temp_c: round2(mean),
            description: description.to_string(),
        });
    }

    days
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
