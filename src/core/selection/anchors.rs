use chrono::{Days, NaiveDate};
use tracing::warn;

use crate::error::{Error, Result};
use crate::types::Anchor;

/// Split the inclusive period `[date_start, date_end]` into `n_anchors` equal
/// subintervals and place one anchor at each midpoint (truncated to a day).
///
/// Anchors are strictly increasing. When the period holds fewer days than
/// anchors, a midpoint that does not advance past its predecessor is shifted to
/// the predecessor plus one day, so trailing anchors may land after `date_end`.
pub fn schedule_anchors(
    date_start: NaiveDate,
    date_end: NaiveDate,
    n_anchors: usize,
    window_days: u32,
) -> Result<Vec<Anchor>> {
    if n_anchors == 0 {
        return Err(Error::invalid_config("n_anchors", n_anchors));
    }
    if date_end < date_start {
        return Err(Error::invalid_config(
            "date_end",
            format!("{date_end} is before date_start {date_start}"),
        ));
    }

    let span_days = (date_end - date_start).num_days() + 1;
    let n = n_anchors as i64;

    let mut anchors: Vec<Anchor> = Vec::with_capacity(n_anchors);
    for i in 0..n {
        let offset = (span_days * (2 * i + 1) / (2 * n)) as u64;
        let mut target_date = date_start
            .checked_add_days(Days::new(offset))
            .ok_or_else(|| Error::invalid_config("date_end", date_end))?;
        if let Some(prev) = anchors.last() {
            if target_date <= prev.target_date {
                target_date = prev
                    .target_date
                    .checked_add_days(Days::new(1))
                    .ok_or_else(|| {
                        Error::invalid_config(
                            "n_anchors",
                            format!("{n_anchors} anchors do not fit before {}", NaiveDate::MAX),
                        )
                    })?;
            }
        }
        anchors.push(Anchor {
            index: i as usize,
            target_date,
            window_days,
        });
    }

    if let Some(last) = anchors.last() {
        if last.target_date > date_end {
            warn!(
                "Period {}..{} is shorter than {} anchors; last anchor shifted to {}",
                date_start, date_end, n_anchors, last.target_date
            );
        }
    }

    Ok(anchors)
}
