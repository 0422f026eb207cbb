//! Renders a daily-count series into a chart service URL. Pure; the caller
//! supplies the data and its date range.

use chrono::NaiveDate;

const SYMBOLS: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const ENDPOINT: &str = "http://chart.apis.google.com/chart";

/// Scales each value against the series maximum onto the 62-symbol simple
/// encoding. A max of 0 is treated as 1, so an all-zero series still
/// renders; the mid-axis label is suppressed in that case.
pub fn build(data: &[u64], range: (NaiveDate, NaiveDate)) -> String {
    let max_value = data.iter().copied().max().unwrap_or(0).max(1);
    let mid_label = if max_value != 1 {
        (max_value / 2).to_string()
    } else {
        String::new()
    };
    let encoded: String = data
        .iter()
        .map(|&count| SYMBOLS[(61 * count / max_value) as usize] as char)
        .collect();

    format!(
        "{ENDPOINT}?cht=lc&chs=640x200&chd=s:{encoded}&chco=224499&chxt=x,y&\
chxl=0:|{start}|{end}|1:|0|{mid}|{max}&chm=B,76A4FB,0,0,0&chf=bg,s,cccccc",
        start = range.0.format("%b %d"),
        end = range.1.format("%b %d"),
        mid = mid_label,
        max = max_value,
    )
}
