use std::io::Write;

use ansi_term::{Colour, Style};
use anyhow::Result;

use crate::tracker::{report::UsageReport, Notice};

pub const NO_DATA: &str = "No log file found yet.";

fn paint(style: Style, text: &str, colors: bool) -> String {
    if colors {
        style.paint(text).to_string()
    } else {
        text.to_string()
    }
}

/// Transitions are shown in green, no-ops in yellow.
pub fn render_notice(notice: Notice, colors: bool) -> String {
    let style = if notice.is_transition() {
        Colour::Green.bold()
    } else {
        Colour::Yellow.bold()
    };
    format!("{}: {notice}", paint(style, notice.title(), colors))
}

pub fn render_warning(title: &str, message: &str, colors: bool) -> String {
    format!("{}: {message}", paint(Colour::Yellow.bold(), title, colors))
}

pub fn render_error(title: &str, message: &str, colors: bool) -> String {
    format!("{}: {message}", paint(Colour::Red.bold(), title, colors))
}

/// Used by the `stats` command. Json output prints `null` when nothing was tracked yet.
pub fn print_report(
    output: &mut impl Write,
    report: Option<UsageReport>,
    json: bool,
) -> Result<()> {
    match (report, json) {
        (report, true) => {
            serde_json::to_writer_pretty(&mut *output, &report)?;
            writeln!(output)?;
        }
        (Some(report), false) => write!(output, "{report}")?,
        (None, false) => writeln!(output, "{}", render_warning("No Data", NO_DATA, false))?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, NaiveDate};

    use super::{print_report, render_notice};
    use crate::tracker::{report::UsageReport, storage::entities::DailyUsageRecord, Notice};

    #[test]
    fn test_plain_notices() {
        assert_eq!(render_notice(Notice::Started, false), "Started: Tracking started!");
        assert_eq!(
            render_notice(Notice::AlreadyRunning, false),
            "Already Running: Tracking is already active."
        );
        assert_eq!(
            render_notice(Notice::NotRunning, false),
            "Not Running: Tracking was not active."
        );
    }

    #[test]
    fn test_colored_notice_contains_escape_codes() {
        let rendered = render_notice(Notice::Stopped, true);
        assert!(rendered.contains("\x1b["));
        assert!(rendered.ends_with("Tracking stopped."));
    }

    #[test]
    fn test_print_report_without_data() -> Result<()> {
        let mut output = vec![];
        print_report(&mut output, None, false)?;
        assert_eq!(String::from_utf8(output)?, "No Data: No log file found yet.\n");

        let mut output = vec![];
        print_report(&mut output, None, true)?;
        assert_eq!(String::from_utf8(output)?, "null\n");
        Ok(())
    }

    #[test]
    fn test_print_report_json() -> Result<()> {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let report = UsageReport::build(
            vec![DailyUsageRecord::new(day, Duration::minutes(5))],
            day,
        );
        let mut output = vec![];
        print_report(&mut output, Some(report), true)?;

        let value: serde_json::Value = serde_json::from_slice(&output)?;
        assert_eq!(value["today_total"], "0:05:00");
        assert_eq!(value["recent"][0]["date"], "2024-01-01");
        Ok(())
    }
}
