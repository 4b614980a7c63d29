use chrono::NaiveDate;
use clubroll_core::{ClubRoll, DailySummary};

use crate::commands::common::{parse_date, require_session};
use crate::error::CliError;

pub fn format_summary_lines(date: NaiveDate, summary: &DailySummary) -> Vec<String> {
    vec![
        format!("Summary for {date}"),
        format!("Clubs:          {}", summary.clubs),
        format!("Roll calls:     {}/{}", summary.completed, summary.clubs),
        format!("Members:        {}", summary.total_members),
        format!("Absent:         {}", summary.absent),
        format!("On leave:       {}", summary.excused),
    ]
}

pub fn run_summary(roll: &ClubRoll, date: Option<&str>, as_json: bool) -> Result<(), CliError> {
    require_session(roll)?;
    let date = parse_date(date)?;
    let summary = roll.daily_summary(date);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in format_summary_lines(date, &summary) {
            println!("{line}");
        }
    }
    Ok(())
}
