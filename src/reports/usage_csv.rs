use crate::models::UsageReportRow;

pub const USAGE_CSV_HEADER: [&str; 7] = [
    "Date",
    "Project",
    "Client",
    "Expert",
    "Duration (min)",
    "Credits Used",
    "Notes",
];

/// Quote a field when it holds a separator, quote or line break.
fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn push_record(out: &mut String, fields: &[String]) {
    let line: Vec<String> = fields.iter().map(|f| field(f)).collect();
    out.push_str(&line.join(","));
    out.push_str("\r\n");
}

/// Render the usage report as CSV, one line per usage record.
pub fn usage_csv(rows: &[UsageReportRow]) -> String {
    let mut out = String::new();
    let header: Vec<String> = USAGE_CSV_HEADER.iter().map(|h| h.to_string()).collect();
    push_record(&mut out, &header);
    for row in rows {
        push_record(
            &mut out,
            &[
                row.call_date.format("%Y-%m-%d").to_string(),
                row.project_name.clone(),
                row.client_name.clone().unwrap_or_default(),
                row.expert_name.clone(),
                row.duration_minutes.to_string(),
                format!("{:.2}", row.credits_used),
                row.notes.clone().unwrap_or_default(),
            ],
        );
    }
    out
}

/// Download name for an export generated on `day`.
pub fn usage_csv_filename(day: chrono::NaiveDate) -> String {
    format!("usage-report-{}.csv", day.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn row(notes: Option<&str>) -> UsageReportRow {
        UsageReportRow {
            id: Uuid::new_v4(),
            call_date: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            project_id: Uuid::new_v4(),
            project_name: "Lithium, Chile".into(),
            client_name: None,
            expert_id: Uuid::new_v4(),
            expert_name: "Marta Reis".into(),
            duration_minutes: 53,
            credits_used: 1.0,
            notes: notes.map(String::from),
        }
    }

    #[test]
    fn header_columns_are_fixed() {
        let csv = usage_csv(&[]);
        assert_eq!(csv, "Date,Project,Client,Expert,Duration (min),Credits Used,Notes\r\n");
    }

    #[test]
    fn quotes_fields_that_need_it() {
        let csv = usage_csv(&[row(Some("said \"maybe\"\nfollow up"))]);
        let body = csv.split_once("\r\n").unwrap().1;
        assert_eq!(
            body,
            "2025-04-02,\"Lithium, Chile\",,Marta Reis,53,1.00,\"said \"\"maybe\"\"\nfollow up\"\r\n"
        );
    }

    #[test]
    fn filename_carries_date() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();
        assert_eq!(usage_csv_filename(day), "usage-report-2025-01-09.csv");
    }
}
