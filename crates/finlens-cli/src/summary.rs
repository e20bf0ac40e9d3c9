//! Console tables for batch results

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use finlens_report::{AnalysisRecord, RatioEntry};

const MISSING: &str = "n/a";

pub fn ratio_table(entries: &[RatioEntry]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Company",
        "Margin %",
        "ROE %",
        "ROA %",
        "Current",
        "D/E",
        "Turnover",
    ]);

    for entry in entries {
        match entry {
            RatioEntry::Record(r) => {
                table.add_row(vec![
                    Cell::new(&r.company),
                    Cell::new(format!("{:.2}", r.net_profit_margin_percent)),
                    Cell::new(format!("{:.2}", r.return_on_equity_percent)),
                    Cell::new(format!("{:.2}", r.return_on_assets_percent)),
                    Cell::new(format!("{:.2}", r.current_ratio)),
                    Cell::new(format!("{:.2}", r.debt_to_equity_ratio)),
                    Cell::new(format!("{:.2}", r.asset_turnover_ratio)),
                ]);
            }
            RatioEntry::Failure(f) => {
                let mut row = vec![Cell::new(&f.company), Cell::new(&f.error)];
                row.extend((0..5).map(|_| Cell::new("")));
                table.add_row(row);
            }
        }
    }
    table
}

pub fn analysis_table(records: &[AnalysisRecord]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Company", "Health", "Grade", "Outlook", "Data"]);

    for record in records {
        let data = if record.is_failure() {
            record.error().unwrap_or(MISSING)
        } else if record.search_performed() {
            "live search"
        } else {
            "model knowledge"
        };
        table.add_row(vec![
            record.company().unwrap_or(MISSING).to_string(),
            record
                .overall_health_score()
                .map_or_else(|| MISSING.to_string(), |score| format!("{score:.0}/100")),
            record.performance_grade().unwrap_or(MISSING).to_string(),
            record.investment_outlook().unwrap_or(MISSING).to_string(),
            data.to_string(),
        ]);
    }
    table
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use finlens_report::{ComputationFailure, RatioRecord};
    use serde_json::json;

    #[test]
    fn test_ratio_table_rows() {
        let entries = vec![
            RatioEntry::Record(RatioRecord {
                company: "Acme Ltd".to_string(),
                current_ratio: 3.5,
                ..RatioRecord::default()
            }),
            RatioEntry::Failure(ComputationFailure {
                company: "Broken Co".to_string(),
                source_file: "b.pdf".to_string(),
                error: "equity is not a number".to_string(),
            }),
        ];

        let rendered = ratio_table(&entries).to_string();
        assert!(rendered.contains("Acme Ltd"));
        assert!(rendered.contains("3.50"));
        assert!(rendered.contains("Broken Co"));
    }

    #[test]
    fn test_analysis_table_marks_data_source() {
        let grounded = AnalysisRecord::from_value(json!({
            "company": "Acme Ltd",
            "overall_health_score": 82,
            "performance_grade": "A",
            "grounding_enabled": true,
            "search_performed": true
        }))
        .unwrap();
        let failed = AnalysisRecord::failure("Beta plc", "quota");

        let rendered = analysis_table(&[grounded, failed]).to_string();
        assert!(rendered.contains("82/100"));
        assert!(rendered.contains("live search"));
        assert!(rendered.contains("Beta plc"));
        assert!(rendered.contains(MISSING));
    }
}
