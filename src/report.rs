use std::fmt::Write;

use serde_json::json;

use crate::config::Config;
use crate::dashboard::{AdminView, Analysis, Answer, Page};
use crate::gate::Access;
use crate::models::{Area, Issue};
use crate::prompt;

pub fn build_page(config: &Config, page: &Page) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Water Body Companion");
    let _ = writeln!(output, "Area: {}", page.area);
    let _ = writeln!(output);
    output.push_str(&build_alerts(&page.alerts));

    match page.access {
        Access::Admin => output.push_str(&build_admin_panel(config, page.area, page.admin_view.as_ref())),
        Access::Public { wrong_password } => {
            output.push_str(&build_public_panel(config, wrong_password, page.answer.as_ref()))
        }
    }

    output
}

/// The urgent alert block; empty when the scan found nothing.
pub fn build_alerts(alerts: &Analysis) -> String {
    let mut output = String::new();

    match alerts {
        Analysis::Issues(issues) if issues.is_empty() => {}
        Analysis::Issues(issues) => {
            let _ = writeln!(output, "## URGENT WATER ALERT (Today)");
            for issue in issues {
                write_issue(&mut output, issue);
            }
            let _ = writeln!(output);
        }
        Analysis::Unavailable(reason) => {
            let _ = writeln!(output, "Alert scan unavailable right now ({reason}).");
            let _ = writeln!(output);
        }
    }

    output
}

/// `{"status": "ok", "issues": [...]}`, or `"unavailable"` with the reason
/// so a failed scan never reads as an empty result.
pub fn build_alerts_json(alerts: &Analysis) -> serde_json::Result<String> {
    let value = match alerts {
        Analysis::Issues(issues) => json!({ "status": "ok", "issues": issues }),
        Analysis::Unavailable(reason) => json!({ "status": "unavailable", "reason": reason }),
    };
    serde_json::to_string_pretty(&value)
}

pub fn build_admin_panel(config: &Config, area: Area, view: Option<&AdminView>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Admin access granted for {area}");
    let _ = writeln!(output, "## Admin Panel");
    let _ = writeln!(output, "Admin form: {}", config.admin_form_link);

    if let Some(view) = view {
        let _ = writeln!(output);
        output.push_str(&build_admin_view(view));
    }

    output
}

pub fn build_admin_view(view: &AdminView) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Today's Reports");
    if view.reports.is_empty() {
        let _ = writeln!(output, "No reports found for today in this area.");
        return output;
    }

    output.push_str(&prompt::render_table(&view.reports));
    let _ = writeln!(output);

    match &view.review {
        Some(Analysis::Issues(issues)) if !issues.is_empty() => {
            for issue in issues {
                let _ = writeln!(output, "Serious issue detected!");
                write_issue(&mut output, issue);
            }
        }
        Some(Analysis::Unavailable(reason)) => {
            let _ = writeln!(output, "AI analysis unavailable right now ({reason}).");
        }
        _ => {
            let _ = writeln!(output, "No serious issues found.");
        }
    }

    output
}

pub fn build_public_panel(config: &Config, wrong_password: bool, answer: Option<&Answer>) -> String {
    let mut output = String::new();

    if wrong_password {
        let _ = writeln!(output, "Wrong admin password. Showing public user options.");
    }
    let _ = writeln!(output, "## General User Panel");
    let _ = writeln!(output, "Submit a water body report: {}", config.general_form_link);

    if let Some(answer) = answer {
        let _ = writeln!(output);
        output.push_str(&build_answer(answer));
    }

    output
}

pub fn build_answer(answer: &Answer) -> String {
    let mut output = String::new();

    match answer {
        Answer::Reply(text) => {
            let _ = writeln!(output, "### AI Response");
            let _ = writeln!(output, "{}", text.trim_end());
        }
        Answer::Unavailable(reason) => {
            let _ = writeln!(output, "The AI could not answer right now ({reason}).");
        }
    }

    output
}

pub fn build_forms(config: &Config) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Submit a water body report: {}", config.general_form_link);
    let _ = writeln!(output, "Admin form: {}", config.admin_form_link);
    output
}

fn write_issue(output: &mut String, issue: &Issue) {
    let _ = writeln!(output, "- Location: {}", issue.location);
    let _ = writeln!(output, "  Problem: {}", issue.problem);
    let _ = writeln!(output, "  AI Reason: {}", issue.reason);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Report, ReportTable};
    use chrono::NaiveDate;

    fn issue() -> Issue {
        Issue {
            location: "Powai Lake".into(),
            problem: "fish kill".into(),
            reason: "low oxygen".into(),
        }
    }

    fn reports() -> ReportTable {
        ReportTable::new(
            vec!["Timestamp".into(), "Problem".into()],
            vec![Report {
                timestamp: NaiveDate::from_ymd_opt(2026, 10, 16)
                    .unwrap()
                    .and_hms_opt(6, 0, 0)
                    .unwrap(),
                values: vec!["10/16/2026 06:00:00".into(), "fish kill".into()],
            }],
        )
    }

    #[test]
    fn empty_scan_renders_nothing() {
        assert!(build_alerts(&Analysis::Issues(Vec::new())).is_empty());
    }

    #[test]
    fn alerts_list_each_issue() {
        let text = build_alerts(&Analysis::Issues(vec![issue(), Issue::default()]));
        assert!(text.starts_with("## URGENT WATER ALERT (Today)\n"));
        assert!(text.contains("- Location: Powai Lake\n  Problem: fish kill\n  AI Reason: low oxygen\n"));
        assert!(text.contains("- Location: N/A"));
    }

    #[test]
    fn unavailable_scan_is_a_notice() {
        let text = build_alerts(&Analysis::Unavailable("model service returned 429: quota".into()));
        assert!(text.contains("Alert scan unavailable right now (model service returned 429: quota)."));
    }

    #[test]
    fn alerts_json_lists_issues() {
        let text = build_alerts_json(&Analysis::Issues(vec![issue()])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["issues"][0]["location"], "Powai Lake");
        assert_eq!(value["issues"][0]["reason"], "low oxygen");
    }

    #[test]
    fn alerts_json_marks_failed_scan() {
        let text = build_alerts_json(&Analysis::Unavailable("GEMINI_API_KEY is not set".into())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["status"], "unavailable");
        assert_eq!(value["reason"], "GEMINI_API_KEY is not set");
        assert!(value.get("issues").is_none());
    }

    #[test]
    fn admin_view_without_reports() {
        let view = AdminView {
            reports: reports().with_reports(Vec::new()),
            review: None,
        };
        let text = build_admin_view(&view);
        assert!(text.contains("No reports found for today in this area."));
        assert!(!text.contains("Timestamp"));
    }

    #[test]
    fn admin_view_with_clean_review() {
        let view = AdminView {
            reports: reports(),
            review: Some(Analysis::Issues(Vec::new())),
        };
        let text = build_admin_view(&view);
        assert!(text.contains("10/16/2026 06:00:00  fish kill"));
        assert!(text.ends_with("No serious issues found.\n"));
    }

    #[test]
    fn admin_view_with_serious_review() {
        let view = AdminView {
            reports: reports(),
            review: Some(Analysis::Issues(vec![issue()])),
        };
        let text = build_admin_view(&view);
        assert!(text.contains("Serious issue detected!\n- Location: Powai Lake"));
    }

    #[test]
    fn page_routes_wrong_password_to_public_panel() {
        let config = Config::default();
        let page = Page {
            area: Area::Mumbai,
            alerts: Analysis::Issues(Vec::new()),
            access: Access::Public { wrong_password: true },
            admin_view: None,
            answer: Some(Answer::Reply("Boil before drinking.\n".into())),
        };
        let text = build_page(&config, &page);

        assert!(text.contains("Area: Mumbai"));
        assert!(text.contains("Wrong admin password. Showing public user options."));
        assert!(text.contains(&config.general_form_link));
        assert!(!text.contains(&config.admin_form_link));
        assert!(text.ends_with("### AI Response\nBoil before drinking.\n"));
    }

    #[test]
    fn admin_page_shows_admin_form() {
        let config = Config::default();
        let page = Page {
            area: Area::Delhi,
            alerts: Analysis::Issues(vec![issue()]),
            access: Access::Admin,
            admin_view: None,
            answer: None,
        };
        let text = build_page(&config, &page);

        assert!(text.contains("Admin access granted for Delhi"));
        assert!(text.contains(&config.admin_form_link));
        assert!(!text.contains("Wrong admin password"));
        assert!(text.contains("## URGENT WATER ALERT (Today)"));
    }
}
