use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::gemini::{GenerateError, TextGenerator};
use crate::models::{Issue, ReportTable, MISSING_FIELD};
use crate::prompt::{self, SERIOUS_DELIMITER};

const LOCATION_LABEL: &str = "Location:";
const PROBLEM_LABEL: &str = "Problem:";
const REASON_LABEL: &str = "Reason:";

/// Asks the model which of `reports` are serious. An empty batch never
/// reaches the model.
pub async fn analyze_reports<G>(generator: &G, reports: &ReportTable) -> Result<Vec<Issue>, GenerateError>
where
    G: TextGenerator + ?Sized,
{
    if reports.is_empty() {
        return Ok(Vec::new());
    }

    let run_id = Uuid::new_v4();
    let span = info_span!("analysis", %run_id, reports = reports.len());
    async move {
        let reply = generator.generate(&prompt::serious_issue_prompt(reports)).await?;
        let issues = parse_issues(&reply);
        info!(issues = issues.len(), "analysis complete");
        Ok(issues)
    }
    .instrument(span)
    .await
}

/// Free-text public question; blank questions return `None` without a call.
pub async fn answer_question<G>(generator: &G, question: &str) -> Result<Option<String>, GenerateError>
where
    G: TextGenerator + ?Sized,
{
    if question.trim().is_empty() {
        return Ok(None);
    }
    let reply = generator.generate(&prompt::question_prompt(question)).await?;
    Ok(Some(reply))
}

/// Reads serious issues back out of a reply written to the
/// `prompt::serious_issue_prompt` template.
///
/// Every block after a `Status: SERIOUS` line is one issue, whatever it
/// contains. Within a block the first line carrying each label wins, so a
/// repeated `Location:` keeps its first value rather than its last. Labels
/// the reply left out stay at the placeholder.
pub fn parse_issues(reply: &str) -> Vec<Issue> {
    let reply = reply.trim();
    if !reply.to_uppercase().contains("SERIOUS") {
        return Vec::new();
    }

    let issues: Vec<Issue> = reply.split(SERIOUS_DELIMITER).skip(1).map(parse_block).collect();

    let incomplete = issues.iter().filter(|issue| has_placeholder(issue)).count();
    if incomplete > 0 {
        warn!(
            incomplete,
            total = issues.len(),
            "model reply did not follow the issue template"
        );
    }

    issues
}

fn parse_block(block: &str) -> Issue {
    let mut location = None;
    let mut problem = None;
    let mut reason = None;

    for line in block.trim().lines() {
        let (slot, label) = if line.contains(LOCATION_LABEL) {
            (&mut location, LOCATION_LABEL)
        } else if line.contains(PROBLEM_LABEL) {
            (&mut problem, PROBLEM_LABEL)
        } else if line.contains(REASON_LABEL) {
            (&mut reason, REASON_LABEL)
        } else {
            continue;
        };

        if slot.is_none() {
            *slot = line.rsplit_once(label).map(|(_, value)| value.trim().to_string());
        }
    }

    let fallback = Issue::default();
    Issue {
        location: location.unwrap_or(fallback.location),
        problem: problem.unwrap_or(fallback.problem),
        reason: reason.unwrap_or(fallback.reason),
    }
}

fn has_placeholder(issue: &Issue) -> bool {
    [&issue.location, &issue.problem, &issue.reason]
        .iter()
        .any(|field| field.as_str() == MISSING_FIELD)
}
