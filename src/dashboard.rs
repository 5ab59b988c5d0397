use std::time::Instant;

use anyhow::Context;
use tracing::{info, warn};

use crate::analyzer;
use crate::cache::ReportCache;
use crate::config::Config;
use crate::filter;
use crate::gate::{self, Access};
use crate::gemini::TextGenerator;
use crate::models::{Area, Issue, ReportTable};
use crate::sheet::ReportSource;

/// Outcome of one model pass over a batch of reports.
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    Issues(Vec<Issue>),
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Reply(String),
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminView {
    pub reports: ReportTable,
    /// `None` when there were no reports to review.
    pub review: Option<Analysis>,
}

/// What the user asked for in one round trip.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    pub password: String,
    pub view_reports: bool,
    pub question: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub area: Area,
    pub alerts: Analysis,
    pub access: Access,
    pub admin_view: Option<AdminView>,
    pub answer: Option<Answer>,
}

pub struct Dashboard {
    config: Config,
    source: Box<dyn ReportSource>,
    generator: Box<dyn TextGenerator>,
    cache: ReportCache,
}

impl Dashboard {
    pub fn new(config: Config, source: Box<dyn ReportSource>, generator: Box<dyn TextGenerator>) -> Self {
        let cache = ReportCache::new(config.refresh_interval);
        Self {
            config,
            source,
            generator,
            cache,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn access(&self, area: Area, password: &str) -> Access {
        gate::check_access(&self.config, area, password)
    }

    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    pub async fn todays_reports(&mut self, area: Area) -> anyhow::Result<ReportTable> {
        let table = self
            .cache
            .refresh(self.source.as_ref(), Instant::now())
            .await
            .with_context(|| format!("failed to load reports from {}", self.source.describe()))?;
        let todays = filter::filter_today_area(table, area.name(), &self.config.area_match);
        info!(area = %area, total = table.len(), matched = todays.len(), "filtered reports");
        Ok(todays)
    }

    /// Runs the serious-issue pass; a failing model call becomes a notice.
    pub async fn analyze(&self, reports: &ReportTable) -> Analysis {
        match analyzer::analyze_reports(self.generator.as_ref(), reports).await {
            Ok(issues) => Analysis::Issues(issues),
            Err(err) => {
                warn!(error = %err, "report analysis failed");
                Analysis::Unavailable(err.to_string())
            }
        }
    }

    pub async fn alerts(&mut self, area: Area) -> anyhow::Result<Analysis> {
        let todays = self.todays_reports(area).await?;
        Ok(self.analyze(&todays).await)
    }

    /// Admin "view today's reports": the table plus a fresh review. Callers
    /// check access first.
    pub async fn admin_view(&mut self, area: Area) -> anyhow::Result<AdminView> {
        let reports = self.todays_reports(area).await?;
        let review = if reports.is_empty() {
            None
        } else {
            Some(self.analyze(&reports).await)
        };
        Ok(AdminView { reports, review })
    }

    pub async fn ask(&self, question: &str) -> Option<Answer> {
        match analyzer::answer_question(self.generator.as_ref(), question).await {
            Ok(reply) => reply.map(Answer::Reply),
            Err(err) => {
                warn!(error = %err, "question could not be answered");
                Some(Answer::Unavailable(err.to_string()))
            }
        }
    }

    /// One full page: alert scan for the area, then the admin or public
    /// panel depending on the password.
    pub async fn interact(&mut self, area: Area, request: &Interaction) -> anyhow::Result<Page> {
        let todays = self.todays_reports(area).await?;
        let alerts = self.analyze(&todays).await;
        let access = self.access(area, &request.password);

        let mut page = Page {
            area,
            alerts,
            access,
            admin_view: None,
            answer: None,
        };

        if access.is_admin() {
            if request.view_reports {
                let review = if todays.is_empty() {
                    None
                } else {
                    Some(self.analyze(&todays).await)
                };
                page.admin_view = Some(AdminView {
                    reports: todays,
                    review,
                });
            }
        } else if let Some(question) = &request.question {
            page.answer = self.ask(question).await;
        }

        Ok(page)
    }
}
