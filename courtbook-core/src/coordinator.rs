//! One booking run, start to finish.
//!
//! Everything that can be decided without a browser (config validation,
//! trigger lookup, target resolution, profile selection) is decided first,
//! so bad input never launches one. The session is then acquired, the
//! wizard driven in order, and the session released on every path before the
//! result is returned.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{error, info};

use crate::config::BookingConfig;
use crate::error::BookingError;
use crate::page::BookingPage;
use crate::profile::ContactProfile;
use crate::resolver::{ResolvedTarget, TriggerResolver};
use crate::schedule::BookingRule;
use crate::session::{BrowserSession, SessionFactory};
use crate::trigger::{TriggerKey, weekday_name};
use crate::wizard::{Step, WizardDriver};

/// Structured success record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingOutcome {
    pub trigger: String,
    pub target_date: NaiveDate,
    pub target_weekday: String,
    pub target_time: String,
    pub slot_text: Option<String>,
    pub contact_email: String,
}

/// What a run will do, computed before any browser work.
#[derive(Debug, Clone)]
pub struct RunPlan<'c> {
    pub key: TriggerKey,
    pub rule: &'c BookingRule,
    pub target: ResolvedTarget,
    pub profile: &'c ContactProfile,
}

pub struct RunCoordinator<F: SessionFactory> {
    config: BookingConfig,
    factory: F,
}

impl<F: SessionFactory> RunCoordinator<F> {
    pub fn new(config: BookingConfig, factory: F) -> Self {
        Self { config, factory }
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    /// Parse the key, find its rule and profile, and resolve the target.
    pub fn plan(&self, trigger_key: &str, now: NaiveDateTime) -> Result<RunPlan<'_>, BookingError> {
        plan_run(&self.config, trigger_key, now)
    }

    pub async fn run(&self, trigger_key: &str, now: NaiveDateTime) -> Result<BookingOutcome, BookingError> {
        self.config.validate()?;
        let plan = self.plan(trigger_key, now)?;
        plan.profile.validate()?;
        info!(
            trigger = %plan.rule.trigger,
            target = %plan.target,
            contact = %plan.rule.contact,
            "starting booking run"
        );

        let session = self.factory.acquire().await?;
        let result = self.drive(session.page(), &plan).await;

        if let Err(release_err) = session.release().await {
            error!(error = %release_err, "failed to release browser session");
        }

        match &result {
            Ok(outcome) => info!(
                target_date = %outcome.target_date,
                target_time = %outcome.target_time,
                contact = %outcome.contact_email,
                "booking confirmed"
            ),
            Err(err) => error!(
                kind = ?err.kind(),
                target_date = %plan.target.date_string(),
                target_time = %plan.target.time_string(),
                error = %err,
                "booking run failed"
            ),
        }
        result
    }

    async fn drive<P: BookingPage>(&self, page: &P, plan: &RunPlan<'_>) -> Result<BookingOutcome, BookingError> {
        page.open(&self.config.site_url)
            .await
            .map_err(|e| BookingError::from_page(Step::OpenSite, e))?;

        let mut wizard = WizardDriver::new(page, &self.config.layout, self.config.waits);
        wizard.select_date(&plan.target).await?;
        wizard.select_time(&plan.target).await?;
        wizard.advance_to_form().await?;
        wizard.fill_form(plan.profile).await?;
        wizard.submit().await?;

        Ok(BookingOutcome {
            trigger: plan.rule.trigger.to_string(),
            target_date: plan.target.date,
            target_weekday: weekday_name(plan.target.weekday).to_string(),
            target_time: plan.target.time_string(),
            slot_text: wizard.selected_slot().map(str::to_string),
            contact_email: plan.profile.email.clone(),
        })
    }
}

/// Browser-free half of a run; also backs dry-run resolution.
pub fn plan_run<'c>(config: &'c BookingConfig, trigger_key: &str, now: NaiveDateTime) -> Result<RunPlan<'c>, BookingError> {
    let key: TriggerKey = trigger_key.parse()?;
    let rule = config.schedule.lookup(&key, config.trigger_tolerance_minutes)?;
    let target = TriggerResolver::new(config.late_grace).resolve_key(rule, &key, now);
    let profile = config.contacts.for_rule(rule)?;
    Ok(RunPlan {
        key,
        rule,
        target,
        profile,
    })
}
