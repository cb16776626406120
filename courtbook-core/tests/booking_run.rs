mod support;

use chrono::{NaiveDate, NaiveDateTime};

use courtbook_core::{ErrorKind, FailureReport, RunCoordinator, plan_run};
use support::{PageState, SITE, ScriptedFactory, ScriptedPage, config, day, slot};

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

#[tokio::test]
async fn monday_evening_trigger_books_wednesday() {
    let factory = ScriptedFactory::new(ScriptedPage::happy());
    let page = factory.page.clone();
    let journal = factory.journal.clone();
    let coordinator = RunCoordinator::new(config(), factory);

    let outcome = coordinator
        .run("Monday 19:00", at("2026-10-19 19:00"))
        .await
        .unwrap();

    assert_eq!(outcome.target_date, NaiveDate::from_ymd_opt(2026, 10, 21).unwrap());
    assert_eq!(outcome.target_weekday, "Wednesday");
    assert_eq!(outcome.target_time, "19:00");
    assert_eq!(outcome.slot_text.as_deref(), Some("7:00pm"));
    assert_eq!(outcome.contact_email, "primary@example.com");

    assert_eq!(page.state.lock().opened, vec![SITE.to_string()]);
    assert_eq!(page.activated(), vec!["day-21", "slot-1900", "next", "schedule"]);
    assert_eq!(page.writes().len(), 6);
    assert_eq!(journal.events(), vec!["acquire", "release"]);
}

#[tokio::test]
async fn second_monday_rule_uses_secondary_contact() {
    let mut state = PageState {
        days: vec![day("day-21", "2026-10-21", true)],
        slots: vec![slot("slot-2000", "8:00 PM", true)],
        next_enabled: true,
        show_next: true,
        show_form: true,
        confirms: true,
        ..PageState::default()
    };
    state.slots.insert(0, slot("slot-1900", "7:00 PM", true));
    let factory = ScriptedFactory::new(ScriptedPage::with(state));
    let page = factory.page.clone();
    let coordinator = RunCoordinator::new(config(), factory);

    let outcome = coordinator
        .run("Monday 20:00", at("2026-10-19 20:00"))
        .await
        .unwrap();

    assert_eq!(outcome.contact_email, "secondary@example.com");
    assert!(page.activated().contains(&"slot-2000".to_string()));
    assert!(
        page.writes()
            .contains(&("email_input".to_string(), "secondary@example.com".to_string()))
    );
}

#[tokio::test]
async fn missing_slot_fails_and_still_releases() {
    let state = PageState {
        days: vec![day("day-21", "2026-10-21", true)],
        slots: vec![slot("slot-1800", "6:00pm", true)],
        next_enabled: true,
        show_next: true,
        show_form: true,
        confirms: true,
        ..PageState::default()
    };
    let factory = ScriptedFactory::new(ScriptedPage::with(state));
    let page = factory.page.clone();
    let journal = factory.journal.clone();
    let coordinator = RunCoordinator::new(config(), factory);

    let err = coordinator
        .run("Monday 19:00", at("2026-10-19 19:00"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ElementNotFound);
    assert!(page.writes().is_empty());
    assert_eq!(journal.events(), vec!["acquire", "release"]);

    let report = FailureReport::from(&err);
    assert_eq!(report.kind, ErrorKind::ElementNotFound);
    assert!(report.detail.contains("select-time"), "{}", report.detail);
}

#[tokio::test]
async fn unknown_trigger_never_acquires_a_browser() {
    let factory = ScriptedFactory::new(ScriptedPage::happy());
    let journal = factory.journal.clone();
    let coordinator = RunCoordinator::new(config(), factory);

    for key in ["Tuesday 10:00", "Monday 7pm", "Funday 19:00"] {
        let err = coordinator.run(key, at("2026-10-19 19:00")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTrigger, "{key}");
    }
    assert!(journal.events().is_empty());
}

#[tokio::test]
async fn incomplete_profile_fails_before_browser_work() {
    let mut cfg = config();
    let mut contacts = std::collections::BTreeMap::new();
    contacts.insert("primary".to_string(), support::profile(""));
    contacts.insert("secondary".to_string(), support::profile("secondary@example.com"));
    cfg.contacts = courtbook_core::ContactDirectory::new(contacts);

    let factory = ScriptedFactory::new(ScriptedPage::happy());
    let page = factory.page.clone();
    let journal = factory.journal.clone();
    let coordinator = RunCoordinator::new(cfg, factory);

    let err = coordinator
        .run("Monday 19:00", at("2026-10-19 19:00"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    assert!(err.to_string().contains("email"), "{err}");
    assert!(journal.events().is_empty());
    assert!(page.writes().is_empty());
}

#[tokio::test]
async fn invalid_site_url_fails_before_browser_work() {
    let mut cfg = config();
    cfg.site_url = String::new();
    let factory = ScriptedFactory::new(ScriptedPage::happy());
    let journal = factory.journal.clone();
    let coordinator = RunCoordinator::new(cfg, factory);

    let err = coordinator
        .run("Monday 19:00", at("2026-10-19 19:00"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    assert!(journal.events().is_empty());
}

#[tokio::test]
async fn browser_start_failure_is_reported() {
    let mut factory = ScriptedFactory::new(ScriptedPage::happy());
    factory.fail_acquire = true;
    let coordinator = RunCoordinator::new(config(), factory);

    let err = coordinator
        .run("Thursday 16:00", at("2026-10-22 16:00"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Browser);
}

#[tokio::test]
async fn unconfirmed_submission_is_a_submission_error() {
    let page = ScriptedPage::happy();
    page.state.lock().confirms = false;
    let factory = ScriptedFactory::new(page);
    let journal = factory.journal.clone();
    let coordinator = RunCoordinator::new(config(), factory);

    let err = coordinator
        .run("Monday 19:00", at("2026-10-19 19:00"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SubmissionError);
    assert_eq!(journal.events(), vec!["acquire", "release"]);
}

#[test]
fn late_thursday_fire_targets_saturday() {
    let cfg = config().with_trigger_tolerance(10);
    let plan = plan_run(&cfg, "Thursday 16:05", at("2026-10-22 16:05")).unwrap();

    assert_eq!(plan.rule.trigger.to_string(), "Thursday 16:00");
    assert_eq!(plan.target.date, NaiveDate::from_ymd_opt(2026, 10, 24).unwrap());
    assert_eq!(plan.target.time_string(), "16:00");
    assert_eq!(plan.profile.email, "primary@example.com");
}

#[test]
fn plan_before_trigger_still_targets_this_week() {
    let cfg = config();
    let plan = plan_run(&cfg, "Monday 19:00", at("2026-10-19 08:30")).unwrap();
    assert_eq!(plan.target.date, NaiveDate::from_ymd_opt(2026, 10, 21).unwrap());
}

#[test]
fn clock_run_with_seconds_books_the_snapped_week() {
    let cfg = config().with_trigger_tolerance(60);
    let now = at("2026-10-22 18:00") + chrono::Duration::seconds(30);
    let plan = plan_run(&cfg, "Thursday 18:00", now).unwrap();

    assert_eq!(plan.rule.trigger.to_string(), "Thursday 17:00");
    assert_eq!(plan.target.date, NaiveDate::from_ymd_opt(2026, 10, 24).unwrap());
    assert_eq!(plan.target.time_string(), "17:00");
}

#[test]
fn tolerance_wider_than_grace_books_the_snapped_week() {
    let cfg = config().with_trigger_tolerance(90);
    let plan = plan_run(&cfg, "Thursday 18:10", at("2026-10-22 18:10")).unwrap();

    assert_eq!(plan.rule.trigger.to_string(), "Thursday 17:00");
    assert_eq!(plan.target.date, NaiveDate::from_ymd_opt(2026, 10, 24).unwrap());
}
