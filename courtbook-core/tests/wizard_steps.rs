mod support;

use chrono::{NaiveDate, NaiveTime, Weekday};

use courtbook_core::{
    ContactFormFiller, ErrorKind, PageLayout, ResolvedTarget, WizardDriver, WizardState,
};
use support::{ScriptedPage, fast_waits, profile};

fn wednesday_seven_pm() -> ResolvedTarget {
    ResolvedTarget {
        date: NaiveDate::from_ymd_opt(2026, 10, 21).unwrap(),
        weekday: Weekday::Wed,
        time_of_day: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn steps_advance_through_every_state() {
    let page = ScriptedPage::happy();
    let layout = PageLayout::default();
    let target = wednesday_seven_pm();
    let mut wizard = WizardDriver::new(&page, &layout, fast_waits());

    wizard.select_date(&target).await.unwrap();
    assert_eq!(wizard.state(), &WizardState::DateSelected);
    wizard.select_time(&target).await.unwrap();
    assert_eq!(wizard.state(), &WizardState::TimeSelected);
    wizard.advance_to_form().await.unwrap();
    assert_eq!(wizard.state(), &WizardState::TimeSelected);
    wizard.fill_form(&profile("primary@example.com")).await.unwrap();
    assert_eq!(wizard.state(), &WizardState::FormFilled);
    wizard.submit().await.unwrap();
    assert_eq!(wizard.state(), &WizardState::Submitted);
}

#[tokio::test]
async fn skipping_a_step_is_an_invalid_transition() {
    let page = ScriptedPage::happy();
    let layout = PageLayout::default();
    let mut wizard = WizardDriver::new(&page, &layout, fast_waits());

    let err = wizard.select_time(&wednesday_seven_pm()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert!(matches!(wizard.state(), WizardState::Failed(_)));
    assert!(page.activated().is_empty());
}

#[tokio::test]
async fn form_cannot_be_filled_before_it_opens() {
    let page = ScriptedPage::happy();
    let layout = PageLayout::default();
    let target = wednesday_seven_pm();
    let mut wizard = WizardDriver::new(&page, &layout, fast_waits());

    wizard.select_date(&target).await.unwrap();
    wizard.select_time(&target).await.unwrap();
    let err = wizard.fill_form(&profile("primary@example.com")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert!(page.writes().is_empty());
}

#[tokio::test]
async fn failed_wizard_refuses_further_steps() {
    let page = ScriptedPage::happy();
    page.state.lock().days.clear();
    let layout = PageLayout::default();
    let target = wednesday_seven_pm();
    let mut wizard = WizardDriver::new(&page, &layout, fast_waits());

    let err = wizard.select_date(&target).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ElementNotFound);

    let err = wizard.select_date(&target).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
}

#[tokio::test]
async fn disabled_next_control_times_out() {
    let page = ScriptedPage::happy();
    page.state.lock().next_enabled = false;
    let layout = PageLayout::default();
    let target = wednesday_seven_pm();
    let mut wizard = WizardDriver::new(&page, &layout, fast_waits());

    wizard.select_date(&target).await.unwrap();
    wizard.select_time(&target).await.unwrap();
    let err = wizard.advance_to_form().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StepTimeout);
    assert!(err.to_string().contains("advance-to-form"), "{err}");
}

#[tokio::test]
async fn missing_next_control_is_not_found() {
    let page = ScriptedPage::happy();
    page.state.lock().show_next = false;
    let layout = PageLayout::default();
    let target = wednesday_seven_pm();
    let mut wizard = WizardDriver::new(&page, &layout, fast_waits());

    wizard.select_date(&target).await.unwrap();
    wizard.select_time(&target).await.unwrap();
    let err = wizard.advance_to_form().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ElementNotFound);
}

#[tokio::test]
async fn form_that_never_renders_is_not_found() {
    let page = ScriptedPage::happy();
    page.state.lock().show_form = false;
    let layout = PageLayout::default();
    let target = wednesday_seven_pm();
    let mut wizard = WizardDriver::new(&page, &layout, fast_waits());

    wizard.select_date(&target).await.unwrap();
    wizard.select_time(&target).await.unwrap();
    let err = wizard.advance_to_form().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ElementNotFound);
}

#[tokio::test]
async fn filler_writes_every_field_in_order() {
    let page = ScriptedPage::happy();
    page.state.lock().activated.push("next".into());
    let layout = PageLayout::default();
    let mut contact = profile("primary@example.com");
    contact.full_name = "  Sam Rivera ".into();

    let written = ContactFormFiller::new(&layout.fields)
        .fill(&page, &contact)
        .await
        .unwrap();

    assert_eq!(written, 6);
    let ids: Vec<String> = page.writes().into_iter().map(|(id, _)| id).collect();
    assert_eq!(
        ids,
        vec![
            "full_name_input",
            "email_input",
            "1bT3Iu2abRAKqjda6jqLu",
            "tCGwp8nKnr6eDQuqH1Z7F",
            "eMqYw4Nb4Cd2DDrjBwbbm",
            "B-IUGCRB09hRLI1QXjzeI",
        ]
    );
    assert_eq!(page.writes()[0].1, "Sam Rivera");
}

#[tokio::test]
async fn filler_refuses_blank_email_without_writing() {
    let page = ScriptedPage::happy();
    page.state.lock().activated.push("next".into());
    let layout = PageLayout::default();

    let err = ContactFormFiller::new(&layout.fields)
        .fill(&page, &profile("   "))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    assert!(page.writes().is_empty());
}

#[tokio::test]
async fn filler_reports_missing_field_as_not_found() {
    let page = ScriptedPage::happy();
    let layout = PageLayout::default();

    let err = ContactFormFiller::new(&layout.fields)
        .fill(&page, &profile("primary@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ElementNotFound);
}
