//! End-to-end behavior of the coordinator against a scripted host.

use std::rc::Rc;

use pwa_kit::test_utils::{FakeHost, HostCall, LogCapture};
use pwa_kit::{
    HostError, LifecycleEvent, LifecycleEventKind, PreflightPolicy, PwaConfig, RegistrationError,
    ScriptProbe, ServiceWorkerCoordinator, UPDATE_PROMPT_MESSAGE,
};
use tracing::Level;

fn coordinator(host: &Rc<FakeHost>) -> ServiceWorkerCoordinator {
    ServiceWorkerCoordinator::new(host.clone(), PwaConfig::new("./sw.js", "./"))
}

fn validating(host: &Rc<FakeHost>) -> ServiceWorkerCoordinator {
    ServiceWorkerCoordinator::new(
        host.clone(),
        PwaConfig::default().with_preflight(PreflightPolicy::Validate),
    )
}

// ============================================================================
// register()
// ============================================================================

#[tokio::test]
async fn register_fails_fast_when_unsupported() {
    let host = Rc::new(FakeHost::new().unsupported());
    let sw = validating(&host);

    let result = sw.register().await;

    assert_eq!(result, Err(RegistrationError::NotSupported));
    assert!(host.calls().is_empty(), "no probe or registration expected");
}

#[tokio::test]
async fn listeners_attached_before_registration_call() {
    let host = Rc::new(FakeHost::new());
    let sw = coordinator(&host);

    sw.register().await.expect("registration should succeed");

    let calls = host.calls();
    let register_at = calls
        .iter()
        .position(|c| *c == HostCall::Register)
        .expect("register was called");
    let attached: Vec<_> = calls[..register_at]
        .iter()
        .filter_map(|c| match c {
            HostCall::AddListener(kind) => Some(*kind),
            _ => None,
        })
        .collect();

    assert_eq!(attached, LifecycleEventKind::ALL.to_vec());
    assert_eq!(
        calls[0],
        HostCall::CreateWorker {
            url: "./sw.js".into(),
            scope: "./".into()
        }
    );
}

#[tokio::test]
async fn successful_registration_attaches_exactly_five_listeners() {
    let host = Rc::new(FakeHost::new());
    let sw = coordinator(&host);
    let (logs, _guard) = LogCapture::install();

    assert_eq!(sw.register().await, Ok(()));

    assert_eq!(host.listener_count(), 5);
    assert!(
        logs.at(Level::INFO)
            .iter()
            .any(|l| l.message.contains("registered successfully"))
    );
    assert!(logs.at(Level::ERROR).is_empty());
}

#[tokio::test]
async fn platform_rejection_is_logged_once_and_returned() {
    let host = Rc::new(FakeHost::new().rejecting_registration("404 Not Found"));
    let sw = coordinator(&host);
    let (logs, _guard) = LogCapture::install();

    let err = sw.register().await.unwrap_err();

    assert_eq!(
        err,
        RegistrationError::RegistrationFailed {
            cause: "404 Not Found".into()
        }
    );
    let errors = logs.at(Level::ERROR);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("404 Not Found"));
}

// ============================================================================
// Update prompt
// ============================================================================

#[tokio::test]
async fn installed_update_confirmed_reloads_once() {
    let host = Rc::new(FakeHost::new());
    let sw = coordinator(&host);
    sw.register().await.unwrap();

    host.emit(LifecycleEvent::new(LifecycleEventKind::Installed, true));

    assert_eq!(
        host.count(|c| *c == HostCall::Confirm(UPDATE_PROMPT_MESSAGE.to_string())),
        1
    );
    assert_eq!(host.count(|c| *c == HostCall::Reload), 1);
}

#[tokio::test]
async fn installed_update_declined_never_reloads() {
    let host = Rc::new(FakeHost::new().declining_updates());
    let sw = coordinator(&host);
    sw.register().await.unwrap();

    host.emit(LifecycleEvent::new(LifecycleEventKind::Installed, true));

    assert_eq!(host.count(|c| matches!(c, HostCall::Confirm(_))), 1);
    assert_eq!(host.count(|c| *c == HostCall::Reload), 0);
}

#[tokio::test]
async fn first_install_does_not_prompt() {
    let host = Rc::new(FakeHost::new());
    let sw = coordinator(&host);
    sw.register().await.unwrap();

    host.emit(LifecycleEvent::new(LifecycleEventKind::Installed, false));
    host.emit(LifecycleEvent::new(LifecycleEventKind::Activated, false));
    host.emit(LifecycleEvent::new(LifecycleEventKind::Controlling, false));

    assert_eq!(host.count(|c| matches!(c, HostCall::Confirm(_))), 0);
}

#[tokio::test]
async fn waiting_always_prompts() {
    for is_update in [false, true] {
        let host = Rc::new(FakeHost::new());
        let sw = coordinator(&host);
        sw.register().await.unwrap();

        host.emit(LifecycleEvent::new(LifecycleEventKind::Waiting, is_update));

        assert_eq!(
            host.count(|c| matches!(c, HostCall::Confirm(_))),
            1,
            "is_update = {is_update}"
        );
    }
}

#[tokio::test]
async fn worker_error_event_is_logged() {
    let host = Rc::new(FakeHost::new());
    let sw = coordinator(&host);
    sw.register().await.unwrap();
    let (logs, _guard) = LogCapture::install();

    host.emit(LifecycleEvent::error("ReferenceError: self is not defined", false));

    let errors = logs.at(Level::ERROR);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("ReferenceError"));
}

// ============================================================================
// Preflight policy
// ============================================================================

#[tokio::test]
async fn skip_policy_never_probes() {
    let host = Rc::new(FakeHost::new());
    let sw = coordinator(&host);

    sw.register().await.unwrap();

    assert_eq!(host.count(|c| matches!(c, HostCall::Probe(_))), 0);
}

#[tokio::test]
async fn preflight_missing_script() {
    let host = Rc::new(FakeHost::new().with_probe(Ok(ScriptProbe::new(404, Some("text/html")))));
    let sw = validating(&host);

    let err = sw.register().await.unwrap_err();

    assert_eq!(
        err,
        RegistrationError::ScriptNotFound {
            url: "./sw.js".into(),
            status: 404
        }
    );
    assert_eq!(host.count(|c| matches!(c, HostCall::CreateWorker { .. })), 0);
}

#[tokio::test]
async fn preflight_wrong_mime_type() {
    let host = Rc::new(FakeHost::new().with_probe(Ok(ScriptProbe::new(200, Some("text/html")))));
    let sw = validating(&host);

    let err = sw.register().await.unwrap_err();

    assert!(matches!(
        err,
        RegistrationError::InvalidMimeType { ref content_type, .. } if content_type == "text/html"
    ));
    assert_eq!(host.count(|c| *c == HostCall::Register), 0);
}

#[tokio::test]
async fn preflight_passes_for_javascript() {
    let host = Rc::new(FakeHost::new().with_probe(Ok(ScriptProbe::new(
        200,
        Some("text/javascript; charset=utf-8"),
    ))));
    let sw = validating(&host);

    sw.register().await.unwrap();

    let calls = host.calls();
    assert_eq!(calls[0], HostCall::Probe("./sw.js".into()));
    assert!(calls.contains(&HostCall::Register));
}

// ============================================================================
// is_installed() / is_registered()
// ============================================================================

#[test]
fn installed_when_display_mode_standalone() {
    let host = Rc::new(FakeHost::new().with_display_mode(Ok(true)));
    assert!(coordinator(&host).is_installed());
}

#[test]
fn installed_when_ios_standalone_flag_set() {
    let host = Rc::new(
        FakeHost::new()
            .with_display_mode(Ok(false))
            .with_ios_standalone(Ok(true)),
    );
    assert!(coordinator(&host).is_installed());
}

#[test]
fn not_installed_in_browser_tab() {
    let host = Rc::new(FakeHost::new());
    assert!(!coordinator(&host).is_installed());
}

#[test]
fn installed_detection_error_is_false() {
    let host = Rc::new(
        FakeHost::new().with_display_mode(Err(HostError::Rejected("matchMedia error".into()))),
    );
    assert!(!coordinator(&host).is_installed());
}

#[test]
fn ios_flag_counts_when_display_mode_query_fails() {
    let (logs, _guard) = LogCapture::install();
    let host = Rc::new(
        FakeHost::new()
            .with_display_mode(Err(HostError::Rejected("matchMedia threw".into())))
            .with_ios_standalone(Ok(true)),
    );

    assert!(coordinator(&host).is_installed());
    assert!(
        logs.at(Level::DEBUG)
            .iter()
            .any(|l| l.message.contains("Display mode detection failed"))
    );
}

#[tokio::test]
async fn registered_when_registration_exists() {
    let host = Rc::new(FakeHost::new().with_existing_registration(Ok(true)));
    let sw = coordinator(&host);

    assert!(sw.is_registered().await);
    assert_eq!(host.calls(), vec![HostCall::HasRegistration("./".into())]);
}

#[tokio::test]
async fn not_registered_when_none_exists() {
    let host = Rc::new(FakeHost::new().with_existing_registration(Ok(false)));
    assert!(!coordinator(&host).is_registered().await);
}

#[tokio::test]
async fn not_registered_when_unsupported() {
    let host = Rc::new(FakeHost::new().unsupported());
    let sw = coordinator(&host);

    assert!(!sw.is_registered().await);
    assert!(host.calls().is_empty());
}

#[tokio::test]
async fn not_registered_when_lookup_fails() {
    let host = Rc::new(
        FakeHost::new().with_existing_registration(Err(HostError::Rejected(
            "Registration error".into(),
        ))),
    );
    assert!(!coordinator(&host).is_registered().await);
}
