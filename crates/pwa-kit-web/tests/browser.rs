//! Browser-specific WASM tests
//!
//! Run with `wasm-pack test --headless --chrome crates/pwa-kit-web`. The
//! test runner serves from localhost, which counts as a secure context, so
//! `navigator.serviceWorker` is present.

#![cfg(target_arch = "wasm32")]

use std::cell::Cell;
use std::rc::Rc;

use js_sys::{Object, Reflect};
use pwa_kit::PreflightPolicy;
use pwa_kit::logging::LogLevel;
use pwa_kit_web::{PwaService, WasmPwaOptions, init_console_logging};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::Event;

wasm_bindgen_test_configure!(run_in_browser);

fn options(pairs: &[(&str, &str)]) -> JsValue {
    let object = Object::new();
    for (key, value) in pairs {
        Reflect::set(&object, &JsValue::from_str(key), &JsValue::from_str(value)).unwrap();
    }
    object.into()
}

fn kind_of(error: &JsValue) -> Option<String> {
    Reflect::get(error, &JsValue::from_str("kind"))
        .ok()
        .and_then(|kind| kind.as_string())
}

#[wasm_bindgen_test]
fn test_options_from_js_object() {
    let parsed = WasmPwaOptions::from_js(options(&[
        ("url", "/app/sw.js"),
        ("preflight", "validate"),
        ("updateMessage", "Refresh now?"),
    ]))
    .unwrap();

    assert_eq!(parsed.url.as_deref(), Some("/app/sw.js"));
    assert_eq!(parsed.scope, None);
    assert_eq!(parsed.preflight, Some(PreflightPolicy::Validate));
    assert_eq!(parsed.update_message.as_deref(), Some("Refresh now?"));
}

#[wasm_bindgen_test]
fn test_missing_options_use_defaults() {
    let service = PwaService::new(JsValue::UNDEFINED).unwrap();
    assert_eq!(service.url(), "./sw.js");
    assert_eq!(service.scope(), "./");
}

#[wasm_bindgen_test]
fn test_empty_scope_throws_invalid_config() {
    let error = PwaService::new(options(&[("scope", "")])).err().unwrap();

    assert_eq!(kind_of(&error).as_deref(), Some("invalidConfig"));
    let field = Reflect::get(&error, &JsValue::from_str("field")).unwrap();
    assert_eq!(field.as_string().as_deref(), Some("scope"));
}

#[wasm_bindgen_test]
fn test_unknown_preflight_throws() {
    let error = PwaService::new(options(&[("preflight", "sometimes")]))
        .err()
        .unwrap();
    assert_eq!(kind_of(&error).as_deref(), Some("invalidConfig"));
}

#[wasm_bindgen_test]
fn test_test_page_is_not_installed() {
    let service = PwaService::new(JsValue::UNDEFINED).unwrap();
    assert!(!service.is_installed());
}

#[wasm_bindgen_test]
async fn test_missing_script_rejects_with_registration_failed() {
    let service = PwaService::new(options(&[("url", "./does-not-exist-sw.js")])).unwrap();

    let error = JsFuture::from(service.register()).await.unwrap_err();

    assert_eq!(kind_of(&error).as_deref(), Some("registrationFailed"));
}

#[wasm_bindgen_test]
async fn test_validate_preflight_reports_missing_script() {
    let service = PwaService::new(options(&[
        ("url", "./does-not-exist-sw.js"),
        ("preflight", "validate"),
    ]))
    .unwrap();

    let error = JsFuture::from(service.register()).await.unwrap_err();

    assert_eq!(kind_of(&error).as_deref(), Some("scriptNotFound"));
}

#[wasm_bindgen_test]
async fn test_start_never_rejects() {
    let service = PwaService::new(options(&[("url", "./does-not-exist-sw.js")])).unwrap();

    let report = JsFuture::from(service.start()).await.unwrap();

    let registered = Reflect::get(&report, &JsValue::from_str("registered")).unwrap();
    assert_eq!(registered.as_bool(), Some(false));
    let error = Reflect::get(&report, &JsValue::from_str("error")).unwrap();
    assert!(kind_of(&error).is_some());
}

#[wasm_bindgen_test]
async fn test_not_registered_after_failed_registration() {
    let service = PwaService::new(options(&[
        ("url", "./does-not-exist-sw.js"),
        ("scope", "./nothing-here/"),
    ]))
    .unwrap();
    let _ = JsFuture::from(service.register()).await;

    let registered = JsFuture::from(service.is_registered()).await.unwrap();
    assert_eq!(registered.as_bool(), Some(false));
}

#[wasm_bindgen_test]
fn test_console_logging_keeps_first_subscriber() {
    // The start hook or an earlier test may already have installed one.
    init_console_logging(LogLevel::Debug);
    assert!(!init_console_logging(LogLevel::Info));
}

#[wasm_bindgen_test]
async fn test_failed_registration_detaches_container_listeners() {
    let window = web_sys::window().unwrap();
    let container = window.navigator().service_worker();

    let service = PwaService::new(options(&[("url", "./does-not-exist-sw.js")])).unwrap();
    assert!(JsFuture::from(service.register()).await.is_err());
    drop(service);

    // Exceptions thrown by listeners during dispatch surface as window errors.
    let errors = Rc::new(Cell::new(0));
    let counter = errors.clone();
    let on_error = Closure::<dyn FnMut(Event)>::new(move |_| counter.set(counter.get() + 1));
    window
        .add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref())
        .unwrap();

    let event = Event::new("controllerchange").unwrap();
    container.dispatch_event(&event).unwrap();

    window
        .remove_event_listener_with_callback("error", on_error.as_ref().unchecked_ref())
        .unwrap();
    assert_eq!(errors.get(), 0);
}
