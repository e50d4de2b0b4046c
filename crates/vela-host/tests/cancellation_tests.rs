//! Destroy semantics: interrupting in-flight builds, tearing down the
//! current context, and restarting after a full teardown.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{bundle, expect_no_ready, gated_harness, harness, recv_ready, ui_call, RecordingSurface};
use vela_host::{HostOptions, LifecycleState};
use vela_sdk::Surface;

#[test]
fn test_destroy_mid_build_prevents_publish() {
    let (h, gate) = gated_harness(HostOptions::default());
    let surface = RecordingSurface::new("root", h.events.clone());

    let host = h.host.clone();
    let s: Arc<dyn Surface> = surface;
    ui_call(&h.host, move || {
        host.attach_surface(s);
        host.create_initial_context(bundle("app"));
    });

    // Destroy while the worker is parked inside the build.
    let host = h.host.clone();
    ui_call(&h.host, move || host.destroy());
    assert!(!h.host.has_started_creating_initial_context());

    gate.open(1);

    // The abandoned build's engine is destroyed without ever publishing.
    assert!(h.events.wait_for("destroy:engine1", Duration::from_secs(5)));
    expect_no_ready(&h.ready_rx, Duration::from_millis(200));
    assert!(h.host.current_context().is_none());
    assert!(!h.events.contains("bridge:engine1"));
    assert_eq!(h.events.count_prefix("bind:"), 0);
    assert_eq!(h.events.count_prefix("notify_bound:"), 0);

    // A cancelled build is not a fault.
    assert_eq!(h.faults.count(), 0);
}

#[test]
fn test_destroy_allows_initial_create_again() {
    let (h, gate) = gated_harness(HostOptions::default());

    let host = h.host.clone();
    ui_call(&h.host, move || host.create_initial_context(bundle("first")));
    let host = h.host.clone();
    ui_call(&h.host, move || host.destroy());

    gate.open(2);
    assert!(h.events.wait_for("destroy:engine1", Duration::from_secs(5)));

    let host = h.host.clone();
    ui_call(&h.host, move || host.create_initial_context(bundle("second")));
    recv_ready(&h.ready_rx);
    assert!(h.events.contains("build:second"));
    assert!(h.host.current_context().is_some());
}

#[test]
fn test_destroy_discards_pending_request() {
    let (h, gate) = gated_harness(HostOptions::default());

    let host = h.host.clone();
    let strategy: Arc<dyn vela_sdk::EngineStrategy> = h.strategy.clone();
    ui_call(&h.host, move || {
        host.create_initial_context(bundle("a"));
        host.recreate_context(strategy, bundle("b"));
        host.destroy();
    });

    gate.open(2);
    assert!(h.events.wait_for("destroy:engine1", Duration::from_secs(5)));
    expect_no_ready(&h.ready_rx, Duration::from_millis(200));

    // Only the interrupted build's engine ever existed.
    assert_eq!(h.events.count_prefix("create:"), 1);
    assert!(!h.events.contains("build:b"));
}

#[test]
fn test_destroy_tears_down_live_context() {
    let h = harness(HostOptions::default());
    let surface = RecordingSurface::new("root", h.events.clone());

    let host = h.host.clone();
    let s: Arc<dyn Surface> = surface;
    ui_call(&h.host, move || {
        host.attach_surface(s);
        host.create_initial_context(bundle("app"));
    });
    recv_ready(&h.ready_rx);

    let host = h.host.clone();
    ui_call(&h.host, move || {
        host.on_host_resume();
        host.destroy();
    });

    // Resumed contexts are paused on the way down, then unmounted, then
    // the engine is destroyed.
    let events = h.events.snapshot();
    let pause = events.iter().position(|e| e == "pause:engine1").unwrap();
    let unbind = events.iter().position(|e| e == "unbind:root").unwrap();
    let destroy = events.iter().position(|e| e == "destroy:engine1").unwrap();
    assert!(pause < unbind && unbind < destroy);

    assert!(h.host.current_context().is_none());
    assert_eq!(h.host.lifecycle_state(), LifecycleState::BeforeCreate);
}

#[test]
fn test_destroy_without_context_is_harmless() {
    let h = harness(HostOptions::default());
    let host = h.host.clone();
    ui_call(&h.host, move || host.destroy());
    assert!(h.host.current_context().is_none());
    assert_eq!(h.events.snapshot().len(), 0);
}
