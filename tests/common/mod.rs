// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use fah_bridge::protocol::{Jid, RpcCall, RpcValue};
use fah_bridge::transport::{OutboundStanza, Transport, TransportEvent, TransportSettings};
use fah_bridge::{StatusReport, TransportError};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Login used by the tests.
pub const LOGIN: &str = "installer";
/// Password used by the tests.
pub const PASSWORD: &str = "secret";
/// JID the mock SysAP hands out for [`LOGIN`].
pub const JID: &str = "2ab4f8e0-77a1-4c1e-9d52-0f3c4b6a7e11@busch-jaeger.de";

/// How the mock answers remote calls.
#[derive(Debug, Clone)]
pub enum CallBehavior {
    /// Answer with the given value.
    Respond(RpcValue),
    /// Fail with the given error.
    Fail(TransportError),
    /// Never answer.
    Hang,
}

/// How the mock answers a login.
#[derive(Debug, Clone)]
pub enum LoginBehavior {
    /// Accept the credentials.
    Accept,
    /// Reject with the given error.
    Fail(TransportError),
    /// Never answer.
    Hang,
    /// Drop the inbound stream, then never answer.
    DropStream,
}

/// In-memory transport recording everything the bridge does.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

struct MockInner {
    events: Mutex<Option<mpsc::Sender<TransportEvent>>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
    settings: Mutex<Option<TransportSettings>>,
    logins: Mutex<Vec<(String, String)>>,
    sent: Mutex<Vec<OutboundStanza>>,
    calls: Mutex<Vec<(Jid, RpcCall)>>,
    connect_error: Mutex<Option<TransportError>>,
    hang_connect: AtomicBool,
    login_behavior: Mutex<LoginBehavior>,
    call_behavior: Mutex<CallBehavior>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            inner: Arc::new(MockInner {
                events: Mutex::new(None),
                connects: AtomicUsize::new(0),
                closes: AtomicUsize::new(0),
                settings: Mutex::new(None),
                logins: Mutex::new(Vec::new()),
                sent: Mutex::new(Vec::new()),
                calls: Mutex::new(Vec::new()),
                connect_error: Mutex::new(None),
                hang_connect: AtomicBool::new(false),
                login_behavior: Mutex::new(LoginBehavior::Accept),
                call_behavior: Mutex::new(CallBehavior::Respond(RpcValue::Nil)),
            }),
        }
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_connect(&self, error: TransportError) {
        *self.inner.connect_error.lock() = Some(error);
    }

    pub fn hang_connect(&self) {
        self.inner.hang_connect.store(true, Ordering::SeqCst);
    }

    pub fn fail_login(&self, error: TransportError) {
        self.set_login_behavior(LoginBehavior::Fail(error));
    }

    pub fn set_login_behavior(&self, behavior: LoginBehavior) {
        *self.inner.login_behavior.lock() = behavior;
    }

    pub fn set_call_behavior(&self, behavior: CallBehavior) {
        *self.inner.call_behavior.lock() = behavior;
    }

    /// Pushes an inbound event into the current session.
    pub async fn emit(&self, event: TransportEvent) {
        let sender = self.inner.events.lock().clone();
        sender
            .expect("transport is not connected")
            .send(event)
            .await
            .expect("event loop is gone");
    }

    /// Ends the inbound stream as if the socket died.
    pub fn end_stream(&self) {
        self.inner.events.lock().take();
    }

    pub fn connects(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.inner.closes.load(Ordering::SeqCst)
    }

    pub fn settings(&self) -> Option<TransportSettings> {
        self.inner.settings.lock().clone()
    }

    pub fn logins(&self) -> Vec<(String, String)> {
        self.inner.logins.lock().clone()
    }

    pub fn sent(&self) -> Vec<OutboundStanza> {
        self.inner.sent.lock().clone()
    }

    pub fn calls(&self) -> Vec<(Jid, RpcCall)> {
        self.inner.calls.lock().clone()
    }
}

impl Transport for MockTransport {
    async fn connect(
        &self,
        settings: &TransportSettings,
        _jid: &Jid,
    ) -> Result<mpsc::Receiver<TransportEvent>, TransportError> {
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        *self.inner.settings.lock() = Some(settings.clone());
        if let Some(error) = self.inner.connect_error.lock().clone() {
            return Err(error);
        }
        if self.inner.hang_connect.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let (tx, rx) = mpsc::channel(64);
        *self.inner.events.lock() = Some(tx);
        Ok(rx)
    }

    async fn login(&self, user: &str, password: &str) -> Result<(), TransportError> {
        self.inner
            .logins
            .lock()
            .push((user.to_string(), password.to_string()));
        let behavior = self.inner.login_behavior.lock().clone();
        match behavior {
            LoginBehavior::Accept => Ok(()),
            LoginBehavior::Fail(error) => Err(error),
            LoginBehavior::Hang => std::future::pending().await,
            LoginBehavior::DropStream => {
                self.inner.events.lock().take();
                std::future::pending().await
            }
        }
    }

    async fn send(&self, stanza: OutboundStanza) -> Result<(), TransportError> {
        self.inner.sent.lock().push(stanza);
        Ok(())
    }

    async fn call(&self, to: &Jid, call: &RpcCall) -> Result<RpcValue, TransportError> {
        self.inner.calls.lock().push((to.clone(), call.clone()));
        let behavior = self.inner.call_behavior.lock().clone();
        match behavior {
            CallBehavior::Respond(value) => Ok(value),
            CallBehavior::Fail(error) => Err(error),
            CallBehavior::Hang => std::future::pending().await,
        }
    }

    async fn close(&self) {
        self.inner.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.events.lock().take();
    }
}

/// Starts a mock SysAP serving `settings.json` with the given accounts.
pub async fn sysap_with_users(users: &[(&str, &str)]) -> MockServer {
    let server = MockServer::start().await;
    let users: Vec<_> = users
        .iter()
        .map(|(name, jid)| serde_json::json!({ "name": name, "jid": jid }))
        .collect();

    Mock::given(method("GET"))
        .and(path("/settings.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "flags": { "version": "2.6.0" },
            "users": users
        })))
        .mount(&server)
        .await;

    server
}

/// Starts a mock SysAP that knows [`LOGIN`].
pub async fn sysap() -> MockServer {
    sysap_with_users(&[("guest", "guest@busch-jaeger.de"), (LOGIN, JID)]).await
}

/// Collects status reports.
#[derive(Clone, Default)]
pub struct StatusLog {
    reports: Arc<Mutex<Vec<StatusReport>>>,
}

impl StatusLog {
    pub fn listener(&self) -> impl Fn(&StatusReport) + Send + Sync + 'static {
        let reports = Arc::clone(&self.reports);
        move |report: &StatusReport| reports.lock().push(report.clone())
    }

    pub fn reports(&self) -> Vec<StatusReport> {
        self.reports.lock().clone()
    }

    pub fn last(&self) -> Option<StatusReport> {
        self.reports.lock().last().cloned()
    }
}

/// Polls `condition` until it holds or two seconds pass.
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
