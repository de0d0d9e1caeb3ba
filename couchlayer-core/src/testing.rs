//! Test doubles shared by the unit tests of this crate.

use async_trait::async_trait;
use std::{collections::VecDeque, sync::Mutex};

use crate::{
    error::{DatabaseError, DatabaseResult},
    transport::{Method, Request, Response, Transport},
};

/// Replays canned outcomes and records what was sent.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    outcomes: Mutex<VecDeque<DatabaseResult<Response>>>,
    pub(crate) sent: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub(crate) fn with(outcomes: Vec<DatabaseResult<Response>>) -> Self {
        Self { outcomes: Mutex::new(outcomes.into()), sent: Mutex::default() }
    }

    pub(crate) fn methods(&self) -> Vec<Method> {
        self.sent.lock().unwrap().iter().map(|r| r.method).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: Request) -> DatabaseResult<Response> {
        self.sent.lock().unwrap().push(request);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Response::new(500, "script exhausted")))
    }

    fn resource_url(&self, path: &[String]) -> String {
        format!("http://couch.test/{}", path.join("/"))
    }
}

pub(crate) fn refused() -> DatabaseError {
    DatabaseError::transport(
        "connection refused",
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
    )
}
