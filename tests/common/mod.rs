#![allow(dead_code)]

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tradepost::api::v1::{recover_error, routes};
use tradepost::application_impl::FakeTokenVerifier;
use tradepost::domain_model::*;
use tradepost::infra_memory::MemoryStore;
use tradepost::server::*;
use tradepost::settings::Settings;
use warp::Filter;
use warp::http::StatusCode;

/// Full stack over the memory backend with fake tokens and local rooms.
pub struct Harness {
    pub server: Arc<Server>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub async fn new() -> Harness {
        let mut settings = Settings::default();
        settings.contact.sweep_interval_secs = 0;
        settings.moderation.blocked_words = vec!["scam".to_owned()];

        let store = Arc::new(MemoryStore::new());
        let server = Server::with_storage(&settings, Storage::Memory(store.clone()))
            .await
            .unwrap();
        Harness {
            server: Arc::new(server),
            store,
        }
    }

    pub async fn call(
        &self,
        method: &str,
        path: &str,
        user: Option<UserId>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let api = routes(self.server.clone()).recover(recover_error);

        let mut request = warp::test::request().method(method).path(path);
        if let Some(user) = user {
            request = request.header(
                "authorization",
                format!("Bearer {}", FakeTokenVerifier::token_for(user)),
            );
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.reply(&api).await;
        let status = response.status();
        let json = serde_json::from_slice(response.body()).unwrap();
        (status, json)
    }

    /// Attach an in-process socket client and send `join` for `user`.
    pub async fn connect(&self, user: UserId) -> Client {
        let (to_server, c2s) = mpsc::channel(64);
        let (s2c, from_server) = mpsc::channel(64);
        self.server
            .connection_acceptor
            .accept_connection(Box::new(s2c), Box::new(c2s), user)
            .await
            .unwrap();
        let mut client = Client {
            to_server,
            from_server,
        };
        client.emit(&format!(r#"{{"event":"join","data":"{user}"}}"#)).await;
        client
            .next_matching(|e| matches!(e, S2CEvent::UserOnline(u) if *u == user))
            .await;
        client
    }

    /// Like `connect` for a user who is already online elsewhere, so no
    /// presence broadcast follows the join.
    pub async fn connect_another(&self, user: UserId) -> Client {
        let (to_server, c2s) = mpsc::channel(64);
        let (s2c, from_server) = mpsc::channel(64);
        self.server
            .connection_acceptor
            .accept_connection(Box::new(s2c), Box::new(c2s), user)
            .await
            .unwrap();
        let mut client = Client {
            to_server,
            from_server,
        };
        client.emit(&format!(r#"{{"event":"join","data":"{user}"}}"#)).await;
        // frames are handled in order, so the error reply means the join is done
        client.emit("garbage").await;
        client
            .next_matching(|e| matches!(e, S2CEvent::Error(_)))
            .await;
        client
    }
}

pub struct Client {
    to_server: mpsc::Sender<ConnMessage>,
    from_server: mpsc::Receiver<ConnMessage>,
}

impl Client {
    pub async fn emit(&self, frame: &str) {
        self.to_server
            .send(ConnMessage::Text(frame.to_owned()))
            .await
            .unwrap();
    }

    pub async fn recv(&mut self) -> S2CEvent {
        let msg = tokio::time::timeout(Duration::from_secs(2), self.from_server.recv())
            .await
            .expect("timed out waiting for event")
            .expect("connection closed");
        match msg {
            ConnMessage::Text(t) => serde_json::from_str(&t).unwrap(),
            other => panic!("unexpected frame {other:?}"),
        }
    }

    /// Skip unrelated traffic such as presence broadcasts.
    pub async fn next_matching(&mut self, pred: impl Fn(&S2CEvent) -> bool) -> S2CEvent {
        loop {
            let event = self.recv().await;
            if pred(&event) {
                return event;
            }
        }
    }
}

pub fn id_of(value: &Value) -> String {
    value["_id"].as_str().unwrap().to_owned()
}
