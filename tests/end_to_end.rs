// End-to-end run of the process entry point with scripted capabilities
//
// Time is paused, so the 5 second poll interval elapses instantly.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use playerwatch::app;
use playerwatch::notifier::{SendError, WebhookPayload, WebhookTransport};
use playerwatch::rcon::{Connector, RconError, Session};
use playerwatch::roster::Player;
use playerwatch::{Config, WatchError};

/// Hands out listings in order and repeats the last one forever
#[derive(Clone)]
struct Server {
    listings: Arc<Mutex<VecDeque<Vec<Player>>>>,
    connects: Arc<Mutex<u32>>,
}

impl Server {
    fn new(listings: Vec<Vec<(&str, bool)>>) -> Self {
        let listings: VecDeque<Vec<Player>> = listings
            .into_iter()
            .map(|l| {
                l.into_iter()
                    .map(|(n, o)| Player::new(n, o))
                    .collect::<Vec<Player>>()
            })
            .collect();
        Self {
            listings: Arc::new(Mutex::new(listings)),
            connects: Arc::new(Mutex::new(0)),
        }
    }
}

#[async_trait]
impl Connector for Server {
    async fn connect(&self, _address: &str) -> Result<Box<dyn Session>, RconError> {
        *self.connects.lock().unwrap() += 1;
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl Session for Server {
    async fn authenticate(&mut self, password: &str) -> Result<(), RconError> {
        if password == "secret" {
            Ok(())
        } else {
            Err(RconError::AuthRejected)
        }
    }

    async fn query_players(&mut self) -> Result<Vec<Player>, RconError> {
        let mut listings = self.listings.lock().unwrap();
        if listings.len() > 1 {
            Ok(listings.pop_front().unwrap_or_default())
        } else {
            Ok(listings.front().cloned().unwrap_or_default())
        }
    }

    async fn close(&mut self) -> Result<(), RconError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Inbox {
    messages: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl WebhookTransport for Inbox {
    async fn send(&self, url: &str, payload: &WebhookPayload) -> Result<(), SendError> {
        assert_eq!(url, "https://hooks.example.com/relay");
        self.messages.lock().unwrap().push(payload.content.clone());
        Ok(())
    }
}

fn config(password: &str) -> Config {
    let mut config = Config::sample();
    config.rcon.password = password.to_string();
    config.webhook.url = "https://hooks.example.com/relay".to_string();
    config
}

#[tokio::test(start_paused = true)]
async fn relays_logins_and_logouts_until_terminated() {
    let server = Server::new(vec![
        vec![("alice", false), ("bob", true)],
        vec![("alice", true), ("bob", true)],
        vec![("alice", false), ("bob", false)],
    ]);
    let inbox = Inbox::default();

    let result = app::run_with(
        &config("secret"),
        Box::new(server.clone()),
        Box::new(inbox.clone()),
        tokio::time::sleep(Duration::from_secs(11)),
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(
        *inbox.messages.lock().unwrap(),
        vec!["alice logged in", "alice logged off", "bob logged off"]
    );
    assert_eq!(*server.connects.lock().unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn rejected_credential_keeps_running_and_retrying() {
    let server = Server::new(vec![vec![("alice", true)]]);
    let inbox = Inbox::default();

    let result = app::run_with(
        &config("wrong"),
        Box::new(server.clone()),
        Box::new(inbox.clone()),
        tokio::time::sleep(Duration::from_secs(11)),
    )
    .await;

    assert!(result.is_ok());
    assert!(inbox.messages.lock().unwrap().is_empty());
    // initial attempt, t=5, t=10 and the in-flight t=15 cycle
    assert_eq!(*server.connects.lock().unwrap(), 4);
}

#[tokio::test]
async fn invalid_config_fails_before_polling() {
    let err = app::run(Config::default(), std::future::pending())
        .await
        .unwrap_err();
    assert!(matches!(err, WatchError::Configuration { .. }));
}
