//! Change relay against live Postgres and Redis
//!
//! Requires DATABASE_URL and REDIS_URL (skips otherwise).
//! Run with: cargo test -p integration-tests --test relay_tests

use std::time::Duration;

use integration_tests::*;
use roomchat_cache::{Subscriber, SubscriberConfig};
use roomchat_common::JwtService;
use roomchat_core::traits::{AuthProvider, DirectMessageRepository, RealtimeFeed};
use roomchat_core::{ChangeFilter, ChangeType, DirectMessage, NewDirectMessage, Subscription, Table};
use roomchat_db::{create_pool, run_migrations, PgAuthProvider, PgDirectMessageRepository};
use tokio_util::sync::CancellationToken;

const EVENT_WAIT: Duration = Duration::from_secs(5);

/// Relay task stopped when dropped
struct RunningRelay {
    shutdown: CancellationToken,
}

impl RunningRelay {
    fn start(config: roomchat_common::AppConfig) -> Self {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = roomchat_cache::relay::run(config, token).await {
                eprintln!("relay exited: {e}");
            }
        });
        Self { shutdown }
    }
}

impl Drop for RunningRelay {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[tokio::test]
async fn test_inserted_rows_reach_subscribers() {
    if !check_test_env() {
        return;
    }
    init_test_tracing();

    let config = test_config().unwrap();
    let pool = create_pool(&config.database).await.unwrap();
    run_migrations(&pool).await.unwrap();

    let subscriber = Subscriber::new(SubscriberConfig::from_app_config(&config));
    let _relay = RunningRelay::start(config.clone());

    let auth = PgAuthProvider::new(
        pool.clone(),
        JwtService::new(
            &config.jwt.secret,
            config.jwt.access_token_expiry,
            config.jwt.refresh_token_expiry,
        ),
    );
    let mut accounts = Vec::new();
    for side in ["a", "b"] {
        let suffix = unique_suffix();
        let (_, profile) = auth
            .sign_up(&format!("relay{suffix}@example.com"), "correct-horse-battery", &format!("relay_{side}_{suffix}"))
            .await
            .unwrap();
        accounts.push(profile);
    }
    let (sender, receiver) = (&accounts[0], &accounts[1]);

    let mut incoming = subscriber
        .subscribe(
            Subscription::table(Table::DirectMessages)
                .filter(ChangeFilter::equals("receiver_id", receiver.id)),
        )
        .await
        .unwrap();

    // Let the relay issue LISTEN before rows change
    tokio::time::sleep(Duration::from_millis(500)).await;

    let message = NewDirectMessage::new(sender.id, receiver.id, "over the wire".to_string());
    let message = PgDirectMessageRepository::new(pool.clone())
        .create(&message)
        .await
        .unwrap();

    let event = next_event(&mut incoming, EVENT_WAIT)
        .await
        .expect("direct message event");
    assert_eq!(event.table, Table::DirectMessages);
    assert_eq!(event.change_type, ChangeType::Insert);

    let row: DirectMessage = event.decode_record().unwrap().unwrap();
    assert_eq!(row.id, message.id);
    assert_eq!(row.content, "over the wire");

    subscriber.shutdown().await.ok();
}

#[tokio::test]
async fn test_relay_fails_fast_without_redis() {
    if !check_test_env() {
        return;
    }

    let mut config = test_config().unwrap();
    config.redis.url = "redis://127.0.0.1:9".to_string();

    let result = roomchat_cache::relay::run(config, CancellationToken::new()).await;
    assert!(result.is_err());
}
