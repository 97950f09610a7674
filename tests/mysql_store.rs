//! Runs against a live MySQL: `AMITY__STORE__DSN=mysql://… cargo test -- --ignored`.

use amity::application_impl::{RealRelationshipService, RealUserService};
use amity::application_port::*;
use amity::domain_model::*;
use amity::domain_port::*;
use amity::infra_mysql::*;
use chrono::Utc;
use futures_util::future::join_all;
use nanoid::nanoid;
use sqlx::MySqlPool;
use std::sync::Arc;

const ALPHABET: [char; 16] = [
    '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'a', 'b', 'c', 'd', 'e', 'f',
];

struct Fixture {
    tx_manager: Arc<dyn TxManager>,
    friend_request_repo: Arc<dyn FriendRequestRepo>,
    users: Arc<RealUserService>,
    friends: RealRelationshipService,
}

async fn fixture() -> Fixture {
    let dsn = std::env::var("AMITY__STORE__DSN").expect("AMITY__STORE__DSN must be set");
    let pool: MySqlPool = connect_mysql(&dsn, 8).await.unwrap();

    let tx_manager: Arc<dyn TxManager> = Arc::new(MySqlTxManager::new(pool.clone()));
    let user_repo: Arc<dyn UserRepo> = Arc::new(MySqlUserRepo::new());
    let friend_request_repo: Arc<dyn FriendRequestRepo> =
        Arc::new(MySqlFriendRequestRepo::new(pool));

    Fixture {
        users: Arc::new(RealUserService::new(user_repo.clone(), tx_manager.clone())),
        friends: RealRelationshipService::new(
            user_repo,
            friend_request_repo.clone(),
            tx_manager.clone(),
        ),
        tx_manager,
        friend_request_repo,
    }
}

fn principal(username: &str) -> Principal {
    Principal {
        user_id: UserId(uuid::Uuid::new_v4()),
        username: Some(username.to_string()),
        image: None,
    }
}

/// Usernames unique per run, since the database outlives the test.
fn unique(prefix: &str) -> String {
    format!("{prefix}_{}", nanoid!(12, &ALPHABET))
}

impl Fixture {
    async fn user(&self, prefix: &str) -> UserProfile {
        self.users
            .sync_principal(&principal(&unique(prefix)))
            .await
            .unwrap()
    }
}

#[tokio::test]
#[ignore]
async fn active_pair_index_rejects_second_active_request() {
    let f = fixture().await;
    let alice = f.user("alice").await;
    let bob = f.user("bob").await;

    let first = FriendRequest::new_pending(alice.user_id, bob.user_id, Utc::now());
    let mut tx = f.tx_manager.begin().await.unwrap();
    f.friend_request_repo
        .insert_pending_in_tx(&mut *tx, &first)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    // Skips the service's pair lookup; only the unique index stands in the way.
    let reverse = FriendRequest::new_pending(bob.user_id, alice.user_id, Utc::now());
    let mut tx = f.tx_manager.begin().await.unwrap();
    let err = f
        .friend_request_repo
        .insert_pending_in_tx(&mut *tx, &reverse)
        .await
        .unwrap_err();
    assert!(matches!(err, RelationError::Conflict(_)));
    tx.rollback().await.unwrap();

    f.friends
        .reject_request(bob.user_id, first.request_id)
        .await
        .unwrap();
    f.friends
        .send_request(bob.user_id, alice.username.as_str())
        .await
        .unwrap();
}

#[tokio::test]
#[ignore]
async fn accepted_list_joins_the_other_party() {
    let f = fixture().await;
    let alice = f.user("alice").await;
    let bob = f.user("bob").await;
    let carol = f.user("carol").await;

    let with_bob = f
        .friends
        .send_request(alice.user_id, bob.username.as_str())
        .await
        .unwrap();
    let with_carol = f
        .friends
        .send_request(carol.user_id, alice.username.as_str())
        .await
        .unwrap();
    f.friends
        .accept_request(bob.user_id, with_bob.request_id)
        .await
        .unwrap();
    f.friends
        .accept_request(alice.user_id, with_carol.request_id)
        .await
        .unwrap();

    let friends = f.friends.list_accepted(alice.user_id).await.unwrap();
    let ids: Vec<_> = friends.iter().map(|e| e.friend.user_id).collect();
    assert_eq!(ids, vec![carol.user_id, bob.user_id]);
    assert_eq!(friends[0].direction, Direction::Incoming);
    assert_eq!(friends[1].direction, Direction::Outgoing);

    let bobs = f.friends.list_accepted(bob.user_id).await.unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].friend.user_id, alice.user_id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore]
async fn concurrent_first_syncs_of_one_user_both_succeed() {
    let f = fixture().await;
    let principal = principal(&unique("dave"));

    let results = join_all((0..2).map(|_| {
        let users = f.users.clone();
        let principal = principal.clone();
        tokio::spawn(async move { users.sync_principal(&principal).await })
    }))
    .await;

    for result in results {
        let profile = result.unwrap().unwrap();
        assert_eq!(profile.user_id, principal.user_id);
    }
}
