//! Upsert semantics against a real SQLite file

use cinecrawl::models::{CrewAndMovie, Crew, Movie, Release, User, WatchActivity};
use cinecrawl::store::{Store, UpsertMode, UpsertOutcome};
use tempfile::TempDir;

async fn open_store() -> (TempDir, Store) {
    let dir = TempDir::new().expect("temp dir");
    let store = Store::open(&dir.path().join("nested").join("crawl.sqlite"))
        .await
        .expect("open store");
    (dir, store)
}

fn heat() -> Movie {
    let mut movie = Movie::new("https://letterboxd.com/film/heat-1995/", "Heat");
    movie.duration = Some(170);
    movie
}

#[tokio::test]
async fn test_upsert_is_idempotent() {
    let (_dir, store) = open_store().await;
    let user = User::new("https://letterboxd.com/alice/", "Alice");

    let first = store
        .upsert(&user, UpsertMode::FirstWriteWins)
        .await
        .expect("insert");
    let second = store
        .upsert(&user, UpsertMode::FirstWriteWins)
        .await
        .expect("upsert");

    assert_eq!(first.outcome, UpsertOutcome::Inserted);
    assert_eq!(second.outcome, UpsertOutcome::AlreadyPresent);
    assert!(first.record.id > 0);
    assert_eq!(first.record.id, second.record.id);
    assert_eq!(store.count::<User>().await.expect("count"), 1);
}

#[tokio::test]
async fn test_first_write_wins_keeps_stored_values() {
    let (_dir, store) = open_store().await;
    store.insert_or_get(&heat()).await.expect("insert");

    let mut renamed = heat();
    renamed.name = "Heat (1995)".to_string();
    renamed.duration = None;
    let stored = store.insert_or_get(&renamed).await.expect("upsert");

    assert_eq!(stored.name, "Heat");
    assert_eq!(stored.duration, Some(170));
}

#[tokio::test]
async fn test_overwrite_replaces_non_key_columns() {
    let (_dir, store) = open_store().await;
    let original = store.insert_or_get(&heat()).await.expect("insert");

    let mut updated = heat();
    updated.description = Some("A group of thieves.".to_string());
    let upserted = store
        .upsert(&updated, UpsertMode::Overwrite)
        .await
        .expect("overwrite");

    assert_eq!(upserted.outcome, UpsertOutcome::Updated);
    assert_eq!(upserted.record.id, original.id);
    assert_eq!(
        upserted.record.description.as_deref(),
        Some("A group of thieves.")
    );
    assert_eq!(store.count::<Movie>().await.expect("count"), 1);
}

#[tokio::test]
async fn test_find_by_url() {
    let (_dir, store) = open_store().await;
    assert!(
        store
            .find_by_url::<Movie>("https://letterboxd.com/film/heat-1995/")
            .await
            .expect("query")
            .is_none()
    );

    let stored = store.insert_or_get(&heat()).await.expect("insert");
    let found = store
        .find_by_url::<Movie>("https://letterboxd.com/film/heat-1995/")
        .await
        .expect("query")
        .expect("movie present");
    assert_eq!(found, stored);
}

#[tokio::test]
async fn test_release_with_null_age_rating_deduplicates() {
    let (_dir, store) = open_store().await;
    let movie = store.insert_or_get(&heat()).await.expect("movie");
    let release = Release {
        movie_id: movie.id,
        date: "15 Dec 1995".to_string(),
        country: "USA".to_string(),
        release_type: "Theatrical".to_string(),
        age_rating: None,
    };

    store.insert_or_get(&release).await.expect("insert");
    store.insert_or_get(&release).await.expect("upsert");
    store
        .insert_or_get(&Release {
            age_rating: Some("R".to_string()),
            ..release.clone()
        })
        .await
        .expect("rated release");

    assert_eq!(store.count::<Release>().await.expect("count"), 2);
}

#[tokio::test]
async fn test_crew_join_keyed_by_role() {
    let (_dir, store) = open_store().await;
    let movie = store.insert_or_get(&heat()).await.expect("movie");
    let mann = store
        .insert_or_get(&Crew::new(
            "https://letterboxd.com/director/michael-mann/",
            "Michael Mann",
            "Director",
        ))
        .await
        .expect("crew");

    for role in ["Director", "Writer", "Director"] {
        store
            .insert_or_get(&CrewAndMovie {
                crew_id: mann.id,
                movie_id: movie.id,
                role: role.to_string(),
            })
            .await
            .expect("join");
    }

    let joins = store.all::<CrewAndMovie>().await.expect("joins");
    let roles: Vec<&str> = joins.iter().map(|j| j.role.as_str()).collect();
    assert_eq!(roles, ["Director", "Writer"]);
}

#[tokio::test]
async fn test_activity_keyed_by_user_movie_and_date() {
    let (_dir, store) = open_store().await;
    let movie = store.insert_or_get(&heat()).await.expect("movie");
    let user = store
        .insert_or_get(&User::new("https://letterboxd.com/alice/", "Alice"))
        .await
        .expect("user");

    let activity = WatchActivity {
        user_id: user.id,
        movie_id: movie.id,
        date: "2024-03-01".to_string(),
        is_watched: true,
        is_loved: true,
        rating: Some(3.5),
        review: None,
    };
    store.insert_or_get(&activity).await.expect("insert");
    let again = store
        .insert_or_get(&WatchActivity {
            rating: Some(5.0),
            ..activity.clone()
        })
        .await
        .expect("upsert");
    store
        .insert_or_get(&WatchActivity {
            date: "2024-04-01".to_string(),
            ..activity.clone()
        })
        .await
        .expect("second date");

    assert_eq!(again.rating, Some(3.5));
    assert_eq!(store.count::<WatchActivity>().await.expect("count"), 2);
}

#[tokio::test]
async fn test_reopen_keeps_rows() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("crawl.sqlite");

    let store = Store::open(&path).await.expect("open");
    store
        .insert_or_get(&User::new("https://letterboxd.com/alice/", "Alice"))
        .await
        .expect("user");
    store.close().await;

    let reopened = Store::open(&path).await.expect("reopen");
    assert_eq!(reopened.count::<User>().await.expect("count"), 1);
}
