use blogstore::{BlogStore, ErrorKind};
use serde_json::{json, Map};

mod test_helpers;
use test_helpers::{article, comment, ids, memory_store, obj, sled_store, user};

/// Runs the scenario once per storage backend.
macro_rules! on_both_backends {
    ($name:ident) => {
        mod $name {
            use super::*;

            #[tokio::test]
            async fn memory() {
                let store = memory_store().await;
                super::$name(&store).await;
            }

            #[tokio::test]
            async fn sled() {
                let store = sled_store().await;
                super::$name(&store).await;
            }
        }
    };
}

async fn create_references_existing_author(store: &BlogStore) {
    let errs = store
        .create("articles", &article("ghost", "Orphan", &["x"]))
        .await
        .unwrap_err();
    assert_eq!(errs.kinds(), vec![ErrorKind::BadId]);
    assert_eq!(
        errs.errors()[0].message,
        "invalid author ID ghost in users for create articles"
    );

    store.create("users", &user("bob")).await.unwrap();
    let id = store
        .create("articles", &article("bob", "Hello", &["x"]))
        .await
        .unwrap();
    let found = store.find("articles", &obj(json!({"id": id}))).await.unwrap();
    assert_eq!(found.len(), 1);
}
on_both_backends!(create_references_existing_author);

async fn removal_blocked_while_referenced(store: &BlogStore) {
    store.create("users", &user("bob")).await.unwrap();
    let a1 = store
        .create("articles", &article("bob", "First", &["x"]))
        .await
        .unwrap();
    let a2 = store
        .create("articles", &article("bob", "Second", &["x"]))
        .await
        .unwrap();
    let c1 = store.create("comments", &comment(&a1, "bob")).await.unwrap();

    let errs = store
        .remove("users", &obj(json!({"id": "bob"})))
        .await
        .unwrap_err();
    assert_eq!(errs.kinds(), vec![ErrorKind::BadId, ErrorKind::BadId]);
    let article_error = errs
        .errors()
        .iter()
        .find(|e| e.message.contains("authorId for articles"))
        .unwrap();
    assert!(article_error.message.starts_with("users bob referenced by authorId for articles "));
    assert!(article_error.message.contains(&a1));
    assert!(article_error.message.contains(&a2));
    assert!(errs
        .errors()
        .iter()
        .any(|e| e.message == format!("users bob referenced by commenterId for comments {}", c1)));

    let still_there = store.find("users", &obj(json!({"id": "bob"}))).await.unwrap();
    assert_eq!(ids(&still_there), vec!["bob"]);

    store.remove("comments", &obj(json!({"id": c1}))).await.unwrap();
    store.remove("articles", &obj(json!({"id": a1}))).await.unwrap();
    store.remove("articles", &obj(json!({"id": a2}))).await.unwrap();
    store.remove("users", &obj(json!({"id": "bob"}))).await.unwrap();
    assert!(store.find("users", &Map::new()).await.unwrap().is_empty());
}
on_both_backends!(removal_blocked_while_referenced);

async fn pages_partition_results(store: &BlogStore) {
    store.create("users", &user("bob")).await.unwrap();
    let mut created = Vec::new();
    for day in 1..=7 {
        let mut input = article("bob", &format!("Day {}", day), &["daily"]);
        input.insert(
            "creationTime".into(),
            json!(format!("2020-01-{:02}T08:00:00Z", day)),
        );
        created.push(store.create("articles", &input).await.unwrap());
    }
    // two objects sharing a creation time must still land on exactly one page
    let mut twin = article("bob", "Twin", &["daily"]);
    twin.insert("creationTime".into(), json!("2020-01-04T08:00:00Z"));
    created.push(store.create("articles", &twin).await.unwrap());

    let mut seen = Vec::new();
    let mut index = 0;
    loop {
        let page = store
            .find("articles", &obj(json!({"_index": index, "_count": 3})))
            .await
            .unwrap();
        let done = page.len() < 3;
        seen.extend(page);
        if done {
            break;
        }
        index += 3;
    }
    assert_eq!(seen.len(), created.len());

    let times: Vec<&str> = seen
        .iter()
        .map(|a| a["creationTime"].as_str().unwrap())
        .collect();
    let mut sorted = times.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(times, sorted);

    let mut found = ids(&seen);
    found.sort();
    created.sort();
    assert_eq!(found, created);
}
on_both_backends!(pages_partition_results);

async fn create_then_find_round_trips(store: &BlogStore) {
    store.create("users", &user("amy")).await.unwrap();
    let found = store.find("users", &obj(json!({"id": "amy"}))).await.unwrap();
    assert_eq!(found.len(), 1);
    let amy = &found[0];
    for (field, value) in user("amy") {
        assert_eq!(amy[&field], value, "field {}", field);
    }
    assert!(amy["creationTime"].as_str().unwrap().ends_with('Z'));
    assert!(amy.contains_key("updateTime"));

    let id = store
        .create("articles", &article("amy", "Round", &["a", "b"]))
        .await
        .unwrap();
    let found = store.find("articles", &obj(json!({"id": id}))).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], json!(id));
    assert_eq!(found[0]["keywords"], json!(["a", "b"]));
    assert_eq!(found[0]["authorId"], json!("amy"));
}
on_both_backends!(create_then_find_round_trips);

async fn duplicate_external_id_is_rejected(store: &BlogStore) {
    store.create("users", &user("bob")).await.unwrap();
    let mut again = user("bob");
    again.insert("firstName".into(), json!("Robert"));
    let errs = store.create("users", &again).await.unwrap_err();
    assert_eq!(errs.kinds(), vec![ErrorKind::Exists]);
    assert_eq!(errs.errors()[0].message, "users object having id bob already exists");

    let found = store.find("users", &obj(json!({"id": "bob"}))).await.unwrap();
    assert_eq!(found[0]["firstName"], json!("bob"));
}
on_both_backends!(duplicate_external_id_is_rejected);

async fn keywords_must_all_be_present(store: &BlogStore) {
    store.create("users", &user("bob")).await.unwrap();
    let both = store
        .create("articles", &article("bob", "Both", &["rust", "db"]))
        .await
        .unwrap();
    let rust_only = store
        .create("articles", &article("bob", "Rust", &["rust"]))
        .await
        .unwrap();

    let found = store
        .find("articles", &obj(json!({"keywords": ["rust", "db"]})))
        .await
        .unwrap();
    assert_eq!(ids(&found), vec![both.clone()]);

    let mut found = ids(
        &store
            .find("articles", &obj(json!({"keywords": ["rust"]})))
            .await
            .unwrap(),
    );
    found.sort();
    let mut expected = vec![both, rust_only];
    expected.sort();
    assert_eq!(found, expected);
}
on_both_backends!(keywords_must_all_be_present);

async fn creation_time_bounds_the_search(store: &BlogStore) {
    store.create("users", &user("bob")).await.unwrap();
    let mut old = article("bob", "Old", &["x"]);
    old.insert("creationTime".into(), json!("2019-05-01"));
    let old = store.create("articles", &old).await.unwrap();
    let mut new = article("bob", "New", &["x"]);
    new.insert("creationTime".into(), json!("2021-05-01"));
    let new = store.create("articles", &new).await.unwrap();

    let found = store
        .find("articles", &obj(json!({"creationTime": "2020-01-01"})))
        .await
        .unwrap();
    assert_eq!(ids(&found), vec![old.clone()]);

    let found = store.find("articles", &Map::new()).await.unwrap();
    assert_eq!(ids(&found), vec![new, old]);
}
on_both_backends!(creation_time_bounds_the_search);

async fn update_changes_only_given_fields(store: &BlogStore) {
    store.create("users", &user("bob")).await.unwrap();
    let id = store
        .create("articles", &article("bob", "Draft", &["x"]))
        .await
        .unwrap();
    store
        .update(
            "articles",
            &obj(json!({"id": id, "title": "Final", "updateTime": "2030-01-01T00:00:00Z"})),
        )
        .await
        .unwrap();

    let found = store.find("articles", &obj(json!({"id": id}))).await.unwrap();
    assert_eq!(found[0]["title"], json!("Final"));
    assert_eq!(found[0]["content"], json!("Draft body"));
    assert_eq!(found[0]["updateTime"], json!("2030-01-01T00:00:00.000Z"));

    let errs = store
        .update("articles", &obj(json!({"id": id, "authorId": "amy"})))
        .await
        .unwrap_err();
    assert_eq!(errs.kinds(), vec![ErrorKind::BadField]);
}
on_both_backends!(update_changes_only_given_fields);

async fn finds_by_reference_field(store: &BlogStore) {
    store.create("users", &user("bob")).await.unwrap();
    store.create("users", &user("amy")).await.unwrap();
    let a = store
        .create("articles", &article("bob", "Post", &["x"]))
        .await
        .unwrap();
    let c1 = store.create("comments", &comment(&a, "amy")).await.unwrap();
    store.create("comments", &comment(&a, "bob")).await.unwrap();

    let found = store
        .find("comments", &obj(json!({"commenterId": "amy"})))
        .await
        .unwrap();
    assert_eq!(ids(&found), vec![c1]);

    let found = store
        .find("comments", &obj(json!({"articleId": a, "_count": 10})))
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
}
on_both_backends!(finds_by_reference_field);

async fn bad_paging_values_are_reported(store: &BlogStore) {
    let errs = store
        .find("users", &obj(json!({"_index": "first", "_count": "many"})))
        .await
        .unwrap_err();
    assert_eq!(
        errs.kinds(),
        vec![ErrorKind::BadFieldValue, ErrorKind::BadFieldValue]
    );

    let empty = store
        .find("users", &obj(json!({"_count": 0})))
        .await
        .unwrap();
    assert!(empty.is_empty());
}
on_both_backends!(bad_paging_values_are_reported);

async fn clear_removes_everything(store: &BlogStore) {
    store.create("users", &user("bob")).await.unwrap();
    store
        .create("articles", &article("bob", "Gone", &["x"]))
        .await
        .unwrap();
    store.clear().await.unwrap();
    for category in ["users", "articles", "comments"] {
        assert!(store.find(category, &Map::new()).await.unwrap().is_empty());
    }
    store.create("users", &user("bob")).await.unwrap();
}
on_both_backends!(clear_removes_everything);

async fn numeric_references_hold(store: &BlogStore) {
    let mut numeric = user("42");
    numeric.insert("id".into(), json!(42));
    assert_eq!(store.create("users", &numeric).await.unwrap(), "42");

    let mut input = article("42", "Numbers", &["x"]);
    input.insert("authorId".into(), json!(42));
    let id = store.create("articles", &input).await.unwrap();

    let errs = store
        .remove("users", &obj(json!({"id": 42})))
        .await
        .unwrap_err();
    assert_eq!(errs.kinds(), vec![ErrorKind::BadId]);
    assert_eq!(
        errs.errors()[0].message,
        format!("users 42 referenced by authorId for articles {}", id)
    );

    for author in [json!("42"), json!(42)] {
        let found = store
            .find("articles", &obj(json!({"authorId": author})))
            .await
            .unwrap();
        assert_eq!(ids(&found), vec![id.clone()]);
        assert_eq!(found[0]["authorId"], json!("42"));
    }
}
on_both_backends!(numeric_references_hold);

async fn concurrent_duplicate_creates_admit_one(store: &BlogStore) {
    let first = user("twin");
    let mut second = user("twin");
    second.insert("firstName".into(), json!("Other"));
    let (a, b) = tokio::join!(store.create("users", &first), store.create("users", &second));

    let results = [a, b];
    let created = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(created, 1);
    let rejected: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].kinds(), vec![ErrorKind::Exists]);

    let found = store.find("users", &obj(json!({"id": "twin"}))).await.unwrap();
    assert_eq!(found.len(), 1);
}
on_both_backends!(concurrent_duplicate_creates_admit_one);
