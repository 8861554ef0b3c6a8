use docmodel::{
    bson::{doc, oid::ObjectId},
    memory::{MemoryDriver, MemoryStoreError},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    age: Option<i64>,
}

impl User {
    fn new(name: &str, age: i64) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            age: Some(age),
        }
    }
}

impl Entity for User {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

fn mapper() -> Mapper {
    Mapper::new().collection(
        MappedCollection::new("users")
            .attribute("id", AttributeType::ObjectId)
            .attribute("name", AttributeType::String)
            .attribute("age", AttributeType::Integer),
    )
}

async fn adapter() -> Adapter<MemoryDriver> {
    Adapter::connect(mapper(), MemoryDriver::builder("memory://test"))
        .await
        .unwrap()
}

async fn seed(adapter: &Adapter<MemoryDriver>, people: &[(&str, i64)]) -> Vec<User> {
    let mut created = Vec::new();
    for (name, age) in people {
        let mut user = User::new(name, *age);
        created.push(adapter.create("users", &mut user).await.unwrap());
    }
    created
}

fn names(users: &[User]) -> Vec<&str> {
    users.iter().map(|user| user.name.as_str()).collect()
}

#[tokio::test]
async fn create_assigns_an_identifier_that_find_resolves() {
    let adapter = adapter().await;
    let mut user = User::new("L", 32);

    let created = adapter.create("users", &mut user).await.unwrap();

    let id = user.id.clone().unwrap();
    assert!(ObjectId::parse_str(&id).is_ok());
    assert_eq!(created, user);

    let found: Option<User> = adapter.find("users", &id).await.unwrap();
    assert_eq!(found, Some(user));
}

#[tokio::test]
async fn created_identifiers_are_unique() {
    let adapter = adapter().await;
    let users = seed(&adapter, &[("A", 1), ("A", 1), ("A", 1)]).await;

    let ids: HashSet<_> = users.iter().filter_map(|user| user.id.clone()).collect();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn update_rewrites_the_persisted_fields() {
    let adapter = adapter().await;
    let mut user = seed(&adapter, &[("L", 32)]).await.remove(0);

    user.name = "MG".to_string();
    user.age = None;
    let updated = adapter.update("users", &user).await.unwrap();
    assert_eq!(updated, user);

    let found: User = adapter
        .find("users", user.id().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.name, "MG");
    assert_eq!(found.age, None);
    assert_eq!(adapter.all::<User>("users").await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_removes_only_the_entity() {
    let adapter = adapter().await;
    let users = seed(&adapter, &[("L", 32), ("MG", 31)]).await;

    adapter.delete("users", &users[0]).await.unwrap();
    adapter.delete("users", &users[0]).await.unwrap();

    let remaining = adapter.all::<User>("users").await.unwrap();
    assert_eq!(remaining, vec![users[1].clone()]);
}

#[tokio::test]
async fn first_and_last_follow_creation_order() {
    let adapter = adapter().await;

    assert_eq!(adapter.first::<User>("users").await.unwrap(), None);
    assert_eq!(adapter.last::<User>("users").await.unwrap(), None);

    let users = seed(&adapter, &[("A", 1), ("B", 2), ("C", 3)]).await;

    assert_eq!(adapter.first::<User>("users").await.unwrap(), Some(users[0].clone()));
    assert_eq!(adapter.last::<User>("users").await.unwrap(), Some(users[2].clone()));
    assert_eq!(names(&adapter.all::<User>("users").await.unwrap()), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn clear_empties_the_collection_and_can_repeat() {
    let adapter = adapter().await;
    seed(&adapter, &[("A", 1), ("B", 2)]).await;

    adapter.clear("users").await.unwrap();
    adapter.clear("users").await.unwrap();

    assert!(adapter.all::<User>("users").await.unwrap().is_empty());
}

#[tokio::test]
async fn find_with_unknown_or_malformed_identifiers_returns_nothing() {
    let adapter = adapter().await;
    seed(&adapter, &[("A", 1)]).await;

    let unknown: Option<User> = adapter.find("users", &ObjectId::new().to_hex()).await.unwrap();
    let malformed: Option<User> = adapter.find("users", "not-an-object-id").await.unwrap();

    assert_eq!(unknown, None);
    assert_eq!(malformed, None);
}

#[tokio::test]
async fn queries_filter_and_count() {
    let adapter = adapter().await;
    seed(&adapter, &[("L", 32), ("MG", 31), ("L", 30)]).await;

    let mut query = adapter.query::<User>("users").unwrap();
    query.find(doc! { "name": "L" }).and(doc! { "age": 32 });

    assert_eq!(query.count().await.unwrap(), 1);
    assert!(query.exists().await.unwrap());
    assert_eq!(query.first().await.unwrap().map(|user| user.age), Some(Some(32)));

    let mut nobody = adapter.query::<User>("users").unwrap();
    nobody.find(doc! { "name": "nobody" });
    assert!(nobody.is_empty().await.unwrap());
    assert!(!nobody.exists().await.unwrap());
}

#[tokio::test]
async fn limit_skip_and_order_combine() {
    let adapter = adapter().await;
    seed(&adapter, &[("A", 10), ("B", 20), ("C", 30), ("D", 40), ("E", 50)]).await;

    let mut limited = adapter.query::<User>("users").unwrap();
    limited.limit(2);
    assert_eq!(names(&limited.all().await.unwrap()), vec!["A", "B"]);

    let mut page = adapter.query::<User>("users").unwrap();
    page.desc(["age"]).skip(1).limit(2);
    assert_eq!(names(&page.all().await.unwrap()), vec!["D", "C"]);
    assert_eq!(page.count().await.unwrap(), 2);

    let mut skipped = adapter.query::<User>("users").unwrap();
    skipped.find(doc! { "age": { "$gte": 20 } }).asc(["name"]).skip(3);
    assert_eq!(names(&skipped.all().await.unwrap()), vec!["E"]);
}

#[tokio::test]
async fn each_visits_every_resolved_entity() {
    let adapter = adapter().await;
    seed(&adapter, &[("A", 1), ("B", 2)]).await;

    let query = adapter.query::<User>("users").unwrap();
    let mut total = 0;
    query
        .each(|user| total += user.age.unwrap_or_default())
        .await
        .unwrap();

    assert_eq!(total, 3);
    assert!(query.render().await.unwrap().contains("name: \"B\""));
}

#[tokio::test]
async fn building_a_query_costs_no_round_trips_and_results_are_not_cached() {
    let adapter = adapter().await;
    seed(&adapter, &[("A", 1)]).await;
    let before = adapter.driver().round_trips();

    let mut query = adapter.query::<User>("users").unwrap();
    query.find(doc! { "name": "A" }).order(["age"]).limit(5);
    let _scoped = query.scoped();
    assert_eq!(adapter.driver().round_trips(), before);

    assert_eq!(query.all().await.unwrap().len(), 1);
    seed(&adapter, &[("A", 2)]).await;
    assert_eq!(query.all().await.unwrap().len(), 2);
    assert_eq!(adapter.driver().round_trips(), before + 3);
}

#[tokio::test]
async fn configured_queries_carry_their_context() {
    #[derive(Debug)]
    struct Repository {
        page_size: Option<u64>,
    }

    let adapter = adapter().await;
    seed(&adapter, &[("A", 1), ("B", 2), ("C", 3)]).await;
    let repository = Repository { page_size: Some(2) };

    let query = adapter
        .query_with::<User, _, _>("users", &repository, |q| {
            let page_size = q.context().page_size;
            q.reverse_order(["age"]).try_limit(page_size)?;
            Ok(())
        })
        .unwrap();

    assert_eq!(query.context().page_size, Some(2));
    assert_eq!(names(&query.all().await.unwrap()), vec!["C", "B"]);

    let missing = Repository { page_size: None };
    let err = adapter
        .query_with::<User, _, _>("users", &missing, |q| {
            let page_size = q.context().page_size;
            q.try_limit(page_size)?;
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, AdapterError::InvalidArgument(message) if message == "You need to specify a condition."));
}

#[tokio::test]
async fn rejected_queries_are_invalid_only_when_resolving_entities() {
    let adapter = adapter().await;
    seed(&adapter, &[("A", 1)]).await;

    let mut query = adapter.query::<User>("users").unwrap();
    query.find(doc! { "age": { "$bogus": 1 } });

    match query.all().await {
        Err(AdapterError::InvalidQuery(message)) => assert!(message.contains("$bogus")),
        other => panic!("unexpected result: {other:?}"),
    }

    match query.count().await {
        Err(AdapterError::Store(native)) => assert_eq!(
            native.downcast_ref::<MemoryStoreError>(),
            Some(&MemoryStoreError::UnsupportedOperator("$bogus".to_string()))
        ),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn records_that_do_not_coerce_fail_without_being_wrapped() {
    let adapter = adapter().await;
    adapter
        .driver()
        .insert_one("users", doc! { "name": "A", "age": "old" })
        .await
        .unwrap();

    let err = adapter.all::<User>("users").await.unwrap_err();
    assert!(matches!(err, AdapterError::Coercion { ref target, .. } if target == "age"));
}

#[tokio::test]
async fn stored_values_are_coerced_to_the_declared_types() {
    let adapter = adapter().await;
    adapter
        .driver()
        .insert_one("users", doc! { "name": 7, "age": "41", "undeclared": true })
        .await
        .unwrap();

    let users = adapter.all::<User>("users").await.unwrap();
    assert_eq!(users[0].name, "7");
    assert_eq!(users[0].age, Some(41));
    assert!(users[0].id.is_some());
}

#[tokio::test]
async fn unmapped_collections_are_rejected() {
    let adapter = adapter().await;

    let err = adapter.all::<User>("accounts").await.unwrap_err();
    assert!(matches!(err, AdapterError::UnmappedCollection(name) if name == "accounts"));
}

#[tokio::test]
async fn connecting_to_an_unknown_store_fails() {
    let err = Adapter::connect(mapper(), MemoryDriver::builder("postgres://localhost/app"))
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::DatabaseAdapterNotFound(_)));
}

#[tokio::test]
async fn connection_string_and_disconnect() {
    let adapter = adapter().await;

    assert_eq!(adapter.connection_string(), "memory://test");
    assert_eq!(adapter.driver().name(), "test");
    adapter.disconnect().await.unwrap();
}

#[tokio::test]
async fn counting_and_paging_a_repeated_entity() {
    let adapter = adapter().await;
    let mut query = adapter.query::<User>("users").unwrap();
    query.find(doc! { "name": "A" }).find(doc! { "age": 29 });

    seed(&adapter, &[("A", 29)]).await;
    assert_eq!(query.count().await.unwrap(), 1);

    let second = seed(&adapter, &[("A", 29)]).await.remove(0);
    assert_eq!(query.count().await.unwrap(), 2);

    query.skip(1).limit(1);
    assert_eq!(query.all().await.unwrap(), vec![second]);
}

#[tokio::test]
async fn non_matching_filters_resolve_to_nothing() {
    let adapter = adapter().await;
    seed(&adapter, &[("A", 29)]).await;

    let mut query = adapter.query::<User>("users").unwrap();
    query.find(doc! { "name": "A" }).find(doc! { "age": 28 });

    assert!(query.all().await.unwrap().is_empty());
    assert_eq!(query.count().await.unwrap(), 0);
}

#[tokio::test]
async fn serialized_entities_deserialize_with_their_identifier() {
    let adapter = adapter().await;
    let users = adapter.query::<User>("users").unwrap().scoped();
    let user = User::new("A", 29);
    let id = ObjectId::new();

    let mut record = users.serialize(&user).unwrap();
    assert!(!record.contains_key("id"));
    record.insert(NATIVE_ID, id);

    let restored = users.deserialize([record]).unwrap().remove(0);
    assert_eq!(restored.name, user.name);
    assert_eq!(restored.age, user.age);
    assert_eq!(restored.id, Some(id.to_hex()));
}

#[tokio::test]
async fn writes_for_an_entity_without_identifier_touch_nothing() {
    let adapter = adapter().await;
    let stored = seed(&adapter, &[("A", 1), ("B", 2)]).await;
    let detached = User::new("C", 3);

    let updated = adapter.update("users", &detached).await.unwrap();
    assert_eq!(updated, detached);

    adapter.delete("users", &detached).await.unwrap();

    assert_eq!(adapter.all::<User>("users").await.unwrap(), stored);
}
