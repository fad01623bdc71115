// Runs the MongoDB-backed repositories against a live server.
//
//   DATABASE_URI=mongodb://localhost:27017 cargo test -p database -- --ignored
//
// Every test works in its own throwaway database.

use database::{
    auth::{model::create_refresh_token_index, RefreshTokenModel, RefreshTokenRepository},
    auth::{RefreshTokenStore, REFRESH_TOKENS_COLLECTION},
    codes::{model::create_code_index, CodeRepository, CodeStore, VerificationCodeModel},
    users::{model::create_user_index, UserFilter, UserModel, UserStore, UserUpdate},
    users::{UsersRepository, USERS_COLLECTION},
    DatabaseError, EntityRepository, Paginate,
};
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::FindOptions,
    Client, Database,
};

async fn database() -> Database {
    let uri = std::env::var("DATABASE_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let client = Client::with_uri_str(uri)
        .await
        .expect("Failed to connect to database.");
    client.database(&format!("accounts-test-{}", ObjectId::new().to_hex()))
}

async fn users(db: &Database) -> EntityRepository<UserModel> {
    create_user_index(db).await.unwrap();
    EntityRepository::new(db.collection(USERS_COLLECTION))
}

fn user(email: &str) -> UserModel {
    UserModel::new(email, "hash".to_string(), "Ada", "Lovelace")
}

#[tokio::test]
#[ignore = "needs a running MongoDB"]
async fn duplicate_email_on_create_is_a_duplicate_key() {
    let db = database().await;
    let repository = users(&db).await;

    repository.create(user("a@x.com")).await.unwrap();
    let err = repository.create(user("a@x.com")).await.unwrap_err();
    assert!(matches!(err, DatabaseError::DuplicateKey));

    let store = UsersRepository::new(&db);
    let err = store.create(user("a@x.com")).await.unwrap_err();
    assert!(matches!(err, DatabaseError::DuplicateKey));

    db.drop(None).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running MongoDB"]
async fn update_onto_a_taken_email_is_a_duplicate_key() {
    let db = database().await;
    let repository = users(&db).await;
    repository.create(user("a@x.com")).await.unwrap();
    let other = repository.create(user("b@x.com")).await.unwrap();

    let err = repository
        .find_one_and_update(
            doc! { "_id": other.id },
            doc! { "$set": { "email": "a@x.com" } },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::DuplicateKey));

    db.drop(None).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running MongoDB"]
async fn pages_are_sliced_and_counted_in_full() {
    let db = database().await;
    let repository = users(&db).await;
    for i in 0..25 {
        repository.create(user(&format!("u{i:02}@x.com"))).await.unwrap();
    }
    let by_email = || Some(FindOptions::builder().sort(doc! { "email": 1 }).build());

    let page = repository
        .find_with_pagination(doc! {}, by_email(), Paginate::new(Some(2), Some(10)))
        .await
        .unwrap();
    assert_eq!(page.count, 25);
    assert_eq!(page.data.len(), 10);
    assert_eq!(page.data[0].email, "u10@x.com");

    let last = repository
        .find_with_pagination(doc! {}, by_email(), Paginate::new(Some(3), Some(10)))
        .await
        .unwrap();
    assert_eq!(last.count, 25);
    assert_eq!(last.data.len(), 5);

    let everything = repository
        .find_with_pagination(doc! {}, by_email(), Paginate::default())
        .await
        .unwrap();
    assert_eq!(everything.data.len(), 25);

    let far = repository
        .find_with_pagination(doc! {}, None, Paginate::new(Some(u64::MAX), Some(10)))
        .await
        .unwrap();
    assert_eq!(far.count, 25);
    assert!(far.data.is_empty());

    let admins = UsersRepository::new(&db)
        .find_page(&UserFilter::admins(), Paginate::new(Some(1), Some(10)))
        .await
        .unwrap();
    assert_eq!(admins.count, 0);

    db.drop(None).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running MongoDB"]
async fn update_returns_the_document_after_the_change() {
    let db = database().await;
    users(&db).await;
    let store = UsersRepository::new(&db);
    let created = store.create(user("a@x.com")).await.unwrap();
    let update = UserUpdate {
        first_name: Some("Grace".to_string()),
        is_admin: Some(true),
        ..Default::default()
    };

    let updated = store.update(&created.id, &update).await.unwrap().unwrap();
    assert_eq!(updated.first_name, "Grace");
    assert!(updated.is_admin);
    assert!(updated.updated_at >= created.updated_at);

    assert!(store.update(&ObjectId::new(), &update).await.unwrap().is_none());

    db.drop(None).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running MongoDB"]
async fn delete_many_reports_whether_anything_went() {
    let db = database().await;
    let repository = users(&db).await;
    repository.create(user("a@x.com")).await.unwrap();

    assert!(repository.delete_many(doc! { "email": "a@x.com" }).await.unwrap());
    assert!(!repository.delete_many(doc! { "email": "a@x.com" }).await.unwrap());

    db.drop(None).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running MongoDB"]
async fn only_unexpired_codes_are_found() {
    let db = database().await;
    create_code_index(&db).await.unwrap();
    let codes = CodeRepository::new(&db);

    codes
        .insert_code(VerificationCodeModel::new("a@x.com", "111111", 0).unwrap())
        .await
        .unwrap();
    assert!(codes.find_active_code("a@x.com").await.unwrap().is_none());

    codes
        .insert_code(VerificationCodeModel::new("a@x.com", "222222", 600).unwrap())
        .await
        .unwrap();
    let active = codes.find_active_code("a@x.com").await.unwrap().unwrap();
    assert_eq!(active.otp, "222222");

    assert!(codes
        .find_code_by_email_and_otp("a@x.com", "111111")
        .await
        .unwrap()
        .is_none());
    assert!(codes
        .find_code_by_email_and_otp("a@x.com", "222222")
        .await
        .unwrap()
        .is_some());

    db.drop(None).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running MongoDB"]
async fn refresh_token_upsert_keeps_one_record_per_device() {
    let db = database().await;
    create_refresh_token_index(&db).await.unwrap();
    let store = RefreshTokenRepository::new(&db);
    let collection = db.collection::<RefreshTokenModel>(REFRESH_TOKENS_COLLECTION);
    let user_id = ObjectId::new();

    store.update_refresh_token(&user_id, "phone", "h1").await.unwrap();
    store.update_refresh_token(&user_id, "phone", "h2").await.unwrap();
    let phone = store.get_refresh_token(&user_id, "phone").await.unwrap().unwrap();
    assert_eq!(phone.refresh_token, "h2");

    // first logins for the same device arriving together
    let (first, second) = tokio::join!(
        store.update_refresh_token(&user_id, "laptop", "h3"),
        store.update_refresh_token(&user_id, "laptop", "h4"),
    );
    first.unwrap();
    second.unwrap();
    let laptops = collection
        .count_documents(doc! { "userId": user_id, "deviceName": "laptop" }, None)
        .await
        .unwrap();
    assert_eq!(laptops, 1);

    assert!(store.delete_refresh_token(&user_id, "phone").await.unwrap());
    assert!(!store.delete_refresh_token(&user_id, "phone").await.unwrap());
    assert!(store.get_refresh_token(&user_id, "laptop").await.unwrap().is_some());

    db.drop(None).await.unwrap();
}
