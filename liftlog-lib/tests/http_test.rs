use anyhow::Result;
use httpmock::prelude::*;
use liftlog_lib::{
    EntryId, ExerciseStore, HttpExerciseStore, LogError, NewExerciseEntry, NutritionError,
    NutritionFacts, NutritionLookup, NutritionixClient, NutritionixCredentials, StoreError,
};
use serde_json::json;
use std::time::Duration;

fn test_store(server: &MockServer) -> Result<HttpExerciseStore> {
    Ok(HttpExerciseStore::new(&server.base_url(), Duration::from_secs(5))?)
}

fn test_nutrition(server: &MockServer) -> Result<NutritionixClient> {
    let credentials = NutritionixCredentials {
        app_id: "app-id".to_string(),
        app_key: "app-key".to_string(),
        remote_user_id: "0".to_string(),
    };
    Ok(NutritionixClient::new(
        &server.base_url(),
        Some(credentials),
        Duration::from_secs(5),
    )?)
}

// --- Exercise store ---

#[tokio::test]
async fn test_list_exercise_names() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/exercises/names");
            then.status(200).json_body(json!(["squat", "bench_press"]));
        })
        .await;

    let names = test_store(&server)?.list_exercise_names().await?;
    mock.assert_async().await;
    assert_eq!(names, vec!["squat", "bench_press"]);
    Ok(())
}

#[tokio::test]
async fn test_list_entries_by_name_accepts_mixed_timestamps() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/exercises")
                .query_param("name", "bench_press");
            then.status(200).json_body(json!([
                {"_id": "a1", "name": "bench_press", "weight": 135, "reps": 5, "createdAt": 100},
                {"id": 7, "name": "bench_press", "weight": 140.5, "reps": 3,
                 "notes": "belt", "createdAt": "2024-03-01T12:00:00Z"}
            ]));
        })
        .await;

    let entries = test_store(&server)?.list_entries_by_name("bench_press").await?;
    mock.assert_async().await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, EntryId::new("a1"));
    assert_eq!(entries[0].created_at.timestamp_millis(), 100);
    assert_eq!(entries[1].id, EntryId::new("7"));
    assert_eq!(entries[1].notes.as_deref(), Some("belt"));
    assert_eq!(entries[1].created_at.timestamp_millis(), 1_709_294_400_000);
    Ok(())
}

#[tokio::test]
async fn test_get_missing_entry_is_not_found() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/exercises/404id");
            then.status(404);
        })
        .await;

    let err = test_store(&server)?
        .get_entry_by_id(&EntryId::new("404id"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert!(matches!(LogError::from(err), LogError::LookupNotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_create_entry_posts_millis() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/exercises")
                .json_body(json!({
                    "name": "squat", "weight": 225.0, "reps": 3, "createdAt": 1_700_000_000_000_i64
                }));
            then.status(201).json_body(json!({
                "_id": "new1", "name": "squat", "weight": 225, "reps": 3, "createdAt": 1_700_000_000_000_i64
            }));
        })
        .await;

    let new_entry = NewExerciseEntry {
        name: "squat".to_string(),
        weight: 225.0,
        reps: 3,
        created_at: chrono::DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
        notes: None,
    };
    let created = test_store(&server)?.create_entry(&new_entry).await?;
    mock.assert_async().await;
    assert_eq!(created.id, Some(EntryId::new("new1")));
    Ok(())
}

#[tokio::test]
async fn test_server_error_keeps_body() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/exercises/e1");
            then.status(500).body("database offline");
        })
        .await;

    let err = test_store(&server)?
        .delete_entry(&EntryId::new("e1"))
        .await
        .unwrap_err();
    match err {
        StoreError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "database offline");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

// --- Nutrition ---

#[tokio::test]
async fn test_barcode_lookup_returns_first_food() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/search/item")
                .query_param("upc", "012345")
                .header("x-app-id", "app-id")
                .header("x-app-key", "app-key");
            then.status(200).json_body(json!({"foods": [{
                "food_name": "Protein Bar",
                "brand_name": "Acme",
                "serving_qty": 1,
                "serving_unit": "bar",
                "serving_weight_grams": 50,
                "nf_calories": 200,
                "nf_protein": 20
            }]}));
        })
        .await;

    let food = test_nutrition(&server)?
        .lookup_by_barcode("012345")
        .await?
        .expect("a product");
    mock.assert_async().await;

    let facts = NutritionFacts::from(food);
    assert_eq!(facts.product_name, "Protein Bar");
    assert_eq!(facts.calories_per_100g, Some(400.0));
    assert_eq!(facts.nutrients.protein, Some(20.0));

    let two = facts.for_servings(2.0);
    assert_eq!(two.total_calories, 400.0);
    assert_eq!(two.requested.grams, Some(100.0));
    Ok(())
}

#[tokio::test]
async fn test_unknown_barcode_is_none() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/search/item");
            then.status(404).json_body(json!({"message": "resource not found"}));
        })
        .await;

    assert!(test_nutrition(&server)?.lookup_by_barcode("999").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_text_search_returns_branded_items() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/search/instant")
                .query_param("query", "oat milk")
                .query_param("branded", "true");
            then.status(200).json_body(json!({
                "common": [{"food_name": "oats"}],
                "branded": [
                    {"food_name": "Oat Milk Original", "brand_name": "Oatly", "nix_item_id": "x1"},
                    {"food_name": "Oat Milk Barista", "brand_name": "Oatly", "nix_item_id": "x2"}
                ]
            }));
        })
        .await;

    let results = test_nutrition(&server)?.search_by_text(" oat milk ").await?;
    mock.assert_async().await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[1].nix_item_id.as_deref(), Some("x2"));
    Ok(())
}

#[tokio::test]
async fn test_natural_query_posts_text() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/natural/nutrients")
                .header("x-app-key", "app-key")
                .json_body(json!({
                    "query": "2 eggs and a banana", "timezone": "US/Eastern", "locale": "en_US"
                }));
            then.status(200).json_body(json!({"foods": [
                {"food_name": "egg", "serving_qty": 2, "nf_calories": 143},
                {"food_name": "banana", "serving_qty": 1, "nf_calories": 105}
            ]}));
        })
        .await;

    let client = test_nutrition(&server)?;
    let foods = client.search_natural("2 eggs and a banana").await?;
    mock.assert_async().await;
    assert_eq!(foods.len(), 2);
    assert_eq!(foods[0].food_name, "egg");
    assert_eq!(foods[1].nf_calories, Some(105.0));

    assert!(client.search_natural("  ").await?.is_empty());
    assert_eq!(mock.hits_async().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_blank_search_makes_no_request() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.path("/search/instant");
            then.status(200).json_body(json!({"branded": []}));
        })
        .await;

    let results = test_nutrition(&server)?.search_by_text("   ").await?;
    assert!(results.is_empty());
    assert_eq!(mock.hits_async().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_missing_credentials_fail_before_request() -> Result<()> {
    let server = MockServer::start_async().await;
    let client = NutritionixClient::new(&server.base_url(), None, Duration::from_secs(5))?;
    let err = client.search_by_text("apple").await.unwrap_err();
    assert!(matches!(err, NutritionError::MissingCredentials));
    Ok(())
}
