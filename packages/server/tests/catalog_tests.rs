//! Catalog CRUD through the REST API against a real Postgres.
//!
//! Requires Docker: `cargo test -- --ignored`

mod common;

use axum::http::{Method, StatusCode};
use materials_core::domains::catalog::models::{Category, CategoryInput};
use materials_core::domains::catalog::CatalogError;
use materials_core::kernel::TestDependencies;
use serde_json::json;

use crate::common::{create_category, create_manufacturer, create_product, get, send, TestHarness};

const ADMIN_KEY: &str = "catalog-admin";

#[tokio::test]
#[ignore = "requires Docker"]
async fn manufacturer_crud_round() {
    let harness = TestHarness::new().await.unwrap();
    let app = harness.app(TestDependencies::new(), Some(ADMIN_KEY));

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/manufacturers",
        Some(json!({ "name": "  LEIER  ", "website": "https://www.leier.hu/" })),
        Some(ADMIN_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "LEIER");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = get(&app, &format!("/api/manufacturers/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["website"], "https://www.leier.hu/");

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/manufacturers/{}", id),
        Some(json!({ "name": "Leier Hungária" })),
        Some(ADMIN_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Leier Hungária");
    assert!(updated["website"].is_null());

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/manufacturers/{}", id),
        None,
        Some(ADMIN_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = get(&app, &format!("/api/manufacturers/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Manufacturer not found");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn duplicate_manufacturer_name_conflicts() {
    let harness = TestHarness::new().await.unwrap();
    create_manufacturer(&harness.db_pool, "Baumit").await.unwrap();
    let app = harness.app(TestDependencies::new(), None);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/manufacturers",
        Some(json!({ "name": "BAUMIT" })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn blank_name_is_bad_request() {
    let harness = TestHarness::new().await.unwrap();
    let app = harness.app(TestDependencies::new(), None);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/categories",
        Some(json!({ "name": "   " })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Category name is required");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn product_with_unknown_manufacturer_is_unprocessable() {
    let harness = TestHarness::new().await.unwrap();
    let app = harness.app(TestDependencies::new(), None);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({
            "manufacturer_id": "0195f3c2-8d4e-7000-8000-000000000001",
            "name": "Frontrock MAX E",
            "source_url": "https://www.rockwool.com/hu/frontrock-max-e/",
        })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("does not exist"));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn product_create_update_and_extractions() {
    let harness = TestHarness::new().await.unwrap();
    let manufacturer = create_manufacturer(&harness.db_pool, "ROCKWOOL").await.unwrap();
    let category = create_category(&harness.db_pool, "Hőszigetelés", None).await.unwrap();
    let app = harness.app(TestDependencies::new(), None);

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({
            "manufacturer_id": manufacturer.id,
            "category_id": category.id,
            "name": "Frontrock MAX E",
            "price": "12990.00",
            "technical_specs": { "fire_class": "A1" },
            "source_url": "https://www.rockwool.com/hu/frontrock-max-e/",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["technical_specs"]["fire_class"], "A1");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/products/{}", id),
        Some(json!({
            "manufacturer_id": manufacturer.id,
            "name": "Frontrock MAX E 100 mm",
            "price": "-1",
            "source_url": "https://www.rockwool.com/hu/frontrock-max-e/",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "price cannot be negative");

    let (status, extractions) = get(&app, &format!("/api/products/{}/extractions", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(extractions, json!([]));

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/products/{}/extract", id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Product has no datasheet to extract");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn product_list_filters_and_paginates() {
    let harness = TestHarness::new().await.unwrap();
    let rockwool = create_manufacturer(&harness.db_pool, "ROCKWOOL").await.unwrap();
    let baumit = create_manufacturer(&harness.db_pool, "Baumit").await.unwrap();
    for name in ["Frontrock MAX E", "Airrock HD", "Steprock ND"] {
        create_product(&harness.db_pool, rockwool.id, name, None).await.unwrap();
    }
    create_product(&harness.db_pool, baumit.id, "StarContact", None).await.unwrap();
    let app = harness.app(TestDependencies::new(), None);

    let (status, page) = get(
        &app,
        &format!("/api/products?manufacturer_id={}&first=2", rockwool.id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    assert_eq!(page["page_info"]["has_next_page"], true);

    let cursor = page["page_info"]["end_cursor"].as_str().unwrap().to_string();
    let (_, next) = get(
        &app,
        &format!("/api/products?manufacturer_id={}&first=2&after={}", rockwool.id, cursor),
    )
    .await;
    assert_eq!(next["items"].as_array().unwrap().len(), 1);
    assert_eq!(next["page_info"]["has_next_page"], false);

    let (_, filtered) = get(&app, "/api/products?q=rock%20max").await;
    let names: Vec<&str> = filtered["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Frontrock MAX E"]);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn category_tree_and_cycle_rules() {
    let harness = TestHarness::new().await.unwrap();
    let pool = &harness.db_pool;
    let insulation = create_category(pool, "Hőszigetelés", None).await.unwrap();
    let facade = create_category(pool, "Homlokzat", Some(insulation.id)).await.unwrap();
    let slab = create_category(pool, "Lemezek", Some(facade.id)).await.unwrap();
    let app = harness.app(TestDependencies::new(), None);

    let (status, tree) = get(&app, "/api/categories/tree").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tree[0]["name"], "Hőszigetelés");
    assert_eq!(tree[0]["children"][0]["children"][0]["name"], "Lemezek");

    // Moving a category under its own grandchild would loop
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/categories/{}", insulation.id),
        Some(json!({ "name": "Hőszigetelés", "parent_id": slab.id })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("descendants"));

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/categories/{}", facade.id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/categories/{}", slab.id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn category_self_parent_is_rejected() {
    let harness = TestHarness::new().await.unwrap();
    let category = create_category(&harness.db_pool, "Vakolatok", None).await.unwrap();

    let error = Category::update(
        category.id,
        CategoryInput {
            name: "Vakolatok".to_string(),
            parent_id: Some(category.id),
        },
        &harness.db_pool,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        error.downcast_ref::<CatalogError>(),
        Some(CatalogError::CategoryCycle)
    ));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn ensure_path_reuses_existing_nodes() {
    let harness = TestHarness::new().await.unwrap();
    let pool = &harness.db_pool;
    let path = vec!["Falazóelemek".to_string(), "Tégla".to_string()];

    let first = Category::ensure_path(&path, pool).await.unwrap().unwrap();
    let second = Category::ensure_path(&path, pool).await.unwrap().unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(Category::find_all(pool).await.unwrap().len(), 2);
    assert!(Category::ensure_path(&[], pool).await.unwrap().is_none());
}
