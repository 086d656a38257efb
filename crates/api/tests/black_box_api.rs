use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use shop_api::app::services::AppServices;
use shop_catalog::{NewArticle, NewCategory, NewProduct};
use shop_core::Entity;
use shop_infra::external::{EcoGrade, EcoScoreClient, FixedEcoScore, KeyedEcoScore, UnavailableEcoScore};
use shop_infra::read_model::InMemoryCatalogStore;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(store: Arc<InMemoryCatalogStore>, ecoscore: Arc<dyn EcoScoreClient>) -> Self {
        // Same router as prod, injected collaborators, ephemeral port.
        let services = AppServices::new(store, ecoscore, Duration::from_millis(200));
        let app = shop_api::app::build_app(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Fruits (active): Ananas (active, 2 articles, one inactive), Banane
/// (inactive). Légumes (inactive): Tomate (active).
///
/// Ids: categories Fruits=1 Légumes=2; products Ananas=1 Banane=2 Tomate=3;
/// articles "Ananas x1"=1 "Ananas x6"=2 "Tomate 1kg"=3.
fn scenario() -> Arc<InMemoryCatalogStore> {
    catalog(false)
}

/// Same catalog with every category active.
fn all_categories_active() -> Arc<InMemoryCatalogStore> {
    catalog(true)
}

fn catalog(legumes_active: bool) -> Arc<InMemoryCatalogStore> {
    let store = InMemoryCatalogStore::new();
    let fruits = store
        .insert_category(NewCategory::new("Fruits", "Fruits de saison"))
        .unwrap();
    let mut legumes = NewCategory::new("Légumes", "Légumes du jardin");
    if !legumes_active {
        legumes = legumes.inactive();
    }
    let legumes = store.insert_category(legumes).unwrap();

    let ananas = store.insert_product(NewProduct::new(fruits.id(), "Ananas")).unwrap();
    store
        .insert_product(NewProduct::new(fruits.id(), "Banane").inactive())
        .unwrap();
    let tomate = store.insert_product(NewProduct::new(legumes.id(), "Tomate")).unwrap();

    store
        .insert_article(NewArticle::new(ananas.id(), "Ananas x1", Decimal::new(250, 2)))
        .unwrap();
    store
        .insert_article(NewArticle::new(ananas.id(), "Ananas x6", Decimal::new(1200, 2)).inactive())
        .unwrap();
    store
        .insert_article(NewArticle::new(tomate.id(), "Tomate 1kg", Decimal::new(390, 2)))
        .unwrap();

    Arc::new(store)
}

async fn get_json(client: &reqwest::Client, url: String) -> Value {
    let res = client.get(url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

fn names(list: &Value) -> Vec<&str> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|v| v["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn category_list_shows_active_categories_without_nesting() {
    let srv = TestServer::spawn(scenario(), Arc::new(FixedEcoScore::new(EcoGrade::A))).await;
    let client = reqwest::Client::new();

    let body = get_json(&client, srv.url("/categories/")).await;
    assert_eq!(names(&body), ["Fruits"]);

    let fruits = body[0].as_object().unwrap();
    let mut keys: Vec<_> = fruits.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["date_created", "date_updated", "id", "name"]);
}

#[tokio::test]
async fn category_list_returns_every_active_category_in_id_order() {
    let srv = TestServer::spawn(all_categories_active(), Arc::new(FixedEcoScore::new(EcoGrade::A))).await;
    let client = reqwest::Client::new();

    let body = get_json(&client, srv.url("/categories/")).await;
    assert_eq!(names(&body), ["Fruits", "Légumes"]);
    assert_eq!(body[0]["id"], 1);
    assert_eq!(body[1]["id"], 2);
    assert!(body[1].get("products").is_none());
}

#[tokio::test]
async fn category_detail_nests_only_active_products() {
    let srv = TestServer::spawn(scenario(), Arc::new(FixedEcoScore::new(EcoGrade::B))).await;
    let client = reqwest::Client::new();

    let body = get_json(&client, srv.url("/categories/1/")).await;
    assert_eq!(body["name"], "Fruits");
    assert!(body.get("description").is_none());
    assert_eq!(names(&body["products"]), ["Ananas"]);
    assert_eq!(body["products"][0]["category"], 1);
    assert_eq!(body["products"][0]["ecoscore"], "b");
    assert!(body["products"][0].get("articles").is_none());
}

#[tokio::test]
async fn inactive_category_detail_is_still_reachable() {
    let srv = TestServer::spawn(scenario(), Arc::new(FixedEcoScore::new(EcoGrade::B))).await;
    let client = reqwest::Client::new();

    let body = get_json(&client, srv.url("/categories/2/")).await;
    assert_eq!(body["name"], "Légumes");
    assert_eq!(names(&body["products"]), ["Tomate"]);
}

#[tokio::test]
async fn product_list_filters_by_category_and_active_flag() {
    let srv = TestServer::spawn(scenario(), Arc::new(FixedEcoScore::new(EcoGrade::C))).await;
    let client = reqwest::Client::new();

    let all = get_json(&client, srv.url("/products/")).await;
    assert_eq!(names(&all), ["Ananas", "Tomate"]);
    assert!(all.as_array().unwrap().iter().all(|p| p["ecoscore"] == "c"));

    let fruits = get_json(&client, srv.url("/products/?category_id=1")).await;
    assert_eq!(names(&fruits), ["Ananas"]);

    let unknown = get_json(&client, srv.url("/products/?category_id=99")).await;
    assert_eq!(unknown, json!([]));

    let garbage = get_json(&client, srv.url("/products/?category_id=abc")).await;
    assert_eq!(names(&garbage), ["Ananas", "Tomate"]);
}

#[tokio::test]
async fn repeated_query_keys_use_the_last_value() {
    let srv = TestServer::spawn(scenario(), Arc::new(FixedEcoScore::new(EcoGrade::C))).await;
    let client = reqwest::Client::new();

    let fruits = get_json(&client, srv.url("/products/?category_id=2&category_id=1")).await;
    assert_eq!(names(&fruits), ["Ananas"]);

    let legumes = get_json(&client, srv.url("/products/?category_id=1&category_id=2")).await;
    assert_eq!(names(&legumes), ["Tomate"]);

    let tomate = get_json(&client, srv.url("/articles/?product_id=1&product_id=3")).await;
    assert_eq!(names(&tomate), ["Tomate 1kg"]);

    let same = get_json(&client, srv.url("/articles/?product_id=1&product_id=1")).await;
    assert_eq!(names(&same), ["Ananas x1"]);

    let bare = get_json(&client, srv.url("/products/?category_id")).await;
    assert_eq!(names(&bare), ["Ananas", "Tomate"]);
}

#[tokio::test]
async fn product_detail_nests_only_active_articles() {
    let srv = TestServer::spawn(scenario(), Arc::new(FixedEcoScore::new(EcoGrade::A))).await;
    let client = reqwest::Client::new();

    let body = get_json(&client, srv.url("/products/1/")).await;
    assert_eq!(body["name"], "Ananas");
    assert_eq!(body["ecoscore"], "a");
    let articles = body["articles"].as_array().unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0]["id"], 1);
    assert_eq!(articles[0]["name"], "Ananas x1");
    assert_eq!(articles[0]["price"], "2.50");
    assert_eq!(articles[0]["product"], 1);

    let created = body["date_created"].as_str().unwrap();
    assert_eq!(created.len(), "2024-01-01T00:00:00.000000Z".len());
    assert!(created.ends_with('Z'));
}

#[tokio::test]
async fn article_endpoints() {
    let srv = TestServer::spawn(scenario(), Arc::new(FixedEcoScore::new(EcoGrade::A))).await;
    let client = reqwest::Client::new();

    let all = get_json(&client, srv.url("/articles/")).await;
    assert_eq!(names(&all), ["Ananas x1", "Tomate 1kg"]);

    let of_tomate = get_json(&client, srv.url("/articles/?product_id=3")).await;
    assert_eq!(names(&of_tomate), ["Tomate 1kg"]);

    let inactive = get_json(&client, srv.url("/articles/2/")).await;
    assert_eq!(inactive["name"], "Ananas x6");
    assert_eq!(inactive["price"], "12.00");
    assert!(inactive.get("ecoscore").is_none());
}

#[tokio::test]
async fn ecoscore_is_attributed_per_product() {
    let client_stub = KeyedEcoScore::new([("Ananas".to_string(), EcoGrade::A)]);
    let srv = TestServer::spawn(scenario(), Arc::new(client_stub)).await;
    let client = reqwest::Client::new();

    let all = get_json(&client, srv.url("/products/")).await;
    assert_eq!(all[0]["ecoscore"], "a");
    assert!(all[1]["ecoscore"].is_null());
    assert_eq!(all[1]["name"], "Tomate");
}

#[tokio::test]
async fn unavailable_ecoscore_renders_null() {
    let srv = TestServer::spawn(scenario(), Arc::new(UnavailableEcoScore)).await;
    let client = reqwest::Client::new();

    let body = get_json(&client, srv.url("/products/1/")).await;
    assert!(body["ecoscore"].is_null());
    assert_eq!(body["articles"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn writes_are_rejected_without_side_effects() {
    let store = scenario();
    let srv = TestServer::spawn(store.clone(), Arc::new(FixedEcoScore::new(EcoGrade::A))).await;
    let client = reqwest::Client::new();
    let before = get_json(&client, srv.url("/products/1/")).await;

    let attempts = [
        client.post(srv.url("/categories/")).json(&json!({"name": "Épices", "description": "Épices"})),
        client.put(srv.url("/products/1/")).json(&json!({"name": "Ananas Victoria"})),
        client.patch(srv.url("/products/1/")).json(&json!({"active": false})),
        client.delete(srv.url("/products/1/")),
        client.delete(srv.url("/articles/1/")),
        client.post(srv.url("/articles/")).json(&json!({"name": "Kiwi", "price": "3.00", "product": 1})),
        client.get(srv.url("/categories/1/disable/")),
    ];
    for req in attempts {
        let res = req.send().await.unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "method_not_allowed");
    }

    assert_eq!(store.counts().unwrap(), (2, 3, 3));
    let after = get_json(&client, srv.url("/products/1/")).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn disable_hides_entity_from_lists_but_not_from_detail() {
    let srv = TestServer::spawn(scenario(), Arc::new(FixedEcoScore::new(EcoGrade::A))).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let res = client.post(srv.url("/products/1/disable/")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.text().await.unwrap().is_empty());
    }

    let all = get_json(&client, srv.url("/products/")).await;
    assert_eq!(names(&all), ["Tomate"]);
    let fruits = get_json(&client, srv.url("/categories/1/")).await;
    assert_eq!(fruits["products"], json!([]));

    let ananas = get_json(&client, srv.url("/products/1/")).await;
    assert_eq!(ananas["name"], "Ananas");

    let res = client.post(srv.url("/categories/1/disable/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let categories = get_json(&client, srv.url("/categories/")).await;
    assert_eq!(categories, json!([]));
}

#[tokio::test]
async fn unknown_ids_and_paths_are_not_found() {
    let srv = TestServer::spawn(scenario(), Arc::new(FixedEcoScore::new(EcoGrade::A))).await;
    let client = reqwest::Client::new();

    for path in [
        "/categories/99/",
        "/products/99/",
        "/articles/99/",
        "/products/abc/",
        "/articles/1/disable/",
        "/nowhere/",
    ] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "GET {path}");
    }

    let res = client.post(srv.url("/categories/99/disable/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn repeated_reads_are_identical() {
    let srv = TestServer::spawn(scenario(), Arc::new(FixedEcoScore::new(EcoGrade::D))).await;
    let client = reqwest::Client::new();

    for path in ["/categories/", "/categories/1/", "/products/", "/products/1/", "/articles/"] {
        let first = get_json(&client, srv.url(path)).await;
        let second = get_json(&client, srv.url(path)).await;
        assert_eq!(first, second, "GET {path}");
    }
}

#[tokio::test]
async fn responses_carry_request_id_and_health_is_up() {
    let srv = TestServer::spawn(scenario(), Arc::new(FixedEcoScore::new(EcoGrade::A))).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    let res = client.delete(srv.url("/products/1/")).send().await.unwrap();
    assert!(res.headers().contains_key("x-request-id"));
}
