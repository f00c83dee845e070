use axum::http::StatusCode;
use axum_test::TestServer;
use libris_kernel::settings::Settings;
use serde_json::{json, Value};

async fn server() -> TestServer {
    let mut settings = Settings::default();
    settings.database.path = ":memory:".to_string();

    let (_db, registry) = libris_app::prepare(&settings).await.unwrap();
    let app = libris_http::build_router(&registry, &settings);
    TestServer::new(app).unwrap()
}

fn book(title: &str, author: &str, n: u64) -> Value {
    json!({
        "title": title,
        "author": author,
        "isbn": format!("978{n:010}"),
        "publication_year": 2001,
    })
}

async fn create(server: &TestServer, body: Value) -> Value {
    let response = server.post("/api/books").json(&body).await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

fn field_names(body: &Value) -> Vec<String> {
    body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|detail| detail["field"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn create_then_fetch() {
    let server = server().await;
    let created = create(
        &server,
        json!({
            "title": "The Hobbit",
            "author": "J.R.R. Tolkien",
            "isbn": "978-0-261-10221-7",
            "genre": "fiction",
            "publisher": "Allen & Unwin",
            "publication_year": 1937,
            "page_count": 310,
        }),
    )
    .await;

    assert_eq!(created["isbn"], "9780261102217");
    assert_eq!(created["status"], "available");
    assert_eq!(created["genre"], "fiction");

    let id = created["id"].as_i64().unwrap();
    let fetched: Value = server.get(&format!("/api/books/{id}")).await.json();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn invalid_book_reports_every_field() {
    let server = server().await;
    let response = server
        .post("/api/books")
        .json(&json!({
            "title": "",
            "author": "Someone",
            "isbn": "123",
            "publication_year": 999,
            "page_count": 0,
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "validation_error");
    let fields = field_names(&body);
    for field in ["title", "isbn", "publication_year", "page_count"] {
        assert!(fields.iter().any(|f| f == field), "missing {field} in {fields:?}");
    }

    let list: Value = server.get("/api/books").await.json();
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn duplicate_isbn_is_a_field_error() {
    let server = server().await;
    create(&server, book("First", "Author", 1)).await;

    let response = server.post("/api/books").json(&book("Second", "Author", 1)).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(field_names(&body), vec!["isbn".to_string()]);
    assert_eq!(
        body["error"]["details"][0]["message"],
        "A book with this ISBN already exists."
    );
}

#[tokio::test]
async fn mistyped_values_are_field_errors() {
    let server = server().await;
    let response = server
        .post("/api/books")
        .json(&json!({
            "title": "",
            "author": "A",
            "isbn": "9780000000001",
            "publication_year": "nineteen",
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(field_names(&body), vec!["title", "publication_year"]);
    assert_eq!(
        body["error"]["details"][1]["message"],
        "Enter a whole number."
    );

    let response = server
        .post("/api/books")
        .json(&json!({
            "title": null,
            "author": "A",
            "isbn": "9780000000001",
            "publication_year": "1999",
        }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(field_names(&body), vec!["title"]);
    assert_eq!(body["error"]["details"][0]["message"], "This field is required.");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let server = server().await;
    let response = server
        .post("/api/books")
        .text("{not json")
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_book_is_not_found() {
    let server = server().await;
    let response = server.get("/api/books/42").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "not_found");

    server
        .put("/api/books/42")
        .json(&book("Ghost", "Nobody", 9))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .delete("/api/books/42")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_id_is_not_found() {
    let server = server().await;

    let response = server.get("/api/books/abc").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "not_found");
    assert_eq!(body["error"]["message"], "Book not found");

    server
        .put("/api/books/abc")
        .json(&book("Ghost", "Nobody", 9))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    let response = server.delete("/api/books/abc").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"]["code"], "not_found");
}

#[tokio::test]
async fn update_keeps_identity_and_date_added() {
    let server = server().await;
    let created = create(&server, book("Dune", "Frank Herbert", 1)).await;
    let id = created["id"].as_i64().unwrap();

    let mut changed = book("Dune Messiah", "Frank Herbert", 1);
    changed["genre"] = json!("science");
    let response = server.put(&format!("/api/books/{id}")).json(&changed).await;
    response.assert_status_ok();

    let updated: Value = response.json();
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["title"], "Dune Messiah");
    assert_eq!(updated["genre"], "science");
    assert_eq!(updated["date_added"], created["date_added"]);
}

#[tokio::test]
async fn delete_removes_the_book() {
    let server = server().await;
    let created = create(&server, book("Emma", "Jane Austen", 1)).await;
    let id = created["id"].as_i64().unwrap();

    server
        .delete(&format!("/api/books/{id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get(&format!("/api/books/{id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_and_echoes_them() {
    let server = server().await;
    create(&server, book("Harry Potter", "J.K. Rowling", 1)).await;
    create(&server, book("The Hobbit", "J.R.R. Tolkien", 2)).await;
    let mut history = book("SPQR", "Mary Beard", 3);
    history["genre"] = json!("history");
    create(&server, history).await;

    let response = server
        .get("/api/books")
        .add_query_param("search", "HARRY")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["title"], "Harry Potter");
    assert_eq!(body["filters"]["search"], "HARRY");
    assert_eq!(body["filters"]["genre"], "");

    let body: Value = server
        .get("/api/books")
        .add_query_param("genre", "history")
        .await
        .json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["author"], "Mary Beard");
    assert_eq!(body["filters"]["genre"], "history");

    let body: Value = server
        .get("/api/books")
        .add_query_param("search", "")
        .add_query_param("genre", "")
        .await
        .json();
    assert_eq!(body["total"], 3);
    let titles: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Harry Potter", "SPQR", "The Hobbit"]);
}

#[tokio::test]
async fn search_folds_ascii_case_only() {
    let server = server().await;
    create(&server, book("Émile", "Jean-Jacques Rousseau", 1)).await;

    let body: Value = server
        .get("/api/books")
        .add_query_param("search", "émile")
        .await
        .json();
    assert_eq!(body["total"], 0);

    let body: Value = server
        .get("/api/books")
        .add_query_param("search", "ÉMILE")
        .await
        .json();
    assert_eq!(body["total"], 1);

    let body: Value = server
        .get("/api/books")
        .add_query_param("search", "ROUSSEAU")
        .await
        .json();
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn unknown_filter_value_is_rejected() {
    let server = server().await;
    server
        .get("/api/books")
        .add_query_param("genre", "poetry")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/api/books")
        .add_query_param("status", "gone")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_paginates_by_ten() {
    let server = server().await;
    for n in 0..25 {
        create(&server, book(&format!("Book {n:02}"), "Author", n)).await;
    }

    let first: Value = server.get("/api/books").await.json();
    assert_eq!(first["items"].as_array().unwrap().len(), 10);
    assert_eq!(first["total"], 25);
    assert_eq!(first["total_pages"], 3);
    assert_eq!(first["has_next"], true);
    assert_eq!(first["has_previous"], false);

    let last: Value = server
        .get("/api/books")
        .add_query_param("page", "3")
        .await
        .json();
    assert_eq!(last["items"].as_array().unwrap().len(), 5);
    assert_eq!(last["items"][0]["title"], "Book 20");
    assert_eq!(last["has_next"], false);

    server
        .get("/api/books")
        .add_query_param("page", "4")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get("/api/books")
        .add_query_param("page", "two")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_catalog_has_a_first_page() {
    let server = server().await;
    let body: Value = server.get("/api/books").await.json();
    assert_eq!(body["total"], 0);
    assert_eq!(body["page"], 1);
    assert_eq!(body["total_pages"], 1);
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn summary_counts_statuses() {
    let server = server().await;
    for n in 0..3 {
        create(&server, book(&format!("Book {n}"), "Author", n)).await;
    }
    let mut loaned = book("Loaned", "Author", 10);
    loaned["status"] = json!("loaned");
    create(&server, loaned).await;

    let summary: Value = server.get("/api/books/summary").await.json();
    assert_eq!(summary["total"], 4);
    let by_status = summary["by_status"].as_array().unwrap();
    let count = |code: &str| {
        by_status
            .iter()
            .find(|entry| entry["status"] == code)
            .map(|entry| entry["count"].clone())
            .unwrap()
    };
    assert_eq!(count("available"), 3);
    assert_eq!(count("loaned"), 1);
    assert_eq!(count("lost"), 0);
    assert_eq!(summary["recently_added"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn status_change_succeeds() {
    let server = server().await;
    let created = create(&server, book("Dracula", "Bram Stoker", 1)).await;
    let id = created["id"].as_i64().unwrap();

    let response = server
        .post(&format!("/api/books/{id}/status"))
        .json(&json!({ "status": "loaned" }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({
            "success": true,
            "message": "Status changed to Loaned",
            "old_status": "available",
            "new_status": "loaned",
        })
    );

    let fetched: Value = server.get(&format!("/api/books/{id}")).await.json();
    assert_eq!(fetched["status"], "loaned");
}

#[tokio::test]
async fn status_failures_are_still_ok_responses() {
    let server = server().await;
    let created = create(&server, book("Dracula", "Bram Stoker", 1)).await;
    let id = created["id"].as_i64().unwrap();

    let invalid = server
        .post(&format!("/api/books/{id}/status"))
        .json(&json!({ "status": "invalid_value" }))
        .await;
    invalid.assert_status_ok();
    assert_eq!(
        invalid.json::<Value>(),
        json!({ "success": false, "message": "Invalid status" })
    );

    let missing = server
        .post("/api/books/999/status")
        .json(&json!({ "status": "lost" }))
        .await;
    missing.assert_status_ok();
    assert_eq!(missing.json::<Value>()["message"], "Book not found");

    let malformed_id = server
        .post("/api/books/abc/status")
        .json(&json!({ "status": "lost" }))
        .await;
    malformed_id.assert_status_ok();
    assert_eq!(malformed_id.json::<Value>()["success"], false);

    let no_body = server
        .post(&format!("/api/books/{id}/status"))
        .text("status=lost")
        .await;
    no_body.assert_status_ok();
    assert_eq!(no_body.json::<Value>()["message"], "Invalid status");

    let fetched: Value = server.get(&format!("/api/books/{id}")).await.json();
    assert_eq!(fetched["status"], "available");
}

#[tokio::test]
async fn openapi_lists_book_routes() {
    let server = server().await;
    let doc: Value = server.get("/docs/openapi.json").await.json();
    assert!(doc["paths"]["/api/books"]["get"].is_object());
    assert!(doc["paths"]["/api/books/{id}/status"]["post"].is_object());
    assert!(doc["components"]["schemas"]["Book"].is_object());
    assert!(doc["components"]["schemas"]["ErrorResponse"].is_object());

    let typed: utoipa::openapi::OpenApi = serde_json::from_value(doc).unwrap();
    for path in ["/api/books", "/api/books/{id}", "/api/books/{id}/status", "/healthz"] {
        assert!(typed.paths.paths.contains_key(path), "missing {path}");
    }
    let schemas = typed.components.unwrap().schemas;
    assert!(schemas.contains_key("Book"));
    assert!(schemas.contains_key("StatusOutcome"));
}

#[tokio::test]
async fn health_endpoints_respond() {
    let server = server().await;
    server.get("/healthz").await.assert_status_ok();
    server.get("/api/books/health").await.assert_status_ok();
}
