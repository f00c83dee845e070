use serde_json::{json, Value};

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn id_parameter() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    })
}

fn book_body() -> Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/BookInput" }
            }
        }
    })
}

/// OpenAPI fragment for the books routes; paths are relative to `/api/books`.
pub fn fragment() -> Value {
    let book_ref = json!({ "$ref": "#/components/schemas/Book" });
    let genre_codes = json!([
        "fiction", "non-fiction", "science", "history", "biography",
        "technology", "art", "sports", "other"
    ]);
    let status_codes = json!(["available", "loaned", "reserved", "lost"]);

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "parameters": [
                        { "name": "search", "in": "query", "schema": { "type": "string" },
                          "description": "Case-insensitive match on title, author, ISBN or publisher" },
                        { "name": "genre", "in": "query", "schema": { "type": "string" } },
                        { "name": "status", "in": "query", "schema": { "type": "string" } },
                        { "name": "page", "in": "query", "schema": { "type": "integer", "minimum": 1 } }
                    ],
                    "responses": {
                        "200": json_response("One page of books", json!({ "$ref": "#/components/schemas/BookPage" })),
                        "400": error_response("Unknown filter value or malformed page"),
                        "404": error_response("Page out of range")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": book_body(),
                    "responses": {
                        "201": json_response("Created book", book_ref.clone()),
                        "422": error_response("Field errors")
                    }
                }
            },
            "/summary": {
                "get": {
                    "summary": "Catalog counts and recent additions",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response("Catalog summary", json!({ "$ref": "#/components/schemas/CatalogSummary" }))
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": json_response("The book", book_ref.clone()),
                        "404": error_response("Book not found")
                    }
                },
                "put": {
                    "summary": "Replace a book's fields",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "requestBody": book_body(),
                    "responses": {
                        "200": json_response("Updated book", book_ref.clone()),
                        "404": error_response("Book not found"),
                        "422": error_response("Field errors")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "204": { "description": "Deleted" },
                        "404": error_response("Book not found")
                    }
                }
            },
            "/{id}/status": {
                "post": {
                    "summary": "Change a book's status",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": { "status": { "type": "string", "enum": status_codes.clone() } },
                                    "required": ["status"]
                                }
                            }
                        }
                    },
                    "responses": {
                        "200": json_response("Outcome, successful or not", json!({ "$ref": "#/components/schemas/StatusOutcome" }))
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "title": { "type": "string", "maxLength": 200 },
                        "author": { "type": "string", "maxLength": 100 },
                        "isbn": { "type": "string", "description": "13 digits" },
                        "genre": { "type": "string", "enum": genre_codes.clone() },
                        "publisher": { "type": ["string", "null"] },
                        "publication_year": { "type": "integer", "minimum": 1000, "maximum": 2024 },
                        "page_count": { "type": ["integer", "null"], "minimum": 1 },
                        "description": { "type": ["string", "null"] },
                        "status": { "type": "string", "enum": status_codes.clone() },
                        "date_added": { "type": "string", "format": "date" },
                        "date_modified": { "type": "string", "format": "date-time" }
                    },
                    "required": [
                        "id", "title", "author", "isbn", "genre", "publication_year",
                        "status", "date_added", "date_modified"
                    ]
                },
                "BookInput": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "isbn": { "type": "string", "description": "Spaces and hyphens are ignored" },
                        "genre": { "type": "string", "enum": genre_codes },
                        "publisher": { "type": "string" },
                        "publication_year": { "type": "integer" },
                        "page_count": { "type": "integer" },
                        "description": { "type": "string" },
                        "status": { "type": "string", "enum": status_codes }
                    },
                    "required": ["title", "author", "isbn", "publication_year"]
                },
                "BookPage": {
                    "type": "object",
                    "properties": {
                        "items": { "type": "array", "items": book_ref.clone() },
                        "page": { "type": "integer" },
                        "page_size": { "type": "integer" },
                        "total": { "type": "integer" },
                        "total_pages": { "type": "integer" },
                        "has_next": { "type": "boolean" },
                        "has_previous": { "type": "boolean" },
                        "filters": {
                            "type": "object",
                            "properties": {
                                "search": { "type": "string" },
                                "genre": { "type": "string" },
                                "status": { "type": "string" }
                            }
                        }
                    }
                },
                "CatalogSummary": {
                    "type": "object",
                    "properties": {
                        "total": { "type": "integer" },
                        "by_status": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "status": { "type": "string" },
                                    "label": { "type": "string" },
                                    "count": { "type": "integer" }
                                }
                            }
                        },
                        "recently_added": { "type": "array", "items": book_ref }
                    }
                },
                "StatusOutcome": {
                    "type": "object",
                    "properties": {
                        "success": { "type": "boolean" },
                        "message": { "type": "string" },
                        "old_status": { "type": "string" },
                        "new_status": { "type": "string" }
                    },
                    "required": ["success", "message"]
                }
            }
        }
    })
}
