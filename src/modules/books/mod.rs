pub mod error;
pub mod models;
mod openapi;
pub mod query;
pub mod routes;
pub(crate) mod schema;
pub mod status;
pub mod store;
pub mod validation;

use async_trait::async_trait;
use axum::Router;
use libris_kernel::{Database, InitCtx, Migration, Module};

pub use error::CatalogError;
pub use models::{Book, BookId, BookInput, CatalogSummary, Genre, Status, WholeNumber};
pub use query::{BookOrder, Page, Predicate, PAGE_SIZE};
pub use status::{StatusChange, StatusOutcome};
pub use store::BookStore;

/// Library catalog module: book records, search and status changes
pub struct BooksModule {
    store: BookStore,
}

impl BooksModule {
    pub fn new(db: Database) -> Self {
        Self {
            store: BookStore::new(db),
        }
    }

    pub fn store(&self) -> &BookStore {
        &self.store
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi::fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: schema::SCHEMA,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let store = self.store.clone();
        let summary = tokio::task::spawn_blocking(move || store.summary()).await??;
        tracing::info!(
            module = self.name(),
            books = summary.total,
            "books module started"
        );
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(db: Database) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(db))
}
