//! Basic usage: build a query, inspect both compiled forms, execute it
//! against canned responses and hydrate the hits.
//!
//! Run with: `cargo run --example basic_usage`

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use manticore_builder::{
    Cast, Document, InMemoryTransport, ManticoreConfig, SearchBuilder, SearchError, SearchResponse, SortDirection,
};

#[tokio::main]
async fn main() -> Result<(), SearchError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let response = SearchResponse::from_json(json!({
        "took": 1,
        "timed_out": false,
        "hits": {
            "total": 2,
            "hits": [
                {"_id": 7, "_score": 1, "_source": {"CountryISO": "PT", "Name": "Lisboa", "created_at": 1700000000}},
                {"_id": 9, "_score": 1, "_source": {"CountryISO": "PT", "Name": "Porto", "created_at": 1700086400}}
            ]
        },
        "aggregations": {"by_region": {"buckets": [{"key": "Norte", "doc_count": 1}, {"key": "Lisboa", "doc_count": 1}]}}
    }))?;
    let transport = Arc::new(InMemoryTransport::new().with_search_response(response));

    let model = Document::new("ttrentitytest")
        .with_fillable(["countryiso", "name", "created_at"])
        .map_attribute("CountryISO", "countryiso")
        .cast("created_at", Cast::DateTime);

    let mut builder = SearchBuilder::new(model, transport, ManticoreConfig::from_env());
    builder
        .match_text("Portugal")
        .where_between("entityid", 1, 999_999_999)?
        .where_eq("countryiso", "PT")?
        .where_not_in("status", [3, 4])?
        .order_by("entityid", SortDirection::Asc)
        .aggregate("by_region", "region", Some(10))
        .limit(10);

    info!(sql = %builder.to_sql(), "Structured request as SQL");
    info!(body = %builder.to_request().to_json(), "Structured request body");

    for doc in builder.get().await? {
        info!(
            id = ?doc.value("id"),
            name = ?doc.value("name"),
            created_at = ?doc.get("created_at").and_then(|v| v.as_timestamp()),
            "Hydrated"
        );
    }

    let page = builder.paginate(1, 2).await?;
    info!(total = page.total, last_page = page.last_page(), items = page.items.len(), "Paginated");

    let facets = builder.get_facets().await?;
    for name in facets.names() {
        info!(facet = name, buckets = ?facets.get(name), "Facet");
    }

    Ok(())
}
