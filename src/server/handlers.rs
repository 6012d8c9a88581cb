//! Route handlers. Each one parses its input, calls into the core, and maps
//! the result onto a JSON response — no business logic lives here.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::control::{self, ErrorKind};
use crate::store::{CrawlSelector, DocRef};

use super::dto::*;
use super::AppState;

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unconfigured => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::VectorNotInitialized => StatusCode::PRECONDITION_FAILED,
        ErrorKind::Busy => StatusCode::CONFLICT,
        ErrorKind::Invalid => StatusCode::BAD_REQUEST,
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (status, Json(ErrorResponse { error: message.into() }))
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn add_link(
    State(state): State<AppState>,
    Json(req): Json<AddLinkRequest>,
) -> Result<Json<LinkDetails>, (StatusCode, Json<ErrorResponse>)> {
    let url = control::normalize_url(&req.url);
    let doc = state
        .store
        .insert(&url)
        .map_err(|e| error_response(status_for(control::classify_store_error(&e)), e.to_string()))?;
    state
        .search
        .on_document_changed(&doc)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(doc.into()))
}

pub async fn list_links(
    State(state): State<AppState>,
    Query(q): Query<LinksListQuery>,
) -> Result<Json<LinksListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let (page, limit, offset) = control::paginate(q.page, q.limit);
    let (docs, total) = state
        .store
        .list(q.show_hidden.unwrap_or(false), limit as i64, offset as i64)
        .map_err(|e| error_response(status_for(control::classify_store_error(&e)), e.to_string()))?;
    Ok(Json(LinksListResponse {
        links: docs.iter().map(LinkSummary::from).collect(),
        total,
        page,
        limit,
    }))
}

pub async fn get_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LinkDetails>, (StatusCode, Json<ErrorResponse>)> {
    let doc = state
        .store
        .get_by_id(&id)
        .map_err(|e| error_response(status_for(control::classify_store_error(&e)), e.to_string()))?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, format!("no such link: {id}")))?;
    Ok(Json(doc.into()))
}

pub async fn hide_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let hidden = state
        .store
        .toggle_hidden(&DocRef::Id(id.clone()))
        .map_err(|e| error_response(status_for(control::classify_store_error(&e)), e.to_string()))?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, format!("no such link: {id}")))?;
    if let Some(doc) = state
        .store
        .get_by_id(&id)
        .map_err(|e| error_response(status_for(control::classify_store_error(&e)), e.to_string()))?
    {
        state
            .search
            .on_document_changed(&doc)
            .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    }
    Ok(Json(serde_json::json!({ "hidden": hidden })))
}

pub async fn remove_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let removed = state
        .store
        .remove_by_id(&id)
        .map_err(|e| error_response(status_for(control::classify_store_error(&e)), e.to_string()))?;
    if !removed {
        return Err(error_response(StatusCode::NOT_FOUND, format!("no such link: {id}")));
    }
    state
        .search
        .on_document_removed(&id)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn hybrid_search(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, (StatusCode, Json<ErrorResponse>)> {
    let (page, limit, offset) = control::paginate(q.page, q.limit);
    let kw = q.kw_weight.unwrap_or(0.5);
    let vw = q.vw_weight.unwrap_or(0.5);
    let (results, total) = state
        .search
        .hybrid_search(&q.q, kw, vw, limit as usize, offset as usize)
        .await
        .map_err(|e| error_response(status_for(control::classify_search_error(&e)), e.to_string()))?;
    Ok(Json(SearchResponse { results, total, page, limit }))
}

pub async fn text_search(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, (StatusCode, Json<ErrorResponse>)> {
    let (page, limit, _) = control::paginate(q.page, q.limit);
    let results = state
        .search
        .text_search(&q.q, limit as usize)
        .map_err(|e| error_response(status_for(control::classify_search_error(&e)), e.to_string()))?;
    let total = results.len();
    Ok(Json(SearchResponse { results, total, page, limit }))
}

pub async fn vector_search(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, (StatusCode, Json<ErrorResponse>)> {
    let (page, limit, _) = control::paginate(q.page, q.limit);
    let results = state
        .search
        .vector_search(&q.q, limit as usize, None)
        .await
        .map_err(|e| error_response(status_for(control::classify_search_error(&e)), e.to_string()))?;
    let total = results.len();
    Ok(Json(SearchResponse { results, total, page, limit }))
}

pub async fn crawl_one(
    State(state): State<AppState>,
    Json(req): Json<CrawlRequest>,
) -> Result<Json<Vec<CrawlResult>>, (StatusCode, Json<ErrorResponse>)> {
    let selector = if let Some(url) = req.url {
        CrawlSelector::Url(control::normalize_url(&url))
    } else if req.all.unwrap_or(false) {
        CrawlSelector::All
    } else if let Some(days) = req.old_days {
        CrawlSelector::Old(days)
    } else {
        CrawlSelector::Missing
    };
    let urls = state
        .store
        .list_to_crawl(&selector)
        .map_err(|e| error_response(status_for(control::classify_store_error(&e)), e.to_string()))?;

    let mut results = Vec::with_capacity(urls.len());
    for url in urls {
        let outcome = state
            .crawler
            .crawl_one(&url)
            .await
            .map_err(|e| error_response(status_for(control::classify_crawl_error(&e)), e.to_string()))?;
        if let Some(doc) = state.store.get_by_url(&outcome.url).ok().flatten() {
            let _ = state.search.on_document_changed(&doc);
        }
        results.push(CrawlResult {
            url: outcome.url,
            success: outcome.success,
            http_status: outcome.http_status,
            error: outcome.error,
        });
    }
    Ok(Json(results))
}

pub async fn database_status(
    State(state): State<AppState>,
) -> Result<Json<DatabaseStatus>, (StatusCode, Json<ErrorResponse>)> {
    let (_, total) = state
        .store
        .list(true, 1, 0)
        .map_err(|e| error_response(status_for(control::classify_store_error(&e)), e.to_string()))?;
    let embedded = state
        .store
        .list_embedded()
        .map_err(|e| error_response(status_for(control::classify_store_error(&e)), e.to_string()))?
        .len();
    let pending = state
        .store
        .list_pending_embeddings(i64::MAX)
        .map_err(|e| error_response(status_for(control::classify_store_error(&e)), e.to_string()))?
        .len();
    Ok(Json(DatabaseStatus {
        document_count: total,
        embedded_count: embedded,
        pending_embedding_count: pending,
    }))
}
