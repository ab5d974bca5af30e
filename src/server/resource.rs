//! REST handlers shared by every entity type.
//!
//! Each entity gets the same route set, mounted under its plural name:
//! create, list, read, full update, merge-patch, delete and search.

use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use cookbook_core::Entity;
use serde::Deserialize;
use std::sync::Arc;

use super::alerts::Alerts;
use super::error::ApiError;
use crate::db::{EntityId, EntityStore, PageRequest};
use crate::service::EntityService;

pub const MERGE_PATCH_JSON: &str = "application/merge-patch+json";
pub const NDJSON: &str = "application/x-ndjson";

const DEFAULT_PAGE_SIZE: u32 = 20;

type EntityOf<S> = <S as EntityStore>::Entity;
type PatchOf<S> = <<S as EntityStore>::Entity as Entity>::Patch;

pub struct Resource<S: EntityStore> {
    service: Arc<EntityService<S>>,
    alerts: Alerts,
}

impl<S: EntityStore> Clone for Resource<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            alerts: self.alerts.clone(),
        }
    }
}

/// Routes for one entity type, relative to the API prefix.
pub fn routes<S: EntityStore>(service: Arc<EntityService<S>>, alerts: Alerts) -> Router {
    let plural = EntityOf::<S>::PLURAL;

    Router::new()
        .route(
            &format!("/{}", plural),
            get(list::<S>).post(create::<S>),
        )
        .route(
            &format!("/{}/{{id}}", plural),
            get(get_one::<S>)
                .put(update::<S>)
                .patch(partial_update::<S>)
                .delete(delete::<S>),
        )
        .route(&format!("/_search/{}", plural), get(search::<S>))
        .with_state(Resource { service, alerts })
}

#[derive(Debug, Deserialize)]
struct ListParams {
    page: Option<u32>,
    size: Option<u32>,
    eagerload: Option<bool>,
}

impl ListParams {
    fn page_request(&self) -> Option<PageRequest> {
        if self.page.is_none() && self.size.is_none() {
            return None;
        }
        Some(PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_PAGE_SIZE),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
}

fn accepts(headers: &HeaderMap, media_type: &str) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|part| part.trim().starts_with(media_type)))
}

fn content_type_is(headers: &HeaderMap, media_type: &str) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case(media_type))
}

async fn create<S: EntityStore>(
    State(resource): State<Resource<S>>,
    body: Result<Json<EntityOf<S>>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(entity) = body?;
    tracing::debug!("REST request to save {} : {:?}", EntityOf::<S>::NAME, entity);

    let saved = resource.service.create(entity).await?;
    let id = saved.id().map(ToString::to_string).unwrap_or_default();

    let mut headers = resource.alerts.created(EntityOf::<S>::NAME, &id);
    let location = format!("/api/{}/{}", EntityOf::<S>::PLURAL, id);
    if let Ok(value) = HeaderValue::try_from(location) {
        headers.insert(header::LOCATION, value);
    }

    Ok((StatusCode::CREATED, headers, Json(saved)).into_response())
}

async fn update<S: EntityStore>(
    State(resource): State<Resource<S>>,
    Path(id): Path<EntityId<S>>,
    body: Result<Json<EntityOf<S>>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(entity) = body?;
    tracing::debug!(
        "REST request to update {} : {}, {:?}",
        EntityOf::<S>::NAME,
        id,
        entity
    );

    let updated = resource.service.full_update(&id, entity).await?;
    let headers = resource
        .alerts
        .updated(EntityOf::<S>::NAME, &id.to_string());
    Ok((headers, Json(updated)).into_response())
}

async fn partial_update<S: EntityStore>(
    State(resource): State<Resource<S>>,
    Path(id): Path<EntityId<S>>,
    request_headers: HeaderMap,
    body: Result<Json<PatchOf<S>>, JsonRejection>,
) -> Result<Response, ApiError> {
    if !content_type_is(&request_headers, MERGE_PATCH_JSON) {
        return Err(ApiError::UnsupportedMediaType);
    }
    let Json(patch) = body?;
    tracing::debug!(
        "REST request to partial update {} : {}, {:?}",
        EntityOf::<S>::NAME,
        id,
        patch
    );

    let updated = resource.service.partial_update(&id, patch).await?;
    let headers = resource
        .alerts
        .updated(EntityOf::<S>::NAME, &id.to_string());
    Ok((headers, Json(updated)).into_response())
}

/// Lists every entity, or one page of them when `page`/`size` are given.
///
/// `Accept: application/x-ndjson` streams one record per line without
/// relations; otherwise `eagerload` (default on) selects the eager read.
async fn list<S: EntityStore>(
    State(resource): State<Resource<S>>,
    params: Result<Query<ListParams>, QueryRejection>,
    request_headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let page = params.page_request();

    if accepts(&request_headers, NDJSON) {
        tracing::debug!("REST request to get all {} as a stream", EntityOf::<S>::PLURAL);
        let entities = resource.service.find_all(page, false).await?;
        let lines = futures::stream::iter(entities.into_iter().map(|entity| {
            serde_json::to_vec(&entity).map(|mut line| {
                line.push(b'\n');
                line
            })
        }));
        return Ok(([(header::CONTENT_TYPE, NDJSON)], Body::from_stream(lines)).into_response());
    }

    tracing::debug!("REST request to get all {}", EntityOf::<S>::PLURAL);
    let eager = params.eagerload.unwrap_or(true);
    let entities = resource.service.find_all(page, eager).await?;

    let mut headers = HeaderMap::new();
    if page.is_some() {
        let total = resource.service.count().await?;
        headers.insert("x-total-count", HeaderValue::from(total));
    }
    Ok((headers, Json(entities)).into_response())
}

async fn get_one<S: EntityStore>(
    State(resource): State<Resource<S>>,
    Path(id): Path<EntityId<S>>,
) -> Result<Json<EntityOf<S>>, ApiError> {
    tracing::debug!("REST request to get {} : {}", EntityOf::<S>::NAME, id);

    resource
        .service
        .find_by_id(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(EntityOf::<S>::NAME))
}

async fn delete<S: EntityStore>(
    State(resource): State<Resource<S>>,
    Path(id): Path<EntityId<S>>,
) -> Result<Response, ApiError> {
    tracing::debug!("REST request to delete {} : {}", EntityOf::<S>::NAME, id);

    resource.service.delete(&id).await?;
    let headers = resource
        .alerts
        .deleted(EntityOf::<S>::NAME, &id.to_string());
    Ok((StatusCode::NO_CONTENT, headers).into_response())
}

async fn search<S: EntityStore>(
    State(resource): State<Resource<S>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<EntityOf<S>>>, ApiError> {
    let Query(params) = params?;
    tracing::debug!(
        "REST request to search {} for query {}",
        EntityOf::<S>::PLURAL,
        params.query
    );

    Ok(Json(resource.service.search(&params.query).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(name: header::HeaderName, value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_accepts_ndjson_among_others() {
        let h = headers(header::ACCEPT, "application/json, application/x-ndjson");
        assert!(accepts(&h, NDJSON));
        assert!(!accepts(&HeaderMap::new(), NDJSON));
    }

    #[test]
    fn test_content_type_ignores_parameters() {
        let h = headers(
            header::CONTENT_TYPE,
            "application/merge-patch+json; charset=utf-8",
        );
        assert!(content_type_is(&h, MERGE_PATCH_JSON));

        let h = headers(header::CONTENT_TYPE, "application/json");
        assert!(!content_type_is(&h, MERGE_PATCH_JSON));
    }

    #[test]
    fn test_page_request_defaults() {
        let params = ListParams {
            page: Some(2),
            size: None,
            eagerload: None,
        };
        assert_eq!(
            params.page_request(),
            Some(PageRequest::new(2, DEFAULT_PAGE_SIZE))
        );

        let params = ListParams {
            page: None,
            size: None,
            eagerload: Some(false),
        };
        assert_eq!(params.page_request(), None);
    }
}
