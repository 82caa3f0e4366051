//! Recipe endpoints.
//!
//! # Responsibilities
//! - CRUD routes over the recipe store
//! - Image serving with validator-token (ETag) conditional GET
//! - Wire validator-cache eviction into the store's mutation hooks
//!
//! # Design Decisions
//! - Construction subscribes the cache eviction hook, so the wiring exists
//!   before the first request is served
//! - Mutating routes require the credential gate; reads are public
//! - Record selection uses an `id` query parameter; paths stay static

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use crate::cache::ValidatorCache;
use crate::http::error::AppError;
use crate::routing::descriptor::RouteDescriptor;
use crate::routing::registry::RouteSource;
use crate::store::{RecipeDraft, RecipeStore};

/// Largest accepted request body (recipes may embed images).
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Recipe routes plus the image validator cache they maintain.
pub struct RecipeApi {
    store: Arc<RecipeStore>,
    etags: Arc<ValidatorCache<i64>>,
}

impl RecipeApi {
    /// Build the component and subscribe cache eviction to the store's
    /// post-commit hooks.
    pub fn new(store: Arc<RecipeStore>, etags: Arc<ValidatorCache<i64>>) -> Self {
        let cache = etags.clone();
        store.hooks().subscribe(Box::new(move |id, _mutation| {
            cache.invalidate(&id);
            Ok(())
        }));

        Self { store, etags }
    }

    fn list_route(&self) -> RouteDescriptor {
        let store = self.store.clone();
        RouteDescriptor::new("recipe-list", "/recipes")
            .methods([Method::GET])
            .handler_fn(move |_request| {
                let store = store.clone();
                async move { Json(store.list()).into_response() }
            })
    }

    fn show_route(&self) -> RouteDescriptor {
        let store = self.store.clone();
        RouteDescriptor::new("recipe-show", "/recipe")
            .methods([Method::GET])
            .fallible_fn(move |request| {
                let store = store.clone();
                async move {
                    let id = id_param(&request)?;
                    let recipe = store.get(id).ok_or(AppError::NotFound)?;
                    Ok(Json(recipe).into_response())
                }
            })
    }

    fn image_route(&self) -> RouteDescriptor {
        let store = self.store.clone();
        let etags = self.etags.clone();
        RouteDescriptor::new("recipe-image", "/recipe/image")
            .methods([Method::GET])
            .fallible_fn(move |request| {
                let store = store.clone();
                let etags = etags.clone();
                async move {
                    let id = id_param(&request)?;
                    // The token is derived from a read taken while the cache
                    // entry is held. Deriving from a record fetched earlier
                    // could re-cache a token an interleaved write already
                    // invalidated.
                    let mut derived = None;
                    let token = etags.get_or_try_compute(id, || {
                        let recipe = store.get(id).ok_or(AppError::NotFound)?;
                        let token = recipe.etag();
                        derived = Some(recipe);
                        Ok::<_, AppError>(token)
                    })?;
                    let recipe = match derived {
                        Some(recipe) => recipe,
                        None => store.get(id).ok_or(AppError::NotFound)?,
                    };
                    let image = recipe.image.ok_or(AppError::NotFound)?;

                    let presented = request
                        .headers()
                        .get(header::IF_NONE_MATCH)
                        .and_then(|value| value.to_str().ok());
                    if presented == Some(token.as_str()) {
                        return Ok((
                            StatusCode::NOT_MODIFIED,
                            [(header::ETAG, token)],
                        )
                            .into_response());
                    }

                    Ok((
                        [
                            (header::ETAG, token),
                            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                        ],
                        image,
                    )
                        .into_response())
                }
            })
    }

    fn create_route(&self) -> RouteDescriptor {
        let store = self.store.clone();
        RouteDescriptor::new("recipe-create", "/recipe")
            .methods([Method::POST])
            .requires_auth()
            .fallible_fn(move |request| {
                let store = store.clone();
                async move {
                    let draft = read_draft(request).await?;
                    let recipe = store.insert(draft);
                    Ok((StatusCode::CREATED, Json(recipe)).into_response())
                }
            })
    }

    fn update_route(&self) -> RouteDescriptor {
        let store = self.store.clone();
        RouteDescriptor::new("recipe-update", "/recipe")
            .methods([Method::PUT])
            .requires_auth()
            .fallible_fn(move |request| {
                let store = store.clone();
                async move {
                    let id = id_param(&request)?;
                    let draft = read_draft(request).await?;
                    let recipe = store.update(id, draft)?;
                    Ok(Json(recipe).into_response())
                }
            })
    }

    fn delete_route(&self) -> RouteDescriptor {
        let store = self.store.clone();
        RouteDescriptor::new("recipe-delete", "/recipe")
            .methods([Method::DELETE])
            .requires_auth()
            .fallible_fn(move |request| {
                let store = store.clone();
                async move {
                    let id = id_param(&request)?;
                    store.delete(id)?;
                    Ok(StatusCode::NO_CONTENT.into_response())
                }
            })
    }
}

impl RouteSource for RecipeApi {
    fn routes(&self) -> Vec<RouteDescriptor> {
        vec![
            self.list_route(),
            self.show_route(),
            self.image_route(),
            self.create_route(),
            self.update_route(),
            self.delete_route(),
        ]
    }
}

fn id_param(request: &Request<Body>) -> Result<i64, AppError> {
    request
        .uri()
        .query()
        .unwrap_or_default()
        .split('&')
        .find_map(|pair| pair.strip_prefix("id="))
        .ok_or_else(|| AppError::BadRequest("missing id parameter".to_string()))?
        .parse()
        .map_err(|_| AppError::BadRequest("id must be an integer".to_string()))
}

async fn read_draft(request: Request<Body>) -> Result<RecipeDraft, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|_| AppError::BadRequest("unreadable or oversized body".to_string()))?;
    serde_json::from_slice(&bytes)
        .map_err(|error| AppError::BadRequest(format!("invalid recipe payload: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_id_param_parsing() {
        assert_eq!(id_param(&request("/recipe?id=42")).unwrap(), 42);
        assert_eq!(id_param(&request("/recipe?sort=asc&id=7")).unwrap(), 7);
        assert!(id_param(&request("/recipe")).is_err());
        assert!(id_param(&request("/recipe?id=soup")).is_err());
    }

    #[test]
    fn test_construction_wires_cache_eviction() {
        let store = Arc::new(RecipeStore::new());
        let etags = Arc::new(ValidatorCache::new());
        let _api = RecipeApi::new(store.clone(), etags.clone());

        let recipe = store.insert(RecipeDraft {
            title: "soup".to_string(),
            body: "stir".to_string(),
            image: None,
        });
        let token = etags.get_or_compute(recipe.id, || recipe.etag());
        assert_eq!(token, "\"1-1\"");

        store
            .update(
                recipe.id,
                RecipeDraft {
                    title: "stew".to_string(),
                    body: "stir more".to_string(),
                    image: None,
                },
            )
            .unwrap();

        // The update evicted the cached token; the next read derives fresh.
        assert!(etags.is_empty());
        let updated = store.get(recipe.id).unwrap();
        let token = etags.get_or_compute(recipe.id, || updated.etag());
        assert_eq!(token, "\"1-2\"");
    }

    #[tokio::test]
    async fn test_image_token_derives_from_committed_state_not_a_stale_read() {
        let store = Arc::new(RecipeStore::new());
        let etags = Arc::new(ValidatorCache::new());
        let api = RecipeApi::new(store.clone(), etags.clone());

        let recipe = store.insert(RecipeDraft {
            title: "soup".to_string(),
            body: "stir".to_string(),
            image: Some(vec![1, 2, 3]),
        });
        // A reader holds a pre-update copy of the record while an update
        // commits and fires its eviction. The first image read afterwards
        // must cache and serve the committed token, not the copy's.
        let stale = store.get(recipe.id).unwrap();
        store
            .update(
                recipe.id,
                RecipeDraft {
                    title: "stew".to_string(),
                    body: "stir more".to_string(),
                    image: Some(vec![9]),
                },
            )
            .unwrap();

        let handler = api.image_route().fallible_fn.unwrap();
        let response = handler(request(&format!("/recipe/image?id={}", recipe.id)))
            .await
            .unwrap();

        assert_eq!(response.headers()[header::ETAG], "\"1-2\"");
        assert_ne!(stale.etag(), "\"1-2\"");
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(body.to_vec(), vec![9]);

        // The committed token is what got cached.
        assert_eq!(etags.get_or_compute(recipe.id, || "\"missed\"".to_string()), "\"1-2\"");
    }

    #[test]
    fn test_declares_expected_routes() {
        let api = RecipeApi::new(Arc::new(RecipeStore::new()), Arc::new(ValidatorCache::new()));
        let routes = api.routes();

        let names: Vec<&str> = routes.iter().map(|route| route.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "recipe-list",
                "recipe-show",
                "recipe-image",
                "recipe-create",
                "recipe-update",
                "recipe-delete",
            ]
        );

        for route in &routes {
            let mutating = route
                .methods
                .iter()
                .any(|method| matches!(*method, Method::POST | Method::PUT | Method::DELETE));
            assert_eq!(route.requires_auth, mutating, "route {}", route.name);
        }
    }
}
