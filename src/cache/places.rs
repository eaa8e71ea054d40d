//! In-memory place collection cache with single-flight fetches.
//!
//! One enriched collection is kept per cache instance, alongside at
//! most one in-flight collection request that every concurrent caller
//! joins. Single-item fetches merge into the collection by id instead
//! of invalidating it.

use std::sync::{Arc, Weak};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use reqwest::{Method, StatusCode};
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{ApiPlace, Place};

use super::metadata;

/// Collection endpoint path.
const PLACES_PATH: &str = "/api/v1/places/";

type FlightResult = Result<Vec<Place>, ApiError>;
type FlightFuture = Shared<BoxFuture<'static, FlightResult>>;

struct CacheState {
    places: Option<Vec<Place>>,
    /// The live collection fetch, tagged with its flight id so a forced
    /// refresh that supersedes it cannot have its marker cleared by the
    /// superseded flight's completion.
    inflight: Option<(u64, FlightFuture)>,
    next_flight_id: u64,
}

/// Cache of enriched places plus the in-flight marker. All access goes
/// through the internal mutex; the lock is never held across an await,
/// which keeps the merge step atomic from a caller's perspective.
#[derive(Clone)]
pub struct PlaceCache {
    client: ApiClient,
    state: Arc<Mutex<CacheState>>,
}

impl PlaceCache {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(CacheState {
                places: None,
                inflight: None,
                next_flight_id: 0,
            })),
        }
    }

    /// Return the cached collection, join a fetch already in flight, or
    /// issue a new one. Concurrent callers of one flight all observe the
    /// same collection or the same error. A failed flight leaves any
    /// stale cache untouched.
    pub async fn fetch_places(&self, force: bool) -> Result<Vec<Place>, ApiError> {
        let flight = {
            let mut state = self.state.lock();

            if !force {
                if let Some(ref places) = state.places {
                    debug!(count = places.len(), "Serving places from cache");
                    return Ok(places.clone());
                }
                if let Some((_, ref flight)) = state.inflight {
                    debug!("Joining in-flight places fetch");
                    flight.clone()
                } else {
                    Self::begin_flight(&self.client, &self.state, &mut state)
                }
            } else {
                Self::begin_flight(&self.client, &self.state, &mut state)
            }
        };

        flight.await
    }

    fn begin_flight(
        client: &ApiClient,
        shared_state: &Arc<Mutex<CacheState>>,
        state: &mut CacheState,
    ) -> FlightFuture {
        let id = state.next_flight_id;
        state.next_flight_id += 1;
        let flight = Self::collection_flight(client.clone(), Arc::downgrade(shared_state), id);
        state.inflight = Some((id, flight.clone()));
        flight
    }

    /// Build the shared future for one collection fetch. It writes its
    /// own result back through a weak handle, so a cache dropped while a
    /// flight is airborne just loses the write.
    fn collection_flight(
        client: ApiClient,
        state: Weak<Mutex<CacheState>>,
        id: u64,
    ) -> FlightFuture {
        async move {
            let result: FlightResult = client
                .get_json::<Vec<ApiPlace>>(PLACES_PATH)
                .await
                .map(|raw| raw.into_iter().map(metadata::enrich).collect());

            if let Some(state) = state.upgrade() {
                let mut state = state.lock();
                match &result {
                    Ok(places) => {
                        debug!(count = places.len(), "Places collection cached");
                        state.places = Some(places.clone());
                    }
                    Err(err) => warn!(error = %err, "Places fetch failed"),
                }
                if matches!(state.inflight, Some((flight_id, _)) if flight_id == id) {
                    state.inflight = None;
                }
            }

            result
        }
        .boxed()
        .shared()
    }

    /// Fetch one place. An empty id and a 404 both yield `None`; an
    /// unforced call is served from the cached collection when the id is
    /// already there. A fresh record merges into the collection,
    /// replacing any entry with the same id and preserving the rest.
    pub async fn fetch_place_by_id(&self, id: &str, force: bool) -> Result<Option<Place>, ApiError> {
        if id.is_empty() {
            return Ok(None);
        }

        if !force {
            let state = self.state.lock();
            if let Some(ref places) = state.places {
                if let Some(place) = places.iter().find(|p| p.id == id) {
                    debug!(id, "Serving place from cache");
                    return Ok(Some(place.clone()));
                }
            }
        }

        let request = self
            .client
            .request(Method::GET, &format!("{}{}", PLACES_PATH, id));
        let response = self.client.send_with_retry(&request).await?;

        if response.status == StatusCode::NOT_FOUND {
            debug!(id, "Place not found");
            return Ok(None);
        }
        if !response.is_success() {
            return Err(ApiError::from_status(response.status, &response.text()));
        }

        let enriched = metadata::enrich(response.json::<ApiPlace>()?);

        let mut state = self.state.lock();
        let mut places = state.places.take().unwrap_or_default();
        places.retain(|p| p.id != enriched.id);
        places.push(enriched.clone());
        state.places = Some(places);

        Ok(Some(enriched))
    }

    /// Drop the cached collection and any in-flight marker together.
    /// Used on logout and for a full manual refresh.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.places = None;
        state.inflight = None;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{net_err, status_response, ScriptedTransport};
    use crate::config::Config;
    use std::time::Duration;

    const COLLECTION: &str = r#"[
        {"id": "1", "title": "Villa 1", "price": 200.0},
        {"id": "2", "title": "Villa 2", "price": 300.0},
        {"id": "3", "title": "Villa 3", "price": 400.0}
    ]"#;

    fn cache_with(transport: Arc<ScriptedTransport>) -> PlaceCache {
        PlaceCache::new(ApiClient::with_transport(transport, &Config::default()))
    }

    #[tokio::test]
    async fn test_collection_is_cached_after_first_fetch() {
        let transport = Arc::new(ScriptedTransport::new(vec![status_response(
            200, COLLECTION,
        )]));
        let cache = cache_with(transport.clone());

        let first = cache.fetch_places(false).await.unwrap();
        let second = cache.fetch_places(false).await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_flight() {
        let transport = Arc::new(
            ScriptedTransport::new(vec![status_response(200, COLLECTION)])
                .with_delay(Duration::from_millis(50)),
        );
        let cache = cache_with(transport.clone());

        let (a, b, c) = tokio::join!(
            cache.fetch_places(false),
            cache.fetch_places(false),
            cache.fetch_places(false),
        );

        let a = a.unwrap();
        assert_eq!(a, b.unwrap());
        assert_eq!(a, c.unwrap());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_rejection() {
        // Three transport attempts are the retry policy of a single
        // flight, not one per caller.
        let transport = Arc::new(
            ScriptedTransport::new(vec![
                net_err("refused"),
                net_err("refused"),
                net_err("refused"),
            ])
            .with_delay(Duration::from_millis(10)),
        );
        let cache = cache_with(transport.clone());

        let (a, b) = tokio::join!(cache.fetch_places(false), cache.fetch_places(false));

        assert_eq!(a, Err(ApiError::Network("refused".to_string())));
        assert_eq!(a, b);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_forced_refresh_replaces_cache() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            status_response(200, r#"[{"id": "1", "title": "Villa 1", "price": 200.0}]"#),
            status_response(200, r#"[{"id": "1", "title": "Villa 1", "price": 250.0}]"#),
        ]));
        let cache = cache_with(transport.clone());

        let first = cache.fetch_places(false).await.unwrap();
        assert_eq!(first[0].price, 200.0);

        let refreshed = cache.fetch_places(true).await.unwrap();
        assert_eq!(refreshed[0].price, 250.0);

        // The refreshed collection is what unforced callers now see
        let cached = cache.fetch_places(false).await.unwrap();
        assert_eq!(cached[0].price, 250.0);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_cache() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            status_response(200, COLLECTION),
            status_response(400, "bad request"),
        ]));
        let cache = cache_with(transport.clone());

        cache.fetch_places(false).await.unwrap();
        let refresh = cache.fetch_places(true).await;
        assert!(refresh.is_err());

        // Stale collection still served, no new request issued
        let cached = cache.fetch_places(false).await.unwrap();
        assert_eq!(cached.len(), 3);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_by_id_hits_cache_without_network() {
        let transport = Arc::new(ScriptedTransport::new(vec![status_response(
            200, COLLECTION,
        )]));
        let cache = cache_with(transport.clone());

        cache.fetch_places(false).await.unwrap();
        let place = cache.fetch_place_by_id("2", false).await.unwrap().unwrap();

        assert_eq!(place.title.as_deref(), Some("Villa 2"));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_by_id_empty_id_is_none() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let cache = cache_with(transport.clone());

        assert_eq!(cache.fetch_place_by_id("", false).await.unwrap(), None);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_by_id_maps_404_to_none() {
        let transport = Arc::new(ScriptedTransport::new(vec![status_response(
            404,
            "not found",
        )]));
        let cache = cache_with(transport);

        assert_eq!(cache.fetch_place_by_id("999", false).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fetch_by_id_surfaces_other_failures() {
        let transport = Arc::new(ScriptedTransport::new(vec![status_response(
            403,
            "forbidden",
        )]));
        let cache = cache_with(transport);

        let result = cache.fetch_place_by_id("1", false).await;
        assert_eq!(
            result,
            Err(ApiError::RequestFailed {
                status: 403,
                message: "forbidden".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_single_place_merge_replaces_by_id_and_preserves_others() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            status_response(200, COLLECTION),
            status_response(200, r#"{"id": "2", "title": "Villa 2", "price": 999.0}"#),
        ]));
        let cache = cache_with(transport);

        cache.fetch_places(false).await.unwrap();
        let updated = cache.fetch_place_by_id("2", true).await.unwrap().unwrap();
        assert_eq!(updated.price, 999.0);

        let collection = cache.fetch_places(false).await.unwrap();
        assert_eq!(collection.len(), 3);
        let by_id = |id: &str| collection.iter().find(|p| p.id == id).unwrap();
        assert_eq!(by_id("2").price, 999.0);
        assert_eq!(by_id("1").price, 200.0);
        assert_eq!(by_id("3").price, 400.0);
    }

    #[tokio::test]
    async fn test_fetch_by_id_seeds_empty_cache() {
        let transport = Arc::new(ScriptedTransport::new(vec![status_response(
            200,
            r#"{"id": "5", "title": "Villa 5", "price": 150.0}"#,
        )]));
        let cache = cache_with(transport.clone());

        cache.fetch_place_by_id("5", false).await.unwrap().unwrap();

        // Collection now exists and serves the merged entry
        let again = cache.fetch_place_by_id("5", false).await.unwrap().unwrap();
        assert_eq!(again.price, 150.0);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_clear_forces_next_fetch_to_network() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            status_response(200, COLLECTION),
            status_response(200, COLLECTION),
        ]));
        let cache = cache_with(transport.clone());

        cache.fetch_places(false).await.unwrap();
        cache.clear();
        cache.fetch_places(false).await.unwrap();

        assert_eq!(transport.calls(), 2);
    }
}
