use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tracing::{debug, warn};

use super::request::ListTicket;
use super::state::{SliceSnapshot, SliceState};
use super::{DeleteRoute, Filter, FilterSet, Operation, Page, Resource};
use crate::api::{ApiClient, ApiError};
use crate::error::{FetchError, MutationError};

/// Async handle to one resource slice. Clones share state.
///
/// The state lock is only taken for synchronous reducer steps and is never
/// held while a request is in flight.
pub struct Slice<R: Resource> {
    api: ApiClient,
    state: Arc<Mutex<SliceState<R>>>,
}

impl<R: Resource> Clone for Slice<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<R: Resource> fmt::Debug for Slice<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slice")
            .field("resource", &R::PLURAL)
            .finish_non_exhaustive()
    }
}

impl<R: Resource> Slice<R> {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(SliceState::default())),
        }
    }

    pub(crate) fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Runs a synchronous reducer step under the state lock.
    pub(crate) fn with_state<T>(&self, f: impl FnOnce(&mut SliceState<R>) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn snapshot(&self) -> SliceSnapshot<R::Entity, R::Extras> {
        self.with_state(|s| s.snapshot())
    }

    pub fn items(&self) -> Vec<R::Entity> {
        self.with_state(|s| s.list.items.clone())
    }

    pub fn current(&self) -> Option<R::Entity> {
        self.with_state(|s| s.edit.current.clone())
    }

    pub fn extras(&self) -> R::Extras {
        self.with_state(|s| s.extras.clone())
    }

    // ---- async operations ----

    /// Fetches `page` under `filters`, which become the current selection.
    ///
    /// The result is returned to the caller either way, but only applied to
    /// the slice if no newer list request started in the meantime.
    ///
    /// # Errors
    /// Returns an error if the request fails or the body is not a page.
    pub async fn list(&self, page: u32, filters: FilterSet) -> Result<Page<R::Entity>, FetchError> {
        let ticket = self.with_state(|s| {
            s.filters = filters;
            s.begin_list(page)
        });
        self.run_list(ticket).await
    }

    /// Re-fetches the current page under the current filters.
    ///
    /// # Errors
    /// Returns an error if the request fails or the body is not a page.
    pub async fn refresh(&self) -> Result<Page<R::Entity>, FetchError> {
        let ticket = self.with_state(|s| {
            let page = s.list.current_page;
            s.begin_list(page)
        });
        self.run_list(ticket).await
    }

    async fn run_list(&self, ticket: ListTicket) -> Result<Page<R::Entity>, FetchError> {
        debug!(resource = R::PLURAL, query = ?ticket.query.pairs(), "list requested");
        let result = self
            .api
            .get_json::<Value>(R::PATH, ticket.query.pairs())
            .await
            .and_then(|body| Page::from_body(body, R::LIST_KEY))
            .map_err(|e| FetchError::from_api(e, &R::fallback(Operation::List)));
        self.with_state(|s| s.finish_list(&ticket, result.clone()));
        result
    }

    /// Fetches one entity into the edit state.
    ///
    /// # Errors
    /// Returns an error if the request fails or the body has no entity.
    pub async fn get_one(&self, id: &R::Id) -> Result<R::Entity, FetchError> {
        let request = self.with_state(SliceState::begin_detail);
        let result = self
            .api
            .get_json::<Value>(&R::detail_path(id), &[])
            .await
            .and_then(|body| {
                let inner = R::unwrap_detail(body).ok_or_else(|| {
                    ApiError::decode(format!("No {} in response", R::SINGULAR))
                })?;
                serde_json::from_value::<R::Entity>(inner).map_err(|e| {
                    warn!(resource = R::PLURAL, "detail does not match schema: {e}");
                    ApiError::decode(format!("Unexpected {} payload: {e}", R::SINGULAR))
                })
            })
            .map_err(|e| FetchError::from_api(e, &R::fallback(Operation::Detail)));
        self.with_state(|s| s.finish_detail(request, result.clone()));
        result
    }

    /// Creates an entity. It is prepended to the list when page 1 is showing.
    ///
    /// # Errors
    /// Returns an error if the request fails or the body is not an entity.
    pub async fn create(&self, draft: &R::Draft) -> Result<R::Entity, MutationError> {
        self.with_state(SliceState::begin_mutation);
        let result = self
            .api
            .post_json::<_, Value>(R::PATH, draft)
            .await
            .and_then(|body| {
                serde_json::from_value::<R::Entity>(body).map_err(|e| {
                    warn!(resource = R::PLURAL, "created entity does not match schema: {e}");
                    ApiError::decode(format!("Unexpected {} payload: {e}", R::SINGULAR))
                })
            });
        match result {
            Ok(entity) => {
                debug!(resource = R::PLURAL, id = %R::id(&entity), "created");
                self.with_state(|s| s.created(entity.clone()));
                Ok(entity)
            }
            Err(e) => Err(self.mutation_failed(e, Operation::Create)),
        }
    }

    /// Updates an entity, merging `patch` into the list entry and the edit
    /// target when either refers to `id`.
    ///
    /// Returns the merged entity when one was in view.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn update(
        &self,
        id: &R::Id,
        patch: &R::Patch,
    ) -> Result<Option<R::Entity>, MutationError> {
        self.with_state(SliceState::begin_mutation);
        match self.api.put_json(&R::detail_path(id), Some(patch)).await {
            Ok(_) => {
                debug!(resource = R::PLURAL, %id, "updated");
                Ok(self.with_state(|s| s.updated(id, patch)))
            }
            Err(e) => Err(self.mutation_failed(e, Operation::Update)),
        }
    }

    /// Deletes an entity and drops it from local state.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn delete(&self, id: &R::Id) -> Result<(), MutationError> {
        self.with_state(SliceState::begin_mutation);
        let result = match R::delete_route(id) {
            DeleteRoute::Delete(path) => self.api.delete(&path).await,
            DeleteRoute::Put(path) => self.api.put_json::<Value>(&path, None).await,
        };
        match result {
            Ok(_) => {
                debug!(resource = R::PLURAL, %id, "deleted");
                self.with_state(|s| s.deleted(id));
                Ok(())
            }
            Err(e) => Err(self.mutation_failed(e, Operation::Delete)),
        }
    }

    fn mutation_failed(&self, source: ApiError, op: Operation) -> MutationError {
        let err = MutationError::from_api(source, &R::fallback(op));
        warn!(resource = R::PLURAL, ?op, "mutation failed: {}", err.source);
        self.with_state(|s| s.mutation_failed(err.message.clone()));
        err
    }

    // ---- local reducers ----

    pub fn set_page(&self, page: u32) {
        self.with_state(|s| s.set_page(page));
    }

    pub fn set_filter(&self, filter: Filter) {
        self.with_state(|s| s.set_filter(filter));
    }

    pub fn reset_filters(&self) {
        self.with_state(SliceState::reset_filters);
    }

    pub fn clear_error(&self) {
        self.with_state(SliceState::clear_error);
    }

    pub fn clear_current(&self) {
        self.with_state(SliceState::clear_current);
    }
}
