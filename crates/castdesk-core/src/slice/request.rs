//! Request identity for last-initiated-wins ordering.
//!
//! Every logical request (a list fetch, a detail fetch, a login) owns a
//! [`RequestState`]. Starting a request replaces the active id; a result is
//! applied only if its id is still the active one. List requests also carry
//! the selection they were issued for, see [`ListTicket`].

use super::FilterSet;
use crate::api::ListQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

/// Monotonic id source.
#[derive(Debug, Default)]
pub struct RequestSeq {
    next: u64,
}

impl RequestSeq {
    pub fn next_id(&mut self) -> RequestId {
        let id = RequestId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Lifecycle of one logical request.
#[derive(Debug, Default, Clone)]
pub struct RequestState {
    pub active: Option<RequestId>,
}

impl RequestState {
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn on_started(&mut self, id: RequestId) {
        self.active = Some(id);
    }

    /// Marks `id` finished. Returns false if a newer request superseded it.
    pub fn finish_if_active(&mut self, id: RequestId) -> bool {
        let ok = self.active == Some(id);
        if ok {
            self.active = None;
        }
        ok
    }

    /// Drops the active request so its result will be discarded.
    pub fn clear(&mut self) {
        self.active = None;
    }
}

/// A started list request and the selection it was issued under.
#[derive(Debug, Clone)]
pub struct ListTicket {
    pub id: RequestId,
    pub page: u32,
    pub filters: FilterSet,
    pub query: ListQuery,
}

impl ListTicket {
    /// True if the ticket was issued for `page` under `filters`.
    pub fn matches(&self, page: u32, filters: &FilterSet) -> bool {
        self.page == page && self.filters == *filters
    }
}
