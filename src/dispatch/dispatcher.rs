// src/dispatch/dispatcher.rs

use super::record::ObisRecord;
use crate::common::{obis::ObisPattern, types::ValueNode};
use alloc::{boxed::Box, vec::Vec};
use core::fmt;

/// Message body tag of an `SML_GetList.Res`.
pub const GET_LIST_RESPONSE: u64 = 0x0701;
/// Position of the server id inside a GetList response.
const GET_LIST_SERVER_ID: usize = 1;

/// Receives the records a subscription matched.
///
/// Any `FnMut(&ObisRecord)` closure is a listener.
pub trait SmlListener {
    fn on_record(&mut self, record: &ObisRecord);
}

impl<F> SmlListener for F
where
    F: FnMut(&ObisRecord),
{
    fn on_record(&mut self, record: &ObisRecord) {
        self(record)
    }
}

/// An OBIS pattern, an optional meter filter and the listener to notify.
pub struct Subscription {
    pattern: ObisPattern,
    server_id: Option<Vec<u8>>,
    listener: Box<dyn SmlListener>,
}

impl Subscription {
    pub fn new<L>(pattern: ObisPattern, listener: L) -> Self
    where
        L: SmlListener + 'static,
    {
        Subscription { pattern, server_id: None, listener: Box::new(listener) }
    }

    /// Only accept records from the meter with this server id.
    pub fn with_server_id(mut self, server_id: &[u8]) -> Self {
        self.server_id = Some(server_id.to_vec());
        self
    }

    pub fn pattern(&self) -> &ObisPattern {
        &self.pattern
    }

    pub fn server_id(&self) -> Option<&[u8]> {
        self.server_id.as_deref()
    }

    pub fn accepts(&self, record: &ObisRecord) -> bool {
        self.pattern.matches(&record.code)
            && self.server_id.as_deref().map_or(true, |id| id == record.server_id.as_slice())
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("pattern", &self.pattern)
            .field("server_id", &self.server_id)
            .finish_non_exhaustive()
    }
}

/// Outcome of dispatching one frame's messages.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DispatchCounts {
    /// Records delivered to at least one listener.
    pub dispatched: usize,
    /// Records no subscription asked for.
    pub unmatched: usize,
}

/// Routes value-list entries to the subscriptions whose pattern they match.
#[derive(Debug, Default)]
pub struct ObisDispatcher {
    subscriptions: Vec<Subscription>,
}

impl ObisDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscription. Listeners fire in the order they were added.
    pub fn subscribe(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Extracts every record from `messages` and hands it to the matching listeners.
    pub fn dispatch(&mut self, messages: &[ValueNode]) -> DispatchCounts {
        let mut counts = DispatchCounts::default();
        for record in extract_records(messages) {
            if self.dispatch_record(&record) {
                counts.dispatched += 1;
            } else {
                counts.unmatched += 1;
            }
        }
        counts
    }

    /// Notifies every subscription accepting `record`, in registration order.
    ///
    /// Returns `false` if none did.
    pub fn dispatch_record(&mut self, record: &ObisRecord) -> bool {
        let mut matched = false;
        for subscription in self.subscriptions.iter_mut().filter(|s| s.accepts(record)) {
            subscription.listener.on_record(record);
            matched = true;
        }
        if !matched {
            log::debug!("no subscription for {}", record.code);
        }
        matched
    }
}

/// Walks the message trees and collects every value-list entry, in document order.
///
/// Entries are recognised by shape wherever they appear. Entries below a
/// GetList response carry that response's server id.
pub fn extract_records(messages: &[ValueNode]) -> Vec<ObisRecord> {
    let mut records = Vec::new();
    let mut pending: Vec<(&ValueNode, &[u8])> = messages.iter().rev().map(|m| (m, &[][..])).collect();

    while let Some((node, server_id)) = pending.pop() {
        let Some(children) = node.as_list() else {
            continue;
        };
        if let Some(record) = ObisRecord::from_entry(server_id, children) {
            records.push(record);
            continue;
        }
        let server_id = get_list_server_id(children).unwrap_or(server_id);
        pending.extend(children.iter().rev().map(|child| (child, server_id)));
    }
    records
}

/// Server id of a `[GetListResponse tag, response]` message body.
fn get_list_server_id(body: &[ValueNode]) -> Option<&[u8]> {
    match body {
        [ValueNode::Unsigned(GET_LIST_RESPONSE), ValueNode::List(response)] => {
            response.get(GET_LIST_SERVER_ID)?.as_bytes()
        }
        _ => None,
    }
}
