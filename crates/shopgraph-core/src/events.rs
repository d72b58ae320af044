//! Event routing: behavioral events become typed customer→product edges.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{EdgeKind, Event};

/// Known values of the `event_type` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    View,
    Click,
    AddToCart,
}

impl EventKind {
    /// Dispatch order used by the loader.
    pub const ALL: [EventKind; 3] = [Self::View, Self::Click, Self::AddToCart];

    /// Classify a discriminator value. Matching is exact.
    pub fn from_discriminator(value: &str) -> Option<Self> {
        match value {
            "view" => Some(Self::View),
            "click" => Some(Self::Click),
            "add_to_cart" => Some(Self::AddToCart),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Click => "click",
            Self::AddToCart => "add_to_cart",
        }
    }

    /// Relationship written for this kind of event.
    pub fn edge(&self) -> EdgeKind {
        match self {
            Self::View => EdgeKind::Viewed,
            Self::Click => EdgeKind::Clicked,
            Self::AddToCart => EdgeKind::AddedToCart,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event rows partitioned by discriminator, each class in source order.
#[derive(Debug, Default)]
pub struct RoutedEvents<'a> {
    pub viewed: Vec<&'a Event>,
    pub clicked: Vec<&'a Event>,
    pub added_to_cart: Vec<&'a Event>,
    pub unmapped: Vec<&'a Event>,
}

impl<'a> RoutedEvents<'a> {
    /// Rows routed to `kind`.
    pub fn rows(&self, kind: EventKind) -> &[&'a Event] {
        match kind {
            EventKind::View => &self.viewed,
            EventKind::Click => &self.clicked,
            EventKind::AddToCart => &self.added_to_cart,
        }
    }

    /// Classes in dispatch order with their rows.
    pub fn classes(&self) -> impl Iterator<Item = (EventKind, &[&'a Event])> + '_ {
        EventKind::ALL.into_iter().map(move |kind| (kind, self.rows(kind)))
    }

    pub fn routed_len(&self) -> usize {
        self.viewed.len() + self.clicked.len() + self.added_to_cart.len()
    }
}

/// Partition `events` into the three known classes.
///
/// Rows with an unknown discriminator end up in `unmapped`; the loader
/// skips them.
pub fn route(events: &[Event]) -> RoutedEvents<'_> {
    let mut routed = RoutedEvents::default();
    for event in events {
        match EventKind::from_discriminator(&event.event_type) {
            Some(EventKind::View) => routed.viewed.push(event),
            Some(EventKind::Click) => routed.clicked.push(event),
            Some(EventKind::AddToCart) => routed.added_to_cart.push(event),
            None => routed.unmapped.push(event),
        }
    }
    routed
}
