//! Source rows and graph vocabulary.
//!
//! Each source table maps to one row struct. Four of them become graph
//! nodes; order items and events only ever materialize as edges.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A row of the `categories` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: Option<String>,
}

/// A row of the `products` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<i64>,
}

/// A row of the `customers` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: Option<String>,
    pub join_date: Option<NaiveDate>,
}

/// A row of the `orders` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: Option<i64>,
    pub ts: Option<NaiveDateTime>,
}

/// A row of the `order_items` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: Option<i64>,
}

/// A row of the `events` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub customer_id: i64,
    pub product_id: i64,
    pub event_type: String,
    pub ts: Option<NaiveDateTime>,
}

/// The six source entities, in graph load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Category,
    Product,
    Customer,
    Order,
    OrderItem,
    Event,
}

impl EntityKind {
    /// Load order: every kind only references nodes created by an earlier one.
    pub const LOAD_ORDER: [EntityKind; 6] = [
        Self::Category,
        Self::Product,
        Self::Customer,
        Self::Order,
        Self::OrderItem,
        Self::Event,
    ];

    /// Order in which source tables are read.
    pub const EXTRACT_ORDER: [EntityKind; 6] = [
        Self::Customer,
        Self::Category,
        Self::Product,
        Self::Order,
        Self::OrderItem,
        Self::Event,
    ];

    /// Source table name.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Category => "categories",
            Self::Product => "products",
            Self::Customer => "customers",
            Self::Order => "orders",
            Self::OrderItem => "order_items",
            Self::Event => "events",
        }
    }

    /// Node label, for kinds that have node identity.
    pub fn node_label(&self) -> Option<NodeLabel> {
        match self {
            Self::Category => Some(NodeLabel::Category),
            Self::Product => Some(NodeLabel::Product),
            Self::Customer => Some(NodeLabel::Customer),
            Self::Order => Some(NodeLabel::Order),
            Self::OrderItem | Self::Event => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Graph node labels. Every node is keyed by its `id` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeLabel {
    Category,
    Product,
    Customer,
    Order,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "Category",
            Self::Product => "Product",
            Self::Customer => "Customer",
            Self::Order => "Order",
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Graph relationship types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    InCategory,
    Placed,
    Contains,
    Viewed,
    Clicked,
    AddedToCart,
}

impl EdgeKind {
    /// Relationship type as written in Cypher.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InCategory => "IN_CATEGORY",
            Self::Placed => "PLACED",
            Self::Contains => "CONTAINS",
            Self::Viewed => "VIEWED",
            Self::Clicked => "CLICKED",
            Self::AddedToCart => "ADDED_TO_CART",
        }
    }

    /// Labels of the (start, end) nodes.
    pub fn endpoints(&self) -> (NodeLabel, NodeLabel) {
        match self {
            Self::InCategory => (NodeLabel::Product, NodeLabel::Category),
            Self::Placed => (NodeLabel::Customer, NodeLabel::Order),
            Self::Contains => (NodeLabel::Order, NodeLabel::Product),
            Self::Viewed | Self::Clicked | Self::AddedToCart => {
                (NodeLabel::Customer, NodeLabel::Product)
            }
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
