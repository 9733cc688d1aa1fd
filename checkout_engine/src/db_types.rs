use std::{collections::HashMap, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
pub use shop_common::Pesewas;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------        Ids        -------------------------------------------------------------
macro_rules! row_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim().trim_start_matches('#');
                s.parse::<i64>().map(Self).map_err(|e| ConversionError(format!("{s} is not a valid id. {e}")))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

row_id!(ProductId, "product #");
row_id!(VariantId, "variant #");
row_id!(OrderId, "#");

//--------------------------------------      Principal      -----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

/// An authenticated caller. Identity and sessions are managed elsewhere; the engine only needs to know who the caller
/// is, what they may do, and whether they have been blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub role: Role,
    pub blocked: bool,
}

impl Principal {
    pub fn new<S: Into<String>>(id: S, role: Role) -> Self {
        Self { id: id.into(), role, blocked: false }
    }

    pub fn user<S: Into<String>>(id: S) -> Self {
        Self::new(id, Role::User)
    }

    pub fn admin<S: Into<String>>(id: S) -> Self {
        Self::new(id, Role::Admin)
    }

    pub fn blocked(mut self) -> Self {
        self.blocked = true;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

//--------------------------------------       Catalog       -----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub sku: Option<String>,
    pub color: Option<String>,
    pub storage: Option<String>,
    pub price: Pesewas,
    pub stock: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Variant {
    pub fn label(&self) -> String {
        variant_label(self.color.as_deref(), self.storage.as_deref(), self.sku.as_deref())
    }
}

/// A variant joined with its owning product, as seen by the checkout.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CatalogItem {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_title: String,
    pub product_active: bool,
    pub sku: Option<String>,
    pub color: Option<String>,
    pub storage: Option<String>,
    pub price: Pesewas,
    pub stock: i64,
    pub active: bool,
}

impl CatalogItem {
    pub fn is_purchasable(&self) -> bool {
        self.active && self.product_active
    }

    pub fn label(&self) -> String {
        variant_label(self.color.as_deref(), self.storage.as_deref(), self.sku.as_deref())
    }

    /// The human-readable name used in checkout error messages, e.g. "Galaxy A15 (Black • 128GB)"
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.product_title, self.label())
    }
}

/// `color • storage` when either is present, otherwise the SKU, otherwise "Default".
pub fn variant_label(color: Option<&str>, storage: Option<&str>, sku: Option<&str>) -> String {
    let parts = [color, storage]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();
    if !parts.is_empty() {
        return parts.join(" • ");
    }
    match sku.map(str::trim) {
        Some(sku) if !sku.is_empty() => sku.to_string(),
        _ => "Default".to_string(),
    }
}

//--------------------------------------      CartItem       -----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub variant_id: VariantId,
    pub quantity: i64,
}

impl CartItem {
    pub fn new(variant_id: VariantId, quantity: i64) -> Self {
        Self { variant_id, quantity }
    }
}

/// Folds repeated lines for the same variant into a single line, keeping the order in which variants first appear.
/// Returns `None` if a quantity overflows.
pub fn merge_cart_lines(items: &[CartItem]) -> Option<Vec<CartItem>> {
    let mut positions = HashMap::<VariantId, usize>::with_capacity(items.len());
    let mut merged: Vec<CartItem> = Vec::with_capacity(items.len());
    for item in items {
        match positions.get(&item.variant_id) {
            Some(&i) => {
                merged[i].quantity = merged[i].quantity.checked_add(item.quantity)?;
            },
            None => {
                positions.insert(item.variant_id, merged.len());
                merged.push(*item);
            },
        }
    }
    Some(merged)
}

//--------------------------------------   OrderStatusType   -----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// Stock is reserved and the order is waiting for the payment verdict.
    Pending,
    /// The payment has been verified. Stock stays consumed.
    Paid,
    /// The payment failed, or the order was cancelled or expired. Reserved stock has been restored.
    Failed,
    /// A paid order that has been handed over to the customer.
    Fulfilled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Paid => write!(f, "Paid"),
            Self::Failed => write!(f, "Failed"),
            Self::Fulfilled => write!(f, "Fulfilled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "fulfilled" => Ok(Self::Fulfilled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------    PaymentStatus    -----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// The charge has been sent to the provider. The payer has not approved or declined it yet.
    Initiated,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Initiated)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initiated => write!(f, "Initiated"),
            Self::Success => write!(f, "Success"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "initiated" => Ok(Self::Initiated),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------        Order        -----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub title: String,
    pub variant_label: String,
    pub quantity: i64,
    pub unit_price: Pesewas,
}

impl NewOrderItem {
    pub fn from_catalog(item: &CatalogItem, quantity: i64) -> Self {
        Self {
            product_id: item.product_id,
            variant_id: item.variant_id,
            title: item.product_title.clone(),
            variant_label: item.label(),
            quantity,
            unit_price: item.price,
        }
    }

    pub fn line_total(&self) -> Pesewas {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_id: String,
    pub customer_phone: String,
    pub delivery_fee: Pesewas,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(customer_id: S, customer_phone: S, delivery_fee: Pesewas) -> Self {
        Self { customer_id: customer_id.into(), customer_phone: customer_phone.into(), delivery_fee, items: vec![] }
    }

    pub fn with_item(mut self, item: NewOrderItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn subtotal(&self) -> Pesewas {
        self.items.iter().map(NewOrderItem::line_total).sum()
    }

    pub fn total(&self) -> Pesewas {
        self.subtotal() + self.delivery_fee
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: String,
    pub status: OrderStatusType,
    pub currency: String,
    pub subtotal: Pesewas,
    pub delivery_fee: Pesewas,
    pub total: Pesewas,
    pub customer_phone: String,
    pub stock_reserved: bool,
    pub payment_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Order {} for {} ({}, {})", self.id, self.customer_id, self.total, self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub title: String,
    pub variant_label: String,
    pub quantity: i64,
    pub unit_price: Pesewas,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct TrackingNote {
    pub id: i64,
    pub order_id: OrderId,
    pub note: String,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       Payment       -----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub customer_id: String,
    pub provider: String,
    pub reference: String,
    pub amount: Pesewas,
    pub raw_payload: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: OrderId,
    pub customer_id: String,
    pub provider: String,
    pub reference: String,
    pub status: PaymentStatus,
    pub amount: Pesewas,
    /// Whatever the provider last sent us for this payment. Kept for audit display only.
    pub raw_payload: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Display for Payment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Payment [{}] for order {} ({}, {})", self.reference, self.order_id, self.amount, self.status)
    }
}
