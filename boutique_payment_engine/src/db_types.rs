//! Database-facing types shared by every backend of the reconciliation engine.
use std::{fmt::Display, str::FromStr};

use bpg_common::MoneyCents;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(pub String);

//--------------------------------------        EventId        -------------------------------------------------------
/// The provider-assigned, globally unique identifier of a payment notification. Never reused by the provider, and
/// never minted by this system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, serde::Serialize, serde::Deserialize)]
#[sqlx(transparent)]
pub struct EventId(pub String);

impl FromStr for EventId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl EventId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     LedgerStatus      -------------------------------------------------------
/// The processing state of a ledger row. Legal transitions are Received → Processing → {Processed | Error}. An Error
/// row may be claimed again; a Processed row is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
pub enum LedgerStatus {
    /// The event id has been sighted, but no worker has claimed it yet.
    Received,
    /// A worker has claimed the event and the business transaction is (or was) in flight.
    Processing,
    /// The event was handled to completion. It must never be reprocessed.
    Processed,
    /// The business transaction failed and was rolled back. Safe to retry.
    Error,
}

impl Display for LedgerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerStatus::Received => write!(f, "Received"),
            LedgerStatus::Processing => write!(f, "Processing"),
            LedgerStatus::Processed => write!(f, "Processed"),
            LedgerStatus::Error => write!(f, "Error"),
        }
    }
}

impl FromStr for LedgerStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Received" => Ok(Self::Received),
            "Processing" => Ok(Self::Processing),
            "Processed" => Ok(Self::Processed),
            "Error" => Ok(Self::Error),
            s => Err(ConversionError(format!("Invalid ledger status: {s}"))),
        }
    }
}

impl From<String> for LedgerStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            log::error!("Invalid ledger status '{value}' read from the database. Defaulting to Received");
            LedgerStatus::Received
        })
    }
}

//--------------------------------------    PaymentEventRow    -------------------------------------------------------
/// A row in the payment event ledger. There is at most one row per event id, enforced by a unique constraint.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentEventRow {
    pub id: i64,
    pub event_id: EventId,
    pub event_type: String,
    pub status: LedgerStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

//--------------------------------------      ClaimResult      -------------------------------------------------------
/// The result of trying to claim an event id for processing. Exactly one concurrent caller receives `Claimed`; every
/// other caller must acknowledge without touching business state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimResult {
    Claimed,
    AlreadyProcessed,
    AlreadyInFlight,
}

//--------------------------------------      EventOutcome     -------------------------------------------------------
/// The terminal outcome recorded against a claimed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Processed,
    Error(String),
}

//--------------------------------------    OrderStatusType    -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
pub enum OrderStatusType {
    /// The order exists but payment has not been reconciled.
    Pending,
    /// Payment has been reconciled and stock decremented. Terminal for this engine.
    Paid,
    /// The order was cancelled. Outside this engine's authority.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Paid => write!(f, "Paid"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            log::error!("Invalid order status '{value}' read from the database. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------         Order         -------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub id: i64,
    /// The owning user, if any. Guest orders carry no user and therefore no cart to clear.
    pub user_id: Option<i64>,
    pub status: OrderStatusType,
    pub delivery_address: Option<String>,
    pub delivery_mode: Option<String>,
    pub total: MoneyCents,
    /// The provider's payment reference. Set at most once.
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: MoneyCents,
}

/// An order together with its line items, as loaded for fulfilment.
#[derive(Debug, Clone)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

//--------------------------------------        Product        -------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub stock: i64,
}

//--------------------------------------      Cart types       -------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub product_id: i64,
    pub quantity: i64,
}

//--------------------------------------       SlotStatus      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
pub enum SlotStatus {
    /// The slot is available for booking.
    Open,
    /// A deposit has been reconciled against the slot. Terminal for this engine.
    Booked,
    /// The slot was withdrawn. Outside this engine's authority.
    Cancelled,
}

impl Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotStatus::Open => write!(f, "Open"),
            SlotStatus::Booked => write!(f, "Booked"),
            SlotStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for SlotStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Booked" => Ok(Self::Booked),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid slot status: {s}"))),
        }
    }
}

impl From<String> for SlotStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            log::error!("Invalid slot status '{value}' read from the database. Defaulting to Open");
            SlotStatus::Open
        })
    }
}

//--------------------------------------         Slot          -------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Slot {
    pub id: i64,
    pub service_id: i64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: SlotStatus,
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Booking        -------------------------------------------------------
/// The identity that reserved a slot. Either a registered user or a guest identified by the contact fields. Read-only
/// for the reconciliation engine; it exists here so the booking confirmation can be addressed.
#[derive(Debug, Clone, FromRow)]
pub struct Booking {
    pub id: i64,
    pub slot_id: i64,
    pub user_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Human-readable name of the reserving party, for notification copy.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => "Guest".to_string(),
        }
    }
}
