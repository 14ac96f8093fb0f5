//! The typed payment-provider notification.
//!
//! Events arrive at the server boundary already signature-verified and parsed into [`PaymentEvent`]. The provider's
//! free-form metadata payload is modelled as a tagged union keyed by `eventType`, with explicit fields per known type
//! and a catch-all [`EventDetail::Unhandled`] variant that is acknowledged and ignored. Metadata values are strings
//! on the wire (the provider stringifies everything); the accessors parse them and treat garbage as absent.
use serde::{Deserialize, Serialize};

use crate::db_types::EventId;

pub const CHECKOUT_COMPLETED: &str = "checkout_completed";
pub const PAYMENT_FAILED: &str = "payment_failed";
pub const SLOT_CHECKOUT_COMPLETED: &str = "slot_checkout_completed";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    #[serde(rename = "eventId")]
    pub event_id: EventId,
    #[serde(flatten)]
    pub detail: EventDetail,
}

impl PaymentEvent {
    pub fn new(event_id: impl Into<EventId>, detail: EventDetail) -> Self {
        Self { event_id: event_id.into(), detail }
    }

    /// The wire name of the event type, as recorded in the ledger.
    pub fn event_type(&self) -> &'static str {
        match &self.detail {
            EventDetail::CheckoutCompleted(_) => CHECKOUT_COMPLETED,
            EventDetail::PaymentFailed(_) => PAYMENT_FAILED,
            EventDetail::SlotCheckoutCompleted(_) => SLOT_CHECKOUT_COMPLETED,
            EventDetail::Unhandled => "unhandled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "eventType", content = "metadata")]
pub enum EventDetail {
    #[serde(rename = "checkout_completed")]
    CheckoutCompleted(OrderEventMeta),
    #[serde(rename = "payment_failed")]
    PaymentFailed(OrderEventMeta),
    #[serde(rename = "slot_checkout_completed")]
    SlotCheckoutCompleted(SlotEventMeta),
    #[serde(other)]
    Unhandled,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderEventMeta {
    #[serde(rename = "orderId", default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "paymentIntentId", default, skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
}

impl OrderEventMeta {
    pub fn for_order(order_id: i64) -> Self {
        Self { order_id: Some(order_id.to_string()), ..Default::default() }
    }

    pub fn order_id(&self) -> Option<i64> {
        parse_id(self.order_id.as_deref())
    }

    pub fn user_id(&self) -> Option<i64> {
        parse_id(self.user_id.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotEventMeta {
    #[serde(rename = "slotId", default, skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<String>,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "paymentIntentId", default, skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
}

impl SlotEventMeta {
    pub fn for_slot(slot_id: i64) -> Self {
        Self { slot_id: Some(slot_id.to_string()), ..Default::default() }
    }

    pub fn slot_id(&self) -> Option<i64> {
        parse_id(self.slot_id.as_deref())
    }
}

fn parse_id(value: Option<&str>) -> Option<i64> {
    value.and_then(|s| s.trim().parse::<i64>().ok()).filter(|id| *id > 0)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deserialize_checkout_completed() {
        let json = r#"{
            "eventId": "evt_1001",
            "eventType": "checkout_completed",
            "metadata": { "orderId": "42", "userId": "7", "paymentIntentId": "pi_abc" }
        }"#;
        let event: PaymentEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_id.as_str(), "evt_1001");
        match &event.detail {
            EventDetail::CheckoutCompleted(meta) => {
                assert_eq!(meta.order_id(), Some(42));
                assert_eq!(meta.user_id(), Some(7));
                assert_eq!(meta.payment_intent_id.as_deref(), Some("pi_abc"));
            },
            other => panic!("Wrong variant: {other:?}"),
        }
    }

    #[test]
    fn unknown_event_type_is_unhandled() {
        let json = r#"{ "eventId": "evt_1002", "eventType": "charge.refunded", "metadata": {} }"#;
        let event: PaymentEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event.detail, EventDetail::Unhandled));
    }

    #[test]
    fn garbage_metadata_parses_as_absent() {
        let meta = OrderEventMeta { order_id: Some("forty-two".into()), ..Default::default() };
        assert_eq!(meta.order_id(), None);
        let meta = SlotEventMeta { slot_id: Some("-9".into()), ..Default::default() };
        assert_eq!(meta.slot_id(), None);
    }
}
