use crate::db_types::{Booking, Order, OrderItem, Slot};

/// Emitted exactly once per reconciled order payment, after the fulfilment transaction has committed.
#[derive(Debug, Clone)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Emitted exactly once per reconciled slot deposit, after the booking transaction has committed. The booking carries
/// the contact details the confirmation should be addressed to; it is `None` when the reservation flow never recorded
/// one.
#[derive(Debug, Clone)]
pub struct SlotBookedEvent {
    pub slot: Slot,
    pub booking: Option<Booking>,
}
