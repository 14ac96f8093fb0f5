use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderPaidEvent, SlotBookedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_paid_producers: Vec<EventProducer<OrderPaidEvent>>,
    pub slot_booked_producers: Vec<EventProducer<SlotBookedEvent>>,
}

pub struct EventHandlers {
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
    pub on_slot_booked: Option<EventHandler<SlotBookedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_paid = hooks.on_order_paid.map(|f| EventHandler::new(buffer_size, f));
        let on_slot_booked = hooks.on_slot_booked.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_paid, on_slot_booked }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_paid {
            result.order_paid_producers.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_slot_booked {
            result.slot_booked_producers.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_paid {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_slot_booked {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_slot_booked: Option<Handler<SlotBookedEvent>>,
}

impl EventHooks {
    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }

    pub fn on_slot_booked<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(SlotBookedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_slot_booked = Some(Arc::new(f));
        self
    }
}
