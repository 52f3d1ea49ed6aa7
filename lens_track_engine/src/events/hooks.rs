use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OtpDispatchEvent, RiderBroadcastEvent, RiderWelcomeEvent};

/// The sending halves handed to the public APIs. Each vector fans out to every hook registered
/// for that event.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub rider_broadcast_producer: Vec<EventProducer<RiderBroadcastEvent>>,
    pub otp_dispatch_producer: Vec<EventProducer<OtpDispatchEvent>>,
    pub rider_welcome_producer: Vec<EventProducer<RiderWelcomeEvent>>,
}

pub struct EventHandlers {
    pub on_rider_broadcast: Option<EventHandler<RiderBroadcastEvent>>,
    pub on_otp_dispatch: Option<EventHandler<OtpDispatchEvent>>,
    pub on_rider_welcome: Option<EventHandler<RiderWelcomeEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_rider_broadcast = hooks.on_rider_broadcast.map(|f| EventHandler::new(buffer_size, f));
        let on_otp_dispatch = hooks.on_otp_dispatch.map(|f| EventHandler::new(buffer_size, f));
        let on_rider_welcome = hooks.on_rider_welcome.map(|f| EventHandler::new(buffer_size, f));
        Self { on_rider_broadcast, on_otp_dispatch, on_rider_welcome }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_rider_broadcast {
            result.rider_broadcast_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_otp_dispatch {
            result.otp_dispatch_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_rider_welcome {
            result.rider_welcome_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_rider_broadcast {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_otp_dispatch {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_rider_welcome {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_rider_broadcast: Option<Handler<RiderBroadcastEvent>>,
    pub on_otp_dispatch: Option<Handler<OtpDispatchEvent>>,
    pub on_rider_welcome: Option<Handler<RiderWelcomeEvent>>,
}

impl EventHooks {
    pub fn on_rider_broadcast<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(RiderBroadcastEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_rider_broadcast = Some(Arc::new(f));
        self
    }

    pub fn on_otp_dispatch<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OtpDispatchEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_otp_dispatch = Some(Arc::new(f));
        self
    }

    pub fn on_rider_welcome<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(RiderWelcomeEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_rider_welcome = Some(Arc::new(f));
        self
    }
}
