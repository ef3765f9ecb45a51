pub use crate::features::alert::{
    AlertBus, AlertEvent, AlertPublisher, AlertSink, ChannelSink, LogSink, WebhookSink,
};
