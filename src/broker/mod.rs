pub mod engine;
mod mailbox;
pub mod message;
pub mod stats;
pub mod subscriber;
pub mod topic;

pub use engine::Broker;
pub use mailbox::Delivery;
pub use message::Message;
pub use stats::DeliverySnapshot;
pub use subscriber::Subscriber;
