//! Business logic services.

#![allow(missing_docs)]

pub mod actor;
pub mod chat;
pub mod event_publisher;
pub mod group;
pub mod market_price;
pub mod order_request;
pub mod user;

pub use actor::Actor;
pub use chat::{ChatService, PostChatMessageInput};
pub use event_publisher::{EventPublisher, EventPublisherService, NoOpEventPublisher};
pub use group::{Admission, CreateGroupInput, GroupService, JoinGroupInput};
pub use market_price::{MarketPrice, MarketPriceQuery, MarketPriceService};
pub use order_request::{
    CreateOrderRequestInput, OrderRequestService, OrderRequestWithParty, UpdateOrderStatusInput,
};
pub use user::{IdentifyInput, Identified, UserService};
