//! Database entities.

#![allow(missing_docs)]

pub mod chat_message;
pub mod group;
pub mod join_request;
pub mod order_request;
pub mod request_status;
pub mod user;

pub use chat_message::Entity as ChatMessage;
pub use group::Entity as Group;
pub use join_request::Entity as JoinRequest;
pub use order_request::Entity as OrderRequest;
pub use request_status::RequestStatus;
pub use user::Entity as User;
