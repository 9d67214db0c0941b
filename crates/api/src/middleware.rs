//! Application state shared by all handlers.

#![allow(missing_docs)]

use rawmate_core::{
    ChatService, GroupService, MarketPriceService, OrderRequestService, UserService,
};

use crate::streaming::ChatHub;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub group_service: GroupService,
    pub order_request_service: OrderRequestService,
    pub chat_service: ChatService,
    pub market_price_service: MarketPriceService,
    pub chat: ChatHub,
}
