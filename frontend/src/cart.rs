//! 购物车上下文
//!
//! `CartStore` 在启动时从 LocalStorage 恢复，之后的每次变更都经由信号更新，
//! 持久化由 store 自己完成。

use crate::web::BrowserStorage;
use crate::web::clock;
use coursedesk_shared::cart::{CartItem, CartStore};
use coursedesk_shared::protocol::InitiateCheckoutRequest;
use coursedesk_shared::{CourseId, CourseSummary, Price};
use leptos::prelude::*;

#[derive(Clone, Copy)]
pub struct CartContext {
    store: RwSignal<CartStore<BrowserStorage>>,
}

impl CartContext {
    pub fn provide() -> Self {
        let ctx = Self {
            store: RwSignal::new(CartStore::load(BrowserStorage)),
        };
        provide_context(ctx);
        ctx
    }

    pub fn add_item(&self, course: CourseSummary) {
        let now = clock::now();
        self.store.update(|s| s.add_item(course, now));
    }

    pub fn remove_item(&self, id: CourseId) {
        self.store.update(|s| s.remove_item(id));
    }

    pub fn clear_cart(&self) {
        self.store.update(|s| s.clear_cart());
    }

    pub fn open(&self) {
        self.store.update(|s| s.open());
    }

    pub fn close(&self) {
        self.store.update(|s| s.close());
    }

    pub fn toggle(&self) {
        self.store.update(|s| s.toggle());
    }

    pub fn is_open(&self) -> bool {
        self.store.with(|s| s.state().is_open())
    }

    pub fn is_in_cart(&self, id: CourseId) -> bool {
        self.store.with(|s| s.is_in_cart(id))
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.store.with(|s| s.state().items().to_vec())
    }

    pub fn total_items(&self) -> usize {
        self.store.with(|s| s.state().total_items())
    }

    pub fn total_amount(&self) -> Price {
        self.store.with(|s| s.state().total_amount())
    }

    pub fn checkout_request(&self) -> Option<InitiateCheckoutRequest> {
        self.store.with(|s| s.state().checkout_request())
    }
}

pub fn use_cart() -> CartContext {
    use_context::<CartContext>().expect("CartContext should be provided")
}
