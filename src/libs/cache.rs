use std::sync::Arc;

use dashmap::DashMap;

use crate::pages::func::order::OrderForm;

macro_rules! gen_cache {
    ($(($N:ident, $T:ty)), +) => {
        lazy_static::lazy_static! {
            $(
                pub static ref $N: Arc<DashMap<String, $T>> = {
                    Arc::new(DashMap::new())
                };
            )+
        }
    };
}

// Order-intake drafts, keyed by draft id. A draft lives until it is
// submitted or cancelled.
gen_cache! {
    (DRAFT_CACHE, OrderForm)
}
