use std::sync::Arc;

use opentelemetry::{global, metrics::Counter};

use crate::{config::SERVICE_NAME, store::UserStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<UserStore>,
    pub users_created_counter: Counter<u64>,
    pub users_deleted_counter: Counter<u64>,
}

impl AppState {
    /// Counters come from the global meter; they are no-ops until a meter
    /// provider is installed.
    pub fn new(store: UserStore) -> Self {
        let meter = global::meter(SERVICE_NAME);

        Self {
            store: Arc::new(store),
            users_created_counter: meter
                .u64_counter("users_created")
                .with_description("Users created")
                .build(),
            users_deleted_counter: meter
                .u64_counter("users_deleted")
                .with_description("Users deleted")
                .build(),
        }
    }
}
