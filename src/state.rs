use std::sync::Arc;

use crate::context::ExecutionContext;

#[derive(Clone)]
pub struct AppState {
    pub context: Arc<ExecutionContext>,
}

impl AppState {
    pub fn new(context: Arc<ExecutionContext>) -> Self {
        Self { context }
    }
}
