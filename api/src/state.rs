use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::pipeline::Pipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub identity: Arc<dyn IdentityProvider>,
}
