use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;

use crate::{
    catalog,
    error::Result,
    health,
    protocol::{Request, Response},
    query,
    registry::Registry,
};

/// Answers requests against a shared, read only registry.
#[derive(Debug, Clone)]
pub struct Service {
    registry: Arc<Registry>,
}

impl Service {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Dispatches one parsed request.
    pub fn handle(&self, request: &Request) -> Response {
        let registry = self.registry.as_ref();

        let response = match request {
            Request::Predict { model, input } => {
                respond(query::single(registry, model.as_deref(), input))
            }
            Request::PredictBatch { model, inputs } => {
                respond(query::batch(registry, model.as_deref(), inputs))
            }
            Request::PredictTimeseries { model, sweep } => {
                respond(query::timeseries(registry, model.as_deref(), sweep))
            }
            Request::PredictCompare { sweep } => respond(query::compare(registry, sweep)),
            Request::Models => Response::ok(&catalog::list_models(registry)),
            Request::ModelInfo { model } => {
                respond(catalog::model_info(registry, model.as_deref()))
            }
            Request::Health => Response::ok(&health::health(registry)),
            Request::Ready => {
                let readiness = health::readiness(registry);
                Response::encoded(readiness.status_code(), &readiness)
            }
        };

        if response.is_success() {
            debug!(op = request.op(), status = response.status; "request served");
        } else {
            warn!(op = request.op(), status = response.status; "request rejected: {}", response.body);
        }

        response
    }

    /// Parses and dispatches one raw request frame.
    pub fn handle_frame(&self, frame: &[u8]) -> Response {
        match serde_json::from_slice::<Request>(frame) {
            Ok(request) => self.handle(&request),
            Err(e) => {
                warn!("malformed request: {e}");
                Response::malformed(&e)
            }
        }
    }
}

fn respond<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(body) => Response::ok(&body),
        Err(e) => Response::from(&e),
    }
}
