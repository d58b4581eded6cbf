//! The JSON messages exchanged over a framed connection.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    error::ServingErr,
    query::{ReactionConditions, TimeSweep},
};

/// A client request, tagged by `op`: `{"op": "predict", "input": {..}}`.
///
/// Every `model` field is optional and defaults to the registry's default model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Predict {
        #[serde(default)]
        model: Option<String>,
        input: ReactionConditions,
    },
    PredictBatch {
        #[serde(default)]
        model: Option<String>,
        inputs: Vec<ReactionConditions>,
    },
    PredictTimeseries {
        #[serde(default)]
        model: Option<String>,
        sweep: TimeSweep,
    },
    PredictCompare {
        sweep: TimeSweep,
    },
    Models,
    ModelInfo {
        #[serde(default)]
        model: Option<String>,
    },
    Health,
    Ready,
}

impl Request {
    /// The `op` tag, for logging.
    pub fn op(&self) -> &'static str {
        match self {
            Request::Predict { .. } => "predict",
            Request::PredictBatch { .. } => "predict_batch",
            Request::PredictTimeseries { .. } => "predict_timeseries",
            Request::PredictCompare { .. } => "predict_compare",
            Request::Models => "models",
            Request::ModelInfo { .. } => "model_info",
            Request::Health => "health",
            Request::Ready => "ready",
        }
    }
}

/// The answer to one request. `status` follows HTTP semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn with_status(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// A 200 response carrying `body`.
    pub fn ok<T: Serialize>(body: &T) -> Self {
        Self::encoded(200, body)
    }

    pub fn encoded<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self::with_status(status, body),
            Err(e) => Self::with_status(500, json!({ "detail": e.to_string() })),
        }
    }

    /// A request that could not be parsed at all.
    pub fn malformed(err: &serde_json::Error) -> Self {
        Self::with_status(422, json!({ "detail": format!("malformed request: {err}") }))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<&ServingErr> for Response {
    fn from(err: &ServingErr) -> Self {
        let body = match err {
            ServingErr::Validation(v) => json!({
                "detail": err.to_string(),
                "field": v.field,
                "constraint": v.constraint,
            }),
            other => json!({ "detail": other.to_string() }),
        };

        Self::with_status(err.status(), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErr;

    #[test]
    fn unit_ops_parse() {
        let req: Request = serde_json::from_str(r#"{"op": "health"}"#).unwrap();
        assert_eq!(req, Request::Health);

        let req: Request = serde_json::from_str(r#"{"op": "model_info"}"#).unwrap();
        assert_eq!(req, Request::ModelInfo { model: None });
    }

    #[test]
    fn predict_parses_with_and_without_model() {
        let raw = r#"{"op": "predict", "input": {"m_molar": 3.326, "s_molar": 6.674,
            "i_molar": 0.0246, "temperature_k": 333.0, "time_s": 7200.0}}"#;
        let req: Request = serde_json::from_str(raw).unwrap();
        assert!(matches!(req, Request::Predict { model: None, .. }));

        let raw = r#"{"op": "predict_timeseries", "model": "pcinn", "sweep": {"m_molar": 3.0,
            "s_molar": 6.0, "i_molar": 0.02, "temperature_k": 333.0, "time_end_s": 3600.0}}"#;
        match serde_json::from_str::<Request>(raw).unwrap() {
            Request::PredictTimeseries { model, sweep } => {
                assert_eq!(model.as_deref(), Some("pcinn"));
                assert_eq!(sweep.time_steps, 100);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_op_is_an_error() {
        assert!(serde_json::from_str::<Request>(r#"{"op": "train"}"#).is_err());
    }

    #[test]
    fn validation_error_carries_field() {
        let err = ServingErr::from(ValidationErr::new("inputs[3].m_molar", "must be between"));
        let resp = Response::from(&err);

        assert_eq!(resp.status, 422);
        assert_eq!(resp.body["field"], "inputs[3].m_molar");
        assert!(!resp.is_success());
    }

    #[test]
    fn unknown_model_error_lists_models() {
        let err = ServingErr::UnknownModel {
            requested: "gpt".into(),
            available: vec!["baseline_nn".into(), "pcinn".into()],
        };
        let resp = Response::from(&err);

        assert_eq!(resp.status, 400);
        assert_eq!(
            resp.body["detail"],
            "Unknown model 'gpt'. Available: baseline_nn, pcinn"
        );
    }
}
