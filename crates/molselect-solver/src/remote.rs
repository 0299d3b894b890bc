//! Client for a hosted solving service.
//!
//! The model is posted as JSON to `<endpoint>/v1/solve` with a bearer token.
//! The service answers with a status, a value per variable name and the
//! objective value:
//!
//! ```json
//! {"status": "optimal", "values": {"molecule_0": 1, "objective": 0}, "objective_value": 0}
//! ```

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Solver;
use crate::error::{SolveError, SolveResult};
use crate::problem::{Constraint, Model, Variable};
use crate::solution::Solution;

/// Connection settings for [`RemoteSolver`]. The token is supplied at run
/// time and never printed.
#[derive(Clone)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub token: String,
    pub timeout: Duration,
    /// Job label shown by the service
    pub label: String,
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("label", &self.label)
            .finish()
    }
}

#[derive(Serialize)]
struct SolveRequest<'a> {
    label: &'a str,
    sense: &'static str,
    variables: &'a [Variable],
    constraints: &'a [Constraint],
    objective: &'a [f64],
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
enum RemoteStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unbounded,
    Timeout,
}

#[derive(Deserialize, Debug)]
struct SolveResponse {
    status: RemoteStatus,
    #[serde(default)]
    values: HashMap<String, f64>,
    objective_value: Option<f64>,
}

#[derive(Debug)]
pub struct RemoteSolver {
    config: RemoteConfig,
    client: reqwest::blocking::Client,
}

impl RemoteSolver {
    pub fn new(config: RemoteConfig) -> SolveResult<Self> {
        if config.token.trim().is_empty() {
            return Err(SolveError::Unavailable("no solver credentials configured".to_string()));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SolveError::Unavailable(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn url(&self) -> String {
        format!("{}/v1/solve", self.config.endpoint.trim_end_matches('/'))
    }

    fn transport_error(&self, e: reqwest::Error) -> SolveError {
        if e.is_timeout() {
            SolveError::Timeout(self.config.timeout)
        } else {
            SolveError::Unavailable(e.to_string())
        }
    }
}

impl Solver for RemoteSolver {
    fn minimize(&self, model: &Model) -> SolveResult<Solution> {
        model.validate()?;

        let request = SolveRequest {
            label: &self.config.label,
            sense: "minimize",
            variables: &model.variables,
            constraints: &model.constraints,
            objective: &model.objective.coefficients,
        };

        let url = self.url();
        info!(%url, variables = model.num_variables(), constraints = model.num_constraints(), "submitting model");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&request)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(%status, "solver responded");
        match status.as_u16() {
            401 | 403 => return Err(SolveError::Unavailable(format!("credentials rejected ({status})"))),
            408 | 504 => return Err(SolveError::Timeout(self.config.timeout)),
            _ if status.is_server_error() => return Err(SolveError::Unavailable(format!("service error ({status})"))),
            _ if !status.is_success() => return Err(SolveError::Protocol(format!("unexpected status {status}"))),
            _ => {}
        }

        let body: SolveResponse = response.json().map_err(|e| {
            if e.is_timeout() {
                SolveError::Timeout(self.config.timeout)
            } else {
                SolveError::Protocol(e.to_string())
            }
        })?;
        decode_response(model, body, self.config.timeout)
    }
}

fn decode_response(model: &Model, body: SolveResponse, timeout: Duration) -> SolveResult<Solution> {
    match body.status {
        RemoteStatus::Optimal | RemoteStatus::Feasible => {}
        RemoteStatus::Infeasible => return Err(SolveError::Infeasible),
        RemoteStatus::Unbounded => return Err(SolveError::Unbounded),
        RemoteStatus::Timeout => return Err(SolveError::Timeout(timeout)),
    }

    let values = model
        .variables
        .iter()
        .map(|v| {
            body.values
                .get(&v.name)
                .copied()
                .ok_or_else(|| SolveError::Protocol(format!("no value for variable '{}'", v.name)))
        })
        .collect::<SolveResult<Vec<f64>>>()?;

    let objective_value = body
        .objective_value
        .unwrap_or_else(|| model.evaluate_objective(&values));
    Ok(Solution::optimal(values, objective_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{ConstraintOp, VarKind};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pick_one() -> Model {
        let mut model = Model::new();
        model.add_variable("a", VarKind::Binary);
        model.add_variable("b", VarKind::Binary);
        model.set_objective(vec![3.0, 1.0]);
        model.add_constraint("one", vec![1.0, 1.0], ConstraintOp::Eq, 1.0);
        model
    }

    fn config(endpoint: String, timeout: Duration) -> RemoteConfig {
        RemoteConfig {
            endpoint,
            token: "secret".to_string(),
            timeout,
            label: "test".to_string(),
        }
    }

    async fn solve_against(server: &MockServer, timeout: Duration) -> SolveResult<Solution> {
        let cfg = config(server.uri(), timeout);
        tokio::task::spawn_blocking(move || RemoteSolver::new(cfg)?.minimize(&pick_one()))
            .await
            .unwrap()
    }

    #[test]
    fn test_decode_orders_values_by_column() {
        let body: SolveResponse =
            serde_json::from_str(r#"{"status":"optimal","values":{"b":1,"a":0}}"#).unwrap();
        let solution = decode_response(&pick_one(), body, Duration::from_secs(1)).unwrap();
        assert_eq!(solution.values, vec![0.0, 1.0]);
        assert_eq!(solution.objective_value, 1.0);
    }

    #[test]
    fn test_decode_missing_variable() {
        let body: SolveResponse = serde_json::from_str(r#"{"status":"feasible","values":{"a":1}}"#).unwrap();
        let result = decode_response(&pick_one(), body, Duration::from_secs(1));
        assert!(matches!(result, Err(SolveError::Protocol(_))));
    }

    #[test]
    fn test_missing_token_is_unavailable() {
        let mut cfg = config("http://localhost:1".to_string(), Duration::from_secs(1));
        cfg.token = String::new();
        assert!(matches!(RemoteSolver::new(cfg), Err(SolveError::Unavailable(_))));
    }

    #[test]
    fn test_debug_redacts_token() {
        let cfg = config("http://localhost:1".to_string(), Duration::from_secs(1));
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_successful_solve() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/solve"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "optimal",
                "values": {"a": 0.0, "b": 1.0},
                "objective_value": 1.0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let solution = solve_against(&server, Duration::from_secs(5)).await.unwrap();
        assert_eq!(solution.values, vec![0.0, 1.0]);
        assert_eq!(solution.objective_value, 1.0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rejected_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = solve_against(&server, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(SolveError::Unavailable(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_infeasible_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "infeasible"})))
            .mount(&server)
            .await;

        let result = solve_against(&server, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(SolveError::Infeasible)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_slow_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(serde_json::json!({"status": "optimal", "values": {"a": 1.0, "b": 0.0}})),
            )
            .mount(&server)
            .await;

        let result = solve_against(&server, Duration::from_millis(200)).await;
        assert!(matches!(result, Err(SolveError::Timeout(_))));
    }
}
