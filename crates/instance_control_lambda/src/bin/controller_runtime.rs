use instance_control_core::contract::{Action, InvocationResult};
use instance_control_lambda::adapters::ec2::Ec2ComputeApi;
use instance_control_lambda::adapters::observer::{init_json_logging, TracingObserver};
use instance_control_lambda::config::ControllerConfig;
use instance_control_lambda::handlers::dispatch::handle_dispatch_event;
use instance_control_lambda::handlers::resize::handle_resize_event;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

async fn handle_request(event: LambdaEvent<Value>) -> Result<InvocationResult, Error> {
    let api = Ec2ComputeApi::from_env().await;
    let request_id = event.context.request_id.clone();

    if is_direct_action_event(&event.payload) {
        let observer = TracingObserver::new("dispatch_handler", request_id);
        return Ok(handle_dispatch_event(&event.payload, &api, &observer).await);
    }

    let config = ControllerConfig::from_env()
        .map_err(|error| Error::from(format!("invalid resize configuration: {error}")))?;
    let observer = TracingObserver::new("resize_handler", request_id);
    handle_resize_event(
        &event.payload,
        &api,
        &config,
        &CancellationToken::new(),
        &observer,
    )
    .await
    .map_err(Error::from)
}

/// Events naming an `action` go to dispatch, except `resize`, so a bad action
/// still gets the dispatch handler's 400 rather than a resize attempt.
fn is_direct_action_event(event: &Value) -> bool {
    let Some(action) = event.as_object().and_then(|object| object.get("action")) else {
        return false;
    };
    action.as_str().and_then(Action::parse) != Some(Action::Resize)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_json_logging();
    lambda_runtime::run(service_fn(handle_request)).await
}
