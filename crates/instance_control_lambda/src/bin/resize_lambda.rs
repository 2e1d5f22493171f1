use instance_control_core::contract::InvocationResult;
use instance_control_lambda::adapters::ec2::Ec2ComputeApi;
use instance_control_lambda::adapters::observer::{init_json_logging, TracingObserver};
use instance_control_lambda::config::ControllerConfig;
use instance_control_lambda::handlers::resize::handle_resize_event;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

async fn handle_request(event: LambdaEvent<Value>) -> Result<InvocationResult, Error> {
    let config = ControllerConfig::from_env()
        .map_err(|error| Error::from(format!("invalid resize configuration: {error}")))?;
    let api = Ec2ComputeApi::from_env().await;
    let observer = TracingObserver::new("resize_handler", event.context.request_id.clone());

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

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_json_logging();
    lambda_runtime::run(service_fn(handle_request)).await
}
