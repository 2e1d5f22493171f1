use instance_control_core::contract::InvocationResult;
use instance_control_lambda::adapters::ec2::Ec2ComputeApi;
use instance_control_lambda::adapters::observer::{init_json_logging, TracingObserver};
use instance_control_lambda::handlers::dispatch::handle_dispatch_event;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<InvocationResult, Error> {
    let api = Ec2ComputeApi::from_env().await;
    let observer = TracingObserver::new("dispatch_handler", event.context.request_id.clone());

    Ok(handle_dispatch_event(&event.payload, &api, &observer).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_json_logging();
    lambda_runtime::run(service_fn(handle_request)).await
}
