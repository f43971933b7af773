//! The try-on workflow.

use tracing::info;

use vfit_job_client::JobCatalog;
use vfit_storage::S3Store;

use crate::config::FlowConfig;
use crate::error::FlowResult;
use crate::steps::{
    generate_mask, generate_model, generate_tryon, pull_garment, push_result, with_step_retry,
    StepPolicy,
};

/// One try-on request.
#[derive(Debug, Clone)]
pub struct FlowRequest {
    /// S3 URI of the garment image.
    pub garment_uri: String,
    /// Prompt describing the model to generate.
    pub model_prompt: String,
    /// Garment category (e.g. `upper_body`).
    pub category: String,
    /// S3 URI for the rendered try-on image.
    pub output_uri: String,
}

/// Run the workflow to completion.
///
/// The garment pull and the model generation are independent and run in
/// parallel; masking, try-on, and the final upload depend on their
/// predecessors and run sequentially.
pub async fn run(config: &FlowConfig, store: &S3Store, request: &FlowRequest) -> FlowResult<()> {
    let catalog = JobCatalog::standard();
    let policy = StepPolicy {
        attempts: config.step_attempts,
        delay: config.step_delay,
    };

    info!("Starting try-on workflow for {}", request.garment_uri);

    let (garment, model) = tokio::join!(
        with_step_retry("pull-garment", &policy, || pull_garment(
            store,
            &request.garment_uri
        )),
        with_step_retry("generate-model", &policy, || generate_model(
            &catalog,
            &config.model_endpoint,
            &request.model_prompt
        )),
    );
    let garment = garment?;
    let model = model?;

    let mask = with_step_retry("generate-mask", &policy, || {
        generate_mask(&catalog, &config.mask_endpoint, &model, &request.category)
    })
    .await?;

    let tryon = with_step_retry("generate-tryon", &policy, || {
        generate_tryon(
            &catalog,
            &config.tryon_endpoint,
            &model,
            &mask,
            &garment,
            &request.category,
        )
    })
    .await?;

    with_step_retry("push-result", &policy, || {
        push_result(store, &tryon, &request.output_uri)
    })
    .await?;

    info!("Try-on workflow complete, result at {}", request.output_uri);
    Ok(())
}
