//! Workflow steps.
//!
//! Each step is a traced async function over the collaborator clients. The
//! step retry here is the workflow's own policy; the job client retries
//! individual requests underneath it.

use std::future::Future;
use std::time::Duration;

use image::DynamicImage;
use tracing::{info, warn};

use vfit_job_client::{JobCatalog, JobClient, JobClientConfig, JobInput, JobKind};
use vfit_storage::S3Store;

use crate::error::FlowResult;

/// Retry policy for a workflow step.
#[derive(Debug, Clone)]
pub struct StepPolicy {
    /// Attempts per step, including the first.
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for StepPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(10),
        }
    }
}

/// Run a step under the workflow retry policy.
pub async fn with_step_retry<T, F, Fut>(name: &str, policy: &StepPolicy, step: F) -> FlowResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = FlowResult<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match step().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!(
                    "step {} failed (attempt {}/{}), retrying in {:?}: {}",
                    name, attempt, attempts, policy.delay, e
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Pull the garment image from S3.
pub async fn pull_garment(store: &S3Store, garment_uri: &str) -> FlowResult<DynamicImage> {
    let garment = store.download_image(garment_uri).await?;
    info!("Pulled garment image from {}", garment_uri);
    Ok(garment)
}

/// Generate a model image from a prompt.
pub async fn generate_model(
    catalog: &JobCatalog,
    endpoint: &str,
    prompt: &str,
) -> FlowResult<DynamicImage> {
    let client = JobClient::for_kind(
        catalog,
        JobKind::ModelGeneration,
        JobClientConfig::new(endpoint),
    )?;
    let input = JobInput::new().with_text("prompt", prompt);
    let model = client.run_job(&input).await?;
    info!("Generated model from prompt");
    Ok(model)
}

/// Generate a mask for a model image and a garment category.
pub async fn generate_mask(
    catalog: &JobCatalog,
    endpoint: &str,
    model: &DynamicImage,
    category: &str,
) -> FlowResult<DynamicImage> {
    let client = JobClient::for_kind(catalog, JobKind::Mask, JobClientConfig::new(endpoint))?;
    let input = JobInput::new()
        .with_image("model_img", model.clone())
        .with_text("category", category);
    let mask = client.run_job(&input).await?;
    info!("Generated mask from model and category");
    Ok(mask)
}

/// Render the try-on image from model, mask, garment, and category.
pub async fn generate_tryon(
    catalog: &JobCatalog,
    endpoint: &str,
    model: &DynamicImage,
    mask: &DynamicImage,
    garment: &DynamicImage,
    category: &str,
) -> FlowResult<DynamicImage> {
    let client = JobClient::for_kind(catalog, JobKind::TryOn, JobClientConfig::new(endpoint))?;
    let input = JobInput::new()
        .with_image("model_img", model.clone())
        .with_image("mask_img", mask.clone())
        .with_image("cloth_img", garment.clone())
        .with_text("category", category);
    let tryon = client.run_job(&input).await?;
    info!("Generated try-on image");
    Ok(tryon)
}

/// Upload the try-on image to S3.
pub async fn push_result(
    store: &S3Store,
    image: &DynamicImage,
    output_uri: &str,
) -> FlowResult<()> {
    store.upload_image(image, output_uri).await?;
    info!("Uploaded try-on image to {}", output_uri);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use vfit_job_client::JobError;

    fn fast_policy(attempts: u32) -> StepPolicy {
        StepPolicy {
            attempts,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_step_retry_eventual_success() {
        let calls = AtomicU32::new(0);
        let result = with_step_retry("test-step", &fast_policy(3), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(JobError::decode("transient").into())
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_step_retry_gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let result: FlowResult<()> = with_step_retry("test-step", &fast_policy(2), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(JobError::decode("persistent").into()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
