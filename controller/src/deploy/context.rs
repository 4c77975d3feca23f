//! Build context assembly

use tracing::{debug, info};

use crate::deploy::refs::DeploymentClass;
use crate::errors::ControllerError;
use crate::models::build::{BuildContext, Parameter, ParameterManifest};
use crate::models::PushEvent;
use crate::services::{ArtifactStore, Repository};

/// Parameter carrying the uploaded deploy template location
pub const DEPLOY_STACK_LOCATION: &str = "DeployStackLocation";

/// Repository paths of the stack definition files
#[derive(Debug, Clone)]
pub struct TemplateFiles {
    /// Pipeline stack template (required)
    pub pipeline: String,

    /// Parameter manifest (required)
    pub parameters: String,

    /// Deployment stack template (optional)
    pub deploy: String,
}

impl Default for TemplateFiles {
    fn default() -> Self {
        Self {
            pipeline: "pipeline.json".to_string(),
            parameters: "parameters.json".to_string(),
            deploy: "deploy.json".to_string(),
        }
    }
}

/// Ref the stack files are read at: the pushed revision when known
pub fn source_ref(event: &PushEvent) -> &str {
    if event.after.is_empty() {
        &event.reference
    } else {
        &event.after
    }
}

/// Fetch the stack files for a push and select the class parameters
pub async fn assemble(
    event: &PushEvent,
    class: DeploymentClass,
    repo: &dyn Repository,
    files: &TemplateFiles,
) -> Result<BuildContext, ControllerError> {
    let reference = source_ref(event);

    let pipeline_template = fetch_required(repo, reference, &files.pipeline).await?;
    let parameter_bytes = fetch_required(repo, reference, &files.parameters).await?;

    let deploy_template = match repo.get(reference, &files.deploy).await {
        Ok(bytes) => Some(bytes),
        Err(e) if e.is_not_found() => {
            debug!("No {} in repository, skipping deploy template", files.deploy);
            None
        }
        Err(e) => {
            return Err(ControllerError::TemplateFetchError {
                path: files.deploy.clone(),
                reason: e.to_string(),
            })
        }
    };

    let manifest: ParameterManifest = serde_json::from_slice(&parameter_bytes)
        .map_err(|e| ControllerError::ParameterError(format!("{}: {}", files.parameters, e)))?;

    Ok(BuildContext {
        pipeline_template,
        deploy_template,
        parameters: manifest.select(class),
    })
}

async fn fetch_required(
    repo: &dyn Repository,
    reference: &str,
    path: &str,
) -> Result<Vec<u8>, ControllerError> {
    repo.get(reference, path)
        .await
        .map_err(|e| ControllerError::TemplateFetchError {
            path: path.to_string(),
            reason: e.to_string(),
        })
}

/// Object key of the deploy template for a push
pub fn deploy_template_key(event: &PushEvent) -> String {
    format!(
        "deploy/{}/{}/{}/deploy.json",
        event.owner(),
        event.repo_name(),
        event.after
    )
}

/// Upload the deploy template, if any, and point the stack at it
pub async fn stage_deploy_template(
    context: &mut BuildContext,
    event: &PushEvent,
    artifacts: &dyn ArtifactStore,
) -> Result<(), ControllerError> {
    let Some(template) = context.deploy_template.clone() else {
        return Ok(());
    };

    let key = deploy_template_key(event);
    info!("Uploading deploy template to {}", key);
    let location = artifacts.put(&key, template).await?;

    context
        .parameters
        .push(Parameter::new(DEPLOY_STACK_LOCATION, location));
    Ok(())
}
