//! Outbound trigger dispatch to the build server.
//!
//! [`JobDispatcher`] is the seam between the debounce registry and the
//! network: the registry only knows that a matured job can be fired and
//! that firing may fail. [`JenkinsDispatcher`] is the production
//! implementation, POSTing to Jenkins' per-job build endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info};

use crate::types::JobName;

/// Fixed timeout for the outbound trigger call.
const TRIGGER_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from a single trigger attempt.
///
/// Dispatch failures are terminal for that attempt: the caller logs them
/// and moves on. There is no retry and nothing is reported back to the
/// event sender.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request never completed: connection failure, timeout, or an
    /// error while constructing the HTTP client.
    #[error("failed to reach build server: {0}")]
    Transport(#[from] reqwest::Error),

    /// The build server answered with a non-2xx status.
    #[error("build server returned status {status} for job {job}")]
    Status { job: JobName, status: StatusCode },
}

/// Fires a build job once its debounce window has elapsed.
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    /// Triggers one build of `job`. Any 2xx response is success.
    async fn fire(&self, job: &JobName) -> Result<(), DispatchError>;
}

/// Triggers jobs on a Jenkins server via `POST {project_url}/job/{name}/build`.
///
/// Two mutually exclusive authentication strategies:
/// - a configured username sends HTTP basic auth with the token as password;
/// - otherwise the token is appended as a `token` query parameter
///   (Jenkins' anonymous build-trigger token).
pub struct JenkinsDispatcher {
    client: reqwest::Client,
    project_url: String,
    user: Option<String>,
    token: String,
}

impl JenkinsDispatcher {
    /// Creates a dispatcher for the given project URL.
    ///
    /// `project_url` already includes the multibranch folder segment when
    /// one is configured (see [`crate::config::Config::project_url`]).
    /// When `tls_verify` is false the remote certificate is not validated,
    /// matching the common setup of internal Jenkins instances with
    /// self-signed certificates.
    pub fn new(
        project_url: impl Into<String>,
        user: Option<String>,
        token: impl Into<String>,
        tls_verify: bool,
    ) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(TRIGGER_TIMEOUT)
            .danger_accept_invalid_certs(!tls_verify)
            .build()?;

        Ok(JenkinsDispatcher {
            client,
            project_url: project_url.into(),
            user,
            token: token.into(),
        })
    }

    /// Returns the build endpoint for `job`.
    fn job_url(&self, job: &JobName) -> String {
        format!("{}/job/{}/build", self.project_url, job)
    }
}

#[async_trait]
impl JobDispatcher for JenkinsDispatcher {
    async fn fire(&self, job: &JobName) -> Result<(), DispatchError> {
        let url = self.job_url(job);
        debug!(job = %job, url = %url, "Triggering job");

        let request = match &self.user {
            Some(user) => self
                .client
                .post(&url)
                .basic_auth(user, Some(&self.token)),
            None => self
                .client
                .post(&url)
                .query(&[("token", self.token.as_str())]),
        };

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            info!(job = %job, "Job triggered");
            Ok(())
        } else {
            Err(DispatchError::Status {
                job: job.clone(),
                status,
            })
        }
    }
}
