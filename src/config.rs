//! Process configuration.
//!
//! Read once at startup from CLI flags with environment-variable
//! fallbacks, then immutable. Required settings that are absent make the
//! process exit non-zero before it binds the listener.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Configuration for the trigger proxy.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "trigger-proxy",
    about = "Debounces repository change notifications into Jenkins job triggers"
)]
pub struct Config {
    /// Base URL of the Jenkins server.
    #[arg(long, env = "JENKINS_URL")]
    pub jenkins_url: String,

    /// Jenkins username for basic auth. When absent the token is passed
    /// as an anonymous build-trigger token instead.
    #[arg(long, env = "JENKINS_USER")]
    pub jenkins_user: Option<String>,

    /// API token for the user, or the job's build-trigger token when no
    /// user is configured.
    #[arg(long, env = "JENKINS_TOKEN")]
    pub jenkins_token: String,

    /// Multibranch project folder; scopes all trigger URLs under
    /// `/job/{folder}`.
    #[arg(long, env = "JENKINS_MULTI")]
    pub jenkins_multi: Option<String>,

    /// Path to the semicolon-delimited mapping file.
    #[arg(long, env = "MAPPING_FILE", default_value = "mapping.csv")]
    pub mapping_file: PathBuf,

    /// Seconds of silence required before an armed job fires.
    #[arg(long, env = "QUIET_PERIOD", default_value_t = 10)]
    pub quiet_period: u64,

    /// Match on file patterns: mapping records carry a fourth field and
    /// inbound events are matched per file.
    #[arg(long, env = "FILE_MATCH")]
    pub file_match: bool,

    /// Address to listen on.
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: SocketAddr,

    /// Verify the Jenkins server's TLS certificate. Off by default to
    /// accommodate internal servers with self-signed certificates.
    #[arg(long, env = "TLS_VERIFY")]
    pub tls_verify: bool,
}

impl Config {
    /// The URL all job trigger endpoints hang off: the base URL, scoped
    /// under the multibranch folder when one is configured.
    pub fn project_url(&self) -> String {
        match &self.jenkins_multi {
            Some(folder) => format!("{}/job/{}", self.jenkins_url, folder),
            None => self.jenkins_url.clone(),
        }
    }

    /// The quiet period as a [`Duration`].
    pub fn quiet_period_duration(&self) -> Duration {
        Duration::from_secs(self.quiet_period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_args() -> Vec<&'static str> {
        vec![
            "trigger-proxy",
            "--jenkins-url",
            "https://jenkins.example",
            "--jenkins-token",
            "tok",
        ]
    }

    #[test]
    fn defaults_applied() {
        let config = Config::try_parse_from(minimal_args()).unwrap();

        assert_eq!(config.mapping_file, PathBuf::from("mapping.csv"));
        assert_eq!(config.quiet_period, 10);
        assert!(!config.file_match);
        assert_eq!(config.listen_addr.port(), 8080);
        assert!(!config.tls_verify);
        assert_eq!(config.jenkins_user, None);
    }

    #[test]
    fn project_url_without_multibranch_is_base_url() {
        let config = Config::try_parse_from(minimal_args()).unwrap();
        assert_eq!(config.project_url(), "https://jenkins.example");
    }

    #[test]
    fn project_url_scopes_under_multibranch_folder() {
        let mut args = minimal_args();
        args.extend(["--jenkins-multi", "team-folder"]);
        let config = Config::try_parse_from(args).unwrap();

        assert_eq!(
            config.project_url(),
            "https://jenkins.example/job/team-folder"
        );
    }

    #[test]
    fn quiet_period_converts_to_duration() {
        let mut args = minimal_args();
        args.extend(["--quiet-period", "30"]);
        let config = Config::try_parse_from(args).unwrap();

        assert_eq!(config.quiet_period_duration(), Duration::from_secs(30));
    }

    #[test]
    fn missing_jenkins_url_is_rejected() {
        // Only meaningful when JENKINS_URL is not set in the environment.
        if std::env::var_os("JENKINS_URL").is_none() {
            let result =
                Config::try_parse_from(["trigger-proxy", "--jenkins-token", "tok"]);
            assert!(result.is_err());
        }
    }
}
