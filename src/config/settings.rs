//! # Configuration Settings
//!
//! Defines the configuration structure for the meshlint analyzer.

use crate::errors::{MeshlintError, Result};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Reserved destination host that addresses every service in the mesh.
pub const MESH_WIDE_HOST: &str = "*.local";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Analyzer configuration
    #[validate(nested)]
    pub analyzer: AnalyzerConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(MeshlintError::from)?;
        self.validate_custom()
    }

    fn validate_custom(&self) -> Result<()> {
        if self.analyzer.root_namespace.contains('.') {
            return Err(MeshlintError::validation_field(
                "Root namespace must be a single DNS label",
                "analyzer.root_namespace",
            ));
        }

        Ok(())
    }
}

/// Mesh-wide settings every checker is handed explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Suffix used to qualify short service names (`reviews.bookinfo.<identity_domain>`)
    #[validate(
        length(min = 1, message = "Identity domain cannot be empty"),
        custom(function = "validate_dns_suffix")
    )]
    pub identity_domain: String,

    /// Namespace whose peer authentications apply mesh-wide
    #[validate(length(min = 1, max = 63, message = "Root namespace must be 1-63 characters"))]
    pub root_namespace: String,

    /// The mesh negotiates mTLS automatically when no destination rule says otherwise
    pub auto_mtls_enabled: bool,

    /// Report PERMISSIVE peer authentication as enabled
    pub allow_permissive: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            identity_domain: "svc.cluster.local".to_string(),
            root_namespace: "istio-system".to_string(),
            auto_mtls_enabled: true,
            allow_permissive: false,
        }
    }
}

impl AnalyzerConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let identity_domain = std::env::var("MESHLINT_IDENTITY_DOMAIN")
            .unwrap_or(defaults.identity_domain);
        let root_namespace = std::env::var("MESHLINT_ROOT_NAMESPACE")
            .unwrap_or(defaults.root_namespace);
        let auto_mtls_enabled = env_flag("MESHLINT_AUTO_MTLS", defaults.auto_mtls_enabled)?;
        let allow_permissive = env_flag("MESHLINT_ALLOW_PERMISSIVE", defaults.allow_permissive)?;

        let config = Self {
            identity_domain,
            root_namespace,
            auto_mtls_enabled,
            allow_permissive,
        };
        Validate::validate(&config).map_err(MeshlintError::from)?;
        Ok(config)
    }

    /// Host a destination rule uses to address every service of `namespace`
    pub fn namespace_wide_host(&self, namespace: &str) -> String {
        format!("*.{}.{}", namespace, self.identity_domain)
    }

    /// Whether `namespace` holds the mesh-wide policies
    pub fn is_root_namespace(&self, namespace: &str) -> bool {
        self.root_namespace == namespace
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is not set
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

fn env_flag(name: &str, default: bool) -> Result<bool> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|e| MeshlintError::config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

fn validate_dns_suffix(domain: &str) -> std::result::Result<(), ValidationError> {
    let well_formed = !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.split('.').all(|label| {
            !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });

    if well_formed {
        Ok(())
    } else {
        let mut error = ValidationError::new("dns_suffix");
        error.message = Some("Identity domain must be a dot-separated DNS suffix".into());
        Err(error)
    }
}
