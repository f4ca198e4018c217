//! CLI runner - executes commands

use crate::auth::{
    CredentialResolver, FileTokenStore, NoCredentials, StaticCredential, StoreResolver,
};
use crate::cli::commands::{Cli, Commands};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{ClassifiedError, Dispatcher, OutboundRequest, RetryPolicy};
use crate::notify::{NotificationGate, Notifier};
use crate::types::{JsonValue, Method};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Prints notifications to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn show(&self, key: &str, error: &ClassifiedError) {
        eprintln!("[{key}] {}", error.message);
    }

    fn session_expired(&self, error: &ClassifiedError) {
        eprintln!("Session expired ({}): sign in again", error.code);
    }
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::Config => self.print_config(&config),
            Commands::Request {
                method,
                path,
                query,
                headers,
                data,
                max_retries,
                retry_delay_ms,
                quiet,
            } => {
                let mut request = OutboundRequest::new(*method, path.clone());
                for (key, value) in query {
                    request = request.query(key, value);
                }
                for (key, value) in headers {
                    request = request.header(key, value);
                }
                if let Some(data) = data {
                    request = request.json(serde_json::from_str(data)?);
                }
                if *quiet {
                    request = request.skip_error_notification();
                }

                let mut policy = config.retry_policy();
                if let Some(retries) = max_retries {
                    policy.max_retries = *retries;
                }
                if let Some(ms) = retry_delay_ms {
                    policy.retry_delay = Duration::from_millis(*ms);
                }

                self.request(&config, request, policy).await
            }
        }
    }

    /// Load the config file if given, else the environment
    pub fn load_config(&self) -> Result<ClientConfig> {
        match &self.cli.config {
            Some(path) => ClientConfig::from_file(path),
            None => ClientConfig::from_env(),
        }
    }

    fn resolver(&self, config: &ClientConfig) -> Arc<dyn CredentialResolver> {
        if let Some(token) = &self.cli.token {
            return Arc::new(StaticCredential::new(token.clone()));
        }
        match &config.token_file {
            Some(path) => Arc::new(StoreResolver::new(FileTokenStore::new(path))),
            None => Arc::new(NoCredentials),
        }
    }

    async fn request(
        &self,
        config: &ClientConfig,
        request: OutboundRequest,
        policy: RetryPolicy,
    ) -> Result<()> {
        if request.body.is_some() && request.method == Method::GET {
            return Err(Error::config("GET requests cannot carry a body"));
        }

        let dispatcher = Dispatcher::new(config, self.resolver(config))?;
        let skip_notification = request.skip_error_notification;

        let (handle, fut) = dispatcher.dispatch::<JsonValue>(request, Some(policy));
        let interrupt = handle.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupt.cancel(Some("interrupted"));
            }
        });

        let result = fut.await;
        watcher.abort();

        match result {
            Ok(body) => {
                println!("{}", serde_json::to_string_pretty(&body)?);
                Ok(())
            }
            Err(err) => {
                NotificationGate::default().report(&err, skip_notification, &StderrNotifier);
                if self.cli.verbose {
                    eprintln!("{}", serde_json::to_string_pretty(&err)?);
                }
                Err(err.into())
            }
        }
    }

    fn print_config(&self, config: &ClientConfig) -> Result<()> {
        let summary = json!({
            "base_url": config.base_url.as_str(),
            "timeout_ms": config.timeout.as_millis() as u64,
            "max_retries": config.max_retries,
            "retry_delay_ms": config.retry_delay.as_millis() as u64,
            "user_agent": config.user_agent,
            "default_headers": config.default_headers,
            "token_file": config.token_file,
            "token_override": self.cli.token.is_some(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        Ok(())
    }
}
