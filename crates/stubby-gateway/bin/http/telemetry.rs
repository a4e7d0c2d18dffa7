use crate::cli::Environment;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber.
///
/// `local` logs human-readable text at debug level, `dev` logs JSON at
/// debug level and `prod` logs JSON at info level. `RUST_LOG` overrides the
/// level in every environment.
pub fn init(env: Environment) -> anyhow::Result<()> {
    let default_level = match env {
        Environment::Local | Environment::Dev => "debug",
        Environment::Prod => "info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match env {
        Environment::Local => builder.try_init(),
        Environment::Dev | Environment::Prod => builder.json().try_init(),
    };

    installed.map_err(|err| anyhow::anyhow!(err))
}
