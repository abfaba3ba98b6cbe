/// Errors raised while starting model services.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    /// The OS refused to spawn the process.
    #[error("{name}: failed to spawn `{command}`: {source}")]
    Spawn {
        name: String,
        command: String,
        #[source]
        source: std::io::Error,
    },
}
