use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to build {lane} worker pool: {source}")]
    ThreadPool {
        lane: &'static str,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}
