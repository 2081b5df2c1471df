use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid route '{path}': {source}")]
    Route {
        path: String,
        #[source]
        source: matchit::InsertError,
    },
}
