use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("template file missing: {0}")]
    TemplateMissing(PathBuf),

    #[error("dryrun requested, cannot build or push")]
    ConflictingOptions,

    #[error("missing variables file: {path}: {source}")]
    VarsUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bad variables file: {path}: {message}")]
    VarsMalformed { path: PathBuf, message: String },

    #[error("template error: {file}\nreason: {message}")]
    TemplateRender { file: PathBuf, message: String },

    #[error("cannot write output file: {path}: {source}")]
    OutputUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
