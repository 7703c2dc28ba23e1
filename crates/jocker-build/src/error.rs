use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Docker connection error: {0}")]
    Connection(String),

    #[error("Docker API error ({status_code}): {message}")]
    Api { status_code: u16, message: String },

    #[error("Docker reported an error: {0}")]
    Rejected(String),

    #[error("Docker request timed out")]
    Timeout,

    #[error("Build context error: {0}")]
    Context(#[from] std::io::Error),

    #[error("Registry auth error for {registry}: {message}")]
    Auth { registry: String, message: String },
}

impl EngineError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, EngineError::Timeout)
    }

    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            EngineError::Connection(msg) => format!(
                "Could not reach Docker: {}\n\
                 \n\
                 Check that the daemon is running and that client.base_url\n\
                 in your docker config points at it.",
                msg
            ),
            EngineError::Api {
                status_code: 401 | 403,
                message,
            } => format!(
                "Docker rejected the request: {}\n\
                 \n\
                 Run `docker login` for the target registry and try again.",
                message
            ),
            EngineError::Timeout => "Docker did not answer in time.\n\
                 \n\
                 Raise client.timeout in your docker config for slow builds or pushes."
                .to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<bollard::errors::Error> for EngineError {
    fn from(e: bollard::errors::Error) -> Self {
        match e {
            bollard::errors::Error::RequestTimeoutError => EngineError::Timeout,
            bollard::errors::Error::DockerResponseServerError {
                status_code,
                message,
            } => EngineError::Api {
                status_code,
                message,
            },
            bollard::errors::Error::DockerStreamError { error } => EngineError::Rejected(error),
            other => EngineError::Connection(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
