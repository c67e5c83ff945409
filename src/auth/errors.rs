use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("用户取消了登录")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, AuthError>;
