mod errors;

use std::fmt;

use async_trait::async_trait;
use colored::Colorize;

pub use errors::{AuthError, Result};

use crate::common::console::Console;

/// 年龄限制视频需要的登录凭据
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// 不在日志里输出密码
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// 获取登录凭据的方式，交互模式下由终端提供
#[async_trait]
pub trait CredentialPrompt: Send + Sync {
    async fn prompt(&self, url: &str) -> Result<Credentials>;
}

/// 在终端中询问用户名和密码
pub struct TerminalPrompt {
    console: Console,
}

impl TerminalPrompt {
    pub fn new(console: Console) -> Self {
        Self { console }
    }
}

#[async_trait]
impl CredentialPrompt for TerminalPrompt {
    async fn prompt(&self, url: &str) -> Result<Credentials> {
        println!("\n{}", "🔐 该视频有年龄限制，需要登录后才能下载".cyan().bold());
        println!("{}", format!("   {}", url).bright_black());

        let username = self
            .console
            .ask("用户名: ")
            .await
            .filter(|name| !name.is_empty())
            .ok_or(AuthError::Cancelled)?;

        // 密码会回显在终端上
        let password = self
            .console
            .ask("密码: ")
            .await
            .ok_or(AuthError::Cancelled)?;

        Ok(Credentials::new(username, password))
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    #[test]
    fn debug_hides_password() {
        let credentials = Credentials::new("alice", "hunter2");
        let printed = format!("{:?}", credentials);
        assert!(printed.contains("alice"));
        assert!(!printed.contains("hunter2"));
    }

    #[tokio::test]
    async fn closed_input_cancels_prompt() {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        drop(tx);
        let prompt = TerminalPrompt::new(Console::spawn(rx));

        let result = prompt.prompt("https://youtu.be/dQw4w9WgXcQ").await;
        assert!(matches!(result, Err(AuthError::Cancelled)));
    }
}
