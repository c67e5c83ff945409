use std::{
    io::BufRead,
    sync::{Arc, Mutex},
};

use tokio::sync::{Mutex as TokioMutex, mpsc, oneshot};
use tracing::debug;

/// 交互模式下的控制命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    TogglePause, // p
    Quit,        // q：暂停并退出
    Unknown,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_lowercase().as_str() {
            "p" | "pause" | "resume" => Self::TogglePause,
            "q" | "quit" | "exit" => Self::Quit,
            _ => Self::Unknown,
        }
    }
}

#[derive(Default)]
struct Pending {
    answer: Option<oneshot::Sender<String>>,
    closed: bool, // 输入已结束
}

/// 终端输入分发：正在提问时把下一行交给提问方，否则作为控制命令
#[derive(Clone)]
pub struct Console {
    pending: Arc<Mutex<Pending>>,
    commands: Arc<TokioMutex<mpsc::UnboundedReceiver<String>>>,
}

impl Console {
    /// 从标准输入读取，读取线程在进程退出前一直存在
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self::spawn(rx)
    }

    pub fn spawn(mut lines: mpsc::UnboundedReceiver<String>) -> Self {
        let pending = Arc::new(Mutex::new(Pending::default()));
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let dispatch_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            while let Some(line) = lines.recv().await {
                let waiting = lock(&dispatch_pending).answer.take();

                let line = match waiting {
                    Some(answer) => match answer.send(line) {
                        Ok(()) => continue,
                        // 提问方已放弃，按命令处理
                        Err(line) => line,
                    },
                    None => line,
                };

                debug!("控制命令: {}", line);
                if command_tx.send(line).is_err() {
                    break;
                }
            }

            let mut pending = lock(&dispatch_pending);
            pending.closed = true;
            pending.answer = None;
        });

        Self {
            pending,
            commands: Arc::new(TokioMutex::new(command_rx)),
        }
    }

    /// 打印问题并等待下一行输入；输入结束时返回 None
    pub async fn ask(&self, question: &str) -> Option<String> {
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = lock(&self.pending);
            if pending.closed {
                return None;
            }
            pending.answer = Some(tx);
        }

        print!("{}", question);
        let _ = std::io::Write::flush(&mut std::io::stdout());

        rx.await.ok().map(|line| line.trim().to_string())
    }

    pub async fn next_command(&self) -> Option<ConsoleCommand> {
        let line = self.commands.lock().await.recv().await?;
        Some(ConsoleCommand::parse(&line))
    }
}

fn lock(pending: &Mutex<Pending>) -> std::sync::MutexGuard<'_, Pending> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
