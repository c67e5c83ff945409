use indicatif::{ProgressBar, ProgressStyle};
use tokio::{sync::watch, task::JoinHandle};

use crate::common::utils::FormatTool;

use super::models::DownloadProgress;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {bytes} {msg}";

/// 进度的文字描述：百分比、已下载、剩余
pub fn describe(progress: &DownloadProgress) -> String {
    let downloaded = FormatTool::format_mb(progress.downloaded);
    match (progress.percent(), progress.total, progress.remaining()) {
        (Some(percent), Some(total), Some(remaining)) => format!(
            "{:.2}% | {} / {} | 剩余: {}",
            percent,
            downloaded,
            FormatTool::format_mb(total),
            FormatTool::format_mb(remaining)
        ),
        _ => format!("未知% | {} / 未知 | 剩余: 未知", downloaded),
    }
}

/// 终端进度条，在独立的任务中消费进度通道
pub struct TerminalProgress {
    bar: ProgressBar,
    rx: watch::Receiver<DownloadProgress>,
    handle: JoinHandle<()>,
}

impl TerminalProgress {
    pub fn attach(rx: watch::Receiver<DownloadProgress>, title: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::spinner_style());
        bar.set_message(title.to_string());

        let mut worker_rx = rx.clone();
        let worker_bar = bar.clone();
        let handle = tokio::spawn(async move {
            while worker_rx.changed().await.is_ok() {
                let progress = *worker_rx.borrow_and_update();
                Self::render(&worker_bar, &progress);
            }
        });

        Self { bar, rx, handle }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(BAR_TEMPLATE)
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn render(bar: &ProgressBar, progress: &DownloadProgress) {
        match progress.total {
            Some(total) if total > 0 => {
                if bar.length() != Some(total) {
                    bar.set_style(Self::bar_style());
                    bar.set_length(total);
                }
            }
            _ => bar.tick(),
        }
        bar.set_position(progress.downloaded);
    }

    /// 停止刷新并输出最终状态
    pub fn finish(self, message: impl Into<String>) {
        self.handle.abort();
        let progress = *self.rx.borrow();
        Self::render(&self.bar, &progress);
        self.bar
            .finish_with_message(format!("{} ({})", message.into(), describe(&progress)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_known_total() {
        let progress = DownloadProgress::new(5 * 1024 * 1024, Some(20 * 1024 * 1024));
        assert_eq!(
            describe(&progress),
            "25.00% | 5.00 MB / 20.00 MB | 剩余: 15.00 MB"
        );
    }

    #[test]
    fn describes_unknown_total() {
        let progress = DownloadProgress::new(1024 * 1024, None);
        assert_eq!(describe(&progress), "未知% | 1.00 MB / 未知 | 剩余: 未知");

        let zero = DownloadProgress::new(0, Some(0));
        assert!(describe(&zero).starts_with("未知%"));
    }
}
