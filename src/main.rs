use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, bail};
use clap::Parser;
use colored::Colorize;
use tracing::{debug, info, warn};

use tube_downloader::{
    auth::TerminalPrompt,
    cli::Cli,
    common::{
        client::client::TubeClient,
        console::{Console, ConsoleCommand},
        logger::PrettyLogger,
        utils::FormatTool,
    },
    downloader::{
        ChunkedDownloader, DownloadController, DownloadPipeline, PipelineConfig, PipelineReport,
        pipeline::{EntryResult, PlaylistReport, VideoReport},
    },
    log_error, log_info, log_step, log_success, log_warning,
    parser::{VideoQuality, YtDlpResolver},
};

/// 交互模式下补全缺少的参数
async fn fill_missing(
    console: &Console,
    args: &Cli,
    config: &mut PipelineConfig,
) -> anyhow::Result<String> {
    let url = match &args.url {
        Some(url) => url.clone(),
        None => console
            .ask("请输入视频或播放列表链接: ")
            .await
            .filter(|url| !url.is_empty())
            .context("没有输入链接")?,
    };

    if args.output_dir.is_none() {
        if let Some(dir) = console
            .ask("保存目录 (回车使用当前目录): ")
            .await
            .filter(|dir| !dir.is_empty())
        {
            config.destination_dir = PathBuf::from(dir);
        }
    }

    if args.quality.is_none() {
        let labels: Vec<String> = VideoQuality::ALL.iter().map(|q| q.label()).collect();
        let question = format!("清晰度 [{}] (回车使用 {}): ", labels.join("/"), config.quality);
        if let Some(answer) = console.ask(&question).await.filter(|a| !a.is_empty()) {
            match answer.parse::<VideoQuality>() {
                Ok(quality) => config.quality = quality,
                Err(e) => log_warning!("{}，使用默认清晰度 {}", e, config.quality),
            }
        }
    }

    Ok(url)
}

/// 处理终端控制命令：p 暂停/继续，q 暂停并退出
fn spawn_control_loop(console: Console, controller: DownloadController) {
    tokio::spawn(async move {
        while let Some(command) = console.next_command().await {
            match command {
                ConsoleCommand::TogglePause => {
                    if controller.toggle_pause() {
                        log_warning!("已暂停，当前文件保留已下载的部分");
                    } else {
                        log_info!("已清除暂停标志，新的下载将继续进行");
                    }
                }
                ConsoleCommand::Quit => {
                    controller.pause();
                    log_warning!("正在停止下载并退出...");
                    break;
                }
                ConsoleCommand::Unknown => {
                    debug!("忽略未知命令");
                }
            }
        }
    });
}

/// Ctrl-C 设置暂停标志，再次按下时直接退出
fn spawn_interrupt_handler(controller: DownloadController) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        controller.pause();
        log_warning!("收到中断信号，下载将在当前块写完后停止 (再次按 Ctrl-C 强制退出)");

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

fn print_video_report(report: &VideoReport) {
    let path = report.path.display().to_string();
    if report.outcome.is_complete() {
        PrettyLogger::completion_summary(vec![
            format!("标题: {}", report.title),
            format!("文件: {}", path),
            format!("大小: {}", FormatTool::format_size(report.outcome.bytes())),
        ]);
    } else {
        log_warning!(
            "下载已暂停，部分文件已保留 ({})",
            FormatTool::format_size(report.outcome.bytes())
        );
        PrettyLogger::file_info("部分文件", path);
    }
}

fn print_playlist_report(report: &PlaylistReport) {
    PrettyLogger::separator();
    PrettyLogger::title(&report.title);
    for entry in &report.entries {
        match &entry.result {
            EntryResult::Downloaded(video) if video.outcome.is_complete() => {
                println!("  {:>3}. {} {}", entry.index, "✓".green(), video.path.display());
            }
            EntryResult::Downloaded(video) => {
                let path = video.path.display();
                println!("  {:>3}. {} {} (已暂停)", entry.index, "⏸".yellow(), path);
            }
            EntryResult::Failed(message) => {
                println!("  {:>3}. {} {}: {}", entry.index, "✗".red(), entry.url, message);
            }
            EntryResult::Skipped => {
                let marker = "-".bright_black();
                println!("  {:>3}. {} {} (已跳过)", entry.index, marker, entry.url);
            }
        }
    }
    PrettyLogger::separator();

    PrettyLogger::file_info("保存目录", report.directory.display().to_string());
    let summary = format!(
        "共 {} 个视频，完成 {} 个，失败 {} 个",
        report.entries.len(),
        report.completed(),
        report.failed()
    );
    if report.failed() == 0 && !report.was_paused() {
        log_success!("{}", summary);
    } else {
        log_warning!("{}", summary);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 解析命令行参数
    let args = Cli::parse();

    // 初始化日志
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let console = args.interactive.then(Console::stdin);
    let mut config = args.to_config();

    let url = match (&console, &args.url) {
        (Some(console), _) => fill_missing(console, &args, &mut config).await?,
        (None, Some(url)) => url.clone(),
        (None, None) => bail!("缺少 --url 参数 (或使用 --interactive 交互输入)"),
    };
    debug!("下载配置: {:?}", config);

    // 组装下载组件
    let client = TubeClient::new().context("创建 HTTP 客户端失败")?;
    let controller = DownloadController::new(ChunkedDownloader::new(Arc::new(client)));
    let resolver = Arc::new(YtDlpResolver::new(&args.yt_dlp));

    let mut pipeline = DownloadPipeline::new(resolver, controller.clone(), config);
    if let Some(console) = console {
        pipeline = pipeline.with_prompt(Arc::new(TerminalPrompt::new(console.clone())));
        PrettyLogger::control_hint();
        spawn_control_loop(console, controller.clone());
    }
    spawn_interrupt_handler(controller);

    log_step!("开始解析: {}", url);
    info!("保存目录: {:?}", pipeline.config().destination_dir);

    match pipeline.run(&url).await {
        Ok(PipelineReport::Video(report)) => print_video_report(&report),
        Ok(PipelineReport::Playlist(report)) => print_playlist_report(&report),
        Err(e) => {
            log_error!("下载失败: {}", e);
            warn!("请检查链接是否正确，以及 yt-dlp 是否已安装");
            return Err(e.into());
        }
    }

    Ok(())
}
