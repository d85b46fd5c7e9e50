//! ジョブコンソールの表示

use colored::Colorize;
use wadeploy_core::{OutputKind, ProgressEvent, ProgressLine, ProgressReceiver};

/// ジョブの行を届いた順に表示する。ジョブの終了コードを返し、
/// 終了コードなしでストリームが終わった場合は `None`
pub async fn print_progress(mut receiver: ProgressReceiver) -> Option<i32> {
    while let Some(event) = receiver.recv().await {
        match event {
            ProgressEvent::Line(line) => match line.kind {
                OutputKind::System => println!("{}", format_line(&line)),
                OutputKind::Error => eprintln!("{}", format_line(&line)),
            },
            ProgressEvent::Terminated { exit_code } => return Some(exit_code),
        }
    }
    None
}

pub fn format_line(line: &ProgressLine) -> String {
    let time = line.timestamp.format("%H:%M:%S").to_string();
    match line.kind {
        OutputKind::System => format!("{} {}", time.dimmed(), line.text),
        OutputKind::Error => format!("{} {}", time.dimmed(), line.text.red()),
    }
}
