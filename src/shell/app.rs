use anyhow::{Context, Result};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::command::{Command, HELP};
use crate::recorder::RecorderExit;
use crate::session::SessionController;

const START_UNAVAILABLE: &str = "Запуск сейчас недоступен";
const FINISH_UNAVAILABLE: &str = "Завершение сейчас недоступно";

/// Run the operator loop until the operator quits.
///
/// `input` carries one command per line (stdin in the binary), `interrupts`
/// one message per Ctrl-C. Commands, recorder exits and timer ticks are all
/// handled here, one at a time. Quitting during a recording stops the recorder
/// first and waits for its exit so the result is still submitted.
pub async fn run<R>(
    mut controller: SessionController,
    mut exits: mpsc::UnboundedReceiver<RecorderExit>,
    input: R,
    mut interrupts: mpsc::UnboundedReceiver<()>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    controller.load_next_task().await;
    controller.notify(HELP);

    let mut quitting = false;

    loop {
        if quitting && !controller.has_active_session() {
            break;
        }

        tokio::select! {
            line = lines.next_line(), if !quitting => {
                match line.context("Failed to read operator input")? {
                    Some(line) => {
                        let was_recording = controller.has_active_session();
                        quitting = handle_command(&mut controller, Command::parse(&line)).await;
                        if !was_recording && controller.timer_active() {
                            // Ticks count whole seconds from the start of the recording
                            ticker.reset();
                        }
                    }
                    None => {
                        info!("Input closed");
                        quitting = true;
                        controller.finish().await;
                    }
                }
            }
            Some(exit) = exits.recv() => {
                controller.on_recorder_exit(exit).await;
            }
            _ = ticker.tick(), if controller.timer_active() => {
                controller.tick();
            }
            Some(()) = interrupts.recv() => {
                if quitting {
                    debug!("Already shutting down");
                } else {
                    info!("Interrupted, shutting down");
                    quitting = true;
                    controller.finish().await;
                }
            }
        }
    }

    info!("Bye");
    Ok(())
}

/// Forward every SIGINT (Ctrl-C) to a channel for [`run`].
///
/// The listener is installed once and lives for the whole process, so an
/// interrupt arriving while the loop is busy is queued rather than lost.
pub fn forward_interrupts() -> Result<mpsc::UnboundedReceiver<()>> {
    let (tx, rx) = mpsc::unbounded_channel();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to install the Ctrl-C handler")?;
        tokio::spawn(async move {
            while sigint.recv().await.is_some() {
                if tx.send(()).is_err() {
                    break;
                }
            }
        });
    }

    #[cfg(not(unix))]
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                break;
            }
            if tx.send(()).is_err() {
                break;
            }
        }
    });

    Ok(rx)
}

/// Returns `true` when the operator asked to quit.
async fn handle_command(controller: &mut SessionController, command: Option<Command>) -> bool {
    let Some(command) = command else {
        return false;
    };

    match command {
        Command::Start => {
            if controller.controls().start_enabled {
                controller.start();
            } else {
                controller.notify(START_UNAVAILABLE);
            }
        }
        Command::Finish => {
            if controller.controls().finish_enabled {
                controller.finish().await;
            } else {
                controller.notify(FINISH_UNAVAILABLE);
            }
        }
        Command::Quit => {
            controller.finish().await;
            return true;
        }
        Command::Help => controller.notify(HELP),
        Command::Unknown(word) => {
            warn!("Unknown command {:?}", word);
            controller.notify(&format!("Неизвестная команда: {}. {}", word, HELP));
        }
    }

    false
}
