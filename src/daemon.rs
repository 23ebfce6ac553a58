//! Async daemon loop holding the configured colors on the keyboard

use std::error::Error;

use skyloong_sync_core::{Board, BoardError};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::detection::open_board;
use crate::frame::{apply_frame, validate_frame, Frame};

/// Keep the keyboard online with `frame` until Ctrl-C, reconnecting as needed
pub async fn daemon_loop(
    config: Config,
    frame: Frame,
    path: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let options = config.timing.driver_options();
    serve(|| open_board(path.as_deref(), options), &frame, &config).await
}

/// Show `frame` on an open board until Ctrl-C or until the device goes away
pub async fn hold(
    board: &mut dyn Board,
    frame: &Frame,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    tokio::select! {
        res = tokio::signal::ctrl_c() => Ok(res?),
        res = run_connected(board, frame, config) => res,
    }
}

async fn serve<F>(mut connect: F, frame: &Frame, config: &Config) -> Result<(), Box<dyn Error>>
where
    F: FnMut() -> Result<Box<dyn Board>, BoardError>,
{
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut connected = false;

    loop {
        match connect() {
            Ok(mut board) => {
                connected = true;
                info!("connected to {} ({})", board.name(), board.location());

                // a frame the layout rejects is rejected again after every reconnect
                if let Err(e) = validate_frame(board.as_mut(), frame) {
                    release(board);
                    return Err(e);
                }

                let quit = tokio::select! {
                    res = &mut ctrl_c => { res?; true }
                    res = run_connected(board.as_mut(), frame, config) => {
                        if let Err(e) = res {
                            error!("error: {e}");
                        }
                        false
                    }
                };

                release(board);
                if quit {
                    return Ok(());
                }
                info!("reconnecting");
            },
            Err(e) => {
                if connected {
                    warn!("failed to connect: {e}");
                } else {
                    debug!("no keyboard yet: {e}");
                }
                connected = false;
            },
        }

        // Wait before retry
        tokio::select! {
            res = &mut ctrl_c => return Ok(res?),
            _ = tokio::time::sleep(config.timing.retry) => {}
        }
    }
}

fn release(board: Box<dyn Board>) {
    if let Err(e) = board.close() {
        warn!("failed to release keyboard: {e}");
    }
}

/// Push the frame on every refresh tick until a write fails or the device is lost
async fn run_connected(
    board: &mut dyn Board,
    frame: &Frame,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let mut refresh = tokio::time::interval(config.timing.refresh);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut health = tokio::time::interval(config.timing.keepalive);
    health.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = refresh.tick() => apply_frame(board, frame)?,
            _ = health.tick() => board.check()?,
        }
    }
}
