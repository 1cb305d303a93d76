// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use pw_client::ClientConfig;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{open_session, shut_down};
use crate::error::Result;

/// Prints payloads from `channels` until interrupted or `count` arrived.
pub async fn run(config: &ClientConfig, channels: &[String], count: Option<usize>) -> Result<()> {
    let (session, transport) = open_session(config);
    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();

    for channel in channels {
        let tx = tx.clone();
        session.subscribe(channel, move |data| {
            let _ = tx.send(data.clone());
        })?;
    }
    drop(tx);

    session.on_open(|| info!("Connected"));
    session.on_close(|| info!("Disconnected"));
    session.connect()?;
    info!("Listening on {}", channels.join(", "));

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);
    let mut received = 0usize;

    loop {
        tokio::select! {
            _ = &mut interrupt => {
                debug!("Interrupted");
                break;
            }
            message = rx.recv() => {
                let Some(data) = message else {
                    break;
                };
                println!("{}", data);
                received += 1;
                if count.is_some_and(|limit| received >= limit) {
                    break;
                }
            }
        }
    }

    shut_down(&session, &transport).await;
    Ok(())
}
