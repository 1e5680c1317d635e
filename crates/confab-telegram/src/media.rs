// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File downloads from Telegram servers.

use confab_core::ConfabError;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tracing::debug;

/// Downloads a file from Telegram servers by its file id.
///
/// Uses the Bot API's `getFile` to resolve the file path, then downloads
/// the file content as bytes.
pub async fn download_file(bot: &Bot, file_id: &str) -> Result<Vec<u8>, ConfabError> {
    let file = bot
        .get_file(FileId(file_id.to_string()))
        .await
        .map_err(|e| ConfabError::Transport {
            message: format!("failed to get file info: {e}"),
            source: Some(Box::new(e)),
        })?;

    let mut buf = Vec::new();
    bot.download_file(&file.path, &mut buf)
        .await
        .map_err(|e| ConfabError::Transport {
            message: format!("failed to download file: {e}"),
            source: Some(Box::new(e)),
        })?;

    debug!(file_id = %file_id, size = buf.len(), "downloaded file from Telegram");
    Ok(buf)
}
