//! Run an encode on its own thread and hand the result back over a channel.
//!
//! The caller keeps an [`EncodeHandle`]. It can `await` the report, block on it,
//! or poll it from an event loop with [`EncodeHandle::try_report`].

use std::thread;

use tracing::{debug, warn};

use crate::compressed_data::EncodedPayload;
use crate::config::EngineConfig;
use crate::error::{HuffmanError, Result};
use crate::huffman_codec::{compress_bytes, compress_text};
use crate::metadata::ImageMeta;
use crate::runtime::channel::{Receiver, TryRecvError, channel};
use crate::runtime::executor::Executor;

#[derive(Debug, Clone)]
pub enum EncodeContent {
    Text(String),
    Image {
        pixels: Vec<u8>,
        meta: Option<ImageMeta>,
    },
}

#[derive(Debug, Clone)]
pub struct EncodeRequest {
    pub id: u64,
    pub content: EncodeContent,
    pub config: EngineConfig,
}

impl EncodeRequest {
    pub fn text(id: u64, text: impl Into<String>) -> Self {
        EncodeRequest {
            id,
            content: EncodeContent::Text(text.into()),
            config: EngineConfig::default(),
        }
    }

    pub fn image(id: u64, pixels: Vec<u8>, meta: Option<ImageMeta>) -> Self {
        EncodeRequest {
            id,
            content: EncodeContent::Image { pixels, meta },
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    fn run(self) -> EncodeResponse {
        let result = match &self.content {
            EncodeContent::Text(text) => compress_text(text, &self.config),
            EncodeContent::Image { pixels, meta } => compress_bytes(pixels, *meta, &self.config),
        };
        EncodeResponse {
            id: self.id,
            result,
        }
    }
}

/// Completion report for one request, success or failure.
#[derive(Debug)]
pub struct EncodeResponse {
    pub id: u64,
    pub result: Result<EncodedPayload>,
}

pub struct EncodeHandle {
    id: u64,
    receiver: Receiver<EncodeResponse>,
    delivered: bool,
}

impl EncodeHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Resolves once the worker reports. A worker that dies first yields `WorkerDisconnected`.
    pub async fn wait(self) -> EncodeResponse {
        match self.receiver.recv().await {
            Ok(response) => response,
            Err(err) => EncodeResponse {
                id: self.id,
                result: Err(err.into()),
            },
        }
    }

    pub fn wait_blocking(self) -> EncodeResponse {
        Executor::new().block_on(self.wait())
    }

    /// The report, if it has arrived. Returns `Some` at most once.
    pub fn try_report(&mut self) -> Option<EncodeResponse> {
        if self.delivered {
            return None;
        }
        let response = match self.receiver.try_recv() {
            Ok(response) => response,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => EncodeResponse {
                id: self.id,
                result: Err(HuffmanError::WorkerDisconnected),
            },
        };
        self.delivered = true;
        Some(response)
    }
}

/// Start `request` on a new thread.
pub fn spawn_encode(request: EncodeRequest) -> Result<EncodeHandle> {
    let id = request.id;
    let (sender, receiver) = channel(1);

    thread::Builder::new()
        .name(format!("huffpack-encode-{id}"))
        .spawn(move || {
            debug!(id, "encode started");
            let response = request.run();
            match &response.result {
                Ok(payload) => debug!(id, bits = payload.bit_count(), "encode finished"),
                Err(err) => warn!(id, error = %err, "encode failed"),
            }
            if Executor::new().block_on(sender.send(response)).is_err() {
                debug!(id, "encode handle dropped before the report");
            }
        })?;

    Ok(EncodeHandle {
        id,
        receiver,
        delivered: false,
    })
}
