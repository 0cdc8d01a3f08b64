//! Point-cloud transport and map-publishing abstraction.
//!
//! A trait the engine's caller depends on, plus a channel-backed
//! implementation that can be swapped for a simulation harness without
//! touching `elevmap_core`.

use async_trait::async_trait;
use elevmap_core::{FusedMapMessage, PointSample, RawMapMessage};
use tokio::sync::{mpsc, Mutex};

use crate::error::EnvError;

/// One inbound point-cloud batch: points, their parallel per-point
/// variances, and the batch's monotonic timestamp (nanoseconds).
#[derive(Debug, Clone)]
pub struct PointCloudBatch {
    pub points: Vec<PointSample>,
    pub variances: Vec<f32>,
    pub timestamp_ns: u64,
}

/// Source of inbound point-cloud batches. Production: a message-bus
/// subscription. Simulation: a deterministic synthetic generator.
#[async_trait]
pub trait PointCloudSource: Send + Sync {
    /// Returns the next batch, or `Err(EnvError::Closed)` once the source
    /// is exhausted/shut down.
    async fn next_batch(&self) -> Result<PointCloudBatch, EnvError>;
}

/// Sink for outbound raw/fused map messages. Production: a message-bus
/// publish. Simulation: a test probe that records what was published.
#[async_trait]
pub trait MapPublisher: Send + Sync {
    async fn publish_raw(&self, message: RawMapMessage) -> Result<(), EnvError>;
    async fn publish_fused(&self, message: FusedMapMessage) -> Result<(), EnvError>;
}

/// Channel-backed `PointCloudSource`, fed by a producer task (sensor
/// driver or simulation harness) via `ChannelPointCloudSender`.
pub struct ChannelPointCloudSource {
    rx: Mutex<mpsc::Receiver<PointCloudBatch>>,
}

/// The sending half of a [`ChannelPointCloudSource`].
#[derive(Clone)]
pub struct ChannelPointCloudSender {
    tx: mpsc::Sender<PointCloudBatch>,
}

/// Creates a bounded channel pair for feeding point clouds into the
/// engine loop.
pub fn point_cloud_channel(capacity: usize) -> (ChannelPointCloudSender, ChannelPointCloudSource) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        ChannelPointCloudSender { tx },
        ChannelPointCloudSource { rx: Mutex::new(rx) },
    )
}

impl ChannelPointCloudSender {
    pub async fn send(&self, batch: PointCloudBatch) -> Result<(), EnvError> {
        self.tx
            .send(batch)
            .await
            .map_err(|_| EnvError::transport("point cloud channel closed"))
    }
}

#[async_trait]
impl PointCloudSource for ChannelPointCloudSource {
    async fn next_batch(&self) -> Result<PointCloudBatch, EnvError> {
        self.rx.lock().await.recv().await.ok_or(EnvError::Closed)
    }
}

/// Channel-backed `MapPublisher`; the consuming end is typically a test
/// probe or a message-bus bridge task.
pub struct ChannelMapPublisher {
    raw_tx: mpsc::Sender<RawMapMessage>,
    fused_tx: mpsc::Sender<FusedMapMessage>,
}

pub fn map_publish_channel(
    capacity: usize,
) -> (ChannelMapPublisher, mpsc::Receiver<RawMapMessage>, mpsc::Receiver<FusedMapMessage>) {
    let (raw_tx, raw_rx) = mpsc::channel(capacity);
    let (fused_tx, fused_rx) = mpsc::channel(capacity);
    (ChannelMapPublisher { raw_tx, fused_tx }, raw_rx, fused_rx)
}

#[async_trait]
impl MapPublisher for ChannelMapPublisher {
    async fn publish_raw(&self, message: RawMapMessage) -> Result<(), EnvError> {
        self.raw_tx
            .send(message)
            .await
            .map_err(|_| EnvError::transport("raw map channel closed"))
    }

    async fn publish_fused(&self, message: FusedMapMessage) -> Result<(), EnvError> {
        self.fused_tx
            .send(message)
            .await
            .map_err(|_| EnvError::transport("fused map channel closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn point_cloud_round_trips_through_channel() {
        let (tx, rx) = point_cloud_channel(4);
        let batch = PointCloudBatch {
            points: vec![PointSample { x: 0.0, y: 0.0, z: 1.0, rgb: 0 }],
            variances: vec![0.01],
            timestamp_ns: 7,
        };
        tx.send(batch.clone()).await.unwrap();
        let got = rx.next_batch().await.unwrap();
        assert_eq!(got.timestamp_ns, 7);
        assert_eq!(got.points.len(), 1);
    }

    #[tokio::test]
    async fn closed_source_returns_err() {
        let (tx, rx) = point_cloud_channel(1);
        drop(tx);
        assert!(matches!(rx.next_batch().await, Err(EnvError::Closed)));
    }
}
