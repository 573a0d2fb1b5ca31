use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::{mpsc, watch};

use neonmaze_core::entities::PlayerId;

use crate::config::ServerConfig;
use crate::game_loop::{GameCommand, LoopStatus};

#[derive(Clone)]
pub struct AppState {
    pub commands: mpsc::UnboundedSender<GameCommand>,
    pub status: watch::Receiver<LoopStatus>,
    pub ws_connection_count: Arc<AtomicUsize>,
    pub next_player_id: Arc<AtomicU64>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        commands: mpsc::UnboundedSender<GameCommand>,
        status: watch::Receiver<LoopStatus>,
    ) -> Self {
        Self {
            commands,
            status,
            ws_connection_count: Arc::new(AtomicUsize::new(0)),
            next_player_id: Arc::new(AtomicU64::new(1)),
            config: Arc::new(config),
        }
    }

    /// Hand out a fresh player id. Ids are never reused within a process.
    pub fn alloc_player_id(&self) -> PlayerId {
        self.next_player_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Holds one slot of the connection cap; the slot frees on drop.
#[derive(Debug)]
pub struct ConnectionGuard {
    count: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    /// Take a slot if fewer than `max` are held.
    pub fn try_acquire(count: Arc<AtomicUsize>, max: usize) -> Option<Self> {
        count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < max).then_some(current + 1)
            })
            .ok()?;
        Some(Self { count })
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::AcqRel);
    }
}
