// Events emitted by the navigation subsystem.
//
// Navigation output is data, not callbacks: handlers and the tick loop push
// `NavEvent`s which `Navigator::tick()` returns for the host to route
// (notify gameplay systems, forward to clients, append to logs). The
// deferred completion of `request_navigation` is the `PathReady` event
// carrying the `RequestId` handed back at enqueue time.
//
// See also: `navigator.rs` for where each variant is produced,
// `pathfinding.rs` for the `PathResult` payload.

use crate::pathfinding::PathResult;
use crate::types::{AgentId, GridBounds, RequestId, Vec3};
use serde::{Deserialize, Serialize};

/// An event produced by the navigation subsystem.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NavEvent {
    /// The grid finished (re)building.
    GridReady {
        node_count: usize,
        build_ms: u64,
        bounds: GridBounds,
    },
    /// A grid build was requested before any terrain bounds arrived; the
    /// subsystem continues with an empty grid and requests fail off-grid.
    GridBuildSkipped,
    /// A tracked agent stopped making progress. `fallback` is the last
    /// position where real movement was observed — a recovery teleport or
    /// re-route target for the host.
    AgentUnstuck {
        agent_id: AgentId,
        position: Vec3,
        fallback: Vec3,
    },
    /// A pathfinding request completed (successfully or not).
    PathReady {
        request_id: RequestId,
        agent_id: AgentId,
        result: PathResult,
    },
}
