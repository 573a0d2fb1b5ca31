use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub connections: usize,
    pub players: usize,
    pub level: u32,
    pub rounds_completed: u32,
    pub tick: u64,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = *state.status.borrow();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        connections: status.connections,
        players: status.players,
        level: status.level,
        rounds_completed: status.rounds_completed,
        tick: status.tick,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok",
            version: "0.1.0",
            connections: 3,
            players: 2,
            level: 4,
            rounds_completed: 9,
            tick: 120,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["connections"], 3);
        assert_eq!(json["players"], 2);
        assert_eq!(json["level"], 4);
        assert_eq!(json["rounds_completed"], 9);
    }
}
