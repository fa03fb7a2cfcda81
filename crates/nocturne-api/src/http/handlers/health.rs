/// GET /health - Liveness probe (no auth, no I/O).
pub async fn health() -> &'static str {
    "ok"
}
