//! Per-connection handler: registration, identity, and message routing.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler, plus a writer task that drains the player's outbox into the
//! socket. The flow is:
//!   1. Register with the registry → get identity, arm the cleanup guard
//!   2. Send `NAME:<name>`, then start the writer task
//!   3. Loop: read lines → dispatch `CLICK` / `COLLECT_RESOURCE` / `QUIT`
//!   4. On EOF, read error, or `QUIT`: clean up exactly once and close

use std::sync::Arc;

use quickdraw_protocol::{ClientDirective, PlayerId, ServerDirective};
use quickdraw_transport::{Connection, TcpLineConnection};
use tokio::sync::mpsc;

use crate::server::{GameMode, ServerState};
use crate::QuickdrawError;

/// Drop guard that removes a player from every shared collection when
/// the handler exits — normal return, early `?`, or panic alike.
///
/// All three removals are synchronous and idempotent, so the guard can
/// do its work directly in `Drop` and a disconnect racing an in-flight
/// click/collect still cleans up exactly once.
struct CleanupGuard {
    player_id: PlayerId,
    state: Arc<ServerState>,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        self.state.registry.unregister(self.player_id);
        self.state.scoring.remove_player(self.player_id);
        self.state.resources.remove_player(self.player_id);
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: TcpLineConnection,
    state: Arc<ServerState>,
) -> Result<(), QuickdrawError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (outbox, outbox_rx) = mpsc::unbounded_channel();
    let player = state.registry.register(outbox);
    let guard = CleanupGuard {
        player_id: player.id,
        state: Arc::clone(&state),
    };

    // Identity goes out first, written directly. The writer task starts
    // only afterwards, so a broadcast that lands in the outbox while we
    // are mid-registration cannot overtake the NAME line.
    conn.write_line(&ServerDirective::Name(player.name.clone()).to_line())
        .await?;
    let writer = tokio::spawn(writer_task(Arc::clone(&conn), outbox_rx));

    tracing::info!(%conn_id, player_id = %player.id, name = %player.name, "player connected");

    // --- Message loop ---
    loop {
        let line = match conn.read_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::info!(player_id = %player.id, "connection closed");
                break;
            }
            Err(e) => {
                tracing::debug!(
                    player_id = %player.id,
                    error = %e,
                    "read failed; dropping connection"
                );
                break;
            }
        };

        match line.parse::<ClientDirective>() {
            Ok(ClientDirective::Click) => {
                handle_click(&state, player.id);
            }
            Ok(ClientDirective::CollectResource) => {
                handle_collect(&state, player.id).await;
            }
            Ok(ClientDirective::Quit) => {
                tracing::info!(player_id = %player.id, "player quit");
                break;
            }
            Err(e) => {
                // Protocol violation: log and keep the connection.
                tracing::debug!(
                    player_id = %player.id,
                    error = %e,
                    "ignoring unrecognized line"
                );
            }
        }
    }

    // Tear down in order: stop being a broadcast target, let the writer
    // drain whatever is already queued, then close the socket.
    drop(guard);
    let _ = writer.await;
    let _ = conn.close().await;
    Ok(())
}

/// Routes a `CLICK` into the scoring engine (Reaction mode only).
fn handle_click(state: &Arc<ServerState>, player_id: PlayerId) {
    if state.mode != GameMode::Reaction {
        tracing::debug!(%player_id, "CLICK ignored in contention mode");
        return;
    }

    let msgs = state.scoring.handle_click(player_id);
    let game_over = msgs
        .iter()
        .any(|(_, d)| matches!(d, ServerDirective::GameOver(_)));

    state.registry.dispatch(msgs);

    if game_over {
        if let Some(delay) = state.auto_reset {
            arm_auto_reset(delay, Arc::clone(state));
        }
    }
}

/// Routes a `COLLECT_RESOURCE` into the resource field (Contention mode
/// only) and reports the outcome to the caller. A timeout surfaces as
/// `TRY_AGAIN`, never as a dropped connection.
async fn handle_collect(state: &Arc<ServerState>, player_id: PlayerId) {
    if state.mode != GameMode::Contention {
        tracing::debug!(
            %player_id,
            "COLLECT_RESOURCE ignored in reaction mode"
        );
        return;
    }

    let outcome = state.resources.collect(player_id).await;
    if let Err(e) = state
        .registry
        .send_to(player_id, &outcome.directive().to_line())
    {
        // The player disconnected while collecting; cleanup handles it.
        tracing::debug!(%player_id, error = %e, "collect reply skipped");
    }
}

/// Arms the optional post-game reset timer. The winning click calls
/// this at most once per game, so timers never stack.
fn arm_auto_reset(delay: std::time::Duration, state: Arc<ServerState>) {
    tracing::info!(delay_ms = delay.as_millis() as u64, "auto-reset armed");
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        state.scoring.reset();
    });
}

/// Drains one player's outbox into the socket. Exits when the outbox
/// closes (the player was unregistered) or a write fails (the socket is
/// gone — the read loop will notice on its side).
async fn writer_task(
    conn: Arc<TcpLineConnection>,
    mut outbox_rx: mpsc::UnboundedReceiver<String>,
) {
    while let Some(line) = outbox_rx.recv().await {
        if let Err(e) = conn.write_line(&line).await {
            tracing::debug!(
                conn_id = %conn.id(),
                error = %e,
                "write failed; stopping writer"
            );
            break;
        }
    }
}
