//! User state reconciliation.

use super::{Destination, Router};
use crate::error::{RouterError, RouterResult};
use crate::host::{UserState, VoiceServer};
use crate::metrics;
use crate::state::{ServerContext, Session};
use proxvoice_proto::{GameContext, GameIdentity, decode_context, split_context};
use tracing::{debug, info, trace};

impl Router {
    /// Process a connect or state change for one user.
    ///
    /// Nothing is stored when a host call fails, so the next update for the
    /// same session runs the whole decision again. A channel the host no
    /// longer knows is dropped from the topology first.
    pub(super) async fn handle_update(&self, server: &dyn VoiceServer, state: UserState) -> RouterResult {
        let mut guard = self.lock_context(server.id()).await;
        let ctx: &mut ServerContext = &mut guard;

        ctx.topology
            .ensure_initialized(server, &self.settings.world_maps)
            .await?;
        let epoch = ctx.topology.epoch();

        let mut session = Session::new(&state, decode_context(state.context.as_bytes())?);
        session.epoch = epoch;
        let prior = ctx.sessions.snapshot(state.session).cloned();

        // Routed against a hierarchy that has since been rebuilt.
        let stale = prior
            .as_ref()
            .is_some_and(|p| p.linked && p.parsed_context.is_some() && p.epoch != epoch);

        if !stale && !ctx.sessions.needs_update(state.session, &state.identity, &session.context) {
            if let Some(prior) = &prior {
                session.carry_forward(prior);
            }
            trace!(server_id = server.id(), session = state.session, "Plugin data unchanged");
            self.commit(server, ctx, session, prior).await;
            return Ok(());
        }

        let (tag, payload) = split_context(&session.context);
        let linked = self.settings.signature.matches(tag);
        let payload = payload.map(<[u8]>::to_vec).unwrap_or_default();
        session.linked = linked;

        if !linked {
            if prior.as_ref().is_some_and(|p| p.linked) {
                debug!(
                    server_id = server.id(),
                    session = state.session,
                    user = %state.name,
                    "Plugin link lost"
                );
            }
            self.commit(server, ctx, session, prior).await;
            return Ok(());
        }

        if payload.is_empty() || state.identity.is_empty() {
            debug!(
                server_id = server.id(),
                session = state.session,
                user = %state.name,
                has_context = !payload.is_empty(),
                has_identity = !state.identity.is_empty(),
                "Linked without plugin data, not routing"
            );
            self.commit(server, ctx, session, prior).await;
            return Ok(());
        }

        session.parsed_context = match GameContext::parse(&payload) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!(
                    server_id = server.id(),
                    session = state.session,
                    userid = state.userid,
                    user = %state.name,
                    error = %e,
                    "Rejected plugin context"
                );
                metrics::record_validation_failure("context", e.code());
                prior.as_ref().and_then(|p| p.parsed_context.clone())
            }
        };

        session.parsed_identity = match GameIdentity::parse(state.identity.as_bytes()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!(
                    server_id = server.id(),
                    session = state.session,
                    userid = state.userid,
                    user = %state.name,
                    error = %e,
                    "Rejected plugin identity"
                );
                metrics::record_validation_failure("identity", e.code());
                prior.as_ref().and_then(|p| p.parsed_identity.clone())
            }
        };

        let Some(map) = session.parsed_context.as_ref().map(|c| c.map) else {
            debug!(
                server_id = server.id(),
                session = state.session,
                user = %state.name,
                "No usable game context yet"
            );
            self.commit(server, ctx, session, prior).await;
            return Ok(());
        };

        let mut target = ctx.topology.resolve(Some(map))?;
        let mut destination = Destination::Map;
        if Some(target) == ctx.topology.waiting_room() {
            destination = Destination::WaitingRoom;
            if let Some(key) = session.group_key() {
                let (group, created) = match ctx.topology.resolve_or_create_group(server, key).await {
                    Ok(resolved) => resolved,
                    Err(RouterError::Host(e)) => {
                        self.forget_missing(server.id(), ctx, &e);
                        return Err(e.into());
                    }
                    Err(e) => return Err(e),
                };
                if created {
                    metrics::record_group_created();
                }
                target = group;
                destination = Destination::Group;
            }
        }

        if target != state.channel {
            let moved = UserState {
                channel: target,
                ..state.clone()
            };
            if let Err(e) = server.set_state(&moved).await {
                self.forget_missing(server.id(), ctx, &e);
                return Err(e.into());
            }
            session.channel = target;
            metrics::record_move(destination.label());
            info!(
                server_id = server.id(),
                session = state.session,
                user = %state.name,
                map,
                from = %state.channel,
                to = %target,
                destination = destination.label(),
                "User moved"
            );
        }

        self.commit(server, ctx, session, prior).await;
        Ok(())
    }

    /// Store `session` and clean up the channel it left, if any.
    async fn commit(
        &self,
        server: &dyn VoiceServer,
        ctx: &mut ServerContext,
        session: Session,
        prior: Option<Session>,
    ) {
        let left = prior
            .as_ref()
            .map(|p| p.channel)
            .filter(|&channel| channel != session.channel);
        if prior.is_none() {
            metrics::add_tracked_sessions(1);
        }
        ctx.sessions.store(session);

        if let Some(channel) = left {
            self.prune_group(server, ctx, channel).await;
        }
    }
}
