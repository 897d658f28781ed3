//! Per-item authorization checks and the filtered watch relay.

use platform_events::{watch_channel, WatchEvent, WatchStream};
use platform_rbac::{Actor, AuthorizationRequest, Authorizer, Decision, ResourceType, Verb};
use platform_store::{Payload, Resource};
use std::sync::Arc;
use tracing::{debug, warn};

/// Ask whether `actor` may `get` the named object.
///
/// Used for items already fetched by an allowed collection request, so an
/// authorizer error is logged and treated as a denial rather than failing
/// the whole request.
pub async fn can_get(
    authorizer: &dyn Authorizer,
    actor: &Actor,
    resource: ResourceType,
    name: &str,
) -> bool {
    let request = AuthorizationRequest::new(actor.clone(), Verb::Get, resource).with_name(name);
    match authorizer.authorize(&request).await {
        Ok(Decision::Allow) => true,
        Ok(Decision::Deny(_)) => false,
        Err(e) => {
            warn!(
                actor = %actor,
                resource = %resource,
                name = %name,
                error = %e,
                "Item authorization failed, dropping item"
            );
            false
        }
    }
}

/// Relay `upstream` to a new stream, dropping object events the actor may
/// not `get`.
///
/// Error and bookmark events always pass. Dropping the returned stream
/// stops the relay, which drops `upstream` in turn.
pub fn filter_watch<T: Payload>(
    upstream: WatchStream<Resource<T>>,
    authorizer: Arc<dyn Authorizer>,
    actor: Actor,
    resource: ResourceType,
    buffer: usize,
) -> WatchStream<Resource<T>> {
    let (tx, stream) = watch_channel(buffer);
    let watch_id = stream.id.clone();
    let mut upstream = upstream;

    tokio::spawn(async move {
        let mut dropped: u64 = 0;
        loop {
            let event = tokio::select! {
                _ = tx.closed() => break,
                event = upstream.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            let visible = match &event {
                WatchEvent::Added(obj) | WatchEvent::Modified(obj) | WatchEvent::Deleted(obj) => {
                    can_get(authorizer.as_ref(), &actor, resource, obj.name()).await
                }
                WatchEvent::Error(_) | WatchEvent::Bookmark { .. } => true,
            };
            if !visible {
                dropped += 1;
                continue;
            }

            if !tx.send(event).await {
                break;
            }
        }
        upstream.stop();
        debug!(watch_id = %watch_id, actor = %actor, dropped, "Filtered watch stopped");
    });

    stream
}
