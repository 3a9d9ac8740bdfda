use shopfront_core::Actor;

/// Actor context for a request.
///
/// Resolved once by the boundary middleware; every core operation receives
/// the actor explicitly from here.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor: Actor,
}

impl ActorContext {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> Actor {
        self.actor
    }
}
