use crate::event_bus::Topic;

// Canonical negotiation topics
pub const TOPIC_TURN: Topic = Topic("negotiation.turn");
pub const TOPIC_STATE: Topic = Topic("negotiation.state");
pub const TOPIC_INVITATIONS: Topic = Topic("negotiation.invitations");
pub const TOPIC_RESPONSE: Topic = Topic("negotiation.response");
pub const TOPIC_ALTERNATIVE: Topic = Topic("negotiation.alternative");
pub const TOPIC_RESOLVED: Topic = Topic("negotiation.resolved");
