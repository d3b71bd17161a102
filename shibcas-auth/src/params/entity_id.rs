use super::ParameterBuilder;
use crate::Conversation;
use crate::conversation::ENTITY_ID_PARAM;
use url::form_urlencoded;

/// Sends the relying party's entity ID to CAS as `entityId`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityIdParameterBuilder;

impl EntityIdParameterBuilder {
    pub const KIND: &'static str = "entity-id";
}

impl ParameterBuilder for EntityIdParameterBuilder {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn build(&self, conversation: &Conversation) -> String {
        match &conversation.relying_party {
            Some(entity_id) => {
                let encoded: String = form_urlencoded::byte_serialize(entity_id.as_bytes()).collect();
                format!("&{}={}", ENTITY_ID_PARAM, encoded)
            }
            None => String::new(),
        }
    }
}
