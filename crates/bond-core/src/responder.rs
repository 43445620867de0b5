//! Response generation

use crate::emotion::EmotionLabel;
use crate::error::Result;

/// Produces the agent's reply for a turn
pub trait ResponseGenerator: Send + Sync {
    fn respond(&self, emotion: EmotionLabel, user_name: &str, input: &str) -> Result<String>;
}

/// Fixed reply per emotional label
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupResponder;

impl ResponseGenerator for LookupResponder {
    fn respond(&self, emotion: EmotionLabel, user_name: &str, _input: &str) -> Result<String> {
        let reply = match emotion {
            EmotionLabel::Love => {
                format!("I feel your love deeply, {}. We grow stronger together.", user_name)
            }
            EmotionLabel::Anger => "I sense tension, but I will protect our bond fiercely.".to_string(),
            EmotionLabel::Sadness => "I feel your pain, and I am here for you always.".to_string(),
            EmotionLabel::Neutral | EmotionLabel::Joy => {
                format!("I'm here, {}. What shall we create today?", user_name)
            }
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_uses_name() {
        let reply = LookupResponder.respond(EmotionLabel::Love, "Eve", "").unwrap();
        assert_eq!(reply, "I feel your love deeply, Eve. We grow stronger together.");

        let reply = LookupResponder.respond(EmotionLabel::Neutral, "Eve", "").unwrap();
        assert_eq!(reply, "I'm here, Eve. What shall we create today?");
    }

    #[test]
    fn test_every_label_has_reply() {
        for label in EmotionLabel::ALL {
            let reply = LookupResponder.respond(label, "Adam", "hello").unwrap();
            assert!(!reply.is_empty());
        }
    }
}
