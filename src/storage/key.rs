//! Object key layout
//!
//! `<family>/<run-id>/<generator-name>_<generation-id>_<timestamp>.wav`

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::generation::ModelVariant;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    prefix: &'static str,
    run_id: String,
    generator_name: &'static str,
    generation_id: Uuid,
    timestamp: DateTime<Utc>,
}

impl ObjectKey {
    /// `message_id` scopes the key to a caller run; without it the
    /// generation id is used as the run id.
    pub fn new(
        variant: ModelVariant,
        message_id: Option<&str>,
        generation_id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            prefix: variant.family(),
            run_id: message_id
                .map(str::to_string)
                .unwrap_or_else(|| generation_id.to_string()),
            generator_name: variant.generator_name(),
            generation_id,
            timestamp,
        }
    }

    pub fn generation_id(&self) -> Uuid {
        self.generation_id
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator_name
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.wav",
            self.generator_name,
            self.generation_id.simple(),
            self.timestamp.format(TIMESTAMP_FORMAT)
        )
    }

    pub fn as_key(&self) -> String {
        format!("{}/{}/{}", self.prefix, self.run_id, self.file_name())
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 5).unwrap()
    }

    #[test]
    fn test_key_with_message_id() {
        let id = Uuid::nil();
        let key = ObjectKey::new(ModelVariant::MusicgenLarge, Some("msg-1"), id, at());
        assert_eq!(
            key.as_key(),
            "musicgen/msg-1/musicgen_00000000000000000000000000000000_20240101_123005.wav"
        );
    }

    #[test]
    fn test_key_without_message_id_uses_generation_id() {
        let id = Uuid::new_v4();
        let key = ObjectKey::new(ModelVariant::AudiogenMedium, None, id, at());
        assert!(key.as_key().starts_with(&format!("audiogen/{id}/audiogen_")));
    }

    #[test]
    fn test_melody_generator_name() {
        let key = ObjectKey::new(ModelVariant::MusicgenMelody, Some("r"), Uuid::nil(), at());
        assert!(key.file_name().starts_with("musicgen_melody_"));
    }

    #[test]
    fn test_same_second_distinct_keys() {
        let a = ObjectKey::new(ModelVariant::MusicgenSmall, Some("r"), Uuid::new_v4(), at());
        let b = ObjectKey::new(ModelVariant::MusicgenSmall, Some("r"), Uuid::new_v4(), at());
        assert_ne!(a.as_key(), b.as_key());
    }
}
