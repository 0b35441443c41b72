//! Prompt composition for image jobs.
//!
//! Character appearance is prepended to whatever the user typed, and
//! TikTok content gets a fixed block of framing specs appended.

use crate::error::CoreError;

/// Negative prompt used when the caller does not supply one.
pub const DEFAULT_NEGATIVE_PROMPT: &str = "ugly, deformed, blurry, low quality";

// ---------------------------------------------------------------------------
// Hook types
// ---------------------------------------------------------------------------

/// Opening-shot hook for TikTok content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookType {
    #[default]
    DirectEyeContact,
    MovementGesture,
    TextOverlayReady,
    ExpressionReaction,
}

impl HookType {
    pub const ALL: [HookType; 4] = [
        HookType::DirectEyeContact,
        HookType::MovementGesture,
        HookType::TextOverlayReady,
        HookType::ExpressionReaction,
    ];

    /// Label as shown to the user, including the parenthesised hint.
    pub fn label(self) -> &'static str {
        match self {
            HookType::DirectEyeContact => "Direct Eye Contact (Stops Scroll)",
            HookType::MovementGesture => "Movement/Gesture (Breaks Filter)",
            HookType::TextOverlayReady => "Text Overlay Ready (Fresh)",
            HookType::ExpressionReaction => "Expression/Reaction (Relatable)",
        }
    }

    /// Label with the parenthesised hint stripped, as used in prompts.
    pub fn description(self) -> &'static str {
        strip_hint(self.label())
    }
}

impl std::str::FromStr for HookType {
    type Err = CoreError;

    /// Accepts either the full label or the bare description, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = strip_hint(s).to_ascii_lowercase();
        HookType::ALL
            .into_iter()
            .find(|hook| hook.description().to_ascii_lowercase() == wanted)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown hook type '{s}'. Must be one of: {}",
                    HookType::ALL.map(HookType::description).join(", ")
                ))
            })
    }
}

fn strip_hint(label: &str) -> &str {
    label.split('(').next().unwrap_or(label).trim()
}

// ---------------------------------------------------------------------------
// Face prominence
// ---------------------------------------------------------------------------

pub const FACE_PROMINENCE_MIN: u8 = 35;
pub const FACE_PROMINENCE_MAX: u8 = 50;
pub const FACE_PROMINENCE_STEP: u8 = 5;
pub const DEFAULT_FACE_PROMINENCE: u8 = 40;

/// Check a face-prominence percentage against the 35..=50 slider (step 5).
pub fn validate_face_prominence(percent: u8) -> Result<(), CoreError> {
    let in_range = (FACE_PROMINENCE_MIN..=FACE_PROMINENCE_MAX).contains(&percent);
    if in_range && (percent - FACE_PROMINENCE_MIN) % FACE_PROMINENCE_STEP == 0 {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Face prominence must be between {FACE_PROMINENCE_MIN} and {FACE_PROMINENCE_MAX} \
             in steps of {FACE_PROMINENCE_STEP}, got {percent}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Prefix the prompt with the character's appearance, if one is set.
pub fn compose_prompt(appearance: Option<&str>, prompt: &str) -> String {
    match appearance.map(str::trim).filter(|a| !a.is_empty()) {
        Some(appearance) => format!("{appearance}, {prompt}"),
        None => prompt.to_string(),
    }
}

/// Append TikTok framing specs to a base prompt.
pub fn tiktok_prompt(base: &str, hook: HookType, face_prominence: u8) -> Result<String, CoreError> {
    validate_face_prominence(face_prominence)?;
    Ok(format!(
        "{base}, vertical 9:16, face {face_prominence}% frame, {}, \
         trending aesthetic, bright lighting, high quality",
        hook.description()
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn appearance_is_prefixed() {
        assert_eq!(
            compose_prompt(Some("red hair, green eyes"), "reading in a cafe"),
            "red hair, green eyes, reading in a cafe"
        );
    }

    #[test]
    fn missing_or_blank_appearance_leaves_prompt() {
        assert_eq!(compose_prompt(None, "at the beach"), "at the beach");
        assert_eq!(compose_prompt(Some("   "), "at the beach"), "at the beach");
    }

    #[test]
    fn tiktok_specs_are_appended() {
        let prompt = tiktok_prompt("holding game controller", HookType::DirectEyeContact, 40).unwrap();
        assert_eq!(
            prompt,
            "holding game controller, vertical 9:16, face 40% frame, Direct Eye Contact, \
             trending aesthetic, bright lighting, high quality"
        );
    }

    #[test]
    fn tiktok_rejects_off_step_prominence() {
        assert_matches!(
            tiktok_prompt("x", HookType::MovementGesture, 42),
            Err(CoreError::Validation(_))
        );
        assert_matches!(validate_face_prominence(55), Err(CoreError::Validation(_)));
        assert!(validate_face_prominence(35).is_ok());
        assert!(validate_face_prominence(50).is_ok());
    }

    #[test]
    fn hook_description_strips_hint() {
        assert_eq!(HookType::MovementGesture.description(), "Movement/Gesture");
        assert_eq!(HookType::TextOverlayReady.description(), "Text Overlay Ready");
    }

    #[test]
    fn hook_parses_label_or_description() {
        assert_eq!(
            "Expression/Reaction (Relatable)".parse::<HookType>().unwrap(),
            HookType::ExpressionReaction
        );
        assert_eq!(
            "direct eye contact".parse::<HookType>().unwrap(),
            HookType::DirectEyeContact
        );
        assert_matches!("jump scare".parse::<HookType>(), Err(CoreError::Validation(_)));
    }
}
