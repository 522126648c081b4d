//! Fixed word lists and name tables used by the extractors

use aho_corasick::AhoCorasick;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Vocabulary over-represented in LLM output
pub const AI_VOCABULARY: &[&str] = &[
    "delve", "tapestry", "landscape", "multifaceted", "utilize",
    "leverage", "paradigm", "holistic", "synergy", "ecosystem",
    "streamline", "facilitate", "comprehensive", "robust", "innovative",
    "cutting-edge", "groundbreaking", "pivotal", "nuanced", "intricate",
    "furthermore", "moreover", "consequently", "nevertheless", "notwithstanding",
    "aforementioned", "henceforth", "thereby", "thereof", "wherein",
    "encompasses", "underscores", "underpin", "realm", "myriad",
    "plethora", "paramount", "indispensable", "imperative", "meticulous",
];

/// Discourse connectives counted for transition density
pub const TRANSITION_WORDS: &[&str] = &[
    "however", "moreover", "furthermore", "additionally", "consequently",
    "nevertheless", "therefore", "specifically", "essentially", "ultimately",
    "meanwhile", "subsequently", "accordingly", "conversely", "similarly",
    "notably", "importantly", "significantly", "interestingly", "surprisingly",
];

/// Generator tool names looked for in filenames, in priority order
pub const GENERATOR_KEYWORDS: &[&str] = &[
    "midjourney", "dalle", "dall-e", "stable-diffusion", "stablediffusion",
    "sd_xl", "sdxl", "ai_generated", "aigenerated", "generated",
    "dreamstudio", "firefly", "ideogram", "leonardo", "flux",
    "comfyui", "automatic1111",
];

/// Editing/generation tools that show up in the EXIF `Software` tag
pub const SOFTWARE_MARKERS: &[&str] = &["photoshop", "stable", "midjourney", "dall"];

/// Default output sizes of popular image generators
pub const GENERATOR_RESOLUTIONS: &[(u32, u32)] = &[
    (512, 512),
    (768, 768),
    (1024, 1024),
    (1024, 1792),
    (1792, 1024),
];

fn ai_vocabulary() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| AI_VOCABULARY.iter().copied().collect())
}

fn transition_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| TRANSITION_WORDS.iter().copied().collect())
}

fn generator_matcher() -> Option<&'static AhoCorasick> {
    static MATCHER: OnceLock<Option<AhoCorasick>> = OnceLock::new();
    MATCHER
        .get_or_init(|| {
            AhoCorasick::builder()
                .ascii_case_insensitive(true)
                .build(GENERATOR_KEYWORDS)
                .map_err(|e| tracing::error!("Failed to build generator keyword matcher: {}", e))
                .ok()
        })
        .as_ref()
}

/// Whether the normalized word is in the AI vocabulary
pub fn is_ai_vocabulary(word: &str) -> bool {
    ai_vocabulary().contains(word)
}

/// Whether the normalized word is a transition word
pub fn is_transition_word(word: &str) -> bool {
    transition_words().contains(word)
}

/// First generator keyword (in [`GENERATOR_KEYWORDS`] order) contained in `filename`
pub fn find_generator_keyword(filename: &str) -> Option<&'static str> {
    let matcher = generator_matcher()?;
    matcher
        .find_overlapping_iter(filename)
        .map(|m| m.pattern().as_usize())
        .min()
        .map(|idx| GENERATOR_KEYWORDS[idx])
}

/// Whether the software tag names a known editing/generation tool
pub fn is_generation_software(software: &str) -> bool {
    let lower = software.to_lowercase();
    SOFTWARE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Whether `(width, height)` is a canonical generator output size
pub fn is_generator_resolution(width: u32, height: u32) -> bool {
    GENERATOR_RESOLUTIONS.contains(&(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_keyword_priority() {
        // "generated" occurs earlier in the string, but "midjourney" ranks first.
        assert_eq!(
            find_generator_keyword("generated_by_MidJourney_v6.png"),
            Some("midjourney")
        );
        assert_eq!(find_generator_keyword("SDXL-output.webp"), Some("sdxl"));
        assert_eq!(find_generator_keyword("holiday_photo.jpg"), None);
    }

    #[test]
    fn test_word_sets() {
        assert!(is_ai_vocabulary("delve"));
        assert!(is_ai_vocabulary("cutting-edge"));
        assert!(!is_ai_vocabulary("Delve"));
        assert!(is_transition_word("however"));
        assert!(!is_transition_word("but"));
    }

    #[test]
    fn test_software_markers() {
        assert!(is_generation_software("Adobe Photoshop 25.0"));
        assert!(is_generation_software("Stable Diffusion XL"));
        assert!(!is_generation_software("GIMP 2.10"));
    }

    #[test]
    fn test_generator_resolutions() {
        assert!(is_generator_resolution(1024, 1792));
        assert!(!is_generator_resolution(1792, 1792));
    }
}
