//! Keyword vocabularies for the taxonomy classifier.
//!
//! Entries are single lower-case tokens: anything containing a space or a
//! hyphen could never equal a token produced by [`crate::utils::tokenize`].
//! The bare word "word" is not a text keyword: it shows up in too many
//! unrelated names.

pub const CATEGORY: &[&str] = &[
    "recognition",
    "regression",
    "reconstruction",
    "segmentation",
    "detection",
    "generation",
    "harmonization",
    "translation",
    "classification",
    "adaptation",
    "search",
    "analysis",
    "extraction",
    "retrieval",
    "annotation",
    "generalization",
    "augmentation",
    "anonymization",
    "prediction",
    "correlation",
    "fusion",
    "matching",
    "synthesis",
    "understanding",
    "testing",
    "parsing",
    "identification",
    "transfer",
    "spotting",
    "estimation",
    "resolution",
    "clustering",
    "separation",
    "localization",
    "summarization",
    "recommendation",
    "expansion",
    "labeling",
    "imaging",
    "interpretation",
    "captioning",
    "selection",
    "assessment",
    "registration",
    "forecasting",
    "planning",
    "tracking",
    "inference",
    "grounding",
    "disambiguation",
    "reasoning",
    "comprehension",
    "reading",
    "reduction",
    "completion",
    "compression",
    "decomposition",
    "learning",
    "sampling",
    "verification",
    "animation",
    "interpolation",
    "visualization",
    "propagation",
    "mining",
    "surveillance",
    "diagnosis",
    "ranking",
    "optimization",
    "anomaly",
    "linking",
];

pub const IMAGE: &[&str] = &[
    "2d", "3d", "image", "visual", "depth", "pixel", "voxel", "rgb", "action", "object", "facial",
    "pose", "grayscale", "texture", "pattern", "face", "scene", "imagery", "imaging", "vision",
];

pub const TEXT: &[&str] = &[
    "text",
    "language",
    "lingual",
    "dialogue",
    "dialog",
    "corpus",
    "sentence",
    "reading",
    "news",
    "reviews",
    "grammar",
    "grammatical",
    "nlp",
    "textual",
    "translation",
    "question",
    "answering",
    "conversational",
    "conversation",
    "entity",
    "document",
    "paragraph",
    "paraphrase",
];

pub const AUDIO: &[&str] = &[
    "audio",
    "voice",
    "speech",
    "sound",
    "headphone",
    "music",
    "spoken",
];

pub const VIDEO: &[&str] = &["video", "motion"];

pub const MULTI: &[&str] = &["multi", "cross", "multimodal", "crossmodal"];

/// Framework tags recognised on model records.
pub const FRAMEWORK: &[&str] = &["pytorch", "tf", "tensorboard"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_single_lowercase_tokens() {
        for vocab in [CATEGORY, IMAGE, TEXT, AUDIO, VIDEO, MULTI, FRAMEWORK] {
            for word in vocab {
                assert_eq!(crate::utils::tokenize(word), vec![word.to_string()], "{word}");
            }
        }
    }
}
