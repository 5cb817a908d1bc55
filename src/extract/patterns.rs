//! Built-in pattern table for the fact extractor.
//!
//! The slot set here is closed by construction: every `slot` named below
//! appears in [`super::RECOGNIZED_SLOTS`].
#![allow(clippy::expect_used)]

use regex::Regex;
use std::sync::LazyLock;

/// One recognized-slot pattern: a capture-group regex plus the slot it
/// feeds and a base confidence for matches.
pub struct SlotPattern {
    pub slot: &'static str,
    pub pattern: Regex,
    pub confidence: f32,
}

pub static SLOT_PATTERNS: LazyLock<Vec<SlotPattern>> = LazyLock::new(|| {
    vec![
        SlotPattern {
            slot: "name",
            pattern: Regex::new(r"(?:my name is|i'm|i am|call me)\s+([a-z][a-z .'-]{1,40})")
                .expect("static regex: name"),
            confidence: 0.8,
        },
        SlotPattern {
            slot: "employer",
            pattern: Regex::new(
                r"(?:i work (?:at|for)|my employer is|employed (?:at|by))\s+([a-z0-9][a-z0-9 &.,'-]{1,60})",
            )
            .expect("static regex: employer"),
            confidence: 0.75,
        },
        SlotPattern {
            slot: "title",
            pattern: Regex::new(
                r"(?:my title is|i'?m an?|i work as an?)\s+([a-z][a-z /-]{1,50} engineer|[a-z][a-z /-]{1,50} manager|director|intern)",
            )
            .expect("static regex: title"),
            confidence: 0.6,
        },
        SlotPattern {
            slot: "location",
            pattern: Regex::new(
                r"(?:i live in|i'm based in|i am based in|i'm in|located in)\s+([a-z][a-z .'-]{1,50})",
            )
            .expect("static regex: location"),
            confidence: 0.7,
        },
        SlotPattern {
            slot: "programming_years",
            pattern: Regex::new(
                r"(\d{1,2})\s+years?(?:\s+(?:of\s+)?(?:programming|coding|experience))?",
            )
            .expect("static regex: programming_years"),
            confidence: 0.7,
        },
        SlotPattern {
            slot: "first_language",
            pattern: Regex::new(r"(?:my first language is|i grew up speaking)\s+([a-z][a-z -]{1,30})")
                .expect("static regex: first_language"),
            confidence: 0.75,
        },
        SlotPattern {
            slot: "masters_school",
            pattern: Regex::new(
                r"(?:my master'?s (?:is|was) (?:from|at)|i got my master'?s (?:from|at))\s+([a-z][a-z0-9 .,'-]{1,60})",
            )
            .expect("static regex: masters_school"),
            confidence: 0.7,
        },
        SlotPattern {
            slot: "undergrad_school",
            pattern: Regex::new(
                r"(?:my undergrad(?:uate)? (?:is|was) (?:from|at)|i went to)\s+([a-z][a-z0-9 .,'-]{1,60})",
            )
            .expect("static regex: undergrad_school"),
            confidence: 0.65,
        },
        SlotPattern {
            slot: "remote_preference",
            pattern: Regex::new(
                r"i(?:'d| would)? prefer\s+(?:to\s+work\s+|working\s+|being\s+)?(remote(?:ly)?|hybrid|in(?:\s+the)?[\s-]office|on[\s-]?site)",
            )
            .expect("static regex: remote_preference"),
            confidence: 0.7,
        },
        SlotPattern {
            slot: "team_size",
            pattern: Regex::new(r"(?:my team has|team of)\s+(\d{1,4})\s*(?:people|engineers|members)?")
                .expect("static regex: team_size"),
            confidence: 0.7,
        },
        SlotPattern {
            slot: "favorite_color",
            pattern: Regex::new(r"(?:my favorite color is|i like the color)\s+([a-z][a-z -]{1,20})")
                .expect("static regex: favorite_color"),
            confidence: 0.6,
        },
    ]
});
