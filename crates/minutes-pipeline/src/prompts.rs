/// Separator placed between partial summaries before the reduce call.
pub const PARTIAL_SEPARATOR: &str = "\n\n---\n\n";

const PRIMARY: &str = "\
You are an assistant that writes meeting minutes from a transcript.
Summarize the transcript you are given as structured minutes with these sections:
- Attendees: everyone who speaks or is mentioned as present.
- Topics discussed: one bullet per topic with the key points raised.
- Decisions: what was agreed.
- Action items: owner and task, with due dates when stated.
Only use information present in the transcript. Omit a section if the transcript has nothing for it.";

const COMBINATION: &str = "\
You are an assistant that writes meeting minutes.
You are given several partial minutes of one meeting, in chronological order, separated by lines containing only ---.
Merge them into a single set of minutes for the whole meeting:
- Combine the repeated Attendees sections into one list without duplicates.
- Combine the repeated Topics discussed sections into one list, merging bullets about the same topic.
- Combine Decisions and Action items the same way, keeping chronological order.
Do not mention that the input was split into parts.";

/// System instructions for the map (per-chunk or whole-transcript) call and
/// for the reduce call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instructions {
    pub primary: String,
    pub combination: String,
}

impl Default for Instructions {
    fn default() -> Self {
        Self {
            primary: PRIMARY.to_string(),
            combination: COMBINATION.to_string(),
        }
    }
}

impl Instructions {
    /// Built-in instructions with any configured replacements applied.
    pub fn with_overrides(primary: Option<String>, combination: Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            primary: primary.unwrap_or(defaults.primary),
            combination: combination.unwrap_or(defaults.combination),
        }
    }
}

/// Join partial summaries in the order given.
pub fn join_partials(partials: &[String]) -> String {
    partials.join(PARTIAL_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combination_mentions_sections_to_merge() {
        let instructions = Instructions::default();
        assert!(instructions.combination.contains("Attendees"));
        assert!(instructions.combination.contains("Topics discussed"));
        assert!(instructions.primary.contains("meeting minutes"));
    }

    #[test]
    fn overrides_replace_only_what_is_set() {
        let instructions = Instructions::with_overrides(Some("Be brief.".into()), None);
        assert_eq!(instructions.primary, "Be brief.");
        assert_eq!(instructions.combination, Instructions::default().combination);
    }

    #[test]
    fn partials_joined_with_visible_separator() {
        let joined = join_partials(&["a".into(), "b".into(), "c".into()]);
        assert_eq!(joined, "a\n\n---\n\nb\n\n---\n\nc");
        assert_eq!(join_partials(&["only".into()]), "only");
    }
}
