//! Prompt construction for the transcription, summary, and insight stages.

use chrono::NaiveDate;

use recap_llm::ChatMessage;
use recap_markdown::date_header;

/// Shown in place of an empty glossary.
const NO_GLOSSARY: &str = "(none provided)";

fn glossary_or_placeholder(glossary: &str) -> &str {
    if glossary.trim().is_empty() {
        NO_GLOSSARY
    } else {
        glossary
    }
}

/// Prompt that biases speech recognition towards the glossary terms.
pub fn transcription_prompt(glossary: &str) -> String {
    if glossary.trim().is_empty() {
        return String::new();
    }
    format!(
        "The following list contains domain-specific terms, tools, and names that are \
         crucial for accurate transcription which we are using and might be transcribed \
         wrongly:\n{glossary}"
    )
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Messages for the summary stage.
pub fn summary_messages(
    live_captions: &str,
    accurate_transcript: &str,
    glossary: &str,
    meeting_date: NaiveDate,
) -> Vec<ChatMessage> {
    let header = date_header(meeting_date);
    let terms = glossary_or_placeholder(glossary);

    let system = format!(
        "{header}

You are provided with two transcripts from the same meeting:

- **Transcript 1 (Live Captions)**: Contains speaker labels but may have inaccuracies. The speaker labels are always correct, but the content may not be.
- **Transcript 2 (Accurate Transcript)**: Contains accurate text but lacks speaker labels.

Certain technical terms, tools, and participant names may have been transcribed incorrectly. Pay special attention to the following correct terms and names:
{terms}

### Instructions:

1. **Cross-reference** both transcripts:
   - Use **Transcript 1** to identify who said what.
   - Use **Transcript 2** to verify and correct the content.

2. **Evaluate carefully**:
   - Trust the speaker labels of the first transcript, not its content.
   - The second transcript is generally accurate but may still contain minor errors.
   - Use context, the correct terms and names above, and your judgment to settle disagreements.

3. **Exclude** greetings, small talk, and irrelevant conversation.

4. **Follow the example format** (between the '---' delimiters) in markdown, without the delimiters themselves:

---
{header}

## Summary:
A concise summary of the entire meeting (50 words max), briefly mentioning each participant's contribution.

## Topics:
All relevant information organized by topic rather than by participant. Exclude personal information and avoid repeating action points.

1. Topic 1
  - Detail or discussion point

## Action Points:
Every actionable task, grouped by participant, however small.

- Participant Name
  - Action point
---

Please ensure clarity, accuracy, and readability in your response."
    );

    let user = format!(
        "Transcript 1 (Live Captions):\n{}\n\nTranscript 2 (Accurate Transcript):\n{}",
        live_captions.trim(),
        accurate_transcript.trim()
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

// ---------------------------------------------------------------------------
// Deeper insights
// ---------------------------------------------------------------------------

/// Section headings the insight document must contain, in order.
pub const INSIGHT_SECTIONS: [&str; 5] = [
    "### Key Decisions",
    "### Risks & Concerns",
    "### Open Items (Carried Forward)",
    "### Completed Items",
    "### Recommendations",
];

/// Marker opening the historical context block of the insight prompt.
pub const HISTORY_BLOCK_MARKER: &str = "<historical_context";

/// Marker opening the carried-forward items block of the insight prompt.
pub const OPEN_ITEMS_BLOCK_MARKER: &str = "<open_items_from_previous_meetings>";

/// Inputs to the insight prompt.
#[derive(Debug, Clone, Copy)]
pub struct InsightPromptInput<'a> {
    pub summary: &'a str,
    pub open_items: &'a [String],
    pub historical_content: &'a str,
    pub files_count: usize,
    pub meeting_date: NaiveDate,
}

/// Messages for the deeper-insight stage.
///
/// The open-items block only appears when there are carried-forward items;
/// the historical block only when at least one earlier document was loaded.
pub fn insight_messages(input: &InsightPromptInput<'_>) -> Vec<ChatMessage> {
    let header = date_header(input.meeting_date);
    let sections = INSIGHT_SECTIONS.join("\n");

    let system = format!(
        "You are a senior engineering lead reviewing a series of team meetings.

Write a deeper-insight analysis of today's meeting in markdown. The document must start with the line:
{header}

It must then contain exactly these sections, in this order:
{sections}

Rules:
- Under \"Open Items (Carried Forward)\" list, one bullet per item, every unresolved task: new ones from today and earlier open items that today's meeting did not resolve.
- Under \"Completed Items\" list, one bullet per item, everything confirmed done today, including earlier open items that were resolved.
- Never list the same item under both sections.
- Be specific, name owners where known, and do not invent facts absent from the inputs."
    );

    let mut user = format!(
        "<current_meeting_summary>\n{}\n</current_meeting_summary>",
        input.summary.trim()
    );

    if !input.open_items.is_empty() {
        let bullets = input
            .open_items
            .iter()
            .map(|item| format!("- {item}"))
            .collect::<Vec<_>>()
            .join("\n");
        user.push_str(&format!(
            "\n\n{OPEN_ITEMS_BLOCK_MARKER}\n{bullets}\n</open_items_from_previous_meetings>"
        ));
    }

    if input.files_count > 0 {
        user.push_str(&format!(
            "\n\n{HISTORY_BLOCK_MARKER} files=\"{}\">\n{}\n</historical_context>",
            input.files_count,
            input.historical_content.trim()
        ));
    }

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 2).unwrap()
    }

    #[test]
    fn summary_prompt_embeds_date_and_glossary() {
        let messages = summary_messages("You: hi", "hello", "People: Jason, Laura", date());
        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.starts_with("## Meeting Date: Wednesday, July 2, 2025"));
        assert!(messages[0].content.contains("People: Jason, Laura"));
        assert!(messages[1].content.contains("You: hi"));
        assert!(messages[1].content.contains("Transcript 2 (Accurate Transcript):\nhello"));
    }

    #[test]
    fn empty_glossary_uses_placeholder() {
        let messages = summary_messages("", "", "  ", date());
        assert!(messages[0].content.contains(NO_GLOSSARY));
        assert!(transcription_prompt("").is_empty());
    }

    #[test]
    fn transcription_prompt_lists_terms() {
        let prompt = transcription_prompt("Concepts/Terms: GDPR, evals");
        assert!(prompt.ends_with("Concepts/Terms: GDPR, evals"));
    }

    #[test]
    fn insight_prompt_without_history_omits_blocks() {
        let input = InsightPromptInput {
            summary: "## Summary:\nShipped.",
            open_items: &[],
            historical_content: "",
            files_count: 0,
            meeting_date: date(),
        };
        let messages = insight_messages(&input);
        let user = &messages[1].content;
        assert!(user.contains("Shipped."));
        assert!(!user.contains(HISTORY_BLOCK_MARKER));
        assert!(!user.contains(OPEN_ITEMS_BLOCK_MARKER));
        for section in INSIGHT_SECTIONS {
            assert!(messages[0].content.contains(section));
        }
    }

    #[test]
    fn insight_prompt_with_history_includes_blocks() {
        let open = vec!["Write docs".to_string()];
        let input = InsightPromptInput {
            summary: "## Summary:\nShipped.",
            open_items: &open,
            historical_content: "[2025_06_01-deeper-insights.md]\nold notes",
            files_count: 1,
            meeting_date: date(),
        };
        let user = &insight_messages(&input)[1].content;
        assert!(user.contains("<open_items_from_previous_meetings>\n- Write docs\n"));
        assert!(user.contains("<historical_context files=\"1\">"));
        assert!(user.contains("old notes"));
    }
}
