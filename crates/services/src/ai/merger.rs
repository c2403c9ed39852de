use coach_db::models::{DialogueTurn, LabeledSegment};

/// Collapses consecutive same-speaker segments into dialogue turns.
///
/// Single left-to-right fold: whitespace-only segments are dropped; a
/// segment extends the running turn when the speaker repeats (space-joined,
/// `end` advanced) and opens a new turn otherwise. Pure and idempotent:
/// merging an already-merged sequence is a no-op because no two adjacent
/// turns share a speaker.
pub fn merge_turns(segments: &[LabeledSegment]) -> Vec<DialogueTurn> {
    let mut merged: Vec<DialogueTurn> = Vec::new();
    for segment in segments {
        let text = segment.text.trim();
        if text.is_empty() {
            continue;
        }

        match merged.last_mut() {
            Some(last) if last.speaker == segment.speaker => {
                last.text.push(' ');
                last.text.push_str(text);
                last.end = segment.end;
            }
            _ => merged.push(DialogueTurn {
                speaker: segment.speaker,
                start: segment.start,
                end: segment.end,
                text: text.to_string(),
            }),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use coach_db::models::Role;

    use super::*;

    fn seg(speaker: Role, start: f64, end: f64, text: &str) -> LabeledSegment {
        LabeledSegment {
            speaker,
            start,
            end,
            text: text.to_string(),
        }
    }

    fn turn_as_segment(turn: &DialogueTurn) -> LabeledSegment {
        LabeledSegment {
            speaker: turn.speaker,
            start: turn.start,
            end: turn.end,
            text: turn.text.clone(),
        }
    }

    #[test]
    fn merges_consecutive_same_speaker_segments() {
        let turns = merge_turns(&[
            seg(Role::Director, 0.0, 2.0, "안녕하세요"),
            seg(Role::Director, 2.0, 5.0, "네 안녕하세요"),
            seg(Role::Counterpart, 5.0, 8.0, "좋네요"),
        ]);

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].text, "안녕하세요 네 안녕하세요");
        assert_eq!(turns[0].start, 0.0);
        assert_eq!(turns[0].end, 5.0);
        assert_eq!(turns[1].speaker, Role::Counterpart);
    }

    #[test]
    fn alternating_speakers_never_merge() {
        let turns = merge_turns(&[
            seg(Role::Director, 0.0, 2.0, "안녕하세요"),
            seg(Role::Counterpart, 2.0, 5.0, "네 안녕하세요"),
            seg(Role::Director, 5.0, 8.0, "좋네요"),
        ]);

        assert_eq!(turns.len(), 3);
    }

    #[test]
    fn no_two_adjacent_turns_share_a_speaker() {
        let turns = merge_turns(&[
            seg(Role::Director, 0.0, 1.0, "a"),
            seg(Role::Director, 1.0, 2.0, "b"),
            seg(Role::Counterpart, 2.0, 3.0, "c"),
            seg(Role::Counterpart, 3.0, 4.0, "d"),
            seg(Role::Director, 4.0, 5.0, "e"),
        ]);

        for pair in turns.windows(2) {
            assert_ne!(pair[0].speaker, pair[1].speaker);
        }
    }

    #[test]
    fn merge_is_idempotent() {
        let segments = vec![
            seg(Role::Director, 0.0, 1.0, "one"),
            seg(Role::Director, 1.0, 2.0, "two"),
            seg(Role::Counterpart, 2.0, 3.0, "three"),
            seg(Role::Director, 3.0, 4.0, "four"),
            seg(Role::Director, 4.0, 5.0, "five"),
        ];

        let once = merge_turns(&segments);
        let twice = merge_turns(&once.iter().map(turn_as_segment).collect::<Vec<_>>());

        assert_eq!(once, twice);
    }

    #[test]
    fn merging_preserves_every_word_in_order() {
        let segments = vec![
            seg(Role::Director, 0.0, 1.0, "  leading space "),
            seg(Role::Director, 1.0, 2.0, "middle"),
            seg(Role::Counterpart, 2.0, 3.0, "response words"),
            seg(Role::Director, 3.0, 4.0, "closing"),
        ];

        let turns = merge_turns(&segments);

        let merged_words: Vec<&str> = turns
            .iter()
            .flat_map(|t| t.text.split_whitespace())
            .collect();
        let source_words: Vec<&str> = segments
            .iter()
            .flat_map(|s| s.text.split_whitespace())
            .collect();
        assert_eq!(merged_words, source_words);
    }

    #[test]
    fn whitespace_only_segments_are_dropped() {
        let turns = merge_turns(&[
            seg(Role::Director, 0.0, 1.0, "hello"),
            seg(Role::Counterpart, 1.0, 2.0, "   "),
            seg(Role::Director, 2.0, 3.0, "again"),
        ]);

        // The empty counterpart segment vanishes, so the director turns merge.
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].text, "hello again");
        assert_eq!(turns[0].end, 3.0);
    }

    #[test]
    fn empty_input_yields_no_turns() {
        assert!(merge_turns(&[]).is_empty());
    }
}
