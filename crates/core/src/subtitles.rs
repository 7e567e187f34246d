//! Story text to timed SRT captions.
//!
//! The story is split into whitespace-delimited words and partitioned into
//! at most [`MAX_CUES`] contiguous groups of roughly [`TARGET_CUE_SECS`]
//! each. The groups share the total duration evenly; the last cue absorbs
//! the integer-division remainder so the track ends exactly at `total_ms`.

/// Target on-screen time per cue.
pub const TARGET_CUE_SECS: f64 = 3.0;
/// Upper bound on the number of cues in a track.
pub const MAX_CUES: usize = 12;
/// Shortest track length in milliseconds.
pub const MIN_TOTAL_MS: u64 = 1000;
/// Stories longer than this many characters are truncated.
pub const MAX_STORY_CHARS: usize = 600;
/// Appended to a truncated story.
pub const ELLIPSIS: &str = "...";

/// A single caption cue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// 1-based position in the track.
    pub index: u32,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// Normalise story text before cue building.
///
/// Carriage returns become spaces; text over [`MAX_STORY_CHARS`] characters
/// is cut there and suffixed with [`ELLIPSIS`].
pub fn prepare_story(text: &str) -> String {
    let normalized = text.replace('\r', " ");
    let trimmed = normalized.trim();

    if trimmed.chars().count() <= MAX_STORY_CHARS {
        return trimmed.to_string();
    }

    let mut cut: String = trimmed.chars().take(MAX_STORY_CHARS).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str(ELLIPSIS);
    cut
}

/// Number of cues to aim for: one per [`TARGET_CUE_SECS`], within `1..=MAX_CUES`.
///
/// Exact halves round away from zero (7.5 s aims for 3 cues).
pub fn target_cue_count(duration_seconds: f64) -> usize {
    let rounded = (duration_seconds / TARGET_CUE_SECS).round();
    if !rounded.is_finite() || rounded < 1.0 {
        return 1;
    }
    (rounded as usize).min(MAX_CUES)
}

/// Track length in milliseconds, never below [`MIN_TOTAL_MS`].
pub fn total_ms(duration_seconds: f64) -> u64 {
    let ms = (duration_seconds * 1000.0).round();
    if ms.is_finite() && ms > MIN_TOTAL_MS as f64 {
        ms as u64
    } else {
        MIN_TOTAL_MS
    }
}

/// Partition `text` into contiguous, evenly-timed cues covering the duration.
///
/// Words are grouped `ceil(words / target)` at a time, so the resulting cue
/// count can be lower than [`target_cue_count`] when the words do not divide
/// evenly (5 words over 4 targets gives 3 cues of 2, 2 and 1 words). Empty
/// text yields one cue with empty text spanning the whole duration.
pub fn build_cues(text: &str, duration_seconds: f64) -> Vec<Cue> {
    let total = total_ms(duration_seconds);
    let words: Vec<&str> = text.split_whitespace().collect();

    if words.is_empty() {
        return vec![Cue {
            index: 1,
            start_ms: 0,
            end_ms: total,
            text: String::new(),
        }];
    }

    let target = target_cue_count(duration_seconds);
    let group_size = words.len().div_ceil(target);
    let groups: Vec<String> = words.chunks(group_size).map(|g| g.join(" ")).collect();

    let slice_ms = total / groups.len() as u64;
    let last = groups.len() - 1;
    let mut start_ms = 0;

    groups
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let end_ms = if i == last { total } else { start_ms + slice_ms };
            let cue = Cue {
                index: i as u32 + 1,
                start_ms,
                end_ms,
                text,
            };
            start_ms = end_ms;
            cue
        })
        .collect()
}

/// Format milliseconds as an SRT timecode, `HH:MM:SS,mmm`.
pub fn srt_time(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = ms % 3_600_000 / 60_000;
    let seconds = ms % 60_000 / 1000;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Serialise cues as SRT text.
pub fn render_srt(cues: &[Cue]) -> String {
    let mut out = String::new();
    for cue in cues {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            cue.index,
            srt_time(cue.start_ms),
            srt_time(cue.end_ms),
            cue.text
        ));
    }
    out
}
