//! Speed and accuracy calculations for a finished session.
//!
//! Every function here is total: zero elapsed time or empty input produce 0,
//! never NaN or infinity.

const MS_PER_MINUTE: f64 = 60_000.0;

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// Results computed once when a session completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Metrics {
    pub wpm: u32,
    pub accuracy: u8,
    pub word_count: usize,
    pub correct_chars: usize,
    pub typed_chars: usize,
    pub elapsed_ms: u64,
}

impl Metrics {
    pub fn compute(input: &str, target: &str, started_at_ms: i64, completed_at_ms: i64) -> Self {
        let elapsed_ms = completed_at_ms.saturating_sub(started_at_ms).max(0) as u64;
        let word_count = word_count(input);
        let correct_chars = correct_count(input, target);
        let typed_chars = input.chars().count();

        Self {
            wpm: wpm(word_count, elapsed_minutes(elapsed_ms)),
            accuracy: accuracy(correct_chars, typed_chars),
            word_count,
            correct_chars,
            typed_chars,
            elapsed_ms,
        }
    }
}

/// Whitespace-delimited tokens in the trimmed input; blank input has no words
pub fn word_count(input: &str) -> usize {
    input.split_whitespace().count()
}

pub fn elapsed_minutes(elapsed_ms: u64) -> f64 {
    elapsed_ms as f64 / MS_PER_MINUTE
}

pub fn wpm(word_count: usize, elapsed_minutes: f64) -> u32 {
    if !elapsed_minutes.is_finite() || elapsed_minutes <= 0.0 {
        return 0;
    }

    let raw = (word_count as f64 / elapsed_minutes).round();
    if raw.is_finite() && raw > 0.0 {
        raw as u32
    } else {
        0
    }
}

/// Positions in the overlapping prefix where the typed character matches the target
pub fn correct_count(input: &str, target: &str) -> usize {
    input
        .chars()
        .zip(target.chars())
        .filter(|(typed, expected)| typed == expected)
        .count()
}

pub fn accuracy(correct_chars: usize, typed_chars: usize) -> u8 {
    if typed_chars == 0 {
        return 0;
    }

    let pct = (100.0 * correct_chars as f64 / typed_chars as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Per-character correctness for highlighting, one entry per typed character.
/// Characters typed past the end of the target are incorrect.
pub fn char_outcomes(input: &str, target: &str) -> Vec<Outcome> {
    let mut expected = target.chars();
    input
        .chars()
        .map(|typed| match expected.next() {
            Some(e) if e == typed => Outcome::Correct,
            _ => Outcome::Incorrect,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("the quick brown fox"), 4);
        assert_eq!(word_count("  spaced   out\twords \n"), 3);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn test_wpm_four_words_in_two_minutes() {
        assert_eq!(wpm(4, 2.0), 2);
    }

    #[test]
    fn test_wpm_zero_elapsed_is_zero() {
        assert_eq!(wpm(10, 0.0), 0);
        assert_eq!(wpm(10, -1.0), 0);
        assert_eq!(wpm(10, f64::NAN), 0);
        assert_eq!(wpm(0, 0.0), 0);
    }

    #[test]
    fn test_wpm_rounds_half_up() {
        // 5 words in 2 minutes -> 2.5
        assert_eq!(wpm(5, 2.0), 3);
        // 7 words in 3 minutes -> 2.33
        assert_eq!(wpm(7, 3.0), 2);
    }

    #[test]
    fn test_accuracy_cat_cas() {
        let correct = correct_count("cas", "cat");
        assert_eq!(correct, 2);
        assert_eq!(accuracy(correct, 3), 67);
    }

    #[test]
    fn test_accuracy_empty_input_is_zero() {
        assert_eq!(accuracy(0, 0), 0);
    }

    #[test]
    fn test_accuracy_overtyping_counts_against() {
        // target fully matched then two extra characters
        let correct = correct_count("catxx", "cat");
        assert_eq!(correct, 3);
        assert_eq!(accuracy(correct, 5), 60);
    }

    #[test]
    fn test_accuracy_is_clamped() {
        assert_eq!(accuracy(10, 5), 100);
    }

    #[test]
    fn test_correct_count_uses_chars_not_bytes() {
        assert_eq!(correct_count("héllo", "héllo"), 5);
        assert_eq!(correct_count("hello", "héllo"), 4);
    }

    #[test]
    fn test_char_outcomes() {
        let outcomes = char_outcomes("cas!", "cat");
        assert_eq!(
            outcomes,
            vec![
                Outcome::Correct,
                Outcome::Correct,
                Outcome::Incorrect,
                Outcome::Incorrect
            ]
        );
        assert!(char_outcomes("", "cat").is_empty());
    }

    #[test]
    fn test_metrics_compute() {
        let m = Metrics::compute("the quick brown fox", "the quick brown fox jumps", 0, 120_000);

        assert_eq!(m.wpm, 2);
        assert_eq!(m.accuracy, 100);
        assert_eq!(m.word_count, 4);
        assert_eq!(m.correct_chars, 19);
        assert_eq!(m.typed_chars, 19);
        assert_eq!(m.elapsed_ms, 120_000);
    }

    #[test]
    fn test_metrics_instant_completion() {
        let m = Metrics::compute("abc", "abc", 5_000, 5_000);
        assert_eq!(m.wpm, 0);
        assert_eq!(m.accuracy, 100);
    }

    #[test]
    fn test_metrics_clock_going_backwards() {
        let m = Metrics::compute("abc", "abc", 5_000, 1_000);
        assert_eq!(m.elapsed_ms, 0);
        assert_eq!(m.wpm, 0);
    }
}
