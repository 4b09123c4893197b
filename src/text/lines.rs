//! Line start tables and blank-span checks.

/// Compute the byte offset at which every line starts.
///
/// The first entry is always 0 and a text with N newlines yields N+1 entries,
/// so a trailing newline produces a final empty line.
pub fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut line_starts = vec![0];
    line_starts.extend(
        text.bytes()
            .enumerate()
            .filter(|(_, byte)| *byte == b'\n')
            .map(|(offset, _)| offset + 1),
    );
    line_starts
}

/// True when the text is empty or consists only of whitespace (newlines included).
pub fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::empty("", vec![0])]
    #[case::single_line("abc", vec![0])]
    #[case::trailing_newline("abc\n", vec![0, 4])]
    #[case::three_lines("a\nb\nc", vec![0, 2, 4])]
    #[case::blank_lines("\n\n", vec![0, 1, 2])]
    #[case::multibyte("日本\n語", vec![0, 7])]
    fn test_compute_line_starts(#[case] text: &str, #[case] expected: Vec<usize>) {
        assert_eq!(compute_line_starts(text), expected);
    }

    #[rstest]
    #[case::empty("", true)]
    #[case::spaces("   ", true)]
    #[case::newlines_and_tabs("\n\t \n", true)]
    #[case::text("  x  ", false)]
    fn test_is_blank(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_blank(text), expected);
    }
}
