//! Property-based tests for output line splitting

use proptest::prelude::*;
use runbook::shell::LineSplitter;

fn split(chunks: &[Vec<u8>]) -> Vec<String> {
    let mut splitter = LineSplitter::new();
    let mut lines = Vec::new();
    for chunk in chunks {
        lines.extend(splitter.push(chunk));
    }
    lines.extend(splitter.finish());
    lines
}

proptest! {
    #[test]
    fn test_lines_roundtrip(lines in prop::collection::vec("[a-zA-Z0-9 %]{0,20}", 1..10)) {
        let text = format!("{}\n", lines.join("\n"));
        prop_assert_eq!(split(&[text.into_bytes()]), lines);
    }

    #[test]
    fn test_chunking_doesnt_matter(
        lines in prop::collection::vec("[a-z]{0,10}", 1..8),
        sep in prop::sample::select(vec!["\n", "\r\n", "\r"]),
        chunk in 1usize..7,
    ) {
        let bytes = format!("{}{}", lines.join(sep), sep).into_bytes();
        let whole = split(&[bytes.clone()]);
        let pieces: Vec<Vec<u8>> = bytes.chunks(chunk).map(|c| c.to_vec()).collect();
        prop_assert_eq!(split(&pieces), whole.clone());
        prop_assert_eq!(whole, lines);
    }

    #[test]
    fn test_no_terminators_in_output(bytes in prop::collection::vec(any::<u8>(), 0..200)) {
        for line in split(&[bytes]) {
            prop_assert!(!line.contains('\n'));
            prop_assert!(!line.contains('\r'));
        }
    }
}
