use nanoid::nanoid;

/// Alphabet for run identifiers (no ambiguous glyphs).
const RUN_ID_ALPHABET: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y',
    'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];
const RUN_ID_LENGTH: usize = 10;

/// Short identifier attached to every log line of one migration run.
pub fn generate_run_id() -> String {
    nanoid!(RUN_ID_LENGTH, RUN_ID_ALPHABET)
}
